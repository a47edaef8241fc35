use serde::Serialize;

pub use lib_classify::Label;

/// The unified classification response. One variant per decision path, so a
/// rule-based result cannot carry a justification and a local-model result
/// cannot carry a note.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum ClassificationResult {
    RuleBased {
        text: String,
        prediction: Label,
        confidence: f64,
        reply: String,
        note: String,
    },
    LocalModel {
        text: String,
        prediction: Label,
        confidence: f64,
        reply: String,
    },
    GeminiFallback {
        text: String,
        prediction: Label,
        confidence: f64,
        reply: String,
        justification: String,
    },
}

impl ClassificationResult {
    pub fn prediction(&self) -> Label {
        match self {
            Self::RuleBased { prediction, .. }
            | Self::LocalModel { prediction, .. }
            | Self::GeminiFallback { prediction, .. } => *prediction,
        }
    }

    pub fn confidence(&self) -> f64 {
        match self {
            Self::RuleBased { confidence, .. }
            | Self::LocalModel { confidence, .. }
            | Self::GeminiFallback { confidence, .. } => *confidence,
        }
    }

    pub fn reply(&self) -> &str {
        match self {
            Self::RuleBased { reply, .. }
            | Self::LocalModel { reply, .. }
            | Self::GeminiFallback { reply, .. } => reply,
        }
    }
}
