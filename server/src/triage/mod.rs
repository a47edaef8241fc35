pub mod calibrate;

use anyhow::Context;

use lib_classify::{Label, LinearClassifier, Normalizer, TfidfVectorizer};

use crate::{
    model::ClassificationResult,
    prompt::gemini,
    server_config::cfg,
    triage::calibrate::{calibrate, round3},
    HttpClient,
};

const SHORT_CIRCUIT_NOTE: &str = "Conteúdo sem substância após limpeza; classificado por regra.";

/// Read-only fitted state for the whole pipeline.
///
/// Constructed once at startup from the persisted artifacts and shared
/// across requests; the vectorizer/classifier pairing from one training run
/// is enforced here by the dimension check instead of by convention.
pub struct TriageContext {
    normalizer: Normalizer,
    vectorizer: TfidfVectorizer,
    classifier: LinearClassifier,
}

/// Outcome of the synchronous part of the gate. The oracle call happens
/// outside so the branching stays testable without a network.
#[derive(Debug, Clone, Copy, PartialEq)]
enum GateDecision {
    ShortCircuit,
    LocalAccept { label: Label, confidence: f64 },
    Fallback { confidence: f64 },
}

/// Calibrated confidence at or above the threshold stays local.
fn accepts_locally(calibrated: f64) -> bool {
    calibrated >= cfg.triage.confidence_threshold
}

fn fixed_reply(label: Label) -> String {
    match label {
        Label::Produtivo => cfg.replies.produtivo.clone(),
        Label::Improdutivo => cfg.replies.improdutivo.clone(),
    }
}

impl TriageContext {
    /// Load the fitted artifacts named in config. Missing or mismatched
    /// artifacts are fatal; the server must not start serving without them.
    pub fn load() -> anyhow::Result<Self> {
        let vectorizer = TfidfVectorizer::load(&cfg.vectorizer_path())
            .context("Fitted vectorizer artifact is required")?;
        let classifier = LinearClassifier::load(&cfg.classifier_path())
            .context("Trained classifier artifact is required")?;

        let normalizer = match cfg.entity_lexicon_path() {
            Some(path) => {
                let normalizer = Normalizer::from_lexicon_file(&path);
                if !normalizer.has_entity_lexicon() {
                    tracing::warn!(
                        "Entity lexicon {} unavailable, running normalizer in degraded mode",
                        path.display()
                    );
                }
                normalizer
            }
            None => Normalizer::new(),
        };

        Self::from_parts(normalizer, vectorizer, classifier)
    }

    pub fn from_parts(
        normalizer: Normalizer,
        vectorizer: TfidfVectorizer,
        classifier: LinearClassifier,
    ) -> anyhow::Result<Self> {
        anyhow::ensure!(
            vectorizer.vocab_size() == classifier.n_features(),
            "Artifact mismatch: vectorizer vocabulary ({}) != classifier features ({}); \
             both must come from the same training run",
            vectorizer.vocab_size(),
            classifier.n_features(),
        );
        Ok(Self {
            normalizer,
            vectorizer,
            classifier,
        })
    }

    fn evaluate(&self, raw_text: &str) -> GateDecision {
        let normalized = self.normalizer.normalize(raw_text);
        let token_count = normalized.split_whitespace().count();
        if token_count < cfg.triage.min_token_count {
            tracing::debug!(token_count, "Short-circuiting trivial email");
            return GateDecision::ShortCircuit;
        }

        let vector = self.vectorizer.transform(&normalized);
        let (label, probs) = self.classifier.predict(&vector);
        let (_, raw_confidence) = probs.top();
        let calibrated = calibrate(raw_confidence);

        if accepts_locally(calibrated) {
            GateDecision::LocalAccept {
                label,
                confidence: calibrated,
            }
        } else {
            GateDecision::Fallback {
                confidence: calibrated,
            }
        }
    }

    /// Run the full pipeline for one email. Always produces a usable result
    /// for a non-empty, well-formed request.
    pub async fn classify(&self, http_client: &HttpClient, raw_text: &str) -> ClassificationResult {
        match self.evaluate(raw_text) {
            GateDecision::ShortCircuit => ClassificationResult::RuleBased {
                text: raw_text.to_string(),
                prediction: Label::Improdutivo,
                confidence: cfg.triage.rule_based_confidence,
                reply: fixed_reply(Label::Improdutivo),
                note: SHORT_CIRCUIT_NOTE.to_string(),
            },
            GateDecision::LocalAccept { label, confidence } => {
                tracing::info!(%label, confidence, "Local model accepted");
                ClassificationResult::LocalModel {
                    text: raw_text.to_string(),
                    prediction: label,
                    confidence: round3(confidence),
                    reply: fixed_reply(label),
                }
            }
            GateDecision::Fallback { confidence } => {
                tracing::info!(confidence, "Local confidence below threshold, consulting Gemini");
                // Confidence reported here is the local model's; the oracle
                // provides no numeric confidence.
                let oracle = gemini::classify_with_gemini(http_client, raw_text).await;
                ClassificationResult::GeminiFallback {
                    text: raw_text.to_string(),
                    prediction: oracle.classification,
                    confidence: round3(confidence),
                    reply: oracle.suggested_reply,
                    justification: oracle.justification,
                }
            }
        }
    }
}
