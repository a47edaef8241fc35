use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::Label;

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// Per-class probability distribution of a single prediction. The two
/// probabilities always sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassProbabilities {
    pub produtivo: f64,
    pub improdutivo: f64,
}

impl ClassProbabilities {
    pub fn top(&self) -> (Label, f64) {
        if self.produtivo >= self.improdutivo {
            (Label::Produtivo, self.produtivo)
        } else {
            (Label::Improdutivo, self.improdutivo)
        }
    }
}

/// Binary logistic-regression classifier over TF-IDF features.
///
/// The model output is P(PRODUTIVO); weights are trained offline by the
/// trainer and persisted alongside the vectorizer from the same run, which
/// keeps the weight dimension tied to the vocabulary size.
#[derive(Debug, Serialize, Deserialize)]
pub struct LinearClassifier {
    weights: Vec<f64>,
    bias: f64,
}

impl LinearClassifier {
    pub fn n_features(&self) -> usize {
        self.weights.len()
    }

    /// Predict the label and class distribution for a feature vector.
    pub fn predict(&self, features: &[f64]) -> (Label, ClassProbabilities) {
        assert_eq!(
            features.len(),
            self.weights.len(),
            "Feature vector dimension does not match model"
        );

        let z = self
            .weights
            .iter()
            .zip(features)
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.bias;
        let p = sigmoid(z);
        let probs = ClassProbabilities {
            produtivo: p,
            improdutivo: 1.0 - p,
        };
        (probs.top().0, probs)
    }

    /// Fit by gradient descent with inverse-frequency class weights.
    ///
    /// Used only by the offline trainer.
    pub fn fit(
        samples: &[Vec<f64>],
        labels: &[Label],
        epochs: usize,
        learning_rate: f64,
    ) -> Self {
        assert!(!samples.is_empty(), "Cannot fit on an empty dataset");
        assert_eq!(samples.len(), labels.len());

        let n_features = samples[0].len();
        let n = samples.len() as f64;
        let n_pos = labels.iter().filter(|l| **l == Label::Produtivo).count() as f64;
        let n_neg = n - n_pos;
        // Balanced class weights, matching n / (2 * class_count)
        let w_pos = if n_pos > 0.0 { n / (2.0 * n_pos) } else { 0.0 };
        let w_neg = if n_neg > 0.0 { n / (2.0 * n_neg) } else { 0.0 };

        let mut weights = vec![0.0; n_features];
        let mut bias = 0.0;

        for _ in 0..epochs {
            let mut grad_w = vec![0.0; n_features];
            let mut grad_b = 0.0;

            for (x, label) in samples.iter().zip(labels) {
                let z = weights.iter().zip(x).map(|(w, xi)| w * xi).sum::<f64>() + bias;
                let (y, sample_weight) = match label {
                    Label::Produtivo => (1.0, w_pos),
                    Label::Improdutivo => (0.0, w_neg),
                };
                let err = (sigmoid(z) - y) * sample_weight;
                for (g, xi) in grad_w.iter_mut().zip(x) {
                    *g += err * xi;
                }
                grad_b += err;
            }

            for (w, g) in weights.iter_mut().zip(&grad_w) {
                *w -= learning_rate * g / n;
            }
            bias -= learning_rate * grad_b / n;
        }

        Self { weights, bias }
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write classifier to {}", path.display()))?;
        Ok(())
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read classifier from {}", path.display()))?;
        let model: Self = serde_json::from_str(&json)
            .with_context(|| format!("Invalid classifier artifact at {}", path.display()))?;
        anyhow::ensure!(
            !model.weights.is_empty(),
            "Classifier artifact at {} has no weights",
            path.display()
        );
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_model() -> LinearClassifier {
        // One separating feature for each class
        let samples = vec![
            vec![1.0, 0.0],
            vec![0.9, 0.1],
            vec![0.0, 1.0],
            vec![0.1, 0.9],
        ];
        let labels = vec![
            Label::Produtivo,
            Label::Produtivo,
            Label::Improdutivo,
            Label::Improdutivo,
        ];
        LinearClassifier::fit(&samples, &labels, 2000, 1.0)
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let model = toy_model();
        let (_, probs) = model.predict(&[0.7, 0.3]);
        assert!((probs.produtivo + probs.improdutivo - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_prediction_is_argmax() {
        let model = toy_model();
        let (label, probs) = model.predict(&[1.0, 0.0]);
        assert_eq!(label, Label::Produtivo);
        assert!(probs.produtivo > probs.improdutivo);

        let (label, probs) = model.predict(&[0.0, 1.0]);
        assert_eq!(label, Label::Improdutivo);
        assert!(probs.improdutivo > probs.produtivo);
    }

    #[test]
    fn test_top_returns_predicted_class() {
        let probs = ClassProbabilities {
            produtivo: 0.3,
            improdutivo: 0.7,
        };
        assert_eq!(probs.top(), (Label::Improdutivo, 0.7));
    }

    #[test]
    #[should_panic(expected = "dimension does not match")]
    fn test_dimension_mismatch_panics() {
        toy_model().predict(&[1.0, 0.0, 0.0]);
    }
}
