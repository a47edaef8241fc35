use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Fitted TF-IDF vectorizer.
///
/// Fitting happens offline in the trainer; the server only loads the
/// persisted state and calls [`transform`](Self::transform). Transformation
/// is deterministic given the fitted state: unseen tokens contribute
/// nothing, known tokens are weighted by smoothed inverse document
/// frequency, and the result is L2-normalized.
#[derive(Debug, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    max_features: usize,
}

impl TfidfVectorizer {
    pub fn new(max_features: usize) -> Self {
        Self {
            vocabulary: HashMap::new(),
            idf: Vec::new(),
            max_features,
        }
    }

    pub fn vocab_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// Build the vocabulary and IDF table from normalized documents.
    ///
    /// Keeps the `max_features` most frequent terms; indices are assigned in
    /// lexicographic term order so a refit over the same corpus reproduces
    /// the same layout.
    pub fn fit(&mut self, documents: &[String]) {
        let mut doc_count: HashMap<&str, usize> = HashMap::new();
        let mut term_count: HashMap<&str, usize> = HashMap::new();

        for doc in documents {
            let mut seen: HashSet<&str> = HashSet::new();
            for term in doc.split_whitespace() {
                *term_count.entry(term).or_insert(0) += 1;
                if seen.insert(term) {
                    *doc_count.entry(term).or_insert(0) += 1;
                }
            }
        }

        let mut ranked: Vec<(&str, usize)> = term_count.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked.truncate(self.max_features);

        let mut terms: Vec<&str> = ranked.into_iter().map(|(t, _)| t).collect();
        terms.sort_unstable();

        self.vocabulary = terms
            .iter()
            .enumerate()
            .map(|(idx, term)| (term.to_string(), idx))
            .collect();

        let n_docs = documents.len() as f64;
        self.idf = vec![0.0; self.vocabulary.len()];
        for (term, &idx) in &self.vocabulary {
            let df = *doc_count.get(term.as_str()).unwrap_or(&1) as f64;
            self.idf[idx] = ((1.0 + n_docs) / (1.0 + df)).ln() + 1.0;
        }
    }

    /// Transform a normalized document into an L2-normalized TF-IDF vector.
    ///
    /// Calling this before fitted state has been installed is a programming
    /// error, not a runtime condition.
    pub fn transform(&self, document: &str) -> Vec<f64> {
        assert!(
            !self.vocabulary.is_empty(),
            "TfidfVectorizer used before fitting or loading"
        );

        let mut tfidf = vec![0.0; self.vocabulary.len()];
        for term in document.split_whitespace() {
            if let Some(&idx) = self.vocabulary.get(term) {
                tfidf[idx] += 1.0;
            }
        }
        for (value, idf) in tfidf.iter_mut().zip(&self.idf) {
            *value *= idf;
        }

        let norm = tfidf.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for value in &mut tfidf {
                *value /= norm;
            }
        }

        tfidf
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write vectorizer to {}", path.display()))?;
        Ok(())
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read vectorizer from {}", path.display()))?;
        let vectorizer: Self = serde_json::from_str(&json)
            .with_context(|| format!("Invalid vectorizer artifact at {}", path.display()))?;
        anyhow::ensure!(
            !vectorizer.vocabulary.is_empty(),
            "Vectorizer artifact at {} has an empty vocabulary",
            path.display()
        );
        Ok(vectorizer)
    }
}
