//! Offline trainer: fits the TF-IDF vectorizer and the logistic classifier
//! on the labeled dataset and writes the paired JSON artifacts the server
//! loads at startup. Both artifacts always come from the same run.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::Context;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use lib_classify::{Label, LinearClassifier, Normalizer, TfidfVectorizer};

const MAX_FEATURES: usize = 5000;
const TEST_FRACTION: f64 = 0.2;
const EPOCHS: usize = 3000;
const LEARNING_RATE: f64 = 1.0;

fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let dataset_dir = PathBuf::from(args.next().unwrap_or_else(|| "datasets".to_string()));
    let out_dir = PathBuf::from(args.next().unwrap_or_else(|| "artifacts".to_string()));
    let lexicon_path =
        PathBuf::from(args.next().unwrap_or_else(|| "config/entities.txt".to_string()));

    let (texts, labels) = load_labeled_dataset(&dataset_dir.join("classifier.txt"))?;
    println!("Loaded {} labeled examples", texts.len());

    // Same lexicon the server loads, so training and inference see
    // identical preprocessing.
    let normalizer = build_normalizer(&lexicon_path);
    let processed: Vec<String> = texts.iter().map(|t| normalizer.normalize(t)).collect();

    let mut vectorizer = TfidfVectorizer::new(MAX_FEATURES);
    vectorizer.fit(&processed);
    println!("Fitted vectorizer: {} terms", vectorizer.vocab_size());

    let samples: Vec<Vec<f64>> = processed.iter().map(|d| vectorizer.transform(d)).collect();

    // Shuffled 80/20 split, fixed seed so runs are reproducible
    let mut indices: Vec<usize> = (0..samples.len()).collect();
    let mut rng = rand::rngs::StdRng::seed_from_u64(42);
    indices.shuffle(&mut rng);
    let n_test = ((samples.len() as f64) * TEST_FRACTION).round() as usize;
    let (test_idx, train_idx) = indices.split_at(n_test);

    let train_x: Vec<Vec<f64>> = train_idx.iter().map(|&i| samples[i].clone()).collect();
    let train_y: Vec<Label> = train_idx.iter().map(|&i| labels[i]).collect();

    println!("Training on {} examples...", train_x.len());
    let classifier = LinearClassifier::fit(&train_x, &train_y, EPOCHS, LEARNING_RATE);

    report_metrics(&classifier, &samples, &labels, test_idx);

    fs::create_dir_all(&out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;
    vectorizer.save(&out_dir.join("vectorizer.json"))?;
    classifier.save(&out_dir.join("classifier.json"))?;
    println!("Artifacts written to {}", out_dir.display());

    Ok(())
}

fn build_normalizer(lexicon_path: &Path) -> Normalizer {
    let normalizer = Normalizer::from_lexicon_file(lexicon_path);
    if !normalizer.has_entity_lexicon() {
        println!(
            "Entity lexicon {} unavailable; normalizing in degraded mode",
            lexicon_path.display()
        );
    }
    normalizer
}

/// Dataset format: one `text|LABEL` pair per line. Malformed lines are
/// skipped.
fn load_labeled_dataset(path: &Path) -> anyhow::Result<(Vec<String>, Vec<Label>)> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read dataset from {}", path.display()))?;

    let mut texts = Vec::new();
    let mut labels = Vec::new();
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some((text, label)) = line.rsplit_once('|') else {
            continue;
        };
        let Ok(label) = Label::from_str(label.trim()) else {
            continue;
        };
        texts.push(text.trim().to_string());
        labels.push(label);
    }

    anyhow::ensure!(!texts.is_empty(), "Dataset at {} is empty", path.display());
    Ok((texts, labels))
}

fn report_metrics(
    classifier: &LinearClassifier,
    samples: &[Vec<f64>],
    labels: &[Label],
    test_idx: &[usize],
) {
    if test_idx.is_empty() {
        println!("No held-out examples; skipping evaluation");
        return;
    }

    let mut correct = 0usize;
    let mut predicted_pos = 0usize;
    let mut true_pos = 0usize;

    for &i in test_idx {
        let (predicted, _) = classifier.predict(&samples[i]);
        if predicted == labels[i] {
            correct += 1;
        }
        if predicted == Label::Produtivo {
            predicted_pos += 1;
            if labels[i] == Label::Produtivo {
                true_pos += 1;
            }
        }
    }

    let accuracy = correct as f64 / test_idx.len() as f64;
    println!("Accuracy: {:.2}", accuracy);
    if predicted_pos > 0 {
        println!(
            "Precision (PRODUTIVO): {:.2}",
            true_pos as f64 / predicted_pos as f64
        );
    } else {
        println!("Precision (PRODUTIVO): n/a (no positive predictions)");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalizer_uses_lexicon_like_the_server() {
        let path = std::env::temp_dir().join("train_test_entities.txt");
        std::fs::write(&path, "petrobras\nreceita federal\n").unwrap();
        let normalizer = build_normalizer(&path);
        let _ = std::fs::remove_file(&path);

        assert!(normalizer.has_entity_lexicon());
        let out = normalizer.normalize("Pendência na Receita Federal sobre a Petrobras");
        assert!(out.contains("receita federal"));
        assert!(out.contains("petrobras"));
    }

    #[test]
    fn test_missing_lexicon_degrades_without_failing() {
        let normalizer = build_normalizer(Path::new("/nonexistent/entities.txt"));
        assert!(!normalizer.has_entity_lexicon());
    }

    #[test]
    fn test_dataset_loader_skips_malformed_lines() {
        let path = std::env::temp_dir().join("train_test_dataset.txt");
        std::fs::write(
            &path,
            "Preciso do extrato de abril|PRODUTIVO\nlinha sem rotulo\nObrigado a todos|IMPRODUTIVO\nTexto|TALVEZ\n",
        )
        .unwrap();
        let (texts, labels) = load_labeled_dataset(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(texts.len(), 2);
        assert_eq!(labels, vec![Label::Produtivo, Label::Improdutivo]);
    }
}
