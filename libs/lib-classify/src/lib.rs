pub mod label;
pub mod linear;
pub mod normalize;
pub mod tfidf;

pub use label::Label;
pub use linear::{ClassProbabilities, LinearClassifier};
pub use normalize::Normalizer;
pub use tfidf::TfidfVectorizer;
