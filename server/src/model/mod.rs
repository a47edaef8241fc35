pub mod response;

pub use response::ClassificationResult;
