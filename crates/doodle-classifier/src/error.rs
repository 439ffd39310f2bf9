//! Classifier errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("Model load failed: {0}")]
    ModelLoad(String),
    #[error("Invalid labels: {0}")]
    Labels(String),
    #[error("Inference failed: {0}")]
    Inference(String),
    #[error("IO error: {0}")]
    Io(String),
}

/// Result type for classifier operations.
pub type ClassifierResult<T> = Result<T, ClassifierError>;
