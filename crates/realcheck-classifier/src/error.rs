//! Classifier error types.

use std::path::PathBuf;

use realcheck_media::{MediaError, SamplingError};
use realcheck_storage::StorageError;
use thiserror::Error;

pub type ClassifierResult<T> = Result<T, ClassifierError>;

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("Model file not found: {0}")]
    ModelNotFound(PathBuf),

    #[error("Classifier unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to load model: {0}")]
    Load(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Score out of range: {0}")]
    InvalidScore(f64),

    #[error("No scores to aggregate")]
    NoScores,

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ClassifierError {
    pub fn inference(msg: impl Into<String>) -> Self {
        Self::Inference(msg.into())
    }

    pub fn load(msg: impl Into<String>) -> Self {
        Self::Load(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether the classifier never came up, as opposed to failing mid-score.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            ClassifierError::ModelNotFound(_)
                | ClassifierError::Unavailable(_)
                | ClassifierError::Load(_)
        )
    }

    /// Whether a video could not produce a frame sample.
    pub fn is_sampling(&self) -> bool {
        matches!(self, ClassifierError::Media(MediaError::Sampling(_)))
    }

    pub fn sampling(err: SamplingError) -> Self {
        Self::Media(MediaError::Sampling(err))
    }
}
