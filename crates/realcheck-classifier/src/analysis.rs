//! Scoring policy for one staged upload.
//!
//! Images go straight to the classifier. Videos are decoded, sampled, and
//! scored frame by frame. Whenever no trustworthy score comes out, the
//! request still gets a uniformly random percentage with `model_used = false`.

use std::path::Path;
use std::sync::Arc;

use rand::Rng;
use realcheck_media::{FrameSampler, MediaError};
use realcheck_models::{round1, MediaKind};
use realcheck_storage::StagingArea;
use tracing::{info, warn};

use crate::aggregate::{score_frames, validate_score};
use crate::error::{ClassifierError, ClassifierResult};
use crate::handle::ClassifierHandle;

/// Why the random fallback was used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    /// Model never loaded
    Unavailable,
    /// Classifier raised during scoring
    ClassifierError,
    /// Classifier returned a non-finite or out-of-range score
    InvalidScore,
    /// Video could not be decoded
    Decode,
    /// Video had fewer frames than the sample size
    Sampling,
}

impl FallbackReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FallbackReason::Unavailable => "unavailable",
            FallbackReason::ClassifierError => "classifier_error",
            FallbackReason::InvalidScore => "invalid_score",
            FallbackReason::Decode => "decode",
            FallbackReason::Sampling => "sampling",
        }
    }

    fn from_error(err: &ClassifierError) -> Self {
        match err {
            e if e.is_unavailable() => FallbackReason::Unavailable,
            e if e.is_sampling() => FallbackReason::Sampling,
            ClassifierError::InvalidScore(_) => FallbackReason::InvalidScore,
            ClassifierError::Media(_) => FallbackReason::Decode,
            _ => FallbackReason::ClassifierError,
        }
    }
}

/// Result of scoring one upload.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOutcome {
    pub kind: MediaKind,
    /// Score in `[0, 100]`, rounded to one decimal
    pub percentage: f64,
    /// Whether the real classifier produced the score
    pub model_used: bool,
    pub fallback: Option<FallbackReason>,
}

/// Scores staged uploads.
#[derive(Clone)]
pub struct Analyzer {
    handle: Arc<ClassifierHandle>,
    sampler: FrameSampler,
    staging: StagingArea,
}

impl Analyzer {
    pub fn new(handle: Arc<ClassifierHandle>, sampler: FrameSampler, staging: StagingArea) -> Self {
        Self {
            handle,
            sampler,
            staging,
        }
    }

    /// Score the staged file at `path`. Never fails.
    pub async fn analyze(&self, path: &Path) -> AnalysisOutcome {
        let kind = MediaKind::from_path(path);

        let scored = match kind {
            MediaKind::Image => self.score_image(path).await,
            MediaKind::Video => self.score_video(path).await,
        };

        match scored {
            Ok(score) => {
                let percentage = round1(score);
                info!(kind = %kind, percentage, "Upload scored by classifier");
                AnalysisOutcome {
                    kind,
                    percentage,
                    model_used: true,
                    fallback: None,
                }
            }
            Err(e) => {
                let reason = FallbackReason::from_error(&e);
                let percentage = random_percentage();
                warn!(
                    kind = %kind,
                    reason = reason.as_str(),
                    error = %e,
                    percentage,
                    "Classifier failed, using random score"
                );
                AnalysisOutcome {
                    kind,
                    percentage,
                    model_used: false,
                    fallback: Some(reason),
                }
            }
        }
    }

    /// Ask the loaded classifier to drop transient buffers.
    ///
    /// Decoded frames and scratch images are already gone by the time this
    /// runs; this only reaches classifiers that cache state between calls.
    pub fn reclaim_memory(&self) {
        if let Some(classifier) = self.handle.peek() {
            classifier.release_memory();
        }
    }

    async fn score_image(&self, path: &Path) -> ClassifierResult<f64> {
        let classifier = self.handle.get().await?;
        validate_score(classifier.classify(path).await?)
    }

    async fn score_video(&self, path: &Path) -> ClassifierResult<f64> {
        let classifier = self.handle.get().await?;
        let frames = self.sampler.sample(path).await.map_err(|e| match e {
            MediaError::Sampling(s) => ClassifierError::sampling(s),
            other => ClassifierError::Media(other),
        })?;
        score_frames(classifier.as_ref(), frames, &self.staging).await
    }
}

/// Uniform draw from `[0, 100)`, rounded to one decimal.
fn random_percentage() -> f64 {
    round1(rand::rng().random::<f64>() * 100.0)
}
