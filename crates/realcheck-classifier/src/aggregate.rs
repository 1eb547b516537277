//! Per-frame video scoring.

use realcheck_media::Frame;
use realcheck_storage::StagingArea;
use tracing::debug;

use crate::classifier::Classifier;
use crate::error::{ClassifierError, ClassifierResult};

/// Accept only finite scores in `[0, 100]`.
pub fn validate_score(score: f64) -> ClassifierResult<f64> {
    if score.is_finite() && (0.0..=100.0).contains(&score) {
        Ok(score)
    } else {
        Err(ClassifierError::InvalidScore(score))
    }
}

/// Arithmetic mean of the per-frame scores.
pub fn mean_score(scores: &[f64]) -> ClassifierResult<f64> {
    if scores.is_empty() {
        return Err(ClassifierError::NoScores);
    }
    Ok(scores.iter().sum::<f64>() / scores.len() as f64)
}

/// Score each frame through the image classifier and average the results.
///
/// Every frame is written to its own scratch PNG in the staging directory,
/// which is removed as soon as that frame is scored. Any frame failure fails
/// the whole video.
pub async fn score_frames(
    classifier: &dyn Classifier,
    frames: Vec<Frame>,
    staging: &StagingArea,
) -> ClassifierResult<f64> {
    let mut scores = Vec::with_capacity(frames.len());

    for frame in frames {
        let scratch = staging.scratch_file("frame_", ".png")?;
        let path = scratch.path().to_path_buf();
        let index = frame.index;

        let write_path = path.clone();
        tokio::task::spawn_blocking(move || frame.image.save(&write_path))
            .await
            .map_err(|e| ClassifierError::internal(format!("Frame write task failed: {}", e)))??;

        let score = validate_score(classifier.classify(&path).await?)?;
        debug!(frame = index, score, "Frame scored");
        scores.push(score);
    }

    mean_score(&scores)
}
