//! The classifier seam.

use std::path::Path;

use async_trait::async_trait;

use crate::error::ClassifierResult;

/// Scores a single image file.
///
/// Scores are in `[0, 100]`: below 50 leans AI-generated, 50 and above leans
/// human-made. Implementations may fail; callers own the fallback policy.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Score the image at `path`.
    async fn classify(&self, path: &Path) -> ClassifierResult<f64>;

    /// Drop transient buffers held between requests. Best effort.
    fn release_memory(&self) {}
}
