//! Uniform random frame sampling.

use std::path::Path;
use std::sync::Arc;

use rand::seq::index;
use rand::Rng;
use tracing::debug;

use crate::decoder::FrameDecoder;
use crate::error::{MediaResult, SamplingError};
use crate::frame::Frame;

/// Frames drawn from each uploaded video.
pub const DEFAULT_SAMPLE_FRAMES: usize = 3;

/// Draw `k` frames uniformly at random without replacement.
///
/// Frames come back in draw order. Unselected frames are dropped here.
pub fn sample_frames<R>(frames: Vec<Frame>, k: usize, rng: &mut R) -> Result<Vec<Frame>, SamplingError>
where
    R: Rng + ?Sized,
{
    if k == 0 {
        return Err(SamplingError::EmptySample);
    }
    if frames.len() < k {
        return Err(SamplingError::InsufficientFrames {
            requested: k,
            available: frames.len(),
        });
    }

    let picked = index::sample(rng, frames.len(), k);
    let mut slots: Vec<Option<Frame>> = frames.into_iter().map(Some).collect();

    Ok(picked
        .into_iter()
        .filter_map(|i| slots[i].take())
        .collect())
}

/// Decodes a whole video and draws a fixed-size frame sample from it.
#[derive(Clone)]
pub struct FrameSampler {
    decoder: Arc<dyn FrameDecoder>,
    sample_size: usize,
}

impl FrameSampler {
    pub fn new(decoder: Arc<dyn FrameDecoder>, sample_size: usize) -> Self {
        Self {
            decoder,
            sample_size,
        }
    }

    /// Decode every frame of `path`, then sample.
    pub async fn sample(&self, path: &Path) -> MediaResult<Vec<Frame>> {
        let frames = self.decoder.decode_all(path).await?;
        let total = frames.len();

        let sampled = {
            let mut rng = rand::rng();
            sample_frames(frames, self.sample_size, &mut rng)?
        };

        debug!(
            path = %path.display(),
            total,
            picked = ?sampled.iter().map(|f| f.index).collect::<Vec<_>>(),
            "Sampled video frames"
        );

        Ok(sampled)
    }
}
