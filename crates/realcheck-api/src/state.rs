//! Application state.

use std::sync::Arc;

use realcheck_classifier::{Analyzer, ClassifierConfig, ClassifierHandle, OnnxLoader};
use realcheck_media::{FfmpegFrameDecoder, FrameDecoder, FrameSampler};
use realcheck_storage::{StagingArea, StagingConfig, StorageResult};

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub staging: StagingArea,
    pub classifier: Arc<ClassifierHandle>,
    pub analyzer: Analyzer,
}

impl AppState {
    /// Create application state from the environment.
    ///
    /// Opens the staging directory. The model is not loaded here; the first
    /// upload triggers it.
    pub async fn new(config: ApiConfig) -> StorageResult<Self> {
        let staging = StagingArea::open(&StagingConfig::from_env()).await?;
        let handle = ClassifierHandle::new(Arc::new(OnnxLoader::new(ClassifierConfig::from_env())));

        let mut decoder = FfmpegFrameDecoder::new();
        if let Some(threads) = config.decode_threads {
            decoder = decoder.with_threads(threads);
        }

        Ok(Self::with_parts(config, staging, Arc::new(handle), Arc::new(decoder)))
    }

    /// Assemble state from already built parts.
    pub fn with_parts(
        config: ApiConfig,
        staging: StagingArea,
        classifier: Arc<ClassifierHandle>,
        decoder: Arc<dyn FrameDecoder>,
    ) -> Self {
        let sampler = FrameSampler::new(decoder, config.sample_frames);
        let analyzer = Analyzer::new(Arc::clone(&classifier), sampler, staging.clone());

        Self {
            config,
            staging,
            classifier,
            analyzer,
        }
    }
}
