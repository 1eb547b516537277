//! Lazily initialized, process-wide classifier handle.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::classifier::Classifier;
use crate::error::{ClassifierError, ClassifierResult};

/// Builds a classifier on first use.
#[async_trait]
pub trait ClassifierLoader: Send + Sync {
    async fn load(&self) -> ClassifierResult<Arc<dyn Classifier>>;
}

/// Loader for deployments without a model.
struct NoModelLoader;

#[async_trait]
impl ClassifierLoader for NoModelLoader {
    async fn load(&self) -> ClassifierResult<Arc<dyn Classifier>> {
        Err(ClassifierError::Unavailable("no model configured".to_string()))
    }
}

/// Shared handle to the classifier.
///
/// The first caller loads the model; concurrent callers wait on the same load.
/// A failed load leaves the handle empty so a later request can retry.
pub struct ClassifierHandle {
    loader: Arc<dyn ClassifierLoader>,
    cell: OnceCell<Arc<dyn Classifier>>,
}

impl ClassifierHandle {
    pub fn new(loader: Arc<dyn ClassifierLoader>) -> Self {
        Self {
            loader,
            cell: OnceCell::new(),
        }
    }

    /// Handle wrapping an already built classifier.
    pub fn ready(classifier: Arc<dyn Classifier>) -> Self {
        Self {
            loader: Arc::new(NoModelLoader),
            cell: OnceCell::new_with(Some(classifier)),
        }
    }

    /// Handle that never yields a classifier.
    pub fn unavailable() -> Self {
        Self::new(Arc::new(NoModelLoader))
    }

    /// Whether a classifier has been loaded. Never triggers a load.
    pub fn is_available(&self) -> bool {
        self.cell.initialized()
    }

    /// The loaded classifier, if any. Never triggers a load.
    pub fn peek(&self) -> Option<Arc<dyn Classifier>> {
        self.cell.get().cloned()
    }

    /// Get the classifier, loading it on first call.
    pub async fn get(&self) -> ClassifierResult<Arc<dyn Classifier>> {
        let classifier = self
            .cell
            .get_or_try_init(|| async {
                match self.loader.load().await {
                    Ok(classifier) => {
                        info!(classifier = classifier.name(), "Classifier loaded");
                        Ok(classifier)
                    }
                    Err(e) => {
                        warn!(error = %e, "Classifier unavailable");
                        Err(e)
                    }
                }
            })
            .await?;

        Ok(Arc::clone(classifier))
    }
}
