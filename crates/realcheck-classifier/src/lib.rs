//! AI-vs-human image classifier and scoring policy.
//!
//! This crate provides:
//! - The `Classifier` seam consumed by the upload path
//! - An ONNX Runtime implementation with model-file lookup
//! - A lazily initialized, shared classifier handle
//! - Per-frame video scoring and averaging
//! - The fallback-to-random scoring policy

pub mod aggregate;
pub mod analysis;
pub mod classifier;
pub mod config;
pub mod error;
pub mod handle;
pub mod onnx;

pub use aggregate::{mean_score, score_frames, validate_score};
pub use analysis::{AnalysisOutcome, Analyzer, FallbackReason};
pub use classifier::Classifier;
pub use config::ClassifierConfig;
pub use error::{ClassifierError, ClassifierResult};
pub use handle::{ClassifierHandle, ClassifierLoader};
pub use onnx::{OnnxClassifier, OnnxLoader};
