//! Local staging area for in-flight uploads.
//!
//! This crate provides:
//! - Filename sanitization for client-supplied names
//! - Collision-free staging with atomic create-if-absent
//! - Scratch files for per-frame classifier input
//! - Best-effort deletion of staged artifacts

pub mod error;
pub mod sanitize;
pub mod staging;

pub use error::{StorageError, StorageResult};
pub use sanitize::sanitize_filename;
pub use staging::{StagedFile, StagingArea, StagingConfig};
