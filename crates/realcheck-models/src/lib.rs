//! Shared data models for the RealCheck backend.
//!
//! This crate provides:
//! - Media kind dispatch and the fixed extension tables
//! - Verdict mapping from a raw classifier score

pub mod media;
pub mod verdict;

pub use media::{extension_of, is_allowed_file, MediaKind, ALLOWED_EXTENSIONS, VIDEO_EXTENSIONS};
pub use verdict::{round1, Verdict, VerdictLabel, AI_THRESHOLD};
