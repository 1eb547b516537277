//! FFmpeg CLI wrapper for frame decoding and sampling.
//!
//! This crate provides:
//! - FFprobe stream inspection
//! - Full-video frame decoding into memory via FFmpeg rawvideo output
//! - Uniform random frame sampling without replacement

pub mod command;
pub mod decoder;
pub mod error;
pub mod frame;
pub mod probe;
pub mod sampler;

pub use command::{check_ffmpeg, check_ffprobe, FrameDumpCommand};
pub use decoder::{FfmpegFrameDecoder, FrameDecoder};
pub use error::{MediaError, MediaResult, SamplingError};
pub use frame::Frame;
pub use probe::{probe_video, VideoInfo};
pub use sampler::{sample_frames, FrameSampler, DEFAULT_SAMPLE_FRAMES};
