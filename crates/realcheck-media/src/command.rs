//! FFmpeg command construction for frame dumps.

use std::path::{Path, PathBuf};

use crate::error::{MediaError, MediaResult};

/// Builder for an FFmpeg invocation that writes every decoded frame of the
/// first video stream to stdout as packed `rgb24` rawvideo.
#[derive(Debug, Clone)]
pub struct FrameDumpCommand {
    /// Input file path
    input: PathBuf,
    /// Extra input arguments (before -i)
    input_args: Vec<String>,
    /// Log level
    log_level: String,
}

impl FrameDumpCommand {
    /// Create a new frame dump command.
    pub fn new(input: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            input_args: Vec::new(),
            log_level: "error".to_string(),
        }
    }

    /// Add an input argument (before -i).
    pub fn input_arg(mut self, arg: impl Into<String>) -> Self {
        self.input_args.push(arg.into());
        self
    }

    /// Set log level.
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = vec![
            "-hide_banner".to_string(),
            "-nostdin".to_string(),
            "-v".to_string(),
            self.log_level.clone(),
            // Keep decoded dimensions equal to what ffprobe reports
            "-noautorotate".to_string(),
        ];

        args.extend(self.input_args.iter().cloned());

        args.push("-i".to_string());
        args.push(self.input.to_string_lossy().to_string());

        args.extend(
            [
                "-map", "0:v:0", "-vsync", "passthrough", "-pix_fmt", "rgb24", "-f", "rawvideo",
                "-",
            ]
            .iter()
            .map(|s| s.to_string()),
        );

        args
    }
}

/// Check if FFmpeg is available.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)
}

/// Check if FFprobe is available.
pub fn check_ffprobe() -> MediaResult<PathBuf> {
    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)
}
