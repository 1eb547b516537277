//! Full-video frame decoding.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use image::RgbImage;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::command::{check_ffmpeg, FrameDumpCommand};
use crate::error::{MediaError, MediaResult};
use crate::frame::Frame;
use crate::probe::probe_video;

/// Stderr kept for error reports; the rest is read and discarded.
const MAX_STDERR_BYTES: usize = 64 * 1024;

/// Source of decoded frames for a video file.
#[async_trait]
pub trait FrameDecoder: Send + Sync {
    /// Decode every frame of the video, in order, until the stream ends.
    async fn decode_all(&self, path: &Path) -> MediaResult<Vec<Frame>>;
}

/// Decoder backed by the `ffmpeg` and `ffprobe` binaries.
#[derive(Debug, Clone, Default)]
pub struct FfmpegFrameDecoder {
    threads: Option<usize>,
}

impl FfmpegFrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit FFmpeg decoder threads.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }
}

#[async_trait]
impl FrameDecoder for FfmpegFrameDecoder {
    async fn decode_all(&self, path: &Path) -> MediaResult<Vec<Frame>> {
        let info = probe_video(path).await?;
        check_ffmpeg()?;

        let mut cmd = FrameDumpCommand::new(path);
        if let Some(threads) = self.threads {
            cmd = cmd.input_arg("-threads").input_arg(threads.to_string());
        }
        let args = cmd.build_args();
        debug!("Running FFmpeg: ffmpeg {}", args.join(" "));

        let mut command = Command::new("ffmpeg");
        command.args(&args);
        let frames = run_frame_dump(command, info.width, info.height).await?;

        debug!(
            path = %path.display(),
            frames = frames.len(),
            width = info.width,
            height = info.height,
            fps = ?info.fps,
            codec = %info.codec,
            "Decoded video"
        );

        Ok(frames)
    }
}

/// Run a frame dump process and collect its RGB24 frames.
///
/// stdout and stderr are drained together so a noisy decoder cannot stall on
/// a full stderr pipe.
async fn run_frame_dump(mut command: Command, width: u32, height: u32) -> MediaResult<Vec<Frame>> {
    // kill_on_drop releases the decoder process on every early return
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| {
            MediaError::ffmpeg_failed(format!("Failed to spawn FFmpeg: {}", e), None, None)
        })?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| MediaError::ffmpeg_failed("Failed to capture FFmpeg stdout", None, None))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| MediaError::ffmpeg_failed("Failed to capture FFmpeg stderr", None, None))?;

    let (frames, stderr) = tokio::join!(
        read_rgb_frames(stdout, width, height),
        drain_capped(stderr, MAX_STDERR_BYTES)
    );

    let status = child.wait().await.map_err(|e| {
        MediaError::ffmpeg_failed(format!("FFmpeg process error: {}", e), None, None)
    })?;

    let frames = frames?;

    if !status.success() {
        return Err(MediaError::ffmpeg_failed(
            "FFmpeg exited with non-zero status",
            Some(String::from_utf8_lossy(&stderr).to_string()),
            status.code(),
        ));
    }

    Ok(frames)
}

/// Read `reader` to EOF, keeping at most `cap` bytes.
async fn drain_capped<R>(mut reader: R, cap: usize) -> Vec<u8>
where
    R: AsyncRead + Unpin,
{
    let mut kept = Vec::new();
    let mut chunk = [0u8; 8192];

    loop {
        match reader.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => {
                let room = cap.saturating_sub(kept.len());
                kept.extend_from_slice(&chunk[..n.min(room)]);
            }
            Err(e) => {
                warn!(error = %e, "Failed to read FFmpeg stderr");
                break;
            }
        }
    }

    kept
}

/// Split a packed RGB24 stream into frames until EOF.
///
/// A trailing partial frame is discarded.
pub async fn read_rgb_frames<R>(mut reader: R, width: u32, height: u32) -> MediaResult<Vec<Frame>>
where
    R: AsyncRead + Unpin,
{
    let frame_len = width as usize * height as usize * 3;
    if frame_len == 0 {
        return Err(MediaError::InvalidVideo(format!(
            "Invalid frame dimensions {}x{}",
            width, height
        )));
    }

    let mut frames = Vec::new();

    loop {
        let mut buf = vec![0u8; frame_len];
        let mut filled = 0;

        while filled < frame_len {
            let n = reader.read(&mut buf[filled..]).await?;
            if n == 0 {
                break;
            }
            filled += n;
        }

        if filled == 0 {
            break;
        }

        if filled < frame_len {
            warn!(
                expected = frame_len,
                got = filled,
                "Discarding truncated trailing frame"
            );
            break;
        }

        let image = RgbImage::from_raw(width, height, buf)
            .ok_or_else(|| MediaError::internal("Failed to create image buffer"))?;
        frames.push(Frame::new(frames.len(), image));
    }

    Ok(frames)
}
