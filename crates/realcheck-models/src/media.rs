//! Upload media kinds and extension tables.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Extensions accepted by the upload endpoint.
pub const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "mp4", "avi", "mov", "wmv"];

/// Extensions routed through the video path.
///
/// Maintained separately from [`ALLOWED_EXTENSIONS`]: `flv`, `mkv` and `webm`
/// are listed here but rejected at upload time, so they never reach dispatch.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "wmv", "flv", "mkv", "webm"];

/// Kind of uploaded media.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    /// Single still image, scored once
    Image,
    /// Video, scored over sampled frames
    Video,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }

    /// Classify a staged file by its extension. Anything not in
    /// [`VIDEO_EXTENSIONS`] is treated as an image.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let is_video = path
            .as_ref()
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .is_some_and(|ext| VIDEO_EXTENSIONS.contains(&ext.as_str()));

        if is_video {
            MediaKind::Video
        } else {
            MediaKind::Image
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lowercased text after the last `.` of a client-supplied filename.
pub fn extension_of(filename: &str) -> Option<String> {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
}

/// Whether a client-supplied filename carries an allowed extension.
pub fn is_allowed_file(filename: &str) -> bool {
    extension_of(filename).is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
}
