//! Staging area implementation.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::error::{StorageError, StorageResult};

/// Upper bound on `_N` suffixes tried for one name.
const MAX_COLLISION_SUFFIX: u32 = 10_000;

/// Configuration for the staging area.
#[derive(Debug, Clone)]
pub struct StagingConfig {
    /// Directory holding in-flight uploads
    pub upload_dir: PathBuf,
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("uploads"),
        }
    }
}

impl StagingConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            upload_dir: std::env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("uploads")),
        }
    }
}

/// A file written to the staging area for the lifetime of one request.
#[derive(Debug, Clone)]
pub struct StagedFile {
    path: PathBuf,
    size: u64,
}

impl StagedFile {
    /// Full staging path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name actually used on disk, including any collision suffix.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    /// Bytes written.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Delete the staged file.
    ///
    /// Returns `Ok(false)` when the file was already gone.
    pub async fn remove(&self) -> StorageResult<bool> {
        match fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!(path = %self.path.display(), "Staged file deleted");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(path = %self.path.display(), "Staged file not found for deletion");
                Ok(false)
            }
            Err(e) => Err(StorageError::delete_failed(format!(
                "{}: {}",
                self.path.display(),
                e
            ))),
        }
    }
}

/// Transient local storage for in-flight uploads.
#[derive(Debug, Clone)]
pub struct StagingArea {
    root: PathBuf,
}

impl StagingArea {
    /// Open the staging area, creating its directory if needed.
    pub async fn open(config: &StagingConfig) -> StorageResult<Self> {
        fs::create_dir_all(&config.upload_dir)
            .await
            .map_err(|source| StorageError::Setup {
                path: config.upload_dir.clone(),
                source,
            })?;

        info!(dir = %config.upload_dir.display(), "Staging directory ready");

        Ok(Self {
            root: config.upload_dir.clone(),
        })
    }

    /// Staging directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `data` under `name`, or under `name_1`, `name_2`, ... if taken.
    ///
    /// Each candidate is claimed with `create_new`, so two concurrent uploads
    /// of the same name always land in different files. `name` must already
    /// be sanitized.
    pub async fn stage(&self, name: &str, data: &[u8]) -> StorageResult<StagedFile> {
        if name.is_empty() || name.contains('/') || name.contains('\\') {
            return Err(StorageError::invalid_name(name));
        }

        let (path, mut file) = self.claim(name).await?;

        let written = async {
            file.write_all(data).await?;
            file.flush().await?;
            file.sync_all().await
        }
        .await;

        if let Err(e) = written {
            drop(file);
            if let Err(cleanup) = fs::remove_file(&path).await {
                warn!(path = %path.display(), error = %cleanup, "Failed to remove partial upload");
            }
            return Err(StorageError::write_failed(format!("{}: {}", path.display(), e)));
        }

        info!(path = %path.display(), size = data.len(), "Upload staged");

        Ok(StagedFile {
            path,
            size: data.len() as u64,
        })
    }

    /// Create a uniquely named scratch file in the staging directory.
    ///
    /// The file is deleted when the returned handle drops.
    pub fn scratch_file(&self, prefix: &str, suffix: &str) -> StorageResult<NamedTempFile> {
        let file = tempfile::Builder::new()
            .prefix(prefix)
            .suffix(suffix)
            .tempfile_in(&self.root)?;
        Ok(file)
    }

    /// Claim the first free candidate name.
    async fn claim(&self, name: &str) -> StorageResult<(PathBuf, fs::File)> {
        for attempt in 0..=MAX_COLLISION_SUFFIX {
            let candidate = self.root.join(candidate_name(name, attempt));

            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&candidate)
                .await
            {
                Ok(file) => {
                    if attempt > 0 {
                        warn!(
                            requested = name,
                            used = %candidate.display(),
                            "Staging name taken, using suffixed name"
                        );
                    }
                    return Ok((candidate, file));
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(StorageError::Io(e)),
            }
        }

        Err(StorageError::NamesExhausted(name.to_string()))
    }
}

/// `photo.png` -> `photo.png`, `photo_1.png`, `photo_2.png`, ...
fn candidate_name(name: &str, attempt: u32) -> String {
    if attempt == 0 {
        return name.to_string();
    }

    let path = Path::new(name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| name.to_string());

    match path.extension() {
        Some(ext) => format!("{}_{}.{}", stem, attempt, ext.to_string_lossy()),
        None => format!("{}_{}", stem, attempt),
    }
}
