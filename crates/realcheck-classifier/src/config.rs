//! Classifier configuration.

use std::path::PathBuf;

/// Env var set by the managed host to the directory holding secret files.
pub const SECRET_FILES_DIR_VAR: &str = "RENDER_SECRET_FILES_DIR";

/// Configuration for the ONNX image classifier.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Hosted secret-files directory; when set, the model is looked up only here
    pub secret_files_dir: Option<PathBuf>,
    /// Local model directory
    pub model_dir: PathBuf,
    /// Model file name
    pub model_file: String,
    /// Square input size expected by the model
    pub input_size: u32,
    /// Name of the output tensor
    pub output_name: String,
    /// Index of the "human" class for multi-class outputs
    pub human_class_index: usize,
    /// ONNX Runtime intra-op threads
    pub intra_threads: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            secret_files_dir: None,
            model_dir: PathBuf::from("models"),
            model_file: "image_classifier.onnx".to_string(),
            input_size: 224,
            output_name: "output".to_string(),
            human_class_index: 1,
            intra_threads: 1,
        }
    }
}

impl ClassifierConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            secret_files_dir: std::env::var(SECRET_FILES_DIR_VAR)
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            model_dir: std::env::var("MODEL_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_dir),
            model_file: std::env::var("MODEL_FILE").unwrap_or(defaults.model_file),
            input_size: std::env::var("MODEL_INPUT_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.input_size),
            output_name: std::env::var("MODEL_OUTPUT_NAME").unwrap_or(defaults.output_name),
            human_class_index: std::env::var("MODEL_HUMAN_CLASS_INDEX")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.human_class_index),
            intra_threads: std::env::var("MODEL_THREADS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.intra_threads),
        }
    }

    /// Where the model file is expected.
    ///
    /// The hosted directory wins outright when configured; there is no
    /// fallback to the local directory in that case.
    pub fn model_path(&self) -> PathBuf {
        match &self.secret_files_dir {
            Some(dir) => dir.join(&self.model_file),
            None => self.model_dir.join(&self.model_file),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ClassifierConfig::default();
        assert_eq!(config.model_path(), PathBuf::from("models/image_classifier.onnx"));
        assert_eq!(config.input_size, 224);
        assert_eq!(config.human_class_index, 1);
    }

    #[test]
    fn test_secret_dir_takes_precedence() {
        let config = ClassifierConfig {
            secret_files_dir: Some(PathBuf::from("/etc/secrets")),
            ..ClassifierConfig::default()
        };
        assert_eq!(config.model_path(), PathBuf::from("/etc/secrets/image_classifier.onnx"));
    }
}
