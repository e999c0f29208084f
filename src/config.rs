use std::path::Path;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "serde")]
use crate::error::{MnistError, Result};

pub const TRAIN_IMAGES_FILENAME: &str = "train-images.idx3-ubyte";
pub const TEST_IMAGES_FILENAME: &str = "t10k-images.idx3-ubyte";
pub const TRAIN_LABELS_FILENAME: &str = "train-labels.idx1-ubyte";
pub const TEST_LABELS_FILENAME: &str = "t10k-labels.idx1-ubyte";

/// What to do when a file's payload ends before its header's item count is reached.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Default, Clone, Copy, PartialEq, Eq, Debug)]
pub enum TruncationPolicy {
    /// Fail the load with `MnistError::Truncated`.
    #[default]
    Error,
    /// Stop reading and leave the remaining slots zeroed.
    ZeroFill,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Default, Clone, Copy, PartialEq, Eq, Debug)]
pub enum ProgressKind {
    #[default]
    Bar,
    Log,
    Silent,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Clone, PartialEq, Debug)]
pub struct LoaderConfig {
    pub train_images: String,
    pub test_images: String,
    pub train_labels: String,
    pub test_labels: String,
    pub truncation: TruncationPolicy,
    pub progress: ProgressKind,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            train_images: TRAIN_IMAGES_FILENAME.to_string(),
            test_images: TEST_IMAGES_FILENAME.to_string(),
            train_labels: TRAIN_LABELS_FILENAME.to_string(),
            test_labels: TEST_LABELS_FILENAME.to_string(),
            truncation: TruncationPolicy::default(),
            progress: ProgressKind::default(),
        }
    }
}

impl LoaderConfig {
    #[cfg(feature = "serde")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| MnistError::io(path, e))?;
        let config = serde_json::from_str(&json).map_err(|source| MnistError::Config {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("Loaded config {}", path.display());
        Ok(config)
    }

    pub fn with_truncation(mut self, truncation: TruncationPolicy) -> Self {
        self.truncation = truncation;
        self
    }

    pub fn with_progress(mut self, progress: ProgressKind) -> Self {
        self.progress = progress;
        self
    }

    // (train, test)
    pub fn image_paths(&self, dir: &Path) -> (std::path::PathBuf, std::path::PathBuf) {
        (dir.join(&self.train_images), dir.join(&self.test_images))
    }

    // (train, test)
    pub fn label_paths(&self, dir: &Path) -> (std::path::PathBuf, std::path::PathBuf) {
        (dir.join(&self.train_labels), dir.join(&self.test_labels))
    }
}
