use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum MnistError {
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("incorrect magic number in {}: expected {expected}, found {found}", .path.display())]
    BadMagic {
        path: PathBuf,
        expected: u32,
        found: u32,
    },
    #[error("{} ended early: expected {expected} bytes, read {read}", .path.display())]
    Truncated {
        path: PathBuf,
        expected: usize,
        read: usize,
    },
    #[error("header of {} declares {count} images of {rows}x{cols}, more bytes than can be addressed", .path.display())]
    HeaderOverflow {
        path: PathBuf,
        count: usize,
        rows: usize,
        cols: usize,
    },
    #[error("record {index} has {actual} values, expected {expected}")]
    ShapeMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },
    #[error("label {value} at index {index} is not a digit")]
    LabelOutOfRange { index: usize, value: u8 },
    #[error("{images} images but {labels} labels")]
    CountMismatch { images: usize, labels: usize },
    #[error("index {index} out of range for {len} records")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("failed to encode {}: {source}", .path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[cfg(feature = "serde")]
    #[error("invalid config {}: {source}", .path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl MnistError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> MnistError {
        MnistError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, MnistError>;
