//! MNIST loader: decodes the IDX image/label files into raw byte sets, normalizes them
//! into `ndarray` matrices and renders single records back out as PNG.

pub mod config;
pub mod datapoint;
pub mod error;
pub mod filesystem;
pub mod mnist;

pub use config::{LoaderConfig, ProgressKind, TruncationPolicy};
pub use datapoint::DataPoint;
pub use error::{MnistError, Result};
pub use mnist::{ImageRecord, MnistDataset, RawImageSet, RawLabelSet, Split};
