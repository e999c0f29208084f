pub mod normalize;
pub mod progress;
pub mod reader;
pub mod render;

use std::{fmt::Display, path::Path};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::LoaderConfig;
pub use crate::error::{MnistError, Result};
use progress::Progress;

/// Flat row-major pixel buffers sharing one `rows` x `cols` shape.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct RawImageSet {
    rows: usize,
    cols: usize,
    images: Vec<Vec<u8>>,
}

impl RawImageSet {
    pub fn new(rows: usize, cols: usize, images: Vec<Vec<u8>>) -> Result<Self> {
        if let Some((index, image)) = images
            .iter()
            .enumerate()
            .find(|(_, image)| image.len() != rows * cols)
        {
            return Err(MnistError::ShapeMismatch {
                index,
                expected: rows * cols,
                actual: image.len(),
            });
        }
        Ok(Self { rows, cols, images })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&[u8]> {
        self.images.get(index).map(|image| image.as_slice())
    }

    pub fn images(&self) -> &[Vec<u8>] {
        &self.images
    }

    pub fn iter(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.images.iter().map(|image| image.as_slice())
    }

    pub fn into_images(self) -> Vec<Vec<u8>> {
        self.images
    }
}

#[derive(Clone, PartialEq, Debug, Default)]
pub struct RawLabelSet {
    labels: Vec<u8>,
}

impl RawLabelSet {
    pub fn new(labels: Vec<u8>) -> Self {
        Self { labels }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<u8> {
        self.labels.get(index).copied()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.labels
    }

    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        self.labels.iter().copied()
    }

    /// Occurrences of each digit. Values above 9 are not counted.
    pub fn histogram(&self) -> [usize; 10] {
        let mut counts = [0; 10];
        for label in self.iter().filter(|&l| l < 10) {
            counts[label as usize] += 1;
        }
        counts
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.labels
    }
}

/// Borrowed view over one image and its label.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct ImageRecord<'a> {
    data: &'a [u8],
    label: u8,
    rows: usize,
    cols: usize,
}

impl<'a> ImageRecord<'a> {
    pub fn new(data: &'a [u8], label: u8, rows: usize, cols: usize) -> Result<Self> {
        if data.len() < rows * cols {
            return Err(MnistError::ShapeMismatch {
                index: 0,
                expected: rows * cols,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            label,
            rows,
            cols,
        })
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn label(&self) -> u8 {
        self.label
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn pixel(&self, row: usize, col: usize) -> u8 {
        self.data[row * self.cols + col]
    }
}

impl Display for ImageRecord<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in 0..self.rows {
            let line: String = (0..self.cols)
                .map(|col| match self.pixel(row, col) {
                    0 => ' ',
                    1..=63 => '.',
                    64..=127 => '+',
                    128..=191 => '*',
                    _ => '#',
                })
                .collect();
            writeln!(f, "{}", line.trim_end())?;
        }
        write!(f, "Label: {}", self.label)
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Split {
    Train,
    Test,
}

impl Display for Split {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Split::Train => write!(f, "train"),
            Split::Test => write!(f, "test"),
        }
    }
}

/// All four MNIST files, loaded together.
#[derive(Clone, Debug, Default)]
pub struct MnistDataset {
    pub train_images: RawImageSet,
    pub train_labels: RawLabelSet,
    pub test_images: RawImageSet,
    pub test_labels: RawLabelSet,
}

impl MnistDataset {
    pub fn load(dir: impl AsRef<Path>, config: &LoaderConfig) -> Result<Self> {
        let mut progress = progress::progress_for(config.progress);
        Self::load_with_progress(dir, config, progress.as_mut())
    }

    pub fn load_with_progress(
        dir: impl AsRef<Path>,
        config: &LoaderConfig,
        progress: &mut dyn Progress,
    ) -> Result<Self> {
        let dir = dir.as_ref();
        let (train_images, test_images) = reader::read_image_pair(dir, config, progress)?;
        let (train_labels, test_labels) = reader::read_label_pair(dir, config, progress)?;

        for (images, labels) in [(&train_images, &train_labels), (&test_images, &test_labels)] {
            if images.len() != labels.len() {
                return Err(MnistError::CountMismatch {
                    images: images.len(),
                    labels: labels.len(),
                });
            }
        }

        log::info!(
            "Loaded MNIST from {}: {} train, {} test",
            dir.display(),
            train_images.len(),
            test_images.len()
        );

        Ok(Self {
            train_images,
            train_labels,
            test_images,
            test_labels,
        })
    }

    pub fn images(&self, split: Split) -> &RawImageSet {
        match split {
            Split::Train => &self.train_images,
            Split::Test => &self.test_images,
        }
    }

    pub fn labels(&self, split: Split) -> &RawLabelSet {
        match split {
            Split::Train => &self.train_labels,
            Split::Test => &self.test_labels,
        }
    }

    pub fn record(&self, split: Split, index: usize) -> Result<ImageRecord<'_>> {
        let images = self.images(split);
        let labels = self.labels(split);
        match (images.get(index), labels.get(index)) {
            (Some(data), Some(label)) => ImageRecord::new(data, label, images.rows(), images.cols()),
            _ => Err(MnistError::IndexOutOfRange {
                index,
                len: images.len().min(labels.len()),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_dataset() -> MnistDataset {
        MnistDataset {
            train_images: RawImageSet::new(2, 2, vec![vec![0, 255, 128, 64]]).unwrap(),
            train_labels: RawLabelSet::new(vec![7]),
            test_images: RawImageSet::new(2, 2, vec![]).unwrap(),
            test_labels: RawLabelSet::new(vec![]),
        }
    }

    #[test]
    fn raw_image_set_rejects_wrong_length() {
        let result = RawImageSet::new(2, 2, vec![vec![0; 4], vec![0; 3]]);
        assert!(matches!(
            result,
            Err(MnistError::ShapeMismatch {
                index: 1,
                expected: 4,
                actual: 3
            })
        ));
    }

    #[test]
    fn record_lookup() {
        let dataset = tiny_dataset();
        let record = dataset.record(Split::Train, 0).unwrap();
        assert_eq!(record.label(), 7);
        assert_eq!(record.pixel(1, 0), 128);
        assert!(matches!(
            dataset.record(Split::Test, 0),
            Err(MnistError::IndexOutOfRange { index: 0, len: 0 })
        ));
    }

    #[test]
    fn record_prints_as_ascii() {
        let dataset = tiny_dataset();
        let record = dataset.record(Split::Train, 0).unwrap();
        assert_eq!(record.to_string(), " #\n*+\nLabel: 7");
    }

    #[test]
    fn histogram_skips_non_digits() {
        let labels = RawLabelSet::new(vec![1, 1, 9, 42]);
        let histogram = labels.histogram();
        assert_eq!(histogram[1], 2);
        assert_eq!(histogram[9], 1);
        assert_eq!(histogram.iter().sum::<usize>(), 3);
    }
}
