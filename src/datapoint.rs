#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::mnist::{
    normalize::NUM_CLASSES, MnistDataset, MnistError, RawImageSet, RawLabelSet, Result, Split,
};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct DataPoint {
    pub inputs: Vec<f32>,
    pub expected_outputs: Vec<f32>,
}

impl DataPoint {
    pub fn from_raw(image: &[u8], label: u8, index: usize) -> Result<DataPoint> {
        if label as usize >= NUM_CLASSES {
            return Err(MnistError::LabelOutOfRange {
                index,
                value: label,
            });
        }
        let mut expected_outputs = vec![0.0; NUM_CLASSES];
        expected_outputs[label as usize] = 1.0;

        Ok(DataPoint {
            inputs: image.iter().map(|&v| v as f32 / 255.0).collect(),
            expected_outputs,
        })
    }

    /// Index of the hot output, i.e. the digit.
    pub fn digit(&self) -> Option<usize> {
        self.expected_outputs.iter().position(|&v| v == 1.0)
    }
}

pub fn datapoints_from_raw(images: &RawImageSet, labels: &RawLabelSet) -> Result<Vec<DataPoint>> {
    if images.len() != labels.len() {
        return Err(MnistError::CountMismatch {
            images: images.len(),
            labels: labels.len(),
        });
    }

    images
        .iter()
        .zip(labels.iter())
        .enumerate()
        .map(|(index, (image, label))| DataPoint::from_raw(image, label, index))
        .collect()
}

impl MnistDataset {
    pub fn datapoints(&self, split: Split) -> Result<Vec<DataPoint>> {
        datapoints_from_raw(self.images(split), self.labels(split))
    }
}
