use ndarray::Array2;

use crate::mnist::{
    progress::{NoProgress, Progress},
    MnistError, RawImageSet, Result,
};

pub const NUM_CLASSES: usize = 10;

pub type NormalizedImage = Array2<f64>;
/// Column vector of shape (10, 1).
pub type NormalizedLabel = Array2<f64>;

pub fn normalize_pixel(value: u8) -> f64 {
    value as f64 / 255.0
}

/// `rows` x `cols` matrix of `image` scaled into [0, 1].
pub fn normalize_image(image: &[u8], rows: usize, cols: usize) -> Result<NormalizedImage> {
    let values = image.iter().map(|&v| normalize_pixel(v)).collect();
    Array2::from_shape_vec((rows, cols), values).map_err(|_| MnistError::ShapeMismatch {
        index: 0,
        expected: rows * cols,
        actual: image.len(),
    })
}

pub fn one_hot(label: u8) -> Result<NormalizedLabel> {
    let index = label as usize;
    if index >= NUM_CLASSES {
        return Err(MnistError::LabelOutOfRange { index: 0, value: label });
    }
    let mut vector = Array2::zeros((NUM_CLASSES, 1));
    vector[[index, 0]] = 1.0;
    Ok(vector)
}

pub fn normalize_images<I>(images: &[I], rows: usize, cols: usize) -> Result<Vec<NormalizedImage>>
where
    I: AsRef<[u8]>,
{
    normalize_images_with_progress(images, rows, cols, &mut NoProgress)
}

pub fn normalize_images_with_progress<I>(
    images: &[I],
    rows: usize,
    cols: usize,
    progress: &mut dyn Progress,
) -> Result<Vec<NormalizedImage>>
where
    I: AsRef<[u8]>,
{
    let mut mats = Vec::with_capacity(images.len());
    progress.start(images.len() as u64, "Converting images to Array2");
    for (index, image) in images.iter().enumerate() {
        let mat = normalize_image(image.as_ref(), rows, cols).map_err(|e| match e {
            MnistError::ShapeMismatch {
                expected, actual, ..
            } => MnistError::ShapeMismatch {
                index,
                expected,
                actual,
            },
            e => e,
        });
        mats.push(mat.inspect_err(|_| progress.finish())?);
        progress.advance(1);
    }
    progress.finish();
    Ok(mats)
}

/// Normalizes a whole set using the shape recorded in it.
pub fn normalize_image_set(set: &RawImageSet) -> Result<Vec<NormalizedImage>> {
    normalize_images(set.images(), set.rows(), set.cols())
}

pub fn normalize_labels(labels: &[u8]) -> Result<Vec<NormalizedLabel>> {
    normalize_labels_with_progress(labels, &mut NoProgress)
}

pub fn normalize_labels_with_progress(
    labels: &[u8],
    progress: &mut dyn Progress,
) -> Result<Vec<NormalizedLabel>> {
    let mut mats = Vec::with_capacity(labels.len());
    progress.start(labels.len() as u64, "Converting labels to Array2");
    for (index, &label) in labels.iter().enumerate() {
        let vector = one_hot(label).map_err(|e| match e {
            MnistError::LabelOutOfRange { value, .. } => {
                MnistError::LabelOutOfRange { index, value }
            }
            e => e,
        });
        mats.push(vector.inspect_err(|_| progress.finish())?);
        progress.advance(1);
    }
    progress.finish();
    Ok(mats)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(mat: &NormalizedImage, expected: [[f64; 2]; 2]) {
        for (r, row) in expected.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                assert!(
                    (mat[[r, c]] - value).abs() < 5e-4,
                    "[{r},{c}] = {} expected {value}",
                    mat[[r, c]]
                );
            }
        }
    }

    #[test]
    fn two_by_two_images() {
        let images = vec![vec![0u8, 255, 128, 64], vec![10, 20, 30, 40]];
        let mats = normalize_images(&images, 2, 2).unwrap();
        assert_eq!(mats.len(), 2);
        assert_eq!(mats[0].dim(), (2, 2));
        assert_close(&mats[0], [[0.0, 1.0], [0.502, 0.251]]);
        assert_close(&mats[1], [[0.039, 0.078], [0.118, 0.157]]);
    }

    #[test]
    fn pixel_round_trip() {
        for v in 0..=255u8 {
            assert_eq!((normalize_pixel(v) * 255.0).round() as u8, v);
        }
    }

    #[test]
    fn shape_mismatch_reports_index() {
        let images = vec![vec![0u8; 4], vec![0u8; 5]];
        assert!(matches!(
            normalize_images(&images, 2, 2),
            Err(MnistError::ShapeMismatch {
                index: 1,
                expected: 4,
                actual: 5
            })
        ));
    }

    #[test]
    fn label_three() {
        let mats = normalize_labels(&[3]).unwrap();
        assert_eq!(mats[0].dim(), (10, 1));
        assert_eq!(
            mats[0].iter().copied().collect::<Vec<_>>(),
            vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]
        );
    }

    #[test]
    fn labels_are_idempotent() {
        let first = normalize_labels(&[0, 9, 4]).unwrap();
        let second = normalize_labels(&[0, 9, 4]).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn single_label_out_of_range() {
        assert!(matches!(
            one_hot(10),
            Err(MnistError::LabelOutOfRange { value: 10, .. })
        ));
    }

    #[test]
    fn label_out_of_range() {
        assert!(matches!(
            normalize_labels(&[1, 2, 10]),
            Err(MnistError::LabelOutOfRange { index: 2, value: 10 })
        ));
    }
}
