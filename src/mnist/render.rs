use std::{
    io::{Seek, Write},
    path::{Path, PathBuf},
};

use image::{GrayImage, ImageFormat, Luma};

use crate::{
    filesystem::create_output_file,
    mnist::{ImageRecord, MnistError, Result},
};

/// `"{prefix} - {label}.png"`
pub fn render_filename(prefix: &str, label: u8) -> String {
    format!("{prefix} - {label}.png")
}

impl ImageRecord<'_> {
    /// Stored bytes are ink intensity, so each pixel is flipped to `255 - v`.
    pub fn to_gray_image(&self) -> Result<GrayImage> {
        let shape_err = |_| MnistError::ShapeMismatch {
            index: 0,
            expected: self.rows() * self.cols(),
            actual: self.data().len(),
        };
        let width = u32::try_from(self.cols()).map_err(shape_err)?;
        let height = u32::try_from(self.rows()).map_err(shape_err)?;

        Ok(GrayImage::from_fn(width, height, |x, y| {
            Luma([255 - self.pixel(y as usize, x as usize)])
        }))
    }

    /// Writes the record as a PNG into `out_dir` and returns the file's path.
    pub fn render(&self, out_dir: impl AsRef<Path>, prefix: &str) -> Result<PathBuf> {
        let image = self.to_gray_image()?;
        let (path, mut writer) =
            create_output_file(out_dir.as_ref(), &render_filename(prefix, self.label()))?;
        encode_png(&image, &mut writer, &path)?;
        writer.flush().map_err(|e| MnistError::io(&path, e))?;
        log::info!("Rendered {}", path.display());
        Ok(path)
    }
}

/// `path` only names the destination in errors.
pub fn encode_png<W: Write + Seek>(image: &GrayImage, writer: &mut W, path: &Path) -> Result<()> {
    image
        .write_to(writer, ImageFormat::Png)
        .map_err(|source| MnistError::Encode {
            path: path.to_path_buf(),
            source,
        })
}

pub fn render(
    data: &[u8],
    label: u8,
    rows: usize,
    cols: usize,
    out_dir: impl AsRef<Path>,
    prefix: &str,
) -> Result<PathBuf> {
    ImageRecord::new(data, label, rows, cols)?.render(out_dir, prefix)
}

#[cfg(test)]
mod tests {
    use std::{fs, io, io::SeekFrom};

    use super::*;

    struct BrokenDisk;

    impl Write for BrokenDisk {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Seek for BrokenDisk {
        fn seek(&mut self, _pos: SeekFrom) -> io::Result<u64> {
            Ok(0)
        }
    }

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "zaoai-mnist-render-{}-{name}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn pixels_are_inverted_row_major() {
        let record = ImageRecord::new(&[0, 255, 128, 64], 7, 2, 2).unwrap();
        let image = record.to_gray_image().unwrap();
        assert_eq!(image.dimensions(), (2, 2));
        assert_eq!(image.into_raw(), vec![255, 0, 127, 191]);
    }

    #[test]
    fn non_square_dimensions() {
        let record = ImageRecord::new(&[1, 2, 3, 4, 5, 6], 0, 2, 3).unwrap();
        let image = record.to_gray_image().unwrap();
        // width = cols, height = rows
        assert_eq!(image.dimensions(), (3, 2));
        assert_eq!(image.get_pixel(2, 1), &Luma([249]));
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn dimensions_past_u32_are_rejected() {
        let record = ImageRecord::new(&[], 0, 0, u32::MAX as usize + 1).unwrap();
        assert!(matches!(
            record.to_gray_image(),
            Err(MnistError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn filename_uses_label() {
        assert_eq!(render_filename("sample", 7), "sample - 7.png");
    }

    #[test]
    fn short_data_is_rejected() {
        let result = render(&[0, 1, 2], 1, 2, 2, std::env::temp_dir(), "short");
        assert!(matches!(result, Err(MnistError::ShapeMismatch { .. })));
    }

    #[test]
    fn encoder_failure_names_the_output() {
        let record = ImageRecord::new(&[0, 255, 128, 64], 7, 2, 2).unwrap();
        let image = record.to_gray_image().unwrap();
        let path = Path::new("out").join("digit - 7.png");

        match encode_png(&image, &mut BrokenDisk, &path) {
            Err(MnistError::Encode { path: failed, .. }) => assert_eq!(failed, path),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn output_dir_that_is_a_file() {
        let dir = temp_dir("file-as-dir");
        let not_a_dir = dir.join("taken");
        fs::write(&not_a_dir, b"x").unwrap();

        let result = render(&[0, 1, 2, 3], 3, 2, 2, &not_a_dir, "digit");
        match result {
            Err(MnistError::Io { path, .. }) => assert_eq!(path, not_a_dir),
            other => panic!("unexpected result: {other:?}"),
        }

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn output_file_that_is_a_directory() {
        let dir = temp_dir("dir-as-file");
        let target = dir.join(render_filename("digit", 3));
        fs::create_dir_all(&target).unwrap();

        let result = render(&[0, 1, 2, 3], 3, 2, 2, &dir, "digit");
        match result {
            Err(MnistError::Io { path, .. }) => assert_eq!(path, target),
            other => panic!("unexpected result: {other:?}"),
        }

        fs::remove_dir_all(&dir).unwrap();
    }
}
