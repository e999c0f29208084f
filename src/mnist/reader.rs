use std::{
    fs::File,
    io::{BufReader, ErrorKind, Read},
    path::{Path, PathBuf},
};

use byteorder::{BigEndian, ReadBytesExt};

use crate::{
    config::{LoaderConfig, TruncationPolicy},
    mnist::{progress::Progress, MnistError, RawImageSet, RawLabelSet, Result},
};

pub const IMAGE_MAGIC: u32 = 2051;
pub const LABEL_MAGIC: u32 = 2049;

const IMAGE_HEADER_LEN: usize = 16;
const LABEL_HEADER_LEN: usize = 8;
const LABEL_CHUNK: usize = 1024;
// Headers are untrusted, so buffers grow with the bytes actually read past this.
const PREALLOC_LIMIT: usize = 1 << 16;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ImageHeader {
    pub count: usize,
    pub rows: usize,
    pub cols: usize,
    image_len: usize,
    file_len: usize,
}

impl ImageHeader {
    pub fn image_len(&self) -> usize {
        self.image_len
    }

    /// Header plus payload, in bytes.
    pub fn file_len(&self) -> usize {
        self.file_len
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct LabelHeader {
    pub count: usize,
}

struct IdxStream<R: Read> {
    reader: R,
    path: PathBuf,
    position: usize,
}

impl IdxStream<BufReader<File>> {
    fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| MnistError::io(path, e))?;
        Ok(Self::new(BufReader::new(file), path))
    }
}

impl<R: Read> IdxStream<R> {
    fn new(reader: R, path: impl Into<PathBuf>) -> Self {
        Self {
            reader,
            path: path.into(),
            position: 0,
        }
    }

    fn read_word(&mut self, header_len: usize) -> Result<u32> {
        match self.reader.read_u32::<BigEndian>() {
            Ok(word) => {
                self.position += 4;
                Ok(word)
            }
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => Err(MnistError::Truncated {
                path: self.path.clone(),
                expected: header_len,
                read: self.position,
            }),
            Err(e) => Err(MnistError::io(&self.path, e)),
        }
    }

    fn check_magic(&mut self, expected: u32, header_len: usize) -> Result<()> {
        let found = self.read_word(header_len)?;
        if found != expected {
            return Err(MnistError::BadMagic {
                path: self.path.clone(),
                expected,
                found,
            });
        }
        Ok(())
    }

    fn read_image_header(&mut self) -> Result<ImageHeader> {
        self.check_magic(IMAGE_MAGIC, IMAGE_HEADER_LEN)?;
        let count = self.read_word(IMAGE_HEADER_LEN)? as usize;
        let rows = self.read_word(IMAGE_HEADER_LEN)? as usize;
        let cols = self.read_word(IMAGE_HEADER_LEN)? as usize;
        log::debug!(
            "{}: {} images of {}x{}",
            self.path.display(),
            count,
            rows,
            cols
        );

        let image_len = rows.checked_mul(cols);
        let file_len = image_len
            .and_then(|len| len.checked_mul(count))
            .and_then(|len| len.checked_add(IMAGE_HEADER_LEN));
        match (image_len, file_len) {
            (Some(image_len), Some(file_len)) => Ok(ImageHeader {
                count,
                rows,
                cols,
                image_len,
                file_len,
            }),
            _ => Err(MnistError::HeaderOverflow {
                path: self.path.clone(),
                count,
                rows,
                cols,
            }),
        }
    }

    fn read_label_header(&mut self) -> Result<LabelHeader> {
        self.check_magic(LABEL_MAGIC, LABEL_HEADER_LEN)?;
        let count = self.read_word(LABEL_HEADER_LEN)? as usize;
        log::debug!("{}: {} labels", self.path.display(), count);
        Ok(LabelHeader { count })
    }

    // Appends at most `len` bytes to `buf`; fewer only at end of input.
    fn read_into(&mut self, buf: &mut Vec<u8>, len: usize) -> Result<usize> {
        let n = (&mut self.reader)
            .take(len as u64)
            .read_to_end(buf)
            .map_err(|e| MnistError::io(&self.path, e))?;
        self.position += n;
        Ok(n)
    }

    fn truncated(&self, expected: usize, truncation: TruncationPolicy) -> Result<()> {
        match truncation {
            TruncationPolicy::Error => Err(MnistError::Truncated {
                path: self.path.clone(),
                expected,
                read: self.position,
            }),
            TruncationPolicy::ZeroFill => {
                log::warn!(
                    "{} ended after {} of {} bytes, remaining records left zeroed",
                    self.path.display(),
                    self.position,
                    expected
                );
                Ok(())
            }
        }
    }

    fn read_images(
        &mut self,
        header: ImageHeader,
        truncation: TruncationPolicy,
        progress: &mut dyn Progress,
        message: &str,
    ) -> Result<RawImageSet> {
        let len = header.image_len;
        let mut images = Vec::with_capacity(header.count.min(PREALLOC_LIMIT));
        let mut exhausted = false;

        progress.start(header.count as u64, message);
        for _ in 0..header.count {
            let mut image = Vec::with_capacity(len.min(PREALLOC_LIMIT));
            if !exhausted && self.read_into(&mut image, len)? < len {
                exhausted = true;
                self.truncated(header.file_len, truncation)
                    .inspect_err(|_| progress.finish())?;
            }
            image.resize(len, 0);
            images.push(image);
            progress.advance(1);
        }
        progress.finish();

        RawImageSet::new(header.rows, header.cols, images)
    }

    fn read_labels(
        &mut self,
        header: LabelHeader,
        truncation: TruncationPolicy,
        progress: &mut dyn Progress,
        message: &str,
    ) -> Result<RawLabelSet> {
        let mut labels = Vec::with_capacity(header.count.min(PREALLOC_LIMIT));

        progress.start(header.count as u64, message);
        while labels.len() < header.count {
            let wanted = (header.count - labels.len()).min(LABEL_CHUNK);
            let n = self.read_into(&mut labels, wanted)?;
            progress.advance(n as u64);
            if n < wanted {
                self.truncated(header.count.saturating_add(LABEL_HEADER_LEN), truncation)
                    .inspect_err(|_| progress.finish())?;
                progress.advance((header.count - labels.len()) as u64);
                labels.resize(header.count, 0);
            }
        }
        progress.finish();

        Ok(RawLabelSet::new(labels))
    }
}

fn decode_image_pair<A: Read, B: Read>(
    mut train: IdxStream<A>,
    mut test: IdxStream<B>,
    truncation: TruncationPolicy,
    progress: &mut dyn Progress,
) -> Result<(RawImageSet, RawImageSet)> {
    let train_header = train.read_image_header()?;
    let test_header = test.read_image_header()?;

    let train_images =
        train.read_images(train_header, truncation, progress, "Loading train image files")?;
    let test_images =
        test.read_images(test_header, truncation, progress, "Loading test image files")?;

    Ok((train_images, test_images))
}

fn decode_label_pair<A: Read, B: Read>(
    mut train: IdxStream<A>,
    mut test: IdxStream<B>,
    truncation: TruncationPolicy,
    progress: &mut dyn Progress,
) -> Result<(RawLabelSet, RawLabelSet)> {
    let train_header = train.read_label_header()?;
    let test_header = test.read_label_header()?;

    let train_labels =
        train.read_labels(train_header, truncation, progress, "Loading train label files")?;
    let test_labels =
        test.read_labels(test_header, truncation, progress, "Loading test label files")?;

    Ok((train_labels, test_labels))
}

/// Reads `train-images.idx3-ubyte` and `t10k-images.idx3-ubyte` (or the names set in
/// `config`) from `dir`. Both headers are validated before any pixels are read.
pub fn read_image_pair(
    dir: impl AsRef<Path>,
    config: &LoaderConfig,
    progress: &mut dyn Progress,
) -> Result<(RawImageSet, RawImageSet)> {
    let (train_path, test_path) = config.image_paths(dir.as_ref());
    let train = IdxStream::open(&train_path)?;
    let test = IdxStream::open(&test_path)?;
    log::info!("Image files found.");

    decode_image_pair(train, test, config.truncation, progress)
}

/// Label counterpart of [`read_image_pair`].
pub fn read_label_pair(
    dir: impl AsRef<Path>,
    config: &LoaderConfig,
    progress: &mut dyn Progress,
) -> Result<(RawLabelSet, RawLabelSet)> {
    let (train_path, test_path) = config.label_paths(dir.as_ref());
    let train = IdxStream::open(&train_path)?;
    let test = IdxStream::open(&test_path)?;
    log::info!("Label files found.");

    decode_label_pair(train, test, config.truncation, progress)
}

pub fn read_images(
    path: impl AsRef<Path>,
    truncation: TruncationPolicy,
    progress: &mut dyn Progress,
) -> Result<RawImageSet> {
    let mut stream = IdxStream::open(path.as_ref())?;
    let header = stream.read_image_header()?;
    stream.read_images(header, truncation, progress, "Loading image file")
}

pub fn read_labels(
    path: impl AsRef<Path>,
    truncation: TruncationPolicy,
    progress: &mut dyn Progress,
) -> Result<RawLabelSet> {
    let mut stream = IdxStream::open(path.as_ref())?;
    let header = stream.read_label_header()?;
    stream.read_labels(header, truncation, progress, "Loading label file")
}

/// Decodes an image file from any reader. `source` only names it in errors and logs.
pub fn read_images_from(
    reader: impl Read,
    source: impl Into<PathBuf>,
    truncation: TruncationPolicy,
    progress: &mut dyn Progress,
) -> Result<RawImageSet> {
    let mut stream = IdxStream::new(reader, source);
    let header = stream.read_image_header()?;
    stream.read_images(header, truncation, progress, "Loading image file")
}

pub fn read_labels_from(
    reader: impl Read,
    source: impl Into<PathBuf>,
    truncation: TruncationPolicy,
    progress: &mut dyn Progress,
) -> Result<RawLabelSet> {
    let mut stream = IdxStream::new(reader, source);
    let header = stream.read_label_header()?;
    stream.read_labels(header, truncation, progress, "Loading label file")
}
