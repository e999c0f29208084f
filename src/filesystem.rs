use std::{
    fs::{self, File},
    io::BufWriter,
    path::{Path, PathBuf},
};

use crate::error::{MnistError, Result};

/// Creates `dir` if needed and opens `dir/file_name` for writing.
pub fn create_output_file(dir: &Path, file_name: &str) -> Result<(PathBuf, BufWriter<File>)> {
    fs::create_dir_all(dir).map_err(|e| MnistError::io(dir, e))?;
    let path = dir.join(file_name);
    let file = File::create(&path).map_err(|e| MnistError::io(&path, e))?;
    Ok((path, BufWriter::new(file)))
}
