//! Atomic output.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::GenerateError;

/// Write `contents` to `path` through a temporary file in the same directory.
///
/// The destination is replaced only once the whole file has been written, so a
/// failed run never leaves a partial file behind.
///
/// # Errors
///
/// [`GenerateError::Io`] naming the path that failed.
pub fn write_atomic(path: &Path, contents: &str) -> Result<(), GenerateError> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir).map_err(|err| GenerateError::io(dir, err))?;
    tmp.write_all(contents.as_bytes())
        .and_then(|()| tmp.flush())
        .map_err(|err| GenerateError::io(tmp.path(), err))?;
    tmp.persist(path)
        .map_err(|err| GenerateError::io(path, err.error))?;
    Ok(())
}
