//! File I/O primitives with consistent error handling.
//!
//! Every failure becomes `internal.io_error` with the caller's operation
//! name as context.

use crate::error::{Error, Result};
use std::fs;
use std::path::Path;

fn io_error(err: std::io::Error, operation: &str) -> Error {
    Error::internal_io(err.to_string(), Some(operation.to_string()))
}

pub fn read_file(path: &Path, operation: &str) -> Result<String> {
    fs::read_to_string(path).map_err(|e| io_error(e, operation))
}

pub fn write_file(path: &Path, content: &str, operation: &str) -> Result<()> {
    fs::write(path, content).map_err(|e| io_error(e, operation))
}

/// Create `dir` and any missing parents.
pub fn ensure_dir(dir: &Path, operation: &str) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| io_error(e, operation))
}

/// Write to a sibling `.tmp` file, then rename over `path`. Readers see
/// either the old content or the new content.
pub fn write_file_atomic(path: &Path, content: &str, operation: &str) -> Result<()> {
    let (parent, filename) = match (path.parent(), path.file_name()) {
        (Some(parent), Some(filename)) => (parent, filename),
        _ => {
            return Err(Error::internal_io(
                format!("Invalid path: {}", path.display()),
                Some(operation.to_string()),
            ))
        }
    };

    let tmp_path = parent.join(format!("{}.tmp", filename.to_string_lossy()));
    fs::write(&tmp_path, content)
        .map_err(|e| io_error(e, &format!("{} (write temp)", operation)))?;
    fs::rename(&tmp_path, path).map_err(|e| io_error(e, &format!("{} (rename)", operation)))
}
