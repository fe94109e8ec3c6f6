use std::path::{Path, PathBuf};

use serde_json::Value;

use super::emitter::GeneratedTransport;
use crate::error::{Error, Result};
use crate::utils::io;

pub const SOURCE_FILE: &str = "OrizuruTransport.cls";
pub const DESCRIPTOR_FILE: &str = "OrizuruTransport.cls-meta.xml";

/// Every `.avsc` file below `dir`, in sorted path order.
pub fn find_schema_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::validation_invalid_argument(
            "input",
            format!("Input directory does not exist: {}", dir.display()),
            Some(dir.display().to_string()),
            None,
        ));
    }

    let pattern = dir.join("**").join("*.avsc");
    let pattern = pattern.to_string_lossy();
    let entries = glob::glob(&pattern).map_err(|e| {
        Error::validation_invalid_argument("input", e.to_string(), Some(pattern.to_string()), None)
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| {
            Error::internal_io(e.to_string(), Some("scan for .avsc files".to_string()))
        })?;
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Parse each file as JSON, naming the offending file on failure.
pub fn read_schemas(files: &[PathBuf]) -> Result<Vec<Value>> {
    files
        .iter()
        .map(|path| {
            let content = io::read_file(path, "read schema")?;
            serde_json::from_str(&content)
                .map_err(|e| Error::validation_invalid_json(e, Some(path.display().to_string())))
        })
        .collect()
}

/// Write the generated source and descriptor, replacing existing files.
pub fn write_outputs(dir: &Path, generated: &GeneratedTransport) -> Result<Vec<PathBuf>> {
    io::ensure_dir(dir, "create output directory")?;

    let source = dir.join(SOURCE_FILE);
    let descriptor = dir.join(DESCRIPTOR_FILE);
    io::write_file(&source, &generated.source, "write transport source")?;
    io::write_file(&descriptor, &generated.descriptor, "write transport descriptor")?;

    Ok(vec![source, descriptor])
}
