use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub const PROJECT_DIR: &str = ".orizuru";
pub const SETTINGS_FILE: &str = "config.json";
pub const APP_JSON: &str = "app.json";
pub const CERTIFICATE_FILE: &str = "certificate.pem";
pub const PRIVATE_KEY_FILE: &str = "key.pem";

/// Project root: the current working directory.
pub fn project_root() -> Result<PathBuf> {
    std::env::current_dir()
        .map_err(|e| Error::internal_io(e.to_string(), Some("resolve project root".to_string())))
}

/// Hidden per-project directory (`<root>/.orizuru`).
pub fn project_dir(root: &Path) -> PathBuf {
    root.join(PROJECT_DIR)
}

pub fn settings_file(root: &Path) -> PathBuf {
    project_dir(root).join(SETTINGS_FILE)
}

pub fn app_json(root: &Path) -> PathBuf {
    root.join(APP_JSON)
}

/// Directory the certificate step writes its PEM files into.
pub fn certificate_dir(root: &Path) -> PathBuf {
    project_dir(root).join("certificate")
}

/// Expand `~` and environment variables, then resolve against `base`.
pub fn resolve_user_path(base: &Path, raw: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(raw).map_err(|e| {
        Error::validation_invalid_argument(
            "path",
            format!("Could not expand path '{}': {}", raw, e),
            Some(raw.to_string()),
            None,
        )
    })?;
    let path = PathBuf::from(expanded.as_ref());
    if path.is_absolute() {
        Ok(path)
    } else {
        Ok(base.join(path))
    }
}
