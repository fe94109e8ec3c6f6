//! Persisted per-project settings (`.orizuru/config.json`).
//!
//! The file is an opaque nested JSON object. Reads of a missing file yield an
//! empty object; every write rewrites the whole file atomically.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::configuration::{get_path, set_path};
use crate::error::{Error, Result};
use crate::paths;
use crate::utils::io;

#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store for the project rooted at `root`.
    pub fn for_project(root: &Path) -> Self {
        Self::new(paths::settings_file(root))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Value> {
        if !self.path.exists() {
            return Ok(Value::Object(Map::new()));
        }
        let content = io::read_file(&self.path, "read settings")?;
        if content.trim().is_empty() {
            return Ok(Value::Object(Map::new()));
        }
        let value: Value = serde_json::from_str(&content)
            .map_err(|e| Error::config_invalid_json(self.path.display().to_string(), e))?;
        if !value.is_object() {
            return Err(Error::config_invalid_value(
                self.path.display().to_string(),
                None,
                "Settings file must contain a JSON object",
            ));
        }
        Ok(value)
    }

    pub fn read_setting(&self, key: &str) -> Result<Option<Value>> {
        let settings = self.load()?;
        Ok(get_path(&settings, key).cloned())
    }

    /// Set one dotted-path key and persist the whole file.
    pub fn write_setting(&self, key: &str, value: Value) -> Result<Value> {
        let mut settings = self.load()?;
        set_path(&mut settings, key, value)?;

        if let Some(parent) = self.path.parent() {
            io::ensure_dir(parent, "create settings directory")?;
        }
        let content = serde_json::to_string_pretty(&settings)
            .map_err(|e| Error::internal_json(e.to_string(), Some("serialize settings".to_string())))?;
        io::write_file_atomic(&self.path, &content, "write settings")?;
        tracing::debug!(key, path = %self.path.display(), "setting written");

        Ok(settings)
    }
}
