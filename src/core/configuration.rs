//! Shared workflow state.
//!
//! A `Configuration` is created once per CLI invocation, seeded from the
//! invocation flags, and handed by `&mut` to each workflow step in turn.
//! Values live in a nested JSON object addressed by dotted paths
//! (`heroku.app.name`); typed accessors turn a missing or mistyped key into a
//! descriptive error instead of a silent `undefined`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::process::CommandOptions;

/// Global CLI flags that every step may consult.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationOptions {
    pub silent: bool,
    pub verbose: bool,
    pub debug: bool,
}

impl InvocationOptions {
    /// Shared command options derived from the flags.
    pub fn command_options(&self) -> CommandOptions {
        CommandOptions {
            silent: Some(self.silent),
            verbose: Some(self.verbose),
            ..CommandOptions::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    pub argv: InvocationOptions,
    values: Value,
}

impl Default for Configuration {
    fn default() -> Self {
        Self::new(InvocationOptions::default())
    }
}

impl Configuration {
    pub fn new(argv: InvocationOptions) -> Self {
        Self {
            argv,
            values: Value::Object(Map::new()),
        }
    }

    /// Seed with existing values; anything but an object starts empty.
    pub fn with_values(argv: InvocationOptions, values: Value) -> Self {
        let values = match values {
            Value::Object(_) => values,
            _ => Value::Object(Map::new()),
        };
        Self { argv, values }
    }

    pub fn values(&self) -> &Value {
        &self.values
    }

    pub fn command_options(&self) -> CommandOptions {
        self.argv.command_options()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some_and(|v| !v.is_null())
    }

    pub fn get(&self, path: &str) -> Option<&Value> {
        get_path(&self.values, path)
    }

    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    pub fn get_bool(&self, path: &str) -> Option<bool> {
        self.get(path).and_then(Value::as_bool)
    }

    pub fn require_str(&self, path: &str) -> Result<&str> {
        match self.get(path) {
            Some(Value::String(s)) => Ok(s),
            Some(other) => Err(Error::config_invalid_value(
                path,
                Some(other.to_string()),
                "Expected a string",
            )),
            None => Err(Error::config_missing_key(path, None)),
        }
    }

    /// Deserialize the value at `path`; `Ok(None)` when absent or null.
    pub fn get_as<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        match self.get(path) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|e| Error::config_invalid_value(path, Some(value.to_string()), e.to_string())),
        }
    }

    pub fn require<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.get_as(path)?
            .ok_or_else(|| Error::config_missing_key(path, None))
    }

    pub fn set<T: Serialize>(&mut self, path: &str, value: T) -> Result<()> {
        let value = serde_json::to_value(value)
            .map_err(|e| Error::internal_json(e.to_string(), Some(format!("set {}", path))))?;
        set_path(&mut self.values, path, value)
    }

    pub fn set_value(&mut self, path: &str, value: Value) -> Result<()> {
        set_path(&mut self.values, path, value)
    }

    pub fn remove(&mut self, path: &str) -> Option<Value> {
        let (parent, last) = match path.rsplit_once('.') {
            Some((parent, last)) => (get_path_mut(&mut self.values, parent)?, last),
            None => (&mut self.values, path),
        };
        match parent {
            Value::Object(map) => map.shift_remove(last),
            _ => None,
        }
    }
}

// ============================================================================
// Dotted path operations
// ============================================================================

fn segments(path: &str) -> Result<Vec<&str>> {
    if path.trim().is_empty() {
        return Err(Error::validation_invalid_argument(
            "path",
            "Configuration path cannot be empty",
            None,
            None,
        ));
    }
    let parts: Vec<&str> = path.split('.').collect();
    if parts.iter().any(|p| p.is_empty()) {
        return Err(Error::validation_invalid_argument(
            "path",
            format!("Invalid configuration path '{}'", path),
            Some(path.to_string()),
            None,
        ));
    }
    Ok(parts)
}

pub fn get_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let parts = segments(path).ok()?;
    let mut current = root;
    for part in parts {
        current = match current {
            Value::Object(map) => map.get(part)?,
            Value::Array(arr) => arr.get(part.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

fn get_path_mut<'a>(root: &'a mut Value, path: &str) -> Option<&'a mut Value> {
    let parts = segments(path).ok()?;
    let mut current = root;
    for part in parts {
        current = match current {
            Value::Object(map) => map.get_mut(part)?,
            Value::Array(arr) => arr.get_mut(part.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Write `value` at `path`, creating intermediate objects as needed.
pub fn set_path(root: &mut Value, path: &str, value: Value) -> Result<()> {
    let parts = segments(path)?;
    let Some((last, parents)) = parts.split_last() else {
        return Ok(());
    };

    let mut current = root;
    for part in parents {
        if current.is_null() {
            *current = Value::Object(Map::new());
        }
        current = match current {
            Value::Object(map) => map
                .entry(part.to_string())
                .or_insert_with(|| Value::Object(Map::new())),
            Value::Array(arr) => {
                let index = parse_index(part, path)?;
                let len = arr.len();
                arr.get_mut(index).ok_or_else(|| {
                    Error::config_invalid_value(
                        path,
                        Some(len.to_string()),
                        "Array index out of bounds while creating path",
                    )
                })?
            }
            other => {
                return Err(Error::config_invalid_value(
                    path,
                    Some(value_type_name(other).to_string()),
                    format!("Expected object at '{}'", part),
                ))
            }
        };
    }

    if current.is_null() {
        *current = Value::Object(Map::new());
    }
    match current {
        Value::Object(map) => {
            map.insert(last.to_string(), value);
            Ok(())
        }
        Value::Array(arr) => {
            let index = parse_index(last, path)?;
            let len = arr.len();
            let slot = arr.get_mut(index).ok_or_else(|| {
                Error::config_invalid_value(path, Some(len.to_string()), "Array index out of bounds")
            })?;
            *slot = value;
            Ok(())
        }
        other => Err(Error::config_invalid_value(
            path,
            Some(value_type_name(other).to_string()),
            "Cannot set child on non-container",
        )),
    }
}

fn parse_index(token: &str, path: &str) -> Result<usize> {
    token.parse::<usize>().map_err(|_| {
        Error::validation_invalid_argument(
            "path",
            format!("Invalid array index '{}' in '{}'", token, path),
            Some(token.to_string()),
            None,
        )
    })
}

fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
