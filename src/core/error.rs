use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigMissingKey,
    ConfigInvalidJson,
    ConfigInvalidValue,

    ValidationMissingArgument,
    ValidationInvalidArgument,
    ValidationInvalidJson,

    ProcessSpawnFailed,
    ProcessNonZeroExit,

    WorkflowAborted,

    PromptFailed,

    SchemaClassification,
    SchemaMissingName,
    SchemaMissingSymbols,
    SchemaMissingFields,
    SchemaInvalidRoot,
    SchemaDuplicateDefinition,
    SchemaUnsupportedType,
    SchemaUndefinedType,

    InternalIoError,
    InternalJsonError,
    InternalUnexpected,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ConfigMissingKey => "config.missing_key",
            ErrorCode::ConfigInvalidJson => "config.invalid_json",
            ErrorCode::ConfigInvalidValue => "config.invalid_value",

            ErrorCode::ValidationMissingArgument => "validation.missing_argument",
            ErrorCode::ValidationInvalidArgument => "validation.invalid_argument",
            ErrorCode::ValidationInvalidJson => "validation.invalid_json",

            ErrorCode::ProcessSpawnFailed => "process.spawn_failed",
            ErrorCode::ProcessNonZeroExit => "process.non_zero_exit",

            ErrorCode::WorkflowAborted => "workflow.aborted",

            ErrorCode::PromptFailed => "prompt.failed",

            ErrorCode::SchemaClassification => "schema.classification",
            ErrorCode::SchemaMissingName => "schema.missing_name",
            ErrorCode::SchemaMissingSymbols => "schema.missing_symbols",
            ErrorCode::SchemaMissingFields => "schema.missing_fields",
            ErrorCode::SchemaInvalidRoot => "schema.invalid_root",
            ErrorCode::SchemaDuplicateDefinition => "schema.duplicate_definition",
            ErrorCode::SchemaUnsupportedType => "schema.unsupported_type",
            ErrorCode::SchemaUndefinedType => "schema.undefined_type",

            ErrorCode::InternalIoError => "internal.io_error",
            ErrorCode::InternalJsonError => "internal.json_error",
            ErrorCode::InternalUnexpected => "internal.unexpected",
        }
    }

    /// Schema classification and validation failures.
    pub fn is_schema(&self) -> bool {
        matches!(
            self,
            ErrorCode::SchemaClassification
                | ErrorCode::SchemaMissingName
                | ErrorCode::SchemaMissingSymbols
                | ErrorCode::SchemaMissingFields
                | ErrorCode::SchemaInvalidRoot
                | ErrorCode::SchemaDuplicateDefinition
                | ErrorCode::SchemaUnsupportedType
                | ErrorCode::SchemaUndefinedType
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Hint {
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    pub details: Value,
    pub hints: Vec<Hint>,
}

pub type Result<T> = std::result::Result<T, Error>;

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigMissingKeyDetails {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigInvalidJsonDetails {
    pub path: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigInvalidValueDetails {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub problem: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingArgumentDetails {
    pub args: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidArgumentDetails {
    pub field: String,
    pub problem: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tried: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessSpawnFailedDetails {
    pub command: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessNonZeroExitDetails {
    pub command: String,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowAbortedDetails {
    pub step: String,
    pub reason: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalIoErrorDetails {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalJsonErrorDetails {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

fn to_details<T: Serialize>(details: T) -> Value {
    serde_json::to_value(details).unwrap_or_else(|_| Value::Object(serde_json::Map::new()))
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>, details: Value) -> Self {
        Self {
            code,
            message: message.into(),
            details,
            hints: Vec::new(),
        }
    }

    pub fn validation_missing_argument(args: Vec<String>) -> Self {
        let message = format!("Missing required argument: {}", args.join(", "));
        Self::new(
            ErrorCode::ValidationMissingArgument,
            message,
            to_details(MissingArgumentDetails { args }),
        )
    }

    pub fn validation_invalid_argument(
        field: impl Into<String>,
        problem: impl Into<String>,
        id: Option<String>,
        tried: Option<Vec<String>>,
    ) -> Self {
        let problem = problem.into();
        Self::new(
            ErrorCode::ValidationInvalidArgument,
            problem.clone(),
            to_details(InvalidArgumentDetails {
                field: field.into(),
                problem,
                id,
                tried,
            }),
        )
    }

    pub fn validation_invalid_json(err: serde_json::Error, context: Option<String>) -> Self {
        let details = serde_json::json!({
            "error": err.to_string(),
            "context": context,
        });

        let message = match &context {
            Some(context) => format!("Invalid JSON in {}: {}", context, err),
            None => format!("Invalid JSON: {}", err),
        };

        Self::new(ErrorCode::ValidationInvalidJson, message, details)
    }

    pub fn config_missing_key(key: impl Into<String>, path: Option<String>) -> Self {
        let key = key.into();
        Self::new(
            ErrorCode::ConfigMissingKey,
            format!("Missing required configuration key '{}'", key),
            to_details(ConfigMissingKeyDetails { key, path }),
        )
    }

    pub fn config_invalid_json(path: impl Into<String>, err: serde_json::Error) -> Self {
        let path = path.into();
        Self::new(
            ErrorCode::ConfigInvalidJson,
            format!("Invalid JSON in configuration file {}", path),
            to_details(ConfigInvalidJsonDetails {
                path,
                error: err.to_string(),
            }),
        )
    }

    pub fn config_invalid_value(
        key: impl Into<String>,
        value: Option<String>,
        problem: impl Into<String>,
    ) -> Self {
        let key = key.into();
        let problem = problem.into();
        Self::new(
            ErrorCode::ConfigInvalidValue,
            format!("Invalid configuration value for '{}': {}", key, problem),
            to_details(ConfigInvalidValueDetails {
                key,
                value,
                problem,
            }),
        )
    }

    /// The executable could not be launched at all.
    pub fn process_spawn_failed(command: impl Into<String>, error: impl Into<String>) -> Self {
        let command = command.into();
        let error = error.into();
        Self::new(
            ErrorCode::ProcessSpawnFailed,
            format!("Could not start command: {}\n{}", command, error),
            to_details(ProcessSpawnFailedDetails { command, error }),
        )
    }

    /// The process ran and exited with a non-zero code.
    pub fn process_non_zero_exit(details: ProcessNonZeroExitDetails) -> Self {
        let message = format!("Command failed: {}\n{}", details.command, details.stderr);
        Self::new(ErrorCode::ProcessNonZeroExit, message, to_details(details))
    }

    pub fn workflow_aborted(step: impl Into<String>, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self::new(
            ErrorCode::WorkflowAborted,
            reason.clone(),
            to_details(WorkflowAbortedDetails {
                step: step.into(),
                reason,
            }),
        )
    }

    pub fn prompt_failed(question: impl Into<String>, error: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::PromptFailed,
            format!("Failed to read input: {}", error.into()),
            serde_json::json!({ "question": question.into() }),
        )
    }

    pub fn schema(
        code: ErrorCode,
        message: impl Into<String>,
        identifier: Option<String>,
        schema: Option<&Value>,
    ) -> Self {
        Self::new(
            code,
            message,
            to_details(SchemaDetails {
                identifier,
                schema: schema.cloned(),
            }),
        )
    }

    pub fn schema_classification(raw: &Value) -> Self {
        Self::schema(
            ErrorCode::SchemaClassification,
            format!("Could not classify type for schema: {}", raw),
            None,
            Some(raw),
        )
    }

    pub fn schema_unsupported_type(raw: &Value) -> Self {
        Self::schema(
            ErrorCode::SchemaUnsupportedType,
            format!(
                "Unsupported type for: {}. We do not support \"bytes\" or \"fixed\" types.",
                raw
            ),
            None,
            Some(raw),
        )
    }

    pub fn schema_duplicate_definition(identifier: impl Into<String>, message: impl Into<String>) -> Self {
        let identifier = identifier.into();
        Self::schema(
            ErrorCode::SchemaDuplicateDefinition,
            message,
            Some(identifier),
            None,
        )
    }

    pub fn internal_io(error: impl Into<String>, context: Option<String>) -> Self {
        let error = error.into();
        let message = match &context {
            Some(context) => format!("IO error ({}): {}", context, error),
            None => format!("IO error: {}", error),
        };
        Self::new(
            ErrorCode::InternalIoError,
            message,
            to_details(InternalIoErrorDetails { error, context }),
        )
    }

    pub fn internal_json(error: impl Into<String>, context: Option<String>) -> Self {
        let error = error.into();
        Self::new(
            ErrorCode::InternalJsonError,
            format!("JSON error: {}", error),
            to_details(InternalJsonErrorDetails { error, context }),
        )
    }

    pub fn internal_unexpected(error: impl Into<String>) -> Self {
        let error = error.into();
        Self::new(
            ErrorCode::InternalUnexpected,
            format!("Unexpected error: {}", error),
            serde_json::json!({ "error": error }),
        )
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::internal_unexpected(message)
    }

    pub fn with_hint(mut self, message: impl Into<String>) -> Self {
        self.hints.push(Hint {
            message: message.into(),
        });
        self
    }
}
