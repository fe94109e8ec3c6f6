//! Avro schema to Apex transport class generation.
//!
//! - `schema` - classify raw schema nodes by shape
//! - `lexer` - build a token tree with qualified names
//! - `mapper` - Avro to target type names
//! - `emitter` - class table, reference resolution and rendering
//! - `template` - Apex source templates
//! - `files` - schema discovery and output files

pub mod emitter;
pub mod files;
pub mod lexer;
pub mod mapper;
pub mod schema;
pub mod template;

use std::path::{Path, PathBuf};

use serde::Serialize;

pub use emitter::{
    classes_for_schema, generate, generate_with, ClassKind, ClassTable, GeneratedClass,
    GeneratedTransport,
};
pub use mapper::{apex_friendly_name, ApexTypeMapper, TypeMapper};
pub use schema::{classify, Classification, Classified};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportOutput {
    pub input_files: Vec<PathBuf>,
    pub output_files: Vec<PathBuf>,
    pub classes: ClassTable,
}

/// Generate from every `.avsc` file under `input` and write the results into
/// `output`.
pub fn generate_from_dir(input: &Path, output: &Path) -> Result<TransportOutput> {
    let input_files = files::find_schema_files(input)?;
    if input_files.is_empty() {
        return Err(Error::validation_invalid_argument(
            "input",
            format!("No .avsc files found in {}", input.display()),
            Some(input.display().to_string()),
            None,
        ));
    }
    tracing::info!(count = input_files.len(), "schema files found");

    let schemas = files::read_schemas(&input_files)?;
    let generated = generate(&schemas)?;
    let output_files = files::write_outputs(output, &generated)?;

    Ok(TransportOutput {
        input_files,
        output_files,
        classes: generated.classes,
    })
}
