//! Type mapping between Avro types and target-language type names.

use serde_json::Value;

use super::lexer::Primitive;
use crate::error::{Error, Result};

/// Implement once per target language.
pub trait TypeMapper {
    /// The target language name
    fn language(&self) -> &'static str;

    /// Map a primitive. `bytes` has no faithful target type and is rejected.
    fn map_primitive(&self, primitive: Primitive) -> Result<&'static str>;

    fn map_array(&self, item: &str) -> String;

    fn map_map(&self, value: &str) -> String;

    /// Type of a field that may hold any of `members`.
    fn map_union(&self, members: &[String]) -> String;

    /// Class name for a fully-qualified Avro name.
    fn class_name(&self, qualified: &str) -> String;
}

pub struct ApexTypeMapper;

impl TypeMapper for ApexTypeMapper {
    fn language(&self) -> &'static str {
        "apex"
    }

    fn map_primitive(&self, primitive: Primitive) -> Result<&'static str> {
        match primitive {
            Primitive::Null => Ok("Object"),
            Primitive::Boolean => Ok("Boolean"),
            Primitive::Int => Ok("Integer"),
            Primitive::Long => Ok("Long"),
            Primitive::Float | Primitive::Double => Ok("Double"),
            Primitive::String => Ok("String"),
            Primitive::Bytes => Err(Error::schema_unsupported_type(&Value::String(
                primitive.as_str().to_string(),
            ))),
        }
    }

    fn map_array(&self, item: &str) -> String {
        format!("List<{}>", item)
    }

    fn map_map(&self, value: &str) -> String {
        format!("Map<String, {}>", value)
    }

    fn map_union(&self, _members: &[String]) -> String {
        "Object".to_string()
    }

    fn class_name(&self, qualified: &str) -> String {
        apex_friendly_name(qualified)
    }
}

/// `com._internal_.Foo` -> `com_internal_Foo`: underscores are trimmed from
/// both ends of each segment, then segments are joined with `_`.
pub fn apex_friendly_name(qualified: &str) -> String {
    qualified
        .split('.')
        .map(|segment| segment.trim_matches('_'))
        .collect::<Vec<_>>()
        .join("_")
}
