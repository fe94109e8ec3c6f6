//! Shape classification of raw Avro schema nodes.

use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, Result};

/// Avro primitive type names.
pub const PRIMITIVES: &[&str] = &[
    "null", "boolean", "int", "long", "float", "double", "bytes", "string",
];

/// Avro complex type keywords.
pub const COMPLEX: &[&str] = &["record", "enum", "array", "map", "fixed"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// A primitive type name.
    Simple,
    /// An object whose `type` is a complex keyword.
    Complex,
    /// A bare name of a named type defined elsewhere.
    Reference,
    /// An object whose `type` is itself an inline definition.
    Nested,
    /// A list of alternatives.
    Union,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classified<'a> {
    pub classification: Classification,
    /// The part of the node the classification applies to: the type name for
    /// simple and reference nodes, the whole node for complex ones, the inner
    /// definition for nested ones and the alternatives for unions.
    pub payload: &'a Value,
}

pub fn is_primitive(name: &str) -> bool {
    PRIMITIVES.contains(&name)
}

pub fn is_complex(name: &str) -> bool {
    COMPLEX.contains(&name)
}

pub fn classify(node: &Value) -> Result<Classified<'_>> {
    let (type_value, is_object) = match node {
        Value::Array(_) => {
            return Ok(Classified {
                classification: Classification::Union,
                payload: node,
            })
        }
        Value::Object(map) => match map.get("type") {
            Some(t) => (t, true),
            None => return Err(Error::schema_classification(node)),
        },
        Value::String(_) => (node, false),
        _ => return Err(Error::schema_classification(node)),
    };

    match type_value {
        Value::String(name) if !name.is_empty() => {
            let classification = if is_primitive(name) {
                Classification::Simple
            } else if is_complex(name) && is_object {
                Classification::Complex
            } else {
                Classification::Reference
            };
            let payload = if classification == Classification::Complex {
                node
            } else {
                type_value
            };
            Ok(Classified {
                classification,
                payload,
            })
        }
        Value::Object(_) => Ok(Classified {
            classification: Classification::Nested,
            payload: type_value,
        }),
        Value::Array(_) => Ok(Classified {
            classification: Classification::Union,
            payload: type_value,
        }),
        _ => Err(Error::schema_classification(node)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use serde_json::json;

    fn class_of(node: Value) -> Classification {
        classify(&node).unwrap().classification
    }

    #[test]
    fn primitive_name_is_simple() {
        assert_eq!(class_of(json!("string")), Classification::Simple);
        assert_eq!(class_of(json!({ "type": "int" })), Classification::Simple);
    }

    #[test]
    fn record_object_is_complex() {
        let node = json!({ "type": "record", "name": "Foo", "fields": [] });
        let classified = classify(&node).unwrap();
        assert_eq!(classified.classification, Classification::Complex);
        assert_eq!(classified.payload, &node);
    }

    #[test]
    fn unknown_name_is_reference() {
        assert_eq!(class_of(json!("Foo")), Classification::Reference);
        assert_eq!(class_of(json!({ "type": "com.example.Foo" })), Classification::Reference);
    }

    #[test]
    fn bare_complex_keyword_string_is_a_reference() {
        // "record" on its own has no fields to define a type with
        assert_eq!(class_of(json!("record")), Classification::Reference);
    }

    #[test]
    fn list_is_union() {
        assert_eq!(
            class_of(json!([{ "type": "string" }, { "type": "int" }])),
            Classification::Union
        );
        assert_eq!(class_of(json!({ "type": ["null", "string"] })), Classification::Union);
    }

    #[test]
    fn object_type_is_nested() {
        let node = json!({ "name": "f", "type": { "type": "enum", "name": "E", "symbols": ["A"] } });
        let classified = classify(&node).unwrap();
        assert_eq!(classified.classification, Classification::Nested);
        assert_eq!(classified.payload, &node["type"]);
        assert_eq!(classify(classified.payload).unwrap().classification, Classification::Complex);
    }

    #[test]
    fn shapeless_nodes_fail_naming_the_input() {
        for node in [json!({}), json!(""), json!(null), json!(42), json!({ "type": 7 })] {
            let err = classify(&node).unwrap_err();
            assert_eq!(err.code, ErrorCode::SchemaClassification);
            assert!(err.message.contains(&node.to_string()));
        }
    }
}
