//! Turns a raw schema into a token tree.
//!
//! Named types get their fully-qualified name here: a `name` containing a dot
//! is already qualified, otherwise the type's own `namespace` applies, falling
//! back to the namespace of the enclosing named type. References keep the
//! enclosing namespace so they can be resolved once every definition in the
//! schema is known.

use serde_json::{Map, Value};

use super::schema::{classify, Classification};
use crate::error::{Error, ErrorCode, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    Bytes,
    String,
}

impl Primitive {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "null" => Primitive::Null,
            "boolean" => Primitive::Boolean,
            "int" => Primitive::Int,
            "long" => Primitive::Long,
            "float" => Primitive::Float,
            "double" => Primitive::Double,
            "bytes" => Primitive::Bytes,
            "string" => Primitive::String,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Primitive::Null => "null",
            Primitive::Boolean => "boolean",
            Primitive::Int => "int",
            Primitive::Long => "long",
            Primitive::Float => "float",
            Primitive::Double => "double",
            Primitive::Bytes => "bytes",
            Primitive::String => "string",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Name {
    pub name: String,
    pub namespace: Option<String>,
    pub qualified: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub name: String,
    /// Namespace of the enclosing named type at the point of reference.
    pub namespace: Option<String>,
}

impl Reference {
    /// Qualified names this reference may denote, most specific first.
    pub fn candidates(&self) -> Vec<String> {
        match &self.namespace {
            Some(ns) if !self.name.contains('.') => {
                vec![format!("{}.{}", ns, self.name), self.name.clone()]
            }
            _ => vec![self.name.clone()],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub token: Token,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub name: Name,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Enum {
    pub name: Name,
    pub symbols: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Primitive(Primitive),
    Reference(Reference),
    Record(Record),
    Enum(Enum),
    Array(Box<Token>),
    Map(Box<Token>),
    Union(Vec<Token>),
    /// Kept only so the type mapper can reject it with the raw definition.
    Fixed(Value),
}

/// Lex a top-level schema.
pub fn lex(schema: &Value) -> Result<Token> {
    lex_node(schema, None)
}

fn lex_node(node: &Value, enclosing: Option<&str>) -> Result<Token> {
    let classified = classify(node)?;
    let payload = classified.payload;

    match classified.classification {
        Classification::Simple => {
            let name = payload.as_str().unwrap_or_default();
            Primitive::from_name(name)
                .map(Token::Primitive)
                .ok_or_else(|| Error::schema_classification(node))
        }
        Classification::Reference => Ok(Token::Reference(Reference {
            name: payload.as_str().unwrap_or_default().to_string(),
            namespace: enclosing.map(str::to_string),
        })),
        Classification::Nested => lex_node(payload, enclosing),
        Classification::Union => {
            let members = payload.as_array().map(Vec::as_slice).unwrap_or_default();
            members
                .iter()
                .map(|member| lex_node(member, enclosing))
                .collect::<Result<Vec<_>>>()
                .map(Token::Union)
        }
        Classification::Complex => lex_complex(payload, enclosing),
    }
}

fn lex_complex(node: &Value, enclosing: Option<&str>) -> Result<Token> {
    let Some(map) = node.as_object() else {
        return Err(Error::schema_classification(node));
    };
    let kind = map.get("type").and_then(Value::as_str).unwrap_or_default();

    match kind {
        "record" => lex_record(node, map, enclosing),
        "enum" => lex_enum(node, map, enclosing),
        "array" => {
            let items = child(node, map, "items")?;
            Ok(Token::Array(Box::new(lex_node(items, enclosing)?)))
        }
        "map" => {
            let values = child(node, map, "values")?;
            Ok(Token::Map(Box::new(lex_node(values, enclosing)?)))
        }
        "fixed" => Ok(Token::Fixed(node.clone())),
        _ => Err(Error::schema_classification(node)),
    }
}

fn child<'a>(node: &Value, map: &'a Map<String, Value>, key: &str) -> Result<&'a Value> {
    map.get(key).ok_or_else(|| {
        Error::schema(
            ErrorCode::SchemaClassification,
            format!("Type must define '{}': {}", key, node),
            None,
            Some(node),
        )
    })
}

fn lex_name(node: &Value, map: &Map<String, Value>, enclosing: Option<&str>) -> Result<Name> {
    let name = map
        .get("name")
        .and_then(Value::as_str)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| {
            Error::schema(
                ErrorCode::SchemaMissingName,
                "'record' and 'enum' type objects must have a name.",
                None,
                Some(node),
            )
        })?;

    if let Some((namespace, short)) = name.rsplit_once('.') {
        return Ok(Name {
            name: short.to_string(),
            namespace: Some(namespace.to_string()).filter(|ns| !ns.is_empty()),
            qualified: name.to_string(),
        });
    }

    let namespace = map
        .get("namespace")
        .and_then(Value::as_str)
        .filter(|ns| !ns.is_empty())
        .or(enclosing)
        .map(str::to_string);

    let qualified = match &namespace {
        Some(ns) => format!("{}.{}", ns, name),
        None => name.to_string(),
    };

    Ok(Name {
        name: name.to_string(),
        namespace,
        qualified,
    })
}

fn lex_record(node: &Value, map: &Map<String, Value>, enclosing: Option<&str>) -> Result<Token> {
    let name = lex_name(node, map, enclosing)?;

    let Some(raw_fields) = map.get("fields").and_then(Value::as_array) else {
        return Err(Error::schema(
            ErrorCode::SchemaMissingFields,
            format!("Record: {} must contain 'fields'.", name.qualified),
            Some(name.qualified.clone()),
            Some(node),
        ));
    };

    let scope = name.namespace.as_deref();
    let mut fields = Vec::with_capacity(raw_fields.len());
    for raw in raw_fields {
        let field_name = raw
            .get("name")
            .and_then(Value::as_str)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| {
                Error::schema(
                    ErrorCode::SchemaMissingName,
                    format!("Fields of record {} must have a name: {}", name.qualified, raw),
                    Some(name.qualified.clone()),
                    Some(raw),
                )
            })?;
        let field_type = raw
            .get("type")
            .ok_or_else(|| Error::schema_classification(raw))?;

        fields.push(Field {
            name: field_name.to_string(),
            token: lex_node(field_type, scope)?,
        });
    }

    Ok(Token::Record(Record { name, fields }))
}

fn lex_enum(node: &Value, map: &Map<String, Value>, enclosing: Option<&str>) -> Result<Token> {
    let name = lex_name(node, map, enclosing)?;

    let raw_symbols = map
        .get("symbols")
        .and_then(Value::as_array)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            Error::schema(
                ErrorCode::SchemaMissingSymbols,
                format!("Enum: {} must contain non-empty 'symbols'.", name.qualified),
                Some(name.qualified.clone()),
                Some(node),
            )
        })?;

    let mut symbols = Vec::with_capacity(raw_symbols.len());
    for symbol in raw_symbols {
        match symbol.as_str().filter(|s| !s.is_empty()) {
            Some(s) => symbols.push(s.to_string()),
            None => {
                return Err(Error::schema(
                    ErrorCode::SchemaMissingSymbols,
                    format!("Enum symbols must be non-empty strings: {}", node),
                    Some(name.qualified.clone()),
                    Some(node),
                ))
            }
        }
    }

    Ok(Token::Enum(Enum { name, symbols }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(token: Token) -> Record {
        match token {
            Token::Record(r) => r,
            other => panic!("expected record, got {:?}", other),
        }
    }

    #[test]
    fn record_fields_become_tokens() {
        let token = lex(&json!({
            "type": "record",
            "name": "Foo",
            "namespace": "ns",
            "fields": [
                { "name": "bar", "type": "int" },
                { "name": "tags", "type": { "type": "array", "items": "string" } },
                { "name": "maybe", "type": ["null", "long"] }
            ]
        }))
        .unwrap();

        let rec = record(token);
        assert_eq!(rec.name.qualified, "ns.Foo");
        assert_eq!(rec.fields[0].token, Token::Primitive(Primitive::Int));
        assert_eq!(
            rec.fields[1].token,
            Token::Array(Box::new(Token::Primitive(Primitive::String)))
        );
        assert_eq!(
            rec.fields[2].token,
            Token::Union(vec![
                Token::Primitive(Primitive::Null),
                Token::Primitive(Primitive::Long)
            ])
        );
    }

    #[test]
    fn nested_types_inherit_enclosing_namespace() {
        let rec = record(
            lex(&json!({
                "type": "record",
                "name": "Outer",
                "namespace": "com.example",
                "fields": [
                    { "name": "inner", "type": { "type": "record", "name": "Inner", "fields": [] } },
                    { "name": "other", "type": { "type": "enum", "name": "Color", "namespace": "paint", "symbols": ["RED"] } },
                    { "name": "again", "type": "Inner" }
                ]
            }))
            .unwrap(),
        );

        match &rec.fields[0].token {
            Token::Record(inner) => assert_eq!(inner.name.qualified, "com.example.Inner"),
            other => panic!("unexpected {:?}", other),
        }
        match &rec.fields[1].token {
            Token::Enum(e) => assert_eq!(e.name.qualified, "paint.Color"),
            other => panic!("unexpected {:?}", other),
        }
        match &rec.fields[2].token {
            Token::Reference(r) => assert_eq!(
                r.candidates(),
                vec!["com.example.Inner".to_string(), "Inner".to_string()]
            ),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn dotted_name_carries_its_own_namespace() {
        let rec = record(
            lex(&json!({
                "type": "record",
                "name": "com.example.Foo",
                "namespace": "ignored",
                "fields": []
            }))
            .unwrap(),
        );
        assert_eq!(rec.name.qualified, "com.example.Foo");
        assert_eq!(rec.name.namespace.as_deref(), Some("com.example"));
        assert_eq!(rec.name.name, "Foo");
    }

    #[test]
    fn unnamed_record_fails() {
        let err = lex(&json!({ "type": "record", "fields": [] })).unwrap_err();
        assert_eq!(err.code, ErrorCode::SchemaMissingName);
        assert_eq!(err.message, "'record' and 'enum' type objects must have a name.");
    }

    #[test]
    fn record_without_fields_fails() {
        let err = lex(&json!({ "type": "record", "name": "Foo" })).unwrap_err();
        assert_eq!(err.code, ErrorCode::SchemaMissingFields);
        assert!(err.message.contains("Foo"));
    }

    #[test]
    fn enum_without_symbols_names_the_enum() {
        let err = lex(&json!({ "type": "enum", "name": "Color" })).unwrap_err();
        assert_eq!(err.code, ErrorCode::SchemaMissingSymbols);
        assert!(err.message.contains("Color"));

        let err = lex(&json!({ "type": "enum", "name": "Color", "symbols": [] })).unwrap_err();
        assert_eq!(err.code, ErrorCode::SchemaMissingSymbols);
    }

    #[test]
    fn enum_symbols_must_be_non_empty_strings() {
        for symbols in [json!(["A", ""]), json!(["A", 1])] {
            let err = lex(&json!({ "type": "enum", "name": "E", "symbols": symbols })).unwrap_err();
            assert!(err.message.starts_with("Enum symbols must be non-empty strings"));
        }
    }

    #[test]
    fn field_without_type_is_a_classification_error() {
        let err = lex(&json!({ "type": "record", "name": "R", "fields": [{ "name": "x" }] }))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::SchemaClassification);
    }

    #[test]
    fn array_requires_items() {
        let err = lex(&json!({ "type": "array" })).unwrap_err();
        assert_eq!(err.code, ErrorCode::SchemaClassification);
        assert!(err.message.contains("items"));
    }

    #[test]
    fn fixed_is_kept_for_the_mapper() {
        let raw = json!({ "type": "fixed", "name": "Md5", "size": 16 });
        assert_eq!(lex(&raw).unwrap(), Token::Fixed(raw));
    }
}
