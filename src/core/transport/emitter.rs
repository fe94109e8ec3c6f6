//! Walks token trees and emits one class per record and enum.
//!
//! Each schema is processed in two passes. The first collects every named
//! type the schema defines, rejecting a name defined twice; the resulting set
//! is then shared read-only with the second pass, which resolves references
//! against it and renders classes. Because a record's own name is part of the
//! set before any of its fields are visited, self-referencing records resolve
//! without special handling.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use super::lexer::{self, Enum, Record, Reference, Token};
use super::mapper::{ApexTypeMapper, TypeMapper};
use super::template::{self, RecordTemplate};
use crate::error::{Error, ErrorCode, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassKind {
    Transport,
    Inner,
    Enum,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedClass {
    pub qualified_name: String,
    pub class_name: String,
    pub kind: ClassKind,
    #[serde(skip)]
    pub source: String,
}

/// Generated classes keyed by qualified name, in emission order.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ClassTable {
    classes: IndexMap<String, GeneratedClass>,
}

impl ClassTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a class. Returns `false` when an identical definition is
    /// already present; a different definition under the same name fails,
    /// as does a second identifier that maps to an existing Apex class name.
    pub fn insert(&mut self, class: GeneratedClass) -> Result<bool> {
        if let Some(existing) = self.classes.get(&class.qualified_name) {
            if existing.source == class.source {
                return Ok(false);
            }
            let identifier = class.qualified_name;
            return Err(Error::schema_duplicate_definition(
                identifier.clone(),
                format!(
                    "Records and enums with the same 'name' / 'namespace' cannot be used across schemas unless they are identical. Identifier: '{}'.",
                    identifier
                ),
            ));
        }
        if let Some(clash) = self.classes.values().find(|c| c.class_name == class.class_name) {
            return Err(Error::schema_duplicate_definition(
                class.qualified_name.clone(),
                format!(
                    "Identifiers '{}' and '{}' both map to the Apex class '{}'.",
                    clash.qualified_name, class.qualified_name, class.class_name
                ),
            ));
        }
        self.classes.insert(class.qualified_name.clone(), class);
        Ok(true)
    }

    pub fn get(&self, qualified_name: &str) -> Option<&GeneratedClass> {
        self.classes.get(qualified_name)
    }

    pub fn contains(&self, qualified_name: &str) -> bool {
        self.classes.contains_key(qualified_name)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GeneratedClass> {
        self.classes.values()
    }

    pub fn qualified_names(&self) -> Vec<&str> {
        self.classes.keys().map(String::as_str).collect()
    }
}

#[derive(Debug, Clone)]
pub struct GeneratedTransport {
    pub classes: ClassTable,
    /// Complete source of the outer transport class.
    pub source: String,
    /// Companion metadata for the source file.
    pub descriptor: String,
}

pub fn generate(schemas: &[Value]) -> Result<GeneratedTransport> {
    generate_with(schemas, &ApexTypeMapper)
}

pub fn generate_with(schemas: &[Value], mapper: &dyn TypeMapper) -> Result<GeneratedTransport> {
    let mut table = ClassTable::new();

    for schema in schemas {
        for class in classes_for_schema(schema, mapper)? {
            table.insert(class)?;
        }
    }

    let sources: Vec<&str> = table.iter().map(|c| c.source.as_str()).collect();
    let source = template::transport_source(&sources);

    Ok(GeneratedTransport {
        classes: table,
        source,
        descriptor: template::descriptor(),
    })
}

/// All classes of one schema, dependencies before the records using them.
pub fn classes_for_schema(schema: &Value, mapper: &dyn TypeMapper) -> Result<Vec<GeneratedClass>> {
    let root = match lexer::lex(schema)? {
        Token::Record(record) => record,
        _ => {
            return Err(Error::schema(
                ErrorCode::SchemaInvalidRoot,
                format!(
                    "For conversion to apex, the first entity in the avro schema must be an avro record: {}",
                    schema
                ),
                None,
                Some(schema),
            ))
        }
    };

    let mut defined = HashSet::new();
    collect_record(&root, &mut defined)?;

    let mut emitter = Emitter {
        mapper,
        defined: &defined,
        classes: Vec::new(),
    };
    emitter.emit_record(&root, RecordTemplate::Transport)?;

    tracing::debug!(
        root = %root.name.qualified,
        classes = emitter.classes.len(),
        "schema generated"
    );
    Ok(emitter.classes)
}

fn define(name: &str, defined: &mut HashSet<String>) -> Result<()> {
    if !defined.insert(name.to_string()) {
        return Err(Error::schema_duplicate_definition(
            name,
            format!("duplicate type name: {}", name),
        ));
    }
    Ok(())
}

fn collect_record(record: &Record, defined: &mut HashSet<String>) -> Result<()> {
    define(&record.name.qualified, defined)?;
    for field in &record.fields {
        collect(&field.token, defined)?;
    }
    Ok(())
}

fn collect(token: &Token, defined: &mut HashSet<String>) -> Result<()> {
    match token {
        Token::Record(record) => collect_record(record, defined),
        Token::Enum(e) => define(&e.name.qualified, defined),
        Token::Array(inner) | Token::Map(inner) => collect(inner, defined),
        Token::Union(members) => members.iter().try_for_each(|m| collect(m, defined)),
        Token::Primitive(_) | Token::Reference(_) | Token::Fixed(_) => Ok(()),
    }
}

struct Emitter<'a> {
    mapper: &'a dyn TypeMapper,
    defined: &'a HashSet<String>,
    classes: Vec<GeneratedClass>,
}

impl Emitter<'_> {
    fn emit_record(&mut self, record: &Record, template: RecordTemplate) -> Result<String> {
        let class_name = self.mapper.class_name(&record.name.qualified);

        let mut fields = Vec::with_capacity(record.fields.len());
        for field in &record.fields {
            let ty = self.resolve(&field.token)?;
            fields.push((field.name.clone(), ty));
        }

        let source = template::record_class(template, &class_name, &record.name.qualified, &fields);
        let kind = match template {
            RecordTemplate::Transport => ClassKind::Transport,
            RecordTemplate::Inner => ClassKind::Inner,
        };
        self.classes.push(GeneratedClass {
            qualified_name: record.name.qualified.clone(),
            class_name: class_name.clone(),
            kind,
            source,
        });
        Ok(class_name)
    }

    fn emit_enum(&mut self, e: &Enum) -> String {
        let class_name = self.mapper.class_name(&e.name.qualified);
        self.classes.push(GeneratedClass {
            qualified_name: e.name.qualified.clone(),
            class_name: class_name.clone(),
            kind: ClassKind::Enum,
            source: template::enum_class(&class_name, &e.symbols),
        });
        class_name
    }

    fn resolve_reference(&self, reference: &Reference) -> Result<String> {
        let candidates = reference.candidates();
        candidates
            .iter()
            .find(|c| self.defined.contains(c.as_str()))
            .map(|q| self.mapper.class_name(q))
            .ok_or_else(|| {
                let wanted = candidates.first().cloned().unwrap_or_default();
                Error::schema(
                    ErrorCode::SchemaUndefinedType,
                    format!("undefined type name: {}", wanted),
                    Some(wanted),
                    None,
                )
            })
    }

    /// Target type name for a token, emitting any inline definitions it holds.
    fn resolve(&mut self, token: &Token) -> Result<String> {
        match token {
            Token::Primitive(p) => self.mapper.map_primitive(*p).map(str::to_string),
            Token::Reference(r) => self.resolve_reference(r),
            Token::Record(r) => self.emit_record(r, RecordTemplate::Inner),
            Token::Enum(e) => Ok(self.emit_enum(e)),
            Token::Array(inner) => {
                let item = self.resolve(inner)?;
                Ok(self.mapper.map_array(&item))
            }
            Token::Map(inner) => {
                let value = self.resolve(inner)?;
                Ok(self.mapper.map_map(&value))
            }
            Token::Union(members) => {
                let resolved = members
                    .iter()
                    .map(|m| self.resolve(m))
                    .collect::<Result<Vec<_>>>()?;
                Ok(self.mapper.map_union(&resolved))
            }
            Token::Fixed(raw) => Err(Error::schema_unsupported_type(raw)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn foo_schema() -> Value {
        json!({
            "name": "Foo",
            "namespace": "ns",
            "type": "record",
            "fields": [{ "name": "bar", "type": "int" }]
        })
    }

    #[test]
    fn single_record_produces_one_keyed_class() {
        let generated = generate(&[foo_schema()]).unwrap();

        assert_eq!(generated.classes.qualified_names(), vec!["ns.Foo"]);
        let class = generated.classes.get("ns.Foo").unwrap();
        assert_eq!(class.class_name, "ns_Foo");
        assert_eq!(class.kind, ClassKind::Transport);
        assert!(class.source.contains("public Integer bar { get; set; }"));
        assert!(class.source.contains("public ns_Foo(Integer bar)"));
        assert!(class.source.contains("this.bar = bar;"));
        assert!(generated.source.starts_with("public class OrizuruTransport {"));
        assert!(generated.source.contains(&class.source));
    }

    #[test]
    fn nested_definitions_precede_their_record() {
        let classes = classes_for_schema(
            &json!({
                "type": "record",
                "name": "Parent",
                "namespace": "com.example",
                "fields": [
                    { "name": "child", "type": {
                        "type": "record",
                        "name": "Child",
                        "fields": [{ "name": "color", "type": { "type": "enum", "name": "Color", "symbols": ["RED"] } }]
                    } },
                    { "name": "size", "type": "long" }
                ]
            }),
            &ApexTypeMapper,
        )
        .unwrap();

        let names: Vec<&str> = classes.iter().map(|c| c.qualified_name.as_str()).collect();
        assert_eq!(names, vec!["com.example.Color", "com.example.Child", "com.example.Parent"]);
        assert_eq!(classes[1].kind, ClassKind::Inner);
        assert!(classes[1].source.contains("public com_example_Color color"));
        assert!(classes[2].source.contains("public com_example_Child child"));
    }

    #[test]
    fn recursive_record_resolves_to_itself() {
        let classes = classes_for_schema(
            &json!({
                "type": "record",
                "name": "Node",
                "fields": [
                    { "name": "value", "type": "string" },
                    { "name": "next", "type": ["null", "Node"] },
                    { "name": "children", "type": { "type": "array", "items": "Node" } }
                ]
            }),
            &ApexTypeMapper,
        )
        .unwrap();

        assert_eq!(classes.len(), 1);
        assert!(classes[0].source.contains("public Object next"));
        assert!(classes[0].source.contains("public List<Node> children"));
    }

    #[test]
    fn all_types_map_through_the_table() {
        let classes = classes_for_schema(
            &json!({
                "type": "record",
                "name": "All",
                "fields": [
                    { "name": "n", "type": "null" },
                    { "name": "b", "type": "boolean" },
                    { "name": "i", "type": "int" },
                    { "name": "l", "type": "long" },
                    { "name": "f", "type": "float" },
                    { "name": "d", "type": "double" },
                    { "name": "s", "type": "string" },
                    { "name": "m", "type": { "type": "map", "values": { "type": "array", "items": "int" } } }
                ]
            }),
            &ApexTypeMapper,
        )
        .unwrap();

        let source = &classes[0].source;
        for expected in [
            "public Object n",
            "public Boolean b",
            "public Integer i",
            "public Long l",
            "public Double f",
            "public Double d",
            "public String s",
            "public Map<String, List<Integer>> m",
        ] {
            assert!(source.contains(expected), "missing {}", expected);
        }
    }

    #[test]
    fn union_members_still_emit_their_definitions() {
        let classes = classes_for_schema(
            &json!({
                "type": "record",
                "name": "Holder",
                "fields": [{ "name": "value", "type": [
                    "null",
                    { "type": "record", "name": "A", "fields": [] },
                    { "type": "enum", "name": "B", "symbols": ["X"] }
                ] }]
            }),
            &ApexTypeMapper,
        )
        .unwrap();

        let names: Vec<&str> = classes.iter().map(|c| c.qualified_name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "Holder"]);
    }

    #[test]
    fn namespace_in_name_is_used_for_the_class() {
        let classes = classes_for_schema(
            &json!({
                "type": "record",
                "name": "com.example.Thing",
                "fields": [{ "name": "other", "type": { "type": "record", "name": "Other", "fields": [] } }]
            }),
            &ApexTypeMapper,
        )
        .unwrap();

        assert_eq!(classes[0].qualified_name, "com.example.Other");
        assert_eq!(classes[1].class_name, "com_example_Thing");
    }

    #[test]
    fn undefined_reference_fails() {
        let err = classes_for_schema(
            &json!({
                "type": "record",
                "name": "Test",
                "namespace": "com.financialforce",
                "fields": [{ "name": "x", "type": "unknown" }]
            }),
            &ApexTypeMapper,
        )
        .unwrap_err();

        assert_eq!(err.code, ErrorCode::SchemaUndefinedType);
        assert_eq!(err.message, "undefined type name: com.financialforce.unknown");
    }

    #[test]
    fn duplicate_definition_within_schema_fails() {
        let err = classes_for_schema(
            &json!({
                "type": "record",
                "name": "Test",
                "namespace": "com.financialforce",
                "fields": [
                    { "name": "a", "type": { "type": "enum", "name": "TestEnum", "symbols": ["A"] } },
                    { "name": "b", "type": { "type": "enum", "name": "TestEnum", "symbols": ["A"] } }
                ]
            }),
            &ApexTypeMapper,
        )
        .unwrap_err();

        assert_eq!(err.code, ErrorCode::SchemaDuplicateDefinition);
        assert_eq!(err.message, "duplicate type name: com.financialforce.TestEnum");
    }

    #[test]
    fn non_record_root_fails() {
        let err = generate(&[json!({ "type": "enum", "name": "E", "symbols": ["A"] })]).unwrap_err();
        assert_eq!(err.code, ErrorCode::SchemaInvalidRoot);
        assert!(err.message.starts_with("For conversion to apex"));
    }

    #[test]
    fn bytes_and_fixed_fields_are_unsupported() {
        for ty in [json!("bytes"), json!({ "type": "bytes" }), json!({ "type": "fixed", "name": "F", "size": 4 })] {
            let err = generate(&[json!({
                "type": "record",
                "name": "R",
                "fields": [{ "name": "raw", "type": ty }]
            })])
            .unwrap_err();
            assert_eq!(err.code, ErrorCode::SchemaUnsupportedType);
            assert!(err.message.contains("We do not support"));
        }
    }

    #[test]
    fn identical_definitions_across_schemas_emit_once() {
        let shared = json!({ "type": "record", "name": "Shared", "namespace": "ns", "fields": [{ "name": "id", "type": "string" }] });
        let first = json!({ "type": "record", "name": "First", "namespace": "ns", "fields": [{ "name": "s", "type": shared }] });
        let second = json!({ "type": "record", "name": "Second", "namespace": "ns", "fields": [{ "name": "s", "type": shared }] });

        let generated = generate(&[first, second]).unwrap();

        assert_eq!(
            generated.classes.qualified_names(),
            vec!["ns.Shared", "ns.First", "ns.Second"]
        );
        assert_eq!(generated.source.matches("public class ns_Shared {").count(), 1);
    }

    #[test]
    fn differing_definitions_across_schemas_fail() {
        let one = json!({ "type": "record", "name": "Foo", "fields": [{ "name": "a", "type": "int" }] });
        let two = json!({ "type": "record", "name": "Foo", "fields": [{ "name": "a", "type": "string" }] });

        let err = generate(&[one, two]).unwrap_err();

        assert_eq!(err.code, ErrorCode::SchemaDuplicateDefinition);
        assert!(err.message.contains("cannot be used across schemas unless they are identical"));
        assert!(err.message.contains("Identifier: 'Foo'"));
    }

    #[test]
    fn class_table_serializes_in_emission_order() {
        let generated = generate(&[foo_schema()]).unwrap();

        let value = serde_json::to_value(&generated.classes).unwrap();

        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, generated.classes.qualified_names());
        assert!(value.as_object().unwrap().values().all(|c| c.get("source").is_none()));
    }

    #[test]
    fn identifiers_sharing_an_apex_name_fail() {
        let namespaced = json!({ "type": "record", "name": "Foo", "namespace": "ns", "fields": [{ "name": "a", "type": "int" }] });
        let flat = json!({ "type": "record", "name": "ns_Foo", "fields": [{ "name": "a", "type": "int" }] });

        let err = generate(&[namespaced, flat]).unwrap_err();

        assert_eq!(err.code, ErrorCode::SchemaDuplicateDefinition);
        assert!(err.message.contains("'ns.Foo' and 'ns_Foo'"), "{}", err.message);
        assert!(err.message.contains("Apex class 'ns_Foo'"));
    }

    #[test]
    fn trimmed_underscores_collide_within_one_schema() {
        let err = generate(&[json!({
            "type": "record",
            "name": "Root",
            "fields": [
                { "name": "x", "type": { "type": "record", "name": "b", "namespace": "a_", "fields": [] } },
                { "name": "y", "type": { "type": "record", "name": "_b", "namespace": "a", "fields": [] } }
            ]
        })])
        .unwrap_err();

        assert_eq!(err.code, ErrorCode::SchemaDuplicateDefinition);
    }

    #[test]
    fn class_table_insert_semantics() {
        let class = |source: &str| GeneratedClass {
            qualified_name: "ns.Foo".to_string(),
            class_name: "ns_Foo".to_string(),
            kind: ClassKind::Inner,
            source: source.to_string(),
        };
        let mut table = ClassTable::new();

        assert!(table.insert(class("a")).unwrap());
        assert!(!table.insert(class("a")).unwrap());
        assert!(table.insert(class("b")).is_err());
        assert_eq!(table.len(), 1);
    }
}
