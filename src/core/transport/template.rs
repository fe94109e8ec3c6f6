//! Apex source templates for generated transport classes.

use crate::utils::template::render;

const TRANSPORT_CLASS: &str = "\tpublic class {{className}} extends Orizuru.Transport.AbstractTransport {

\t\t{{properties}}

\t\tpublic {{className}}() {
\t\t}
{{constructor}}
\t\tpublic override String getSchemaName() {
\t\t\treturn '{{qualifiedName}}';
\t\t}
\t}
";

const INNER_CLASS: &str = "\tpublic class {{className}} {

\t\t{{properties}}

\t\tpublic {{className}}() {
\t\t}
{{constructor}}\t}
";

const CONSTRUCTOR: &str = "
\t\tpublic {{className}}({{params}}) {
\t\t\t{{assignments}}
\t\t}
";

const PROPERTY: &str = "public {{type}} {{name}} { get; set; }";
const PARAM: &str = "{{type}} {{name}}";
const ASSIGNMENT: &str = "this.{{name}} = {{name}};";

const ENUM: &str = "\tpublic enum {{className}} {
\t\t{{symbols}}
\t}
";

const OUTER: &str = "public class OrizuruTransport {

{{classes}}}
";

const DESCRIPTOR: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ApexClass xmlns="http://soap.sforce.com/2006/04/metadata">
    <apiVersion>{{apiVersion}}</apiVersion>
    <status>Active</status>
</ApexClass>
"#;

pub const API_VERSION: &str = "41.0";

/// Which template a record renders with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordTemplate {
    Transport,
    Inner,
}

pub fn record_class(
    template: RecordTemplate,
    class_name: &str,
    qualified_name: &str,
    fields: &[(String, String)],
) -> String {
    let properties = fields
        .iter()
        .map(|(name, ty)| render(PROPERTY, &[("type", ty.as_str()), ("name", name.as_str())]))
        .collect::<Vec<_>>()
        .join("\n\t\t");

    let constructor = if fields.is_empty() {
        String::new()
    } else {
        let params = fields
            .iter()
            .map(|(name, ty)| render(PARAM, &[("type", ty.as_str()), ("name", name.as_str())]))
            .collect::<Vec<_>>()
            .join(", ");
        let assignments = fields
            .iter()
            .map(|(name, _)| render(ASSIGNMENT, &[("name", name.as_str())]))
            .collect::<Vec<_>>()
            .join("\n\t\t\t");
        render(
            CONSTRUCTOR,
            &[
                ("className", class_name),
                ("params", params.as_str()),
                ("assignments", assignments.as_str()),
            ],
        )
    };

    let body = match template {
        RecordTemplate::Transport => TRANSPORT_CLASS,
        RecordTemplate::Inner => INNER_CLASS,
    };

    render(
        body,
        &[
            ("className", class_name),
            ("qualifiedName", qualified_name),
            ("properties", properties.as_str()),
            ("constructor", constructor.as_str()),
        ],
    )
}

pub fn enum_class(class_name: &str, symbols: &[String]) -> String {
    let symbols = symbols.join(",\n\t\t");
    render(ENUM, &[("className", class_name), ("symbols", symbols.as_str())])
}

/// Wrap the generated classes, joined by newlines, in the outer class.
pub fn transport_source(classes: &[&str]) -> String {
    let joined = classes.join("\n");
    render(OUTER, &[("classes", joined.as_str())])
}

pub fn descriptor() -> String {
    render(DESCRIPTOR, &[("apiVersion", API_VERSION)])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(n, t)| (n.to_string(), t.to_string()))
            .collect()
    }

    #[test]
    fn inner_class_declares_properties_and_constructor() {
        let source = record_class(
            RecordTemplate::Inner,
            "ns_Foo",
            "ns.Foo",
            &fields(&[("bar", "Integer"), ("baz", "String")]),
        );

        assert!(source.starts_with("\tpublic class ns_Foo {"));
        assert!(source.contains("public Integer bar { get; set; }"));
        assert!(source.contains("public String baz { get; set; }"));
        assert!(source.contains("public ns_Foo(Integer bar, String baz) {"));
        assert!(source.contains("this.bar = bar;\n\t\t\tthis.baz = baz;"));
        assert!(!source.contains("{{"));
    }

    #[test]
    fn transport_class_extends_and_names_schema() {
        let source = record_class(
            RecordTemplate::Transport,
            "ns_Foo",
            "ns.Foo",
            &fields(&[("bar", "Integer")]),
        );
        assert!(source.contains("extends Orizuru.Transport.AbstractTransport"));
        assert!(source.contains("return 'ns.Foo';"));
    }

    #[test]
    fn fieldless_record_has_only_default_constructor() {
        let source = record_class(RecordTemplate::Inner, "Empty", "Empty", &[]);
        assert_eq!(source.matches("public Empty(").count(), 1);
    }

    #[test]
    fn enum_lists_symbols() {
        let source = enum_class("Color", &["RED".to_string(), "GREEN".to_string()]);
        assert_eq!(source, "\tpublic enum Color {\n\t\tRED,\n\t\tGREEN\n\t}\n");
    }

    #[test]
    fn outer_class_wraps_entries() {
        let source = transport_source(&["\tA\n", "\tB\n"]);
        assert_eq!(source, "public class OrizuruTransport {\n\n\tA\n\n\tB\n}\n");
    }

    #[test]
    fn descriptor_is_apex_class_metadata() {
        let xml = descriptor();
        assert!(xml.contains("<ApexClass"));
        assert!(xml.contains("<apiVersion>41.0</apiVersion>"));
    }
}
