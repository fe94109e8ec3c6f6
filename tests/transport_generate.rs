use std::fs;
use std::path::Path;

use orizuru::transport::files::{DESCRIPTOR_FILE, SOURCE_FILE};
use orizuru::transport::{generate_from_dir, ClassKind};

fn write(dir: &Path, name: &str, content: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

#[test]
fn generates_one_class_file_from_a_schema_tree() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write(
        input.path(),
        "account.avsc",
        r#"{
            "type": "record", "name": "Account", "namespace": "com.example",
            "fields": [
                { "name": "id", "type": "string" },
                { "name": "status", "type": { "type": "enum", "name": "Status", "symbols": ["OPEN", "CLOSED"] } }
            ]
        }"#,
    );
    write(
        input.path(),
        "nested/contact.avsc",
        r#"{ "type": "record", "name": "Contact", "namespace": "com.example",
             "fields": [ { "name": "emails", "type": { "type": "array", "items": "string" } } ] }"#,
    );

    let result = generate_from_dir(input.path(), &output.path().join("classes")).unwrap();

    assert_eq!(result.input_files.len(), 2);
    assert_eq!(
        result.classes.qualified_names(),
        vec!["com.example.Status", "com.example.Account", "com.example.Contact"]
    );
    assert_eq!(result.classes.get("com.example.Status").unwrap().kind, ClassKind::Enum);

    let source = fs::read_to_string(output.path().join("classes").join(SOURCE_FILE)).unwrap();
    assert!(source.starts_with("public class OrizuruTransport {"));
    assert!(source.contains("public class com_example_Account extends Orizuru.Transport.AbstractTransport"));
    assert!(source.contains("public com_example_Status status { get; set; }"));
    assert!(source.contains("public List<String> emails { get; set; }"));
    assert!(output.path().join("classes").join(DESCRIPTOR_FILE).is_file());
}

#[test]
fn shared_identical_types_are_emitted_once() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let shared = r#"{ "type": "enum", "name": "Level", "symbols": ["LOW", "HIGH"] }"#;
    write(
        input.path(),
        "a.avsc",
        &format!(r#"{{ "type": "record", "name": "A", "fields": [ {{ "name": "level", "type": {} }} ] }}"#, shared),
    );
    write(
        input.path(),
        "b.avsc",
        &format!(r#"{{ "type": "record", "name": "B", "fields": [ {{ "name": "level", "type": {} }} ] }}"#, shared),
    );

    let result = generate_from_dir(input.path(), output.path()).unwrap();
    let source = fs::read_to_string(output.path().join(SOURCE_FILE)).unwrap();

    assert_eq!(result.classes.len(), 3);
    assert_eq!(source.matches("public enum Level").count(), 1);
}

#[test]
fn conflicting_types_across_schemas_fail_without_writing() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write(
        input.path(),
        "a.avsc",
        r#"{ "type": "record", "name": "Same", "fields": [ { "name": "x", "type": "int" } ] }"#,
    );
    write(
        input.path(),
        "b.avsc",
        r#"{ "type": "record", "name": "Same", "fields": [ { "name": "x", "type": "long" } ] }"#,
    );

    let err = generate_from_dir(input.path(), output.path()).unwrap_err();

    assert_eq!(err.code.as_str(), "schema.duplicate_definition");
    assert!(err.message.contains("Identifier: 'Same'"));
    assert!(!output.path().join(SOURCE_FILE).exists());
}

#[test]
fn empty_input_directory_is_rejected() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();

    let err = generate_from_dir(input.path(), output.path()).unwrap_err();

    assert_eq!(err.code.as_str(), "validation.invalid_argument");
    assert!(err.message.starts_with("No .avsc files found"));
}
