//! Writer Tests
//!
//! Written documents are checked against the JSON Schema of the document
//! shape, against a golden document, and for cancellation behaviour.

use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};

use event_schemas::{
    derive_schema, write_schema_json, EnumMemberConstraint, EventSchema, Money, OutputFormat,
    PropertyNode, RangeConstraint, RequiredConstraint, ScalarKind, SchemaError, SchemaJsonWriter,
    TypeDescriptor,
};
use rust_decimal::Decimal;
use jsonschema::JSONSchema;
use serde_json::{json, Value};
use similar::TextDiff;
use tokio::io::AsyncWrite;
use tokio_util::sync::CancellationToken;

fn fixtures_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn person_schema() -> EventSchema {
    let descriptor =
        TypeDescriptor::from_path(fixtures_path().join("descriptors/person_created_v3.json")).unwrap();
    derive_schema(&descriptor).unwrap()
}

fn order_schema() -> EventSchema {
    let mut schema = EventSchema::new("order.placed", "1.2", "application/json").unwrap();
    schema.set_description(Some("An order was placed".to_string()));

    let props = schema.properties_mut();
    props
        .add(
            PropertyNode::new("id", "guid", Some("1.0"))
                .unwrap()
                .constrained(RequiredConstraint)
                .unwrap(),
        )
        .unwrap();
    props
        .add(
            PropertyNode::new("total", "money", None)
                .unwrap()
                .described("Order total")
                .constrained(RangeConstraint::new(Some(Money(Decimal::new(5, 1))), None).unwrap())
                .unwrap(),
        )
        .unwrap();
    props
        .add(
            PropertyNode::new("priority", "int", None)
                .unwrap()
                .constrained(EnumMemberConstraint::new([1, 2, 3]))
                .unwrap(),
        )
        .unwrap();

    let customer = props.add_property("customer", "Customer", Some("1.1")).unwrap();
    customer
        .properties_mut()
        .add_property("name", "string", None)
        .unwrap()
        .constraints_mut()
        .add(RequiredConstraint)
        .unwrap();

    schema
}

fn validate(document: &Value) {
    let shape: Value = serde_json::from_str(
        &std::fs::read_to_string(fixtures_path().join("schema_document.schema.json")).unwrap(),
    )
    .unwrap();
    let compiled = JSONSchema::compile(&shape).unwrap();
    if let Err(errors) = compiled.validate(document) {
        let messages: Vec<String> = errors.map(|e| format!("{} at {}", e, e.instance_path)).collect();
        panic!("Document does not match its shape:\n{}", messages.join("\n"));
    };
}

fn assert_golden(actual: &str, golden: &str) {
    let expected = std::fs::read_to_string(fixtures_path().join("golden").join(golden)).unwrap();
    let expected = expected.trim_end();
    if actual != expected {
        let diff = TextDiff::from_lines(expected, actual);
        panic!("Golden mismatch for {}:\n{}", golden, diff.unified_diff().header("expected", "actual"));
    }
}

// =============================================================================
// Document shape
// =============================================================================

#[test]
fn test_written_documents_match_shape() {
    for schema in [person_schema(), order_schema()] {
        for format in [OutputFormat::Compact, OutputFormat::Pretty] {
            let text = SchemaJsonWriter::new(format).to_string(&schema).unwrap();
            let document: Value = serde_json::from_str(&text).unwrap();
            validate(&document);
        }
    }
}

#[test]
fn test_round_trip_of_all_constraint_kinds() {
    let text = SchemaJsonWriter::default().to_string(&order_schema()).unwrap();
    let document: Value = serde_json::from_str(&text).unwrap();

    assert_eq!(document["type"], "order.placed");
    assert_eq!(document["version"], "1.2");
    assert_eq!(document["contentType"], "application/json");
    assert_eq!(document["description"], "An order was placed");

    let properties = &document["properties"];
    assert_eq!(
        properties["id"],
        json!({ "dataType": "guid", "version": "1.0", "description": null, "required": true })
    );
    assert_eq!(
        properties["total"],
        json!({ "dataType": "money", "version": "1.2", "description": "Order total", "min": 0.5 })
    );
    assert_eq!(properties["priority"]["allowedValues"], json!([1, 2, 3]));
    assert_eq!(properties["customer"]["version"], "1.1");
    assert_eq!(
        properties["customer"]["properties"]["name"],
        json!({ "dataType": "string", "version": "1.1", "description": null, "required": true })
    );
}

#[test]
fn test_field_order() {
    let text = SchemaJsonWriter::new(OutputFormat::Compact).to_string(&order_schema()).unwrap();
    let position = |needle: &str| text.find(needle).unwrap();

    assert!(position("\"type\"") < position("\"version\""));
    assert!(position("\"version\"") < position("\"contentType\""));
    assert!(position("\"contentType\"") < position("\"description\""));
    assert!(position("\"description\"") < position("\"properties\""));
    assert!(position("\"id\"") < position("\"total\""));
    assert!(position("\"total\"") < position("\"priority\""));
    assert!(position("\"priority\"") < position("\"customer\""));
}

#[test]
fn test_pretty_and_compact_are_equivalent() {
    let schema = order_schema();
    let pretty: Value =
        serde_json::from_str(&SchemaJsonWriter::new(OutputFormat::Pretty).to_string(&schema).unwrap())
            .unwrap();
    let compact: Value =
        serde_json::from_str(&SchemaJsonWriter::new(OutputFormat::Compact).to_string(&schema).unwrap())
            .unwrap();
    assert_eq!(pretty, compact);
}

#[test]
fn test_golden_person_document() {
    let text = SchemaJsonWriter::new(OutputFormat::Pretty).to_string(&person_schema()).unwrap();
    assert_golden(&text, "person_created_v3.json");
}

// =============================================================================
// Async writing
// =============================================================================

/// Sink that fires a cancellation token after its first write
struct CancellingSink {
    written: Vec<u8>,
    writes: usize,
    cancel: CancellationToken,
}

impl AsyncWrite for CancellingSink {
    fn poll_write(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        self.written.extend_from_slice(buf);
        self.writes += 1;
        if self.writes == 1 {
            self.cancel.cancel();
        }
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

#[tokio::test]
async fn test_async_write_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("person.json");
    let schema = person_schema();

    let mut file = tokio::fs::File::create(&path).await.unwrap();
    write_schema_json(&mut file, &schema).await.unwrap();
    drop(file);

    let written = std::fs::read_to_string(&path).unwrap();
    assert_eq!(written, SchemaJsonWriter::default().to_string(&schema).unwrap());
    assert!(schema.fingerprint().unwrap().verify(&written));
}

#[tokio::test]
async fn test_cancellation_between_properties() {
    let cancel = CancellationToken::new();
    let mut sink = CancellingSink {
        written: Vec::new(),
        writes: 0,
        cancel: cancel.clone(),
    };

    let err = SchemaJsonWriter::default()
        .write_to_async(&mut sink, &person_schema(), &cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, SchemaError::Cancelled));
    let partial = String::from_utf8(sink.written).unwrap();
    assert!(partial.starts_with(r#"{"type":"person.created""#));
    assert!(partial.ends_with(r#""properties":{"#));
    assert!(serde_json::from_str::<Value>(&partial).is_err());
}

#[tokio::test]
async fn test_unsupported_kind_leaves_sink_untouched() {
    let mut schema = EventSchema::new("flags", "1.0", "object").unwrap();
    schema
        .properties_mut()
        .add_property("id", "string", None)
        .unwrap();
    schema
        .properties_mut()
        .add(
            PropertyNode::new("enabled", "boolean", None)
                .unwrap()
                .constrained(RangeConstraint::new(Some(false), Some(true)).unwrap())
                .unwrap(),
        )
        .unwrap();

    let mut sink = Vec::new();
    let err = write_schema_json(&mut sink, &schema).await.unwrap_err();
    assert!(matches!(err, SchemaError::UnsupportedDataType(ScalarKind::Boolean)));
    assert!(sink.is_empty());
}

#[tokio::test]
async fn test_enum_over_guid_still_writes() {
    let mut schema = EventSchema::new("tenant.moved", "1.0", "object").unwrap();
    schema
        .properties_mut()
        .add(
            PropertyNode::new("tenant", "guid", None)
                .unwrap()
                .constrained(EnumMemberConstraint::new([uuid::Uuid::nil()]))
                .unwrap(),
        )
        .unwrap();

    let mut sink = Vec::new();
    write_schema_json(&mut sink, &schema).await.unwrap();
    let document: Value = serde_json::from_slice(&sink).unwrap();
    validate(&document);
    assert_eq!(
        document["properties"]["tenant"],
        json!({ "dataType": "guid", "version": "1.0", "description": null })
    );
}

// =============================================================================
// Exact numbers
// =============================================================================

#[test]
fn test_decimal_bounds_are_written_exactly() {
    let max: Decimal = "12345678901234567.89".parse().unwrap();
    let mut schema = EventSchema::new("invoice.issued", "1.0", "object").unwrap();
    schema
        .properties_mut()
        .add(
            PropertyNode::new("amount", "money", None)
                .unwrap()
                .constrained(RangeConstraint::new(Some(Money(Decimal::ZERO)), Some(Money(max))).unwrap())
                .unwrap(),
        )
        .unwrap();

    for format in [OutputFormat::Compact, OutputFormat::Pretty] {
        let text = SchemaJsonWriter::new(format).to_string(&schema).unwrap();
        let (_, rest) = text.split_once("\"max\":").unwrap();
        let number: String = rest
            .trim_start()
            .chars()
            .take_while(|c| c.is_ascii_digit() || *c == '.')
            .collect();
        assert_eq!(number, "12345678901234567.89");
        assert_eq!(number.parse::<Decimal>().unwrap(), max);
        validate(&serde_json::from_str(&text).unwrap());
    }
}

#[test]
fn test_non_finite_bounds_are_rejected() {
    assert!(matches!(
        RangeConstraint::new(Some(0.0_f64), Some(f64::INFINITY)),
        Err(SchemaError::InvalidConstraintConfiguration(_))
    ));

    let mut schema = EventSchema::new("reading.taken", "1.0", "object").unwrap();
    schema
        .properties_mut()
        .add(
            PropertyNode::new("level", "float", None)
                .unwrap()
                .constrained(EnumMemberConstraint::new([1.0_f32, f32::NEG_INFINITY]))
                .unwrap(),
        )
        .unwrap();
    let mut sink = Vec::new();
    let err = SchemaJsonWriter::default().write_to(&mut sink, &schema).unwrap_err();
    assert!(matches!(err, SchemaError::NonFiniteValue(ScalarKind::Float)));
    assert!(sink.is_empty());
}
