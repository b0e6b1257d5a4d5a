//! JSON schema writer
//!
//! Streams an [`EventSchema`] to a sink as a JSON document of the shape
//!
//! ```text
//! {
//!   "type": "...", "version": "...", "contentType": "...", "description": "..." | null,
//!   "properties": {
//!     "<name>": {
//!       "dataType": "...", "version": "...", "description": "..." | null,
//!       "required": true,               // Required constraint
//!       "allowedValues": [...],         // EnumMember constraint
//!       "min": ..., "max": ...,         // Range constraint bounds
//!       "properties": { ... }           // nested properties
//!     }
//!   }
//! }
//! ```
//!
//! The document is produced in chunks: the header, one chunk per top-level
//! property and the closing bytes. The async writer checks its cancellation
//! token before every chunk; a cancelled write stops there and leaves a
//! truncated document in the sink.

use serde::ser::{Error as _, SerializeMap};
use serde::{Serialize, Serializer};
use serde_json::ser::Formatter;
use serde_json::value::RawValue;
use std::io::Write;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::OutputFormat;
use crate::constraint::Constraint;
use crate::error::{Result, SchemaError};
use crate::property::{PropertyCollection, PropertyNode};
use crate::schema::EventSchema;
use crate::value::{ScalarKind, ScalarValue};

/// Writes event schemas as JSON documents
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaJsonWriter {
    format: OutputFormat,
}

impl SchemaJsonWriter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Write a schema to a blocking sink
    pub fn write_to<W: Write>(&self, sink: &mut W, schema: &EventSchema) -> Result<()> {
        ensure_encodable(schema)?;

        for chunk in self.chunks(schema) {
            sink.write_all(&chunk?)?;
        }
        sink.flush()?;

        info!(schema = %schema.key(), "wrote event schema");
        Ok(())
    }

    /// Write a schema to an async sink, stopping with
    /// [`SchemaError::Cancelled`] if `cancel` fires between two chunks
    pub async fn write_to_async<W>(
        &self,
        sink: &mut W,
        schema: &EventSchema,
        cancel: &CancellationToken,
    ) -> Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        ensure_encodable(schema)?;

        for chunk in self.chunks(schema) {
            if cancel.is_cancelled() {
                warn!(schema = %schema.key(), "schema write cancelled");
                return Err(SchemaError::Cancelled);
            }
            sink.write_all(&chunk?).await?;
        }
        sink.flush().await?;

        info!(schema = %schema.key(), "wrote event schema");
        Ok(())
    }

    /// Render a schema to a string
    pub fn to_string(&self, schema: &EventSchema) -> Result<String> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer, schema)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    fn chunks<'a>(&'a self, schema: &'a EventSchema) -> Chunks<'a> {
        Chunks {
            writer: self,
            schema,
            stage: Stage::Head,
        }
    }

    fn head(&self, schema: &EventSchema) -> Result<Vec<u8>> {
        let fields: [(&str, serde_json::Value); 4] = [
            ("type", schema.event_type().into()),
            ("version", schema.version().to_string().into()),
            ("contentType", schema.content_type().into()),
            ("description", schema.description().into()),
        ];

        let mut out = Vec::new();
        out.push(b'{');
        for (key, value) in fields.iter() {
            self.newline(&mut out, 1);
            self.key(&mut out, key)?;
            serde_json::to_writer(&mut out, value)?;
            out.push(b',');
        }
        self.newline(&mut out, 1);
        self.key(&mut out, "properties")?;
        out.push(b'{');
        Ok(out)
    }

    fn entry(&self, index: usize, property: &PropertyNode) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        if index > 0 {
            out.push(b',');
        }
        self.newline(&mut out, 2);
        self.key(&mut out, property.name())?;

        let document = PropertyDocument(property);
        match self.format {
            OutputFormat::Compact => serde_json::to_writer(&mut out, &document)?,
            OutputFormat::Pretty => {
                let mut serializer =
                    serde_json::Serializer::with_formatter(&mut out, IndentedFormatter::at_depth(2));
                document.serialize(&mut serializer)?;
            }
        }

        debug!(property = %property.name(), "wrote property");
        Ok(out)
    }

    fn tail(&self, schema: &EventSchema) -> Vec<u8> {
        let mut out = Vec::new();
        if !schema.properties().is_empty() {
            self.newline(&mut out, 1);
        }
        out.push(b'}');
        self.newline(&mut out, 0);
        out.push(b'}');
        out
    }

    fn key(&self, out: &mut Vec<u8>, key: &str) -> Result<()> {
        serde_json::to_writer(&mut *out, key)?;
        out.push(b':');
        if let OutputFormat::Pretty = self.format {
            out.push(b' ');
        }
        Ok(())
    }

    fn newline(&self, out: &mut Vec<u8>, depth: usize) {
        if let OutputFormat::Pretty = self.format {
            out.push(b'\n');
            out.extend(std::iter::repeat(b' ').take(depth * 2));
        }
    }
}

enum Stage {
    Head,
    Property(usize),
    Done,
}

/// Lazily rendered pieces of one schema document
struct Chunks<'a> {
    writer: &'a SchemaJsonWriter,
    schema: &'a EventSchema,
    stage: Stage,
}

impl Iterator for Chunks<'_> {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.stage {
            Stage::Head => {
                self.stage = Stage::Property(0);
                Some(self.writer.head(self.schema))
            }
            Stage::Property(index) => match self.schema.properties().get_index(index) {
                Some(property) => {
                    self.stage = Stage::Property(index + 1);
                    Some(self.writer.entry(index, property))
                }
                None => {
                    self.stage = Stage::Done;
                    Some(Ok(self.writer.tail(self.schema)))
                }
            },
            Stage::Done => None,
        }
    }
}

/// Write a schema as compact JSON to an async sink
pub async fn write_schema_json<W>(sink: &mut W, schema: &EventSchema) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    SchemaJsonWriter::default()
        .write_to_async(sink, schema, &CancellationToken::new())
        .await
}

/// Scalar kinds with a JSON encoding for `min`, `max` and `allowedValues`
fn is_encodable(kind: ScalarKind) -> bool {
    matches!(
        kind,
        ScalarKind::Int
            | ScalarKind::Long
            | ScalarKind::Float
            | ScalarKind::Double
            | ScalarKind::Decimal
            | ScalarKind::String
    )
}

/// Fail before anything is written if some range bound or allowed value
/// cannot be encoded. Allow-lists of other kinds are left out of the
/// document instead.
fn ensure_encodable(schema: &EventSchema) -> Result<()> {
    fn check(properties: &PropertyCollection) -> Result<()> {
        for property in properties {
            for constraint in property.constraints() {
                let (kind, values): (ScalarKind, Vec<&ScalarValue>) = match constraint {
                    Constraint::Required(_) => continue,
                    Constraint::Range(range) => {
                        if !is_encodable(range.kind()) {
                            return Err(SchemaError::UnsupportedDataType(range.kind()));
                        }
                        (range.kind(), range.min().into_iter().chain(range.max()).collect())
                    }
                    Constraint::EnumMember(members) if is_encodable(members.kind()) => {
                        (members.kind(), members.allowed_values().iter().collect())
                    }
                    Constraint::EnumMember(_) => continue,
                };
                if values.iter().any(|v| !v.is_finite()) {
                    return Err(SchemaError::NonFiniteValue(kind));
                }
            }
            check(property.properties())?;
        }
        Ok(())
    }

    check(schema.properties())
}

/// Pretty printing that starts `depth` levels deep, so a property rendered
/// on its own lines up with the document around it
struct IndentedFormatter {
    depth: usize,
    has_value: bool,
}

impl IndentedFormatter {
    const INDENT: &'static [u8] = b"  ";

    fn at_depth(depth: usize) -> Self {
        Self {
            depth,
            has_value: false,
        }
    }

    fn indent<W: ?Sized + Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for _ in 0..self.depth {
            writer.write_all(Self::INDENT)?;
        }
        Ok(())
    }

    fn open<W: ?Sized + Write>(&mut self, writer: &mut W, token: &[u8]) -> std::io::Result<()> {
        self.depth += 1;
        self.has_value = false;
        writer.write_all(token)
    }

    fn close<W: ?Sized + Write>(&mut self, writer: &mut W, token: &[u8]) -> std::io::Result<()> {
        self.depth -= 1;
        if self.has_value {
            writer.write_all(b"\n")?;
            self.indent(writer)?;
        }
        writer.write_all(token)
    }

    fn item<W: ?Sized + Write>(&mut self, writer: &mut W, first: bool) -> std::io::Result<()> {
        writer.write_all(if first { b"\n" as &[u8] } else { b",\n" })?;
        self.indent(writer)
    }
}

impl Formatter for IndentedFormatter {
    fn begin_array<W: ?Sized + Write>(&mut self, writer: &mut W) -> std::io::Result<()> {
        self.open(writer, b"[")
    }

    fn end_array<W: ?Sized + Write>(&mut self, writer: &mut W) -> std::io::Result<()> {
        self.close(writer, b"]")
    }

    fn begin_array_value<W: ?Sized + Write>(&mut self, writer: &mut W, first: bool) -> std::io::Result<()> {
        self.item(writer, first)
    }

    fn end_array_value<W: ?Sized + Write>(&mut self, _writer: &mut W) -> std::io::Result<()> {
        self.has_value = true;
        Ok(())
    }

    fn begin_object<W: ?Sized + Write>(&mut self, writer: &mut W) -> std::io::Result<()> {
        self.open(writer, b"{")
    }

    fn end_object<W: ?Sized + Write>(&mut self, writer: &mut W) -> std::io::Result<()> {
        self.close(writer, b"}")
    }

    fn begin_object_key<W: ?Sized + Write>(&mut self, writer: &mut W, first: bool) -> std::io::Result<()> {
        self.item(writer, first)
    }

    fn begin_object_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> std::io::Result<()> {
        writer.write_all(b": ")
    }

    fn end_object_value<W: ?Sized + Write>(&mut self, _writer: &mut W) -> std::io::Result<()> {
        self.has_value = true;
        Ok(())
    }
}

struct PropertyDocument<'a>(&'a PropertyNode);

impl Serialize for PropertyDocument<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let property = self.0;
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("dataType", property.data_type())?;
        map.serialize_entry("version", &property.version().map(ToString::to_string))?;
        map.serialize_entry("description", &property.description())?;

        for constraint in property.constraints() {
            match constraint {
                Constraint::Required(_) => map.serialize_entry("required", &true)?,
                Constraint::EnumMember(members) if is_encodable(members.kind()) => {
                    map.serialize_entry("allowedValues", &EncodedList(members.allowed_values()))?
                }
                Constraint::EnumMember(_) => {}
                Constraint::Range(range) => {
                    if let Some(min) = range.min() {
                        map.serialize_entry("min", &Encoded(min))?;
                    }
                    if let Some(max) = range.max() {
                        map.serialize_entry("max", &Encoded(max))?;
                    }
                }
            }
        }

        if !property.properties().is_empty() {
            map.serialize_entry("properties", &PropertiesDocument(property.properties()))?;
        }
        map.end()
    }
}

struct PropertiesDocument<'a>(&'a PropertyCollection);

impl Serialize for PropertiesDocument<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|p| (p.name(), PropertyDocument(p))))
    }
}

/// A scalar encoded according to its own kind
struct Encoded<'a>(&'a ScalarValue);

impl Serialize for Encoded<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        if !self.0.is_finite() {
            return Err(S::Error::custom(SchemaError::NonFiniteValue(self.0.kind())));
        }
        match self.0 {
            ScalarValue::Int(v) => serializer.serialize_i32(*v),
            ScalarValue::Long(v) => serializer.serialize_i64(*v),
            ScalarValue::Float(v) => serializer.serialize_f32(*v),
            ScalarValue::Double(v) => serializer.serialize_f64(*v),
            // written from its decimal text so no digit is rounded away
            ScalarValue::Decimal(v) => RawValue::from_string(v.to_string())
                .map_err(S::Error::custom)?
                .serialize(serializer),
            ScalarValue::String(v) => serializer.serialize_str(v),
            other => Err(S::Error::custom(SchemaError::UnsupportedDataType(other.kind()))),
        }
    }
}

struct EncodedList<'a>(&'a [ScalarValue]);

impl Serialize for EncodedList<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter().map(Encoded))
    }
}
