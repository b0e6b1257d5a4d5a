//! Type descriptors: the structural metadata schemas are derived from
//!
//! Descriptors can be built in code with the builder methods below, or
//! written as JSON/TOML files and loaded with [`TypeDescriptor::from_path`]:
//!
//! ```json
//! {
//!   "name": "People.PersonCreated",
//!   "event": { "eventType": "person.created", "dataSchema": "1.0" },
//!   "members": [
//!     { "name": "FirstName", "type": "string", "required": true,
//!       "property": { "name": "first_name" } },
//!     { "name": "Age", "type": "int", "range": { "min": { "int": 14 }, "max": { "int": 21 } } }
//!   ]
//! }
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

use crate::error::{Result, SchemaError};
use crate::value::{ScalarKind, ScalarValue};
use crate::version::SchemaVersion;

/// A type schemas can be derived from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDescriptor {
    /// Fully-qualified type name
    pub name: String,
    /// Type-level event metadata; required at the root of a derivation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<EventMetadata>,
    /// The type this one extends
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<Box<TypeDescriptor>>,
    /// Public members declared by this type, in declaration order
    #[serde(default)]
    pub members: Vec<MemberDescriptor>,
}

/// Event metadata attached to a type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventMetadata {
    pub event_type: String,
    /// A version string or the location of a data schema
    #[serde(alias = "version")]
    pub data_schema: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

/// A public member of a type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub value_type: TypeRef,
    /// Explicit property metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property: Option<PropertyHint>,
    /// Name the member is serialized under
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serialized_name: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<RangeHint>,
}

/// Explicit property metadata of a member
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyHint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, alias = "version", skip_serializing_if = "Option::is_none")]
    pub schema_or_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Range validation hint of a member
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RangeHint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<ScalarValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<ScalarValue>,
}

/// An enumerated type and its member names in declaration order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumDescriptor {
    pub name: String,
    pub variants: Vec<String>,
}

/// Declared value type of a member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TypeRef {
    String,
    Int,
    Long,
    Float,
    Double,
    Decimal,
    Boolean,
    DateTime,
    DateTimeOffset,
    Guid,
    Optional(Box<TypeRef>),
    Array(Box<TypeRef>),
    Enum(EnumDescriptor),
    Object(Box<TypeDescriptor>),
    /// A type with no known structure, named by its fully-qualified name
    Opaque(String),
}

/// A version-or-location string from event or property metadata
#[derive(Debug, Clone, PartialEq)]
pub enum DataSchema {
    Version(SchemaVersion),
    Location(String),
}

fn location_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:\S+$").expect("location pattern is valid")
    })
}

impl DataSchema {
    /// Classify a string as a version or an absolute schema location
    pub fn parse(value: &str) -> Result<Self> {
        if let Ok(version) = SchemaVersion::parse(value) {
            return Ok(DataSchema::Version(version));
        }
        if location_pattern().is_match(value.trim()) {
            return Ok(DataSchema::Location(value.trim().to_string()));
        }
        Err(SchemaError::InvalidSchemaLocation(value.to_string()))
    }

    pub fn version(&self) -> Option<SchemaVersion> {
        match self {
            DataSchema::Version(version) => Some(*version),
            DataSchema::Location(_) => None,
        }
    }
}

impl TypeDescriptor {
    /// A plain type without event metadata
    pub fn object(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            event: None,
            base: None,
            members: Vec::new(),
        }
    }

    /// A type carrying event metadata
    pub fn event(
        name: impl Into<String>,
        event_type: impl Into<String>,
        data_schema: impl Into<String>,
    ) -> Self {
        Self {
            event: Some(EventMetadata {
                event_type: event_type.into(),
                data_schema: data_schema.into(),
                description: None,
                attributes: BTreeMap::new(),
            }),
            ..Self::object(name)
        }
    }

    /// Set the event description; no-op on types without event metadata
    pub fn described(mut self, description: impl Into<String>) -> Self {
        if let Some(event) = self.event.as_mut() {
            event.description = Some(description.into());
        }
        self
    }

    /// Add an auxiliary event attribute; no-op on types without event metadata
    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        if let Some(event) = self.event.as_mut() {
            event.attributes.insert(name.into(), value.into());
        }
        self
    }

    pub fn extends(mut self, base: TypeDescriptor) -> Self {
        self.base = Some(Box::new(base));
        self
    }

    pub fn member(mut self, member: MemberDescriptor) -> Self {
        self.members.push(member);
        self
    }

    /// Load a descriptor from a `.json` or `.toml` file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Ok(toml::from_str(&content)?),
            _ => Ok(serde_json::from_str(&content)?),
        }
    }
}

impl MemberDescriptor {
    pub fn new(name: impl Into<String>, value_type: TypeRef) -> Self {
        Self {
            name: name.into(),
            value_type,
            property: None,
            serialized_name: None,
            required: false,
            range: None,
        }
    }

    /// Explicit property name
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.property.get_or_insert_with(PropertyHint::default).name = Some(name.into());
        self
    }

    /// Explicit version or schema location
    pub fn versioned(mut self, schema_or_version: impl Into<String>) -> Self {
        self.property
            .get_or_insert_with(PropertyHint::default)
            .schema_or_version = Some(schema_or_version.into());
        self
    }

    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.property.get_or_insert_with(PropertyHint::default).description =
            Some(description.into());
        self
    }

    pub fn serialized_as(mut self, name: impl Into<String>) -> Self {
        self.serialized_name = Some(name.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn range(mut self, min: Option<ScalarValue>, max: Option<ScalarValue>) -> Self {
        self.range = Some(RangeHint { min, max });
        self
    }
}

impl TypeRef {
    pub fn optional(inner: TypeRef) -> Self {
        TypeRef::Optional(Box::new(inner))
    }

    pub fn array(element: TypeRef) -> Self {
        TypeRef::Array(Box::new(element))
    }

    pub fn object(descriptor: TypeDescriptor) -> Self {
        TypeRef::Object(Box::new(descriptor))
    }

    pub fn enumeration<I, S>(name: impl Into<String>, variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TypeRef::Enum(EnumDescriptor {
            name: name.into(),
            variants: variants.into_iter().map(Into::into).collect(),
        })
    }

    /// The type with any optional wrappers removed
    pub fn unwrap_optional(&self) -> &TypeRef {
        match self {
            TypeRef::Optional(inner) => inner.unwrap_optional(),
            other => other,
        }
    }

    /// Scalar kind of the type, after unwrapping optionality
    pub fn scalar_kind(&self) -> Option<ScalarKind> {
        match self.unwrap_optional() {
            TypeRef::String => Some(ScalarKind::String),
            TypeRef::Int => Some(ScalarKind::Int),
            TypeRef::Long => Some(ScalarKind::Long),
            TypeRef::Float => Some(ScalarKind::Float),
            TypeRef::Double => Some(ScalarKind::Double),
            TypeRef::Decimal => Some(ScalarKind::Decimal),
            TypeRef::Boolean => Some(ScalarKind::Boolean),
            TypeRef::DateTime => Some(ScalarKind::DateTime),
            TypeRef::DateTimeOffset => Some(ScalarKind::DateTimeOffset),
            TypeRef::Guid => Some(ScalarKind::Guid),
            _ => None,
        }
    }

    /// Canonical data type tag
    pub fn data_type(&self) -> String {
        if let Some(kind) = self.scalar_kind() {
            return kind.data_type().to_string();
        }
        match self.unwrap_optional() {
            TypeRef::Array(element) => format!("{}[]", element.data_type()),
            TypeRef::Enum(_) => ScalarKind::String.data_type().to_string(),
            TypeRef::Object(descriptor) => descriptor.name.clone(),
            TypeRef::Opaque(name) => name.clone(),
            // scalars and optionals are handled above
            _ => String::new(),
        }
    }

    /// Descriptor whose members describe the nested properties of a value of
    /// this type: an object, or the element of an array of objects
    pub fn composite(&self) -> Option<&TypeDescriptor> {
        match self.unwrap_optional() {
            TypeRef::Object(descriptor) => Some(descriptor),
            TypeRef::Array(element) => match element.unwrap_optional() {
                TypeRef::Object(descriptor) => Some(descriptor),
                _ => None,
            },
            _ => None,
        }
    }
}

impl From<ScalarKind> for TypeRef {
    fn from(kind: ScalarKind) -> Self {
        match kind {
            ScalarKind::String => TypeRef::String,
            ScalarKind::Int => TypeRef::Int,
            ScalarKind::Long => TypeRef::Long,
            ScalarKind::Float => TypeRef::Float,
            ScalarKind::Double => TypeRef::Double,
            ScalarKind::Decimal => TypeRef::Decimal,
            ScalarKind::Boolean => TypeRef::Boolean,
            ScalarKind::DateTime => TypeRef::DateTime,
            ScalarKind::DateTimeOffset => TypeRef::DateTimeOffset,
            ScalarKind::Guid => TypeRef::Guid,
        }
    }
}
