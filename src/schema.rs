//! The event schema root

use std::collections::BTreeMap;

use crate::checksum::Checksum;
use crate::derive::{derive_schema, TypeDescriptor};
use crate::error::{Result, SchemaError};
use crate::property::PropertyCollection;
use crate::version::SchemaVersion;

/// Content type of schemas derived from type descriptors
pub const OBJECT_CONTENT_TYPE: &str = "object";

/// Versioned description of the payload of one event type.
///
/// The event type, version and content type are fixed at construction; the
/// description and the property tree may be changed afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct EventSchema {
    event_type: String,
    version: SchemaVersion,
    content_type: String,
    description: Option<String>,
    attributes: BTreeMap<String, String>,
    properties: PropertyCollection,
}

impl EventSchema {
    /// Create an empty schema
    pub fn new(event_type: &str, version: &str, content_type: &str) -> Result<Self> {
        if event_type.trim().is_empty() {
            return Err(SchemaError::EmptyArgument("event_type"));
        }
        if content_type.trim().is_empty() {
            return Err(SchemaError::EmptyArgument("content_type"));
        }
        let version = SchemaVersion::parse(version)?;

        Ok(Self {
            event_type: event_type.to_string(),
            version,
            content_type: content_type.to_string(),
            description: None,
            attributes: BTreeMap::new(),
            properties: PropertyCollection::new(Some(version)),
        })
    }

    /// Derive a schema from a type descriptor
    pub fn derive(descriptor: &TypeDescriptor) -> Result<Self> {
        derive_schema(descriptor)
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn version(&self) -> &SchemaVersion {
        &self.version
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description;
    }

    /// Auxiliary name/value attributes carried over from the event metadata
    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    pub(crate) fn attributes_mut(&mut self) -> &mut BTreeMap<String, String> {
        &mut self.attributes
    }

    pub fn properties(&self) -> &PropertyCollection {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut PropertyCollection {
        &mut self.properties
    }

    /// Checksum of the compact JSON document of this schema
    pub fn fingerprint(&self) -> Result<Checksum> {
        Checksum::from_schema(self)
    }

    /// Key identifying this schema among others (e.g. `person.created/2.0`)
    pub fn key(&self) -> String {
        format!("{}/{}", self.event_type, self.version)
    }
}
