//! Checksum utilities for schema documents

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::config::OutputFormat;
use crate::error::Result;
use crate::schema::EventSchema;
use crate::writer::SchemaJsonWriter;

/// SHA256 checksum of a schema document
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Checksum(String);

impl Checksum {
    /// Compute checksum from raw bytes
    pub fn from_bytes(data: &[u8]) -> Self {
        let hash = Sha256::digest(data);
        Self(format!("{:x}", hash))
    }

    /// Compute checksum from a string
    pub fn from_str(content: &str) -> Self {
        Self::from_bytes(content.as_bytes())
    }

    /// Compute checksum of the compact JSON document of a schema, so the
    /// result does not depend on the configured output format
    pub fn from_schema(schema: &EventSchema) -> Result<Self> {
        let document = SchemaJsonWriter::new(OutputFormat::Compact).to_string(schema)?;
        Ok(Self::from_str(&document))
    }

    /// Get the hex string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Verify that content matches this checksum
    pub fn verify(&self, content: &str) -> bool {
        Self::from_str(content).0 == self.0
    }

    /// Format as a `sha256sum` line for a file
    pub fn to_line(&self, file: &str) -> String {
        format!("{}  {}", self.0, file)
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Checksum {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Checksum {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
