//! Event Schemas
//!
//! A versioned schema model for domain events, a derivation engine that
//! builds schemas from type descriptors, and a JSON writer for the result.
//!
//! ## Features
//!
//! - **Versioned Properties**: Every property carries the schema version that
//!   introduced it and can never be newer than its owner
//! - **Constraints**: Required, range and enumerated-member rules per property
//! - **Derivation**: Event schemas built from annotated type descriptors,
//!   including inherited members and nested object types
//! - **JSON Output**: Pretty or compact documents, sync or async, cancellable
//!
//! ## Document shape
//!
//! ```text
//! {
//!   "type": "person.created",
//!   "version": "1.0",
//!   "contentType": "object",
//!   "description": null,
//!   "properties": {
//!     "Age": { "dataType": "int", "version": "1.0", "description": null,
//!              "min": 14, "max": 32 }
//!   }
//! }
//! ```

pub mod checksum;
pub mod config;
pub mod constraint;
pub mod derive;
pub mod error;
pub mod property;
pub mod schema;
pub mod value;
pub mod version;
pub mod writer;

pub use checksum::Checksum;
pub use config::{OutputFormat, SchemaConfig};
pub use constraint::{
    Constraint, ConstraintCollection, ConstraintKind, EnumMemberConstraint, RangeConstraint,
    RequiredConstraint,
};
pub use derive::{derive_schema, MemberDescriptor, TypeDescriptor, TypeRef};
pub use error::{Result, SchemaError};
pub use property::{PropertyCollection, PropertyNode};
pub use schema::{EventSchema, OBJECT_CONTENT_TYPE};
pub use value::{Money, Scalar, ScalarKind, ScalarValue, Value};
pub use version::SchemaVersion;
pub use writer::{write_schema_json, SchemaJsonWriter};
