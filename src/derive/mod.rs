//! Schema derivation
//!
//! Turns a [`TypeDescriptor`] into an [`EventSchema`]: every public member of
//! the type (inherited members first) becomes a property, with its name,
//! version, data type and constraints taken from the member metadata.
//! Members whose type is an object, or an array of objects, get the members
//! of that type as nested properties.
//!
//! Derivation is all-or-nothing: the first malformed piece of metadata aborts
//! it and no partial schema is returned.

pub mod descriptor;

pub use descriptor::{
    DataSchema, EnumDescriptor, EventMetadata, MemberDescriptor, PropertyHint, RangeHint,
    TypeDescriptor, TypeRef,
};

use tracing::{debug, info};

use crate::constraint::{EnumMemberConstraint, RangeConstraint, RequiredConstraint};
use crate::error::{Result, SchemaError};
use crate::property::{PropertyCollection, PropertyNode};
use crate::schema::{EventSchema, OBJECT_CONTENT_TYPE};
use crate::version::SchemaVersion;

/// Derive the schema of an event type
pub fn derive_schema(descriptor: &TypeDescriptor) -> Result<EventSchema> {
    let metadata = descriptor
        .event
        .as_ref()
        .ok_or_else(|| SchemaError::NotAnEventType(descriptor.name.clone()))?;

    let version = DataSchema::parse(&metadata.data_schema)?
        .version()
        .ok_or_else(|| SchemaError::InvalidVersionFormat(metadata.data_schema.clone()))?;

    let mut schema = EventSchema::new(
        &metadata.event_type,
        &version.to_string(),
        OBJECT_CONTENT_TYPE,
    )?;
    schema.set_description(metadata.description.clone());
    schema.attributes_mut().extend(
        metadata
            .attributes
            .iter()
            .map(|(name, value)| (name.clone(), value.clone())),
    );

    derive_properties(descriptor, schema.properties_mut())?;

    info!(
        event_type = %schema.event_type(),
        version = %schema.version(),
        properties = schema.properties().len(),
        "derived event schema from {}",
        descriptor.name
    );
    Ok(schema)
}

/// Add a property for every member of `descriptor` to `target`
fn derive_properties(descriptor: &TypeDescriptor, target: &mut PropertyCollection) -> Result<()> {
    for (member, default_version) in members_of(descriptor)? {
        let property = derive_property(member, default_version)?;
        target.add(property)?;
    }
    Ok(())
}

/// Members of a type and of the types it extends, base members first, each
/// paired with the version of the nearest type in its chain that carries
/// event metadata.
fn members_of(descriptor: &TypeDescriptor) -> Result<Vec<(&MemberDescriptor, Option<SchemaVersion>)>> {
    let mut chain = Vec::new();
    let mut current = Some(descriptor);
    while let Some(ty) = current {
        chain.push(ty);
        current = ty.base.as_deref();
    }

    let mut inherited = None;
    let mut defaults = vec![None; chain.len()];
    for (i, ty) in chain.iter().enumerate().rev() {
        if let Some(event) = &ty.event {
            inherited = DataSchema::parse(&event.data_schema)?.version();
        }
        defaults[i] = inherited;
    }

    let mut members = Vec::new();
    for (i, ty) in chain.iter().enumerate().rev() {
        members.extend(ty.members.iter().map(|m| (m, defaults[i])));
    }
    Ok(members)
}

fn derive_property(
    member: &MemberDescriptor,
    default_version: Option<SchemaVersion>,
) -> Result<PropertyNode> {
    let hint = member.property.as_ref();

    let name = hint
        .and_then(|h| non_blank(h.name.as_deref()))
        .or_else(|| non_blank(member.serialized_name.as_deref()))
        .unwrap_or(&member.name);

    let version = match hint.and_then(|h| non_blank(h.schema_or_version.as_deref())) {
        Some(schema_or_version) => DataSchema::parse(schema_or_version)?
            .version()
            .or(default_version),
        None => default_version,
    };

    let data_type = member.value_type.data_type();
    let mut property = PropertyNode::with_version(name, data_type, version)?;
    property.set_description(hint.and_then(|h| h.description.clone()));

    if member.required {
        property.constraints_mut().add(RequiredConstraint)?;
    }
    if let Some(range) = &member.range {
        property.constraints_mut().add(range_constraint(member, range)?)?;
    }
    if let TypeRef::Enum(enumeration) = member.value_type.unwrap_optional() {
        property
            .constraints_mut()
            .add(EnumMemberConstraint::new(enumeration.variants.iter().cloned()))?;
    }

    if let Some(composite) = member.value_type.composite() {
        derive_properties(composite, property.properties_mut())?;
    }

    debug!(
        member = %member.name,
        property = %property.name(),
        data_type = %property.data_type(),
        constraints = property.constraints().len(),
        nested = property.properties().len(),
        "derived property"
    );
    Ok(property)
}

/// Build the range constraint of a member; bounds must be of the member's
/// own scalar kind
fn range_constraint(member: &MemberDescriptor, range: &RangeHint) -> Result<RangeConstraint> {
    let incompatible = || SchemaError::IncompatibleRangeBounds {
        member: member.name.clone(),
        data_type: member.value_type.data_type(),
    };

    let kind = member.value_type.scalar_kind().ok_or_else(incompatible)?;
    let assignable = range
        .min
        .iter()
        .chain(range.max.iter())
        .all(|bound| bound.kind() == kind);
    if !assignable {
        return Err(incompatible());
    }

    RangeConstraint::from_bounds(kind, range.min.clone(), range.max.clone())
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
