//! Schema properties and the name-indexed collections that own them

use crate::constraint::{Constraint, ConstraintCollection};
use crate::error::{Result, SchemaError};
use crate::version::SchemaVersion;

/// A named, versioned and typed field of an event schema.
///
/// Composite properties carry their own nested [`PropertyCollection`]. The
/// version of a property that has not been given one is filled in from its
/// owner when the property is inserted into a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyNode {
    name: String,
    data_type: String,
    description: Option<String>,
    version: Option<SchemaVersion>,
    constraints: ConstraintCollection,
    properties: PropertyCollection,
}

impl PropertyNode {
    /// Create a property, parsing an optional version string
    pub fn new(
        name: impl Into<String>,
        data_type: impl Into<String>,
        version: Option<&str>,
    ) -> Result<Self> {
        let version = match version {
            Some(v) if !v.trim().is_empty() => Some(SchemaVersion::parse(v)?),
            _ => None,
        };
        Self::with_version(name, data_type, version)
    }

    /// Create a property with an already parsed version
    pub fn with_version(
        name: impl Into<String>,
        data_type: impl Into<String>,
        version: Option<SchemaVersion>,
    ) -> Result<Self> {
        let name = name.into();
        let data_type = data_type.into();
        if name.trim().is_empty() {
            return Err(SchemaError::EmptyArgument("name"));
        }
        if data_type.trim().is_empty() {
            return Err(SchemaError::EmptyArgument("data_type"));
        }

        Ok(Self {
            name,
            data_type,
            description: None,
            version,
            constraints: ConstraintCollection::new(),
            properties: PropertyCollection::new(version),
        })
    }

    /// Set the description, builder style
    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add a constraint, builder style
    pub fn constrained(mut self, constraint: impl Into<Constraint>) -> Result<Self> {
        self.constraints.add(constraint)?;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> &str {
        &self.data_type
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description;
    }

    pub fn version(&self) -> Option<&SchemaVersion> {
        self.version.as_ref()
    }

    pub fn constraints(&self) -> &ConstraintCollection {
        &self.constraints
    }

    pub fn constraints_mut(&mut self) -> &mut ConstraintCollection {
        &mut self.constraints
    }

    /// Nested properties of a composite property
    pub fn properties(&self) -> &PropertyCollection {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut PropertyCollection {
        &mut self.properties
    }

    pub fn is_required(&self) -> bool {
        self.constraints.is_required()
    }
}

/// Ordered properties of a schema or of a composite property, indexed by name.
///
/// Every insertion checks that the name is unique and that the property's
/// version does not exceed the owner's version. A failed call leaves the
/// collection unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyCollection {
    owner_version: Option<SchemaVersion>,
    items: Vec<PropertyNode>,
}

impl PropertyCollection {
    pub(crate) fn new(owner_version: Option<SchemaVersion>) -> Self {
        Self {
            owner_version,
            items: Vec::new(),
        }
    }

    /// Version of the element owning this collection
    pub fn owner_version(&self) -> Option<&SchemaVersion> {
        self.owner_version.as_ref()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PropertyNode> {
        self.items.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(PropertyNode::name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&PropertyNode> {
        self.items.iter().find(|p| p.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut PropertyNode> {
        self.items.iter_mut().find(|p| p.name == name)
    }

    pub fn get_index(&self, index: usize) -> Option<&PropertyNode> {
        self.items.get(index)
    }

    /// Append a property
    pub fn add(&mut self, property: PropertyNode) -> Result<()> {
        self.insert(self.items.len(), property)
    }

    /// Create a property and append it
    pub fn add_property(
        &mut self,
        name: &str,
        data_type: &str,
        version: Option<&str>,
    ) -> Result<&mut PropertyNode> {
        self.add(PropertyNode::new(name, data_type, version)?)?;
        let last = self.items.len() - 1;
        Ok(&mut self.items[last])
    }

    /// Insert a property at `index`
    pub fn insert(&mut self, index: usize, mut property: PropertyNode) -> Result<()> {
        if index > self.items.len() {
            return Err(SchemaError::IndexOutOfBounds {
                index,
                len: self.items.len(),
            });
        }

        adopt(self.owner_version, &mut property)?;

        if self.contains(&property.name) {
            return Err(SchemaError::DuplicatePropertyName(property.name));
        }

        self.items.insert(index, property);
        Ok(())
    }

    /// Replace the property named `name`, returning the previous one.
    ///
    /// The replacement may carry a different name as long as no other
    /// property already uses it.
    pub fn set(&mut self, name: &str, mut property: PropertyNode) -> Result<PropertyNode> {
        let index = self
            .position(name)
            .ok_or_else(|| SchemaError::PropertyNotFound(name.to_string()))?;

        adopt(self.owner_version, &mut property)?;

        let clash = self
            .items
            .iter()
            .enumerate()
            .any(|(i, p)| i != index && p.name == property.name);
        if clash {
            return Err(SchemaError::DuplicatePropertyName(property.name));
        }

        Ok(std::mem::replace(&mut self.items[index], property))
    }

    pub fn remove(&mut self, name: &str) -> Option<PropertyNode> {
        let index = self.position(name)?;
        Some(self.items.remove(index))
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.items.iter().position(|p| p.name == name)
    }
}

impl<'a> IntoIterator for &'a PropertyCollection {
    type Item = &'a PropertyNode;
    type IntoIter = std::slice::Iter<'a, PropertyNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Bind a property being inserted to its owner's version: default an absent
/// version, reject one above the owner, then re-bind the nested tree.
fn adopt(owner: Option<SchemaVersion>, property: &mut PropertyNode) -> Result<()> {
    match (property.version, owner) {
        (None, owner) => property.version = owner,
        (Some(version), Some(owner)) if version > owner => {
            return Err(SchemaError::IncompatibleVersion {
                name: property.name.clone(),
                version: version.to_string(),
                owner: owner.to_string(),
            });
        }
        _ => {}
    }

    let nested = &mut property.properties;
    nested.owner_version = property.version;
    for child in nested.items.iter_mut() {
        adopt(nested.owner_version, child)?;
    }
    Ok(())
}
