//! Property constraints
//!
//! A constraint is a validity predicate attached to a property. Three kinds
//! exist: presence ([`RequiredConstraint`]), bounded range
//! ([`RangeConstraint`]) and enumerated membership
//! ([`EnumMemberConstraint`]). Range and enumeration constraints carry the
//! scalar kind they were built for, so two ranges over different kinds are
//! distinct constraint kinds while two ranges over `int` collide.

use std::cmp::Ordering;
use std::fmt;

use crate::error::{Result, SchemaError};
use crate::value::{Scalar, ScalarKind, ScalarValue, Value};

/// Identity of a constraint for uniqueness within a [`ConstraintCollection`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    Required,
    Range(ScalarKind),
    EnumMember(ScalarKind),
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintKind::Required => f.write_str("Required"),
            ConstraintKind::Range(kind) => write!(f, "Range<{}>", kind),
            ConstraintKind::EnumMember(kind) => write!(f, "EnumMember<{}>", kind),
        }
    }
}

/// Valid when a value is present
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequiredConstraint;

impl RequiredConstraint {
    pub fn is_valid(&self, value: Option<&Value>) -> bool {
        value.is_some()
    }
}

/// Valid when a value lies strictly between the configured bounds.
///
/// With both bounds set the value must be greater than `min` and less than
/// `max`. With a single bound only that side is compared.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeConstraint {
    kind: ScalarKind,
    min: Option<ScalarValue>,
    max: Option<ScalarValue>,
}

impl RangeConstraint {
    /// Create a range over a Rust scalar type
    pub fn new<T: Scalar>(min: Option<T>, max: Option<T>) -> Result<Self> {
        Self::from_bounds(T::KIND, min.map(Scalar::into_scalar), max.map(Scalar::into_scalar))
    }

    /// Create a range from raw bounds, which must both be of `kind`
    pub fn from_bounds(
        kind: ScalarKind,
        min: Option<ScalarValue>,
        max: Option<ScalarValue>,
    ) -> Result<Self> {
        if min.is_none() && max.is_none() {
            return Err(SchemaError::InvalidConstraintConfiguration(
                "at least one of the min or max values must be specified".to_string(),
            ));
        }

        for bound in min.iter().chain(max.iter()) {
            if bound.kind() != kind {
                return Err(SchemaError::InvalidConstraintConfiguration(format!(
                    "range bound of kind {} does not match the range kind {}",
                    bound.kind(),
                    kind
                )));
            }
        }

        if let Some(bound) = min.iter().chain(max.iter()).find(|b| !b.is_finite()) {
            return Err(SchemaError::InvalidConstraintConfiguration(format!(
                "range bound {:?} is not a finite number",
                bound
            )));
        }

        Ok(Self { kind, min, max })
    }

    pub fn kind(&self) -> ScalarKind {
        self.kind
    }

    pub fn min(&self) -> Option<&ScalarValue> {
        self.min.as_ref()
    }

    pub fn max(&self) -> Option<&ScalarValue> {
        self.max.as_ref()
    }

    pub fn is_valid(&self, value: Option<&Value>) -> bool {
        let Some(value) = value else {
            return self.min.is_none() && self.max.is_none();
        };
        let Some(value) = self.typed(value) else {
            return false;
        };

        let above = |bound: &ScalarValue| value.compare(bound) == Some(Ordering::Greater);
        let below = |bound: &ScalarValue| value.compare(bound) == Some(Ordering::Less);

        match (&self.min, &self.max) {
            (Some(min), Some(max)) => above(min) && below(max),
            (Some(min), None) => above(min),
            (None, Some(max)) => below(max),
            (None, None) => false,
        }
    }

    /// Inclusive reading of the range: `min <= value <= max`, with an absent
    /// bound leaving that side open.
    pub fn admits_inclusive(&self, value: Option<&Value>) -> bool {
        let Some(value) = value.and_then(|v| self.typed(v)) else {
            return false;
        };

        let min_ok = self.min.as_ref().map_or(true, |min| {
            matches!(value.compare(min), Some(Ordering::Greater | Ordering::Equal))
        });
        let max_ok = self.max.as_ref().map_or(true, |max| {
            matches!(value.compare(max), Some(Ordering::Less | Ordering::Equal))
        });

        min_ok && max_ok
    }

    fn typed<'a>(&self, value: &'a Value) -> Option<&'a ScalarValue> {
        value.as_scalar().filter(|scalar| scalar.kind() == self.kind)
    }
}

/// Valid when a value is one of an ordered list of allowed values
#[derive(Debug, Clone, PartialEq)]
pub struct EnumMemberConstraint {
    kind: ScalarKind,
    allowed_values: Vec<ScalarValue>,
}

impl EnumMemberConstraint {
    pub fn new<T: Scalar, I: IntoIterator<Item = T>>(allowed_values: I) -> Self {
        Self {
            kind: T::KIND,
            allowed_values: allowed_values.into_iter().map(Scalar::into_scalar).collect(),
        }
    }

    /// Create from raw values, all of which must be of `kind`
    pub fn from_values(kind: ScalarKind, allowed_values: Vec<ScalarValue>) -> Result<Self> {
        if let Some(other) = allowed_values.iter().find(|v| v.kind() != kind) {
            return Err(SchemaError::InvalidConstraintConfiguration(format!(
                "allowed value of kind {} does not match the enumeration kind {}",
                other.kind(),
                kind
            )));
        }
        if let Some(value) = allowed_values.iter().find(|v| !v.is_finite()) {
            return Err(SchemaError::InvalidConstraintConfiguration(format!(
                "allowed value {:?} is not a finite number",
                value
            )));
        }
        Ok(Self {
            kind,
            allowed_values,
        })
    }

    pub fn kind(&self) -> ScalarKind {
        self.kind
    }

    pub fn allowed_values(&self) -> &[ScalarValue] {
        &self.allowed_values
    }

    pub fn is_valid(&self, value: Option<&Value>) -> bool {
        match value.and_then(Value::as_scalar) {
            Some(scalar) if scalar.kind() == self.kind => self.allowed_values.contains(scalar),
            _ => false,
        }
    }
}

/// A constraint attached to a property
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    Required(RequiredConstraint),
    Range(RangeConstraint),
    EnumMember(EnumMemberConstraint),
}

impl Constraint {
    pub fn kind(&self) -> ConstraintKind {
        match self {
            Constraint::Required(_) => ConstraintKind::Required,
            Constraint::Range(range) => ConstraintKind::Range(range.kind()),
            Constraint::EnumMember(members) => ConstraintKind::EnumMember(members.kind()),
        }
    }

    pub fn is_valid(&self, value: Option<&Value>) -> bool {
        match self {
            Constraint::Required(required) => required.is_valid(value),
            Constraint::Range(range) => range.is_valid(value),
            Constraint::EnumMember(members) => members.is_valid(value),
        }
    }
}

impl From<RequiredConstraint> for Constraint {
    fn from(constraint: RequiredConstraint) -> Self {
        Constraint::Required(constraint)
    }
}

impl From<RangeConstraint> for Constraint {
    fn from(constraint: RangeConstraint) -> Self {
        Constraint::Range(constraint)
    }
}

impl From<EnumMemberConstraint> for Constraint {
    fn from(constraint: EnumMemberConstraint) -> Self {
        Constraint::EnumMember(constraint)
    }
}

/// Ordered constraints of a property, at most one per [`ConstraintKind`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstraintCollection {
    items: Vec<Constraint>,
}

impl ConstraintCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Constraint> {
        self.items.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Constraint> {
        self.items.get(index)
    }

    pub fn first(&self) -> Option<&Constraint> {
        self.items.first()
    }

    /// Append a constraint
    pub fn add(&mut self, constraint: impl Into<Constraint>) -> Result<()> {
        self.insert(self.items.len(), constraint)
    }

    /// Insert a constraint at `index`
    pub fn insert(&mut self, index: usize, constraint: impl Into<Constraint>) -> Result<()> {
        let constraint = constraint.into();
        if index > self.items.len() {
            return Err(SchemaError::IndexOutOfBounds {
                index,
                len: self.items.len(),
            });
        }
        self.ensure_unique(constraint.kind(), None)?;
        self.items.insert(index, constraint);
        Ok(())
    }

    /// Replace the constraint at `index`, returning the previous one
    pub fn set(&mut self, index: usize, constraint: impl Into<Constraint>) -> Result<Constraint> {
        let constraint = constraint.into();
        if index >= self.items.len() {
            return Err(SchemaError::IndexOutOfBounds {
                index,
                len: self.items.len(),
            });
        }
        self.ensure_unique(constraint.kind(), Some(index))?;
        Ok(std::mem::replace(&mut self.items[index], constraint))
    }

    pub fn remove(&mut self, index: usize) -> Result<Constraint> {
        if index >= self.items.len() {
            return Err(SchemaError::IndexOutOfBounds {
                index,
                len: self.items.len(),
            });
        }
        Ok(self.items.remove(index))
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn contains_kind(&self, kind: ConstraintKind) -> bool {
        self.items.iter().any(|c| c.kind() == kind)
    }

    pub fn is_required(&self) -> bool {
        self.contains_kind(ConstraintKind::Required)
    }

    /// All range constraints, one per scalar kind
    pub fn ranges(&self) -> impl Iterator<Item = &RangeConstraint> {
        self.items.iter().filter_map(|c| match c {
            Constraint::Range(range) => Some(range),
            _ => None,
        })
    }

    /// The first enumerated-membership constraint
    pub fn enum_member(&self) -> Option<&EnumMemberConstraint> {
        self.items.iter().find_map(|c| match c {
            Constraint::EnumMember(members) => Some(members),
            _ => None,
        })
    }

    /// Evaluate every constraint against a value
    pub fn is_valid(&self, value: Option<&Value>) -> bool {
        self.items.iter().all(|c| c.is_valid(value))
    }

    fn ensure_unique(&self, kind: ConstraintKind, skip: Option<usize>) -> Result<()> {
        let clash = self
            .items
            .iter()
            .enumerate()
            .any(|(i, existing)| Some(i) != skip && existing.kind() == kind);
        if clash {
            return Err(SchemaError::DuplicateConstraintKind(kind.to_string()));
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a ConstraintCollection {
    type Item = &'a Constraint;
    type IntoIter = std::slice::Iter<'a, Constraint>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(min: Option<i32>, max: Option<i32>) -> RangeConstraint {
        RangeConstraint::new(min, max).unwrap()
    }

    #[test]
    fn test_required() {
        let constraint = Constraint::from(RequiredConstraint);
        assert!(constraint.is_valid(Some(&Value::from("name"))));
        assert!(!constraint.is_valid(None));
    }

    #[test]
    fn test_range_is_strict() {
        let r = range(Some(22), Some(34));
        assert!(r.is_valid(Some(&25.into())));
        assert!(!r.is_valid(Some(&22.into())));
        assert!(!r.is_valid(Some(&34.into())));
        assert!(!r.is_valid(Some(&11.into())));
        assert!(!r.is_valid(Some(&35.into())));
    }

    #[test]
    fn test_range_inclusive_reading() {
        let r = range(Some(22), Some(34));
        assert!(r.admits_inclusive(Some(&22.into())));
        assert!(r.admits_inclusive(Some(&34.into())));
        assert!(r.admits_inclusive(Some(&25.into())));
        assert!(!r.admits_inclusive(Some(&35.into())));
        assert!(!r.admits_inclusive(None));
    }

    #[test]
    fn test_range_one_sided() {
        assert!(range(None, Some(34)).is_valid(Some(&25.into())));
        assert!(range(Some(22), None).is_valid(Some(&25.into())));
        assert!(!range(Some(22), None).is_valid(Some(&22.into())));
        // a one-sided range leaves the other side unchecked
        assert!(range(Some(22), None).is_valid(Some(&i32::MAX.into())));
        assert!(range(None, Some(34)).is_valid(Some(&i32::MIN.into())));
    }

    #[test]
    fn test_range_rejects_absent_and_mistyped() {
        let r = range(Some(22), Some(34));
        assert!(!r.is_valid(None));
        assert!(!r.is_valid(Some(&25i64.into())));
        assert!(!r.is_valid(Some(&"25".into())));
    }

    #[test]
    fn test_range_requires_a_bound() {
        let err = RangeConstraint::new::<i32>(None, None).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidConstraintConfiguration(_)));

        let err = RangeConstraint::from_bounds(
            ScalarKind::Int,
            Some(ScalarValue::Long(1)),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidConstraintConfiguration(_)));
    }

    #[test]
    fn test_non_finite_values_are_rejected() {
        let err = RangeConstraint::new(Some(f64::NEG_INFINITY), Some(f64::NAN)).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidConstraintConfiguration(_)));
        let err = RangeConstraint::new(None, Some(f32::INFINITY)).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidConstraintConfiguration(_)));

        let err = EnumMemberConstraint::from_values(
            ScalarKind::Double,
            vec![ScalarValue::Double(1.0), ScalarValue::Double(f64::NAN)],
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidConstraintConfiguration(_)));
    }

    #[test]
    fn test_enum_member() {
        let c = EnumMemberConstraint::new(["Red", "LawnGreen", "Blue"]);
        assert_eq!(c.kind(), ScalarKind::String);
        assert!(c.is_valid(Some(&"LawnGreen".into())));
        assert!(!c.is_valid(Some(&"fooBar".into())));
        assert!(!c.is_valid(Some(&1.into())));
        assert!(!c.is_valid(None));

        let err = EnumMemberConstraint::from_values(
            ScalarKind::String,
            vec![ScalarValue::String("a".into()), ScalarValue::Int(1)],
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidConstraintConfiguration(_)));
    }

    #[test]
    fn test_collection_rejects_same_kind() {
        let mut constraints = ConstraintCollection::new();
        constraints.add(RequiredConstraint).unwrap();
        constraints.add(range(Some(0), Some(100))).unwrap();

        let err = constraints.add(RequiredConstraint).unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateConstraintKind(_)));

        // same kind, different bounds: still a collision
        let err = constraints.add(range(Some(1), None)).unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateConstraintKind(_)));
        assert_eq!(constraints.len(), 2);

        // a range over another scalar kind is a different kind
        constraints.add(RangeConstraint::new(Some(1i64), None).unwrap()).unwrap();
        assert_eq!(constraints.ranges().count(), 2);
    }

    #[test]
    fn test_collection_set_and_insert() {
        let mut constraints = ConstraintCollection::new();
        constraints.add(RequiredConstraint).unwrap();
        constraints.add(range(Some(0), None)).unwrap();

        // replacing an element with one of its own kind is fine
        let previous = constraints.set(1, range(None, Some(10))).unwrap();
        assert_eq!(previous.kind(), ConstraintKind::Range(ScalarKind::Int));

        // but not with a kind held at another position
        let err = constraints.set(1, RequiredConstraint).unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateConstraintKind(_)));

        constraints.insert(0, EnumMemberConstraint::new(["a", "b"])).unwrap();
        assert_eq!(constraints.first().map(Constraint::kind), Some(ConstraintKind::EnumMember(ScalarKind::String)));
        assert!(matches!(
            constraints.insert(9, RequiredConstraint),
            Err(SchemaError::IndexOutOfBounds { index: 9, len: 3 })
        ));

        constraints.remove(0).unwrap();
        assert!(constraints.enum_member().is_none());
        assert!(constraints.is_required());
    }
}
