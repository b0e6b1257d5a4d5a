//! Schema versioning utilities

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SchemaError};

/// Version of an event schema or of one of its properties.
///
/// Written as `major.minor[.build[.revision]]`. Components that were not
/// given are kept absent, so `"1.0"` prints back as `"1.0"` and sorts
/// before `"1.0.0"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SchemaVersion {
    major: u32,
    minor: u32,
    build: Option<u32>,
    revision: Option<u32>,
}

impl SchemaVersion {
    /// Create a two-component version (e.g. `1.0`)
    pub fn new(major: u32, minor: u32) -> Self {
        Self {
            major,
            minor,
            build: None,
            revision: None,
        }
    }

    /// Create a three-component version (e.g. `1.0.3`)
    pub fn with_build(major: u32, minor: u32, build: u32) -> Self {
        Self {
            build: Some(build),
            ..Self::new(major, minor)
        }
    }

    /// Create a four-component version (e.g. `1.0.3.7`)
    pub fn with_revision(major: u32, minor: u32, build: u32, revision: u32) -> Self {
        Self {
            revision: Some(revision),
            ..Self::with_build(major, minor, build)
        }
    }

    /// Parse from a version string
    pub fn parse(version_str: &str) -> Result<Self> {
        let invalid = || SchemaError::InvalidVersionFormat(version_str.to_string());

        // Strip leading 'v' if present
        let trimmed = version_str.trim();
        let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);

        let parts: Vec<&str> = trimmed.split('.').collect();
        if !(2..=4).contains(&parts.len()) {
            return Err(invalid());
        }

        let mut components = Vec::with_capacity(parts.len());
        for part in parts {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            components.push(part.parse::<u32>().map_err(|_| invalid())?);
        }

        Ok(Self {
            major: components[0],
            minor: components[1],
            build: components.get(2).copied(),
            revision: components.get(3).copied(),
        })
    }

    /// Check whether a string parses as a version
    pub fn is_version(version_str: &str) -> bool {
        Self::parse(version_str).is_ok()
    }

    pub fn major(&self) -> u32 {
        self.major
    }

    pub fn minor(&self) -> u32 {
        self.minor
    }

    pub fn build(&self) -> Option<u32> {
        self.build
    }

    pub fn revision(&self) -> Option<u32> {
        self.revision
    }

    /// Convert to a semver version. A missing build becomes the patch `0`;
    /// the revision has no semver counterpart and is dropped.
    pub fn to_semver(&self) -> semver::Version {
        semver::Version::new(
            u64::from(self.major),
            u64::from(self.minor),
            u64::from(self.build.unwrap_or(0)),
        )
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)?;
        if let Some(build) = self.build {
            write!(f, ".{}", build)?;
            if let Some(revision) = self.revision {
                write!(f, ".{}", revision)?;
            }
        }
        Ok(())
    }
}

impl FromStr for SchemaVersion {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<&semver::Version> for SchemaVersion {
    fn from(version: &semver::Version) -> Self {
        Self::with_build(
            u32::try_from(version.major).unwrap_or(u32::MAX),
            u32::try_from(version.minor).unwrap_or(u32::MAX),
            u32::try_from(version.patch).unwrap_or(u32::MAX),
        )
    }
}

impl PartialOrd for SchemaVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SchemaVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        // `None < Some(_)`: an absent component sorts first
        (self.major, self.minor, self.build, self.revision).cmp(&(
            other.major,
            other.minor,
            other.build,
            other.revision,
        ))
    }
}

impl Serialize for SchemaVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SchemaVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
