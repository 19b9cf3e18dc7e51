//! Dotted version triples for minimum-platform-version gates.
//!
//! Parses the 1-3 component forms build files actually contain ("2",
//! "2.361", "2.361.4"); omitted components default to zero, so `"1"` and
//! `"1.0.0"` compare equal.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Version parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionError {
    #[error("version string is empty")]
    Empty,

    #[error("version {0:?} has more than three components")]
    TooManyComponents(String),

    #[error("version {input:?} has a non-numeric component {component:?}")]
    InvalidComponent { input: String, component: String },
}

/// A `major.minor.micro` triple, totally ordered component-wise.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub micro: u32,
}

impl Version {
    pub fn new(major: u32, minor: u32, micro: u32) -> Self {
        Self {
            major,
            minor,
            micro,
        }
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(VersionError::Empty);
        }

        let parts: Vec<&str> = trimmed.split('.').collect();
        if parts.len() > 3 {
            return Err(VersionError::TooManyComponents(trimmed.to_string()));
        }

        // An empty component ("1..3") is the "minor omitted while micro
        // present" shape and fails the numeric parse below.
        let mut components = [0u32; 3];
        for (slot, part) in components.iter_mut().zip(&parts) {
            *slot = part
                .parse()
                .map_err(|_| VersionError::InvalidComponent {
                    input: trimmed.to_string(),
                    component: (*part).to_string(),
                })?;
        }

        Ok(Version::new(components[0], components[1], components[2]))
    }
}

impl TryFrom<String> for Version {
    type Error = VersionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Version> for String {
    fn from(version: Version) -> Self {
        version.to_string()
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.micro)
    }
}
