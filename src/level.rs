use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Seniority or skill tier used for rate lookup and headcount requirements
/// (e.g. `Junior`, `Senior`, `SR`).
///
/// Levels are free-form labels owned by rate-card administration, so they are
/// compared by exact string equality after trimming surrounding whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ResourceLevel(String);

impl ResourceLevel {
    pub fn new(label: impl Into<String>) -> Self {
        let label = label.into();
        let trimmed = label.trim();
        if trimmed.len() == label.len() {
            Self(label)
        } else {
            Self(trimmed.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ResourceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceLevel {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ResourceLevel {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl FromStr for ResourceLevel {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl<'de> Deserialize<'de> for ResourceLevel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(Self::new)
    }
}
