//! Stable identifiers for entities and world partitions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of an entity for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A world partition (dimension). Always stored in canonical form: any
/// `namespace:` prefix is stripped, so `minecraft:overworld` and `overworld`
/// name the same partition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct DimensionId(String);

impl DimensionId {
    pub fn new(raw: &str) -> Self {
        let canonical = match raw.rsplit_once(':') {
            Some((_, name)) => name,
            None => raw,
        };
        Self(canonical.trim().to_ascii_lowercase())
    }

    pub fn overworld() -> Self {
        Self::new("overworld")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for DimensionId {
    fn from(raw: String) -> Self {
        Self::new(&raw)
    }
}

impl From<&str> for DimensionId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<DimensionId> for String {
    fn from(id: DimensionId) -> Self {
        id.0
    }
}

impl fmt::Display for DimensionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimension_strips_namespace() {
        assert_eq!(DimensionId::new("minecraft:the_nether"), DimensionId::new("the_nether"));
        assert_eq!(DimensionId::new("Overworld").as_str(), "overworld");
    }

    #[test]
    fn entity_id_display() {
        assert_eq!(EntityId(42).to_string(), "#42");
    }
}
