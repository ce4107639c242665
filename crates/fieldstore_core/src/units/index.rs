//! Permanent indices for catalog entries.
//!
//! Indices are stored in databases and settings files. Values listed here are
//! a compatibility contract: append new constants, never renumber.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Permanent position of a dimension inside a [`super::UnitCatalog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DimensionIndex(pub u32);

impl DimensionIndex {
    pub const NONE: Self = Self(0);
    pub const CURRENCY: Self = Self(1);
    pub const PERCENT: Self = Self(2);
    pub const UNITLESS: Self = Self(3);

    pub fn value(self) -> u32 {
        self.0
    }
}

/// Permanent position of a unit inside a [`super::UnitCatalog`].
///
/// Unlike a unit's enum value, a `UnitIndex` is unique across all dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitIndex(pub u32);

impl UnitIndex {
    pub const NONE: Self = Self(0);
    pub const DOLLARS: Self = Self(1);
    pub const PERCENT_PERCENT: Self = Self(2);
    pub const UNITLESS_PERCENT: Self = Self(3);
    pub const UNITLESS_UNIT: Self = Self(4);

    pub fn value(self) -> u32 {
        self.0
    }
}

/// Permanent position of a unit system inside a [`super::UnitCatalog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitSystemIndex(pub u32);

impl UnitSystemIndex {
    pub const NONE: Self = Self(0);
    pub const SI: Self = Self(1);
    pub const US_CUSTOMARY: Self = Self(2);
    pub const BOTH: Self = Self(3);

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Display for DimensionIndex {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Display for UnitIndex {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Display for UnitSystemIndex {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::{DimensionIndex, UnitIndex, UnitSystemIndex};

    #[test]
    fn indices_serialize_as_bare_integers() {
        assert_eq!(serde_json::to_string(&UnitIndex::DOLLARS).unwrap(), "1");
        assert_eq!(
            serde_json::to_string(&DimensionIndex::UNITLESS).unwrap(),
            "3"
        );
        let decoded: UnitSystemIndex = serde_json::from_str("2").unwrap();
        assert_eq!(decoded, UnitSystemIndex::US_CUSTOMARY);
    }

    #[test]
    fn standard_index_values_are_pinned() {
        // Persisted databases depend on these exact numbers.
        assert_eq!(DimensionIndex::NONE.value(), 0);
        assert_eq!(DimensionIndex::CURRENCY.value(), 1);
        assert_eq!(DimensionIndex::PERCENT.value(), 2);
        assert_eq!(DimensionIndex::UNITLESS.value(), 3);
        assert_eq!(UnitIndex::NONE.value(), 0);
        assert_eq!(UnitIndex::DOLLARS.value(), 1);
        assert_eq!(UnitIndex::PERCENT_PERCENT.value(), 2);
        assert_eq!(UnitIndex::UNITLESS_PERCENT.value(), 3);
        assert_eq!(UnitIndex::UNITLESS_UNIT.value(), 4);
        assert_eq!(UnitSystemIndex::BOTH.value(), 3);
    }
}
