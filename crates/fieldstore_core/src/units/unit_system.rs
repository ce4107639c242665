//! Unit system labels (none / SI / US customary / both).

use super::index::UnitSystemIndex;
use crate::text::LabelLookup;

/// Named convention grouping units. Carries identity only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitSystem {
    index: UnitSystemIndex,
    name: String,
}

impl UnitSystem {
    pub(crate) fn new(index: UnitSystemIndex, name: impl Into<String>) -> Self {
        Self {
            index,
            name: name.into(),
        }
    }

    pub fn index(&self) -> UnitSystemIndex {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label(&self, labels: &dyn LabelLookup) -> String {
        labels.label(&self.name)
    }

    pub fn short_label(&self, labels: &dyn LabelLookup) -> String {
        labels.short_label(&self.name)
    }

    pub fn to_serialized_string(&self) -> String {
        self.name.clone()
    }
}
