//! Per-property metadata cells.

use serde::{Deserialize, Serialize};

use crate::property::value::Value;
use crate::visibility::Visibility;

/// One metadata cell attached to a property, itself visibility-scoped.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataEntry {
    key: String,
    visibility: Visibility,
    value: Value,
}

impl MetadataEntry {
    /// The metadata key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The visibility scoping this cell.
    pub fn visibility(&self) -> &Visibility {
        &self.visibility
    }

    /// The cell value.
    pub fn value(&self) -> &Value {
        &self.value
    }
}

/// Insertion-ordered metadata entries, unique per (key, visibility).
///
/// Re-adding an existing (key, visibility) replaces that entry's value in
/// place.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    entries: Vec<MetadataEntry>,
}

impl Metadata {
    /// Creates an empty metadata set.
    pub fn new() -> Self {
        Metadata::default()
    }

    /// Adds or replaces the (key, visibility) cell.
    pub fn add(
        &mut self,
        key: impl Into<String>,
        visibility: Visibility,
        value: impl Into<Value>,
    ) -> &mut Self {
        let key = key.into();
        let value = value.into();
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|e| e.key == key && e.visibility == visibility)
        {
            entry.value = value;
        } else {
            self.entries.push(MetadataEntry {
                key,
                visibility,
                value,
            });
        }
        self
    }

    /// First entry for `key`, optionally restricted to an exact visibility.
    pub fn entry(&self, key: &str, visibility: Option<&Visibility>) -> Option<&MetadataEntry> {
        self.entries
            .iter()
            .find(|e| e.key == key && visibility.map_or(true, |v| &e.visibility == v))
    }

    /// First value for `key` regardless of visibility.
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.entry(key, None).map(MetadataEntry::value)
    }

    /// All entries in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = &MetadataEntry> {
        self.entries.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
