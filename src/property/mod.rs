//! The property cell: a versioned value identified by (key, name, visibility).

pub mod collection;
pub mod metadata;
pub mod value;

pub use collection::PropertyCollection;
pub use metadata::{Metadata, MetadataEntry};
pub use value::Value;

use serde::{Deserialize, Serialize};

use crate::error::{GraphError, Result};
use crate::visibility::Visibility;

/// Key used when a caller adds a property value without naming one.
pub const DEFAULT_KEY: &str = "default";

/// Reserved property name resolving to the element id.
pub const ID_PROPERTY_NAME: &str = "__id";
/// Reserved property name resolving to the element type.
pub const ELEMENT_TYPE_PROPERTY_NAME: &str = "__elementType";
/// Reserved property name resolving to an edge's label.
pub const EDGE_LABEL_PROPERTY_NAME: &str = "__edgeLabel";
/// Reserved property name resolving to an edge's out vertex id.
pub const OUT_VERTEX_ID_PROPERTY_NAME: &str = "__outVertexId";
/// Reserved property name resolving to an edge's in vertex id.
pub const IN_VERTEX_ID_PROPERTY_NAME: &str = "__inVertexId";

/// True for reserved names resolved from element identity rather than
/// stored cells. These are always readable, independent of fetch hints.
pub fn is_internal_property_name(name: &str) -> bool {
    matches!(
        name,
        ID_PROPERTY_NAME
            | ELEMENT_TYPE_PROPERTY_NAME
            | EDGE_LABEL_PROPERTY_NAME
            | OUT_VERTEX_ID_PROPERTY_NAME
            | IN_VERTEX_ID_PROPERTY_NAME
    )
}

/// A single versioned value cell on an element.
///
/// Identity is the (key, name, visibility) triple and never changes. A
/// property is immutable by default; one constructed with
/// [`Property::updatable`] may have its value, timestamp, and metadata
/// replaced in place through [`Property::update_from`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    key: String,
    name: String,
    visibility: Visibility,
    value: Value,
    timestamp: i64,
    metadata: Metadata,
    mutable: bool,
}

impl Property {
    /// Creates an immutable property. The key is mandatory; an empty key is
    /// an [`GraphError::InvalidMutation`] error.
    pub fn new(
        key: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<Value>,
        visibility: Visibility,
        timestamp: i64,
    ) -> Result<Self> {
        let key = key.into();
        if key.is_empty() {
            return Err(GraphError::InvalidMutation(
                "key is required for property".to_owned(),
            ));
        }
        Ok(Property {
            key,
            name: name.into(),
            visibility,
            value: value.into(),
            timestamp,
            metadata: Metadata::new(),
            mutable: false,
        })
    }

    /// Marks this property as updatable in place.
    pub fn updatable(mut self) -> Self {
        self.mutable = true;
        self
    }

    /// Attaches metadata, replacing any present.
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// The property key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The property name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The visibility gating this cell.
    pub fn visibility(&self) -> &Visibility {
        &self.visibility
    }

    /// The current value.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// The version timestamp, in epoch milliseconds.
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// The metadata attached to this cell.
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// True if this property may be updated in place.
    pub fn is_mutable(&self) -> bool {
        self.mutable
    }

    /// True if `other` has the same (key, name, visibility) identity.
    pub fn same_identity(&self, other: &Property) -> bool {
        self.key == other.key && self.name == other.name && self.visibility == other.visibility
    }

    /// Replaces value, timestamp, and metadata from `other`, preserving
    /// identity.
    ///
    /// Fails with [`GraphError::InvalidMutation`] if this property is not
    /// updatable or if `other` carries a different identity; the new value
    /// is never silently dropped or coerced.
    pub fn update_from(&mut self, other: Property) -> Result<()> {
        if !self.mutable {
            return Err(GraphError::InvalidMutation(format!(
                "could not update non-updatable property {}:{}[{}]",
                self.key, self.name, self.visibility
            )));
        }
        if !self.same_identity(&other) {
            return Err(GraphError::InvalidMutation(format!(
                "update would change property identity {}:{}[{}]",
                self.key, self.name, self.visibility
            )));
        }
        self.value = other.value;
        self.timestamp = other.timestamp;
        self.metadata = other.metadata;
        Ok(())
    }
}
