//! Mutation instructions, the pending-mutation logs, and the prepared
//! element mutation handed to storage backends.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::element::ElementKind;
use crate::error::Result;
use crate::property::Property;
use crate::util::increasing_time;
use crate::visibility::{User, Visibility};

/// Instruction to erase a property identity outright.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDeleteMutation {
    key: String,
    name: String,
    visibility: Visibility,
}

impl PropertyDeleteMutation {
    /// Creates a delete instruction for (key, name, visibility).
    pub fn new(
        key: impl Into<String>,
        name: impl Into<String>,
        visibility: Visibility,
    ) -> Self {
        PropertyDeleteMutation {
            key: key.into(),
            name: name.into(),
            visibility,
        }
    }

    /// The targeted property key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The targeted property name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The targeted property visibility.
    pub fn visibility(&self) -> &Visibility {
        &self.visibility
    }
}

impl Ord for PropertyDeleteMutation {
    // Natural ordering of pending mutations: key, then name, then
    // visibility string.
    fn cmp(&self, other: &Self) -> Ordering {
        self.key
            .cmp(&other.key)
            .then_with(|| self.name.cmp(&other.name))
            .then_with(|| self.visibility.cmp(&other.visibility))
    }
}

impl PartialOrd for PropertyDeleteMutation {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Tombstone: hides a property from reads while retaining the record for
/// durable propagation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertySoftDeleteMutation {
    key: String,
    name: String,
    visibility: Visibility,
    timestamp: i64,
}

impl PropertySoftDeleteMutation {
    /// Creates a soft-delete tombstone for (key, name, visibility) at the
    /// given timestamp.
    pub fn new(
        key: impl Into<String>,
        name: impl Into<String>,
        visibility: Visibility,
        timestamp: i64,
    ) -> Self {
        PropertySoftDeleteMutation {
            key: key.into(),
            name: name.into(),
            visibility,
            timestamp,
        }
    }

    /// The targeted property key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The targeted property name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The targeted property visibility.
    pub fn visibility(&self) -> &Visibility {
        &self.visibility
    }

    /// When the soft delete took effect, in epoch milliseconds.
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }
}

impl Ord for PropertySoftDeleteMutation {
    // Key, then name, then visibility string; the timestamp tie-break keeps
    // distinct tombstones for the same identity in the ordered log.
    fn cmp(&self, other: &Self) -> Ordering {
        self.key
            .cmp(&other.key)
            .then_with(|| self.name.cmp(&other.name))
            .then_with(|| self.visibility.cmp(&other.visibility))
            .then_with(|| self.timestamp.cmp(&other.timestamp))
    }
}

impl PartialOrd for PropertySoftDeleteMutation {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Element-level access-label toggle, orthogonal to any single property's
/// visibility.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AdditionalVisibilityMutation {
    /// Grants the label.
    Add(String),
    /// Revokes the label.
    Remove(String),
}

impl AdditionalVisibilityMutation {
    /// The label being toggled.
    pub fn label(&self) -> &str {
        match self {
            AdditionalVisibilityMutation::Add(label)
            | AdditionalVisibilityMutation::Remove(label) => label,
        }
    }
}

/// Concurrency-safe ordered log of pending mutations.
///
/// Appends may race with snapshot reads from a concurrent durability path;
/// no external locking is required. Iteration order is the mutation's
/// natural ordering, and the set semantics deduplicate identical records.
#[derive(Debug)]
pub struct MutationLog<T> {
    inner: Mutex<BTreeSet<T>>,
}

impl<T: Ord + Clone> MutationLog<T> {
    /// Creates an empty log.
    pub fn new() -> Self {
        MutationLog {
            inner: Mutex::new(BTreeSet::new()),
        }
    }

    /// Records a mutation. Returns false if an identical record was already
    /// present.
    pub fn insert(&self, mutation: T) -> bool {
        self.inner.lock().insert(mutation)
    }

    /// An ordered copy of the log at this instant.
    pub fn snapshot(&self) -> Vec<T> {
        self.inner.lock().iter().cloned().collect()
    }

    /// Number of recorded mutations.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// True if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

impl<T> Default for MutationLog<T> {
    fn default() -> Self {
        MutationLog {
            inner: Mutex::new(BTreeSet::new()),
        }
    }
}

/// A prepared, not-yet-durable change set for one element.
///
/// The vertex/edge save path is fixed by the kind tag at preparation time;
/// [`ElementMutation::save`] resolves it with a single match, then the
/// caller locally reflects the same mutation through
/// [`crate::element::Element::apply_mutation`]. There is no automatic
/// reconciliation if the durable commit fails after local reflection, so
/// persist first.
#[derive(Clone, Debug)]
pub struct ElementMutation {
    element_id: String,
    kind: ElementKind,
    element_visibility: Visibility,
    existing: bool,
    timestamp: Option<i64>,
    add_properties: Vec<Property>,
    property_deletes: Vec<PropertyDeleteMutation>,
    property_soft_deletes: Vec<PropertySoftDeleteMutation>,
    additional_visibilities: Vec<AdditionalVisibilityMutation>,
    alter_visibility: Option<Visibility>,
}

impl ElementMutation {
    /// Starts a mutation creating a new vertex.
    pub fn new_vertex(id: impl Into<String>, visibility: Visibility) -> Self {
        ElementMutation::empty(id.into(), ElementKind::Vertex, visibility, false)
    }

    /// Starts a mutation creating a new edge.
    pub fn new_edge(
        id: impl Into<String>,
        label: impl Into<String>,
        out_vertex_id: impl Into<String>,
        in_vertex_id: impl Into<String>,
        visibility: Visibility,
    ) -> Self {
        ElementMutation::empty(
            id.into(),
            ElementKind::edge(label, out_vertex_id, in_vertex_id),
            visibility,
            false,
        )
    }

    pub(crate) fn existing(id: String, kind: ElementKind, visibility: Visibility) -> Self {
        ElementMutation::empty(id, kind, visibility, true)
    }

    fn empty(element_id: String, kind: ElementKind, visibility: Visibility, existing: bool) -> Self {
        ElementMutation {
            element_id,
            kind,
            element_visibility: visibility,
            existing,
            timestamp: None,
            add_properties: Vec::new(),
            property_deletes: Vec::new(),
            property_soft_deletes: Vec::new(),
            additional_visibilities: Vec::new(),
            alter_visibility: None,
        }
    }

    /// Adds (or, against an updatable cell, updates) a property.
    pub fn add_property(mut self, property: Property) -> Self {
        self.add_properties.push(property);
        self
    }

    /// Erases a property identity outright.
    pub fn delete_property(
        mut self,
        key: impl Into<String>,
        name: impl Into<String>,
        visibility: Visibility,
    ) -> Self {
        self.property_deletes
            .push(PropertyDeleteMutation::new(key, name, visibility));
        self
    }

    /// Soft-deletes a property, leaving a tombstone.
    pub fn soft_delete_property(
        mut self,
        key: impl Into<String>,
        name: impl Into<String>,
        visibility: Visibility,
        timestamp: i64,
    ) -> Self {
        self.property_soft_deletes.push(PropertySoftDeleteMutation::new(
            key, name, visibility, timestamp,
        ));
        self
    }

    /// Grants an element-level additional visibility label.
    pub fn add_additional_visibility(mut self, label: impl Into<String>) -> Self {
        self.additional_visibilities
            .push(AdditionalVisibilityMutation::Add(label.into()));
        self
    }

    /// Revokes an element-level additional visibility label.
    pub fn delete_additional_visibility(mut self, label: impl Into<String>) -> Self {
        self.additional_visibilities
            .push(AdditionalVisibilityMutation::Remove(label.into()));
        self
    }

    /// Changes the element's own visibility.
    pub fn alter_element_visibility(mut self, visibility: Visibility) -> Self {
        self.alter_visibility = Some(visibility);
        self
    }

    /// Pins the save timestamp instead of drawing one at save time.
    pub fn timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// The targeted element id.
    pub fn element_id(&self) -> &str {
        &self.element_id
    }

    /// The element kind tag fixed at preparation time.
    pub fn kind(&self) -> &ElementKind {
        &self.kind
    }

    /// The element visibility at preparation time.
    pub fn element_visibility(&self) -> &Visibility {
        &self.element_visibility
    }

    /// True if this mutation targets an already-persisted element.
    pub fn is_existing(&self) -> bool {
        self.existing
    }

    /// Properties to add or update.
    pub fn add_properties(&self) -> &[Property] {
        &self.add_properties
    }

    /// Property delete instructions.
    pub fn property_deletes(&self) -> &[PropertyDeleteMutation] {
        &self.property_deletes
    }

    /// Property soft-delete tombstones.
    pub fn property_soft_deletes(&self) -> &[PropertySoftDeleteMutation] {
        &self.property_soft_deletes
    }

    /// Additional-visibility toggles, in the order they were requested.
    pub fn additional_visibilities(&self) -> &[AdditionalVisibilityMutation] {
        &self.additional_visibilities
    }

    /// The new element visibility, if one was requested.
    pub fn alter_visibility(&self) -> Option<&Visibility> {
        self.alter_visibility.as_ref()
    }

    /// Durably commits this mutation through the backend, exactly once.
    ///
    /// New elements dispatch on the kind tag to the vertex or edge save
    /// path; existing elements go through the existing-element path. The
    /// caller then reflects the mutation locally via
    /// [`crate::element::Element::apply_mutation`].
    pub fn save(&self, builder: &dyn ElementMutationBuilder, user: &User) -> Result<()> {
        if self.existing {
            return builder.save_existing_element_mutation(self, user);
        }
        let timestamp = self
            .timestamp
            .unwrap_or_else(increasing_time::next_millis);
        match self.kind {
            ElementKind::Vertex => builder.save_vertex_mutation(self, timestamp, user),
            ElementKind::Edge(_) => builder.save_edge_mutation(self, timestamp, user),
        }
    }
}

/// Durable-commit hook implemented by storage backends.
///
/// The core calls exactly one of these per save operation and never
/// retries; durability, retry, and cancellation policy belong to the
/// backend and its callers.
pub trait ElementMutationBuilder {
    /// Durably commits a new-vertex mutation.
    fn save_vertex_mutation(
        &self,
        mutation: &ElementMutation,
        timestamp: i64,
        user: &User,
    ) -> Result<()>;

    /// Durably commits a new-edge mutation.
    fn save_edge_mutation(
        &self,
        mutation: &ElementMutation,
        timestamp: i64,
        user: &User,
    ) -> Result<()>;

    /// Durably commits a mutation against an already-persisted element.
    fn save_existing_element_mutation(
        &self,
        mutation: &ElementMutation,
        user: &User,
    ) -> Result<()>;
}
