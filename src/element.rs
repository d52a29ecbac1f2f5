//! The element core shared by vertices and edges.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GraphError, Result};
use crate::fetch_hints::FetchHints;
use crate::graph::{ElementId, EventIter, Graph, HistoricalEventId, RowIter};
use crate::mutation::{
    AdditionalVisibilityMutation, ElementMutation, MutationLog, PropertyDeleteMutation,
    PropertySoftDeleteMutation,
};
use crate::object::{GraphObject, PropertyIter};
use crate::property::{
    self, Property, PropertyCollection, Value, DEFAULT_KEY, EDGE_LABEL_PROPERTY_NAME,
    ELEMENT_TYPE_PROPERTY_NAME, ID_PROPERTY_NAME, IN_VERTEX_ID_PROPERTY_NAME,
    OUT_VERTEX_ID_PROPERTY_NAME,
};
use crate::visibility::{Authorizations, User, Visibility};

/// Element type tag, used to key collaborator calls.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ElementType {
    /// A vertex.
    Vertex,
    /// An edge.
    Edge,
}

impl ElementType {
    /// Lowercase name of the type.
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementType::Vertex => "vertex",
            ElementType::Edge => "edge",
        }
    }
}

/// Edge label and endpoint ids, fixed at construction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeInfo {
    /// The edge label.
    pub label: String,
    /// Id of the vertex the edge leaves.
    pub out_vertex_id: String,
    /// Id of the vertex the edge enters.
    pub in_vertex_id: String,
}

/// Vertex/edge discriminator carrying the edge-only identity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElementKind {
    /// A vertex.
    Vertex,
    /// An edge with its label and endpoints.
    Edge(EdgeInfo),
}

impl ElementKind {
    /// Builds the edge variant.
    pub fn edge(
        label: impl Into<String>,
        out_vertex_id: impl Into<String>,
        in_vertex_id: impl Into<String>,
    ) -> Self {
        ElementKind::Edge(EdgeInfo {
            label: label.into(),
            out_vertex_id: out_vertex_id.into(),
            in_vertex_id: in_vertex_id.into(),
        })
    }

    /// The corresponding type tag.
    pub fn element_type(&self) -> ElementType {
        match self {
            ElementKind::Vertex => ElementType::Vertex,
            ElementKind::Edge(_) => ElementType::Edge,
        }
    }
}

/// Edge endpoint selector.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// The vertex the edge leaves.
    Out,
    /// The vertex the edge enters.
    In,
    /// Both endpoints; valid for traversal filters, never for selecting a
    /// single vertex.
    Both,
}

/// Construction-time inputs for an element, produced by a backend's row
/// decoding (or empty, for a not-yet-saved element).
///
/// The delete and soft-delete mutations are replayed before the properties
/// are merged in, and are recorded in the element's pending logs whether or
/// not they matched anything.
#[derive(Clone, Debug)]
pub struct ElementInit {
    /// Element id.
    pub id: String,
    /// Vertex or edge identity.
    pub kind: ElementKind,
    /// The element's own visibility.
    pub visibility: Visibility,
    /// Creation or last-touch timestamp, in epoch milliseconds.
    pub timestamp: i64,
    /// Capabilities granted to this loaded instance.
    pub fetch_hints: FetchHints,
    /// Current properties, in storage order.
    pub properties: Vec<Property>,
    /// Pending hard deletes.
    pub property_delete_mutations: Vec<PropertyDeleteMutation>,
    /// Pending soft deletes.
    pub property_soft_delete_mutations: Vec<PropertySoftDeleteMutation>,
    /// Visibilities under which the whole element is hidden.
    pub hidden_visibilities: Vec<Visibility>,
    /// Element-level additional visibility labels.
    pub additional_visibilities: Vec<String>,
    /// Names of this element's extended-data tables.
    pub extended_data_table_names: Vec<String>,
    /// The caller context the element was loaded for.
    pub user: User,
}

impl ElementInit {
    /// Minimal inputs for a vertex.
    pub fn vertex(
        id: impl Into<String>,
        visibility: Visibility,
        timestamp: i64,
        fetch_hints: FetchHints,
        user: User,
    ) -> Self {
        ElementInit::bare(id.into(), ElementKind::Vertex, visibility, timestamp, fetch_hints, user)
    }

    /// Minimal inputs for an edge.
    pub fn edge(
        id: impl Into<String>,
        label: impl Into<String>,
        out_vertex_id: impl Into<String>,
        in_vertex_id: impl Into<String>,
        visibility: Visibility,
        timestamp: i64,
        fetch_hints: FetchHints,
        user: User,
    ) -> Self {
        ElementInit::bare(
            id.into(),
            ElementKind::edge(label, out_vertex_id, in_vertex_id),
            visibility,
            timestamp,
            fetch_hints,
            user,
        )
    }

    fn bare(
        id: String,
        kind: ElementKind,
        visibility: Visibility,
        timestamp: i64,
        fetch_hints: FetchHints,
        user: User,
    ) -> Self {
        ElementInit {
            id,
            kind,
            visibility,
            timestamp,
            fetch_hints,
            properties: Vec::new(),
            property_delete_mutations: Vec::new(),
            property_soft_delete_mutations: Vec::new(),
            hidden_visibilities: Vec::new(),
            additional_visibilities: Vec::new(),
            extended_data_table_names: Vec::new(),
            user,
        }
    }
}

/// A loaded vertex or edge: the in-memory, visibility-gated property set
/// plus the pending mutation logs.
///
/// Elements may be read from many threads, but the internal add/remove
/// primitives require external serialization (one save per element at a
/// time); only the pending logs tolerate unlocked concurrent appends.
#[derive(Debug)]
pub struct Element {
    id: String,
    kind: ElementKind,
    visibility: Visibility,
    timestamp: i64,
    fetch_hints: FetchHints,
    hidden_visibilities: BTreeSet<Visibility>,
    additional_visibilities: BTreeSet<String>,
    extended_data_table_names: BTreeSet<String>,
    properties: PropertyCollection,
    internal_properties: Vec<Property>,
    property_delete_mutations: MutationLog<PropertyDeleteMutation>,
    property_soft_delete_mutations: MutationLog<PropertySoftDeleteMutation>,
    user: User,
}

impl Element {
    /// Builds an element by replaying the init's mutations into an empty
    /// property collection: deletes first, then soft deletes, then the
    /// surviving properties.
    pub fn from_parts(init: ElementInit) -> Result<Self> {
        let internal_properties =
            internal_properties(&init.id, &init.kind, &init.visibility, init.timestamp)?;
        let mut element = Element {
            id: init.id,
            kind: init.kind,
            visibility: init.visibility,
            timestamp: init.timestamp,
            fetch_hints: init.fetch_hints,
            hidden_visibilities: init.hidden_visibilities.into_iter().collect(),
            additional_visibilities: init.additional_visibilities.into_iter().collect(),
            extended_data_table_names: init.extended_data_table_names.into_iter().collect(),
            properties: PropertyCollection::new(),
            internal_properties,
            property_delete_mutations: MutationLog::new(),
            property_soft_delete_mutations: MutationLog::new(),
            user: init.user,
        };
        element.update_properties_internal(
            init.properties,
            init.property_delete_mutations,
            init.property_soft_delete_mutations,
        )?;
        Ok(element)
    }

    /// Element id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Vertex or edge identity.
    pub fn kind(&self) -> &ElementKind {
        &self.kind
    }

    /// The element type tag.
    pub fn element_type(&self) -> ElementType {
        self.kind.element_type()
    }

    /// The element's own visibility.
    pub fn visibility(&self) -> &Visibility {
        &self.visibility
    }

    /// Replaces the element's own visibility. Unlike property visibility,
    /// this is mutable post-construction.
    pub fn set_visibility(&mut self, visibility: Visibility) {
        self.visibility = visibility;
    }

    /// Creation or last-touch timestamp, in epoch milliseconds.
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// The caller context this element was loaded for.
    pub fn user(&self) -> &User {
        &self.user
    }

    /// Visibilities under which the whole element is hidden.
    pub fn hidden_visibilities(&self) -> impl Iterator<Item = &Visibility> {
        self.hidden_visibilities.iter()
    }

    /// True if any hidden visibility matches one of the supplied tokens.
    pub fn is_hidden(&self, authorizations: &Authorizations) -> bool {
        self.hidden_visibilities
            .iter()
            .any(|visibility| authorizations.can_read(visibility))
    }

    /// Element-level additional visibility labels.
    pub fn additional_visibilities(&self) -> &BTreeSet<String> {
        &self.additional_visibilities
    }

    /// Names of this element's extended-data tables. Gated by the
    /// extended-data fetch hint.
    pub fn extended_data_table_names(&self) -> Result<&BTreeSet<String>> {
        if !self.fetch_hints.is_include_extended_data_table_names() {
            return Err(self.fetch_hints.missing("includeExtendedDataTableNames"));
        }
        Ok(&self.extended_data_table_names)
    }

    /// An edge's label. Calling this on a vertex is an error.
    pub fn label(&self) -> Result<&str> {
        match &self.kind {
            ElementKind::Edge(info) => Ok(&info.label),
            ElementKind::Vertex => Err(GraphError::InvalidArgument(
                "label requested on a vertex",
            )),
        }
    }

    /// The id of the edge endpoint in the given direction. `Both` does not
    /// select a single vertex and is an [`GraphError::UnknownDirection`]
    /// error; calling this on a vertex is an error.
    pub fn vertex_id(&self, direction: Direction) -> Result<&str> {
        let info = match &self.kind {
            ElementKind::Edge(info) => info,
            ElementKind::Vertex => {
                return Err(GraphError::InvalidArgument(
                    "vertex id requested on a vertex",
                ))
            }
        };
        match direction {
            Direction::Out => Ok(&info.out_vertex_id),
            Direction::In => Ok(&info.in_vertex_id),
            Direction::Both => Err(GraphError::UnknownDirection(direction)),
        }
    }

    /// Given one endpoint id of this edge, the opposite endpoint id.
    pub fn other_vertex_id(&self, vertex_id: &str) -> Result<&str> {
        let info = match &self.kind {
            ElementKind::Edge(info) => info,
            ElementKind::Vertex => {
                return Err(GraphError::InvalidArgument(
                    "vertex id requested on a vertex",
                ))
            }
        };
        if info.out_vertex_id == vertex_id {
            Ok(&info.in_vertex_id)
        } else if info.in_vertex_id == vertex_id {
            Ok(&info.out_vertex_id)
        } else {
            Err(GraphError::InvalidArgument(
                "vertex is not an endpoint of this edge",
            ))
        }
    }

    /// Ordered snapshot of the pending hard-delete log.
    pub fn property_delete_mutations(&self) -> Vec<PropertyDeleteMutation> {
        self.property_delete_mutations.snapshot()
    }

    /// Ordered snapshot of the pending soft-delete log.
    pub fn property_soft_delete_mutations(&self) -> Vec<PropertySoftDeleteMutation> {
        self.property_soft_delete_mutations.snapshot()
    }

    /// A metadata value of one property, gated by the property and metadata
    /// fetch-hint policies.
    pub fn property_metadata(
        &self,
        key: &str,
        name: &str,
        visibility: &Visibility,
        metadata_key: &str,
    ) -> Result<Option<&Value>> {
        self.fetch_hints.assert_property_included(name)?;
        self.fetch_hints.assert_metadata_key_included(metadata_key)?;
        Ok(self
            .properties
            .get(key, name, visibility)
            .and_then(|property| property.metadata().value(metadata_key)))
    }

    /// Starts a mutation against this already-loaded element, pre-tagged
    /// with its kind so the save path is fixed now rather than at save
    /// time.
    pub fn prepare_mutation(&self) -> ElementMutation {
        ElementMutation::existing(self.id.clone(), self.kind.clone(), self.visibility.clone())
    }

    /// Locally reflects a mutation that the backend has already durably
    /// committed. Deletes and soft deletes resolve against the state as it
    /// stood before the mutation's adds are merged in.
    pub fn apply_mutation(&mut self, mutation: &ElementMutation) -> Result<()> {
        if mutation.element_id() != self.id {
            return Err(GraphError::InvalidMutation(format!(
                "mutation for element {} applied to element {}",
                mutation.element_id(),
                self.id
            )));
        }
        debug!(
            id = %self.id,
            adds = mutation.add_properties().len(),
            deletes = mutation.property_deletes().len(),
            soft_deletes = mutation.property_soft_deletes().len(),
            "element.mutation.apply"
        );
        if let Some(visibility) = mutation.alter_visibility() {
            self.visibility = visibility.clone();
        }
        for toggle in mutation.additional_visibilities() {
            match toggle {
                AdditionalVisibilityMutation::Add(label) => {
                    self.additional_visibilities.insert(label.clone());
                }
                AdditionalVisibilityMutation::Remove(label) => {
                    self.additional_visibilities.remove(label);
                }
            }
        }
        self.update_properties_internal(
            mutation.add_properties().to_vec(),
            mutation.property_deletes().to_vec(),
            mutation.property_soft_deletes().to_vec(),
        )
    }

    /// Updates only the in-memory representation of the properties, in the
    /// fixed order: hard deletes, then soft deletes, then adds. Every
    /// delete and soft delete is recorded in its pending log whether or not
    /// it matched a live property.
    pub fn update_properties_internal(
        &mut self,
        properties: Vec<Property>,
        property_delete_mutations: Vec<PropertyDeleteMutation>,
        property_soft_delete_mutations: Vec<PropertySoftDeleteMutation>,
    ) -> Result<()> {
        for delete in property_delete_mutations {
            let _ = self.remove_property_internal(delete.key(), delete.name(), delete.visibility());
            self.property_delete_mutations.insert(delete);
        }
        for soft_delete in property_soft_delete_mutations {
            let _ = self.remove_property_internal(
                soft_delete.key(),
                soft_delete.name(),
                soft_delete.visibility(),
            );
            self.property_soft_delete_mutations.insert(soft_delete);
        }
        for property in properties {
            self.add_property_internal(property)?;
        }
        Ok(())
    }

    /// Inserts a property, or updates an existing cell of the same
    /// (key, name, visibility) in place. The existing cell must be
    /// updatable; a non-updatable cell is an
    /// [`GraphError::InvalidMutation`] error, never a silent drop.
    pub fn add_property_internal(&mut self, property: Property) -> Result<()> {
        if property.key().is_empty() {
            return Err(GraphError::InvalidMutation(
                "key is required for property".to_owned(),
            ));
        }
        match self
            .properties
            .get_mut(property.key(), property.name(), property.visibility())
        {
            Some(existing) => existing.update_from(property),
            None => self.properties.add(property),
        }
    }

    /// Removes the property with this identity from the read-facing
    /// collection, if present.
    pub fn remove_property_internal(
        &mut self,
        key: &str,
        name: &str,
        visibility: &Visibility,
    ) -> Option<Property> {
        self.properties.remove(key, name, visibility)
    }

    /// Grants an additional visibility label after the backend committed it.
    pub fn add_additional_visibility_internal(&mut self, label: impl Into<String>) {
        self.additional_visibilities.insert(label.into());
    }

    /// Revokes an additional visibility label after the backend committed
    /// it.
    pub fn remove_additional_visibility_internal(&mut self, label: &str) {
        self.additional_visibilities.remove(label);
    }

    /// This element's historical events, as projected by the graph
    /// collaborator.
    pub fn historical_events<'a>(
        &self,
        graph: &'a dyn Graph,
        after: Option<&HistoricalEventId>,
        fetch_hints: &FetchHints,
        user: &User,
    ) -> EventIter<'a> {
        let element_ref = ElementId::new(self.element_type(), self.id.clone());
        graph.historical_events(&[element_ref], after, fetch_hints, user)
    }

    /// Rows of one of this element's extended-data tables, as projected by
    /// the graph collaborator.
    pub fn extended_data<'a>(
        &self,
        graph: &'a dyn Graph,
        table_name: &str,
        fetch_hints: &FetchHints,
    ) -> RowIter<'a> {
        graph.extended_data(
            self.element_type(),
            &self.id,
            table_name,
            fetch_hints,
            &self.user,
        )
    }

    fn internal_property(&self, name: &str) -> Option<&Property> {
        self.internal_properties
            .iter()
            .find(|property| property.name() == name)
    }
}

impl GraphObject for Element {
    fn id(&self) -> &str {
        &self.id
    }

    fn fetch_hints(&self) -> &FetchHints {
        &self.fetch_hints
    }

    fn properties(&self) -> Result<PropertyIter<'_>> {
        if !self.fetch_hints.is_include_properties() {
            return Err(self.fetch_hints.missing("includeProperties"));
        }
        Ok(Box::new(self.properties.iter()))
    }

    // Reserved names resolve from the dedicated internal cells and bypass
    // the fetch-hint gate; everything else asserts the per-name policy and
    // reads the value-ordered view.
    fn property_value_at<'a>(
        &'a self,
        key: Option<&'a str>,
        name: &'a str,
        index: usize,
    ) -> Result<Option<&'a Value>> {
        if property::is_internal_property_name(name) {
            return Ok(self.internal_property(name).map(Property::value));
        }
        self.fetch_hints.assert_property_included(name)?;
        Ok(self.properties.value_at(key, name, index))
    }
}

fn internal_properties(
    id: &str,
    kind: &ElementKind,
    visibility: &Visibility,
    timestamp: i64,
) -> Result<Vec<Property>> {
    let mut cells = vec![
        Property::new(
            DEFAULT_KEY,
            ID_PROPERTY_NAME,
            id,
            visibility.clone(),
            timestamp,
        )?,
        Property::new(
            DEFAULT_KEY,
            ELEMENT_TYPE_PROPERTY_NAME,
            kind.element_type().as_str(),
            visibility.clone(),
            timestamp,
        )?,
    ];
    if let ElementKind::Edge(info) = kind {
        cells.push(Property::new(
            DEFAULT_KEY,
            EDGE_LABEL_PROPERTY_NAME,
            info.label.as_str(),
            visibility.clone(),
            timestamp,
        )?);
        cells.push(Property::new(
            DEFAULT_KEY,
            OUT_VERTEX_ID_PROPERTY_NAME,
            info.out_vertex_id.as_str(),
            visibility.clone(),
            timestamp,
        )?);
        cells.push(Property::new(
            DEFAULT_KEY,
            IN_VERTEX_ID_PROPERTY_NAME,
            info.in_vertex_id.as_str(),
            visibility.clone(),
            timestamp,
        )?);
    }
    Ok(cells)
}
