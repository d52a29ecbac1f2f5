//! A minimal in-memory backend.
//!
//! Commits mutations into process-local tables and serves the read-side
//! collaborator contracts from them. It exists to prove the element core is
//! backend-agnostic and to give the integration tests a real collaborator;
//! it makes no durability claims.

use std::collections::{BTreeMap, BTreeSet};

use parking_lot::Mutex;
use tracing::debug;

use crate::element::ElementType;
use crate::error::{GraphError, Result};
use crate::fetch_hints::FetchHints;
use crate::graph::{
    ElementId, EventIter, ExtendedDataRow, ExtendedDataRowId, ExtendedDataTable, Graph,
    HistoricalEvent, HistoricalEventId, RowIter,
};
use crate::mutation::{ElementMutation, ElementMutationBuilder};
use crate::property::{Property, Value};
use crate::util::increasing_time;
use crate::visibility::{User, Visibility};

/// In-memory storage backend for the element core.
#[derive(Debug, Default)]
pub struct InMemoryGraph {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    mutations: BTreeMap<String, Vec<ElementMutation>>,
    events: Vec<HistoricalEvent>,
    rows: BTreeMap<ExtendedDataRowId, Vec<Property>>,
    row_additional_visibilities: BTreeMap<ExtendedDataRowId, BTreeSet<String>>,
    next_sequence: u64,
}

impl InMemoryGraph {
    /// Creates an empty backend.
    pub fn new() -> Self {
        InMemoryGraph::default()
    }

    /// The mutations committed against one element, in commit order.
    pub fn saved_mutations(&self, element_id: &str) -> Vec<ElementMutation> {
        self.inner
            .lock()
            .mutations
            .get(element_id)
            .cloned()
            .unwrap_or_default()
    }

    fn commit(&self, mutation: &ElementMutation, timestamp: i64, description: &str) {
        let mut inner = self.inner.lock();
        inner
            .mutations
            .entry(mutation.element_id().to_owned())
            .or_default()
            .push(mutation.clone());
        let sequence = inner.next_sequence;
        inner.next_sequence += 1;
        let element_id = ElementId::new(mutation.kind().element_type(), mutation.element_id());
        inner.events.push(HistoricalEvent {
            id: HistoricalEventId {
                timestamp,
                sequence,
            },
            element_id,
            description: description.to_owned(),
        });
    }
}

impl ElementMutationBuilder for InMemoryGraph {
    fn save_vertex_mutation(
        &self,
        mutation: &ElementMutation,
        timestamp: i64,
        _user: &User,
    ) -> Result<()> {
        debug!(id = %mutation.element_id(), "inmemory.save.vertex");
        self.commit(mutation, timestamp, "vertex created");
        Ok(())
    }

    fn save_edge_mutation(
        &self,
        mutation: &ElementMutation,
        timestamp: i64,
        _user: &User,
    ) -> Result<()> {
        debug!(id = %mutation.element_id(), "inmemory.save.edge");
        self.commit(mutation, timestamp, "edge created");
        Ok(())
    }

    fn save_existing_element_mutation(
        &self,
        mutation: &ElementMutation,
        _user: &User,
    ) -> Result<()> {
        debug!(id = %mutation.element_id(), "inmemory.save.existing");
        self.commit(mutation, increasing_time::next_millis(), "element mutated");
        Ok(())
    }
}

impl Graph for InMemoryGraph {
    fn historical_events<'a>(
        &'a self,
        element_refs: &[ElementId],
        after: Option<&HistoricalEventId>,
        _fetch_hints: &FetchHints,
        _user: &User,
    ) -> EventIter<'a> {
        let refs: Vec<ElementId> = element_refs.to_vec();
        let after = after.copied();
        let events: Vec<HistoricalEvent> = self
            .inner
            .lock()
            .events
            .iter()
            .filter(|event| refs.contains(&event.element_id))
            .filter(|event| after.map_or(true, |a| event.id > a))
            .cloned()
            .collect();
        Box::new(events.into_iter())
    }

    fn extended_data<'a>(
        &'a self,
        element_type: ElementType,
        element_id: &str,
        table_name: &str,
        _fetch_hints: &FetchHints,
        user: &User,
    ) -> RowIter<'a> {
        let inner = self.inner.lock();
        let rows: Vec<ExtendedDataRow> = inner
            .rows
            .iter()
            .filter(|(id, _)| {
                id.element_type == element_type
                    && id.element_id == element_id
                    && id.table_name == table_name
            })
            .map(|(id, cells)| ExtendedDataRow {
                id: id.clone(),
                properties: cells
                    .iter()
                    .filter(|cell| user.authorizations().can_read(cell.visibility()))
                    .cloned()
                    .collect(),
            })
            .collect();
        Box::new(rows.into_iter())
    }
}

impl ExtendedDataTable for InMemoryGraph {
    fn table_names(
        &self,
        element_type: ElementType,
        element_id: &str,
        _fetch_hints: &FetchHints,
        _user: &User,
    ) -> Vec<String> {
        let inner = self.inner.lock();
        let names: BTreeSet<&str> = inner
            .rows
            .keys()
            .filter(|id| id.element_type == element_type && id.element_id == element_id)
            .map(|id| id.table_name.as_str())
            .collect();
        names.into_iter().map(str::to_owned).collect()
    }

    fn table<'a>(
        &'a self,
        element_type: ElementType,
        element_id: &str,
        table_name: &str,
        fetch_hints: &FetchHints,
        user: &User,
    ) -> RowIter<'a> {
        self.extended_data(element_type, element_id, table_name, fetch_hints, user)
    }

    fn add_data(
        &self,
        row_id: &ExtendedDataRowId,
        column: &str,
        key: &str,
        value: Value,
        timestamp: i64,
        visibility: &Visibility,
    ) -> Result<()> {
        let cell = Property::new(key, column, value, visibility.clone(), timestamp)?;
        let mut inner = self.inner.lock();
        let cells = inner.rows.entry(row_id.clone()).or_default();
        match cells.iter_mut().find(|c| c.same_identity(&cell)) {
            Some(existing) => *existing = cell,
            None => cells.push(cell),
        }
        Ok(())
    }

    fn remove(&self, row_id: &ExtendedDataRowId) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.rows.remove(row_id);
        inner.row_additional_visibilities.remove(row_id);
        Ok(())
    }

    fn remove_column(
        &self,
        row_id: &ExtendedDataRowId,
        column: &str,
        key: &str,
        visibility: &Visibility,
    ) -> Result<()> {
        let mut inner = self.inner.lock();
        if let Some(cells) = inner.rows.get_mut(row_id) {
            cells.retain(|cell| {
                !(cell.name() == column && cell.key() == key && cell.visibility() == visibility)
            });
        }
        Ok(())
    }

    fn add_additional_visibility(&self, row_id: &ExtendedDataRowId, label: &str) -> Result<()> {
        let mut inner = self.inner.lock();
        if !inner.rows.contains_key(row_id) {
            return Err(GraphError::InvalidArgument("extended data row not found"));
        }
        inner
            .row_additional_visibilities
            .entry(row_id.clone())
            .or_default()
            .insert(label.to_owned());
        Ok(())
    }

    fn delete_additional_visibility(&self, row_id: &ExtendedDataRowId, label: &str) -> Result<()> {
        let mut inner = self.inner.lock();
        if let Some(labels) = inner.row_additional_visibilities.get_mut(row_id) {
            labels.remove(label);
        }
        Ok(())
    }
}

impl InMemoryGraph {
    /// The additional visibility labels granted on one extended-data row.
    pub fn row_additional_visibilities(&self, row_id: &ExtendedDataRowId) -> BTreeSet<String> {
        self.inner
            .lock()
            .row_additional_visibilities
            .get(row_id)
            .cloned()
            .unwrap_or_default()
    }
}
