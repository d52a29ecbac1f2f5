//! Collaborator contracts consumed by the element core.
//!
//! Backends implement these traits; the core only prepares mutations and
//! projects reads through them. Nothing here performs I/O on behalf of the
//! core, and no durability guarantees are defined at this layer.

use serde::{Deserialize, Serialize};

use crate::element::ElementType;
use crate::error::Result;
use crate::fetch_hints::FetchHints;
use crate::property::{Property, Value};
use crate::visibility::{User, Visibility};

/// Reference to an element: its type plus id.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ElementId {
    /// The element's type.
    pub element_type: ElementType,
    /// The element's id.
    pub element_id: String,
}

impl ElementId {
    /// Creates a reference.
    pub fn new(element_type: ElementType, element_id: impl Into<String>) -> Self {
        ElementId {
            element_type,
            element_id: element_id.into(),
        }
    }
}

/// Identifier ordering historical events within an element's log.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HistoricalEventId {
    /// When the event happened, in epoch milliseconds.
    pub timestamp: i64,
    /// Orders events sharing a timestamp.
    pub sequence: u64,
}

/// Externally logged record of a past change to an element. Retrieved, never
/// produced, by this core.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricalEvent {
    /// Position of the event in the element's log.
    pub id: HistoricalEventId,
    /// The element the event belongs to.
    pub element_id: ElementId,
    /// What happened.
    pub description: String,
}

/// Key of one row in an element's extended-data table.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ExtendedDataRowId {
    /// The owning element's type.
    pub element_type: ElementType,
    /// The owning element's id.
    pub element_id: String,
    /// The table the row belongs to.
    pub table_name: String,
    /// The row id within the table.
    pub row_id: String,
}

impl ExtendedDataRowId {
    /// Creates a row key.
    pub fn new(
        element_type: ElementType,
        element_id: impl Into<String>,
        table_name: impl Into<String>,
        row_id: impl Into<String>,
    ) -> Self {
        ExtendedDataRowId {
            element_type,
            element_id: element_id.into(),
            table_name: table_name.into(),
            row_id: row_id.into(),
        }
    }
}

/// One row of an element's extended-data table: a row key plus its cells,
/// reusing the property model for the column cells.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtendedDataRow {
    /// The row key.
    pub id: ExtendedDataRowId,
    /// The row's cells; the property name carries the column name.
    pub properties: Vec<Property>,
}

/// Lazy stream of historical events.
pub type EventIter<'a> = Box<dyn Iterator<Item = HistoricalEvent> + 'a>;

/// Lazy stream of extended-data rows.
pub type RowIter<'a> = Box<dyn Iterator<Item = ExtendedDataRow> + 'a>;

/// Read-side projections a storage backend supplies to the element core.
///
/// Both methods are pure projections over externally persisted logs; the
/// core threads the caller context through without inspecting it.
pub trait Graph {
    /// Historical events of the referenced elements, after the given
    /// position when one is supplied.
    fn historical_events<'a>(
        &'a self,
        element_refs: &[ElementId],
        after: Option<&HistoricalEventId>,
        fetch_hints: &FetchHints,
        user: &User,
    ) -> EventIter<'a>;

    /// Rows of one extended-data table of one element.
    fn extended_data<'a>(
        &'a self,
        element_type: ElementType,
        element_id: &str,
        table_name: &str,
        fetch_hints: &FetchHints,
        user: &User,
    ) -> RowIter<'a>;
}

/// Backend-side contract for extended-data table storage.
pub trait ExtendedDataTable {
    /// Names of the tables attached to an element.
    fn table_names(
        &self,
        element_type: ElementType,
        element_id: &str,
        fetch_hints: &FetchHints,
        user: &User,
    ) -> Vec<String>;

    /// Rows of one table of one element.
    fn table<'a>(
        &'a self,
        element_type: ElementType,
        element_id: &str,
        table_name: &str,
        fetch_hints: &FetchHints,
        user: &User,
    ) -> RowIter<'a>;

    /// Writes one cell of one row.
    fn add_data(
        &self,
        row_id: &ExtendedDataRowId,
        column: &str,
        key: &str,
        value: Value,
        timestamp: i64,
        visibility: &Visibility,
    ) -> Result<()>;

    /// Removes a whole row.
    fn remove(&self, row_id: &ExtendedDataRowId) -> Result<()>;

    /// Removes one cell of one row.
    fn remove_column(
        &self,
        row_id: &ExtendedDataRowId,
        column: &str,
        key: &str,
        visibility: &Visibility,
    ) -> Result<()>;

    /// Grants an additional visibility label on a row.
    fn add_additional_visibility(&self, row_id: &ExtendedDataRowId, label: &str) -> Result<()>;

    /// Revokes an additional visibility label on a row.
    fn delete_additional_visibility(&self, row_id: &ExtendedDataRowId, label: &str) -> Result<()>;
}
