use thiserror::Error;

use crate::element::Direction;
use crate::fetch_hints::FetchHints;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, GraphError>;

/// Errors surfaced by the element/property core.
///
/// None of these are transient: every variant signals either a caller
/// contract violation or a model/backend mismatch, and is raised
/// synchronously at the point of violation.
#[derive(Debug, Error)]
pub enum GraphError {
    /// A read accessor required a capability the element was not loaded
    /// with. Reload the element with different fetch hints.
    #[error("missing fetch hint {hint}; element was loaded with {fetch_hints}")]
    MissingFetchHint {
        /// The hints the element was loaded with.
        fetch_hints: FetchHints,
        /// Name of the capability that was required.
        hint: String,
    },
    /// A mutation violated the property model: an update targeted an
    /// existing non-updatable property, or an add omitted a mandatory key.
    #[error("invalid mutation: {0}")]
    InvalidMutation(String),
    /// An edge endpoint was requested for a direction that does not select
    /// a single vertex.
    #[error("unexpected direction: {0:?}")]
    UnknownDirection(Direction),
    /// Caller supplied an argument outside the model's domain.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
}
