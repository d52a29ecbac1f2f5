//! Element/property core of a property graph.
//!
//! Models a vertex or edge as a versioned, multi-valued, cell-level-secured
//! property set, plus the mutation algebra (add, delete, soft-delete,
//! additional-visibility toggles) that transforms it. The model is
//! storage-backend-agnostic: backends construct [`Element`]s by replaying
//! persisted mutations, durably commit prepared [`ElementMutation`]s through
//! [`ElementMutationBuilder`], and serve reads through the collaborator
//! traits in [`graph`].

pub mod element;
pub mod error;
pub mod fetch_hints;
pub mod graph;
pub mod inmemory;
pub mod mutation;
pub mod object;
pub mod property;
pub mod util;
pub mod visibility;

pub use element::{Direction, EdgeInfo, Element, ElementInit, ElementKind, ElementType};
pub use error::{GraphError, Result};
pub use fetch_hints::{FetchHints, FetchHintsBuilder};
pub use mutation::{
    AdditionalVisibilityMutation, ElementMutation, ElementMutationBuilder, MutationLog,
    PropertyDeleteMutation, PropertySoftDeleteMutation,
};
pub use object::GraphObject;
pub use property::{Metadata, Property, PropertyCollection, Value, DEFAULT_KEY};
pub use visibility::{Authorizations, User, Visibility};
