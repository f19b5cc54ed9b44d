//! Object layer: mutable entities over one storage.
//!
//! # Responsibility
//! - Bind an entity type to a single [`Storage`](crate::storage::Storage).
//! - Turn stored records into editable in-memory entities.
//!
//! # Invariants
//! - Editing an entity never writes; only `save` and `update` persist.
//! - A save replaces the whole stored attribute map.
//! - The table stays the source of truth; entities are disposable views.

pub mod entity;
pub mod model;
