//! Record and value types shared by the dataset and object layers.
//!
//! # Responsibility
//! - Define the decoded row shape returned by dataset reads.
//! - Define the dynamic value type used for entity attributes.
//!
//! # Invariants
//! - `sequence_id` is engine-assigned and never changes for a row.
//! - `updated_at`, when present, is not earlier than `created_at`.

pub mod attributes;
pub mod record;
pub mod term;
