//! Mutable in-memory entity bound to one key.

use crate::dataset::{DatasetError, DatasetResult};
use crate::model::attributes::Attributes;
use crate::model::record::{Record, Timestamp};
use crate::model::term::Term;
use crate::object::model::Model;
use crate::storage::Storage;

/// Editable view of the attributes stored under one key.
///
/// Edits stay local until [`save`](Self::save) or [`update`](Self::update);
/// [`discard`](Self::discard) drops them again.
#[derive(Debug)]
pub struct Entity<'m, S> {
    model: &'m Model<S>,
    key: Vec<u8>,
    attributes: Attributes,
    persisted: Attributes,
    created_at: Option<Timestamp>,
    updated_at: Option<Timestamp>,
}

impl<'m, S: Storage> Entity<'m, S> {
    pub(crate) fn from_record(model: &'m Model<S>, record: Record<Attributes>) -> Self {
        let attributes = record.value.unwrap_or_default();
        Self {
            model,
            key: record.key,
            persisted: attributes.clone(),
            attributes,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }

    pub fn key(&self) -> &[u8] {
        &self.key
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }

    pub fn get(&self, name: &str) -> Option<&Term> {
        self.attributes.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Term>) -> Option<Term> {
        self.attributes.set(name, value)
    }

    pub fn remove(&mut self, name: &str) -> Option<Term> {
        self.attributes.remove(name)
    }

    pub fn created_at(&self) -> Option<Timestamp> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<Timestamp> {
        self.updated_at
    }

    /// Returns whether local edits differ from the last loaded or saved state.
    pub fn is_dirty(&self) -> bool {
        self.attributes != self.persisted
    }

    /// Drops unsaved edits without touching storage.
    pub fn discard(&mut self) {
        self.attributes = self.persisted.clone();
    }

    /// Overwrites the stored value with the current attributes as they are.
    ///
    /// Removed attributes are removed from storage too. Returns `true` when
    /// at least one row changed; a vanished key either fails with
    /// [`DatasetError::NotFound`] or returns `false`, per the model's
    /// [`MissingPolicy`](crate::object::model::MissingPolicy).
    pub fn save(&mut self) -> DatasetResult<bool> {
        match self.model.storage().set(&self.key, &self.attributes) {
            Ok(changed) => {
                self.persisted = self.attributes.clone();
                Ok(changed > 0)
            }
            Err(err) => self.model.absorb_missing(err),
        }
    }

    /// Atomically rewrites the stored attributes with `transform`.
    ///
    /// `transform` receives the attributes currently stored (read under the
    /// write lock, not this entity's possibly stale copy) and returns the
    /// attributes to store. Once the transaction commits the entity adopts
    /// the result stored in its own row (the oldest one under the key when
    /// several rows share it); timestamps refresh on the next [`reload`](Self::reload).
    pub fn update<F>(&mut self, mut transform: F) -> DatasetResult<bool>
    where
        F: FnMut(Attributes) -> Attributes,
    {
        let mut stored = None;
        let outcome = self
            .model
            .storage()
            .set_with(&self.key, |current: Attributes| {
                let next = transform(current);
                if stored.is_none() {
                    stored = Some(next.clone());
                }
                next
            });

        match outcome {
            Ok(changed) => {
                if let Some(next) = stored {
                    self.persisted = next.clone();
                    self.attributes = next;
                }
                Ok(changed > 0)
            }
            Err(err) => self.model.absorb_missing(err),
        }
    }

    /// Re-reads the stored record, replacing attributes and timestamps.
    ///
    /// Unsaved edits are lost. Fails with [`DatasetError::NotFound`] when
    /// the key no longer exists.
    pub fn reload(&mut self) -> DatasetResult<&mut Self> {
        let record = self
            .model
            .storage()
            .get::<Attributes>(&self.key)?
            .ok_or_else(|| DatasetError::NotFound(self.key.clone()))?;

        let attributes = record.value.unwrap_or_default();
        self.persisted = attributes.clone();
        self.attributes = attributes;
        self.created_at = record.created_at;
        self.updated_at = record.updated_at;
        Ok(self)
    }
}
