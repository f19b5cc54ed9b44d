//! Class-level handle for one kind of entity.

use crate::dataset::{DatasetError, DatasetResult};
use crate::model::attributes::Attributes;
use crate::object::entity::Entity;
use crate::storage::Storage;
use log::debug;

/// What `save`/`update` report when the entity's key has vanished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingPolicy {
    /// Propagate [`DatasetError::NotFound`].
    #[default]
    Fail,
    /// Treat the write as a no-op and return `false`.
    Ignore,
}

/// Binds entities to one storage, configured once at construction.
#[derive(Debug)]
pub struct Model<S> {
    storage: S,
    missing_policy: MissingPolicy,
}

impl<S: Storage> Model<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            missing_policy: MissingPolicy::default(),
        }
    }

    pub fn with_missing_policy(mut self, policy: MissingPolicy) -> Self {
        self.missing_policy = policy;
        self
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn missing_policy(&self) -> MissingPolicy {
        self.missing_policy
    }

    /// Stores `attributes` under a new key and returns the stored entity.
    ///
    /// The entity is re-read after the insert so it carries the timestamps
    /// assigned by the database. On a Bag-backed storage the re-read returns
    /// the oldest row under `key`, which is not the new one if others exist.
    ///
    /// # Errors
    /// - [`DatasetError::DuplicateKey`] when a Map-backed storage already
    ///   holds `key`.
    /// - [`DatasetError::NotFound`] when the row disappears before the re-read.
    pub fn put(&self, key: impl AsRef<[u8]>, attributes: Attributes) -> DatasetResult<Entity<'_, S>> {
        let key = key.as_ref();
        self.storage.put(key, attributes)?;
        debug!(
            "event=entity_put module=object status=ok key_len={}",
            key.len()
        );
        self.get(key)?
            .ok_or_else(|| DatasetError::NotFound(key.to_vec()))
    }

    /// Loads the entity stored under `key`.
    pub fn get(&self, key: impl AsRef<[u8]>) -> DatasetResult<Option<Entity<'_, S>>> {
        let key = key.as_ref();
        let record = self.storage.get::<Attributes>(key)?;
        Ok(record.map(|record| Entity::from_record(self, record)))
    }

    /// Deletes every row stored under `key`.
    pub fn delete(&self, key: impl AsRef<[u8]>) -> DatasetResult<usize> {
        self.storage.delete(key.as_ref())
    }

    pub(crate) fn absorb_missing(&self, err: DatasetError) -> DatasetResult<bool> {
        if err.is_not_found() && self.missing_policy == MissingPolicy::Ignore {
            debug!("event=entity_write module=object status=missing policy=ignore");
            return Ok(false);
        }
        Err(err)
    }
}
