//! Narrow storage contract consumed by the object layer.
//!
//! # Responsibility
//! - Expose put/get/set/delete without the rest of the dataset surface.
//! - Let another backend (sharded, cached) stand in without touching
//!   `object` code.
//!
//! # Invariants
//! - Implementations return dataset-level errors (`DuplicateKey`,
//!   `NotFound`) with the same meaning as [`Dataset`].

use crate::dataset::{Dataset, DatasetResult};
use crate::model::record::Record;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Capability interface the object layer is written against.
pub trait Storage {
    fn put<V: Serialize>(&self, key: &[u8], value: V) -> DatasetResult<Record<V>>;
    fn get<V: DeserializeOwned>(&self, key: &[u8]) -> DatasetResult<Option<Record<V>>>;
    fn set<V: Serialize>(&self, key: &[u8], value: &V) -> DatasetResult<usize>;
    fn set_with<V, F>(&self, key: &[u8], transform: F) -> DatasetResult<usize>
    where
        V: Serialize + DeserializeOwned,
        F: FnMut(V) -> V;
    fn delete(&self, key: &[u8]) -> DatasetResult<usize>;
}

/// Forwards every call to one bound dataset.
#[derive(Debug)]
pub struct BasicStorage<'conn> {
    dataset: Dataset<'conn>,
}

impl<'conn> BasicStorage<'conn> {
    pub fn new(dataset: Dataset<'conn>) -> Self {
        Self { dataset }
    }

    pub fn dataset(&self) -> &Dataset<'conn> {
        &self.dataset
    }
}

impl Storage for BasicStorage<'_> {
    fn put<V: Serialize>(&self, key: &[u8], value: V) -> DatasetResult<Record<V>> {
        self.dataset.put(key, value)
    }

    fn get<V: DeserializeOwned>(&self, key: &[u8]) -> DatasetResult<Option<Record<V>>> {
        self.dataset.get(key)
    }

    fn set<V: Serialize>(&self, key: &[u8], value: &V) -> DatasetResult<usize> {
        self.dataset.set(key, value)
    }

    fn set_with<V, F>(&self, key: &[u8], transform: F) -> DatasetResult<usize>
    where
        V: Serialize + DeserializeOwned,
        F: FnMut(V) -> V,
    {
        self.dataset.set_with(key, transform)
    }

    fn delete(&self, key: &[u8]) -> DatasetResult<usize> {
        self.dataset.delete(key)
    }
}

impl<S: Storage + ?Sized> Storage for &S {
    fn put<V: Serialize>(&self, key: &[u8], value: V) -> DatasetResult<Record<V>> {
        (**self).put(key, value)
    }

    fn get<V: DeserializeOwned>(&self, key: &[u8]) -> DatasetResult<Option<Record<V>>> {
        (**self).get(key)
    }

    fn set<V: Serialize>(&self, key: &[u8], value: &V) -> DatasetResult<usize> {
        (**self).set(key, value)
    }

    fn set_with<V, F>(&self, key: &[u8], transform: F) -> DatasetResult<usize>
    where
        V: Serialize + DeserializeOwned,
        F: FnMut(V) -> V,
    {
        (**self).set_with(key, transform)
    }

    fn delete(&self, key: &[u8]) -> DatasetResult<usize> {
        (**self).delete(key)
    }
}
