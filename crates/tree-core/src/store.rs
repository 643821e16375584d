//! Keyed photo record store. Only the interface and an in-memory version
//! live here; the front-ends bring persistent implementations.

use crate::error::StoreError;
use crate::photos::PhotoId;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredPhoto {
    pub id: PhotoId,
    pub image: String,
    pub aspect_ratio: f32,
    pub created_at_ms: u64,
}

pub trait PhotoStore {
    fn put(&mut self, record: &StoredPhoto) -> Result<(), StoreError>;
    fn delete(&mut self, id: &PhotoId) -> Result<(), StoreError>;
    /// All records, oldest first.
    fn list_all(&self) -> Result<Vec<StoredPhoto>, StoreError>;
}

/// Sort helper for implementations that read records in arbitrary order.
pub fn sort_by_creation(records: &mut [StoredPhoto]) {
    records.sort_by(|a, b| {
        a.created_at_ms
            .cmp(&b.created_at_ms)
            .then_with(|| a.id.cmp(&b.id))
    });
}

#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    records: Vec<StoredPhoto>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl PhotoStore for MemoryStore {
    fn put(&mut self, record: &StoredPhoto) -> Result<(), StoreError> {
        match self.records.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => *existing = record.clone(),
            None => self.records.push(record.clone()),
        }
        Ok(())
    }

    fn delete(&mut self, id: &PhotoId) -> Result<(), StoreError> {
        let before = self.records.len();
        self.records.retain(|r| &r.id != id);
        if self.records.len() == before {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    fn list_all(&self) -> Result<Vec<StoredPhoto>, StoreError> {
        let mut out = self.records.clone();
        sort_by_creation(&mut out);
        Ok(out)
    }
}
