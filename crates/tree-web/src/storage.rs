use tree_core::photos::PhotoId;
use tree_core::store::{sort_by_creation, PhotoStore, StoredPhoto};
use tree_core::StoreError;
use web_sys as web;

const KEY_PREFIX: &str = "photo-tree/photo/";

/// Records as JSON strings in `localStorage`, one key per photo.
pub struct LocalStorageStore {
    storage: web::Storage,
}

impl LocalStorageStore {
    pub fn open() -> Result<Self, StoreError> {
        let storage = web::window()
            .ok_or_else(|| StoreError::Unavailable("no window".into()))?
            .local_storage()
            .map_err(|e| StoreError::Unavailable(format!("{e:?}")))?
            .ok_or_else(|| StoreError::Unavailable("localStorage disabled".into()))?;
        Ok(Self { storage })
    }

    fn key(id: &PhotoId) -> String {
        format!("{KEY_PREFIX}{id}")
    }
}

impl PhotoStore for LocalStorageStore {
    fn put(&mut self, record: &StoredPhoto) -> Result<(), StoreError> {
        let json = serde_json::to_string(record).map_err(|e| StoreError::Write(e.to_string()))?;
        // QuotaExceededError lands here for large images
        self.storage
            .set_item(&Self::key(&record.id), &json)
            .map_err(|e| StoreError::Write(format!("{e:?}")))
    }

    fn delete(&mut self, id: &PhotoId) -> Result<(), StoreError> {
        let key = Self::key(id);
        match self.storage.get_item(&key) {
            Ok(Some(_)) => self
                .storage
                .remove_item(&key)
                .map_err(|e| StoreError::Write(format!("{e:?}"))),
            Ok(None) => Err(StoreError::NotFound(id.to_string())),
            Err(e) => Err(StoreError::Unavailable(format!("{e:?}"))),
        }
    }

    fn list_all(&self) -> Result<Vec<StoredPhoto>, StoreError> {
        let len = self
            .storage
            .length()
            .map_err(|e| StoreError::Unavailable(format!("{e:?}")))?;
        let mut records = Vec::new();
        for i in 0..len {
            let Ok(Some(key)) = self.storage.key(i) else {
                continue;
            };
            if !key.starts_with(KEY_PREFIX) {
                continue;
            }
            let Ok(Some(json)) = self.storage.get_item(&key) else {
                continue;
            };
            match serde_json::from_str::<StoredPhoto>(&json) {
                Ok(record) => records.push(record),
                Err(e) => log::warn!("[store] malformed record {key}: {e}"),
            }
        }
        sort_by_creation(&mut records);
        Ok(records)
    }
}
