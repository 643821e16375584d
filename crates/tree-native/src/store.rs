use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tree_core::photos::PhotoId;
use tree_core::store::{sort_by_creation, PhotoStore, StoredPhoto};
use tree_core::StoreError;

/// One JSON file per record, named after the photo id.
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)
            .map_err(|e| StoreError::Unavailable(format!("{}: {e}", root.display())))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record_path(&self, id: &PhotoId) -> PathBuf {
        // ids are generated as `photo-<ms>-<hex>`; anything else is flattened
        let name: String = id
            .as_str()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        self.root.join(format!("{name}.json"))
    }
}

impl PhotoStore for DirectoryStore {
    fn put(&mut self, record: &StoredPhoto) -> Result<(), StoreError> {
        let json =
            serde_json::to_vec_pretty(record).map_err(|e| StoreError::Write(e.to_string()))?;
        let path = self.record_path(&record.id);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| StoreError::Write(format!("{}: {e}", tmp.display())))?;
        fs::rename(&tmp, &path).map_err(|e| StoreError::Write(format!("{}: {e}", path.display())))
    }

    fn delete(&mut self, id: &PhotoId) -> Result<(), StoreError> {
        match fs::remove_file(self.record_path(id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StoreError::NotFound(id.to_string())),
            Err(e) => Err(StoreError::Write(e.to_string())),
        }
    }

    fn list_all(&self) -> Result<Vec<StoredPhoto>, StoreError> {
        let entries = fs::read_dir(&self.root)
            .map_err(|e| StoreError::Unavailable(format!("{}: {e}", self.root.display())))?;
        let mut records = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| StoreError::Unavailable(e.to_string()))?
                .path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let bytes = match fs::read(&path) {
                Ok(b) => b,
                Err(e) => {
                    log::warn!("[store] unreadable {}: {e}", path.display());
                    continue;
                }
            };
            match serde_json::from_slice::<StoredPhoto>(&bytes) {
                Ok(record) => records.push(record),
                Err(e) => log::warn!("[store] malformed {}: {e}", path.display()),
            }
        }
        sort_by_creation(&mut records);
        Ok(records)
    }
}
