use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::PersistenceError;
use crate::record::PlantCareRecord;
use crate::storage::BlobStore;

pub const DEFAULT_STORAGE_KEY: &str = "@plantmanager:plants";
const COLLECTION_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct StoredCollection {
    version: u32,
    #[serde(default)]
    records: Vec<PlantCareRecord>,
}

/// Encodes the whole collection as one JSON document.
pub fn encode_collection(records: &[PlantCareRecord]) -> Result<Vec<u8>, PersistenceError> {
    #[derive(Serialize)]
    struct Borrowed<'a> {
        version: u32,
        records: &'a [PlantCareRecord],
    }
    serde_json::to_vec(&Borrowed {
        version: COLLECTION_VERSION,
        records,
    })
    .map_err(PersistenceError::Encode)
}

pub fn decode_collection(key: &str, bytes: &[u8]) -> Result<Vec<PlantCareRecord>, PersistenceError> {
    let stored: StoredCollection =
        serde_json::from_slice(bytes).map_err(|source| PersistenceError::Decode {
            key: key.to_string(),
            source,
        })?;
    if stored.version != COLLECTION_VERSION {
        return Err(PersistenceError::UnsupportedVersion(stored.version));
    }
    Ok(stored.records)
}

/// Keyed persistence of plant-care records over a single blob.
///
/// Every mutation reloads the collection, applies the change and writes the
/// full collection back while holding `write_lock`, so two overlapping calls
/// cannot lose each other's update.
pub struct RecordStore {
    blobs: Arc<dyn BlobStore>,
    key: String,
    write_lock: Mutex<()>,
}

impl RecordStore {
    pub fn new(blobs: Arc<dyn BlobStore>) -> Self {
        Self::with_key(blobs, DEFAULT_STORAGE_KEY)
    }

    pub fn with_key(blobs: Arc<dyn BlobStore>, key: impl Into<String>) -> Self {
        Self {
            blobs,
            key: key.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub async fn get_all(&self) -> Result<Vec<PlantCareRecord>, PersistenceError> {
        self.load().await
    }

    pub async fn get(&self, id: &str) -> Result<Option<PlantCareRecord>, PersistenceError> {
        Ok(self
            .load()
            .await?
            .into_iter()
            .find(|record| record.id() == id))
    }

    pub async fn put(&self, record: PlantCareRecord) -> Result<(), PersistenceError> {
        if record.id().trim().is_empty() {
            return Err(PersistenceError::MissingId);
        }
        let _guard = self.write_lock.lock().await;
        let mut records = self.load().await?;
        match records.iter_mut().find(|existing| existing.id() == record.id()) {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
        self.commit(&records).await
    }

    /// Returns whether a record was actually removed.
    pub async fn remove(&self, id: &str) -> Result<bool, PersistenceError> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load().await?;
        let before = records.len();
        records.retain(|record| record.id() != id);
        if records.len() == before {
            return Ok(false);
        }
        self.commit(&records).await?;
        Ok(true)
    }

    pub async fn clear(&self) -> Result<(), PersistenceError> {
        let _guard = self.write_lock.lock().await;
        self.commit(&[]).await
    }

    async fn load(&self) -> Result<Vec<PlantCareRecord>, PersistenceError> {
        let bytes = self
            .blobs
            .read(&self.key)
            .await
            .map_err(|source| PersistenceError::Io {
                key: self.key.clone(),
                source,
            })?;
        match bytes {
            Some(bytes) => decode_collection(&self.key, &bytes),
            None => Ok(Vec::new()),
        }
    }

    async fn commit(&self, records: &[PlantCareRecord]) -> Result<(), PersistenceError> {
        let payload = encode_collection(records)?;
        self.blobs
            .write(&self.key, &payload)
            .await
            .map_err(|source| PersistenceError::Io {
                key: self.key.clone(),
                source,
            })?;
        tracing::debug!(key = %self.key, records = records.len(), "plant collection persisted");
        Ok(())
    }
}
