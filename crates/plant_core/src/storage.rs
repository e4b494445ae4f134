use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Flat string-keyed blob storage. Implementations must make `write`
/// atomic: a reader sees either the previous blob or the new one.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn read(&self, key: &str) -> io::Result<Option<Vec<u8>>>;
    async fn write(&self, key: &str, bytes: &[u8]) -> io::Result<()>;
}

/// One file per key inside `dir`.
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    dir: PathBuf,
}

impl FileBlobStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", file_stem(key)))
    }
}

/// Keys such as `@plantmanager:plants` are not valid file names everywhere.
/// Any byte outside `[a-z0-9.-]` becomes `_XX` (hex), `_` and capitals
/// included, so distinct keys never share a file, even on case-insensitive
/// filesystems.
fn file_stem(key: &str) -> String {
    if key.is_empty() {
        return "_".to_string();
    }
    let mut stem = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_lowercase() || byte.is_ascii_digit() || byte == b'-' || byte == b'.' {
            stem.push(byte as char);
        } else {
            stem.push_str(&format!("_{byte:02X}"));
        }
    }
    stem
}

#[async_trait]
impl BlobStore for FileBlobStore {
    async fn read(&self, key: &str) -> io::Result<Option<Vec<u8>>> {
        let path = self.path_for(key);
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn write(&self, key: &str, bytes: &[u8]) -> io::Result<()> {
        fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(key);
        let tmp_path = path.with_extension("json.tmp");
        let mut tmp = fs::File::create(&tmp_path).await?;
        tmp.write_all(bytes).await?;
        tmp.flush().await?;
        tmp.sync_all().await?;
        drop(tmp);
        fs::rename(&tmp_path, &path).await?;
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "blob committed");
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: impl Into<String>, bytes: Vec<u8>) {
        self.blobs.lock().insert(key.into(), bytes);
    }

    pub fn snapshot(&self, key: &str) -> Option<Vec<u8>> {
        self.blobs.lock().get(key).cloned()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn read(&self, key: &str) -> io::Result<Option<Vec<u8>>> {
        Ok(self.snapshot(key))
    }

    async fn write(&self, key: &str, bytes: &[u8]) -> io::Result<()> {
        self.insert(key, bytes.to_vec());
        Ok(())
    }
}
