//! Key-value storage slots used by the flat-store backend.
//!
//! The interface mirrors a browser's local storage: string values addressed by
//! string keys, read and written whole.

use std::{collections::HashMap, io, path::PathBuf, sync::Arc};

use async_trait::async_trait;
use tokio::sync::RwLock;

/// A persistent string-to-string storage.
#[async_trait]
pub trait KeyValueStorage: Send + Sync {
    /// Makes the storage usable. Called once before any other operation.
    async fn prepare(&self) -> io::Result<()> {
        Ok(())
    }

    /// Returns the value stored under `key`, if any.
    async fn get_item(&self, key: &str) -> io::Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn set_item(&self, key: &str, value: &str) -> io::Result<()>;
}

#[async_trait]
impl<S: KeyValueStorage + ?Sized> KeyValueStorage for Arc<S> {
    async fn prepare(&self) -> io::Result<()> {
        (**self).prepare().await
    }

    async fn get_item(&self, key: &str) -> io::Result<Option<String>> {
        (**self).get_item(key).await
    }

    async fn set_item(&self, key: &str, value: &str) -> io::Result<()> {
        (**self).set_item(key, value).await
    }
}

/// In-memory storage. Contents are lost when the value is dropped.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    items: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStorage {
    /// Creates an empty in-memory storage.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStorage for MemoryStorage {
    async fn get_item(&self, key: &str) -> io::Result<Option<String>> {
        let items = self.items.read().await;
        Ok(items.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> io::Result<()> {
        let mut items = self.items.write().await;
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Directory-backed storage holding one `<key>.json` file per key.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Creates storage rooted at `dir`. The directory is created by
    /// [`KeyValueStorage::prepare`].
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Creates storage rooted at `dir` and prepares it.
    pub async fn open(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let storage = Self::new(dir);
        storage.prepare().await?;
        Ok(storage)
    }

    fn item_path(&self, key: &str) -> io::Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
            && key != "."
            && key != "..";
        if !valid {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid storage key: {key:?}"),
            ));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

#[async_trait]
impl KeyValueStorage for FileStorage {
    async fn prepare(&self) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await
    }

    async fn get_item(&self, key: &str) -> io::Result<Option<String>> {
        let path = self.item_path(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn set_item(&self, key: &str, value: &str) -> io::Result<()> {
        let path = self.item_path(key)?;
        // Write then rename so a reader never sees a half-written value
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, value).await?;
        tokio::fs::rename(&tmp, &path).await
    }
}
