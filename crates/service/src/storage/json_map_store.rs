use std::{collections::HashMap, hash::Hash, path::PathBuf, sync::Arc};
use tokio::{fs, sync::RwLock};

use crate::errors::ServiceError;

/// Generic JSON file-backed key-value map store.
///
/// Persists a `HashMap<K, V>` to a JSON file after every mutation. Without a
/// file path the map only lives in memory.
#[derive(Clone)]
pub struct JsonMapStore<K, V> {
    inner: Arc<RwLock<HashMap<K, V>>>,
    file_path: Option<PathBuf>,
}

impl<K, V> JsonMapStore<K, V>
where
    K: Eq + Hash + serde::Serialize + serde::de::DeserializeOwned + Clone,
    V: serde::Serialize + serde::de::DeserializeOwned + Clone,
{
    /// Initialize the store from a path. Creates the file with an empty map if missing.
    pub async fn new<P: Into<PathBuf>>(path: P) -> Result<Arc<Self>, ServiceError> {
        let file_path = path.into();
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).await.ok();
        }

        let map: HashMap<K, V> = match fs::read(&file_path).await {
            Ok(bytes) if bytes.is_empty() => HashMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| ServiceError::Db(format!("{}: {}", file_path.display(), e)))?,
            Err(_) => {
                let empty: HashMap<K, V> = HashMap::new();
                fs::write(&file_path, serde_json::to_vec(&empty).map_err(|e| ServiceError::Db(e.to_string()))?)
                    .await
                    .map_err(|e| ServiceError::Db(e.to_string()))?;
                empty
            }
        };

        Ok(Arc::new(Self { inner: Arc::new(RwLock::new(map)), file_path: Some(file_path) }))
    }

    /// Memory-only store; nothing is written to disk.
    pub fn in_memory() -> Arc<Self> {
        Arc::new(Self { inner: Arc::new(RwLock::new(HashMap::new())), file_path: None })
    }

    async fn save(&self) -> Result<(), ServiceError> {
        let Some(path) = &self.file_path else { return Ok(()) };
        let map = self.inner.read().await;
        let data = serde_json::to_vec(&*map).map_err(|e| ServiceError::Db(e.to_string()))?;
        drop(map);
        fs::write(path, data).await.map_err(|e| ServiceError::Db(e.to_string()))?;
        Ok(())
    }

    /// Run a read-only closure over the map.
    pub async fn read_map<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&HashMap<K, V>) -> T,
    {
        let map = self.inner.read().await;
        f(&map)
    }

    /// Apply a mutation to the underlying map and persist when it succeeds.
    pub async fn update_map<F, T>(&self, f: F) -> Result<T, ServiceError>
    where
        F: FnOnce(&mut HashMap<K, V>) -> Result<T, ServiceError>,
    {
        let mut map = self.inner.write().await;
        let out = f(&mut map)?;
        drop(map);
        self.save().await?;
        Ok(out)
    }
}
