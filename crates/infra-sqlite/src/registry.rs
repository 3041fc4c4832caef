// Per-queue store registry backed by one SQLite file per queue
//
// Layout: {root}/{workspace_id}/queues/{queue_id}.sqlite

use crate::connection::open_store_pool;
use crate::migration::run_store_migrations;
use crate::SqliteQueueStore;
use async_trait::async_trait;
use hookq_core::domain::StoreKey;
use hookq_core::error::{AppError, Result};
use hookq_core::port::{QueueStore, QueueStoreProvider, TimeProvider};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::{debug, info, warn};

const QUEUES_DIR: &str = "queues";
const STORE_EXTENSION: &str = "sqlite";

/// Deterministic location of a queue's store file
pub fn store_path(root: &Path, key: StoreKey) -> PathBuf {
    root.join(key.workspace_id.to_string())
        .join(QUEUES_DIR)
        .join(format!("{}.{}", key.queue_id, STORE_EXTENSION))
}

/// Companion files SQLite creates next to a WAL-mode database
fn sidecar_paths(path: &Path) -> [PathBuf; 2] {
    let with_suffix = |suffix: &str| {
        let mut name = path.as_os_str().to_owned();
        name.push(suffix);
        PathBuf::from(name)
    };
    [with_suffix("-wal"), with_suffix("-shm")]
}

pub struct SqliteStoreRegistry {
    root: PathBuf,
    time_provider: Arc<dyn TimeProvider>,
    // Open handles, so repeated opens share one pool per store
    handles: RwLock<HashMap<StoreKey, Arc<SqliteQueueStore>>>,
    // Per-key locks serializing provision, open and destroy of one store
    key_locks: Mutex<HashMap<StoreKey, Arc<Mutex<()>>>>,
}

impl SqliteStoreRegistry {
    pub fn new(root: impl Into<PathBuf>, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            root: root.into(),
            time_provider,
            handles: RwLock::new(HashMap::new()),
            key_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, key: StoreKey) -> PathBuf {
        store_path(&self.root, key)
    }

    async fn connect(&self, key: StoreKey, create: bool) -> Result<Arc<SqliteQueueStore>> {
        let path = self.path_for(key);
        let pool = open_store_pool(&path, create).await?;
        if let Err(e) = run_store_migrations(&pool).await {
            pool.close().await;
            return Err(e);
        }
        Ok(Arc::new(SqliteQueueStore::new(
            pool,
            key,
            Arc::clone(&self.time_provider),
        )))
    }

    async fn cached(&self, key: StoreKey) -> Option<Arc<SqliteQueueStore>> {
        self.handles.read().await.get(&key).cloned()
    }

    async fn lock_key(&self, key: StoreKey) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.key_locks.lock().await;
            Arc::clone(locks.entry(key).or_default())
        };
        lock.lock_owned().await
    }

    /// Callers hold the key lock, so no other handle can appear meanwhile
    async fn register(&self, store: Arc<SqliteQueueStore>) -> Arc<SqliteQueueStore> {
        self.handles
            .write()
            .await
            .insert(store.key(), Arc::clone(&store));
        store
    }
}

#[async_trait]
impl QueueStoreProvider for SqliteStoreRegistry {
    async fn provision(&self, key: StoreKey) -> Result<Arc<dyn QueueStore>> {
        if let Some(store) = self.cached(key).await {
            return Ok(store);
        }

        let _guard = self.lock_key(key).await;
        if let Some(store) = self.cached(key).await {
            return Ok(store);
        }

        let path = self.path_for(key);
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }

        let store = self.register(self.connect(key, true).await?).await;
        info!(store = %key, path = %path.display(), "Queue store provisioned");
        Ok(store)
    }

    async fn open(&self, key: StoreKey) -> Result<Arc<dyn QueueStore>> {
        if let Some(store) = self.cached(key).await {
            return Ok(store);
        }

        // Held across the existence check and connect so a concurrent
        // destroy cannot unlink the file underneath a new handle
        let _guard = self.lock_key(key).await;
        if let Some(store) = self.cached(key).await {
            return Ok(store);
        }

        let path = self.path_for(key);
        if !tokio::fs::try_exists(&path).await? {
            return Err(AppError::NotFound(format!("Queue store {} not found", key)));
        }

        let store = self.register(self.connect(key, false).await?).await;
        debug!(store = %key, "Queue store opened");
        Ok(store)
    }

    async fn destroy(&self, key: StoreKey) -> Result<()> {
        let guard = self.lock_key(key).await;

        // Evict first so no new caller picks up the handle being closed
        let handle = self.handles.write().await.remove(&key);
        if let Some(store) = handle {
            store.close().await;
        }

        let path = self.path_for(key);
        let [wal, shm] = sidecar_paths(&path);
        for file in [&path, &wal, &shm] {
            match tokio::fs::remove_file(file).await {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(store = %key, file = %file.display(), error = %e, "Failed to remove store file");
                    return Err(AppError::Storage(format!(
                        "Failed to remove {}: {}",
                        file.display(),
                        e
                    )));
                }
            }
        }

        // Drop the key lock unless another caller is already waiting on it
        // (one reference is the map entry, one is our guard)
        let mut locks = self.key_locks.lock().await;
        if locks.get(&key).is_some_and(|lock| Arc::strong_count(lock) == 2) {
            locks.remove(&key);
        }
        drop(locks);
        drop(guard);

        info!(store = %key, "Queue store destroyed");
        Ok(())
    }

    async fn list_provisioned(&self) -> Result<Vec<StoreKey>> {
        let mut keys = Vec::new();

        let mut workspaces = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(keys),
            Err(e) => return Err(e.into()),
        };

        while let Some(workspace) = workspaces.next_entry().await? {
            let Some(workspace_id) = parse_id(&workspace.file_name().to_string_lossy()) else {
                continue;
            };

            let queues_dir = workspace.path().join(QUEUES_DIR);
            let mut entries = match tokio::fs::read_dir(&queues_dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };

            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if path.extension().and_then(|ext| ext.to_str()) != Some(STORE_EXTENSION) {
                    continue;
                }
                let Some(queue_id) = path
                    .file_stem()
                    .and_then(|stem| stem.to_str())
                    .and_then(parse_id)
                else {
                    continue;
                };
                keys.push(StoreKey::new(workspace_id, queue_id));
            }
        }

        keys.sort();
        Ok(keys)
    }
}

fn parse_id(s: &str) -> Option<i64> {
    s.parse::<i64>().ok().filter(|id| *id > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use hookq_core::port::time_provider::SystemTimeProvider;
    use std::time::Duration;

    fn registry(dir: &tempfile::TempDir) -> SqliteStoreRegistry {
        SqliteStoreRegistry::new(dir.path(), Arc::new(SystemTimeProvider))
    }

    #[test]
    fn test_store_path_layout() {
        let path = store_path(Path::new("/srv/ws"), StoreKey::new(7, 42));
        assert_eq!(path, PathBuf::from("/srv/ws/7/queues/42.sqlite"));
    }

    #[tokio::test]
    async fn test_provision_then_open_shares_data() {
        let dir = tempfile::tempdir().unwrap();
        let reg = registry(&dir);
        let key = StoreKey::new(1, 5);

        let store = reg.provision(key).await.unwrap();
        store.enqueue(Bytes::from("hi"), Duration::ZERO).await.unwrap();
        assert!(reg.path_for(key).exists());

        // A fresh registry must find the file without provisioning
        let other = registry(&dir);
        let reopened = other.open(key).await.unwrap();
        assert_eq!(reopened.count().await.unwrap().visible, 1);
    }

    #[tokio::test]
    async fn test_provision_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let reg = registry(&dir);
        let key = StoreKey::new(1, 1);

        let store = reg.provision(key).await.unwrap();
        store.enqueue(Bytes::from("x"), Duration::ZERO).await.unwrap();
        let again = reg.provision(key).await.unwrap();
        assert_eq!(again.count().await.unwrap().total(), 1);
    }

    #[tokio::test]
    async fn test_open_missing_store_is_not_found_and_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let reg = registry(&dir);
        let key = StoreKey::new(3, 9);

        let err = reg.open(key).await.err().unwrap();
        assert!(err.is_not_found());
        assert!(!reg.path_for(key).exists());
    }

    #[tokio::test]
    async fn test_destroy_removes_files_and_blocks_open() {
        let dir = tempfile::tempdir().unwrap();
        let reg = registry(&dir);
        let key = StoreKey::new(2, 8);

        let store = reg.provision(key).await.unwrap();
        store.enqueue(Bytes::from("x"), Duration::ZERO).await.unwrap();
        reg.destroy(key).await.unwrap();

        let path = reg.path_for(key);
        assert!(!path.exists());
        for sidecar in sidecar_paths(&path) {
            assert!(!sidecar.exists());
        }
        assert!(reg.open(key).await.err().unwrap().is_not_found());

        // Destroying again is a no-op
        reg.destroy(key).await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_open_racing_destroy_never_caches_a_removed_store() {
        let dir = tempfile::tempdir().unwrap();
        let keys: Vec<_> = (1..=40).map(|id| StoreKey::new(1, id)).collect();
        {
            let setup = registry(&dir);
            for key in &keys {
                setup.provision(*key).await.unwrap();
            }
        }

        // Fresh registry: nothing cached, so every open goes to disk
        let reg = Arc::new(registry(&dir));
        for (i, key) in keys.iter().copied().enumerate() {
            let opener = {
                let reg = Arc::clone(&reg);
                tokio::spawn(async move { reg.open(key).await.map(|_| ()) })
            };
            tokio::time::sleep(Duration::from_micros((i % 5) as u64 * 100)).await;
            reg.destroy(key).await.unwrap();
            // The racing open either won (and its handle was evicted) or saw no file
            let _ = opener.await.unwrap();

            assert!(!reg.path_for(key).exists());
            assert!(reg.open(key).await.err().unwrap().is_not_found());
        }
    }

    #[tokio::test]
    async fn test_list_provisioned_ignores_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        let reg = registry(&dir);
        reg.provision(StoreKey::new(2, 4)).await.unwrap();
        reg.provision(StoreKey::new(1, 3)).await.unwrap();

        std::fs::create_dir_all(dir.path().join("notes/queues")).unwrap();
        std::fs::write(dir.path().join("notes/queues/1.sqlite"), b"").unwrap();
        std::fs::write(dir.path().join("1/queues/readme.txt"), b"").unwrap();

        assert_eq!(
            reg.list_provisioned().await.unwrap(),
            vec![StoreKey::new(1, 3), StoreKey::new(2, 4)]
        );
    }

    #[tokio::test]
    async fn test_list_provisioned_on_missing_root_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let reg = SqliteStoreRegistry::new(dir.path().join("absent"), Arc::new(SystemTimeProvider));
        assert!(reg.list_provisioned().await.unwrap().is_empty());
    }
}
