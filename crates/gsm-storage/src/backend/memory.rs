use super::{KeyValueStore, StoreStats};
use crate::{Result, StorageError, StorageKey};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

/// 内存键值存储
///
/// 用于测试与临时运行；可切换为写入失败模式以模拟存储故障
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<StorageKey, Bytes>>>,
    fail_writes: Arc<AtomicBool>,
    write_count: Arc<AtomicU64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 开启或关闭写入失败模式
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// 当前保存的键
    pub fn keys(&self) -> Vec<StorageKey> {
        let mut keys: Vec<StorageKey> = self
            .entries
            .read()
            .map(|entries| entries.keys().copied().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }

    fn check_writable(&self, key: StorageKey) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable(format!(
                "write to '{}' rejected",
                key
            )));
        }
        Ok(())
    }

    fn poisoned(key: StorageKey) -> StorageError {
        StorageError::Unavailable(format!("memory store lock poisoned on '{}'", key))
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn read(&self, key: StorageKey) -> Result<Option<Bytes>> {
        let entries = self.entries.read().map_err(|_| Self::poisoned(key))?;
        Ok(entries.get(&key).cloned())
    }

    async fn write(&self, key: StorageKey, data: &[u8]) -> Result<()> {
        self.check_writable(key)?;
        let mut entries = self.entries.write().map_err(|_| Self::poisoned(key))?;
        entries.insert(key, Bytes::copy_from_slice(data));
        self.write_count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn remove(&self, key: StorageKey) -> Result<()> {
        self.check_writable(key)?;
        let mut entries = self.entries.write().map_err(|_| Self::poisoned(key))?;
        entries.remove(&key);
        Ok(())
    }

    fn backend_type(&self) -> &str {
        "memory"
    }

    fn stats(&self) -> StoreStats {
        StoreStats {
            write_count: self.write_count.load(Ordering::Relaxed),
            ..StoreStats::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_fail_writes() {
        let store = MemoryStore::new();
        store.write(StorageKey::Users, b"[]").await.unwrap();

        store.set_fail_writes(true);
        let err = store.write(StorageKey::Users, b"[1]").await.unwrap_err();
        assert!(matches!(err, StorageError::Unavailable(_)));

        // 失败的写入不影响已有数据
        let data = store.read(StorageKey::Users).await.unwrap().unwrap();
        assert_eq!(&data[..], b"[]");
        assert_eq!(store.keys(), vec![StorageKey::Users]);
    }
}
