use super::{KeyValueStore, StoreStats};
use crate::{Result, StorageError, StorageKey};
use async_trait::async_trait;
use bytes::Bytes;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, error};
use uuid::Uuid;

/// 本地文件系统键值存储
///
/// 每个键对应 `<data_dir>/<key>.json`，写入先落到临时文件再原子重命名
pub struct LocalStore {
    /// 数据目录
    data_dir: PathBuf,

    /// 统计信息
    stats: Arc<LocalStoreStats>,
}

struct LocalStoreStats {
    read_count: AtomicU64,
    write_count: AtomicU64,
    delete_count: AtomicU64,
    bytes_written: AtomicU64,
}

impl LocalStore {
    /// 创建新的本地存储
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            stats: Arc::new(LocalStoreStats {
                read_count: AtomicU64::new(0),
                write_count: AtomicU64::new(0),
                delete_count: AtomicU64::new(0),
                bytes_written: AtomicU64::new(0),
            }),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// 解析键对应的文件路径
    fn resolve_path(&self, key: StorageKey) -> PathBuf {
        self.data_dir.join(format!("{}.json", key.as_str()))
    }

    async fn ensure_data_dir(&self, key: StorageKey) -> Result<()> {
        if !self.data_dir.exists() {
            fs::create_dir_all(&self.data_dir)
                .await
                .map_err(|e| StorageError::io(key.as_str(), e))?;
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for LocalStore {
    async fn read(&self, key: StorageKey) -> Result<Option<Bytes>> {
        let path = self.resolve_path(key);

        match fs::read(&path).await {
            Ok(data) => {
                self.stats.read_count.fetch_add(1, Ordering::Relaxed);
                debug!(key = %key, size = data.len(), "Key read from local store");
                Ok(Some(Bytes::from(data)))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(key = %key, "Key not present in local store");
                Ok(None)
            }
            Err(e) => {
                error!(key = %key, error = %e, "Failed to read key");
                Err(StorageError::io(key.as_str(), e))
            }
        }
    }

    async fn write(&self, key: StorageKey, data: &[u8]) -> Result<()> {
        self.ensure_data_dir(key).await?;

        let path = self.resolve_path(key);
        // 每次写入使用独立的临时文件，并发写同一个键时互不覆盖
        let tmp_path = path.with_extension(format!("json.{}.tmp", Uuid::new_v4().simple()));

        let result = async {
            fs::write(&tmp_path, data).await?;
            fs::rename(&tmp_path, &path).await
        }
        .await;

        match result {
            Ok(()) => {
                self.stats.write_count.fetch_add(1, Ordering::Relaxed);
                self.stats
                    .bytes_written
                    .fetch_add(data.len() as u64, Ordering::Relaxed);
                debug!(key = %key, size = data.len(), "Key written to local store");
                Ok(())
            }
            Err(e) => {
                error!(key = %key, error = %e, "Failed to write key");
                // 临时文件可能残留，忽略清理失败
                let _ = fs::remove_file(&tmp_path).await;
                Err(StorageError::io(key.as_str(), e))
            }
        }
    }

    async fn remove(&self, key: StorageKey) -> Result<()> {
        let path = self.resolve_path(key);

        match fs::remove_file(&path).await {
            Ok(()) => {
                self.stats.delete_count.fetch_add(1, Ordering::Relaxed);
                debug!(key = %key, "Key removed from local store");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => {
                error!(key = %key, error = %e, "Failed to remove key");
                Err(StorageError::io(key.as_str(), e))
            }
        }
    }

    async fn exists(&self, key: StorageKey) -> Result<bool> {
        Ok(self.resolve_path(key).exists())
    }

    fn backend_type(&self) -> &str {
        "local"
    }

    fn stats(&self) -> StoreStats {
        StoreStats {
            read_count: self.stats.read_count.load(Ordering::Relaxed),
            write_count: self.stats.write_count.load(Ordering::Relaxed),
            delete_count: self.stats.delete_count.load(Ordering::Relaxed),
            bytes_written: self.stats.bytes_written.load(Ordering::Relaxed),
        }
    }
}

impl Clone for LocalStore {
    fn clone(&self) -> Self {
        Self {
            data_dir: self.data_dir.clone(),
            stats: Arc::clone(&self.stats),
        }
    }
}
