use crate::{KeyValueStore, Result, StorageError, StorageKey};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

/// 带 JSON 编解码的键值存储
///
/// 读取时缺失或无法解析的值均视为 `None`；写入失败返回错误
#[derive(Clone)]
pub struct JsonStore {
    backend: Arc<dyn KeyValueStore>,
}

impl JsonStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Arc<dyn KeyValueStore> {
        &self.backend
    }

    /// 读取并解析 JSON 值
    pub async fn get<T: DeserializeOwned>(&self, key: StorageKey) -> Option<T> {
        let data = match self.backend.read(key).await {
            Ok(Some(data)) => data,
            Ok(None) => return None,
            Err(e) => {
                warn!(key = %key, error = %e, "Read failed, treating key as absent");
                return None;
            }
        };

        match serde_json::from_slice(&data) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key = %key, error = %e, "Stored value is not valid JSON, treating key as absent");
                None
            }
        }
    }

    /// 读取原始文本
    pub async fn get_text(&self, key: StorageKey) -> Option<String> {
        match self.backend.read(key).await {
            Ok(Some(data)) => String::from_utf8(data.to_vec()).ok(),
            Ok(None) => None,
            Err(e) => {
                warn!(key = %key, error = %e, "Read failed, treating key as absent");
                None
            }
        }
    }

    /// 序列化并写入
    pub async fn set<T: Serialize + ?Sized>(&self, key: StorageKey, value: &T) -> Result<()> {
        let data = serde_json::to_vec(value).map_err(|source| StorageError::Serialization {
            key: key.as_str().to_string(),
            source,
        })?;
        self.backend.write(key, &data).await
    }

    /// 写入原始文本
    pub async fn set_text(&self, key: StorageKey, text: &str) -> Result<()> {
        self.backend.write(key, text.as_bytes()).await
    }

    pub async fn remove(&self, key: StorageKey) -> Result<()> {
        self.backend.remove(key).await
    }

    pub async fn clear(&self) -> Result<()> {
        self.backend.clear().await
    }
}
