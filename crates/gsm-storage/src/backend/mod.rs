use crate::{Result, StorageKey};
use async_trait::async_trait;
use bytes::Bytes;

pub mod local;
pub mod memory;

pub use local::LocalStore;
pub use memory::MemoryStore;

/// 持久化键值存储抽象 trait
///
/// 每个键保存一个独立的数据块，多个键之间没有事务保证
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// 读取键对应的数据，键不存在时返回 `None`
    async fn read(&self, key: StorageKey) -> Result<Option<Bytes>>;

    /// 写入数据（整体覆盖）
    async fn write(&self, key: StorageKey, data: &[u8]) -> Result<()>;

    /// 删除键，键不存在时视为成功
    async fn remove(&self, key: StorageKey) -> Result<()>;

    /// 清空所有已知键
    async fn clear(&self) -> Result<()> {
        for key in StorageKey::ALL {
            self.remove(key).await?;
        }
        Ok(())
    }

    /// 检查键是否存在
    async fn exists(&self, key: StorageKey) -> Result<bool> {
        Ok(self.read(key).await?.is_some())
    }

    /// 获取后端类型
    fn backend_type(&self) -> &str;

    /// 获取后端统计信息
    fn stats(&self) -> StoreStats {
        StoreStats::default()
    }
}

/// 后端统计信息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// 总读取次数
    pub read_count: u64,

    /// 总写入次数
    pub write_count: u64,

    /// 总删除次数
    pub delete_count: u64,

    /// 总写入字节数
    pub bytes_written: u64,
}
