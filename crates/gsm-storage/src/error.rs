use thiserror::Error;

/// 存储错误类型
#[derive(Error, Debug)]
pub enum StorageError {
    /// 文件读写错误
    #[error("Storage I/O error on key '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// 序列化错误
    #[error("Serialization error on key '{key}': {source}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// 后端拒绝写入
    #[error("Storage backend unavailable: {0}")]
    Unavailable(String),
}

/// 存储结果类型
pub type Result<T> = std::result::Result<T, StorageError>;

impl StorageError {
    pub fn io(key: impl Into<String>, source: std::io::Error) -> Self {
        StorageError::Io {
            key: key.into(),
            source,
        }
    }
}
