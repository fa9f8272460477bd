use thiserror::Error;

/// 数据模型校验错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TypeError {
    /// 门禁模式无效（仅支持 AUT / ALL）
    #[error("Invalid access control mode: {0}")]
    InvalidAccessControl(String),

    /// 锁存时间超出三位数范围
    #[error("Latch time out of range (0-999 seconds): {0}")]
    LatchTimeOutOfRange(u64),

    /// 锁存时间格式无效
    #[error("Invalid latch time: {0}")]
    InvalidLatchTime(String),
}
