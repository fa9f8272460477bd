use gsm_control::CommandError;
use gsm_storage::StorageError;
use std::fmt;
use thiserror::Error;

/// 设备管理错误类型
#[derive(Error, Debug)]
pub enum DeviceError {
    /// 设备或用户未找到
    #[error("Device not found: {0}")]
    NotFound(String),

    /// 参数值不合法
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// 缺少必需参数
    #[error("Missing parameter: {0}")]
    MissingParameter(String),

    /// 备份文件格式无效
    #[error("Invalid backup format: {0}")]
    InvalidBackupFormat(String),

    /// 没有可用的短信入口
    #[error("SMS functionality not available: {0}")]
    Unavailable(String),

    /// 短信入口调用失败
    #[error("SMS dispatch failed: {0}")]
    DispatchFailed(String),

    /// 持久化失败（内存中的修改已生效）
    #[error("Persistence failure: {0}")]
    PersistenceFailure(#[from] StorageError),

    /// 创建备份失败
    #[error("Failed to create backup: {0}")]
    BackupFailed(String),

    /// 组合操作在主修改提交后的某一步失败
    #[error("Device {device_id} was changed but step '{step}' failed: {source}")]
    Incomplete {
        device_id: String,
        step: SagaStep,
        #[source]
        source: Box<DeviceError>,
    },
}

/// 设备管理结果类型
pub type Result<T> = std::result::Result<T, DeviceError>;

impl DeviceError {
    pub fn incomplete(device_id: impl Into<String>, step: SagaStep, source: DeviceError) -> Self {
        DeviceError::Incomplete {
            device_id: device_id.into(),
            step,
            source: Box::new(source),
        }
    }

    /// 取出最内层错误（跳过 `Incomplete` 包装）
    pub fn root(&self) -> &DeviceError {
        match self {
            DeviceError::Incomplete { source, .. } => source.root(),
            other => other,
        }
    }
}

impl From<CommandError> for DeviceError {
    fn from(err: CommandError) -> Self {
        match err {
            CommandError::InvalidArgument(msg) => DeviceError::InvalidArgument(msg),
            CommandError::MissingParameter(msg) => DeviceError::MissingParameter(msg),
            CommandError::Unavailable(msg) => DeviceError::Unavailable(msg),
            CommandError::DispatchFailed(msg) => DeviceError::DispatchFailed(msg),
        }
    }
}

/// 组合操作中主修改之后的步骤
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SagaStep {
    /// 写入自动备份
    Backup,
    /// 追加操作日志
    Log,
    /// 向设备推送门禁模式
    PushAccessControl,
    /// 向设备推送锁存时间
    PushLatchTime,
    /// 向设备推送授权用户变更
    PushUser,
}

impl fmt::Display for SagaStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SagaStep::Backup => "backup",
            SagaStep::Log => "log",
            SagaStep::PushAccessControl => "push access control",
            SagaStep::PushLatchTime => "push latch time",
            SagaStep::PushUser => "push user",
        };
        f.write_str(name)
    }
}
