use gsm_types::TypeError;
use thiserror::Error;

/// 指令编码与发送错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// 参数值不合法（调用方违约）
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// 缺少必需参数或参数类型错误
    #[error("Missing parameter: {0}")]
    MissingParameter(String),

    /// 当前环境没有可用的短信发送入口
    #[error("SMS functionality not available: {0}")]
    Unavailable(String),

    /// 已找到发送入口但调用失败
    #[error("Failed to hand off SMS: {0}")]
    DispatchFailed(String),
}

pub type Result<T> = std::result::Result<T, CommandError>;

impl From<TypeError> for CommandError {
    fn from(err: TypeError) -> Self {
        CommandError::InvalidArgument(err.to_string())
    }
}
