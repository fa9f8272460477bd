use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 应用配置
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub sms: SmsConfig,
    #[serde(default)]
    pub backup: BackupConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// 存储配置
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

/// 短信入口配置
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct SmsConfig {
    #[serde(default)]
    pub gateway: GatewayKind,

    /// 自定义 URI 打开程序，缺省时按平台选择
    #[serde(default)]
    pub opener: Option<String>,
}

/// 短信入口类型
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayKind {
    /// 通过 `sms:` URI 调起系统短信界面
    #[default]
    Uri,
    /// 只记录不发送
    Outbox,
}

/// 备份配置
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BackupConfig {
    /// 每次修改后自动保存备份
    #[serde(default = "default_true")]
    pub auto_checkpoint: bool,
}

/// 日志配置
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// 以 JSON 格式输出
    #[serde(default)]
    pub json: bool,
}

// 默认值函数
fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            auto_checkpoint: default_true(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
