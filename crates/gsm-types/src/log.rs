use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 设备操作日志（只追加）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceLog {
    #[serde(deserialize_with = "crate::deserialize_id")]
    pub id: String,
    #[serde(deserialize_with = "crate::deserialize_id")]
    pub device_id: String,
    pub timestamp: DateTime<Utc>,
    /// 操作名称（如 `Gate Open`）
    pub action: String,
    pub details: String,
    pub success: bool,
    pub category: LogCategory,
}

impl DeviceLog {
    pub fn new(
        device_id: impl Into<String>,
        action: impl Into<String>,
        details: impl Into<String>,
        success: bool,
        category: LogCategory,
    ) -> Self {
        Self {
            id: crate::generate_id("log"),
            device_id: device_id.into(),
            timestamp: Utc::now(),
            action: action.into(),
            details: details.into(),
            success,
            category,
        }
    }
}

/// 日志分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogCategory {
    /// 系统事件（设备创建等）
    System,
    /// 设置变更
    Settings,
    /// 继电器指令
    Relay,
    /// 授权用户变更
    Users,
}

impl LogCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogCategory::System => "system",
            LogCategory::Settings => "settings",
            LogCategory::Relay => "relay",
            LogCategory::Users => "users",
        }
    }
}

impl fmt::Display for LogCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
