use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 授权用户（可远程控制某台设备继电器的号码）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizedUser {
    #[serde(deserialize_with = "crate::deserialize_id")]
    pub id: String,
    /// 所属设备 ID
    #[serde(deserialize_with = "crate::deserialize_id")]
    pub device_id: String,
    pub name: String,
    pub phone_number: String,
    /// 设备内的用户序号（如 `07`）
    pub serial_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
}

impl AuthorizedUser {
    pub fn new(draft: UserDraft) -> Self {
        Self {
            id: crate::generate_id("usr"),
            device_id: draft.device_id,
            name: draft.name,
            phone_number: draft.phone_number,
            serial_number: draft.serial_number,
            start_time: draft.start_time,
            end_time: draft.end_time,
        }
    }
}

/// 新建授权用户所需字段
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDraft {
    pub device_id: String,
    pub name: String,
    pub phone_number: String,
    pub serial_number: String,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
}

impl UserDraft {
    pub fn new(
        device_id: impl Into<String>,
        name: impl Into<String>,
        phone_number: impl Into<String>,
        serial_number: impl Into<String>,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            name: name.into(),
            phone_number: phone_number.into(),
            serial_number: serial_number.into(),
            start_time: None,
            end_time: None,
        }
    }
}
