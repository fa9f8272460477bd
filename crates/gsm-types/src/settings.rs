use crate::{AuthorizedUser, Device, DeviceLog};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 全局设置（单例）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// 管理员手机号
    pub admin_number: String,
    /// 当前选中的设备
    pub active_device_id: Option<String>,
    /// 已完成的引导步骤
    pub completed_steps: Vec<String>,
}

/// 完整持久化状态
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageData {
    pub devices: Vec<Device>,
    pub users: Vec<AuthorizedUser>,
    /// 按设备 ID 分组的日志
    pub logs: BTreeMap<String, Vec<DeviceLog>>,
    pub settings: Settings,
}

impl StorageData {
    pub fn device(&self, device_id: &str) -> Option<&Device> {
        self.devices.iter().find(|d| d.id == device_id)
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.devices.iter().any(|d| d.id == id) || self.users.iter().any(|u| u.id == id)
    }
}
