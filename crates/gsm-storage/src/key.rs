use std::fmt;

/// 固定的存储键集合
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StorageKey {
    /// 聚合快照（设备、用户、日志、设置）
    AppData,
    /// 旧版分键布局：设备列表
    Devices,
    /// 旧版分键布局：授权用户
    Users,
    /// 旧版分键布局：日志
    Logs,
    /// 旧版分键布局：全局设置
    Settings,
    /// 最近一次自动备份
    LastBackup,
}

impl StorageKey {
    pub const ALL: [StorageKey; 6] = [
        StorageKey::AppData,
        StorageKey::Devices,
        StorageKey::Users,
        StorageKey::Logs,
        StorageKey::Settings,
        StorageKey::LastBackup,
    ];

    /// 旧版分键布局使用的键
    pub const LEGACY: [StorageKey; 4] = [
        StorageKey::Devices,
        StorageKey::Users,
        StorageKey::Logs,
        StorageKey::Settings,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKey::AppData => "app_data",
            StorageKey::Devices => "devices",
            StorageKey::Users => "users",
            StorageKey::Logs => "logs",
            StorageKey::Settings => "settings",
            StorageKey::LastBackup => "last_backup",
        }
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
