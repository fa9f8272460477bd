use crate::TypeError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// 继电器控制器（GSM 门禁设备）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    /// 设备 ID（全局唯一）
    #[serde(deserialize_with = "crate::deserialize_id")]
    pub id: String,

    /// 设备名称
    pub name: String,

    /// 设备 SIM 卡号码（短信接收方）
    pub unit_number: String,

    /// 设备指令密码（每条短信指令的前缀）
    pub password: String,

    /// 继电器设置，落盘时编码为 JSON 字符串
    #[serde(with = "relay_settings_json")]
    pub relay_settings: RelaySettings,

    /// 创建时间
    pub created_at: DateTime<Utc>,

    /// 更新时间
    pub updated_at: DateTime<Utc>,
}

impl Device {
    /// 由草稿创建新设备，分配新 ID 与时间戳
    pub fn new(draft: DeviceDraft) -> Self {
        let now = Utc::now();
        Self {
            id: crate::generate_id("dev"),
            name: draft.name,
            unit_number: draft.unit_number,
            password: draft.password,
            relay_settings: draft.relay_settings,
            created_at: now,
            updated_at: now,
        }
    }

    /// 刷新更新时间，保证严格递增
    pub fn touch(&mut self) {
        let now = Utc::now();
        self.updated_at = if now > self.updated_at {
            now
        } else {
            self.updated_at + chrono::Duration::microseconds(1)
        };
    }
}

/// 新建设备所需字段
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDraft {
    pub name: String,
    pub unit_number: String,
    pub password: String,
    #[serde(default, with = "relay_settings_json")]
    pub relay_settings: RelaySettings,
}

impl DeviceDraft {
    pub fn new(
        name: impl Into<String>,
        unit_number: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            unit_number: unit_number.into(),
            password: password.into(),
            relay_settings: RelaySettings::default(),
        }
    }

    pub fn with_relay_settings(mut self, relay_settings: RelaySettings) -> Self {
        self.relay_settings = relay_settings;
        self
    }
}

/// 设备部分更新（浅合并，`None` 字段保持原值）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceUpdate {
    pub name: Option<String>,
    pub unit_number: Option<String>,
    pub password: Option<String>,
    pub relay_settings: Option<RelaySettings>,
}

impl DeviceUpdate {
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn relay_settings(relay_settings: RelaySettings) -> Self {
        Self {
            relay_settings: Some(relay_settings),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.unit_number.is_none()
            && self.password.is_none()
            && self.relay_settings.is_none()
    }

    /// 合并到已有设备上（不修改 `updated_at`）
    pub fn apply_to(self, device: &mut Device) {
        if let Some(name) = self.name {
            device.name = name;
        }
        if let Some(unit_number) = self.unit_number {
            device.unit_number = unit_number;
        }
        if let Some(password) = self.password {
            device.password = password;
        }
        if let Some(relay_settings) = self.relay_settings {
            device.relay_settings = relay_settings;
        }
    }
}

/// 继电器设置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RelaySettings {
    /// 门禁模式
    pub access_control: AccessControl,
    /// 锁存时间（秒）
    pub latch_time: LatchTime,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            access_control: AccessControl::Aut,
            latch_time: LatchTime::ZERO,
        }
    }
}

/// 门禁模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccessControl {
    /// 仅授权号码可控制
    #[serde(rename = "AUT")]
    Aut,
    /// 任意来电均可控制
    #[serde(rename = "ALL")]
    All,
}

impl AccessControl {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessControl::Aut => "AUT",
            AccessControl::All => "ALL",
        }
    }
}

impl FromStr for AccessControl {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AUT" => Ok(AccessControl::Aut),
            "ALL" => Ok(AccessControl::All),
            other => Err(TypeError::InvalidAccessControl(other.to_string())),
        }
    }
}

impl fmt::Display for AccessControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 锁存时间，0-999 秒，始终渲染为三位数字
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct LatchTime(u16);

impl LatchTime {
    pub const ZERO: LatchTime = LatchTime(0);
    pub const MAX_SECONDS: u64 = 999;

    pub fn from_seconds(seconds: u64) -> Result<Self, TypeError> {
        if seconds > Self::MAX_SECONDS {
            return Err(TypeError::LatchTimeOutOfRange(seconds));
        }
        Ok(LatchTime(seconds as u16))
    }

    pub fn seconds(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for LatchTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03}", self.0)
    }
}

/// 接受 `5`、`05`、`005` 形式的输入
impl FromStr for LatchTime {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let seconds: u64 = s
            .trim()
            .parse()
            .map_err(|_| TypeError::InvalidLatchTime(s.to_string()))?;
        LatchTime::from_seconds(seconds)
    }
}

impl Serialize for LatchTime {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for LatchTime {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Error;

        let raw = String::deserialize(deserializer)?;
        if raw.len() != 3 || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(D::Error::custom(TypeError::InvalidLatchTime(raw)));
        }
        raw.parse().map_err(D::Error::custom)
    }
}

// relaySettings 在存储与备份中以 JSON 字符串保存
mod relay_settings_json {
    use super::RelaySettings;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(settings: &RelaySettings, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let encoded = serde_json::to_string(settings).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&encoded)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<RelaySettings, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        serde_json::from_str(&encoded).map_err(serde::de::Error::custom)
    }
}
