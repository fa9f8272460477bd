use crate::{CommandError, Result};
use gsm_types::{AccessControl, LatchTime};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// 短信指令（已完成参数校验）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum SmsCommand {
    /// 开闸
    Open,

    /// 关闸
    Close,

    /// 查询状态
    Status,

    /// 添加授权号码
    #[serde(rename_all = "camelCase")]
    AddUser {
        phone_number: String,
        serial_number: String,
    },

    /// 删除授权号码
    #[serde(rename_all = "camelCase")]
    DeleteUser { serial_number: String },

    /// 设置锁存时间
    SetLatchTime { seconds: LatchTime },

    /// 设置门禁模式
    SetAccessControl { mode: AccessControl },
}

impl SmsCommand {
    /// 由动作和松散参数解析出指令
    ///
    /// # 错误
    /// * `MissingParameter` - 参数缺失或类型不符
    /// * `InvalidArgument` - 参数值超出取值范围
    pub fn from_action(action: CommandAction, params: &CommandParams) -> Result<Self> {
        let command = match action {
            CommandAction::Open => SmsCommand::Open,
            CommandAction::Close => SmsCommand::Close,
            CommandAction::Status => SmsCommand::Status,
            CommandAction::AddUser => SmsCommand::AddUser {
                phone_number: params.require(CommandParams::PHONE_NUMBER)?,
                serial_number: params.require(CommandParams::SERIAL_NUMBER)?,
            },
            CommandAction::DeleteUser => SmsCommand::DeleteUser {
                serial_number: params.require(CommandParams::SERIAL_NUMBER)?,
            },
            CommandAction::SetLatchTime => {
                let seconds: u64 = params.require(CommandParams::SECONDS)?;
                SmsCommand::SetLatchTime {
                    seconds: LatchTime::from_seconds(seconds)?,
                }
            }
            CommandAction::SetAccessControl => {
                let mode: String = params.require(CommandParams::MODE)?;
                SmsCommand::SetAccessControl {
                    mode: mode.parse()?,
                }
            }
        };
        Ok(command)
    }

    pub fn action(&self) -> CommandAction {
        match self {
            SmsCommand::Open => CommandAction::Open,
            SmsCommand::Close => CommandAction::Close,
            SmsCommand::Status => CommandAction::Status,
            SmsCommand::AddUser { .. } => CommandAction::AddUser,
            SmsCommand::DeleteUser { .. } => CommandAction::DeleteUser,
            SmsCommand::SetLatchTime { .. } => CommandAction::SetLatchTime,
            SmsCommand::SetAccessControl { .. } => CommandAction::SetAccessControl,
        }
    }

    /// 按设备密码编码为短信正文
    pub fn encode(&self, password: &str) -> String {
        match self {
            SmsCommand::Open => format!("{}CC", password),
            SmsCommand::Close => format!("{}DD", password),
            SmsCommand::Status => format!("{}EE", password),
            SmsCommand::AddUser {
                phone_number,
                serial_number,
            } => format!("{}A{}#{}#", password, serial_number, phone_number),
            SmsCommand::DeleteUser { serial_number } => {
                format!("{}A{}##", password, serial_number)
            }
            SmsCommand::SetLatchTime { seconds } => format!("{}GOT{}#", password, seconds),
            SmsCommand::SetAccessControl { mode } => format!("{}{}", password, mode),
        }
    }

    /// 日志中使用的描述
    pub fn log_details(&self) -> String {
        match self {
            SmsCommand::Open => "Gate open command sent".to_string(),
            SmsCommand::Close => "Gate close command sent".to_string(),
            SmsCommand::Status => "Device status check requested".to_string(),
            SmsCommand::AddUser {
                phone_number,
                serial_number,
            } => format!("User {} added at slot {}", phone_number, serial_number),
            SmsCommand::DeleteUser { serial_number } => {
                format!("User at slot {} removed", serial_number)
            }
            SmsCommand::SetLatchTime { seconds } => {
                format!("Latch time set to {} seconds", seconds.seconds())
            }
            SmsCommand::SetAccessControl { mode } => format!("Access control set to {}", mode),
        }
    }
}

/// 指令动作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CommandAction {
    Open,
    Close,
    Status,
    AddUser,
    DeleteUser,
    SetLatchTime,
    SetAccessControl,
}

impl CommandAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandAction::Open => "open",
            CommandAction::Close => "close",
            CommandAction::Status => "status",
            CommandAction::AddUser => "addUser",
            CommandAction::DeleteUser => "deleteUser",
            CommandAction::SetLatchTime => "setLatchTime",
            CommandAction::SetAccessControl => "setAccessControl",
        }
    }

    /// 日志中使用的动作名
    pub fn log_action(&self) -> &'static str {
        match self {
            CommandAction::Open => "Gate Open",
            CommandAction::Close => "Gate Close",
            CommandAction::Status => "Status Check",
            CommandAction::AddUser => "Add User",
            CommandAction::DeleteUser => "Delete User",
            CommandAction::SetLatchTime => "Set Latch Time",
            CommandAction::SetAccessControl => "Set Access Control",
        }
    }
}

impl FromStr for CommandAction {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "open" => Ok(CommandAction::Open),
            "close" => Ok(CommandAction::Close),
            "status" => Ok(CommandAction::Status),
            "addUser" => Ok(CommandAction::AddUser),
            "deleteUser" => Ok(CommandAction::DeleteUser),
            "setLatchTime" => Ok(CommandAction::SetLatchTime),
            "setAccessControl" => Ok(CommandAction::SetAccessControl),
            other => Err(CommandError::InvalidArgument(format!(
                "Invalid command action: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for CommandAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 指令参数（松散类型，来自界面或命令行）
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CommandParams {
    #[serde(flatten)]
    pub data: HashMap<String, serde_json::Value>,
}

impl CommandParams {
    pub const SECONDS: &'static str = "seconds";
    pub const MODE: &'static str = "mode";
    pub const PHONE_NUMBER: &'static str = "phoneNumber";
    pub const SERIAL_NUMBER: &'static str = "serialNumber";

    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
        }
    }

    pub fn insert<T: Serialize>(&mut self, key: &str, value: T) -> serde_json::Result<()> {
        self.data.insert(key.to_string(), serde_json::to_value(value)?);
        Ok(())
    }

    /// 读取参数，缺失时返回 `Ok(None)`
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> serde_json::Result<Option<T>> {
        match self.data.get(key) {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }

    /// 读取必需参数，缺失或类型不符均返回 `MissingParameter`
    pub fn require<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        match self.get(key) {
            Ok(Some(value)) => Ok(value),
            Ok(None) => Err(CommandError::MissingParameter(format!("{} is required", key))),
            Err(e) => Err(CommandError::MissingParameter(format!(
                "{} has the wrong type: {}",
                key, e
            ))),
        }
    }

    pub fn with_seconds(mut self, seconds: u64) -> Self {
        self.data
            .insert(Self::SECONDS.to_string(), serde_json::Value::from(seconds));
        self
    }

    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.data
            .insert(Self::MODE.to_string(), serde_json::Value::String(mode.into()));
        self
    }

    pub fn with_phone_number(mut self, phone_number: impl Into<String>) -> Self {
        self.data.insert(
            Self::PHONE_NUMBER.to_string(),
            serde_json::Value::String(phone_number.into()),
        );
        self
    }

    pub fn with_serial_number(mut self, serial_number: impl Into<String>) -> Self {
        self.data.insert(
            Self::SERIAL_NUMBER.to_string(),
            serde_json::Value::String(serial_number.into()),
        );
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_grammar() {
        let pw = "1234";
        assert_eq!(SmsCommand::Open.encode(pw), "1234CC");
        assert_eq!(SmsCommand::Close.encode(pw), "1234DD");
        assert_eq!(SmsCommand::Status.encode(pw), "1234EE");
        assert_eq!(
            SmsCommand::DeleteUser {
                serial_number: "07".to_string()
            }
            .encode(pw),
            "1234A07##"
        );
        assert_eq!(
            SmsCommand::SetAccessControl {
                mode: AccessControl::All
            }
            .encode(pw),
            "1234ALL"
        );
    }

    #[test]
    fn test_from_action_latch_time() {
        let params = CommandParams::new().with_seconds(45);
        let cmd = SmsCommand::from_action(CommandAction::SetLatchTime, &params).unwrap();
        assert_eq!(cmd.encode("0000"), "0000GOT045#");
        assert_eq!(cmd.log_details(), "Latch time set to 45 seconds");
    }

    #[test]
    fn test_from_action_missing_or_wrong_type() {
        let err = SmsCommand::from_action(CommandAction::SetLatchTime, &CommandParams::new())
            .unwrap_err();
        assert!(matches!(err, CommandError::MissingParameter(_)));

        let mut params = CommandParams::new();
        params.insert(CommandParams::SECONDS, "ten").unwrap();
        let err = SmsCommand::from_action(CommandAction::SetLatchTime, &params).unwrap_err();
        assert!(matches!(err, CommandError::MissingParameter(_)));

        let mut params = CommandParams::new();
        params.insert(CommandParams::MODE, 3).unwrap();
        let err = SmsCommand::from_action(CommandAction::SetAccessControl, &params).unwrap_err();
        assert!(matches!(err, CommandError::MissingParameter(_)));
    }

    #[test]
    fn test_from_action_invalid_values() {
        let params = CommandParams::new().with_mode("XXX");
        let err = SmsCommand::from_action(CommandAction::SetAccessControl, &params).unwrap_err();
        assert!(matches!(err, CommandError::InvalidArgument(_)));

        let params = CommandParams::new().with_seconds(1000);
        let err = SmsCommand::from_action(CommandAction::SetLatchTime, &params).unwrap_err();
        assert!(matches!(err, CommandError::InvalidArgument(_)));
    }

    #[test]
    fn test_action_parsing() {
        assert_eq!(
            "setAccessControl".parse::<CommandAction>().unwrap(),
            CommandAction::SetAccessControl
        );
        assert!("reboot".parse::<CommandAction>().is_err());
        assert_eq!(CommandAction::Open.log_action(), "Gate Open");
    }
}
