//! 按设备生成短信指令正文
//!
//! 所有指令均以设备密码为前缀，编码为固定格式的 ASCII 文本。

use super::model::SmsCommand;
use crate::Result;
use gsm_types::{AccessControl, Device, LatchTime};

/// 开闸：`{password}CC`
pub fn generate_access_code(device: &Device) -> String {
    SmsCommand::Open.encode(&device.password)
}

/// 关闸：`{password}DD`
pub fn generate_close(device: &Device) -> String {
    SmsCommand::Close.encode(&device.password)
}

/// 状态查询：`{password}EE`
pub fn generate_status_check(device: &Device) -> String {
    SmsCommand::Status.encode(&device.password)
}

/// 添加授权号码：`{password}A{serial}#{phone}#`
pub fn generate_add_user(device: &Device, phone_number: &str, serial_number: &str) -> String {
    SmsCommand::AddUser {
        phone_number: phone_number.to_string(),
        serial_number: serial_number.to_string(),
    }
    .encode(&device.password)
}

/// 删除授权号码：`{password}A{serial}##`
pub fn generate_delete_user(device: &Device, serial_number: &str) -> String {
    SmsCommand::DeleteUser {
        serial_number: serial_number.to_string(),
    }
    .encode(&device.password)
}

/// 设置锁存时间：`{password}GOT{seconds:03}#`
///
/// # 错误
/// * `InvalidArgument` - 秒数超过 999，无法用三位数表示
pub fn generate_set_latch_time(device: &Device, seconds: u64) -> Result<String> {
    let seconds = LatchTime::from_seconds(seconds)?;
    Ok(SmsCommand::SetLatchTime { seconds }.encode(&device.password))
}

/// 设置门禁模式：`{password}{mode}`
pub fn generate_set_access_control(device: &Device, mode: AccessControl) -> String {
    SmsCommand::SetAccessControl { mode }.encode(&device.password)
}
