use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 短信发送入口 trait
///
/// 实现只负责把指令交给系统的短信编辑界面，不确认送达
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait SmsGateway: Send + Sync {
    /// 当前环境是否存在可用的短信入口
    async fn is_available(&self) -> bool;

    /// 把短信正文交给发送入口
    ///
    /// # 错误
    /// * `Unavailable` - 没有可用入口
    /// * `DispatchFailed` - 入口调用失败
    async fn dispatch(&self, recipient: &str, body: &str) -> Result<DispatchReceipt>;

    /// 入口类型
    fn gateway_type(&self) -> &'static str;
}

/// 发送回执
///
/// 回执只说明短信已交给编辑界面；设备是否收到并执行无法得知
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchReceipt {
    /// 接收方（设备 SIM 号码）
    pub recipient: String,
    /// 短信正文
    pub body: String,
    /// 交给系统的 `sms:` URI
    pub uri: String,
    pub dispatched_at: DateTime<Utc>,
    pub delivery: DeliveryStatus,
}

impl DispatchReceipt {
    pub fn new(recipient: &str, body: &str) -> Self {
        Self {
            recipient: recipient.to_string(),
            body: body.to_string(),
            uri: sms_uri(recipient, body),
            dispatched_at: Utc::now(),
            delivery: DeliveryStatus::Unconfirmed,
        }
    }
}

/// 送达状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    /// 已交给短信编辑界面；短信没有同步回执，送达与执行均未确认
    Unconfirmed,
}

/// 构造 `sms:{recipient}?body={percent-encoded body}`
pub fn sms_uri(recipient: &str, body: &str) -> String {
    format!("sms:{}?body={}", recipient, urlencoding::encode(body))
}
