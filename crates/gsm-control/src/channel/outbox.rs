use super::{DispatchReceipt, SmsGateway};
use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// 发件箱入口
///
/// 不调用任何系统界面，只记录组装好的短信；用于无界面环境和演练
#[derive(Clone, Default)]
pub struct OutboxGateway {
    sent: Arc<RwLock<Vec<DispatchReceipt>>>,
}

impl OutboxGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已记录的短信（按发送顺序）
    pub async fn sent(&self) -> Vec<DispatchReceipt> {
        self.sent.read().await.clone()
    }

    pub async fn clear(&self) {
        self.sent.write().await.clear();
    }
}

#[async_trait]
impl SmsGateway for OutboxGateway {
    async fn is_available(&self) -> bool {
        true
    }

    async fn dispatch(&self, recipient: &str, body: &str) -> Result<DispatchReceipt> {
        let receipt = DispatchReceipt::new(recipient, body);
        info!(recipient = %recipient, uri = %receipt.uri, "SMS recorded in outbox");
        self.sent.write().await.push(receipt.clone());
        Ok(receipt)
    }

    fn gateway_type(&self) -> &'static str {
        "outbox"
    }
}
