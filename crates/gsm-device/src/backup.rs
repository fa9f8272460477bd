use crate::{DeviceError, DeviceRepository, Result};
use chrono::{NaiveDate, SecondsFormat, Utc};
use gsm_storage::StorageKey;
use gsm_types::StorageData;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, warn};

/// 备份格式版本
pub const BACKUP_VERSION: &str = "1.0";

/// 备份文件内容
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupEnvelope {
    pub version: String,
    /// ISO-8601 UTC 时间
    pub timestamp: String,
    #[serde(flatten)]
    pub data: StorageData,
}

/// 备份服务
///
/// 通过设备仓库读写，与仓库使用同一份数据
pub struct BackupService {
    repository: Arc<DeviceRepository>,
}

impl BackupService {
    pub fn new(repository: Arc<DeviceRepository>) -> Self {
        Self { repository }
    }

    /// 导出完整数据为格式化 JSON
    pub async fn create_backup(&self) -> Result<String> {
        let envelope = BackupEnvelope {
            version: BACKUP_VERSION.to_string(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            data: self.repository.get_data().await,
        };

        serde_json::to_string_pretty(&envelope).map_err(|e| {
            error!(error = %e, "Failed to serialize backup");
            DeviceError::BackupFailed(e.to_string())
        })
    }

    /// 从备份恢复（整体替换）
    ///
    /// 先完整校验，校验失败不写入任何数据
    ///
    /// # 错误
    /// * `InvalidBackupFormat` - JSON 无法解析或结构不符
    /// * `PersistenceFailure` - 写入存储失败
    pub async fn restore_from_backup(&self, text: &str) -> Result<()> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| DeviceError::InvalidBackupFormat(format!("not valid JSON: {}", e)))?;

        if let Err(reason) = validate_shape(&value) {
            warn!(reason = %reason, "Rejected backup with invalid shape");
            return Err(DeviceError::InvalidBackupFormat(reason));
        }

        let envelope: BackupEnvelope = serde_json::from_value(value)
            .map_err(|e| DeviceError::InvalidBackupFormat(e.to_string()))?;

        if envelope.version != BACKUP_VERSION {
            warn!(version = %envelope.version, "Restoring backup with unexpected version");
        }

        self.repository.replace_all(envelope.data).await?;

        info!(
            version = %envelope.version,
            timestamp = %envelope.timestamp,
            "Backup restored"
        );
        Ok(())
    }

    /// 创建备份并保存为最近一次自动备份
    pub async fn checkpoint(&self) -> Result<String> {
        let text = self.create_backup().await?;
        self.repository
            .store()
            .set_text(StorageKey::LastBackup, &text)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to store backup checkpoint");
                DeviceError::BackupFailed(e.to_string())
            })?;
        Ok(text)
    }

    /// 最近一次自动备份
    pub async fn latest_checkpoint(&self) -> Option<String> {
        self.repository
            .store()
            .get_text(StorageKey::LastBackup)
            .await
    }
}

/// 备份文件名：`gsm-backup-YYYY-MM-DD.json`
pub fn backup_file_name(date: NaiveDate) -> String {
    format!("gsm-backup-{}.json", date.format("%Y-%m-%d"))
}

/// 校验备份的顶层结构
fn validate_shape(value: &Value) -> std::result::Result<(), String> {
    let root = value
        .as_object()
        .ok_or_else(|| "backup must be a JSON object".to_string())?;

    let require = |field: &str, ok: fn(&Value) -> bool, expected: &str| match root.get(field) {
        Some(v) if ok(v) => Ok(()),
        Some(_) => Err(format!("'{}' must be {}", field, expected)),
        None => Err(format!("'{}' is missing", field)),
    };

    require("version", Value::is_string, "a string")?;
    require("timestamp", Value::is_string, "a string")?;
    require("devices", Value::is_array, "an array")?;
    require("users", Value::is_array, "an array")?;
    require("logs", Value::is_object, "an object")?;
    require("settings", Value::is_object, "an object")?;

    let settings = &root["settings"];
    match settings.get("adminNumber") {
        Some(v) if v.is_string() => {}
        _ => return Err("'settings.adminNumber' must be a string".to_string()),
    }
    match settings.get("activeDeviceId") {
        Some(v) if v.is_null() || v.is_string() => {}
        _ => return Err("'settings.activeDeviceId' must be a string or null".to_string()),
    }
    match settings.get("completedSteps") {
        Some(v) if v.is_array() => {}
        _ => return Err("'settings.completedSteps' must be an array".to_string()),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gsm_storage::{JsonStore, MemoryStore};
    use gsm_types::DeviceDraft;

    async fn service() -> (BackupService, Arc<DeviceRepository>) {
        let repo = Arc::new(
            DeviceRepository::load(JsonStore::new(Arc::new(MemoryStore::new()))).await,
        );
        (BackupService::new(repo.clone()), repo)
    }

    #[test]
    fn test_backup_file_name() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(backup_file_name(date), "gsm-backup-2024-03-09.json");
    }

    #[test]
    fn test_validate_shape_messages() {
        let err = validate_shape(&serde_json::json!([])).unwrap_err();
        assert!(err.contains("object"));

        let err = validate_shape(&serde_json::json!({
            "version": "1.0", "timestamp": "t", "devices": [], "users": {},
            "logs": {}, "settings": {}
        }))
        .unwrap_err();
        assert_eq!(err, "'users' must be an array");
    }

    #[tokio::test]
    async fn test_backup_envelope_fields() {
        let (service, repo) = service().await;
        repo.add_device(DeviceDraft::new("Gate", "+1", "1234"))
            .await
            .unwrap();

        let text = service.create_backup().await.unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();

        assert_eq!(value["version"], "1.0");
        assert!(value["timestamp"].as_str().unwrap().ends_with('Z'));
        assert_eq!(value["devices"].as_array().unwrap().len(), 1);
        assert!(value["logs"].is_object());
        assert_eq!(value["settings"]["activeDeviceId"], Value::Null);
        // 格式化输出
        assert!(text.contains("\n  \"version\""));
    }

    #[tokio::test]
    async fn test_checkpoint_is_stored() {
        let (service, _) = service().await;
        assert!(service.latest_checkpoint().await.is_none());

        let text = service.checkpoint().await.unwrap();
        assert_eq!(service.latest_checkpoint().await.unwrap(), text);
    }

    #[tokio::test]
    async fn test_restore_accepts_numeric_ids() {
        let (service, repo) = service().await;
        let text = serde_json::json!({
            "version": "1.0",
            "timestamp": "2024-01-01T00:00:00.000Z",
            "devices": [{
                "id": 1700000000000u64,
                "name": "Old gate",
                "unitNumber": "+15550001111",
                "password": "1234",
                "relaySettings": "{\"accessControl\":\"ALL\",\"latchTime\":\"010\"}",
                "createdAt": "2023-11-14T22:13:20.000Z",
                "updatedAt": "2023-11-14T22:13:20.000Z"
            }],
            "users": [{
                "id": 1700000000500u64,
                "deviceId": 1700000000000u64,
                "name": "Ann",
                "phoneNumber": "+15551234567",
                "serialNumber": "07"
            }],
            "logs": {},
            "settings": {
                "adminNumber": "+1",
                "activeDeviceId": null,
                "completedSteps": []
            }
        })
        .to_string();

        service.restore_from_backup(&text).await.unwrap();

        let device = repo.get_device_by_id("1700000000000").await.unwrap();
        assert_eq!(device.relay_settings.latch_time.seconds(), 10);
        let users = repo.get_users("1700000000000").await;
        assert_eq!(users[0].id, "1700000000500");
    }

    #[tokio::test]
    async fn test_restore_rejects_invalid_json() {
        let (service, _) = service().await;
        let err = service.restore_from_backup("{oops").await.unwrap_err();
        assert!(matches!(err, DeviceError::InvalidBackupFormat(_)));
    }
}
