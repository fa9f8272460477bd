use crate::{DeviceError, Result};
use gsm_storage::{JsonStore, StorageKey};
use gsm_types::{
    AuthorizedUser, Device, DeviceDraft, DeviceLog, DeviceUpdate, LogCategory, Settings,
    StorageData, UserDraft,
};
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

/// 设备仓库
///
/// 持有完整状态的内存快照，每次修改后立即把整个快照写入 `app_data` 键。
/// 写入失败时内存中的修改保留，错误返回给调用方。
pub struct DeviceRepository {
    /// 底层存储
    store: JsonStore,

    /// 内存快照
    data: RwLock<StorageData>,
}

impl DeviceRepository {
    /// 从存储加载仓库
    ///
    /// 依次尝试聚合键 `app_data`、旧版分键布局，都不存在时使用空状态
    pub async fn load(store: JsonStore) -> Self {
        let data = Self::load_snapshot(&store).await;
        info!(
            devices = data.devices.len(),
            users = data.users.len(),
            "Device repository loaded"
        );
        Self {
            store,
            data: RwLock::new(data),
        }
    }

    async fn load_snapshot(store: &JsonStore) -> StorageData {
        if let Some(data) = store.get::<StorageData>(StorageKey::AppData).await {
            return data;
        }

        let mut has_legacy = false;
        for key in StorageKey::LEGACY {
            if store.backend().exists(key).await.unwrap_or(false) {
                has_legacy = true;
                break;
            }
        }
        if !has_legacy {
            debug!("No stored snapshot found, starting empty");
            return StorageData::default();
        }

        warn!("Aggregate snapshot missing, assembling state from legacy keys");
        let devices = store.get::<Vec<Device>>(StorageKey::Devices).await;
        let users = store.get::<Vec<AuthorizedUser>>(StorageKey::Users).await;
        let logs = store
            .get::<BTreeMap<String, Vec<DeviceLog>>>(StorageKey::Logs)
            .await;
        let settings = store.get::<Settings>(StorageKey::Settings).await;
        StorageData {
            devices: devices.unwrap_or_default(),
            users: users.unwrap_or_default(),
            logs: logs.unwrap_or_default(),
            settings: settings.unwrap_or_default(),
        }
    }

    /// 底层存储
    pub fn store(&self) -> &JsonStore {
        &self.store
    }

    async fn persist(&self, data: &StorageData) -> Result<()> {
        self.store
            .set(StorageKey::AppData, data)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to persist device repository snapshot");
                DeviceError::PersistenceFailure(e)
            })
    }

    // ========== 查询 ==========

    /// 完整快照副本
    pub async fn get_data(&self) -> StorageData {
        self.data.read().await.clone()
    }

    /// 设备列表副本
    pub async fn get_devices(&self) -> Vec<Device> {
        self.data.read().await.devices.clone()
    }

    /// 按 ID 查询设备
    pub async fn get_device_by_id(&self, device_id: &str) -> Option<Device> {
        let device = self.data.read().await.device(device_id).cloned();
        if device.is_none() {
            debug!(device_id = %device_id, "Device not found");
        }
        device
    }

    /// 当前选中的设备
    pub async fn active_device(&self) -> Option<Device> {
        let data = self.data.read().await;
        data.settings
            .active_device_id
            .as_deref()
            .and_then(|id| data.device(id))
            .cloned()
    }

    pub async fn get_settings(&self) -> Settings {
        self.data.read().await.settings.clone()
    }

    /// 设备的授权用户
    pub async fn get_users(&self, device_id: &str) -> Vec<AuthorizedUser> {
        self.data
            .read()
            .await
            .users
            .iter()
            .filter(|u| u.device_id == device_id)
            .cloned()
            .collect()
    }

    /// 设备日志（按时间先后）
    pub async fn get_device_logs(&self, device_id: &str) -> Vec<DeviceLog> {
        self.data
            .read()
            .await
            .logs
            .get(device_id)
            .cloned()
            .unwrap_or_default()
    }

    // ========== 设备 ==========

    /// 添加设备
    ///
    /// 分配新的唯一 ID，创建时间与更新时间均为当前时间
    pub async fn add_device(&self, draft: DeviceDraft) -> Result<Device> {
        let mut data = self.data.write().await;

        let mut device = Device::new(draft);
        while data.contains_id(&device.id) {
            device.id = gsm_types::generate_id("dev");
        }
        data.devices.push(device.clone());

        info!(
            device_id = %device.id,
            device_name = %device.name,
            "Device added"
        );

        self.persist(&data).await?;
        Ok(device)
    }

    /// 更新设备（浅合并）
    ///
    /// 设备不存在时返回 `Ok(None)`，不做任何修改
    pub async fn update_device(
        &self,
        device_id: &str,
        update: DeviceUpdate,
    ) -> Result<Option<Device>> {
        let mut data = self.data.write().await;

        let Some(device) = data.devices.iter_mut().find(|d| d.id == device_id) else {
            debug!(device_id = %device_id, "Update skipped, device not found");
            return Ok(None);
        };
        update.apply_to(device);
        device.touch();
        let updated = device.clone();

        info!(device_id = %device_id, "Device updated");

        self.persist(&data).await?;
        Ok(Some(updated))
    }

    /// 删除设备
    ///
    /// 同时删除其授权用户与日志；若为当前选中设备则清空选中状态
    pub async fn delete_device(&self, device_id: &str) -> Result<bool> {
        let mut data = self.data.write().await;

        let before = data.devices.len();
        data.devices.retain(|d| d.id != device_id);
        if data.devices.len() == before {
            debug!(device_id = %device_id, "Delete skipped, device not found");
            return Ok(false);
        }

        data.users.retain(|u| u.device_id != device_id);
        data.logs.remove(device_id);
        if data.settings.active_device_id.as_deref() == Some(device_id) {
            data.settings.active_device_id = None;
        }

        info!(device_id = %device_id, "Device deleted");

        self.persist(&data).await?;
        Ok(true)
    }

    /// 设置当前选中的设备
    pub async fn set_active_device(&self, device_id: Option<&str>) -> Result<bool> {
        let mut data = self.data.write().await;
        data.settings.active_device_id = device_id.map(str::to_string);

        debug!(device_id = ?device_id, "Active device set");

        self.persist(&data).await?;
        Ok(true)
    }

    // ========== 授权用户 ==========

    /// 添加授权用户
    ///
    /// # 错误
    /// * `NotFound` - 设备不存在
    /// * `InvalidArgument` - 序号已被同一设备的其他用户占用
    pub async fn add_user(&self, draft: UserDraft) -> Result<AuthorizedUser> {
        let mut data = self.data.write().await;

        if data.device(&draft.device_id).is_none() {
            return Err(DeviceError::NotFound(draft.device_id));
        }
        if data
            .users
            .iter()
            .any(|u| u.device_id == draft.device_id && u.serial_number == draft.serial_number)
        {
            return Err(DeviceError::InvalidArgument(format!(
                "serial number {} already assigned on device {}",
                draft.serial_number, draft.device_id
            )));
        }

        let mut user = AuthorizedUser::new(draft);
        while data.contains_id(&user.id) {
            user.id = gsm_types::generate_id("usr");
        }
        data.users.push(user.clone());

        info!(
            user_id = %user.id,
            device_id = %user.device_id,
            serial_number = %user.serial_number,
            "Authorized user added"
        );

        self.persist(&data).await?;
        Ok(user)
    }

    /// 删除授权用户，不存在时返回 `Ok(None)`
    pub async fn remove_user(&self, user_id: &str) -> Result<Option<AuthorizedUser>> {
        let mut data = self.data.write().await;

        let Some(index) = data.users.iter().position(|u| u.id == user_id) else {
            return Ok(None);
        };
        let user = data.users.remove(index);

        info!(user_id = %user_id, device_id = %user.device_id, "Authorized user removed");

        self.persist(&data).await?;
        Ok(Some(user))
    }

    // ========== 日志 ==========

    /// 追加设备日志
    pub async fn add_device_log(
        &self,
        device_id: &str,
        action: &str,
        details: &str,
        success: bool,
        category: LogCategory,
    ) -> Result<DeviceLog> {
        let mut data = self.data.write().await;

        let log = DeviceLog::new(device_id, action, details, success, category);
        data.logs
            .entry(device_id.to_string())
            .or_default()
            .push(log.clone());

        debug!(
            device_id = %device_id,
            action = %action,
            success = success,
            category = %category,
            "Device log appended"
        );

        self.persist(&data).await?;
        Ok(log)
    }

    // ========== 设置 ==========

    pub async fn set_admin_number(&self, admin_number: &str) -> Result<Settings> {
        let mut data = self.data.write().await;
        data.settings.admin_number = admin_number.to_string();
        let settings = data.settings.clone();
        self.persist(&data).await?;
        Ok(settings)
    }

    /// 标记引导步骤已完成（重复标记无效果）
    pub async fn complete_step(&self, step: &str) -> Result<Settings> {
        let mut data = self.data.write().await;
        if !data.settings.completed_steps.iter().any(|s| s == step) {
            data.settings.completed_steps.push(step.to_string());
        }
        let settings = data.settings.clone();
        self.persist(&data).await?;
        Ok(settings)
    }

    /// 整体替换快照
    pub async fn replace_all(&self, snapshot: StorageData) -> Result<()> {
        let mut data = self.data.write().await;
        *data = snapshot;

        info!(
            devices = data.devices.len(),
            users = data.users.len(),
            "Device repository replaced"
        );

        self.persist(&data).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gsm_storage::MemoryStore;
    use std::sync::Arc;

    async fn repository() -> (DeviceRepository, MemoryStore) {
        let backend = MemoryStore::new();
        let repo = DeviceRepository::load(JsonStore::new(Arc::new(backend.clone()))).await;
        (repo, backend)
    }

    fn draft(name: &str) -> DeviceDraft {
        DeviceDraft::new(name, "+15550001111", "1234")
    }

    #[tokio::test]
    async fn test_add_then_get() {
        let (repo, _) = repository().await;

        let device = repo.add_device(draft("Front gate")).await.unwrap();
        let found = repo.get_device_by_id(&device.id).await.unwrap();
        assert_eq!(found, device);
        assert_eq!(device.created_at, device.updated_at);
    }

    #[tokio::test]
    async fn test_update_missing_device() {
        let (repo, _) = repository().await;
        repo.add_device(draft("Front gate")).await.unwrap();
        let before = repo.get_devices().await;

        let result = repo
            .update_device("dev_missing", DeviceUpdate::name("X"))
            .await
            .unwrap();
        assert!(result.is_none());
        assert_eq!(repo.get_devices().await, before);
    }

    #[tokio::test]
    async fn test_update_preserves_other_fields() {
        let (repo, _) = repository().await;
        let device = repo.add_device(draft("Front gate")).await.unwrap();

        let updated = repo
            .update_device(&device.id, DeviceUpdate::name("X"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.name, "X");
        assert_eq!(updated.id, device.id);
        assert_eq!(updated.unit_number, device.unit_number);
        assert_eq!(updated.password, device.password);
        assert_eq!(updated.relay_settings, device.relay_settings);
        assert_eq!(updated.created_at, device.created_at);
        assert!(updated.updated_at > device.updated_at);
    }

    #[tokio::test]
    async fn test_delete_active_device_clears_selection() {
        let (repo, _) = repository().await;
        let active = repo.add_device(draft("A")).await.unwrap();
        let other = repo.add_device(draft("B")).await.unwrap();

        repo.set_active_device(Some(&active.id)).await.unwrap();
        assert!(repo.delete_device(&other.id).await.unwrap());
        assert_eq!(
            repo.get_settings().await.active_device_id.as_deref(),
            Some(active.id.as_str())
        );

        assert!(repo.delete_device(&active.id).await.unwrap());
        assert!(repo.get_settings().await.active_device_id.is_none());
        assert!(!repo.delete_device(&active.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_cascades_users_and_logs() {
        let (repo, _) = repository().await;
        let device = repo.add_device(draft("A")).await.unwrap();
        repo.add_user(UserDraft::new(&device.id, "Ann", "+15551234567", "07"))
            .await
            .unwrap();
        repo.add_device_log(&device.id, "Gate Open", "sent", true, LogCategory::Relay)
            .await
            .unwrap();

        repo.delete_device(&device.id).await.unwrap();

        assert!(repo.get_users(&device.id).await.is_empty());
        assert!(repo.get_device_logs(&device.id).await.is_empty());
    }

    #[tokio::test]
    async fn test_add_user_rules() {
        let (repo, _) = repository().await;
        let err = repo
            .add_user(UserDraft::new("dev_missing", "Ann", "+1", "01"))
            .await
            .unwrap_err();
        assert!(matches!(err, DeviceError::NotFound(_)));

        let device = repo.add_device(draft("A")).await.unwrap();
        repo.add_user(UserDraft::new(&device.id, "Ann", "+1", "01"))
            .await
            .unwrap();
        let err = repo
            .add_user(UserDraft::new(&device.id, "Bob", "+2", "01"))
            .await
            .unwrap_err();
        assert!(matches!(err, DeviceError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_persistence_failure_keeps_memory_change() {
        let (repo, backend) = repository().await;
        backend.set_fail_writes(true);

        let err = repo.add_device(draft("A")).await.unwrap_err();
        assert!(matches!(err, DeviceError::PersistenceFailure(_)));
        assert_eq!(repo.get_devices().await.len(), 1);
    }

    #[tokio::test]
    async fn test_numeric_ids_survive_load_and_write() {
        let backend = MemoryStore::new();
        let store = JsonStore::new(Arc::new(backend.clone()));
        store
            .set(
                StorageKey::AppData,
                &serde_json::json!({
                    "devices": [{
                        "id": 1700000000000u64,
                        "name": "Old gate",
                        "unitNumber": "+15550001111",
                        "password": "1234",
                        "relaySettings": "{\"accessControl\":\"AUT\",\"latchTime\":\"000\"}",
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
                    "logs": {
                        "1700000000000": [{
                            "id": 1700000000600u64,
                            "deviceId": 1700000000000u64,
                            "timestamp": "2023-11-14T22:13:21.000Z",
                            "action": "Gate Open",
                            "details": "Gate opened",
                            "success": true,
                            "category": "relay"
                        }]
                    },
                    "settings": {
                        "adminNumber": "+1",
                        "activeDeviceId": "1700000000000",
                        "completedSteps": []
                    }
                }),
            )
            .await
            .unwrap();

        let repo = DeviceRepository::load(JsonStore::new(Arc::new(backend.clone()))).await;
        assert_eq!(repo.active_device().await.unwrap().name, "Old gate");
        assert_eq!(repo.get_users("1700000000000").await.len(), 1);
        assert_eq!(repo.get_device_logs("1700000000000").await.len(), 1);

        // 写入后旧数据仍在
        repo.add_device(draft("New gate")).await.unwrap();
        let reloaded = DeviceRepository::load(JsonStore::new(Arc::new(backend))).await;
        assert_eq!(reloaded.get_devices().await.len(), 2);
        assert_eq!(reloaded.get_settings().await.admin_number, "+1");
        assert!(reloaded.get_device_by_id("1700000000000").await.is_some());
    }

    #[tokio::test]
    async fn test_snapshot_survives_reload() {
        let (repo, backend) = repository().await;
        let device = repo.add_device(draft("A")).await.unwrap();
        repo.set_active_device(Some(&device.id)).await.unwrap();
        repo.complete_step("welcome").await.unwrap();
        repo.complete_step("welcome").await.unwrap();

        let reloaded = DeviceRepository::load(JsonStore::new(Arc::new(backend))).await;
        assert_eq!(reloaded.get_data().await, repo.get_data().await);
        assert_eq!(reloaded.active_device().await.unwrap().id, device.id);
        assert_eq!(reloaded.get_settings().await.completed_steps, vec!["welcome"]);
    }
}
