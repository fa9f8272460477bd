use crate::{BackupService, DeviceError, DeviceRepository, Result, SagaStep};
use gsm_control::{
    CommandAction, CommandError, CommandParams, DispatchReceipt, SmsCommand, SmsGateway,
};
use gsm_types::{
    AuthorizedUser, Device, DeviceDraft, DeviceLog, DeviceUpdate, LogCategory, RelaySettings,
    UserDraft,
};
use std::sync::Arc;
use tracing::{error, info, warn};

/// 设备管理器
///
/// 组合设备仓库、短信入口与备份服务完成多步操作。主修改提交后，
/// 后续步骤（日志、备份、向设备推送）失败时不回滚，返回 `DeviceError::Incomplete`
pub struct DeviceManager {
    /// 设备仓库
    repository: Arc<DeviceRepository>,

    /// 备份服务
    backup: BackupService,

    /// 短信入口
    gateway: Arc<dyn SmsGateway>,

    /// 修改后是否自动备份
    auto_checkpoint: bool,
}

impl DeviceManager {
    /// 创建新的设备管理器
    pub fn new(repository: Arc<DeviceRepository>, gateway: Arc<dyn SmsGateway>) -> Self {
        info!(gateway = gateway.gateway_type(), "Device manager created");

        Self {
            backup: BackupService::new(repository.clone()),
            repository,
            gateway,
            auto_checkpoint: true,
        }
    }

    pub fn with_auto_checkpoint(mut self, enabled: bool) -> Self {
        self.auto_checkpoint = enabled;
        self
    }

    pub fn repository(&self) -> &Arc<DeviceRepository> {
        &self.repository
    }

    pub fn backup(&self) -> &BackupService {
        &self.backup
    }

    // ========== 设备管理 ==========

    /// 初始化新设备
    ///
    /// 使用默认继电器设置（AUT / 000）添加设备，随后备份并记录日志
    pub async fn initialize_device(&self, draft: DeviceDraft) -> Result<Device> {
        let draft = draft.with_relay_settings(RelaySettings::default());
        let device = self.repository.add_device(draft).await?;

        self.checkpoint(&device.id).await?;

        self.log(
            &device.id,
            "Device Created",
            &format!(
                "Device {} ({}) was initialized",
                device.name, device.unit_number
            ),
            true,
            LogCategory::System,
        )
        .await?;

        Ok(device)
    }

    /// 更新设备信息
    ///
    /// 设备不存在时返回 `Ok(None)` 且不记录日志
    pub async fn update_device(
        &self,
        device_id: &str,
        update: DeviceUpdate,
    ) -> Result<Option<Device>> {
        let Some(device) = self.repository.update_device(device_id, update).await? else {
            return Ok(None);
        };

        self.log(
            device_id,
            "Device Updated",
            "Device settings were updated",
            true,
            LogCategory::Settings,
        )
        .await?;

        self.checkpoint(device_id).await?;

        Ok(Some(device))
    }

    /// 删除设备
    ///
    /// # 错误
    /// * `NotFound` - 设备不存在
    pub async fn delete_device(&self, device_id: &str) -> Result<bool> {
        self.require_device(device_id).await?;

        let deleted = self.repository.delete_device(device_id).await?;
        if deleted {
            self.checkpoint(device_id).await?;
        }

        Ok(deleted)
    }

    /// 设置当前选中的设备
    pub async fn set_active_device(&self, device_id: Option<&str>) -> Result<bool> {
        self.repository.set_active_device(device_id).await
    }

    pub async fn devices(&self) -> Vec<Device> {
        self.repository.get_devices().await
    }

    pub async fn device(&self, device_id: &str) -> Option<Device> {
        self.repository.get_device_by_id(device_id).await
    }

    pub async fn active_device(&self) -> Option<Device> {
        self.repository.active_device().await
    }

    pub async fn logs(&self, device_id: &str) -> Vec<DeviceLog> {
        self.repository.get_device_logs(device_id).await
    }

    pub async fn users(&self, device_id: &str) -> Vec<AuthorizedUser> {
        self.repository.get_users(device_id).await
    }

    // ========== 指令 ==========

    /// 向设备发送短信指令
    ///
    /// 参数校验在发送前完成，校验失败时既不发送也不记录日志；
    /// 发送前检查短信入口是否可用；发送后无论成功与否都记录一条 `relay` 日志
    ///
    /// # 错误
    /// * `NotFound` - 设备不存在
    /// * `MissingParameter` / `InvalidArgument` - 参数缺失或无效
    /// * `Unavailable` / `DispatchFailed` - 短信入口不可用或调用失败（已记录日志）
    pub async fn send_device_command(
        &self,
        device_id: &str,
        action: CommandAction,
        params: &CommandParams,
    ) -> Result<DispatchReceipt> {
        let device = self.require_device(device_id).await?;
        let command = SmsCommand::from_action(action, params)?;

        self.dispatch_and_log(&device, &command, LogCategory::Relay)
            .await
    }

    /// 更新继电器设置并同步到设备
    ///
    /// 依次推送门禁模式与锁存时间；推送失败时本地设置已保存
    pub async fn update_relay_settings(
        &self,
        device_id: &str,
        settings: RelaySettings,
    ) -> Result<Device> {
        self.require_device(device_id).await?;

        let device = self
            .repository
            .update_device(device_id, DeviceUpdate::relay_settings(settings))
            .await?
            .ok_or_else(|| DeviceError::NotFound(device_id.to_string()))?;

        self.dispatch_and_log(
            &device,
            &SmsCommand::SetAccessControl {
                mode: settings.access_control,
            },
            LogCategory::Relay,
        )
        .await
        .map_err(|e| DeviceError::incomplete(device_id, SagaStep::PushAccessControl, e))?;

        self.dispatch_and_log(
            &device,
            &SmsCommand::SetLatchTime {
                seconds: settings.latch_time,
            },
            LogCategory::Relay,
        )
        .await
        .map_err(|e| DeviceError::incomplete(device_id, SagaStep::PushLatchTime, e))?;

        self.log(
            device_id,
            "Relay Settings Updated",
            &format!(
                "Updated access control to {} and latch time to {}",
                settings.access_control, settings.latch_time
            ),
            true,
            LogCategory::Settings,
        )
        .await?;

        Ok(device)
    }

    // ========== 授权用户 ==========

    /// 添加授权用户并写入设备
    pub async fn add_authorized_user(&self, draft: UserDraft) -> Result<AuthorizedUser> {
        let device = self.require_device(&draft.device_id).await?;
        let user = self.repository.add_user(draft).await?;

        let command = SmsCommand::AddUser {
            phone_number: user.phone_number.clone(),
            serial_number: user.serial_number.clone(),
        };
        self.dispatch_and_log(&device, &command, LogCategory::Users)
            .await
            .map_err(|e| DeviceError::incomplete(&device.id, SagaStep::PushUser, e))?;

        Ok(user)
    }

    /// 删除授权用户并从设备移除
    ///
    /// # 错误
    /// * `NotFound` - 用户不存在
    pub async fn remove_authorized_user(&self, user_id: &str) -> Result<AuthorizedUser> {
        let user = self
            .repository
            .remove_user(user_id)
            .await?
            .ok_or_else(|| DeviceError::NotFound(user_id.to_string()))?;

        let Some(device) = self.repository.get_device_by_id(&user.device_id).await else {
            warn!(
                user_id = %user_id,
                device_id = %user.device_id,
                "Removed user belongs to an unknown device, nothing to push"
            );
            return Ok(user);
        };

        let command = SmsCommand::DeleteUser {
            serial_number: user.serial_number.clone(),
        };
        self.dispatch_and_log(&device, &command, LogCategory::Users)
            .await
            .map_err(|e| DeviceError::incomplete(&device.id, SagaStep::PushUser, e))?;

        Ok(user)
    }

    // ========== 辅助方法 ==========

    async fn require_device(&self, device_id: &str) -> Result<Device> {
        self.repository
            .get_device_by_id(device_id)
            .await
            .ok_or_else(|| DeviceError::NotFound(device_id.to_string()))
    }

    /// 发送指令并记录结果
    async fn dispatch_and_log(
        &self,
        device: &Device,
        command: &SmsCommand,
        category: LogCategory,
    ) -> Result<DispatchReceipt> {
        let body = command.encode(&device.password);
        let action = command.action();

        let outcome = if self.gateway.is_available().await {
            self.gateway.dispatch(&device.unit_number, &body).await
        } else {
            Err(CommandError::Unavailable(format!(
                "{} gateway has no SMS compose surface",
                self.gateway.gateway_type()
            )))
        };

        let details = match &outcome {
            Ok(_) => command.log_details(),
            Err(e) => {
                error!(
                    device_id = %device.id,
                    action = %action,
                    error = %e,
                    "Failed to dispatch command"
                );
                format!("{} (failed: {})", command.log_details(), e)
            }
        };

        self.log(
            &device.id,
            action.log_action(),
            &details,
            outcome.is_ok(),
            category,
        )
        .await?;

        let receipt = outcome?;
        info!(
            device_id = %device.id,
            action = %action,
            recipient = %receipt.recipient,
            "Command dispatched"
        );
        Ok(receipt)
    }

    async fn log(
        &self,
        device_id: &str,
        action: &str,
        details: &str,
        success: bool,
        category: LogCategory,
    ) -> Result<()> {
        self.repository
            .add_device_log(device_id, action, details, success, category)
            .await
            .map(|_| ())
            .map_err(|e| DeviceError::incomplete(device_id, SagaStep::Log, e))
    }

    async fn checkpoint(&self, device_id: &str) -> Result<()> {
        if !self.auto_checkpoint {
            return Ok(());
        }
        self.backup
            .checkpoint()
            .await
            .map(|_| ())
            .map_err(|e| DeviceError::incomplete(device_id, SagaStep::Backup, e))
    }
}
