use anyhow::{anyhow, Result};
use config::{Config, Environment, File, FileFormat};
use std::path::{Path, PathBuf};

use crate::AppConfig;

/// 配置文件名
pub const CONFIG_FILE_NAME: &str = "gsm.toml";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// 配置加载器
///
/// 读取 `<config_dir>/gsm.toml`（可缺省），再叠加 `GSM_*` 环境变量，
/// 如 `GSM_STORAGE__DATA_DIR=/var/lib/gsm`
pub struct ConfigLoader {
    config_dir: PathBuf,
    env_prefix: String,
}

impl ConfigLoader {
    /// 创建配置加载器
    pub fn new<P: AsRef<Path>>(config_dir: P) -> Self {
        Self {
            config_dir: config_dir.as_ref().to_path_buf(),
            env_prefix: "GSM".to_string(),
        }
    }

    /// 修改环境变量前缀
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    pub fn config_path(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE_NAME)
    }

    /// 加载应用配置
    pub fn load(&self) -> Result<AppConfig> {
        let config_path = self.config_path();

        let config = Config::builder()
            .add_source(
                File::new(
                    config_path
                        .to_str()
                        .ok_or_else(|| anyhow!("Invalid config path"))?,
                    FileFormat::Toml,
                )
                .required(false),
            )
            .add_source(
                Environment::with_prefix(&self.env_prefix)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// 加载并验证配置
    pub fn load_validated(&self) -> Result<AppConfig> {
        let config = self.load()?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// 验证配置
    pub fn validate(config: &AppConfig) -> Result<()> {
        if config.storage.data_dir.as_os_str().is_empty() {
            return Err(anyhow!("storage.data_dir must not be empty"));
        }

        // 允许简单级别或 `target=level` 形式的过滤指令
        let level = config.logging.level.to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) && !level.contains('=') {
            return Err(anyhow!("Unknown log level: {}", config.logging.level));
        }

        Ok(())
    }

    /// 写出默认配置文件，已存在时不覆盖
    pub fn write_default(&self) -> Result<PathBuf> {
        let config_path = self.config_path();
        if config_path.exists() {
            return Err(anyhow!(
                "Config file already exists: {}",
                config_path.display()
            ));
        }

        std::fs::create_dir_all(&self.config_dir)?;
        let content = toml::to_string_pretty(&AppConfig::default())?;
        std::fs::write(&config_path, content)?;
        Ok(config_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GatewayKind;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = ConfigLoader::new(temp_dir.path())
            .with_env_prefix("GSM_TEST_MISSING")
            .load()
            .unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join(CONFIG_FILE_NAME),
            r#"
            [storage]
            data_dir = "/tmp/gsm-data"

            [sms]
            gateway = "outbox"

            [backup]
            auto_checkpoint = false
            "#,
        )
        .unwrap();

        let config = ConfigLoader::new(temp_dir.path())
            .with_env_prefix("GSM_TEST_FILE")
            .load_validated()
            .unwrap();
        assert_eq!(config.storage.data_dir, PathBuf::from("/tmp/gsm-data"));
        assert_eq!(config.sms.gateway, GatewayKind::Outbox);
        assert!(!config.backup.auto_checkpoint);
    }

    #[test]
    fn test_env_overrides_file() {
        let temp_dir = TempDir::new().unwrap();
        std::env::set_var("GSM_TEST_ENV_LOGGING__LEVEL", "debug");

        let config = ConfigLoader::new(temp_dir.path())
            .with_env_prefix("GSM_TEST_ENV")
            .load()
            .unwrap();
        assert_eq!(config.logging.level, "debug");

        std::env::remove_var("GSM_TEST_ENV_LOGGING__LEVEL");
    }

    #[test]
    fn test_validate_rejects_unknown_level() {
        let mut config = AppConfig::default();
        config.logging.level = "loud".to_string();
        assert!(ConfigLoader::validate(&config).is_err());

        config.logging.level = "gsm_device=debug".to_string();
        assert!(ConfigLoader::validate(&config).is_ok());
    }

    #[test]
    fn test_write_default_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let loader = ConfigLoader::new(temp_dir.path()).with_env_prefix("GSM_TEST_WRITE");

        loader.write_default().unwrap();
        assert!(loader.write_default().is_err());
        assert_eq!(loader.load().unwrap(), AppConfig::default());
    }
}
