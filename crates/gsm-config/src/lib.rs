pub mod app;
pub mod loader;

pub use app::{AppConfig, BackupConfig, GatewayKind, LoggingConfig, SmsConfig, StorageConfig};
pub use loader::ConfigLoader;
