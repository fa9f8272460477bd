mod cli;
mod commands;
mod logging;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use gsm_config::{AppConfig, ConfigLoader, GatewayKind};
use gsm_control::{Opener, OutboxGateway, SmsGateway, UriGateway};
use gsm_device::{DeviceManager, DeviceRepository};
use gsm_storage::{JsonStore, KeyValueStore, LocalStore, MemoryStore};
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loader = ConfigLoader::new(&cli.config_dir);
    if let Command::Init = cli.command {
        let path = loader.write_default()?;
        println!("Wrote {}", path.display());
        return Ok(());
    }

    let mut config = loader.load_validated()?;
    if let Some(data_dir) = &cli.data_dir {
        config.storage.data_dir = data_dir.clone();
    }

    logging::init(&config.logging);
    info!(data_dir = %config.storage.data_dir.display(), "Starting gsmctl");

    let manager = build_manager(&cli, &config).await;
    commands::run(&manager, cli.command).await
}

/// 组装存储、仓库、短信入口与管理器
async fn build_manager(cli: &Cli, config: &AppConfig) -> DeviceManager {
    let backend: Arc<dyn KeyValueStore> = if cli.ephemeral {
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(LocalStore::new(&config.storage.data_dir))
    };
    let repository = Arc::new(DeviceRepository::load(JsonStore::new(backend)).await);

    let gateway: Arc<dyn SmsGateway> = if cli.dry_run || config.sms.gateway == GatewayKind::Outbox {
        Arc::new(OutboxGateway::new())
    } else {
        let opener = config
            .sms
            .opener
            .as_deref()
            .map(Opener::new)
            .unwrap_or_else(Opener::platform_default);
        Arc::new(UriGateway::new(opener))
    };

    if !gateway.is_available().await {
        warn!(
            gateway = gateway.gateway_type(),
            "No SMS compose surface available, commands will fail to send"
        );
    }

    DeviceManager::new(repository, gateway).with_auto_checkpoint(config.backup.auto_checkpoint)
}
