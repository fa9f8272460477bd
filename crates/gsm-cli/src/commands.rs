use crate::cli::{BackupCommand, Command, DeviceCommand, RelayArgs, SendArgs, UserCommand};
use anyhow::{anyhow, Context, Result};
use gsm_control::{CommandAction, CommandParams};
use gsm_device::{backup_file_name, DeviceManager};
use gsm_types::{DeviceDraft, DeviceUpdate, RelaySettings, UserDraft};
use serde::Serialize;
use std::path::PathBuf;

/// 执行子命令
pub async fn run(manager: &DeviceManager, command: Command) -> Result<()> {
    match command {
        Command::Init => Ok(()),
        Command::Device(cmd) => device(manager, cmd).await,
        Command::Send(args) => send(manager, args).await,
        Command::Relay(args) => relay(manager, args).await,
        Command::User(cmd) => user(manager, cmd).await,
        Command::Logs { device_id } => print_json(&manager.logs(&device_id).await),
        Command::Backup(cmd) => backup(manager, cmd).await,
        Command::Admin { number } => {
            let settings = manager.repository().set_admin_number(&number).await?;
            print_json(&settings)
        }
    }
}

async fn device(manager: &DeviceManager, cmd: DeviceCommand) -> Result<()> {
    match cmd {
        DeviceCommand::Add {
            name,
            unit,
            password,
        } => {
            let device = manager
                .initialize_device(DeviceDraft::new(name, unit, password))
                .await?;
            print_json(&device)
        }
        DeviceCommand::List => print_json(&manager.devices().await),
        DeviceCommand::Show { device_id } => {
            let device = manager
                .device(&device_id)
                .await
                .ok_or_else(|| anyhow!("Device not found: {}", device_id))?;
            print_json(&device)
        }
        DeviceCommand::Update {
            device_id,
            name,
            unit,
            password,
        } => {
            let update = DeviceUpdate {
                name,
                unit_number: unit,
                password,
                relay_settings: None,
            };
            if update.is_empty() {
                return Err(anyhow!("Nothing to update"));
            }
            let device = manager
                .update_device(&device_id, update)
                .await?
                .ok_or_else(|| anyhow!("Device not found: {}", device_id))?;
            print_json(&device)
        }
        DeviceCommand::Delete { device_id } => {
            manager.delete_device(&device_id).await?;
            println!("Deleted {}", device_id);
            Ok(())
        }
        DeviceCommand::Activate { device_id } => {
            if let Some(id) = &device_id {
                if manager.device(id).await.is_none() {
                    return Err(anyhow!("Device not found: {}", id));
                }
            }
            manager.set_active_device(device_id.as_deref()).await?;
            match device_id {
                Some(id) => println!("Active device: {}", id),
                None => println!("Active device cleared"),
            }
            Ok(())
        }
    }
}

fn send_params(args: &SendArgs) -> CommandParams {
    let mut params = CommandParams::new();
    if let Some(seconds) = args.seconds {
        params = params.with_seconds(seconds);
    }
    if let Some(mode) = &args.mode {
        params = params.with_mode(mode.as_str());
    }
    if let Some(phone) = &args.phone {
        params = params.with_phone_number(phone.as_str());
    }
    if let Some(serial) = &args.serial {
        params = params.with_serial_number(serial.as_str());
    }
    params
}

async fn send(manager: &DeviceManager, args: SendArgs) -> Result<()> {
    let action: CommandAction = args.action.parse()?;
    let params = send_params(&args);

    let receipt = manager
        .send_device_command(&args.device_id, action, &params)
        .await?;
    print_json(&receipt)
}

async fn relay(manager: &DeviceManager, args: RelayArgs) -> Result<()> {
    let settings = RelaySettings {
        access_control: args.mode.parse()?,
        latch_time: args.latch.parse()?,
    };
    let device = manager
        .update_relay_settings(&args.device_id, settings)
        .await?;
    print_json(&device)
}

async fn user(manager: &DeviceManager, cmd: UserCommand) -> Result<()> {
    match cmd {
        UserCommand::Add {
            device_id,
            name,
            phone,
            serial,
        } => {
            let user = manager
                .add_authorized_user(UserDraft::new(device_id, name, phone, serial))
                .await?;
            print_json(&user)
        }
        UserCommand::Remove { user_id } => {
            let user = manager.remove_authorized_user(&user_id).await?;
            print_json(&user)
        }
        UserCommand::List { device_id } => print_json(&manager.users(&device_id).await),
    }
}

async fn backup(manager: &DeviceManager, cmd: BackupCommand) -> Result<()> {
    match cmd {
        BackupCommand::Export { out } => {
            let text = manager.backup().create_backup().await?;
            let path = out.unwrap_or_else(|| {
                PathBuf::from(backup_file_name(chrono::Local::now().date_naive()))
            });
            tokio::fs::write(&path, text)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Backup written to {}", path.display());
            Ok(())
        }
        BackupCommand::Import { path } => {
            let text = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            manager.backup().restore_from_backup(&text).await?;
            println!("Backup restored from {}", path.display());
            Ok(())
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
