use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "GSM gate-relay device registry", long_about = None)]
pub struct Cli {
    /// Directory containing gsm.toml
    #[arg(long, global = true, default_value = ".")]
    pub config_dir: PathBuf,

    /// Override storage.data_dir
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Keep all state in memory for this run
    #[arg(long, global = true)]
    pub ephemeral: bool,

    /// Record SMS commands instead of opening the compose surface
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a default gsm.toml into the config directory
    Init,

    /// Manage registered controllers
    #[command(subcommand)]
    Device(DeviceCommand),

    /// Send an SMS command to a controller
    Send(SendArgs),

    /// Change relay settings and push them to the controller
    Relay(RelayArgs),

    /// Manage authorized phone numbers
    #[command(subcommand)]
    User(UserCommand),

    /// Show the operation log of a controller
    Logs {
        device_id: String,
    },

    /// Export or import the full data set
    #[command(subcommand)]
    Backup(BackupCommand),

    /// Set the administrator phone number
    Admin {
        number: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum DeviceCommand {
    /// Register a new controller
    Add {
        #[arg(long)]
        name: String,
        /// SIM number of the controller
        #[arg(long)]
        unit: String,
        /// Command password of the controller
        #[arg(long)]
        password: String,
    },

    /// List registered controllers
    List,

    /// Show one controller
    Show { device_id: String },

    /// Change name, SIM number or password
    Update {
        device_id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        unit: Option<String>,
        #[arg(long)]
        password: Option<String>,
    },

    /// Remove a controller with its users and logs
    Delete { device_id: String },

    /// Select the active controller (omit the id to clear)
    Activate { device_id: Option<String> },
}

#[derive(Args, Debug)]
pub struct SendArgs {
    pub device_id: String,

    /// open, close, status, addUser, deleteUser, setLatchTime, setAccessControl
    pub action: String,

    #[arg(long)]
    pub seconds: Option<u64>,

    /// AUT or ALL
    #[arg(long)]
    pub mode: Option<String>,

    #[arg(long)]
    pub phone: Option<String>,

    #[arg(long)]
    pub serial: Option<String>,
}

#[derive(Args, Debug)]
pub struct RelayArgs {
    pub device_id: String,

    /// AUT or ALL
    #[arg(long)]
    pub mode: String,

    /// Latch time in seconds (0-999)
    #[arg(long)]
    pub latch: String,
}

#[derive(Subcommand, Debug)]
pub enum UserCommand {
    /// Authorize a phone number on a controller
    Add {
        device_id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        phone: String,
        /// Slot on the controller, e.g. 07
        #[arg(long)]
        serial: String,
    },

    /// Revoke an authorized user
    Remove { user_id: String },

    /// List authorized users of a controller
    List { device_id: String },
}

#[derive(Subcommand, Debug)]
pub enum BackupCommand {
    /// Write a backup file (defaults to gsm-backup-<date>.json)
    Export {
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Replace all data with the contents of a backup file
    Import { path: PathBuf },
}
