pub mod backup;
pub mod error;
pub mod manager;
pub mod repository;

pub use backup::{backup_file_name, BackupEnvelope, BackupService, BACKUP_VERSION};
pub use error::{DeviceError, Result, SagaStep};
pub use manager::DeviceManager;
pub use repository::DeviceRepository;
