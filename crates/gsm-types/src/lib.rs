pub mod device;
pub mod error;
pub mod id;
pub mod log;
pub mod settings;
pub mod user;

pub use device::{AccessControl, Device, DeviceDraft, DeviceUpdate, LatchTime, RelaySettings};
pub use error::TypeError;
pub use id::{deserialize_id, generate_id};
pub use log::{DeviceLog, LogCategory};
pub use settings::{Settings, StorageData};
pub use user::{AuthorizedUser, UserDraft};
