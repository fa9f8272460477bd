pub mod backend;
pub mod error;
pub mod json;
pub mod key;

pub use backend::{KeyValueStore, LocalStore, MemoryStore, StoreStats};
pub use error::{Result, StorageError};
pub use json::JsonStore;
pub use key::StorageKey;
