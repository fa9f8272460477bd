pub mod encoder;
pub mod model;

pub use model::{CommandAction, CommandParams, SmsCommand};
