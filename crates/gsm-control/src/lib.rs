pub mod channel;
pub mod command;
pub mod error;

pub use channel::{sms_uri, DeliveryStatus, DispatchReceipt, Opener, OutboxGateway, SmsGateway, UriGateway};
pub use command::{encoder, CommandAction, CommandParams, SmsCommand};
pub use error::{CommandError, Result};

#[cfg(any(test, feature = "testing"))]
pub use channel::MockSmsGateway;
