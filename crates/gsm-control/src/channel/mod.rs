pub mod outbox;
pub mod trait_def;
pub mod uri;

pub use outbox::OutboxGateway;
pub use trait_def::{sms_uri, DeliveryStatus, DispatchReceipt, SmsGateway};
pub use uri::{Opener, UriGateway};

#[cfg(any(test, feature = "testing"))]
pub use trait_def::MockSmsGateway;
