//! Outbound SMS delivery via the Africa's Talking messaging API.

pub mod client;
pub mod error;
pub mod notifier;

pub use client::SmsClient;
pub use error::{Result, SmsError};
pub use notifier::SmsNotifier;
