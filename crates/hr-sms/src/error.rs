//! Error types for hr-sms

use thiserror::Error;

/// hr-sms error type
#[derive(Error, Debug)]
pub enum SmsError {
    #[error("SMS credentials not set")]
    CredentialsNotSet,

    #[error("Africa's Talking API error: {0}")]
    Api(String),

    #[error("HTTP error: {0}")]
    Http(String),
}

impl From<reqwest::Error> for SmsError {
    fn from(err: reqwest::Error) -> Self {
        SmsError::Http(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, SmsError>;
