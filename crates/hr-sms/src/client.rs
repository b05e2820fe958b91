//! Africa's Talking SMS API client

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Result, SmsError};

const LIVE_BASE_URL: &str = "https://api.africastalking.com";
const SANDBOX_BASE_URL: &str = "https://api.sandbox.africastalking.com";

/// Africa's Talking API client
#[derive(Debug, Clone)]
pub struct SmsClient {
    client: Client,
    username: String,
    api_key: String,
    base_url: String,
}

/// Outgoing message payload
#[derive(Debug, Serialize)]
struct SendMessagePayload {
    username: String,
    to: String,
    message: String,
}

/// Per-recipient delivery report in the API response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipient {
    pub number: String,
    pub status: String,
    #[serde(default)]
    pub message_id: String,
}

#[derive(Debug, Deserialize)]
struct MessageData {
    #[serde(rename = "Recipients", default)]
    recipients: Vec<Recipient>,
}

#[derive(Debug, Deserialize)]
struct SendMessageResponse {
    #[serde(rename = "SMSMessageData")]
    data: MessageData,
}

impl SmsClient {
    /// Create a new client; sandbox mode targets the sandbox endpoint
    pub fn new(username: String, api_key: String, sandbox: bool) -> Self {
        let base_url = if sandbox {
            SANDBOX_BASE_URL
        } else {
            LIVE_BASE_URL
        };
        Self {
            client: Client::new(),
            username,
            api_key,
            base_url: base_url.to_string(),
        }
    }

    /// Send an SMS; returns the provider message id
    pub async fn send_message(&self, to: &str, message: &str) -> Result<String> {
        info!("Sending SMS to {}", to);

        let url = format!("{}/version1/messaging", self.base_url);
        let payload = SendMessagePayload {
            username: self.username.clone(),
            to: to.to_string(),
            message: message.to_string(),
        };

        let response = self
            .client
            .post(&url)
            .header("apiKey", &self.api_key)
            .header("Accept", "application/json")
            .form(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(SmsError::Api(format!(
                "Failed to send message: {} - {}",
                status, text
            )));
        }

        let result: SendMessageResponse = response.json().await?;
        let recipient = result
            .data
            .recipients
            .into_iter()
            .next()
            .ok_or_else(|| SmsError::Api("No recipients in response".to_string()))?;

        if recipient.status != "Success" {
            return Err(SmsError::Api(format!(
                "Delivery refused for {}: {}",
                recipient.number, recipient.status
            )));
        }

        Ok(recipient.message_id)
    }
}
