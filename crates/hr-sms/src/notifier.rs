//! Notifier implementation backed by the SMS client

use std::sync::Arc;

use tracing::{error, info};

use hr_core::{Notification, Notifier};

use crate::client::SmsClient;

/// Delivers notifications as SMS messages.
///
/// Delivery is fire-and-forget: the send runs on a spawned task so the
/// caller never blocks on the provider, and failures are logged rather
/// than surfaced.
pub struct SmsNotifier {
    client: Arc<SmsClient>,
}

impl SmsNotifier {
    pub fn new(client: Arc<SmsClient>) -> Self {
        Self { client }
    }
}

impl Notifier for SmsNotifier {
    fn deliver(&self, notification: Notification) {
        let client = self.client.clone();
        tokio::spawn(async move {
            match client
                .send_message(&notification.to, &notification.message)
                .await
            {
                Ok(message_id) => {
                    info!("SMS delivered to {} (id {})", notification.to, message_id);
                }
                Err(e) => {
                    error!("SMS delivery to {} failed: {}", notification.to, e);
                }
            }
        });
    }
}
