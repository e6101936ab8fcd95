//! Webhook notifier adapter
//!
//! Delivers notification events as JSON POSTs to a configured endpoint.
//! Delivery happens on a detached thread with a short timeout; the
//! outcome is observable only through external monitoring.

use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;

use crate::ports::{Notifier, NotifyEvent};

const SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Best-effort JSON webhook notifier
pub struct WebhookNotifier {
    url: String,
    client: Client,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(SEND_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            url: url.into(),
            client,
        }
    }
}

impl Notifier for WebhookNotifier {
    fn notify(&self, event: NotifyEvent) {
        let client = self.client.clone();
        let url = self.url.clone();
        thread::spawn(move || {
            let _ = client.post(&url).json(&event).send();
        });
    }
}
