//! In-memory transport for tests and local previews

use super::{MailTransport, OutgoingMail};
use crate::error::TransportError;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Mock transport that records every message it is asked to send
pub struct MockMailTransport {
    sent: Arc<Mutex<Vec<OutgoingMail>>>,
    should_fail: bool,
    failure_message: Option<String>,
    rejected_addresses: Vec<String>,
}

impl MockMailTransport {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            should_fail: false,
            failure_message: None,
            rejected_addresses: Vec::new(),
        }
    }

    /// Create a mock transport that always fails
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            should_fail: true,
            failure_message: Some(message.into()),
            ..Self::new()
        }
    }

    /// Create a mock transport that rejects mail addressed to `address`
    pub fn rejecting(address: impl Into<String>) -> Self {
        Self {
            rejected_addresses: vec![address.into()],
            ..Self::new()
        }
    }

    pub async fn sent_mails(&self) -> Vec<OutgoingMail> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    pub async fn was_sent_to(&self, address: &str) -> bool {
        self.sent
            .lock()
            .await
            .iter()
            .any(|mail| mail.to.iter().any(|to| to == address))
    }
}

impl Default for MockMailTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MailTransport for MockMailTransport {
    async fn send_mail(&self, mail: &OutgoingMail) -> Result<(), TransportError> {
        if self.should_fail {
            let message = self
                .failure_message
                .clone()
                .unwrap_or_else(|| "Mock failure".to_string());
            return Err(TransportError::Rejected(message));
        }

        if let Some(address) = mail
            .to
            .iter()
            .find(|to| self.rejected_addresses.contains(to))
        {
            return Err(TransportError::Rejected(format!("550 mailbox unavailable: {address}")));
        }

        self.sent.lock().await.push(mail.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        "mock"
    }
}
