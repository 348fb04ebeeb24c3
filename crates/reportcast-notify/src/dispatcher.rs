use crate::error::{NotifyError, Result};
use crate::plugin::ChannelRegistry;
use crate::recipient::Recipient;
use crate::NotificationChannel;
use futures::future::join_all;
use reportcast_common::types::{ChannelKind, ReportContent};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Result of delivering one report to one recipient.
#[derive(Debug)]
pub struct RecipientOutcome {
    /// Position of the recipient in the list passed to [`NotificationDispatcher::send_all`].
    pub index: usize,
    pub kind: ChannelKind,
    pub result: Result<()>,
}

impl RecipientOutcome {
    pub fn is_delivered(&self) -> bool {
        self.result.is_ok()
    }
}

/// Renders, resolves and sends report notifications.
///
/// Holds no per-send state; share it behind an `Arc` and call
/// [`send`](Self::send) concurrently for independent recipients.
#[derive(Default)]
pub struct NotificationDispatcher {
    channels: HashMap<ChannelKind, Arc<dyn NotificationChannel>>,
}

impl NotificationDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds channels for `(channel_type, config)` pairs through `registry`.
    pub fn from_configs<'a>(
        registry: &ChannelRegistry,
        configs: impl IntoIterator<Item = (&'a str, &'a Value)>,
    ) -> Result<Self> {
        let mut dispatcher = Self::new();
        for (channel_type, config) in configs {
            dispatcher.register(registry.create_channel(channel_type, config)?);
        }
        Ok(dispatcher)
    }

    /// Registers `channel`, replacing any channel of the same kind.
    pub fn register(&mut self, channel: Arc<dyn NotificationChannel>) {
        self.channels.insert(channel.channel_kind(), channel);
    }

    pub fn with_channel(mut self, channel: Arc<dyn NotificationChannel>) -> Self {
        self.register(channel);
        self
    }

    pub fn has_channel(&self, kind: ChannelKind) -> bool {
        self.channels.contains_key(&kind)
    }

    /// Delivers `content` to a single recipient.
    ///
    /// # Errors
    ///
    /// - [`NotifyError::UnknownChannelType`] if no channel serves the recipient's kind.
    /// - [`NotifyError::MalformedRecipient`] if the recipient config is unusable.
    /// - [`NotifyError::Notification`] if the transport failed; the cause is kept.
    pub async fn send(&self, content: &ReportContent, recipient: &Recipient) -> Result<()> {
        let channel = self
            .channels
            .get(&recipient.kind)
            .ok_or_else(|| NotifyError::UnknownChannelType(recipient.kind.to_string()))?;

        let message = channel.render(content)?;
        let destination = channel.resolve_recipient(&recipient.config)?;
        let recipients = destination.addresses().len();

        match channel.send(&destination, message).await {
            Ok(()) => {
                tracing::info!(
                    channel = %recipient.kind,
                    report = %content.name,
                    recipients,
                    "Report notification delivered"
                );
                Ok(())
            }
            Err(e) => {
                let failure = match &e {
                    NotifyError::Notification(cause) => Some(cause.kind()),
                    _ => None,
                };
                tracing::warn!(
                    channel = %recipient.kind,
                    report = %content.name,
                    failure = ?failure,
                    error = %e,
                    "Report notification failed"
                );
                Err(e)
            }
        }
    }

    /// Delivers `content` to every recipient concurrently.
    ///
    /// Each recipient succeeds or fails on its own; outcomes come back in
    /// the order of `recipients`.
    pub async fn send_all(&self, content: &ReportContent, recipients: &[Recipient]) -> Vec<RecipientOutcome> {
        let sends = recipients.iter().enumerate().map(|(index, recipient)| async move {
            RecipientOutcome {
                index,
                kind: recipient.kind,
                result: self.send(content, recipient).await,
            }
        });
        join_all(sends).await
    }
}
