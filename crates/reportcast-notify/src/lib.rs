//! Report notification rendering and delivery.
//!
//! A [`ReportContent`] produced by the scheduler is rendered into a
//! channel-specific [`RenderedMessage`], the recipient's stored
//! configuration is resolved into a [`recipient::Destination`], and the
//! message is handed to the channel's transport. The
//! [`dispatcher::NotificationDispatcher`] drives those steps for every
//! registered [`NotificationChannel`].

pub mod channels;
pub mod dispatcher;
pub mod error;
pub mod message;
pub mod plugin;
pub mod recipient;
pub mod sanitize;
pub mod transport;
pub mod utils;

#[cfg(test)]
mod tests;

pub use dispatcher::{NotificationDispatcher, RecipientOutcome};
pub use error::{FailureKind, NotifyError, Result, TransportError};
pub use message::RenderedMessage;
pub use recipient::{Destination, Recipient};

use async_trait::async_trait;
use recipient::resolve;
use reportcast_common::types::{ChannelKind, ReportContent};

/// A notification delivery channel (e.g., email over SMTP).
///
/// Implementations are created by the corresponding [`plugin::ChannelPlugin`]
/// and registered with the dispatcher under their [`ChannelKind`].
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    fn channel_kind(&self) -> ChannelKind;

    /// Renders report content for this channel. Must not perform I/O.
    fn render(&self, content: &ReportContent) -> Result<RenderedMessage>;

    /// Parses a stored recipient configuration for this channel.
    fn resolve_recipient(&self, config: &[u8]) -> Result<Destination> {
        resolve(config, self.channel_kind())
    }

    /// Delivers a rendered message.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Notification`] carrying the transport's failure.
    /// No retry is attempted.
    async fn send(&self, destination: &Destination, message: RenderedMessage) -> Result<()>;
}
