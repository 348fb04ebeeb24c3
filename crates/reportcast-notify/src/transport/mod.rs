//! Outbound mail transports.

pub mod mock;
pub mod smtp;

pub use mock::MockMailTransport;
pub use smtp::{SmtpConfig, SmtpMailTransport, SmtpSecurity, SMTPS_PORT};

use crate::error::TransportError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;

/// MIME subtype of the top-level multipart container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MimeSubtype {
    /// Parts reference each other (inline images resolve against the body).
    #[default]
    Related,
    Mixed,
    Alternative,
}

impl MimeSubtype {
    pub fn as_str(&self) -> &'static str {
        match self {
            MimeSubtype::Related => "related",
            MimeSubtype::Mixed => "mixed",
            MimeSubtype::Alternative => "alternative",
        }
    }
}

/// Everything a transport needs to send one message.
#[derive(Debug, Clone, Default)]
pub struct OutgoingMail {
    pub to: Vec<String>,
    pub subject: String,
    /// HTML body.
    pub body: String,
    /// Files read from disk and attached by name.
    pub files: Vec<PathBuf>,
    /// In-memory attachments keyed by filename.
    pub data: HashMap<String, Vec<u8>>,
    /// Inline images keyed by content id.
    pub images: HashMap<String, Vec<u8>>,
    pub bcc: Vec<String>,
    pub mime_subtype: MimeSubtype,
    /// Log the message instead of sending it.
    pub dry_run: bool,
}

/// Performs the network send for a rendered message.
///
/// Implementations own their connection handling and timeouts; callers get
/// one attempt per call.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send_mail(&self, mail: &OutgoingMail) -> Result<(), TransportError>;

    /// Returns the transport name (e.g., `"smtp"`).
    fn name(&self) -> &str;
}
