/// Errors that can occur within the notification subsystem.
///
/// Transport failures are wrapped as [`NotifyError::Notification`] with the
/// original [`TransportError`] available through `source()`. Nothing in this
/// crate retries; the caller decides what to do with a failed delivery.
///
/// # Examples
///
/// ```rust
/// use reportcast_notify::error::NotifyError;
///
/// let err = NotifyError::MalformedRecipient("missing field `target`".to_string());
/// assert!(err.to_string().contains("target"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// The recipient configuration blob did not parse or had no usable target.
    #[error("Notify: malformed recipient configuration: {0}")]
    MalformedRecipient(String),

    /// No channel is registered for the recipient's channel kind.
    #[error("Notify: unknown channel type '{0}'")]
    UnknownChannelType(String),

    /// Channel configuration is missing a required field or contains an invalid value.
    #[error("Notify: invalid channel configuration: {0}")]
    InvalidConfig(String),

    /// Building the channel-specific message failed.
    #[error("Notify: render error: {0}")]
    Render(String),

    /// The transport failed to deliver the message.
    #[error("Notify: delivery failed: {0}")]
    Notification(#[from] TransportError),

    /// JSON serialization or deserialization failed (e.g. channel config parsing).
    #[error("Notify: JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure reported by a [`crate::transport::MailTransport`].
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("invalid address '{address}': {source}")]
    InvalidAddress {
        address: String,
        #[source]
        source: lettre::address::AddressError,
    },

    /// The MIME message could not be assembled.
    #[error("failed to build message: {0}")]
    Message(String),

    /// A file attachment could not be read.
    #[error("failed to read attachment '{path}': {source}")]
    Attachment {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    /// Delivery refused by a transport that has no richer error type.
    #[error("rejected: {0}")]
    Rejected(String),
}

/// Coarse classification of a [`TransportError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The message or one of its addresses was unusable before anything was sent.
    InvalidMessage,
    /// The server answered with a temporary (4xx) failure.
    Transient,
    /// The server answered with a permanent (5xx) failure, e.g. bad credentials
    /// or an unknown mailbox.
    Permanent,
    /// No usable answer from the server (connection refused, TLS, I/O).
    Connection,
}

impl TransportError {
    pub fn kind(&self) -> FailureKind {
        match self {
            TransportError::InvalidAddress { .. }
            | TransportError::Message(_)
            | TransportError::Attachment { .. } => FailureKind::InvalidMessage,
            TransportError::Smtp(e) if e.is_transient() => FailureKind::Transient,
            TransportError::Smtp(e) if e.is_permanent() => FailureKind::Permanent,
            TransportError::Smtp(_) => FailureKind::Connection,
            TransportError::Rejected(_) => FailureKind::Permanent,
        }
    }
}

/// Convenience `Result` alias for notification operations.
pub type Result<T> = std::result::Result<T, NotifyError>;
