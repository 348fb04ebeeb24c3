//! Recipient configuration parsing.
//!
//! The recipient store keeps an opaque JSON blob per recipient whose shape
//! depends on the channel. It is parsed here into a typed
//! [`RecipientConfig`] and reduced to a [`Destination`]; nothing past this
//! module sees the raw blob.

use crate::error::{NotifyError, Result};
use reportcast_common::types::ChannelKind;
use serde::{Deserialize, Serialize};

/// A recipient as stored upstream: channel tag plus its serialized config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub kind: ChannelKind,
    pub config: Vec<u8>,
}

impl Recipient {
    pub fn new(kind: ChannelKind, config: impl Into<Vec<u8>>) -> Self {
        Self {
            kind,
            config: config.into(),
        }
    }

    /// Email recipient with `target` as its address list.
    pub fn email(target: &str) -> Self {
        let config = serde_json::json!({ "target": target }).to_string();
        Self::new(ChannelKind::Email, config)
    }
}

/// `target` of an email recipient: either a `,`/`;` separated string or a
/// JSON array of addresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EmailTarget {
    Joined(String),
    List(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailRecipient {
    pub target: EmailTarget,
}

/// Typed recipient configuration, one schema per channel kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecipientConfig {
    Email(EmailRecipient),
}

impl RecipientConfig {
    /// Parses `blob` with the schema registered for `kind`.
    pub fn parse(kind: ChannelKind, blob: &[u8]) -> Result<Self> {
        match kind {
            ChannelKind::Email => serde_json::from_slice::<EmailRecipient>(blob)
                .map(RecipientConfig::Email)
                .map_err(|e| NotifyError::MalformedRecipient(format!("invalid {kind} recipient: {e}"))),
            other => Err(NotifyError::UnknownChannelType(other.to_string())),
        }
    }

    pub fn kind(&self) -> ChannelKind {
        match self {
            RecipientConfig::Email(_) => ChannelKind::Email,
        }
    }

    /// Reduces the config to its destination, failing on an empty target.
    pub fn into_destination(self) -> Result<Destination> {
        let kind = self.kind();
        let target = match self {
            RecipientConfig::Email(EmailRecipient { target }) => match target {
                EmailTarget::Joined(joined) => joined.trim().to_string(),
                EmailTarget::List(list) => list
                    .iter()
                    .map(|address| address.trim())
                    .filter(|address| !address.is_empty())
                    .collect::<Vec<_>>()
                    .join(", "),
            },
        };

        let destination = Destination { kind, target };
        if destination.addresses().is_empty() {
            return Err(NotifyError::MalformedRecipient(format!(
                "{kind} recipient has an empty target"
            )));
        }
        Ok(destination)
    }
}

/// Resolves a serialized recipient configuration for `kind`.
///
/// # Examples
///
/// ```
/// use reportcast_common::types::ChannelKind;
/// use reportcast_notify::recipient::resolve;
///
/// let destination = resolve(br#"{"target": "a@b.com"}"#, ChannelKind::Email).unwrap();
/// assert_eq!(destination.as_str(), "a@b.com");
///
/// assert!(resolve(br#"{"to": "a@b.com"}"#, ChannelKind::Email).is_err());
/// ```
pub fn resolve(blob: &[u8], kind: ChannelKind) -> Result<Destination> {
    RecipientConfig::parse(kind, blob)?.into_destination()
}

/// Resolved, non-empty destination for one recipient.
///
/// Address syntax is not checked; the transport rejects what it cannot use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    kind: ChannelKind,
    target: String,
}

impl Destination {
    pub fn kind(&self) -> ChannelKind {
        self.kind
    }

    pub fn as_str(&self) -> &str {
        &self.target
    }

    /// Individual addresses, split on `,` and `;` with blanks removed.
    pub fn addresses(&self) -> Vec<&str> {
        self.target
            .split([',', ';'])
            .map(str::trim)
            .filter(|address| !address.is_empty())
            .collect()
    }
}

impl std::fmt::Display for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.target)
    }
}
