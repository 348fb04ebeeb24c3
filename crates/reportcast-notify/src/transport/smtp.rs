use super::{MailTransport, MimeSubtype, OutgoingMail};
use crate::error::TransportError;
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, MultiPartBuilder, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::path::Path;

/// Port where SMTP servers expect a TLS handshake before the greeting.
pub const SMTPS_PORT: u16 = 465;

/// SMTP connection settings.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Encrypt the connection: implicit TLS on [`SMTPS_PORT`], STARTTLS on
    /// any other port. `false` connects in plain text (local relays, Mailpit).
    pub tls: bool,
}

/// How the client secures its connection to the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmtpSecurity {
    ImplicitTls,
    StartTls,
    Plain,
}

impl SmtpConfig {
    pub fn security(&self) -> SmtpSecurity {
        match (self.tls, self.port) {
            (false, _) => SmtpSecurity::Plain,
            (true, SMTPS_PORT) => SmtpSecurity::ImplicitTls,
            (true, _) => SmtpSecurity::StartTls,
        }
    }
}

/// [`MailTransport`] backed by lettre's async SMTP client.
pub struct SmtpMailTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailTransport {
    pub fn new(config: &SmtpConfig, from: &str) -> Result<Self, TransportError> {
        let from = parse_mailbox(from)?;

        let mut builder = match config.security() {
            SmtpSecurity::ImplicitTls => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?,
            SmtpSecurity::StartTls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?,
            SmtpSecurity::Plain => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host),
        }
        .port(config.port);

        if let (Some(user), Some(pass)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }

    async fn build_message(&self, mail: &OutgoingMail) -> Result<Message, TransportError> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(mail.subject.clone());
        for address in &mail.to {
            builder = builder.to(parse_mailbox(address)?);
        }
        for address in &mail.bcc {
            builder = builder.bcc(parse_mailbox(address)?);
        }

        let mut multipart =
            multipart_builder(mail.mime_subtype).singlepart(SinglePart::html(mail.body.clone()));

        for path in &mail.files {
            let bytes = tokio::fs::read(path)
                .await
                .map_err(|source| TransportError::Attachment {
                    path: path.display().to_string(),
                    source,
                })?;
            multipart = multipart.singlepart(
                Attachment::new(file_name(path)).body(bytes, content_type("application/octet-stream")?),
            );
        }

        let mut data: Vec<_> = mail.data.iter().collect();
        data.sort_by(|a, b| a.0.cmp(b.0));
        for (filename, bytes) in data {
            multipart = multipart.singlepart(
                Attachment::new(filename.clone())
                    .body(bytes.clone(), content_type("application/octet-stream")?),
            );
        }

        for (content_id, bytes) in &mail.images {
            multipart = multipart.singlepart(
                Attachment::new_inline(content_id.clone())
                    .body(bytes.clone(), content_type(sniff_image_type(bytes))?),
            );
        }

        builder
            .multipart(multipart)
            .map_err(|e| TransportError::Message(e.to_string()))
    }
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn send_mail(&self, mail: &OutgoingMail) -> Result<(), TransportError> {
        let message = self.build_message(mail).await?;

        if mail.dry_run {
            tracing::info!(
                transport = self.name(),
                mime = mail.mime_subtype.as_str(),
                recipients = mail.to.len(),
                subject = %mail.subject,
                "Dry run, email not sent"
            );
            return Ok(());
        }

        self.transport.send(message).await?;
        Ok(())
    }

    fn name(&self) -> &str {
        "smtp"
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, TransportError> {
    address
        .parse()
        .map_err(|source| TransportError::InvalidAddress {
            address: address.to_string(),
            source,
        })
}

fn multipart_builder(subtype: MimeSubtype) -> MultiPartBuilder {
    match subtype {
        MimeSubtype::Related => MultiPart::related(),
        MimeSubtype::Mixed => MultiPart::mixed(),
        MimeSubtype::Alternative => MultiPart::alternative(),
    }
}

fn content_type(mime: &str) -> Result<ContentType, TransportError> {
    ContentType::parse(mime)
        .map_err(|e| TransportError::Message(format!("invalid content type '{mime}': {e}")))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "attachment".to_string())
}

fn sniff_image_type(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        "image/png"
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        "image/jpeg"
    } else if bytes.starts_with(b"GIF8") {
        "image/gif"
    } else {
        "application/octet-stream"
    }
}
