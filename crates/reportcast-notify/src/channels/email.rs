use crate::error::{NotifyError, Result};
use crate::message::RenderedMessage;
use crate::plugin::ChannelPlugin;
use crate::recipient::Destination;
use crate::sanitize;
use crate::transport::{MailTransport, MimeSubtype, OutgoingMail, SmtpConfig, SmtpMailTransport};
use crate::NotificationChannel;
use async_trait::async_trait;
use chrono::Utc;
use html_escape::{encode_double_quoted_attribute, encode_text};
use lettre::message::Mailbox;
use reportcast_common::types::{ChannelKind, ReportContent};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Operator configuration for the email channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailSettings {
    /// Sender address; its domain namespaces generated content ids.
    pub from: String,
    #[serde(default = "default_subject_prefix")]
    pub subject_prefix: String,
    #[serde(default = "default_link_label")]
    pub link_label: String,
    #[serde(default = "default_image_width")]
    pub image_width: String,
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    #[serde(default = "default_smtp_tls")]
    pub smtp_tls: bool,
}

fn default_subject_prefix() -> String {
    "[Report]".to_string()
}

fn default_link_label() -> String {
    "Explore in dashboard".to_string()
}

fn default_image_width() -> String {
    "1000px".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_smtp_tls() -> bool {
    true
}

impl EmailSettings {
    pub fn new(from: impl Into<String>, smtp_host: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            subject_prefix: default_subject_prefix(),
            link_label: default_link_label(),
            image_width: default_image_width(),
            smtp_host: smtp_host.into(),
            smtp_port: default_smtp_port(),
            smtp_username: None,
            smtp_password: None,
            smtp_tls: default_smtp_tls(),
        }
    }

    pub fn smtp_config(&self) -> SmtpConfig {
        SmtpConfig {
            host: self.smtp_host.clone(),
            port: self.smtp_port,
            username: self.smtp_username.clone(),
            password: self.smtp_password.clone(),
            tls: self.smtp_tls,
        }
    }
}

/// Body used when the report run itself failed.
pub fn error_template(text: &str) -> String {
    format!("Error: {}", encode_text(text))
}

/// Turns report content into an HTML email.
///
/// Descriptions lose all markup; embedded data keeps table structure only.
/// A screenshot is attached inline under a content id generated per render,
/// a CSV export as `{name}.csv`.
#[derive(Debug, Clone)]
pub struct EmailRenderer {
    domain: String,
    subject_prefix: String,
    link_label: String,
    image_width: String,
}

impl EmailRenderer {
    pub fn new(settings: &EmailSettings) -> Result<Self> {
        let from: Mailbox = settings
            .from
            .parse()
            .map_err(|e| NotifyError::InvalidConfig(format!("invalid from address '{}': {e}", settings.from)))?;

        Ok(Self {
            domain: from.email.domain().to_string(),
            subject_prefix: settings.subject_prefix.clone(),
            link_label: settings.link_label.clone(),
            image_width: settings.image_width.clone(),
        })
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn render(&self, content: &ReportContent) -> RenderedMessage {
        let subject = self.subject(&content.name);

        if let Some(text) = &content.error_text {
            return RenderedMessage {
                subject,
                body: error_template(text),
                ..Default::default()
            };
        }

        let content_id = content.screenshot.as_ref().map(|_| self.content_id());

        let description = sanitize::strip_tags(content.description.as_deref().unwrap_or_default());
        let embedded_data =
            sanitize::clean_table_html(content.embedded_data_html.as_deref().unwrap_or_default());
        let link = content
            .url
            .as_deref()
            .map(|url| {
                format!(
                    "<b><a href=\"{}\">{}</a></b><p></p>",
                    encode_double_quoted_attribute(url),
                    encode_text(&self.link_label)
                )
            })
            .unwrap_or_default();
        let img_tag = content_id
            .as_deref()
            .map(|cid| {
                format!(
                    "<img width=\"{}\" src=\"cid:{}\">",
                    encode_double_quoted_attribute(&self.image_width),
                    cid
                )
            })
            .unwrap_or_default();

        let body = format!("<p>{description}</p>\n{link}\n{embedded_data}\n{img_tag}\n");

        let mut inline_images = HashMap::new();
        if let (Some(cid), Some(screenshot)) = (content_id, &content.screenshot) {
            inline_images.insert(cid, screenshot.clone());
        }

        let mut file_attachments = HashMap::new();
        if let Some(csv) = &content.csv {
            file_attachments.insert(format!("{}.csv", content.name), csv.clone());
        }

        RenderedMessage {
            subject,
            body,
            inline_images,
            file_attachments,
        }
    }

    /// `"{prefix} {name}"` with line breaks folded so neither part can inject headers.
    fn subject(&self, name: &str) -> String {
        format!("{} {}", header_text(&self.subject_prefix), header_text(name))
            .trim()
            .to_string()
    }

    /// Message-id style token without the `<` `>` delimiters.
    fn content_id(&self) -> String {
        format!(
            "{}.{}@{}",
            Utc::now().format("%Y%m%d%H%M%S%6f"),
            Uuid::new_v4().simple(),
            self.domain
        )
    }
}

fn header_text(value: &str) -> String {
    value.replace(['\r', '\n'], " ").trim().to_string()
}

pub struct EmailChannel {
    renderer: EmailRenderer,
    transport: Arc<dyn MailTransport>,
}

impl EmailChannel {
    pub fn new(settings: &EmailSettings, transport: Arc<dyn MailTransport>) -> Result<Self> {
        Ok(Self {
            renderer: EmailRenderer::new(settings)?,
            transport,
        })
    }

    /// Email channel sending through SMTP as configured in `settings`.
    pub fn smtp(settings: &EmailSettings) -> Result<Self> {
        let transport = SmtpMailTransport::new(&settings.smtp_config(), &settings.from)
            .map_err(|e| NotifyError::InvalidConfig(format!("SMTP transport: {e}")))?;
        Self::new(settings, Arc::new(transport))
    }

    pub fn renderer(&self) -> &EmailRenderer {
        &self.renderer
    }
}

#[async_trait]
impl NotificationChannel for EmailChannel {
    fn channel_kind(&self) -> ChannelKind {
        ChannelKind::Email
    }

    fn render(&self, content: &ReportContent) -> Result<RenderedMessage> {
        Ok(self.renderer.render(content))
    }

    async fn send(&self, destination: &Destination, message: RenderedMessage) -> Result<()> {
        let mail = OutgoingMail {
            to: destination.addresses().into_iter().map(str::to_string).collect(),
            subject: message.subject,
            body: message.body,
            files: Vec::new(),
            data: message.file_attachments,
            images: message.inline_images,
            bcc: Vec::new(),
            mime_subtype: MimeSubtype::Related,
            dry_run: false,
        };

        tracing::debug!(
            transport = self.transport.name(),
            mime = mail.mime_subtype.as_str(),
            recipients = mail.to.len(),
            "Handing report email to transport"
        );
        self.transport.send_mail(&mail).await?;
        Ok(())
    }
}

// Plugin

pub struct EmailPlugin;

impl ChannelPlugin for EmailPlugin {
    fn name(&self) -> &str {
        "email"
    }

    fn kind(&self) -> ChannelKind {
        ChannelKind::Email
    }

    fn validate_config(&self, config: &Value) -> Result<()> {
        let settings: EmailSettings = serde_json::from_value(config.clone())
            .map_err(|e| NotifyError::InvalidConfig(format!("invalid email config: {e}")))?;
        EmailRenderer::new(&settings)?;
        Ok(())
    }

    fn create_channel(&self, config: &Value) -> Result<Arc<dyn NotificationChannel>> {
        let settings: EmailSettings = serde_json::from_value(config.clone())
            .map_err(|e| NotifyError::InvalidConfig(format!("invalid email config: {e}")))?;
        Ok(Arc::new(EmailChannel::smtp(&settings)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{MockMailTransport, SmtpSecurity};

    fn settings() -> EmailSettings {
        EmailSettings::new("Reports <reports@example.com>", "smtp.example.com")
    }

    fn renderer() -> EmailRenderer {
        EmailRenderer::new(&settings()).unwrap()
    }

    fn sales_report() -> ReportContent {
        ReportContent::new("Sales")
            .with_description("<b>hi</b><script>x</script>")
            .with_url("http://x/y")
            .with_embedded_data("<table><tr><td>1</td></tr></table><script>bad()</script>")
            .with_screenshot(b"PNGDATA".to_vec())
            .with_csv(b"a,b\n1,2".to_vec())
    }

    #[test]
    fn domain_comes_from_from_address() {
        assert_eq!(renderer().domain(), "example.com");

        let bare = EmailRenderer::new(&EmailSettings::new("ops@reports.example.org", "smtp")).unwrap();
        assert_eq!(bare.domain(), "reports.example.org");
    }

    #[test]
    fn default_smtp_settings_use_starttls_submission() {
        let config = settings().smtp_config();
        assert_eq!(config.port, 587);
        assert_eq!(config.security(), SmtpSecurity::StartTls);
    }

    #[test]
    fn invalid_from_address_is_a_config_error() {
        let err = EmailRenderer::new(&EmailSettings::new("not-an-address", "smtp")).unwrap_err();
        assert!(matches!(err, NotifyError::InvalidConfig(_)), "got {err:?}");
    }

    #[test]
    fn renders_full_report() {
        let message = renderer().render(&sales_report());

        assert_eq!(message.subject, "[Report] Sales");
        assert!(message.body.contains("<p>hix</p>"), "{}", message.body);
        assert!(!message.body.contains("<b>"));
        assert!(!message.body.contains("<script"));
        assert!(message.body.contains(r#"<a href="http://x/y">Explore in dashboard</a>"#));
        // The parser supplies the implied tbody; script text stays as inert text.
        assert!(message
            .body
            .contains("\n<table><tbody><tr><td>1</td></tr></tbody></table>bad()\n"), "{}", message.body);

        assert_eq!(message.inline_images.len(), 1);
        let (cid, bytes) = message.inline_images.iter().next().unwrap();
        assert_eq!(bytes, b"PNGDATA");
        assert!(cid.ends_with("@example.com"));
        assert!(!cid.contains('<') && !cid.contains('>'));
        assert!(message
            .body
            .contains(&format!(r#"<img width="1000px" src="cid:{cid}">"#)));

        assert_eq!(
            message.file_attachments,
            HashMap::from([("Sales.csv".to_string(), b"a,b\n1,2".to_vec())])
        );
    }

    #[test]
    fn no_screenshot_means_no_image_reference() {
        let content = ReportContent::new("Sales").with_csv(b"a,b".to_vec());
        let message = renderer().render(&content);

        assert!(message.inline_images.is_empty());
        assert!(!message.body.contains("<img"));
        assert!(!message.body.contains("cid:"));
        assert_eq!(message.file_attachments.len(), 1);
    }

    #[test]
    fn bare_content_has_no_attachments_or_null_markers() {
        let message = renderer().render(&ReportContent::new("Sales"));

        assert!(!message.has_attachments());
        assert!(message.body.starts_with("<p></p>"));
        assert!(!message.body.contains("None"));
        assert!(!message.body.contains("null"));
        assert!(!message.body.contains("<a "));
    }

    #[test]
    fn error_text_takes_precedence() {
        let content = ReportContent {
            error_text: Some("query <timed> out".to_string()),
            ..sales_report()
        };
        let message = renderer().render(&content);

        assert_eq!(message.body, error_template("query <timed> out"));
        assert_eq!(message.body, "Error: query &lt;timed&gt; out");
        assert!(!message.has_attachments());
        assert_eq!(message.subject, "[Report] Sales");
    }

    #[test]
    fn content_ids_are_unique_per_render() {
        let renderer = renderer();
        let content = ReportContent::new("Sales").with_screenshot(b"PNG".to_vec());

        let first = renderer.render(&content);
        let second = renderer.render(&content);
        let first_cid = first.inline_images.keys().next().unwrap();
        let second_cid = second.inline_images.keys().next().unwrap();
        assert_ne!(first_cid, second_cid);
    }

    #[test]
    fn url_is_attribute_escaped() {
        let content = ReportContent::new("Sales").with_url(r#"http://x/y?a=1&b="2""#);
        let message = renderer().render(&content);
        assert!(message
            .body
            .contains(r#"href="http://x/y?a=1&amp;b=&quot;2&quot;""#), "{}", message.body);
    }

    #[test]
    fn subject_cannot_inject_headers() {
        let mut settings = settings();
        settings.subject_prefix = "[Weekly]\r\nBcc: x@evil.com".to_string();
        let renderer = EmailRenderer::new(&settings).unwrap();

        let message = renderer.render(&ReportContent::new("Sales\nReport"));
        assert!(!message.subject.contains('\n'));
        assert!(!message.subject.contains('\r'));
        assert!(message.subject.starts_with("[Weekly]"));
    }

    #[test]
    fn empty_prefix_yields_bare_name() {
        let mut settings = settings();
        settings.subject_prefix = String::new();
        let renderer = EmailRenderer::new(&settings).unwrap();
        assert_eq!(renderer.render(&ReportContent::new("Sales")).subject, "Sales");
    }

    #[tokio::test]
    async fn send_hands_related_mail_to_transport() {
        let transport = Arc::new(MockMailTransport::new());
        let channel = EmailChannel::new(&settings(), transport.clone()).unwrap();

        let message = channel.render(&sales_report()).unwrap();
        let destination = channel.resolve_recipient(br#"{"target": "a@x.com; b@x.com"}"#).unwrap();
        channel.send(&destination, message).await.unwrap();

        let sent = transport.sent_mails().await;
        assert_eq!(sent.len(), 1);
        let mail = &sent[0];
        assert_eq!(mail.to, vec!["a@x.com", "b@x.com"]);
        assert_eq!(mail.mime_subtype, MimeSubtype::Related);
        assert!(!mail.dry_run);
        assert!(mail.files.is_empty());
        assert!(mail.bcc.is_empty());
        assert_eq!(mail.images.len(), 1);
        assert!(mail.data.contains_key("Sales.csv"));
    }

    #[test]
    fn plugin_validates_config() {
        let plugin = EmailPlugin;
        let valid = serde_json::json!({
            "from": "reports@example.com",
            "smtp_host": "smtp.example.com",
        });
        assert!(plugin.validate_config(&valid).is_ok());

        let bad_from = serde_json::json!({
            "from": "reports",
            "smtp_host": "smtp.example.com",
        });
        assert!(plugin.validate_config(&bad_from).is_err());

        assert!(plugin.validate_config(&serde_json::json!({})).is_err());
    }
}
