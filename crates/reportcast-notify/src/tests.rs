use crate::dispatcher::NotificationDispatcher;
use crate::error::NotifyError;
use crate::plugin::ChannelRegistry;
use crate::NotificationChannel;
use reportcast_common::types::ChannelKind;

fn email_config() -> serde_json::Value {
    serde_json::json!({
        "from": "Reports <reports@example.com>",
        "subject_prefix": "[Weekly]",
        "smtp_host": "localhost",
        "smtp_port": 1025,
        "smtp_username": "reports",
        "smtp_password": "hunter2",
        "smtp_tls": false
    })
}

// ── Plugin registry tests ──

#[test]
fn registry_default_has_email_plugin() {
    let registry = ChannelRegistry::default();
    assert_eq!(registry.plugin_names(), vec!["email"]);

    let plugin = registry.get_plugin("email").unwrap();
    assert_eq!(plugin.kind(), ChannelKind::Email);
}

#[test]
fn registry_unknown_plugin_returns_error() {
    let registry = ChannelRegistry::default();
    let config = serde_json::json!({});
    let err = registry
        .create_channel("nonexistent", &config)
        .err()
        .expect("should return error for unknown plugin");
    assert!(matches!(err, NotifyError::UnknownChannelType(_)), "got {err:?}");
    assert!(err.to_string().contains("nonexistent"));
}

#[test]
fn email_plugin_creates_channel() {
    let registry = ChannelRegistry::default();

    let channel = registry.create_channel("email", &email_config()).unwrap();
    assert_eq!(channel.channel_kind(), ChannelKind::Email);

    let invalid = serde_json::json!({ "smtp_host": "localhost" });
    assert!(registry.create_channel("email", &invalid).is_err());
}

#[test]
fn email_config_defaults_apply() {
    let registry = ChannelRegistry::default();
    let minimal = serde_json::json!({
        "from": "reports@example.com",
        "smtp_host": "localhost",
        "smtp_tls": false
    });
    let channel = registry.create_channel("email", &minimal).unwrap();

    let content = reportcast_common::types::ReportContent::new("Sales");
    let message = channel.render(&content).unwrap();
    assert_eq!(message.subject, "[Report] Sales");
}

#[test]
fn registry_redacts_smtp_password() {
    let registry = ChannelRegistry::default();
    let redacted = registry.redact_config("email", &email_config()).unwrap();

    assert_eq!(redacted["smtp_password"], "***");
    assert_eq!(redacted["smtp_username"], "reports");
    assert_eq!(redacted["from"], "Reports <reports@example.com>");
}

#[test]
fn dispatcher_from_configs_registers_channels() {
    let registry = ChannelRegistry::default();
    let config = email_config();

    let dispatcher = NotificationDispatcher::from_configs(&registry, [("email", &config)]).unwrap();
    assert!(dispatcher.has_channel(ChannelKind::Email));

    let bad = serde_json::json!({ "from": "nobody", "smtp_host": "localhost" });
    assert!(NotificationDispatcher::from_configs(&registry, [("email", &bad)]).is_err());
}
