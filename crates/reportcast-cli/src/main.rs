use anyhow::Result;
use reportcast_notify::plugin::ChannelRegistry;
use reportcast_notify::{NotificationChannel, NotificationDispatcher};
use std::path::Path;
use tracing_subscriber::EnvFilter;

mod config;

use config::{load_recipients, CliConfig, ReportManifest};

#[allow(clippy::print_stderr)]
fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  reportcast send <config.toml> <report.json> <recipients.json>   Render and deliver a report");
    eprintln!("  reportcast render <config.toml> <report.json>                   Print the rendered message without sending");
    eprintln!("  reportcast check-config <config.toml>                           Validate channels and print them redacted");
}

#[tokio::main]
async fn main() -> Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|e| anyhow::anyhow!("Failed to install default CryptoProvider: {e:?}"))?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("reportcast=info".parse()?))
        .init();

    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(|s| s.as_str()) {
        Some("send") => {
            run_send(
                arg(&args, 2, "<config.toml>")?,
                arg(&args, 3, "<report.json>")?,
                arg(&args, 4, "<recipients.json>")?,
            )
            .await
        }
        Some("render") => run_render(arg(&args, 2, "<config.toml>")?, arg(&args, 3, "<report.json>")?),
        Some("check-config") => run_check_config(arg(&args, 2, "<config.toml>")?),
        Some("--help" | "-h") => {
            print_usage();
            Ok(())
        }
        _ => {
            print_usage();
            Err(anyhow::anyhow!("unknown or missing command"))
        }
    }
}

fn arg<'a>(args: &'a [String], index: usize, what: &str) -> Result<&'a str> {
    args.get(index).map(String::as_str).ok_or_else(|| {
        print_usage();
        anyhow::anyhow!("missing {what} argument")
    })
}

fn load_report(report_path: &str) -> Result<reportcast_common::types::ReportContent> {
    let base_dir = Path::new(report_path).parent().unwrap_or_else(|| Path::new("."));
    ReportManifest::load(report_path)?.into_content(base_dir)
}

fn build_dispatcher(config: &CliConfig) -> Result<NotificationDispatcher> {
    let registry = ChannelRegistry::default();
    let dispatcher = NotificationDispatcher::from_configs(&registry, config.enabled_channels())?;
    Ok(dispatcher)
}

async fn run_send(config_path: &str, report_path: &str, recipients_path: &str) -> Result<()> {
    let config = CliConfig::load(config_path)?;
    let dispatcher = build_dispatcher(&config)?;
    let content = load_report(report_path)?;
    let recipients = load_recipients(recipients_path)?;

    let outcomes = dispatcher.send_all(&content, &recipients).await;
    let failed = outcomes.iter().filter(|o| !o.is_delivered()).count();
    for outcome in &outcomes {
        if let Err(e) = &outcome.result {
            tracing::error!(recipient = outcome.index, channel = %outcome.kind, error = %e, "Delivery failed");
        }
    }

    tracing::info!(
        report = %content.name,
        delivered = outcomes.len() - failed,
        failed,
        "Dispatch finished"
    );

    if failed > 0 {
        return Err(anyhow::anyhow!("{failed} of {} deliveries failed", outcomes.len()));
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
fn run_render(config_path: &str, report_path: &str) -> Result<()> {
    let config = CliConfig::load(config_path)?;
    let registry = ChannelRegistry::default();
    let content = load_report(report_path)?;

    for (channel_type, channel_config) in config.enabled_channels() {
        let channel = registry.create_channel(channel_type, channel_config)?;
        let message = channel.render(&content)?;

        println!("== {channel_type}");
        println!("Subject: {}", message.subject);
        for (cid, bytes) in &message.inline_images {
            println!("Inline: {cid} ({} bytes)", bytes.len());
        }
        for (filename, bytes) in &message.file_attachments {
            println!("Attachment: {filename} ({} bytes)", bytes.len());
        }
        println!();
        println!("{}", message.body);
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
fn run_check_config(config_path: &str) -> Result<()> {
    let config = CliConfig::load(config_path)?;
    let registry = ChannelRegistry::default();

    for entry in &config.channels {
        let plugin = registry
            .get_plugin(&entry.channel_type)
            .ok_or_else(|| anyhow::anyhow!("Unknown channel plugin type: {}", entry.channel_type))?;
        plugin.validate_config(&entry.config)?;

        let redacted = plugin.redact_config(&entry.config);
        println!(
            "{} ({}): {}",
            entry.channel_type,
            if entry.enabled { "enabled" } else { "disabled" },
            serde_json::to_string_pretty(&redacted)?
        );
    }
    Ok(())
}
