use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub channels: Vec<ChannelEntry>,
}

/// One configured channel; `config` is validated by the matching plugin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelEntry {
    pub channel_type: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub config: serde_json::Value,
}

fn default_enabled() -> bool {
    true
}

impl CliConfig {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{path}'"))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file '{path}'"))?;
        Ok(config)
    }

    pub fn enabled_channels(&self) -> impl Iterator<Item = (&str, &serde_json::Value)> {
        self.channels
            .iter()
            .filter(|entry| entry.enabled)
            .map(|entry| (entry.channel_type.as_str(), &entry.config))
    }
}

/// Report as described on disk: binary outputs are referenced by path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportManifest {
    pub name: String,
    #[serde(default)]
    pub error_text: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub embedded_data_html: Option<String>,
    #[serde(default)]
    pub screenshot_path: Option<String>,
    #[serde(default)]
    pub csv_path: Option<String>,
}

impl ReportManifest {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read report file '{path}'"))?;
        serde_json::from_str(&content).with_context(|| format!("Failed to parse report file '{path}'"))
    }

    /// Reads referenced files, resolving relative paths against `base_dir`.
    pub fn into_content(self, base_dir: &Path) -> anyhow::Result<reportcast_common::types::ReportContent> {
        let read = |path: Option<String>| -> anyhow::Result<Option<Vec<u8>>> {
            path.map(|p| {
                let full = base_dir.join(&p);
                std::fs::read(&full).with_context(|| format!("Failed to read '{}'", full.display()))
            })
            .transpose()
        };

        Ok(reportcast_common::types::ReportContent {
            screenshot: read(self.screenshot_path)?,
            csv: read(self.csv_path)?,
            name: self.name,
            error_text: self.error_text,
            description: self.description,
            url: self.url,
            embedded_data_html: self.embedded_data_html,
        })
    }
}

/// Entry of the recipients file: `[{"kind": "email", "config": {"target": "..."}}]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipientEntry {
    pub kind: reportcast_common::types::ChannelKind,
    pub config: serde_json::Value,
}

pub fn load_recipients(path: &str) -> anyhow::Result<Vec<reportcast_notify::Recipient>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read recipients file '{path}'"))?;
    let entries: Vec<RecipientEntry> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse recipients file '{path}'"))?;
    Ok(entries
        .into_iter()
        .map(|entry| reportcast_notify::Recipient::new(entry.kind, entry.config.to_string()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_channel_config_from_toml() {
        let config: CliConfig = toml::from_str(
            r#"
            [[channels]]
            channel_type = "email"
            [channels.config]
            from = "reports@example.com"
            smtp_host = "smtp.example.com"
            smtp_port = 2525

            [[channels]]
            channel_type = "email"
            enabled = false
            [channels.config]
            from = "old@example.com"
            smtp_host = "old.example.com"
            "#,
        )
        .unwrap();

        let enabled: Vec<_> = config.enabled_channels().collect();
        assert_eq!(enabled.len(), 1);
        assert_eq!(enabled[0].0, "email");
        assert_eq!(enabled[0].1["smtp_port"], 2525);
    }

    #[test]
    fn manifest_reads_referenced_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut csv = std::fs::File::create(dir.path().join("sales.csv")).unwrap();
        csv.write_all(b"a,b\n1,2").unwrap();

        let manifest = ReportManifest {
            name: "Sales".to_string(),
            error_text: None,
            description: Some("weekly".to_string()),
            url: None,
            embedded_data_html: None,
            screenshot_path: None,
            csv_path: Some("sales.csv".to_string()),
        };
        let content = manifest.into_content(dir.path()).unwrap();
        assert_eq!(content.csv.as_deref(), Some(&b"a,b\n1,2"[..]));
        assert!(content.screenshot.is_none());
    }

    #[test]
    fn manifest_with_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = ReportManifest {
            name: "Sales".to_string(),
            error_text: None,
            description: None,
            url: None,
            embedded_data_html: None,
            screenshot_path: Some("missing.png".to_string()),
            csv_path: None,
        };
        assert!(manifest.into_content(dir.path()).is_err());
    }

    #[test]
    fn recipients_file_is_serialized_per_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recipients.json");
        std::fs::write(&path, r#"[{"kind": "email", "config": {"target": "a@b.com"}}]"#).unwrap();

        let recipients = load_recipients(path.to_str().unwrap()).unwrap();
        assert_eq!(recipients, vec![reportcast_notify::Recipient::email("a@b.com")]);
    }
}
