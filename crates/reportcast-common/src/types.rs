use serde::{Deserialize, Serialize};

/// Output of a report run, as handed over by the scheduler.
///
/// When `error_text` is set the run failed upstream and every success field
/// is ignored by renderers.
///
/// # Examples
///
/// ```
/// use reportcast_common::types::ReportContent;
///
/// let content = ReportContent::new("Sales")
///     .with_description("Weekly numbers")
///     .with_csv(b"a,b\n1,2".to_vec());
/// assert!(!content.is_error());
/// assert_eq!(content.csv.as_deref(), Some(&b"a,b\n1,2"[..]));
///
/// let failed = ReportContent::failed("Sales", "query timed out");
/// assert!(failed.is_error());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportContent {
    pub name: String,
    #[serde(default)]
    pub error_text: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Link back to the dashboard or explore view the report was built from.
    #[serde(default)]
    pub url: Option<String>,
    /// HTML table rendered from the report's dataset. May carry user data.
    #[serde(default)]
    pub embedded_data_html: Option<String>,
    #[serde(default)]
    pub screenshot: Option<Vec<u8>>,
    #[serde(default)]
    pub csv: Option<Vec<u8>>,
}

impl ReportContent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Content for a report run that failed before producing any output.
    pub fn failed(name: impl Into<String>, error_text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            error_text: Some(error_text.into()),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_embedded_data(mut self, html: impl Into<String>) -> Self {
        self.embedded_data_html = Some(html.into());
        self
    }

    pub fn with_screenshot(mut self, png: Vec<u8>) -> Self {
        self.screenshot = Some(png);
        self
    }

    pub fn with_csv(mut self, csv: Vec<u8>) -> Self {
        self.csv = Some(csv);
        self
    }

    pub fn is_error(&self) -> bool {
        self.error_text.is_some()
    }
}

/// Delivery channel a recipient is configured for.
///
/// # Examples
///
/// ```
/// use reportcast_common::types::ChannelKind;
///
/// let kind: ChannelKind = "email".parse().unwrap();
/// assert_eq!(kind, ChannelKind::Email);
/// assert_eq!(kind.to_string(), "email");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum ChannelKind {
    Email,
}

impl ChannelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelKind::Email => "email",
        }
    }
}

impl std::fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ChannelKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "email" => Ok(ChannelKind::Email),
            _ => Err(format!("unknown channel kind: {s}")),
        }
    }
}
