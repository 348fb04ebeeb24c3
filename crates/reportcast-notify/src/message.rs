use std::collections::HashMap;

/// Channel-specific rendering of a report, built fresh for each send attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedMessage {
    pub subject: String,
    pub body: String,
    /// Inline images keyed by the content id the body references.
    pub inline_images: HashMap<String, Vec<u8>>,
    /// File attachments keyed by filename.
    pub file_attachments: HashMap<String, Vec<u8>>,
}

impl RenderedMessage {
    pub fn has_attachments(&self) -> bool {
        !self.inline_images.is_empty() || !self.file_attachments.is_empty()
    }
}
