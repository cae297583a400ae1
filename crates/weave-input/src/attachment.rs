pub const MIME_PDF: &str = "application/pdf";
pub const MIME_DOCX: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const MIME_CSV: &str = "text/csv";
pub const MIME_TEXT: &str = "text/plain";
pub const MIME_JSON: &str = "application/json";

/// Upload limits enforced at the HTTP boundary
pub const MAX_ATTACHMENTS: usize = 5;
pub const MAX_ATTACHMENT_BYTES: usize = 10 * 1024 * 1024;

/// One uploaded file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl Attachment {
    pub fn new(filename: impl Into<String>, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            mime_type: mime_type.into(),
            data,
        }
    }

    pub fn kind(&self) -> Option<AttachmentKind> {
        AttachmentKind::classify(&self.mime_type)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
    Csv,
    Text,
    Json,
}

impl DocumentKind {
    pub fn from_mime(mime: &str) -> Option<Self> {
        match essence(mime).as_str() {
            MIME_PDF => Some(Self::Pdf),
            MIME_DOCX => Some(Self::Docx),
            MIME_CSV => Some(Self::Csv),
            MIME_TEXT => Some(Self::Text),
            MIME_JSON => Some(Self::Json),
            _ => None,
        }
    }

    /// Plain UTF-8 formats that need no parsing
    pub fn is_textual(&self) -> bool {
        matches!(self, Self::Csv | Self::Text | Self::Json)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    Image,
    Document(DocumentKind),
}

impl AttachmentKind {
    /// `None` for MIME types the composer drops
    pub fn classify(mime: &str) -> Option<Self> {
        let essence = essence(mime);
        if essence.starts_with("image/") && essence.len() > "image/".len() {
            return Some(Self::Image);
        }
        DocumentKind::from_mime(&essence).map(Self::Document)
    }
}

pub fn is_supported_mime(mime: &str) -> bool {
    AttachmentKind::classify(mime).is_some()
}

/// Lower-cased MIME type without parameters (`text/plain; charset=utf-8` -> `text/plain`)
pub(crate) fn essence(mime: &str) -> String {
    mime.split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(AttachmentKind::classify("image/png"), Some(AttachmentKind::Image));
        assert_eq!(AttachmentKind::classify("IMAGE/WEBP"), Some(AttachmentKind::Image));
        assert_eq!(
            AttachmentKind::classify("text/plain; charset=utf-8"),
            Some(AttachmentKind::Document(DocumentKind::Text))
        );
        assert_eq!(
            AttachmentKind::classify(MIME_DOCX),
            Some(AttachmentKind::Document(DocumentKind::Docx))
        );
        assert_eq!(AttachmentKind::classify("application/zip"), None);
        assert_eq!(AttachmentKind::classify("image/"), None);
        assert_eq!(AttachmentKind::classify(""), None);
    }

    #[test]
    fn test_textual_kinds() {
        assert!(DocumentKind::Csv.is_textual());
        assert!(DocumentKind::Json.is_textual());
        assert!(!DocumentKind::Pdf.is_textual());
        assert!(!DocumentKind::Docx.is_textual());
    }
}
