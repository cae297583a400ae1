pub mod attachment;
pub mod composer;
pub mod error;
pub mod extractor;

pub use attachment::{
    is_supported_mime, Attachment, AttachmentKind, DocumentKind, MAX_ATTACHMENTS, MAX_ATTACHMENT_BYTES,
};
pub use composer::HumanInputComposer;
pub use error::ExtractionError;
pub use extractor::{DefaultExtractor, TextExtractor};
