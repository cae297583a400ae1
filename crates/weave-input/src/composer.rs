use base64::Engine;
use futures::future::join_all;
use std::sync::Arc;
use weave_llm::{Content, ContentBlock, Message};

use crate::attachment::{essence, Attachment, AttachmentKind};
use crate::extractor::{DefaultExtractor, TextExtractor};

/// Builds the Human message for one user turn
///
/// The text block always comes first, then one block per accepted attachment
/// in upload order. Unsupported MIME types are dropped and extraction failures
/// are logged; neither fails the turn.
#[derive(Clone)]
pub struct HumanInputComposer {
    extractor: Arc<dyn TextExtractor>,
}

impl Default for HumanInputComposer {
    fn default() -> Self {
        Self::new(Arc::new(DefaultExtractor))
    }
}

impl HumanInputComposer {
    pub fn new(extractor: Arc<dyn TextExtractor>) -> Self {
        Self { extractor }
    }

    pub async fn compose(&self, text: &str, attachments: &[Attachment]) -> Message {
        let extracted = join_all(attachments.iter().map(|a| self.attachment_block(a))).await;

        let mut blocks = Vec::with_capacity(attachments.len() + 1);
        blocks.push(ContentBlock::text(text));
        blocks.extend(extracted.into_iter().flatten());

        Message::human(Content::blocks(blocks))
    }

    async fn attachment_block(&self, attachment: &Attachment) -> Option<ContentBlock> {
        match attachment.kind() {
            None => {
                tracing::debug!(
                    filename = %attachment.filename,
                    mime_type = %attachment.mime_type,
                    "skipping unsupported attachment"
                );
                None
            }
            Some(AttachmentKind::Image) => Some(image_block(attachment)),
            Some(AttachmentKind::Document(kind)) => {
                match self.extractor.extract(attachment, kind).await {
                    Ok(text) => Some(file_block(&attachment.filename, &text)),
                    Err(e) => {
                        tracing::warn!(
                            filename = %attachment.filename,
                            error = %e,
                            "attachment extraction failed"
                        );
                        None
                    }
                }
            }
        }
    }
}

/// Inline `data:<mime>;base64,<payload>` image reference
pub fn image_block(attachment: &Attachment) -> ContentBlock {
    let encoded = base64::engine::general_purpose::STANDARD.encode(&attachment.data);
    ContentBlock::image_url(format!("data:{};base64,{}", essence(&attachment.mime_type), encoded))
}

pub fn file_block(filename: &str, text: &str) -> ContentBlock {
    let filename = if filename.is_empty() { "unknown" } else { filename };
    ContentBlock::file(filename, format!("--- Content of {} ---\n{}", filename, text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_block_data_uri() {
        let attachment = Attachment::new("dot.png", "image/png", vec![1, 2, 3]);
        match image_block(&attachment) {
            ContentBlock::ImageUrl { image_url } => assert_eq!(image_url.url, "data:image/png;base64,AQID"),
            other => panic!("unexpected block {:?}", other),
        }
    }

    #[test]
    fn test_image_block_drops_mime_parameters() {
        let attachment = Attachment::new("dot.png", "Image/PNG; charset=x", vec![1, 2, 3]);
        match image_block(&attachment) {
            ContentBlock::ImageUrl { image_url } => assert_eq!(image_url.url, "data:image/png;base64,AQID"),
            other => panic!("unexpected block {:?}", other),
        }
    }

    #[test]
    fn test_file_block_header() {
        match file_block("", "body") {
            ContentBlock::File { filename, text } => {
                assert_eq!(filename, "unknown");
                assert_eq!(text, "--- Content of unknown ---\nbody");
            }
            other => panic!("unexpected block {:?}", other),
        }
    }
}
