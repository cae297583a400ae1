use async_trait::async_trait;
use std::io::Write;
use std::sync::Arc;
use weave_input::{
    Attachment, DocumentKind, ExtractionError, HumanInputComposer, TextExtractor,
};
use weave_llm::{Content, ContentBlock, Message};

fn blocks(message: &Message) -> Vec<ContentBlock> {
    match message.content() {
        Content::Blocks(blocks) => blocks.clone(),
        Content::Text(text) => vec![ContentBlock::text(text.clone())],
    }
}

fn docx_bytes(paragraphs: &[&str]) -> Vec<u8> {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", p))
        .collect();
    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><w:document><w:body>{}</w:body></w:document>"#,
        body
    );

    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    writer
        .start_file("word/document.xml", zip::write::SimpleFileOptions::default())
        .unwrap();
    writer.write_all(xml.as_bytes()).unwrap();
    writer.finish().unwrap().into_inner()
}

#[tokio::test]
async fn test_text_only() {
    let message = HumanInputComposer::default().compose("Hello", &[]).await;

    assert!(matches!(message, Message::Human { .. }));
    assert_eq!(blocks(&message), vec![ContentBlock::text("Hello")]);
}

#[tokio::test]
async fn test_unsupported_attachment_is_dropped() {
    let attachments = vec![Attachment::new("bundle.zip", "application/zip", vec![0x50, 0x4b])];
    let message = HumanInputComposer::default().compose("see attached", &attachments).await;

    assert_eq!(blocks(&message), vec![ContentBlock::text("see attached")]);
}

#[tokio::test]
async fn test_mixed_attachments_keep_order() {
    let attachments = vec![
        Attachment::new("notes.txt", "text/plain", b"first file".to_vec()),
        Attachment::new("pic.png", "image/png", vec![1, 2, 3]),
        Attachment::new("data.csv", "text/csv", b"a,b\n1,2".to_vec()),
        Attachment::new("report.docx", weave_input::attachment::MIME_DOCX, docx_bytes(&["Title", "Body"])),
    ];

    let message = HumanInputComposer::default().compose("summarize", &attachments).await;
    let blocks = blocks(&message);

    assert_eq!(blocks.len(), 5);
    assert_eq!(blocks[0], ContentBlock::text("summarize"));
    assert_eq!(
        blocks[1],
        ContentBlock::file("notes.txt", "--- Content of notes.txt ---\nfirst file")
    );
    assert_eq!(blocks[2], ContentBlock::image_url("data:image/png;base64,AQID"));
    assert_eq!(
        blocks[3],
        ContentBlock::file("data.csv", "--- Content of data.csv ---\na,b\n1,2")
    );
    assert_eq!(
        blocks[4],
        ContentBlock::file("report.docx", "--- Content of report.docx ---\nTitle\nBody")
    );
}

#[tokio::test]
async fn test_broken_documents_are_skipped() {
    let attachments = vec![
        Attachment::new("broken.pdf", "application/pdf", b"not a pdf".to_vec()),
        Attachment::new("broken.docx", weave_input::attachment::MIME_DOCX, b"not a zip".to_vec()),
        Attachment::new("binary.txt", "text/plain", vec![0xff, 0xfe, 0xfd]),
        Attachment::new("ok.json", "application/json", br#"{"k": 1}"#.to_vec()),
    ];

    let message = HumanInputComposer::default().compose("files", &attachments).await;
    let blocks = blocks(&message);

    assert_eq!(blocks.len(), 2);
    assert_eq!(
        blocks[1],
        ContentBlock::file("ok.json", "--- Content of ok.json ---\n{\"k\": 1}")
    );
}

struct FailingExtractor;

#[async_trait]
impl TextExtractor for FailingExtractor {
    async fn extract(&self, attachment: &Attachment, _kind: DocumentKind) -> Result<String, ExtractionError> {
        Err(ExtractionError::Unsupported(attachment.mime_type.clone()))
    }
}

#[tokio::test]
async fn test_custom_extractor_failure_keeps_images() {
    let composer = HumanInputComposer::new(Arc::new(FailingExtractor));
    let attachments = vec![
        Attachment::new("a.txt", "text/plain", b"text".to_vec()),
        Attachment::new("b.jpeg", "image/jpeg", vec![0]),
    ];

    let message = composer.compose("hi", &attachments).await;
    let blocks = blocks(&message);

    assert_eq!(blocks.len(), 2);
    assert!(matches!(blocks[1], ContentBlock::ImageUrl { .. }));
}
