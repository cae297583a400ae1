use async_trait::async_trait;
use std::io::{Cursor, Read};

use crate::attachment::{Attachment, DocumentKind};
use crate::error::ExtractionError;

/// Raw bytes + document kind -> plain text
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, attachment: &Attachment, kind: DocumentKind) -> Result<String, ExtractionError>;
}

/// Built-in extractor: UTF-8 for textual formats, `pdf-extract` for PDF and
/// `word/document.xml` for DOCX. Binary formats are parsed on the blocking pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultExtractor;

#[async_trait]
impl TextExtractor for DefaultExtractor {
    async fn extract(&self, attachment: &Attachment, kind: DocumentKind) -> Result<String, ExtractionError> {
        if kind.is_textual() {
            return utf8_text(&attachment.filename, &attachment.data);
        }

        let filename = attachment.filename.clone();
        let data = attachment.data.clone();
        tokio::task::spawn_blocking(move || match kind {
            DocumentKind::Pdf => pdf_text(&filename, &data),
            DocumentKind::Docx => docx_text(&filename, &data),
            _ => utf8_text(&filename, &data),
        })
        .await
        .map_err(|e| ExtractionError::Task(e.to_string()))?
    }
}

fn utf8_text(filename: &str, data: &[u8]) -> Result<String, ExtractionError> {
    let text = std::str::from_utf8(data).map_err(|_| ExtractionError::InvalidUtf8 {
        filename: filename.to_string(),
    })?;
    Ok(text.trim_start_matches('\u{feff}').to_string())
}

fn pdf_text(filename: &str, data: &[u8]) -> Result<String, ExtractionError> {
    pdf_extract::extract_text_from_mem(data)
        .map(|text| text.trim().to_string())
        .map_err(|e| ExtractionError::Pdf {
            filename: filename.to_string(),
            message: e.to_string(),
        })
}

fn docx_text(filename: &str, data: &[u8]) -> Result<String, ExtractionError> {
    let docx_err = |message: String| ExtractionError::Docx {
        filename: filename.to_string(),
        message,
    };

    let mut archive = zip::ZipArchive::new(Cursor::new(data)).map_err(|e| docx_err(e.to_string()))?;
    let mut document = archive
        .by_name("word/document.xml")
        .map_err(|e| docx_err(e.to_string()))?;

    let mut xml = String::new();
    document
        .read_to_string(&mut xml)
        .map_err(|e| docx_err(e.to_string()))?;

    Ok(wordprocessing_text(&xml))
}

/// Text runs of a WordprocessingML body; paragraphs and breaks become newlines
fn wordprocessing_text(xml: &str) -> String {
    let mut out = String::new();
    let mut rest = xml;

    while let Some(open) = rest.find('<') {
        let Some(len) = rest[open..].find('>') else {
            break;
        };
        let tag = &rest[open + 1..open + len];
        rest = &rest[open + len + 1..];

        let self_closing = tag.ends_with('/');
        let name = tag
            .trim_end_matches('/')
            .split_whitespace()
            .next()
            .unwrap_or_default();

        match name {
            "w:t" if !self_closing => {
                let close = rest.find("</w:t>").unwrap_or(rest.len());
                out.push_str(&unescape_xml(&rest[..close]));
                rest = &rest[close..];
            }
            "w:tab" => out.push('\t'),
            "w:br" | "/w:p" => out.push('\n'),
            _ => {}
        }
    }

    out.trim_end().to_string()
}

/// Decode the five predefined entities and numeric references; anything else stays literal
fn unescape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];

        let decoded = rest.find(';').and_then(|semi| {
            let ch = match &rest[1..semi] {
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "amp" => Some('&'),
                entity => numeric_reference(entity),
            };
            ch.map(|ch| (ch, semi))
        });

        match decoded {
            Some((ch, semi)) => {
                out.push(ch);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// `#8217` or `#x2019`
fn numeric_reference(entity: &str) -> Option<char> {
    let digits = entity.strip_prefix('#')?;
    let code = match digits.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => digits.parse().ok()?,
    };
    char::from_u32(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wordprocessing_text() {
        let xml = r#"<w:document><w:body>
            <w:p><w:r><w:t>Hello</w:t></w:r><w:r><w:t xml:space="preserve"> world</w:t></w:r></w:p>
            <w:p><w:r><w:t>A &amp; B</w:t><w:tab/><w:t>&lt;tag&gt;</w:t></w:r></w:p>
            <w:tbl><w:tr><w:tc><w:p><w:r><w:t>cell</w:t></w:r></w:p></w:tc></w:tr></w:tbl>
        </w:body></w:document>"#;

        assert_eq!(wordprocessing_text(xml), "Hello world\nA & B\t<tag>\ncell");
    }

    #[test]
    fn test_numeric_character_references() {
        assert_eq!(unescape_xml("it&#8217;s &#x201C;quoted&#X201D;"), "it\u{2019}s \u{201c}quoted\u{201d}");
        assert_eq!(unescape_xml("&amp;lt; &#xZZ; & alone"), "&lt; &#xZZ; & alone");

        let xml = "<w:p><w:r><w:t>don&#8217;t</w:t></w:r></w:p>";
        assert_eq!(wordprocessing_text(xml), "don\u{2019}t");
    }

    #[test]
    fn test_utf8_strips_bom() {
        let text = utf8_text("a.txt", "\u{feff}hello".as_bytes()).unwrap();
        assert_eq!(text, "hello");
        assert!(matches!(
            utf8_text("b.txt", &[0xff, 0xfe, 0x00]),
            Err(ExtractionError::InvalidUtf8 { .. })
        ));
    }
}
