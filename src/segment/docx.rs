//! DOCX paragraphs, read straight from `word/document.xml`.

use super::{FormatDecoder, SourceDocument};
use crate::config::InputFormat;
use crate::error::{IngestError, Result};
use regex::{Captures, Regex};
use std::io::{Cursor, Read};
use std::sync::LazyLock;
use tracing::debug;
use zip::ZipArchive;

const DOCUMENT_PART: &str = "word/document.xml";

// Self-closing form first so `<w:p .../>` never opens a paragraph
static PARAGRAPH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<w:p(?:\s[^>]*)?/>|<w:p(?:\s[^>]*)?>(.*?)</w:p>")
        .expect("Invalid paragraph regex")
});

// Text boxes nest whole paragraphs inside a run of the outer paragraph
static TEXT_BOX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<w:txbxContent\b.*?</w:txbxContent>").expect("Invalid text box regex")
});

static RUN_CONTENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<w:t(?:\s[^>]*)?>([^<]*)</w:t>|<w:tab\s*/>|<w:(?:br|cr)(?:\s[^>]*)?/>")
        .expect("Invalid run regex")
});

static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#x[0-9a-fA-F]+|#[0-9]+|amp|lt|gt|quot|apos);").expect("Invalid entity regex")
});

pub struct DocxDecoder;

impl FormatDecoder for DocxDecoder {
    fn decode(&self, content: &[u8]) -> Result<SourceDocument> {
        let xml = read_document_xml(content)?;
        let paragraphs = extract_paragraphs(&xml);
        debug!("Read {} non-empty paragraphs from DOCX", paragraphs.len());
        Ok(SourceDocument::Text(paragraphs))
    }

    fn format(&self) -> InputFormat {
        InputFormat::Docx
    }
}

fn read_document_xml(content: &[u8]) -> Result<String> {
    let mut archive = ZipArchive::new(Cursor::new(content))
        .map_err(|e| IngestError::MalformedInput(format!("Error parsing DOCX content: {}", e)))?;

    let mut part = archive.by_name(DOCUMENT_PART).map_err(|e| {
        IngestError::MalformedInput(format!("DOCX has no {} part: {}", DOCUMENT_PART, e))
    })?;

    let mut xml = String::new();
    part.read_to_string(&mut xml).map_err(|e| {
        IngestError::MalformedInput(format!("Error reading {}: {}", DOCUMENT_PART, e))
    })?;
    Ok(xml)
}

/// Text of every non-empty paragraph, in document order, trimmed.
///
/// Text box content is skipped so the paragraph holding the box keeps all of
/// its own text.
pub fn extract_paragraphs(xml: &str) -> Vec<String> {
    let xml = TEXT_BOX.replace_all(xml, "");
    PARAGRAPH
        .captures_iter(&xml)
        .filter_map(|cap| cap.get(1).map(|body| paragraph_text(body.as_str())))
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .collect()
}

fn paragraph_text(body: &str) -> String {
    let mut text = String::new();
    for cap in RUN_CONTENT.captures_iter(body) {
        match cap.get(1) {
            Some(run) => text.push_str(&decode_entities(run.as_str())),
            None if cap[0].starts_with("<w:tab") => text.push('\t'),
            None => text.push('\n'),
        }
    }
    text
}

fn decode_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |cap: &Captures| {
            let entity = &cap[1];
            let decoded = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => {
                    let code = match entity.strip_prefix("#x") {
                        Some(hex) => u32::from_str_radix(hex, 16).ok(),
                        None => entity[1..].parse().ok(),
                    };
                    code.and_then(char::from_u32)
                }
            };
            decoded.map_or_else(|| cap[0].to_string(), String::from)
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::FileOptions;

    /// Build a minimal DOCX holding one `<w:p>` per paragraph.
    fn build_docx(paragraphs: &[&str]) -> Vec<u8> {
        let body: String = paragraphs
            .iter()
            .map(|p| {
                format!(
                    r#"<w:p w:rsidR="00A1"><w:pPr><w:pStyle w:val="Normal"/></w:pPr><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
                    p.replace('&', "&amp;").replace('<', "&lt;")
                )
            })
            .collect();
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}<w:sectPr/></w:body></w:document>"#,
            body
        );

        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("[Content_Types].xml", FileOptions::default())
            .unwrap();
        writer.write_all(b"<Types/>").unwrap();
        writer.start_file(DOCUMENT_PART, FileOptions::default()).unwrap();
        writer.write_all(xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_decode_paragraphs() {
        let docx = build_docx(&["**Alice:** 00:00", "", "Hello & welcome."]);
        let document = DocxDecoder.decode(&docx).unwrap();
        assert_eq!(
            document,
            SourceDocument::Text(vec![
                "**Alice:** 00:00".to_string(),
                "Hello & welcome.".to_string()
            ])
        );
    }

    #[test]
    fn test_runs_tabs_and_breaks() {
        let xml = r#"<w:body><w:p><w:r><w:t>Bob</w:t></w:r><w:r><w:t xml:space="preserve">: hi</w:t><w:tab/><w:t>there</w:t><w:br/><w:t>again</w:t></w:r></w:p><w:p/><w:p w:rsidR="1"/></w:body>"#;
        assert_eq!(extract_paragraphs(xml), vec!["Bob: hi\tthere\nagain"]);
    }

    #[test]
    fn test_text_box_does_not_split_outer_paragraph() {
        let xml = concat!(
            "<w:body><w:p><w:r><w:t>Alice: before</w:t></w:r>",
            "<w:r><w:drawing><wps:txbx><w:txbxContent>",
            "<w:p><w:r><w:t>boxed</w:t></w:r></w:p>",
            "</w:txbxContent></wps:txbx></w:drawing></w:r>",
            "<w:r><w:t xml:space=\"preserve\"> after</w:t></w:r></w:p>",
            "<w:p><w:r><w:t>Bob: yo</w:t></w:r></w:p></w:body>",
        );
        assert_eq!(extract_paragraphs(xml), vec!["Alice: before after", "Bob: yo"]);
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("a &lt;b&gt; &amp; &quot;c&quot; &apos;"), "a <b> & \"c\" '");
        assert_eq!(decode_entities("&#20320;&#x597D;"), "你好");
        assert_eq!(decode_entities("&bogus; &#xZZ;"), "&bogus; &#xZZ;");
    }

    #[test]
    fn test_invalid_container() {
        let result = DocxDecoder.decode(b"not a zip file");
        assert!(matches!(result, Err(IngestError::MalformedInput(_))));
    }

    #[test]
    fn test_missing_document_part() {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer.start_file("other.xml", FileOptions::default()).unwrap();
        writer.write_all(b"<x/>").unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let result = DocxDecoder.decode(&bytes);
        assert!(matches!(result, Err(IngestError::MalformedInput(_))));
    }
}
