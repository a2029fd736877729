use super::{decode_utf8, text_units, FormatDecoder, SourceDocument};
use crate::config::InputFormat;
use crate::error::Result;

/// Plain text or Markdown, one unit per line.
pub struct PlainTextDecoder;

impl FormatDecoder for PlainTextDecoder {
    fn decode(&self, content: &[u8]) -> Result<SourceDocument> {
        let text = decode_utf8(content, InputFormat::Text)?;
        Ok(SourceDocument::Text(text_units(text)))
    }

    fn format(&self) -> InputFormat {
        InputFormat::Text
    }
}
