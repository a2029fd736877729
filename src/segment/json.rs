//! JSON input: either an already segmented transcript or raw text.
//!
//! The structured shape is
//! `{"transcription": [{"segment": {speaker, start, end, text}, "words": [{start, end, word}]}]}`
//! and is copied through verbatim apart from speaker canonicalization. A
//! top-level string, an array of strings, or an object with a string `text`
//! field is treated as raw text for the heuristic segmenter.

use super::{decode_utf8, text_units, FormatDecoder, Segment, SourceDocument, WordToken, NO_WORD_TIMING};
use crate::config::InputFormat;
use crate::error::{IngestError, Result};
use crate::text::{canonical_speaker, UNKNOWN_SPEAKER};
use serde_json::Value;
use tracing::debug;

pub struct JsonDecoder;

impl FormatDecoder for JsonDecoder {
    fn decode(&self, content: &[u8]) -> Result<SourceDocument> {
        let text = decode_utf8(content, InputFormat::Json)?;
        if text.trim().is_empty() {
            return Ok(SourceDocument::Segments(Vec::new()));
        }

        let value: Value = serde_json::from_str(text)
            .map_err(|e| IngestError::MalformedInput(format!("Invalid JSON format: {}", e)))?;

        match value {
            Value::Object(ref map) if map.contains_key("transcription") => {
                parse_transcription(&map["transcription"]).map(SourceDocument::Segments)
            }
            Value::Object(ref map) => match map.get("text") {
                Some(Value::String(raw)) => Ok(SourceDocument::Text(text_units(raw))),
                _ => Err(IngestError::MissingField("'transcription'".to_string())),
            },
            Value::String(raw) => Ok(SourceDocument::Text(text_units(&raw))),
            Value::Array(items) if items.iter().all(Value::is_string) => Ok(SourceDocument::Text(
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .flat_map(array_item_units)
                    .collect(),
            )),
            _ => Err(IngestError::MissingField("'transcription'".to_string())),
        }
    }

    fn format(&self) -> InputFormat {
        InputFormat::Json
    }
}

/// An empty array item is a paragraph break, not nothing.
fn array_item_units(item: &str) -> Vec<String> {
    if item.is_empty() {
        vec![String::new()]
    } else {
        text_units(item)
    }
}

fn parse_transcription(value: &Value) -> Result<Vec<Segment>> {
    let entries = value.as_array().ok_or_else(|| {
        IngestError::MalformedInput("'transcription' must be an array".to_string())
    })?;

    let segments = entries
        .iter()
        .enumerate()
        .map(|(i, entry)| parse_entry(entry, i))
        .collect::<Result<Vec<_>>>()?;

    debug!("Read {} pre-segmented entries from JSON", segments.len());
    Ok(segments)
}

fn parse_entry(entry: &Value, position: usize) -> Result<Segment> {
    let context = format!("transcription[{}]", position);
    let segment = field(entry, "segment", &context)?;
    let segment_context = format!("{}.segment", context);

    let speaker = match field(segment, "speaker", &segment_context)? {
        Value::Null => UNKNOWN_SPEAKER.to_string(),
        Value::String(name) => {
            let speaker = canonical_speaker(name);
            if speaker.is_empty() {
                UNKNOWN_SPEAKER.to_string()
            } else {
                speaker
            }
        }
        other => return Err(wrong_type("speaker", &segment_context, "a string", other)),
    };

    let words = field(entry, "words", &context)?
        .as_array()
        .ok_or_else(|| {
            IngestError::MalformedInput(format!("'words' in {} must be an array", context))
        })?
        .iter()
        .enumerate()
        .map(|(j, word)| parse_word(word, &format!("{}.words[{}]", context, j)))
        .collect::<Result<Vec<_>>>()?;

    Ok(Segment {
        index: position + 1,
        start_time: number(segment, "start", &segment_context)?,
        end_time: number(segment, "end", &segment_context)?,
        text: string(segment, "text", &segment_context)?,
        speaker,
        words,
    })
}

fn parse_word(word: &Value, context: &str) -> Result<WordToken> {
    Ok(WordToken {
        start: optional_number(word, "start", context)?,
        end: optional_number(word, "end", context)?,
        word: string(word, "word", context)?,
    })
}

fn field<'a>(value: &'a Value, key: &str, context: &str) -> Result<&'a Value> {
    value
        .get(key)
        .ok_or_else(|| IngestError::MissingField(format!("'{}' in {}", key, context)))
}

fn number(value: &Value, key: &str, context: &str) -> Result<f64> {
    let v = field(value, key, context)?;
    v.as_f64()
        .ok_or_else(|| wrong_type(key, context, "a number", v))
}

/// Like [`number`], but `null` means "no timing".
fn optional_number(value: &Value, key: &str, context: &str) -> Result<f64> {
    match field(value, key, context)? {
        Value::Null => Ok(NO_WORD_TIMING),
        v => v.as_f64().ok_or_else(|| wrong_type(key, context, "a number", v)),
    }
}

fn string(value: &Value, key: &str, context: &str) -> Result<String> {
    let v = field(value, key, context)?;
    v.as_str()
        .map(str::to_string)
        .ok_or_else(|| wrong_type(key, context, "a string", v))
}

fn wrong_type(key: &str, context: &str, expected: &str, found: &Value) -> IngestError {
    IngestError::MalformedInput(format!(
        "'{}' in {} must be {}, found {}",
        key, context, expected, found
    ))
}
