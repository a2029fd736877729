pub mod docx;
pub mod json;
pub mod plain;
pub mod srt;
pub mod turns;

pub use turns::{segment_units, TurnSegmenter};

use crate::config::InputFormat;
use crate::error::Result;
use crate::text::split_words;
use serde::{Deserialize, Serialize};

/// Word timing value meaning "not available from this source".
pub const NO_WORD_TIMING: f64 = -1.0;

/// Length assumed for a segment whose end the source does not give.
pub const DEFAULT_SEGMENT_DURATION: f64 = 30.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordToken {
    pub start: f64,
    pub end: f64,
    pub word: String,
}

impl WordToken {
    /// A token without word-level timing.
    pub fn untimed(word: impl Into<String>) -> Self {
        Self {
            start: NO_WORD_TIMING,
            end: NO_WORD_TIMING,
            word: word.into(),
        }
    }

    pub fn has_timing(&self) -> bool {
        self.start != NO_WORD_TIMING && self.end != NO_WORD_TIMING
    }
}

/// Split text into untimed word tokens.
pub fn untimed_words(text: &str) -> Vec<WordToken> {
    split_words(text).into_iter().map(WordToken::untimed).collect()
}

/// One speaker-attributed, time-bounded span of transcript text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub index: usize,
    pub start_time: f64,
    pub end_time: f64,
    pub text: String,
    pub speaker: String,
    pub words: Vec<WordToken>,
}

/// Options for the heuristic (turn-based) segmenters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParseOptions {
    /// Used when a segment's end time has to be inferred.
    pub segment_duration: f64,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            segment_duration: DEFAULT_SEGMENT_DURATION,
        }
    }
}

/// What a format decoder hands back.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceDocument {
    /// Lines or paragraphs still to be resolved into speaker turns.
    /// Blank entries mark paragraph boundaries.
    Text(Vec<String>),
    /// Segments the source already delimits and times.
    Segments(Vec<Segment>),
}

/// Decodes the raw bytes of one input format.
pub trait FormatDecoder: Send + Sync {
    fn decode(&self, content: &[u8]) -> Result<SourceDocument>;
    fn format(&self) -> InputFormat;
}

pub fn create_decoder(format: InputFormat) -> Box<dyn FormatDecoder> {
    match format {
        InputFormat::Docx => Box::new(docx::DocxDecoder),
        InputFormat::Json => Box::new(json::JsonDecoder),
        InputFormat::Srt => Box::new(srt::SrtDecoder::srt()),
        InputFormat::Srtx => Box::new(srt::SrtDecoder::srtx()),
        InputFormat::Text => Box::new(plain::PlainTextDecoder),
    }
}

/// Decode bytes as UTF-8, reporting the format on failure.
pub(crate) fn decode_utf8(content: &[u8], format: InputFormat) -> Result<&str> {
    let text = std::str::from_utf8(content).map_err(|e| {
        crate::error::IngestError::MalformedInput(format!(
            "{} content is not valid UTF-8: {}",
            format, e
        ))
    })?;
    Ok(text.trim_start_matches('\u{feff}'))
}

/// Split text into line units, keeping blank lines as paragraph boundaries.
pub(crate) fn text_units(text: &str) -> Vec<String> {
    text.lines().map(str::to_string).collect()
}
