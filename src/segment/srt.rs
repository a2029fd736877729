// SRT and SRTX subtitle input
//
// A block is an optional sequence number, a `start --> end` timing line and
// text lines up to the next blank line. SRTX adds a speaker line right after
// the timing line. Every block is a complete segment; nothing is inferred.

use super::{decode_utf8, untimed_words, FormatDecoder, Segment, SourceDocument};
use crate::config::InputFormat;
use crate::error::{IngestError, Result};
use crate::text::{canonical_speaker, collapse_whitespace, parse_srt_timecode, UNKNOWN_SPEAKER};
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, warn};

static TIMING_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\S+)\s*-->\s*(\S+)").expect("Invalid timing line regex"));

pub struct SrtDecoder {
    speaker_line: bool,
}

impl SrtDecoder {
    pub fn srt() -> Self {
        Self {
            speaker_line: false,
        }
    }

    pub fn srtx() -> Self {
        Self { speaker_line: true }
    }
}

impl FormatDecoder for SrtDecoder {
    fn decode(&self, content: &[u8]) -> Result<SourceDocument> {
        let text = decode_utf8(content, self.format())?;
        parse_blocks(text, self.speaker_line).map(SourceDocument::Segments)
    }

    fn format(&self) -> InputFormat {
        if self.speaker_line {
            InputFormat::Srtx
        } else {
            InputFormat::Srt
        }
    }
}

/// Returns true if the line contains only digits, i.e. looks like a sequence number.
fn looks_like_sequence_number(line: &str) -> bool {
    let line = line.trim();
    !line.is_empty() && line.chars().all(|c| c.is_ascii_digit())
}

/// Parse a `start --> end` line into seconds.
fn parse_timing_line(line: &str) -> Option<(f64, f64)> {
    let cap = TIMING_LINE.captures(line)?;
    let start = parse_srt_timecode(&cap[1]);
    let end = parse_srt_timecode(&cap[2]);
    match (start, end) {
        (Some(start), Some(end)) => Some((start, end)),
        _ => {
            warn!("Ignoring malformed timing line: {:?}", line.trim());
            None
        }
    }
}

/// If a block starts at `lines[i]`, return its timing and the index of the
/// first line after the timing line.
fn block_header(lines: &[&str], i: usize) -> Option<((f64, f64), usize)> {
    let line = lines[i];
    if line.contains("-->") {
        return parse_timing_line(line).map(|t| (t, i + 1));
    }
    if looks_like_sequence_number(line) {
        let next = lines.get(i + 1)?;
        if next.contains("-->") {
            return parse_timing_line(next).map(|t| (t, i + 2));
        }
    }
    None
}

fn parse_blocks(text: &str, speaker_line: bool) -> Result<Vec<Segment>> {
    let lines: Vec<&str> = text.lines().collect();
    let mut segments = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let Some(((start_time, end_time), body_start)) = block_header(&lines, i) else {
            if !lines[i].trim().is_empty() {
                debug!("Skipping line {} outside any block: {:?}", i + 1, lines[i]);
            }
            i += 1;
            continue;
        };
        i = body_start;

        let mut speaker = UNKNOWN_SPEAKER.to_string();
        if speaker_line && i < lines.len() && !lines[i].trim().is_empty() {
            let name = canonical_speaker(lines[i]);
            if !name.is_empty() {
                speaker = name;
            }
            i += 1;
        }

        let mut text_lines = Vec::new();
        while i < lines.len() {
            let line = lines[i].trim();
            if line.is_empty() || block_header(&lines, i).is_some() {
                break;
            }
            text_lines.push(line);
            i += 1;
        }

        let end_time = if end_time < start_time {
            warn!(
                "Block {} ends before it starts ({:.3}s < {:.3}s); clamping",
                segments.len() + 1,
                end_time,
                start_time
            );
            start_time
        } else {
            end_time
        };

        let text = collapse_whitespace(&text_lines.join(" "));
        segments.push(Segment {
            index: segments.len() + 1,
            start_time,
            end_time,
            words: untimed_words(&text),
            text,
            speaker,
        });
    }

    if segments.is_empty() && !text.trim().is_empty() {
        return Err(IngestError::MalformedInput(
            "no subtitle blocks found".to_string(),
        ));
    }

    debug!("Parsed {} subtitle blocks", segments.len());
    Ok(segments)
}
