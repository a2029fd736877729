//! Line layouts: the closed set of speaker-header shapes a transcript can use.
//!
//! Every layout owns a header regex (used when resolving a line) and a
//! detector (used when guessing the layout of a whole document). Detection
//! walks [`LineLayout::PRIORITY`] in order and stops at the first layout whose
//! detector matches one of the sampled lines.

use crate::error::{IngestError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Number of non-empty lines inspected by [`detect_layout`].
pub const DETECTION_SAMPLE_LINES: usize = 10;

/// Number of paragraphs inspected by the paragraph detector.
const PARAGRAPH_SAMPLE: usize = 5;

const TS: &str = r"(\d{2}:\d{2}(?::\d{2})?)";

fn compile(pattern: &str) -> Regex {
    Regex::new(&pattern.replace("{TS}", TS)).expect("Invalid layout regex")
}

static BOLD_HEADER: LazyLock<Regex> = LazyLock::new(|| compile(r"^\*\*(.*?)\*\*[:\s]*{TS}?"));
static CHINESE_HEADER: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^(说话人\d+)(?:[:：]\s*|\s+){TS}"));
static TIME_FIRST_HEADER: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^\[?{TS}\]?\s*([^:：\[\]]+?)[:：]\s*"));
static NAME_COLON_HEADER: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^([^:：]+?)[:：]\s*{TS}?"));
static NAME_TIME_HEADER: LazyLock<Regex> = LazyLock::new(|| compile(r"^([^:：]+?)\s+{TS}"));

static BOLD_DETECTOR: LazyLock<Regex> = LazyLock::new(|| compile(r"^\*\*[^*]+\*\*"));
static CHINESE_DETECTOR: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^说话人\d+(?:[:：]\s*|\s+)\d{2}:\d{2}"));
static TIME_FIRST_DETECTOR: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^\[?\d{2}:\d{2}(?::\d{2})?\]?\s*[^:：\[\]\s][^:：\[\]]*[:：]"));
static NAME_COLON_DETECTOR: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^[^:：]+[:：]\s*\d{2}:\d{2}"));
static NAME_TIME_DETECTOR: LazyLock<Regex> = LazyLock::new(|| compile(r"^[^:：]+\s+\d{2}:\d{2}"));
static PARAGRAPH_HEAD_DETECTOR: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^[^:：]{1,40}[:：]"));

/// A speaker-header shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineLayout {
    /// `**Alice** 00:05 text` or `**Alice:** text`
    BoldSpeaker,
    /// `说话人1 00:05 text`
    ChineseNumbered,
    /// `[00:05] Alice: text`
    TimeFirst,
    /// `Alice: 00:05 text` (timestamp optional when resolving)
    NameColon,
    /// `Alice 00:05 text`
    NameTime,
    /// Blank-line separated blocks whose first line is `Alice: [00:05] text`
    Paragraph,
}

impl LineLayout {
    /// Detection order. More specific shapes come first.
    pub const PRIORITY: [LineLayout; 6] = [
        LineLayout::BoldSpeaker,
        LineLayout::ChineseNumbered,
        LineLayout::TimeFirst,
        LineLayout::NameColon,
        LineLayout::NameTime,
        LineLayout::Paragraph,
    ];

    /// Regex applied to a single line to pull out speaker and timestamp.
    pub fn header_regex(&self) -> &'static Regex {
        match self {
            LineLayout::BoldSpeaker => &BOLD_HEADER,
            LineLayout::ChineseNumbered => &CHINESE_HEADER,
            LineLayout::TimeFirst => &TIME_FIRST_HEADER,
            LineLayout::NameColon | LineLayout::Paragraph => &NAME_COLON_HEADER,
            LineLayout::NameTime => &NAME_TIME_HEADER,
        }
    }

    /// Number of capture groups in [`Self::header_regex`], group 0 excluded.
    pub fn capture_count(&self) -> usize {
        self.header_regex().captures_len() - 1
    }

    /// The capture-group assignment this layout uses when nothing else is said.
    pub fn default_selection(&self) -> LayoutSelection {
        let (speaker_group, time_group) = match self {
            LineLayout::TimeFirst => (2, 1),
            _ => (1, 2),
        };
        LayoutSelection {
            layout: *self,
            speaker_group,
            time_group: Some(time_group),
        }
    }

    /// Only the first line of each blank-line separated block can open a turn.
    pub fn splits_paragraphs(&self) -> bool {
        matches!(self, LineLayout::Paragraph)
    }

    /// Example of the header shape, for humans and oracles.
    pub fn describe(&self) -> &'static str {
        match self {
            LineLayout::BoldSpeaker => "`**Alice** 00:05 text` or `**Alice:** text`",
            LineLayout::ChineseNumbered => "`说话人1 00:05 text`",
            LineLayout::TimeFirst => "`[00:05] Alice: text`",
            LineLayout::NameColon => "`Alice: 00:05 text` with the timestamp optional",
            LineLayout::NameTime => "`Alice 00:05 text`",
            LineLayout::Paragraph => {
                "blank-line separated blocks whose first line is `Alice: 00:05 text`"
            }
        }
    }

    fn line_detector(&self) -> Option<&'static Regex> {
        match self {
            LineLayout::BoldSpeaker => Some(&BOLD_DETECTOR),
            LineLayout::ChineseNumbered => Some(&CHINESE_DETECTOR),
            LineLayout::TimeFirst => Some(&TIME_FIRST_DETECTOR),
            LineLayout::NameColon => Some(&NAME_COLON_DETECTOR),
            LineLayout::NameTime => Some(&NAME_TIME_DETECTOR),
            LineLayout::Paragraph => None,
        }
    }
}

impl std::fmt::Display for LineLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LineLayout::BoldSpeaker => "bold_speaker",
            LineLayout::ChineseNumbered => "chinese_numbered",
            LineLayout::TimeFirst => "time_first",
            LineLayout::NameColon => "name_colon",
            LineLayout::NameTime => "name_time",
            LineLayout::Paragraph => "paragraph",
        };
        write!(f, "{}", name)
    }
}

/// A layout plus the capture groups holding the speaker and the timestamp.
///
/// This is the whole vocabulary a format oracle may answer with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutSelection {
    pub layout: LineLayout,
    pub speaker_group: usize,
    #[serde(default)]
    pub time_group: Option<usize>,
}

impl LayoutSelection {
    /// Check that the group indices exist in the layout's header regex.
    pub fn validate(&self) -> Result<()> {
        let groups = self.layout.capture_count();
        let in_range = |g: usize| (1..=groups).contains(&g);

        if !in_range(self.speaker_group) {
            return Err(IngestError::Oracle(format!(
                "speaker group {} out of range for layout {} ({} groups)",
                self.speaker_group, self.layout, groups
            )));
        }
        if let Some(time_group) = self.time_group {
            if !in_range(time_group) {
                return Err(IngestError::Oracle(format!(
                    "time group {} out of range for layout {} ({} groups)",
                    time_group, self.layout, groups
                )));
            }
            if time_group == self.speaker_group {
                return Err(IngestError::Oracle(format!(
                    "speaker and time share group {} in layout {}",
                    time_group, self.layout
                )));
            }
        }
        Ok(())
    }
}

/// Guess the layout of a document from its first non-empty lines.
///
/// `units` are lines (blank entries mark paragraph boundaries) or DOCX
/// paragraphs. Returns `None` when no detector is confident.
pub fn detect_layout<S: AsRef<str>>(units: &[S]) -> Option<LineLayout> {
    let sample: Vec<&str> = units
        .iter()
        .map(|u| u.as_ref().trim())
        .filter(|u| !u.is_empty())
        .take(DETECTION_SAMPLE_LINES)
        .collect();

    if sample.is_empty() {
        return None;
    }

    LineLayout::PRIORITY.into_iter().find(|layout| match layout.line_detector() {
        Some(detector) => sample.iter().any(|line| detector.is_match(line)),
        None => looks_like_paragraphs(units),
    })
}

fn looks_like_paragraphs<S: AsRef<str>>(units: &[S]) -> bool {
    let paragraphs = group_paragraphs(units);
    if paragraphs.len() < 2 || !paragraphs.iter().any(|p| p.len() > 1) {
        return false;
    }
    paragraphs
        .iter()
        .take(PARAGRAPH_SAMPLE)
        .all(|p| PARAGRAPH_HEAD_DETECTOR.is_match(p[0]))
}

/// Group units into blank-line separated paragraphs of trimmed, non-empty lines.
pub fn group_paragraphs<S: AsRef<str>>(units: &[S]) -> Vec<Vec<&str>> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for unit in units {
        let line = unit.as_ref().trim();
        if line.is_empty() {
            if !current.is_empty() {
                paragraphs.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        paragraphs.push(current);
    }

    paragraphs
}
