use super::layout::{LayoutSelection, LineLayout};
use super::normalize::clean_text;
use super::timecode::parse_clock_time_strict;

/// Label used when the source attributes no speaker.
pub const UNKNOWN_SPEAKER: &str = "UNKNOWN";

/// Canonical speaker identifier: trailing colons dropped, trimmed, and
/// internal whitespace runs replaced by a single hyphen.
pub fn canonical_speaker(name: &str) -> String {
    name.trim_end_matches(|c: char| c == ':' || c == '：' || c.is_whitespace())
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

/// Outcome of resolving one line.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    /// Canonical speaker, `None` when the line continues the previous turn.
    pub speaker: Option<String>,
    /// Text after the speaker header (the whole trimmed line when no header).
    pub content: String,
    /// Header timestamp in seconds, if present and in range.
    pub start_time: Option<f64>,
}

/// Resolves speaker headers by trying an ordered list of layouts.
///
/// The first layout whose header regex matches (and yields a usable speaker)
/// wins, so the ordering decides between competing interpretations.
#[derive(Debug, Clone)]
pub struct SpeakerResolver {
    rules: Vec<LayoutSelection>,
}

impl Default for SpeakerResolver {
    /// Bold marker, then Chinese numbered label, then `Name:` prefix.
    fn default() -> Self {
        Self {
            rules: vec![
                LineLayout::BoldSpeaker.default_selection(),
                LineLayout::ChineseNumbered.default_selection(),
                LineLayout::NameColon.default_selection(),
            ],
        }
    }
}

impl SpeakerResolver {
    /// Resolver for a detected or oracle-selected layout.
    ///
    /// A layout already covered by the default rules with its default groups
    /// keeps the full default ordering.
    pub fn for_selection(selection: LayoutSelection) -> Self {
        let default = Self::default();
        if default.rules.contains(&selection) {
            default
        } else {
            Self {
                rules: vec![selection],
            }
        }
    }

    pub fn rules(&self) -> &[LayoutSelection] {
        &self.rules
    }

    /// True when at least one unit opens a turn under these rules.
    pub fn finds_speaker<S: AsRef<str>>(&self, units: &[S]) -> bool {
        units
            .iter()
            .any(|u| self.resolve(u.as_ref().trim()).speaker.is_some())
    }

    pub fn resolve(&self, line: &str) -> Resolved {
        for rule in &self.rules {
            let Some(cap) = rule.layout.header_regex().captures(line) else {
                continue;
            };

            let Some(speaker_match) = cap.get(rule.speaker_group) else {
                continue;
            };
            if colon_splits_clock_time(line, speaker_match.end()) {
                continue;
            }
            let speaker = canonical_speaker(&clean_text(speaker_match.as_str()));

            // A bare clock time like "10:30 starts" is not a speaker named "10"
            if speaker.is_empty() || speaker.chars().all(|c| c.is_ascii_digit()) {
                continue;
            }

            let start_time = rule
                .time_group
                .and_then(|g| cap.get(g))
                .and_then(|m| parse_clock_time_strict(m.as_str()));

            let header_end = cap.get(0).map(|m| m.end()).unwrap_or(0);

            return Resolved {
                speaker: Some(speaker),
                content: line[header_end..].trim().to_string(),
                start_time,
            };
        }

        Resolved {
            speaker: None,
            content: line.trim().to_string(),
            start_time: None,
        }
    }
}

/// True when the delimiter right after the speaker is the colon of a clock
/// time such as `00:12`.
fn colon_splits_clock_time(line: &str, speaker_end: usize) -> bool {
    let rest = &line[speaker_end..];
    if !rest.starts_with([':', '：']) {
        return false;
    }
    let before = line[..speaker_end].chars().next_back();
    let after = rest.chars().nth(1);
    matches!((before, after), (Some(b), Some(a)) if b.is_ascii_digit() && a.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(line: &str) -> Resolved {
        SpeakerResolver::default().resolve(line)
    }

    #[test]
    fn test_bold_speaker_with_time() {
        let r = resolve("**Alice:** 00:00");
        assert_eq!(r.speaker.as_deref(), Some("Alice"));
        assert_eq!(r.start_time, Some(0.0));
        assert_eq!(r.content, "");
    }

    #[test]
    fn test_bold_speaker_with_text() {
        let r = resolve("**Jane Doe** 01:02:03 Welcome everyone");
        assert_eq!(r.speaker.as_deref(), Some("Jane-Doe"));
        assert_eq!(r.start_time, Some(3723.0));
        assert_eq!(r.content, "Welcome everyone");
    }

    #[test]
    fn test_bold_speaker_without_time() {
        let r = resolve("**Bob**: no timestamp here");
        assert_eq!(r.speaker.as_deref(), Some("Bob"));
        assert_eq!(r.start_time, None);
        assert_eq!(r.content, "no timestamp here");
    }

    #[test]
    fn test_chinese_numbered_speaker() {
        let r = resolve("说话人1 00:15 大家好");
        assert_eq!(r.speaker.as_deref(), Some("说话人1"));
        assert_eq!(r.start_time, Some(15.0));
        assert_eq!(r.content, "大家好");
    }

    #[test]
    fn test_name_colon_speaker() {
        let r = resolve("Dr. Smith: 00:30 Let's begin.");
        assert_eq!(r.speaker.as_deref(), Some("Dr.-Smith"));
        assert_eq!(r.start_time, Some(30.0));
        assert_eq!(r.content, "Let's begin.");

        let r = resolve("Alice: hello");
        assert_eq!(r.speaker.as_deref(), Some("Alice"));
        assert_eq!(r.start_time, None);
        assert_eq!(r.content, "hello");
    }

    #[test]
    fn test_full_width_colon() {
        let r = resolve("张三：你好");
        assert_eq!(r.speaker.as_deref(), Some("张三"));
        assert_eq!(r.content, "你好");
    }

    #[test]
    fn test_continuation_line() {
        let r = resolve("  Hello there.  ");
        assert_eq!(r.speaker, None);
        assert_eq!(r.content, "Hello there.");
        assert_eq!(r.start_time, None);
    }

    #[test]
    fn test_leading_clock_time_is_not_a_speaker() {
        let r = resolve("10:30 the meeting starts");
        assert_eq!(r.speaker, None);
    }

    #[test]
    fn test_clock_time_in_prose_is_not_a_delimiter() {
        let r = resolve("we met at 00:12 and talked");
        assert_eq!(r.speaker, None);
        assert_eq!(r.content, "we met at 00:12 and talked");
    }

    #[test]
    fn test_out_of_range_timestamp_is_dropped() {
        let r = resolve("**Alice** 00:75 hi");
        assert_eq!(r.speaker.as_deref(), Some("Alice"));
        assert_eq!(r.start_time, None);
    }

    #[test]
    fn test_bold_wins_over_name_colon() {
        let r = resolve("**Host:** Note: this is prose");
        assert_eq!(r.speaker.as_deref(), Some("Host"));
        assert_eq!(r.content, "Note: this is prose");
    }

    #[test]
    fn test_time_first_selection() {
        let resolver = SpeakerResolver::for_selection(LineLayout::TimeFirst.default_selection());
        let r = resolver.resolve("[00:05] Alice Smith: hello");
        assert_eq!(r.speaker.as_deref(), Some("Alice-Smith"));
        assert_eq!(r.start_time, Some(5.0));
        assert_eq!(r.content, "hello");
    }

    #[test]
    fn test_default_selection_keeps_default_rules() {
        let resolver = SpeakerResolver::for_selection(LineLayout::NameColon.default_selection());
        assert_eq!(resolver.rules().len(), 3);
        let resolver = SpeakerResolver::for_selection(LineLayout::NameTime.default_selection());
        assert_eq!(resolver.rules().len(), 1);
    }

    #[test]
    fn test_finds_speaker() {
        let resolver = SpeakerResolver::default();
        assert!(resolver.finds_speaker(&["intro", "Alice: hi"]));
        assert!(!resolver.finds_speaker(&["Alice 00:05 hi", "we met at 00:12"]));
        let empty: [&str; 0] = [];
        assert!(!resolver.finds_speaker(&empty));
    }

    #[test]
    fn test_canonical_speaker() {
        assert_eq!(canonical_speaker("Jane Doe"), "Jane-Doe");
        assert_eq!(canonical_speaker("  Alice:  "), "Alice");
        assert_eq!(canonical_speaker("Bob::"), "Bob");
        assert_eq!(canonical_speaker("Alice: :"), "Alice");
        assert_eq!(canonical_speaker("说话人1："), "说话人1");
        assert_eq!(canonical_speaker(""), "");
    }

    #[test]
    fn test_canonical_speaker_idempotent() {
        for name in ["Jane-Doe", "Jane  Doe :", "A: -", "x"] {
            let once = canonical_speaker(name);
            assert_eq!(canonical_speaker(&once), once);
        }
        assert_eq!(canonical_speaker("Jane-Doe"), "Jane-Doe");
    }
}
