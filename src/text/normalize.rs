use regex::Regex;
use std::sync::LazyLock;

static EMPHASIS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*+").expect("Invalid emphasis regex"));

static EMBEDDED_CLOCK_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d{2}:\d{2}(?::\d{2})?\s*").expect("Invalid clock time regex")
});

/// Collapse every whitespace run to a single space and trim both ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strip markdown emphasis and embedded clock times, then collapse whitespace.
///
/// Removing a clock time can glue digits into a new one (`0012:34:56`), so
/// removal repeats until nothing matches; this keeps the function idempotent.
pub fn clean_text(raw: &str) -> String {
    let mut text = EMPHASIS.replace_all(raw, "").into_owned();
    while EMBEDDED_CLOCK_TIME.is_match(&text) {
        text = EMBEDDED_CLOCK_TIME.replace_all(&text, "").into_owned();
    }
    collapse_whitespace(&text)
}
