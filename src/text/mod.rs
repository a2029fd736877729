//! Line-level text handling shared by every heuristic segmenter.

pub mod layout;
pub mod normalize;
pub mod speaker;
pub mod timecode;
pub mod words;

pub use layout::{detect_layout, group_paragraphs, LayoutSelection, LineLayout};
pub use normalize::{clean_text, collapse_whitespace};
pub use speaker::{canonical_speaker, Resolved, SpeakerResolver, UNKNOWN_SPEAKER};
pub use timecode::{
    format_srt_timecode, parse_clock_time, parse_clock_time_strict, parse_srt_timecode,
    try_parse_clock_time,
};
pub use words::{is_cjk_char, split_words};
