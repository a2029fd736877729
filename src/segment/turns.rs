//! Speaker-turn state machine shared by DOCX, plain text and raw JSON text.

use super::{untimed_words, ParseOptions, Segment};
use crate::text::{clean_text, group_paragraphs, SpeakerResolver};
use tracing::{debug, warn};

/// Builds segments from a stream of lines.
///
/// A line with a speaker header closes the open segment and opens a new one;
/// a line without one extends the open segment, or is dropped when nothing is
/// open yet.
pub struct TurnSegmenter<'a> {
    resolver: &'a SpeakerResolver,
    segment_duration: f64,
    segments: Vec<Segment>,
    current: Option<Segment>,
    next_index: usize,
    last_known_time: f64,
}

impl<'a> TurnSegmenter<'a> {
    pub fn new(resolver: &'a SpeakerResolver, options: &ParseOptions) -> Self {
        Self {
            resolver,
            segment_duration: options.segment_duration,
            segments: Vec::new(),
            current: None,
            next_index: 1,
            last_known_time: 0.0,
        }
    }

    /// Feed a line that may open a new turn.
    pub fn push_line(&mut self, line: &str) {
        let resolved = self.resolver.resolve(line);
        match resolved.speaker {
            Some(speaker) => self.open_turn(speaker, resolved.start_time, &resolved.content),
            None => self.push_continuation(&resolved.content),
        }
    }

    /// Feed a line that can only extend the open turn.
    pub fn push_continuation(&mut self, line: &str) {
        let text = clean_text(line);
        if text.is_empty() {
            return;
        }

        match self.current.as_mut() {
            Some(segment) => {
                if !segment.text.is_empty() {
                    segment.text.push(' ');
                }
                segment.text.push_str(&text);
                segment.words.extend(untimed_words(&text));
            }
            None => debug!("Dropping text before the first speaker turn: {:?}", text),
        }
    }

    fn open_turn(&mut self, speaker: String, resolved_start: Option<f64>, content: &str) {
        let has_previous = self.next_index > 1;

        let start_time = match resolved_start {
            Some(t) if has_previous && t < self.last_known_time => {
                warn!(
                    "Timestamp {:.1}s for {} goes backwards; keeping {:.1}s",
                    t, speaker, self.last_known_time
                );
                self.last_known_time
            }
            Some(t) => t,
            None if has_previous => self.last_known_time + self.segment_duration,
            None => self.last_known_time,
        };

        self.close_current(resolved_start.map(|_| start_time));

        let text = clean_text(content);
        let words = untimed_words(&text);
        self.current = Some(Segment {
            index: self.next_index,
            start_time,
            end_time: start_time,
            text,
            speaker,
            words,
        });
        self.next_index += 1;
        self.last_known_time = start_time;
    }

    fn close_current(&mut self, next_start: Option<f64>) {
        if let Some(mut segment) = self.current.take() {
            segment.end_time = next_start.unwrap_or(segment.start_time + self.segment_duration);
            self.segments.push(segment);
        }
    }

    /// Close the open turn and return every segment in emission order.
    pub fn finish(mut self) -> Vec<Segment> {
        self.close_current(None);
        self.segments
    }
}

/// Run text units through a [`TurnSegmenter`].
///
/// For the paragraph layout only the first line of each paragraph may open a
/// turn; otherwise every non-blank unit is resolved on its own.
pub fn segment_units<S: AsRef<str>>(
    units: &[S],
    resolver: &SpeakerResolver,
    options: &ParseOptions,
) -> Vec<Segment> {
    let mut segmenter = TurnSegmenter::new(resolver, options);

    let paragraph_mode = resolver
        .rules()
        .iter()
        .any(|rule| rule.layout.splits_paragraphs());

    if paragraph_mode {
        for paragraph in group_paragraphs(units) {
            let mut lines = paragraph.into_iter();
            if let Some(head) = lines.next() {
                segmenter.push_line(head);
            }
            for line in lines {
                segmenter.push_continuation(line);
            }
        }
    } else {
        for unit in units {
            let line = unit.as_ref().trim();
            if !line.is_empty() {
                segmenter.push_line(line);
            }
        }
    }

    let segments = segmenter.finish();
    debug!("Segmented {} text units into {} turns", units.len(), segments.len());
    segments
}
