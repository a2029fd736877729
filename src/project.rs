//! The canonical document every input format is normalized into.

use crate::segment::Segment;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    pub id: Uuid,
    /// Where the transcript came from, usually the input file name.
    pub source: String,
    /// Seconds; the end time of the last segment.
    pub duration: f64,
    #[serde(serialize_with = "serialize_utc")]
    pub uploaded_on: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Transcript {
    pub segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptProject {
    pub project_id: Uuid,
    pub media: MediaInfo,
    pub transcript: Transcript,
    /// Always empty on ingest.
    pub edits: Vec<serde_json::Value>,
}

impl TranscriptProject {
    pub fn segments(&self) -> &[Segment] {
        &self.transcript.segments
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Wrap finished segments in a new project with fresh identifiers.
pub fn assemble(segments: Vec<Segment>, source: &str) -> TranscriptProject {
    let duration = segments.last().map(|s| s.end_time).unwrap_or(0.0);

    TranscriptProject {
        project_id: Uuid::new_v4(),
        media: MediaInfo {
            id: Uuid::new_v4(),
            source: source.to_string(),
            duration,
            uploaded_on: Utc::now(),
        },
        transcript: Transcript { segments },
        edits: Vec::new(),
    }
}

// RFC 3339 with a literal `Z` rather than `+00:00`
fn serialize_utc<S: Serializer>(time: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&time.to_rfc3339_opts(SecondsFormat::Millis, true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::WordToken;

    fn segment(index: usize, start: f64, end: f64) -> Segment {
        Segment {
            index,
            start_time: start,
            end_time: end,
            text: "hi".to_string(),
            speaker: "A".to_string(),
            words: vec![WordToken::untimed("hi")],
        }
    }

    #[test]
    fn test_assemble_duration_and_ids() {
        let project = assemble(vec![segment(1, 0.0, 5.0), segment(2, 5.0, 35.0)], "talk.docx");

        assert_eq!(project.media.duration, 35.0);
        assert_eq!(project.media.source, "talk.docx");
        assert_ne!(project.project_id, project.media.id);
        assert_eq!(project.project_id.get_version_num(), 4);
        assert!(project.edits.is_empty());
        assert_eq!(project.segments().len(), 2);
    }

    #[test]
    fn test_assemble_empty() {
        let project = assemble(Vec::new(), "empty.srt");
        assert_eq!(project.media.duration, 0.0);
        assert!(project.segments().is_empty());
    }

    #[test]
    fn test_fresh_ids_per_call() {
        let a = assemble(Vec::new(), "x");
        let b = assemble(Vec::new(), "x");
        assert_ne!(a.project_id, b.project_id);
    }

    #[test]
    fn test_serialized_shape() {
        let project = assemble(vec![segment(1, 1.0, 2.0)], "x.srt");
        let value = serde_json::to_value(&project).unwrap();

        assert!(value["project_id"].is_string());
        assert!(value["media"]["id"].is_string());
        assert_eq!(value["media"]["duration"], 2.0);
        let uploaded = value["media"]["uploaded_on"].as_str().unwrap();
        assert!(uploaded.ends_with('Z'), "{}", uploaded);
        assert_eq!(value["transcript"]["segments"][0]["speaker"], "A");
        assert_eq!(value["edits"], serde_json::json!([]));
    }

    #[test]
    fn test_round_trip_through_json() {
        let project = assemble(vec![segment(1, 1.0, 2.0)], "x.srt");
        let json = project.to_json_pretty().unwrap();
        let parsed: TranscriptProject = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.project_id, project.project_id);
        assert_eq!(parsed.transcript, project.transcript);
    }
}
