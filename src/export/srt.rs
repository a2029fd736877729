// SRT and SRTX renderings of a project
use super::ProjectFormatter;
use crate::project::TranscriptProject;
use crate::segment::Segment;
use crate::text::format_srt_timecode;

pub struct SrtFormatter;

pub struct SrtxFormatter;

impl ProjectFormatter for SrtFormatter {
    fn format(&self, project: &TranscriptProject) -> String {
        render_blocks(project.segments(), false)
    }

    fn extension(&self) -> &'static str {
        "srt"
    }
}

impl ProjectFormatter for SrtxFormatter {
    fn format(&self, project: &TranscriptProject) -> String {
        render_blocks(project.segments(), true)
    }

    fn extension(&self) -> &'static str {
        "srtx"
    }
}

fn render_blocks(segments: &[Segment], with_speaker: bool) -> String {
    segments
        .iter()
        .map(|segment| {
            let mut block = format!(
                "{}\n{} --> {}\n",
                segment.index,
                format_srt_timecode(segment.start_time),
                format_srt_timecode(segment.end_time)
            );
            if with_speaker {
                block.push_str(&segment.speaker);
                block.push('\n');
            }
            block.push_str(&segment.text);
            block.push('\n');
            block
        })
        .collect::<Vec<_>>()
        .join("\n")
}
