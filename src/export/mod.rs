pub mod json;
pub mod srt;

use crate::config::OutputFormat;
use crate::project::TranscriptProject;

/// Renders a finished project into an output file's contents.
pub trait ProjectFormatter {
    fn format(&self, project: &TranscriptProject) -> String;
    fn extension(&self) -> &'static str;
}

pub fn create_formatter(format: OutputFormat) -> Box<dyn ProjectFormatter> {
    match format {
        OutputFormat::Json => Box::new(json::JsonFormatter),
        OutputFormat::Srt => Box::new(srt::SrtFormatter),
        OutputFormat::Srtx => Box::new(srt::SrtxFormatter),
    }
}
