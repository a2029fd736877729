// Canonical JSON project document
use super::ProjectFormatter;
use crate::project::TranscriptProject;

pub struct JsonFormatter;

impl ProjectFormatter for JsonFormatter {
    fn format(&self, project: &TranscriptProject) -> String {
        project
            .to_json_pretty()
            .unwrap_or_else(|_| "{}".to_string())
    }

    fn extension(&self) -> &'static str {
        "json"
    }
}
