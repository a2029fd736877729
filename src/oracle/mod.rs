//! Layout inference for text that no built-in rule recognizes.
//!
//! An oracle only ever answers with data: one of the closed set of
//! [`LineLayout`]s plus the capture groups holding the speaker and the
//! timestamp. The answer is validated before the segmenter uses it.

pub mod gemini;

pub use gemini::GeminiOracle;

use crate::error::{IngestError, Result};
use crate::text::{LayoutSelection, LineLayout};
use async_trait::async_trait;

#[async_trait]
pub trait FormatOracle: Send + Sync {
    /// Pick a layout for a sample of the document's first lines.
    async fn infer_layout(&self, sample: &str) -> Result<LayoutSelection>;
    fn name(&self) -> &'static str;
}

/// Instructions sent along with the sample.
pub fn build_prompt(sample: &str) -> String {
    let mut prompt = String::new();

    prompt.push_str("The following lines come from a transcript document. ");
    prompt.push_str("Identify how each speaker turn is introduced.\n\n");
    prompt.push_str("Choose exactly one layout:\n");
    for layout in LineLayout::PRIORITY {
        prompt.push_str(&format!(
            "- {}: {} (capture groups: {})\n",
            layout,
            layout.describe(),
            layout.capture_count()
        ));
    }

    prompt.push_str("\nAnswer with a single JSON object and nothing else:\n");
    prompt.push_str(
        r#"{"layout": "<layout>", "speaker_group": <n>, "time_group": <n or null>}"#,
    );
    prompt.push_str("\n\nSample:\n");
    prompt.push_str(sample);
    prompt.push('\n');

    prompt
}

/// Parse and validate the model's answer.
///
/// Tolerates prose or code fences around the JSON object.
pub fn parse_layout_answer(answer: &str) -> Result<LayoutSelection> {
    let (Some(open), Some(close)) = (answer.find('{'), answer.rfind('}')) else {
        return Err(IngestError::Oracle(format!(
            "answer holds no JSON object: {:?}",
            answer.trim()
        )));
    };
    if close < open {
        return Err(IngestError::Oracle(format!(
            "answer holds no JSON object: {:?}",
            answer.trim()
        )));
    }

    let selection: LayoutSelection = serde_json::from_str(&answer[open..=close])
        .map_err(|e| IngestError::Oracle(format!("unusable layout answer: {}", e)))?;
    selection.validate()?;
    Ok(selection)
}
