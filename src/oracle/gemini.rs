use crate::config::OracleConfig;
use crate::error::{IngestError, Result};
use crate::oracle::{build_prompt, parse_layout_answer, FormatOracle};
use crate::text::LayoutSelection;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Asks a Gemini model which layout a sample uses.
///
/// Endpoints are tried in order. Each gets up to `max_attempts` requests with
/// exponential backoff on server and network errors; a client error or an
/// unusable answer moves on to the next endpoint at once.
pub struct GeminiOracle {
    client: reqwest::Client,
    api_key: String,
    model: String,
    endpoints: Vec<String>,
    max_attempts: u32,
    base_delay_ms: u64,
}

impl GeminiOracle {
    pub fn new(config: OracleConfig) -> Result<Self> {
        let api_key = config.api_key.ok_or_else(|| {
            IngestError::Config(
                "GEMINI_API_KEY not set. Get one at https://aistudio.google.com/apikey"
                    .to_string(),
            )
        })?;
        if config.endpoints.is_empty() {
            return Err(IngestError::Config(
                "No oracle endpoints configured".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model: config.model,
            endpoints: config.endpoints,
            max_attempts: config.max_attempts.max(1),
            base_delay_ms: config.base_delay_ms,
        })
    }

    fn generate_content_url(&self, endpoint: &str) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            endpoint.trim_end_matches('/'),
            self.model,
            self.api_key
        )
    }

    /// Query one endpoint, retrying server-side failures.
    async fn query_endpoint(
        &self,
        endpoint: &str,
        request: &GenerateContentRequest,
    ) -> Result<LayoutSelection> {
        let url = self.generate_content_url(endpoint);

        let mut last_error = None;

        for attempt in 0..self.max_attempts {
            if attempt > 0 {
                let delay = self.base_delay_ms * 2u64.pow(attempt - 1);
                debug!("Retry attempt {} after {}ms delay", attempt, delay);
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }

            let response = self
                .client
                .post(&url)
                .header("Content-Type", "application/json")
                .json(request)
                .send()
                .await;

            match response {
                Ok(resp) => {
                    let status = resp.status();
                    debug!("Oracle response status from {}: {}", endpoint, status);

                    if status.is_success() {
                        let body = resp.text().await?;
                        let parsed: GenerateContentResponse = serde_json::from_str(&body)
                            .map_err(|e| {
                                IngestError::Oracle(format!("unexpected response body: {}", e))
                            })?;
                        let answer = parsed.answer_text();
                        debug!("Oracle answer: {}", answer);
                        return parse_layout_answer(&answer);
                    }

                    let error_body = resp.text().await.unwrap_or_default();

                    // Don't retry on client errors
                    if status.is_client_error() {
                        return Err(IngestError::Oracle(format!(
                            "Gemini API error ({}): {}",
                            status, error_body
                        )));
                    }

                    warn!("Gemini API server error ({}): {}", status, error_body);
                    last_error = Some(IngestError::Oracle(format!(
                        "Gemini API server error: {}",
                        status
                    )));
                }
                Err(e) => {
                    warn!("Gemini API request failed: {}", e);
                    last_error = Some(e.into());
                }
            }
        }

        Err(last_error.unwrap_or_else(|| IngestError::Oracle("Unknown error".to_string())))
    }
}

#[async_trait]
impl FormatOracle for GeminiOracle {
    async fn infer_layout(&self, sample: &str) -> Result<LayoutSelection> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: build_prompt(sample),
                }],
            }],
            generation_config: Some(GenerationConfig {
                temperature: Some(0.0),
                max_output_tokens: Some(256),
                response_mime_type: Some("application/json".to_string()),
            }),
        };

        let mut failures = Vec::new();
        for endpoint in &self.endpoints {
            match self.query_endpoint(endpoint, &request).await {
                Ok(selection) => {
                    info!(
                        "Oracle chose layout {} (speaker group {}, time group {:?})",
                        selection.layout, selection.speaker_group, selection.time_group
                    );
                    return Ok(selection);
                }
                Err(e) => {
                    warn!("Oracle endpoint {} failed: {}", endpoint, e);
                    failures.push(e.to_string());
                }
            }
        }

        Err(IngestError::UnresolvableFormat(format!(
            "no oracle endpoint produced a usable layout ({})",
            failures.join("; ")
        )))
    }

    fn name(&self) -> &'static str {
        "Google Gemini"
    }
}

// Request/Response types

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    /// Text parts of the first candidate, concatenated.
    fn answer_text(&self) -> String {
        self.candidates
            .first()
            .map(|c| {
                c.content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::LineLayout;

    fn config() -> OracleConfig {
        OracleConfig {
            api_key: Some("test-key".to_string()),
            ..OracleConfig::default()
        }
    }

    #[test]
    fn test_new_requires_key_and_endpoints() {
        assert!(GeminiOracle::new(OracleConfig::default()).is_err());

        let mut no_endpoints = config();
        no_endpoints.endpoints.clear();
        assert!(matches!(
            GeminiOracle::new(no_endpoints),
            Err(IngestError::Config(_))
        ));

        assert!(GeminiOracle::new(config()).is_ok());
    }

    #[test]
    fn test_generate_content_url() {
        let oracle = GeminiOracle::new(config()).unwrap();
        assert_eq!(
            oracle.generate_content_url("http://localhost:9000/v1beta/"),
            "http://localhost:9000/v1beta/models/gemini-2.0-flash:generateContent?key=test-key"
        );
    }

    #[test]
    fn test_answer_text_joins_parts() {
        let body = r#"{"candidates": [{"content": {"parts": [
            {"text": "{\"layout\": \"name_time\", "},
            {"text": "\"speaker_group\": 1, \"time_group\": 2}"}
        ]}}]}"#;
        let response: GenerateContentResponse = serde_json::from_str(body).unwrap();
        let selection = parse_layout_answer(&response.answer_text()).unwrap();
        assert_eq!(selection.layout, LineLayout::NameTime);
    }

    #[test]
    fn test_empty_response_has_no_answer() {
        let response: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(response.answer_text(), "");
    }

    #[test]
    fn test_request_serialization() {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: "hi".to_string(),
                }],
            }],
            generation_config: Some(GenerationConfig {
                temperature: Some(0.0),
                max_output_tokens: None,
                response_mime_type: Some("application/json".to_string()),
            }),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["contents"][0]["parts"][0]["text"], "hi");
        assert_eq!(
            value["generation_config"]["response_mime_type"],
            "application/json"
        );
        assert!(value["generation_config"].get("max_output_tokens").is_none());
    }
}
