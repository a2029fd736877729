//! Mock API tests for the format oracle
//!
//! A local wiremock server stands in for the Gemini endpoints.

use papercut_ingest::config::OracleConfig;
use papercut_ingest::oracle::{FormatOracle, GeminiOracle};
use papercut_ingest::pipeline::{Ingestor, InputFile};
use papercut_ingest::segment::ParseOptions;
use papercut_ingest::text::LineLayout;
use papercut_ingest::IngestError;
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GENERATE_PATH: &str = "/v1beta/models/gemini-2.0-flash:generateContent";

fn oracle_config(endpoints: Vec<String>) -> OracleConfig {
    OracleConfig {
        api_key: Some("test-key".to_string()),
        endpoints,
        max_attempts: 3,
        base_delay_ms: 1,
        ..OracleConfig::default()
    }
}

fn endpoint(server: &MockServer) -> String {
    format!("{}/v1beta", server.uri())
}

fn answer(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "candidates": [{"content": {"parts": [{"text": text}]}}]
    }))
}

const NAME_TIME_ANSWER: &str = r#"{"layout": "name_time", "speaker_group": 1, "time_group": 2}"#;

// ============================================================================
// GeminiOracle
// ============================================================================

mod gemini_oracle_tests {
    use super::*;

    #[tokio::test]
    async fn test_oracle_name() {
        let oracle = GeminiOracle::new(oracle_config(vec!["http://localhost".to_string()])).unwrap();
        assert_eq!(oracle.name(), "Google Gemini");
    }

    #[tokio::test]
    async fn test_successful_answer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .and(query_param("key", "test-key"))
            .and(body_string_contains("Alice 00:05 hello"))
            .respond_with(answer(NAME_TIME_ANSWER))
            .expect(1)
            .mount(&server)
            .await;

        let oracle = GeminiOracle::new(oracle_config(vec![endpoint(&server)])).unwrap();
        let selection = oracle.infer_layout("Alice 00:05 hello").await.unwrap();

        assert_eq!(selection, LineLayout::NameTime.default_selection());
    }

    #[tokio::test]
    async fn test_fenced_answer_is_accepted() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(answer(
                "```json\n{\"layout\": \"time_first\", \"speaker_group\": 2, \"time_group\": 1}\n```",
            ))
            .mount(&server)
            .await;

        let oracle = GeminiOracle::new(oracle_config(vec![endpoint(&server)])).unwrap();
        let selection = oracle.infer_layout("sample").await.unwrap();
        assert_eq!(selection.layout, LineLayout::TimeFirst);
    }

    #[tokio::test]
    async fn test_server_errors_retry_then_fall_back() {
        let failing = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .expect(3)
            .mount(&failing)
            .await;

        let healthy = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(answer(NAME_TIME_ANSWER))
            .expect(1)
            .mount(&healthy)
            .await;

        let oracle =
            GeminiOracle::new(oracle_config(vec![endpoint(&failing), endpoint(&healthy)])).unwrap();
        let selection = oracle.infer_layout("sample").await.unwrap();
        assert_eq!(selection.layout, LineLayout::NameTime);
    }

    #[tokio::test]
    async fn test_client_error_moves_on_without_retry() {
        let rejecting = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(ResponseTemplate::new(403).set_body_string("region not supported"))
            .expect(1)
            .mount(&rejecting)
            .await;

        let healthy = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(answer(NAME_TIME_ANSWER))
            .expect(1)
            .mount(&healthy)
            .await;

        let oracle =
            GeminiOracle::new(oracle_config(vec![endpoint(&rejecting), endpoint(&healthy)]))
                .unwrap();
        assert!(oracle.infer_layout("sample").await.is_ok());
    }

    #[tokio::test]
    async fn test_unusable_answer_moves_on() {
        let confused = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(answer("import re\nre.findall(r'(\\w+):', text)"))
            .expect(1)
            .mount(&confused)
            .await;

        let healthy = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(answer(NAME_TIME_ANSWER))
            .expect(1)
            .mount(&healthy)
            .await;

        let oracle =
            GeminiOracle::new(oracle_config(vec![endpoint(&confused), endpoint(&healthy)]))
                .unwrap();
        assert!(oracle.infer_layout("sample").await.is_ok());
    }

    #[tokio::test]
    async fn test_all_endpoints_exhausted() {
        let first = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&first)
            .await;

        let second = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(answer(r#"{"layout": "name_colon", "speaker_group": 9}"#))
            .mount(&second)
            .await;

        let oracle =
            GeminiOracle::new(oracle_config(vec![endpoint(&first), endpoint(&second)])).unwrap();
        let result = oracle.infer_layout("sample").await;

        assert!(matches!(result, Err(IngestError::UnresolvableFormat(_))));
    }
}

// ============================================================================
// Ingestor with a mocked oracle
// ============================================================================

mod ingestor_oracle_tests {
    use super::*;

    fn document_with_preamble() -> String {
        let mut lines: Vec<String> = (1..=10).map(|i| format!("Agenda item {}", i)).collect();
        lines.push("Alice 00:05 hello everyone".to_string());
        lines.push("Bob 00:09 hi".to_string());
        lines.join("\n")
    }

    #[tokio::test]
    async fn test_ingestor_uses_oracle_layout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .and(body_string_contains("Agenda item 1"))
            .respond_with(answer(NAME_TIME_ANSWER))
            .expect(1)
            .mount(&server)
            .await;

        let oracle = GeminiOracle::new(oracle_config(vec![endpoint(&server)])).unwrap();
        let ingestor = Ingestor::new(ParseOptions::default()).with_oracle(Arc::new(oracle));

        let file = InputFile::new("minutes.txt", document_with_preamble());
        let project = ingestor.ingest(&file).await.unwrap();
        let segments = project.segments();

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].speaker, "Alice");
        assert_eq!(segments[0].text, "hello everyone");
        assert_eq!(segments[0].start_time, 5.0);
        assert_eq!(segments[0].end_time, 9.0);
        assert_eq!(segments[1].speaker, "Bob");
        assert_eq!(segments[1].end_time, 39.0);
    }

    #[tokio::test]
    async fn test_oracle_failure_fails_only_that_file() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400))
            .mount(&server)
            .await;

        let oracle = GeminiOracle::new(oracle_config(vec![endpoint(&server)])).unwrap();
        let ingestor = Ingestor::new(ParseOptions::default()).with_oracle(Arc::new(oracle));

        let report = ingestor
            .ingest_batch(vec![
                InputFile::new("minutes.txt", document_with_preamble()),
                InputFile::new("talk.txt", "**Alice** 00:00 hi"),
            ])
            .await;

        assert_eq!(report.failed().count(), 1);
        let (name, error) = report.failed().next().unwrap();
        assert_eq!(name, "minutes.txt");
        assert!(error.contains("Could not resolve transcript format"));
        assert_eq!(report.succeeded().count(), 1);
    }
}
