use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Missing required key in JSON structure: {0}")]
    MissingField(String),

    #[error("Could not resolve transcript format: {0}")]
    UnresolvableFormat(String),

    #[error("Unsupported input format: {0}")]
    UnsupportedFormat(String),

    #[error("Format oracle error: {0}")]
    Oracle(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, IngestError>;
