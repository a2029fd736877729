pub mod config;
pub mod error;
pub mod export;
pub mod oracle;
pub mod pipeline;
pub mod project;
pub mod segment;
pub mod text;

pub use config::{Config, InputFormat, OracleConfig, OutputFormat};
pub use error::{IngestError, Result};
pub use pipeline::{
    parse_document, print_summary, BatchReport, FileOutcome, Ingestor, InputFile,
};
pub use project::{assemble, TranscriptProject};
pub use segment::{ParseOptions, Segment, WordToken};
