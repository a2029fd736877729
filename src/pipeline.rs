use crate::config::InputFormat;
use crate::error::{IngestError, Result};
use crate::oracle::FormatOracle;
use crate::project::{assemble, TranscriptProject};
use crate::segment::{create_decoder, segment_units, ParseOptions, SourceDocument};
use crate::text::layout::DETECTION_SAMPLE_LINES;
use crate::text::{detect_layout, SpeakerResolver};
use console::style;
use futures::stream::{FuturesUnordered, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

/// Parse one document with the built-in rules only.
///
/// Text that matches no known layout falls back to the default resolver,
/// which may find no speakers and yield an empty transcript.
pub fn parse_document(
    format: InputFormat,
    content: &[u8],
    source: &str,
    options: &ParseOptions,
) -> Result<TranscriptProject> {
    let segments = match create_decoder(format).decode(content)? {
        SourceDocument::Segments(segments) => segments,
        SourceDocument::Text(units) => segment_units(&units, &heuristic_resolver(&units), options),
    };
    Ok(assemble(segments, source))
}

/// The default rules, or the detected layout when they find no speaker at all.
pub fn heuristic_resolver<S: AsRef<str>>(units: &[S]) -> SpeakerResolver {
    let default = SpeakerResolver::default();
    if default.finds_speaker(units) {
        return default;
    }
    match detect_layout(units) {
        Some(layout) => {
            debug!("Detected layout: {}", layout);
            SpeakerResolver::for_selection(layout.default_selection())
        }
        None => default,
    }
}

/// First non-empty lines of a document, as shown to an oracle.
fn layout_sample<S: AsRef<str>>(units: &[S]) -> String {
    units
        .iter()
        .map(|u| u.as_ref().trim())
        .filter(|u| !u.is_empty())
        .take(DETECTION_SAMPLE_LINES)
        .collect::<Vec<_>>()
        .join("\n")
}

/// A document to ingest.
#[derive(Debug, Clone)]
pub struct InputFile {
    /// File name, recorded as the project's media source.
    pub name: String,
    pub content: Vec<u8>,
    /// Forced format; otherwise taken from the name's extension.
    pub format: Option<InputFormat>,
}

impl InputFile {
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            format: None,
        }
    }

    pub fn with_format(mut self, format: Option<InputFormat>) -> Self {
        self.format = format;
        self
    }

    pub async fn read(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(IngestError::FileNotFound(path.display().to_string()));
        }
        let content = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, content))
    }

    pub fn resolve_format(&self) -> Result<InputFormat> {
        match self.format {
            Some(format) => Ok(format),
            None => InputFormat::from_path(Path::new(&self.name)),
        }
    }
}

/// Result of ingesting one file in a batch.
#[derive(Debug)]
pub struct FileOutcome {
    pub name: String,
    pub result: std::result::Result<TranscriptProject, String>,
}

#[derive(Debug)]
pub struct BatchReport {
    /// In input order.
    pub outcomes: Vec<FileOutcome>,
    pub elapsed: Duration,
}

impl BatchReport {
    pub fn succeeded(&self) -> impl Iterator<Item = (&str, &TranscriptProject)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok().map(|p| (o.name.as_str(), p)))
    }

    pub fn failed(&self) -> impl Iterator<Item = (&str, &str)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.name.as_str(), e.as_str())))
    }

    /// File name to project, or to `{"error": message}`.
    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .outcomes
            .iter()
            .map(|o| {
                let value = match &o.result {
                    Ok(project) => serde_json::to_value(project)
                        .unwrap_or_else(|e| serde_json::json!({ "error": e.to_string() })),
                    Err(message) => serde_json::json!({ "error": message }),
                };
                (o.name.clone(), value)
            })
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(map)
    }
}

enum BatchInput {
    Loaded(InputFile),
    Path(PathBuf, Option<InputFormat>),
}

impl BatchInput {
    fn name(&self) -> String {
        match self {
            BatchInput::Loaded(file) => file.name.clone(),
            BatchInput::Path(path, _) => path.display().to_string(),
        }
    }
}

/// Turns input files into projects, consulting an oracle for unknown layouts.
pub struct Ingestor {
    options: ParseOptions,
    oracle: Option<Arc<dyn FormatOracle>>,
    concurrency: usize,
    show_progress: bool,
}

impl Ingestor {
    pub fn new(options: ParseOptions) -> Self {
        Self {
            options,
            oracle: None,
            concurrency: 4,
            show_progress: false,
        }
    }

    pub fn with_oracle(mut self, oracle: Arc<dyn FormatOracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Enable or disable progress bar display.
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub async fn ingest(&self, file: &InputFile) -> Result<TranscriptProject> {
        let format = file.resolve_format()?;
        info!("Ingesting {} as {}", file.name, format);

        let segments = match create_decoder(format).decode(&file.content)? {
            SourceDocument::Segments(segments) => segments,
            SourceDocument::Text(units) => {
                let resolver = self.resolver_for(&units).await?;
                segment_units(&units, &resolver, &self.options)
            }
        };

        debug!("{}: {} segments", file.name, segments.len());
        Ok(assemble(segments, &file.name))
    }

    async fn resolver_for(&self, units: &[String]) -> Result<SpeakerResolver> {
        let default = SpeakerResolver::default();
        if default.finds_speaker(units) || detect_layout(units).is_some() {
            return Ok(heuristic_resolver(units));
        }
        let Some(oracle) = &self.oracle else {
            return Ok(default);
        };

        let sample = layout_sample(units);
        if sample.is_empty() {
            return Ok(default);
        }

        info!("No known speaker layout; asking {}", oracle.name());
        let selection = oracle.infer_layout(&sample).await.map_err(|e| match e {
            IngestError::UnresolvableFormat(_) => e,
            other => IngestError::UnresolvableFormat(other.to_string()),
        })?;
        Ok(SpeakerResolver::for_selection(selection))
    }

    /// Ingest files concurrently. A failing file never stops the others.
    pub async fn ingest_batch(&self, files: Vec<InputFile>) -> BatchReport {
        self.run_batch(files.into_iter().map(BatchInput::Loaded).collect())
            .await
    }

    /// Read and ingest files; read errors are reported per file.
    pub async fn ingest_paths(&self, paths: &[PathBuf], format: Option<InputFormat>) -> BatchReport {
        self.run_batch(
            paths
                .iter()
                .map(|p| BatchInput::Path(p.clone(), format))
                .collect(),
        )
        .await
    }

    async fn run_batch(&self, inputs: Vec<BatchInput>) -> BatchReport {
        let start_time = Instant::now();
        let total = inputs.len();

        info!(
            "Ingesting {} files with {} concurrent workers",
            total, self.concurrency
        );

        let progress_bar = if self.show_progress && total > 0 {
            let pb = ProgressBar::new(total as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({eta})")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            Some(pb)
        } else {
            None
        };

        // Use semaphore to limit concurrency
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut futures = FuturesUnordered::new();

        for (position, input) in inputs.into_iter().enumerate() {
            let sem = semaphore.clone();
            let pb = progress_bar.clone();

            futures.push(async move {
                let _permit = sem.acquire().await.ok();
                let name = input.name();

                let file = match input {
                    BatchInput::Loaded(file) => Ok(file),
                    BatchInput::Path(path, format) => {
                        InputFile::read(&path).await.map(|f| f.with_format(format))
                    }
                };
                let result = match file {
                    Ok(file) => self.ingest(&file).await,
                    Err(e) => Err(e),
                };

                if let Some(ref pb) = pb {
                    pb.inc(1);
                }

                let result = result.map_err(|e| {
                    warn!("{} failed: {}", name, e);
                    e.to_string()
                });
                (position, FileOutcome { name, result })
            });
        }

        let mut outcomes = Vec::with_capacity(total);
        while let Some(outcome) = futures.next().await {
            outcomes.push(outcome);
        }

        if let Some(pb) = progress_bar {
            pb.finish_with_message("Ingestion complete");
        }

        // Sort by input position to keep the report stable
        outcomes.sort_by_key(|(position, _)| *position);

        BatchReport {
            outcomes: outcomes.into_iter().map(|(_, o)| o).collect(),
            elapsed: start_time.elapsed(),
        }
    }
}

/// Print a summary of a batch.
pub fn print_summary(report: &BatchReport) {
    println!();
    for (name, project) in report.succeeded() {
        println!(
            "  {} {} ({} segments, {:.1}s)",
            style("✓").green(),
            name,
            project.segments().len(),
            project.media.duration
        );
    }
    for (name, error) in report.failed() {
        println!("  {} {}: {}", style("✗").red(), name, error);
    }
    println!();
    println!(
        "  {} succeeded, {} failed in {:.2}s",
        report.succeeded().count(),
        report.failed().count(),
        report.elapsed.as_secs_f64()
    );
    println!();
}
