use anyhow::{Context, Result};
use clap::Parser;
use papercut_ingest::config::{Config, InputFormat, OutputFormat};
use papercut_ingest::export::create_formatter;
use papercut_ingest::oracle::GeminiOracle;
use papercut_ingest::pipeline::{print_summary, Ingestor};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "papercut-ingest")]
#[command(version, about = "Normalize transcripts into canonical transcript projects")]
#[command(long_about = "Parse DOCX, JSON, SRT, SRTX or plain-text transcripts into one speaker-attributed, time-coded project document.")]
struct Cli {
    /// Transcript files to ingest
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Force the input format: docx, json, srt, srtx, txt (default: by extension)
    #[arg(short, long)]
    format: Option<String>,

    /// Directory for output files (defaults to next to each input)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output rendering: json, srt, srtx
    #[arg(short, long)]
    emit: Option<String>,

    /// Seconds assumed for a segment whose end is not given
    #[arg(long)]
    segment_duration: Option<f64>,

    /// Number of files processed concurrently
    #[arg(short, long)]
    concurrency: Option<usize>,

    /// Write a JSON report mapping each input to its project or error
    #[arg(long)]
    report: Option<PathBuf>,

    /// Never ask the format oracle about unknown layouts
    #[arg(long)]
    no_oracle: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();
}

fn derive_output_path(input: &Path, output_dir: Option<&Path>, format: &OutputFormat) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default();
    let file_name = format!("{}.transcript.{}", stem.to_string_lossy(), format.extension());
    match output_dir {
        Some(dir) => dir.join(file_name),
        None => {
            let mut output = input.to_path_buf();
            output.set_file_name(file_name);
            output
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    // Load configuration, then let flags win
    let mut config = Config::load().context("Failed to load configuration")?;
    if let Some(duration) = cli.segment_duration {
        config.segment_duration = duration;
    }
    if let Some(concurrency) = cli.concurrency {
        config.concurrency = concurrency;
    }
    config
        .validate()
        .context("Configuration validation failed")?;

    let input_format: Option<InputFormat> = cli
        .format
        .as_deref()
        .map(str::parse)
        .transpose()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    let emit: OutputFormat = match cli.emit.as_deref() {
        Some(emit) => emit.parse().map_err(|e: String| anyhow::anyhow!(e))?,
        None => config.default_output,
    };

    if let Some(ref dir) = cli.output_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    }

    let mut ingestor = Ingestor::new(config.parse_options())
        .with_concurrency(config.concurrency)
        .with_progress(cli.inputs.len() > 1);

    match config.oracle() {
        Some(oracle_config) if !cli.no_oracle => {
            let oracle = GeminiOracle::new(oracle_config).context("Failed to set up format oracle")?;
            ingestor = ingestor.with_oracle(Arc::new(oracle));
        }
        _ => info!("Format oracle disabled; unknown layouts use the default rules"),
    }

    info!("Inputs:   {}", cli.inputs.len());
    info!("Emit:     {}", emit);
    info!("Segment:  {}s default duration", config.segment_duration);

    let report = ingestor.ingest_paths(&cli.inputs, input_format).await;

    let formatter = create_formatter(emit);
    for (input, outcome) in cli.inputs.iter().zip(&report.outcomes) {
        if let Ok(project) = &outcome.result {
            let output = derive_output_path(input, cli.output_dir.as_deref(), &emit);
            std::fs::write(&output, formatter.format(project))
                .with_context(|| format!("Failed to write {}", output.display()))?;
            info!("Wrote {}", output.display());
        }
    }

    if let Some(ref path) = cli.report {
        let json = serde_json::to_string_pretty(&report.to_json())?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report {}", path.display()))?;
        info!("Report written to {}", path.display());
    }

    print_summary(&report);

    if report.succeeded().next().is_none() {
        anyhow::bail!("No input could be ingested");
    }

    Ok(())
}
