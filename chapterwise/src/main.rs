//! chapterwise - Summarize Word documents chapter by chapter using LLM backends

mod config;
mod docx;
mod pipeline;
mod segment;
mod session;
mod summarize;
mod text;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::ChapterwiseConfig;
use pipeline::Pipeline;
use segment::LeadingTextPolicy;
use session::{SessionStore, SummaryResult, SummaryStatus};
use std::path::PathBuf;
use summarize::Summarizer;
use summarizer_client::SummaryBackend;

#[derive(Parser, Debug)]
#[command(name = "chapterwise")]
#[command(about = "Summarize Word documents chapter by chapter using LLM backends", long_about = None)]
#[command(version)]
struct Args {
    /// DOCX files to summarize
    files: Vec<PathBuf>,

    /// Session id to accumulate results under (generated if omitted)
    #[arg(short, long)]
    session: Option<String>,

    /// Backend preset to use
    #[arg(long)]
    preset: Option<String>,

    /// Maximum text size per backend call, in bytes
    #[arg(long)]
    max_chunk_size: Option<usize>,

    /// Additional attempts after a failed backend call
    #[arg(long)]
    retries: Option<u32>,

    /// Backoff between attempts in milliseconds
    #[arg(long)]
    backoff_ms: Option<u64>,

    /// Per-call timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Reduction passes before oversized input is truncated
    #[arg(long)]
    max_reduction_depth: Option<u32>,

    /// Chapter title for documents without headings
    #[arg(long)]
    default_title: Option<String>,

    /// Discard body text before the first heading
    #[arg(long)]
    drop_leading_text: bool,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Enable debug output
    #[arg(short, long, default_value_t = false)]
    debug: bool,

    /// Subcommands
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Set maximum chunk size in bytes
    SetChunkSize {
        /// Size in bytes (must be positive)
        value: usize,
    },
    /// Set retry attempts
    SetRetries {
        /// Additional attempts after the first failure
        value: u32,
    },
    /// Set per-call timeout
    SetTimeout {
        /// Timeout in seconds (must be positive)
        secs: u64,
    },
    /// Set chapter title for documents without headings
    SetDefaultTitle {
        /// The title
        title: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if args.debug { "debug" } else { "warn" }),
    )
    .init();

    if let Some(Commands::Config { action }) = &args.command {
        return handle_config_command(action);
    }

    if args.files.is_empty() {
        anyhow::bail!("At least one DOCX file is required. Run 'chapterwise --help' for usage.");
    }

    let mut config = ChapterwiseConfig::load().context("Failed to load configuration")?;
    apply_overrides(&mut config, &args);
    config.validate()?;

    let backend = build_backend(&config, &args)?;
    eprintln!("Using backend: {}", backend.name());

    let summarizer = Summarizer::new(backend, config.summarize_options());
    let store = SessionStore::new();
    let pipeline = Pipeline::new(summarizer, &store, config.segment_options());

    let session_id = args.session.clone().unwrap_or_else(session::generate_id);

    let mut all_results: Vec<SummaryResult> = Vec::new();
    for file in &args.files {
        eprintln!("Summarizing {}", file.display());
        let bytes = std::fs::read(file)
            .with_context(|| format!("Failed to read {}", file.display()))?;
        let filename = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let results = pipeline
            .run(&bytes, &filename, &session_id)
            .await
            .with_context(|| format!("Failed to process {}", file.display()))?;

        if !args.json {
            render_text(&results);
        }
        all_results.extend(results);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&all_results)?);
    }

    let failed = all_results
        .iter()
        .filter(|r| r.status == SummaryStatus::Failed)
        .count();
    eprintln!(
        "\nSession {}: {} chapters summarized, {} failed",
        session_id,
        all_results.len() - failed,
        failed
    );

    Ok(())
}

/// CLI flags win over the config file.
fn apply_overrides(config: &mut ChapterwiseConfig, args: &Args) {
    if let Some(value) = args.max_chunk_size {
        config.max_chunk_size = value;
    }
    if let Some(value) = args.retries {
        config.retry_attempts = value;
    }
    if let Some(value) = args.backoff_ms {
        config.retry_backoff_ms = value;
    }
    if let Some(value) = args.timeout_secs {
        config.request_timeout_secs = value;
    }
    if let Some(value) = args.max_reduction_depth {
        config.max_reduction_depth = value;
    }
    if let Some(ref title) = args.default_title {
        config.default_chapter_title = title.clone();
    }
    if args.drop_leading_text {
        config.leading_text = LeadingTextPolicy::Drop;
    }
    if args.preset.is_some() {
        config.preset = args.preset.clone();
    }
}

/// Resolve the backend from presets in the client config.
fn build_backend(config: &ChapterwiseConfig, args: &Args) -> Result<Box<dyn SummaryBackend>> {
    let backend_config =
        summarizer_client::Config::load().context("Failed to load backend configuration")?;

    let preset_name = args
        .preset
        .as_deref()
        .or(config.preset.as_deref())
        .unwrap_or(&backend_config.default_preset);

    let preset = backend_config
        .get_preset(preset_name)
        .with_context(|| format!("Unknown preset: {}", preset_name))?;

    let provider_config = backend_config.get_provider_config(&preset.provider);
    let backend = summarizer_client::get_backend(preset, provider_config).with_context(|| {
        format!(
            "Failed to initialize provider '{}' for preset '{}'",
            preset.provider, preset_name
        )
    })?;

    backend.is_available()?;
    Ok(backend)
}

fn render_text(results: &[SummaryResult]) {
    for result in results {
        println!("\n## {}", result.title);
        match result.status {
            SummaryStatus::Ok => {
                println!("{}", result.summary);
                if let Some(note) = &result.error {
                    println!("(note: {})", note);
                }
            }
            SummaryStatus::Failed => {
                println!(
                    "[failed] {}",
                    result.error.as_deref().unwrap_or("unknown error")
                );
            }
        }
    }
}

fn handle_config_command(action: &ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = ChapterwiseConfig::load()?;
            println!("Configuration file: {:?}", ChapterwiseConfig::config_path()?);
            println!();
            println!("max_chunk_size = {}", config.max_chunk_size);
            println!("retry_attempts = {}", config.retry_attempts);
            println!("retry_backoff_ms = {}", config.retry_backoff_ms);
            println!("max_reduction_depth = {}", config.max_reduction_depth);
            println!("request_timeout_secs = {}", config.request_timeout_secs);
            println!("default_chapter_title = \"{}\"", config.default_chapter_title);
            let leading = match config.leading_text {
                LeadingTextPolicy::Introduction => "introduction",
                LeadingTextPolicy::Drop => "drop",
            };
            println!("leading_text = \"{}\"", leading);
            if let Some(preset) = &config.preset {
                println!("preset = \"{}\"", preset);
            } else {
                println!("preset = (backend default)");
            }
        }
        ConfigAction::SetChunkSize { value } => {
            if *value == 0 {
                anyhow::bail!("Chunk size must be a positive integer");
            }
            let mut config = ChapterwiseConfig::load()?;
            config.max_chunk_size = *value;
            config.save()?;
            println!("Maximum chunk size set to: {}", config.max_chunk_size);
        }
        ConfigAction::SetRetries { value } => {
            let mut config = ChapterwiseConfig::load()?;
            config.retry_attempts = *value;
            config.save()?;
            println!("Retry attempts set to: {}", config.retry_attempts);
        }
        ConfigAction::SetTimeout { secs } => {
            if *secs == 0 {
                anyhow::bail!("Timeout must be a positive integer");
            }
            let mut config = ChapterwiseConfig::load()?;
            config.request_timeout_secs = *secs;
            config.save()?;
            println!("Request timeout set to: {}s", config.request_timeout_secs);
        }
        ConfigAction::SetDefaultTitle { title } => {
            let mut config = ChapterwiseConfig::load()?;
            config.default_chapter_title = title.clone();
            config.save()?;
            println!(
                "Default chapter title set to: \"{}\"",
                config.default_chapter_title
            );
        }
    }
    Ok(())
}
