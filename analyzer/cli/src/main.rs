//! Sentiment - Terminal Surface for the Analyzer
//!
//! Sends one piece of text to the model, streams its reasoning to the
//! terminal, and prints the decoded sentiment cards.
//!
//! # Usage
//!
//! ```bash
//! # Analyze an argument
//! sentiment "The service was slow but the staff were lovely"
//!
//! # Analyze stdin, print JSON
//! echo "I love this" | sentiment --json
//!
//! # Check that Ollama is up and the model is pulled
//! sentiment --check
//!
//! # Verbose logging
//! RUST_LOG=debug sentiment "..."
//! ```
//!
//! # Exit Status
//!
//! - `0`: records extracted (or nothing to analyze)
//! - `1`: transport or model error
//! - `2`: the answer could not be decoded
//! - `130`: interrupted

mod render;

use std::io::{IsTerminal, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use analyzer_core::{
    default_config_path, load_config_from_path, Analyzer, AnalyzerConfigFile, ConfigOverrides,
    LlmBackend, OllamaBackend, Outcome, SentimentRecord, Snapshot,
};
use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::AsyncReadExt;
use tracing::{debug, info, warn};

use render::Renderer;

/// Sentiment - streaming sentiment analysis against a local model
#[derive(Parser, Debug)]
#[command(name = "sentiment")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Text to analyze (read from stdin when omitted)
    text: Option<String>,

    /// Configuration file path
    #[arg(short = 'c', long, env = "SENTIMENT_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Model to use
    #[arg(short = 'm', long)]
    model: Option<String>,

    /// Ollama host
    #[arg(long)]
    host: Option<String>,

    /// Ollama port
    #[arg(short = 'p', long)]
    port: Option<u16>,

    /// Request timeout in seconds
    #[arg(short = 't', long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Do not ask the model to stream its reasoning
    #[arg(long)]
    no_think: bool,

    /// Print records as JSON instead of cards
    #[arg(long)]
    json: bool,

    /// Check backend health and model availability, then exit
    #[arg(long)]
    check: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, env = "SENTIMENT_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        let mut overrides = ConfigOverrides::new();
        if let Some(ref host) = self.host {
            overrides = overrides.with_host(host.clone());
        }
        if let Some(port) = self.port {
            overrides = overrides.with_port(port);
        }
        if let Some(ref model) = self.model {
            overrides = overrides.with_model(model.clone());
        }
        if let Some(secs) = self.timeout {
            overrides = overrides.with_request_timeout_secs(secs);
        }
        if self.no_think {
            overrides = overrides.with_think(false);
        }
        overrides
    }
}

/// Initialize logging with the specified level
///
/// Logs go to stderr; stdout carries only results.
fn init_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("sentiment_cli={level},analyzer_core={level}"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

/// Resolve configuration: file, then environment, then flags
fn resolve_config(args: &Args) -> Result<AnalyzerConfigFile> {
    let path = args.config.clone().or_else(default_config_path);
    let mut config = load_config_from_path(path).context("Failed to load configuration")?;
    args.overrides()
        .apply(&mut config)
        .context("Invalid command-line option")?;

    info!(
        source = %config.source(),
        model = %config.analyzer.model,
        think = config.analyzer.think,
        "Configuration resolved"
    );
    Ok(config)
}

/// Text from the argument, or all of stdin
async fn read_input(arg: Option<String>) -> Result<String> {
    if let Some(text) = arg {
        return Ok(text);
    }
    let mut text = String::new();
    tokio::io::stdin()
        .read_to_string(&mut text)
        .await
        .context("Failed to read text from stdin")?;
    Ok(text)
}

/// Health check and model lookup
async fn check(backend: &OllamaBackend, model: &str) -> ExitCode {
    if !backend.health_check().await {
        eprintln!("✗ {} is not reachable", backend.name());
        return ExitCode::from(1);
    }
    println!("✓ {} is reachable", backend.name());

    match backend.has_model(model).await {
        Ok(true) => {
            println!("✓ model '{model}' is available");
            ExitCode::SUCCESS
        }
        Ok(false) => {
            eprintln!("✗ model '{model}' is not available");
            ExitCode::from(1)
        }
        Err(e) => {
            eprintln!("✗ failed to list models: {e:#}");
            ExitCode::from(1)
        }
    }
}

/// Renderer sized and colored for the current stdout
fn stdout_renderer() -> Renderer {
    let width = crossterm::terminal::size().map_or(80, |(cols, _)| usize::from(cols));
    Renderer::new(std::io::stdout().is_terminal(), width)
}

fn render_to_stdout(renderer: &mut Renderer, snapshot: &Snapshot) -> std::io::Result<()> {
    renderer.render(snapshot, &mut std::io::stdout().lock())
}

fn print_json(records: &[SentimentRecord]) -> Result<()> {
    let json = render::records_json(records)?;
    writeln!(std::io::stdout().lock(), "{json}")?;
    Ok(())
}

/// Drive one analysis, rendering snapshots as they are published
async fn analyze(
    analyzer: &mut Analyzer<OllamaBackend>,
    text: &str,
    json: bool,
) -> Result<Option<Outcome>> {
    let mut snapshots = analyzer.subscribe();
    let mut renderer = stdout_renderer();

    if !analyzer.submit(text).await? {
        debug!("Nothing to analyze");
        return Ok(None);
    }

    let interrupt = tokio::signal::ctrl_c();
    tokio::pin!(interrupt);

    while analyzer.status().is_busy() {
        let mut interrupted = false;
        tokio::select! {
            more = analyzer.process_next() => {
                if !more {
                    break;
                }
            }
            _ = &mut interrupt => interrupted = true,
        }
        if interrupted {
            warn!("Interrupted, cancelling analysis");
            analyzer.cancel();
        }

        if !json && snapshots.has_changed().unwrap_or(false) {
            let snapshot = snapshots.borrow_and_update().clone();
            render_to_stdout(&mut renderer, &snapshot)?;
        }
    }

    // Catch the final snapshot if the loop ended on it
    if !json {
        let snapshot = snapshots.borrow_and_update().clone();
        render_to_stdout(&mut renderer, &snapshot)?;
    }

    Ok(analyzer.last_outcome())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    init_logging(&args.log_level);

    let config = resolve_config(&args)?;
    let backend = OllamaBackend::from_config(&config.backend, config.request_timeout)?;

    if args.check {
        return Ok(check(&backend, &config.analyzer.model).await);
    }

    let text = read_input(args.text.clone()).await?;
    let mut analyzer = Analyzer::new(backend, config.analyzer);

    let outcome = analyze(&mut analyzer, &text, args.json).await?;
    let code = match outcome {
        None => ExitCode::SUCCESS,
        Some(Outcome::Extracted) => {
            if args.json {
                print_json(analyzer.results().records())?;
            }
            ExitCode::SUCCESS
        }
        Some(Outcome::ExtractionFailed) => {
            let reason = analyzer.results().last_failure().unwrap_or("unknown");
            eprintln!("Could not read the model's answer: {reason}");
            ExitCode::from(2)
        }
        Some(Outcome::Failed) => {
            let reason = analyzer.accumulator().last_error().unwrap_or("unknown");
            eprintln!("Analysis failed: {reason}");
            ExitCode::from(1)
        }
        Some(Outcome::Cancelled) => ExitCode::from(130),
    };

    Ok(code)
}
