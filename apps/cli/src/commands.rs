//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use trainset_core::pipeline::{ProgressReporter, RunReport};
use trainset_core::{AnnotationFailure, ArtifactKind, DirectorySink};
use trainset_llm::GeminiClient;
use trainset_scrape::{FetchError, HttpFetcher};
use trainset_shared::{
    AppConfig, PipelineConfig, Topic, init_config, load_config, load_config_from,
    resolve_api_key,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// TrainSet: turn a topic into a supervised training dataset.
#[derive(Parser)]
#[command(
    name = "trainset",
    version,
    about = "Discover, scrape, and annotate web sources into an input/output training dataset.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.trainset/trainset.toml.
    #[arg(long, global = true, env = "TRAINSET_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Build a dataset for a topic.
    Run {
        /// Topic to collect training data about.
        topic: String,

        /// Output directory for the exported files.
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Maximum characters per annotation chunk.
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Number of source URLs to request.
        #[arg(long)]
        urls: Option<usize>,

        /// Model to use for discovery and annotation.
        #[arg(short, long)]
        model: Option<String>,

        /// Do not save raw output of malformed chunks.
        #[arg(long)]
        no_diagnostics: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

/// Flag overrides for `run`.
struct RunOverrides {
    out: Option<PathBuf>,
    chunk_size: Option<usize>,
    urls: Option<usize>,
    model: Option<String>,
    no_diagnostics: bool,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "trainset=info",
        1 => "trainset=debug",
        _ => "trainset=trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config;
    match cli.command {
        Command::Run {
            topic,
            out,
            chunk_size,
            urls,
            model,
            no_diagnostics,
        } => {
            let overrides = RunOverrides {
                out,
                chunk_size,
                urls,
                model,
                no_diagnostics,
            };
            cmd_run(&topic, config_path.as_deref(), overrides).await
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show(config_path.as_deref()).await,
        },
    }
}

fn load(config_path: Option<&Path>) -> Result<AppConfig> {
    let config = match config_path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    Ok(config)
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

async fn cmd_run(topic: &str, config_path: Option<&Path>, overrides: RunOverrides) -> Result<()> {
    let mut config = load(config_path)?;
    if let Some(model) = overrides.model {
        config.model.model = model;
    }

    let mut pipeline = PipelineConfig::from(&config);
    if let Some(n) = overrides.chunk_size {
        pipeline.max_chunk_chars = n;
    }
    if let Some(n) = overrides.urls {
        pipeline.url_count = n;
    }
    if overrides.no_diagnostics {
        pipeline.write_diagnostics = false;
    }

    // Fail on bad input before touching the network or the key.
    let topic = Topic::new(topic)?;
    pipeline.validate()?;
    let api_key = resolve_api_key(&config)?;

    let out_dir = overrides
        .out
        .unwrap_or_else(|| PathBuf::from(&config.pipeline.output_dir));

    let model = GeminiClient::new(&config.model, api_key)?;
    let fetcher = HttpFetcher::new(&config.scrape)?;
    let mut sink = DirectorySink::new(&out_dir);

    info!(
        topic = %topic,
        model = %config.model.model,
        out = %out_dir.display(),
        "building dataset"
    );

    let reporter = CliProgress::new();
    let report =
        trainset_core::run(&topic, &pipeline, &model, &fetcher, &mut sink, &reporter).await?;

    print_report(&report);
    Ok(())
}

fn print_report(report: &RunReport) {
    println!();
    println!("  Run:     {} ({})", report.run_id, report.started_at.to_rfc3339());
    println!();
    println!("  Sources:");
    for url in &report.urls {
        println!("    {url}");
    }

    if !report.source_failures.is_empty() {
        println!();
        println!("  Skipped sources:");
        for failure in &report.source_failures {
            println!("    {} ({})", failure.url, failure.error);
        }
    }

    println!();
    match report.artifact(ArtifactKind::MergedText) {
        Some(merged) if report.merged.is_some() => {
            println!("  Merged content: {}", merged.location);
        }
        _ => println!("  Merged content: (empty, no source could be scraped)"),
    }
    println!("  Chunks:         {}", report.chunk_count);
    println!("  Examples:       {}", report.pair_count());
    if !report.annotation_failures.is_empty() {
        println!("  Skipped chunks: {}", report.annotation_failures.len());
    }

    if report.pair_count() == 0 {
        println!();
        println!("  Warning: no training examples were produced.");
    } else {
        println!();
        println!("  Preview:");
        for (i, pair) in report.preview.iter().enumerate() {
            println!("    [{}] Input:  {}", i + 1, pair.input);
            println!("        Output: {}", pair.output);
        }
    }

    println!();
    println!("  Artifacts:");
    for artifact in &report.artifacts {
        println!("    {:<12} {}", artifact.kind.as_str(), artifact.location);
    }
    println!();
    println!(
        "  Tokens: {} in / {} out",
        report.total_tokens_in, report.total_tokens_out
    );
    println!("  Time:   {:.1}s", report.elapsed.as_secs_f64());
    println!();
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn source_progress(&self, url: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Scraping [{current}/{total}] {url}"));
    }

    fn source_failed(&self, url: &str, error: &FetchError) {
        self.spinner
            .println(format!("  ! skipped {url}: {error}"));
    }

    fn chunk_progress(&self, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Annotating chunk [{current}/{total}]"));
    }

    fn chunk_failed(&self, failure: &AnnotationFailure) {
        self.spinner.println(format!(
            "  ! chunk {} skipped: {}",
            failure.chunk_index + 1,
            failure.kind
        ));
    }

    fn done(&self, _report: &RunReport) {
        self.spinner.finish_and_clear();
    }
}

impl Drop for CliProgress {
    fn drop(&mut self) {
        // Error paths never reach `done`.
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = load(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
