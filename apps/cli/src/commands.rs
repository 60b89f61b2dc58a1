//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use pipeviz_core::nav_io::{load_nav, nav_to_yaml, save_nav};
use pipeviz_core::{BuildReport, ProgressReporter, Visualizer, VisualizerConfig};
use pipeviz_shared::{AppConfig, Nav, init_config, load_config, load_config_from};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// pipeviz: turn pipeline definitions into browsable documentation.
#[derive(Parser)]
#[command(
    name = "pipeviz",
    version,
    about = "Render CI/CD pipeline and task definitions into mkdocs pages and navigation.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (defaults to ./pipeviz.toml when present).
    #[arg(long, global = true, env = "PIPEVIZ_CONFIG")]
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
    /// Render pages for every pipeline/task source and build the navigation.
    Build {
        /// mkdocs docs directory to scan.
        #[arg(long, default_value = "docs")]
        docs_dir: PathBuf,

        /// Existing navigation: a nav list or an mkdocs.yml with a `nav` key.
        #[arg(long)]
        nav: Option<PathBuf>,

        /// Where to write the resulting navigation YAML (stdout if omitted).
        #[arg(long)]
        nav_out: Option<PathBuf>,
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
    /// Write a pipeviz.toml with defaults into the current directory.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Config + tracing setup
// ---------------------------------------------------------------------------

/// Load the config named by `--config`, or `./pipeviz.toml`, or defaults.
pub(crate) fn load_app_config(cli: &Cli) -> Result<AppConfig> {
    let config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config(&current_dir()?)?,
    };
    Ok(config)
}

/// Initialize tracing based on CLI flags and the configured level.
pub(crate) fn init_tracing(cli: &Cli, configured_level: &str) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => format!("pipeviz={configured_level}"),
        1 => "pipeviz=debug".to_string(),
        _ => "pipeviz=trace".to_string(),
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
pub(crate) fn run(cli: Cli, config: AppConfig) -> Result<()> {
    match cli.command {
        Command::Build {
            docs_dir,
            nav,
            nav_out,
        } => cmd_build(&config, &docs_dir, nav.as_deref(), nav_out.as_deref()),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(&config),
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn cmd_build(
    config: &AppConfig,
    docs_dir: &Path,
    nav_in: Option<&Path>,
    nav_out: Option<&Path>,
) -> Result<()> {
    if !docs_dir.is_dir() {
        return Err(eyre!(
            "docs directory '{}' does not exist",
            docs_dir.display()
        ));
    }

    let mut nav: Nav = match nav_in {
        Some(path) => load_nav(path)?,
        None => Nav::new(),
    };

    info!(docs_dir = %docs_dir.display(), "building pipeline documentation");

    let visualizer = Visualizer::new(VisualizerConfig::from(config));
    let reporter = CliProgress::new();
    let report = visualizer.build(docs_dir, &mut nav, &reporter)?;

    match nav_out {
        Some(path) => {
            save_nav(path, &nav)?;
            info!(path = %path.display(), "navigation written");
        }
        None => print!("{}", nav_to_yaml(&nav)?),
    }

    eprintln!();
    eprintln!("  Documentation built!");
    eprintln!("  Pages:     {}", report.pages.len());
    eprintln!("  Skipped:   {}", report.skipped.len());
    eprintln!("  Pipelines: {}", report.pipelines);
    eprintln!("  Tasks:     {}", report.tasks);
    eprintln!("  Time:      {:.1}s", report.elapsed.as_secs_f64());
    eprintln!();

    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config(&current_dir()?)?;
    println!("Created {}", path.display());
    Ok(())
}

fn cmd_config_show(config: &AppConfig) -> Result<()> {
    let rendered = toml::to_string_pretty(config)?;
    println!("{rendered}");
    Ok(())
}

fn current_dir() -> Result<PathBuf> {
    std::env::current_dir().map_err(|e| eyre!("cannot determine working directory: {e}"))
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

    fn file_processed(&self, path: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Rendering [{current}/{total}] {path}"));
    }

    fn done(&self, _report: &BuildReport) {
        self.spinner.finish_and_clear();
    }
}
