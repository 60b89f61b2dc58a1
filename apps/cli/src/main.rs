//! pipeviz CLI: documentation pages and navigation for CI/CD pipelines.
//!
//! Renders Tekton-style pipeline and task definitions in an mkdocs
//! `docs_dir` into Markdown pages and a grouped, versioned navigation tree.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    let config = commands::load_app_config(&cli)?;
    commands::init_tracing(&cli, &config.logging.level);
    commands::run(cli, config)
}
