//! Arbor CLI - Command line interface for neuron morphologies

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod output;

use arbor_core::{BuildOptions, Morphology, Properties, WarningHandler};
use commands::{check, completions, normalize, preflight, stats, traverse};
use config::Config;
use output::OutputFormat;

#[derive(Parser)]
#[command(name = "arbor")]
#[command(author, version, about = "Validate, inspect and normalize neuron morphologies")]
pub struct Cli {
    /// Config file (default: ~/.arbor/config.toml)
    #[arg(long, global = true, env = "ARBOR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format: table, json
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn output_format(&self) -> OutputFormat {
        OutputFormat::from(self.format.as_str())
    }

    pub fn config_path(&self) -> PathBuf {
        config::config_file_path(self.config.as_deref())
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build a morphology and report structural problems
    Check(check::CheckArgs),
    /// Print counts and soma geometry
    Stats(stats::StatsArgs),
    /// List sections in traversal order
    Traverse(traverse::TraverseArgs),
    /// Apply modifiers and write the flattened result
    Normalize(normalize::NormalizeArgs),
    /// Check that a morphology can be written to a target file
    Preflight(preflight::PreflightArgs),
    /// Manage configuration
    Config(commands::config::ConfigArgs),
    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

/// Application context: configuration and the warning handler built from it
pub struct AppContext {
    pub config: Config,
    pub handler: WarningHandler,
}

impl AppContext {
    pub fn new(cli: &Cli) -> Self {
        let config = Config::load(&cli.config_path());
        let handler = WarningHandler::new(config.warnings.clone());
        Self { config, handler }
    }

    /// Build options from the config file
    pub fn build_options(&self) -> BuildOptions {
        self.config.build.clone()
    }

    /// Read a properties file and build it
    pub fn load(&self, path: &Path, options: &BuildOptions) -> anyhow::Result<Morphology> {
        let properties = Properties::load(path)
            .with_context(|| format!("Failed to read morphology from {}", path.display()))?;
        let morphology = Morphology::with_options(properties, options, &self.handler)
            .with_context(|| format!("Invalid morphology in {}", path.display()))?;
        tracing::debug!(
            "Loaded {} with {} sections",
            path.display(),
            morphology.section_count()
        );
        Ok(morphology)
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .init();

    tracing::debug!("Starting arbor CLI");

    let ctx = AppContext::new(&cli);

    match &cli.command {
        Commands::Check(args) => check::run(args, &cli, &ctx)?,
        Commands::Stats(args) => stats::run(args, &cli, &ctx)?,
        Commands::Traverse(args) => traverse::run(args, &cli, &ctx)?,
        Commands::Normalize(args) => normalize::run(args, &cli, &ctx)?,
        Commands::Preflight(args) => preflight::run(args, &cli, &ctx)?,
        Commands::Config(args) => commands::config::run(args, &cli)?,
        Commands::Completions(args) => completions::run(args)?,
    }

    Ok(())
}
