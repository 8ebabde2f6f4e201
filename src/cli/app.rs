//! Main CLI application structure

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use super::output::{Output, OutputFormat};
use super::{cache_cmd, generate, version_cmd};
use crate::storage::{Project, CACHE_DIR_ENV};

/// Environment variable holding a `tracing` filter directive
pub const LOG_ENV: &str = "MAVENGEN_LOG";

#[derive(Parser)]
#[command(name = "mavengen")]
#[command(author, version, about = "Generates and publishes toolchain artifacts into a local Maven repository")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Log progress to stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Cache directory (overrides the configured one)
    #[arg(long, global = true, env = CACHE_DIR_ENV)]
    pub cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new mavengen project
    Init {
        /// Path to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: String,
    },

    /// Generate and publish a module version
    Generate {
        /// Module name from [modules.<name>]
        module: String,

        /// Version to generate
        #[arg(id = "module_version", value_name = "VERSION")]
        version: String,

        /// Bypass the artifact cache
        #[arg(long)]
        no_cache: bool,
    },

    /// List configured modules
    Modules,

    /// Inspect mapping version strings
    #[command(subcommand)]
    Version(version_cmd::VersionCommands),

    /// Manage the artifact cache
    #[command(subcommand)]
    Cache(cache_cmd::CacheCommands),
}

/// Installs the stderr log subscriber
fn init_logging(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));

    // A subscriber may already be installed when embedded
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let output = Output::new(cli.format);

    debug!("mavengen v{} starting", env!("CARGO_PKG_VERSION"));
    let cache_dir = cli.cache_dir.as_deref();

    match cli.command {
        Commands::Init { path } => {
            let project = Project::init(&path)?;
            debug!(dir = %project.project_dir().display(), "created project directory");
            output.success(&format!(
                "Initialized mavengen project at {}",
                project.root().display()
            ));
        }

        Commands::Generate {
            module,
            version,
            no_cache,
        } => generate::run(&output, &module, &version, cache_dir, no_cache)?,

        Commands::Modules => generate::list(&output)?,

        Commands::Version(cmd) => version_cmd::run(cmd, &output)?,

        Commands::Cache(cmd) => cache_cmd::run(cmd, &output, cache_dir)?,
    }

    debug!("command completed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_generate() {
        let cli = Cli::try_parse_from([
            "mavengen",
            "--format",
            "json",
            "generate",
            "mappings",
            "2026.01.01-1.12",
            "--no-cache",
        ])
        .unwrap();

        assert_eq!(cli.format, OutputFormat::Json);
        match cli.command {
            Commands::Generate {
                module,
                version,
                no_cache,
            } => {
                assert_eq!(module, "mappings");
                assert_eq!(version, "2026.01.01-1.12");
                assert!(no_cache);
            }
            _ => panic!("expected generate"),
        }
    }
}
