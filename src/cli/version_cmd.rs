//! Version CLI commands

use anyhow::{Context, Result};
use clap::Subcommand;

use super::output::Output;
use crate::domain::VersionTriple;
use crate::storage::Config;

#[derive(Subcommand)]
pub enum VersionCommands {
    /// Decode a mapping version and print its canonical form
    Parse {
        /// Version string, e.g. 1.12.2-2026.01.01-1.13
        #[arg(id = "version_string", value_name = "VERSION")]
        version: String,

        /// Retarget to this platform version
        #[arg(long)]
        minecraft: Option<String>,
    },
}

pub fn run(cmd: VersionCommands, output: &Output) -> Result<()> {
    match cmd {
        VersionCommands::Parse { version, minecraft } => {
            parse(output, &version, minecraft.as_deref())
        }
    }
}

fn parse(output: &Output, input: &str, minecraft: Option<&str>) -> Result<()> {
    // Outside a project the default policy applies
    let config = Config::load()?;
    let policy = &config.project.version_policy;
    let parsed = VersionTriple::parse_with(input, policy)
        .with_context(|| format!("Cannot parse '{}'", input))?;
    let triple = match minecraft {
        Some(mc) => parsed
            .with_minecraft_in(mc, policy)
            .with_context(|| format!("Cannot retarget '{}' to '{}'", input, mc))?,
        None => parsed,
    };

    if output.is_json() {
        output.data(&serde_json::json!({
            "input": input,
            "map_mc": triple.map_mc_version(),
            "timestamp": triple.timestamp(),
            "mc": triple.mc_version(),
            "friendly": triple.to_friendly(),
        }));
    } else {
        output.row(&["map_mc", triple.map_mc_version().unwrap_or("-")]);
        output.row(&["timestamp", triple.timestamp()]);
        output.row(&["mc", triple.mc_version().unwrap_or("-")]);
        output.row(&["friendly", &triple.to_friendly()]);
    }

    Ok(())
}
