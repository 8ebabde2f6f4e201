//! # Command-Line Interface
//!
//! User-facing CLI commands and output formatting.
//!
//! ## Commands
//!
//! | Command | Purpose |
//! |---------|---------|
//! | `init` | Create `.mavengen/config.toml` |
//! | `generate <module> <version>` | Generate and publish a module version |
//! | `modules` | List configured modules |
//! | `version parse <v>` | Decode a mapping version |
//! | `cache status\|list\|verify\|clear` | Inspect or maintain the cache |
//!
//! ## Output Formats
//!
//! All commands support `--format` flag:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! ## Logging
//!
//! Progress is logged to stderr with `tracing`. `--verbose` raises the
//! default level from `warn` to `info`; `MAVENGEN_LOG` takes any filter
//! directive:
//! ```bash
//! MAVENGEN_LOG=mavengen=debug mavengen generate mappings 2026.01.01
//! ```
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod cache_cmd;
mod generate;
mod output;
mod version_cmd;

pub use app::{run, Cli, Commands, LOG_ENV};
pub use output::{Output, OutputFormat};
