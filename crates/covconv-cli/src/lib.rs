//! covconv CLI library
//!
//! Command-line front end for the covconv coverage pipeline. Accepts both the
//! classic slash syntax (`/in:`, `/trx:`, `/xsl:`, `/?`) and long flags.

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::format_push_string)]
#![allow(clippy::missing_errors_doc)]

mod commands;
mod config;
mod error;
pub mod handlers;
pub mod logging;
mod output;

pub use commands::{is_help_request, normalize_args, Cli, ColorArg, HELP_SWITCH};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use output::{help_text, prefers_japanese, ConsoleReporter, SITE_URL};
