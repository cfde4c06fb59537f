//! covconv: merge test-run coverage and convert it to an XML report
//!
//! ## Usage
//!
//! ```bash
//! covconv /in:TestResults/coverage_*.coverage /out:coverage.xml
//! covconv /trx:run.trx /exedir:bin /xsl:html.xsl /xsl:summary.xsl
//! covconv --in data.coverage --xsl a.xsl --xsl b.xsl --chain -v
//! covconv /?
//! ```

use clap::error::ErrorKind;
use clap::Parser;
use covconv_cli::{
    handlers::{build_request, execute_convert},
    is_help_request, logging, normalize_args, prefers_japanese, Cli, CliConfig, ConsoleReporter,
    Verbosity,
};
use std::ffi::OsString;
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut args = std::env::args_os();
    let program = args.next().unwrap_or_else(|| OsString::from("covconv"));
    let args: Vec<OsString> = args.collect();

    if is_help_request(&args) {
        let reporter = ConsoleReporter::new(false, false);
        reporter.header();
        reporter.help(prefers_japanese(|key| std::env::var(key).ok()));
        return ExitCode::SUCCESS;
    }

    let cli = match Cli::try_parse_from(std::iter::once(program).chain(normalize_args(args))) {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            let reporter = ConsoleReporter::new(false, false);
            reporter.header();
            reporter.failure(e.to_string().trim_end());
            return ExitCode::FAILURE;
        }
    };
    let config = build_config(&cli);
    logging::init(config.verbosity);

    let mut reporter = ConsoleReporter::new(config.color.should_color(), config.verbosity.is_quiet());
    reporter.header();

    let result = build_request(&cli)
        .and_then(|request| execute_convert(&config, &request, &mut reporter));
    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            reporter.failure(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
        .with_color(cli.color.into())
        .with_config_file(cli.config.clone())
}
