//! Convert command handler

use crate::commands::Cli;
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::ConsoleReporter;
use covconv::{ConvertOutcome, ConvertRequest, ConverterConfig, Pipeline};

/// Map parsed arguments onto a conversion request
pub fn build_request(cli: &Cli) -> CliResult<ConvertRequest> {
    if cli.chain && cli.xsl.is_empty() {
        return Err(CliError::invalid_argument("--chain needs at least one --xsl"));
    }
    if cli.xsl.iter().any(|xsl| xsl.as_os_str().is_empty()) {
        return Err(CliError::invalid_argument("empty --xsl path"));
    }

    Ok(ConvertRequest {
        descriptors: cli.trx.clone(),
        input: cli.input.clone(),
        output: cli.out.clone(),
        symbols_dir: cli.symbols.clone(),
        exe_dir: cli.exedir.clone(),
        stylesheets: cli.xsl.clone(),
        chain: cli.chain,
    })
}

/// Execute a conversion with the configured external tools
pub fn execute_convert(
    config: &CliConfig,
    request: &ConvertRequest,
    reporter: &mut ConsoleReporter,
) -> CliResult<ConvertOutcome> {
    let converter = ConverterConfig::discover(config.config_file.as_deref())?;
    tracing::debug!(
        engine = %converter.engine.program,
        transform = %converter.transform.program,
        "using external tools"
    );

    let outcome = Pipeline::from_config(converter).run(request, reporter)?;

    for derived in &outcome.derived {
        reporter.output_file(derived);
    }
    reporter.success();
    Ok(outcome)
}
