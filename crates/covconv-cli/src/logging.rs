//! Diagnostic logging setup.
//!
//! Events from the library go to stderr through `tracing-subscriber`, so they
//! never mix with the result lines on stdout. `COVCONV_LOG` takes an
//! `EnvFilter` directive (`covconv=debug`, `trace`, ...) and wins over `-v`/`-q`.

use crate::config::Verbosity;
use tracing_subscriber::EnvFilter;

/// Environment variable holding a log filter directive
pub const LOG_ENV: &str = "COVCONV_LOG";

/// Build the filter for a run
#[must_use]
pub fn filter_for(verbosity: Verbosity, directive: Option<&str>) -> EnvFilter {
    directive
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(verbosity.log_level()))
}

/// Install the global subscriber; later calls are no-ops
pub fn init(verbosity: Verbosity) {
    let directive = std::env::var(LOG_ENV).ok();
    let filter = filter_for(verbosity, directive.as_deref());

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_sets_level() {
        assert_eq!(filter_for(Verbosity::Normal, None).to_string(), "warn");
        assert_eq!(filter_for(Verbosity::Debug, None).to_string(), "debug");
    }

    #[test]
    fn test_directive_wins() {
        let filter = filter_for(Verbosity::Quiet, Some("covconv=trace"));
        assert_eq!(filter.to_string(), "covconv=trace");
    }

    #[test]
    fn test_blank_directive_ignored() {
        assert_eq!(filter_for(Verbosity::Verbose, Some("  ")).to_string(), "info");
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init(Verbosity::Quiet);
        init(Verbosity::Trace);
    }
}
