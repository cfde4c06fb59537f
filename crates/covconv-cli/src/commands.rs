//! CLI command definitions using clap
//!
//! The classic slash syntax (`/in:data.coverage`, `/xsl:html.xsl`, `/?`) is
//! rewritten to long flags by [`normalize_args`] before clap sees it.

use clap::{Parser, ValueEnum};
use std::ffi::OsString;
use std::path::PathBuf;

/// Slash prefixes that take a value, and the long flag each maps to
const VALUE_PREFIXES: &[(&str, &str)] = &[
    ("/trx:", "--trx"),
    ("/in:", "--in"),
    ("/out:", "--out"),
    ("/symbols:", "--symbols"),
    ("/exedir:", "--exedir"),
    ("/xsl:", "--xsl"),
    ("/config:", "--config"),
];

/// Slash switches without a value
const SWITCHES: &[(&str, &str)] = &[("/chain", "--chain")];

/// Legacy help switch
pub const HELP_SWITCH: &str = "/?";

/// covconv: merge test-run coverage and convert it to an XML report
#[derive(Parser, Debug)]
#[command(name = "covconv")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Test-session descriptor (.trx) whose coverage attachments are merged
    #[arg(long, value_name = "PATH")]
    pub trx: Vec<PathBuf>,

    /// Coverage artifact, or a directory plus file-name glob
    #[arg(long = "in", value_name = "PATH_OR_PATTERN")]
    pub input: Option<String>,

    /// Report output path [default: input with .xml extension]
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,

    /// Directory holding debug symbols
    #[arg(long, value_name = "DIR")]
    pub symbols: Option<String>,

    /// Directory holding the covered executables
    #[arg(long, value_name = "DIR")]
    pub exedir: Option<String>,

    /// XSL stylesheet to apply to the report (repeatable)
    #[arg(long, value_name = "PATH")]
    pub xsl: Vec<PathBuf>,

    /// Apply all stylesheets as one chain instead of independently
    #[arg(long)]
    pub chain: bool,

    /// Converter configuration file (YAML)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto")]
    pub color: ColorArg,
}

/// Color argument
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

/// True when the legacy help should be shown: no arguments, or `/?` anywhere.
///
/// `args` excludes the program name.
#[must_use]
pub fn is_help_request(args: &[OsString]) -> bool {
    args.is_empty() || args.iter().any(|arg| arg == HELP_SWITCH)
}

/// Rewrite slash syntax to long flags; everything else passes through.
///
/// `/in:"C:\runs\a.coverage"` becomes `--in=C:\runs\a.coverage`.
#[must_use]
pub fn normalize_args(args: impl IntoIterator<Item = OsString>) -> Vec<OsString> {
    args.into_iter().map(normalize_arg).collect()
}

fn normalize_arg(arg: OsString) -> OsString {
    let Some(text) = arg.to_str() else {
        return arg;
    };

    for (prefix, flag) in VALUE_PREFIXES {
        if let Some(value) = text.strip_prefix(prefix) {
            return format!("{flag}={}", value.trim_matches('"')).into();
        }
    }
    for (switch, flag) in SWITCHES {
        if text == *switch {
            return (*flag).into();
        }
    }
    arg
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    fn os(items: &[&str]) -> Vec<OsString> {
        items.iter().map(OsString::from).collect()
    }

    fn parse(items: &[&str]) -> Cli {
        let mut argv = os(&["covconv"]);
        argv.extend(normalize_args(os(items)));
        Cli::try_parse_from(argv).unwrap()
    }

    mod normalize_tests {
        use super::*;

        #[test]
        fn test_value_prefixes() {
            assert_eq!(
                normalize_args(os(&["/in:d/coverage_*.covbin", "/out:r.xml", "/xsl:a.xsl"])),
                os(&["--in=d/coverage_*.covbin", "--out=r.xml", "--xsl=a.xsl"])
            );
        }

        #[test]
        fn test_quotes_are_trimmed() {
            assert_eq!(
                normalize_args(os(&[r#"/symbols:"C:\sym dir""#])),
                os(&[r"--symbols=C:\sym dir"])
            );
        }

        #[test]
        fn test_switch_and_passthrough() {
            assert_eq!(
                normalize_args(os(&["/chain", "--out", "x.xml", "/tmp/a", "-v"])),
                os(&["--chain", "--out", "x.xml", "/tmp/a", "-v"])
            );
        }

        #[test]
        fn test_empty_value_survives() {
            assert_eq!(normalize_args(os(&["/in:"])), os(&["--in="]));
        }
    }

    mod help_tests {
        use super::*;

        #[test]
        fn test_no_args_is_help() {
            assert!(is_help_request(&[]));
        }

        #[test]
        fn test_slash_question_anywhere() {
            assert!(is_help_request(&os(&["/in:a", "/?"])));
            assert!(!is_help_request(&os(&["/in:a"])));
        }
    }

    mod parse_tests {
        use super::*;

        #[test]
        fn test_legacy_invocation() {
            let cli = parse(&[
                "/trx:a.trx",
                "/trx:b.trx",
                "/in:cov/*.coverage",
                "/symbols:pdb",
                "/exedir:bin",
                "/xsl:html.xsl",
                "/xsl:summary.xsl",
            ]);
            assert_eq!(cli.trx, vec![PathBuf::from("a.trx"), PathBuf::from("b.trx")]);
            assert_eq!(cli.input.as_deref(), Some("cov/*.coverage"));
            assert_eq!(cli.symbols.as_deref(), Some("pdb"));
            assert_eq!(cli.exedir.as_deref(), Some("bin"));
            assert_eq!(cli.xsl.len(), 2);
            assert!(!cli.chain);
        }

        #[test]
        fn test_long_flags() {
            let cli = parse(&[
                "--in",
                "data.coverage",
                "--chain",
                "--xsl",
                "a.xsl",
                "-vv",
                "--color",
                "never",
            ]);
            assert_eq!(cli.input.as_deref(), Some("data.coverage"));
            assert!(cli.chain);
            assert_eq!(cli.verbose, 2);
            assert_eq!(cli.color, ColorArg::Never);
        }

        #[test]
        fn test_unknown_flag_rejected() {
            let argv = os(&["covconv", "--bogus"]);
            assert!(Cli::try_parse_from(argv).is_err());
        }
    }

    #[test]
    fn test_color_arg_conversion() {
        use crate::config::ColorChoice;
        assert_eq!(ColorChoice::from(ColorArg::Auto), ColorChoice::Auto);
        assert_eq!(ColorChoice::from(ColorArg::Always), ColorChoice::Always);
        assert_eq!(ColorChoice::from(ColorArg::Never), ColorChoice::Never);
    }
}
