//! Coverage engine boundary.
//!
//! The binary coverage format is never read here. Merging artifacts and
//! turning one into a report are delegated to an engine; [`CommandEngine`]
//! drives an external coverage tool configured by [`EngineConfig`].

use crate::command::{self, path_arg};
use crate::config::EngineConfig;
use crate::report::ReportDocument;
use crate::result::{ConvertError, ConvertResult};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Operations the pipeline needs from a coverage-analysis engine
pub trait CoverageEngine {
    /// Merge `first` and `second` into `destination`.
    ///
    /// With `overwrite == false` an existing destination is an error.
    fn merge(
        &self,
        first: &Path,
        second: &Path,
        destination: &Path,
        overwrite: bool,
    ) -> ConvertResult<()>;

    /// Load `artifact`, resolving symbols and binaries against `search_dirs`,
    /// and build its report document
    fn load_report(
        &self,
        artifact: &Path,
        search_dirs: &BTreeSet<String>,
    ) -> ConvertResult<ReportDocument>;
}

/// Engine backed by an external command-line coverage tool
#[derive(Debug, Clone)]
pub struct CommandEngine {
    config: EngineConfig,
    staging_dir: Option<PathBuf>,
}

impl CommandEngine {
    /// Create an engine from its configuration
    #[must_use]
    pub const fn new(config: EngineConfig) -> Self {
        Self {
            config,
            staging_dir: None,
        }
    }

    /// Stage report output under `dir` instead of the system temp dir
    #[must_use]
    pub fn with_staging_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.staging_dir = dir;
        self
    }

    fn staging_file(&self) -> ConvertResult<tempfile::NamedTempFile> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("covconv-report-").suffix(".xml");
        match &self.staging_dir {
            Some(dir) => builder.tempfile_in(dir).map_err(|e| {
                ConvertError::io(format!("create report staging file in {}", dir.display()), e)
            }),
            None => builder
                .tempfile()
                .map_err(|e| ConvertError::io("create report staging file", e)),
        }
    }
}

impl CoverageEngine for CommandEngine {
    fn merge(
        &self,
        first: &Path,
        second: &Path,
        destination: &Path,
        overwrite: bool,
    ) -> ConvertResult<()> {
        if !overwrite && destination.exists() {
            return Err(ConvertError::engine(
                "merge",
                format!("{} already exists", destination.display()),
            ));
        }

        let (first, second, output) = (path_arg(first), path_arg(second), path_arg(destination));
        let args = command::expand_args(
            &self.config.merge_args,
            &[("first", &first), ("second", &second), ("output", &output)],
            &[],
            &[],
        );
        command::run("merge", &self.config.program, &args)?;
        Ok(())
    }

    fn load_report(
        &self,
        artifact: &Path,
        search_dirs: &BTreeSet<String>,
    ) -> ConvertResult<ReportDocument> {
        let staging = self.staging_file()?;
        if !search_dirs.is_empty() && !self.config.forwards_search_dirs() {
            tracing::warn!(
                program = %self.config.program,
                dirs = ?search_dirs,
                "report_args has no search_dirs placeholder, search directories are not passed to the engine"
            );
        }

        let (input, output) = (path_arg(artifact), path_arg(staging.path()));
        let dirs: Vec<&str> = search_dirs.iter().map(String::as_str).collect();
        let args = command::expand_args(
            &self.config.report_args,
            &[("input", &input), ("output", &output)],
            &self.config.search_dir_args,
            &dirs,
        );
        command::run("build report", &self.config.program, &args)?;

        let xml = std::fs::read_to_string(staging.path()).map_err(|e| {
            ConvertError::engine(
                "build report",
                format!("{} wrote no readable report: {e}", self.config.program),
            )
        })?;
        ReportDocument::from_xml(xml)
    }
}

#[cfg(all(test, unix))]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    /// Log sink for asserting on emitted events
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    fn with_captured_logs<R>(f: impl FnOnce() -> R) -> (R, String) {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        let result = tracing::subscriber::with_default(subscriber, f);
        (result, logs.contents())
    }

    /// Default engine templates run through a script that records its argv
    /// and writes a minimal report to the `--output` path
    fn recording_default_engine(dir: &Path) -> (CommandEngine, PathBuf) {
        let argv_log = dir.join("argv.txt");
        let script = dir.join("record.sh");
        std::fs::write(
            &script,
            format!(
                "printf '%s\\n' \"$@\" > '{}'\nwhile [ $# -gt 0 ]; do\n  if [ \"$1\" = --output ]; then printf '<report/>' > \"$2\"; fi\n  shift\ndone\n",
                argv_log.display()
            ),
        )
        .unwrap();

        let defaults = EngineConfig::default();
        let mut report_args = vec![script.to_string_lossy().into_owned()];
        report_args.extend(defaults.report_args.iter().cloned());
        let engine = CommandEngine::new(EngineConfig {
            program: "sh".to_string(),
            report_args,
            ..defaults
        });
        (engine, argv_log)
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    /// Engine whose merge concatenates and whose report wraps the artifact's lines
    fn shell_engine() -> CommandEngine {
        CommandEngine::new(EngineConfig {
            program: "sh".to_string(),
            merge_args: strings(&[
                "-c",
                r#"cat "$1" "$2" > "$3""#,
                "merge",
                "{first}",
                "{second}",
                "{output}",
            ]),
            report_args: strings(&[
                "-c",
                r#"out="$1"; in="$2"; shift 2; { echo "<report dirs=\"$*\">"; sed 's|.*|<line>&</line>|' "$in"; echo "</report>"; } > "$out""#,
                "report",
                "{output}",
                "{input}",
                "{search_dirs}",
            ]),
            search_dir_args: strings(&["{dir}"]),
            artifact_extension: "coverage".to_string(),
        })
    }

    #[test]
    fn test_merge_runs_tool() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.coverage");
        let b = dir.path().join("b.coverage");
        let out = dir.path().join("out.coverage");
        std::fs::write(&a, "A\n").unwrap();
        std::fs::write(&b, "B\n").unwrap();

        shell_engine().merge(&a, &b, &out, true).unwrap();
        assert_eq!(std::fs::read_to_string(out).unwrap(), "A\nB\n");
    }

    #[test]
    fn test_merge_refuses_existing_destination() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.coverage");
        let out = dir.path().join("out.coverage");
        std::fs::write(&a, "A\n").unwrap();
        std::fs::write(&out, "keep").unwrap();

        let err = shell_engine().merge(&a, &a, &out, false).unwrap_err();
        assert!(matches!(err, ConvertError::EngineFailure { .. }));
        assert_eq!(std::fs::read_to_string(out).unwrap(), "keep");
    }

    #[test]
    fn test_merge_failure_surfaces() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out.coverage");
        let err = shell_engine()
            .merge(
                &dir.path().join("missing-a"),
                &dir.path().join("missing-b"),
                &out,
                true,
            )
            .unwrap_err();
        assert!(matches!(err, ConvertError::EngineFailure { .. }));
    }

    #[test]
    fn test_load_report_passes_search_dirs() {
        let dir = TempDir::new().unwrap();
        let artifact = dir.path().join("work.coverage");
        std::fs::write(&artifact, "A\nB\n").unwrap();
        let dirs: BTreeSet<String> = ["/bin".to_string(), "/pdb".to_string()].into();

        let report = shell_engine().load_report(&artifact, &dirs).unwrap();

        assert_eq!(report.root_name(), "report");
        assert!(report.as_str().contains(r#"dirs="/bin /pdb""#));
        assert!(report.as_str().contains("<line>A</line>"));
    }

    #[test]
    fn test_load_report_rejects_non_xml_output() {
        let dir = TempDir::new().unwrap();
        let artifact = dir.path().join("work.coverage");
        std::fs::write(&artifact, "A\n").unwrap();
        let engine = CommandEngine::new(EngineConfig {
            program: "sh".to_string(),
            report_args: strings(&["-c", r#"echo "not xml <" > "$1""#, "report", "{output}"]),
            ..EngineConfig::default()
        });

        let err = engine.load_report(&artifact, &BTreeSet::new()).unwrap_err();
        assert!(matches!(err, ConvertError::EngineFailure { .. }));
    }

    #[test]
    fn test_default_template_warns_about_unforwarded_search_dirs() {
        let dir = TempDir::new().unwrap();
        let artifact = dir.path().join("work.coverage");
        std::fs::write(&artifact, "A").unwrap();
        let (engine, argv_log) = recording_default_engine(dir.path());
        let dirs: BTreeSet<String> = ["/my/exedir".to_string(), "/my/symbols".to_string()].into();

        let (report, logs) = with_captured_logs(|| engine.load_report(&artifact, &dirs));

        assert_eq!(report.unwrap().root_name(), "report");
        let argv = std::fs::read_to_string(argv_log).unwrap();
        assert!(argv.starts_with("merge\n--output\n"));
        assert!(!argv.contains("/my/symbols"));
        assert!(logs.contains("WARN"));
        assert!(logs.contains("search directories are not passed"));
        assert!(logs.contains("/my/symbols"));
        assert!(logs.contains("/my/exedir"));
    }

    #[test]
    fn test_no_warning_without_search_dirs() {
        let dir = TempDir::new().unwrap();
        let artifact = dir.path().join("work.coverage");
        std::fs::write(&artifact, "A").unwrap();
        let (engine, _) = recording_default_engine(dir.path());

        let (report, logs) = with_captured_logs(|| engine.load_report(&artifact, &BTreeSet::new()));

        assert!(report.is_ok());
        assert!(!logs.contains("WARN"));
    }

    #[test]
    fn test_forwarding_template_does_not_warn() {
        let dir = TempDir::new().unwrap();
        let artifact = dir.path().join("work.coverage");
        std::fs::write(&artifact, "A\n").unwrap();
        let dirs: BTreeSet<String> = ["/pdb".to_string()].into();

        let (report, logs) = with_captured_logs(|| shell_engine().load_report(&artifact, &dirs));

        assert!(report.unwrap().as_str().contains(r#"dirs="/pdb""#));
        assert!(!logs.contains("WARN"));
    }

    #[test]
    fn test_report_staged_in_staging_dir() {
        let dir = TempDir::new().unwrap();
        let staging = TempDir::new().unwrap();
        let artifact = dir.path().join("work.coverage");
        std::fs::write(&artifact, "A").unwrap();
        let engine = CommandEngine::new(EngineConfig {
            program: "sh".to_string(),
            report_args: strings(&[
                "-c",
                r#"printf '<report out="%s"/>' "$1" > "$1""#,
                "report",
                "{output}",
            ]),
            ..EngineConfig::default()
        })
        .with_staging_dir(Some(staging.path().to_path_buf()));

        let report = engine.load_report(&artifact, &BTreeSet::new()).unwrap();

        let expected = format!(r#"out="{}"#, staging.path().join("covconv-report-").display());
        assert!(report.as_str().contains(&expected), "{}", report.as_str());
        assert_eq!(std::fs::read_dir(staging.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_missing_staging_dir_is_io_error() {
        let dir = TempDir::new().unwrap();
        let artifact = dir.path().join("work.coverage");
        std::fs::write(&artifact, "A").unwrap();
        let engine = shell_engine().with_staging_dir(Some(dir.path().join("absent")));

        let err = engine.load_report(&artifact, &BTreeSet::new()).unwrap_err();
        assert!(matches!(err, ConvertError::Io { .. }));
    }
}
