//! Console output and progress reporting
//!
//! Result lines go to stdout in the fixed wording scripts already parse
//! (`input file: …`, `output file: …`, `convert success.`). Progress bars go
//! to stderr and are only drawn on a terminal.

use console::{style, Term};
use covconv::{MergeStep, PipelineObserver, TransformStage};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::path::{Path, PathBuf};

/// Project home page shown in the header
pub const SITE_URL: &str = "https://github.com/yasu-s/CoverageConverter";

const HELP_EN: &[(&str, &str)] = &[
    ("/trx:[ file path ]", "specify a test result file (.trx) whose coverage is merged."),
    ("/in:[ file path ]", "specify a file path in which you want to enter."),
    ("/out:[ file path ]", "specify the file path of the output target."),
    ("/symbols:[ directory ]", "specifies the directory where the debug symbols are located."),
    (
        "/exedir:[ directory ]",
        "specifies the directory where the executable file to be retrieved coverage is located.",
    ),
    ("/xsl:[ file path ]", "specify an XSL file to convert the output XML with."),
    ("/chain", "apply the /xsl: files as one chain, in order."),
    ("/?", "Displays the help."),
];

const HELP_JA: &[(&str, &str)] = &[
    ("/trx:[ ファイルパス ]", "カバレッジを統合するテスト結果ファイル(.trx)を指定します。"),
    ("/in:[ ファイルパス ]", "入力対象のファイルパスを指定します。"),
    ("/out:[ ファイルパス ]", "出力対象のファイルパスを指定します。"),
    ("/symbols:[ ディレクトリ ]", "デバッグシンボルが配置されているディレクトリを指定します。"),
    (
        "/exedir:[ ディレクトリ ]",
        "カバレッジ取得対象の実行ファイルが配置されているディレクトリを指定します。",
    ),
    ("/xsl:[ ファイルパス ]", "XML出力時に変換を行いたい場合、XSL形式のファイルを指定します。"),
    ("/chain", "/xsl: のファイルを指定順に連続して適用します。"),
    ("/?", "ヘルプを表示します。"),
];

/// Render the legacy help table
#[must_use]
pub fn help_text(japanese: bool) -> String {
    let rows = if japanese { HELP_JA } else { HELP_EN };
    let width = rows
        .iter()
        .map(|(flag, _)| console::measure_text_width(flag))
        .max()
        .unwrap_or(0);

    let mut text = String::new();
    for (flag, description) in rows {
        let pad = width - console::measure_text_width(flag);
        text.push_str(&format!("{flag}{}  {description}\n", " ".repeat(pad)));
    }
    text
}

/// True when the locale in `LC_ALL` / `LANG` is Japanese
#[must_use]
pub fn prefers_japanese(env: impl Fn(&str) -> Option<String>) -> bool {
    ["LC_ALL", "LANG"]
        .iter()
        .find_map(|key| env(key).filter(|value| !value.is_empty()))
        .is_some_and(|locale| locale.starts_with("ja"))
}

/// Console reporter for a conversion run
#[derive(Debug)]
pub struct ConsoleReporter {
    term: Term,
    progress_bar: Option<ProgressBar>,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new(false, false)
    }
}

impl ConsoleReporter {
    /// Create a new reporter writing to stdout
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stdout(),
            progress_bar: None,
            use_color,
            quiet,
        }
    }

    fn line(&self, text: &str) {
        let _ = self.term.write_line(text);
    }

    /// Print the program header
    pub fn header(&self) {
        if self.quiet {
            return;
        }
        let title = format!("covconv [Version {}]", env!("CARGO_PKG_VERSION"));
        if self.use_color {
            self.line(&style(title).bold().to_string());
        } else {
            self.line(&title);
        }
        self.line(&format!("URL: {SITE_URL}"));
    }

    /// Print the legacy help table
    pub fn help(&self, japanese: bool) {
        self.line("");
        let _ = self.term.write_str(&help_text(japanese));
    }

    /// Print one consolidated input
    pub fn input_file(&self, path: &Path) {
        if !self.quiet {
            self.line(&format!("input file: {}", path.display()));
        }
    }

    /// Print a written output
    pub fn output_file(&self, path: &Path) {
        if !self.quiet {
            self.line(&format!("output file: {}", path.display()));
        }
    }

    /// Print the success line
    pub fn success(&self) {
        if self.quiet {
            return;
        }
        if self.use_color {
            self.line(&style("convert success.").green().to_string());
        } else {
            self.line("convert success.");
        }
    }

    /// Print a failure message; shown even in quiet mode
    pub fn failure(&self, message: &str) {
        self.finish();
        if self.use_color {
            self.line(&style(message).red().to_string());
        } else {
            self.line(message);
        }
    }

    fn start_progress(&mut self, total: u64) {
        if self.quiet {
            return;
        }
        let pb = ProgressBar::with_draw_target(Some(total), ProgressDrawTarget::stderr());
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        self.progress_bar = Some(pb);
    }

    /// Finish and clear any progress bar
    pub fn finish(&self) {
        if let Some(ref pb) = self.progress_bar {
            pb.finish_and_clear();
        }
    }
}

impl PipelineObserver for ConsoleReporter {
    fn artifacts_resolved(&mut self, artifacts: &[PathBuf]) {
        for artifact in artifacts {
            self.input_file(artifact);
        }
    }

    fn merge_step(&mut self, step: &MergeStep) {
        if self.progress_bar.is_none() {
            self.start_progress(u64::try_from(step.total).unwrap_or(u64::MAX));
        }
        if let Some(ref pb) = self.progress_bar {
            let name = step
                .second
                .file_name()
                .map_or_else(|| step.second.display().to_string(), |n| n.to_string_lossy().into_owned());
            pb.set_message(format!("merging {name}"));
            pb.inc(1);
        }
    }

    fn report_written(&mut self, path: &Path) {
        self.finish();
        self.output_file(path);
    }

    fn transform_stage(&mut self, stage: &TransformStage) {
        if self.quiet {
            return;
        }
        let counter = format!("[{}/{}]", stage.index, stage.total);
        let counter = if self.use_color {
            style(counter).dim().to_string()
        } else {
            counter
        };
        self.line(&format!(
            "{counter} {} -> {}",
            stage.stylesheet.display(),
            stage.output.display()
        ));
    }
}
