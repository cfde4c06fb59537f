//! Stylesheet transforms over the report document.
//!
//! A chain feeds every stage the previous stage's output and writes only the
//! last stage to the requested destination. Independent stylesheets each
//! read the report and write `report.<stylesheet-stem>.xml`.

use crate::command::{self, path_arg};
use crate::config::TransformConfig;
use crate::result::{ConvertError, ConvertResult};
use crate::scratch::ScratchSpace;
use std::path::{Path, PathBuf};

/// Applies one stylesheet to one document
pub trait Transformer {
    /// Transform `input` with `stylesheet`, writing `output`
    fn apply_xsl(&self, input: &Path, output: &Path, stylesheet: &Path) -> ConvertResult<()>;
}

/// Transformer backed by an external XSLT processor
#[derive(Debug, Clone)]
pub struct CommandTransformer {
    config: TransformConfig,
}

impl CommandTransformer {
    /// Create a transformer from its configuration
    #[must_use]
    pub const fn new(config: TransformConfig) -> Self {
        Self { config }
    }
}

impl Transformer for CommandTransformer {
    fn apply_xsl(&self, input: &Path, output: &Path, stylesheet: &Path) -> ConvertResult<()> {
        if !stylesheet.is_file() {
            return Err(ConvertError::io(
                format!("open stylesheet {}", stylesheet.display()),
                std::io::Error::from(std::io::ErrorKind::NotFound),
            ));
        }

        let (input, output, stylesheet) = (path_arg(input), path_arg(output), path_arg(stylesheet));
        let args = command::expand_args(
            &self.config.args,
            &[
                ("input", &input),
                ("output", &output),
                ("stylesheet", &stylesheet),
            ],
            &[],
            &[],
        );
        command::run("transform", &self.config.program, &args)?;
        Ok(())
    }
}

/// One stylesheet application, reported before it runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformStage {
    /// 1-based position
    pub index: usize,
    /// Number of stylesheets
    pub total: usize,
    /// Stylesheet being applied
    pub stylesheet: PathBuf,
    /// Where this stage writes
    pub output: PathBuf,
}

/// Output path for `stylesheet` applied to `report`: `report.<stem>.xml`
#[must_use]
pub fn derived_output_path(report: &Path, stylesheet: &Path) -> PathBuf {
    let stem = stylesheet
        .file_stem()
        .map_or_else(|| "xsl".into(), |s| s.to_string_lossy());
    report.with_extension(format!("{stem}.xml"))
}

/// Apply `stylesheets` in order, each consuming the previous output.
///
/// Every stage but the last writes a fresh scratch file; the last writes
/// `final_output`. An empty list does nothing.
pub fn apply_chain<T: Transformer + ?Sized>(
    transformer: &T,
    report: &Path,
    final_output: &Path,
    stylesheets: &[PathBuf],
    scratch: &ScratchSpace,
    mut on_stage: impl FnMut(&TransformStage),
) -> ConvertResult<()> {
    let total = stylesheets.len();
    let mut input = report.to_path_buf();
    let mut input_is_scratch = false;

    for (offset, stylesheet) in stylesheets.iter().enumerate() {
        let is_last = offset + 1 == total;
        let output = if is_last {
            final_output.to_path_buf()
        } else {
            scratch.fresh_file("stage-", "xml")?
        };

        let stage = TransformStage {
            index: offset + 1,
            total,
            stylesheet: stylesheet.clone(),
            output: output.clone(),
        };
        on_stage(&stage);
        tracing::info!(
            stage = stage.index,
            total,
            stylesheet = %stylesheet.display(),
            "applying stylesheet"
        );
        transformer.apply_xsl(&input, &output, stylesheet)?;

        if input_is_scratch {
            if let Err(e) = std::fs::remove_file(&input) {
                tracing::warn!(path = %input.display(), error = %e, "could not remove scratch file");
            }
        }
        input = output;
        input_is_scratch = !is_last;
    }

    Ok(())
}

/// Apply each stylesheet independently to `report`.
///
/// Returns the written paths in stylesheet order.
pub fn apply_each<T: Transformer + ?Sized>(
    transformer: &T,
    report: &Path,
    stylesheets: &[PathBuf],
    mut on_stage: impl FnMut(&TransformStage),
) -> ConvertResult<Vec<PathBuf>> {
    let total = stylesheets.len();
    let mut written = Vec::with_capacity(total);

    for (offset, stylesheet) in stylesheets.iter().enumerate() {
        let output = derived_output_path(report, stylesheet);
        on_stage(&TransformStage {
            index: offset + 1,
            total,
            stylesheet: stylesheet.clone(),
            output: output.clone(),
        });
        tracing::info!(stylesheet = %stylesheet.display(), output = %output.display(), "applying stylesheet");
        transformer.apply_xsl(report, &output, stylesheet)?;
        written.push(output);
    }

    Ok(written)
}
