//! End-to-end conversion: descriptors and input to report and derived outputs.
//!
//! Stages run strictly in sequence and the first failure aborts the run.
//! All scratch files live in one [`ScratchSpace`] that is removed when
//! [`Pipeline::run`] returns, whatever the outcome.

use crate::config::ConverterConfig;
use crate::coverage_set::CoverageSet;
use crate::engine::{CommandEngine, CoverageEngine};
use crate::merge::{self, MergePlan, MergeStep};
use crate::report::{self, default_output_path};
use crate::resolver;
use crate::result::{ConvertError, ConvertResult};
use crate::scratch::ScratchSpace;
use crate::transform::{self, CommandTransformer, TransformStage, Transformer};
use std::path::{Path, PathBuf};

/// Base name of the consolidated work artifact
pub const WORK_FILE_STEM: &str = "CoverageConverterWork";

/// What to convert and where to put it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvertRequest {
    /// Test-session descriptor files
    pub descriptors: Vec<PathBuf>,
    /// Coverage artifact path or file-name glob
    pub input: Option<String>,
    /// Report path; derived from the input when absent
    pub output: Option<PathBuf>,
    /// Symbol search directory
    pub symbols_dir: Option<String>,
    /// Binary search directory
    pub exe_dir: Option<String>,
    /// Stylesheets to apply to the report
    pub stylesheets: Vec<PathBuf>,
    /// Apply stylesheets as one ordered chain instead of independently
    pub chain: bool,
}

impl ConvertRequest {
    /// Report path: explicit output, else the input with `.xml`, else the
    /// first descriptor with `.xml`
    pub fn output_path(&self) -> ConvertResult<PathBuf> {
        if let Some(output) = self.output.as_ref().filter(|p| !p.as_os_str().is_empty()) {
            return Ok(output.clone());
        }
        if let Some(input) = self.input.as_deref().filter(|i| !i.trim().is_empty()) {
            return Ok(default_output_path(input));
        }
        self.descriptors
            .first()
            .map(|descriptor| descriptor.with_extension("xml"))
            .ok_or_else(|| ConvertError::missing_input("no input file or descriptor given"))
    }

    fn search_dirs(&self) -> Vec<&str> {
        [self.symbols_dir.as_deref(), self.exe_dir.as_deref()]
            .into_iter()
            .flatten()
            .filter(|dir| !dir.trim().is_empty())
            .collect()
    }
}

/// Result of a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertOutcome {
    /// Artifacts consolidated into the report, in merge order
    pub merged_artifacts: Vec<PathBuf>,
    /// Written report
    pub report_path: PathBuf,
    /// Stylesheet outputs
    pub derived: Vec<PathBuf>,
}

/// Progress notifications from a run
pub trait PipelineObserver {
    /// Artifacts to consolidate are known
    fn artifacts_resolved(&mut self, _artifacts: &[PathBuf]) {}
    /// A pairwise merge is about to run
    fn merge_step(&mut self, _step: &MergeStep) {}
    /// The report has been written
    fn report_written(&mut self, _path: &Path) {}
    /// A stylesheet is about to be applied
    fn transform_stage(&mut self, _stage: &TransformStage) {}
}

/// Observer that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {}

/// Conversion pipeline over a coverage engine and a transformer
#[derive(Debug)]
pub struct Pipeline<E, T> {
    engine: E,
    transformer: T,
    scratch_root: Option<PathBuf>,
    artifact_extension: String,
}

impl Pipeline<CommandEngine, CommandTransformer> {
    /// Pipeline driving the external tools named in `config`
    #[must_use]
    pub fn from_config(config: ConverterConfig) -> Self {
        let extension = config.engine.artifact_extension.clone();
        Self::new(
            CommandEngine::new(config.engine).with_staging_dir(config.scratch_root.clone()),
            CommandTransformer::new(config.transform),
        )
        .with_artifact_extension(extension)
        .with_scratch_root(config.scratch_root)
    }
}

impl<E: CoverageEngine, T: Transformer> Pipeline<E, T> {
    /// Create a pipeline with default settings
    pub fn new(engine: E, transformer: T) -> Self {
        Self {
            engine,
            transformer,
            scratch_root: None,
            artifact_extension: "coverage".to_string(),
        }
    }

    /// Create scratch directories under `root` instead of the system temp dir
    #[must_use]
    pub fn with_scratch_root(mut self, root: Option<PathBuf>) -> Self {
        self.scratch_root = root;
        self
    }

    /// Extension for the work file and intermediate merge results
    #[must_use]
    pub fn with_artifact_extension(mut self, extension: impl Into<String>) -> Self {
        self.artifact_extension = extension.into();
        self
    }

    /// Run the conversion.
    ///
    /// # Errors
    ///
    /// The first failure of any stage; nothing after it runs.
    pub fn run<O: PipelineObserver + ?Sized>(
        &self,
        request: &ConvertRequest,
        observer: &mut O,
    ) -> ConvertResult<ConvertOutcome> {
        let has_input = request.input.as_deref().is_some_and(|i| !i.trim().is_empty());
        if request.descriptors.is_empty() && !has_input {
            return Err(ConvertError::missing_input("no input file or descriptor given"));
        }
        let report_path = request.output_path()?;

        let scratch = match &self.scratch_root {
            Some(root) => ScratchSpace::in_dir(root)?,
            None => ScratchSpace::new()?,
        };
        let work_path = scratch.file(&format!(
            "{WORK_FILE_STEM}.{}",
            self.artifact_extension.trim_start_matches('.')
        ));

        let mut set = CoverageSet::from_descriptors(&request.descriptors)?;
        set.add(&CoverageSet::from_search_dirs(&request.search_dirs()));

        let merged_artifacts = if request.descriptors.is_empty() {
            let input = request.input.as_deref().unwrap_or_default();
            let used = merge::consolidate(
                input,
                &work_path,
                &self.engine,
                &scratch,
                &self.artifact_extension,
                |step| observer.merge_step(step),
            )?;
            observer.artifacts_resolved(&used);
            used
        } else {
            if let Some(input) = request.input.as_deref().filter(|_| has_input) {
                for artifact in resolver::resolve(input)?.into_paths() {
                    set.add(&CoverageSet::from_direct_input(
                        artifact.to_string_lossy(),
                        &request.search_dirs(),
                    ));
                }
            }
            let plan = MergePlan::from_coverage_set(&set)?;
            if plan.is_empty() {
                return Err(ConvertError::missing_input(
                    "descriptors reference no coverage artifacts",
                ));
            }
            tracing::info!(artifacts = plan.len(), "merge plan built from descriptors");
            observer.artifacts_resolved(plan.artifacts());
            plan.execute(
                &self.engine,
                &work_path,
                &scratch,
                &self.artifact_extension,
                |step| observer.merge_step(step),
            )?;
            plan.artifacts().to_vec()
        };

        let document = report::build_report(&self.engine, &work_path, set.binary_paths())?;
        document.write_to(&report_path)?;
        tracing::info!(report = %report_path.display(), "report written");
        observer.report_written(&report_path);

        let derived = if request.stylesheets.is_empty() {
            Vec::new()
        } else if request.chain {
            let last = request
                .stylesheets
                .last()
                .map(|xsl| transform::derived_output_path(&report_path, xsl))
                .unwrap_or_default();
            transform::apply_chain(
                &self.transformer,
                &report_path,
                &last,
                &request.stylesheets,
                &scratch,
                |stage| observer.transform_stage(stage),
            )?;
            vec![last]
        } else {
            transform::apply_each(
                &self.transformer,
                &report_path,
                &request.stylesheets,
                |stage| observer.transform_stage(stage),
            )?
        };

        Ok(ConvertOutcome {
            merged_artifacts,
            report_path,
            derived,
        })
    }
}
