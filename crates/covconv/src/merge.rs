//! Pairwise merge orchestration.
//!
//! Artifacts are merged left to right: the first two into a scratch file,
//! every later artifact into a new scratch file together with the running
//! result, and the last merge straight into the work path. Superseded scratch
//! results are removed as soon as the next merge has consumed them.

use crate::coverage_set::CoverageSet;
use crate::engine::CoverageEngine;
use crate::resolver::{self, Resolution};
use crate::result::{ConvertError, ConvertResult};
use crate::scratch::ScratchSpace;
use std::path::{Path, PathBuf};

/// Sub-directory of a deployment root that holds per-machine collector output
const COLLECTOR_OUTPUT_DIR: &str = "In";

/// One pairwise merge in a plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeStep {
    /// 1-based position in the chain
    pub index: usize,
    /// Total number of merges in the chain
    pub total: usize,
    /// Running result (or the seed artifact for the first step)
    pub first: PathBuf,
    /// Artifact being folded in
    pub second: PathBuf,
    /// Where this merge writes
    pub destination: PathBuf,
    /// True for the merge that writes the work path
    pub is_final: bool,
}

/// Ordered list of artifacts to consolidate; position 0 seeds the chain
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergePlan {
    artifacts: Vec<PathBuf>,
}

impl MergePlan {
    /// Build a plan, sorting by path and dropping duplicates
    pub fn new(artifacts: impl IntoIterator<Item = PathBuf>) -> Self {
        let mut artifacts: Vec<PathBuf> = artifacts.into_iter().collect();
        artifacts.sort();
        artifacts.dedup();
        Self { artifacts }
    }

    /// Build a plan from a coverage set.
    ///
    /// References that are not files relative to the working directory are
    /// looked up under each binary path and its `In` sub-directory.
    ///
    /// # Errors
    ///
    /// [`ConvertError::Io`] when a reference cannot be found anywhere.
    pub fn from_coverage_set(set: &CoverageSet) -> ConvertResult<Self> {
        let artifacts = set
            .coverage_files()
            .iter()
            .map(|reference| locate(reference, set))
            .collect::<ConvertResult<Vec<_>>>()?;
        Ok(Self::new(artifacts))
    }

    /// Artifacts in merge order
    #[must_use]
    pub fn artifacts(&self) -> &[PathBuf] {
        &self.artifacts
    }

    /// First artifact of the chain
    #[must_use]
    pub fn seed(&self) -> Option<&Path> {
        self.artifacts.first().map(PathBuf::as_path)
    }

    /// Number of artifacts
    #[must_use]
    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    /// True when there is nothing to merge
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// Consolidate every artifact into `work_path`.
    ///
    /// A single artifact is copied. Intermediate results are fresh files in
    /// `scratch` with `extension`. `on_step` sees each merge before it runs.
    ///
    /// # Errors
    ///
    /// [`ConvertError::MissingInput`] for an empty plan, otherwise the first
    /// engine or filesystem failure.
    pub fn execute<E: CoverageEngine + ?Sized>(
        &self,
        engine: &E,
        work_path: &Path,
        scratch: &ScratchSpace,
        extension: &str,
        mut on_step: impl FnMut(&MergeStep),
    ) -> ConvertResult<()> {
        let (seed, rest) = self
            .artifacts
            .split_first()
            .ok_or_else(|| ConvertError::missing_input("no coverage artifacts to merge"))?;

        if rest.is_empty() {
            tracing::info!(artifact = %seed.display(), "single artifact, copying");
            return copy_artifact(seed, work_path);
        }

        let total = rest.len();
        let mut running = seed.clone();
        let mut running_is_scratch = false;

        for (offset, next) in rest.iter().enumerate() {
            let is_final = offset + 1 == total;
            let destination = if is_final {
                work_path.to_path_buf()
            } else {
                scratch.fresh_file("merge-", extension)?
            };

            let step = MergeStep {
                index: offset + 1,
                total,
                first: running.clone(),
                second: next.clone(),
                destination: destination.clone(),
                is_final,
            };
            on_step(&step);
            tracing::info!(
                step = step.index,
                total,
                first = %step.first.display(),
                second = %step.second.display(),
                "merging"
            );
            engine.merge(&running, next, &destination, true)?;

            if running_is_scratch {
                discard(&running);
            }
            running = destination;
            running_is_scratch = !is_final;
        }

        Ok(())
    }
}

/// Resolve `input_pattern` and consolidate the matches into `work_path`.
///
/// Returns the artifacts that went into the result, in merge order.
pub fn consolidate<E: CoverageEngine + ?Sized>(
    input_pattern: &str,
    work_path: &Path,
    engine: &E,
    scratch: &ScratchSpace,
    extension: &str,
    on_step: impl FnMut(&MergeStep),
) -> ConvertResult<Vec<PathBuf>> {
    match resolver::resolve(input_pattern)? {
        Resolution::Exact(path) => {
            copy_artifact(&path, work_path)?;
            Ok(vec![path])
        }
        Resolution::Matches(matches) => {
            let plan = MergePlan::new(matches);
            plan.execute(engine, work_path, scratch, extension, on_step)?;
            Ok(plan.artifacts)
        }
    }
}

fn locate(reference: &str, set: &CoverageSet) -> ConvertResult<PathBuf> {
    let path = Path::new(reference);
    if path.is_file() {
        return Ok(path.to_path_buf());
    }

    if path.is_relative() {
        let found = set.binary_paths().iter().find_map(|root| {
            let root = Path::new(root);
            [
                root.join(path),
                root.join(COLLECTOR_OUTPUT_DIR).join(path),
            ]
            .into_iter()
            .find(|candidate| candidate.is_file())
        });
        if let Some(found) = found {
            tracing::debug!(reference, resolved = %found.display(), "located artifact");
            return Ok(found);
        }
    }

    Err(ConvertError::io(
        format!("locate coverage artifact {reference}"),
        std::io::Error::from(std::io::ErrorKind::NotFound),
    ))
}

fn copy_artifact(source: &Path, work_path: &Path) -> ConvertResult<()> {
    std::fs::copy(source, work_path).map_err(|e| {
        ConvertError::io(
            format!("copy {} to {}", source.display(), work_path.display()),
            e,
        )
    })?;
    Ok(())
}

fn discard(intermediate: &Path) {
    if let Err(e) = std::fs::remove_file(intermediate) {
        tracing::warn!(path = %intermediate.display(), error = %e, "could not remove scratch file");
    }
}
