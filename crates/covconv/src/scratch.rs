//! Scoped scratch space for work files.
//!
//! Every run gets one private temporary directory. The work artifact,
//! intermediate merge results and intermediate transform outputs all live in
//! it, and the whole directory is removed when the [`ScratchSpace`] is dropped.

use crate::result::{ConvertError, ConvertResult};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const DIR_PREFIX: &str = "covconv-";

/// Temporary directory owning all scratch files of one run
#[derive(Debug)]
pub struct ScratchSpace {
    dir: TempDir,
}

impl ScratchSpace {
    /// Create a scratch directory under the system temp directory
    pub fn new() -> ConvertResult<Self> {
        let dir = tempfile::Builder::new()
            .prefix(DIR_PREFIX)
            .tempdir()
            .map_err(|e| ConvertError::io("create scratch directory", e))?;
        Ok(Self { dir })
    }

    /// Create a scratch directory under `root`
    pub fn in_dir(root: &Path) -> ConvertResult<Self> {
        let dir = tempfile::Builder::new()
            .prefix(DIR_PREFIX)
            .tempdir_in(root)
            .map_err(|e| {
                ConvertError::io(format!("create scratch directory in {}", root.display()), e)
            })?;
        Ok(Self { dir })
    }

    /// Directory holding the scratch files
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Fixed-name file inside the scratch directory
    #[must_use]
    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Reserve a fresh, uniquely named file with the given extension.
    ///
    /// The file exists (empty) when this returns; it is removed together with
    /// the scratch directory.
    pub fn fresh_file(&self, prefix: &str, extension: &str) -> ConvertResult<PathBuf> {
        let suffix = format!(".{}", extension.trim_start_matches('.'));
        let file = tempfile::Builder::new()
            .prefix(prefix)
            .suffix(&suffix)
            .tempfile_in(self.dir.path())
            .map_err(|e| ConvertError::io("create scratch file", e))?;
        file.into_temp_path()
            .keep()
            .map_err(|e| ConvertError::io("keep scratch file", e.error))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_files_are_unique() {
        let scratch = ScratchSpace::new().unwrap();
        let a = scratch.fresh_file("merge-", "coverage").unwrap();
        let b = scratch.fresh_file("merge-", "coverage").unwrap();

        assert_ne!(a, b);
        assert!(a.starts_with(scratch.path()));
        assert_eq!(a.extension().unwrap(), "coverage");
        assert!(a.is_file());
    }

    #[test]
    fn test_extension_dot_is_optional() {
        let scratch = ScratchSpace::new().unwrap();
        let path = scratch.fresh_file("stage-", ".xml").unwrap();
        assert!(path.to_string_lossy().ends_with(".xml"));
        assert!(!path.to_string_lossy().ends_with("..xml"));
    }

    #[test]
    fn test_drop_removes_everything() {
        let root = tempfile::tempdir().unwrap();
        let scratch = ScratchSpace::in_dir(root.path()).unwrap();
        let dir = scratch.path().to_path_buf();
        let file = scratch.fresh_file("merge-", "coverage").unwrap();
        std::fs::write(scratch.file("work.coverage"), b"data").unwrap();
        assert!(file.exists());

        drop(scratch);

        assert!(!dir.exists());
        assert!(!file.exists());
    }
}
