//! Coverage sets: which artifacts to merge and where to look for binaries.

use crate::descriptor;
use crate::result::ConvertResult;
use std::collections::BTreeSet;
use std::path::Path;

/// Coverage artifact paths plus binary/symbol search directories.
///
/// Both members are sets: duplicates collapse and blank entries are never
/// stored. Iteration order carries no meaning; callers that need a merge
/// order go through [`crate::merge::MergePlan`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverageSet {
    coverage_files: BTreeSet<String>,
    binary_paths: BTreeSet<String>,
}

impl CoverageSet {
    /// Create an empty set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read every descriptor and union their references and deployment roots.
    ///
    /// Stops at the first descriptor that fails to extract; nothing from
    /// earlier descriptors is returned in that case.
    pub fn from_descriptors<P: AsRef<Path>>(descriptor_paths: &[P]) -> ConvertResult<Self> {
        let mut set = Self::new();
        for path in descriptor_paths {
            let extraction = descriptor::extract(path.as_ref())?;
            tracing::info!(
                descriptor = %path.as_ref().display(),
                references = extraction.coverage_references.len(),
                "read descriptor"
            );
            set.coverage_files
                .extend(extraction.coverage_references.into_iter().filter(|r| is_usable(r)));
            set.insert_binary_path(&extraction.deployment_root);
        }
        Ok(set)
    }

    /// Wrap one explicit artifact and its search directories
    #[must_use]
    pub fn from_direct_input<P: AsRef<Path>>(artifact: impl Into<String>, search_dirs: &[P]) -> Self {
        let mut set = Self::from_search_dirs(search_dirs);
        let artifact = artifact.into();
        if is_usable(&artifact) {
            set.coverage_files.insert(artifact);
        }
        set
    }

    /// A set holding only search directories
    #[must_use]
    pub fn from_search_dirs<P: AsRef<Path>>(search_dirs: &[P]) -> Self {
        let mut set = Self::new();
        for dir in search_dirs {
            set.insert_binary_path(dir.as_ref());
        }
        set
    }

    /// Union `other` into this set
    pub fn add(&mut self, other: &Self) {
        self.coverage_files
            .extend(other.coverage_files.iter().cloned());
        self.binary_paths.extend(other.binary_paths.iter().cloned());
    }

    /// Coverage artifact references
    #[must_use]
    pub const fn coverage_files(&self) -> &BTreeSet<String> {
        &self.coverage_files
    }

    /// Binary and symbol search directories
    #[must_use]
    pub const fn binary_paths(&self) -> &BTreeSet<String> {
        &self.binary_paths
    }

    /// True when there is nothing to merge
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.coverage_files.is_empty()
    }

    fn insert_binary_path(&mut self, dir: &Path) {
        let dir = dir.to_string_lossy();
        if is_usable(&dir) {
            self.binary_paths.insert(dir.into_owned());
        }
    }
}

fn is_usable(entry: &str) -> bool {
    !entry.trim().is_empty()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::descriptor::TEST_RUN_NAMESPACE;
    use crate::result::ConvertError;
    use proptest::prelude::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn set_of(files: &[&str], dirs: &[&str]) -> CoverageSet {
        let mut set = CoverageSet::from_search_dirs(dirs);
        for file in files {
            set.add(&CoverageSet::from_direct_input(*file, &[] as &[&str]));
        }
        set
    }

    mod construction_tests {
        use super::*;

        #[test]
        fn test_direct_input() {
            let set = CoverageSet::from_direct_input("a.coverage", &["bin", "pdb"]);
            assert_eq!(set.coverage_files().len(), 1);
            assert!(set.coverage_files().contains("a.coverage"));
            assert_eq!(set.binary_paths().len(), 2);
        }

        #[test]
        fn test_blank_entries_are_dropped() {
            let set = CoverageSet::from_direct_input("   ", &["", "  ", "bin"]);
            assert!(set.is_empty());
            assert_eq!(
                set.binary_paths().iter().collect::<Vec<_>>(),
                vec!["bin"]
            );
        }

        #[test]
        fn test_from_descriptors_unions_all() {
            let dir = TempDir::new().unwrap();
            let mut paths = Vec::new();
            for (name, root, file) in [("a.trx", "ra", "x.coverage"), ("b.trx", "rb", "y.coverage")] {
                let body = format!(
                    r#"<TestRun xmlns="{TEST_RUN_NAMESPACE}">
                         <TestSettings><Deployment runDeploymentRoot="{root}" /></TestSettings>
                         <ResultSummary><ResultFiles><ResultFile path="{file}" /></ResultFiles></ResultSummary>
                       </TestRun>"#
                );
                let path = dir.path().join(name);
                std::fs::write(&path, body).unwrap();
                paths.push(path);
            }

            let set = CoverageSet::from_descriptors(&paths).unwrap();
            assert_eq!(set.coverage_files().len(), 2);
            assert!(set
                .binary_paths()
                .contains(&*dir.path().join("ra").to_string_lossy()));
            assert!(set
                .binary_paths()
                .contains(&*dir.path().join("rb").to_string_lossy()));
        }

        #[test]
        fn test_from_descriptors_is_fail_fast() {
            let dir = TempDir::new().unwrap();
            let good = dir.path().join("good.trx");
            std::fs::write(
                &good,
                format!(
                    r#"<TestRun xmlns="{TEST_RUN_NAMESPACE}"><TestSettings><Deployment runDeploymentRoot="r"/></TestSettings></TestRun>"#
                ),
            )
            .unwrap();
            let bad = dir.path().join("bad.trx");
            std::fs::write(&bad, "not xml at all <").unwrap();

            let err = CoverageSet::from_descriptors(&[good, bad]).unwrap_err();
            assert!(matches!(err, ConvertError::MalformedDescriptor { .. }));
        }

        #[test]
        fn test_no_descriptors_is_empty() {
            let set = CoverageSet::from_descriptors::<PathBuf>(&[]).unwrap();
            assert_eq!(set, CoverageSet::new());
        }
    }

    mod union_tests {
        use super::*;

        #[test]
        fn test_add_unions_both_members() {
            let mut x = set_of(&["a", "b"], &["bin1"]);
            let y = set_of(&["b", "c"], &["bin1", "bin2"]);
            x.add(&y);

            assert_eq!(
                x.coverage_files().iter().collect::<Vec<_>>(),
                vec!["a", "b", "c"]
            );
            assert_eq!(
                x.binary_paths().iter().collect::<Vec<_>>(),
                vec!["bin1", "bin2"]
            );
        }
    }

    fn entries() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec("[a-d ]{0,3}", 0..8)
    }

    proptest! {
        #[test]
        fn prop_add_is_union(xf in entries(), xd in entries(), yf in entries(), yd in entries()) {
            let x = {
                let mut s = CoverageSet::from_search_dirs(&xd);
                for f in &xf { s.add(&CoverageSet::from_direct_input(f.clone(), &[] as &[&str])); }
                s
            };
            let y = {
                let mut s = CoverageSet::from_search_dirs(&yd);
                for f in &yf { s.add(&CoverageSet::from_direct_input(f.clone(), &[] as &[&str])); }
                s
            };

            let mut joined = x.clone();
            joined.add(&y);

            let expected_files: BTreeSet<String> =
                x.coverage_files().union(y.coverage_files()).cloned().collect();
            let expected_dirs: BTreeSet<String> =
                x.binary_paths().union(y.binary_paths()).cloned().collect();
            prop_assert_eq!(joined.coverage_files(), &expected_files);
            prop_assert_eq!(joined.binary_paths(), &expected_dirs);
            prop_assert!(joined.coverage_files().iter().all(|f| !f.trim().is_empty()));

            let mut twice = joined.clone();
            twice.add(&y);
            prop_assert_eq!(twice, joined);
        }
    }
}
