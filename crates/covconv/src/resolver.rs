//! Input pattern resolution.
//!
//! An input is either an existing file or `<dir>/<glob>`. The glob only
//! applies to the file name; the directory is searched non-recursively and
//! matches come back sorted by path so merge order is reproducible.

use crate::result::{ConvertError, ConvertResult};
use glob::Pattern;
use std::path::{is_separator, Path, PathBuf};

/// Outcome of resolving an input pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The input names an existing file
    Exact(PathBuf),
    /// Files matched by the pattern, sorted, never empty
    Matches(Vec<PathBuf>),
}

impl Resolution {
    /// Resolved files in merge order
    #[must_use]
    pub fn into_paths(self) -> Vec<PathBuf> {
        match self {
            Self::Exact(path) => vec![path],
            Self::Matches(paths) => paths,
        }
    }
}

/// Resolve an input path or pattern into concrete files.
///
/// # Errors
///
/// - [`ConvertError::MissingInput`] for an empty or whitespace-only input
/// - [`ConvertError::InvalidPattern`] when the file name part is empty or not a valid glob
/// - [`ConvertError::NoMatchingArtifacts`] when nothing matches
/// - [`ConvertError::Io`] when the directory cannot be listed
pub fn resolve(input: &str) -> ConvertResult<Resolution> {
    if input.trim().is_empty() {
        return Err(ConvertError::missing_input("no input path or pattern given"));
    }

    let exact = Path::new(input);
    if exact.is_file() {
        return Ok(Resolution::Exact(exact.to_path_buf()));
    }

    let (dir, file_pattern) = split_pattern(input)?;
    let matches = find_matches(&dir, &file_pattern)?;
    if matches.is_empty() {
        return Err(ConvertError::NoMatchingArtifacts {
            pattern: input.to_string(),
        });
    }

    tracing::debug!(pattern = input, count = matches.len(), "resolved input pattern");
    Ok(Resolution::Matches(matches))
}

/// Split an input into its directory and file-name glob.
///
/// The directory is `.` when the input has none.
pub fn split_pattern(input: &str) -> ConvertResult<(PathBuf, String)> {
    if input.ends_with(is_separator) {
        return Err(ConvertError::invalid_pattern(input, "file name is empty"));
    }

    let path = Path::new(input);
    let file_pattern = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| ConvertError::invalid_pattern(input, "file name is empty"))?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    Ok((dir, file_pattern))
}

/// Files directly inside `dir` whose names match `file_pattern`, sorted by path
pub fn find_matches(dir: &Path, file_pattern: &str) -> ConvertResult<Vec<PathBuf>> {
    let pattern = Pattern::new(file_pattern)
        .map_err(|e| ConvertError::invalid_pattern(file_pattern, e.to_string()))?;

    let entries = std::fs::read_dir(dir)
        .map_err(|e| ConvertError::io(format!("search directory {}", dir.display()), e))?;

    let mut matches = Vec::new();
    for entry in entries {
        let entry =
            entry.map_err(|e| ConvertError::io(format!("search directory {}", dir.display()), e))?;
        let path = entry.path();
        let matched = entry
            .file_name()
            .to_str()
            .is_some_and(|name| pattern.matches(name));
        if matched && path.is_file() {
            matches.push(path);
        }
    }

    matches.sort();
    Ok(matches)
}
