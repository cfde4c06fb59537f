//! External tool invocation.
//!
//! Builds argument lists from `{placeholder}` templates and runs the tool,
//! turning spawn errors and non-zero exits into [`ConvertError::EngineFailure`].

use crate::result::{ConvertError, ConvertResult};
use std::path::Path;
use std::process::{Command, Stdio};

/// Template argument that expands to one group of per-directory arguments
pub const SEARCH_DIRS_PLACEHOLDER: &str = "{search_dirs}";

/// Replace every `{key}` in `template` with its value
#[must_use]
pub fn substitute(template: &str, values: &[(&str, &str)]) -> String {
    values.iter().fold(template.to_string(), |acc, (key, value)| {
        acc.replace(&format!("{{{key}}}"), value)
    })
}

/// Expand an argument template.
///
/// An argument equal to `{search_dirs}` is replaced by `search_dir_args`
/// once per directory, with `{dir}` substituted.
#[must_use]
pub fn expand_args(
    template: &[String],
    values: &[(&str, &str)],
    search_dir_args: &[String],
    search_dirs: &[&str],
) -> Vec<String> {
    let mut expanded = Vec::with_capacity(template.len());
    for arg in template {
        if arg == SEARCH_DIRS_PLACEHOLDER {
            for dir in search_dirs {
                expanded.extend(
                    search_dir_args
                        .iter()
                        .map(|a| substitute(a, &[("dir", dir)])),
                );
            }
        } else {
            expanded.push(substitute(arg, values));
        }
    }
    expanded
}

/// Lossy string form of a path for use as a template value
#[must_use]
pub fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Run `program` with `args`, failing on spawn errors or non-zero exit.
///
/// Returns captured stdout.
pub fn run(operation: &str, program: &str, args: &[String]) -> ConvertResult<String> {
    tracing::debug!(operation, program, ?args, "running external tool");

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| ConvertError::engine(operation, format!("Failed to execute {program}: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ConvertError::engine(
            operation,
            format!("{program} exited with {}: {}", output.status, stderr.trim()),
        ));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
