//! Result and error types for covconv.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for covconv operations
pub type ConvertResult<T> = Result<T, ConvertError>;

/// Errors that can occur while converting coverage
#[derive(Debug, Error)]
pub enum ConvertError {
    /// No usable coverage source was supplied
    #[error("input file not input. ({message})")]
    MissingInput {
        /// Error message
        message: String,
    },

    /// The filename component of an input pattern is unusable
    #[error("File pattern is a non-input. ({pattern}): {message}")]
    InvalidPattern {
        /// Pattern as given by the caller
        pattern: String,
        /// Error message
        message: String,
    },

    /// A glob pattern matched zero files
    #[error("Search results by file pattern can not be found. ({pattern})")]
    NoMatchingArtifacts {
        /// Pattern as given by the caller
        pattern: String,
    },

    /// A descriptor is not well-formed or not a test-run document
    #[error("Malformed descriptor {}: {message}", path.display())]
    MalformedDescriptor {
        /// Descriptor path
        path: PathBuf,
        /// Error message
        message: String,
    },

    /// A descriptor lacks a required attribute
    #[error("Descriptor {} is missing required field '{field}'", path.display())]
    MissingRequiredField {
        /// Descriptor path
        path: PathBuf,
        /// Name of the missing attribute
        field: &'static str,
    },

    /// The coverage engine or the transform engine reported an error
    #[error("{operation} failed: {message}")]
    EngineFailure {
        /// Engine operation that failed
        operation: String,
        /// Error message
        message: String,
    },

    /// Filesystem operation failed
    #[error("I/O error: {context}: {source}")]
    Io {
        /// What was being done
        context: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Configuration document could not be loaded
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },
}

impl ConvertError {
    /// Create a missing input error
    #[must_use]
    pub fn missing_input(message: impl Into<String>) -> Self {
        Self::MissingInput {
            message: message.into(),
        }
    }

    /// Create an invalid pattern error
    #[must_use]
    pub fn invalid_pattern(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            message: message.into(),
        }
    }

    /// Create a malformed descriptor error
    #[must_use]
    pub fn malformed_descriptor(path: &Path, message: impl Into<String>) -> Self {
        Self::MalformedDescriptor {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    /// Create an engine failure
    #[must_use]
    pub fn engine(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EngineFailure {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Wrap an I/O error with what was being attempted
    #[must_use]
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}
