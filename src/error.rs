//! Error types with actionable diagnostics.
//!
//! Every error names what went wrong and, where the user can do something
//! about it, what to try next. Failures inside the fusion pass are wrapped
//! in [`Error::Task`] so the source task and batch index are always known.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for maxcorr operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while running a maximal-correlation experiment.
#[derive(Error, Debug)]
pub enum Error {
    /// Dataset mode is not one of the supported modes.
    #[error("Invalid dataset mode '{mode}'\n  → Supported modes: cifar, dogs, tiny_imagenet")]
    InvalidMode { mode: String },

    /// Configuration file has invalid syntax.
    #[error("Invalid configuration syntax in {path}:\n  {message}\n  → Check YAML syntax at the indicated line")]
    ConfigParsing { path: PathBuf, message: String },

    /// Configuration value is invalid.
    #[error("Invalid configuration value for '{field}': {message}\n  → {suggestion}")]
    ConfigValue { field: String, message: String, suggestion: String },

    /// Matrix or batch dimensions disagree.
    #[error("Shape mismatch in {context}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch { context: String, expected: Vec<usize>, actual: Vec<usize> },

    /// A label is outside `[0, num_classes)`.
    #[error("Label {label} out of range for {num_classes} classes\n  → Labels must be in [0, num_classes)")]
    LabelOutOfRange { label: usize, num_classes: usize },

    /// Failure while processing one source task.
    #[error("Source task {task}{}: {source}", .batch.map(|b| format!(", batch {b}")).unwrap_or_default())]
    Task {
        task: usize,
        batch: Option<usize>,
        #[source]
        source: Box<Error>,
    },

    /// Extractor checkpoint not found.
    #[error("Checkpoint not found: {path}\n  → Export the frozen extractor or set checkpoints.dir")]
    CheckpointNotFound { path: PathBuf },

    /// IO error with context.
    #[error("IO error: {context}\n  Cause: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Serialization/deserialization error.
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Invalid argument passed to a library routine.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The baseline classifier failed to fit.
    #[error("Classifier {name} failed: {message}")]
    Classifier { name: &'static str, message: String },
}

impl Error {
    /// Create an IO error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io { context: context.into(), source }
    }

    /// Create a shape mismatch error.
    pub fn shape(context: impl Into<String>, expected: &[usize], actual: &[usize]) -> Self {
        Self::ShapeMismatch {
            context: context.into(),
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        }
    }

    /// Attach source task (and optionally batch) context.
    pub fn in_task(self, task: usize, batch: Option<usize>) -> Self {
        Self::Task { task, batch, source: Box::new(self) }
    }

    /// Check if this error is caused by user input rather than a bug.
    pub fn is_user_error(&self) -> bool {
        match self {
            Self::InvalidMode { .. }
            | Self::ConfigParsing { .. }
            | Self::ConfigValue { .. }
            | Self::LabelOutOfRange { .. }
            | Self::CheckpointNotFound { .. } => true,
            Self::Task { source, .. } => source.is_user_error(),
            _ => false,
        }
    }

    /// Get the error code for structured output.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidMode { .. } => "E001",
            Self::ConfigParsing { .. } => "E002",
            Self::ConfigValue { .. } => "E003",
            Self::ShapeMismatch { .. } => "E040",
            Self::LabelOutOfRange { .. } => "E041",
            Self::Task { .. } => "E042",
            Self::CheckpointNotFound { .. } => "E010",
            Self::Io { .. } => "E050",
            Self::Serialization { .. } => "E051",
            Self::InvalidParameter(_) => "E060",
            Self::Classifier { .. } => "E070",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_unique() {
        let errors = vec![
            Error::InvalidMode { mode: "".into() },
            Error::ConfigParsing { path: "".into(), message: "".into() },
            Error::ConfigValue { field: "".into(), message: "".into(), suggestion: "".into() },
            Error::shape("", &[], &[]),
            Error::LabelOutOfRange { label: 0, num_classes: 0 },
            Error::InvalidParameter("".into()).in_task(0, None),
            Error::CheckpointNotFound { path: "".into() },
            Error::io("", std::io::Error::other("x")),
            Error::Serialization { message: "".into() },
            Error::InvalidParameter("".into()),
            Error::Classifier { name: "", message: "".into() },
        ];

        let codes: Vec<_> = errors.iter().map(Error::code).collect();
        let unique: std::collections::HashSet<_> = codes.iter().collect();
        assert_eq!(codes.len(), unique.len(), "Error codes must be unique");
    }

    #[test]
    fn test_invalid_mode_lists_supported_modes() {
        let msg = Error::InvalidMode { mode: "mnist".into() }.to_string();
        assert!(msg.contains("mnist"));
        assert!(msg.contains("tiny_imagenet"));
    }

    #[test]
    fn test_task_context_in_message() {
        let err = Error::shape("weighted score", &[4, 84], &[4, 80]).in_task(3, Some(7));
        let msg = err.to_string();
        assert!(msg.contains("Source task 3, batch 7"), "{msg}");
        assert!(msg.contains("[4, 84]"));

        let no_batch = Error::InvalidParameter("x".into()).in_task(1, None).to_string();
        assert!(no_batch.starts_with("Source task 1: "), "{no_batch}");
    }

    #[test]
    fn test_user_error_classification() {
        assert!(Error::InvalidMode { mode: "x".into() }.is_user_error());
        assert!(Error::LabelOutOfRange { label: 5, num_classes: 2 }
            .in_task(0, None)
            .is_user_error());
        assert!(!Error::Serialization { message: "x".into() }.is_user_error());
    }
}
