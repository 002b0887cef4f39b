//! Error types for the generation pipeline.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline stages, in the order a generation run moves through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize)]
pub enum Stage {
    /// Nothing has been read yet.
    Unparsed,
    /// The source has been turned into a model.
    Parsed,
    /// References and parent links have been checked.
    CrossReferenced,
    /// A codec has filled every annotation slot.
    Annotated,
    /// Templates have been written to the output tree.
    Rendered,
    /// Post-processing finished.
    Done,
}

impl Stage {
    /// Lowercase name used in logs and error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Unparsed => "unparsed",
            Stage::Parsed => "parsed",
            Stage::CrossReferenced => "cross-referenced",
            Stage::Annotated => "annotated",
            Stage::Rendered => "rendered",
            Stage::Done => "done",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur while generating client libraries.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed descriptor, unmappable field type, bad path template.
    #[error("Invalid specification: {0}")]
    Specification(String),

    /// Conflicting or unknown options, detected before any model is built.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// A type reference that does not resolve in the API state.
    #[error("Unresolved reference to '{id}' in {element}")]
    Reference {
        /// The element holding the reference.
        element: String,
        /// The ID that did not resolve.
        id: String,
    },

    /// A node annotation was written twice in the same run.
    #[error("Annotation error: {0}")]
    Annotation(String),

    /// Template parsing or rendering failed.
    #[error("Template '{name}' failed: {message}")]
    Template {
        /// Template name relative to its root.
        name: String,
        /// Tera's message, including its cause chain.
        message: String,
    },

    /// Reading or writing a file failed.
    #[error("I/O error on '{path}': {source}")]
    Io {
        /// File being read or written.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A descriptor set could not be decoded.
    #[error("Failed to decode descriptor set '{path}': {source}")]
    Decode {
        /// The descriptor set file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: prost::DecodeError,
    },

    /// A JSON document is malformed.
    #[error("Failed to parse JSON '{path}': {source}")]
    Json {
        /// The document.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// A YAML document is malformed.
    #[error("Failed to parse YAML '{path}': {source}")]
    Yaml {
        /// The document.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_yaml::Error,
    },

    /// A TOML configuration file is malformed.
    #[error("Failed to parse TOML '{path}': {source}")]
    Toml {
        /// The configuration file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: toml::de::Error,
    },

    /// An external formatter or toolchain exited unsuccessfully.
    ///
    /// `stderr` is carried verbatim.
    #[error("Command `{command}` failed with {status}:\n{stderr}")]
    Subprocess {
        /// Program and arguments as run.
        command: String,
        /// Exit status as reported by the OS.
        status: String,
        /// Captured standard error.
        stderr: String,
    },

    /// A failure wrapped with the pipeline stage that was being entered.
    #[error("Generation failed before reaching stage '{stage}': {source}")]
    Stage {
        /// The stage that was not reached.
        stage: Stage,
        /// The original failure.
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn at_stage(self, stage: Stage) -> Self {
        match self {
            // Keep the innermost stage when errors bubble through nested runs.
            err @ Error::Stage { .. } => err,
            err => Error::Stage {
                stage,
                source: Box::new(err),
            },
        }
    }

    /// The stage a pipeline failure was attributed to, if any.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Error::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_at_stage_wraps_once() {
        let err = Error::Specification("bad".into())
            .at_stage(Stage::Parsed)
            .at_stage(Stage::Rendered);
        assert_eq!(err.stage(), Some(Stage::Parsed));
        assert!(err.to_string().contains("stage 'parsed'"));
        assert!(err.to_string().contains("bad"));
    }

    #[test]
    fn test_subprocess_message_keeps_stderr() {
        let err = Error::Subprocess {
            command: "gofmt -w .".into(),
            status: "exit status: 2".into(),
            stderr: "main.go:3:1: expected declaration".into(),
        };
        assert!(err.to_string().ends_with("main.go:3:1: expected declaration"));
    }
}
