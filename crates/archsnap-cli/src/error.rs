//! Error type of the archsnap CLI.
//!
//! Wraps library errors together with the failures that only the CLI can
//! hit: missing files and malformed TOML documents.

use std::{io, ops::Range, path::PathBuf};

use thiserror::Error;

use archsnap::ArchsnapError;

/// Errors reported by [`run`](crate::run).
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Archsnap(#[from] ArchsnapError),

    #[error("Missing configuration file: {}", .0.display())]
    MissingConfig(PathBuf),

    /// A TOML document that does not parse or does not match the expected
    /// shape. Keeps the document text so the span can be shown.
    #[error("Failed to parse {}: {message}", path.display())]
    Toml {
        path: PathBuf,
        message: String,
        src: String,
        span: Option<Range<usize>>,
    },
}

impl CliError {
    /// Create a `Toml` error from a deserialization failure of `src`.
    pub fn new_toml_error(
        err: &toml::de::Error,
        path: impl Into<PathBuf>,
        src: impl Into<String>,
    ) -> Self {
        Self::Toml {
            path: path.into(),
            message: err.message().to_string(),
            src: src.into(),
            span: err.span(),
        }
    }
}

impl From<io::Error> for CliError {
    fn from(err: io::Error) -> Self {
        Self::Archsnap(ArchsnapError::Io(err))
    }
}
