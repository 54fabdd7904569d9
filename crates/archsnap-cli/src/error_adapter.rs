//! Error adapter for converting CliError to miette diagnostics.
//!
//! This module provides the bridge between the standard error types of the
//! library and the CLI, and miette's rich diagnostic formatting.
//!
//! Malformed TOML documents are reported with the offending span of the
//! document; every other error is reported with an error code and, where a
//! fix is known, help text.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan, SourceSpan};

use archsnap::{
    ArchsnapError,
    layout::LayoutError,
    semantic::{Category, RelationKind},
    structure::ValidationError,
};

use crate::error::CliError;

/// Adapter for a TOML document error with its source text.
pub struct SourceAdapter<'a> {
    err: &'a CliError,
    message: &'a str,
    src: &'a str,
    span: Option<SourceSpan>,
}

impl fmt::Debug for SourceAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceAdapter")
            .field("err", &self.err)
            .finish()
    }
}

impl fmt::Display for SourceAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.err, f)
    }
}

impl std::error::Error for SourceAdapter<'_> {}

impl MietteDiagnostic for SourceAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new("archsnap::toml"))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.src as &dyn miette::SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let span = self.span?;
        let label = LabeledSpan::new_primary_with_span(Some(self.message.to_string()), span);
        Some(Box::new(std::iter::once(label)))
    }
}

/// Adapter for [`CliError`] variants without source information.
pub struct ErrorAdapter<'a>(pub &'a CliError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(self.0)
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match self.0 {
            CliError::Archsnap(err) => match err {
                ArchsnapError::Io(_) => "archsnap::io",
                ArchsnapError::Config(_) => "archsnap::config",
                ArchsnapError::Validation(_) => "archsnap::validation",
                ArchsnapError::Layout(_) => "archsnap::layout",
                ArchsnapError::StaleLayout(_) => "archsnap::stale_layout",
                ArchsnapError::Export(_) => "archsnap::export",
            },
            CliError::MissingConfig(_) => "archsnap::config",
            CliError::Toml { .. } => "archsnap::toml",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let help = match self.0 {
            CliError::Archsnap(ArchsnapError::Validation(err)) => validation_help(err),
            CliError::Archsnap(ArchsnapError::Layout(LayoutError::EmptyGraph)) => {
                "add at least one [[components]] entry to the input".to_string()
            }
            CliError::Archsnap(ArchsnapError::Config(_)) | CliError::MissingConfig(_) => {
                "check the [layout], [style] and [scene] tables of the configuration file"
                    .to_string()
            }
            _ => return None,
        };
        Some(Box::new(help))
    }
}

fn validation_help(err: &ValidationError) -> String {
    match err {
        ValidationError::DuplicateId { .. } => {
            "identifiers must be unique across components and groups".to_string()
        }
        ValidationError::UnknownEndpoint { .. } | ValidationError::UnknownReference { .. } => {
            "declare the referenced component or group, or fix its identifier".to_string()
        }
        ValidationError::GroupCycle { .. } => {
            "a group cannot contain itself through its `parent` chain".to_string()
        }
        ValidationError::UnknownTag { tag, .. } => {
            let known: Vec<&str> = if tag.set == "category" {
                Category::ALL.iter().map(|category| category.as_str()).collect()
            } else {
                RelationKind::ALL.iter().map(|kind| kind.as_str()).collect()
            };
            format!("known {} tags: {}", tag.set, known.join(", "))
        }
        ValidationError::ConflictingMembership { .. } => {
            "a component can be a direct member of one group only".to_string()
        }
        ValidationError::InvalidWeight { .. } => "use a finite number for `weight`".to_string(),
    }
}

/// A reportable error that can be rendered by miette.
#[derive(Debug)]
pub enum Reportable<'a> {
    /// A TOML error with a location in its document.
    Source(SourceAdapter<'a>),
    /// A simple error without source location.
    Error(ErrorAdapter<'a>),
}

impl fmt::Display for Reportable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reportable::Source(s) => fmt::Display::fmt(s, f),
            Reportable::Error(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl std::error::Error for Reportable<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Reportable::Source(_) => None,
            Reportable::Error(e) => e.source(),
        }
    }
}

impl MietteDiagnostic for Reportable<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Source(s) => s.code(),
            Reportable::Error(e) => e.code(),
        }
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Source(s) => s.help(),
            Reportable::Error(e) => e.help(),
        }
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        match self {
            Reportable::Source(s) => s.source_code(),
            Reportable::Error(e) => e.source_code(),
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        match self {
            Reportable::Source(s) => s.labels(),
            Reportable::Error(e) => e.labels(),
        }
    }
}

/// Convert a [`CliError`] into a reportable error.
pub fn to_reportable(err: &CliError) -> Reportable<'_> {
    match err {
        CliError::Toml {
            message, src, span, ..
        } => Reportable::Source(SourceAdapter {
            err,
            message,
            src,
            span: span
                .as_ref()
                .map(|span| SourceSpan::new(span.start.into(), span.len())),
        }),
        _ => Reportable::Error(ErrorAdapter(err)),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use archsnap::semantic::UnknownTag;

    use super::*;

    fn code_of(reportable: &Reportable<'_>) -> String {
        reportable.code().map(|code| code.to_string()).unwrap_or_default()
    }

    #[test]
    fn test_toml_error_has_label() {
        let err = CliError::Toml {
            path: PathBuf::from("input.toml"),
            message: "missing field `category`".to_string(),
            src: "[[components]]\nid = \"api\"\n".to_string(),
            span: Some(0..14),
        };

        let reportable = to_reportable(&err);
        assert!(matches!(reportable, Reportable::Source(_)));
        assert_eq!(code_of(&reportable), "archsnap::toml");

        let labels: Vec<_> = reportable.labels().unwrap().collect();
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].label(), Some("missing field `category`"));
        assert!(labels[0].primary());
        assert_eq!(labels[0].offset(), 0);
        assert_eq!(labels[0].len(), 14);
    }

    #[test]
    fn test_validation_error_code_and_help() {
        let err = CliError::from(ArchsnapError::from(ValidationError::UnknownTag {
            owner: "api".to_string(),
            tag: UnknownTag {
                set: "category",
                tag: "servce".to_string(),
            },
        }));

        let reportable = to_reportable(&err);
        assert_eq!(code_of(&reportable), "archsnap::validation");
        let help = reportable.help().unwrap().to_string();
        assert!(help.contains("service, database, queue, cache, external, client"));
    }

    #[test]
    fn test_empty_graph_help() {
        let err = CliError::from(ArchsnapError::from(LayoutError::EmptyGraph));

        let reportable = to_reportable(&err);
        assert_eq!(code_of(&reportable), "archsnap::layout");
        assert!(reportable.help().unwrap().to_string().contains("[[components]]"));
        assert!(reportable.labels().is_none());
    }

    #[test]
    fn test_io_error_has_no_help() {
        let err = CliError::from(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));

        let reportable = to_reportable(&err);
        assert_eq!(code_of(&reportable), "archsnap::io");
        assert!(reportable.help().is_none());
        assert_eq!(reportable.to_string(), "I/O error: gone");
    }
}
