//! Error types for archsnap operations.
//!
//! This module provides the main error type [`ArchsnapError`] which wraps the
//! error of every pipeline stage.

use std::io;

use thiserror::Error;

use crate::{
    config::ConfigError, export::ExportError, layout::LayoutError, scene::StaleLayoutError,
    structure::ValidationError,
};

/// The main error type for archsnap operations.
///
/// Every variant is fatal for the snapshot being produced. Relaxation never
/// fails; reaching the iteration cap is reported on the layout instead.
#[derive(Debug, Error)]
pub enum ArchsnapError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),

    #[error("Stale layout: {0}")]
    StaleLayout(#[from] StaleLayoutError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),
}
