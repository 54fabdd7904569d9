//! Export of assembled scenes.
//!
//! This module provides the [`Exporter`] trait that defines the interface for
//! writing a [`SceneDescriptor`] to an output format. It is the final stage in
//! the archsnap pipeline.
//!
//! # Pipeline Position
//!
//! ```text
//! Architecture records
//!     ↓ structure
//! Graph Model
//!     ↓ layout
//! Layout
//!     ↓ synthesis
//! Geometry
//!     ↓ scene
//! Scene Descriptor
//!     ↓ export (this module)
//! Output
//! ```
//!
//! # Available Backends
//!
//! - [`JsonExporter`]: pretty-printed JSON via `serde_json`

use std::{
    io::{self, Write},
    string::FromUtf8Error,
};

use log::debug;
use thiserror::Error;

use crate::scene::SceneDescriptor;

/// Errors that can occur during scene export.
///
/// Converted into [`ArchsnapError::Export`] at the crate boundary.
///
/// [`ArchsnapError::Export`]: crate::ArchsnapError::Export
#[derive(Debug, Error)]
pub enum ExportError {
    /// The scene could not be encoded in the target format.
    #[error("Encoding error: {0}")]
    Encode(#[from] serde_json::Error),

    /// Writing the output failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The encoded document is not valid UTF-8 text.
    #[error("Encoded scene is not UTF-8: {0}")]
    Utf8(#[from] FromUtf8Error),
}

/// Abstraction for scene export backends.
pub trait Exporter {
    /// Writes `scene` in the backend's output format.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Encode`] if the scene cannot be converted to the
    /// target format, or [`ExportError::Io`] if writing the output fails.
    fn export_scene(&mut self, scene: &SceneDescriptor) -> Result<(), ExportError>;
}

/// Writes scenes as pretty-printed JSON, one document per scene.
#[derive(Debug)]
pub struct JsonExporter<W: Write> {
    writer: W,
}

impl<W: Write> JsonExporter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Exporter for JsonExporter<W> {
    fn export_scene(&mut self, scene: &SceneDescriptor) -> Result<(), ExportError> {
        serde_json::to_writer_pretty(&mut self.writer, scene)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        debug!(primitives = scene.primitives().len(); "Scene exported as JSON");
        Ok(())
    }
}
