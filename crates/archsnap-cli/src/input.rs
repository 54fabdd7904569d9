//! Loading of architecture descriptions.
//!
//! An input file is a TOML document with `[[components]]`, `[[groups]]` and
//! `[[relationships]]` arrays:
//!
//! ```toml
//! [[components]]
//! id = "api"
//! category = "service"
//! group = "backend"
//!
//! [[components]]
//! id = "db"
//! category = "database"
//! weight = 2.0
//!
//! [[groups]]
//! id = "backend"
//! label = "Backend"
//!
//! [[relationships]]
//! source = "api"
//! target = "db"
//! kind = "sync-call"
//! ```

use std::{fs, path::Path};

use log::debug;

use archsnap::semantic::ArchitectureSpec;

use crate::error::CliError;

/// Read and decode the architecture description at `path`.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be read and
/// [`CliError::Toml`] if it is not a valid description.
pub fn load_architecture(path: impl AsRef<Path>) -> Result<ArchitectureSpec, CliError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let spec: ArchitectureSpec = toml::from_str(&content)
        .map_err(|err| CliError::new_toml_error(&err, path, content.as_str()))?;

    debug!(
        components = spec.components.len(),
        groups = spec.groups.len(),
        relationships = spec.relationships.len();
        "Architecture loaded"
    );
    Ok(spec)
}
