//! Command-line argument definitions for the archsnap CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments control input/output paths, configuration file
//! selection, extra camera views, and logging verbosity.

use clap::Parser;

/// Command-line arguments for the archsnap snapshot tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input architecture file (TOML)
    #[arg(help = "Path to the input file")]
    pub input: String,

    /// Path to the output scene file (JSON)
    #[arg(short, long, default_value = "out.json")]
    pub output: String,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Add the six orthogonal snapshot cameras to the scene
    #[arg(long)]
    pub views: bool,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
