//! CLI logic for the archsnap snapshot tool.
//!
//! This module contains the core CLI logic: loading the configuration and
//! the architecture description, running the pipeline and writing the scene.

pub mod error_adapter;

mod args;
mod config;
mod error;
mod input;

pub use args::Args;
pub use error::CliError;

use std::fs;

use log::info;

use archsnap::SnapshotBuilder;

/// Run the archsnap CLI application
///
/// This function processes the input file through the archsnap pipeline
/// and writes the resulting scene as JSON to the output file.
///
/// # Errors
///
/// Returns `CliError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Malformed input documents
/// - Validation and layout errors
/// - Export errors
pub fn run(args: &Args) -> Result<(), CliError> {
    info!(
        input_path = args.input,
        output_path = args.output;
        "Processing architecture"
    );

    let mut app_config = config::load_config(args.config.as_ref())?;
    if args.views {
        let scene = app_config.scene().clone().with_orthogonal_views(true);
        app_config = app_config.with_scene(scene);
    }

    let spec = input::load_architecture(&args.input)?;

    let builder = SnapshotBuilder::new(app_config);
    let json = builder.render_json(&spec)?;

    fs::write(&args.output, json)?;

    info!(output_file = args.output; "Scene exported successfully");

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use archsnap::ArchsnapError;

    use super::*;

    const INPUT: &str = r#"
        [[components]]
        id = "web"
        category = "client"

        [[components]]
        id = "api"
        category = "service"

        [[components]]
        id = "db"
        category = "database"

        [[relationships]]
        source = "web"
        target = "api"
        kind = "sync-call"

        [[relationships]]
        source = "api"
        target = "db"
        kind = "data-flow"
    "#;

    fn args(dir: &Path, input: &str, views: bool) -> Args {
        let input_path = dir.join("input.toml");
        fs::write(&input_path, input).unwrap();
        let config_path = dir.join("config.toml");
        fs::write(&config_path, "[scene]\nname = \"cli\"\n").unwrap();

        Args {
            input: input_path.display().to_string(),
            output: dir.join("scene.json").display().to_string(),
            config: Some(config_path.display().to_string()),
            views,
            log_level: "off".to_string(),
        }
    }

    #[test]
    fn test_run_writes_scene() {
        let dir = tempfile::tempdir().unwrap();
        let args = args(dir.path(), INPUT, false);

        run(&args).unwrap();

        let json = fs::read_to_string(&args.output).unwrap();
        assert!(json.contains("\"name\": \"cli\""));
        assert_eq!(json.matches("\"type\": \"shape\"").count(), 3);
        assert_eq!(json.matches("\"type\": \"connector\"").count(), 2);
        assert!(!json.contains("\"views\""));
    }

    #[test]
    fn test_run_with_views() {
        let dir = tempfile::tempdir().unwrap();
        let args = args(dir.path(), INPUT, true);

        run(&args).unwrap();

        let json = fs::read_to_string(&args.output).unwrap();
        assert!(json.contains("\"views\""));
        assert!(json.contains("\"preset\": \"bottom\""));
    }

    #[test]
    fn test_run_is_deterministic() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        let first_args = args(first.path(), INPUT, false);
        let second_args = args(second.path(), INPUT, false);

        run(&first_args).unwrap();
        run(&second_args).unwrap();

        assert_eq!(
            fs::read(&first_args.output).unwrap(),
            fs::read(&second_args.output).unwrap()
        );
    }

    #[test]
    fn test_run_reports_validation_error() {
        let dir = tempfile::tempdir().unwrap();
        let input = format!("{INPUT}\n[[components]]\nid = \"api\"\ncategory = \"cache\"\n");
        let args = args(dir.path(), &input, false);

        let err = run(&args).unwrap_err();
        assert!(matches!(err, CliError::Archsnap(ArchsnapError::Validation(_))));
        assert!(!Path::new(&args.output).exists());
    }

    #[test]
    fn test_run_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = args(dir.path(), INPUT, false);
        args.input = dir.path().join("absent.toml").display().to_string();

        let err = run(&args).unwrap_err();
        assert!(matches!(err, CliError::Archsnap(ArchsnapError::Io(_))));
    }
}
