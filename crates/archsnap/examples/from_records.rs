//! Example: Building a snapshot from architecture records
//!
//! This example demonstrates how to describe an architecture in code and run
//! it through the snapshot pipeline, without reading an input file.

use archsnap::{
    SnapshotBuilder,
    config::{AppConfig, SceneConfig},
    scene::CameraPreset,
    semantic::{ArchitectureSpec, ComponentSpec, GroupSpec, RelationshipSpec},
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Building snapshot from architecture records...\n");

    let spec = ArchitectureSpec::new()
        .with_component(ComponentSpec::new("client", "client").with_label("Web Client"))
        .with_component(
            ComponentSpec::new("server", "service")
                .with_label("API Server")
                .in_group("backend"),
        )
        .with_component(
            ComponentSpec::new("database", "database")
                .with_weight(1.5)
                .in_group("backend"),
        )
        .with_group(GroupSpec::new("backend").with_label("Backend"))
        .with_relationship(
            RelationshipSpec::new("client", "server", "sync-call").with_label("HTTP requests"),
        )
        .with_relationship(
            RelationshipSpec::new("server", "database", "data-flow").with_label("SQL queries"),
        );

    println!("Created architecture:");
    println!("  Components: {}", spec.components.len());
    println!("  Groups: {}", spec.groups.len());
    println!("  Relationships: {}", spec.relationships.len());
    println!();

    let scene_config = SceneConfig::default()
        .with_name("from-records")
        .with_camera_preset(CameraPreset::Front)
        .with_orthogonal_views(true);
    let builder = SnapshotBuilder::new(AppConfig::default().with_scene(scene_config));

    println!("Rendering to JSON...");
    let json = builder.render_json(&spec)?;
    println!("Scene generated successfully!");
    println!("JSON length: {} bytes", json.len());

    let output_path = "from_records_output.json";
    std::fs::write(output_path, &json)?;
    println!("Scene written to: {}", output_path);

    Ok(())
}
