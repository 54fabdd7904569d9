//! Integration tests for the SnapshotBuilder API
//!
//! These tests verify that the public API works end to end and reports each
//! failure through the matching error variant.

use archsnap::{
    ArchsnapError, SnapshotBuilder,
    config::{AppConfig, ConfigError, LayoutConfig, SceneConfig, StyleConfig},
    layout::LayoutError,
    semantic::{ArchitectureSpec, ComponentSpec, GroupSpec, RelationshipSpec},
    structure::ValidationError,
};

fn web_stack() -> ArchitectureSpec {
    ArchitectureSpec::new()
        .with_component(ComponentSpec::new("web", "client").with_label("Browser"))
        .with_component(ComponentSpec::new("api", "service").in_group("backend"))
        .with_component(ComponentSpec::new("db", "database").in_group("backend"))
        .with_component(ComponentSpec::new("jobs", "queue"))
        .with_group(GroupSpec::new("backend").with_label("Backend"))
        .with_relationship(RelationshipSpec::new("web", "api", "sync-call"))
        .with_relationship(RelationshipSpec::new("api", "db", "data-flow"))
        .with_relationship(RelationshipSpec::new("api", "jobs", "async-message"))
}

#[test]
fn test_builder_api_exists() {
    let builder = SnapshotBuilder::default();
    assert!(builder.config().validate().is_ok());
}

#[test]
fn test_render_simple_architecture() {
    let builder = SnapshotBuilder::default();
    let scene = builder.render(&web_stack()).expect("Failed to render");

    // One container, four shapes, three connectors.
    assert_eq!(scene.primitives().len(), 8);
    assert_eq!(scene.metadata().primitives(), 8);
    assert!(!scene.lights().is_empty());
}

#[test]
fn test_render_json_is_deterministic() {
    let builder = SnapshotBuilder::default();
    let first = builder.render_json(&web_stack()).expect("Failed to render");
    let second = builder.render_json(&web_stack()).expect("Failed to render");

    assert!(first.contains("\"type\": \"container\""));
    assert_eq!(first, second);
}

#[test]
fn test_empty_architecture_is_rejected() {
    let builder = SnapshotBuilder::default();
    let err = builder.render(&ArchitectureSpec::new()).unwrap_err();

    assert!(matches!(err, ArchsnapError::Layout(LayoutError::EmptyGraph)));
}

#[test]
fn test_validation_error_surfaces() {
    let spec = web_stack().with_relationship(RelationshipSpec::new("api", "ghost", "sync-call"));
    let err = SnapshotBuilder::default().render(&spec).unwrap_err();

    match err {
        ArchsnapError::Validation(ValidationError::UnknownEndpoint { missing, .. }) => {
            assert_eq!(missing, "ghost");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_invalid_config_is_rejected() {
    let style = StyleConfig::default().with_weight_clamp(3.0, 0.5);
    let config = AppConfig::new(LayoutConfig::default(), style, SceneConfig::default());
    let err = SnapshotBuilder::new(config).render(&web_stack()).unwrap_err();

    assert!(matches!(
        err,
        ArchsnapError::Config(ConfigError::InvertedClamp { .. })
    ));
}

#[test]
fn test_render_batch_keeps_input_order() {
    let specs = vec![
        web_stack(),
        ArchitectureSpec::new(),
        ArchitectureSpec::new().with_component(ComponentSpec::new("solo", "cache")),
    ];
    let results = SnapshotBuilder::default().render_batch(&specs);

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].as_ref().unwrap().primitives().len(), 8);
    assert!(matches!(
        results[1],
        Err(ArchsnapError::Layout(LayoutError::EmptyGraph))
    ));
    assert_eq!(results[2].as_ref().unwrap().primitives().len(), 1);
}

#[test]
fn test_batch_larger_than_worker_pool_keeps_order() {
    let workers = std::thread::available_parallelism().map_or(1, |n| n.get());
    // Every third input is empty and fails on its own.
    let specs: Vec<ArchitectureSpec> = (0..workers * 2 + 3)
        .map(|i| {
            if i % 3 == 1 {
                ArchitectureSpec::new()
            } else {
                let mut spec = ArchitectureSpec::new();
                for n in 0..=i % 4 {
                    spec = spec.with_component(ComponentSpec::new(format!("node_{n}"), "service"));
                }
                spec
            }
        })
        .collect();

    let builder = SnapshotBuilder::default();
    let pooled = builder.render_batch(&specs);
    let narrow = builder.render_batch_with_workers(&specs, 2);
    assert_eq!(pooled.len(), specs.len());
    assert_eq!(narrow.len(), specs.len());

    for (i, (pooled, narrow)) in pooled.iter().zip(&narrow).enumerate() {
        if i % 3 == 1 {
            assert!(matches!(pooled, Err(ArchsnapError::Layout(LayoutError::EmptyGraph))));
            assert!(matches!(narrow, Err(ArchsnapError::Layout(LayoutError::EmptyGraph))));
        } else {
            let scene = pooled.as_ref().unwrap();
            assert_eq!(scene.primitives().len(), i % 4 + 1, "input {i}");
            assert_eq!(narrow.as_ref().unwrap(), scene);
        }
    }
}

#[test]
fn test_batch_with_zero_workers_still_renders() {
    let results = SnapshotBuilder::default().render_batch_with_workers(&[web_stack()], 0);
    assert_eq!(results.len(), 1);
    assert!(results[0].is_ok());
}

#[test]
fn test_render_json_keeps_non_ascii_labels() {
    let spec = ArchitectureSpec::new()
        .with_component(ComponentSpec::new("kasse", "service").with_label("Kassendienst ü"));
    let json = SnapshotBuilder::default()
        .render_json(&spec)
        .expect("Failed to render");

    assert!(json.contains("Kassendienst ü"));
    assert!(!json.contains('\u{FFFD}'));
}

#[test]
fn test_batch_matches_sequential_rendering() {
    let builder = SnapshotBuilder::default();
    let specs = vec![web_stack(); 4];
    let sequential = builder.render(&web_stack()).unwrap();

    for scene in builder.render_batch(&specs) {
        assert_eq!(scene.unwrap(), sequential);
    }
}
