//! archsnap - Deterministic 3D snapshots of software architectures.
//!
//! An architecture description (components, groups and relationships) is
//! turned into a renderer-ready scene in four stages:
//!
//! 1. [`structure`]: validation into an immutable [`structure::GraphModel`]
//! 2. [`layout`]: layered placement, overlap relaxation and edge routing
//! 3. [`synthesis`]: renderable primitives from the layout
//! 4. [`scene`]: camera, lights and final bounds
//!
//! [`SnapshotBuilder`] runs the whole pipeline. The same input and
//! configuration always produce the same scene.

pub mod config;
pub mod export;
pub mod layout;
pub mod scene;
pub mod structure;
pub mod synthesis;

mod error;

pub use archsnap_core::{color, geometry, identifier, semantic};

pub use error::ArchsnapError;

use std::{
    num::NonZeroUsize,
    sync::atomic::{AtomicUsize, Ordering},
    thread,
};

use log::{debug, info, trace};

use config::AppConfig;
use export::{ExportError, Exporter, JsonExporter};
use scene::{SceneAssembler, SceneDescriptor};
use semantic::ArchitectureSpec;
use structure::GraphModel;

/// Builder for turning architecture descriptions into scenes.
///
/// # Examples
///
/// ```
/// use archsnap::{SnapshotBuilder, config::AppConfig};
/// use archsnap::semantic::{ArchitectureSpec, ComponentSpec, RelationshipSpec};
///
/// let spec = ArchitectureSpec::new()
///     .with_component(ComponentSpec::new("api", "service"))
///     .with_component(ComponentSpec::new("db", "database"))
///     .with_relationship(RelationshipSpec::new("api", "db", "sync-call"));
///
/// let builder = SnapshotBuilder::new(AppConfig::default());
/// let scene = builder.render(&spec).expect("Failed to render");
/// assert_eq!(scene.primitives().len(), 3);
///
/// let json = builder.render_json(&spec).expect("Failed to export");
/// assert!(json.contains("\"connector\""));
/// ```
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    config: AppConfig,
}

impl SnapshotBuilder {
    /// Create a new snapshot builder with the given configuration.
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Validate an architecture description into a graph model.
    ///
    /// # Errors
    ///
    /// Returns [`ArchsnapError::Validation`] naming the offending records.
    pub fn build_model(&self, spec: &ArchitectureSpec) -> Result<GraphModel, ArchsnapError> {
        info!(
            components = spec.components.len(),
            groups = spec.groups.len(),
            relationships = spec.relationships.len();
            "Building graph model"
        );
        let graph = GraphModel::build(&spec.components, &spec.groups, &spec.relationships)?;
        debug!(token:% = graph.token(); "Graph model built");
        Ok(graph)
    }

    /// Run layout, synthesis and scene assembly for a built model.
    ///
    /// # Errors
    ///
    /// Returns [`ArchsnapError::Config`] for an invalid configuration and
    /// [`ArchsnapError::Layout`] for an empty model.
    pub fn render_model(&self, graph: &GraphModel) -> Result<SceneDescriptor, ArchsnapError> {
        self.config.validate()?;

        let layout = layout::layout(graph, &self.config)?;
        if !layout.report().converged() {
            debug!(
                residual = layout.report().residual_overlap();
                "Continuing with best-effort layout"
            );
        }

        let geometry = synthesis::synthesize(graph, &layout, self.config.style())?;
        trace!(geometry:?; "Synthesized geometry");

        let scene = SceneAssembler::new(graph, &self.config)
            .assemble(geometry, layout.graph_bounds())?;
        Ok(scene)
    }

    /// Run the full pipeline on an architecture description.
    ///
    /// # Errors
    ///
    /// Returns the first error of any stage.
    pub fn render(&self, spec: &ArchitectureSpec) -> Result<SceneDescriptor, ArchsnapError> {
        let graph = self.build_model(spec)?;
        self.render_model(&graph)
    }

    /// Render an architecture description to a JSON document.
    pub fn render_json(&self, spec: &ArchitectureSpec) -> Result<String, ArchsnapError> {
        let scene = self.render(spec)?;
        let mut exporter = JsonExporter::new(Vec::new());
        exporter.export_scene(&scene)?;
        let json = String::from_utf8(exporter.into_inner()).map_err(ExportError::from)?;
        info!(bytes = json.len(); "Scene rendered successfully");
        Ok(json)
    }

    /// Render several descriptions concurrently on the available cores.
    ///
    /// Results are returned in input order. Pipelines share only the
    /// configuration, so one failing input does not affect the others.
    pub fn render_batch(
        &self,
        specs: &[ArchitectureSpec],
    ) -> Vec<Result<SceneDescriptor, ArchsnapError>> {
        let cores = thread::available_parallelism().map_or(1, NonZeroUsize::get);
        self.render_batch_with_workers(specs, cores)
    }

    /// Render several descriptions on at most `workers` threads.
    ///
    /// Each worker takes the next unclaimed input until none are left.
    /// Results are returned in input order.
    pub fn render_batch_with_workers(
        &self,
        specs: &[ArchitectureSpec],
        workers: usize,
    ) -> Vec<Result<SceneDescriptor, ArchsnapError>> {
        let workers = workers.clamp(1, specs.len().max(1));
        info!(count = specs.len(), workers = workers; "Rendering batch");

        let next = &AtomicUsize::new(0);
        let mut slots: Vec<Option<Result<SceneDescriptor, ArchsnapError>>> =
            specs.iter().map(|_| None).collect();

        thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|_| {
                    scope.spawn(move || {
                        let mut rendered = Vec::new();
                        loop {
                            let index = next.fetch_add(1, Ordering::Relaxed);
                            let Some(spec) = specs.get(index) else {
                                break;
                            };
                            rendered.push((index, self.render(spec)));
                        }
                        rendered
                    })
                })
                .collect();
            for handle in handles {
                match handle.join() {
                    Ok(rendered) => {
                        for (index, result) in rendered {
                            slots[index] = Some(result);
                        }
                    }
                    Err(panic) => std::panic::resume_unwind(panic),
                }
            }
        });

        slots.into_iter().flatten().collect()
    }
}
