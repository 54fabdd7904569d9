//! Layout engine.
//!
//! Assigns every component a 3D position and box, every group a bounding
//! volume and every relationship a routed path. The result is a deterministic
//! function of the [`GraphModel`] and the configuration.
//!
//! # Overview
//!
//! The engine runs in fixed stages:
//!
//! 1. Cycle breaking and longest-path layering ([`layering`]).
//! 2. Coarse placement: layers along +X, in-layer spread along Z inside
//!    per-group bands ([`placement`]).
//! 3. Bounded overlap relaxation along Z ([`relaxation`]).
//! 4. Group volumes recomputed from the relaxed node boxes.
//! 5. Edge routing with detours and parallel-edge fan-out ([`routing`]).
//!
//! The frame is right-handed with +Y up. Every node rests on the ground
//! plane, so its center sits at half its height.

mod layering;
mod placement;
mod relaxation;
mod routing;

use std::collections::HashMap;

use indexmap::IndexMap;
use log::{debug, info, trace};
use serde::Serialize;
use thiserror::Error;

use archsnap_core::{
    geometry::{Bounds, Point, Size},
    identifier::Id,
};

use crate::{
    config::{AppConfig, LayoutConfig, StyleConfig},
    structure::{EdgeIndex, GraphModel, ModelToken},
};

/// Failures of the layout stage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("cannot lay out a graph without components")]
    EmptyGraph,
}

/// Position and box of one component.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodePlacement {
    id: Id,
    layer: usize,
    center: Point,
    size: Size,
}

impl NodePlacement {
    fn new(id: Id, layer: usize, center: Point, size: Size) -> Self {
        Self {
            id,
            layer,
            center,
            size,
        }
    }

    pub fn id(&self) -> Id {
        self.id
    }

    /// Layer index; layer `n` sits further along +X than layer `n - 1`.
    pub fn layer(&self) -> usize {
        self.layer
    }

    pub fn center(&self) -> Point {
        self.center
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new_from_center(self.center, self.size)
    }
}

/// Bounding volume of a group, padding included.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupVolume {
    id: Id,
    bounds: Bounds,
    depth: usize,
}

impl GroupVolume {
    pub fn id(&self) -> Id {
        self.id
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Nesting level; groups without a parent are at depth 0.
    pub fn depth(&self) -> usize {
        self.depth
    }
}

/// Routed path of one relationship.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeRoute {
    index: EdgeIndex,
    source: Id,
    target: Id,
    points: Vec<Point>,
    self_loop: bool,
    detoured: bool,
    cycle_broken: bool,
}

impl EdgeRoute {
    pub fn index(&self) -> EdgeIndex {
        self.index
    }

    pub fn source(&self) -> Id {
        self.source
    }

    pub fn target(&self) -> Id {
        self.target
    }

    /// Ordered waypoints from the source anchor to the target anchor.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn is_self_loop(&self) -> bool {
        self.self_loop
    }

    /// True when a waypoint was inserted to clear an obstruction.
    pub fn is_detoured(&self) -> bool {
        self.detoured
    }

    /// True when this edge was dropped from layering to break a cycle.
    pub fn is_cycle_broken(&self) -> bool {
        self.cycle_broken
    }
}

/// Diagnostics of one layout run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutReport {
    iterations: usize,
    converged: bool,
    residual_overlap: f32,
    broken_edges: Vec<EdgeIndex>,
}

impl LayoutReport {
    /// Relaxation iterations performed.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// False when relaxation stopped at the iteration cap.
    pub fn converged(&self) -> bool {
        self.converged
    }

    /// Largest remaining pairwise penetration depth.
    pub fn residual_overlap(&self) -> f32 {
        self.residual_overlap
    }

    /// Edges removed from the layering graph, in removal order.
    pub fn broken_edges(&self) -> &[EdgeIndex] {
        &self.broken_edges
    }
}

/// Axis-aligned extent of a layout, tagged with its model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphBounds {
    token: ModelToken,
    bounds: Bounds,
}

impl GraphBounds {
    pub fn token(&self) -> ModelToken {
        self.token
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }
}

/// Result of the layout stage.
#[derive(Debug, Clone)]
pub struct Layout {
    token: ModelToken,
    nodes: IndexMap<Id, NodePlacement>,
    groups: IndexMap<Id, GroupVolume>,
    edges: Vec<EdgeRoute>,
    layers_count: usize,
    report: LayoutReport,
}

impl Layout {
    /// Token of the model this layout was computed from.
    pub fn token(&self) -> ModelToken {
        self.token
    }

    /// Node placements in identifier order.
    pub fn nodes(&self) -> impl Iterator<Item = &NodePlacement> {
        self.nodes.values()
    }

    pub fn node(&self, id: Id) -> Option<&NodePlacement> {
        self.nodes.get(&id)
    }

    /// Group volumes in identifier order.
    pub fn groups(&self) -> impl Iterator<Item = &GroupVolume> {
        self.groups.values()
    }

    pub fn group(&self, id: Id) -> Option<&GroupVolume> {
        self.groups.get(&id)
    }

    /// Routes in relationship order.
    pub fn edges(&self) -> &[EdgeRoute] {
        &self.edges
    }

    pub fn layers_count(&self) -> usize {
        self.layers_count
    }

    pub fn report(&self) -> &LayoutReport {
        &self.report
    }

    /// Smallest box containing every node, group volume and route point.
    pub fn bounds(&self) -> Bounds {
        let nodes = self.nodes.values().map(NodePlacement::bounds);
        let groups = self.groups.values().map(GroupVolume::bounds);
        let points = self
            .edges
            .iter()
            .flat_map(|edge| edge.points.iter())
            .map(|point| point.to_bounds(Size::default()));
        nodes
            .chain(groups)
            .chain(points)
            .reduce(|acc, bounds| acc.merge(&bounds))
            .unwrap_or_default()
    }

    /// [`Self::bounds`] tagged with the model token, as the scene assembler
    /// expects it.
    pub fn graph_bounds(&self) -> GraphBounds {
        GraphBounds {
            token: self.token,
            bounds: self.bounds(),
        }
    }
}

/// Computes layouts for graph models.
///
/// # Examples
///
/// ```
/// use archsnap::{config::AppConfig, layout::LayoutEngine, structure::GraphModel};
/// use archsnap::semantic::{ComponentSpec, RelationshipSpec};
///
/// let graph = GraphModel::build(
///     &[ComponentSpec::new("web", "client"), ComponentSpec::new("api", "service")],
///     &[],
///     &[RelationshipSpec::new("web", "api", "sync-call")],
/// ).unwrap();
///
/// let config = AppConfig::default();
/// let layout = LayoutEngine::new(&config).calculate(&graph).unwrap();
/// assert_eq!(layout.layers_count(), 2);
/// ```
pub struct LayoutEngine<'a> {
    layout: &'a LayoutConfig,
    style: &'a StyleConfig,
}

impl<'a> LayoutEngine<'a> {
    pub fn new(config: &'a AppConfig) -> Self {
        Self {
            layout: config.layout(),
            style: config.style(),
        }
    }

    /// Lays out `graph`.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::EmptyGraph`] for a graph without components.
    /// Any other valid graph succeeds; failing to remove every overlap within
    /// the iteration cap is reported in [`LayoutReport`], not as an error.
    pub fn calculate(&self, graph: &GraphModel) -> Result<Layout, LayoutError> {
        if graph.is_empty() {
            return Err(LayoutError::EmptyGraph);
        }
        info!(
            components = graph.components_count(),
            relationships = graph.relationships_count();
            "Calculating layout"
        );

        let broken_edges = layering::break_cycles(graph);
        let layers = layering::assign_layers(graph, &broken_edges);
        let layers_count = layers.values().max().map_or(0, |layer| layer + 1);
        debug!(layers_count, broken = broken_edges.len(); "Layers assigned");

        let sizes: HashMap<Id, Size> = graph
            .components()
            .map(|component| {
                let size = self
                    .style
                    .footprint(component.category(), component.weight());
                (component.id(), size)
            })
            .collect();
        let coarse = placement::place(graph, &layers, &sizes, self.layout);

        let mut nodes: Vec<NodePlacement> = graph
            .components()
            .map(|component| {
                let id = component.id();
                NodePlacement::new(
                    id,
                    layers.get(&id).copied().unwrap_or_default(),
                    coarse.center(id),
                    sizes.get(&id).copied().unwrap_or_default(),
                )
            })
            .collect();
        trace!(nodes:?; "Coarse placement");

        let outcome = relaxation::relax(&mut nodes, self.layout);
        let nodes: IndexMap<Id, NodePlacement> =
            nodes.into_iter().map(|node| (node.id, node)).collect();

        let groups = placement::group_volumes(graph, &nodes, &coarse, self.layout.group_padding());
        let edges = routing::route(graph, &nodes, &broken_edges, self.layout);

        let layout = Layout {
            token: graph.token(),
            nodes,
            groups,
            edges,
            layers_count,
            report: LayoutReport {
                iterations: outcome.iterations,
                converged: outcome.converged,
                residual_overlap: outcome.residual_overlap,
                broken_edges,
            },
        };
        info!(
            layers_count,
            iterations = layout.report.iterations,
            converged = layout.report.converged;
            "Layout calculated"
        );
        Ok(layout)
    }
}

/// Lays out `graph` with the layout and style sections of `config`.
///
/// # Errors
///
/// See [`LayoutEngine::calculate`].
pub fn layout(graph: &GraphModel, config: &AppConfig) -> Result<Layout, LayoutError> {
    LayoutEngine::new(config).calculate(graph)
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use archsnap_core::semantic::{ComponentSpec, GroupSpec, RelationshipSpec};

    use super::*;

    fn build(
        components: &[ComponentSpec],
        groups: &[GroupSpec],
        relationships: &[RelationshipSpec],
    ) -> Layout {
        let graph = GraphModel::build(components, groups, relationships).unwrap();
        layout(&graph, &AppConfig::default()).unwrap()
    }

    #[test]
    fn test_empty_graph() {
        let graph = GraphModel::build(&[], &[GroupSpec::new("lay_lonely")], &[]).unwrap();
        let err = layout(&graph, &AppConfig::default()).unwrap_err();
        assert_eq!(err, LayoutError::EmptyGraph);
    }

    #[test]
    fn test_nodes_rest_on_ground() {
        let layout = build(
            &[
                ComponentSpec::new("lay_db", "database"),
                ComponentSpec::new("lay_cache", "cache").with_weight(2.0),
            ],
            &[],
            &[],
        );
        for node in layout.nodes() {
            assert_approx_eq!(f32, node.bounds().min_y(), 0.0, epsilon = 1e-5);
            assert_approx_eq!(f32, node.center().y(), node.size().height() / 2.0);
        }
    }

    #[test]
    fn test_layers_advance_along_x() {
        let layout = build(
            &[
                ComponentSpec::new("lay_a", "client"),
                ComponentSpec::new("lay_b", "service"),
                ComponentSpec::new("lay_c", "database"),
            ],
            &[],
            &[
                RelationshipSpec::new("lay_a", "lay_b", "sync-call"),
                RelationshipSpec::new("lay_b", "lay_c", "data-flow"),
            ],
        );
        let x = |id: &str| layout.node(Id::new(id)).unwrap().center().x();

        assert_eq!(layout.layers_count(), 3);
        assert!(x("lay_a") < x("lay_b"));
        assert!(x("lay_b") < x("lay_c"));
        let a = layout.node(Id::new("lay_a")).unwrap().bounds();
        let b = layout.node(Id::new("lay_b")).unwrap().bounds();
        assert!(b.min_x() - a.max_x() >= AppConfig::default().layout().layer_spacing() - 1e-4);
    }

    #[test]
    fn test_edgeless_graph_needs_no_relaxation() {
        let components: Vec<ComponentSpec> = (0..6)
            .map(|i| ComponentSpec::new(format!("lay_free{i}"), "service"))
            .collect();
        let layout = build(&components, &[], &[]);

        assert_eq!(layout.layers_count(), 1);
        assert_eq!(layout.report().iterations(), 0);
        assert!(layout.report().converged());
    }

    #[test]
    fn test_bounds_cover_everything() {
        let layout = build(
            &[
                ComponentSpec::new("lay_x", "service").in_group("lay_grp"),
                ComponentSpec::new("lay_y", "queue"),
            ],
            &[GroupSpec::new("lay_grp")],
            &[RelationshipSpec::new("lay_x", "lay_x", "async-message")],
        );
        let bounds = layout.bounds();
        for node in layout.nodes() {
            assert!(bounds.contains_point(node.bounds().min_point()));
            assert!(bounds.contains_point(node.bounds().max_point()));
        }
        for edge in layout.edges() {
            for point in edge.points() {
                assert!(bounds.contains_point(*point));
            }
        }
        assert_eq!(layout.graph_bounds().bounds(), bounds);
        assert_eq!(layout.graph_bounds().token(), layout.token());
    }
}
