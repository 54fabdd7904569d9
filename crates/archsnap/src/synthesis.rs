//! Geometry synthesis.
//!
//! Maps a laid-out graph to renderer-agnostic primitive descriptors: one
//! shape per component, one connector per relationship and one translucent
//! container per group. Synthesis is a pure function of the graph, the
//! layout and the style configuration.
//!
//! # Example
//!
//! ```
//! use archsnap::{config::AppConfig, layout, structure::GraphModel, synthesis};
//! use archsnap::semantic::ComponentSpec;
//!
//! let graph = GraphModel::build(&[ComponentSpec::new("db", "database")], &[], &[]).unwrap();
//! let config = AppConfig::default();
//! let layout = layout::layout(&graph, &config).unwrap();
//!
//! let geometry = synthesis::synthesize(&graph, &layout, config.style()).unwrap();
//! assert_eq!(geometry.shapes().count(), 1);
//! ```

use log::{debug, info};
use serde::{Deserialize, Serialize};

use archsnap_core::{
    color::Color,
    geometry::{Bounds, Point, Rotation, Size},
    identifier::Id,
    semantic::{Category, RelationKind},
};

use crate::{
    config::StyleConfig,
    layout::Layout,
    scene::StaleLayoutError,
    structure::{EdgeIndex, GraphModel, ModelToken},
};

/// Kind of solid used for a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShapeKind {
    Box,
    Cylinder,
    Capsule,
    Sphere,
    Cone,
}

/// Line style of a connector, derived from the relationship kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConnectorStyle {
    Solid,
    Dashed,
    Arrowed,
}

impl From<RelationKind> for ConnectorStyle {
    fn from(kind: RelationKind) -> Self {
        match kind {
            RelationKind::SyncCall => ConnectorStyle::Solid,
            RelationKind::AsyncMessage => ConnectorStyle::Dashed,
            RelationKind::DataFlow => ConnectorStyle::Arrowed,
        }
    }
}

/// Placement of a primitive: position of its center, rotation in degrees
/// and scale as absolute dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Transform {
    position: Point,
    rotation: Rotation,
    scale: Size,
}

impl Transform {
    pub fn new(position: Point, scale: Size) -> Self {
        Self {
            position,
            rotation: Rotation::identity(),
            scale,
        }
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn scale(&self) -> Size {
        self.scale
    }

    /// Box occupied by a primitive with this transform.
    pub fn bounds(&self) -> Bounds {
        Bounds::new_from_center(self.position, self.scale)
    }
}

/// A solid standing for one component.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShapePrimitive {
    id: Id,
    label: String,
    shape: ShapeKind,
    /// Style tag: the component category.
    category: Category,
    color: Color,
    transform: Transform,
}

impl ShapePrimitive {
    pub fn id(&self) -> Id {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn shape(&self) -> ShapeKind {
        self.shape
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }
}

/// A tube along a routed edge path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectorPrimitive {
    index: EdgeIndex,
    source: Id,
    target: Id,
    style: ConnectorStyle,
    label: Option<String>,
    points: Vec<Point>,
    radius: f32,
    color: Color,
    self_loop: bool,
}

impl ConnectorPrimitive {
    pub fn index(&self) -> EdgeIndex {
        self.index
    }

    pub fn source(&self) -> Id {
        self.source
    }

    pub fn target(&self) -> Id {
        self.target
    }

    pub fn style(&self) -> ConnectorStyle {
        self.style
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn is_self_loop(&self) -> bool {
        self.self_loop
    }

    /// Box enclosing the path, grown by the tube radius.
    pub fn bounds(&self) -> Bounds {
        Bounds::from_points(self.points.iter().copied())
            .unwrap_or_default()
            .add_padding(self.radius)
    }
}

/// A translucent box around a group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContainerPrimitive {
    id: Id,
    label: String,
    depth: usize,
    color: Color,
    opacity: f32,
    transform: Transform,
}

impl ContainerPrimitive {
    pub fn id(&self) -> Id {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Group nesting level.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }
}

/// One renderable element of the scene.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum PrimitiveDescriptor {
    Shape(ShapePrimitive),
    Connector(ConnectorPrimitive),
    Container(ContainerPrimitive),
}

impl PrimitiveDescriptor {
    /// Axis-aligned box the primitive occupies.
    pub fn bounds(&self) -> Bounds {
        match self {
            PrimitiveDescriptor::Shape(shape) => shape.transform.bounds(),
            PrimitiveDescriptor::Connector(connector) => connector.bounds(),
            PrimitiveDescriptor::Container(container) => container.transform.bounds(),
        }
    }

    /// Reference point of the primitive: the transform position, or the
    /// first path point for connectors.
    pub fn anchor(&self) -> Point {
        match self {
            PrimitiveDescriptor::Shape(shape) => shape.transform.position,
            PrimitiveDescriptor::Connector(connector) => {
                connector.points.first().copied().unwrap_or_default()
            }
            PrimitiveDescriptor::Container(container) => container.transform.position,
        }
    }
}

/// Synthesized primitives of one model.
///
/// Containers come first, then shapes in identifier order, then connectors
/// in relationship order.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    token: ModelToken,
    primitives: Vec<PrimitiveDescriptor>,
}

impl Geometry {
    /// Token of the model the geometry was synthesized from.
    pub fn token(&self) -> ModelToken {
        self.token
    }

    pub fn primitives(&self) -> &[PrimitiveDescriptor] {
        &self.primitives
    }

    pub fn shapes(&self) -> impl Iterator<Item = &ShapePrimitive> {
        self.primitives.iter().filter_map(|primitive| match primitive {
            PrimitiveDescriptor::Shape(shape) => Some(shape),
            _ => None,
        })
    }

    pub fn connectors(&self) -> impl Iterator<Item = &ConnectorPrimitive> {
        self.primitives.iter().filter_map(|primitive| match primitive {
            PrimitiveDescriptor::Connector(connector) => Some(connector),
            _ => None,
        })
    }

    pub fn containers(&self) -> impl Iterator<Item = &ContainerPrimitive> {
        self.primitives.iter().filter_map(|primitive| match primitive {
            PrimitiveDescriptor::Container(container) => Some(container),
            _ => None,
        })
    }

    /// Union of every primitive box, or `None` when there are no primitives.
    pub fn bounds(&self) -> Option<Bounds> {
        self.primitives
            .iter()
            .map(PrimitiveDescriptor::bounds)
            .reduce(|acc, bounds| acc.merge(&bounds))
    }

    pub(crate) fn into_primitives(self) -> Vec<PrimitiveDescriptor> {
        self.primitives
    }
}

/// Synthesizes primitives for a laid-out graph.
///
/// # Errors
///
/// Returns [`StaleLayoutError`] when `layout` was computed from a different
/// model than `graph`.
pub fn synthesize(
    graph: &GraphModel,
    layout: &Layout,
    style: &StyleConfig,
) -> Result<Geometry, StaleLayoutError> {
    if layout.token() != graph.token() {
        return Err(StaleLayoutError::ForeignInput {
            expected: graph.token(),
            found: layout.token(),
        });
    }
    info!(token:% = graph.token(); "Synthesizing geometry");

    let mut primitives = Vec::with_capacity(
        graph.groups_count() + graph.components_count() + graph.relationships_count(),
    );

    let group_color = style.group_color().with_alpha(style.group_opacity());
    for volume in layout.groups() {
        let label = graph
            .group(volume.id())
            .map_or_else(|| volume.id().to_string(), |group| group.label().to_string());
        let bounds = volume.bounds();
        primitives.push(PrimitiveDescriptor::Container(ContainerPrimitive {
            id: volume.id(),
            label,
            depth: volume.depth(),
            color: group_color,
            opacity: style.group_opacity(),
            transform: Transform::new(bounds.center(), bounds.to_size()),
        }));
    }

    for component in graph.components() {
        let Some(node) = layout.node(component.id()) else {
            continue;
        };
        let category_style = style.category_style(component.category());
        let dimensions = style.footprint(component.category(), component.weight());
        primitives.push(PrimitiveDescriptor::Shape(ShapePrimitive {
            id: component.id(),
            label: component.label().to_string(),
            shape: category_style.shape(),
            category: component.category(),
            color: category_style.color(),
            transform: Transform::new(node.center(), dimensions),
        }));
    }

    for route in layout.edges() {
        let Some(relationship) = graph.relationship(route.index()) else {
            continue;
        };
        primitives.push(PrimitiveDescriptor::Connector(ConnectorPrimitive {
            index: route.index(),
            source: route.source(),
            target: route.target(),
            style: relationship.kind().into(),
            label: relationship.label().map(str::to_string),
            points: route.points().to_vec(),
            radius: style.connector_radius(),
            color: style.connector_color(),
            self_loop: route.is_self_loop(),
        }));
    }

    debug!(primitives = primitives.len(); "Geometry synthesized");
    Ok(Geometry {
        token: graph.token(),
        primitives,
    })
}
