//! Edge routing.
//!
//! Routes start and end where the line between the two node centers leaves
//! each box. Edges between nodes of the same layer whose straight segment
//! passes through another node get exactly one waypoint, lifted along +Y until
//! both halves clear every obstruction by the route clearance. Edges joining
//! the same unordered pair fan out horizontally, perpendicular to the pair
//! axis; a fan wider than a node is compressed so every anchor stays on that
//! node's face. Self-loops are four-point loops over the top face of their node,
//! stacked higher for each further loop on the same node.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use log::debug;

use archsnap_core::{
    geometry::{Bounds, Point},
    identifier::Id,
};

use super::{EdgeRoute, NodePlacement};
use crate::{
    config::LayoutConfig,
    structure::{EdgeIndex, GraphModel},
};

/// Extra lift so detours never graze the clearance box.
const ROUTE_EPSILON: f32 = 1e-3;

/// Smallest path fraction used when an obstruction starts at an anchor.
const MIN_APPROACH: f32 = 1e-3;

/// Share of a node's half extent that fanned anchors may spread over.
const FAN_FILL: f32 = 0.9;

fn unordered(a: Id, b: Id) -> (Id, Id) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Point where the ray from `from` towards `to` leaves `bounds`.
///
/// Returns `from` itself when it is not inside the box.
fn exit_point(bounds: &Bounds, from: Point, to: Point) -> Point {
    if !bounds.contains_point(from) {
        return from;
    }
    let direction = to.sub_point(from);
    let axes = [
        (from.x(), direction.x(), bounds.min_x(), bounds.max_x()),
        (from.y(), direction.y(), bounds.min_y(), bounds.max_y()),
        (from.z(), direction.z(), bounds.min_z(), bounds.max_z()),
    ];
    let t = axes
        .into_iter()
        .filter(|&(_, delta, _, _)| delta.abs() > f32::EPSILON)
        .map(|(origin, delta, lo, hi)| {
            if delta > 0.0 {
                (hi - origin) / delta
            } else {
                (lo - origin) / delta
            }
        })
        .fold(1.0f32, f32::min);
    from.add_point(direction.scale(t))
}

/// Horizontal fan-out direction for a pair, from the canonical pair axis.
fn fan_direction(first: Point, second: Point) -> Point {
    let axis = second.sub_point(first);
    Point::new(0.0, 1.0, 0.0)
        .cross(axis)
        .normalize()
        .unwrap_or(Point::new(0.0, 0.0, 1.0))
}

/// Largest offset along `direction` that keeps the node center inside its
/// horizontal footprint.
fn fan_limit(node: &NodePlacement, direction: Point) -> f32 {
    let half = node.size().half_extents();
    [(half.x(), direction.x()), (half.z(), direction.z())]
        .into_iter()
        .filter(|&(_, delta)| delta.abs() > f32::EPSILON)
        .map(|(extent, delta)| extent * FAN_FILL / delta.abs())
        .fold(f32::INFINITY, f32::min)
}

/// Parameter range in which the horizontal projection of `start..end`
/// crosses the X-Z footprint of `bounds`.
fn horizontal_span(bounds: &Bounds, start: Point, end: Point) -> Option<(f32, f32)> {
    let direction = end.sub_point(start);
    let mut enter = 0.0f32;
    let mut exit = 1.0f32;
    for (origin, delta, lo, hi) in [
        (start.x(), direction.x(), bounds.min_x(), bounds.max_x()),
        (start.z(), direction.z(), bounds.min_z(), bounds.max_z()),
    ] {
        if delta.abs() <= f32::EPSILON {
            if origin < lo || origin > hi {
                return None;
            }
            continue;
        }
        let t1 = (lo - origin) / delta;
        let t2 = (hi - origin) / delta;
        enter = enter.max(t1.min(t2));
        exit = exit.min(t1.max(t2));
    }
    (enter <= exit).then_some((enter, exit))
}

/// Single waypoint above the midpoint of `start..end` that lets both halves
/// pass over every obstruction grown by `clearance`.
fn detour_waypoint(start: Point, end: Point, obstructions: &[Bounds], clearance: f32) -> Point {
    let mid = start.midpoint(end);
    let mut height = start.y().max(end.y());
    for obstruction in obstructions {
        let grown = obstruction.add_padding(clearance);
        let top = grown.max_y();
        height = height.max(top);
        let Some((enter, exit)) = horizontal_span(&grown, start, end) else {
            continue;
        };
        // The first half rises linearly from the start anchor to the
        // waypoint, so its lowest point over the obstruction is where it
        // enters the footprint. The second half mirrors this.
        if enter < 0.5 && top > start.y() {
            let approach = enter.max(MIN_APPROACH);
            height = height.max(start.y() + (top - start.y()) * 0.5 / approach);
        }
        if exit > 0.5 && top > end.y() {
            let approach = (1.0 - exit).max(MIN_APPROACH);
            height = height.max(end.y() + (top - end.y()) * 0.5 / approach);
        }
    }
    mid.with_y(height + ROUTE_EPSILON)
}

fn self_loop(node: &NodePlacement, stack: usize, config: &LayoutConfig) -> Vec<Point> {
    let bounds = node.bounds();
    let top = bounds.max_y();
    let lift = top + config.self_loop_height() * (stack + 1) as f32;
    let half = node.size().width() / 4.0;
    let center = node.center();
    vec![
        Point::new(center.x() - half, top, center.z()),
        Point::new(center.x() - half, lift, center.z()),
        Point::new(center.x() + half, lift, center.z()),
        Point::new(center.x() + half, top, center.z()),
    ]
}

/// Routes every relationship, in relationship order.
pub(super) fn route(
    graph: &GraphModel,
    nodes: &IndexMap<Id, NodePlacement>,
    broken: &[EdgeIndex],
    config: &LayoutConfig,
) -> Vec<EdgeRoute> {
    let broken: HashSet<EdgeIndex> = broken.iter().copied().collect();

    let mut fans: HashMap<(Id, Id), Vec<EdgeIndex>> = HashMap::new();
    for relationship in graph.relationships() {
        if !relationship.is_self_loop() {
            fans.entry(unordered(relationship.source(), relationship.target()))
                .or_default()
                .push(relationship.index());
        }
    }

    let mut loops_per_node: HashMap<Id, usize> = HashMap::new();
    let mut routes = Vec::with_capacity(graph.relationships_count());

    for relationship in graph.relationships() {
        let (Some(source), Some(target)) = (
            nodes.get(&relationship.source()),
            nodes.get(&relationship.target()),
        ) else {
            continue;
        };
        let mut route = EdgeRoute {
            index: relationship.index(),
            source: source.id(),
            target: target.id(),
            points: Vec::new(),
            self_loop: relationship.is_self_loop(),
            detoured: false,
            cycle_broken: broken.contains(&relationship.index()),
        };

        if route.self_loop {
            let stack = loops_per_node.entry(source.id()).or_default();
            route.points = self_loop(source, *stack, config);
            *stack += 1;
            routes.push(route);
            continue;
        }

        let pair = unordered(source.id(), target.id());
        let fan = fans.get(&pair).map(Vec::as_slice).unwrap_or_default();
        let slot = fan
            .iter()
            .position(|&index| index == relationship.index())
            .unwrap_or_default();
        let half_fan = (fan.len() as f32 - 1.0) / 2.0;
        let spread = (slot as f32 - half_fan) * config.parallel_edge_spacing();
        let widest = half_fan * config.parallel_edge_spacing();
        let direction = match (nodes.get(&pair.0), nodes.get(&pair.1)) {
            (Some(first), Some(second)) => fan_direction(first.center(), second.center()),
            _ => Point::default(),
        };
        // The whole fan shrinks on a narrow node, so slots keep their order.
        let offset_on = |node: &NodePlacement| {
            let limit = fan_limit(node, direction);
            let fit = if widest > limit { limit / widest } else { 1.0 };
            direction.scale(spread * fit)
        };

        let from = source.center().add_point(offset_on(source));
        let to = target.center().add_point(offset_on(target));
        let start = exit_point(&source.bounds(), from, to);
        let end = exit_point(&target.bounds(), to, from);

        let obstructions: Vec<Bounds> = if source.layer() == target.layer() {
            nodes
                .values()
                .filter(|node| node.id() != source.id() && node.id() != target.id())
                .map(NodePlacement::bounds)
                .filter(|bounds| bounds.intersects_segment(start, end))
                .collect()
        } else {
            Vec::new()
        };

        if obstructions.is_empty() {
            route.points = vec![start, end];
        } else {
            debug!(
                source:% = source.id(),
                target:% = target.id(),
                obstructions = obstructions.len();
                "Routing around obstruction"
            );
            let waypoint =
                detour_waypoint(start, end, &obstructions, config.route_clearance());
            route.points = vec![start, waypoint, end];
            route.detoured = true;
        }
        routes.push(route);
    }

    routes
}
