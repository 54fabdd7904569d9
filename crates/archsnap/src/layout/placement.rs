//! Coarse placement and group volumes.
//!
//! Layers are spaced along X by a constant pitch: the widest node plus the
//! layer spacing. Along Z every container (the implicit root and each group)
//! owns a band. A band holds, in order, the container's own nodes followed by
//! the bands of its child groups, separated by the node spacing. A group band
//! adds the group padding on both sides. Because sibling bands never overlap,
//! neither can the volumes of sibling groups.

use std::collections::{BTreeMap, HashMap};

use indexmap::IndexMap;

use archsnap_core::{
    geometry::{Bounds, Point, Size},
    identifier::Id,
};

use super::{GroupVolume, NodePlacement};
use crate::{config::LayoutConfig, structure::GraphModel};

/// Node centers and band centers produced by coarse placement.
#[derive(Debug, Default)]
pub(super) struct CoarsePlacement {
    centers: HashMap<Id, Point>,
    band_centers: HashMap<Id, f32>,
}

impl CoarsePlacement {
    pub(super) fn center(&self, id: Id) -> Point {
        self.centers.get(&id).copied().unwrap_or_default()
    }

    /// Z coordinate of a group's band center.
    pub(super) fn band_center(&self, group: Id) -> f32 {
        self.band_centers.get(&group).copied().unwrap_or_default()
    }
}

/// Places every node; `None` denotes the root container.
struct Placer<'a> {
    graph: &'a GraphModel,
    layers: &'a HashMap<Id, usize>,
    sizes: &'a HashMap<Id, Size>,
    pitch: f32,
    spacing: f32,
    padding: f32,
    widths: HashMap<Option<Id>, f32>,
    result: CoarsePlacement,
}

impl Placer<'_> {
    fn direct_nodes(&self, container: Option<Id>) -> Vec<Id> {
        match container {
            Some(group) => self.graph.members(group).to_vec(),
            None => self
                .graph
                .components()
                .filter(|component| component.group().is_none())
                .map(|component| component.id())
                .collect(),
        }
    }

    fn child_groups(&self, container: Option<Id>) -> Vec<Id> {
        match container {
            Some(group) => self
                .graph
                .group(group)
                .map(|group| group.children().to_vec())
                .unwrap_or_default(),
            None => self.graph.root_groups().map(|group| group.id()).collect(),
        }
    }

    fn depth_of(&self, id: Id) -> f32 {
        self.sizes.get(&id).map_or(0.0, |size| size.depth())
    }

    /// Direct nodes bucketed by layer, each bucket in identifier order.
    fn by_layer(&self, nodes: &[Id]) -> BTreeMap<usize, Vec<Id>> {
        let mut buckets: BTreeMap<usize, Vec<Id>> = BTreeMap::new();
        for &node in nodes {
            let layer = self.layers.get(&node).copied().unwrap_or_default();
            buckets.entry(layer).or_default().push(node);
        }
        buckets
    }

    fn stack_depth(&self, nodes: &[Id]) -> f32 {
        let total: f32 = nodes.iter().map(|&id| self.depth_of(id)).sum();
        total + self.spacing * nodes.len().saturating_sub(1) as f32
    }

    fn loose_width(&self, nodes: &[Id]) -> f32 {
        self.by_layer(nodes)
            .values()
            .map(|bucket| self.stack_depth(bucket))
            .fold(0.0, f32::max)
    }

    fn band_width(&mut self, container: Option<Id>) -> f32 {
        if let Some(&width) = self.widths.get(&container) {
            return width;
        }

        let nodes = self.direct_nodes(container);
        let mut parts = Vec::new();
        if !nodes.is_empty() {
            parts.push(self.loose_width(&nodes));
        }
        for child in self.child_groups(container) {
            parts.push(self.band_width(Some(child)));
        }

        let content =
            parts.iter().sum::<f32>() + self.spacing * parts.len().saturating_sub(1) as f32;
        let width = match container {
            Some(_) => content + 2.0 * self.padding,
            None => content,
        };
        self.widths.insert(container, width);
        width
    }

    fn assign(&mut self, container: Option<Id>, z_min: f32) {
        let width = self.band_width(container);
        let mut cursor = z_min;
        if let Some(group) = container {
            self.result.band_centers.insert(group, z_min + width / 2.0);
            cursor += self.padding;
        }

        let nodes = self.direct_nodes(container);
        if !nodes.is_empty() {
            let loose = self.loose_width(&nodes);
            let region_center = cursor + loose / 2.0;
            for (layer, bucket) in self.by_layer(&nodes) {
                let mut z = region_center - self.stack_depth(&bucket) / 2.0;
                for id in bucket {
                    let size = self.sizes.get(&id).copied().unwrap_or_default();
                    let center = Point::new(
                        layer as f32 * self.pitch,
                        size.height() / 2.0,
                        z + size.depth() / 2.0,
                    );
                    self.result.centers.insert(id, center);
                    z += size.depth() + self.spacing;
                }
            }
            cursor += loose + self.spacing;
        }

        for child in self.child_groups(container) {
            let child_width = self.band_width(Some(child));
            self.assign(Some(child), cursor);
            cursor += child_width + self.spacing;
        }
    }
}

/// Coarse, overlap-free placement of every node.
pub(super) fn place(
    graph: &GraphModel,
    layers: &HashMap<Id, usize>,
    sizes: &HashMap<Id, Size>,
    config: &LayoutConfig,
) -> CoarsePlacement {
    let widest = sizes.values().map(|size| size.width()).fold(0.0, f32::max);
    let mut placer = Placer {
        graph,
        layers,
        sizes,
        pitch: widest + config.layer_spacing(),
        spacing: config.node_spacing(),
        padding: config.group_padding(),
        widths: HashMap::new(),
        result: CoarsePlacement::default(),
    };

    let total = placer.band_width(None);
    placer.assign(None, -total / 2.0);
    placer.result
}

/// Group volumes from the final node boxes.
///
/// Each volume is the union of its member boxes and child volumes, grown by
/// `padding`. A group with no content is a padding-sized cube on the ground
/// at its band center.
pub(super) fn group_volumes(
    graph: &GraphModel,
    nodes: &IndexMap<Id, NodePlacement>,
    coarse: &CoarsePlacement,
    padding: f32,
) -> IndexMap<Id, GroupVolume> {
    fn volume(
        group: Id,
        graph: &GraphModel,
        nodes: &IndexMap<Id, NodePlacement>,
        coarse: &CoarsePlacement,
        padding: f32,
        memo: &mut HashMap<Id, Bounds>,
    ) -> Bounds {
        if let Some(&bounds) = memo.get(&group) {
            return bounds;
        }
        let members = graph
            .members(group)
            .iter()
            .filter_map(|id| nodes.get(id))
            .map(NodePlacement::bounds)
            .collect::<Vec<_>>();
        let children = graph
            .group(group)
            .map(|group| group.children().to_vec())
            .unwrap_or_default()
            .into_iter()
            .map(|child| volume(child, graph, nodes, coarse, padding, memo))
            .collect::<Vec<_>>();

        let content = members
            .into_iter()
            .chain(children)
            .reduce(|acc, bounds| acc.merge(&bounds))
            .unwrap_or_else(|| {
                Point::new(0.0, 0.0, coarse.band_center(group)).to_bounds(Size::default())
            });
        let bounds = content.add_padding(padding);
        memo.insert(group, bounds);
        bounds
    }

    let mut memo = HashMap::new();
    graph
        .groups()
        .map(|group| {
            let id = group.id();
            let bounds = volume(id, graph, nodes, coarse, padding, &mut memo);
            let depth = ancestry_depth(graph, id);
            (id, GroupVolume { id, bounds, depth })
        })
        .collect()
}

fn ancestry_depth(graph: &GraphModel, group: Id) -> usize {
    let mut depth = 0;
    let mut current = graph.group(group).and_then(|group| group.parent());
    while let Some(parent) = current {
        depth += 1;
        current = graph.group(parent).and_then(|group| group.parent());
    }
    depth
}

#[cfg(test)]
mod tests {
    use archsnap_core::semantic::{ComponentSpec, GroupSpec};

    use super::*;

    fn placement_of(
        components: &[ComponentSpec],
        groups: &[GroupSpec],
    ) -> (GraphModel, IndexMap<Id, NodePlacement>, CoarsePlacement) {
        let graph = GraphModel::build(components, groups, &[]).unwrap();
        let config = LayoutConfig::default();
        let layers: HashMap<Id, usize> = graph.components().map(|c| (c.id(), 0)).collect();
        let sizes: HashMap<Id, Size> = graph
            .components()
            .map(|c| (c.id(), Size::uniform(1.0)))
            .collect();
        let coarse = place(&graph, &layers, &sizes, &config);
        let nodes = graph
            .components()
            .map(|c| {
                let placement = NodePlacement::new(c.id(), 0, coarse.center(c.id()), sizes[&c.id()]);
                (c.id(), placement)
            })
            .collect();
        (graph, nodes, coarse)
    }

    #[test]
    fn test_layer_is_spread_in_id_order() {
        let (_, nodes, _) = placement_of(
            &[
                ComponentSpec::new("pl_c", "service"),
                ComponentSpec::new("pl_a", "service"),
                ComponentSpec::new("pl_b", "service"),
            ],
            &[],
        );
        let z = |id: &str| nodes[&Id::new(id)].center().z();

        assert!(z("pl_a") < z("pl_b"));
        assert!(z("pl_b") < z("pl_c"));
        // Unit boxes with the default spacing of 2.0, centered on z = 0.
        assert!((z("pl_b")).abs() < 1e-5);
        assert!((z("pl_c") - z("pl_a") - 6.0).abs() < 1e-5);
    }

    #[test]
    fn test_sibling_groups_do_not_overlap() {
        let (graph, nodes, coarse) = placement_of(
            &[
                ComponentSpec::new("pl_left1", "service").in_group("pl_left"),
                ComponentSpec::new("pl_left2", "service").in_group("pl_left"),
                ComponentSpec::new("pl_right1", "service").in_group("pl_right"),
                ComponentSpec::new("pl_loose", "service"),
            ],
            &[GroupSpec::new("pl_left"), GroupSpec::new("pl_right")],
        );
        let volumes = group_volumes(&graph, &nodes, &coarse, 0.75);
        let left = volumes[&Id::new("pl_left")].bounds();
        let right = volumes[&Id::new("pl_right")].bounds();

        assert!(!left.intersects(&right));
        assert!(!left.contains_point(nodes[&Id::new("pl_loose")].center()));
        assert!(!right.contains_point(nodes[&Id::new("pl_loose")].center()));
    }

    #[test]
    fn test_group_volume_strictly_contains_members() {
        let (graph, nodes, coarse) = placement_of(
            &[
                ComponentSpec::new("pl_in1", "service").in_group("pl_inner"),
                ComponentSpec::new("pl_out1", "service").in_group("pl_outer"),
            ],
            &[
                GroupSpec::new("pl_outer"),
                GroupSpec::new("pl_inner").with_parent("pl_outer"),
            ],
        );
        let volumes = group_volumes(&graph, &nodes, &coarse, 0.75);
        let outer = &volumes[&Id::new("pl_outer")];
        let inner = &volumes[&Id::new("pl_inner")];

        assert_eq!(outer.depth(), 0);
        assert_eq!(inner.depth(), 1);
        assert!(outer.bounds().strictly_contains(&inner.bounds()));
        assert!(inner.bounds().strictly_contains(&nodes[&Id::new("pl_in1")].bounds()));
        assert!(outer.bounds().strictly_contains(&nodes[&Id::new("pl_out1")].bounds()));
        assert!(!inner.bounds().intersects(&nodes[&Id::new("pl_out1")].bounds()));
    }

    #[test]
    fn test_empty_group_gets_a_volume() {
        let (graph, nodes, coarse) = placement_of(
            &[ComponentSpec::new("pl_solo", "service")],
            &[GroupSpec::new("pl_empty")],
        );
        let volumes = group_volumes(&graph, &nodes, &coarse, 0.5);
        let empty = volumes[&Id::new("pl_empty")].bounds();

        assert_eq!(empty.to_size(), Size::uniform(1.0));
        assert!(!empty.intersects(&nodes[&Id::new("pl_solo")].bounds()));
    }
}
