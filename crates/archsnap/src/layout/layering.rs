//! Cycle breaking and layer assignment.
//!
//! Layers are assigned by longest path over an acyclic version of the
//! relationship graph. Cycles are broken one edge at a time: among the edges
//! internal to a strongly connected component, the edge whose source has the
//! highest out-degree is dropped from the layering graph. Ties go to the
//! smallest source identifier, then the smallest target identifier, then the
//! smallest edge index. Dropped edges remain relationships; they are still
//! routed, they just do not constrain layers.

use std::{
    cmp::Reverse,
    collections::{BTreeSet, HashMap, HashSet},
};

use log::debug;
use petgraph::{
    algo::tarjan_scc,
    graph::{DiGraph, NodeIndex},
};

use archsnap_core::identifier::Id;

use crate::structure::{Component, EdgeIndex, GraphModel};

/// Edge of the layering graph, as positions into the sorted node list.
#[derive(Debug, Clone, Copy)]
struct LayerEdge {
    source: usize,
    target: usize,
    index: EdgeIndex,
}

/// Returns the edges removed to make the layering graph acyclic, in removal order.
pub(super) fn break_cycles(graph: &GraphModel) -> Vec<EdgeIndex> {
    let nodes: Vec<Id> = graph.components().map(Component::id).collect();
    let position: HashMap<Id, usize> = nodes.iter().enumerate().map(|(i, &id)| (id, i)).collect();
    let out_degree: Vec<usize> = nodes.iter().map(|&id| graph.out_degree(id)).collect();

    let mut active: Vec<LayerEdge> = graph
        .relationships()
        .filter(|relationship| !relationship.is_self_loop())
        .filter_map(|relationship| {
            Some(LayerEdge {
                source: *position.get(&relationship.source())?,
                target: *position.get(&relationship.target())?,
                index: relationship.index(),
            })
        })
        .collect();

    let mut broken = Vec::new();
    loop {
        let component = strongly_connected(nodes.len(), &active);
        // Node positions follow identifier order, so comparing positions
        // compares identifiers.
        let candidate = active
            .iter()
            .enumerate()
            .filter(|(_, edge)| component[edge.source] == component[edge.target])
            .min_by_key(|(_, edge)| {
                (
                    Reverse(out_degree[edge.source]),
                    edge.source,
                    edge.target,
                    edge.index,
                )
            })
            .map(|(slot, _)| slot);

        let Some(slot) = candidate else {
            break;
        };
        let edge = active.remove(slot);
        debug!(
            source:% = nodes[edge.source],
            target:% = nodes[edge.target],
            edge = edge.index.index();
            "Breaking cycle"
        );
        broken.push(edge.index);
    }

    broken
}

/// Labels every node with the strongly connected component it belongs to.
fn strongly_connected(count: usize, edges: &[LayerEdge]) -> Vec<usize> {
    let mut layering: DiGraph<(), ()> = DiGraph::with_capacity(count, edges.len());
    for _ in 0..count {
        layering.add_node(());
    }
    for edge in edges {
        layering.add_edge(NodeIndex::new(edge.source), NodeIndex::new(edge.target), ());
    }

    let mut component = vec![0; count];
    for (label, members) in tarjan_scc(&layering).into_iter().enumerate() {
        for node in members {
            component[node.index()] = label;
        }
    }
    component
}

/// Longest-path layer of every component over the acyclic remainder.
///
/// Sources sit in layer 0. The frontier is processed in identifier order.
pub(super) fn assign_layers(graph: &GraphModel, broken: &[EdgeIndex]) -> HashMap<Id, usize> {
    let broken: HashSet<EdgeIndex> = broken.iter().copied().collect();
    let layering_edges = || {
        graph
            .relationships()
            .filter(|relationship| !relationship.is_self_loop())
            .filter(|relationship| !broken.contains(&relationship.index()))
    };

    let mut indegree: HashMap<Id, usize> =
        graph.components().map(|component| (component.id(), 0)).collect();
    for relationship in layering_edges() {
        *indegree.entry(relationship.target()).or_default() += 1;
    }

    let mut layers: HashMap<Id, usize> =
        graph.components().map(|component| (component.id(), 0)).collect();
    let mut frontier: BTreeSet<Id> = indegree
        .iter()
        .filter(|&(_, &degree)| degree == 0)
        .map(|(&id, _)| id)
        .collect();

    while let Some(node) = frontier.pop_first() {
        let layer = layers.get(&node).copied().unwrap_or_default();
        for relationship in graph.outgoing(node) {
            if relationship.is_self_loop() || broken.contains(&relationship.index()) {
                continue;
            }
            let target = relationship.target();
            let entry = layers.entry(target).or_default();
            *entry = (*entry).max(layer + 1);
            if let Some(degree) = indegree.get_mut(&target) {
                *degree -= 1;
                if *degree == 0 {
                    frontier.insert(target);
                }
            }
        }
    }

    layers
}

#[cfg(test)]
mod tests {
    use archsnap_core::semantic::{ComponentSpec, RelationshipSpec};

    use super::*;

    fn model(nodes: &[&str], edges: &[(&str, &str)]) -> GraphModel {
        let components: Vec<ComponentSpec> = nodes
            .iter()
            .map(|id| ComponentSpec::new(*id, "service"))
            .collect();
        let relationships: Vec<RelationshipSpec> = edges
            .iter()
            .map(|(s, t)| RelationshipSpec::new(*s, *t, "sync-call"))
            .collect();
        GraphModel::build(&components, &[], &relationships).unwrap()
    }

    fn layer(layers: &HashMap<Id, usize>, id: &str) -> usize {
        layers[&Id::new(id)]
    }

    #[test]
    fn test_acyclic_graph_breaks_nothing() {
        let graph = model(&["ly_a", "ly_b", "ly_c"], &[("ly_a", "ly_b"), ("ly_b", "ly_c")]);
        assert!(break_cycles(&graph).is_empty());
    }

    #[test]
    fn test_two_cycle_breaks_smallest_source() {
        let graph = model(&["ly2_a", "ly2_b"], &[("ly2_a", "ly2_b"), ("ly2_b", "ly2_a")]);
        let broken = break_cycles(&graph);
        assert_eq!(broken, [EdgeIndex::new(0)]);

        let layers = assign_layers(&graph, &broken);
        assert_eq!(layer(&layers, "ly2_b"), 0);
        assert_eq!(layer(&layers, "ly2_a"), 1);
    }

    #[test]
    fn test_highest_out_degree_wins() {
        let graph = model(
            &["ly3_hub", "ly3_x", "ly3_y"],
            &[("ly3_x", "ly3_hub"), ("ly3_hub", "ly3_x"), ("ly3_hub", "ly3_y")],
        );
        let broken = break_cycles(&graph);
        assert_eq!(broken, [EdgeIndex::new(1)]);

        let layers = assign_layers(&graph, &broken);
        assert_eq!(layer(&layers, "ly3_x"), 0);
        assert_eq!(layer(&layers, "ly3_hub"), 1);
        assert_eq!(layer(&layers, "ly3_y"), 2);
    }

    #[test]
    fn test_nested_cycles_fully_broken() {
        let graph = model(
            &["ly4_a", "ly4_b", "ly4_c"],
            &[
                ("ly4_a", "ly4_b"),
                ("ly4_b", "ly4_c"),
                ("ly4_c", "ly4_a"),
                ("ly4_b", "ly4_a"),
            ],
        );
        let broken = break_cycles(&graph);
        assert!(!broken.is_empty());

        let layers = assign_layers(&graph, &broken);
        let broken: HashSet<EdgeIndex> = broken.into_iter().collect();
        for relationship in graph.relationships() {
            if broken.contains(&relationship.index()) {
                continue;
            }
            let source = layers[&relationship.source()];
            let target = layers[&relationship.target()];
            assert!(source < target, "{relationship:?} is not forward");
        }
    }

    #[test]
    fn test_strongly_connected_labels() {
        let edge = |source, target| LayerEdge {
            source,
            target,
            index: EdgeIndex::new(0),
        };
        // 0 <-> 1 and 3 -> 4 -> 3, joined through 2.
        let edges = [edge(0, 1), edge(1, 0), edge(1, 2), edge(2, 3), edge(3, 4), edge(4, 3)];
        let component = strongly_connected(5, &edges);

        assert_eq!(component[0], component[1]);
        assert_eq!(component[3], component[4]);
        assert_ne!(component[0], component[2]);
        assert_ne!(component[2], component[3]);
        assert_ne!(component[0], component[3]);
    }

    #[test]
    fn test_self_loops_do_not_affect_layers() {
        let graph = model(&["ly5_a", "ly5_b"], &[("ly5_a", "ly5_a"), ("ly5_a", "ly5_b")]);
        assert!(break_cycles(&graph).is_empty());

        let layers = assign_layers(&graph, &[]);
        assert_eq!(layer(&layers, "ly5_a"), 0);
        assert_eq!(layer(&layers, "ly5_b"), 1);
    }

    #[test]
    fn test_longest_path_layering() {
        let graph = model(
            &["ly6_a", "ly6_b", "ly6_c", "ly6_d"],
            &[
                ("ly6_a", "ly6_b"),
                ("ly6_b", "ly6_c"),
                ("ly6_a", "ly6_c"),
                ("ly6_d", "ly6_c"),
            ],
        );
        let layers = assign_layers(&graph, &[]);
        assert_eq!(layer(&layers, "ly6_a"), 0);
        assert_eq!(layer(&layers, "ly6_d"), 0);
        assert_eq!(layer(&layers, "ly6_b"), 1);
        assert_eq!(layer(&layers, "ly6_c"), 2);
    }
}
