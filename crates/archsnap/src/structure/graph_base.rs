//! Low-level graph data structures and primitives.
//!
//! This module provides the index-based directed multigraph underneath
//! [`GraphModel`](super::GraphModel). Nodes are stored by [`Id`], edges in a
//! flat `Vec`, and adjacency is kept as per-node lists of [`EdgeIndex`] for
//! both directions. Nothing holds a reference to anything else, so cyclic
//! dependency graphs need no shared ownership.
//!
//! Capabilities:
//! - Node storage in insertion order via `IndexMap`
//! - Tracking of both incoming and outgoing edges per node
//! - Root detection (nodes with no incoming edges)
//! - Self-loops and parallel edges

use std::collections::HashMap;

use indexmap::IndexMap;

use archsnap_core::identifier::Id;

/// Index of an edge in the graph, in insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub struct EdgeIndex(usize);

impl EdgeIndex {
    pub(crate) fn new(index: usize) -> Self {
        EdgeIndex(index)
    }

    /// Position of the edge in insertion order.
    pub fn index(self) -> usize {
        self.0
    }
}

/// A directed edge in the graph.
#[derive(Debug)]
struct Edge<E> {
    source: Id,
    target: Id,
    value: E,
}

/// Core graph data structure.
///
/// The graph is directed and allows self-loops and multiple edges between
/// nodes. Nodes iterate in insertion order, so callers that need a stable
/// order insert nodes sorted.
#[derive(Debug)]
pub(super) struct GraphInternal<N, E> {
    nodes: IndexMap<Id, N>,
    edges: Vec<Edge<E>>,
    incoming_edges: HashMap<Id, Vec<EdgeIndex>>,
    outgoing_edges: HashMap<Id, Vec<EdgeIndex>>,
}

impl<N, E> GraphInternal<N, E>
where
    E: std::fmt::Debug,
{
    /// Creates a new empty graph.
    pub(super) fn new() -> Self {
        GraphInternal {
            nodes: IndexMap::new(),
            edges: Vec::new(),
            incoming_edges: HashMap::new(),
            outgoing_edges: HashMap::new(),
        }
    }

    /// Returns the node data for the given ID, if it exists.
    pub(super) fn node(&self, id: Id) -> Option<&N> {
        self.nodes.get(&id)
    }

    /// Returns an iterator over all node data in insertion order.
    pub(super) fn nodes(&self) -> impl Iterator<Item = &N> {
        self.nodes.values()
    }

    /// Returns an iterator over all node IDs in insertion order.
    pub(super) fn node_ids(&self) -> impl Iterator<Item = Id> + '_ {
        self.nodes.keys().copied()
    }

    /// Returns the total number of nodes in the graph.
    pub(super) fn nodes_count(&self) -> usize {
        self.nodes.len()
    }

    /// Checks if a node with the given ID exists in the graph.
    pub(super) fn contains_node(&self, id: Id) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Returns the edge data for the given index, if it exists.
    pub(super) fn edge(&self, idx: EdgeIndex) -> Option<&E> {
        self.edges.get(idx.0).map(|edge| &edge.value)
    }

    /// Returns the `(source, target)` pair of an edge, if it exists.
    pub(super) fn endpoints(&self, idx: EdgeIndex) -> Option<(Id, Id)> {
        self.edges
            .get(idx.0)
            .map(|edge| (edge.source, edge.target))
    }

    /// Returns an iterator over all edge data in insertion order.
    pub(super) fn edges(&self) -> impl Iterator<Item = &E> {
        self.edges.iter().map(|edge| &edge.value)
    }

    /// Returns the total number of edges in the graph.
    pub(super) fn edges_count(&self) -> usize {
        self.edges.len()
    }

    /// Returns an iterator over root node IDs (nodes with no incoming edges).
    pub(super) fn roots(&self) -> impl Iterator<Item = Id> + '_ {
        self.nodes
            .keys()
            .copied()
            .filter(|node_id| !self.incoming_edges.contains_key(node_id))
    }

    /// Returns the indices of the edges leaving `source_id`, in insertion order.
    pub(super) fn outgoing(&self, source_id: Id) -> impl Iterator<Item = EdgeIndex> + '_ {
        self.outgoing_edges
            .get(&source_id)
            .into_iter()
            .flatten()
            .copied()
    }

    /// Returns the indices of the edges entering `target_id`, in insertion order.
    pub(super) fn incoming(&self, target_id: Id) -> impl Iterator<Item = EdgeIndex> + '_ {
        self.incoming_edges
            .get(&target_id)
            .into_iter()
            .flatten()
            .copied()
    }

    /// Returns the targets of the edges leaving `source_id`, duplicates included.
    pub(super) fn outgoing_nodes(&self, source_id: Id) -> impl Iterator<Item = Id> + '_ {
        self.outgoing(source_id).map(|idx| self.edges[idx.0].target)
    }

    /// Returns the sources of the edges entering `target_id`, duplicates included.
    pub(super) fn incoming_nodes(&self, target_id: Id) -> impl Iterator<Item = Id> + '_ {
        self.incoming(target_id).map(|idx| self.edges[idx.0].source)
    }

    /// Adds a node to the graph with the given ID and data.
    ///
    /// If a node with the same ID already exists, it will be replaced.
    pub(super) fn add_node(&mut self, id: Id, node: N) {
        self.nodes.insert(id, node);
    }

    /// Adds a directed edge to the graph between two nodes.
    ///
    /// # Returns
    /// The index of the newly added edge.
    ///
    /// # Panics
    /// Panics in debug mode if either the source or target node does not exist in the graph.
    /// Callers validate endpoints before inserting; this only catches internal bugs.
    pub(super) fn add_edge(&mut self, source_id: Id, target_id: Id, edge: E) -> EdgeIndex {
        #[cfg(debug_assertions)]
        {
            assert!(
                self.nodes.contains_key(&source_id),
                "Adding edge: Source node {source_id} does not exist for {edge:?}",
            );
            assert!(
                self.nodes.contains_key(&target_id),
                "Adding edge: Target node {target_id} does not exist for {edge:?}",
            );
        }

        let idx = EdgeIndex::new(self.edges.len());
        self.edges.push(Edge {
            source: source_id,
            target: target_id,
            value: edge,
        });
        self.outgoing_edges.entry(source_id).or_default().push(idx);
        self.incoming_edges.entry(target_id).or_default().push(idx);
        idx
    }
}
