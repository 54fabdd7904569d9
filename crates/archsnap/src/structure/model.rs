//! The validated, immutable graph model.
//!
//! [`GraphModel::build`] turns raw architecture records into an indexed
//! model or rejects them with a [`ValidationError`]. The model performs no
//! geometric computation: it owns identity, validation invariants, and the
//! adjacency and membership indices the layout stage traverses.
//!
//! Every traversal that returns several identifiers returns them sorted by
//! identifier text so downstream stages never depend on insertion order.

use std::{
    collections::{BTreeSet, HashMap, HashSet},
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

use indexmap::IndexMap;
use log::{debug, trace};
use thiserror::Error;

use archsnap_core::{
    identifier::Id,
    semantic::{Category, ComponentSpec, GroupSpec, RelationKind, RelationshipSpec, UnknownTag},
};

use super::graph_base::{EdgeIndex, GraphInternal};

/// Structural problems in the input graph.
///
/// Every variant names the offending identifier(s).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("duplicate identifier `{id}`")]
    DuplicateId { id: String },

    #[error("relationship `{from}` -> `{to}` references unknown component `{missing}`")]
    UnknownEndpoint {
        from: String,
        to: String,
        missing: String,
    },

    #[error("group containment cycle: {}", path.join(" -> "))]
    GroupCycle { path: Vec<String> },

    #[error("`{owner}` uses an {tag}")]
    UnknownTag {
        owner: String,
        #[source]
        tag: UnknownTag,
    },

    #[error("`{owner}` references unknown {kind} `{reference}`")]
    UnknownReference {
        owner: String,
        kind: &'static str,
        reference: String,
    },

    #[error("component `{component}` is claimed by both group `{first}` and group `{second}`")]
    ConflictingMembership {
        component: String,
        first: String,
        second: String,
    },

    #[error("component `{id}` has a weight that is not a number")]
    InvalidWeight { id: String },
}

static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

/// Identity of one graph model instance.
///
/// Every stage output carries the token of the model it was derived from so
/// the scene assembler can reject inputs that belong to a different run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModelToken(u64);

impl ModelToken {
    fn next() -> Self {
        Self(NEXT_TOKEN.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ModelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "model#{}", self.0)
    }
}

/// A validated component.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    id: Id,
    label: String,
    category: Category,
    weight: Option<f32>,
    group: Option<Id>,
}

impl Component {
    pub fn id(&self) -> Id {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn weight(&self) -> Option<f32> {
        self.weight
    }

    /// The group directly containing this component.
    pub fn group(&self) -> Option<Id> {
        self.group
    }
}

/// A validated relationship.
#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    index: EdgeIndex,
    source: Id,
    target: Id,
    kind: RelationKind,
    label: Option<String>,
}

impl Relationship {
    /// Position of the relationship in input order.
    pub fn index(&self) -> EdgeIndex {
        self.index
    }

    pub fn source(&self) -> Id {
        self.source
    }

    pub fn target(&self) -> Id {
        self.target
    }

    pub fn kind(&self) -> RelationKind {
        self.kind
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Self-loops are legal but routed differently from every other edge.
    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

/// A validated group.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    id: Id,
    label: String,
    parent: Option<Id>,
    children: Vec<Id>,
    members: Vec<Id>,
}

impl Group {
    pub fn id(&self) -> Id {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// The enclosing group, if nested.
    pub fn parent(&self) -> Option<Id> {
        self.parent
    }

    /// Directly nested groups, sorted.
    pub fn children(&self) -> &[Id] {
        &self.children
    }

    /// Components contained directly in this group, sorted.
    pub fn members(&self) -> &[Id] {
        &self.members
    }
}

/// Immutable representation of components, groups and relationships.
#[derive(Debug)]
pub struct GraphModel {
    token: ModelToken,
    graph: GraphInternal<Component, Relationship>,
    groups: IndexMap<Id, Group>,
    depths: HashMap<Id, usize>,
}

impl GraphModel {
    /// Validates and indexes raw architecture records.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found, checking components,
    /// then groups, then relationships.
    pub fn build(
        components: &[ComponentSpec],
        groups: &[GroupSpec],
        relationships: &[RelationshipSpec],
    ) -> Result<Self, ValidationError> {
        debug!(
            components = components.len(),
            groups = groups.len(),
            relationships = relationships.len();
            "Building graph model"
        );

        let mut known_ids = HashSet::new();

        let mut validated = Vec::with_capacity(components.len());
        for spec in components {
            let id = Id::new(&spec.id);
            if !known_ids.insert(id) {
                return Err(ValidationError::DuplicateId {
                    id: spec.id.clone(),
                });
            }
            let category = spec
                .category
                .parse::<Category>()
                .map_err(|tag| ValidationError::UnknownTag {
                    owner: spec.id.clone(),
                    tag,
                })?;
            if spec.weight.is_some_and(f32::is_nan) {
                return Err(ValidationError::InvalidWeight {
                    id: spec.id.clone(),
                });
            }
            validated.push(Component {
                id,
                label: spec.label.clone().unwrap_or_else(|| spec.id.clone()),
                category,
                weight: spec.weight,
                group: None,
            });
        }
        let component_ids: HashSet<Id> = validated.iter().map(Component::id).collect();

        let mut group_specs: IndexMap<Id, &GroupSpec> = IndexMap::new();
        for spec in groups {
            let id = Id::new(&spec.id);
            if !known_ids.insert(id) {
                return Err(ValidationError::DuplicateId {
                    id: spec.id.clone(),
                });
            }
            group_specs.insert(id, spec);
        }

        let membership = Self::resolve_membership(components, &group_specs, &component_ids)?;
        Self::check_group_forest(&group_specs)?;

        for component in &mut validated {
            component.group = membership.get(&component.id).copied();
        }
        validated.sort_by(|a, b| a.id.cmp(&b.id));

        let mut graph = GraphInternal::new();
        for component in validated {
            graph.add_node(component.id, component);
        }

        for spec in relationships {
            let kind = spec
                .kind
                .parse::<RelationKind>()
                .map_err(|tag| ValidationError::UnknownTag {
                    owner: format!("{} -> {}", spec.source, spec.target),
                    tag,
                })?;
            let source = Id::new(&spec.source);
            let target = Id::new(&spec.target);
            for (endpoint, name) in [(source, &spec.source), (target, &spec.target)] {
                if !graph.contains_node(endpoint) {
                    return Err(ValidationError::UnknownEndpoint {
                        from: spec.source.clone(),
                        to: spec.target.clone(),
                        missing: name.clone(),
                    });
                }
            }
            let index = EdgeIndex::new(graph.edges_count());
            graph.add_edge(
                source,
                target,
                Relationship {
                    index,
                    source,
                    target,
                    kind,
                    label: spec.label.clone(),
                },
            );
        }

        let groups = Self::index_groups(&group_specs, &membership);
        let depths = Self::estimate_depths(&graph);

        let model = Self {
            token: ModelToken::next(),
            graph,
            groups,
            depths,
        };
        debug!(token:% = model.token; "Graph model built");
        trace!(model:?; "Graph model");
        Ok(model)
    }

    /// Maps each grouped component to its group, rejecting dangling
    /// references and components claimed by two groups.
    fn resolve_membership(
        components: &[ComponentSpec],
        group_specs: &IndexMap<Id, &GroupSpec>,
        component_ids: &HashSet<Id>,
    ) -> Result<HashMap<Id, Id>, ValidationError> {
        let mut membership: HashMap<Id, Id> = HashMap::new();
        let mut claim = |component: Id, group: Id| -> Result<(), ValidationError> {
            match membership.get(&component) {
                Some(&existing) if existing != group => {
                    let (first, second) = if existing < group {
                        (existing, group)
                    } else {
                        (group, existing)
                    };
                    Err(ValidationError::ConflictingMembership {
                        component: component.to_string(),
                        first: first.to_string(),
                        second: second.to_string(),
                    })
                }
                _ => {
                    membership.insert(component, group);
                    Ok(())
                }
            }
        };

        for (&group_id, spec) in group_specs {
            if let Some(parent) = &spec.parent {
                if !group_specs.contains_key(&Id::new(parent)) {
                    return Err(ValidationError::UnknownReference {
                        owner: spec.id.clone(),
                        kind: "group",
                        reference: parent.clone(),
                    });
                }
            }
            for member in &spec.members {
                let member_id = Id::new(member);
                if !component_ids.contains(&member_id) {
                    return Err(ValidationError::UnknownReference {
                        owner: spec.id.clone(),
                        kind: "component",
                        reference: member.clone(),
                    });
                }
                claim(member_id, group_id)?;
            }
        }

        for spec in components {
            let Some(group) = &spec.group else {
                continue;
            };
            let group_id = Id::new(group);
            if !group_specs.contains_key(&group_id) {
                return Err(ValidationError::UnknownReference {
                    owner: spec.id.clone(),
                    kind: "group",
                    reference: group.clone(),
                });
            }
            claim(Id::new(&spec.id), group_id)?;
        }

        Ok(membership)
    }

    /// Rejects direct or transitive group self-containment.
    fn check_group_forest(group_specs: &IndexMap<Id, &GroupSpec>) -> Result<(), ValidationError> {
        let mut cleared: HashSet<Id> = HashSet::new();
        let mut starts: Vec<Id> = group_specs.keys().copied().collect();
        starts.sort();

        for start in starts {
            let mut path: Vec<Id> = Vec::new();
            let mut current = Some(start);
            while let Some(group) = current {
                if cleared.contains(&group) {
                    break;
                }
                if let Some(pos) = path.iter().position(|&seen| seen == group) {
                    let mut cycle: Vec<String> =
                        path[pos..].iter().map(|id| id.to_string()).collect();
                    cycle.push(group.to_string());
                    return Err(ValidationError::GroupCycle { path: cycle });
                }
                path.push(group);
                current = group_specs
                    .get(&group)
                    .and_then(|spec| spec.parent.as_deref())
                    .map(Id::new);
            }
            cleared.extend(path);
        }

        Ok(())
    }

    fn index_groups(
        group_specs: &IndexMap<Id, &GroupSpec>,
        membership: &HashMap<Id, Id>,
    ) -> IndexMap<Id, Group> {
        let mut ids: Vec<Id> = group_specs.keys().copied().collect();
        ids.sort();

        let mut groups: IndexMap<Id, Group> = ids
            .iter()
            .map(|&id| {
                let spec = group_specs[&id];
                let group = Group {
                    id,
                    label: spec.label.clone().unwrap_or_else(|| spec.id.clone()),
                    parent: spec.parent.as_deref().map(Id::new),
                    children: Vec::new(),
                    members: Vec::new(),
                };
                (id, group)
            })
            .collect();

        for &id in &ids {
            let Some(parent) = groups[&id].parent else {
                continue;
            };
            if let Some(parent_group) = groups.get_mut(&parent) {
                parent_group.children.push(id);
            }
        }
        for (&component, &group) in membership {
            if let Some(group) = groups.get_mut(&group) {
                group.members.push(component);
            }
        }
        for group in groups.values_mut() {
            group.children.sort();
            group.members.sort();
        }

        groups
    }

    /// Longest-path depth over the graph with DFS back edges ignored.
    ///
    /// Traversal starts from roots, then from any node not yet reached, both
    /// in identifier order, so the result is reproducible on cyclic graphs.
    fn estimate_depths(graph: &GraphInternal<Component, Relationship>) -> HashMap<Id, usize> {
        let roots: Vec<Id> = graph.roots().collect();
        let starts = roots.iter().copied().chain(graph.node_ids());

        let mut state: HashMap<Id, bool> = HashMap::new(); // true = on stack
        let mut back_edges: HashSet<EdgeIndex> = HashSet::new();

        for start in starts {
            if state.contains_key(&start) {
                continue;
            }
            let mut stack: Vec<(Id, Vec<EdgeIndex>)> = Vec::new();
            state.insert(start, true);
            stack.push((start, sorted_outgoing(graph, start)));
            while let Some((node, pending)) = stack.last_mut() {
                let node = *node;
                let Some(edge) = pending.pop() else {
                    state.insert(node, false);
                    stack.pop();
                    continue;
                };
                let Some((_, target)) = graph.endpoints(edge) else {
                    continue;
                };
                match state.get(&target) {
                    Some(true) => {
                        back_edges.insert(edge);
                    }
                    Some(false) => {}
                    None => {
                        state.insert(target, true);
                        stack.push((target, sorted_outgoing(graph, target)));
                    }
                }
            }
        }

        let mut indegree: HashMap<Id, usize> = graph.node_ids().map(|id| (id, 0)).collect();
        for relationship in graph.edges() {
            if !back_edges.contains(&relationship.index) {
                *indegree.entry(relationship.target).or_default() += 1;
            }
        }

        let mut depths: HashMap<Id, usize> = graph.node_ids().map(|id| (id, 0)).collect();
        let mut frontier: BTreeSet<Id> = indegree
            .iter()
            .filter(|&(_, &degree)| degree == 0)
            .map(|(&id, _)| id)
            .collect();
        while let Some(node) = frontier.pop_first() {
            let depth = depths[&node];
            for edge in graph.outgoing(node) {
                if back_edges.contains(&edge) {
                    continue;
                }
                let Some((_, target)) = graph.endpoints(edge) else {
                    continue;
                };
                let entry = depths.entry(target).or_default();
                *entry = (*entry).max(depth + 1);
                if let Some(degree) = indegree.get_mut(&target) {
                    *degree -= 1;
                    if *degree == 0 {
                        frontier.insert(target);
                    }
                }
            }
        }

        depths
    }

    /// Identity of this model instance.
    pub fn token(&self) -> ModelToken {
        self.token
    }

    /// Components in identifier order.
    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.graph.nodes()
    }

    pub fn component(&self, id: Id) -> Option<&Component> {
        self.graph.node(id)
    }

    pub fn components_count(&self) -> usize {
        self.graph.nodes_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.nodes_count() == 0
    }

    /// Relationships in input order.
    pub fn relationships(&self) -> impl Iterator<Item = &Relationship> {
        self.graph.edges()
    }

    pub fn relationship(&self, index: EdgeIndex) -> Option<&Relationship> {
        self.graph.edge(index)
    }

    pub fn relationships_count(&self) -> usize {
        self.graph.edges_count()
    }

    /// Relationships leaving `id`, in input order.
    pub fn outgoing(&self, id: Id) -> impl Iterator<Item = &Relationship> {
        self.graph
            .outgoing(id)
            .filter_map(|idx| self.graph.edge(idx))
    }

    /// Relationships entering `id`, in input order.
    pub fn incoming(&self, id: Id) -> impl Iterator<Item = &Relationship> {
        self.graph
            .incoming(id)
            .filter_map(|idx| self.graph.edge(idx))
    }

    /// Distinct targets of `id`'s outgoing relationships, sorted.
    pub fn successors(&self, id: Id) -> Vec<Id> {
        sorted_unique(self.graph.outgoing_nodes(id))
    }

    /// Distinct sources of `id`'s incoming relationships, sorted.
    pub fn predecessors(&self, id: Id) -> Vec<Id> {
        sorted_unique(self.graph.incoming_nodes(id))
    }

    /// Distinct components adjacent to `id` in either direction, sorted.
    ///
    /// A self-loop does not make a component its own neighbor.
    pub fn neighbors(&self, id: Id) -> Vec<Id> {
        sorted_unique(
            self.graph
                .outgoing_nodes(id)
                .chain(self.graph.incoming_nodes(id))
                .filter(|&other| other != id),
        )
    }

    /// Number of outgoing relationships, self-loops excluded.
    pub fn out_degree(&self, id: Id) -> usize {
        self.outgoing(id)
            .filter(|relationship| !relationship.is_self_loop())
            .count()
    }

    /// Components without incoming relationships (self-loops ignored), sorted.
    pub fn roots(&self) -> Vec<Id> {
        self.graph
            .node_ids()
            .filter(|&id| self.incoming(id).all(Relationship::is_self_loop))
            .collect()
    }

    /// Topological depth estimate of a component.
    ///
    /// This is a layout hint, not a guarantee: on cyclic graphs the value
    /// depends on which edges the traversal classified as back edges.
    pub fn depth_estimate(&self, id: Id) -> Option<usize> {
        self.depths.get(&id).copied()
    }

    /// Groups in identifier order.
    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.values()
    }

    pub fn group(&self, id: Id) -> Option<&Group> {
        self.groups.get(&id)
    }

    pub fn groups_count(&self) -> usize {
        self.groups.len()
    }

    /// Groups without a parent, sorted.
    pub fn root_groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.values().filter(|group| group.parent.is_none())
    }

    /// Components directly in `group`, sorted.
    pub fn members(&self, group: Id) -> &[Id] {
        self.groups
            .get(&group)
            .map(|group| group.members.as_slice())
            .unwrap_or_default()
    }

    /// Components in `group` or any group nested inside it, sorted.
    pub fn descendants(&self, group: Id) -> Vec<Id> {
        let mut result = Vec::new();
        let mut pending = vec![group];
        while let Some(current) = pending.pop() {
            if let Some(group) = self.groups.get(&current) {
                result.extend_from_slice(&group.members);
                pending.extend_from_slice(&group.children);
            }
        }
        result.sort();
        result
    }

    /// The group directly containing a component.
    pub fn group_of(&self, id: Id) -> Option<Id> {
        self.component(id).and_then(Component::group)
    }

    /// Chain of groups enclosing a component, outermost first.
    pub fn ancestry(&self, id: Id) -> Vec<Id> {
        let mut chain = Vec::new();
        let mut current = self.group_of(id);
        while let Some(group) = current {
            chain.push(group);
            current = self.groups.get(&group).and_then(Group::parent);
        }
        chain.reverse();
        chain
    }
}

fn sorted_outgoing(graph: &GraphInternal<Component, Relationship>, node: Id) -> Vec<EdgeIndex> {
    let mut edges: Vec<EdgeIndex> = graph.outgoing(node).collect();
    // Popped from the back, so reverse order visits smallest target first.
    edges.sort_by(|a, b| {
        let ta = graph.endpoints(*a).map(|(_, t)| t);
        let tb = graph.endpoints(*b).map(|(_, t)| t);
        tb.cmp(&ta).then(b.cmp(a))
    });
    edges
}

fn sorted_unique(ids: impl Iterator<Item = Id>) -> Vec<Id> {
    ids.collect::<BTreeSet<_>>().into_iter().collect()
}
