//! Graph construction from a unit set and raw dependency pairs.
//!
//! # Overview
//!
//! [`DependencyGraph::build`] normalizes both ends of every raw pair against
//! the known units and assembles an immutable petgraph [`DiGraph`].
//!
//! ## Edge Direction
//!
//! An edge `A → B` means "A **depends on** B": B must be processed before A.
//! Outgoing neighbours are dependencies, incoming neighbours are dependents.
//!
//! ## Determinism
//!
//! Nodes are inserted in sorted id order, so `NodeIndex` order equals id
//! order, and edges are inserted from a sorted set. Every iterator exposed
//! here is therefore sorted, which keeps serialized reports diff-stable.
//!
//! ## Dropped Pairs
//!
//! - either end unresolvable → recorded in [`BuildDiagnostics::unresolved_edges`]
//! - both ends resolve to the same unit → recorded in [`BuildDiagnostics::self_loops`]
//! - repeated edge → merged, counted in [`BuildDiagnostics::duplicate_edges`]
//!
//! None of these are errors.

#![allow(clippy::module_name_repetitions)]

use std::collections::{BTreeMap, BTreeSet, HashMap};

use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::graph::normalize::{NormalizeOptions, Normalizer, Resolution};
use crate::model::{RawEdge, UnitMeta, UnitSet};

// ---------------------------------------------------------------------------
// BuildDiagnostics
// ---------------------------------------------------------------------------

/// Data-quality findings collected while building the graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildDiagnostics {
    /// Raw pairs with at least one end that did not resolve (sorted, unique).
    pub unresolved_edges: Vec<RawEdge>,
    /// Units that appeared as both ends of a pair (sorted, unique).
    pub self_loops: Vec<String>,
    /// Raw references that matched several units equally well.
    pub ambiguous_references: BTreeMap<String, Vec<String>>,
    /// Number of raw pairs merged into an edge that already existed.
    pub duplicate_edges: usize,
}

impl BuildDiagnostics {
    /// Returns `true` if nothing was dropped or merged.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.unresolved_edges.is_empty()
            && self.self_loops.is_empty()
            && self.ambiguous_references.is_empty()
            && self.duplicate_edges == 0
    }
}

// ---------------------------------------------------------------------------
// DependencyGraph
// ---------------------------------------------------------------------------

/// An immutable directed dependency graph over canonical unit ids.
///
/// There is no `&mut self` API: once built, the graph is only read.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    graph: DiGraph<String, ()>,
    node_map: HashMap<String, NodeIndex>,
    meta: Vec<UnitMeta>,
    /// Sorted outgoing neighbours, indexed by `NodeIndex::index()`.
    dependencies: Vec<Vec<NodeIndex>>,
    /// Sorted incoming neighbours, indexed by `NodeIndex::index()`.
    dependents: Vec<Vec<NodeIndex>>,
    content_hash: String,
}

impl DependencyGraph {
    /// Build a graph from `units` and raw `(dependent, dependency)` pairs.
    ///
    /// Every unit becomes a node even if no edge mentions it. Raw pairs are
    /// normalized with `options`; see the module docs for what is dropped.
    #[must_use]
    #[instrument(skip_all, fields(units = units.len()))]
    pub fn build<I>(
        units: &UnitSet,
        edges: I,
        options: &NormalizeOptions,
    ) -> (Self, BuildDiagnostics)
    where
        I: IntoIterator<Item = RawEdge>,
    {
        let mut graph = DiGraph::<String, ()>::with_capacity(units.len(), 0);
        let mut node_map: HashMap<String, NodeIndex> = HashMap::with_capacity(units.len());
        let mut meta = Vec::with_capacity(units.len());

        for (id, unit_meta) in units.iter() {
            let idx = graph.add_node(id.to_string());
            node_map.insert(id.to_string(), idx);
            meta.push(unit_meta.clone());
        }

        let normalizer = Normalizer::new(units, options);
        let mut edge_set: BTreeSet<(NodeIndex, NodeIndex)> = BTreeSet::new();
        let mut unresolved: BTreeSet<RawEdge> = BTreeSet::new();
        let mut self_loops: BTreeSet<String> = BTreeSet::new();
        let mut ambiguous: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut duplicate_edges = 0_usize;

        for raw in edges {
            let dependent = normalizer.resolve(&raw.dependent);
            let dependency = normalizer.resolve(&raw.dependency);

            let ends = [(&raw.dependent, &dependent), (&raw.dependency, &dependency)];
            for (reference, resolution) in ends {
                if let Resolution::Ambiguous(candidates) = resolution {
                    ambiguous
                        .entry(reference.trim().to_string())
                        .or_insert_with_key(|reference| {
                            warn!(
                                reference = %reference,
                                candidates = ?candidates,
                                "ambiguous reference left unresolved"
                            );
                            candidates.iter().map(|c| (*c).to_string()).collect()
                        });
                }
            }

            let (Some(from), Some(to)) = (dependent.canonical(), dependency.canonical()) else {
                debug!(
                    dependent = %raw.dependent,
                    dependency = %raw.dependency,
                    "unresolved dependency pair"
                );
                unresolved.insert(raw);
                continue;
            };

            if from == to {
                warn!(unit = from, "dropping self-loop");
                self_loops.insert(from.to_string());
                continue;
            }

            let pair = (lookup(&node_map, from), lookup(&node_map, to));
            if !edge_set.insert(pair) {
                duplicate_edges += 1;
            }
        }

        let node_count = graph.node_count();
        let mut dependencies: Vec<Vec<NodeIndex>> = vec![Vec::new(); node_count];
        let mut dependents: Vec<Vec<NodeIndex>> = vec![Vec::new(); node_count];

        // BTreeSet order: (from, to) ascending, so both adjacency lists come
        // out sorted without an extra pass.
        for &(from, to) in &edge_set {
            graph.add_edge(from, to, ());
            dependencies[from.index()].push(to);
            dependents[to.index()].push(from);
        }

        if !unresolved.is_empty() {
            warn!(count = unresolved.len(), "dropped unresolved dependency pairs");
        }

        let content_hash = compute_content_hash(&graph, &edge_set);

        let diagnostics = BuildDiagnostics {
            unresolved_edges: unresolved.into_iter().collect(),
            self_loops: self_loops.into_iter().collect(),
            ambiguous_references: ambiguous,
            duplicate_edges,
        };

        debug!(
            nodes = node_count,
            edges = edge_set.len(),
            duplicates = duplicate_edges,
            "dependency graph built"
        );

        (
            Self {
                graph,
                node_map,
                meta,
                dependencies,
                dependents,
                content_hash,
            },
            diagnostics,
        )
    }

    /// Return the number of nodes (units) in the graph.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Return the number of distinct dependency edges in the graph.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.node_map.contains_key(id)
    }

    /// Look up the `NodeIndex` for a unit id.
    #[must_use]
    pub fn node_index(&self, id: &str) -> Option<NodeIndex> {
        self.node_map.get(id).copied()
    }

    /// Return the unit id for a node.
    ///
    /// # Panics
    ///
    /// Panics if `idx` does not belong to this graph.
    #[must_use]
    pub fn id(&self, idx: NodeIndex) -> &str {
        &self.graph[idx]
    }

    /// All node indices in sorted id order.
    pub fn node_indices(&self) -> impl ExactSizeIterator<Item = NodeIndex> + '_ {
        self.graph.node_indices()
    }

    /// All unit ids in sorted order.
    pub fn nodes(&self) -> impl Iterator<Item = &str> + '_ {
        self.graph.node_indices().map(|idx| self.id(idx))
    }

    /// Sorted dependencies (outgoing neighbours) of `idx`.
    #[must_use]
    pub fn dependency_indices(&self, idx: NodeIndex) -> &[NodeIndex] {
        self.dependencies.get(idx.index()).map_or(&[], Vec::as_slice)
    }

    /// Sorted dependents (incoming neighbours) of `idx`.
    #[must_use]
    pub fn dependent_indices(&self, idx: NodeIndex) -> &[NodeIndex] {
        self.dependents.get(idx.index()).map_or(&[], Vec::as_slice)
    }

    /// Sorted ids `id` depends on. Empty for unknown ids.
    #[must_use]
    pub fn dependencies(&self, id: &str) -> Vec<&str> {
        self.node_index(id)
            .map(|idx| self.ids_of(self.dependency_indices(idx)))
            .unwrap_or_default()
    }

    /// Sorted ids that depend on `id`. Empty for unknown ids.
    #[must_use]
    pub fn dependents(&self, id: &str) -> Vec<&str> {
        self.node_index(id)
            .map(|idx| self.ids_of(self.dependent_indices(idx)))
            .unwrap_or_default()
    }

    /// All `(dependent, dependency)` edges, sorted.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.graph.node_indices().flat_map(move |from| {
            self.dependency_indices(from)
                .iter()
                .map(move |&to| (self.id(from), self.id(to)))
        })
    }

    /// Returns `true` if `dependent` directly depends on `dependency`.
    #[must_use]
    pub fn has_edge(&self, dependent: &str, dependency: &str) -> bool {
        match (self.node_index(dependent), self.node_index(dependency)) {
            (Some(a), Some(b)) => self.dependency_indices(a).binary_search(&b).is_ok(),
            _ => false,
        }
    }

    /// Opaque metadata for `id`.
    #[must_use]
    pub fn meta(&self, id: &str) -> Option<&UnitMeta> {
        self.node_index(id).and_then(|idx| self.meta.get(idx.index()))
    }

    /// Display label: the unit's label, or the id itself.
    #[must_use]
    pub fn label(&self, id: &str) -> Option<&str> {
        let idx = self.node_index(id)?;
        let label = self.meta.get(idx.index()).and_then(|m| m.label.as_deref());
        Some(label.unwrap_or_else(|| self.id(idx)))
    }

    /// BLAKE3 hash of the sorted node and edge lists (`"blake3:<hex>"`).
    #[must_use]
    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    /// The underlying petgraph graph, for algorithms from `petgraph::algo`.
    #[must_use]
    pub const fn petgraph(&self) -> &DiGraph<String, ()> {
        &self.graph
    }

    fn ids_of(&self, indices: &[NodeIndex]) -> Vec<&str> {
        indices.iter().map(|&idx| self.id(idx)).collect()
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn lookup(node_map: &HashMap<String, NodeIndex>, id: &str) -> NodeIndex {
    let Some(&idx) = node_map.get(id) else {
        unreachable!("normalizer produced id {id:?} outside the unit set");
    };
    idx
}

/// Hash nodes then edges, NUL-separated, in sorted order.
fn compute_content_hash(
    graph: &DiGraph<String, ()>,
    edges: &BTreeSet<(NodeIndex, NodeIndex)>,
) -> String {
    let mut hasher = blake3::Hasher::new();
    for id in graph.node_weights() {
        hasher.update(id.as_bytes());
        hasher.update(b"\x00");
    }
    hasher.update(b"\x01");
    for &(from, to) in edges {
        hasher.update(graph[from].as_bytes());
        hasher.update(b"\x00");
        hasher.update(graph[to].as_bytes());
        hasher.update(b"\x00");
    }
    format!("blake3:{}", hasher.finalize())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
