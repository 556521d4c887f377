//! Per-unit and whole-graph dependency statistics.
//!
//! # Statistics Provided
//!
//! - **depends_on**: out-degree of a unit (how many units it needs).
//! - **required_by**: in-degree of a unit (how many units need it).
//! - **no_dependencies**: units with `depends_on == 0`, the level-0 seed.
//! - **most_required**: units ranked by `required_by` descending, ties by id,
//!   truncated to a limit. Units nobody requires are left out.
//! - **isolated**: units with no edges in either direction.
//! - **density**: `edge_count / (node_count * (node_count - 1))`, zero for
//!   graphs with fewer than two nodes.
//! - **max_depends_on** / **max_required_by**: the largest degrees seen.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::graph::build::DependencyGraph;

/// Default length of [`DependencyStats::most_required`].
pub const DEFAULT_MOST_REQUIRED_LIMIT: usize = 5;

// ---------------------------------------------------------------------------
// NodeStats
// ---------------------------------------------------------------------------

/// Degree counts for one unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NodeStats {
    pub depends_on: usize,
    pub required_by: usize,
}

/// One entry of the `most_required` ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequiredBy {
    pub id: String,
    pub required_by: usize,
}

// ---------------------------------------------------------------------------
// DependencyStats
// ---------------------------------------------------------------------------

/// Summary statistics for a dependency graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DependencyStats {
    pub node_count: usize,
    pub edge_count: usize,
    /// Ranges from 0.0 (no edges) to 1.0 (every possible edge present).
    pub density: f64,
    pub max_depends_on: usize,
    pub max_required_by: usize,
    pub no_dependencies: Vec<String>,
    pub isolated: Vec<String>,
    pub most_required: Vec<RequiredBy>,
    /// Degree counts keyed by unit id (sorted).
    pub nodes: BTreeMap<String, NodeStats>,
}

impl DependencyStats {
    /// Compute statistics, keeping at most `most_required_limit` entries in
    /// the `most_required` ranking.
    #[must_use]
    pub fn compute(graph: &DependencyGraph, most_required_limit: usize) -> Self {
        let mut nodes: BTreeMap<String, NodeStats> = BTreeMap::new();
        let mut no_dependencies = Vec::new();
        let mut isolated = Vec::new();

        for idx in graph.node_indices() {
            let id = graph.id(idx);
            let node = NodeStats {
                depends_on: graph.dependency_indices(idx).len(),
                required_by: graph.dependent_indices(idx).len(),
            };

            if node.depends_on == 0 {
                no_dependencies.push(id.to_string());
                if node.required_by == 0 {
                    isolated.push(id.to_string());
                }
            }
            nodes.insert(id.to_string(), node);
        }

        let max_depends_on = nodes.values().map(|n| n.depends_on).max().unwrap_or(0);
        let max_required_by = nodes.values().map(|n| n.required_by).max().unwrap_or(0);

        let mut ranked: Vec<RequiredBy> = nodes
            .iter()
            .filter(|(_, n)| n.required_by > 0)
            .map(|(id, n)| RequiredBy {
                id: id.clone(),
                required_by: n.required_by,
            })
            .collect();
        // Stable sort over id-ordered input keeps ties in id order.
        ranked.sort_by(|a, b| b.required_by.cmp(&a.required_by));
        ranked.truncate(most_required_limit);

        Self {
            node_count: graph.node_count(),
            edge_count: graph.edge_count(),
            density: compute_density(graph.node_count(), graph.edge_count()),
            max_depends_on,
            max_required_by,
            no_dependencies,
            isolated,
            most_required: ranked,
            nodes,
        }
    }

    /// Degree counts for `id`.
    #[must_use]
    pub fn node(&self, id: &str) -> Option<NodeStats> {
        self.nodes.get(id).copied()
    }
}

#[allow(clippy::cast_precision_loss)]
fn compute_density(node_count: usize, edge_count: usize) -> f64 {
    if node_count < 2 {
        return 0.0_f64;
    }
    let max_edges = (node_count * (node_count - 1)) as f64;
    edge_count as f64 / max_edges
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
