//! Serializable analysis report.
//!
//! [`GraphReport`] is the single structured result handed to downstream
//! formatters. Every collection in it is sorted or in a fixed discovery
//! order, so serializing the same input twice gives byte-identical JSON.
//!
//! ```json
//! {
//!   "nodes": ["A", "B", "C"],
//!   "edges": {"A": ["B"], "B": ["C"], "C": []},
//!   "acyclic": true,
//!   "cycles": [],
//!   "levels": {"0": ["C"], "1": ["B"], "2": ["A"]},
//!   "build_order": ["C", "B", "A"],
//!   "unresolved_edges": [],
//!   "self_loops": [],
//!   "ambiguous_references": {},
//!   "cyclic_regions": [],
//!   "content_hash": "blake3:...",
//!   "stats": { ... }
//! }
//! ```
//!
//! `unleveled_nodes` only appears when the graph is cyclic.

use std::collections::BTreeMap;

use serde::Serialize;
use serde::ser::{SerializeMap, SerializeSeq, Serializer};

use crate::graph::{
    BuildDiagnostics, CycleAnalysis, DependencyGraph, DependencyStats, LevelAssignment,
};
use crate::model::RawEdge;

/// The full analysis result in its wire shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphReport {
    /// All units, sorted.
    pub nodes: Vec<String>,
    /// Dependent → sorted dependencies, one key per unit.
    pub edges: BTreeMap<String, Vec<String>>,
    pub acyclic: bool,
    /// Witness cycles, empty when acyclic.
    pub cycles: Vec<Vec<String>>,
    /// Level-grouped units; partial when cyclic.
    #[serde(serialize_with = "serialize_levels")]
    pub levels: Vec<Vec<String>>,
    /// Flat processing order; empty when cyclic.
    pub build_order: Vec<String>,
    /// Raw pairs dropped because an end did not resolve, as `[dependent, dependency]`.
    #[serde(serialize_with = "serialize_pairs")]
    pub unresolved_edges: Vec<RawEdge>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unleveled_nodes: Option<Vec<String>>,
    /// Units that referenced themselves; the pair was dropped.
    pub self_loops: Vec<String>,
    /// Raw references that matched several units equally well, with the
    /// candidates. Each one also appears in `unresolved_edges`.
    pub ambiguous_references: BTreeMap<String, Vec<String>>,
    pub cyclic_regions: Vec<Vec<String>>,
    pub content_hash: String,
    pub stats: DependencyStats,
}

impl GraphReport {
    /// Assemble a report from the outputs of each pipeline stage.
    #[must_use]
    pub fn new(
        graph: &DependencyGraph,
        diagnostics: &BuildDiagnostics,
        cycles: &CycleAnalysis,
        levels: &LevelAssignment,
        stats: &DependencyStats,
    ) -> Self {
        let edges = graph
            .nodes()
            .map(|id| {
                let deps = graph.dependencies(id).into_iter().map(str::to_string).collect();
                (id.to_string(), deps)
            })
            .collect();

        let unleveled_nodes = (!cycles.acyclic).then(|| levels.unleveled().to_vec());

        Self {
            nodes: graph.nodes().map(str::to_string).collect(),
            edges,
            acyclic: cycles.acyclic,
            cycles: cycles.cycles.clone(),
            levels: levels.levels().to_vec(),
            build_order: levels.build_order(),
            unresolved_edges: diagnostics.unresolved_edges.clone(),
            unleveled_nodes,
            self_loops: diagnostics.self_loops.clone(),
            ambiguous_references: diagnostics.ambiguous_references.clone(),
            cyclic_regions: cycles.cyclic_regions.clone(),
            content_hash: graph.content_hash().to_string(),
            stats: stats.clone(),
        }
    }

    /// Serialize as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error only if serialization itself fails.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Levels as `{"0": [...], "1": [...]}` with keys in numeric order.
///
/// Written through the serializer directly: collecting into a string-keyed
/// map would order `"10"` before `"2"`.
fn serialize_levels<S>(levels: &[Vec<String>], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut map = serializer.serialize_map(Some(levels.len()))?;
    for (level, ids) in levels.iter().enumerate() {
        map.serialize_entry(&level.to_string(), ids)?;
    }
    map.end()
}

fn serialize_pairs<S>(edges: &[RawEdge], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut seq = serializer.serialize_seq(Some(edges.len()))?;
    for edge in edges {
        seq.serialize_element(&(&edge.dependent, &edge.dependency))?;
    }
    seq.end()
}
