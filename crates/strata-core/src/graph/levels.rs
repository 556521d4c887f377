//! Topological leveling (Kahn peeling by dependency count).
//!
//! Level 0 holds every unit with no dependencies. A unit joins level `k + 1`
//! once all of its dependencies sit at level `k` or below. Units that never
//! reach a zero count sit on a cycle, or downstream of one, and are reported
//! as unleveled instead of receiving a fabricated level.
//!
//! Within a level, units are sorted by id. The level-grouped view, the flat
//! build order and `level_of` are all read from the same assignment.

#![allow(clippy::module_name_repetitions)]

use std::collections::BTreeMap;

use petgraph::graph::NodeIndex;
use tracing::{debug, instrument};

use crate::graph::build::DependencyGraph;

/// Level assignment for one graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelAssignment {
    assignment: BTreeMap<String, usize>,
    levels: Vec<Vec<String>>,
    unleveled: Vec<String>,
}

impl LevelAssignment {
    /// Level of `id`, or `None` if it is unknown or unleveled.
    #[must_use]
    pub fn level_of(&self, id: &str) -> Option<usize> {
        self.assignment.get(id).copied()
    }

    /// Units grouped by level; index `k` holds level `k`, each sorted by id.
    #[must_use]
    pub fn levels(&self) -> &[Vec<String>] {
        &self.levels
    }

    /// Flat processing order: levels concatenated in increasing order.
    ///
    /// Empty whenever some unit is unleveled, since no complete order exists.
    #[must_use]
    pub fn build_order(&self) -> Vec<String> {
        if !self.is_complete() {
            return Vec::new();
        }
        self.levels.iter().flatten().cloned().collect()
    }

    /// Units left without a level because of a cycle (sorted).
    #[must_use]
    pub fn unleveled(&self) -> &[String] {
        &self.unleveled
    }

    /// Returns `true` if every unit received a level.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.unleveled.is_empty()
    }

    /// Number of levels.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.levels.len()
    }
}

/// Assign a level to every unit whose dependencies can all be leveled.
#[must_use]
#[instrument(skip_all, fields(nodes = graph.node_count()))]
pub fn assign_levels(graph: &DependencyGraph) -> LevelAssignment {
    let mut remaining: Vec<usize> = graph
        .node_indices()
        .map(|idx| graph.dependency_indices(idx).len())
        .collect();

    // node_indices() is sorted by id, so the seed level is already sorted.
    let mut current: Vec<NodeIndex> = graph
        .node_indices()
        .filter(|idx| remaining[idx.index()] == 0)
        .collect();

    let mut assignment = BTreeMap::new();
    let mut levels: Vec<Vec<String>> = Vec::new();

    while !current.is_empty() {
        let level = levels.len();
        let mut next: Vec<NodeIndex> = Vec::new();

        for &idx in &current {
            for &dependent in graph.dependent_indices(idx) {
                let count = &mut remaining[dependent.index()];
                *count -= 1;
                if *count == 0 {
                    next.push(dependent);
                }
            }
        }

        let ids: Vec<String> = current
            .iter()
            .map(|&idx| graph.id(idx).to_string())
            .collect();
        for id in &ids {
            assignment.insert(id.clone(), level);
        }
        levels.push(ids);

        next.sort_unstable();
        current = next;
    }

    let unleveled: Vec<String> = graph
        .node_indices()
        .filter(|idx| remaining[idx.index()] > 0)
        .map(|idx| graph.id(idx).to_string())
        .collect();

    debug!(
        levels = levels.len(),
        unleveled = unleveled.len(),
        "leveling finished"
    );

    LevelAssignment {
        assignment,
        levels,
        unleveled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::normalize::NormalizeOptions;
    use crate::model::{RawEdge, UnitSet};

    fn graph(ids: &[&str], edges: &[(&str, &str)]) -> DependencyGraph {
        let units: UnitSet = ids.iter().collect();
        DependencyGraph::build(
            &units,
            edges.iter().map(|&(a, b)| RawEdge::new(a, b)),
            &NormalizeOptions::default(),
        )
        .0
    }

    fn owned(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn linear_chain_levels() {
        let g = graph(&["A", "B", "C"], &[("A", "B"), ("B", "C")]);
        let levels = assign_levels(&g);

        assert_eq!(
            levels.levels(),
            &[owned(&["C"]), owned(&["B"]), owned(&["A"])]
        );
        assert_eq!(levels.build_order(), owned(&["C", "B", "A"]));
        assert_eq!(levels.level_of("A"), Some(2));
        assert_eq!(levels.depth(), 3);
        assert!(levels.is_complete());
    }

    #[test]
    fn diamond_groups_parallel_units() {
        let g = graph(
            &["A", "B", "C", "D"],
            &[("A", "B"), ("A", "C"), ("B", "D"), ("C", "D")],
        );
        let levels = assign_levels(&g);
        assert_eq!(
            levels.levels(),
            &[owned(&["D"]), owned(&["B", "C"]), owned(&["A"])]
        );
    }

    #[test]
    fn level_is_longest_path_to_a_leaf() {
        // A depends on C directly and through B, so A waits for B.
        let g = graph(&["A", "B", "C"], &[("A", "B"), ("A", "C"), ("B", "C")]);
        let levels = assign_levels(&g);
        assert_eq!(levels.level_of("A"), Some(2));
        assert_eq!(levels.level_of("B"), Some(1));
        assert_eq!(levels.level_of("C"), Some(0));
    }

    #[test]
    fn isolated_units_are_level_zero() {
        let g = graph(&["A", "B", "C"], &[("A", "B")]);
        let levels = assign_levels(&g);
        assert_eq!(levels.levels()[0], owned(&["B", "C"]));
        assert_eq!(levels.build_order(), owned(&["B", "C", "A"]));
    }

    #[test]
    fn cycle_members_are_unleveled() {
        let g = graph(&["A", "B"], &[("A", "B"), ("B", "A")]);
        let levels = assign_levels(&g);
        assert!(levels.levels().is_empty());
        assert_eq!(levels.unleveled(), owned(&["A", "B"]).as_slice());
        assert!(levels.build_order().is_empty());
        assert_eq!(levels.level_of("A"), None);
    }

    #[test]
    fn units_downstream_of_a_cycle_are_unleveled() {
        // X depends on the A/B cycle; C is independent.
        let g = graph(
            &["A", "B", "C", "X"],
            &[("A", "B"), ("B", "A"), ("X", "A")],
        );
        let levels = assign_levels(&g);
        assert_eq!(levels.levels(), &[owned(&["C"])]);
        assert_eq!(levels.unleveled(), owned(&["A", "B", "X"]).as_slice());
        assert!(!levels.is_complete());
    }

    #[test]
    fn dependencies_of_a_cycle_are_still_leveled() {
        let g = graph(
            &["A", "B", "base"],
            &[("A", "B"), ("B", "A"), ("A", "base")],
        );
        let levels = assign_levels(&g);
        assert_eq!(levels.level_of("base"), Some(0));
        assert_eq!(levels.unleveled(), owned(&["A", "B"]).as_slice());
    }

    #[test]
    fn empty_graph_has_no_levels() {
        let g = graph(&[], &[]);
        let levels = assign_levels(&g);
        assert_eq!(levels.depth(), 0);
        assert!(levels.is_complete());
        assert!(levels.build_order().is_empty());
    }

    #[test]
    fn every_edge_points_to_a_lower_level() {
        let g = graph(
            &["a", "b", "c", "d", "e"],
            &[("a", "b"), ("b", "c"), ("a", "d"), ("d", "e"), ("e", "c")],
        );
        let levels = assign_levels(&g);
        for (dependent, dependency) in g.edges() {
            assert!(levels.level_of(dependent) > levels.level_of(dependency));
        }
    }
}
