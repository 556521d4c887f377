//! Cycle detection for the dependency graph.
//!
//! # Overview
//!
//! A depth-first search runs from every unvisited node (in sorted id order)
//! keeping the current path on an explicit frame stack. Reaching a node that
//! is still on the stack closes a cycle; the sub-path from that node to the
//! current one, closed back to the start, is recorded as a witness. The back
//! edge is not followed further, and the search continues with the remaining
//! neighbours, so one root can yield several witnesses.
//!
//! # Guarantee
//!
//! **At least one witness per cyclic region, not all cycles.** Every strongly
//! connected component that contains a cycle yields at least one witness
//! (the first node of the component the DFS enters stays on the stack until
//! the whole component is explored, and some component member points back
//! to it). Enumerating every simple cycle is exponential in general and is
//! not attempted.
//!
//! [`CycleAnalysis::cyclic_regions`] lists the full membership of each such
//! component (Kosaraju SCC via petgraph) so callers can see the extent of a
//! region beyond its witnesses.
//!
//! # Complexity
//!
//! The traversal is O(V + E): every node is pushed once and every edge is
//! inspected once. The output is not bounded by that: each back edge copies
//! the stack slice it closes, so witnesses cost O(V × back edges) in total
//! (a chain where every node also points back to the root yields Θ(V²)
//! witness entries).
//!
//! Neither pass uses native recursion, so deep graphs cannot overflow the
//! call stack. Regions must come from `kosaraju_scc` (iterative
//! `DfsPostOrder`), not `tarjan_scc`, which recurses once per DFS level.

#![allow(clippy::module_name_repetitions)]

use std::collections::BTreeSet;

use petgraph::algo::kosaraju_scc;
use petgraph::graph::NodeIndex;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::graph::build::DependencyGraph;

/// Result of cycle detection over one graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleAnalysis {
    /// `true` iff no cycle exists.
    pub acyclic: bool,
    /// Witness cycles `[n0, n1, ..., nk, n0]`, in discovery order.
    pub cycles: Vec<Vec<String>>,
    /// Sorted members of every strongly connected component with a cycle.
    pub cyclic_regions: Vec<Vec<String>>,
}

impl CycleAnalysis {
    /// All distinct units appearing in some witness cycle.
    #[must_use]
    pub fn nodes_in_cycles(&self) -> BTreeSet<&str> {
        self.cycles
            .iter()
            .flat_map(|cycle| cycle.iter().map(String::as_str))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnStack,
    Done,
}

/// One DFS frame: a node and the position of its next unexplored dependency.
#[derive(Debug, Clone, Copy)]
struct Frame {
    node: NodeIndex,
    next: usize,
}

/// Detect cycles in `graph`.
///
/// A cyclic graph is a finding, not an error.
#[must_use]
#[instrument(skip_all, fields(nodes = graph.node_count(), edges = graph.edge_count()))]
pub fn detect_cycles(graph: &DependencyGraph) -> CycleAnalysis {
    let cycles: Vec<Vec<String>> = witness_cycles(graph)
        .into_iter()
        .map(|cycle| cycle.into_iter().map(|idx| graph.id(idx).to_string()).collect())
        .collect();

    let cyclic_regions = cyclic_regions(graph);

    debug!(
        witnesses = cycles.len(),
        regions = cyclic_regions.len(),
        "cycle detection finished"
    );

    CycleAnalysis {
        acyclic: cycles.is_empty(),
        cycles,
        cyclic_regions,
    }
}

/// Iterative DFS recording one witness per back edge.
fn witness_cycles(graph: &DependencyGraph) -> Vec<Vec<NodeIndex>> {
    let n = graph.node_count();
    let mut marks = vec![Mark::Unvisited; n];
    // Position of each on-stack node within `stack`.
    let mut stack_pos = vec![0_usize; n];
    let mut stack: Vec<Frame> = Vec::new();
    let mut cycles: Vec<Vec<NodeIndex>> = Vec::new();

    for root in graph.node_indices() {
        if marks[root.index()] != Mark::Unvisited {
            continue;
        }

        marks[root.index()] = Mark::OnStack;
        stack_pos[root.index()] = 0;
        stack.push(Frame { node: root, next: 0 });

        while let Some(frame) = stack.last_mut() {
            let node = frame.node;
            let cursor = frame.next;
            frame.next += 1;

            let Some(&dep) = graph.dependency_indices(node).get(cursor) else {
                stack.pop();
                marks[node.index()] = Mark::Done;
                continue;
            };

            match marks[dep.index()] {
                Mark::Unvisited => {
                    marks[dep.index()] = Mark::OnStack;
                    stack_pos[dep.index()] = stack.len();
                    stack.push(Frame { node: dep, next: 0 });
                }
                Mark::OnStack => {
                    let start = stack_pos[dep.index()];
                    let mut cycle: Vec<NodeIndex> =
                        stack[start..].iter().map(|f| f.node).collect();
                    cycle.push(dep);
                    cycles.push(cycle);
                }
                Mark::Done => {}
            }
        }
    }

    cycles
}

/// Strongly connected components that contain a cycle, sorted.
///
/// Self-loops never reach the graph, so only multi-member components count.
fn cyclic_regions(graph: &DependencyGraph) -> Vec<Vec<String>> {
    let mut regions: Vec<Vec<String>> = kosaraju_scc(graph.petgraph())
        .into_iter()
        .filter(|component| component.len() > 1)
        .map(|component| {
            let mut ids: Vec<String> = component
                .into_iter()
                .map(|idx| graph.id(idx).to_string())
                .collect();
            ids.sort_unstable();
            ids
        })
        .collect();

    regions.sort_unstable();
    regions
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
    fn acyclic_chain_has_no_cycles() {
        let g = graph(&["A", "B", "C"], &[("A", "B"), ("B", "C")]);
        let analysis = detect_cycles(&g);
        assert!(analysis.acyclic);
        assert!(analysis.cycles.is_empty());
        assert!(analysis.cyclic_regions.is_empty());
    }

    #[test]
    fn two_node_cycle_witness() {
        let g = graph(&["A", "B"], &[("A", "B"), ("B", "A")]);
        let analysis = detect_cycles(&g);
        assert!(!analysis.acyclic);
        assert_eq!(analysis.cycles, vec![owned(&["A", "B", "A"])]);
        assert_eq!(analysis.cyclic_regions, vec![owned(&["A", "B"])]);
    }

    #[test]
    fn three_node_cycle_witness_is_closed_walk() {
        let g = graph(&["A", "B", "C"], &[("A", "B"), ("B", "C"), ("C", "A")]);
        let analysis = detect_cycles(&g);
        assert_eq!(analysis.cycles, vec![owned(&["A", "B", "C", "A"])]);

        for cycle in &analysis.cycles {
            assert_eq!(cycle.first(), cycle.last());
            for pair in cycle.windows(2) {
                assert!(g.has_edge(&pair[0], &pair[1]), "{pair:?} is not an edge");
            }
        }
    }

    #[test]
    fn cycle_reached_through_tail_excludes_tail() {
        // root → A → B → A: root is not part of the witness.
        let g = graph(&["A", "B", "root"], &[("root", "A"), ("A", "B"), ("B", "A")]);
        let analysis = detect_cycles(&g);
        assert_eq!(analysis.cycles, vec![owned(&["A", "B", "A"])]);
    }

    #[test]
    fn search_continues_after_first_back_edge() {
        // A → B → A and A → C → A: both witnesses come from root A.
        let g = graph(
            &["A", "B", "C"],
            &[("A", "B"), ("B", "A"), ("A", "C"), ("C", "A")],
        );
        let analysis = detect_cycles(&g);
        assert_eq!(
            analysis.cycles,
            vec![owned(&["A", "B", "A"]), owned(&["A", "C", "A"])]
        );
        assert_eq!(analysis.cyclic_regions, vec![owned(&["A", "B", "C"])]);
    }

    #[test]
    fn disjoint_cyclic_regions_each_get_a_witness() {
        let g = graph(
            &["A", "B", "X", "Y", "Z"],
            &[("A", "B"), ("B", "A"), ("X", "Y"), ("Y", "Z"), ("Z", "X")],
        );
        let analysis = detect_cycles(&g);
        assert_eq!(analysis.cyclic_regions.len(), 2);

        for region in &analysis.cyclic_regions {
            let has_witness = analysis
                .cycles
                .iter()
                .any(|cycle| cycle.iter().all(|id| region.contains(id)));
            assert!(has_witness, "no witness inside region {region:?}");
        }
    }

    #[test]
    fn fully_visited_nodes_are_not_re_explored() {
        // Diamond: D is reached twice but never reported as a cycle.
        let g = graph(
            &["A", "B", "C", "D"],
            &[("A", "B"), ("A", "C"), ("B", "D"), ("C", "D")],
        );
        assert!(detect_cycles(&g).acyclic);
    }

    #[test]
    fn deep_chain_does_not_overflow() {
        let ids: Vec<String> = (0..50_000).map(|i| format!("n{i:05}")).collect();
        let units: UnitSet = ids.iter().collect();
        let edges = ids
            .windows(2)
            .map(|w| RawEdge::new(w[0].clone(), w[1].clone()))
            .chain(std::iter::once(RawEdge::new(
                ids[ids.len() - 1].clone(),
                ids[0].clone(),
            )));
        let (g, _) = DependencyGraph::build(&units, edges, &NormalizeOptions::default());

        let analysis = detect_cycles(&g);
        assert_eq!(analysis.cycles.len(), 1);
        assert_eq!(analysis.cycles[0].len(), ids.len() + 1);
    }

    #[test]
    fn deep_ring_regions_do_not_overflow() {
        let ids: Vec<String> = (0..50_000).map(|i| format!("r{i:05}")).collect();
        let units: UnitSet = ids.iter().collect();
        let edges = ids
            .iter()
            .zip(ids.iter().cycle().skip(1))
            .map(|(a, b)| RawEdge::new(a.clone(), b.clone()));
        let (g, _) = DependencyGraph::build(&units, edges, &NormalizeOptions::default());

        let regions = cyclic_regions(&g);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0], ids);
    }

    #[test]
    fn deep_acyclic_chain_has_no_regions() {
        let ids: Vec<String> = (0..50_000).map(|i| format!("c{i:05}")).collect();
        let units: UnitSet = ids.iter().collect();
        let edges = ids
            .windows(2)
            .map(|w| RawEdge::new(w[0].clone(), w[1].clone()));
        let (g, _) = DependencyGraph::build(&units, edges, &NormalizeOptions::default());

        let analysis = detect_cycles(&g);
        assert!(analysis.acyclic);
        assert!(analysis.cyclic_regions.is_empty());
    }

    #[test]
    fn nodes_in_cycles_collects_witness_members() {
        let g = graph(&["A", "B", "C"], &[("A", "B"), ("B", "A"), ("C", "A")]);
        let analysis = detect_cycles(&g);
        let members: Vec<&str> = analysis.nodes_in_cycles().into_iter().collect();
        assert_eq!(members, vec!["A", "B"]);
    }
}
