//! Mermaid flowchart description of a dependency graph.
//!
//! Produces `graph TD` text that GitHub markdown, the Mermaid live editor and
//! most doc tooling can render. Only the description is produced here.
//!
//! ```text
//! graph TD
//!     app_cli["cli"]
//!     app_core["core"]
//!     app_cli --> app_core
//! ```
//!
//! Units in a cyclic region are tagged with the `cycle` class.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt::Write as _;

use crate::graph::{CycleAnalysis, DependencyGraph};

const CYCLE_CLASS: &str = "cycle";

/// Render `graph` as a Mermaid `graph TD` description.
///
/// `separator` is the hierarchy separator used to shorten unlabeled ids to
/// their last segment.
#[must_use]
pub fn render(graph: &DependencyGraph, cycles: &CycleAnalysis, separator: &str) -> String {
    let node_ids = assign_node_ids(graph);
    let mut out = String::from("graph TD\n");

    for id in graph.nodes() {
        let text = graph
            .meta(id)
            .and_then(|m| m.label.as_deref())
            .unwrap_or_else(|| last_segment(id, separator));
        let _ = writeln!(out, "    {}[\"{}\"]", node_ids[id], escape_text(text));
    }

    for (dependent, dependency) in graph.edges() {
        let _ = writeln!(out, "    {} --> {}", node_ids[dependent], node_ids[dependency]);
    }

    let in_cycle: BTreeSet<&str> = cycles
        .cyclic_regions
        .iter()
        .flatten()
        .map(String::as_str)
        .collect();
    if !in_cycle.is_empty() {
        let members: Vec<&str> = in_cycle.iter().map(|id| node_ids[id].as_str()).collect();
        let _ = writeln!(
            out,
            "    classDef {CYCLE_CLASS} fill:#ffebee,stroke:#c62828,stroke-width:2px"
        );
        let _ = writeln!(out, "    class {} {CYCLE_CLASS}", members.join(","));
    }

    out
}

/// Map every unit to a unique Mermaid-safe identifier, in sorted order.
fn assign_node_ids(graph: &DependencyGraph) -> HashMap<&str, String> {
    let mut taken: HashSet<String> = HashSet::with_capacity(graph.node_count());
    let mut ids = HashMap::with_capacity(graph.node_count());

    for id in graph.nodes() {
        let base = sanitize(id);
        let mut candidate = base.clone();
        let mut suffix = 2_usize;
        while taken.contains(&candidate) {
            candidate = format!("{base}_{suffix}");
            suffix += 1;
        }
        taken.insert(candidate.clone());
        ids.insert(id, candidate);
    }

    ids
}

fn sanitize(id: &str) -> String {
    let mut out: String = id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    // `end` closes a subgraph in Mermaid.
    if out.eq_ignore_ascii_case("end") {
        out.push('_');
    }
    out
}

fn last_segment<'a>(id: &'a str, separator: &str) -> &'a str {
    if separator.is_empty() {
        return id;
    }
    id.rsplit(separator).next().unwrap_or(id)
}

fn escape_text(text: &str) -> String {
    text.replace('"', "#quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{NormalizeOptions, detect_cycles};
    use crate::model::{RawEdge, UnitSet, UnitSpec};

    fn graph(ids: &[&str], edges: &[(&str, &str)]) -> DependencyGraph {
        let units: UnitSet = ids.iter().collect();
        DependencyGraph::build(
            &units,
            edges.iter().map(|&(a, b)| RawEdge::new(a, b)),
            &NormalizeOptions::default(),
        )
        .0
    }

    #[test]
    fn renders_nodes_then_edges() {
        let g = graph(&["app.cli", "app.core"], &[("app.cli", "app.core")]);
        let text = render(&g, &detect_cycles(&g), ".");
        assert_eq!(
            text,
            "graph TD\n    app_cli[\"cli\"]\n    app_core[\"core\"]\n    app_cli --> app_core\n"
        );
    }

    #[test]
    fn labels_override_last_segment() {
        let specs = vec![UnitSpec::new("a.b").with_label("Say \"hi\"")];
        let units = UnitSet::from_specs(&specs);
        let (g, _) =
            DependencyGraph::build(&units, Vec::<RawEdge>::new(), &NormalizeOptions::default());
        let text = render(&g, &detect_cycles(&g), ".");
        assert!(text.contains("a_b[\"Say #quot;hi#quot;\"]"), "{text}");
    }

    #[test]
    fn colliding_ids_get_suffixes() {
        let g = graph(&["a-b", "a.b", "a_b"], &[]);
        let ids = assign_node_ids(&g);
        assert_eq!(ids["a-b"], "a_b");
        assert_eq!(ids["a.b"], "a_b_2");
        assert_eq!(ids["a_b"], "a_b_3");
    }

    #[test]
    fn reserved_word_is_escaped() {
        assert_eq!(sanitize("end"), "end_");
        assert_eq!(sanitize("End"), "End_");
        assert_eq!(sanitize("endpoint"), "endpoint");
    }

    #[test]
    fn cycle_members_get_cycle_class() {
        let g = graph(&["a", "b", "c"], &[("a", "b"), ("b", "a"), ("c", "a")]);
        let text = render(&g, &detect_cycles(&g), ".");
        assert!(text.contains("classDef cycle"));
        assert!(text.contains("    class a,b cycle\n"), "{text}");
    }

    #[test]
    fn acyclic_graph_has_no_class_lines() {
        let g = graph(&["a", "b"], &[("a", "b")]);
        let text = render(&g, &detect_cycles(&g), ".");
        assert!(!text.contains("classDef"));
    }
}
