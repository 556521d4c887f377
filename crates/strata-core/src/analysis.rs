//! One-shot pipeline: input snapshot in, full analysis out.

use tracing::field::Empty;
use tracing::{Span, info, instrument};

use crate::config::AnalysisConfig;
use crate::graph::{
    BuildDiagnostics, CycleAnalysis, DependencyGraph, DependencyStats, LevelAssignment,
    assign_levels, detect_cycles,
};
use crate::mermaid;
use crate::model::{AnalysisInput, UnitSet};
use crate::report::GraphReport;

/// Everything computed for one input snapshot.
///
/// Built fresh per call and never mutated; safe to share across threads.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub units: UnitSet,
    pub graph: DependencyGraph,
    pub diagnostics: BuildDiagnostics,
    pub cycles: CycleAnalysis,
    pub levels: LevelAssignment,
    pub stats: DependencyStats,
    separator: String,
}

impl Analysis {
    /// The serializable report for this analysis.
    #[must_use]
    pub fn report(&self) -> GraphReport {
        GraphReport::new(
            &self.graph,
            &self.diagnostics,
            &self.cycles,
            &self.levels,
            &self.stats,
        )
    }

    /// Mermaid `graph TD` description of the graph.
    #[must_use]
    pub fn mermaid(&self) -> String {
        mermaid::render(&self.graph, &self.cycles, &self.separator)
    }

    #[must_use]
    pub const fn is_acyclic(&self) -> bool {
        self.cycles.acyclic
    }
}

/// Run the full engine over `input`.
///
/// Cycle detection and leveling both read the same immutable graph. Data
/// problems (unresolved pairs, self-loops, cycles) are reported in the
/// result, never returned as errors.
#[must_use]
#[instrument(
    name = "analyze",
    skip_all,
    fields(units = input.units.len(), nodes = Empty, edges = Empty, acyclic = Empty)
)]
pub fn analyze(input: &AnalysisInput, config: &AnalysisConfig) -> Analysis {
    let units = UnitSet::from_specs(&input.units);
    let (graph, diagnostics) =
        DependencyGraph::build(&units, input.raw_edges(), &config.normalize);

    let cycles = detect_cycles(&graph);
    let levels = assign_levels(&graph);
    let stats = DependencyStats::compute(&graph, config.report.most_required_limit);

    let span = Span::current();
    span.record("nodes", graph.node_count());
    span.record("edges", graph.edge_count());
    span.record("acyclic", cycles.acyclic);

    info!(
        unresolved = diagnostics.unresolved_edges.len(),
        self_loops = diagnostics.self_loops.len(),
        cycles = cycles.cycles.len(),
        levels = levels.depth(),
        "analysis complete"
    );

    Analysis {
        units,
        graph,
        diagnostics,
        cycles,
        levels,
        stats,
        separator: config.normalize.separator.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn analysis_is_send_and_sync() {
        assert_send_sync::<Analysis>();
        assert_send_sync::<GraphReport>();
    }

    #[test]
    fn empty_input_yields_well_formed_report() {
        let analysis = analyze(&AnalysisInput::default(), &AnalysisConfig::default());
        let report = analysis.report();
        assert!(report.acyclic);
        assert!(report.nodes.is_empty());
        assert!(report.levels.is_empty());
        assert!(report.build_order.is_empty());
        assert!(report.unleveled_nodes.is_none());
    }

    #[test]
    fn dependency_map_feeds_the_graph() {
        let input = AnalysisInput::from_json_str(
            r#"{"units": ["app", "core"], "dependencies": {"app": ["core.Config"]}}"#,
        )
        .expect("parse");
        let analysis = analyze(&input, &AnalysisConfig::default());
        assert!(analysis.graph.has_edge("app", "core"));
        assert_eq!(analysis.levels.build_order(), vec!["core", "app"]);
    }

    #[test]
    fn deep_acyclic_chain_runs_the_whole_pipeline() {
        let ids: Vec<String> = (0..50_000).map(|i| format!("m{i:05}")).collect();
        let edges: Vec<(&str, &str)> = ids
            .windows(2)
            .map(|w| (w[1].as_str(), w[0].as_str()))
            .collect();
        let input = AnalysisInput::from_parts(ids.iter().map(String::as_str), edges);

        let analysis = analyze(&input, &AnalysisConfig::default());
        assert!(analysis.is_acyclic());
        assert!(analysis.cycles.cyclic_regions.is_empty());
        assert_eq!(analysis.levels.depth(), ids.len());
        assert_eq!(analysis.levels.build_order(), ids);
    }

    #[test]
    fn separator_from_config_is_used() {
        let input = AnalysisInput::from_parts(["a::b", "c"], [("c", "a::b::Item")]);
        let mut config = AnalysisConfig::default();
        config.normalize.separator = "::".to_string();

        let analysis = analyze(&input, &config);
        assert!(analysis.graph.has_edge("c", "a::b"));
        assert!(analysis.mermaid().contains("a__b[\"b\"]"));
    }

    #[test]
    fn most_required_limit_from_config_is_used() {
        let input = AnalysisInput::from_parts(
            ["a", "b", "c", "d"],
            [("a", "b"), ("a", "c"), ("a", "d")],
        );
        let mut config = AnalysisConfig::default();
        config.report.most_required_limit = 1;

        let analysis = analyze(&input, &config);
        assert_eq!(analysis.stats.most_required.len(), 1);
        assert_eq!(analysis.stats.most_required[0].id, "b");
    }
}
