//! `strata analyze`: full dependency report for one input snapshot.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::Args;
use strata_core::GraphReport;
use tracing::{info, warn};

use crate::cmd::load_analysis;
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

/// Exit status when `--fail-on-cycle` is set and a cycle was found.
pub const EXIT_CYCLE: u8 = 2;

/// Arguments for `strata analyze`.
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Input document (JSON), or `-` for stdin.
    pub input: PathBuf,

    /// Exit with status 2 when the graph contains a cycle.
    #[arg(long)]
    pub fail_on_cycle: bool,

    /// Also write the JSON report to this file.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Execute `strata analyze`.
pub fn run_analyze(
    args: &AnalyzeArgs,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<ExitCode> {
    let analysis = load_analysis(&args.input, project_root)?;
    let report = analysis.report();

    if let Some(path) = &args.output {
        write_report(&report, path)?;
        info!(path = %path.display(), "wrote report");
    }

    render_mode(output, &report, render_analyze_text, render_analyze_pretty)?;

    if args.fail_on_cycle && !report.acyclic {
        warn!(cycles = report.cycles.len(), "dependency cycle found");
        return Ok(ExitCode::from(EXIT_CYCLE));
    }
    Ok(ExitCode::SUCCESS)
}

fn write_report(report: &GraphReport, path: &Path) -> anyhow::Result<()> {
    let mut json = serde_json::to_string_pretty(report)?;
    json.push('\n');
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}

fn render_analyze_text(report: &GraphReport, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(
        w,
        "nodes={} edges={} acyclic={} levels={}",
        report.nodes.len(),
        report.stats.edge_count,
        report.acyclic,
        report.levels.len()
    )?;
    if !report.build_order.is_empty() {
        writeln!(w, "order {}", report.build_order.join(" "))?;
    }
    for cycle in &report.cycles {
        writeln!(w, "cycle {}", cycle.join(" -> "))?;
    }
    if let Some(unleveled) = &report.unleveled_nodes {
        writeln!(w, "unleveled {}", unleveled.join(" "))?;
    }
    for edge in &report.unresolved_edges {
        writeln!(w, "unresolved {} -> {}", edge.dependent, edge.dependency)?;
    }
    for id in &report.self_loops {
        writeln!(w, "self-loop {id}")?;
    }
    for (reference, candidates) in &report.ambiguous_references {
        writeln!(w, "ambiguous {reference} -> {}", candidates.join(" "))?;
    }
    Ok(())
}

fn render_analyze_pretty(report: &GraphReport, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, "Dependency analysis")?;
    pretty_kv(w, "units", report.nodes.len().to_string())?;
    pretty_kv(w, "dependencies", report.stats.edge_count.to_string())?;
    pretty_kv(w, "acyclic", if report.acyclic { "yes" } else { "no" })?;
    pretty_kv(w, "density", format!("{:.3}", report.stats.density))?;
    pretty_kv(w, "content hash", &report.content_hash)?;

    if !report.levels.is_empty() {
        writeln!(w)?;
        pretty_section(w, "Levels")?;
        for (level, ids) in report.levels.iter().enumerate() {
            writeln!(w, "  {level:>3}  {}", ids.join(", "))?;
        }
    }

    if !report.cycles.is_empty() {
        writeln!(w)?;
        pretty_section(w, &format!("Cycles ({})", report.cycles.len()))?;
        for cycle in &report.cycles {
            writeln!(w, "  {}", cycle.join(" → "))?;
        }
        if let Some(unleveled) = &report.unleveled_nodes {
            writeln!(w, "\n  unleveled: {}", unleveled.join(", "))?;
        }
    }

    if !report.stats.most_required.is_empty() {
        writeln!(w)?;
        pretty_section(w, "Most required")?;
        for entry in &report.stats.most_required {
            writeln!(w, "  {:>3}  {}", entry.required_by, entry.id)?;
        }
    }

    if !report.unresolved_edges.is_empty()
        || !report.self_loops.is_empty()
        || !report.ambiguous_references.is_empty()
    {
        writeln!(w)?;
        pretty_section(w, "Warnings")?;
        for edge in &report.unresolved_edges {
            writeln!(w, "  unresolved  {} → {}", edge.dependent, edge.dependency)?;
        }
        for id in &report.self_loops {
            writeln!(w, "  self-loop   {id}")?;
        }
        for (reference, candidates) in &report.ambiguous_references {
            writeln!(w, "  ambiguous   {reference} → {}", candidates.join(" | "))?;
        }
    }

    Ok(())
}
