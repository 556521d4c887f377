//! `strata graph`: Mermaid description of the dependency graph.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use serde::Serialize;
use tracing::info;

use crate::cmd::load_analysis;
use crate::output::{OutputMode, render};

/// Arguments for `strata graph`.
#[derive(Args, Debug)]
pub struct GraphArgs {
    /// Input document (JSON), or `-` for stdin.
    pub input: PathBuf,

    /// Write the diagram to this file instead of stdout.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct GraphOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<PathBuf>,
    nodes: usize,
    edges: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    mermaid: Option<String>,
}

/// Execute `strata graph`.
pub fn run_graph(args: &GraphArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let analysis = load_analysis(&args.input, project_root)?;
    let diagram = analysis.mermaid();

    let mermaid = match &args.output {
        Some(path) => {
            std::fs::write(path, &diagram)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), "wrote mermaid diagram");
            None
        }
        None => Some(diagram),
    };

    let payload = GraphOutput {
        path: args.output.clone(),
        nodes: analysis.graph.node_count(),
        edges: analysis.graph.edge_count(),
        mermaid,
    };

    render(output, &payload, render_graph_human)
}

fn render_graph_human(payload: &GraphOutput, w: &mut dyn Write) -> std::io::Result<()> {
    match (&payload.mermaid, &payload.path) {
        (Some(mermaid), _) => write!(w, "{mermaid}"),
        (None, Some(path)) => writeln!(
            w,
            "wrote {} ({} units, {} dependencies)",
            path.display(),
            payload.nodes,
            payload.edges
        ),
        (None, None) => Ok(()),
    }
}
