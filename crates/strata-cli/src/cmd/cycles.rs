//! `strata cycles`: witness cycles and the cyclic regions they belong to.

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::Args;
use serde::Serialize;

use crate::cmd::load_analysis;
use crate::output::{OutputMode, pretty_section, render_mode};

/// Arguments for `strata cycles`.
#[derive(Args, Debug)]
pub struct CyclesArgs {
    /// Input document (JSON), or `-` for stdin.
    pub input: PathBuf,
}

#[derive(Debug, Serialize)]
struct CyclesOutput {
    acyclic: bool,
    cycles: Vec<Vec<String>>,
    cyclic_regions: Vec<Vec<String>>,
    unleveled_nodes: Vec<String>,
}

/// Execute `strata cycles`.
pub fn run_cycles(
    args: &CyclesArgs,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    let analysis = load_analysis(&args.input, project_root)?;

    let payload = CyclesOutput {
        acyclic: analysis.cycles.acyclic,
        cycles: analysis.cycles.cycles,
        cyclic_regions: analysis.cycles.cyclic_regions,
        unleveled_nodes: analysis.levels.unleveled().to_vec(),
    };

    render_mode(output, &payload, render_cycles_text, render_cycles_pretty)
}

fn render_cycles_text(payload: &CyclesOutput, w: &mut dyn Write) -> std::io::Result<()> {
    for cycle in &payload.cycles {
        writeln!(w, "{}", cycle.join(" -> "))?;
    }
    Ok(())
}

fn render_cycles_pretty(payload: &CyclesOutput, w: &mut dyn Write) -> std::io::Result<()> {
    if payload.acyclic {
        writeln!(w, "No dependency cycles found.")?;
        return Ok(());
    }

    pretty_section(w, &format!("Dependency cycles ({})", payload.cycles.len()))?;
    for (idx, cycle) in payload.cycles.iter().enumerate() {
        writeln!(w, "  {}. {}", idx + 1, cycle.join(" → "))?;
    }

    writeln!(w)?;
    pretty_section(w, &format!("Cyclic regions ({})", payload.cyclic_regions.len()))?;
    for region in &payload.cyclic_regions {
        writeln!(w, "  - {}", region.join(", "))?;
    }

    if !payload.unleveled_nodes.is_empty() {
        writeln!(w, "\nUnleveled because of cycles: {}", payload.unleveled_nodes.join(", "))?;
    }

    Ok(())
}
