//! `strata plan`: level-grouped processing order.
//!
//! Every unit in a level depends only on units in lower levels, so a level
//! can be processed in parallel once the previous ones are done.

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::Args;
use serde::Serialize;

use crate::cmd::load_analysis;
use crate::output::{OutputMode, render_mode};

/// Arguments for `strata plan`.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Input document (JSON), or `-` for stdin.
    pub input: PathBuf,

    /// Show each unit's direct dependencies.
    #[arg(long)]
    pub explain: bool,
}

#[derive(Debug, Serialize)]
struct PlanLevel {
    level: usize,
    units: Vec<PlanUnit>,
}

#[derive(Debug, Serialize)]
struct PlanUnit {
    id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<String>,
    depends_on: Vec<String>,
}

#[derive(Debug, Serialize)]
struct PlanOutput {
    levels: Vec<PlanLevel>,
    build_order: Vec<String>,
    unleveled_nodes: Vec<String>,
}

/// Execute `strata plan`.
pub fn run_plan(args: &PlanArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let analysis = load_analysis(&args.input, project_root)?;
    let graph = &analysis.graph;

    let levels = analysis
        .levels
        .levels()
        .iter()
        .enumerate()
        .map(|(level, ids)| PlanLevel {
            level,
            units: ids
                .iter()
                .map(|id| PlanUnit {
                    id: id.clone(),
                    label: graph.meta(id).and_then(|m| m.label.clone()),
                    depends_on: graph.dependencies(id).into_iter().map(str::to_string).collect(),
                })
                .collect(),
        })
        .collect();

    let payload = PlanOutput {
        levels,
        build_order: analysis.levels.build_order(),
        unleveled_nodes: analysis.levels.unleveled().to_vec(),
    };

    let explain = args.explain;
    render_mode(
        output,
        &payload,
        render_plan_text,
        |payload, w| render_plan_pretty(payload, explain, w),
    )
}

fn render_plan_text(payload: &PlanOutput, w: &mut dyn Write) -> std::io::Result<()> {
    for level in &payload.levels {
        let ids: Vec<&str> = level.units.iter().map(|u| u.id.as_str()).collect();
        writeln!(w, "{}\t{}", level.level, ids.join(" "))?;
    }
    if !payload.unleveled_nodes.is_empty() {
        writeln!(w, "unleveled\t{}", payload.unleveled_nodes.join(" "))?;
    }
    Ok(())
}

fn render_plan_pretty(
    payload: &PlanOutput,
    explain: bool,
    w: &mut dyn Write,
) -> std::io::Result<()> {
    writeln!(w, "Processing plan")?;

    if payload.levels.is_empty() && payload.unleveled_nodes.is_empty() {
        writeln!(w, "(no units)")?;
        return Ok(());
    }

    for level in &payload.levels {
        let noun = if level.units.len() == 1 { "unit" } else { "units" };
        writeln!(w, "\nLevel {} ({} {noun}):", level.level, level.units.len())?;

        for unit in &level.units {
            match &unit.label {
                Some(label) => writeln!(w, "  - {} ({label})", unit.id)?,
                None => writeln!(w, "  - {}", unit.id)?,
            }
            if explain && !unit.depends_on.is_empty() {
                writeln!(w, "      after: {}", unit.depends_on.join(", "))?;
            }
        }
    }

    if !payload.unleveled_nodes.is_empty() {
        writeln!(
            w,
            "\nCannot be ordered (cycle): {}",
            payload.unleveled_nodes.join(", ")
        )?;
        writeln!(w, "Run `strata cycles` for details.")?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(id: &str, deps: &[&str]) -> PlanUnit {
        PlanUnit {
            id: id.to_string(),
            label: None,
            depends_on: deps.iter().map(|d| (*d).to_string()).collect(),
        }
    }

    fn payload() -> PlanOutput {
        PlanOutput {
            levels: vec![
                PlanLevel {
                    level: 0,
                    units: vec![unit("C", &[]), unit("D", &[])],
                },
                PlanLevel {
                    level: 1,
                    units: vec![unit("B", &["C", "D"])],
                },
            ],
            build_order: vec!["C".into(), "D".into(), "B".into()],
            unleveled_nodes: Vec::new(),
        }
    }

    #[test]
    fn plan_args_parse_explain() {
        use clap::Parser;

        #[derive(Parser)]
        struct Wrapper {
            #[command(flatten)]
            args: PlanArgs,
        }

        let parsed = Wrapper::parse_from(["test", "graph.json", "--explain"]);
        assert!(parsed.args.explain);
    }

    #[test]
    fn text_is_one_line_per_level() {
        let mut buf = Vec::new();
        render_plan_text(&payload(), &mut buf).expect("render");
        assert_eq!(String::from_utf8(buf).expect("utf8"), "0\tC D\n1\tB\n");
    }

    #[test]
    fn pretty_explains_dependencies_on_request() {
        let mut plain = Vec::new();
        render_plan_pretty(&payload(), false, &mut plain).expect("render");
        let plain = String::from_utf8(plain).expect("utf8");
        assert!(plain.contains("Level 0 (2 units):"));
        assert!(!plain.contains("after:"));

        let mut explained = Vec::new();
        render_plan_pretty(&payload(), true, &mut explained).expect("render");
        let explained = String::from_utf8(explained).expect("utf8");
        assert!(explained.contains("      after: C, D"));
    }

    #[test]
    fn json_levels_carry_their_index() {
        let value = serde_json::to_value(payload()).expect("json");
        assert_eq!(value["levels"][1]["level"], serde_json::json!(1));
        assert_eq!(
            value["levels"][1]["units"][0]["depends_on"],
            serde_json::json!(["C", "D"])
        );
    }
}
