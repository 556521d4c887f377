#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use output::{CliError, OutputMode, render_error, resolve_output_mode};
use std::env;
use std::process::ExitCode;
use strata_core::config::{UserConfig, load_user_config};
use tracing::{debug, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "strata: dependency graph analysis (cycles, levels, build order)",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON output (alias for `--format json`).
    #[arg(long, global = true, hide = true)]
    json: bool,

    /// Output format.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Analysis",
        about = "Analyze a dependency snapshot",
        long_about = "Build the dependency graph, detect cycles, assign levels, and print the full report.",
        after_help = "EXAMPLES:\n    # Analyze a snapshot\n    strata analyze deps.json\n\n    # Fail a CI step when a cycle exists\n    strata analyze deps.json --fail-on-cycle\n\n    # Read from stdin, emit JSON\n    scanner | strata analyze - --format json"
    )]
    Analyze(cmd::analyze::AnalyzeArgs),

    #[command(
        next_help_heading = "Analysis",
        about = "List dependency cycles",
        long_about = "List witness cycles and the strongly connected regions they belong to.",
        after_help = "EXAMPLES:\n    # Show cycles\n    strata cycles deps.json\n\n    # Emit machine-readable output\n    strata cycles deps.json --format json"
    )]
    Cycles(cmd::cycles::CyclesArgs),

    #[command(
        next_help_heading = "Analysis",
        about = "Show the level-grouped build order",
        long_about = "Group units into levels: each level depends only on lower levels.",
        after_help = "EXAMPLES:\n    # Show levels\n    strata plan deps.json\n\n    # Include direct dependencies\n    strata plan deps.json --explain"
    )]
    Plan(cmd::plan::PlanArgs),

    #[command(
        next_help_heading = "Analysis",
        about = "Render the graph as Mermaid",
        long_about = "Print a Mermaid `graph TD` description of the dependency graph.",
        after_help = "EXAMPLES:\n    # Print to stdout\n    strata graph deps.json\n\n    # Write to a file\n    strata graph deps.json --output deps.mmd"
    )]
    Graph(cmd::graph::GraphArgs),

    #[command(
        next_help_heading = "Setup",
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n    # Install bash completions\n    strata completions bash > ~/.local/share/bash-completion/completions/strata"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("STRATA_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "strata=debug,info"
        } else {
            "strata=info,warn"
        })
    });

    let format = env::var("STRATA_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.verbose {
        debug!("Verbose mode enabled");
    }

    let user = load_user_config().unwrap_or_else(|err| {
        warn!(error = %err, "ignoring unreadable user config");
        UserConfig::default()
    });
    let output = resolve_output_mode(cli.format, cli.json, user.output.as_deref());

    match run(cli.command, output) {
        Ok(code) => code,
        Err(err) => {
            let _ = render_error(output, &CliError::from(&err));
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands, output: OutputMode) -> anyhow::Result<ExitCode> {
    let project_root = env::current_dir()?;

    match command {
        Commands::Analyze(args) => cmd::analyze::run_analyze(&args, output, &project_root),
        Commands::Cycles(args) => {
            cmd::cycles::run_cycles(&args, output, &project_root).map(|()| ExitCode::SUCCESS)
        }
        Commands::Plan(args) => {
            cmd::plan::run_plan(&args, output, &project_root).map(|()| ExitCode::SUCCESS)
        }
        Commands::Graph(args) => {
            cmd::graph::run_graph(&args, output, &project_root).map(|()| ExitCode::SUCCESS)
        }
        Commands::Completions(args) => {
            let mut command = Cli::command();
            cmd::completions::run_completions(&args, &mut command, &mut std::io::stdout())
                .map(|()| ExitCode::SUCCESS)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::parse_from(["strata", "plan", "deps.json", "--format", "json", "-v"]);
        assert_eq!(cli.format, Some(OutputMode::Json));
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Plan(_)));
    }

    #[test]
    fn hidden_json_flag_is_accepted() {
        let cli = Cli::parse_from(["strata", "--json", "cycles", "-"]);
        assert!(cli.json);
        assert!(cli.format.is_none());
    }
}
