pub mod analyze;
pub mod completions;
pub mod cycles;
pub mod graph;
pub mod plan;

use std::io;
use std::path::Path;

use anyhow::Context;
use strata_core::config::{AnalysisConfig, load_project_config};
use strata_core::{Analysis, AnalysisInput, analyze};
use tracing::debug;

/// Path argument meaning "read the document from stdin".
pub const STDIN_PATH: &str = "-";

/// Read an input document from `path`, or from stdin when `path` is `-`.
///
/// # Errors
///
/// Returns an error if the document cannot be read or parsed.
pub fn load_input(path: &Path) -> strata_core::Result<AnalysisInput> {
    if path.as_os_str() == STDIN_PATH {
        debug!("reading analysis input from stdin");
        return AnalysisInput::from_reader(io::stdin().lock());
    }
    debug!(path = %path.display(), "reading analysis input");
    AnalysisInput::from_path(path)
}

/// Load the project config and the input document, then run the engine.
///
/// # Errors
///
/// Returns an error if the config or the input cannot be loaded.
pub fn load_analysis(input: &Path, project_root: &Path) -> anyhow::Result<Analysis> {
    let config: AnalysisConfig = load_project_config(project_root)?;
    let document = load_input(input)
        .with_context(|| format!("failed to load analysis input {}", input.display()))?;
    Ok(analyze(&document, &config))
}
