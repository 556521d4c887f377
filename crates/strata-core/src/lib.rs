#![forbid(unsafe_code)]
//! strata-core library: the dependency graph engine.
//!
//! Feed it a snapshot of known units and raw `(dependent, dependency)` pairs;
//! get back a sorted graph, witness cycles, a level-grouped build order and a
//! diff-stable JSON report.
//!
//! ```rust
//! use strata_core::{AnalysisConfig, AnalysisInput, analyze};
//!
//! let input = AnalysisInput::from_parts(["A", "B", "C"], [("A", "B"), ("B", "C")]);
//! let report = analyze(&input, &AnalysisConfig::default()).report();
//!
//! assert!(report.acyclic);
//! assert_eq!(report.build_order, vec!["C", "B", "A"]);
//! ```
//!
//! # Conventions
//!
//! - **Errors**: `error::Result` for I/O and parsing. Data problems in the
//!   input are findings in the report, not errors.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `debug!`); pipeline
//!   stages are `#[instrument]`ed.

pub mod analysis;
pub mod config;
pub mod error;
pub mod graph;
pub mod mermaid;
pub mod model;
pub mod report;

pub use analysis::{Analysis, analyze};
pub use config::AnalysisConfig;
pub use error::{Error, ErrorCode, Result};
pub use model::{AnalysisInput, RawEdge, UnitSpec};
pub use report::GraphReport;
