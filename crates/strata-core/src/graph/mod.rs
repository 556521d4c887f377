//! The dependency graph engine.
//!
//! # Overview
//!
//! Raw `(dependent, dependency)` pairs are normalized onto known units, built
//! into an immutable petgraph graph, and then analyzed by two independent
//! passes that only read the graph.
//!
//! ## Pipeline
//!
//! ```text
//! AnalysisInput (units + raw pairs)
//!        ↓  model::UnitSet::from_specs()
//! UnitSet (canonical ids, sorted)
//!        ↓  build::DependencyGraph::build()  (normalize::Normalizer per end)
//! DependencyGraph + BuildDiagnostics
//!        ├─ cycles::detect_cycles()   → CycleAnalysis (witnesses, regions)
//!        ├─ levels::assign_levels()   → LevelAssignment (levels, build order)
//!        └─ stats::DependencyStats::compute()
//! ```
//!
//! ## Change Detection
//!
//! [`DependencyGraph::content_hash`] is a BLAKE3 hash of the sorted node and
//! edge lists. Two runs over equivalent input produce the same hash.
//!
//! ## Typical Usage
//!
//! ```rust
//! use strata_core::graph::{DependencyGraph, NormalizeOptions, assign_levels, detect_cycles};
//! use strata_core::model::{RawEdge, UnitSet};
//!
//! let units: UnitSet = ["app", "core"].into_iter().collect();
//! let (graph, _diag) = DependencyGraph::build(
//!     &units,
//!     [RawEdge::new("app", "core.Config")],
//!     &NormalizeOptions::default(),
//! );
//!
//! assert!(detect_cycles(&graph).acyclic);
//! assert_eq!(assign_levels(&graph).build_order(), vec!["core", "app"]);
//! ```

pub mod build;
pub mod cycles;
pub mod levels;
pub mod normalize;
pub mod stats;

pub use build::{BuildDiagnostics, DependencyGraph};
pub use cycles::{CycleAnalysis, detect_cycles};
pub use levels::{LevelAssignment, assign_levels};
pub use normalize::{NormalizeOptions, Normalizer, Resolution};
pub use stats::{DependencyStats, NodeStats, RequiredBy};
