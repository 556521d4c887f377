//! Input data model: analyzable units and raw dependency pairs.
//!
//! # Input document
//!
//! The engine consumes a snapshot produced by some external scanner (import
//! extraction, manifest parsing, ...). The JSON shape is deliberately loose so
//! scanners can emit whichever form is convenient:
//!
//! ```json
//! {
//!   "units": ["app.core", {"id": "app.io", "label": "I/O", "description": "..."}],
//!   "edges": [["app.io", "app.core"], {"dependent": "app.cli", "dependency": "app.io"}],
//!   "dependencies": {"app.cli": ["app.core.config"]}
//! }
//! ```
//!
//! `edges` and `dependencies` are both optional and are concatenated; the
//! `dependencies` map mirrors manifest front matter (`name` + `dependencies`
//! list).
//!
//! # Canonical identifiers
//!
//! Identity is by string equality after trimming surrounding whitespace.
//! Empty identifiers are not units.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};

/// Canonicalize a raw identifier: trim whitespace, reject empty strings.
#[must_use]
pub fn canonicalize(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

// ---------------------------------------------------------------------------
// UnitSpec
// ---------------------------------------------------------------------------

/// One analyzable unit as declared by the scanner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "UnitRepr")]
pub struct UnitSpec {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl UnitSpec {
    /// A unit with no metadata.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: None,
            description: None,
        }
    }

    /// Attach a human-readable label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Attach a source description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum UnitRepr {
    Bare(String),
    Full {
        id: String,
        #[serde(default)]
        label: Option<String>,
        #[serde(default)]
        description: Option<String>,
    },
}

impl From<UnitRepr> for UnitSpec {
    fn from(repr: UnitRepr) -> Self {
        match repr {
            UnitRepr::Bare(id) => Self::new(id),
            UnitRepr::Full {
                id,
                label,
                description,
            } => Self {
                id,
                label,
                description,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// RawEdge
// ---------------------------------------------------------------------------

/// A raw `(dependent, dependency)` pair exactly as the scanner reported it.
///
/// `dependent` requires `dependency` to be processed first. Neither end has
/// been normalized yet.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "EdgeRepr")]
pub struct RawEdge {
    pub dependent: String,
    pub dependency: String,
}

impl RawEdge {
    #[must_use]
    pub fn new(dependent: impl Into<String>, dependency: impl Into<String>) -> Self {
        Self {
            dependent: dependent.into(),
            dependency: dependency.into(),
        }
    }
}

impl<A: Into<String>, B: Into<String>> From<(A, B)> for RawEdge {
    fn from((dependent, dependency): (A, B)) -> Self {
        Self::new(dependent, dependency)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EdgeRepr {
    Pair(String, String),
    Named { dependent: String, dependency: String },
}

impl From<EdgeRepr> for RawEdge {
    fn from(repr: EdgeRepr) -> Self {
        match repr {
            EdgeRepr::Pair(dependent, dependency) | EdgeRepr::Named { dependent, dependency } => {
                Self {
                    dependent,
                    dependency,
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// AnalysisInput
// ---------------------------------------------------------------------------

/// A complete snapshot handed to the engine: the unit set plus raw edges.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisInput {
    #[serde(default)]
    pub units: Vec<UnitSpec>,
    #[serde(default)]
    pub edges: Vec<RawEdge>,
    /// Manifest-style adjacency: dependent → list of dependency references.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dependencies: BTreeMap<String, Vec<String>>,
}

impl AnalysisInput {
    /// Build an input from plain ids and `(dependent, dependency)` pairs.
    #[must_use]
    pub fn from_parts<I, S, E, P>(units: I, edges: E) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        E: IntoIterator<Item = P>,
        P: Into<RawEdge>,
    {
        Self {
            units: units.into_iter().map(UnitSpec::new).collect(),
            edges: edges.into_iter().map(Into::into).collect(),
            dependencies: BTreeMap::new(),
        }
    }

    /// Parse an input document from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the text is not a valid document.
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Parse an input document from any reader.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] on malformed JSON.
    pub fn from_reader(reader: impl Read) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Read and parse an input document from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read and
    /// [`Error::InvalidInput`] if it cannot be parsed.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// All raw edges: the explicit `edges` list followed by the expanded
    /// `dependencies` map.
    pub fn raw_edges(&self) -> impl Iterator<Item = RawEdge> + '_ {
        let mapped = self.dependencies.iter().flat_map(|(dependent, deps)| {
            deps.iter()
                .map(move |dependency| RawEdge::new(dependent.clone(), dependency.clone()))
        });
        self.edges.iter().cloned().chain(mapped)
    }
}

// ---------------------------------------------------------------------------
// UnitSet
// ---------------------------------------------------------------------------

/// Opaque per-unit metadata carried through the engine untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UnitMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// The set of known canonical node identifiers, in sorted order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitSet {
    units: BTreeMap<String, UnitMeta>,
}

impl UnitSet {
    /// Build the canonical unit set from scanner declarations.
    ///
    /// Duplicate ids collapse into one unit; the first non-empty label and
    /// description win.
    #[must_use]
    pub fn from_specs<'a>(specs: impl IntoIterator<Item = &'a UnitSpec>) -> Self {
        let mut units: BTreeMap<String, UnitMeta> = BTreeMap::new();

        for spec in specs {
            let Some(id) = canonicalize(&spec.id) else {
                warn!(raw = %spec.id, "ignoring unit with empty identifier");
                continue;
            };

            let meta = units.entry(id.to_string()).or_default();
            if meta.label.is_none() {
                meta.label = non_empty(spec.label.as_deref());
            }
            if meta.description.is_none() {
                meta.description = non_empty(spec.description.as_deref());
            }
        }

        Self { units }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.units.contains_key(id)
    }

    /// The stored canonical id equal to `id`, borrowed from the set.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&str> {
        self.units.get_key_value(id).map(|(key, _)| key.as_str())
    }

    /// Canonical ids starting with `prefix`, in sorted order.
    pub fn ids_with_prefix<'s>(&'s self, prefix: &str) -> impl Iterator<Item = &'s str> {
        self.units
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .map(|(id, _)| id.as_str())
            .take_while(move |id| id.starts_with(prefix))
    }

    /// Canonical ids in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.units.keys().map(String::as_str)
    }

    /// Canonical ids with their metadata, in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &UnitMeta)> + '_ {
        self.units.iter().map(|(id, meta)| (id.as_str(), meta))
    }

    #[must_use]
    pub fn meta(&self, id: &str) -> Option<&UnitMeta> {
        self.units.get(id)
    }
}

impl<S: AsRef<str>> FromIterator<S> for UnitSet {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        let specs: Vec<UnitSpec> = iter
            .into_iter()
            .map(|id| UnitSpec::new(id.as_ref()))
            .collect();
        Self::from_specs(&specs)
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
