//! Edge normalization: map raw dependency references onto known units.
//!
//! # Overview
//!
//! Scanners report dependencies the way they appear in source: sometimes the
//! exact unit (`app.core`), sometimes something nested below a unit
//! (`app.core.config.load`, an attribute of module `app.core.config`), and
//! sometimes a package whose modules are the real units (`app` when only
//! `app.main` is known). This module decides which canonical unit, if any, a
//! raw reference denotes.
//!
//! # Tie-break policy
//!
//! 1. **Exact**: the reference is itself a known unit.
//! 2. **Ancestor**: the longest known unit that is a proper hierarchy prefix
//!    of the reference (`a.b.c` → `a.b`).
//! 3. **Descendant**: the shallowest known unit the reference is a proper
//!    prefix of (`a` → `a.main`). Depth is counted in hierarchy segments; two
//!    or more candidates at the shallowest depth make the reference
//!    [`Resolution::Ambiguous`].
//! 4. Otherwise the reference is external: [`Resolution::Unknown`].
//!
//! Ambiguity is never resolved by guessing. Ancestors cannot be ambiguous:
//! at most one prefix of a given length exists.

use serde::{Deserialize, Serialize};

use crate::model::{UnitSet, canonicalize};

/// Options controlling hierarchy-aware matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeOptions {
    /// Hierarchy separator between segments (`.` for module paths).
    ///
    /// An empty separator disables hierarchy matching: only exact matches
    /// resolve.
    pub separator: String,
    /// Whether a reference may resolve to a known descendant unit.
    pub resolve_descendants: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            separator: ".".to_string(),
            resolve_descendants: true,
        }
    }
}

/// Outcome of resolving one raw reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<'a> {
    Exact(&'a str),
    Ancestor(&'a str),
    Descendant(&'a str),
    /// Several equally-qualifying candidates (sorted).
    Ambiguous(Vec<&'a str>),
    Unknown,
}

impl<'a> Resolution<'a> {
    /// The canonical unit this reference denotes, if it resolved.
    #[must_use]
    pub fn canonical(&self) -> Option<&'a str> {
        match self {
            Self::Exact(id) | Self::Ancestor(id) | Self::Descendant(id) => Some(*id),
            Self::Ambiguous(_) | Self::Unknown => None,
        }
    }
}

/// Resolves raw references against a fixed unit set.
///
/// Pure: holds only shared references and never caches.
#[derive(Debug, Clone, Copy)]
pub struct Normalizer<'a> {
    units: &'a UnitSet,
    options: &'a NormalizeOptions,
}

impl<'a> Normalizer<'a> {
    #[must_use]
    pub const fn new(units: &'a UnitSet, options: &'a NormalizeOptions) -> Self {
        Self { units, options }
    }

    /// Resolve `raw` to a canonical unit following the tie-break policy.
    #[must_use]
    pub fn resolve(&self, raw: &str) -> Resolution<'a> {
        let Some(reference) = canonicalize(raw) else {
            return Resolution::Unknown;
        };

        if let Some(id) = self.units.get(reference) {
            return Resolution::Exact(id);
        }

        let sep = self.options.separator.as_str();
        if sep.is_empty() {
            return Resolution::Unknown;
        }

        if let Some(id) = self.longest_ancestor(reference, sep) {
            return Resolution::Ancestor(id);
        }

        if self.options.resolve_descendants {
            return self.shallowest_descendant(reference, sep);
        }

        Resolution::Unknown
    }

    fn longest_ancestor(&self, reference: &str, sep: &str) -> Option<&'a str> {
        let mut end = reference.len();
        while let Some(pos) = reference[..end].rfind(sep) {
            if let Some(id) = self.units.get(&reference[..pos]) {
                return Some(id);
            }
            end = pos;
        }
        None
    }

    /// "Shortest" counts hierarchy segments, not characters: `pkg.a` and
    /// `pkg.ab` are equally shallow under `pkg`.
    fn shallowest_descendant(&self, reference: &str, sep: &str) -> Resolution<'a> {
        let prefix = format!("{reference}{sep}");

        let mut best_depth = usize::MAX;
        let mut best: Vec<&'a str> = Vec::new();

        for id in self.units.ids_with_prefix(&prefix) {
            let depth = id[prefix.len()..].matches(sep).count();
            if depth < best_depth {
                best_depth = depth;
                best.clear();
                best.push(id);
            } else if depth == best_depth {
                best.push(id);
            }
        }

        match best.len() {
            0 => Resolution::Unknown,
            1 => Resolution::Descendant(best[0]),
            _ => Resolution::Ambiguous(best),
        }
    }
}
