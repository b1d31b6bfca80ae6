//! The design-merge engine.
//!
//! Merging folds a user-submitted design into the canonical stored one
//! without losing either the system-managed scaffolding (parameters, data
//! sources, data sets are never touched) or the user's presentation work.
//! Each merged slot has exactly one strategy, fixed in [`MERGE_RULES`]:
//!
//! - body: the incoming document is the sole source of layout, so the
//!   stored body is cleared and the incoming elements appended (replace);
//! - cubes: union-append, duplicates accepted — cubes are reusable data
//!   definitions that may accumulate;
//! - master pages: incoming simple master pages fully replace the stored
//!   simple set; non-simple pages are untouched;
//! - page variables: set by name, incoming wins;
//! - styles: appended only when the name is absent — stored styling wins
//!   on collision.
//!
//! All mutations happen on the in-memory stored document; the caller
//! persists it afterwards in a single atomic write.

use std::collections::HashSet;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use super::{DesignDocument, DesignError, DesignResult};

/// Named sub-collections of a design document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Cubes,
    Body,
    MasterPages,
    PageVariables,
    Styles,
    Parameters,
    DataSources,
    DataSets,
}

impl Slot {
    pub fn as_str(&self) -> &'static str {
        match self {
            Slot::Cubes => "cubes",
            Slot::Body => "body",
            Slot::MasterPages => "master-pages",
            Slot::PageVariables => "page-variables",
            Slot::Styles => "styles",
            Slot::Parameters => "parameters",
            Slot::DataSources => "data-sources",
            Slot::DataSets => "data-sets",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Merge strategy applied to one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStrategy {
    /// Clear the stored slot, then append every incoming element.
    Replace,
    /// Append every incoming element, duplicates and all.
    UnionAppend,
    /// Replace only the filtered subset (simple master pages).
    ReplaceFiltered,
    /// Set incoming entries by name, overwriting stored ones.
    SetByName,
    /// Append incoming entries whose name is not already present.
    AppendIfAbsentByName,
}

/// The fixed slot/strategy table driving [`merge`], in execution order.
/// Slots not listed here (parameters, data sources, data sets) are system
/// scaffolding and never merged.
pub const MERGE_RULES: [(Slot, MergeStrategy); 5] = [
    (Slot::Body, MergeStrategy::Replace),
    (Slot::Cubes, MergeStrategy::UnionAppend),
    (Slot::MasterPages, MergeStrategy::ReplaceFiltered),
    (Slot::PageVariables, MergeStrategy::SetByName),
    (Slot::Styles, MergeStrategy::AppendIfAbsentByName),
];

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));

/// Scan caller-supplied text for forbidden embedded-script markers,
/// ignoring any whitespace inside the text.
///
/// Must run before any document is opened or any state is touched; a hit
/// aborts the whole operation.
pub fn scan_for_forbidden(text: &str, markers: &[String]) -> DesignResult<()> {
    let squashed = WHITESPACE.replace_all(text, "");
    for marker in markers {
        let marker_squashed = WHITESPACE.replace_all(marker, "");
        if squashed.contains(marker_squashed.as_ref()) {
            return Err(DesignError::UnauthorizedContent {
                marker: marker.clone(),
            });
        }
    }
    Ok(())
}

/// Fold `incoming` into `stored`, slot by slot, per [`MERGE_RULES`].
///
/// `incoming` is consumed: its elements move into the stored document.
/// On error the stored document may be partially modified in memory; the
/// caller must not persist it.
pub fn merge(stored: &mut DesignDocument, incoming: DesignDocument) -> DesignResult<()> {
    for (slot, strategy) in MERGE_RULES {
        debug!(slot = %slot, strategy = ?strategy, "merging slot");
        match slot {
            Slot::Body => {
                // Stored body cleared first even when the incoming body
                // is empty: the upload defines the layout.
                stored.body.clear();
                stored.body.extend(incoming.body.iter().cloned());
            }
            Slot::Cubes => {
                stored.cubes.extend(incoming.cubes.iter().cloned());
            }
            Slot::MasterPages => {
                for page in incoming.master_pages.iter().filter(|p| p.simple) {
                    if page.name.is_empty() {
                        return Err(DesignError::Merge {
                            slot,
                            detail: "incoming simple master page has no name".to_string(),
                        });
                    }
                }
                stored.master_pages.retain(|p| !p.simple);
                stored
                    .master_pages
                    .extend(incoming.master_pages.iter().filter(|p| p.simple).cloned());
            }
            Slot::PageVariables => {
                for variable in &incoming.page_variables {
                    if variable.name.is_empty() {
                        return Err(DesignError::Merge {
                            slot,
                            detail: "incoming page variable has no name".to_string(),
                        });
                    }
                    match stored
                        .page_variables
                        .iter_mut()
                        .find(|v| v.name == variable.name)
                    {
                        Some(existing) => existing.expression = variable.expression.clone(),
                        None => stored.page_variables.push(variable.clone()),
                    }
                }
            }
            Slot::Styles => {
                let present: HashSet<&str> =
                    stored.styles.iter().map(|s| s.name.as_str()).collect();
                let mut added = Vec::new();
                for style in &incoming.styles {
                    if style.name.is_empty() {
                        return Err(DesignError::Merge {
                            slot,
                            detail: "incoming style has no name".to_string(),
                        });
                    }
                    if !present.contains(style.name.as_str()) {
                        added.push(style.clone());
                    }
                }
                stored.styles.extend(added);
            }
            // Not in MERGE_RULES; unreachable by construction.
            Slot::Parameters | Slot::DataSources | Slot::DataSets => {}
        }
    }
    Ok(())
}
