//! Design documents: the structured definition of a report's layout,
//! data bindings, and styling.
//!
//! A document is composed of named slots (cubes, body, master pages,
//! styles, page variables, parameters, data sources, data sets). The
//! system manages the data-binding slots (parameters, sources, sets) when
//! it scaffolds a new design; users author the presentation slots in an
//! external designer and upload the result, which the merge engine folds
//! back into the canonical stored document slot by slot.

mod merge;
mod scaffold;

pub use merge::{merge, scan_for_forbidden, MergeStrategy, Slot, MERGE_RULES};
pub use scaffold::scaffold_design;

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::mapping::{ColumnType, ParameterType};
use crate::storage::StorageError;

/// Result type for design-document operations.
pub type DesignResult<T> = Result<T, DesignError>;

/// Errors raised while opening, merging, or persisting design documents.
#[derive(Error, Debug)]
pub enum DesignError {
    /// A document could not be read or decoded.
    #[error("cannot open design document '{path}': {detail}")]
    Open { path: PathBuf, detail: String },

    /// A merge step failed; the error names the slot.
    #[error("design merge failed in slot '{slot}': {detail}")]
    Merge { slot: Slot, detail: String },

    /// The supplied content contains a forbidden embedded-script marker.
    #[error("unauthorized content: forbidden marker '{marker}'")]
    UnauthorizedContent { marker: String },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// A generic named element in a design tree (report items, cubes, …).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DesignElement {
    pub tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DesignElement>,
}

impl DesignElement {
    pub fn new(tag: impl Into<String>) -> Self {
        DesignElement {
            tag: tag.into(),
            ..Default::default()
        }
    }

    pub fn named(tag: impl Into<String>, name: impl Into<String>) -> Self {
        DesignElement {
            tag: tag.into(),
            name: Some(name.into()),
            ..Default::default()
        }
    }
}

/// A master page. Only simple master pages participate in the merge's
/// replace step; other kinds pass through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MasterPage {
    pub name: String,
    pub simple: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,
}

/// A named style definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleElement {
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
}

/// A page-scoped variable, set by name during the merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageVariable {
    pub name: String,
    pub expression: String,
}

/// A report parameter, generated from the data contract's filter fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub parameter_type: ParameterType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

/// A data source binding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSource {
    pub name: String,
    pub driver: String,
}

/// One column binding of a data set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSetColumn {
    pub name: String,
    pub column_type: ColumnType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// A data set: the retrieval routine and its column bindings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSet {
    pub name: String,
    pub data_source: String,
    pub retrieval_method: String,
    pub columns: Vec<DataSetColumn>,
}

/// An in-memory design document.
///
/// Exclusively owned by whichever operation holds it; a merge buffers all
/// mutations here and persists in one write.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DesignDocument {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cubes: Vec<DesignElement>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub body: Vec<DesignElement>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub master_pages: Vec<MasterPage>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub styles: Vec<StyleElement>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub page_variables: Vec<PageVariable>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data_sources: Vec<DataSource>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data_sets: Vec<DataSet>,
}

impl DesignDocument {
    /// Decode a document from its persisted form.
    pub fn from_json(path: &std::path::Path, bytes: &[u8]) -> DesignResult<Self> {
        serde_json::from_slice(bytes).map_err(|e| DesignError::Open {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })
    }

    /// Encode the document to its persisted form.
    pub fn to_json(&self) -> Vec<u8> {
        // A valid document always serializes; the type has no map keys
        // or non-string externals that could fail.
        serde_json::to_vec_pretty(self).unwrap_or_default()
    }
}
