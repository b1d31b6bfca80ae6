//! The content provenance graph.
//!
//! A generated report is persisted as a small graph of linked content
//! records: a Report node owning the invocation-form body, a DesignFile
//! node pointing at the design artifact on durable storage, sub-content
//! associations wiring master -> report -> design file, and an attribute
//! on the report recording which data source produced it. The graph is an
//! explicit, id-keyed adjacency structure (nodes, association rows,
//! attribute rows), matching its persisted, query-driven nature.

mod memory;
mod writer;

pub use memory::MemoryProvenanceStore;
pub use writer::{delete_all_artifacts, delete_artifact, record_artifact, ArtifactSpec, BulkDeleteOutcome};

use std::path::PathBuf;

use thiserror::Error;

use crate::storage::StorageError;

/// Result type for provenance-store calls.
pub type StoreResult<T> = Result<T, StoreError>;

/// Generic failure from the backing persistence layer. The core treats it
/// as fatal for the current operation; the caller decides about retrying.
#[derive(Error, Debug)]
#[error("provenance store error: {0}")]
pub struct StoreError(pub String);

/// Errors raised while writing or tearing down the provenance graph.
#[derive(Error, Debug)]
pub enum ProvenanceError {
    /// A step of the record sequence failed; everything created before it
    /// has been compensated away.
    #[error("provenance write failed at stage '{stage}': {source}")]
    Write {
        stage: &'static str,
        #[source]
        source: StoreError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The graph around a report does not have the expected shape.
    #[error("inconsistent provenance graph for '{report_id}': {detail}")]
    Inconsistent { report_id: String, detail: String },

    #[error("content node not found: '{0}'")]
    NotFound(String),
}

/// Kind of a content node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// A master report definition that generated reports hang under.
    /// Never touched by artifact deletion.
    Master,
    /// A generated report, owning its invocation form.
    Report,
    /// The design file backing a generated report.
    DesignFile,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Master => "REPORT_MASTER",
            NodeKind::Report => "REPORT",
            NodeKind::DesignFile => "DESIGN_FILE",
        }
    }
}

/// Workflow status of a content node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentStatus {
    InProgress,
    Published,
}

/// Association type between content nodes. Only sub-content links exist
/// in this graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssocType {
    SubContent,
}

/// Which kind of data source produced a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Entity,
    Service,
}

impl SourceKind {
    /// Attribute name recording the source on the report node.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Entity => "Entity",
            SourceKind::Service => "Service",
        }
    }

    /// Name of the form field carrying the source identity.
    pub fn field_name(&self) -> &'static str {
        match self {
            SourceKind::Entity => "entityViewName",
            SourceKind::Service => "serviceName",
        }
    }
}

/// A persisted content record.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentNode {
    pub id: String,
    pub kind: NodeKind,
    pub name: String,
    pub description: Option<String>,
    pub status: ContentStatus,
    /// Electronic-text body (the invocation form, for Report nodes).
    pub body: Option<String>,
    /// Storage path of the backing artifact (for DesignFile nodes).
    pub storage_path: Option<PathBuf>,
}

/// An association row linking two content nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Association {
    pub from_id: String,
    pub to_id: String,
    pub assoc_type: AssocType,
}

/// Capability over the external entity-persistence layer.
///
/// Calls are synchronous from the core's perspective; any of them may fail
/// with a generic [`StoreError`].
pub trait ProvenanceStore {
    /// Allocate the next id for a node of `kind`.
    fn next_id(&self, kind: NodeKind) -> StoreResult<String>;

    /// Persist a new node. The id must have come from `next_id`.
    fn create_node(&self, node: ContentNode) -> StoreResult<()>;

    /// Persist an association row.
    fn link(&self, from_id: &str, to_id: &str, assoc_type: AssocType) -> StoreResult<()>;

    /// Set (or replace) a named attribute on a node.
    fn set_attribute(&self, node_id: &str, name: &str, value: &str) -> StoreResult<()>;

    /// Fetch a node by id.
    fn get_node(&self, id: &str) -> StoreResult<Option<ContentNode>>;

    /// All nodes of a kind.
    fn query_by_kind(&self, kind: NodeKind) -> StoreResult<Vec<ContentNode>>;

    /// Ids of nodes linked from `from_id` with the given association type.
    fn linked_to(&self, from_id: &str, assoc_type: AssocType) -> StoreResult<Vec<String>>;

    /// All attributes of a node as (name, value) pairs.
    fn attributes(&self, node_id: &str) -> StoreResult<Vec<(String, String)>>;

    /// Replace a node's electronic-text body.
    fn update_body(&self, node_id: &str, body: &str) -> StoreResult<()>;

    /// Remove all attributes of a node.
    fn delete_attributes(&self, node_id: &str) -> StoreResult<()>;

    /// Remove a node and every association row touching it.
    fn delete_node(&self, id: &str) -> StoreResult<()>;
}
