//! # Reportsmith
//!
//! A report definition synthesis and design-merge engine.
//!
//! ## Architecture
//!
//! Generation turns a named data source into a complete, uniquely named
//! report artifact; merging folds user design uploads back into it:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │        Data Source (entity view / service contract)      │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [schema introspection]
//! ┌─────────────────────────────────────────────────────────┐
//! │       ReportDataContract (fields, filters, labels)       │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [naming + scaffold + form]
//! ┌─────────────────────────────────────────────────────────┐
//! │     Design Document + Invocation Form (unique name)      │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [provenance writer]
//! ┌─────────────────────────────────────────────────────────┐
//! │     Content Graph (master ── report ── design file)      │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [merge engine / render engine]
//! ┌─────────────────────────────────────────────────────────┐
//! │        Merged Design  /  Exported Output (12 MIMEs)      │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod design;
pub mod facade;
pub mod form;
pub mod mapping;
pub mod naming;
pub mod provenance;
pub mod render;
pub mod schema;
pub mod storage;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::config::Settings;
    pub use crate::design::{
        merge, scaffold_design, scan_for_forbidden, DesignDocument, MergeStrategy, Slot,
        MERGE_RULES,
    };
    pub use crate::facade::{GenerateRequest, GeneratedReport, ReportError, ReportService};
    pub use crate::form::{format_for_mime, OutputFormat, OUTPUT_FORMATS};
    pub use crate::mapping::{ColumnType, FilterKind, ParameterType, SemanticType};
    pub use crate::naming::{resolve_unique_name, ArtifactIndex};
    pub use crate::provenance::{
        ContentNode, MemoryProvenanceStore, NodeKind, ProvenanceStore, SourceKind,
    };
    pub use crate::render::{DesignEngine, JsonDesignEngine, RenderEngine};
    pub use crate::schema::{
        introspect, ContractRegistry, LabelResolver, MemoryLabelCatalog, MemorySchemaSource,
        RawField, ReportDataContract, SchemaSource,
    };
    pub use crate::storage::{FileStore, LocalFileStore, MemoryFileStore};
}

pub use facade::{GenerateRequest, GeneratedReport, ReportError, ReportService};
pub use schema::ReportDataContract;
