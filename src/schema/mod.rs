//! Schema introspection: deriving a report's data contract from a
//! data-source schema.
//!
//! A report is generated against either an entity view (introspected here
//! field-by-field) or a service-declared contract (looked up in the
//! [`ContractRegistry`]). Both paths produce the same
//! [`ReportDataContract`], which downstream stages embed into the
//! scaffolded design document and the invocation form.

mod introspect;
mod labels;

pub use introspect::introspect;
pub use labels::{LabelResolver, MemoryLabelCatalog, DEFAULT_LABEL_BUNDLES};

use std::collections::HashMap;

use crate::mapping::SemanticType;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors raised while deriving a report data contract.
///
/// Implemented by hand rather than via `thiserror` because the
/// `UnsupportedFieldType::source` field name would otherwise be inferred
/// as an error source.
#[derive(Debug)]
pub enum SchemaError {
    /// The named entity view or query does not exist.
    NotFound(String),

    /// A field's semantic type has no engine mapping. The whole
    /// introspection fails rather than silently dropping the field.
    UnsupportedFieldType {
        source: String,
        field: String,
        field_type: String,
    },

    /// No contract is registered for the named service.
    UnknownService(String),

    /// The backing schema store failed.
    Store(String),
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaError::NotFound(name) => {
                write!(f, "data source not found: '{name}'")
            }
            SchemaError::UnsupportedFieldType {
                source,
                field,
                field_type,
            } => {
                write!(
                    f,
                    "field '{field}' of '{source}' has unsupported type '{field_type}'"
                )
            }
            SchemaError::UnknownService(name) => {
                write!(f, "no report contract registered for service '{name}'")
            }
            SchemaError::Store(msg) => write!(f, "schema store error: {msg}"),
        }
    }
}

impl std::error::Error for SchemaError {}

/// A field as declared by the schema layer, before type resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawField {
    pub name: String,
    /// Semantic type name as the schema layer spells it ("date-time").
    pub field_type: String,
    pub description: Option<String>,
}

impl RawField {
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        RawField {
            name: name.into(),
            field_type: field_type.into(),
            description: None,
        }
    }
}

/// A field with its resolved semantic type and display label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub semantic_type: SemanticType,
    pub display_label: String,
}

/// Capability over the external entity-persistence layer's schema.
///
/// Fields are returned in schema-declared order; the contract derived from
/// them preserves that order.
pub trait SchemaSource {
    /// Whether the named entity view or query exists.
    fn exists(&self, source_name: &str) -> SchemaResult<bool>;

    /// All fields of the named source, in schema-declared order.
    fn list_fields(&self, source_name: &str) -> SchemaResult<Vec<RawField>>;
}

/// The data contract a generated report is built against.
///
/// Ordered pair-lists rather than maps: filter sub-field ordering is part
/// of the produced form's observable shape.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportDataContract {
    /// Field name -> semantic type, in schema-declared order.
    pub data_map: Vec<(String, SemanticType)>,
    /// Field name -> localized display label.
    pub field_labels: Vec<(String, String)>,
    /// Filter sub-field name -> semantic type, in derivation order.
    pub filter_map: Vec<(String, SemanticType)>,
    /// Filter sub-field name -> display label, same order as `filter_map`.
    pub filter_labels: Vec<(String, String)>,
    /// Name of the data-retrieval routine the report invokes at run time.
    pub custom_method_name: String,
}

impl ReportDataContract {
    /// Display label for a field, if known.
    pub fn label_for(&self, field: &str) -> Option<&str> {
        self.field_labels
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, label)| label.as_str())
    }

    /// Semantic type of a field, if known.
    pub fn type_for(&self, field: &str) -> Option<SemanticType> {
        self.data_map
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, t)| *t)
    }
}

/// Registry of service-declared report contracts.
///
/// Services that feed reports declare their contract up front (data map,
/// filters, labels, retrieval routine) instead of being introspected; the
/// Service generation workflow resolves them here by service name.
#[derive(Debug, Default)]
pub struct ContractRegistry {
    contracts: HashMap<String, ReportDataContract>,
}

impl ContractRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the contract for a service.
    pub fn register(&mut self, service_name: impl Into<String>, contract: ReportDataContract) {
        self.contracts.insert(service_name.into(), contract);
    }

    /// Look up the contract declared by a service.
    pub fn contract(&self, service_name: &str) -> SchemaResult<&ReportDataContract> {
        self.contracts
            .get(service_name)
            .ok_or_else(|| SchemaError::UnknownService(service_name.to_string()))
    }
}

/// In-memory schema source, used as the test double and for schemas
/// registered programmatically.
#[derive(Debug, Default)]
pub struct MemorySchemaSource {
    sources: HashMap<String, Vec<RawField>>,
}

impl MemorySchemaSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source with its fields in declaration order.
    pub fn add_source(&mut self, name: impl Into<String>, fields: Vec<RawField>) {
        self.sources.insert(name.into(), fields);
    }
}

impl SchemaSource for MemorySchemaSource {
    fn exists(&self, source_name: &str) -> SchemaResult<bool> {
        Ok(self.sources.contains_key(source_name))
    }

    fn list_fields(&self, source_name: &str) -> SchemaResult<Vec<RawField>> {
        self.sources
            .get(source_name)
            .cloned()
            .ok_or_else(|| SchemaError::NotFound(source_name.to_string()))
    }
}
