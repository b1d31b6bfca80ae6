//! The report invocation facade.
//!
//! [`ReportService`] owns the capability set (schema source, label store,
//! contract registry, provenance store, file store, design engine, render
//! engine) and orchestrates the full artifact lifecycle: generation, form
//! override, design merge, export, and deletion. Every operation is a
//! single synchronous call; suspension only happens inside the external
//! capabilities.

use std::collections::{BTreeMap, HashSet};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;
use tracing::info;

use crate::config::{Settings, SettingsError};
use crate::design::{merge, scaffold_design, scan_for_forbidden, DesignError};
use crate::form::{
    self, format_for_mime, synthesize_form, FormError, StandardFields,
};
use crate::naming::{resolve_unique_name, ArtifactIndex, NamingError};
use crate::provenance::{
    delete_all_artifacts, delete_artifact, record_artifact, ArtifactSpec, BulkDeleteOutcome,
    ContentNode, AssocType, NodeKind, ProvenanceError, ProvenanceStore, SourceKind,
};
use crate::render::{DesignEngine, RenderEngine, RenderError};
use crate::schema::{
    introspect, ContractRegistry, LabelResolver, ReportDataContract, SchemaError, SchemaSource,
};
use crate::storage::{FileStore, StorageError};

/// Result type for facade operations.
pub type ReportResult<T> = Result<T, ReportError>;

/// Umbrella error for facade operations. Each variant's message names the
/// stage that failed so operators can tell introspection problems from
/// provenance, merge, or render problems.
#[derive(Error, Debug)]
pub enum ReportError {
    /// Neither a service name nor an entity view name was supplied.
    #[error("missing data source: supply a service name or an entity view name")]
    MissingSource,

    #[error("schema introspection failed: {0}")]
    Schema(#[from] SchemaError),

    #[error("artifact naming failed: {0}")]
    Naming(#[from] NamingError),

    #[error("provenance failed: {0}")]
    Provenance(#[from] ProvenanceError),

    #[error("design handling failed: {0}")]
    Design(#[from] DesignError),

    #[error("form handling failed: {0}")]
    Form(#[from] FormError),

    #[error("render failed: {0}")]
    Render(#[from] RenderError),

    #[error("storage failed: {0}")]
    Storage(#[from] StorageError),

    #[error("configuration failed: {0}")]
    Settings(#[from] SettingsError),

    #[error("report not found: '{0}'")]
    NotFound(String),
}

/// Everything a generation request can carry. Optional inputs are
/// explicit fields, not a dynamic context map; at least one of
/// `entity_view_name` / `service_name` is required.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    /// Base name of the report; the unique design name derives from it.
    pub report_name: String,
    /// Master content node the generated report hangs under.
    pub master_content_id: String,
    pub description: Option<String>,
    /// Entity view to introspect (Entity workflow).
    pub entity_view_name: Option<String>,
    /// Service with a registered contract (Service workflow; wins when
    /// both are supplied).
    pub service_name: Option<String>,
    /// Whether the synthesized form carries visible filter fields.
    pub write_filters: bool,
    pub locale: String,
}

/// Outcome of a successful generation.
#[derive(Debug, Clone)]
pub struct GeneratedReport {
    /// Id of the report content node.
    pub report_id: String,
    /// Unique design file name, with extension.
    pub design_name: String,
    /// The synthesized invocation form, for optional override editing.
    pub form_body: String,
}

/// Name index over persisted design files plus process-local
/// reservations. Closing the probe-then-use race across processes needs
/// reservation support in the backing store; within one service instance
/// the reservation set below is authoritative.
struct DesignNameIndex<'a> {
    existing: HashSet<PathBuf>,
    reserved: &'a Mutex<HashSet<PathBuf>>,
    files: &'a dyn FileStore,
    dir: &'a Path,
    extension: &'a str,
}

impl DesignNameIndex<'_> {
    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", name, self.extension))
    }
}

impl ArtifactIndex for DesignNameIndex<'_> {
    fn is_taken(&self, name: &str) -> bool {
        let path = self.path_for(name);
        self.existing.contains(&path)
            || self.files.exists(&path)
            || self.reserved.lock().unwrap().contains(&path)
    }

    fn reserve(&self, name: &str) -> bool {
        let path = self.path_for(name);
        if self.existing.contains(&path) || self.files.exists(&path) {
            return false;
        }
        self.reserved.lock().unwrap().insert(path)
    }
}

/// The report invocation facade.
pub struct ReportService {
    schema: Box<dyn SchemaSource>,
    labels: Box<dyn LabelResolver>,
    contracts: ContractRegistry,
    store: Box<dyn ProvenanceStore>,
    files: Box<dyn FileStore>,
    designs: Box<dyn DesignEngine>,
    renderer: Box<dyn RenderEngine>,
    settings: Settings,
    reservations: Mutex<HashSet<PathBuf>>,
}

impl ReportService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        schema: Box<dyn SchemaSource>,
        labels: Box<dyn LabelResolver>,
        contracts: ContractRegistry,
        store: Box<dyn ProvenanceStore>,
        files: Box<dyn FileStore>,
        designs: Box<dyn DesignEngine>,
        renderer: Box<dyn RenderEngine>,
        settings: Settings,
    ) -> Self {
        ReportService {
            schema,
            labels,
            contracts,
            store,
            files,
            designs,
            renderer,
            settings,
            reservations: Mutex::new(HashSet::new()),
        }
    }

    /// The backing provenance store, for graph queries and master-node
    /// management.
    pub fn provenance(&self) -> &dyn ProvenanceStore {
        self.store.as_ref()
    }

    /// The backing file store.
    pub fn file_store(&self) -> &dyn FileStore {
        self.files.as_ref()
    }

    /// Generate a new report artifact: unique name, data contract,
    /// scaffolded design, invocation form, and provenance graph.
    pub fn generate(&self, request: &GenerateRequest) -> ReportResult<GeneratedReport> {
        let (source_kind, source_name) =
            match (&request.service_name, &request.entity_view_name) {
                (Some(service), _) => (SourceKind::Service, service.as_str()),
                (None, Some(entity)) => (SourceKind::Entity, entity.as_str()),
                (None, None) => return Err(ReportError::MissingSource),
            };

        let output_dir = self.settings.output.resolved_path()?;
        let extension = self.settings.output.extension.as_str();

        let existing = self
            .store
            .query_by_kind(NodeKind::DesignFile)
            .map_err(ProvenanceError::from)?
            .into_iter()
            .filter_map(|node| node.storage_path)
            .collect();
        let index = DesignNameIndex {
            existing,
            reserved: &self.reservations,
            files: self.files.as_ref(),
            dir: &output_dir,
            extension,
        };
        let design_base = resolve_unique_name(&request.report_name, &index)?;
        let design_name = format!("{}.{}", design_base, extension);
        let storage_path = output_dir.join(&design_name);

        let result = self.generate_reserved(
            request,
            source_kind,
            source_name,
            &design_base,
            &design_name,
            &storage_path,
        );
        self.reservations.lock().unwrap().remove(&storage_path);
        if result.is_err() {
            // Roll back the design file so a failed generation leaves no
            // orphan on storage. Absence is fine.
            let _ = self.files.delete(&storage_path);
        }
        result
    }

    fn generate_reserved(
        &self,
        request: &GenerateRequest,
        source_kind: SourceKind,
        source_name: &str,
        design_base: &str,
        design_name: &str,
        storage_path: &Path,
    ) -> ReportResult<GeneratedReport> {
        let contract = self.resolve_contract(source_kind, source_name, &request.locale)?;

        let design = scaffold_design(&contract, design_base);
        self.designs.save(&design, storage_path, self.files.as_ref())?;

        let standard = StandardFields {
            design_path: storage_path,
            output_base: design_base,
            source_kind,
            source_name,
        };
        let form_body = synthesize_form(
            &request.master_content_id,
            &contract,
            design_base,
            &standard,
            request.write_filters,
        );

        let report_id = record_artifact(
            self.store.as_ref(),
            &ArtifactSpec {
                master_id: &request.master_content_id,
                source_kind,
                source_name,
                design_name,
                storage_path,
                form_body: &form_body,
                description: request.description.as_deref(),
            },
        )?;

        info!(report = %report_id, design = %design_name, "report generated");
        Ok(GeneratedReport {
            report_id,
            design_name: design_name.to_string(),
            form_body,
        })
    }

    fn resolve_contract(
        &self,
        source_kind: SourceKind,
        source_name: &str,
        locale: &str,
    ) -> ReportResult<ReportDataContract> {
        match source_kind {
            SourceKind::Entity => Ok(introspect(
                source_name,
                locale,
                self.schema.as_ref(),
                self.labels.as_ref(),
                &self.settings.labels.bundles,
            )?),
            SourceKind::Service => Ok(self.contracts.contract(source_name)?.clone()),
        }
    }

    /// The user-editable part of a stored invocation form.
    pub fn form_for_display(&self, report_id: &str) -> ReportResult<String> {
        let node = self.report_node(report_id)?;
        let body = node
            .body
            .ok_or_else(|| ReportError::NotFound(report_id.to_string()))?;
        Ok(form::form_for_display(&body)?)
    }

    /// Replace a report's form with user-edited text, re-appending the
    /// system scaffold. The text is scanned for forbidden markers before
    /// any stored state is read or written.
    pub fn override_form(&self, report_id: &str, override_text: &str) -> ReportResult<()> {
        scan_for_forbidden(override_text, &self.settings.security.forbidden_markers)?;

        let (design_node, source_kind, source_name) = self.artifact_context(report_id)?;
        let storage_path = design_node
            .storage_path
            .ok_or_else(|| ReportError::Provenance(ProvenanceError::Inconsistent {
                report_id: report_id.to_string(),
                detail: "design file node has no storage path".to_string(),
            }))?;
        let output_base = design_node
            .name
            .rsplit_once('.')
            .map(|(base, _)| base.to_string())
            .unwrap_or(design_node.name);

        let standard = StandardFields {
            design_path: &storage_path,
            output_base: &output_base,
            source_kind,
            source_name: &source_name,
        };
        let body = form::splice_standard_fields(override_text, &standard)?;
        self.store
            .update_body(report_id, &body)
            .map_err(ProvenanceError::from)?;
        info!(report = %report_id, "form overridden");
        Ok(())
    }

    /// Merge an uploaded design into the canonical stored design.
    ///
    /// The upload is scanned for forbidden markers before either document
    /// is opened; the stored document is only persisted after every slot
    /// merged cleanly, in one atomic write.
    pub fn merge_design(&self, report_id: &str, incoming_bytes: &[u8]) -> ReportResult<()> {
        let incoming_text = String::from_utf8_lossy(incoming_bytes);
        scan_for_forbidden(&incoming_text, &self.settings.security.forbidden_markers)?;

        let (design_node, _, _) = self.artifact_context(report_id)?;
        let storage_path = design_node
            .storage_path
            .ok_or_else(|| ReportError::Provenance(ProvenanceError::Inconsistent {
                report_id: report_id.to_string(),
                detail: "design file node has no storage path".to_string(),
            }))?;

        let mut stored = self.designs.open(&storage_path, self.files.as_ref())?;
        let upload_origin = storage_path.with_extension("upload");
        let incoming = self.designs.open_bytes(&upload_origin, incoming_bytes)?;

        merge(&mut stored, incoming)?;
        self.designs
            .save(&stored, &storage_path, self.files.as_ref())?;
        info!(report = %report_id, path = %storage_path.display(), "design merged");
        Ok(())
    }

    /// Export a report through the external rendering engine.
    ///
    /// The content type is validated against the fixed format table; an
    /// unsupported type fails without touching the engine.
    pub fn export(
        &self,
        content_type: &str,
        design_path: &Path,
        locale: &str,
        parameters: &BTreeMap<String, String>,
        output: &mut dyn Write,
    ) -> ReportResult<()> {
        let format = format_for_mime(content_type)
            .ok_or_else(|| RenderError::UnsupportedFormat(content_type.to_string()))?;
        self.renderer
            .render(design_path, format, locale, parameters, output)?;
        Ok(())
    }

    /// Delete one report, its graph, and its backing design file.
    pub fn delete_report(&self, report_id: &str) -> ReportResult<()> {
        delete_artifact(self.store.as_ref(), self.files.as_ref(), report_id)?;
        Ok(())
    }

    /// Delete every report, best effort; per-item failures are collected
    /// in the outcome rather than aborting the sweep.
    pub fn delete_all_reports(&self) -> ReportResult<BulkDeleteOutcome> {
        Ok(delete_all_artifacts(self.store.as_ref(), self.files.as_ref())?)
    }

    fn report_node(&self, report_id: &str) -> ReportResult<ContentNode> {
        self.store
            .get_node(report_id)
            .map_err(ProvenanceError::from)?
            .filter(|node| node.kind == NodeKind::Report)
            .ok_or_else(|| ReportError::NotFound(report_id.to_string()))
    }

    /// The design-file node and recorded source of a report.
    fn artifact_context(
        &self,
        report_id: &str,
    ) -> ReportResult<(ContentNode, SourceKind, String)> {
        self.report_node(report_id)?;

        let linked = self
            .store
            .linked_to(report_id, AssocType::SubContent)
            .map_err(ProvenanceError::from)?;
        let mut design_node = None;
        for id in linked {
            if let Some(node) = self.store.get_node(&id).map_err(ProvenanceError::from)? {
                if node.kind == NodeKind::DesignFile {
                    design_node = Some(node);
                    break;
                }
            }
        }
        let design_node = design_node.ok_or_else(|| {
            ReportError::Provenance(ProvenanceError::Inconsistent {
                report_id: report_id.to_string(),
                detail: "no linked design file node".to_string(),
            })
        })?;

        let attrs = self
            .store
            .attributes(report_id)
            .map_err(ProvenanceError::from)?;
        let (kind, name) = attrs
            .into_iter()
            .find_map(|(name, value)| match name.as_str() {
                "Entity" => Some((SourceKind::Entity, value)),
                "Service" => Some((SourceKind::Service, value)),
                _ => None,
            })
            .ok_or_else(|| {
                ReportError::Provenance(ProvenanceError::Inconsistent {
                    report_id: report_id.to_string(),
                    detail: "no source attribute on report node".to_string(),
                })
            })?;

        Ok((design_node, kind, name))
    }
}
