//! Recording and tearing down report provenance.
//!
//! The record sequence is ordered (later steps reference ids produced by
//! earlier ones) and must be all-or-nothing from the caller's perspective.
//! The backing store exposes no transaction control, so a failure part way
//! through triggers compensating deletes of everything created so far.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::storage::FileStore;

use super::{
    AssocType, ContentNode, ContentStatus, NodeKind, ProvenanceError, ProvenanceStore, SourceKind,
};

/// Everything needed to record one generated artifact.
#[derive(Debug, Clone)]
pub struct ArtifactSpec<'a> {
    /// Master node the generated report hangs under.
    pub master_id: &'a str,
    pub source_kind: SourceKind,
    pub source_name: &'a str,
    /// Unique design file name (with extension).
    pub design_name: &'a str,
    /// Resolved storage path of the design file.
    pub storage_path: &'a Path,
    /// Synthesized invocation-form body, owned by the report node.
    pub form_body: &'a str,
    pub description: Option<&'a str>,
}

/// Outcome of a best-effort bulk delete.
#[derive(Debug, Default)]
pub struct BulkDeleteOutcome {
    pub deleted: Vec<String>,
    pub failed: Vec<(String, ProvenanceError)>,
}

impl BulkDeleteOutcome {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Record a generated report and its design file as linked content nodes.
///
/// Creation order: report node (with form body), design-file node (with
/// storage path), master->report link, report->design link, source
/// attribute. Returns the report node id. On failure the nodes created so
/// far are deleted again and the error names the failing stage.
pub fn record_artifact(
    store: &dyn ProvenanceStore,
    spec: &ArtifactSpec<'_>,
) -> Result<String, ProvenanceError> {
    let base_name = spec
        .design_name
        .rsplit_once('.')
        .map(|(base, _)| base)
        .unwrap_or(spec.design_name);

    let report_id = store
        .next_id(NodeKind::Report)
        .map_err(|source| ProvenanceError::Write {
            stage: "allocate-report-id",
            source,
        })?;
    let design_id = store
        .next_id(NodeKind::DesignFile)
        .map_err(|source| ProvenanceError::Write {
            stage: "allocate-design-id",
            source,
        })?;

    let mut created: Vec<String> = Vec::new();
    let result = (|| {
        store
            .create_node(ContentNode {
                id: report_id.clone(),
                kind: NodeKind::Report,
                name: base_name.to_string(),
                description: spec.description.map(str::to_string),
                status: ContentStatus::InProgress,
                body: Some(spec.form_body.to_string()),
                storage_path: None,
            })
            .map_err(|source| ProvenanceError::Write {
                stage: "report-node",
                source,
            })?;
        created.push(report_id.clone());

        store
            .create_node(ContentNode {
                id: design_id.clone(),
                kind: NodeKind::DesignFile,
                name: spec.design_name.to_string(),
                description: spec
                    .description
                    .map(|d| format!("{} (design file)", d)),
                status: ContentStatus::Published,
                body: None,
                storage_path: Some(spec.storage_path.to_path_buf()),
            })
            .map_err(|source| ProvenanceError::Write {
                stage: "design-node",
                source,
            })?;
        created.push(design_id.clone());

        store
            .link(spec.master_id, &report_id, AssocType::SubContent)
            .map_err(|source| ProvenanceError::Write {
                stage: "link-master",
                source,
            })?;
        store
            .link(&report_id, &design_id, AssocType::SubContent)
            .map_err(|source| ProvenanceError::Write {
                stage: "link-design",
                source,
            })?;
        store
            .set_attribute(&report_id, spec.source_kind.as_str(), spec.source_name)
            .map_err(|source| ProvenanceError::Write {
                stage: "source-attribute",
                source,
            })
    })();

    if let Err(err) = result {
        // Compensating deletes, newest first. Best effort: the write
        // error is what the caller needs to see.
        for id in created.iter().rev() {
            if let Err(e) = store.delete_node(id) {
                warn!(node = %id, error = %e, "compensating delete failed");
            }
        }
        return Err(err);
    }

    info!(report = %report_id, design = %design_id, source = %spec.source_name, "artifact recorded");
    Ok(report_id)
}

/// Delete one report: its backing design file, the source attribute, and
/// both content nodes with their associations.
///
/// A backing file that is already gone is treated as deleted, not as an
/// error; the graph teardown still proceeds.
pub fn delete_artifact(
    store: &dyn ProvenanceStore,
    files: &dyn FileStore,
    report_id: &str,
) -> Result<(), ProvenanceError> {
    if store.get_node(report_id)?.is_none() {
        return Err(ProvenanceError::NotFound(report_id.to_string()));
    }

    let linked = store.linked_to(report_id, AssocType::SubContent)?;
    let mut design_nodes = Vec::new();
    for id in &linked {
        if let Some(node) = store.get_node(id)? {
            if node.kind == NodeKind::DesignFile {
                design_nodes.push(node);
            }
        }
    }
    if design_nodes.len() != 1 {
        return Err(ProvenanceError::Inconsistent {
            report_id: report_id.to_string(),
            detail: format!("expected 1 linked design file, found {}", design_nodes.len()),
        });
    }
    let design = design_nodes.remove(0);

    if let Some(path) = &design.storage_path {
        if !files.delete(path)? {
            debug!(path = %path.display(), "design file already absent");
        }
    }

    store.delete_attributes(report_id)?;
    store.delete_node(&design.id)?;
    store.delete_node(report_id)?;
    info!(report = %report_id, design = %design.id, "artifact deleted");
    Ok(())
}

/// Delete every report artifact, accumulating per-item failures instead of
/// aborting on the first one.
pub fn delete_all_artifacts(
    store: &dyn ProvenanceStore,
    files: &dyn FileStore,
) -> Result<BulkDeleteOutcome, ProvenanceError> {
    let reports = store.query_by_kind(NodeKind::Report)?;
    let mut outcome = BulkDeleteOutcome::default();
    for report in reports {
        match delete_artifact(store, files, &report.id) {
            Ok(()) => outcome.deleted.push(report.id),
            Err(err) => {
                warn!(report = %report.id, error = %err, "bulk delete item failed");
                outcome.failed.push((report.id, err));
            }
        }
    }
    info!(
        deleted = outcome.deleted.len(),
        failed = outcome.failed.len(),
        "bulk delete finished"
    );
    Ok(outcome)
}
