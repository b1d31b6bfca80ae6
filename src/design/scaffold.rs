//! Initial design synthesis from a report data contract.
//!
//! A freshly generated design carries only the system-managed slots: the
//! data source, a data set binding every contract field to an engine
//! column type, one parameter per filter sub-field, and a default simple
//! master page. Presentation slots start empty; users author them in an
//! external designer and upload the result through the merge engine.

use std::collections::BTreeMap;

use crate::schema::ReportDataContract;

use super::{DataSet, DataSetColumn, DataSource, DesignDocument, MasterPage, Parameter};

/// Driver name of the generated data source; data retrieval goes through
/// the service-dispatch layer, not a direct database connection.
const SCAFFOLD_DRIVER: &str = "service-dispatch";

/// Build the initial design document for a generated report.
pub fn scaffold_design(contract: &ReportDataContract, design_base: &str) -> DesignDocument {
    let source_name = format!("{}_source", design_base);

    let columns = contract
        .data_map
        .iter()
        .map(|(field, semantic)| DataSetColumn {
            name: field.clone(),
            column_type: semantic.column_type(),
            label: contract.label_for(field).map(str::to_string),
        })
        .collect();

    let parameters = contract
        .filter_map
        .iter()
        .map(|(field, semantic)| Parameter {
            name: field.clone(),
            parameter_type: semantic.parameter_type(),
            prompt: contract
                .filter_labels
                .iter()
                .find(|(name, _)| name == field)
                .map(|(_, label)| label.clone()),
        })
        .collect();

    DesignDocument {
        data_sources: vec![DataSource {
            name: source_name.clone(),
            driver: SCAFFOLD_DRIVER.to_string(),
        }],
        data_sets: vec![DataSet {
            name: format!("{}_dataset", design_base),
            data_source: source_name,
            retrieval_method: contract.custom_method_name.clone(),
            columns,
        }],
        parameters,
        master_pages: vec![MasterPage {
            name: "main".to_string(),
            simple: true,
            attrs: BTreeMap::new(),
        }],
        ..Default::default()
    }
}
