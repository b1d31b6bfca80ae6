//! Derivation of a [`ReportDataContract`] from an entity view's schema.

use crate::mapping::{FilterKind, SemanticType};

use super::labels::{field_label, qualifier, LabelResolver};
use super::{RawField, ReportDataContract, SchemaError, SchemaResult, SchemaSource};

/// Retrieval routine invoked by reports generated from the entity workflow.
const ENTITY_RETRIEVAL_METHOD: &str = "perform_find";

/// Suffixes appended to filter sub-field names. Operator sub-fields carry
/// a short-varchar operator token; value sub-fields carry the base type.
const OP_SUFFIX: &str = "_op";
const RANGED_SUFFIXES: [&str; 4] = ["_fld0_op", "_fld0_value", "_fld1_op", "_fld1_value"];

/// Enumerate the fields of `source_name` and derive the report contract:
/// data map, display labels, and the filter sub-field expansion.
///
/// Fields are processed in schema-declared order. Every field yields
/// exactly one filter spec: simple types add `<f>` and `<f>_op`, ranged
/// types add the four `_fld{0,1}` sub-fields. A field whose semantic type
/// has no engine mapping fails the whole derivation.
pub fn introspect(
    source_name: &str,
    locale: &str,
    schema: &dyn SchemaSource,
    labels: &dyn LabelResolver,
    bundles: &[String],
) -> SchemaResult<ReportDataContract> {
    if !schema.exists(source_name)? {
        return Err(SchemaError::NotFound(source_name.to_string()));
    }

    let mut contract = ReportDataContract {
        custom_method_name: ENTITY_RETRIEVAL_METHOD.to_string(),
        ..Default::default()
    };

    let op_qualifier = qualifier(labels, "operator", locale);
    let fld0_qualifier = qualifier(labels, "fieldZero", locale);
    let fld1_qualifier = qualifier(labels, "fieldOne", locale);

    for field in schema.list_fields(source_name)? {
        let RawField {
            name, field_type, ..
        } = field;
        let semantic = SemanticType::parse(&field_type).ok_or_else(|| {
            SchemaError::UnsupportedFieldType {
                source: source_name.to_string(),
                field: name.clone(),
                field_type,
            }
        })?;

        let label = field_label(labels, bundles, &name, locale);
        contract.data_map.push((name.clone(), semantic));
        contract.field_labels.push((name.clone(), label.clone()));

        match semantic.filter_kind() {
            FilterKind::Simple => {
                contract.filter_map.push((name.clone(), semantic));
                contract
                    .filter_map
                    .push((format!("{}{}", name, OP_SUFFIX), SemanticType::ShortVarchar));
                contract.filter_labels.push((name.clone(), label.clone()));
                contract.filter_labels.push((
                    format!("{}{}", name, OP_SUFFIX),
                    format!("{}{}", label, op_qualifier),
                ));
            }
            FilterKind::Ranged => {
                for suffix in RANGED_SUFFIXES {
                    let sub_type = if suffix.ends_with("_op") {
                        SemanticType::ShortVarchar
                    } else {
                        semantic
                    };
                    contract
                        .filter_map
                        .push((format!("{}{}", name, suffix), sub_type));
                    let pair_qualifier = if suffix.starts_with("_fld0") {
                        &fld0_qualifier
                    } else {
                        &fld1_qualifier
                    };
                    let sub_label = if suffix.ends_with("_op") {
                        format!("{}{}{}", label, pair_qualifier, op_qualifier)
                    } else {
                        format!("{}{}", label, pair_qualifier)
                    };
                    contract
                        .filter_labels
                        .push((format!("{}{}", name, suffix), sub_label));
                }
            }
        }
    }

    Ok(contract)
}
