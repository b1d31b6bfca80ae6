#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::path::Path;

    use reportsmith::design::{
        merge, scaffold_design, scan_for_forbidden, DesignDocument, DesignElement, DesignError,
        MasterPage, MergeStrategy, PageVariable, Slot, StyleElement, MERGE_RULES,
    };
    use reportsmith::mapping::{ColumnType, ParameterType, SemanticType};
    use reportsmith::schema::ReportDataContract;

    fn markers() -> Vec<String> {
        vec!["${groovy".to_string(), "${bsh".to_string(), "javascript:".to_string()]
    }

    fn page(name: &str, simple: bool) -> MasterPage {
        MasterPage {
            name: name.to_string(),
            simple,
            attrs: BTreeMap::new(),
        }
    }

    fn style(name: &str, color: &str) -> StyleElement {
        let mut properties = BTreeMap::new();
        properties.insert("color".to_string(), color.to_string());
        StyleElement {
            name: name.to_string(),
            properties,
        }
    }

    fn stored_doc() -> DesignDocument {
        DesignDocument {
            body: vec![DesignElement::named("label", "placeholder")],
            cubes: vec![DesignElement::named("cube", "orders_cube")],
            master_pages: vec![page("main", true), page("landscape", false)],
            styles: vec![style("title", "black")],
            page_variables: vec![PageVariable {
                name: "pageTotal".to_string(),
                expression: "old".to_string(),
            }],
            ..Default::default()
        }
    }

    fn upload_doc() -> DesignDocument {
        DesignDocument {
            body: vec![
                DesignElement::named("table", "orders_table"),
                DesignElement::named("chart", "orders_chart"),
            ],
            cubes: vec![DesignElement::named("cube", "orders_cube")],
            master_pages: vec![page("user_page", true)],
            styles: vec![style("title", "navy"), style("footer", "grey")],
            page_variables: vec![
                PageVariable {
                    name: "pageTotal".to_string(),
                    expression: "new".to_string(),
                },
                PageVariable {
                    name: "runDate".to_string(),
                    expression: "today()".to_string(),
                },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_merge_applies_each_strategy() {
        let mut stored = stored_doc();
        merge(&mut stored, upload_doc()).unwrap();

        // Body replaced wholesale.
        let body_names: Vec<_> = stored.body.iter().filter_map(|e| e.name.clone()).collect();
        assert_eq!(body_names, vec!["orders_table", "orders_chart"]);

        // Cubes union-append, duplicates accepted.
        assert_eq!(stored.cubes.len(), 2);

        // Simple master pages replaced; non-simple kept.
        let page_names: Vec<_> = stored.master_pages.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(page_names, vec!["landscape", "user_page"]);

        // Page variables set by name, incoming wins; new ones added.
        assert_eq!(stored.page_variables.len(), 2);
        assert_eq!(stored.page_variables[0].expression, "new");
        assert_eq!(stored.page_variables[1].name, "runDate");

        // Styles: stored wins on name collision, absent names appended.
        assert_eq!(stored.styles.len(), 2);
        assert_eq!(stored.styles[0].properties["color"], "black");
        assert_eq!(stored.styles[1].name, "footer");
    }

    #[test]
    fn test_double_merge_duplicates_cubes_but_not_styles_or_pages() {
        let mut stored = stored_doc();
        merge(&mut stored, upload_doc()).unwrap();
        merge(&mut stored, upload_doc()).unwrap();

        // Union-append accumulates; the original seed cube plus one per merge.
        assert_eq!(stored.cubes.len(), 3);
        // Replace and append-if-absent are idempotent.
        assert_eq!(stored.body.len(), 2);
        assert_eq!(stored.styles.len(), 2);
        assert_eq!(
            stored.master_pages.iter().filter(|p| p.simple).count(),
            1
        );
    }

    #[test]
    fn test_scaffold_slots_never_merged() {
        let contract = ReportDataContract {
            data_map: vec![("orderId".to_string(), SemanticType::Id)],
            field_labels: vec![("orderId".to_string(), "Order Id".to_string())],
            filter_map: vec![("orderId".to_string(), SemanticType::Id)],
            filter_labels: vec![("orderId".to_string(), "Order Id".to_string())],
            custom_method_name: "perform_find".to_string(),
        };
        let mut stored = scaffold_design(&contract, "orders_generated");
        let parameters = stored.parameters.clone();
        let data_sources = stored.data_sources.clone();
        let data_sets = stored.data_sets.clone();

        let upload = DesignDocument {
            parameters: vec![reportsmith::design::Parameter {
                name: "injected".to_string(),
                parameter_type: ParameterType::String,
                prompt: None,
            }],
            data_sources: vec![reportsmith::design::DataSource {
                name: "rogue".to_string(),
                driver: "jdbc".to_string(),
            }],
            ..upload_doc()
        };
        merge(&mut stored, upload).unwrap();

        assert_eq!(stored.parameters, parameters);
        assert_eq!(stored.data_sources, data_sources);
        assert_eq!(stored.data_sets, data_sets);
    }

    #[test]
    fn test_unnamed_page_variable_fails_merge() {
        let mut stored = stored_doc();
        let mut upload = upload_doc();
        upload.page_variables.push(PageVariable {
            name: String::new(),
            expression: "x".to_string(),
        });
        let err = merge(&mut stored, upload).unwrap_err();
        assert!(matches!(err, DesignError::Merge { slot: Slot::PageVariables, .. }));
    }

    #[test]
    fn test_unnamed_simple_master_page_fails_merge() {
        let mut stored = stored_doc();
        let mut upload = upload_doc();
        upload.master_pages.push(page("", true));
        let err = merge(&mut stored, upload).unwrap_err();
        assert!(matches!(err, DesignError::Merge { slot: Slot::MasterPages, .. }));
    }

    #[test]
    fn test_rule_table_order_and_strategies() {
        assert_eq!(
            MERGE_RULES,
            [
                (Slot::Body, MergeStrategy::Replace),
                (Slot::Cubes, MergeStrategy::UnionAppend),
                (Slot::MasterPages, MergeStrategy::ReplaceFiltered),
                (Slot::PageVariables, MergeStrategy::SetByName),
                (Slot::Styles, MergeStrategy::AppendIfAbsentByName),
            ]
        );
    }

    #[test]
    fn test_scan_flags_embedded_script_markers() {
        assert!(scan_for_forbidden("<body>${groovy:ls()}</body>", &markers()).is_err());
        assert!(scan_for_forbidden("<a href=\"javascript:alert(1)\"/>", &markers()).is_err());
        assert!(scan_for_forbidden("<body>${bsh:exec}</body>", &markers()).is_err());
    }

    #[test]
    fn test_scan_ignores_whitespace_in_both_text_and_marker() {
        // Whitespace inside the payload must not hide the marker.
        assert!(scan_for_forbidden("$ {\n  g r o o v y :run}", &markers()).is_err());
        // Clean text with a near-miss stays clean.
        assert!(scan_for_forbidden("${uiLabelMap.orderTitle} groovy", &markers()).is_ok());
        assert!(scan_for_forbidden("<label value=\"group by\"/>", &markers()).is_ok());
    }

    #[test]
    fn test_document_json_roundtrip() {
        let doc = stored_doc();
        let bytes = doc.to_json();
        let decoded = DesignDocument::from_json(Path::new("roundtrip.rptdesign"), &bytes).unwrap();
        assert_eq!(decoded, doc);
    }

    #[test]
    fn test_open_rejects_garbage() {
        let err = DesignDocument::from_json(Path::new("bad.rptdesign"), b"not json").unwrap_err();
        assert!(matches!(err, DesignError::Open { .. }));
    }

    #[test]
    fn test_scaffold_columns_follow_contract() {
        let contract = ReportDataContract {
            data_map: vec![
                ("orderId".to_string(), SemanticType::Id),
                ("grandTotal".to_string(), SemanticType::CurrencyAmount),
            ],
            field_labels: vec![("orderId".to_string(), "Order Id".to_string())],
            filter_map: vec![("orderId".to_string(), SemanticType::Id)],
            filter_labels: vec![("orderId".to_string(), "Order Id".to_string())],
            custom_method_name: "perform_find".to_string(),
        };
        let doc = scaffold_design(&contract, "orders_generated");

        assert_eq!(doc.data_sources.len(), 1);
        assert_eq!(doc.data_sources[0].name, "orders_generated_source");
        assert_eq!(doc.data_sets.len(), 1);
        let set = &doc.data_sets[0];
        assert_eq!(set.name, "orders_generated_dataset");
        assert_eq!(set.retrieval_method, "perform_find");
        assert_eq!(set.columns.len(), 2);
        assert_eq!(set.columns[0].column_type, ColumnType::String);
        assert_eq!(set.columns[0].label.as_deref(), Some("Order Id"));
        assert_eq!(set.columns[1].column_type, ColumnType::Decimal);
        assert_eq!(set.columns[1].label, None);

        assert_eq!(doc.parameters.len(), 1);
        assert_eq!(doc.parameters[0].parameter_type, ParameterType::String);
        assert_eq!(doc.master_pages.len(), 1);
        assert!(doc.master_pages[0].simple);
    }
}
