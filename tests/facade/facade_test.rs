#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::io::Write;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use reportsmith::config::Settings;
    use reportsmith::design::DesignDocument;
    use reportsmith::facade::{GenerateRequest, ReportError, ReportService};
    use reportsmith::form::OutputFormat;
    use reportsmith::mapping::SemanticType;
    use reportsmith::provenance::{
        AssocType, ContentNode, ContentStatus, MemoryProvenanceStore, NodeKind, SourceKind,
    };
    use reportsmith::render::{JsonDesignEngine, RenderEngine, RenderResult};
    use reportsmith::schema::{
        ContractRegistry, MemoryLabelCatalog, MemorySchemaSource, RawField, ReportDataContract,
    };
    use reportsmith::storage::MemoryFileStore;

    /// Renderer double counting invocations and echoing the format name.
    struct CountingRenderer {
        calls: Arc<AtomicU32>,
    }

    impl RenderEngine for CountingRenderer {
        fn render(
            &self,
            _design_path: &Path,
            format: &OutputFormat,
            _locale: &str,
            _parameters: &BTreeMap<String, String>,
            output: &mut dyn Write,
        ) -> RenderResult<()> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            output.write_all(format.format.as_bytes()).unwrap();
            Ok(())
        }
    }

    fn service_with(contracts: ContractRegistry) -> (ReportService, Arc<AtomicU32>) {
        let mut schema = MemorySchemaSource::new();
        schema.add_source(
            "OrderSummary",
            vec![
                RawField::new("orderId", "id"),
                RawField::new("orderDate", "date-time"),
            ],
        );
        let mut labels = MemoryLabelCatalog::new();
        labels.insert("common", "en", "FormFieldTitle_orderId", "Order Id");

        let calls = Arc::new(AtomicU32::new(0));
        let service = ReportService::new(
            Box::new(schema),
            Box::new(labels),
            contracts,
            Box::new(MemoryProvenanceStore::new()),
            Box::new(MemoryFileStore::new()),
            Box::new(JsonDesignEngine::new()),
            Box::new(CountingRenderer { calls: calls.clone() }),
            Settings::default(),
        );
        (service, calls)
    }

    fn make_master(service: &ReportService) -> String {
        let store = service.provenance();
        let id = store.next_id(NodeKind::Master).unwrap();
        store
            .create_node(ContentNode {
                id: id.clone(),
                kind: NodeKind::Master,
                name: "MASTER_REPORT".to_string(),
                description: None,
                status: ContentStatus::Published,
                body: None,
                storage_path: None,
            })
            .unwrap();
        id
    }

    fn entity_request(master: &str) -> GenerateRequest {
        GenerateRequest {
            report_name: "order_report".to_string(),
            master_content_id: master.to_string(),
            description: Some("Orders by date".to_string()),
            entity_view_name: Some("OrderSummary".to_string()),
            service_name: None,
            write_filters: true,
            locale: "en".to_string(),
        }
    }

    #[test]
    fn test_generate_entity_report_end_to_end() {
        let (service, _) = service_with(ContractRegistry::new());
        let master = make_master(&service);

        let generated = service.generate(&entity_request(&master)).unwrap();
        assert_eq!(generated.design_name, "order_report_generated.rptdesign");

        // Design file persisted and decodable.
        let path = PathBuf::from("runtime/reports/order_report_generated.rptdesign");
        let bytes = service.file_store().read(&path).unwrap();
        let design = DesignDocument::from_json(&path, &bytes).unwrap();
        assert_eq!(design.data_sets[0].retrieval_method, "perform_find");
        assert_eq!(design.data_sets[0].columns.len(), 2);
        // 2 simple sub-fields for orderId + 4 ranged for orderDate.
        assert_eq!(design.parameters.len(), 6);

        // Provenance graph wired up.
        let store = service.provenance();
        let report = store.get_node(&generated.report_id).unwrap().unwrap();
        assert_eq!(report.kind, NodeKind::Report);
        assert_eq!(report.body.as_deref(), Some(generated.form_body.as_str()));
        assert_eq!(
            store.linked_to(&master, AssocType::SubContent).unwrap(),
            vec![generated.report_id.clone()]
        );
        assert_eq!(
            store.attributes(&generated.report_id).unwrap(),
            vec![("Entity".to_string(), "OrderSummary".to_string())]
        );

        // Form carries the filter fields and the scaffold.
        assert!(generated.form_body.contains("orderDate_fld0_op"));
        assert!(generated.form_body.contains("designFile"));
    }

    #[test]
    fn test_generate_twice_yields_distinct_names() {
        let (service, _) = service_with(ContractRegistry::new());
        let master = make_master(&service);

        let first = service.generate(&entity_request(&master)).unwrap();
        let second = service.generate(&entity_request(&master)).unwrap();
        assert_eq!(first.design_name, "order_report_generated.rptdesign");
        assert_eq!(second.design_name, "order_report_generated(1).rptdesign");
        assert_ne!(first.report_id, second.report_id);
    }

    #[test]
    fn test_generate_without_source_fails() {
        let (service, _) = service_with(ContractRegistry::new());
        let master = make_master(&service);
        let mut request = entity_request(&master);
        request.entity_view_name = None;

        let err = service.generate(&request).unwrap_err();
        assert!(matches!(err, ReportError::MissingSource));
    }

    #[test]
    fn test_generate_unknown_entity_leaves_no_artifacts() {
        let (service, _) = service_with(ContractRegistry::new());
        let master = make_master(&service);
        let mut request = entity_request(&master);
        request.entity_view_name = Some("NoSuchView".to_string());

        assert!(matches!(
            service.generate(&request).unwrap_err(),
            ReportError::Schema(_)
        ));
        assert!(service
            .provenance()
            .query_by_kind(NodeKind::Report)
            .unwrap()
            .is_empty());
        // The reservation was released: the base name is free again.
        request.entity_view_name = Some("OrderSummary".to_string());
        let generated = service.generate(&request).unwrap();
        assert_eq!(generated.design_name, "order_report_generated.rptdesign");
    }

    #[test]
    fn test_generate_from_service_contract() {
        let mut contracts = ContractRegistry::new();
        contracts.register(
            "computeOrderStats",
            ReportDataContract {
                data_map: vec![("total".to_string(), SemanticType::CurrencyAmount)],
                field_labels: vec![("total".to_string(), "Total".to_string())],
                filter_map: vec![],
                filter_labels: vec![],
                custom_method_name: "computeOrderStats".to_string(),
            },
        );
        let (service, _) = service_with(contracts);
        let master = make_master(&service);

        let request = GenerateRequest {
            report_name: "order_stats".to_string(),
            master_content_id: master.clone(),
            description: None,
            entity_view_name: None,
            service_name: Some("computeOrderStats".to_string()),
            write_filters: false,
            locale: "en".to_string(),
        };
        let generated = service.generate(&request).unwrap();
        assert!(generated.form_body.contains("serviceName"));
        assert_eq!(
            service.provenance().attributes(&generated.report_id).unwrap(),
            vec![("Service".to_string(), "computeOrderStats".to_string())]
        );

        // Service wins when both sources are supplied.
        let mut both = request.clone();
        both.entity_view_name = Some("OrderSummary".to_string());
        both.report_name = "order_stats_two".to_string();
        let generated = service.generate(&both).unwrap();
        assert_eq!(
            service.provenance().attributes(&generated.report_id).unwrap()[0].0,
            "Service"
        );
    }

    #[test]
    fn test_override_form_round_trip() {
        let (service, _) = service_with(ContractRegistry::new());
        let master = make_master(&service);
        let generated = service.generate(&entity_request(&master)).unwrap();

        let display = service.form_for_display(&generated.report_id).unwrap();
        assert!(!display.contains("designFile"));

        let edited = display.replace("orderId", "customOrderId");
        service.override_form(&generated.report_id, &edited).unwrap();

        let body = service
            .provenance()
            .get_node(&generated.report_id)
            .unwrap()
            .unwrap()
            .body
            .unwrap();
        assert!(body.contains("customOrderId"));
        // The scaffold came back.
        assert!(body.contains("designFile"));
        assert!(body.contains("entityViewName"));
    }

    #[test]
    fn test_override_form_rejects_forbidden_markers() {
        let (service, _) = service_with(ContractRegistry::new());
        let master = make_master(&service);
        let generated = service.generate(&entity_request(&master)).unwrap();
        let before = service
            .provenance()
            .get_node(&generated.report_id)
            .unwrap()
            .unwrap()
            .body;

        let err = service
            .override_form(&generated.report_id, "<form>${groovy:rm()}</form>")
            .unwrap_err();
        assert!(matches!(err, ReportError::Design(_)));
        let after = service
            .provenance()
            .get_node(&generated.report_id)
            .unwrap()
            .unwrap()
            .body;
        assert_eq!(before, after);
    }

    #[test]
    fn test_merge_design_folds_upload_into_stored_document() {
        let (service, _) = service_with(ContractRegistry::new());
        let master = make_master(&service);
        let generated = service.generate(&entity_request(&master)).unwrap();
        let path = PathBuf::from("runtime/reports/order_report_generated.rptdesign");

        let upload = DesignDocument {
            body: vec![reportsmith::design::DesignElement::named("table", "layout")],
            ..Default::default()
        };
        service
            .merge_design(&generated.report_id, &upload.to_json())
            .unwrap();

        let bytes = service.file_store().read(&path).unwrap();
        let stored = DesignDocument::from_json(&path, &bytes).unwrap();
        assert_eq!(stored.body.len(), 1);
        // Scaffold slots survived untouched.
        assert_eq!(stored.parameters.len(), 6);
        assert_eq!(stored.data_sets.len(), 1);
    }

    #[test]
    fn test_merge_design_rejects_forbidden_upload_before_touching_file() {
        let (service, _) = service_with(ContractRegistry::new());
        let master = make_master(&service);
        let generated = service.generate(&entity_request(&master)).unwrap();
        let path = PathBuf::from("runtime/reports/order_report_generated.rptdesign");
        let before = service.file_store().read(&path).unwrap();

        let err = service
            .merge_design(&generated.report_id, b"{\"body\": [{\"tag\": \"${ groovy }\"}]}")
            .unwrap_err();
        assert!(matches!(err, ReportError::Design(_)));
        assert_eq!(service.file_store().read(&path).unwrap(), before);
    }

    #[test]
    fn test_merge_design_rejects_undecodable_upload() {
        let (service, _) = service_with(ContractRegistry::new());
        let master = make_master(&service);
        let generated = service.generate(&entity_request(&master)).unwrap();

        let err = service
            .merge_design(&generated.report_id, b"not a design")
            .unwrap_err();
        assert!(matches!(err, ReportError::Design(_)));
    }

    #[test]
    fn test_export_validates_mime_before_engine() {
        let (service, calls) = service_with(ContractRegistry::new());
        let path = Path::new("runtime/reports/order_report_generated.rptdesign");
        let mut out = Vec::new();

        let err = service
            .export("text/plain", path, "en", &BTreeMap::new(), &mut out)
            .unwrap_err();
        assert!(matches!(err, ReportError::Render(_)));
        assert_eq!(calls.load(Ordering::Relaxed), 0);

        service
            .export("application/pdf", path, "en", &BTreeMap::new(), &mut out)
            .unwrap();
        assert_eq!(calls.load(Ordering::Relaxed), 1);
        assert_eq!(out, b"pdf");
    }

    #[test]
    fn test_delete_report_removes_graph_and_file() {
        let (service, _) = service_with(ContractRegistry::new());
        let master = make_master(&service);
        let generated = service.generate(&entity_request(&master)).unwrap();
        let path = PathBuf::from("runtime/reports/order_report_generated.rptdesign");
        assert!(service.file_store().exists(&path));

        service.delete_report(&generated.report_id).unwrap();
        assert!(service
            .provenance()
            .get_node(&generated.report_id)
            .unwrap()
            .is_none());
        assert!(!service.file_store().exists(&path));

        assert!(matches!(
            service.delete_report(&generated.report_id).unwrap_err(),
            ReportError::Provenance(_)
        ));
    }

    #[test]
    fn test_delete_all_reports_spares_masters() {
        let (service, _) = service_with(ContractRegistry::new());
        let master = make_master(&service);
        service.generate(&entity_request(&master)).unwrap();
        let mut second = entity_request(&master);
        second.report_name = "second_report".to_string();
        service.generate(&second).unwrap();

        let outcome = service.delete_all_reports().unwrap();
        assert!(outcome.all_succeeded());
        assert_eq!(outcome.deleted.len(), 2);
        assert!(service
            .provenance()
            .query_by_kind(NodeKind::Report)
            .unwrap()
            .is_empty());
        assert!(service.provenance().get_node(&master).unwrap().is_some());
    }

    #[test]
    fn test_source_kind_field_names() {
        assert_eq!(SourceKind::Entity.field_name(), "entityViewName");
        assert_eq!(SourceKind::Service.field_name(), "serviceName");
    }
}
