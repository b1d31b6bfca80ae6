#[cfg(test)]
mod tests {
    use reportsmith::mapping::SemanticType;
    use reportsmith::schema::{
        introspect, MemoryLabelCatalog, MemorySchemaSource, RawField, SchemaError,
    };

    fn bundles() -> Vec<String> {
        vec!["common".to_string(), "reports".to_string()]
    }

    fn order_source() -> MemorySchemaSource {
        let mut schema = MemorySchemaSource::new();
        schema.add_source(
            "OrderSummary",
            vec![
                RawField::new("orderId", "id"),
                RawField::new("orderDate", "date-time"),
                RawField::new("comments", "description"),
            ],
        );
        schema
    }

    #[test]
    fn test_contract_shape_for_mixed_fields() {
        let schema = order_source();
        let labels = MemoryLabelCatalog::new();
        let contract =
            introspect("OrderSummary", "en", &schema, &labels, &bundles()).unwrap();

        assert_eq!(contract.custom_method_name, "perform_find");
        assert_eq!(
            contract.data_map,
            vec![
                ("orderId".to_string(), SemanticType::Id),
                ("orderDate".to_string(), SemanticType::DateTime),
                ("comments".to_string(), SemanticType::Description),
            ]
        );

        // orderId (simple): 2 sub-fields. orderDate (ranged): 4.
        // comments (simple): 2. Operator sub-fields are short-varchar.
        let names: Vec<&str> = contract.filter_map.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "orderId",
                "orderId_op",
                "orderDate_fld0_op",
                "orderDate_fld0_value",
                "orderDate_fld1_op",
                "orderDate_fld1_value",
                "comments",
                "comments_op",
            ]
        );
        assert_eq!(contract.type_for("orderId"), Some(SemanticType::Id));
        let op_type = contract
            .filter_map
            .iter()
            .find(|(n, _)| n == "orderDate_fld0_op")
            .map(|(_, t)| *t);
        assert_eq!(op_type, Some(SemanticType::ShortVarchar));
        let value_type = contract
            .filter_map
            .iter()
            .find(|(n, _)| n == "orderDate_fld1_value")
            .map(|(_, t)| *t);
        assert_eq!(value_type, Some(SemanticType::DateTime));
    }

    #[test]
    fn test_filter_labels_carry_qualifiers() {
        let schema = order_source();
        let mut labels = MemoryLabelCatalog::new();
        labels.insert("common", "en", "FormFieldTitle_orderDate", "Order Date");
        let contract =
            introspect("OrderSummary", "en", &schema, &labels, &bundles()).unwrap();

        let label_for = |name: &str| {
            contract
                .filter_labels
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, l)| l.clone())
                .unwrap()
        };
        assert_eq!(label_for("orderDate_fld0_op"), "Order Date field 0 operator");
        assert_eq!(label_for("orderDate_fld0_value"), "Order Date field 0");
        assert_eq!(label_for("orderDate_fld1_op"), "Order Date field 1 operator");
        assert_eq!(label_for("orderDate_fld1_value"), "Order Date field 1");
        // Unlabeled field falls back to its raw name.
        assert_eq!(label_for("orderId_op"), "orderId operator");
    }

    #[test]
    fn test_first_bundle_hit_wins() {
        let mut schema = MemorySchemaSource::new();
        schema.add_source("Party", vec![RawField::new("partyId", "id")]);
        let mut labels = MemoryLabelCatalog::new();
        labels.insert("common", "en", "FormFieldTitle_partyId", "Party (common)");
        labels.insert("reports", "en", "FormFieldTitle_partyId", "Party (reports)");

        let contract = introspect("Party", "en", &schema, &labels, &bundles()).unwrap();
        assert_eq!(contract.label_for("partyId"), Some("Party (common)"));
    }

    #[test]
    fn test_missing_source_fails() {
        let schema = MemorySchemaSource::new();
        let labels = MemoryLabelCatalog::new();
        let err = introspect("NoSuchView", "en", &schema, &labels, &bundles()).unwrap_err();
        assert!(matches!(err, SchemaError::NotFound(name) if name == "NoSuchView"));
    }

    #[test]
    fn test_unsupported_field_type_fails_whole_derivation() {
        let mut schema = MemorySchemaSource::new();
        schema.add_source(
            "Geo",
            vec![
                RawField::new("geoId", "id"),
                RawField::new("location", "geo-point"),
            ],
        );
        let labels = MemoryLabelCatalog::new();
        let err = introspect("Geo", "en", &schema, &labels, &bundles()).unwrap_err();
        match err {
            SchemaError::UnsupportedFieldType { source, field, field_type } => {
                assert_eq!(source, "Geo");
                assert_eq!(field, "location");
                assert_eq!(field_type, "geo-point");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_localized_qualifiers() {
        let mut schema = MemorySchemaSource::new();
        schema.add_source("Invoice", vec![RawField::new("invoiceDate", "date")]);
        let mut labels = MemoryLabelCatalog::new();
        labels.insert("common", "fr", "FormFieldTitle_invoiceDate", "Date de facture");
        labels.insert("reports", "fr", "operator", " opérateur");
        labels.insert("reports", "fr", "fieldZero", " champ 0");
        labels.insert("reports", "fr", "fieldOne", " champ 1");

        let contract = introspect("Invoice", "fr_BE", &schema, &labels, &bundles()).unwrap();
        let label = contract
            .filter_labels
            .iter()
            .find(|(n, _)| n == "invoiceDate_fld0_op")
            .map(|(_, l)| l.clone())
            .unwrap();
        assert_eq!(label, "Date de facture champ 0 opérateur");
    }
}
