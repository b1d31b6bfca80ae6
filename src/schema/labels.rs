//! Locale-qualified display label lookup.
//!
//! Field labels are resolved against an ordered list of label bundles
//! (application areas each ship their own), keyed `FormFieldTitle_<field>`.
//! The first bundle with a hit wins; a field with no localized label falls
//! back to its raw name.

use std::collections::HashMap;

/// Bundle search order consulted when no explicit order is configured.
pub const DEFAULT_LABEL_BUNDLES: [&str; 7] = [
    "orders",
    "products",
    "parties",
    "content",
    "accounting",
    "common",
    "reports",
];

/// Key prefix for field title labels.
pub(crate) const FIELD_TITLE_PREFIX: &str = "FormFieldTitle_";

/// Capability over the external localized-message store.
pub trait LabelResolver {
    /// The message under `key` in `bundle` for `locale`, if any.
    fn message(&self, bundle: &str, key: &str, locale: &str) -> Option<String>;
}

/// Resolve a field's display label across the bundle search order,
/// falling back to the raw field name.
pub(crate) fn field_label(
    labels: &dyn LabelResolver,
    bundles: &[String],
    field: &str,
    locale: &str,
) -> String {
    let key = format!("{}{}", FIELD_TITLE_PREFIX, field);
    for bundle in bundles {
        if let Some(label) = labels.message(bundle, &key, locale) {
            return label;
        }
    }
    field.to_string()
}

/// Qualifier appended to ranged sub-field labels ("field zero" etc.).
/// Looked up in the reports bundle; English defaults otherwise.
pub(crate) fn qualifier(labels: &dyn LabelResolver, key: &str, locale: &str) -> String {
    labels
        .message("reports", key, locale)
        .unwrap_or_else(|| match key {
            "operator" => " operator".to_string(),
            "fieldZero" => " field 0".to_string(),
            "fieldOne" => " field 1".to_string(),
            other => format!(" {}", other),
        })
}

/// In-memory label catalog keyed by (bundle, locale).
///
/// Lookup tries the exact locale first, then the bare language tag
/// ("fr_BE" falls back to "fr").
#[derive(Debug, Default)]
pub struct MemoryLabelCatalog {
    entries: HashMap<(String, String), HashMap<String, String>>,
}

impl MemoryLabelCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a label.
    pub fn insert(
        &mut self,
        bundle: impl Into<String>,
        locale: impl Into<String>,
        key: impl Into<String>,
        label: impl Into<String>,
    ) {
        self.entries
            .entry((bundle.into(), locale.into()))
            .or_default()
            .insert(key.into(), label.into());
    }
}

impl LabelResolver for MemoryLabelCatalog {
    fn message(&self, bundle: &str, key: &str, locale: &str) -> Option<String> {
        if let Some(bundle_map) = self
            .entries
            .get(&(bundle.to_string(), locale.to_string()))
        {
            if let Some(label) = bundle_map.get(key) {
                return Some(label.clone());
            }
        }
        let language = locale
            .split(['_', '-'])
            .next()
            .unwrap_or(locale);
        if language != locale {
            if let Some(bundle_map) = self
                .entries
                .get(&(bundle.to_string(), language.to_string()))
            {
                return bundle_map.get(key).cloned();
            }
        }
        None
    }
}
