//! Semantic field types and their report-engine mappings.
//!
//! Business entities describe their fields with semantic types
//! ("currency-amount", "id-long", "date-time") that are independent of any
//! storage or rendering representation. The report engine has two much
//! smaller vocabularies: column data types for data-set bindings and
//! parameter data types for report parameters. This module is the single
//! authority for the translation between the three.
//!
//! All maps here are pure and total over [`SemanticType`]. Absence only
//! exists at the string boundary: an unknown or empty type name parses to
//! `None`, and callers must treat that as "this field cannot be rendered"
//! rather than silently dropping the field.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Semantic (business-level) field type.
///
/// The variant set is closed; it mirrors the entity layer's field type
/// vocabulary. Parsing is case-insensitive on the hyphenated wire name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SemanticType {
    Id,
    IdLong,
    IdVlong,
    IdNe,
    IdLongNe,
    IdVlongNe,
    Indicator,
    VeryShort,
    ShortVarchar,
    LongVarchar,
    VeryLong,
    Comment,
    Description,
    Name,
    Value,
    CreditCardNumber,
    CreditCardDate,
    Email,
    Url,
    TelNumber,
    DateTime,
    Date,
    Time,
    CurrencyAmount,
    CurrencyPrecise,
    FixedPoint,
    FloatingPoint,
    Numeric,
    Object,
    Blob,
}

/// Report-engine column data type, used for data-set column bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColumnType {
    String,
    DateTime,
    Date,
    Time,
    Decimal,
    Integer,
    Object,
    Blob,
}

/// Report-engine parameter data type, used for report parameters.
///
/// Distinct from [`ColumnType`]: the parameter vocabulary has no blob
/// variant, so blob fields surface as opaque objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParameterType {
    String,
    DateTime,
    Date,
    Time,
    Decimal,
    Integer,
    Object,
}

/// Filter category for a field, selecting the shape of its filter spec.
///
/// Simple filters take one value and one operator (2 sub-fields); ranged
/// filters take two value/operator pairs expressing an inclusive interval
/// (4 sub-fields). Every semantic type falls in exactly one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKind {
    Simple,
    Ranged,
}

impl SemanticType {
    /// All semantic types, in declaration order. Used by totality tests
    /// and by callers that need to enumerate the vocabulary.
    pub const ALL: [SemanticType; 30] = [
        SemanticType::Id,
        SemanticType::IdLong,
        SemanticType::IdVlong,
        SemanticType::IdNe,
        SemanticType::IdLongNe,
        SemanticType::IdVlongNe,
        SemanticType::Indicator,
        SemanticType::VeryShort,
        SemanticType::ShortVarchar,
        SemanticType::LongVarchar,
        SemanticType::VeryLong,
        SemanticType::Comment,
        SemanticType::Description,
        SemanticType::Name,
        SemanticType::Value,
        SemanticType::CreditCardNumber,
        SemanticType::CreditCardDate,
        SemanticType::Email,
        SemanticType::Url,
        SemanticType::TelNumber,
        SemanticType::DateTime,
        SemanticType::Date,
        SemanticType::Time,
        SemanticType::CurrencyAmount,
        SemanticType::CurrencyPrecise,
        SemanticType::FixedPoint,
        SemanticType::FloatingPoint,
        SemanticType::Numeric,
        SemanticType::Object,
        SemanticType::Blob,
    ];

    /// Parse a semantic type from its wire name, case-insensitively.
    ///
    /// Unknown or empty names yield `None`, never an error.
    pub fn parse(name: &str) -> Option<SemanticType> {
        let name = name.trim().to_ascii_lowercase();
        let parsed = match name.as_str() {
            "id" => SemanticType::Id,
            "id-long" => SemanticType::IdLong,
            "id-vlong" => SemanticType::IdVlong,
            "id-ne" => SemanticType::IdNe,
            "id-long-ne" => SemanticType::IdLongNe,
            "id-vlong-ne" => SemanticType::IdVlongNe,
            "indicator" => SemanticType::Indicator,
            "very-short" => SemanticType::VeryShort,
            "short-varchar" => SemanticType::ShortVarchar,
            "long-varchar" => SemanticType::LongVarchar,
            "very-long" => SemanticType::VeryLong,
            "comment" => SemanticType::Comment,
            "description" => SemanticType::Description,
            "name" => SemanticType::Name,
            "value" => SemanticType::Value,
            "credit-card-number" => SemanticType::CreditCardNumber,
            "credit-card-date" => SemanticType::CreditCardDate,
            "email" => SemanticType::Email,
            "url" => SemanticType::Url,
            "tel-number" => SemanticType::TelNumber,
            "date-time" => SemanticType::DateTime,
            "date" => SemanticType::Date,
            "time" => SemanticType::Time,
            "currency-amount" => SemanticType::CurrencyAmount,
            "currency-precise" => SemanticType::CurrencyPrecise,
            "fixed-point" => SemanticType::FixedPoint,
            "floating-point" => SemanticType::FloatingPoint,
            "numeric" => SemanticType::Numeric,
            "object" => SemanticType::Object,
            "blob" => SemanticType::Blob,
            _ => return None,
        };
        Some(parsed)
    }

    /// Wire name of this semantic type.
    pub fn as_str(&self) -> &'static str {
        match self {
            SemanticType::Id => "id",
            SemanticType::IdLong => "id-long",
            SemanticType::IdVlong => "id-vlong",
            SemanticType::IdNe => "id-ne",
            SemanticType::IdLongNe => "id-long-ne",
            SemanticType::IdVlongNe => "id-vlong-ne",
            SemanticType::Indicator => "indicator",
            SemanticType::VeryShort => "very-short",
            SemanticType::ShortVarchar => "short-varchar",
            SemanticType::LongVarchar => "long-varchar",
            SemanticType::VeryLong => "very-long",
            SemanticType::Comment => "comment",
            SemanticType::Description => "description",
            SemanticType::Name => "name",
            SemanticType::Value => "value",
            SemanticType::CreditCardNumber => "credit-card-number",
            SemanticType::CreditCardDate => "credit-card-date",
            SemanticType::Email => "email",
            SemanticType::Url => "url",
            SemanticType::TelNumber => "tel-number",
            SemanticType::DateTime => "date-time",
            SemanticType::Date => "date",
            SemanticType::Time => "time",
            SemanticType::CurrencyAmount => "currency-amount",
            SemanticType::CurrencyPrecise => "currency-precise",
            SemanticType::FixedPoint => "fixed-point",
            SemanticType::FloatingPoint => "floating-point",
            SemanticType::Numeric => "numeric",
            SemanticType::Object => "object",
            SemanticType::Blob => "blob",
        }
    }

    /// Engine column data type for this semantic type.
    pub fn column_type(&self) -> ColumnType {
        match self {
            SemanticType::Id
            | SemanticType::IdLong
            | SemanticType::IdVlong
            | SemanticType::IdNe
            | SemanticType::IdLongNe
            | SemanticType::IdVlongNe
            | SemanticType::Indicator
            | SemanticType::VeryShort
            | SemanticType::ShortVarchar
            | SemanticType::LongVarchar
            | SemanticType::VeryLong
            | SemanticType::Comment
            | SemanticType::Description
            | SemanticType::Name
            | SemanticType::Value
            | SemanticType::CreditCardNumber
            | SemanticType::CreditCardDate
            | SemanticType::Email
            | SemanticType::Url
            | SemanticType::TelNumber => ColumnType::String,
            SemanticType::DateTime => ColumnType::DateTime,
            SemanticType::Date => ColumnType::Date,
            SemanticType::Time => ColumnType::Time,
            SemanticType::CurrencyAmount
            | SemanticType::CurrencyPrecise
            | SemanticType::FixedPoint
            | SemanticType::FloatingPoint => ColumnType::Decimal,
            SemanticType::Numeric => ColumnType::Integer,
            SemanticType::Object => ColumnType::Object,
            SemanticType::Blob => ColumnType::Blob,
        }
    }

    /// Engine parameter data type for this semantic type.
    pub fn parameter_type(&self) -> ParameterType {
        match self.column_type() {
            ColumnType::String => ParameterType::String,
            ColumnType::DateTime => ParameterType::DateTime,
            ColumnType::Date => ParameterType::Date,
            ColumnType::Time => ParameterType::Time,
            ColumnType::Decimal => ParameterType::Decimal,
            ColumnType::Integer => ParameterType::Integer,
            // The parameter vocabulary has no blob: both map to Object.
            ColumnType::Object | ColumnType::Blob => ParameterType::Object,
        }
    }

    /// Filter category: string-like types take a simple value/operator
    /// pair, everything else (temporal, decimal, integer, object, blob)
    /// takes a ranged pair of pairs.
    pub fn filter_kind(&self) -> FilterKind {
        match self.column_type() {
            ColumnType::String => FilterKind::Simple,
            _ => FilterKind::Ranged,
        }
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<SemanticType> for String {
    fn from(t: SemanticType) -> String {
        t.as_str().to_string()
    }
}

impl TryFrom<String> for SemanticType {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        SemanticType::parse(&s).ok_or_else(|| format!("unknown semantic type: '{}'", s))
    }
}

/// Map a semantic type name to an engine column type.
///
/// Unknown or empty names yield `None`, never an error.
pub fn column_type_for(field_type: &str) -> Option<ColumnType> {
    SemanticType::parse(field_type).map(|t| t.column_type())
}

/// Map a semantic type name to an engine parameter type.
///
/// Unknown or empty names yield `None`, never an error.
pub fn parameter_type_for(field_type: &str) -> Option<ParameterType> {
    SemanticType::parse(field_type).map(|t| t.parameter_type())
}

impl ColumnType {
    /// Wire name used in persisted design documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::String => "string",
            ColumnType::DateTime => "date-time",
            ColumnType::Date => "date",
            ColumnType::Time => "time",
            ColumnType::Decimal => "decimal",
            ColumnType::Integer => "integer",
            ColumnType::Object => "object",
            ColumnType::Blob => "blob",
        }
    }
}

impl ParameterType {
    /// Wire name used in persisted design documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterType::String => "string",
            ParameterType::DateTime => "date-time",
            ParameterType::Date => "date",
            ParameterType::Time => "time",
            ParameterType::Decimal => "decimal",
            ParameterType::Integer => "integer",
            ParameterType::Object => "object",
        }
    }
}
