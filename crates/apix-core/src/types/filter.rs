//! Filter request types handed to a model's filtering capability.
//!
//! A [`FilterRequest`] is what callers send to `list`. The repository only
//! reads its pagination keys; everything else is interpreted by the model.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::sorting::SortField;
use crate::error::AppError;

/// Filter comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    /// Exact equality.
    Eq,
    /// Not equal.
    Ne,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Gte,
    /// Less than.
    Lt,
    /// Less than or equal.
    Lte,
    /// Case-sensitive substring match.
    Like,
    /// Case-insensitive substring match.
    ILike,
    /// List membership.
    In,
    /// Field is missing or null.
    IsNull,
    /// Field is present and not null.
    IsNotNull,
}

/// A dynamic filter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// A boolean value.
    Boolean(bool),
    /// An integer value.
    Integer(i64),
    /// A floating-point value.
    Float(f64),
    /// A string value.
    String(String),
    /// A list of string values (for `In`).
    StringList(Vec<String>),
    /// Null / no value (for `IsNull`, `IsNotNull`).
    Null,
}

impl FilterValue {
    /// Parse a raw query-string value.
    ///
    /// `true`/`false` become booleans, `null` becomes [`FilterValue::Null`],
    /// and a value containing a comma becomes a list. A number is only typed
    /// when it prints back as the same text, so `02134` or `1.50` stay
    /// strings and compare against stored text unchanged.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw {
            "true" => return Self::Boolean(true),
            "false" => return Self::Boolean(false),
            "null" => return Self::Null,
            _ => {}
        }
        if let Ok(i) = raw.parse::<i64>() {
            if i.to_string() == raw {
                return Self::Integer(i);
            }
        }
        if let Ok(f) = raw.parse::<f64>() {
            if f.is_finite() && f.to_string() == raw {
                return Self::Float(f);
            }
        }
        if raw.contains(',') {
            return Self::StringList(
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            );
        }
        Self::String(raw.to_string())
    }

    /// Textual form used for equality against stored scalar values.
    ///
    /// Lists and null have no scalar text form.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Boolean(b) => Some(b.to_string()),
            Self::Integer(i) => Some(i.to_string()),
            Self::Float(f) => Some(f.to_string()),
            Self::String(s) => Some(s.clone()),
            Self::StringList(_) | Self::Null => None,
        }
    }

    /// Numeric form, for range comparisons.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::String(s) => s.parse().ok(),
            _ => None,
        }
    }
}

/// A single filter condition on a named field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterField {
    /// The field name to filter on.
    pub field: String,
    /// The comparison operator.
    pub op: FilterOp,
    /// The value to compare against.
    pub value: FilterValue,
}

impl FilterField {
    /// Create a new filter field.
    pub fn new(field: impl Into<String>, op: FilterOp, value: FilterValue) -> Self {
        Self {
            field: field.into(),
            op,
            value,
        }
    }

    /// Shorthand for an equality filter.
    pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(field, FilterOp::Eq, FilterValue::String(value.into()))
    }

    /// Shorthand for a case-insensitive substring filter.
    pub fn ilike(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::new(field, FilterOp::ILike, FilterValue::String(pattern.into()))
    }
}

/// Base constraints applied before a caller's filters.
///
/// This is the typed counterpart of handing an already-constrained query
/// builder to the model (e.g. "only posts of this blog").
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryScope {
    /// Conditions that every returned entity must satisfy.
    pub constraints: Vec<FilterField>,
}

impl QueryScope {
    /// An empty scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a constraint.
    pub fn with(mut self, constraint: FilterField) -> Self {
        self.constraints.push(constraint);
        self
    }
}

/// Store-specific options forwarded to the model untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryExtras(pub Map<String, Value>);

impl QueryExtras {
    /// No extras.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an option.
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.0.insert(key.into(), value);
        self
    }

    /// Look up an option.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Whether no options are set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Caller-supplied listing parameters.
///
/// `per_page`, `with_pages`, and `page` drive pagination. `search`, `sort`,
/// and `filters` are for the model's filtering capability only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterRequest {
    /// Requested page size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u64>,
    /// Whether the page must carry totals.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub with_pages: Option<bool>,
    /// Requested page number (1-based).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u64>,
    /// Free-text search term.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    /// Sort order, applied left to right.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sort: Vec<SortField>,
    /// Every other key, by field name.
    #[serde(flatten)]
    pub filters: BTreeMap<String, FilterValue>,
}

impl FilterRequest {
    /// An empty request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a request from raw query-string pairs.
    ///
    /// Recognised keys are parsed into their typed fields; a malformed
    /// `per_page`, `page`, or `with_pages` is a validation error. Any other
    /// key is kept as a filter.
    pub fn from_query<I, K, V>(pairs: I) -> Result<Self, AppError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut request = Self::default();
        for (key, value) in pairs {
            let (key, value) = (key.as_ref().trim(), value.as_ref().trim());
            match key {
                "per_page" => request.per_page = Some(parse_number(key, value)?),
                "page" => request.page = Some(parse_number(key, value)?),
                "with_pages" => request.with_pages = Some(parse_flag(value)?),
                "search" => {
                    request.search = (!value.is_empty()).then(|| value.to_string());
                }
                "sort" => request.sort = SortField::parse_list(value),
                _ if key.is_empty() => {}
                _ => {
                    request
                        .filters
                        .insert(key.to_string(), FilterValue::parse(value));
                }
            }
        }
        Ok(request)
    }

    /// Set the page size.
    pub fn per_page(mut self, per_page: u64) -> Self {
        self.per_page = Some(per_page);
        self
    }

    /// Set the page number.
    pub fn page(mut self, page: u64) -> Self {
        self.page = Some(page);
        self
    }

    /// Set the pagination mode.
    pub fn with_pages(mut self, with_pages: bool) -> Self {
        self.with_pages = Some(with_pages);
        self
    }

    /// Set the search term.
    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    /// Append a sort field.
    pub fn sort_by(mut self, sort: SortField) -> Self {
        self.sort.push(sort);
        self
    }

    /// Add a field filter.
    pub fn filter(mut self, field: impl Into<String>, value: FilterValue) -> Self {
        self.filters.insert(field.into(), value);
        self
    }
}

fn parse_number(key: &str, value: &str) -> Result<u64, AppError> {
    value
        .parse::<u64>()
        .map_err(|_| AppError::validation(format!("'{key}' must be a positive integer, got '{value}'")))
}

fn parse_flag(value: &str) -> Result<bool, AppError> {
    match value {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(AppError::validation(format!(
            "'with_pages' must be a boolean, got '{other}'"
        ))),
    }
}
