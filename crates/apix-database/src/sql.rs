//! SQL fragments for record tables.
//!
//! Identifiers are interpolated into statements, so every table and field
//! name passes [`validate_identifier`] first. Values are always bound.

use sqlx::{Postgres, QueryBuilder};

use apix_core::error::AppError;
use apix_core::result::AppResult;
use apix_core::types::{FilterField, FilterOp, FilterValue, SortDirection, SortField};

/// Columns every record table has.
pub(crate) const SELECT_COLUMNS: &str = "id, data, created_at, updated_at";

/// Reject anything but `[A-Za-z_][A-Za-z0-9_]*`.
pub(crate) fn validate_identifier(name: &str) -> AppResult<()> {
    let mut chars = name.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(AppError::validation(format!("Invalid identifier '{name}'")))
    }
}

/// Escape `LIKE` wildcards in user input.
pub(crate) fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// A data key as a number, or NULL when it holds anything else.
fn number_expr(key: &str) -> String {
    format!(
        "(CASE WHEN jsonb_typeof(data->'{key}') = 'number' \
         THEN (data->>'{key}')::double precision END)"
    )
}

/// Where a field lives in a record table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Column {
    /// The `id` column.
    Id,
    /// `created_at` or `updated_at`.
    Timestamp(&'static str),
    /// A key of the JSONB `data` column.
    Data(String),
}

impl Column {
    pub(crate) fn parse(field: &str) -> AppResult<Self> {
        match field {
            "id" => Ok(Self::Id),
            "created_at" => Ok(Self::Timestamp("created_at")),
            "updated_at" => Ok(Self::Timestamp("updated_at")),
            other => {
                validate_identifier(other)?;
                Ok(Self::Data(other.to_string()))
            }
        }
    }

    /// Expression yielding the value as text.
    fn text(&self) -> String {
        match self {
            Self::Id => "id::text".to_string(),
            Self::Timestamp(col) => format!("{col}::text"),
            Self::Data(key) => format!("data->>'{key}'"),
        }
    }

    /// Expression used for ordering.
    fn ordering(&self) -> String {
        match self {
            Self::Id => "id".to_string(),
            Self::Timestamp(col) => (*col).to_string(),
            Self::Data(key) => format!("data->'{key}'"),
        }
    }
}

/// A value bound to a placeholder.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Bind {
    Text(String),
    Float(f64),
    TextList(Vec<String>),
    IntList(Vec<i64>),
}

#[derive(Debug, Clone, PartialEq)]
enum Part {
    Sql(String),
    Bind(Bind),
}

/// One boolean condition, kept as SQL text interleaved with binds so it
/// can be rendered into several statements.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Predicate {
    parts: Vec<Part>,
}

impl Predicate {
    fn sql(mut self, sql: impl Into<String>) -> Self {
        self.parts.push(Part::Sql(sql.into()));
        self
    }

    fn bind(mut self, value: Bind) -> Self {
        self.parts.push(Part::Bind(value));
        self
    }

    pub(crate) fn push_to(&self, qb: &mut QueryBuilder<'static, Postgres>) {
        for part in &self.parts {
            match part {
                Part::Sql(sql) => {
                    qb.push(sql);
                }
                Part::Bind(Bind::Text(v)) => {
                    qb.push_bind(v.clone());
                }
                Part::Bind(Bind::Float(v)) => {
                    qb.push_bind(*v);
                }
                Part::Bind(Bind::TextList(v)) => {
                    qb.push_bind(v.clone());
                }
                Part::Bind(Bind::IntList(v)) => {
                    qb.push_bind(v.clone());
                }
            }
        }
    }

    /// Equality on a field. Numeric values also match stored numbers by
    /// value. A JSON array field matches if it contains the value as a
    /// string element.
    pub(crate) fn equals(field: &str, value: &FilterValue) -> AppResult<Self> {
        let column = Column::parse(field)?;
        let expr = column.text();
        let predicate = match (value, &column) {
            (FilterValue::Null, _) => Self::default().sql(format!("{expr} IS NULL")),
            (FilterValue::StringList(options), Column::Data(key)) => Self::default()
                .sql(format!("{expr} = ANY("))
                .bind(Bind::TextList(options.clone()))
                .sql(format!(
                    ") OR (jsonb_typeof(data->'{key}') = 'array' AND data->'{key}' ?| "
                ))
                .bind(Bind::TextList(options.clone()))
                .sql(")"),
            (FilterValue::StringList(options), _) => Self::default()
                .sql(format!("{expr} = ANY("))
                .bind(Bind::TextList(options.clone()))
                .sql(")"),
            (scalar, Column::Data(key)) => {
                let text = scalar.as_text().unwrap_or_default();
                let mut predicate = Self::default()
                    .sql(format!("{expr} = "))
                    .bind(Bind::Text(text.clone()));
                if let Some(number) = scalar.as_f64().filter(|n| n.is_finite()) {
                    predicate = predicate
                        .sql(format!(" OR {} = ", number_expr(key)))
                        .bind(Bind::Float(number));
                }
                predicate
                    .sql(format!(
                        " OR (jsonb_typeof(data->'{key}') = 'array' AND data->'{key}' ? "
                    ))
                    .bind(Bind::Text(text))
                    .sql(")")
            }
            (scalar, _) => Self::default()
                .sql(format!("{expr} = "))
                .bind(Bind::Text(scalar.as_text().unwrap_or_default())),
        };
        Ok(predicate)
    }

    /// A scope constraint.
    pub(crate) fn constraint(constraint: &FilterField) -> AppResult<Self> {
        let column = Column::parse(&constraint.field)?;
        let text = column.text();
        let value = &constraint.value;

        let predicate = match constraint.op {
            FilterOp::Eq | FilterOp::In => return Self::equals(&constraint.field, value),
            FilterOp::Ne => Self::default()
                .sql("NOT (")
                .sql(format!("{text} IS NOT NULL AND ("))
                .merge(Self::equals(&constraint.field, value)?)
                .sql("))"),
            FilterOp::IsNull => Self::default().sql(format!("{text} IS NULL")),
            FilterOp::IsNotNull => Self::default().sql(format!("{text} IS NOT NULL")),
            FilterOp::Like | FilterOp::ILike => {
                let keyword = if constraint.op == FilterOp::Like {
                    "LIKE"
                } else {
                    "ILIKE"
                };
                let pattern = value.as_text().ok_or_else(|| {
                    AppError::validation(format!("'{}' needs a text pattern", constraint.field))
                })?;
                let pattern = if pattern.contains('%') {
                    pattern
                } else {
                    format!("%{}%", escape_like(&pattern))
                };
                Self::default()
                    .sql(format!("{text} {keyword} "))
                    .bind(Bind::Text(pattern))
            }
            FilterOp::Gt | FilterOp::Gte | FilterOp::Lt | FilterOp::Lte => {
                let op = match constraint.op {
                    FilterOp::Gt => ">",
                    FilterOp::Gte => ">=",
                    FilterOp::Lt => "<",
                    _ => "<=",
                };
                Self::range(&column, op, value)?
            }
        };
        Ok(predicate)
    }

    fn range(column: &Column, op: &str, value: &FilterValue) -> AppResult<Self> {
        let numeric = matches!(value, FilterValue::Integer(_) | FilterValue::Float(_));
        let predicate = match (column, numeric) {
            (Column::Id, true) => Self::default()
                .sql(format!("id::double precision {op} "))
                .bind(Bind::Float(value.as_f64().unwrap_or_default())),
            (Column::Data(key), true) => Self::default()
                .sql(format!("{} {op} ", number_expr(key)))
                .bind(Bind::Float(value.as_f64().unwrap_or_default())),
            (Column::Timestamp(col), false) => Self::default()
                .sql(format!("{col} {op} CAST("))
                .bind(Bind::Text(value.as_text().unwrap_or_default()))
                .sql(" AS timestamptz)"),
            (Column::Data(key), false) => Self::default()
                .sql(format!("data->>'{key}' {op} "))
                .bind(Bind::Text(value.as_text().ok_or_else(|| {
                    AppError::validation(format!("'{key}' needs a scalar bound"))
                })?)),
            (Column::Id, false) | (Column::Timestamp(_), true) => {
                return Err(AppError::validation(
                    "Range bound does not match the field type",
                ));
            }
        };
        Ok(predicate)
    }

    /// Case-insensitive substring search over string fields.
    pub(crate) fn search(term: &str, fields: &[String]) -> AppResult<Self> {
        let pattern = format!("%{}%", escape_like(term));
        if fields.is_empty() {
            return Ok(Self::default()
                .sql(
                    "EXISTS (SELECT 1 FROM jsonb_each_text(data) AS kv(key, value) \
                     WHERE jsonb_typeof(data->kv.key) = 'string' AND kv.value ILIKE ",
                )
                .bind(Bind::Text(pattern))
                .sql(")"));
        }

        let mut predicate = Self::default();
        for (i, field) in fields.iter().enumerate() {
            validate_identifier(field)?;
            if i > 0 {
                predicate = predicate.sql(" OR ");
            }
            predicate = predicate
                .sql(format!("data->>'{field}' ILIKE "))
                .bind(Bind::Text(pattern.clone()));
        }
        Ok(predicate)
    }

    /// Restrict to the given ids.
    pub(crate) fn ids(ids: Vec<i64>) -> Self {
        Self::default()
            .sql("id = ANY(")
            .bind(Bind::IntList(ids))
            .sql(")")
    }

    fn merge(mut self, other: Self) -> Self {
        self.parts.extend(other.parts);
        self
    }
}

/// An `ORDER BY` term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct OrderTerm(String);

impl OrderTerm {
    pub(crate) fn parse(sort: &SortField) -> AppResult<Self> {
        let expr = Column::parse(&sort.field)?.ordering();
        let nulls = match sort.direction {
            SortDirection::Asc => "NULLS FIRST",
            SortDirection::Desc => "NULLS LAST",
        };
        Ok(Self(format!("{expr} {} {nulls}", sort.direction.as_sql())))
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(predicate: &Predicate) -> String {
        let mut qb = QueryBuilder::new("");
        predicate.push_to(&mut qb);
        qb.sql().to_string()
    }

    #[test]
    fn test_validate_identifier() {
        assert!(validate_identifier("author_id").is_ok());
        assert!(validate_identifier("_x1").is_ok());
        assert!(validate_identifier("1x").is_err());
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("a'b").is_err());
    }

    #[test]
    fn test_equality_on_data_field() {
        let p = Predicate::equals("status", &FilterValue::String("draft".into())).unwrap();
        assert_eq!(
            render(&p),
            "data->>'status' = $1 OR (jsonb_typeof(data->'status') = 'array' AND data->'status' ? $2)"
        );
    }

    #[test]
    fn test_equality_on_generated_columns() {
        let p = Predicate::equals("id", &FilterValue::Integer(4)).unwrap();
        assert_eq!(render(&p), "id::text = $1");

        let p = Predicate::equals("tags", &FilterValue::StringList(vec!["a".into()])).unwrap();
        assert_eq!(
            render(&p),
            "data->>'tags' = ANY($1) OR (jsonb_typeof(data->'tags') = 'array' AND data->'tags' ?| $2)"
        );

        let p = Predicate::equals("deleted_at", &FilterValue::Null).unwrap();
        assert_eq!(render(&p), "data->>'deleted_at' IS NULL");
    }

    #[test]
    fn test_numeric_equality_matches_stored_numbers() {
        let p = Predicate::equals("views", &FilterValue::Integer(10)).unwrap();
        assert_eq!(
            render(&p),
            "data->>'views' = $1 \
             OR (CASE WHEN jsonb_typeof(data->'views') = 'number' \
             THEN (data->>'views')::double precision END) = $2 \
             OR (jsonb_typeof(data->'views') = 'array' AND data->'views' ? $3)"
        );
        assert_eq!(p.parts[3], Part::Bind(Bind::Float(10.0)));
    }

    #[test]
    fn test_range_constraints() {
        let p = Predicate::constraint(&FilterField::new(
            "views",
            FilterOp::Gte,
            FilterValue::Integer(10),
        ))
        .unwrap();
        assert_eq!(
            render(&p),
            "(CASE WHEN jsonb_typeof(data->'views') = 'number' \
             THEN (data->>'views')::double precision END) >= $1"
        );

        let p = Predicate::constraint(&FilterField::new(
            "created_at",
            FilterOp::Lt,
            FilterValue::String("2024-01-01T00:00:00Z".into()),
        ))
        .unwrap();
        assert_eq!(render(&p), "created_at < CAST($1 AS timestamptz)");

        let err = Predicate::constraint(&FilterField::new(
            "created_at",
            FilterOp::Lt,
            FilterValue::Integer(3),
        ))
        .unwrap_err();
        assert_eq!(err.kind, apix_core::error::ErrorKind::Validation);
    }

    #[test]
    fn test_like_wraps_plain_patterns() {
        let p = Predicate::constraint(&FilterField::ilike("title", "50%_off")).unwrap();
        assert_eq!(render(&p), "data->>'title' ILIKE $1");
        assert_eq!(
            p.parts[1],
            Part::Bind(Bind::Text("50%_off".into()))
        );

        let p = Predicate::constraint(&FilterField::ilike("title", "rust_lang")).unwrap();
        assert_eq!(p.parts[1], Part::Bind(Bind::Text("%rust\\_lang%".into())));
    }

    #[test]
    fn test_search_over_fields() {
        let p = Predicate::search("hi", &["title".into(), "body".into()]).unwrap();
        assert_eq!(
            render(&p),
            "data->>'title' ILIKE $1 OR data->>'body' ILIKE $2"
        );
        assert!(Predicate::search("hi", &["bad field".into()]).is_err());
    }

    #[test]
    fn test_order_terms() {
        assert_eq!(
            OrderTerm::parse(&SortField::desc("views")).unwrap().as_str(),
            "data->'views' DESC NULLS LAST"
        );
        assert_eq!(
            OrderTerm::parse(&SortField::asc("created_at")).unwrap().as_str(),
            "created_at ASC NULLS FIRST"
        );
        assert!(OrderTerm::parse(&SortField::asc("x;y")).is_err());
    }

    #[test]
    fn test_field_names_are_validated() {
        let err = Predicate::equals("a'--", &FilterValue::Integer(1)).unwrap_err();
        assert_eq!(err.kind, apix_core::error::ErrorKind::Validation);
    }
}
