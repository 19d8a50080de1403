//! Row predicates and ordering for the in-memory model.

use std::cmp::Ordering;

use serde_json::Value;

use apix_core::types::{Attributes, FilterField, FilterOp, FilterValue, SortDirection, SortField};

/// Text form of a scalar JSON value.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn is_absent(value: Option<&Value>) -> bool {
    matches!(value, None | Some(Value::Null))
}

/// Whether a stored value equals a filter value.
///
/// Numbers compare numerically, everything else by text. A stored array
/// matches if any element does.
pub(crate) fn values_equal(stored: Option<&Value>, expected: &FilterValue) -> bool {
    match (stored, expected) {
        (stored, FilterValue::Null) => is_absent(stored),
        (None | Some(Value::Null), _) => false,
        (Some(Value::Array(items)), _) => items.iter().any(|v| values_equal(Some(v), expected)),
        (Some(stored), FilterValue::StringList(options)) => scalar_text(stored)
            .map(|text| options.iter().any(|o| *o == text))
            .unwrap_or(false),
        (Some(Value::Number(n)), expected) => match (n.as_f64(), expected.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => scalar_text(&Value::Number(n.clone())) == expected.as_text(),
        },
        (Some(stored), expected) => scalar_text(stored) == expected.as_text(),
    }
}

fn compare_to(stored: &Value, expected: &FilterValue) -> Option<Ordering> {
    if let (Value::Number(n), Some(b)) = (stored, expected.as_f64()) {
        return n.as_f64().and_then(|a| a.partial_cmp(&b));
    }
    let text = scalar_text(stored)?;
    Some(text.as_str().cmp(expected.as_text()?.as_str()))
}

fn contains(stored: Option<&Value>, pattern: &FilterValue, case_insensitive: bool) -> bool {
    let (Some(text), Some(pattern)) = (stored.and_then(scalar_text), pattern.as_text()) else {
        return false;
    };
    let pattern = pattern.replace('%', "");
    if case_insensitive {
        text.to_lowercase().contains(&pattern.to_lowercase())
    } else {
        text.contains(&pattern)
    }
}

/// Whether a row satisfies one scope constraint.
pub(crate) fn matches_constraint(row: &Attributes, constraint: &FilterField) -> bool {
    let stored = row.get(&constraint.field);
    let ordered = |accept: fn(Ordering) -> bool| {
        stored
            .filter(|v| !v.is_null())
            .and_then(|v| compare_to(v, &constraint.value))
            .map(accept)
            .unwrap_or(false)
    };

    match constraint.op {
        FilterOp::Eq | FilterOp::In => values_equal(stored, &constraint.value),
        FilterOp::Ne => !values_equal(stored, &constraint.value),
        FilterOp::Gt => ordered(|o| o == Ordering::Greater),
        FilterOp::Gte => ordered(|o| o != Ordering::Less),
        FilterOp::Lt => ordered(|o| o == Ordering::Less),
        FilterOp::Lte => ordered(|o| o != Ordering::Greater),
        FilterOp::Like => contains(stored, &constraint.value, false),
        FilterOp::ILike => contains(stored, &constraint.value, true),
        FilterOp::IsNull => is_absent(stored),
        FilterOp::IsNotNull => !is_absent(stored),
    }
}

/// Whether any searchable string field contains `term`, ignoring case.
///
/// With no explicit fields, every top-level string field is searched.
pub(crate) fn matches_search(row: &Attributes, term: &str, fields: &[String]) -> bool {
    let term = term.to_lowercase();
    let hit = |value: &Value| {
        value
            .as_str()
            .map(|s| s.to_lowercase().contains(&term))
            .unwrap_or(false)
    };
    if fields.is_empty() {
        row.values().any(hit)
    } else {
        fields.iter().filter_map(|f| row.get(f)).any(hit)
    }
}

/// Sort rank of a JSON type; values of different types order by rank.
fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Bool(_)) => 1,
        Some(Value::Number(_)) => 2,
        Some(Value::String(_)) => 3,
        Some(Value::Array(_)) => 4,
        Some(Value::Object(_)) => 5,
    }
}

/// Total order over stored values: null < bool < number < string < array
/// < object, then by value within a type.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or_default(), y.as_f64().unwrap_or_default());
            x.total_cmp(&y)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(x @ (Value::Array(_) | Value::Object(_))), Some(y))
            if type_rank(Some(x)) == type_rank(Some(y)) =>
        {
            x.to_string().cmp(&y.to_string())
        }
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

/// Order rows by the sort fields, then by `id`.
pub(crate) fn compare_rows(a: &Attributes, b: &Attributes, sort: &[SortField]) -> Ordering {
    sort.iter()
        .map(|s| {
            let ord = compare_values(a.get(&s.field), b.get(&s.field));
            match s.direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        })
        .find(|o| *o != Ordering::Equal)
        .unwrap_or_else(|| compare_values(a.get("id"), b.get("id")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Attributes {
        match value {
            Value::Object(map) => map,
            _ => unreachable!("test rows are objects"),
        }
    }

    #[test]
    fn test_equality_across_types() {
        let r = row(json!({"views": 10, "status": "draft", "tags": ["rust", "orm"], "ok": true}));
        assert!(values_equal(r.get("views"), &FilterValue::Integer(10)));
        assert!(values_equal(r.get("views"), &FilterValue::String("10".into())));
        assert!(values_equal(r.get("status"), &FilterValue::String("draft".into())));
        assert!(values_equal(r.get("tags"), &FilterValue::String("orm".into())));
        assert!(values_equal(r.get("ok"), &FilterValue::Boolean(true)));
        assert!(values_equal(
            r.get("status"),
            &FilterValue::StringList(vec!["published".into(), "draft".into()])
        ));
        assert!(values_equal(r.get("missing"), &FilterValue::Null));
        assert!(!values_equal(r.get("missing"), &FilterValue::Integer(1)));
    }

    #[test]
    fn test_range_constraints() {
        let r = row(json!({"views": 10, "published_at": "2024-03-01"}));
        assert!(matches_constraint(
            &r,
            &FilterField::new("views", FilterOp::Gte, FilterValue::Integer(10))
        ));
        assert!(!matches_constraint(
            &r,
            &FilterField::new("views", FilterOp::Gt, FilterValue::Integer(10))
        ));
        assert!(matches_constraint(
            &r,
            &FilterField::new("published_at", FilterOp::Lt, FilterValue::String("2024-04-01".into()))
        ));
        assert!(!matches_constraint(
            &r,
            &FilterField::new("missing", FilterOp::Lt, FilterValue::Integer(5))
        ));
    }

    #[test]
    fn test_like_and_search() {
        let r = row(json!({"title": "Hello World", "body": "rust"}));
        assert!(matches_constraint(&r, &FilterField::ilike("title", "%world%")));
        assert!(!matches_constraint(
            &r,
            &FilterField::new("title", FilterOp::Like, FilterValue::String("world".into()))
        ));
        assert!(matches_search(&r, "RUST", &[]));
        assert!(!matches_search(&r, "rust", &["title".to_string()]));
    }

    #[test]
    fn test_compare_rows_falls_back_to_id() {
        let a = row(json!({"id": 1, "rank": 2}));
        let b = row(json!({"id": 2, "rank": 2}));
        assert_eq!(compare_rows(&a, &b, &[SortField::desc("rank")]), Ordering::Less);
        assert_eq!(compare_rows(&a, &b, &[]), Ordering::Less);
    }

    #[test]
    fn test_mixed_types_sort_by_type_then_value() {
        let mut values = vec![
            json!("5"),
            json!(10),
            json!(null),
            json!(9),
            json!("10"),
            json!(true),
            json!(2.5),
            json!(["a"]),
            json!("abc"),
        ];
        values.sort_by(|a, b| compare_values(Some(a), Some(b)));
        assert_eq!(
            values,
            vec![
                json!(null),
                json!(true),
                json!(2.5),
                json!(9),
                json!(10),
                json!("10"),
                json!("5"),
                json!("abc"),
                json!(["a"]),
            ]
        );

        assert_eq!(compare_values(Some(&json!(9)), Some(&json!("5"))), Ordering::Less);
        assert_eq!(compare_values(Some(&json!("5")), Some(&json!(10))), Ordering::Greater);
    }
}
