//! Table and JSON output formatting for CLI commands.

use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::Value;
use tabled::builder::Builder;
use tabled::{Table, Tabled};

use apix_core::types::{Page, Record};

/// Output format selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// JSON output
    Json,
}

/// Print a list of items in the selected format
pub fn print_list<T: Serialize + Tabled>(items: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            if items.is_empty() {
                println!("No results found.");
            } else {
                let table = Table::new(items).to_string();
                println!("{}", table);
            }
        }
        OutputFormat::Json => print_json(&items, "[]"),
    }
}

/// Print a page of records followed by its pagination footer
pub fn print_page(page: &Page<Record>, format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            if page.is_empty() {
                println!("No results found.");
            } else {
                println!("{}", records_table(page.items()));
            }
            println!("{}", page_footer(page));
        }
        OutputFormat::Json => print_json(page, "{}"),
    }
}

/// Print a single record
pub fn print_record(record: &Record, format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            let mut builder = Builder::default();
            builder.push_record(["field".to_string(), "value".to_string()]);
            builder.push_record(["id".to_string(), record.id.to_string()]);
            for (key, value) in &record.data {
                builder.push_record([key.clone(), cell(value)]);
            }
            builder.push_record(["created_at".to_string(), record.created_at.to_rfc3339()]);
            builder.push_record(["updated_at".to_string(), record.updated_at.to_rfc3339()]);
            println!("{}", builder.build());
        }
        OutputFormat::Json => print_json(record, "{}"),
    }
}

/// Print a success message
pub fn print_success(msg: &str) {
    println!("✓ {}", msg);
}

/// Print a warning message
pub fn print_warning(msg: &str) {
    println!("⚠ {}", msg);
}

/// Print an error message
pub fn print_error(msg: &str) {
    eprintln!("✗ {}", msg);
}

fn print_json<T: Serialize + ?Sized>(value: &T, fallback: &str) {
    let json = serde_json::to_string_pretty(value).unwrap_or_else(|_| fallback.to_string());
    println!("{}", json);
}

/// Render records with one column per field seen on any of them.
fn records_table(records: &[Record]) -> String {
    let fields: BTreeSet<&str> = records
        .iter()
        .flat_map(|r| r.data.keys().map(String::as_str))
        .collect();

    let mut builder = Builder::default();
    builder.push_record(
        std::iter::once("id")
            .chain(fields.iter().copied())
            .chain(["created_at", "updated_at"])
            .map(str::to_string),
    );
    for record in records {
        builder.push_record(
            std::iter::once(record.id.to_string())
                .chain(fields.iter().map(|f| record.get(f).map(cell).unwrap_or_default()))
                .chain([
                    record.created_at.format("%Y-%m-%d %H:%M").to_string(),
                    record.updated_at.format("%Y-%m-%d %H:%M").to_string(),
                ]),
        );
    }
    builder.build().to_string()
}

fn page_footer<T>(page: &Page<T>) -> String {
    match page {
        Page::LengthAware(p) => format!(
            "Page {} of {} ({} total)",
            p.page, p.total_pages, p.total_items
        ),
        Page::Simple(p) if p.has_more => format!("Page {} (more available)", p.page),
        Page::Simple(p) => format!("Page {}", p.page),
    }
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apix_core::types::{EntityId, LengthAwarePage, PageRequest, SimplePage};
    use chrono::Utc;
    use serde_json::json;

    fn record(id: i64, data: Value) -> Record {
        Record {
            id: EntityId(id),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            data: data.as_object().cloned().unwrap_or_default(),
        }
    }

    #[test]
    fn test_records_table_unions_fields() {
        let table = records_table(&[
            record(1, json!({"title": "A"})),
            record(2, json!({"views": 3, "note": null})),
        ]);
        let header = table.lines().nth(1).unwrap_or_default();
        for column in ["id", "note", "title", "views", "created_at", "updated_at"] {
            assert!(header.contains(column), "missing {column} in {header}");
        }
        assert!(table.contains("| A "));
    }

    #[test]
    fn test_page_footer() {
        let request = PageRequest::new(2, 10);
        let page: Page<()> = Page::LengthAware(LengthAwarePage::new(vec![], &request, 25));
        assert_eq!(page_footer(&page), "Page 2 of 3 (25 total)");

        let page: Page<u8> = Page::Simple(SimplePage::from_lookahead(vec![0; 11], &request));
        assert_eq!(page_footer(&page), "Page 2 (more available)");
    }
}
