use crate::domains::application::types::Application;
use crate::domains::export::types::DetailRow;
use crate::domains::form::types::FieldValue;
use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::OnceLock;

fn iso_timestamp_regex() -> &'static Regex {
    static ISO_TIMESTAMP: OnceLock<Regex> = OnceLock::new();
    ISO_TIMESTAMP.get_or_init(|| {
        Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}").expect("Invalid timestamp regex pattern")
    })
}

/// `dateOfBirth` -> `Date Of Birth`
pub fn format_field_name(key: &str) -> String {
    let mut name = String::with_capacity(key.len() + 4);
    for ch in key.chars() {
        if ch.is_ascii_uppercase() {
            name.push(' ');
        }
        name.push(ch);
    }

    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => name,
    }
}

/// `Sep 15, 2023`
pub fn format_date(dt: &DateTime<Utc>) -> String {
    dt.format("%b %-d, %Y").to_string()
}

pub fn format_field_value(value: &FieldValue) -> String {
    match value {
        FieldValue::Absent => "N/A".to_string(),
        FieldValue::Bool(true) => "Yes".to_string(),
        FieldValue::Bool(false) => "No".to_string(),
        FieldValue::Date(dt) => format_date(dt),
        FieldValue::Text(text) if iso_timestamp_regex().is_match(text) => {
            match DateTime::parse_from_rfc3339(text) {
                Ok(dt) => format_date(&dt.with_timezone(&Utc)),
                Err(_) => text.clone(),
            }
        }
        other => other.to_string(),
    }
}

/// Rows for every stored answer, in stored order.
pub fn detail_rows(application: &Application) -> Vec<DetailRow> {
    application
        .form_data
        .iter()
        .map(|(key, value)| DetailRow::new(format_field_name(key), format_field_value(value)))
        .collect()
}

/// The header block shown above the details.
pub fn header_rows(application: &Application) -> Vec<DetailRow> {
    vec![
        DetailRow::new("Application ID", application.id.clone()),
        DetailRow::new("Insurance Type", application.insurance_type.clone()),
        DetailRow::new("Submitted", format_date(&application.submitted_at)),
        DetailRow::new("Status", application.status.to_string()),
    ]
}
