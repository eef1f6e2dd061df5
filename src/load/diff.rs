//! Comparison of outgoing records against their current remote state.

use chrono::{DateTime, FixedOffset};
use colored::Colorize;
use serde_json::Value;

use super::transform::{FieldValue, TransformedRecord};
use crate::api::field_text;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub field: String,
    pub before: Option<String>,
    pub after: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffStatus {
    New,
    Changed(Vec<FieldChange>),
    Unchanged,
}

/// Classify `record` against the remote row with the same external id.
///
/// Values are compared after id remapping. Numeric fields compare by value so
/// that `12.50` and `12.5` are equal, datetimes compare as instants, and all
/// other values compare as exact text.
pub fn diff_record(record: &TransformedRecord, remote: Option<&Value>) -> DiffStatus {
    let Some(remote) = remote else {
        return DiffStatus::New;
    };

    let changes: Vec<FieldChange> = record
        .fields
        .iter()
        .filter_map(|(field, value)| {
            let after = value.as_text().map(str::to_string);
            let before = field_text(remote, field);
            if same_value(before.as_deref(), value) {
                None
            } else {
                Some(FieldChange {
                    field: field.clone(),
                    before,
                    after,
                })
            }
        })
        .collect();

    if changes.is_empty() {
        DiffStatus::Unchanged
    } else {
        DiffStatus::Changed(changes)
    }
}

fn same_value(before: Option<&str>, after: &FieldValue) -> bool {
    let Some(before) = before else {
        return matches!(after, FieldValue::Null);
    };
    match after {
        FieldValue::Null => false,
        FieldValue::Number(a) => {
            before == a
                || matches!(
                    (before.parse::<f64>(), a.parse::<f64>()),
                    (Ok(x), Ok(y)) if x == y
                )
        }
        FieldValue::DateTime(a) => match (parse_instant(before), parse_instant(a)) {
            (Some(x), Some(y)) => x == y,
            _ => before == a,
        },
        other => other.as_text() == Some(before),
    }
}

/// Accepts both `2024-01-31T10:00:00Z` and the `+0000` offset the REST API returns.
fn parse_instant(value: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .ok()
}

/// Human-readable lines for one record's diff status.
pub fn render(external_id: &str, status: &DiffStatus) -> Vec<String> {
    match status {
        DiffStatus::New => vec![format!("{} {}", "NEW".bright_green().bold(), external_id)],
        DiffStatus::Unchanged => vec![format!("{} {}", "UNCHANGED".dimmed(), external_id)],
        DiffStatus::Changed(changes) => {
            let mut lines = vec![format!("{} {}", "CHANGE".bright_yellow().bold(), external_id)];
            for change in changes {
                lines.push(format!(
                    "  {}: {} -> {}",
                    change.field,
                    change.before.as_deref().unwrap_or("null").red(),
                    change.after.as_deref().unwrap_or("null").green()
                ));
            }
            lines
        }
    }
}
