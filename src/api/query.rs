//! SOQL query results and helpers for building query text.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Mirrors the REST query response JSON.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireQueryResponse {
    pub total_size: u64,
    pub done: bool,
    pub next_records_url: Option<String>,
    pub records: Vec<Value>,
}

/// Records returned by a (possibly multi-page) SOQL query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryResult {
    pub records: Vec<Value>,
    /// Total number of matching rows on the server.
    pub total_size: u64,
    /// False when pagination stopped before the last page.
    pub done: bool,
}

impl QueryResult {
    pub fn complete(records: Vec<Value>) -> Self {
        Self {
            total_size: records.len() as u64,
            records,
            done: true,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Escape a value for use inside a single-quoted SOQL literal.
pub fn escape_soql(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            _ => out.push(c),
        }
    }
    out
}

/// `('a','b','c')` for a SOQL `IN` clause.
pub fn in_clause<'a, I>(values: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let quoted: Vec<String> = values
        .into_iter()
        .map(|v| format!("'{}'", escape_soql(v)))
        .collect();
    format!("({})", quoted.join(","))
}

/// Case-insensitive field lookup on a query record, rendered as text.
///
/// `null` and missing fields yield `None`; numbers and booleans are rendered
/// with their JSON text.
pub fn field_text(record: &Value, field: &str) -> Option<String> {
    let obj = record.as_object()?;
    let value = obj
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(field))
        .map(|(_, v)| v)?;
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_escape_soql() {
        assert_eq!(escape_soql("O'Brien"), "O\\'Brien");
        assert_eq!(escape_soql("a\\b"), "a\\\\b");
        assert_eq!(escape_soql("plain"), "plain");
    }

    #[test]
    fn test_in_clause() {
        assert_eq!(in_clause(["A1", "A'2"]), "('A1','A\\'2')");
    }

    #[test]
    fn test_field_text_is_case_insensitive() {
        let record = json!({"Id": "001A", "sfxId__c": "A1", "Amount": 12.5, "Active": true, "Empty": null});
        assert_eq!(field_text(&record, "id"), Some("001A".to_string()));
        assert_eq!(field_text(&record, "SFXID__C"), Some("A1".to_string()));
        assert_eq!(field_text(&record, "amount"), Some("12.5".to_string()));
        assert_eq!(field_text(&record, "active"), Some("true".to_string()));
        assert_eq!(field_text(&record, "empty"), None);
        assert_eq!(field_text(&record, "missing"), None);
    }

    #[test]
    fn test_wire_response_parses() {
        let body = json!({
            "totalSize": 2,
            "done": false,
            "nextRecordsUrl": "/services/data/v60.0/query/01gxx-2000",
            "records": [{"Id": "1"}, {"Id": "2"}]
        });
        let wire: WireQueryResponse = serde_json::from_value(body).unwrap();
        assert_eq!(wire.total_size, 2);
        assert!(!wire.done);
        assert!(wire.next_records_url.is_some());
        assert_eq!(wire.records.len(), 2);
    }
}
