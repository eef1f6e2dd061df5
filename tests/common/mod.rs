//! In-memory `Platform` that records every call and keeps a tiny table of rows.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Map, Value, json};

use sf_migrate::LoadError;
use sf_migrate::api::{
    BulkJobOutcome, BulkJobState, ExecuteResult, FieldDefinition, Platform, PollSettings,
    QueryResult,
};
use sf_migrate::load::Record;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Query(String),
    Execute(String),
    Bulk { object: String, external_id: String, csv: String },
}

#[derive(Default)]
struct State {
    calls: Vec<Call>,
    rows: Vec<Value>,
    assigned: HashMap<String, String>,
    next_id: u32,
    fail_scripts_containing: Vec<String>,
    drop_scripts_containing: Vec<(String, String)>,
    reject_references: bool,
    incomplete_queries: bool,
}

pub struct MockPlatform {
    pub fields: Vec<FieldDefinition>,
    pub external_id: String,
    state: Mutex<State>,
}

impl MockPlatform {
    pub fn new(external_id: &str) -> Self {
        Self {
            fields: vec![
                FieldDefinition::new("Id", "Lookup()"),
                FieldDefinition::new("Name", "Text(255)"),
                FieldDefinition::new(external_id, "Text(40)"),
                FieldDefinition::new("Active__c", "Checkbox"),
                FieldDefinition::new("Parent__c", "Lookup(Account)"),
                FieldDefinition::new("Total__c", "Formula (Currency)"),
            ],
            external_id: external_id.to_string(),
            state: Mutex::new(State::default()),
        }
    }

    /// Id the org hands out when `external_id` is first written.
    pub fn assign(self, external_id: &str, id: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .assigned
            .insert(external_id.to_string(), id.to_string());
        self
    }

    pub fn with_row(self, row: Value) -> Self {
        self.state.lock().unwrap().rows.push(row);
        self
    }

    pub fn fail_scripts_containing(self, needle: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .fail_scripts_containing
            .push(needle.to_string());
        self
    }

    /// Scripts containing `needle` never reach the org; the call itself
    /// fails with a `Platform` error carrying `message`.
    pub fn drop_scripts_containing(self, needle: &str, message: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .drop_scripts_containing
            .push((needle.to_string(), message.to_string()));
        self
    }

    pub fn reject_references(self) -> Self {
        self.state.lock().unwrap().reject_references = true;
        self
    }

    pub fn incomplete_queries(self) -> Self {
        self.state.lock().unwrap().incomplete_queries = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn scripts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Execute(script) => Some(script),
                _ => None,
            })
            .collect()
    }

    pub fn upsert_scripts(&self) -> Vec<String> {
        self.scripts()
            .into_iter()
            .filter(|s| s.contains("upsert o "))
            .collect()
    }

    pub fn existence_checks(&self) -> Vec<String> {
        self.scripts()
            .into_iter()
            .filter(|s| s.contains("missing.add"))
            .collect()
    }

    pub fn rows(&self) -> Vec<Value> {
        self.state.lock().unwrap().rows.clone()
    }

    /// Upsert `values` keyed by the declared external id field.
    fn write(state: &mut State, ext_field: &str, values: Map<String, Value>) {
        let ext_value = values
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(ext_field))
            .and_then(|(_, v)| v.as_str())
            .unwrap_or_default()
            .to_string();

        let existing = state
            .rows
            .iter_mut()
            .find(|row| text(row, ext_field) == Some(ext_value.as_str()));
        if let Some(row) = existing {
            for (k, v) in values {
                if !k.eq_ignore_ascii_case(ext_field) {
                    row[k] = v;
                }
            }
            return;
        }

        state.next_id += 1;
        let id = state
            .assigned
            .get(&ext_value)
            .cloned()
            .unwrap_or_else(|| format!("001MOCK{:011}", state.next_id));
        let mut row = json!({ "Id": id, ext_field: ext_value });
        for (k, v) in values {
            if !k.eq_ignore_ascii_case(ext_field) {
                row[k] = v;
            }
        }
        state.rows.push(row);
    }
}

/// Case-insensitive string field of a stored row.
pub fn text<'a>(row: &'a Value, field: &str) -> Option<&'a str> {
    row.as_object()?
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(field))
        .and_then(|(_, v)| v.as_str())
}

/// Values inside the last `IN (...)` of a query.
fn in_values(soql: &str) -> Option<Vec<String>> {
    let start = soql.rfind(" IN (")? + " IN (".len();
    let end = soql[start..].find(')')? + start;
    Some(
        soql[start..end]
            .split(',')
            .map(|v| v.trim().trim_matches('\'').to_string())
            .collect(),
    )
}

/// `field='value'` pairs out of an `o.add(new T(...))` line.
fn assignments(line: &str) -> Map<String, Value> {
    let mut values = Map::new();
    let Some(open) = line.find("(new ") else {
        return values;
    };
    let Some(args_start) = line[open + 5..].find('(') else {
        return values;
    };
    let body = &line[open + 5 + args_start + 1..line.len().saturating_sub(3)];
    for part in body.split(", ") {
        if let Some((k, v)) = part.split_once('=') {
            let v = v.trim_matches('\'');
            values.insert(k.to_string(), Value::String(v.to_string()));
        }
    }
    values
}

#[async_trait]
impl Platform for MockPlatform {
    async fn query(&self, soql: &str) -> Result<QueryResult, LoadError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Query(soql.to_string()));

        if soql.contains("FROM FieldDefinition") {
            let records = self
                .fields
                .iter()
                .map(|f| json!({ "QualifiedApiName": f.name, "DataType": f.data_type }))
                .collect();
            return Ok(QueryResult::complete(records));
        }

        let records: Vec<Value> = if let Some(values) = in_values(soql) {
            state
                .rows
                .iter()
                .filter(|row| {
                    text(row, &self.external_id).is_some_and(|v| values.iter().any(|x| x == v))
                })
                .cloned()
                .collect()
        } else if let Some(pos) = soql.find("WHERE Id = '") {
            let rest = &soql[pos + "WHERE Id = '".len()..];
            let id = &rest[..rest.find('\'').unwrap_or(rest.len())];
            state
                .rows
                .iter()
                .filter(|row| row.get("Id").and_then(Value::as_str) == Some(id))
                .cloned()
                .collect()
        } else {
            state.rows.clone()
        };

        let mut result = QueryResult::complete(records);
        if state.incomplete_queries {
            result.done = false;
            result.total_size += 1;
        }
        Ok(result)
    }

    async fn execute_anonymous(&self, script: &str) -> Result<ExecuteResult, LoadError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Execute(script.to_string()));

        if let Some((_, message)) = state
            .drop_scripts_containing
            .iter()
            .find(|(needle, _)| script.contains(needle.as_str()))
        {
            return Err(LoadError::Platform(message.clone()));
        }

        if script.contains("missing.add") {
            if state.reject_references {
                return Ok(ExecuteResult {
                    compiled: true,
                    success: false,
                    line: 3,
                    column: 1,
                    exception_message: Some(
                        "System.IllegalArgumentException: Missing references".into(),
                    ),
                    exception_stack_trace: Some("AnonymousBlock: line 3, column 1".into()),
                    ..Default::default()
                });
            }
            return Ok(ExecuteResult::ok());
        }

        if state
            .fail_scripts_containing
            .iter()
            .any(|needle| script.contains(needle.as_str()))
        {
            return Ok(ExecuteResult {
                compiled: true,
                success: false,
                line: 2,
                column: 1,
                exception_message: Some("System.DmlException: Upsert failed".into()),
                exception_stack_trace: Some("AnonymousBlock: line 2, column 1".into()),
                ..Default::default()
            });
        }

        if script.contains("upsert o ") {
            for line in script.lines().filter(|l| l.starts_with("o.add(new ")) {
                let values = assignments(line);
                Self::write(&mut state, &self.external_id, values);
            }
        }

        Ok(ExecuteResult::ok())
    }

    async fn bulk_upsert(
        &self,
        object: &str,
        external_id: &str,
        csv: String,
        _poll: PollSettings,
    ) -> Result<BulkJobOutcome, LoadError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Bulk {
            object: object.to_string(),
            external_id: external_id.to_string(),
            csv: csv.clone(),
        });

        let mut reader = csv::Reader::from_reader(csv.as_bytes());
        let headers = reader.headers()?.clone();
        let mut processed = 0;
        for row in reader.records() {
            let row = row?;
            let mut values = Map::new();
            for (h, v) in headers.iter().zip(row.iter()) {
                values.insert(h.to_string(), Value::String(v.to_string()));
            }
            Self::write(&mut state, external_id, values);
            processed += 1;
        }

        Ok(BulkJobOutcome {
            job_id: "750MOCK".into(),
            state: BulkJobState::JobComplete,
            records_processed: processed,
            records_failed: 0,
            error_message: None,
            failed_results: None,
        })
    }
}

pub fn record(pairs: &[(&str, &str)]) -> Record {
    Record::from_pairs(pairs.iter().copied())
}
