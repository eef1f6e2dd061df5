//! Per-record value remapping and literal rendering.

use std::collections::{BTreeSet, HashSet};

use csv::WriterBuilder;
use log::debug;
use serde_json::{Map, Value};

use super::idmap::IdMap;
use super::record::Record;
use super::schema::{FieldClassification, FieldKind};
use super::script::escape;
use super::sfid::is_valid_id;
use crate::error::LoadError;

/// Null marker understood by the Bulk API in CSV uploads.
pub const BULK_NULL: &str = "#N/A";

/// A field value after remapping, tagged with how it must be rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Null,
    Boolean(bool),
    /// Numeric field value, emitted bare.
    Number(String),
    /// Non-0/1 checkbox input, emitted bare.
    Verbatim(String),
    Date(String),
    DateTime(String),
    Text(String),
}

impl FieldValue {
    /// Apex literal for this value.
    pub fn to_apex(&self) -> String {
        match self {
            FieldValue::Null => "null".to_string(),
            FieldValue::Boolean(b) => b.to_string(),
            FieldValue::Number(v) | FieldValue::Verbatim(v) => v.clone(),
            FieldValue::Date(v) => format!("Date.valueOf('{}')", escape(v)),
            FieldValue::DateTime(v) => format!(
                "(DateTime) JSON.deserialize('\"{}\"', DateTime.class)",
                escape(v)
            ),
            FieldValue::Text(v) => format!("'{}'", escape(v)),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Null => Value::Null,
            FieldValue::Boolean(b) => Value::Bool(*b),
            other => Value::String(other.as_text().unwrap_or_default().to_string()),
        }
    }

    pub fn to_bulk_cell(&self) -> String {
        match self {
            FieldValue::Null => BULK_NULL.to_string(),
            other => other.as_text().unwrap_or_default().to_string(),
        }
    }

    /// Plain text form used for comparisons; `None` for null.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Null => None,
            FieldValue::Boolean(true) => Some("true"),
            FieldValue::Boolean(false) => Some("false"),
            FieldValue::Number(v)
            | FieldValue::Verbatim(v)
            | FieldValue::Date(v)
            | FieldValue::DateTime(v)
            | FieldValue::Text(v) => Some(v),
        }
    }
}

/// One record ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformedRecord {
    pub external_id: String,
    /// Source-org id from the input `id` column.
    pub old_id: Option<String>,
    pub fields: Vec<(String, FieldValue)>,
    /// Substring replacements applied to content-replace fields.
    pub content_replacements: Vec<(String, String)>,
}

impl TransformedRecord {
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(field))
            .map(|(_, v)| v)
    }

    /// `field=literal` fragments for the script builder.
    pub fn apex_assignments(&self) -> Vec<String> {
        self.fields
            .iter()
            .map(|(k, v)| format!("{}={}", k, v.to_apex()))
            .collect()
    }

    pub fn to_json(&self) -> Map<String, Value> {
        self.fields
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect()
    }
}

/// Output of transforming one batch.
#[derive(Debug, Default)]
pub struct TransformedBatch {
    pub records: Vec<TransformedRecord>,
    /// Checksum-valid id values found in text fields, to be checked remotely.
    pub ids_to_validate: BTreeSet<String>,
}

pub struct FieldTransformer<'a> {
    classification: &'a FieldClassification,
    idmap: &'a IdMap,
    ignore: &'a HashSet<String>,
    content_replace: &'a HashSet<String>,
    external_id: &'a str,
}

impl<'a> FieldTransformer<'a> {
    /// `ignore`, `content_replace` and `external_id` must be lowercase.
    pub fn new(
        classification: &'a FieldClassification,
        idmap: &'a IdMap,
        ignore: &'a HashSet<String>,
        content_replace: &'a HashSet<String>,
        external_id: &'a str,
    ) -> Self {
        Self {
            classification,
            idmap,
            ignore,
            content_replace,
            external_id,
        }
    }

    pub fn transform_batch(&self, records: &[Record]) -> TransformedBatch {
        let mut batch = TransformedBatch::default();
        for record in records {
            let transformed = self.transform(record, &mut batch.ids_to_validate);
            batch.records.push(transformed);
        }
        batch
    }

    pub fn transform(&self, record: &Record, ids_to_validate: &mut BTreeSet<String>) -> TransformedRecord {
        let mut fields = Vec::with_capacity(record.len());
        let mut content_replacements = Vec::new();

        for (field, raw) in record.iter() {
            if self.ignore.contains(field) || self.classification.is_ignored(field) {
                continue;
            }

            let value = self.remap(field, raw, &mut content_replacements);
            let kind = self.classification.kind(field);

            if kind == FieldKind::Text && field != self.external_id && is_valid_id(&value) {
                ids_to_validate.insert(value.clone());
            }

            fields.push((field.to_string(), render(kind, value)));
        }

        TransformedRecord {
            external_id: record.get(self.external_id).unwrap_or_default().to_string(),
            old_id: record.id().map(str::to_string),
            fields,
            content_replacements,
        }
    }

    /// Content replacement followed by whole-value substitution.
    pub fn remap(&self, field: &str, raw: &str, replacements: &mut Vec<(String, String)>) -> String {
        let mut value = raw.to_string();

        if self.content_replace.contains(field) {
            for (old, new) in self.idmap.replacement_order() {
                if value.contains(old) {
                    value = value.replace(old, new);
                    replacements.push((old.to_string(), new.to_string()));
                }
            }
        }

        if field != self.external_id {
            if let Some(mapped) = self.idmap.get(&value).filter(|m| !m.is_empty()) {
                debug!("{}: {} => {}", field, value, mapped);
                value = mapped.to_string();
            }
        }

        value
    }
}

fn render(kind: FieldKind, value: String) -> FieldValue {
    if value.is_empty() {
        return FieldValue::Null;
    }
    match kind {
        FieldKind::Boolean => match value.as_str() {
            "1" => FieldValue::Boolean(true),
            "0" => FieldValue::Boolean(false),
            _ => FieldValue::Verbatim(value),
        },
        FieldKind::Date => FieldValue::Date(value),
        FieldKind::DateTime => FieldValue::DateTime(value),
        FieldKind::Numeric => FieldValue::Number(value),
        FieldKind::Text => FieldValue::Text(value),
    }
}

/// CSV body for a Bulk API upload. Columns are the union of record fields in
/// first-seen order; a record lacking a column leaves its cell empty.
pub fn bulk_csv(records: &[TransformedRecord]) -> Result<String, LoadError> {
    let mut columns: Vec<&str> = Vec::new();
    for record in records {
        for (field, _) in &record.fields {
            if !columns.contains(&field.as_str()) {
                columns.push(field);
            }
        }
    }

    let mut writer = WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(&columns)?;
    for record in records {
        let row: Vec<String> = columns
            .iter()
            .map(|c| record.get(c).map(FieldValue::to_bulk_cell).unwrap_or_default())
            .collect();
        writer.write_record(&row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| LoadError::Io(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| LoadError::Validation(format!("Non UTF-8 CSV output: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::FieldDefinition;

    fn classification() -> FieldClassification {
        FieldClassification::from_definitions(&[
            FieldDefinition::new("Name", "Text(255)"),
            FieldDefinition::new("sfxId__c", "Text(40)"),
            FieldDefinition::new("Active__c", "Checkbox"),
            FieldDefinition::new("Start__c", "Date"),
            FieldDefinition::new("Seen__c", "Date/Time"),
            FieldDefinition::new("Amount__c", "Currency(16, 2)"),
            FieldDefinition::new("Parent__c", "Lookup(Account)"),
            FieldDefinition::new("Body__c", "Long Text Area(32768)"),
            FieldDefinition::new("Total__c", "Formula (Currency)"),
        ])
    }

    struct Fixture {
        classification: FieldClassification,
        idmap: IdMap,
        ignore: HashSet<String>,
        replace: HashSet<String>,
    }

    impl Fixture {
        fn new() -> Self {
            let mut idmap = IdMap::new();
            idmap.insert("001000000000001AAA", "001000000000777AAA");
            idmap.insert("A1", "B9");
            Self {
                classification: classification(),
                idmap,
                ignore: ["id".to_string()].into_iter().collect(),
                replace: ["body__c".to_string()].into_iter().collect(),
            }
        }

        fn transformer(&self) -> FieldTransformer<'_> {
            FieldTransformer::new(&self.classification, &self.idmap, &self.ignore, &self.replace, "sfxid__c")
        }
    }

    fn transform_one(fixture: &Fixture, pairs: &[(&str, &str)]) -> (TransformedRecord, BTreeSet<String>) {
        let record = Record::from_pairs(pairs.iter().copied());
        let mut ids = BTreeSet::new();
        let out = fixture.transformer().transform(&record, &mut ids);
        (out, ids)
    }

    #[test]
    fn test_boolean_literals_and_fallback() {
        let f = Fixture::new();
        let (rec, _) = transform_one(&f, &[("sfxId__c", "X"), ("Active__c", "1")]);
        assert_eq!(rec.get("active__c"), Some(&FieldValue::Boolean(true)));
        assert_eq!(rec.get("active__c").unwrap().to_apex(), "true");

        let (rec, _) = transform_one(&f, &[("sfxId__c", "X"), ("Active__c", "0")]);
        assert_eq!(rec.get("active__c").unwrap().to_apex(), "false");

        let (rec, _) = transform_one(&f, &[("sfxId__c", "X"), ("Active__c", "yes")]);
        assert_eq!(rec.get("active__c").unwrap().to_apex(), "yes");
    }

    #[test]
    fn test_literal_rendering() {
        let f = Fixture::new();
        let (rec, _) = transform_one(
            &f,
            &[
                ("sfxId__c", "X"),
                ("Name", "O'Brien\\Co\nLine2\r"),
                ("Start__c", "2024-01-31"),
                ("Seen__c", "2024-01-31T10:00:00.000Z"),
                ("Amount__c", "12.50"),
                ("Parent__c", ""),
            ],
        );
        assert_eq!(
            rec.apex_assignments(),
            vec![
                "sfxid__c='X'",
                "name='O\\'Brien\\\\Co\\nLine2\\r'",
                "start__c=Date.valueOf('2024-01-31')",
                "seen__c=(DateTime) JSON.deserialize('\"2024-01-31T10:00:00.000Z\"', DateTime.class)",
                "amount__c=12.50",
                "parent__c=null",
            ]
        );
    }

    #[test]
    fn test_ignored_and_formula_fields_are_dropped() {
        let f = Fixture::new();
        let (rec, _) = transform_one(&f, &[("Id", "a"), ("sfxId__c", "X"), ("Total__c", "9")]);
        let names: Vec<&str> = rec.fields.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, vec!["sfxid__c"]);
        assert_eq!(rec.old_id.as_deref(), Some("a"));
    }

    #[test]
    fn test_whole_value_substitution_spares_external_id() {
        let f = Fixture::new();
        let (rec, ids) = transform_one(
            &f,
            &[("sfxId__c", "A1"), ("Parent__c", "001000000000001AAA"), ("Name", "A1")],
        );
        assert_eq!(rec.external_id, "A1");
        assert_eq!(rec.get("sfxid__c"), Some(&FieldValue::Text("A1".into())));
        assert_eq!(rec.get("name"), Some(&FieldValue::Text("B9".into())));
        assert_eq!(rec.get("parent__c"), Some(&FieldValue::Text("001000000000777AAA".into())));
        assert!(ids.contains("001000000000777AAA"));
    }

    #[test]
    fn test_substitution_is_idempotent_on_targets() {
        let f = Fixture::new();
        let mut sink = Vec::new();
        let t = f.transformer();
        let once = t.remap("parent__c", "001000000000001AAA", &mut sink);
        let twice = t.remap("parent__c", &once, &mut sink);
        assert_eq!(once, "001000000000777AAA");
        assert_eq!(twice, once);
    }

    #[test]
    fn test_content_replace_prefers_longer_keys() {
        let mut f = Fixture::new();
        f.idmap = IdMap::new();
        f.idmap.insert("001000000000001", "SHORT");
        f.idmap.insert("001000000000001AAA", "LONG");

        let (rec, _) = transform_one(&f, &[("sfxId__c", "X"), ("Body__c", "see 001000000000001AAA")]);
        assert_eq!(rec.get("body__c"), Some(&FieldValue::Text("see LONG".into())));
        assert_eq!(
            rec.content_replacements,
            vec![("001000000000001AAA".to_string(), "LONG".to_string())]
        );
    }

    #[test]
    fn test_only_text_fields_collect_ids() {
        let f = Fixture::new();
        let (_, ids) = transform_one(
            &f,
            &[("sfxId__c", "0015g00000AbCdEAAV"), ("Amount__c", "0015g00000AbCdEAAV"), ("Name", "Acme")],
        );
        assert!(ids.is_empty());
    }

    #[test]
    fn test_bulk_csv() {
        let f = Fixture::new();
        let (a, _) = transform_one(&f, &[("sfxId__c", "A"), ("Name", "x, y"), ("Active__c", "1")]);
        let (b, _) = transform_one(&f, &[("sfxId__c", "B"), ("Name", ""), ("Amount__c", "3")]);

        let csv = bulk_csv(&[a, b]).unwrap();
        assert_eq!(
            csv,
            "sfxid__c,name,active__c,amount__c\nA,\"x, y\",true,\nB,#N/A,,3\n"
        );
    }

    #[test]
    fn test_json_values() {
        assert_eq!(FieldValue::Null.to_json(), Value::Null);
        assert_eq!(FieldValue::Boolean(false).to_json(), Value::Bool(false));
        assert_eq!(FieldValue::Number("3".into()).to_json(), Value::String("3".into()));
    }
}
