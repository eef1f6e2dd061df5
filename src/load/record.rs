//! Input rows and the CSV reader that produces them.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;
use log::debug;

use crate::error::LoadError;

/// One input row: lowercase field name to raw string value, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut record = Self::new();
        for (k, v) in pairs {
            record.set(k.as_ref(), v);
        }
        record
    }

    /// Set a field; names are lowercased and a repeated name overwrites.
    pub fn set(&mut self, field: &str, value: impl Into<String>) {
        let field = field.to_lowercase();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == field) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((field, value)),
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(field))
            .map(|(_, v)| v.as_str())
    }

    /// The row's platform id, from the `id` column, when present and non-empty.
    pub fn id(&self) -> Option<&str> {
        self.get("id").filter(|v| !v.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Read all rows of a CSV file with a header row.
pub fn read_records(path: &Path) -> Result<Vec<Record>, LoadError> {
    let file = File::open(path)?;
    let records = read_records_from(file)?;
    debug!("Read {} records from {:?}", records.len(), path);
    Ok(records)
}

/// Read CSV rows from any reader. A leading UTF-8 BOM is ignored.
pub fn read_records_from<R: Read>(reader: R) -> Result<Vec<Record>, LoadError> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(reader);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_lowercase())
        .collect();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        records.push(Record::from_pairs(
            headers.iter().zip(row.iter()).map(|(h, v)| (h.as_str(), v)),
        ));
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_are_lowercased_and_bom_stripped() {
        let data = "\u{feff}Id,sfxId__c,Name\n001,A1,Foo\n002,A2,\"Bar, Inc\"\n";
        let records = read_records_from(data.as_bytes()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("id"), Some("001"));
        assert_eq!(records[0].get("sfxid__c"), Some("A1"));
        assert_eq!(records[1].get("Name"), Some("Bar, Inc"));
        let names: Vec<&str> = records[0].iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["id", "sfxid__c", "name"]);
    }

    #[test]
    fn test_empty_id_is_absent() {
        let record = Record::from_pairs([("Id", ""), ("Name", "Foo")]);
        assert_eq!(record.id(), None);
        assert_eq!(record.len(), 2);
    }

    #[test]
    fn test_ragged_rows_are_rejected() {
        let data = "a,b\n1,2,3\n";
        assert!(matches!(read_records_from(data.as_bytes()), Err(LoadError::Csv(_))));
    }
}
