//! Export of org records to CSV with ids translated back to their source values.

use std::collections::HashSet;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use csv::WriterBuilder;
use log::{debug, info};

use crate::api::{Platform, escape_soql, field_text};
use crate::error::LoadError;
use crate::load::{FieldClassification, IdMap};

/// System fields skipped unless `--ignorefields` says otherwise.
pub const DEFAULT_IGNORE_FIELDS: &[&str] = &[
    "CreatedDate",
    "CreatedById",
    "LastModifiedDate",
    "LastModifiedById",
    "SystemModstamp",
    "IsDeleted",
    "IsArchived",
    "LastViewedDate",
    "LastReferencedDate",
    "UserRecordAccessId",
    "OwnerId",
];

#[derive(Debug, Clone)]
pub struct DumpOptions {
    pub object: String,
    pub id: Option<String>,
    pub where_clause: Option<String>,
    /// Lowercase; empty means every field.
    pub only_fields: HashSet<String>,
    /// Lowercase.
    pub ignore_fields: HashSet<String>,
    /// Lowercase.
    pub content_replace: HashSet<String>,
}

impl DumpOptions {
    pub fn new(object: impl Into<String>) -> Self {
        Self {
            object: object.into(),
            id: None,
            where_clause: None,
            only_fields: HashSet::new(),
            ignore_fields: lowercase(DEFAULT_IGNORE_FIELDS),
            content_replace: HashSet::new(),
        }
    }

    pub fn with_ignore_fields<S: AsRef<str>>(mut self, fields: &[S]) -> Self {
        self.ignore_fields = lowercase(fields);
        self
    }

    pub fn with_only_fields<S: AsRef<str>>(mut self, fields: &[S]) -> Self {
        self.only_fields = lowercase(fields);
        self
    }

    pub fn with_content_replace<S: AsRef<str>>(mut self, fields: &[S]) -> Self {
        self.content_replace = lowercase(fields);
        self
    }
}

fn lowercase<S: AsRef<str>>(fields: &[S]) -> HashSet<String> {
    fields
        .iter()
        .map(|f| f.as_ref().trim().to_lowercase())
        .filter(|f| !f.is_empty())
        .collect()
}

/// Exported rows with their header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DumpTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl DumpTable {
    /// Write as CSV with a UTF-8 BOM.
    pub fn write_csv(&self, path: &Path) -> Result<(), LoadError> {
        let mut file = File::create(path)?;
        file.write_all("\u{feff}".as_bytes())?;

        let mut writer = WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(file);
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Query the object's records and map ids through the reverse id-map.
pub async fn export_records<P: Platform + ?Sized>(
    platform: &P,
    options: &DumpOptions,
    idmap: &IdMap,
) -> Result<DumpTable, LoadError> {
    let definitions = platform.describe_fields(&options.object).await?;
    let classification = FieldClassification::from_definitions(&definitions);

    let columns: Vec<String> = classification
        .fields()
        .iter()
        .filter(|f| {
            let name = f.to_lowercase();
            !options.ignore_fields.contains(&name)
                && (options.only_fields.is_empty() || options.only_fields.contains(&name))
        })
        .cloned()
        .collect();

    if columns.is_empty() {
        return Err(LoadError::Validation(format!(
            "No exportable fields on {}",
            options.object
        )));
    }

    let reverse = idmap.reverse();
    let mut soql = format!("SELECT {} FROM {}", columns.join(","), options.object);
    if let Some(id) = &options.id {
        let id = match reverse.get(id) {
            Some(mapped) => {
                println!("QUERY: {} => {}", id, mapped);
                mapped
            }
            None => id.as_str(),
        };
        soql.push_str(&format!(" WHERE Id = '{}'", escape_soql(id)));
    } else if let Some(condition) = &options.where_clause {
        soql.push_str(&format!(" WHERE {}", condition));
    }
    soql.push_str(" ORDER BY Id");

    let result = platform.query(&soql).await?;
    println!("Query complete with {} records returned", result.total_size);
    if !result.done {
        info!(
            "Export truncated at {} of {} records",
            result.len(),
            result.total_size
        );
    }

    let replacements = reverse.replacement_order();
    let mut rows = Vec::with_capacity(result.len());
    for record in &result.records {
        let mut row = Vec::with_capacity(columns.len());
        for column in &columns {
            let mut value = field_text(record, column).unwrap_or_default();

            if classification.is_reference(column) {
                if let Some(old) = reverse.get(&value).filter(|_| !value.is_empty()) {
                    println!("{} => {}", value, old);
                    value = old.to_string();
                }
            }

            if options.content_replace.contains(&column.to_lowercase()) {
                for (new, old) in &replacements {
                    if value.contains(new) {
                        value = value.replace(new, old);
                        println!("CONTENT: {} => {}", new, old);
                    }
                }
            }

            row.push(value);
        }
        rows.push(row);
    }

    debug!("Exported {} {} records", rows.len(), options.object);
    Ok(DumpTable { columns, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_defaults_ignore_audit_fields() {
        let options = DumpOptions::new("Account");
        assert!(options.ignore_fields.contains("createddate"));
        assert!(options.ignore_fields.contains("ownerid"));

        let options = options.with_ignore_fields(&["Name"]);
        assert!(!options.ignore_fields.contains("ownerid"));
        assert!(options.ignore_fields.contains("name"));
    }

    #[test]
    fn test_write_csv_has_bom() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let table = DumpTable {
            columns: vec!["Id".into(), "Name".into()],
            rows: vec![vec!["001".into(), "Acme, Inc".into()]],
        };
        table.write_csv(&path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "\u{feff}Id,Name\n001,\"Acme, Inc\"\n");
    }
}
