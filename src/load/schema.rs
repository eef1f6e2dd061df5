//! Field classification derived from the target object's field definitions.

use std::collections::HashSet;

use crate::api::FieldDefinition;

/// How a field's value is rendered when written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Boolean,
    Date,
    DateTime,
    Numeric,
    Text,
}

/// Partition of an object's fields into serialization buckets.
///
/// Built once per run and never mutated. All names are stored lowercase.
#[derive(Debug, Clone, Default)]
pub struct FieldClassification {
    ignored: HashSet<String>,
    boolean: HashSet<String>,
    date: HashSet<String>,
    datetime: HashSet<String>,
    numeric: HashSet<String>,
    references: HashSet<String>,
    /// Writable field names in definition order, original casing.
    fields: Vec<String>,
}

const NUMERIC_TYPES: &[&str] = &["number", "currency", "percent", "double", "integer", "long"];
const REFERENCE_TYPES: &[&str] = &["lookup", "master-detail", "hierarchy"];

impl FieldClassification {
    pub fn from_definitions(definitions: &[FieldDefinition]) -> Self {
        let mut classification = Self::default();

        for def in definitions {
            let name = def.name.to_lowercase();
            let data_type = def.data_type.trim().to_lowercase();
            // "Number(18, 0)" and "Lookup(Account)" carry parameters
            let base = data_type
                .split('(')
                .next()
                .unwrap_or_default()
                .trim()
                .to_string();

            if data_type.contains("formula") {
                classification.ignored.insert(name);
                continue;
            }

            classification.fields.push(def.name.clone());
            match base.as_str() {
                "checkbox" => {
                    classification.boolean.insert(name);
                }
                "date" => {
                    classification.date.insert(name);
                }
                "date/time" => {
                    classification.datetime.insert(name);
                }
                b if NUMERIC_TYPES.contains(&b) => {
                    classification.numeric.insert(name);
                }
                b if REFERENCE_TYPES.contains(&b) => {
                    classification.references.insert(name);
                }
                _ => {}
            }
        }

        classification
    }

    pub fn kind(&self, field: &str) -> FieldKind {
        let field = field.to_lowercase();
        if self.boolean.contains(&field) {
            FieldKind::Boolean
        } else if self.date.contains(&field) {
            FieldKind::Date
        } else if self.datetime.contains(&field) {
            FieldKind::DateTime
        } else if self.numeric.contains(&field) {
            FieldKind::Numeric
        } else {
            FieldKind::Text
        }
    }

    /// Formula fields; never written.
    pub fn is_ignored(&self, field: &str) -> bool {
        self.ignored.contains(&field.to_lowercase())
    }

    pub fn is_reference(&self, field: &str) -> bool {
        self.references.contains(&field.to_lowercase())
    }

    /// Non-formula fields in definition order.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn ignored_count(&self) -> usize {
        self.ignored.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account_fields() -> Vec<FieldDefinition> {
        vec![
            FieldDefinition::new("Name", "Text(255)"),
            FieldDefinition::new("IsActive__c", "Checkbox"),
            FieldDefinition::new("Start__c", "Date"),
            FieldDefinition::new("Seen__c", "Date/Time"),
            FieldDefinition::new("Amount__c", "Currency(16, 2)"),
            FieldDefinition::new("Rate__c", "Percent(3, 0)"),
            FieldDefinition::new("Count__c", "Number(18, 0)"),
            FieldDefinition::new("Total__c", "Formula (Currency)"),
            FieldDefinition::new("Flag__c", "Formula (Checkbox)"),
            FieldDefinition::new("ParentId", "Hierarchy"),
            FieldDefinition::new("Owner__c", "Lookup(User)"),
            FieldDefinition::new("Master__c", "Master-Detail(Account)"),
        ]
    }

    #[test]
    fn test_buckets() {
        let c = FieldClassification::from_definitions(&account_fields());

        assert_eq!(c.kind("name"), FieldKind::Text);
        assert_eq!(c.kind("ISACTIVE__C"), FieldKind::Boolean);
        assert_eq!(c.kind("start__c"), FieldKind::Date);
        assert_eq!(c.kind("seen__c"), FieldKind::DateTime);
        assert_eq!(c.kind("amount__c"), FieldKind::Numeric);
        assert_eq!(c.kind("rate__c"), FieldKind::Numeric);
        assert_eq!(c.kind("count__c"), FieldKind::Numeric);
        assert_eq!(c.kind("unknown__c"), FieldKind::Text);
    }

    #[test]
    fn test_formulas_are_ignored_whatever_their_result_type() {
        let c = FieldClassification::from_definitions(&account_fields());
        assert!(c.is_ignored("total__c"));
        assert!(c.is_ignored("Flag__c"));
        assert_eq!(c.kind("flag__c"), FieldKind::Text);
        assert!(!c.is_ignored("name"));
        assert_eq!(c.ignored_count(), 2);
        assert!(!c.fields().iter().any(|f| f == "Total__c"));
    }

    #[test]
    fn test_references() {
        let c = FieldClassification::from_definitions(&account_fields());
        assert!(c.is_reference("parentid"));
        assert!(c.is_reference("owner__c"));
        assert!(c.is_reference("master__c"));
        assert!(!c.is_reference("name"));
    }
}
