//! Anonymous Apex generation.
//!
//! Every script sent to `executeAnonymous` is built here. User data reaches
//! these templates only as rendered field literals or through [`escape`].

use std::collections::BTreeSet;

use super::transform::TransformedRecord;

/// Escape a value for a single-quoted Apex string literal.
///
/// One pass, so an escape inserted for one character is never re-escaped.
pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out
}

/// Insert-or-update all records keyed by `external_id`.
pub fn upsert_script(object: &str, external_id: &str, records: &[TransformedRecord]) -> String {
    let mut script = format!("List<{0}> o = new List<{0}>();\n", object);
    for record in records {
        script.push_str(&format!(
            "o.add(new {}({}));\n",
            object,
            record.apex_assignments().join(", ")
        ));
    }
    script.push_str(&format!("upsert o {};\n", external_id));
    script
}

/// Update existing rows matched by `external_id`; unmatched records are
/// reported through `System.debug` and skipped.
pub fn update_script(object: &str, external_id: &str, records: &[TransformedRecord]) -> String {
    let mut script = format!("List<{0}> o = new List<{0}>();\n", object);
    for (i, record) in records.iter().enumerate() {
        let key = escape(&record.external_id);
        script.push_str(&format!(
            "List<{obj}> m{i} = [SELECT Id FROM {obj} WHERE {ext} = '{key}' LIMIT 1];\n",
            obj = object,
            ext = external_id,
        ));
        script.push_str(&format!("if (m{i}.isEmpty()) {{\n"));
        script.push_str(&format!("    System.debug('NOT FOUND: {key}');\n"));
        script.push_str("} else {\n");
        for assignment in record.apex_assignments() {
            script.push_str(&format!("    m{i}[0].{assignment};\n"));
        }
        script.push_str(&format!("    o.add(m{i}[0]);\n"));
        script.push_str("}\n");
    }
    script.push_str("update o;\n");
    script
}

/// Fail with the list of ids that do not resolve to a row in the org.
pub fn existence_check_script(ids: &BTreeSet<String>) -> String {
    let mut script = String::from("List<String> missing = new List<String>();\n");
    for id in ids {
        let id = escape(id);
        script.push_str(&format!(
            "if (Database.query('SELECT Id FROM ' + ((Id) '{id}').getSObjectType() + ' WHERE Id = \\'{id}\\'').isEmpty()) {{ missing.add('{id}'); }}\n",
        ));
    }
    script.push_str(
        "if (!missing.isEmpty()) {\n    throw new IllegalArgumentException('Missing references: ' + String.join(missing, ', '));\n}\n",
    );
    script
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load::transform::FieldValue;

    fn record(ext: &str, name: &str) -> TransformedRecord {
        TransformedRecord {
            external_id: ext.to_string(),
            old_id: None,
            fields: vec![
                ("sfxid__c".to_string(), FieldValue::Text(ext.to_string())),
                ("name".to_string(), FieldValue::Text(name.to_string())),
                ("active__c".to_string(), FieldValue::Boolean(true)),
            ],
            content_replacements: Vec::new(),
        }
    }

    #[test]
    fn test_escape_single_pass() {
        assert_eq!(escape("a\\'b"), "a\\\\\\'b");
        assert_eq!(escape("x\r\ny"), "x\\r\\ny");
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn test_upsert_script() {
        let script = upsert_script("Account", "sfxId__c", &[record("A1", "Foo"), record("A2", "Bar")]);
        assert_eq!(
            script,
            "List<Account> o = new List<Account>();\n\
             o.add(new Account(sfxid__c='A1', name='Foo', active__c=true));\n\
             o.add(new Account(sfxid__c='A2', name='Bar', active__c=true));\n\
             upsert o sfxId__c;\n"
        );
    }

    #[test]
    fn test_update_script_matches_by_external_id() {
        let mut rec = record("O'1", "Foo");
        rec.fields.retain(|(k, _)| k != "sfxid__c");
        let script = update_script("Account", "sfxId__c", &[rec]);

        assert!(script.contains("List<Account> m0 = [SELECT Id FROM Account WHERE sfxId__c = 'O\\'1' LIMIT 1];"));
        assert!(script.contains("    m0[0].name='Foo';"));
        assert!(script.contains("    m0[0].active__c=true;"));
        assert!(script.contains("System.debug('NOT FOUND: O\\'1');"));
        assert!(script.ends_with("update o;\n"));
    }

    #[test]
    fn test_existence_check_script() {
        let ids: BTreeSet<String> = ["001000000000001AAA".to_string()].into_iter().collect();
        let script = existence_check_script(&ids);
        assert!(script.contains(
            "((Id) '001000000000001AAA').getSObjectType() + ' WHERE Id = \\'001000000000001AAA\\''"
        ));
        assert!(script.contains("missing.add('001000000000001AAA');"));
        assert!(script.contains("throw new IllegalArgumentException"));
    }
}
