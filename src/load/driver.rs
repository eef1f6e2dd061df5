//! Sequential batch load: transform, check references, diff, submit, requery.

use std::collections::{BTreeSet, HashMap, HashSet};

use log::{debug, error, info, warn};
use serde_json::Value;

use super::diff::{self, DiffStatus};
use super::idmap::{IdMap, IdMapFile};
use super::record::Record;
use super::schema::FieldClassification;
use super::script::{existence_check_script, update_script, upsert_script};
use super::transform::{FieldTransformer, TransformedBatch, TransformedRecord, bulk_csv};
use crate::api::{Platform, PollSettings, field_text, in_clause};
use crate::error::LoadError;

pub const DEFAULT_BATCH_SIZE: usize = 10;

/// How a batch is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadMode {
    /// One anonymous Apex script per batch.
    #[default]
    Script,
    /// One Bulk API 2.0 ingest job per batch.
    Bulk,
}

#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub object: String,
    /// External id field as given; used verbatim in SOQL and Apex.
    pub external_id: String,
    pub batch_size: usize,
    pub ignore_fields: HashSet<String>,
    pub content_replace: HashSet<String>,
    pub mode: LoadMode,
    /// Insert-or-update when true, update existing rows only when false.
    pub upsert: bool,
    pub diff: bool,
    pub strict_id_check: bool,
    pub dry_run: bool,
    pub poll: PollSettings,
}

impl LoadOptions {
    pub fn new(object: impl Into<String>, external_id: impl Into<String>) -> Self {
        Self {
            object: object.into(),
            external_id: external_id.into(),
            batch_size: DEFAULT_BATCH_SIZE,
            ignore_fields: HashSet::new(),
            content_replace: HashSet::new(),
            mode: LoadMode::Script,
            upsert: true,
            diff: false,
            strict_id_check: true,
            dry_run: false,
            poll: PollSettings::default(),
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_ignore_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.ignore_fields = lowercase_set(fields);
        self
    }

    pub fn with_content_replace<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.content_replace = lowercase_set(fields);
        self
    }

    pub fn with_mode(mut self, mode: LoadMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn update_only(mut self, update_only: bool) -> Self {
        self.upsert = !update_only;
        self
    }

    pub fn with_diff(mut self, diff: bool) -> Self {
        self.diff = diff;
        self
    }

    pub fn with_id_check(mut self, strict: bool) -> Self {
        self.strict_id_check = strict;
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_poll(mut self, poll: PollSettings) -> Self {
        self.poll = poll;
        self
    }

    /// Lowercase key used to read the external id from input rows.
    pub fn external_id_key(&self) -> String {
        self.external_id.to_lowercase()
    }

    fn validate(&self) -> Result<(), LoadError> {
        if self.batch_size == 0 {
            return Err(LoadError::Validation("Batch size must be at least 1".into()));
        }
        if self.external_id.trim().is_empty() {
            return Err(LoadError::Validation("External id field is required".into()));
        }
        if self.mode == LoadMode::Bulk && !self.upsert {
            return Err(LoadError::Validation(
                "Bulk mode only supports upsert; drop --update-only or --bulk".into(),
            ));
        }
        Ok(())
    }
}

fn lowercase_set<I, S>(fields: I) -> HashSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    fields
        .into_iter()
        .map(|f| f.as_ref().trim().to_lowercase())
        .filter(|f| !f.is_empty())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    pub index: usize,
    pub size: usize,
    pub error: Option<String>,
}

impl BatchOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffSummary {
    pub new: usize,
    pub changed: usize,
    pub unchanged: usize,
}

impl DiffSummary {
    fn record(&mut self, status: &DiffStatus) {
        match status {
            DiffStatus::New => self.new += 1,
            DiffStatus::Changed(_) => self.changed += 1,
            DiffStatus::Unchanged => self.unchanged += 1,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub batches: Vec<BatchOutcome>,
    /// Id-map entries written or overwritten during the run.
    pub mapped: usize,
    /// Input records whose external id was not found on requery.
    pub unresolved: usize,
    pub diff: DiffSummary,
    pub dry_run: bool,
}

impl LoadReport {
    pub fn is_success(&self) -> bool {
        self.batches.iter().all(BatchOutcome::is_ok)
    }

    pub fn failed_batches(&self) -> impl Iterator<Item = &BatchOutcome> {
        self.batches.iter().filter(|b| !b.is_ok())
    }
}

/// Reject the input if any record lacks an external id or two share one.
pub fn validate_external_ids(records: &[Record], external_id: &str) -> Result<(), LoadError> {
    let mut seen = HashSet::new();
    let mut duplicates = BTreeSet::new();
    let mut empty_rows = Vec::new();

    for (i, record) in records.iter().enumerate() {
        match record.get(external_id).filter(|v| !v.is_empty()) {
            Some(value) => {
                if !seen.insert(value) {
                    duplicates.insert(value);
                }
            }
            // header is line 1
            None => empty_rows.push((i + 2).to_string()),
        }
    }

    if !empty_rows.is_empty() {
        return Err(LoadError::Validation(format!(
            "Missing {} value on line(s) {}",
            external_id,
            empty_rows.join(", ")
        )));
    }
    if !duplicates.is_empty() {
        let values: Vec<&str> = duplicates.into_iter().collect();
        return Err(LoadError::Validation(format!(
            "Duplicate {} value(s): {}",
            external_id,
            values.join(", ")
        )));
    }
    Ok(())
}

pub struct BatchDriver<'a, P: Platform + ?Sized> {
    platform: &'a P,
    options: &'a LoadOptions,
}

impl<'a, P: Platform + ?Sized> BatchDriver<'a, P> {
    pub fn new(platform: &'a P, options: &'a LoadOptions) -> Self {
        Self { platform, options }
    }

    /// Load all records in order, updating `idmap` as ids are resolved.
    ///
    /// Batch-scoped failures are recorded in the report; anything else aborts
    /// the run after a best-effort save of the id-map.
    pub async fn run(&self, records: &[Record], idmap: &mut IdMapFile) -> Result<LoadReport, LoadError> {
        self.options.validate()?;
        let ext_key = self.options.external_id_key();
        validate_external_ids(records, &ext_key)?;

        let mut report = LoadReport {
            dry_run: self.options.dry_run,
            ..LoadReport::default()
        };

        if records.is_empty() {
            println!("No records to load");
            return Ok(report);
        }

        info!(
            "Loading {} {} records in batches of {} ({:?}, upsert: {}, dry run: {})",
            records.len(),
            self.options.object,
            self.options.batch_size,
            self.options.mode,
            self.options.upsert,
            self.options.dry_run
        );

        if let Err(e) = self.run_batches(records, idmap, &mut report).await {
            error!("Load aborted: {}", e);
            if !self.options.dry_run {
                if let Err(save_err) = idmap.save() {
                    warn!("Could not save id-map after abort: {}", save_err);
                }
            }
            return Err(e);
        }

        if self.options.dry_run {
            println!("Dry run: id-map {} not saved", idmap.path().display());
            info!("Dry run, skipping id-map save");
        } else {
            idmap.save()?;
        }

        Ok(report)
    }

    async fn run_batches(
        &self,
        records: &[Record],
        idmap: &mut IdMapFile,
        report: &mut LoadReport,
    ) -> Result<(), LoadError> {
        let definitions = self.platform.describe_fields(&self.options.object).await?;
        let classification = FieldClassification::from_definitions(&definitions);
        debug!(
            "{} fields on {}, {} formula fields ignored",
            definitions.len(),
            self.options.object,
            classification.ignored_count()
        );

        let ext_key = self.options.external_id_key();
        let mut ignore = self.options.ignore_fields.clone();
        ignore.insert("id".to_string());
        if !self.options.upsert {
            ignore.insert(ext_key.clone());
        }

        for (index, batch) in records.chunks(self.options.batch_size).enumerate() {
            println!("batch#{} size: {}", index, batch.len());

            let transformed = FieldTransformer::new(
                &classification,
                idmap.map(),
                &ignore,
                &self.options.content_replace,
                &ext_key,
            )
            .transform_batch(batch);

            for record in &transformed.records {
                for (old, new) in &record.content_replacements {
                    println!("CONTENT: {} => {}", old, new);
                }
            }

            let result = self.process_batch(&transformed, idmap.map_mut(), report).await;
            let outcome = match result {
                Ok(()) => BatchOutcome {
                    index,
                    size: batch.len(),
                    error: None,
                },
                Err(e) if e.is_batch_scoped() => {
                    error!("Batch {} failed: {}", index, e);
                    println!("batch#{} failed: {}", index, e);
                    BatchOutcome {
                        index,
                        size: batch.len(),
                        error: Some(e.to_string()),
                    }
                }
                Err(e) => return Err(e),
            };
            report.batches.push(outcome);
        }

        Ok(())
    }

    async fn process_batch(
        &self,
        batch: &TransformedBatch,
        idmap: &mut IdMap,
        report: &mut LoadReport,
    ) -> Result<(), LoadError> {
        if self.options.strict_id_check && !batch.ids_to_validate.is_empty() {
            self.check_references(&batch.ids_to_validate)
                .await
                .map_err(LoadError::into_batch_failure)?;
        }

        if self.options.diff {
            self.diff(&batch.records, report).await?;
        }

        if self.options.dry_run {
            println!("Dry run: skipping write of {} records", batch.records.len());
            return Ok(());
        }

        let submitted = self
            .submit(&batch.records)
            .await
            .map_err(LoadError::into_batch_failure);

        // Partial writes still get their ids recorded.
        if submitted.as_ref().is_err_and(|e| !e.is_batch_scoped()) {
            return submitted;
        }
        self.requery(&batch.records, idmap, report).await?;
        submitted
    }

    async fn check_references(&self, ids: &BTreeSet<String>) -> Result<(), LoadError> {
        debug!("Checking {} referenced ids", ids.len());
        let script = existence_check_script(ids);
        let result = self.platform.execute_anonymous(&script).await?;

        if result.success {
            return Ok(());
        }

        let diagnostic = result.diagnostic();
        println!("{}", diagnostic);
        debug!("Executed Script START\n{}\nExecuted Script END", script);
        Err(LoadError::ReferenceIntegrity {
            ids: ids.iter().cloned().collect(),
            diagnostic,
        })
    }

    async fn submit(&self, records: &[TransformedRecord]) -> Result<(), LoadError> {
        let options = self.options;
        match options.mode {
            LoadMode::Script => {
                let script = if options.upsert {
                    upsert_script(&options.object, &options.external_id, records)
                } else {
                    update_script(&options.object, &options.external_id, records)
                };
                let result = self.platform.execute_anonymous(&script).await?;
                if result.success {
                    debug!("Script for {} records succeeded", records.len());
                    return Ok(());
                }

                let diagnostic = result.diagnostic();
                println!("{}", diagnostic);
                debug!("Executed Script START\n{}\nExecuted Script END", script);
                Err(LoadError::RemoteExecution(diagnostic))
            }
            LoadMode::Bulk => {
                let csv = bulk_csv(records)?;
                let outcome = self
                    .platform
                    .bulk_upsert(&options.object, &options.external_id, csv, options.poll)
                    .await?;
                info!(
                    "Bulk job {} processed {} records, {} failed",
                    outcome.job_id, outcome.records_processed, outcome.records_failed
                );
                if outcome.is_success() {
                    Ok(())
                } else {
                    let diagnostic = outcome.diagnostic();
                    println!("{}", diagnostic);
                    Err(LoadError::RemoteExecution(diagnostic))
                }
            }
        }
    }

    /// Map source ids to the ids the org now holds for each external id.
    async fn requery(
        &self,
        records: &[TransformedRecord],
        idmap: &mut IdMap,
        report: &mut LoadReport,
    ) -> Result<(), LoadError> {
        let ext = &self.options.external_id;
        let soql = format!(
            "SELECT Id, {} FROM {} WHERE {} IN {}",
            ext,
            self.options.object,
            ext,
            in_clause(records.iter().map(|r| r.external_id.as_str()))
        );
        let result = self.platform.query(&soql).await?;
        if !result.done {
            return Err(LoadError::QueryIncomplete(soql));
        }

        let old_ids: HashMap<&str, Option<&str>> = records
            .iter()
            .map(|r| (r.external_id.as_str(), r.old_id.as_deref()))
            .collect();
        let mut resolved = HashSet::new();

        for row in &result.records {
            let Some(new_id) = field_text(row, "Id") else {
                continue;
            };
            let ext_value = field_text(row, ext).unwrap_or_default();

            match old_ids.get(ext_value.as_str()) {
                Some(Some(old_id)) => {
                    resolved.insert(ext_value.clone());
                    if *old_id != new_id {
                        println!("{} => {}", old_id, new_id);
                        idmap.insert(*old_id, new_id.as_str());
                        report.mapped += 1;
                    }
                }
                Some(None) => {
                    resolved.insert(ext_value.clone());
                    println!("{} => {}", ext_value, new_id);
                }
                None => println!("MISSING => {}", new_id),
            }
        }

        for record in records {
            if !resolved.contains(&record.external_id) {
                println!("{} => MISSING", record.external_id);
                report.unresolved += 1;
            }
        }
        Ok(())
    }

    async fn diff(&self, records: &[TransformedRecord], report: &mut LoadReport) -> Result<(), LoadError> {
        let ext = &self.options.external_id;
        let ext_key = self.options.external_id_key();

        let mut columns: Vec<&str> = vec![ext.as_str()];
        for record in records {
            for (field, _) in &record.fields {
                if !columns.iter().any(|c| c.eq_ignore_ascii_case(field)) {
                    columns.push(field);
                }
            }
        }

        let soql = format!(
            "SELECT {} FROM {} WHERE {} IN {}",
            columns.join(", "),
            self.options.object,
            ext,
            in_clause(records.iter().map(|r| r.external_id.as_str()))
        );
        let result = self.platform.query(&soql).await?;
        if !result.done {
            warn!("Diff query returned a partial result: {}", soql);
        }

        let remote: HashMap<String, &Value> = result
            .records
            .iter()
            .filter_map(|row| field_text(row, &ext_key).map(|key| (key, row)))
            .collect();

        for record in records {
            let status = diff::diff_record(record, remote.get(&record.external_id).copied());
            for line in diff::render(&record.external_id, &status) {
                println!("{}", line);
            }
            report.diff.record(&status);
        }
        Ok(())
    }
}
