//! The remote platform seam.
//!
//! Everything the load engine needs from Salesforce goes through [`Platform`]:
//! paginated SOQL, anonymous Apex, Bulk API ingest and field introspection.
//! `SalesforceClient` is the real implementation; tests supply their own.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::apex::ExecuteResult;
use super::bulk::BulkJobOutcome;
use super::query::{QueryResult, escape_soql};
use crate::error::LoadError;

/// Field name and declared data type as reported by `FieldDefinition`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    pub data_type: String,
}

impl FieldDefinition {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

/// How often and for how long a bulk job is polled.
#[derive(Debug, Clone, Copy)]
pub struct PollSettings {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            timeout: Duration::from_secs(1200),
        }
    }
}

#[async_trait]
pub trait Platform: Send + Sync {
    /// Run a SOQL query, following `nextRecordsUrl` until done or the
    /// client's record ceiling is reached.
    async fn query(&self, soql: &str) -> Result<QueryResult, LoadError>;

    /// Compile and run a piece of anonymous Apex.
    async fn execute_anonymous(&self, script: &str) -> Result<ExecuteResult, LoadError>;

    /// Upsert CSV rows through a Bulk API 2.0 ingest job and wait for it.
    async fn bulk_upsert(
        &self,
        object: &str,
        external_id: &str,
        csv: String,
        poll: PollSettings,
    ) -> Result<BulkJobOutcome, LoadError>;

    /// Field definitions for one object type.
    async fn describe_fields(&self, object: &str) -> Result<Vec<FieldDefinition>, LoadError> {
        let soql = format!(
            "SELECT QualifiedApiName, DataType FROM FieldDefinition \
             WHERE EntityDefinition.QualifiedApiName = '{}' ORDER BY QualifiedApiName",
            escape_soql(object)
        );
        let result = self.query(&soql).await?;

        let fields = result
            .records
            .iter()
            .filter_map(|record| {
                let name = record.get("QualifiedApiName")?.as_str()?;
                let data_type = record.get("DataType")?.as_str()?;
                Some(FieldDefinition::new(name, data_type))
            })
            .collect();
        Ok(fields)
    }
}
