//! Bulk API 2.0 ingest job types.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BulkJobState {
    Open,
    UploadComplete,
    InProgress,
    JobComplete,
    Failed,
    Aborted,
}

impl BulkJobState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            BulkJobState::JobComplete | BulkJobState::Failed | BulkJobState::Aborted
        )
    }
}

/// Request body for creating an upsert ingest job.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateIngestJobRequest<'a> {
    pub object: &'a str,
    pub operation: &'static str,
    pub external_id_field_name: &'a str,
    pub content_type: &'static str,
    pub line_ending: &'static str,
}

/// Job info as returned by `GET /jobs/ingest/{id}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireIngestJobInfo {
    pub id: String,
    pub state: BulkJobState,
    #[serde(default)]
    pub number_records_processed: Option<u64>,
    #[serde(default)]
    pub number_records_failed: Option<u64>,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// Final state of an ingest job.
#[derive(Debug, Clone)]
pub struct BulkJobOutcome {
    pub job_id: String,
    pub state: BulkJobState,
    pub records_processed: u64,
    pub records_failed: u64,
    pub error_message: Option<String>,
    /// `failedResults` CSV, fetched only when some records failed.
    pub failed_results: Option<String>,
}

impl BulkJobOutcome {
    pub fn is_success(&self) -> bool {
        self.state == BulkJobState::JobComplete && self.records_failed == 0
    }

    pub fn diagnostic(&self) -> String {
        let mut out = format!(
            "Bulk job {} finished in state {:?}: {} processed, {} failed",
            self.job_id, self.state, self.records_processed, self.records_failed
        );
        if let Some(message) = &self.error_message {
            out.push_str(&format!("\nError: {}", message));
        }
        if let Some(failed) = &self.failed_results {
            out.push_str("\nFailed records:\n");
            out.push_str(failed);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_job_info_parses() {
        let body = json!({
            "id": "750xx000000001",
            "operation": "upsert",
            "object": "Account",
            "state": "JobComplete",
            "numberRecordsProcessed": 10,
            "numberRecordsFailed": 1
        });
        let info: WireIngestJobInfo = serde_json::from_value(body).unwrap();
        assert_eq!(info.state, BulkJobState::JobComplete);
        assert!(info.state.is_terminal());
        assert_eq!(info.number_records_failed, Some(1));
    }

    #[test]
    fn test_create_request_serializes_camel_case() {
        let req = CreateIngestJobRequest {
            object: "Account",
            operation: "upsert",
            external_id_field_name: "sfxId__c",
            content_type: "CSV",
            line_ending: "LF",
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["externalIdFieldName"], "sfxId__c");
        assert_eq!(value["lineEnding"], "LF");
    }

    #[test]
    fn test_outcome_with_failures_is_not_success() {
        let outcome = BulkJobOutcome {
            job_id: "750".into(),
            state: BulkJobState::JobComplete,
            records_processed: 2,
            records_failed: 1,
            error_message: None,
            failed_results: Some("\"sf__Id\",\"sf__Error\"\n\"\",\"REQUIRED_FIELD_MISSING\"\n".into()),
        };
        assert!(!outcome.is_success());
        assert!(outcome.diagnostic().contains("REQUIRED_FIELD_MISSING"));
    }
}
