use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading, transforming and submitting records.
///
/// `RemoteExecution` is batch scoped: it is recorded in the run report and
/// later batches still run. Everything else is fatal to the run.
#[derive(Debug, Error)]
pub enum LoadError {
    // ── Pre-flight ────────────────────────────────────────────────────────────
    #[error("Validation failed: {0}")]
    Validation(String),

    // ── Batch scoped ──────────────────────────────────────────────────────────
    #[error("Remote execution failed: {0}")]
    RemoteExecution(String),

    // ── Run fatal ─────────────────────────────────────────────────────────────
    #[error("Reference check failed for {}: {diagnostic}", .ids.join(", "))]
    ReferenceIntegrity { ids: Vec<String>, diagnostic: String },

    #[error("Failed to write id-map {}: {source}", .path.display())]
    IdMapIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Query not done: {0}")]
    QueryIncomplete(String),

    #[error("Bulk job {job_id} did not finish within {waited_secs}s")]
    BulkTimeout { job_id: String, waited_secs: u64 },

    #[error("Salesforce error: {0}")]
    Platform(String),

    // ── File / CSV ────────────────────────────────────────────────────────────
    #[error("Invalid CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl LoadError {
    /// True for errors that fail a single batch but let the run continue.
    pub fn is_batch_scoped(&self) -> bool {
        matches!(self, LoadError::RemoteExecution(_))
    }

    /// Scope a transport error to the batch whose request it failed.
    pub fn into_batch_failure(self) -> Self {
        match self {
            LoadError::Platform(message) => LoadError::RemoteExecution(message),
            other => other,
        }
    }
}

impl From<reqwest::Error> for LoadError {
    fn from(err: reqwest::Error) -> Self {
        LoadError::Platform(err.to_string())
    }
}

impl From<serde_json::Error> for LoadError {
    fn from(err: serde_json::Error) -> Self {
        LoadError::Platform(format!("Unexpected response body: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_scoped_errors_are_flagged() {
        assert!(LoadError::RemoteExecution("boom".into()).is_batch_scoped());
        assert!(
            !LoadError::ReferenceIntegrity {
                ids: vec!["001000000000001AAA".into()],
                diagnostic: String::new(),
            }
            .is_batch_scoped()
        );
        assert!(!LoadError::Platform("HTTP 500".into()).is_batch_scoped());
        assert!(!LoadError::Validation("dup".into()).is_batch_scoped());
        assert!(!LoadError::QueryIncomplete("SELECT Id FROM Account".into()).is_batch_scoped());
    }

    #[test]
    fn transport_errors_scope_to_the_batch() {
        let err = LoadError::Platform("HTTP 414: URI Too Long".into()).into_batch_failure();
        assert!(err.is_batch_scoped());
        assert_eq!(err.to_string(), "Remote execution failed: HTTP 414: URI Too Long");

        let err = LoadError::QueryIncomplete("SELECT Id FROM Account".into()).into_batch_failure();
        assert!(!err.is_batch_scoped());
    }

    #[test]
    fn reference_error_lists_ids() {
        let err = LoadError::ReferenceIntegrity {
            ids: vec!["a".into(), "b".into()],
            diagnostic: "not found".into(),
        };
        assert_eq!(err.to_string(), "Reference check failed for a, b: not found");
    }
}
