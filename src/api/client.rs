use std::time::{Duration, Instant};

use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::{Method, RequestBuilder};
use serde::Deserialize;
use serde_json::Value;

use super::apex::{ExecuteResult, parse_soap_response, soap_request};
use super::auth::Session;
use super::bulk::{BulkJobOutcome, BulkJobState, CreateIngestJobRequest, WireIngestJobInfo};
use super::platform::{Platform, PollSettings};
use super::query::{QueryResult, WireQueryResponse};
use crate::error::LoadError;

/// Ceiling on records fetched by one paginated query.
const MAX_FETCH: usize = 50_000;

/// Salesforce API error entry; the API returns a JSON array of these.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireSalesforceError {
    message: String,
    error_code: String,
}

/// Salesforce REST client with connection pooling.
#[derive(Clone)]
pub struct SalesforceClient {
    http: reqwest::Client,
    session: Session,
    api_version: String,
    max_fetch: usize,
}

impl SalesforceClient {
    pub fn new(session: Session, api_version: impl Into<String>) -> Result<Self, LoadError> {
        let http = reqwest::Client::builder()
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(Duration::from_secs(300))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("sf-migrate/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| LoadError::Platform(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            session,
            api_version: api_version.into(),
            max_fetch: MAX_FETCH,
        })
    }

    pub fn with_max_fetch(mut self, max_fetch: usize) -> Self {
        self.max_fetch = max_fetch;
        self
    }

    pub fn instance_url(&self) -> &str {
        &self.session.instance_url
    }

    fn data_url(&self, path: &str) -> String {
        format!(
            "{}/services/data/{}/{}",
            self.session.instance_url.trim_end_matches('/'),
            self.api_version,
            path.trim_start_matches('/')
        )
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        debug!("{} {}", method, url.split('?').next().unwrap_or(url));
        self.http
            .request(method, url)
            .bearer_auth(&self.session.access_token)
            .header("Accept", "application/json")
    }

    /// Send a request and map non-2xx responses to `LoadError::Platform`.
    async fn send(&self, builder: RequestBuilder) -> Result<reqwest::Response, LoadError> {
        let response = builder.send().await?;
        let status = response.status();
        debug!("Response status: {}", status);
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<Vec<WireSalesforceError>>(&body) {
            Ok(errors) if !errors.is_empty() => errors
                .iter()
                .map(|e| format!("{}: {}", e.error_code, e.message))
                .collect::<Vec<_>>()
                .join("; "),
            _ => format!("HTTP {}: {}", status.as_u16(), body),
        };
        Err(LoadError::Platform(message))
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T, LoadError> {
        let response = self.send(self.request(Method::GET, url)).await?;
        Ok(response.json::<T>().await?)
    }

    async fn get_ingest_job(&self, job_id: &str) -> Result<WireIngestJobInfo, LoadError> {
        self.get_json(&self.data_url(&format!("jobs/ingest/{}", job_id)))
            .await
    }
}

#[async_trait]
impl Platform for SalesforceClient {
    async fn query(&self, soql: &str) -> Result<QueryResult, LoadError> {
        let mut url = format!(
            "{}?q={}",
            self.data_url("query"),
            urlencoding::encode(soql)
        );
        let mut records: Vec<Value> = Vec::new();

        loop {
            let page: WireQueryResponse = self.get_json(&url).await?;
            records.extend(page.records);
            debug!("Fetched {}/{} records", records.len(), page.total_size);

            match page.next_records_url {
                Some(next) if !page.done && records.len() < self.max_fetch => {
                    url = format!("{}{}", self.session.instance_url.trim_end_matches('/'), next);
                }
                _ => {
                    let done = page.done;
                    if !done {
                        warn!("Query stopped after {} records (ceiling {})", records.len(), self.max_fetch);
                    }
                    return Ok(QueryResult {
                        records,
                        total_size: page.total_size,
                        done,
                    });
                }
            }
        }
    }

    async fn execute_anonymous(&self, script: &str) -> Result<ExecuteResult, LoadError> {
        let url = format!(
            "{}/services/Soap/s/{}",
            self.session.instance_url.trim_end_matches('/'),
            self.api_version.trim_start_matches('v')
        );
        debug!("Executing anonymous Apex ({} bytes)", script.len());

        let response = self
            .http
            .post(&url)
            .header("Content-Type", "text/xml; charset=UTF-8")
            .header("SOAPAction", "executeAnonymous")
            .body(soap_request(&self.session.access_token, script))
            .send()
            .await?;
        let status = response.status();
        debug!("Response status: {}", status);
        let body = response.text().await?;

        // Faults arrive as HTTP 500 with a SOAP body worth reporting.
        if !status.is_success() && !body.contains("Fault>") {
            return Err(LoadError::Platform(format!("HTTP {}: {}", status.as_u16(), body)));
        }
        parse_soap_response(&body)
    }

    async fn bulk_upsert(
        &self,
        object: &str,
        external_id: &str,
        csv: String,
        poll: PollSettings,
    ) -> Result<BulkJobOutcome, LoadError> {
        let create = CreateIngestJobRequest {
            object,
            operation: "upsert",
            external_id_field_name: external_id,
            content_type: "CSV",
            line_ending: "LF",
        };
        let job: WireIngestJobInfo = self
            .send(
                self.request(Method::POST, &self.data_url("jobs/ingest"))
                    .json(&create),
            )
            .await?
            .json()
            .await?;
        info!("Created bulk ingest job {}", job.id);

        self.send(
            self.request(Method::PUT, &self.data_url(&format!("jobs/ingest/{}/batches", job.id)))
                .header("Content-Type", "text/csv")
                .body(csv),
        )
        .await?;

        self.send(
            self.request(Method::PATCH, &self.data_url(&format!("jobs/ingest/{}", job.id)))
                .json(&serde_json::json!({ "state": "UploadComplete" })),
        )
        .await?;
        debug!("Uploaded data for job {}", job.id);

        let started = Instant::now();
        let info = loop {
            let info = self.get_ingest_job(&job.id).await?;
            if info.state.is_terminal() {
                break info;
            }
            if started.elapsed() >= poll.timeout {
                return Err(LoadError::BulkTimeout {
                    job_id: job.id,
                    waited_secs: started.elapsed().as_secs(),
                });
            }
            debug!("Job {} is {:?}, polling again", info.id, info.state);
            tokio::time::sleep(poll.interval).await;
        };

        let records_failed = info.number_records_failed.unwrap_or(0);
        let failed_results = if records_failed > 0 {
            let response = self
                .send(self.request(
                    Method::GET,
                    &self.data_url(&format!("jobs/ingest/{}/failedResults/", info.id)),
                ))
                .await?;
            Some(response.text().await?)
        } else {
            None
        };

        if info.state != BulkJobState::JobComplete {
            warn!("Bulk job {} ended in state {:?}", info.id, info.state);
        }

        Ok(BulkJobOutcome {
            job_id: info.id,
            state: info.state,
            records_processed: info.number_records_processed.unwrap_or(0),
            records_failed,
            error_message: info.error_message,
            failed_results,
        })
    }
}
