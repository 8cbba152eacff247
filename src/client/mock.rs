//! Mock portal API client for testing
//!
//! Provides an in-memory implementation of the API traits for unit testing
//! without making real API calls.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use super::api::{AnalysisApi, CollectionApi};
use super::models::{Ack, Environment, Record, RecordId, ReportBundle, Submission};
use crate::error::{ApiError, Result};

/// Mock API client for testing.
///
/// Configure expected responses via builder methods, then use in tests.
///
/// # Example
/// ```ignore
/// let mock = MockPortalClient::new()
///     .with_collection("organizations", vec![org_record])
///     .await;
///
/// let records = mock.list_records("organizations").await?;
/// assert_eq!(records.len(), 1);
/// ```
#[derive(Default)]
pub struct MockPortalClient {
    /// Records per endpoint; mutations are applied in place
    collections: Arc<Mutex<HashMap<String, Vec<Record>>>>,
    /// Submission manifests keyed by hash
    submissions: Arc<Mutex<HashMap<String, Submission>>>,
    /// Report bundles keyed by report id
    reports: Arc<Mutex<HashMap<String, ReportBundle>>>,
    /// Report ids whose fetch fails
    failing_reports: Arc<Mutex<Vec<String>>>,
    /// Artificial latency per report id
    report_delays: Arc<Mutex<HashMap<String, Duration>>>,
    /// Environments to return from list_environments
    environments: Arc<Mutex<Vec<Environment>>>,
    /// Error to return (if any) - consumed on first use
    error: Arc<Mutex<Option<ApiError>>>,
    /// Next id handed out by create_record
    next_id: Arc<Mutex<i64>>,
    /// Leave the id out of create acks
    omit_created_ids: Arc<Mutex<bool>>,
    /// Artificial latency of delete_record
    delete_delay: Arc<Mutex<Option<Duration>>>,
    /// Track number of calls for verification
    call_count: Arc<Mutex<CallCounts>>,
}

/// Tracks API call counts for test verification
#[derive(Default, Debug, Clone)]
pub struct CallCounts {
    pub list_records: usize,
    pub get_record: usize,
    pub create_record: usize,
    pub update_record: usize,
    pub delete_record: usize,
    pub get_submission: usize,
    pub get_report: usize,
    pub list_environments: usize,
}

impl MockPortalClient {
    /// Create a new mock client with default (empty) responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the records of one collection.
    pub async fn with_collection(self, endpoint: &str, records: Vec<Record>) -> Self {
        self.collections
            .lock()
            .await
            .insert(endpoint.to_string(), records);
        self
    }

    /// Configure the status manifest for a sample hash.
    pub async fn with_submission(self, hash: &str, submission: Submission) -> Self {
        self.submissions
            .lock()
            .await
            .insert(hash.to_string(), submission);
        self
    }

    /// Configure the bundle returned for a report id.
    pub async fn with_report(self, report_id: &str, bundle: ReportBundle) -> Self {
        self.reports
            .lock()
            .await
            .insert(report_id.to_string(), bundle);
        self
    }

    /// Make the fetch of one report id fail with a server error.
    pub async fn failing_report(self, report_id: &str) -> Self {
        self.failing_reports
            .lock()
            .await
            .push(report_id.to_string());
        self
    }

    /// Delay the response for one report id.
    pub async fn with_report_delay(self, report_id: &str, delay: Duration) -> Self {
        self.report_delays
            .lock()
            .await
            .insert(report_id.to_string(), delay);
        self
    }

    /// Acknowledge creates with a message only, as some endpoints do.
    pub async fn without_created_ids(self) -> Self {
        *self.omit_created_ids.lock().await = true;
        self
    }

    /// Delay every delete_record response.
    pub async fn with_delete_delay(self, delay: Duration) -> Self {
        *self.delete_delay.lock().await = Some(delay);
        self
    }

    /// Configure environments to return from list_environments.
    pub async fn with_environments(self, environments: Vec<Environment>) -> Self {
        *self.environments.lock().await = environments;
        self
    }

    /// Configure an error to return on the next API call.
    /// The error is consumed after one use.
    pub async fn with_error(self, error: ApiError) -> Self {
        *self.error.lock().await = Some(error);
        self
    }

    /// Arm an error for the next call on an already shared client.
    pub async fn fail_next(&self, error: ApiError) {
        *self.error.lock().await = Some(error);
    }

    /// Get the call counts for verification in tests.
    pub async fn call_counts(&self) -> CallCounts {
        self.call_count.lock().await.clone()
    }

    /// Current server-side records of a collection.
    pub async fn records(&self, endpoint: &str) -> Vec<Record> {
        self.collections
            .lock()
            .await
            .get(endpoint)
            .cloned()
            .unwrap_or_default()
    }

    /// Check if there's a pending error and consume it.
    async fn check_error(&self) -> Result<()> {
        let mut error = self.error.lock().await;
        if let Some(e) = error.take() {
            return Err(e.into());
        }
        Ok(())
    }

    fn not_found(endpoint: &str, id: &RecordId) -> ApiError {
        ApiError::NotFound(format!("{}/{}", endpoint, id))
    }
}

fn matches_id(record: &Record, id: &RecordId) -> bool {
    RecordId::of(record, "id").as_ref() == Some(id)
}

// ============================================================================
// CollectionApi Implementation
// ============================================================================

#[async_trait]
impl CollectionApi for MockPortalClient {
    async fn list_records(&self, endpoint: &str) -> Result<Vec<Record>> {
        self.call_count.lock().await.list_records += 1;
        self.check_error().await?;

        Ok(self.records(endpoint).await)
    }

    async fn get_record(&self, endpoint: &str, id: &RecordId) -> Result<Record> {
        self.call_count.lock().await.get_record += 1;
        self.check_error().await?;

        let collections = self.collections.lock().await;
        collections
            .get(endpoint)
            .and_then(|records| records.iter().find(|r| matches_id(r, id)))
            .cloned()
            .ok_or_else(|| Self::not_found(endpoint, id).into())
    }

    async fn create_record(&self, endpoint: &str, record: &Record) -> Result<Ack> {
        self.call_count.lock().await.create_record += 1;
        self.check_error().await?;

        let id = {
            let mut next = self.next_id.lock().await;
            *next += 1;
            1000 + *next
        };

        let mut stored = record.clone();
        stored.insert("id".to_string(), Value::from(id));
        self.collections
            .lock()
            .await
            .entry(endpoint.to_string())
            .or_default()
            .push(stored);

        let omit_id = *self.omit_created_ids.lock().await;
        Ok(Ack {
            message: "Created".to_string(),
            id: (!omit_id).then_some(Value::from(id)),
        })
    }

    async fn update_record(&self, endpoint: &str, id: &RecordId, patch: &Record) -> Result<Ack> {
        self.call_count.lock().await.update_record += 1;
        self.check_error().await?;

        let mut collections = self.collections.lock().await;
        let record = collections
            .get_mut(endpoint)
            .and_then(|records| records.iter_mut().find(|r| matches_id(r, id)))
            .ok_or_else(|| Self::not_found(endpoint, id))?;

        for (key, value) in patch {
            record.insert(key.clone(), value.clone());
        }

        Ok(Ack {
            message: "Saved".to_string(),
            id: None,
        })
    }

    async fn delete_record(&self, endpoint: &str, id: &RecordId) -> Result<Ack> {
        self.call_count.lock().await.delete_record += 1;
        self.check_error().await?;

        let delay = *self.delete_delay.lock().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut collections = self.collections.lock().await;
        let records = collections
            .get_mut(endpoint)
            .ok_or_else(|| Self::not_found(endpoint, id))?;
        let before = records.len();
        records.retain(|r| !matches_id(r, id));
        if records.len() == before {
            return Err(Self::not_found(endpoint, id).into());
        }

        Ok(Ack {
            message: "Deleted".to_string(),
            id: None,
        })
    }
}

// ============================================================================
// AnalysisApi Implementation
// ============================================================================

#[async_trait]
impl AnalysisApi for MockPortalClient {
    async fn get_submission(&self, hash: &str, _sid: Option<&str>) -> Result<Submission> {
        self.call_count.lock().await.get_submission += 1;
        self.check_error().await?;

        self.submissions
            .lock()
            .await
            .get(hash)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("sample {}", hash)).into())
    }

    async fn get_report(&self, _hash: &str, report_id: &str) -> Result<ReportBundle> {
        self.call_count.lock().await.get_report += 1;

        let delay = self.report_delays.lock().await.get(report_id).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self
            .failing_reports
            .lock()
            .await
            .iter()
            .any(|r| r == report_id)
        {
            return Err(ApiError::ServerError(format!("report {} unavailable", report_id)).into());
        }

        self.reports
            .lock()
            .await
            .get(report_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("report {}", report_id)).into())
    }

    async fn list_environments(&self) -> Result<Vec<Environment>> {
        self.call_count.lock().await.list_environments += 1;
        self.check_error().await?;

        Ok(self.environments.lock().await.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_mock_update_and_delete_mutate_store() {
        let mock = MockPortalClient::new()
            .with_collection(
                "groups",
                vec![record(json!({"id": 1, "name": "a"})), record(json!({"id": 2, "name": "b"}))],
            )
            .await;

        mock.update_record("groups", &RecordId::new("1"), &record(json!({"name": "z"})))
            .await
            .unwrap();
        mock.delete_record("groups", &RecordId::new("2"))
            .await
            .unwrap();

        let records = mock.records("groups").await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["name"], "z");
    }

    #[tokio::test]
    async fn test_mock_error_consumed_once() {
        let mock = MockPortalClient::new()
            .with_error(ApiError::Transport("down".to_string()))
            .await;

        assert!(mock.list_records("groups").await.is_err());
        assert!(mock.list_records("groups").await.is_ok());
        assert_eq!(mock.call_counts().await.list_records, 2);
    }

    #[tokio::test]
    async fn test_mock_environments() {
        let mock = MockPortalClient::new()
            .with_environments(vec![Environment {
                id: json!(1),
                name: "win7-sp1".to_string(),
            }])
            .await;

        let envs = mock.list_environments().await.unwrap();

        assert_eq!(envs[0].name, "win7-sp1");
        assert_eq!(mock.call_counts().await.list_environments, 1);
    }
}
