//! Dynamic analysis API trait

use async_trait::async_trait;

use crate::client::models::{Environment, ReportBundle, Submission};
use crate::error::Result;

/// Sandbox (dynamic analysis) operations for the portal API
#[async_trait]
pub trait AnalysisApi: Send + Sync {
    /// Get the per-environment status manifest of a sample.
    ///
    /// Fails with `NotFound` when the hash is unknown.
    async fn get_submission(&self, hash: &str, sid: Option<&str>) -> Result<Submission>;

    /// Get the detailed report of a finished submission.
    async fn get_report(&self, hash: &str, report_id: &str) -> Result<ReportBundle>;

    /// List sandbox environments, sorted by id.
    async fn list_environments(&self) -> Result<Vec<Environment>>;
}
