//! Dynamic analysis report aggregation
//!
//! A sample is run in several sandbox environments. The submission manifest
//! says which runs are finished; finished runs have a detailed report that
//! has to be fetched separately. The aggregator turns the manifest into one
//! [`Summary`] per environment: pending runs carry their status, finished
//! runs carry their report.

use std::sync::Arc;

use log::debug;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::watch;

use crate::client::AnalysisApi;
use crate::client::models::{EnvironmentStatus, ReportBundle, SubmissionStatus};
use crate::client::settle_all;
use crate::error::{ApiError, Result};
use crate::output::notify::Notifier;

/// Default bound on concurrent report fetches
pub const DEFAULT_MAX_CONCURRENT: usize = 8;

/// Merged view of one environment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub env: String,

    #[serde(flatten)]
    pub state: SummaryState,
}

/// Either the outstanding status or the fetched report, never both
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SummaryState {
    Pending { submission_status: SubmissionStatus },
    Report { report: Value },
}

impl Summary {
    pub fn pending(env: impl Into<String>, status: SubmissionStatus) -> Self {
        Self {
            env: env.into(),
            state: SummaryState::Pending {
                submission_status: status,
            },
        }
    }

    pub fn report(env: impl Into<String>, report: Value) -> Self {
        Self {
            env: env.into(),
            state: SummaryState::Report { report },
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, SummaryState::Pending { .. })
    }
}

/// Builds the per-environment summary list of a sample
pub struct ReportAggregator<A: AnalysisApi + ?Sized> {
    client: Arc<A>,
    notifier: Arc<dyn Notifier>,
    max_concurrent: usize,
    publisher: watch::Sender<Vec<Summary>>,
}

impl<A: AnalysisApi + ?Sized + 'static> ReportAggregator<A> {
    pub fn new(client: Arc<A>, notifier: Arc<dyn Notifier>) -> Self {
        let (publisher, _) = watch::channel(Vec::new());
        Self {
            client,
            notifier,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            publisher,
        }
    }

    pub fn max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    /// Receive the summary list each time a load succeeds.
    pub fn subscribe(&self) -> watch::Receiver<Vec<Summary>> {
        self.publisher.subscribe()
    }

    /// Summaries of the last successful load.
    pub fn summaries(&self) -> Vec<Summary> {
        self.publisher.borrow().clone()
    }

    /// Aggregate and publish. On failure the notifier is told and the
    /// previously published summaries stay in place.
    pub async fn load(&self, hash: &str, sid: Option<&str>) -> Result<Vec<Summary>> {
        match self.aggregate(hash, sid).await {
            Ok(summaries) => {
                self.publisher.send_replace(summaries.clone());
                Ok(summaries)
            }
            Err(err) => {
                self.notifier.error(&err);
                Err(err)
            }
        }
    }

    /// Build the summary list for `hash`.
    ///
    /// Pending environments come first, in manifest order, followed by one
    /// summary per result of every finished report. Reports are fetched
    /// concurrently and all of them settle before merging. If any report
    /// fetch fails, the whole aggregation fails and nothing is returned.
    pub async fn aggregate(&self, hash: &str, sid: Option<&str>) -> Result<Vec<Summary>> {
        let submission = self.client.get_submission(hash, sid).await?;

        let (done, pending): (Vec<EnvironmentStatus>, Vec<EnvironmentStatus>) = submission
            .statuses
            .into_iter()
            .partition(|s| s.submission_status.is_done());

        debug!(
            "Sample {}: {} finished, {} pending environment(s)",
            hash,
            done.len(),
            pending.len()
        );

        let mut summaries: Vec<Summary> = pending
            .into_iter()
            .map(|s| Summary::pending(s.env, s.submission_status))
            .collect();

        let bundles = settle_all(
            done,
            |status| {
                let client = Arc::clone(&self.client);
                let hash = hash.to_string();
                async move { fetch_report(client, hash, status).await }
            },
            self.max_concurrent,
        )
        .await;

        let bundles: Vec<ReportBundle> = bundles.into_iter().collect::<Result<_>>()?;

        for bundle in bundles {
            // The result's environment wins over the requested one
            summaries.extend(
                bundle
                    .results
                    .into_iter()
                    .map(|r| Summary::report(r.env, r.result)),
            );
        }

        Ok(summaries)
    }
}

async fn fetch_report<A: AnalysisApi + ?Sized>(
    client: Arc<A>,
    hash: String,
    status: EnvironmentStatus,
) -> Result<ReportBundle> {
    let report_id = status.report_id.ok_or_else(|| {
        ApiError::InvalidResponse(format!(
            "Environment {} is done but has no report id",
            status.env
        ))
    })?;
    client.get_report(&hash, &report_id).await
}
