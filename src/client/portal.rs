//! Portal API client implementation

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use log::debug;
use reqwest::{Client as HttpClient, Method, StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::api::{AnalysisApi, CollectionApi};
use super::models::{Ack, Environment, Record, RecordId, ReportBundle, Submission};
use crate::error::{ApiError, ConfigError, Result};

/// API prefix appended to the configured host
const API_PREFIX: &str = "/api/1.0";

/// Header carrying the API key
const API_KEY_HEADER: &str = "X-Api-Key";

/// Default client-side rate limit
const DEFAULT_REQUESTS_PER_SECOND: u32 = 10;

/// Portal API client
pub struct PortalClient {
    http: HttpClient,
    base_url: Url,
    api_key: Option<String>,
    rate_limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl PortalClient {
    /// Create a new client for `api_host` (e.g. `https://do.cert.europa.eu`)
    pub fn new(api_host: &str, api_key: Option<String>) -> Result<Self> {
        Self::with_rate_limit(api_host, api_key, DEFAULT_REQUESTS_PER_SECOND)
    }

    /// Create a new client with an explicit requests-per-second limit
    pub fn with_rate_limit(
        api_host: &str,
        api_key: Option<String>,
        requests_per_second: u32,
    ) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let per_second = NonZeroU32::new(requests_per_second)
            .or(NonZeroU32::new(DEFAULT_REQUESTS_PER_SECOND))
            .unwrap_or(NonZeroU32::MIN);
        let rate_limiter = Arc::new(RateLimiter::direct(Quota::per_second(per_second)));

        let base = format!("{}{}", api_host.trim_end_matches('/'), API_PREFIX);
        let base_url = Url::parse(&base)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| ConfigError::Invalid(format!("API host '{}' is not a URL", api_host)))?;

        Ok(Self {
            http,
            base_url,
            api_key,
            rate_limiter,
        })
    }

    #[cfg(test)]
    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Append `segments` to the base URL, percent-encoding each one
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::Transport(format!("Cannot build a path on {}", self.base_url)))?
            .extend(segments);
        Ok(url)
    }

    /// Send a request and decode the JSON response body
    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        segments: &[&str],
        query: &[(&str, &str)],
        body: Option<&Record>,
    ) -> Result<T> {
        self.rate_limiter.until_ready().await;

        let url = self.url(segments)?;
        debug!("{} {}", method, url);

        let mut builder = self
            .http
            .request(method, url.clone())
            .header("Accept", "application/json");
        if let Some(ref key) = self.api_key {
            builder = builder.header(API_KEY_HEADER, key);
        }
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(record) = body {
            builder = builder.json(record);
        }

        let response = builder.send().await.map_err(ApiError::from)?;

        let status = response.status();
        match status {
            status if status.is_success() => {
                let data = response.json::<T>().await.map_err(|e| {
                    ApiError::InvalidResponse(format!("Failed to parse response: {}", e))
                })?;
                Ok(data)
            }
            StatusCode::UNAUTHORIZED => Err(ApiError::Unauthorized.into()),
            StatusCode::FORBIDDEN => Err(ApiError::Forbidden.into()),
            StatusCode::NOT_FOUND => {
                let body = response.text().await.unwrap_or_default();
                let msg = server_message(&body).unwrap_or_else(|| url.path().to_string());
                Err(ApiError::NotFound(msg).into())
            }
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(60);
                Err(ApiError::RateLimit(Duration::from_secs(retry_after)).into())
            }
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Bad request".to_string());
                let msg = server_message(&body).unwrap_or(body);
                Err(ApiError::Validation(msg).into())
            }
            status if status.is_server_error() => {
                let body = response.text().await.unwrap_or_default();
                let msg = server_message(&body)
                    .or_else(|| Some(body).filter(|b| !b.trim().is_empty()))
                    .unwrap_or_else(|| status.to_string());
                Err(ApiError::ServerError(msg).into())
            }
            _ => {
                let error_msg = format!("Unexpected status code: {}", status);
                Err(ApiError::Transport(error_msg).into())
            }
        }
    }
}

/// Pull `message` out of a `{ "message": ... }` error body
fn server_message(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: Value,
    }

    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    match parsed.message {
        Value::String(s) => Some(s),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// Path segments of a collection, or of one record in it
fn collection_path<'a>(endpoint: &'a str, id: Option<&'a RecordId>) -> Vec<&'a str> {
    let mut segments: Vec<&str> = endpoint.split('/').filter(|s| !s.is_empty()).collect();
    segments.extend(id.map(RecordId::as_str));
    segments
}

/// Unwrap `{ "<endpoint>": [...] }`; a bare array is accepted as well
fn unwrap_collection(endpoint: &str, body: Value) -> Result<Vec<Record>> {
    let items = match body {
        Value::Array(items) => items,
        Value::Object(mut envelope) => {
            let key = endpoint.rsplit('/').next().unwrap_or(endpoint);
            match envelope
                .remove(endpoint)
                .or_else(|| envelope.remove(key))
            {
                Some(Value::Array(items)) => items,
                _ => {
                    return Err(ApiError::InvalidResponse(format!(
                        "Missing '{}' list in response",
                        endpoint
                    ))
                    .into());
                }
            }
        }
        _ => {
            return Err(ApiError::InvalidResponse(format!(
                "Expected a list of {} records",
                endpoint
            ))
            .into());
        }
    };

    items
        .into_iter()
        .map(|item| match item {
            Value::Object(record) => Ok(record),
            other => Err(ApiError::InvalidResponse(format!(
                "Expected a record in {}, got {}",
                endpoint, other
            ))
            .into()),
        })
        .collect()
}

/// Numeric ids sort numerically, anything else after them by text
fn environment_sort_key(id: &Value) -> (i64, String) {
    match id {
        Value::Number(n) => (n.as_i64().unwrap_or(i64::MAX), String::new()),
        Value::String(s) => match s.parse::<i64>() {
            Ok(n) => (n, String::new()),
            Err(_) => (i64::MAX, s.clone()),
        },
        other => (i64::MAX, other.to_string()),
    }
}

#[async_trait]
impl CollectionApi for PortalClient {
    async fn list_records(&self, endpoint: &str) -> Result<Vec<Record>> {
        let path = collection_path(endpoint, None);
        let body: Value = self.request(Method::GET, &path, &[], None).await?;
        unwrap_collection(endpoint, body)
    }

    async fn get_record(&self, endpoint: &str, id: &RecordId) -> Result<Record> {
        let path = collection_path(endpoint, Some(id));
        self.request(Method::GET, &path, &[], None).await
    }

    async fn create_record(&self, endpoint: &str, record: &Record) -> Result<Ack> {
        let path = collection_path(endpoint, None);
        self.request(Method::POST, &path, &[], Some(record)).await
    }

    async fn update_record(&self, endpoint: &str, id: &RecordId, patch: &Record) -> Result<Ack> {
        let path = collection_path(endpoint, Some(id));
        self.request(Method::PUT, &path, &[], Some(patch)).await
    }

    async fn delete_record(&self, endpoint: &str, id: &RecordId) -> Result<Ack> {
        let path = collection_path(endpoint, Some(id));
        self.request(Method::DELETE, &path, &[], None).await
    }
}

#[async_trait]
impl AnalysisApi for PortalClient {
    async fn get_submission(&self, hash: &str, sid: Option<&str>) -> Result<Submission> {
        let query: Vec<(&str, &str)> = sid.map(|s| vec![("sid", s)]).unwrap_or_default();
        self.request(Method::GET, &["dynamic", hash], &query, None)
            .await
    }

    async fn get_report(&self, hash: &str, report_id: &str) -> Result<ReportBundle> {
        self.request(Method::GET, &["dynamic", hash, "report", report_id], &[], None)
            .await
    }

    async fn list_environments(&self) -> Result<Vec<Environment>> {
        #[derive(Deserialize)]
        struct EnvironmentsResponse {
            environments: Vec<Environment>,
        }

        let response: EnvironmentsResponse = self
            .request(Method::GET, &["dynamic", "environments"], &[], None)
            .await?;
        let mut environments = response.environments;
        environments.sort_by_key(|e| environment_sort_key(&e.id));
        Ok(environments)
    }
}
