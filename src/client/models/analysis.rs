//! Dynamic analysis models

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Status manifest of a sample's dynamic analysis, one entry per environment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Submission {
    #[serde(default)]
    pub statuses: Vec<EnvironmentStatus>,
}

/// Submission state in one sandbox environment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentStatus {
    /// Environment name or profile id
    #[serde(deserialize_with = "deserialize_string_or_number")]
    pub env: String,

    /// Report to fetch once the submission is done
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_optional_string_or_number"
    )]
    pub report_id: Option<String>,

    pub submission_status: SubmissionStatus,
}

/// Sandbox submission state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SubmissionStatus {
    Pending,
    Running,
    InProgress,
    Done,
    Error,
    Other(String),
}

impl SubmissionStatus {
    pub fn is_done(&self) -> bool {
        matches!(self, SubmissionStatus::Done)
    }
}

impl From<String> for SubmissionStatus {
    fn from(s: String) -> Self {
        match s.trim().to_ascii_uppercase().replace('_', " ").as_str() {
            "PENDING" => SubmissionStatus::Pending,
            "RUNNING" => SubmissionStatus::Running,
            "IN PROGRESS" => SubmissionStatus::InProgress,
            "DONE" => SubmissionStatus::Done,
            "ERROR" => SubmissionStatus::Error,
            _ => SubmissionStatus::Other(s),
        }
    }
}

impl From<SubmissionStatus> for String {
    fn from(status: SubmissionStatus) -> Self {
        status.to_string()
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmissionStatus::Pending => f.write_str("PENDING"),
            SubmissionStatus::Running => f.write_str("RUNNING"),
            SubmissionStatus::InProgress => f.write_str("IN PROGRESS"),
            SubmissionStatus::Done => f.write_str("DONE"),
            SubmissionStatus::Error => f.write_str("ERROR"),
            SubmissionStatus::Other(s) => f.write_str(s),
        }
    }
}

/// Detailed report payload; may bundle results for several environments
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportBundle {
    #[serde(default)]
    pub results: Vec<EnvironmentResult>,
}

/// Report of one environment inside a bundle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentResult {
    #[serde(deserialize_with = "deserialize_string_or_number")]
    pub env: String,

    #[serde(default)]
    pub result: Value,
}

/// Sandbox environment available for submissions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Environment {
    pub id: Value,
    pub name: String,
}

/// Accept `"5"` and `5` alike
fn deserialize_string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::de::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Int(i64),
        String(String),
    }

    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Int(i) => Ok(i.to_string()),
        NumberOrString::String(s) => Ok(s),
    }
}

fn deserialize_optional_string_or_number<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error>
where
    D: serde::de::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Int(i64),
        String(String),
    }

    match Option::<NumberOrString>::deserialize(deserializer)? {
        Some(NumberOrString::Int(i)) => Ok(Some(i.to_string())),
        Some(NumberOrString::String(s)) => Ok(Some(s)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submission_status_parsing() {
        assert_eq!(
            SubmissionStatus::from("DONE".to_string()),
            SubmissionStatus::Done
        );
        assert_eq!(
            SubmissionStatus::from("done".to_string()),
            SubmissionStatus::Done
        );
        assert_eq!(
            SubmissionStatus::from("IN PROGRESS".to_string()),
            SubmissionStatus::InProgress
        );
        assert_eq!(
            SubmissionStatus::from("in_progress".to_string()),
            SubmissionStatus::InProgress
        );
        assert_eq!(
            SubmissionStatus::from("QUEUED".to_string()),
            SubmissionStatus::Other("QUEUED".to_string())
        );
    }

    #[test]
    fn test_submission_status_display_keeps_unknown_text() {
        assert_eq!(SubmissionStatus::InProgress.to_string(), "IN PROGRESS");
        assert_eq!(
            SubmissionStatus::Other("Queued".to_string()).to_string(),
            "Queued"
        );
    }

    #[test]
    fn test_submission_deserializes_numeric_report_id() {
        let json = r#"{
            "statuses": [
                {"env": "win7", "report_id": 12, "submission_status": "DONE"},
                {"env": "win10", "submission_status": "RUNNING"}
            ]
        }"#;
        let submission: Submission = serde_json::from_str(json).unwrap();

        assert_eq!(submission.statuses.len(), 2);
        assert_eq!(submission.statuses[0].report_id.as_deref(), Some("12"));
        assert!(submission.statuses[0].submission_status.is_done());
        assert!(submission.statuses[1].report_id.is_none());
        assert_eq!(
            submission.statuses[1].submission_status,
            SubmissionStatus::Running
        );
    }

    #[test]
    fn test_numeric_env_is_stringified() {
        let json = r#"{"results": [{"env": 6, "result": {"verdict": "clean"}}]}"#;
        let bundle: ReportBundle = serde_json::from_str(json).unwrap();

        assert_eq!(bundle.results[0].env, "6");
        assert_eq!(bundle.results[0].result["verdict"], "clean");
    }
}
