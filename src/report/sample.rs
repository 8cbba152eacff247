//! Sample page: details, static analysis and antivirus results
//!
//! The three sources are independent. Each is fetched concurrently and a
//! failure in one only leaves that section empty.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::client::CollectionApi;
use crate::client::CollectionResource;
use crate::client::models::{Record, RecordId};
use crate::error::Result;
use crate::output::notify::Notifier;

pub const SAMPLES_ENDPOINT: &str = "samples";
pub const STATIC_ENDPOINT: &str = "analysis/static";
pub const AV_ENDPOINT: &str = "analysis/av";

/// Column header of the hexdump view
pub const HEX_COLUMNS: [&str; 16] = [
    "00", "01", "02", "03", "04", "05", "06", "07", "08", "09", "0A", "0B", "0C", "0D", "0E",
    "0F",
];

/// Everything known about one sample
#[derive(Debug, Clone, Default, Serialize)]
pub struct SampleReport {
    pub hash: String,
    pub details: Option<Record>,
    pub static_report: Option<StaticReport>,
    pub av_report: Option<AvReport>,
}

impl SampleReport {
    /// Fetch all sources of `hash` concurrently.
    ///
    /// Failures are handed to the notifier and leave the section `None`.
    pub async fn fetch<C>(client: Arc<C>, hash: &str, notifier: &dyn Notifier) -> Self
    where
        C: CollectionApi + ?Sized,
    {
        let id = RecordId::new(hash);
        let samples = CollectionResource::new(Arc::clone(&client), SAMPLES_ENDPOINT);
        let statics = CollectionResource::new(Arc::clone(&client), STATIC_ENDPOINT);
        let avs = CollectionResource::new(client, AV_ENDPOINT);

        let (details, static_report, av_report) =
            tokio::join!(samples.get(&id), statics.get(&id), avs.get(&id));

        Self {
            hash: hash.to_string(),
            details: settle(details, notifier),
            static_report: settle(static_report, notifier).map(StaticReport::from),
            av_report: settle(av_report, notifier).map(AvReport::from),
        }
    }

    /// No source answered
    pub fn is_empty(&self) -> bool {
        self.details.is_none() && self.static_report.is_none() && self.av_report.is_none()
    }
}

fn settle(result: Result<Record>, notifier: &dyn Notifier) -> Option<Record> {
    match result {
        Ok(record) => Some(record),
        Err(err) => {
            notifier.error(&err);
            None
        }
    }
}

fn parsed(record: &Record) -> Option<&serde_json::Map<String, Value>> {
    record.get("report_parsed").and_then(Value::as_object)
}

/// Static analysis result (libmagic, TrID, EXIF, hexdump)
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct StaticReport(Record);

/// One TrID file type guess
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TridEntry {
    pub extension: String,
    pub description: String,
    pub probability: String,
}

impl From<Record> for StaticReport {
    fn from(record: Record) -> Self {
        Self(record)
    }
}

impl StaticReport {
    /// libmagic output, keyed by detector
    pub fn magic(&self) -> Vec<(String, String)> {
        parsed(&self.0)
            .and_then(|p| p.get("magic"))
            .and_then(Value::as_object)
            .map(|m| m.iter().map(|(k, v)| (k.clone(), text(v))).collect())
            .unwrap_or_default()
    }

    pub fn trid(&self) -> Vec<TridEntry> {
        parsed(&self.0)
            .and_then(|p| p.get("trID"))
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(Value::as_object)
                    .map(|e| TridEntry {
                        extension: e.get("extension").map(text).unwrap_or_default(),
                        description: e.get("description").map(text).unwrap_or_default(),
                        probability: e.get("probability").map(text).unwrap_or_default(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// First EXIF metadata block
    pub fn exif(&self) -> Vec<(String, String)> {
        parsed(&self.0)
            .and_then(|p| p.get("exif"))
            .and_then(Value::as_array)
            .and_then(|blocks| blocks.first())
            .and_then(Value::as_object)
            .map(|m| m.iter().map(|(k, v)| (k.clone(), text(v))).collect())
            .unwrap_or_default()
    }

    /// Hexdump text split into lines on `\r\n`, `\n` or `\r`
    pub fn hexdump_lines(&self) -> Vec<String> {
        let hex = match parsed(&self.0).and_then(|p| p.get("hex")).and_then(Value::as_str) {
            Some(hex) => hex,
            None => return Vec::new(),
        };

        let mut lines = Vec::new();
        let mut rest = hex;
        while let Some(pos) = rest.find(['\r', '\n']) {
            lines.push(rest[..pos].to_string());
            let skip = if rest[pos..].starts_with("\r\n") { 2 } else { 1 };
            rest = &rest[pos + skip..];
        }
        if !rest.is_empty() {
            lines.push(rest.to_string());
        }
        lines
    }
}

/// Antivirus scan result
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct AvReport(Record);

/// Outcome of one engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Clean,
    /// Detections as (path, details)
    Detected(Vec<(String, String)>),
}

impl From<Record> for AvReport {
    fn from(record: Record) -> Self {
        Self(record)
    }
}

impl AvReport {
    /// Verdict per engine, in report order
    pub fn verdicts(&self) -> Vec<(String, Verdict)> {
        let engines = match parsed(&self.0) {
            Some(engines) => engines,
            None => return Vec::new(),
        };

        engines
            .iter()
            .map(|(engine, hits)| {
                let hits: Vec<(String, String)> = hits
                    .as_object()
                    .map(|m| m.iter().map(|(path, d)| (path.clone(), text(d))).collect())
                    .unwrap_or_default();
                let verdict = if hits.is_empty() {
                    Verdict::Clean
                } else {
                    Verdict::Detected(hits)
                };
                (engine.clone(), verdict)
            })
            .collect()
    }
}

fn text(value: &Value) -> String {
    crate::client::models::display_value(value)
}
