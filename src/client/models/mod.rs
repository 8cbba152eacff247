//! Portal API data models
//!
//! Collection records are schema-less maps; only the dynamic analysis
//! endpoints have typed payloads.

mod analysis;
mod record;

pub use analysis::{Environment, EnvironmentStatus, ReportBundle, Submission, SubmissionStatus};

#[cfg(test)]
pub use analysis::EnvironmentResult;
pub use record::{Ack, Record, RecordId, display_value, parse_field_value};
