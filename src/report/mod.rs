//! Analysis reports of a sample

mod dynamic;
mod sample;

pub use dynamic::{ReportAggregator, Summary, SummaryState};
pub use sample::{HEX_COLUMNS, SampleReport, Verdict};
