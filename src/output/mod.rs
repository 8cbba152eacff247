//! Output formatting for CLI results
//!
//! Results go to stdout as a table, pretty text or JSON. Notifications and
//! progress go to stderr.

pub mod json;
pub mod notify;
pub mod pretty;
pub mod progress;
pub mod table;
