//! Shared CLI argument types

mod common;
mod global;

pub use common::{OutputFormat, parse_assignment};
pub use global::GlobalOptions;
