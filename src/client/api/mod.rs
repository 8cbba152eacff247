//! API trait definitions split by responsibility
//!
//! - [`CollectionApi`] - CRUD over any named collection
//! - [`AnalysisApi`] - Dynamic analysis submissions and reports

mod analysis;
mod collection;

pub use analysis::AnalysisApi;
pub use collection::CollectionApi;
