//! Portal API client

pub mod api;
pub mod collection;
#[cfg(test)]
pub mod mock;
pub mod models;
pub mod parallel;
pub mod portal;

pub use api::{AnalysisApi, CollectionApi};
pub use collection::CollectionResource;
#[cfg(test)]
pub use mock::MockPortalClient;
pub use parallel::settle_all;
pub use portal::PortalClient;
