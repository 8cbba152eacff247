//! Collection API trait for schema-less CRUD operations

use async_trait::async_trait;

use crate::client::models::{Ack, Record, RecordId};
use crate::error::Result;

/// CRUD operations over a named remote collection
///
/// The endpoint is a collection name such as `organizations` or
/// `vulnerabilities`. Records carry no client-side type.
#[async_trait]
pub trait CollectionApi: Send + Sync {
    /// Fetch every record of the collection.
    async fn list_records(&self, endpoint: &str) -> Result<Vec<Record>>;

    /// Fetch one record by identifier.
    async fn get_record(&self, endpoint: &str, id: &RecordId) -> Result<Record>;

    /// Create a record that has no identifier yet.
    async fn create_record(&self, endpoint: &str, record: &Record) -> Result<Ack>;

    /// Persist a full or partial record.
    async fn update_record(&self, endpoint: &str, id: &RecordId, patch: &Record) -> Result<Ack>;

    /// Remove a record server-side.
    async fn delete_record(&self, endpoint: &str, id: &RecordId) -> Result<Ack>;
}
