//! Typed access to one named remote collection

use std::sync::Arc;

use super::api::CollectionApi;
use super::models::{Ack, Record, RecordId};
use crate::error::Result;

/// A remote collection bound to its endpoint name.
///
/// Every call goes straight to the API; nothing is cached, so a `list()` or
/// `get()` reflects the remote state at the moment of the call.
pub struct CollectionResource<C: CollectionApi + ?Sized> {
    client: Arc<C>,
    endpoint: String,
}

impl<C: CollectionApi + ?Sized> Clone for CollectionResource<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            endpoint: self.endpoint.clone(),
        }
    }
}

impl<C: CollectionApi + ?Sized> CollectionResource<C> {
    pub fn new(client: Arc<C>, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn list(&self) -> Result<Vec<Record>> {
        self.client.list_records(&self.endpoint).await
    }

    pub async fn get(&self, id: &RecordId) -> Result<Record> {
        self.client.get_record(&self.endpoint, id).await
    }

    pub async fn create(&self, record: &Record) -> Result<Ack> {
        self.client.create_record(&self.endpoint, record).await
    }

    pub async fn update(&self, id: &RecordId, patch: &Record) -> Result<Ack> {
        self.client.update_record(&self.endpoint, id, patch).await
    }

    pub async fn delete(&self, id: &RecordId) -> Result<Ack> {
        self.client.delete_record(&self.endpoint, id).await
    }
}
