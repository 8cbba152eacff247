//! Generic CRUD grid over any named collection
//!
//! The grid knows nothing about the records it shows. Columns are inferred
//! from the first record of each load, and every mutation is routed back
//! through the bound [`CollectionResource`]. Local rows only change after the
//! remote call has acknowledged.
//!
//! All grid state lives in one [`GridState`] behind a mutex. Each operation
//! takes the lock for its local read or write only; it is never held across a
//! request, so mutations on different rows overlap freely on the wire.

mod item;
mod schema;

use std::sync::Arc;

use log::debug;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{Mutex, watch};

use crate::client::CollectionApi;
use crate::client::CollectionResource;
use crate::client::models::{Record, RecordId};
use crate::error::{GridError, Result};
use crate::output::notify::Notifier;

pub use item::{GridItem, ItemKey};
pub use schema::Schema;

/// Grid configuration
#[derive(Debug, Clone)]
pub struct GridOptions {
    /// Field holding the record identifier
    pub id_field: String,

    /// Fields never shown as columns
    pub exclude_keys: Vec<String>,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            id_field: "id".to_string(),
            exclude_keys: vec!["id".to_string()],
        }
    }
}

/// What the presentation layer renders
#[derive(Debug, Clone, Default, Serialize)]
pub struct GridView {
    pub items: Vec<GridItem>,
    pub schema: Schema,
}

#[derive(Debug, Default)]
struct GridState {
    view: GridView,
    next_key: u64,
    /// Number of the most recently started load
    generation: u64,
}

impl GridState {
    fn alloc_key(&mut self) -> ItemKey {
        self.next_key += 1;
        ItemKey(self.next_key)
    }

    fn position(&self, key: ItemKey) -> Result<usize> {
        self.view
            .items
            .iter()
            .position(|item| item.key == key)
            .ok_or_else(|| GridError::UnknownItem(key.to_string()).into())
    }

    fn item_mut(&mut self, key: ItemKey) -> Result<&mut GridItem> {
        let idx = self.position(key)?;
        Ok(&mut self.view.items[idx])
    }
}

/// Editable table engine for one collection
pub struct CrudGridEngine<C: CollectionApi + ?Sized> {
    resource: CollectionResource<C>,
    options: GridOptions,
    notifier: Arc<dyn Notifier>,
    state: Mutex<GridState>,
    publisher: watch::Sender<GridView>,
}

impl<C: CollectionApi + ?Sized> CrudGridEngine<C> {
    pub fn new(
        resource: CollectionResource<C>,
        options: GridOptions,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let (publisher, _) = watch::channel(GridView::default());
        Self {
            resource,
            options,
            notifier,
            state: Mutex::new(GridState::default()),
            publisher,
        }
    }

    pub fn endpoint(&self) -> &str {
        self.resource.endpoint()
    }

    pub fn options(&self) -> &GridOptions {
        &self.options
    }

    /// Receive a fresh [`GridView`] after every change.
    pub fn subscribe(&self) -> watch::Receiver<GridView> {
        self.publisher.subscribe()
    }

    /// Snapshot of the current rows and columns.
    pub async fn view(&self) -> GridView {
        self.state.lock().await.view.clone()
    }

    pub async fn item(&self, key: ItemKey) -> Option<GridItem> {
        let state = self.state.lock().await;
        state.view.items.iter().find(|i| i.key == key).cloned()
    }

    /// Locate a row by record identifier.
    pub async fn find_by_id(&self, id: &RecordId) -> Option<ItemKey> {
        let state = self.state.lock().await;
        state
            .view
            .items
            .iter()
            .find(|i| i.id(&self.options.id_field).as_ref() == Some(id))
            .map(|i| i.key)
    }

    fn publish(&self, state: &GridState) {
        self.publisher.send_replace(state.view.clone());
    }

    /// Fetch the collection and rebuild rows and columns.
    ///
    /// The result of a load that was overtaken by a newer one is dropped.
    pub async fn load(&self) -> Result<()> {
        let generation = self.begin_load().await;

        match self.resource.list().await {
            Ok(records) => {
                self.apply_load(generation, records).await;
                Ok(())
            }
            Err(err) => {
                self.notifier.error(&err);
                Err(err)
            }
        }
    }

    async fn begin_load(&self) -> u64 {
        let mut state = self.state.lock().await;
        state.generation += 1;
        state.generation
    }

    /// Returns false when the load was stale and nothing changed.
    async fn apply_load(&self, generation: u64, records: Vec<Record>) -> bool {
        let mut state = self.state.lock().await;
        if state.generation != generation {
            debug!(
                "Discarding stale load {} of {} (latest is {})",
                generation,
                self.endpoint(),
                state.generation
            );
            return false;
        }

        let options = &self.options;
        let schema = records
            .first()
            .map(|first| Schema::infer(first, &options.id_field, &options.exclude_keys))
            .unwrap_or_default();

        // Rows added locally but not saved yet survive a reload
        let mut items: Vec<GridItem> = state
            .view
            .items
            .iter()
            .filter(|item| item.is_new())
            .cloned()
            .collect();
        for record in records {
            let key = state.alloc_key();
            items.push(GridItem::from_record(key, record));
        }

        debug!(
            "Loaded {} {} with columns {:?}",
            items.len(),
            self.endpoint(),
            schema.fields()
        );

        let mut schema = schema;
        if !items.is_empty() && items.iter().all(GridItem::is_new) {
            schema.ensure_default();
        }

        state.view = GridView { items, schema };
        self.publish(&state);
        true
    }

    /// Flip a row between view and edit mode. No request is made.
    pub async fn toggle_edit_mode(&self, key: ItemKey) -> Result<bool> {
        let mut state = self.state.lock().await;
        let item = state.item_mut(key)?;

        item.active = !item.active;
        item.snapshot = if item.active {
            Some(item.record.clone())
        } else {
            None
        };
        let active = item.active;

        self.publish(&state);
        Ok(active)
    }

    /// Start a new, empty row in edit mode at the top of the grid.
    pub async fn toggle_add(&self) -> ItemKey {
        let mut state = self.state.lock().await;
        state.view.schema.ensure_default();

        let key = state.alloc_key();
        state.view.items.insert(0, GridItem::new_blank(key));

        self.publish(&state);
        key
    }

    /// Change one field of a row that is in edit mode.
    pub async fn set_field(&self, key: ItemKey, field: &str, value: Value) -> Result<()> {
        if field == self.options.id_field {
            return Err(GridError::IdentifierField(field.to_string()).into());
        }

        let mut state = self.state.lock().await;
        let item = state.item_mut(key)?;
        if !item.active {
            return Err(GridError::NotEditing.into());
        }
        item.record.insert(field.to_string(), value);

        self.publish(&state);
        Ok(())
    }

    /// Leave edit mode without saving.
    ///
    /// An unsaved new row is dropped; an existing row gets its record back
    /// as it was when editing started.
    pub async fn cancel(&self, key: ItemKey) -> Result<()> {
        let mut state = self.state.lock().await;
        let idx = state.position(key)?;

        if state.view.items[idx].is_new() {
            state.view.items.remove(idx);
        } else {
            let item = &mut state.view.items[idx];
            if !item.active {
                return Err(GridError::NotEditing.into());
            }
            if let Some(snapshot) = item.snapshot.take() {
                item.record = snapshot;
            }
            item.active = false;
        }

        self.publish(&state);
        Ok(())
    }

    /// Save a row. Existing rows are updated, new rows are created.
    ///
    /// On success the row returns to view mode. On failure it stays in edit
    /// mode and the error goes to the notifier. A created row whose ack
    /// carried no id counts as saved but cannot be saved again until a
    /// reload brings in its server-side version.
    pub async fn update_item(&self, key: ItemKey) -> Result<()> {
        let id_field = self.options.id_field.as_str();
        let (id, record) = {
            let mut state = self.state.lock().await;
            let item = state.item_mut(key)?;
            if !item.active {
                return Err(GridError::NotEditing.into());
            }
            let id = item.id(id_field);
            if !item.is_new() && id.is_none() {
                return Err(GridError::MissingIdentifier.into());
            }
            (id, item.record.clone())
        };

        let outcome = match id {
            Some(ref id) => self.resource.update(id, &record).await,
            None => self.resource.create(&record).await,
        };

        match outcome {
            Ok(ack) => {
                let mut state = self.state.lock().await;
                // The row may have been deleted while the save was in flight
                if let Ok(item) = state.item_mut(key) {
                    item.active = false;
                    item.snapshot = None;
                    item.saved = true;
                    if id.is_none() {
                        if let Some(new_id) = ack.id.filter(|v| RecordId::from_value(v).is_some())
                        {
                            item.record.insert(id_field.to_string(), new_id);
                        }
                    }
                }
                self.publish(&state);
                drop(state);

                self.notifier.success(&ack.message);
                Ok(())
            }
            Err(err) => {
                self.notifier.error(&err);
                Err(err)
            }
        }
    }

    /// Delete a row server-side, then drop every local row carrying its id.
    ///
    /// Unsaved rows are only dropped locally.
    pub async fn delete_item(&self, key: ItemKey) -> Result<()> {
        let id_field = self.options.id_field.as_str();
        let id = {
            let mut state = self.state.lock().await;
            let idx = state.position(key)?;
            let is_new = state.view.items[idx].is_new();
            match state.view.items[idx].id(id_field) {
                Some(id) => id,
                None if is_new => {
                    state.view.items.remove(idx);
                    self.publish(&state);
                    return Ok(());
                }
                None => return Err(GridError::MissingIdentifier.into()),
            }
        };

        match self.resource.delete(&id).await {
            Ok(ack) => {
                let mut state = self.state.lock().await;
                let before = state.view.items.len();
                state
                    .view
                    .items
                    .retain(|item| item.id(id_field).as_ref() != Some(&id));
                debug!(
                    "Removed {} row(s) with id {} from {}",
                    before - state.view.items.len(),
                    id,
                    self.endpoint()
                );
                self.publish(&state);
                drop(state);

                self.notifier.success(&ack.message);
                Ok(())
            }
            Err(err) => {
                self.notifier.error(&err);
                Err(err)
            }
        }
    }
}
