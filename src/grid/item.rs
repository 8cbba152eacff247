//! Grid rows: a record plus its edit state

use std::fmt;

use serde::Serialize;

use crate::client::models::{Record, RecordId};

/// Local handle of a grid row.
///
/// Unsaved rows have no record identifier, and rows may be reordered by
/// concurrent mutations, so the engine addresses rows by this key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ItemKey(pub(crate) u64);

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One row of the grid
#[derive(Debug, Clone, Serialize)]
pub struct GridItem {
    #[serde(skip)]
    pub key: ItemKey,

    pub record: Record,

    /// Row is in edit mode
    pub active: bool,

    /// Record as it was when edit mode was entered
    #[serde(skip)]
    pub(crate) snapshot: Option<Record>,

    /// Known to the server, whether or not its identifier is known locally
    #[serde(skip)]
    pub(crate) saved: bool,
}

impl GridItem {
    pub(crate) fn from_record(key: ItemKey, record: Record) -> Self {
        Self {
            key,
            record,
            active: false,
            snapshot: None,
            saved: true,
        }
    }

    pub(crate) fn new_blank(key: ItemKey) -> Self {
        Self {
            key,
            record: Record::new(),
            active: true,
            snapshot: None,
            saved: false,
        }
    }

    pub fn id(&self, id_field: &str) -> Option<RecordId> {
        RecordId::of(&self.record, id_field)
    }

    /// Not yet saved server-side
    pub fn is_new(&self) -> bool {
        !self.saved
    }
}
