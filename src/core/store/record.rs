//! The contract every stored record type fulfils.

use serde::{de::DeserializeOwned, Serialize};

/// A record kept in a [`JsonCollection`](super::JsonCollection).
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Short name used in log lines and error messages.
    const KIND: &'static str;

    /// Serialized names of the schema's top-level fields.
    const FIELDS: &'static [&'static str];

    /// Serialized names of fields that never change after creation.
    const IMMUTABLE_FIELDS: &'static [&'static str];

    fn id(&self) -> &str;

    /// Creation instant, in the store's sortable ISO-8601 format.
    fn timestamp(&self) -> &str;

    /// Username this record belongs to.
    fn owner(&self) -> &str;

    /// Stamp a freshly generated identity onto a new record.
    fn assign_identity(&mut self, id: String, timestamp: String);

    /// Text value of a top-level field, for uniqueness and lookup scans.
    fn field(&self, name: &str) -> Option<&str>;
}

/// Offset/limit window applied after filtering and sorting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Page {
    pub limit: Option<usize>,
    pub offset: usize,
}

impl Page {
    /// Every record, no offset.
    pub fn all() -> Self {
        Self::default()
    }

    /// The most recent `limit` records.
    pub fn recent(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            offset: 0,
        }
    }

    pub fn new(limit: Option<usize>, offset: Option<usize>) -> Self {
        Self {
            limit,
            offset: offset.unwrap_or(0),
        }
    }

    pub fn apply<T>(&self, records: Vec<T>) -> Vec<T> {
        let iter = records.into_iter().skip(self.offset);
        match self.limit {
            Some(limit) => iter.take(limit).collect(),
            None => iter.collect(),
        }
    }
}
