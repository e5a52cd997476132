//! Record store: flat-file JSON collections.
//!
//! # Modules
//!
//! - `collection` - generic load/mutate/persist collection with a per-collection lock
//! - `record` - the `Record` trait and result paging
//! - `ids` - time-derived, sortable ids and timestamps
//! - `error` - error taxonomy for store operations

pub mod collection;
pub mod error;
pub mod ids;
pub mod record;

pub use collection::{field_matches, CollectionGuard, JsonCollection};
pub use error::{StoreError, StoreResult};
pub use ids::{format_timestamp, now_timestamp, IdGenerator, Identity};
pub use record::{Page, Record};
