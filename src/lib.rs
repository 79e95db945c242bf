//! # Roster
//!
//! Student and course records kept in plain CSV files, one file per entity type, with
//! create/read/update/delete, search, sort and compaction.
//!
//! Records are addressed two ways: by `id`, a number assigned once and never reused, and by record
//! number (RRN), the 1-based position of a record in its file as last loaded.

pub mod allocator;
pub mod config;
pub mod display;
pub mod encoding;
pub mod error;
pub mod query;
pub mod schema;
pub mod storage;

pub use error::{Error, Result};
pub use query::SortKey;
pub use schema::{Fields, Record, Schema, COURSE, STUDENT};
pub use storage::store::RecordStore;
