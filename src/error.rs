//! # Errors
//!
//! Every store operation either completes or returns one of these. The store never repairs
//! malformed data on its own; it reports it.

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
  /// The store file could not be opened or read, or its content does not match the schema.
  #[error("cannot read store: {0}")]
  StorageRead(String),

  /// A rewrite or the mutation lock failed. No change was committed.
  #[error("cannot write store: {0}")]
  StorageWrite(String),

  /// A record number outside `1..=len`.
  #[error("invalid record number {rrn}: the store holds {len} record(s)")]
  InvalidPosition { rrn: usize, len: usize },

  /// An id that does not parse as an integer.
  #[error("corrupt record id {0:?}")]
  CorruptId(String),

  /// Field values missing, empty or unknown.
  #[error("{0}")]
  Validation(String),
}
