//! # Id and record number allocation
//!
//! Ids are identities: assigned once and never reused. Record numbers (RRNs) are 1-based positions
//! in the sequence as last loaded, and shift whenever an earlier record is removed or the store
//! is reordered.

use crate::error::{Error, Result};
use crate::schema::Record;

/// Parses a stored id.
pub fn parse_id(id: &str) -> Result<u64> {
  id.trim().parse().map_err(|_| Error::CorruptId(id.to_owned()))
}

/// Returns the id that follows `id`. Fails once ids are exhausted rather than wrapping around to
/// an id already handed out.
pub fn successor(id: u64) -> Result<u64> {
  id.checked_add(1).ok_or_else(|| Error::CorruptId(format!("{} (no ids left after it)", id)))
}

/// Returns one more than the largest id in `existing`, or 1 if it is empty.
pub fn next_id(existing: &[Record]) -> Result<u64> {
  let mut max = 0;
  for record in existing {
    max = max.max(parse_id(record.id())?);
  }
  successor(max)
}

/// Converts a record number into an index into a sequence of `len` records.
pub fn index_of(rrn: usize, len: usize) -> Result<usize> {
  if rrn < 1 || rrn > len {
    return Err(Error::InvalidPosition { rrn, len });
  }
  Ok(rrn - 1)
}

/// Returns the record at record number `rrn`.
pub fn resolve_rrn(existing: &[Record], rrn: usize) -> Result<&Record> {
  Ok(&existing[index_of(rrn, existing.len())?])
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::schema::COURSE;

  fn course(id: &str, name: &str) -> Record {
    let values = vec![id.to_owned(), name.to_owned(), "3".to_owned(), "Optional".to_owned()];
    Record::from_row(&COURSE, values).unwrap()
  }

  #[test]
  fn test_next_id_empty() {
    assert_eq!(next_id(&[]).unwrap(), 1);
  }

  #[test]
  fn test_next_id_uses_maximum_not_count() {
    // Gaps left by deletions do not cause reuse.
    let existing = vec![course("4", "a"), course("9", "b"), course("2", "c")];
    assert_eq!(next_id(&existing).unwrap(), 10);
  }

  #[test]
  fn test_next_id_corrupt() {
    let existing = vec![course("1", "a"), course("x2", "b")];
    match next_id(&existing) {
      Err(Error::CorruptId(id)) => assert_eq!(id, "x2"),
      other => panic!("unexpected result: {:?}", other),
    }
  }

  #[test]
  fn test_next_id_exhausted() {
    let existing = vec![course("3", "a"), course(&u64::MAX.to_string(), "b")];
    assert!(matches!(next_id(&existing), Err(Error::CorruptId(_))));
    assert_eq!(successor(u64::MAX - 1).unwrap(), u64::MAX);
    assert!(matches!(successor(u64::MAX), Err(Error::CorruptId(_))));
  }

  #[test]
  fn test_resolve_rrn() {
    let existing = vec![course("1", "a"), course("2", "b")];
    assert_eq!(resolve_rrn(&existing, 1).unwrap().name(), "a");
    assert_eq!(resolve_rrn(&existing, 2).unwrap().name(), "b");
  }

  #[test]
  fn test_resolve_rrn_out_of_range() {
    let existing = vec![course("1", "a"), course("2", "b")];
    for rrn in [0, 3, usize::MAX] {
      match resolve_rrn(&existing, rrn) {
        Err(Error::InvalidPosition { rrn: got, len }) => assert_eq!((got, len), (rrn, 2)),
        other => panic!("unexpected result for {}: {:?}", rrn, other),
      }
    }
    assert!(matches!(resolve_rrn(&[], 1), Err(Error::InvalidPosition { rrn: 1, len: 0 })));
  }
}
