//! # Search and sort
//!
//! Both work on a loaded sequence and leave persistence to the store.

use crate::allocator;
use crate::error::{Error, Result};
use crate::schema::Record;
use std::fmt;
use std::str;

/// Key for [`sort`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
  /// Case-insensitive lexicographic order of `name`.
  Name,
  /// Numeric order of `id`.
  Id,
}

impl str::FromStr for SortKey {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s.to_ascii_lowercase().as_str() {
      "name" => Ok(SortKey::Name),
      "id" => Ok(SortKey::Id),
      _ => Err(Error::Validation(format!("unknown sort key {:?}, expected name or id", s))),
    }
  }
}

impl fmt::Display for SortKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      SortKey::Name => write!(f, "name"),
      SortKey::Id => write!(f, "id"),
    }
  }
}

/// Returns the records whose name contains `query`, ignoring case, each with its record number.
/// An empty query matches everything.
pub fn search<'a>(records: &'a [Record], query: &str) -> Vec<(usize, &'a Record)> {
  let query = query.to_lowercase();
  records
    .iter()
    .enumerate()
    .filter(|(_, record)| record.name().to_lowercase().contains(&query))
    .map(|(i, record)| (i + 1, record))
    .collect()
}

/// Sorts `records` in place by `key`. Records with equal keys keep their relative order.
///
/// Sorting by id fails without reordering anything if an id does not parse.
pub fn sort(records: &mut Vec<Record>, key: SortKey) -> Result<()> {
  match key {
    SortKey::Name => records.sort_by_cached_key(|record| record.name().to_lowercase()),
    SortKey::Id => {
      let ids = records.iter().map(|record| allocator::parse_id(record.id())).collect::<Result<Vec<_>>>()?;
      let mut keyed: Vec<_> = ids.into_iter().zip(records.drain(..)).collect();
      keyed.sort_by_key(|(id, _)| *id);
      records.extend(keyed.into_iter().map(|(_, record)| record));
    }
  }
  Ok(())
}
