//! # CSV record store
//!
//! A [`RecordStore`] owns one CSV file holding the records of one entity type. Every operation
//! loads the whole file, and every mutation rewrites the whole file through
//! [`vfs::FileSystem::replace`]. There is no index and no cache: record numbers are recomputed
//! from file order on every load, so callers must re-list after any mutation.
//!
//! Mutations hold the store's [`SequenceGuard`] from load to rewrite.

use super::sequence::SequenceGuard;
use super::vfs::{self, File as _};
use crate::allocator;
use crate::encoding::csv;
use crate::error::{Error, Result};
use crate::query::{self, SortKey};
use crate::schema::{Fields, Record, Schema};
use std::borrow::Borrow;
use std::path;
use tracing::{debug, info, warn};

/// # Record store for one entity type
pub struct RecordStore<S: vfs::FileSystem> {
  fs: S,
  schema: &'static Schema,
  path: <S::Path as ToOwned>::Owned,
  sequence_path: <S::Path as ToOwned>::Owned,
}

impl RecordStore<vfs::StandardFileSystem> {
  /// Returns a store for `schema` backed by `dir/file_name`, with its id sequence in
  /// `dir/file_name.seq`.
  pub fn in_dir(dir: &path::Path, schema: &'static Schema, file_name: &str) -> Self {
    let path = dir.join(file_name);
    let sequence_path = dir.join(format!("{}.seq", file_name));
    RecordStore::new(vfs::StandardFileSystem, schema, path, sequence_path)
  }
}

impl<S: vfs::FileSystem> RecordStore<S> {
  pub fn new(
    fs: S,
    schema: &'static Schema,
    path: <S::Path as ToOwned>::Owned,
    sequence_path: <S::Path as ToOwned>::Owned,
  ) -> Self {
    RecordStore { fs, schema, path, sequence_path }
  }

  pub fn schema(&self) -> &'static Schema {
    self.schema
  }

  /// Returns the path of the CSV file.
  pub fn path(&self) -> &S::Path {
    self.path.borrow()
  }

  /// Creates the file with only the header row if it is missing or empty. A file with content is
  /// left untouched.
  pub fn initialize(&mut self) -> Result<()> {
    let _sequence = self.lock()?;
    let path: &S::Path = self.path.borrow();
    let exists = self.fs.exists(path).map_err(|err| read_error(path, err))?;
    if exists {
      let size = self.fs.open(path).and_then(|mut file| file.size()).map_err(|err| read_error(path, err))?;
      if size > 0 {
        debug!(entity = self.schema.entity, "store already initialized at {:?}", path);
        return Ok(());
      }
    }
    self.rewrite(&[])?;
    info!(entity = self.schema.entity, "created store file {:?}", self.path());
    Ok(())
  }

  /// Loads every record in file order. The record number of `records[i]` is `i + 1`.
  pub fn load_all(&mut self) -> Result<Vec<Record>> {
    let path: &S::Path = self.path.borrow();
    if !self.fs.exists(path).map_err(|err| read_error(path, err))? {
      return Err(Error::StorageRead(format!("{:?} does not exist", path)));
    }
    let data = self.fs.open(path).and_then(|mut file| file.read_all()).map_err(|err| read_error(path, err))?;
    let text = String::from_utf8(data).map_err(|_| Error::StorageRead(format!("{:?} is not valid UTF-8", path)))?;
    let mut rows = csv::decode(&text).map_err(|err| read_error(path, err))?.into_iter();

    let header = rows.next().ok_or_else(|| Error::StorageRead(format!("{:?} has no header row", path)))?;
    if header.iter().map(String::as_str).ne(self.schema.fields.iter().copied()) {
      return Err(Error::StorageRead(format!(
        "{:?} has header {:?}, expected {:?}",
        path,
        header.join(","),
        self.schema.fields.join(",")
      )));
    }

    let mut records = Vec::new();
    for (i, row) in rows.enumerate() {
      if row.len() != header.len() {
        return Err(Error::StorageRead(format!(
          "{:?}: record {} has {} field(s), header has {}",
          path,
          i + 1,
          row.len(),
          header.len()
        )));
      }
      records.push(Record::from_row(self.schema, row)?);
    }
    debug!(entity = self.schema.entity, records = records.len(), "loaded store");
    Ok(records)
  }

  /// Returns the record at record number `rrn`.
  pub fn get(&mut self, rrn: usize) -> Result<Record> {
    let records = self.load_all()?;
    allocator::resolve_rrn(&records, rrn).cloned()
  }

  /// Creates a record from `fields` (every field but `id`) and places it at the end of the file.
  pub fn append(&mut self, fields: &Fields) -> Result<Record> {
    self.schema.validate(fields)?;
    let mut sequence = self.lock()?;
    let mut records = self.load_all()?;
    let id = allocator::next_id(&records)?.max(allocator::successor(sequence.last()?)?);
    let record = self.schema.record(id, fields)?;
    // The sequence moves first: if the rewrite then fails, an id is skipped rather than reused.
    sequence.store(id)?;
    records.push(record.clone());
    self.rewrite(&records)?;
    debug!(entity = self.schema.entity, id, rrn = records.len(), "appended record");
    Ok(record)
  }

  /// Merges the non-empty values of `fields` into the record at `rrn` and returns the result.
  /// The id never changes.
  pub fn update_at(&mut self, rrn: usize, fields: &Fields) -> Result<Record> {
    self.schema.check_known(fields)?;
    let _sequence = self.lock()?;
    let mut records = self.load_all()?;
    let index = allocator::index_of(rrn, records.len())?;
    let ignored = records[index].merge(fields)?;
    if !ignored.is_empty() {
      warn!(entity = self.schema.entity, rrn, "ignoring update of immutable field(s) {}", ignored.join(", "));
    }
    self.rewrite(&records)?;
    debug!(entity = self.schema.entity, rrn, id = records[index].id(), "updated record");
    Ok(records.swap_remove(index))
  }

  /// Removes the record at `rrn` and returns it. Later records move up by one position.
  pub fn delete_at(&mut self, rrn: usize) -> Result<Record> {
    let _sequence = self.lock()?;
    let mut records = self.load_all()?;
    let index = allocator::index_of(rrn, records.len())?;
    let removed = records.remove(index);
    self.rewrite(&records)?;
    debug!(entity = self.schema.entity, rrn, id = removed.id(), "deleted record");
    Ok(removed)
  }

  /// Rewrites the file without blank rows or empty lines. Returns the number of rows removed.
  pub fn compact(&mut self) -> Result<usize> {
    let _sequence = self.lock()?;
    let mut records = self.load_all()?;
    let before = records.len();
    records.retain(|record| !record.is_blank());
    self.rewrite(&records)?;
    let removed = before - records.len();
    info!(entity = self.schema.entity, removed, remaining = records.len(), "compacted store");
    Ok(removed)
  }

  /// Returns the records whose name contains `query`, ignoring case, with their record numbers.
  pub fn search_by_name(&mut self, query: &str) -> Result<Vec<(usize, Record)>> {
    let records = self.load_all()?;
    Ok(query::search(&records, query).into_iter().map(|(rrn, record)| (rrn, record.clone())).collect())
  }

  /// Reorders the file by `key` and returns the records in their new order.
  pub fn sort_by(&mut self, key: SortKey) -> Result<Vec<Record>> {
    let _sequence = self.lock()?;
    let mut records = self.load_all()?;
    query::sort(&mut records, key)?;
    self.rewrite(&records)?;
    debug!(entity = self.schema.entity, %key, records = records.len(), "sorted store");
    Ok(records)
  }

  fn lock(&mut self) -> Result<SequenceGuard<S::File>> {
    SequenceGuard::acquire(&mut self.fs, self.sequence_path.borrow())
  }

  fn rewrite(&mut self, records: &[Record]) -> Result<()> {
    let mut text = String::new();
    csv::encode_row(self.schema.fields, &mut text);
    for record in records {
      csv::encode_row(record.values(), &mut text);
    }
    let path: &S::Path = self.path.borrow();
    self.fs.replace(path, text.as_bytes()).map_err(|err| Error::StorageWrite(format!("{:?}: {}", path, err)))
  }
}

fn read_error<P: std::fmt::Debug + ?Sized, E: std::fmt::Display>(path: &P, err: E) -> Error {
  Error::StorageRead(format!("{:?}: {}", path, err))
}
