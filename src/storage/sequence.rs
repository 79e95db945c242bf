//! # Id sequence file
//!
//! Each store keeps a sidecar file next to its CSV file holding the largest id it has ever
//! assigned, as decimal text. Without it, deleting the newest record would let the next append
//! hand out the same id again.
//!
//! The sidecar is also the store's mutation lock: a [`SequenceGuard`] holds an exclusive lock on
//! it from [`SequenceGuard::acquire`] until it is dropped, so two processes never interleave a
//! load/modify/rewrite cycle.

use super::vfs;
use crate::allocator;
use crate::error::{Error, Result};
use std::str;

/// Exclusive hold on a store's sequence file. Unlocks on drop.
#[derive(Debug)]
pub struct SequenceGuard<F: vfs::File> {
  file: F,
}

impl<F: vfs::File> SequenceGuard<F> {
  /// Opens the sequence file at `path`, creating it if needed, and blocks until it is locked.
  pub fn acquire<S: vfs::FileSystem<File = F>>(fs: &mut S, path: &S::Path) -> Result<Self> {
    let mut file = fs.open(path).map_err(|err| Error::StorageWrite(format!("cannot open {:?}: {}", path, err)))?;
    file.lock().map_err(|err| Error::StorageWrite(format!("cannot lock {:?}: {}", path, err)))?;
    Ok(SequenceGuard { file })
  }

  /// Returns the largest id ever assigned, or 0 if none has been.
  pub fn last(&mut self) -> Result<u64> {
    let data = self.file.read_all().map_err(|err| Error::StorageRead(format!("cannot read id sequence: {}", err)))?;
    let text = str::from_utf8(&data).map_err(|_| Error::CorruptId(String::from_utf8_lossy(&data).into_owned()))?;
    if text.trim().is_empty() {
      return Ok(0);
    }
    allocator::parse_id(text)
  }

  /// Records `id` as the largest id assigned.
  pub fn store(&mut self, id: u64) -> Result<()> {
    let text = id.to_string();
    let write = |file: &mut F| -> Result<(), F::Error> {
      file.truncate(0)?;
      file.write(0, text.as_bytes())?;
      file.sync()
    };
    write(&mut self.file).map_err(|err| Error::StorageWrite(format!("cannot update id sequence: {}", err)))
  }
}

impl<F: vfs::File> Drop for SequenceGuard<F> {
  fn drop(&mut self) {
    if let Err(err) = self.file.unlock() {
      tracing::warn!("failed to unlock id sequence: {}", err);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::storage::vfs::{FileSystem, MemoryFileSystem, StandardFileSystem};

  #[test]
  fn test_memory_sequence_starts_at_zero() {
    let mut fs = MemoryFileSystem::default();
    let mut guard = SequenceGuard::acquire(&mut fs, "students.csv.seq").unwrap();
    assert_eq!(guard.last().unwrap(), 0);
  }

  #[test]
  fn test_memory_sequence_store_and_reload() {
    let mut fs = MemoryFileSystem::default();
    {
      let mut guard = SequenceGuard::acquire(&mut fs, "students.csv.seq").unwrap();
      guard.store(120).unwrap();
      guard.store(7).unwrap();
    }
    assert_eq!(fs.contents("students.csv.seq").unwrap(), b"7");
    let mut guard = SequenceGuard::acquire(&mut fs, "students.csv.seq").unwrap();
    assert_eq!(guard.last().unwrap(), 7);
  }

  #[test]
  fn test_memory_sequence_is_exclusive_until_dropped() {
    let mut fs = MemoryFileSystem::default();
    let guard = SequenceGuard::acquire(&mut fs, "courses.csv.seq").unwrap();
    assert!(matches!(SequenceGuard::acquire(&mut fs, "courses.csv.seq"), Err(Error::StorageWrite(_))));
    drop(guard);
    SequenceGuard::acquire(&mut fs, "courses.csv.seq").unwrap();
  }

  #[test]
  fn test_memory_sequence_corrupt() {
    let mut fs = MemoryFileSystem::default();
    fs.replace("courses.csv.seq", b"twelve").unwrap();
    let mut guard = SequenceGuard::acquire(&mut fs, "courses.csv.seq").unwrap();
    assert!(matches!(guard.last(), Err(Error::CorruptId(_))));
  }

  #[test]
  fn test_standard_sequence_store_and_reload() {
    let mut fs = StandardFileSystem;
    let tempdir = tempfile::tempdir().unwrap();
    let path = tempdir.path().join("students.csv.seq");
    {
      let mut guard = SequenceGuard::acquire(&mut fs, &path).unwrap();
      assert_eq!(guard.last().unwrap(), 0);
      guard.store(42).unwrap();
    }
    let mut guard = SequenceGuard::acquire(&mut fs, &path).unwrap();
    assert_eq!(guard.last().unwrap(), 42);
  }
}
