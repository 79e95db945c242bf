//! # Virtual file system
//!
//! Record stores never touch [`std::fs`] directly. They go through the [`FileSystem`] and [`File`]
//! traits, so the same store logic runs over real files and over the in-memory implementation used
//! in tests.

use std::cell;
use std::collections;
use std::fmt;
use std::fs;
use std::io;
use std::path;
use std::rc;

/// # File system interface
///
/// Handles are opened per operation and dropped at the end of it; nothing holds a file across
/// calls.
pub trait FileSystem {
  /// The type of errors that can occur when interacting with this file system.
  type Error: fmt::Debug + fmt::Display;

  /// The type of paths that this file system uses.
  type Path: ?Sized + ToOwned + fmt::Debug;

  /// The type of files that this file system uses.
  type File: File<Error = Self::Error>;

  /// Opens a file at the given `path`, creating it if it does not exist.
  fn open(&mut self, path: &Self::Path) -> Result<Self::File, Self::Error>;

  /// Returns whether a file exists at the given `path`.
  fn exists(&mut self, path: &Self::Path) -> Result<bool, Self::Error>;

  /// Replaces the whole content of the file at `path` with `contents`, creating it if needed.
  ///
  /// Readers observe either the old content or the new content, never a mix of both.
  fn replace(&mut self, path: &Self::Path, contents: &[u8]) -> Result<(), Self::Error>;
}

/// # File interface
pub trait File {
  /// The type of errors that can occur when interacting with this file.
  type Error: fmt::Debug + fmt::Display;

  /// Returns the size of the file in bytes.
  fn size(&mut self) -> Result<u64, Self::Error>;

  /// Sets the size of the file in bytes.
  fn truncate(&mut self, size: u64) -> Result<(), Self::Error>;

  /// Reads `buf.len()` bytes from the file at the given `offset`.
  fn read(&mut self, offset: u64, buf: &mut [u8]) -> Result<(), Self::Error>;

  /// Writes `buf` to the file at the given `offset`.
  fn write(&mut self, offset: u64, buf: &[u8]) -> Result<(), Self::Error>;

  /// Flushes any buffered data to the file.
  fn sync(&mut self) -> Result<(), Self::Error>;

  /// Locks the file exclusively.
  fn lock(&mut self) -> Result<(), Self::Error>;

  /// Unlocks the file.
  fn unlock(&mut self) -> Result<(), Self::Error>;

  /// Reads the whole file.
  fn read_all(&mut self) -> Result<Vec<u8>, Self::Error> {
    let size = self.size()?;
    let mut buf = vec![0; size as usize];
    self.read(0, &mut buf)?;
    Ok(buf)
  }
}

/// # The primary implementation for [`FileSystem`]
///
/// This is simply a wrapper around [`std::fs`], with [`tempfile`] providing the atomic
/// [`FileSystem::replace`].
#[derive(Debug, Default)]
pub struct StandardFileSystem;

impl FileSystem for StandardFileSystem {
  type Error = io::Error;
  type Path = path::Path;
  type File = StandardFile;

  fn open(&mut self, path: &Self::Path) -> Result<Self::File, Self::Error> {
    let file = fs::OpenOptions::new().read(true).write(true).create(true).truncate(false).open(path)?;
    Ok(Self::File::from(file))
  }

  fn exists(&mut self, path: &Self::Path) -> Result<bool, Self::Error> {
    path.try_exists()
  }

  fn replace(&mut self, path: &Self::Path, contents: &[u8]) -> Result<(), Self::Error> {
    // The temporary file must live on the same file system for the rename to be atomic.
    let dir = match path.parent() {
      Some(parent) if !parent.as_os_str().is_empty() => parent,
      _ => path::Path::new("."),
    };
    let mut temp = tempfile::NamedTempFile::new_in(dir)?;
    // Temporary files are created owner-only; the replacement keeps the mode of the file it replaces.
    match fs::metadata(path) {
      Ok(metadata) => temp.as_file().set_permissions(metadata.permissions())?,
      Err(err) if err.kind() == io::ErrorKind::NotFound => {}
      Err(err) => return Err(err),
    }
    io::Write::write_all(&mut temp, contents)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|err| err.error)?;
    Ok(())
  }
}

/// # The primary implementation for [`File`]
///
/// This is simply a wrapper around [`std::fs::File`]. Locks are advisory, through [`fs2`].
#[derive(Debug)]
pub struct StandardFile(fs::File);

impl From<fs::File> for StandardFile {
  fn from(file: fs::File) -> Self {
    Self(file)
  }
}

impl File for StandardFile {
  type Error = io::Error;

  fn size(&mut self) -> Result<u64, Self::Error> {
    let StandardFile(inner) = self;
    Ok(inner.metadata()?.len())
  }

  fn truncate(&mut self, size: u64) -> Result<(), Self::Error> {
    let StandardFile(inner) = self;
    fs::File::set_len(inner, size)
  }

  fn read(&mut self, offset: u64, buf: &mut [u8]) -> Result<(), Self::Error> {
    let StandardFile(inner) = self;
    io::Seek::seek(inner, io::SeekFrom::Start(offset))?;
    io::Read::read_exact(inner, buf)
  }

  fn write(&mut self, offset: u64, buf: &[u8]) -> Result<(), Self::Error> {
    let StandardFile(inner) = self;
    io::Seek::seek(inner, io::SeekFrom::Start(offset))?;
    io::Write::write_all(inner, buf)
  }

  fn sync(&mut self) -> Result<(), Self::Error> {
    let StandardFile(inner) = self;
    fs::File::sync_all(inner)
  }

  fn lock(&mut self) -> Result<(), Self::Error> {
    let StandardFile(inner) = self;
    fs2::FileExt::lock_exclusive(inner)
  }

  fn unlock(&mut self) -> Result<(), Self::Error> {
    let StandardFile(inner) = self;
    fs2::FileExt::unlock(inner)
  }
}

#[derive(Debug, Default)]
struct MemoryFileData {
  data: Vec<u8>,
  locked: bool,
}

/// In-memory implementation for [`FileSystem`]
///
/// Files are shared byte vectors keyed by name. Cloning the file system shares the same files, so a
/// test can keep a handle to inspect what a store wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryFileSystem {
  files: rc::Rc<cell::RefCell<collections::HashMap<String, rc::Rc<cell::RefCell<MemoryFileData>>>>>,
}

impl MemoryFileSystem {
  /// Returns a copy of the content of the file at `path`, if it exists.
  pub fn contents(&self, path: &str) -> Option<Vec<u8>> {
    self.files.borrow().get(path).map(|file| file.borrow().data.clone())
  }
}

impl FileSystem for MemoryFileSystem {
  type Error = String;
  type Path = str;
  type File = MemoryFile;

  fn open(&mut self, path: &Self::Path) -> Result<Self::File, Self::Error> {
    let file = self.files.borrow_mut().entry(path.to_string()).or_default().clone();
    Ok(file.into())
  }

  fn exists(&mut self, path: &Self::Path) -> Result<bool, Self::Error> {
    Ok(self.files.borrow().contains_key(path))
  }

  fn replace(&mut self, path: &Self::Path, contents: &[u8]) -> Result<(), Self::Error> {
    let file = self.files.borrow_mut().entry(path.to_string()).or_default().clone();
    file.borrow_mut().data = contents.to_vec();
    Ok(())
  }
}

/// In-memory implementation for [`File`]
#[derive(Debug)]
pub struct MemoryFile {
  file: rc::Rc<cell::RefCell<MemoryFileData>>,
}

impl From<rc::Rc<cell::RefCell<MemoryFileData>>> for MemoryFile {
  fn from(file: rc::Rc<cell::RefCell<MemoryFileData>>) -> Self {
    MemoryFile { file }
  }
}

impl File for MemoryFile {
  type Error = String;

  fn size(&mut self) -> Result<u64, Self::Error> {
    u64::try_from(self.file.borrow().data.len()).map_err(|x| x.to_string())
  }

  fn truncate(&mut self, size: u64) -> Result<(), Self::Error> {
    let size = usize::try_from(size).map_err(|x| x.to_string())?;
    self.file.borrow_mut().data.resize(size, 0);
    Ok(())
  }

  fn read(&mut self, offset: u64, buf: &mut [u8]) -> Result<(), Self::Error> {
    let offset = usize::try_from(offset).map_err(|x| x.to_string())?;
    let file = self.file.borrow();
    if offset + buf.len() > file.data.len() {
      return Err(format!("read of {} bytes at offset {} is past end of file", buf.len(), offset));
    }
    buf.copy_from_slice(&file.data[offset..offset + buf.len()]);
    Ok(())
  }

  fn write(&mut self, offset: u64, buf: &[u8]) -> Result<(), Self::Error> {
    let offset = usize::try_from(offset).map_err(|x| x.to_string())?;
    let mut file = self.file.borrow_mut();
    if offset + buf.len() > file.data.len() {
      file.data.resize(offset + buf.len(), 0);
    }
    file.data[offset..offset + buf.len()].copy_from_slice(buf);
    Ok(())
  }

  fn sync(&mut self) -> Result<(), Self::Error> {
    Ok(())
  }

  fn lock(&mut self) -> Result<(), Self::Error> {
    // Nothing can wait on another holder in a single thread, so contention is an error.
    let mut file = self.file.borrow_mut();
    if file.locked {
      Err("file is already locked".to_owned())
    } else {
      file.locked = true;
      Ok(())
    }
  }

  fn unlock(&mut self) -> Result<(), Self::Error> {
    let mut file = self.file.borrow_mut();
    if file.locked {
      file.locked = false;
      Ok(())
    } else {
      Err("file is not locked".to_owned())
    }
  }
}
