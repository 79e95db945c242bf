//! # Configuration
//!
//! Where the store files live. Values come from built-in defaults, then an optional TOML file,
//! then command-line or environment overrides applied by the binary.

use crate::schema::{Schema, COURSE, STUDENT};
use serde::Deserialize;
use std::fs;
use std::io;
use std::path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("cannot read config file {path:?}: {source}")]
  Read { path: path::PathBuf, source: io::Error },

  #[error("invalid config file {path:?}: {source}")]
  Parse { path: path::PathBuf, source: toml::de::Error },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
  /// Directory holding the store files.
  pub data_dir: path::PathBuf,
  /// File name of the student store, relative to `data_dir`.
  pub student_file: String,
  /// File name of the course store, relative to `data_dir`.
  pub course_file: String,
}

impl Default for Config {
  fn default() -> Self {
    Config {
      data_dir: path::PathBuf::from("."),
      student_file: STUDENT.file_name.to_owned(),
      course_file: COURSE.file_name.to_owned(),
    }
  }
}

impl Config {
  /// Loads `path` if given, falling back to defaults for anything it leaves out. Without a path,
  /// or if nothing exists at it, returns the defaults.
  pub fn load(path: Option<&path::Path>) -> Result<Self, ConfigError> {
    let Some(path) = path else {
      return Ok(Config::default());
    };
    if !path.exists() {
      tracing::debug!("config file {:?} not found, using defaults", path);
      return Ok(Config::default());
    }
    let content =
      fs::read_to_string(path).map_err(|source| ConfigError::Read { path: path.to_owned(), source })?;
    Self::parse(&content).map_err(|source| ConfigError::Parse { path: path.to_owned(), source })
  }

  pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
    toml::from_str(content)
  }

  /// Returns the store file name configured for `schema`.
  pub fn file_name(&self, schema: &Schema) -> &str {
    if *schema == COURSE {
      &self.course_file
    } else {
      &self.student_file
    }
  }
}
