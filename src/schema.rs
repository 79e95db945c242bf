//! # Entity schemas and records
//!
//! A [`Schema`] is the fixed, ordered field list of one entity type. The first field is always
//! `id` and the second always `name`; stores rely on both. A [`Record`] is an ordered list of
//! string values, one per schema field.

use crate::error::{Error, Result};
use std::collections;
use std::fmt;

/// Field values keyed by field name, as collected from a form or the command line.
pub type Fields = collections::BTreeMap<String, String>;

pub const ID_FIELD: &str = "id";

/// # Entity schema
#[derive(Debug, PartialEq, Eq)]
pub struct Schema {
  /// Entity name, singular and lower case.
  pub entity: &'static str,
  /// Field names in file order.
  pub fields: &'static [&'static str],
  /// Default file name of the backing store.
  pub file_name: &'static str,
}

pub static STUDENT: Schema = Schema {
  entity: "student",
  fields: &["id", "name", "sex", "age", "institution", "major"],
  file_name: "students.csv",
};

pub static COURSE: Schema = Schema {
  entity: "course",
  fields: &["id", "name", "credit", "property"],
  file_name: "courses.csv",
};

impl Schema {
  /// Returns the position of `field` in the schema.
  pub fn position(&self, field: &str) -> Option<usize> {
    self.fields.iter().position(|x| *x == field)
  }

  /// Returns the fields a caller supplies when creating a record, that is all but `id`.
  pub fn input_fields(&self) -> impl Iterator<Item = &'static str> {
    self.fields.iter().copied().filter(|x| *x != ID_FIELD)
  }

  /// Checks that `fields` holds a non-empty value for every input field and nothing else.
  pub fn validate(&self, fields: &Fields) -> Result<()> {
    self.check_known(fields)?;
    let missing: Vec<_> =
      self.input_fields().filter(|x| fields.get(*x).map_or(true, |v| v.trim().is_empty())).collect();
    if !missing.is_empty() {
      return Err(Error::Validation(format!("all fields are required; missing {}", missing.join(", "))));
    }
    Ok(())
  }

  /// Checks that every key in `fields` names a field of this schema.
  pub fn check_known(&self, fields: &Fields) -> Result<()> {
    let unknown: Vec<_> = fields.keys().filter(|x| self.position(x).is_none()).map(String::as_str).collect();
    if !unknown.is_empty() {
      return Err(Error::Validation(format!("unknown {} field(s): {}", self.entity, unknown.join(", "))));
    }
    Ok(())
  }

  /// Builds a record from validated input fields and an assigned id.
  pub fn record(&'static self, id: u64, fields: &Fields) -> Result<Record> {
    self.validate(fields)?;
    let values = self
      .fields
      .iter()
      .map(|x| if *x == ID_FIELD { id.to_string() } else { fields[*x].clone() })
      .collect();
    Ok(Record { schema: self, values })
  }
}

/// # Record
///
/// Values are kept as text; numeric fields such as `age` or `credit` are never interpreted here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
  schema: &'static Schema,
  values: Vec<String>,
}

impl Record {
  /// Wraps one decoded row. Fails if the row does not have one value per schema field.
  pub fn from_row(schema: &'static Schema, values: Vec<String>) -> Result<Self> {
    if values.len() != schema.fields.len() {
      return Err(Error::StorageRead(format!(
        "{} row has {} field(s), expected {}",
        schema.entity,
        values.len(),
        schema.fields.len()
      )));
    }
    Ok(Record { schema, values })
  }

  pub fn schema(&self) -> &'static Schema {
    self.schema
  }

  pub fn values(&self) -> &[String] {
    &self.values
  }

  pub fn id(&self) -> &str {
    &self.values[0]
  }

  pub fn name(&self) -> &str {
    &self.values[1]
  }

  /// Returns whether every value is empty or whitespace. Such rows are removed by compaction.
  pub fn is_blank(&self) -> bool {
    self.values.iter().all(|x| x.trim().is_empty())
  }

  /// Overwrites values with the non-empty entries of `fields`. The id never changes.
  ///
  /// Returns the names of the fields that were ignored because they target the id.
  pub fn merge(&mut self, fields: &Fields) -> Result<Vec<String>> {
    self.schema.check_known(fields)?;
    let mut ignored = Vec::new();
    for (field, value) in fields {
      if field == ID_FIELD {
        ignored.push(field.clone());
        continue;
      }
      if value.trim().is_empty() {
        continue;
      }
      if let Some(i) = self.schema.position(field) {
        self.values[i] = value.clone();
      }
    }
    Ok(ignored)
  }
}

impl fmt::Display for Record {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, (field, value)) in self.schema.fields.iter().zip(&self.values).enumerate() {
      if i > 0 {
        write!(f, ", ")?;
      }
      write!(f, "{}={}", field, value)?;
    }
    Ok(())
  }
}
