//! Plain-text rendering of record listings.

use crate::schema::Record;

const SEPARATOR_WIDTH: usize = 40;

/// Message shown in place of an empty listing.
pub const EMPTY: &str = "No data available.";

fn capitalize(field: &str) -> String {
  let mut chars = field.chars();
  match chars.next() {
    Some(first) => first.to_uppercase().chain(chars).collect(),
    None => String::new(),
  }
}

/// Renders each record as a block headed by its record number, one `Field: value` line per field.
pub fn render<'a, I: IntoIterator<Item = (usize, &'a Record)>>(entries: I) -> String {
  let mut output = String::new();
  for (rrn, record) in entries {
    if !output.is_empty() {
      output.push('\n');
    }
    output.push_str(&format!("RRN: {}\n", rrn));
    for (field, value) in record.schema().fields.iter().zip(record.values()) {
      output.push_str(&format!("{}: {}\n", capitalize(field), value));
    }
    output.push_str(&"-".repeat(SEPARATOR_WIDTH));
  }
  if output.is_empty() {
    output.push_str(EMPTY);
  }
  output
}

/// Renders a full listing, numbering records by position.
pub fn render_all(records: &[Record]) -> String {
  render(records.iter().enumerate().map(|(i, record)| (i + 1, record)))
}
