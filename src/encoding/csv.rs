//! # CSV encoding and decoding
//!
//! Comma-separated rows with RFC 4180 quoting: a field containing a comma, a quote or a line break
//! is wrapped in quotes, and embedded quotes are doubled. Decoding is lenient in the same places
//! common CSV readers are: stray quotes inside unquoted fields and text after a closing quote are
//! kept as-is. The only hard failure is input that ends inside a quoted field.

use thiserror::Error;

/// Line terminator written after every row.
pub const LINE_TERMINATOR: &str = "\r\n";

/// Input ended inside a quoted field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unterminated quoted field starting on line {line}")]
pub struct DecodeError {
  /// 1-based line on which the unterminated field begins.
  pub line: usize,
}

fn needs_quoting(field: &str) -> bool {
  field.contains([',', '"', '\r', '\n'])
}

/// Appends one encoded row, including its line terminator, to `output`.
pub fn encode_row<S: AsRef<str>>(fields: &[S], output: &mut String) {
  for (i, field) in fields.iter().enumerate() {
    if i > 0 {
      output.push(',');
    }
    let field = field.as_ref();
    if needs_quoting(field) {
      output.push('"');
      output.push_str(&field.replace('"', "\"\""));
      output.push('"');
    } else {
      output.push_str(field);
    }
  }
  output.push_str(LINE_TERMINATOR);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
  FieldStart,
  Unquoted,
  Quoted,
  // Just saw a quote inside a quoted field: either an escaped quote or the closing one.
  QuotedQuote,
}

/// Decodes a whole document into rows. Empty lines produce no row.
pub fn decode(input: &str) -> Result<Vec<Vec<String>>, DecodeError> {
  let mut rows = Vec::new();
  let mut row = Vec::new();
  let mut field = String::new();
  let mut state = State::FieldStart;
  // Whether the current line holds anything at all, so that blank lines can be told apart from
  // a row consisting of one empty field.
  let mut line_has_content = false;
  let mut line = 1;
  let mut quote_line = 1;
  let mut chars = input.chars().peekable();

  while let Some(c) = chars.next() {
    match (state, c) {
      (State::Quoted, '"') => state = State::QuotedQuote,
      (State::Quoted, c) => {
        if c == '\n' {
          line += 1;
        }
        field.push(c);
      }
      (State::QuotedQuote, '"') => {
        field.push('"');
        state = State::Quoted;
      }
      (_, ',') => {
        row.push(std::mem::take(&mut field));
        state = State::FieldStart;
        line_has_content = true;
      }
      (_, '\r' | '\n') => {
        if c == '\r' && chars.peek() == Some(&'\n') {
          chars.next();
        }
        if line_has_content || state != State::FieldStart {
          row.push(std::mem::take(&mut field));
          rows.push(std::mem::take(&mut row));
        }
        state = State::FieldStart;
        line_has_content = false;
        line += 1;
      }
      (State::FieldStart, '"') => {
        state = State::Quoted;
        quote_line = line;
      }
      (State::FieldStart | State::Unquoted, c) => {
        field.push(c);
        state = State::Unquoted;
      }
      (State::QuotedQuote, c) => {
        field.push(c);
        state = State::Unquoted;
      }
    }
    line_has_content |= state != State::FieldStart;
  }

  match state {
    State::Quoted => return Err(DecodeError { line: quote_line }),
    _ if line_has_content || state != State::FieldStart => {
      row.push(field);
      rows.push(row);
    }
    _ => {}
  }
  Ok(rows)
}
