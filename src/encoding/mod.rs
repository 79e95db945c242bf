//! # Encodings

pub mod csv;
