//! # Storage
//!
//! File access ([`vfs`]), per-store id sequences and locking ([`sequence`]), and the CSV record
//! store built on them ([`store`]).

pub mod sequence;
pub mod store;
pub mod vfs;
