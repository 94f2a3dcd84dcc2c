//! Snapshot export
//!
//! Height fields are exported as plain CSV text. The serializer itself does
//! no I/O; [`csv::write_to`] is the file sink used by the CLI.

pub mod csv;

pub use csv::{parse, read_from, serialize, write_to};
