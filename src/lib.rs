// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.

//! capfile: block-framed capture files for kernel event traces.
//!
//! A capture starts with a section header, carries the host's machine info,
//! interface addresses, process table and per-thread fd tables, and then a
//! stream of event blocks. [`Writer`] produces such a file from in-memory
//! [`CaptureTables`]; [`Reader`] rebuilds the tables and then yields events
//! one block at a time.
//!
//! Integers are stored in native byte order.

pub mod block;
pub mod config;
pub mod error;
pub mod event;
pub mod reader;
pub mod records;
pub mod table;
pub mod writer;

pub use config::{EventFraming, ReaderConfig, WriterConfig};
pub use error::{CaptureError, CaptureResult};
pub use event::Event;
pub use reader::Reader;
pub use table::{CaptureTables, FdTable, ProcessTable};
pub use writer::Writer;

#[cfg(test)]
pub mod tests;
