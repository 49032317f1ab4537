// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Error types.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid byte-order magic: {found:#010x}")]
    BadMagic { found: u32 },

    #[error("Unexpected block type {found:#x}, expected {expected:#x}")]
    UnexpectedBlockType { expected: u32, found: u32 },

    #[error("Unsupported format version {major}.{minor}")]
    UnsupportedVersion { major: u16, minor: u16 },

    #[error("Wrong block total length, header={header}, trailer={trailer}")]
    CorruptTrailer { header: u32, trailer: u32 },

    #[error("Block of type {block_type:#x} has invalid total length {length}")]
    InvalidBlockLength { block_type: u32, length: u32 },

    #[error("Block of type {block_type:#x} exceeds the {limit} byte limit ({length} bytes)")]
    OversizedBlock { block_type: u32, length: u32, limit: u32 },

    #[error("Truncated {what} record: needed {needed} bytes, {available} left")]
    TruncatedRecord {
        what: &'static str,
        needed: usize,
        available: usize,
    },

    #[error("Event block too short: total length {length}")]
    TruncatedEvent { length: u32 },

    #[error("Invalid {field} length {len}")]
    OversizedField { field: &'static str, len: usize },

    #[error("Unknown interface type {0}")]
    UnknownInterfaceType(u16),

    #[error("Unknown fd type {0}")]
    UnknownFdType(u8),

    #[error("FD block references TID {tid}, which doesn't exist")]
    DanglingReference { tid: u64 },

    #[error("Interface list missing")]
    MissingInterfaceList,
}

impl CaptureError {
    /// True for conditions that make the whole file unusable, as opposed to
    /// I/O failures or caller contract violations.
    pub fn is_fatal_corruption(&self) -> bool {
        !matches!(self, CaptureError::Io(_) | CaptureError::MissingInterfaceList)
    }
}

pub type CaptureResult<T> = std::result::Result<T, CaptureError>;
