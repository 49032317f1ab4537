// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Format constants and reader/writer configuration.

/// Section header block.
pub const SHB_BLOCK_TYPE: u32 = 0x0A0D_0D0A;
/// Machine info block.
pub const MI_BLOCK_TYPE: u32 = 0x201;
/// Process list block.
pub const PL_BLOCK_TYPE: u32 = 0x202;
/// Fd list block, one per thread id.
pub const FDL_BLOCK_TYPE: u32 = 0x203;
/// Captured event block.
pub const EV_BLOCK_TYPE: u32 = 0x204;
/// Interface list block.
pub const IL_BLOCK_TYPE: u32 = 0x205;

/// Byte-order magic carried by the section header.
pub const SHB_MAGIC: u32 = 0x1a2b_3c4d;

pub const CURRENT_MAJOR_VERSION: u16 = 1;
pub const CURRENT_MINOR_VERSION: u16 = 0;

/// Section length value meaning "read until EOF".
pub const SECTION_LENGTH_UNKNOWN: u64 = u64::MAX;

/// Upper bound (exclusive) for any decoded string length.
pub const MAX_PATH_SIZE: usize = 1024;

/// Default cap on a single block payload accepted by the reader.
pub const DEFAULT_MAX_BLOCK_SIZE: u32 = 16 * 1024 * 1024;

/// How the reader delimits the opaque bytes of an event block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventFraming {
    /// Everything between `cpuid` and the trailer, zero padding included.
    #[default]
    Padded,
    /// Trust the `len` field of the kernel event header and drop the padding.
    KernelHeader,
}

#[derive(Debug, Clone)]
pub struct WriterConfig {
    pub major: u16,
    pub minor: u16,
    /// `None` writes the unknown-length sentinel.
    pub section_length: Option<u64>,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            major: CURRENT_MAJOR_VERSION,
            minor: CURRENT_MINOR_VERSION,
            section_length: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReaderConfig {
    pub max_block_size: u32,
    pub event_framing: EventFraming,
    /// Stop iterating events once a declared section length is exhausted.
    pub honor_section_length: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            max_block_size: DEFAULT_MAX_BLOCK_SIZE,
            event_framing: EventFraming::Padded,
            honor_section_length: true,
        }
    }
}
