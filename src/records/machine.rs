// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Machine info record: a fixed 180-byte description of the captured host.

use super::{read_array, read_u32, read_u64, trim_nul};
use crate::error::CaptureResult;
use byteorder::{NativeEndian, WriteBytesExt};

pub const HOSTNAME_SIZE: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineInfo {
    pub num_cpus: u32,
    pub memory_size_bytes: u64,
    pub max_pid: u64,
    /// NUL-padded C string.
    pub hostname: [u8; HOSTNAME_SIZE],
    pub reserved: [u64; 4],
}

impl Default for MachineInfo {
    fn default() -> Self {
        Self {
            num_cpus: 0,
            memory_size_bytes: 0,
            max_pid: 0,
            hostname: [0; HOSTNAME_SIZE],
            reserved: [0; 4],
        }
    }
}

impl MachineInfo {
    pub const SIZE: usize = 4 + 8 + 8 + HOSTNAME_SIZE + 4 * 8; // 180 bytes

    /// Builds an entry, truncating `hostname` so it stays NUL-terminated.
    pub fn new(num_cpus: u32, memory_size_bytes: u64, max_pid: u64, hostname: &str) -> Self {
        let mut info = Self {
            num_cpus,
            memory_size_bytes,
            max_pid,
            ..Self::default()
        };
        let len = hostname.len().min(HOSTNAME_SIZE - 1);
        info.hostname[..len].copy_from_slice(&hostname.as_bytes()[..len]);
        info
    }

    pub fn hostname(&self) -> &[u8] {
        trim_nul(&self.hostname)
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> CaptureResult<()> {
        out.write_u32::<NativeEndian>(self.num_cpus)?;
        out.write_u64::<NativeEndian>(self.memory_size_bytes)?;
        out.write_u64::<NativeEndian>(self.max_pid)?;
        out.extend_from_slice(&self.hostname);
        for r in self.reserved {
            out.write_u64::<NativeEndian>(r)?;
        }
        Ok(())
    }

    /// Decodes the leading `SIZE` bytes; anything after them is padding.
    pub fn decode(buf: &[u8]) -> CaptureResult<Self> {
        let mut offset = 0;
        let num_cpus = read_u32(buf, &mut offset, "machine info")?;
        let memory_size_bytes = read_u64(buf, &mut offset, "machine info")?;
        let max_pid = read_u64(buf, &mut offset, "machine info")?;
        let hostname = read_array::<HOSTNAME_SIZE>(buf, &mut offset, "machine info")?;
        let mut reserved = [0u64; 4];
        for r in reserved.iter_mut() {
            *r = read_u64(buf, &mut offset, "machine info")?;
        }

        Ok(Self {
            num_cpus,
            memory_size_bytes,
            max_pid,
            hostname,
            reserved,
        })
    }
}
