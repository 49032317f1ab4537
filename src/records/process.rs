// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Process list records.

use super::{check_padding, read_string, read_u32, read_u64, write_string};
use crate::error::CaptureResult;
use crate::table::FdTable;
use byteorder::{NativeEndian, WriteBytesExt};

/// One thread as captured from the host.
///
/// String fields hold raw bytes without a terminator; `args` is the
/// NUL-separated argv blob.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThreadInfo {
    pub tid: u64,
    pub pid: u64,
    pub ppid: u64,
    pub comm: Vec<u8>,
    pub exe: Vec<u8>,
    pub args: Vec<u8>,
    pub cwd: Vec<u8>,
    pub fdlimit: u64,
    pub flags: u32,
    pub uid: u32,
    pub gid: u32,
    /// Filled from FDL blocks; not part of the process list record.
    pub fds: FdTable,
}

impl ThreadInfo {
    /// Iterates the argv entries stored in `args`.
    pub fn argv(&self) -> impl Iterator<Item = &[u8]> {
        self.args.split(|&b| b == 0).filter(|a| !a.is_empty())
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> CaptureResult<()> {
        out.write_u64::<NativeEndian>(self.tid)?;
        out.write_u64::<NativeEndian>(self.pid)?;
        out.write_u64::<NativeEndian>(self.ppid)?;
        write_string(out, &self.comm, "comm")?;
        write_string(out, &self.exe, "exe")?;
        write_string(out, &self.args, "args")?;
        write_string(out, &self.cwd, "cwd")?;
        out.write_u64::<NativeEndian>(self.fdlimit)?;
        out.write_u32::<NativeEndian>(self.flags)?;
        out.write_u32::<NativeEndian>(self.uid)?;
        out.write_u32::<NativeEndian>(self.gid)?;
        Ok(())
    }

    fn decode_one(buf: &[u8], offset: &mut usize) -> CaptureResult<Self> {
        Ok(Self {
            tid: read_u64(buf, offset, "process")?,
            pid: read_u64(buf, offset, "process")?,
            ppid: read_u64(buf, offset, "process")?,
            comm: read_string(buf, offset, "comm")?,
            exe: read_string(buf, offset, "exe")?,
            args: read_string(buf, offset, "args")?,
            cwd: read_string(buf, offset, "cwd")?,
            fdlimit: read_u64(buf, offset, "process")?,
            flags: read_u32(buf, offset, "process")?,
            uid: read_u32(buf, offset, "process")?,
            gid: read_u32(buf, offset, "process")?,
            fds: FdTable::default(),
        })
    }
}

/// Encodes a sequence of threads as one process list payload.
pub fn encode_process_list<'a, I>(threads: I, out: &mut Vec<u8>) -> CaptureResult<()>
where
    I: IntoIterator<Item = &'a ThreadInfo>,
{
    for tinfo in threads {
        tinfo.encode(out)?;
    }
    Ok(())
}

/// Decodes every entry of a process list payload, in file order.
pub fn decode_process_list(buf: &[u8]) -> CaptureResult<Vec<ThreadInfo>> {
    let mut threads = Vec::new();
    let mut offset = 0;
    while buf.len() - offset >= 4 {
        threads.push(ThreadInfo::decode_one(buf, &mut offset)?);
    }
    check_padding(buf, offset, "process")?;
    Ok(threads)
}
