// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Fd list records: `[tid: u64]` followed by the fd records of that thread.

use super::fd::FdInfo;
use super::{check_padding, read_u64};
use crate::error::CaptureResult;
use byteorder::{NativeEndian, WriteBytesExt};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FdList {
    pub tid: u64,
    pub fds: Vec<FdInfo>,
}

/// Encodes one fd list payload for `tid`.
pub fn encode_fd_list<'a, I>(tid: u64, fds: I, out: &mut Vec<u8>) -> CaptureResult<()>
where
    I: IntoIterator<Item = &'a FdInfo>,
{
    out.write_u64::<NativeEndian>(tid)?;
    for fdi in fds {
        fdi.encode(out)?;
    }
    Ok(())
}

/// Decodes the owning tid only, so callers can resolve the thread before
/// paying for the rest of the block.
pub fn decode_owner(buf: &[u8]) -> CaptureResult<u64> {
    let mut offset = 0;
    read_u64(buf, &mut offset, "fd list")
}

pub fn decode_fd_list(buf: &[u8]) -> CaptureResult<FdList> {
    let mut offset = 0;
    let tid = read_u64(buf, &mut offset, "fd list")?;

    let mut fds = Vec::new();
    while buf.len() - offset >= 4 {
        fds.push(FdInfo::decode(buf, &mut offset)?);
    }
    check_padding(buf, offset, "fd list")?;

    Ok(FdList { tid, fds })
}
