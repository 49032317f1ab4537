// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Metadata record codecs.
//!
//! Encoders append to a block payload buffer; decoders walk a fully read
//! block payload with an explicit offset and never read past its end.

pub mod fd;
pub mod fdlist;
pub mod iface;
pub mod machine;
pub mod process;

use crate::config::MAX_PATH_SIZE;
use crate::error::{CaptureError, CaptureResult};
use byteorder::{ByteOrder, NativeEndian, WriteBytesExt};

fn take<'a>(
    buf: &'a [u8],
    offset: &mut usize,
    len: usize,
    what: &'static str,
) -> CaptureResult<&'a [u8]> {
    let available = buf.len().saturating_sub(*offset);
    if len > available {
        return Err(CaptureError::TruncatedRecord {
            what,
            needed: len,
            available,
        });
    }
    let bytes = &buf[*offset..*offset + len];
    *offset += len;
    Ok(bytes)
}

pub(crate) fn read_u8(buf: &[u8], offset: &mut usize, what: &'static str) -> CaptureResult<u8> {
    Ok(take(buf, offset, 1, what)?[0])
}

pub(crate) fn read_u16(buf: &[u8], offset: &mut usize, what: &'static str) -> CaptureResult<u16> {
    Ok(NativeEndian::read_u16(take(buf, offset, 2, what)?))
}

pub(crate) fn read_u32(buf: &[u8], offset: &mut usize, what: &'static str) -> CaptureResult<u32> {
    Ok(NativeEndian::read_u32(take(buf, offset, 4, what)?))
}

pub(crate) fn read_u64(buf: &[u8], offset: &mut usize, what: &'static str) -> CaptureResult<u64> {
    Ok(NativeEndian::read_u64(take(buf, offset, 8, what)?))
}

pub(crate) fn read_i64(buf: &[u8], offset: &mut usize, what: &'static str) -> CaptureResult<i64> {
    Ok(NativeEndian::read_i64(take(buf, offset, 8, what)?))
}

pub(crate) fn read_array<const N: usize>(
    buf: &[u8],
    offset: &mut usize,
    what: &'static str,
) -> CaptureResult<[u8; N]> {
    let mut out = [0u8; N];
    out.copy_from_slice(take(buf, offset, N, what)?);
    Ok(out)
}

/// Reads `len` raw bytes, rejecting lengths at or above `MAX_PATH_SIZE`.
pub(crate) fn read_bytes(
    buf: &[u8],
    offset: &mut usize,
    len: usize,
    field: &'static str,
) -> CaptureResult<Vec<u8>> {
    if len >= MAX_PATH_SIZE {
        return Err(CaptureError::OversizedField { field, len });
    }
    Ok(take(buf, offset, len, field)?.to_vec())
}

/// Reads a `u16` length prefix followed by that many bytes.
pub(crate) fn read_string(
    buf: &[u8],
    offset: &mut usize,
    field: &'static str,
) -> CaptureResult<Vec<u8>> {
    let len = read_u16(buf, offset, field)? as usize;
    read_bytes(buf, offset, len, field)
}

/// Checks a length against the same bound the decoder enforces, so nothing
/// written here is rejected on the way back in.
pub(crate) fn checked_len(bytes: &[u8], field: &'static str) -> CaptureResult<u16> {
    if bytes.len() >= MAX_PATH_SIZE {
        return Err(CaptureError::OversizedField {
            field,
            len: bytes.len(),
        });
    }
    Ok(bytes.len() as u16)
}

pub(crate) fn write_string(out: &mut Vec<u8>, bytes: &[u8], field: &'static str) -> CaptureResult<()> {
    let len = checked_len(bytes, field)?;
    out.write_u16::<NativeEndian>(len)?;
    out.extend_from_slice(bytes);
    Ok(())
}

/// Decoders stop once fewer than 4 bytes remain; those must be padding.
pub(crate) fn check_padding(buf: &[u8], offset: usize, what: &'static str) -> CaptureResult<()> {
    let rest = &buf[offset.min(buf.len())..];
    if rest.iter().any(|&b| b != 0) {
        return Err(CaptureError::TruncatedRecord {
            what,
            needed: 4,
            available: rest.len(),
        });
    }
    Ok(())
}

/// Strips everything from the first NUL on, for fixed-size C string fields.
pub(crate) fn trim_nul(bytes: &[u8]) -> &[u8] {
    match bytes.iter().position(|&b| b == 0) {
        Some(end) => &bytes[..end],
        None => bytes,
    }
}
