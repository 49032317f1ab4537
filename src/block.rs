// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Block framing.
//!
//! Every block on disk is `[type: u32][total_length: u32][payload][padding][trailer: u32]`
//! where `total_length` counts all of it, is a multiple of 4, and is repeated
//! in the trailer.

use crate::config::{SECTION_LENGTH_UNKNOWN, SHB_BLOCK_TYPE, SHB_MAGIC};
use crate::error::{CaptureError, CaptureResult};
use byteorder::{ByteOrder, NativeEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};

pub const TRAILER_SIZE: usize = 4;

/// Rounds `raw_len` up to the next multiple of 4.
pub fn normalize_length(raw_len: u32) -> u32 {
    raw_len.saturating_add(3) & !3
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    pub block_type: u32,
    pub total_length: u32,
}

impl BlockHeader {
    pub const SIZE: usize = 4 + 4;

    /// Smallest total length a block can declare: header plus trailer.
    pub const MIN_TOTAL_LENGTH: u32 = (Self::SIZE + TRAILER_SIZE) as u32;

    pub fn for_payload(block_type: u32, payload_len: u32) -> Self {
        Self {
            block_type,
            total_length: normalize_length(Self::MIN_TOTAL_LENGTH.saturating_add(payload_len)),
        }
    }

    /// Bytes between the header and the trailer, padding included.
    ///
    /// Fails when the total length is shorter than header plus trailer or
    /// not a multiple of 4.
    pub fn body_len(&self) -> CaptureResult<u32> {
        let invalid = CaptureError::InvalidBlockLength {
            block_type: self.block_type,
            length: self.total_length,
        };
        if self.total_length & 3 != 0 {
            return Err(invalid);
        }
        self.total_length.checked_sub(Self::MIN_TOTAL_LENGTH).ok_or(invalid)
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        NativeEndian::write_u32(&mut buf[0..4], self.block_type);
        NativeEndian::write_u32(&mut buf[4..8], self.total_length);
        buf
    }

    /// Reads the next header.
    ///
    /// `Ok(None)` means the source ended exactly on a block boundary. A header
    /// cut short after 1..8 bytes is an `UnexpectedEof` I/O error.
    pub fn read_from<R: Read>(reader: &mut R) -> CaptureResult<Option<Self>> {
        let mut buf = [0u8; Self::SIZE];
        let filled = read_up_to(reader, &mut buf)?;
        if filled == 0 {
            return Ok(None);
        }
        if filled < Self::SIZE {
            return Err(CaptureError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("short block header: {} of {} bytes", filled, Self::SIZE),
            )));
        }

        Ok(Some(Self {
            block_type: NativeEndian::read_u32(&buf[0..4]),
            total_length: NativeEndian::read_u32(&buf[4..8]),
        }))
    }
}

/// Like `read_exact`, but reports how many bytes arrived before EOF.
fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Frames one block around whatever `fill` appends to the payload buffer.
///
/// Returns the total number of bytes written to `sink`.
pub fn write_block<W, F>(sink: &mut W, block_type: u32, fill: F) -> CaptureResult<u32>
where
    W: Write,
    F: FnOnce(&mut Vec<u8>) -> CaptureResult<()>,
{
    let mut payload = Vec::new();
    fill(&mut payload)?;

    // Leave room for header, trailer and padding within a u32 total length.
    const LIMIT: u32 = u32::MAX - BlockHeader::MIN_TOTAL_LENGTH - 3;
    let payload_len = match u32::try_from(payload.len()) {
        Ok(len) if len <= LIMIT => len,
        _ => {
            return Err(CaptureError::OversizedBlock {
                block_type,
                length: u32::try_from(payload.len()).unwrap_or(u32::MAX),
                limit: LIMIT,
            })
        }
    };

    let header = BlockHeader::for_payload(block_type, payload_len);
    let padding = (normalize_length(payload_len) - payload_len) as usize;

    sink.write_all(&header.to_bytes())?;
    sink.write_all(&payload)?;
    sink.write_all(&[0u8; 3][..padding])?;
    sink.write_u32::<NativeEndian>(header.total_length)?;

    Ok(header.total_length)
}

pub fn read_trailer<R: Read>(reader: &mut R) -> CaptureResult<u32> {
    Ok(reader.read_u32::<NativeEndian>()?)
}

/// The trailer is the only end-to-end integrity check a block has.
pub fn verify_trailer(header: &BlockHeader, trailer: u32) -> CaptureResult<()> {
    if trailer != header.total_length {
        return Err(CaptureError::CorruptTrailer {
            header: header.total_length,
            trailer,
        });
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionHeader {
    pub magic: u32,
    pub major: u16,
    pub minor: u16,
    pub section_length: u64,
}

impl SectionHeader {
    pub const SIZE: usize = 4 + 2 + 2 + 8; // 16 bytes

    pub fn new(major: u16, minor: u16, section_length: Option<u64>) -> Self {
        Self {
            magic: SHB_MAGIC,
            major,
            minor,
            section_length: section_length.unwrap_or(SECTION_LENGTH_UNKNOWN),
        }
    }

    /// `None` when the writer did not know the section size up front.
    pub fn declared_length(&self) -> Option<u64> {
        (self.section_length != SECTION_LENGTH_UNKNOWN).then_some(self.section_length)
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        NativeEndian::write_u32(&mut buf[0..4], self.magic);
        NativeEndian::write_u16(&mut buf[4..6], self.major);
        NativeEndian::write_u16(&mut buf[6..8], self.minor);
        NativeEndian::write_u64(&mut buf[8..16], self.section_length);
        buf
    }

    pub fn parse(buf: &[u8]) -> CaptureResult<Self> {
        if buf.len() < Self::SIZE {
            return Err(CaptureError::TruncatedRecord {
                what: "section header",
                needed: Self::SIZE,
                available: buf.len(),
            });
        }

        let magic = NativeEndian::read_u32(&buf[0..4]);
        if magic != SHB_MAGIC {
            return Err(CaptureError::BadMagic { found: magic });
        }

        Ok(Self {
            magic,
            major: NativeEndian::read_u16(&buf[4..6]),
            minor: NativeEndian::read_u16(&buf[6..8]),
            section_length: NativeEndian::read_u64(&buf[8..16]),
        })
    }

    pub fn write_block<W: Write>(&self, sink: &mut W) -> CaptureResult<u32> {
        write_block(sink, SHB_BLOCK_TYPE, |buf| {
            buf.extend_from_slice(&self.to_bytes());
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_normalize_length() {
        assert_eq!(normalize_length(0), 0);
        assert_eq!(normalize_length(1), 4);
        assert_eq!(normalize_length(4), 4);
        assert_eq!(normalize_length(5), 8);
        assert_eq!(normalize_length(7), 8);
        assert_eq!(normalize_length(u32::MAX), u32::MAX & !3);
    }

    #[test]
    fn test_write_block_pads_and_repeats_length() {
        let mut out = Vec::new();
        let total = write_block(&mut out, 0x77, |buf| {
            buf.extend_from_slice(&[1, 2, 3, 4, 5]);
            Ok(())
        })
        .unwrap();

        assert_eq!(total, 20);
        assert_eq!(out.len(), 20);
        assert_eq!(total % 4, 0);

        let header = BlockHeader::read_from(&mut &out[..]).unwrap().unwrap();
        assert_eq!(header.block_type, 0x77);
        assert_eq!(header.total_length, 20);
        assert_eq!(&out[8..13], &[1, 2, 3, 4, 5]);
        assert_eq!(&out[13..16], &[0, 0, 0]);
        assert_eq!(NativeEndian::read_u32(&out[16..20]), 20);

        // padding = total - header - trailer - payload
        let padding = header.total_length as usize - BlockHeader::SIZE - TRAILER_SIZE - 5;
        assert_eq!(padding, 3);
    }

    #[test]
    fn test_empty_payload_block() {
        let mut out = Vec::new();
        let total = write_block(&mut out, 0x1, |_| Ok(())).unwrap();
        assert_eq!(total, BlockHeader::MIN_TOTAL_LENGTH);
        assert_eq!(out.len(), 12);
    }

    #[test]
    fn test_read_header_eof_vs_short_read() {
        let empty: &[u8] = &[];
        assert!(BlockHeader::read_from(&mut Cursor::new(empty)).unwrap().is_none());

        for cut in 1..BlockHeader::SIZE {
            let bytes = vec![0xABu8; cut];
            match BlockHeader::read_from(&mut Cursor::new(bytes)) {
                Err(CaptureError::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof),
                other => panic!("expected short read error, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_verify_trailer() {
        let header = BlockHeader { block_type: 1, total_length: 16 };
        assert!(verify_trailer(&header, 16).is_ok());
        assert!(matches!(
            verify_trailer(&header, 17),
            Err(CaptureError::CorruptTrailer { header: 16, trailer: 17 })
        ));
    }

    #[test]
    fn test_body_len_rejects_undersized_block() {
        let header = BlockHeader { block_type: 9, total_length: 8 };
        assert!(matches!(
            header.body_len(),
            Err(CaptureError::InvalidBlockLength { block_type: 9, length: 8 })
        ));
    }

    #[test]
    fn test_body_len_rejects_unaligned_block() {
        for total_length in [13, 14, 15, 21] {
            let header = BlockHeader { block_type: 9, total_length };
            assert!(matches!(
                header.body_len(),
                Err(CaptureError::InvalidBlockLength { block_type: 9, length }) if length == total_length
            ));
        }
        assert_eq!(BlockHeader { block_type: 9, total_length: 20 }.body_len().unwrap(), 8);
    }

    #[test]
    fn test_section_header_block() {
        let shb = SectionHeader::new(1, 0, None);
        let mut out = Vec::new();
        let total = shb.write_block(&mut out).unwrap();
        assert_eq!(total, 28);

        let header = BlockHeader::read_from(&mut &out[..]).unwrap().unwrap();
        assert_eq!(header.block_type, SHB_BLOCK_TYPE);

        let decoded = SectionHeader::parse(&out[8..24]).unwrap();
        assert_eq!(decoded, shb);
        assert_eq!(decoded.declared_length(), None);
        assert_eq!(SectionHeader::new(1, 0, Some(64)).declared_length(), Some(64));
    }

    #[test]
    fn test_section_header_bad_magic() {
        let mut bytes = SectionHeader::new(1, 0, None).to_bytes();
        bytes[0] ^= 0xFF;
        assert!(matches!(
            SectionHeader::parse(&bytes),
            Err(CaptureError::BadMagic { .. })
        ));
    }
}
