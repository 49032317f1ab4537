// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Captured events.
//!
//! The bytes of an event are opaque to this crate. The only layout it knows
//! about is the fixed kernel event header, and only when asked to use it for
//! framing:
//!
//! `[ts: u64][tid: u64][len: u32][type: u16][nparams: u32]` (26 bytes, packed), where `len`
//! counts the whole event including this header.

use crate::config::EventFraming;
use crate::error::{CaptureError, CaptureResult};
use byteorder::{ByteOrder, NativeEndian};

pub const KERNEL_EVENT_HEADER_SIZE: usize = 8 + 8 + 4 + 2 + 4;

const KERNEL_EVENT_LEN_OFFSET: usize = 16;

/// One event as read back from an event block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub cpuid: u16,
    pub data: Vec<u8>,
}

/// Splits an event block payload into `cpuid` and event bytes.
///
/// `total_length` is only used for error reporting.
pub(crate) fn decode_event(
    mut payload: Vec<u8>,
    framing: EventFraming,
    total_length: u32,
) -> CaptureResult<Event> {
    if payload.len() < 2 {
        return Err(CaptureError::TruncatedEvent { length: total_length });
    }
    let cpuid = NativeEndian::read_u16(&payload[0..2]);
    payload.drain(..2);

    if framing == EventFraming::KernelHeader {
        let len = kernel_event_len(&payload).ok_or(CaptureError::TruncatedEvent { length: total_length })?;
        payload.truncate(len);
    }

    Ok(Event { cpuid, data: payload })
}

/// Length declared by a kernel event header, if it fits within `bytes`.
fn kernel_event_len(bytes: &[u8]) -> Option<usize> {
    if bytes.len() < KERNEL_EVENT_HEADER_SIZE {
        return None;
    }
    let len = NativeEndian::read_u32(&bytes[KERNEL_EVENT_LEN_OFFSET..KERNEL_EVENT_LEN_OFFSET + 4]) as usize;
    (KERNEL_EVENT_HEADER_SIZE..=bytes.len()).contains(&len).then_some(len)
}

/// Builds a kernel-framed event around `params`. Mostly useful for tests and
/// synthetic captures.
pub fn kernel_event(ts: u64, tid: u64, event_type: u16, nparams: u32, params: &[u8]) -> Vec<u8> {
    let len = KERNEL_EVENT_HEADER_SIZE + params.len();
    let mut out = vec![0u8; KERNEL_EVENT_HEADER_SIZE];
    NativeEndian::write_u64(&mut out[0..8], ts);
    NativeEndian::write_u64(&mut out[8..16], tid);
    NativeEndian::write_u32(&mut out[16..20], len as u32);
    NativeEndian::write_u16(&mut out[20..22], event_type);
    NativeEndian::write_u32(&mut out[22..26], nparams);
    out.extend_from_slice(params);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(cpuid: u16, data: &[u8], padding: usize) -> Vec<u8> {
        let mut p = cpuid.to_ne_bytes().to_vec();
        p.extend_from_slice(data);
        p.extend(std::iter::repeat(0u8).take(padding));
        p
    }

    #[test]
    fn test_padded_framing_keeps_padding() {
        let event = decode_event(payload(1, &[9], 1), EventFraming::Padded, 16).unwrap();
        assert_eq!(event, Event { cpuid: 1, data: vec![9, 0] });
    }

    #[test]
    fn test_kernel_header_framing_drops_padding() {
        let raw = kernel_event(5, 77, 12, 1, &[1, 2, 3]);
        let event = decode_event(payload(2, &raw, 3), EventFraming::KernelHeader, 44).unwrap();
        assert_eq!(event.cpuid, 2);
        assert_eq!(event.data, raw);
    }

    #[test]
    fn test_kernel_header_len_beyond_block() {
        let mut raw = kernel_event(5, 77, 12, 0, &[]);
        NativeEndian::write_u32(&mut raw[16..20], 400);
        assert!(matches!(
            decode_event(payload(0, &raw, 0), EventFraming::KernelHeader, 40),
            Err(CaptureError::TruncatedEvent { length: 40 })
        ));
    }

    #[test]
    fn test_kernel_header_too_short() {
        assert!(matches!(
            decode_event(payload(0, &[0xAA, 0xBB], 0), EventFraming::KernelHeader, 16),
            Err(CaptureError::TruncatedEvent { .. })
        ));
    }
}
