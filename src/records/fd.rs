// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! File descriptor records.
//!
//! Layout: `[fd: i64][ino: u64][type: u8][body]`, where the body depends on
//! the descriptor type. Records are self-delimiting; there is no length prefix.

use super::{read_array, read_i64, read_string, read_u16, read_u32, read_u64, read_u8, write_string};
use crate::error::{CaptureError, CaptureResult};
use byteorder::{NativeEndian, WriteBytesExt};

const FD_TYPE_UNKNOWN: u8 = 0;
const FD_TYPE_FILE: u8 = 1;
const FD_TYPE_DIRECTORY: u8 = 2;
const FD_TYPE_IPV4_SOCK: u8 = 3;
const FD_TYPE_IPV6_SOCK: u8 = 4;
const FD_TYPE_IPV4_SERVSOCK: u8 = 5;
const FD_TYPE_IPV6_SERVSOCK: u8 = 6;
const FD_TYPE_FIFO: u8 = 7;
const FD_TYPE_UNIX_SOCK: u8 = 8;
const FD_TYPE_EVENT: u8 = 9;
const FD_TYPE_UNSUPPORTED: u8 = 10;
const FD_TYPE_SIGNALFD: u8 = 11;
const FD_TYPE_EVENTPOLL: u8 = 12;
const FD_TYPE_INOTIFY: u8 = 13;
const FD_TYPE_TIMERFD: u8 = 14;

/// Descriptor types whose body is just a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedFdType {
    Unknown,
    File,
    Directory,
    Fifo,
    Event,
    Unsupported,
    Signalfd,
    Eventpoll,
    Inotify,
    Timerfd,
}

impl NamedFdType {
    fn code(self) -> u8 {
        match self {
            NamedFdType::Unknown => FD_TYPE_UNKNOWN,
            NamedFdType::File => FD_TYPE_FILE,
            NamedFdType::Directory => FD_TYPE_DIRECTORY,
            NamedFdType::Fifo => FD_TYPE_FIFO,
            NamedFdType::Event => FD_TYPE_EVENT,
            NamedFdType::Unsupported => FD_TYPE_UNSUPPORTED,
            NamedFdType::Signalfd => FD_TYPE_SIGNALFD,
            NamedFdType::Eventpoll => FD_TYPE_EVENTPOLL,
            NamedFdType::Inotify => FD_TYPE_INOTIFY,
            NamedFdType::Timerfd => FD_TYPE_TIMERFD,
        }
    }

    fn from_code(code: u8) -> Option<Self> {
        match code {
            FD_TYPE_UNKNOWN => Some(NamedFdType::Unknown),
            FD_TYPE_FILE => Some(NamedFdType::File),
            FD_TYPE_DIRECTORY => Some(NamedFdType::Directory),
            FD_TYPE_FIFO => Some(NamedFdType::Fifo),
            FD_TYPE_EVENT => Some(NamedFdType::Event),
            FD_TYPE_UNSUPPORTED => Some(NamedFdType::Unsupported),
            FD_TYPE_SIGNALFD => Some(NamedFdType::Signalfd),
            FD_TYPE_EVENTPOLL => Some(NamedFdType::Eventpoll),
            FD_TYPE_INOTIFY => Some(NamedFdType::Inotify),
            FD_TYPE_TIMERFD => Some(NamedFdType::Timerfd),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FdKind {
    Named {
        fd_type: NamedFdType,
        name: Vec<u8>,
    },
    Ipv4Socket {
        sip: u32,
        dip: u32,
        sport: u16,
        dport: u16,
        l4proto: u8,
    },
    Ipv6Socket {
        sip: [u8; 16],
        dip: [u8; 16],
        sport: u16,
        dport: u16,
        l4proto: u8,
    },
    Ipv4Server {
        ip: u32,
        port: u16,
        l4proto: u8,
    },
    Ipv6Server {
        ip: [u8; 16],
        port: u16,
        l4proto: u8,
    },
    UnixSocket {
        source: u64,
        dest: u64,
        name: Vec<u8>,
    },
}

impl FdKind {
    pub fn type_code(&self) -> u8 {
        match self {
            FdKind::Named { fd_type, .. } => fd_type.code(),
            FdKind::Ipv4Socket { .. } => FD_TYPE_IPV4_SOCK,
            FdKind::Ipv6Socket { .. } => FD_TYPE_IPV6_SOCK,
            FdKind::Ipv4Server { .. } => FD_TYPE_IPV4_SERVSOCK,
            FdKind::Ipv6Server { .. } => FD_TYPE_IPV6_SERVSOCK,
            FdKind::UnixSocket { .. } => FD_TYPE_UNIX_SOCK,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FdInfo {
    pub fd: i64,
    pub ino: u64,
    pub kind: FdKind,
}

impl FdInfo {
    pub fn file(fd: i64, ino: u64, path: &str) -> Self {
        Self {
            fd,
            ino,
            kind: FdKind::Named {
                fd_type: NamedFdType::File,
                name: path.as_bytes().to_vec(),
            },
        }
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> CaptureResult<()> {
        out.write_i64::<NativeEndian>(self.fd)?;
        out.write_u64::<NativeEndian>(self.ino)?;
        out.write_u8(self.kind.type_code())?;

        match &self.kind {
            FdKind::Named { name, .. } => write_string(out, name, "fd name")?,
            FdKind::Ipv4Socket { sip, dip, sport, dport, l4proto } => {
                out.write_u32::<NativeEndian>(*sip)?;
                out.write_u32::<NativeEndian>(*dip)?;
                out.write_u16::<NativeEndian>(*sport)?;
                out.write_u16::<NativeEndian>(*dport)?;
                out.write_u8(*l4proto)?;
            }
            FdKind::Ipv6Socket { sip, dip, sport, dport, l4proto } => {
                out.extend_from_slice(sip);
                out.extend_from_slice(dip);
                out.write_u16::<NativeEndian>(*sport)?;
                out.write_u16::<NativeEndian>(*dport)?;
                out.write_u8(*l4proto)?;
            }
            FdKind::Ipv4Server { ip, port, l4proto } => {
                out.write_u32::<NativeEndian>(*ip)?;
                out.write_u16::<NativeEndian>(*port)?;
                out.write_u8(*l4proto)?;
            }
            FdKind::Ipv6Server { ip, port, l4proto } => {
                out.extend_from_slice(ip);
                out.write_u16::<NativeEndian>(*port)?;
                out.write_u8(*l4proto)?;
            }
            FdKind::UnixSocket { source, dest, name } => {
                out.write_u64::<NativeEndian>(*source)?;
                out.write_u64::<NativeEndian>(*dest)?;
                write_string(out, name, "fd name")?;
            }
        }
        Ok(())
    }

    pub fn decode(buf: &[u8], offset: &mut usize) -> CaptureResult<Self> {
        let fd = read_i64(buf, offset, "fd")?;
        let ino = read_u64(buf, offset, "fd")?;
        let code = read_u8(buf, offset, "fd")?;

        let kind = match code {
            FD_TYPE_IPV4_SOCK => FdKind::Ipv4Socket {
                sip: read_u32(buf, offset, "fd")?,
                dip: read_u32(buf, offset, "fd")?,
                sport: read_u16(buf, offset, "fd")?,
                dport: read_u16(buf, offset, "fd")?,
                l4proto: read_u8(buf, offset, "fd")?,
            },
            FD_TYPE_IPV6_SOCK => FdKind::Ipv6Socket {
                sip: read_array::<16>(buf, offset, "fd")?,
                dip: read_array::<16>(buf, offset, "fd")?,
                sport: read_u16(buf, offset, "fd")?,
                dport: read_u16(buf, offset, "fd")?,
                l4proto: read_u8(buf, offset, "fd")?,
            },
            FD_TYPE_IPV4_SERVSOCK => FdKind::Ipv4Server {
                ip: read_u32(buf, offset, "fd")?,
                port: read_u16(buf, offset, "fd")?,
                l4proto: read_u8(buf, offset, "fd")?,
            },
            FD_TYPE_IPV6_SERVSOCK => FdKind::Ipv6Server {
                ip: read_array::<16>(buf, offset, "fd")?,
                port: read_u16(buf, offset, "fd")?,
                l4proto: read_u8(buf, offset, "fd")?,
            },
            FD_TYPE_UNIX_SOCK => FdKind::UnixSocket {
                source: read_u64(buf, offset, "fd")?,
                dest: read_u64(buf, offset, "fd")?,
                name: read_string(buf, offset, "fd name")?,
            },
            other => match NamedFdType::from_code(other) {
                Some(fd_type) => FdKind::Named {
                    fd_type,
                    name: read_string(buf, offset, "fd name")?,
                },
                None => return Err(CaptureError::UnknownFdType(other)),
            },
        };

        Ok(Self { fd, ino, kind })
    }
}
