// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Capture file reader.
//!
//! Opening a reader validates the section header, then consumes metadata
//! blocks in whatever order they appear until the first event block, which
//! is left unread for `next_event`. Unknown block types are skipped with
//! their trailer still checked, so newer files stay readable.

use crate::block::{read_trailer, verify_trailer, BlockHeader, SectionHeader};
use crate::config::{
    ReaderConfig, CURRENT_MAJOR_VERSION, EV_BLOCK_TYPE, FDL_BLOCK_TYPE, IL_BLOCK_TYPE,
    MI_BLOCK_TYPE, PL_BLOCK_TYPE, SHB_BLOCK_TYPE,
};
use crate::error::{CaptureError, CaptureResult};
use crate::event::{decode_event, Event};
use crate::records::fdlist::{decode_fd_list, decode_owner};
use crate::records::iface::InterfaceList;
use crate::records::machine::MachineInfo;
use crate::records::process::decode_process_list;
use crate::table::{CaptureTables, ProcessTable};
use memmap2::Mmap;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::Path;

/// Smallest event block: header, `cpuid`, trailer.
const MIN_EVENT_BLOCK_LEN: u32 = BlockHeader::MIN_TOTAL_LENGTH + 2;

pub struct Reader<R> {
    source: R,
    config: ReaderConfig,
    section: SectionHeader,
    tables: CaptureTables,
    /// Bytes consumed after the section header block.
    consumed: u64,
}

impl Reader<BufReader<File>> {
    pub fn open_path<P: AsRef<Path>>(path: P) -> CaptureResult<Self> {
        let path = path.as_ref();
        tracing::debug!("Reading capture from {:?}", path);
        let file = File::open(path)?;
        Self::open(BufReader::new(file))
    }
}

impl Reader<Cursor<Mmap>> {
    /// Maps the whole file and reads it in place.
    pub fn open_mapped<P: AsRef<Path>>(path: P) -> CaptureResult<Self> {
        let path = path.as_ref();
        tracing::debug!("Mapping capture {:?}", path);
        let file = File::open(path)?;
        // The mapping is read-only; callers must not truncate the file while it is open.
        let mmap = unsafe { Mmap::map(&file)? };
        Self::open(Cursor::new(mmap))
    }
}

impl<R: Read + Seek> Reader<R> {
    pub fn open(source: R) -> CaptureResult<Self> {
        Self::open_with_config(source, ReaderConfig::default())
    }

    pub fn open_with_config(source: R, config: ReaderConfig) -> CaptureResult<Self> {
        let mut reader = Self {
            source,
            config,
            section: SectionHeader::new(CURRENT_MAJOR_VERSION, 0, None),
            tables: CaptureTables::new(),
            consumed: 0,
        };
        reader.section = reader.read_section_header()?;
        reader.load_metadata()?;

        tracing::debug!(
            "Capture v{}.{} loaded: {} threads, {} fds, {} interfaces",
            reader.section.major,
            reader.section.minor,
            reader.tables.processes.len(),
            reader.tables.fd_count(),
            reader.tables.interfaces.as_ref().map_or(0, InterfaceList::len)
        );
        Ok(reader)
    }

    fn read_section_header(&mut self) -> CaptureResult<SectionHeader> {
        let header = BlockHeader::read_from(&mut self.source)?.ok_or_else(|| {
            CaptureError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "empty capture file",
            ))
        })?;

        if header.block_type != SHB_BLOCK_TYPE {
            return Err(CaptureError::UnexpectedBlockType {
                expected: SHB_BLOCK_TYPE,
                found: header.block_type,
            });
        }

        // Anything past the fixed fields is section options; they are not interpreted.
        let body = self.read_block_body(&header)?;
        let section = SectionHeader::parse(&body)?;

        if section.major != CURRENT_MAJOR_VERSION {
            return Err(CaptureError::UnsupportedVersion {
                major: section.major,
                minor: section.minor,
            });
        }

        // The declared section length counts from the end of this block.
        self.consumed = 0;
        Ok(section)
    }

    fn load_metadata(&mut self) -> CaptureResult<()> {
        loop {
            let header = match BlockHeader::read_from(&mut self.source)? {
                Some(header) => header,
                None => {
                    tracing::debug!("Capture has no events");
                    return Ok(());
                }
            };

            match header.block_type {
                EV_BLOCK_TYPE => {
                    self.source.seek(SeekFrom::Current(-(BlockHeader::SIZE as i64)))?;
                    return Ok(());
                }
                MI_BLOCK_TYPE => {
                    let body = self.read_block_body(&header)?;
                    let machine = MachineInfo::decode(&body)?;
                    tracing::debug!("Machine info: {} cpus, {} bytes of memory", machine.num_cpus, machine.memory_size_bytes);
                    self.tables.machine = Some(machine);
                }
                IL_BLOCK_TYPE => {
                    let body = self.read_block_body(&header)?;
                    self.tables.interfaces = None;
                    let interfaces = InterfaceList::decode(&body)?;
                    tracing::debug!("Interface list: {} ipv4, {} ipv6", interfaces.v4.len(), interfaces.v6.len());
                    self.tables.interfaces = Some(interfaces);
                }
                PL_BLOCK_TYPE => {
                    let body = self.read_block_body(&header)?;
                    let threads = decode_process_list(&body)?;
                    tracing::debug!("Process list: {} threads", threads.len());
                    for tinfo in threads {
                        self.tables.processes.upsert(tinfo);
                    }
                }
                FDL_BLOCK_TYPE => {
                    let body = self.read_block_body(&header)?;
                    let tid = decode_owner(&body)?;
                    if self.tables.processes.get(tid).is_none() {
                        return Err(CaptureError::DanglingReference { tid });
                    }
                    let list = decode_fd_list(&body)?;
                    tracing::debug!("Fd list for tid {}: {} fds", list.tid, list.fds.len());
                    self.tables.processes.merge_fds(list.tid, list.fds)?;
                }
                other => {
                    let skip = header.body_len()?;
                    tracing::trace!("Skipping block of type {:#x} ({} bytes)", other, skip);
                    self.source.seek(SeekFrom::Current(i64::from(skip)))?;
                    self.finish_block(&header)?;
                }
            }
        }
    }

    /// Reads the body of a block plus its trailer, verifying the trailer
    /// before any of the body is interpreted.
    fn read_block_body(&mut self, header: &BlockHeader) -> CaptureResult<Vec<u8>> {
        let len = header.body_len()?;
        if len > self.config.max_block_size {
            return Err(CaptureError::OversizedBlock {
                block_type: header.block_type,
                length: len,
                limit: self.config.max_block_size,
            });
        }

        let mut body = vec![0u8; len as usize];
        self.source.read_exact(&mut body)?;
        self.finish_block(header)?;
        Ok(body)
    }

    fn finish_block(&mut self, header: &BlockHeader) -> CaptureResult<()> {
        let trailer = read_trailer(&mut self.source)?;
        verify_trailer(header, trailer)?;
        self.consumed += u64::from(header.total_length);
        Ok(())
    }

    fn section_exhausted(&self) -> bool {
        self.config.honor_section_length
            && self
                .section
                .declared_length()
                .is_some_and(|limit| self.consumed >= limit)
    }

    /// Reads the next event block. `Ok(None)` is a clean end of capture.
    ///
    /// With the default `EventFraming::Padded` the returned bytes run up to the
    /// trailer, so when `2 + event length` is not a multiple of 4 the event
    /// comes back with up to 3 trailing zero bytes. `EventFraming::KernelHeader`
    /// trims each event to the length in its own header.
    pub fn next_event(&mut self) -> CaptureResult<Option<Event>> {
        if self.section_exhausted() {
            return Ok(None);
        }

        let header = match BlockHeader::read_from(&mut self.source)? {
            Some(header) => header,
            None => return Ok(None),
        };

        if header.block_type != EV_BLOCK_TYPE {
            return Err(CaptureError::UnexpectedBlockType {
                expected: EV_BLOCK_TYPE,
                found: header.block_type,
            });
        }
        if header.total_length < MIN_EVENT_BLOCK_LEN {
            return Err(CaptureError::TruncatedEvent {
                length: header.total_length,
            });
        }

        let body = self.read_block_body(&header)?;
        decode_event(body, self.config.event_framing, header.total_length).map(Some)
    }

    pub fn section_header(&self) -> &SectionHeader {
        &self.section
    }

    pub fn tables(&self) -> &CaptureTables {
        &self.tables
    }

    pub fn processes(&self) -> &ProcessTable {
        &self.tables.processes
    }

    pub fn machine_info(&self) -> Option<&MachineInfo> {
        self.tables.machine.as_ref()
    }

    pub fn interfaces(&self) -> Option<&InterfaceList> {
        self.tables.interfaces.as_ref()
    }

    /// Releases the source, handing back the reconstructed tables.
    pub fn close(self) -> (CaptureTables, R) {
        (self.tables, self.source)
    }
}

impl<R: Read + Seek> Iterator for Reader<R> {
    type Item = CaptureResult<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_event().transpose()
    }
}
