// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Capture file writer.
//!
//! Opening a writer emits the section header and the metadata blocks in a
//! fixed order (machine info, interface list, process list, one fd list per
//! thread); every `dump_event` afterwards appends a single event block.

use crate::block::{write_block, SectionHeader};
use crate::config::{EV_BLOCK_TYPE, FDL_BLOCK_TYPE, IL_BLOCK_TYPE, MI_BLOCK_TYPE, PL_BLOCK_TYPE, WriterConfig};
use crate::error::{CaptureError, CaptureResult};
use crate::records::fdlist::encode_fd_list;
use crate::records::process::encode_process_list;
use crate::table::{sorted_fds, CaptureTables};
use byteorder::{NativeEndian, WriteBytesExt};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

pub struct Writer<W: Write> {
    sink: W,
    bytes_written: u64,
    events_written: u64,
}

impl Writer<BufWriter<Box<dyn Write + Send>>> {
    /// Creates (or truncates) a capture file. A path of `-` writes to stdout.
    pub fn create<P: AsRef<Path>>(path: P, tables: &CaptureTables) -> CaptureResult<Self> {
        let path = path.as_ref();
        let sink: Box<dyn Write + Send> = if path.as_os_str() == "-" {
            Box::new(io::stdout())
        } else {
            Box::new(File::create(path)?)
        };
        tracing::debug!("Writing capture to {:?}", path);
        Self::open(BufWriter::new(sink), tables)
    }
}

impl<W: Write> Writer<W> {
    pub fn open(sink: W, tables: &CaptureTables) -> CaptureResult<Self> {
        Self::open_with_config(sink, tables, &WriterConfig::default())
    }

    pub fn open_with_config(sink: W, tables: &CaptureTables, config: &WriterConfig) -> CaptureResult<Self> {
        let interfaces = tables.interfaces.as_ref().ok_or(CaptureError::MissingInterfaceList)?;

        let mut writer = Self {
            sink,
            bytes_written: 0,
            events_written: 0,
        };

        let shb = SectionHeader::new(config.major, config.minor, config.section_length);
        let len = shb.write_block(&mut writer.sink)?;
        writer.bytes_written += u64::from(len);

        let machine = tables.machine.clone().unwrap_or_default();
        let len = write_block(&mut writer.sink, MI_BLOCK_TYPE, |buf| machine.encode(buf))?;
        writer.bytes_written += u64::from(len);

        let len = write_block(&mut writer.sink, IL_BLOCK_TYPE, |buf| interfaces.encode(buf))?;
        writer.bytes_written += u64::from(len);

        let len = write_block(&mut writer.sink, PL_BLOCK_TYPE, |buf| {
            encode_process_list(tables.processes.iter_sorted(), buf)
        })?;
        writer.bytes_written += u64::from(len);

        // Threads without descriptors still get an (empty) FDL block.
        for tinfo in tables.processes.iter_sorted() {
            let len = write_block(&mut writer.sink, FDL_BLOCK_TYPE, |buf| {
                encode_fd_list(tinfo.tid, sorted_fds(&tinfo.fds), buf)
            })?;
            writer.bytes_written += u64::from(len);
        }

        tracing::debug!(
            "Capture header written: {} threads, {} fds, {} interfaces, {} bytes",
            tables.processes.len(),
            tables.fd_count(),
            interfaces.len(),
            writer.bytes_written
        );

        Ok(writer)
    }

    /// Appends one event block: `cpuid` followed by the raw event bytes.
    pub fn dump_event(&mut self, cpuid: u16, event: &[u8]) -> CaptureResult<()> {
        let len = write_block(&mut self.sink, EV_BLOCK_TYPE, |buf| {
            buf.reserve(2 + event.len());
            buf.write_u16::<NativeEndian>(cpuid)?;
            buf.extend_from_slice(event);
            Ok(())
        })?;
        self.bytes_written += u64::from(len);
        self.events_written += 1;
        Ok(())
    }

    /// Total bytes handed to the sink, metadata included.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn events_written(&self) -> u64 {
        self.events_written
    }

    pub fn flush(&mut self) -> CaptureResult<()> {
        self.sink.flush()?;
        Ok(())
    }

    /// Flushes and hands back the sink.
    pub fn close(mut self) -> CaptureResult<W> {
        self.sink.flush()?;
        tracing::debug!(
            "Capture closed after {} events ({} bytes)",
            self.events_written,
            self.bytes_written
        );
        Ok(self.sink)
    }
}
