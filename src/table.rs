// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! In-memory tables: threads keyed by tid, each with its fd table, plus the
//! machine info and interface list of the captured host.

use crate::error::{CaptureError, CaptureResult};
use crate::records::fd::FdInfo;
use crate::records::iface::InterfaceList;
use crate::records::machine::MachineInfo;
use crate::records::process::ThreadInfo;
use rustc_hash::FxHashMap;

/// Per-thread descriptors keyed by fd number.
pub type FdTable = FxHashMap<i64, FdInfo>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessTable {
    threads: FxHashMap<u64, ThreadInfo>,
}

impl ProcessTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.threads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.threads.is_empty()
    }

    pub fn get(&self, tid: u64) -> Option<&ThreadInfo> {
        self.threads.get(&tid)
    }

    pub fn get_mut(&mut self, tid: u64) -> Option<&mut ThreadInfo> {
        self.threads.get_mut(&tid)
    }

    /// Insert-or-replace by tid. The replaced entry, fds included, is
    /// returned and no longer reachable from the table.
    pub fn upsert(&mut self, tinfo: ThreadInfo) -> Option<ThreadInfo> {
        self.threads.insert(tinfo.tid, tinfo)
    }

    pub fn remove(&mut self, tid: u64) -> Option<ThreadInfo> {
        self.threads.remove(&tid)
    }

    /// Merges fds into the table of `tid` (last wins per fd).
    ///
    /// An unknown tid is a dangling reference and leaves the table untouched.
    pub fn merge_fds<I>(&mut self, tid: u64, fds: I) -> CaptureResult<()>
    where
        I: IntoIterator<Item = FdInfo>,
    {
        let tinfo = self
            .threads
            .get_mut(&tid)
            .ok_or(CaptureError::DanglingReference { tid })?;
        for fdi in fds {
            tinfo.fds.insert(fdi.fd, fdi);
        }
        Ok(())
    }

    /// Iterates in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &ThreadInfo> {
        self.threads.values()
    }

    /// Iterates in ascending tid order.
    pub fn iter_sorted(&self) -> impl Iterator<Item = &ThreadInfo> {
        let mut threads: Vec<&ThreadInfo> = self.threads.values().collect();
        threads.sort_unstable_by_key(|t| t.tid);
        threads.into_iter()
    }
}

/// Fds of one thread in ascending fd order.
pub fn sorted_fds(fds: &FdTable) -> Vec<&FdInfo> {
    let mut sorted: Vec<&FdInfo> = fds.values().collect();
    sorted.sort_unstable_by_key(|f| f.fd);
    sorted
}

/// Everything a capture file carries besides events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureTables {
    /// Written as a zeroed `MachineInfo` when `None`, so a capture read back
    /// always has `Some` here.
    pub machine: Option<MachineInfo>,
    /// `None` until an interface list has been collected or read.
    pub interfaces: Option<InterfaceList>,
    pub processes: ProcessTable,
}

impl CaptureTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fd_count(&self) -> usize {
        self.processes.iter().map(|t| t.fds.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thread(tid: u64, comm: &str) -> ThreadInfo {
        ThreadInfo {
            tid,
            pid: tid,
            comm: comm.as_bytes().to_vec(),
            ..Default::default()
        }
    }

    #[test]
    fn test_upsert_is_last_wins() {
        let mut table = ProcessTable::new();
        assert!(table.upsert(thread(1, "a")).is_none());
        let old = table.upsert(thread(1, "b")).unwrap();
        assert_eq!(old.comm, b"a");
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(1).unwrap().comm, b"b");
    }

    #[test]
    fn test_upsert_drops_fds_of_replaced_thread() {
        let mut table = ProcessTable::new();
        table.upsert(thread(1, "a"));
        table.merge_fds(1, vec![FdInfo::file(3, 0, "/tmp/x")]).unwrap();

        let old = table.upsert(thread(1, "b")).unwrap();
        assert!(old.fds.contains_key(&3));

        let tinfo = table.get(1).unwrap();
        assert_eq!(tinfo.comm, b"b");
        assert!(tinfo.fds.is_empty());
    }

    #[test]
    fn test_merge_fds_last_wins_per_fd() {
        let mut table = ProcessTable::new();
        table.upsert(thread(9, "x"));
        table
            .merge_fds(9, vec![FdInfo::file(3, 0, "/a"), FdInfo::file(4, 0, "/b")])
            .unwrap();
        table.merge_fds(9, vec![FdInfo::file(3, 0, "/c")]).unwrap();

        let fds = &table.get(9).unwrap().fds;
        assert_eq!(fds.len(), 2);
        assert_eq!(fds[&3], FdInfo::file(3, 0, "/c"));
    }

    #[test]
    fn test_merge_fds_dangling_tid() {
        let mut table = ProcessTable::new();
        table.upsert(thread(1, "a"));
        assert!(matches!(
            table.merge_fds(2, vec![FdInfo::file(3, 0, "/a")]),
            Err(CaptureError::DanglingReference { tid: 2 })
        ));
    }

    #[test]
    fn test_sorted_iteration() {
        let mut table = ProcessTable::new();
        for tid in [30, 10, 20] {
            table.upsert(thread(tid, "t"));
        }
        let tids: Vec<u64> = table.iter_sorted().map(|t| t.tid).collect();
        assert_eq!(tids, vec![10, 20, 30]);
    }
}
