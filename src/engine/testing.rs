// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! In-memory entry provider with fault injection, for store tests.

use std::collections::{BTreeMap, HashMap};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::{self, ThreadId};

use parking_lot::Mutex;

use crate::storage::{EntryProvider, Key, Record, RecordCursor, RecordId, StorageError, StoreConfig};
use crate::version::Versioned;

static DISKS: Mutex<Vec<(PathBuf, Arc<MemDisk>)>> = parking_lot::const_mutex(Vec::new());

/// Returns the shared state behind every session opened at `path`.
pub(crate) fn disk(path: &Path) -> Arc<MemDisk> {
    let mut disks = DISKS.lock();
    if let Some((_, disk)) = disks.iter().find(|(p, _)| p == path) {
        return Arc::clone(disk);
    }
    let disk = Arc::new(MemDisk::default());
    disks.push((path.to_path_buf(), Arc::clone(&disk)));
    disk
}

fn injected(what: &str) -> StorageError {
    StorageError::Io(io::Error::other(format!("injected {} failure", what)))
}

/// Committed records plus fault switches and call counters.
#[derive(Default)]
pub(crate) struct MemDisk {
    records: Mutex<BTreeMap<(Key, RecordId), Versioned>>,
    next_id: AtomicU64,
    open_cursors: Arc<AtomicUsize>,

    pub fail_open: AtomicBool,
    pub fail_next_opens: AtomicUsize,
    pub fail_open_after_truncate: AtomicBool,
    pub fail_commit: AtomicBool,
    pub fail_rollback: AtomicBool,
    pub fail_delete: AtomicBool,
    pub fail_truncate: AtomicBool,
    pub fail_query_on: Mutex<Option<Key>>,

    pub opens: AtomicUsize,
    pub commits: AtomicUsize,
    pub rollbacks: AtomicUsize,

    truncate_entered: Mutex<Option<mpsc::Sender<()>>>,
    truncate_release: Mutex<Option<mpsc::Receiver<()>>>,
}

impl MemDisk {
    /// Makes the next staged truncation signal `entered` and block until
    /// `release` yields.
    pub fn pause_truncate(&self, entered: mpsc::Sender<()>, release: mpsc::Receiver<()>) {
        *self.truncate_entered.lock() = Some(entered);
        *self.truncate_release.lock() = Some(release);
    }

    pub fn open_cursors(&self) -> usize {
        self.open_cursors.load(Ordering::Acquire)
    }
}

enum Staged {
    Insert(Key, RecordId, Versioned),
    Delete(Key, RecordId),
    Truncate,
}

/// A session over a [`MemDisk`], with a unit of work per thread.
pub(crate) struct MemoryProvider {
    disk: Arc<MemDisk>,
    pending: Mutex<HashMap<ThreadId, Vec<Staged>>>,
    closed: AtomicBool,
}

impl MemoryProvider {
    fn stage(&self, mutation: Staged) -> Result<(), StorageError> {
        if self.is_closed() {
            return Err(StorageError::Closed);
        }
        self.pending
            .lock()
            .entry(thread::current().id())
            .or_default()
            .push(mutation);
        Ok(())
    }

    fn check_open(&self) -> Result<(), StorageError> {
        if self.is_closed() {
            Err(StorageError::Closed)
        } else {
            Ok(())
        }
    }
}

impl EntryProvider for MemoryProvider {
    fn open(path: &Path, _config: &StoreConfig) -> Result<Self, StorageError> {
        let disk = disk(path);
        let countdown = disk
            .fail_next_opens
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
        if disk.fail_open.load(Ordering::Acquire) || countdown.is_ok() {
            return Err(injected("open"));
        }
        disk.opens.fetch_add(1, Ordering::AcqRel);

        Ok(Self {
            disk,
            pending: Mutex::new(HashMap::new()),
            closed: AtomicBool::new(false),
        })
    }

    fn query_key(&self, key: &Key) -> Result<RecordCursor, StorageError> {
        self.check_open()?;
        if self.disk.fail_query_on.lock().as_ref() == Some(key) {
            return Err(injected("query"));
        }

        let records = self
            .disk
            .records
            .lock()
            .range((key.clone(), RecordId(0))..=(key.clone(), RecordId(u64::MAX)))
            .map(|((key, id), versioned)| Record::new(*id, key.clone(), versioned.clone()))
            .collect();

        Ok(RecordCursor::tracked(records, Arc::clone(&self.disk.open_cursors)))
    }

    fn query_all(&self) -> Result<Vec<Record>, StorageError> {
        self.check_open()?;
        Ok(self
            .disk
            .records
            .lock()
            .iter()
            .map(|((key, id), versioned)| Record::new(*id, key.clone(), versioned.clone()))
            .collect())
    }

    fn distinct_keys(&self) -> Result<Vec<Key>, StorageError> {
        self.check_open()?;
        let mut keys: Vec<Key> = self.disk.records.lock().keys().map(|(key, _)| key.clone()).collect();
        keys.dedup();
        Ok(keys)
    }

    fn insert(&self, key: &Key, versioned: &Versioned) -> Result<(), StorageError> {
        let id = RecordId(self.disk.next_id.fetch_add(1, Ordering::AcqRel));
        self.stage(Staged::Insert(key.clone(), id, versioned.clone()))
    }

    fn delete(&self, record: &Record) -> Result<(), StorageError> {
        if self.disk.fail_delete.load(Ordering::Acquire) {
            return Err(injected("delete"));
        }
        self.stage(Staged::Delete(record.key.clone(), record.id))
    }

    fn truncate(&self) -> Result<(), StorageError> {
        let entered = self.disk.truncate_entered.lock().take();
        if let Some(tx) = entered {
            let _ = tx.send(());
        }
        let release = self.disk.truncate_release.lock().take();
        if let Some(rx) = release {
            let _ = rx.recv();
        }

        if self.disk.fail_truncate.load(Ordering::Acquire) {
            return Err(injected("truncate"));
        }
        if self.disk.fail_open_after_truncate.load(Ordering::Acquire) {
            self.disk.fail_open.store(true, Ordering::Release);
        }
        self.stage(Staged::Truncate)
    }

    fn commit(&self) -> Result<(), StorageError> {
        self.check_open()?;
        if self.disk.fail_commit.load(Ordering::Acquire) {
            return Err(injected("commit"));
        }
        self.disk.commits.fetch_add(1, Ordering::AcqRel);

        let staged = self.pending.lock().remove(&thread::current().id());
        let mut records = self.disk.records.lock();
        for mutation in staged.into_iter().flatten() {
            match mutation {
                Staged::Insert(key, id, versioned) => {
                    records.insert((key, id), versioned);
                }
                Staged::Delete(key, id) => {
                    records.remove(&(key, id));
                }
                Staged::Truncate => records.clear(),
            }
        }
        Ok(())
    }

    fn rollback(&self) -> Result<(), StorageError> {
        self.disk.rollbacks.fetch_add(1, Ordering::AcqRel);
        self.pending.lock().remove(&thread::current().id());
        if self.disk.fail_rollback.load(Ordering::Acquire) {
            return Err(injected("rollback"));
        }
        Ok(())
    }

    fn close(&self) -> Result<(), StorageError> {
        self.closed.store(true, Ordering::Release);
        self.pending.lock().clear();
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}
