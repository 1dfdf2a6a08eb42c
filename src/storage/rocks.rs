// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! RocksDB-backed entry provider.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, ThreadId};

use parking_lot::{Mutex, RwLock};
use rocksdb::{
    BlockBasedOptions, DBWithThreadMode, IteratorMode, MultiThreaded, Options, ReadOptions,
    SliceTransform, WriteBatch, WriteOptions,
};
use tracing::{debug, info, warn};

use crate::version::Versioned;

use super::codec::{decode_versioned, encode_versioned};
use super::key::{
    decode_record_key, encode_record_key, extract_user_key, user_key_prefix, KEYSPACE_END,
    KEYSPACE_START,
};
use super::{
    DurabilityMode, EntryProvider, Key, Record, RecordCursor, RecordId, StorageError, StoreConfig,
    MAX_KEY_SIZE, MAX_VALUE_SIZE,
};

type Db = DBWithThreadMode<MultiThreaded>;

/// RocksDB-backed entry provider.
///
/// Each calling thread stages its mutations in its own `WriteBatch`, which
/// `commit` writes atomically and `rollback` drops. Reads go straight to the
/// database and therefore only see committed records.
pub struct RocksEntryProvider {
    path: PathBuf,
    db: RwLock<Option<Db>>,
    pending: Mutex<HashMap<ThreadId, WriteBatch>>,
    next_record_id: AtomicU64,
    open_cursors: Arc<AtomicUsize>,
    write_opts: WriteOptions,
}

impl RocksEntryProvider {
    /// Returns the database path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the number of cursors handed out and not yet closed.
    pub fn open_cursors(&self) -> usize {
        self.open_cursors.load(Ordering::Acquire)
    }

    /// Returns the number of mutations staged by the calling thread.
    pub fn pending_mutations(&self) -> usize {
        self.pending
            .lock()
            .get(&thread::current().id())
            .map_or(0, |batch| batch.len())
    }

    /// Finds the id to hand out next: one past the largest persisted id.
    fn recover_next_record_id(db: &Db) -> Result<u64, StorageError> {
        let mut next = 0;
        for item in db.iterator_opt(IteratorMode::Start, Self::scan_opts()) {
            let (encoded_key, _) = item?;
            let (_, RecordId(id)) = decode_record_key(&encoded_key)?;
            next = next.max(id.saturating_add(1));
        }
        Ok(next)
    }

    /// Read options for full scans.
    ///
    /// The prefix extractor only covers the length prefix, so full scans
    /// must not be bounded by it.
    fn scan_opts() -> ReadOptions {
        let mut opts = ReadOptions::default();
        opts.set_total_order_seek(true);
        opts
    }

    /// Runs `f` against the open database.
    fn with_db<T>(&self, f: impl FnOnce(&Db) -> Result<T, StorageError>) -> Result<T, StorageError> {
        let guard = self.db.read();
        let db = guard.as_ref().ok_or(StorageError::Closed)?;
        f(db)
    }

    /// Adds a mutation to the calling thread's unit of work.
    fn stage(&self, f: impl FnOnce(&mut WriteBatch)) -> Result<(), StorageError> {
        let guard = self.db.read();
        if guard.is_none() {
            return Err(StorageError::Closed);
        }
        let mut pending = self.pending.lock();
        f(pending.entry(thread::current().id()).or_default());
        Ok(())
    }

    /// Validates key size.
    fn validate_key(&self, key: &Key) -> Result<(), StorageError> {
        if key.len() > MAX_KEY_SIZE {
            return Err(StorageError::KeyTooLarge {
                size: key.len(),
                max: MAX_KEY_SIZE,
            });
        }
        Ok(())
    }

    /// Validates value size.
    fn validate_value(&self, versioned: &Versioned) -> Result<(), StorageError> {
        let len = versioned.value().len();
        if len > MAX_VALUE_SIZE {
            return Err(StorageError::ValueTooLarge {
                size: len,
                max: MAX_VALUE_SIZE,
            });
        }
        Ok(())
    }

    fn decode_record(encoded_key: &[u8], value: &[u8]) -> Result<Record, StorageError> {
        let (key, id) = decode_record_key(encoded_key)?;
        Ok(Record::new(id, key, decode_versioned(value)?))
    }
}

impl EntryProvider for RocksEntryProvider {
    fn open(path: &Path, config: &StoreConfig) -> Result<Self, StorageError> {
        config.validate()?;

        let mut opts = Options::default();
        opts.create_if_missing(config.create_if_missing);

        opts.set_write_buffer_size(config.write_buffer_size);
        opts.set_max_write_buffer_number(config.max_write_buffer_number);
        opts.set_target_file_size_base(64 * 1024 * 1024);
        opts.set_level_compaction_dynamic_level_bytes(true);

        // Bloom filters for point lookups
        let mut block_opts = BlockBasedOptions::default();
        block_opts.set_bloom_filter(config.bloom_filter_bits, false);
        opts.set_block_based_table_factory(&block_opts);

        // Prefix is the user key length
        opts.set_prefix_extractor(SliceTransform::create_fixed_prefix(4));

        let db = Db::open(&opts, path)?;
        let next_record_id = Self::recover_next_record_id(&db)?;

        let mut write_opts = WriteOptions::default();
        write_opts.set_sync(config.durability == DurabilityMode::FsyncEveryWrite);

        info!(path = %path.display(), next_record_id, "opened rocksdb entry provider");

        Ok(Self {
            path: path.to_path_buf(),
            db: RwLock::new(Some(db)),
            pending: Mutex::new(HashMap::new()),
            next_record_id: AtomicU64::new(next_record_id),
            open_cursors: Arc::new(AtomicUsize::new(0)),
            write_opts,
        })
    }

    fn query_key(&self, key: &Key) -> Result<RecordCursor, StorageError> {
        self.validate_key(key)?;

        let records = self.with_db(|db| {
            let prefix = user_key_prefix(key);
            let mut records = Vec::new();

            for item in db.prefix_iterator(&prefix) {
                let (encoded_key, value) = item?;

                // Verify this is still our key
                if extract_user_key(&encoded_key)? != key.as_bytes() {
                    break;
                }

                records.push(Self::decode_record(&encoded_key, &value)?);
            }

            Ok(records)
        })?;

        Ok(RecordCursor::tracked(records, Arc::clone(&self.open_cursors)))
    }

    fn query_all(&self) -> Result<Vec<Record>, StorageError> {
        self.with_db(|db| {
            db.iterator_opt(IteratorMode::Start, Self::scan_opts())
                .map(|item| {
                    let (encoded_key, value) = item?;
                    Self::decode_record(&encoded_key, &value)
                })
                .collect()
        })
    }

    fn distinct_keys(&self) -> Result<Vec<Key>, StorageError> {
        self.with_db(|db| {
            let mut keys: Vec<Key> = Vec::new();

            for item in db.iterator_opt(IteratorMode::Start, Self::scan_opts()) {
                let (encoded_key, _) = item?;
                let user_key = extract_user_key(&encoded_key)?;

                // Records of a key are contiguous
                if keys.last().map(Key::as_bytes) != Some(user_key) {
                    keys.push(Key::from(user_key));
                }
            }

            Ok(keys)
        })
    }

    fn insert(&self, key: &Key, versioned: &Versioned) -> Result<(), StorageError> {
        self.validate_key(key)?;
        self.validate_value(versioned)?;

        let id = RecordId(self.next_record_id.fetch_add(1, Ordering::Relaxed));
        let encoded_key = encode_record_key(key, id);
        let encoded_value = encode_versioned(versioned);

        self.stage(|batch| batch.put(&encoded_key, &encoded_value))
    }

    fn delete(&self, record: &Record) -> Result<(), StorageError> {
        let encoded_key = encode_record_key(&record.key, record.id);
        self.stage(|batch| batch.delete(&encoded_key))
    }

    fn truncate(&self) -> Result<(), StorageError> {
        self.stage(|batch| batch.delete_range(KEYSPACE_START, KEYSPACE_END))
    }

    fn commit(&self) -> Result<(), StorageError> {
        let guard = self.db.read();
        let db = guard.as_ref().ok_or(StorageError::Closed)?;

        let batch = self.pending.lock().remove(&thread::current().id());
        match batch {
            Some(batch) if !batch.is_empty() => {
                let mutations = batch.len();
                db.write_opt(batch, &self.write_opts)?;
                debug!(mutations, "committed unit of work");
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn rollback(&self) -> Result<(), StorageError> {
        let guard = self.db.read();
        if guard.is_none() {
            return Err(StorageError::Closed);
        }

        if let Some(batch) = self.pending.lock().remove(&thread::current().id()) {
            debug!(mutations = batch.len(), "rolled back unit of work");
        }
        Ok(())
    }

    fn close(&self) -> Result<(), StorageError> {
        let mut guard = self.db.write();
        let Some(db) = guard.take() else {
            return Ok(());
        };

        let discarded: usize = self.pending.lock().drain().map(|(_, batch)| batch.len()).sum();
        if discarded > 0 {
            warn!(path = %self.path.display(), mutations = discarded, "discarding uncommitted mutations on close");
        }
        let cursors = self.open_cursors();
        if cursors > 0 {
            warn!(path = %self.path.display(), cursors, "closing session with open cursors");
        }

        let flushed = db.flush();
        drop(db);
        info!(path = %self.path.display(), "closed rocksdb entry provider");

        flushed.map_err(StorageError::from)
    }

    fn is_closed(&self) -> bool {
        self.db.read().is_none()
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::storage::Value;
    use proptest::prelude::*;
    use tempfile::TempDir;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn committed_records_read_back(
            entries in prop::collection::vec(
                (prop::collection::vec(any::<u8>(), 1..16), prop::collection::vec(any::<u8>(), 0..64)),
                1..20,
            ),
        ) {
            let dir = TempDir::new().unwrap();
            let provider = RocksEntryProvider::open(dir.path(), &StoreConfig::default()).unwrap();

            for (key, value) in &entries {
                let versioned = Versioned::unversioned(Value::new(value.clone()));
                provider.insert(&Key::new(key.clone()), &versioned).unwrap();
            }
            provider.commit().unwrap();

            for (key, value) in &entries {
                let cursor = provider.query_key(&Key::new(key.clone())).unwrap();
                prop_assert!(cursor.iter().any(|r| r.versioned.value().as_bytes() == value.as_slice()));
            }
            prop_assert_eq!(provider.query_all().unwrap().len(), entries.len());
        }
    }
}
