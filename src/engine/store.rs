// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Versioned store implementation.

use std::collections::HashMap;
use std::convert::Infallible;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, error, info, warn};

use crate::storage::{
    EntryProvider, Key, Record, RecordCursor, RocksEntryProvider, StorageError, StoreConfig,
    MAX_KEY_SIZE,
};
use crate::version::{Occurred, VectorClock, Versioned};

use super::error::StoreError;
use super::iter::{ClosableIter, EntryIterator, KeyIterator};

/// A versioned store persisted in RocksDB.
pub type RocksVersionedStore = VersionedStore<RocksEntryProvider>;

/// Optional capabilities a caller may ask a store for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    RoutingStrategy,
    ReadRepairer,
    FailureDetector,
    Statistics,
}

/// A key-value store that keeps causally concurrent versions side by side.
///
/// Writes are resolved against the vector clocks already stored for the key:
/// a write older than any stored version is rejected, stored versions older
/// than the write are replaced, and concurrent or equal versions are kept as
/// siblings.
///
/// The store owns at most one provider session at a time. It is opened on
/// first use, reopened whenever it is found closed, and swapped for a fresh
/// one by [`truncate`](Self::truncate). Operations take no lock against each
/// other; isolation between them is the provider's unit of work.
pub struct VersionedStore<P: EntryProvider = RocksEntryProvider> {
    name: String,
    path: PathBuf,
    config: StoreConfig,
    session: RwLock<Option<Arc<P>>>,
    truncating: AtomicBool,
}

impl<P: EntryProvider> VersionedStore<P> {
    /// Creates a store handle without opening a session.
    ///
    /// The store is named after its path.
    pub fn new(path: impl AsRef<Path>, config: StoreConfig) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(StoreError::InvalidArgument("store path must not be empty".to_string()));
        }
        config
            .validate()
            .map_err(|e| StoreError::InvalidArgument(e.to_string()))?;

        Ok(Self {
            name: path.display().to_string(),
            path: path.to_path_buf(),
            config,
            session: RwLock::new(None),
            truncating: AtomicBool::new(false),
        })
    }

    /// Creates a store handle and opens its session right away.
    pub fn open(path: impl AsRef<Path>, config: StoreConfig) -> Result<Self, StoreError> {
        let store = Self::new(path, config)?;
        store.provider()?;
        Ok(store)
    }

    /// Returns the store name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the path the provider is opened at.
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true while a truncation holds the store.
    ///
    /// Stays true forever if the session could not be reopened after a
    /// truncation.
    #[inline]
    pub fn is_truncating(&self) -> bool {
        self.truncating.load(Ordering::Acquire)
    }

    /// Returns every version currently stored for `key`.
    pub fn get(&self, key: &Key) -> Result<Vec<Versioned>, StoreError> {
        validate_key(key)?;
        let provider = self.provider()?;

        let outcome = provider
            .query_key(key)
            .map(|cursor| {
                let values = collect_values(&cursor);
                cursor.close();
                values
            })
            .map_err(StoreError::from);

        self.finish(&provider, outcome)
    }

    /// Looks up several keys at once.
    ///
    /// Keys without any stored version are left out of the result. The
    /// first failing lookup aborts the whole batch.
    pub fn get_all<'a, I>(&self, keys: I) -> Result<HashMap<Key, Vec<Versioned>>, StoreError>
    where
        I: IntoIterator<Item = &'a Key>,
    {
        let keys: Vec<&Key> = keys.into_iter().collect();
        for key in &keys {
            validate_key(key)?;
        }
        let provider = self.provider()?;

        let mut cursors = Vec::with_capacity(keys.len());
        let outcome = lookup_batch(provider.as_ref(), &keys, &mut cursors).map_err(StoreError::from);
        cursors.into_iter().for_each(RecordCursor::close);

        self.finish(&provider, outcome)
    }

    /// Returns the clocks of every version stored for `key`.
    pub fn get_versions(&self, key: &Key) -> Result<Vec<VectorClock>, StoreError> {
        Ok(self
            .get(key)?
            .into_iter()
            .map(|versioned| versioned.into_parts().0)
            .collect())
    }

    /// Stores a new version of `key`.
    ///
    /// Fails with [`StoreError::ObsoleteVersion`] if any stored version is
    /// newer than `versioned`; nothing is changed in that case. Stored
    /// versions that `versioned` dominates are removed.
    pub fn put(&self, key: &Key, versioned: Versioned) -> Result<(), StoreError> {
        validate_key(key)?;
        let provider = self.provider()?;

        let outcome = provider
            .query_key(key)
            .map_err(StoreError::from)
            .and_then(|cursor| {
                let outcome = supersede(provider.as_ref(), &cursor, key, &versioned);
                cursor.close();
                outcome
            });

        self.finish(&provider, outcome)
    }

    /// Removes every stored version of `key` that happened before `version`.
    ///
    /// Versions equal to, after, or concurrent with `version` are kept.
    /// Returns whether anything was removed. The unit of work is committed
    /// even when the removal fails part way.
    pub fn delete(&self, key: &Key, version: &VectorClock) -> Result<bool, StoreError> {
        validate_key(key)?;
        let provider = self.provider()?;

        let outcome = provider.query_key(key).and_then(|cursor| {
            let outcome = delete_ancestors(provider.as_ref(), &cursor, version);
            cursor.close();
            outcome
        });
        if let Err(e) = &outcome {
            error!(store = %self.name, error = %e, "delete failed");
        }

        let committed = self.attempt_commit(provider.as_ref());
        outcome
            .map_err(StoreError::from)
            .and_then(|deleted| committed.map(|()| deleted))
    }

    /// Returns an iterator over a snapshot of every stored version.
    pub fn entries(&self) -> Result<EntryIterator, StoreError> {
        let provider = self.provider()?;
        let records = provider.query_all().map_err(|e| self.persistence(e))?;

        Ok(ClosableIter::new(records.into_iter().map(Record::into_pair).collect()))
    }

    /// Returns an iterator over a snapshot of every stored key.
    pub fn keys(&self) -> Result<KeyIterator, StoreError> {
        let provider = self.provider()?;
        let keys = provider.distinct_keys().map_err(|e| self.persistence(e))?;

        Ok(ClosableIter::new(keys))
    }

    /// Removes every record from the store.
    ///
    /// Fails with [`StoreError::ConcurrentTruncation`] if another truncation
    /// is in progress; requests arriving meanwhile fail with
    /// [`StoreError::Truncating`]. If the session cannot be reopened
    /// afterwards the store stays in that state for good and
    /// [`StoreError::StorageInitialization`] is returned.
    pub fn truncate(&self) -> Result<(), StoreError> {
        if self
            .truncating
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(StoreError::ConcurrentTruncation {
                store: self.name.clone(),
            });
        }
        info!(store = %self.name, "truncating store");

        let wiped = self.wipe();

        match self.open_session() {
            Ok(fresh) => {
                *self.session.write() = Some(Arc::new(fresh));
                self.truncating.store(false, Ordering::Release);
            }
            Err(e) => {
                error!(
                    store = %self.name,
                    error = %e,
                    "failed to reopen store after truncation, all requests will fail"
                );
                return Err(e);
            }
        }

        if wiped.is_ok() {
            info!(store = %self.name, "store truncated");
        }
        wiped
    }

    /// Closes the current session, if any.
    ///
    /// A later operation opens a new session.
    pub fn close(&self) -> Result<(), StoreError> {
        let current = self.session.write().take();
        match current {
            Some(provider) => provider.close().map_err(|e| {
                error!(store = %self.name, error = %e, "shutdown failed");
                StoreError::Persistence(e)
            }),
            None => Ok(()),
        }
    }

    /// No optional capability is supported.
    pub fn capability(&self, capability: Capability) -> Result<Infallible, StoreError> {
        Err(StoreError::NoSuchCapability {
            capability,
            store: self.name.clone(),
        })
    }

    /// Returns the current session, opening one if there is none or it was
    /// closed.
    fn provider(&self) -> Result<Arc<P>, StoreError> {
        if let Some(provider) = self.session.read().as_ref() {
            if !provider.is_closed() {
                return Ok(Arc::clone(provider));
            }
        }

        let mut slot = self.session.write();
        if let Some(provider) = slot.as_ref() {
            if !provider.is_closed() {
                return Ok(Arc::clone(provider));
            }
        }
        if self.is_truncating() {
            return Err(StoreError::Truncating {
                store: self.name.clone(),
            });
        }

        let provider = Arc::new(self.open_session()?);
        *slot = Some(Arc::clone(&provider));
        Ok(provider)
    }

    /// Opens a session regardless of the truncating flag.
    fn open_session(&self) -> Result<P, StoreError> {
        P::open(&self.path, &self.config).map_err(|source| StoreError::StorageInitialization {
            store: self.name.clone(),
            source,
        })
    }

    /// Closes the current session and wipes the store through a private one.
    fn wipe(&self) -> Result<(), StoreError> {
        if let Err(e) = self.close() {
            warn!(store = %self.name, error = %e, "continuing truncation after failed close");
        }

        // Only the reopen in truncate is an initialization failure
        let provider = P::open(&self.path, &self.config).map_err(|e| self.persistence(e))?;
        let outcome = provider.truncate().map_err(|e| self.persistence(e));
        let outcome = self.finish(&provider, outcome);

        if let Err(e) = provider.close() {
            warn!(store = %self.name, error = %e, "failed to close truncation session");
        }
        outcome
    }

    /// Commits on success and rolls back on failure.
    fn finish<T>(&self, provider: &P, outcome: Result<T, StoreError>) -> Result<T, StoreError> {
        match outcome {
            Ok(value) => {
                self.attempt_commit(provider)?;
                Ok(value)
            }
            Err(e) => {
                match &e {
                    StoreError::Persistence(source) => {
                        error!(store = %self.name, error = %source, "operation failed")
                    }
                    other => debug!(store = %self.name, error = %other, "operation rejected"),
                }
                self.attempt_rollback(provider);
                Err(e)
            }
        }
    }

    /// Commits, rolling back if the commit fails.
    fn attempt_commit(&self, provider: &P) -> Result<(), StoreError> {
        provider.commit().map_err(|e| {
            error!(store = %self.name, error = %e, "transaction commit failed");
            self.attempt_rollback(provider);
            StoreError::Persistence(e)
        })
    }

    /// Rolls back. Failures are logged and otherwise ignored.
    fn attempt_rollback(&self, provider: &P) {
        if let Err(e) = provider.rollback() {
            error!(store = %self.name, error = %e, "rollback failed");
        }
    }

    fn persistence(&self, e: StorageError) -> StoreError {
        error!(store = %self.name, error = %e, "persistence failure");
        StoreError::Persistence(e)
    }
}

/// Checks a key before it reaches the provider.
fn validate_key(key: &Key) -> Result<(), StoreError> {
    if key.is_empty() {
        return Err(StoreError::InvalidArgument("key must not be empty".to_string()));
    }
    if key.len() > MAX_KEY_SIZE {
        return Err(StoreError::InvalidArgument(format!(
            "key too large: {} > {}",
            key.len(),
            MAX_KEY_SIZE
        )));
    }
    Ok(())
}

fn collect_values(cursor: &RecordCursor) -> Vec<Versioned> {
    cursor.iter().map(|record| record.versioned.clone()).collect()
}

/// Looks up each key, keeping every cursor in `cursors` for the caller to
/// close.
fn lookup_batch<P: EntryProvider>(
    provider: &P,
    keys: &[&Key],
    cursors: &mut Vec<RecordCursor>,
) -> Result<HashMap<Key, Vec<Versioned>>, StorageError> {
    let mut result = HashMap::with_capacity(keys.len());

    for &key in keys {
        let cursor = provider.query_key(key)?;
        if !cursor.is_empty() {
            result.insert(key.clone(), collect_values(&cursor));
        }
        cursors.push(cursor);
    }

    Ok(result)
}

/// Stages removal of every record `versioned` dominates, then stages
/// `versioned` itself.
fn supersede<P: EntryProvider>(
    provider: &P,
    cursor: &RecordCursor,
    key: &Key,
    versioned: &Versioned,
) -> Result<(), StoreError> {
    for record in cursor {
        let current = record.versioned.version();
        match versioned.version().compare(current) {
            Occurred::Before => {
                return Err(StoreError::ObsoleteVersion {
                    key: key.clone(),
                    version: versioned.version().clone(),
                    current: current.clone(),
                });
            }
            Occurred::After => provider.delete(record)?,
            Occurred::Equal | Occurred::Concurrent => {}
        }
    }

    provider.insert(key, versioned)?;
    Ok(())
}

/// Stages removal of every record that happened before `version`.
fn delete_ancestors<P: EntryProvider>(
    provider: &P,
    cursor: &RecordCursor,
    version: &VectorClock,
) -> Result<bool, StorageError> {
    let mut deleted = false;
    for record in cursor {
        if record.versioned.version().compare(version) == Occurred::Before {
            provider.delete(record)?;
            deleted = true;
        }
    }
    Ok(deleted)
}

impl<P: EntryProvider> PartialEq for VersionedStore<P> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl<P: EntryProvider> Eq for VersionedStore<P> {}

impl<P: EntryProvider> Hash for VersionedStore<P> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl<P: EntryProvider> fmt::Debug for VersionedStore<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VersionedStore")
            .field("name", &self.name)
            .field("truncating", &self.is_truncating())
            .finish_non_exhaustive()
    }
}
