// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Entry provider trait definition.

use std::path::Path;

use crate::version::Versioned;

use super::{Key, Record, RecordCursor, StorageError, StoreConfig};

/// A live session against an embedded store.
///
/// Mutations (`insert`, `delete`, `truncate`) are staged in a unit of work
/// and become visible only once `commit` succeeds; `rollback` discards them.
/// Reads observe committed state only. Implementations must keep the unit
/// of work of concurrent callers apart, so that one caller's commit or
/// rollback never applies or discards another caller's staged mutations.
pub trait EntryProvider: Send + Sync + Sized {
    /// Opens a session on the store at `path`.
    fn open(path: &Path, config: &StoreConfig) -> Result<Self, StorageError>;

    /// Returns every record stored under `key`, ordered by record id.
    fn query_key(&self, key: &Key) -> Result<RecordCursor, StorageError>;

    /// Returns every record in the store.
    fn query_all(&self) -> Result<Vec<Record>, StorageError>;

    /// Returns each key that has at least one record, once.
    fn distinct_keys(&self) -> Result<Vec<Key>, StorageError>;

    /// Stages a new record.
    fn insert(&self, key: &Key, versioned: &Versioned) -> Result<(), StorageError>;

    /// Stages removal of a record.
    fn delete(&self, record: &Record) -> Result<(), StorageError>;

    /// Stages removal of every record.
    fn truncate(&self) -> Result<(), StorageError>;

    /// Applies the caller's staged mutations atomically.
    fn commit(&self) -> Result<(), StorageError>;

    /// Discards the caller's staged mutations.
    fn rollback(&self) -> Result<(), StorageError>;

    /// Ends the session. Idempotent.
    fn close(&self) -> Result<(), StorageError>;

    /// Returns true once the session has been closed.
    fn is_closed(&self) -> bool;
}
