// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Keys, values and persisted records.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::version::Versioned;

/// Maximum key size in bytes.
pub const MAX_KEY_SIZE: usize = 8 * 1024; // 8KB

/// Maximum value size in bytes.
pub const MAX_VALUE_SIZE: usize = 64 * 1024 * 1024; // 64MB

/// A key identifying a family of versioned records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key(pub Vec<u8>);

impl Key {
    /// Creates a new key from bytes.
    #[inline]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Returns the key bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the length of the key.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the key is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&[u8]> for Key {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl From<Vec<u8>> for Key {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Self(s.into_bytes())
    }
}

impl AsRef<[u8]> for Key {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// An opaque payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Value(pub Vec<u8>);

impl Value {
    /// Creates a new value from bytes.
    #[inline]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Returns the value bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the length of the value.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the value is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&[u8]> for Value {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

impl AsRef<[u8]> for Value {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Provider-assigned identity of a record, unique within one store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(pub u64);

/// One persisted `(key, version, value)` unit.
///
/// Several records may share a key; they are causally concurrent siblings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub id: RecordId,
    pub key: Key,
    pub versioned: Versioned,
}

impl Record {
    /// Creates a new record.
    pub fn new(id: RecordId, key: Key, versioned: Versioned) -> Self {
        Self { id, key, versioned }
    }

    /// Converts into the `(key, versioned)` pair exposed to callers.
    pub fn into_pair(self) -> (Key, Versioned) {
        (self.key, self.versioned)
    }
}

/// Records of a single key, returned by one provider lookup.
///
/// A cursor counts as open from creation until [`RecordCursor::close`] is
/// called or it goes out of scope. Providers use the shared counter to
/// report cursors that are still open when the session shuts down.
#[derive(Debug)]
pub struct RecordCursor {
    records: Vec<Record>,
    tracker: Arc<AtomicUsize>,
}

impl RecordCursor {
    /// Creates a cursor registered with `tracker`.
    pub fn tracked(records: Vec<Record>, tracker: Arc<AtomicUsize>) -> Self {
        tracker.fetch_add(1, Ordering::AcqRel);
        Self { records, tracker }
    }

    /// Returns the records, ordered by record id.
    #[inline]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    /// Closes the cursor.
    pub fn close(self) {}
}

impl<'a> IntoIterator for &'a RecordCursor {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl Drop for RecordCursor {
    fn drop(&mut self) {
        self.tracker.fetch_sub(1, Ordering::AcqRel);
    }
}
