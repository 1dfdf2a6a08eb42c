// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Closable snapshot iterators over store contents.

use crate::storage::Key;
use crate::version::Versioned;

use super::error::StoreError;

/// Iterator over every `(key, versioned value)` pair of a store.
pub type EntryIterator = ClosableIter<(Key, Versioned)>;

/// Iterator over every key of a store that has at least one value.
pub type KeyIterator = ClosableIter<Key>;

/// A single-pass iterator over a snapshot taken at construction.
///
/// Writes made after construction are not observed, and cannot disturb an
/// iteration in progress. Once [`close`](Self::close) is called the
/// remaining snapshot is released and no further element is handed out.
#[derive(Debug)]
pub struct ClosableIter<T> {
    items: std::vec::IntoIter<T>,
    open: bool,
}

impl<T> ClosableIter<T> {
    /// Wraps a materialized snapshot.
    pub(crate) fn new(items: Vec<T>) -> Self {
        Self {
            items: items.into_iter(),
            open: true,
        }
    }

    /// Returns true if unread elements remain.
    #[inline]
    pub fn has_next(&self) -> bool {
        !self.items.as_slice().is_empty()
    }

    /// Returns the next element, `None` once exhausted.
    ///
    /// Fails with [`StoreError::UseAfterClose`] after `close`.
    pub fn try_next(&mut self) -> Result<Option<T>, StoreError> {
        if !self.open {
            return Err(StoreError::UseAfterClose);
        }
        Ok(self.items.next())
    }

    /// Removal through the iterator is never supported.
    pub fn remove(&mut self) -> Result<(), StoreError> {
        Err(StoreError::Unsupported("removal through a store iterator"))
    }

    /// Closes the iterator. Idempotent.
    pub fn close(&mut self) {
        if self.open {
            self.open = false;
            self.items = Vec::new().into_iter();
        }
    }

    /// Returns true until `close` is called.
    #[inline]
    pub fn is_open(&self) -> bool {
        self.open
    }
}

impl<T> Iterator for ClosableIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if !self.open {
            return None;
        }
        self.items.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.items.size_hint()
    }
}
