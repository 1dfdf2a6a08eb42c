// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! StrontiumKV: a versioned key-value storage engine with vector-clock conflict resolution
//!
//! This crate provides a local storage engine for an eventually consistent,
//! replicated key-value store. Every value carries a vector clock; writes that
//! are causally older than what is stored are rejected, and concurrent writes
//! are kept side by side for the caller to reconcile.

pub mod engine;
pub mod storage;
pub mod version;

pub use engine::{
    Capability, ClosableIter, EntryIterator, KeyIterator, RocksVersionedStore, StoreError,
    VersionedStore,
};
pub use storage::{
    DurabilityMode, EntryProvider, Key, Record, RocksEntryProvider, StorageError, StoreConfig,
    Value,
};
pub use version::{ClockEntry, Occurred, VectorClock, VersionError, Versioned};
