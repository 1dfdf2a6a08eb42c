// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Entry providers: the persistence layer under the versioned store.
//!
//! An [`EntryProvider`] is a session against an embedded store. It holds
//! [`Record`]s, each a `(key, vector clock, value)` unit with a
//! provider-assigned [`RecordId`], and knows nothing about version ordering;
//! conflict resolution happens one layer up in [`crate::engine`].
//!
//! # Key Concepts
//!
//! - **Siblings**: any number of records may share a key.
//! - **Unit of work**: `insert`, `delete` and `truncate` are staged and
//!   applied atomically by `commit`, or dropped by `rollback`.
//! - **Cursors**: key lookups hand out a [`RecordCursor`], which counts as
//!   open until it is closed or goes out of scope.
//!
//! # Example
//!
//! ```no_run
//! use strontiumkv::storage::{EntryProvider, Key, RocksEntryProvider, StoreConfig, Value};
//! use strontiumkv::version::Versioned;
//! use std::path::Path;
//!
//! let provider = RocksEntryProvider::open(Path::new("/tmp/entries"), &StoreConfig::default()).unwrap();
//!
//! provider.insert(&Key::from("key"), &Versioned::unversioned(Value::from("value"))).unwrap();
//! provider.commit().unwrap();
//!
//! let cursor = provider.query_key(&Key::from("key")).unwrap();
//! for record in &cursor {
//!     println!("{:?} -> {:?}", record.id, record.versioned);
//! }
//! cursor.close();
//! provider.close().unwrap();
//! ```

mod codec;
mod config;
mod error;
mod key;
mod provider;
mod record;
mod rocks;

pub use codec::{decode_versioned, encode_versioned, RECORD_FORMAT_V1};
pub use config::{DurabilityMode, StoreConfig};
pub use error::StorageError;
pub use key::{decode_record_key, encode_record_key, extract_user_key, user_key_prefix};
pub use provider::EntryProvider;
pub use record::{Key, Record, RecordCursor, RecordId, Value, MAX_KEY_SIZE, MAX_VALUE_SIZE};
pub use rocks::RocksEntryProvider;
