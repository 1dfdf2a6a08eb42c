// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! The versioned store.
//!
//! [`VersionedStore`] maps keys to sets of versioned values and resolves each
//! write against the vector clocks already stored for its key:
//!
//! | New write vs. stored version | Outcome                               |
//! |------------------------------|---------------------------------------|
//! | Before                       | write rejected, nothing changes       |
//! | After                        | stored version removed                |
//! | Equal / Concurrent           | both kept as siblings                 |
//!
//! Reads return every sibling; reconciling them is up to the caller, who
//! writes back a version that dominates all of them.
//!
//! # Example
//!
//! ```no_run
//! use strontiumkv::engine::RocksVersionedStore;
//! use strontiumkv::storage::{Key, StoreConfig, Value};
//! use strontiumkv::version::{VectorClock, Versioned};
//!
//! let store = RocksVersionedStore::open("/tmp/store", StoreConfig::default()).unwrap();
//! let key = Key::from("user:1");
//!
//! let clock = VectorClock::new().incremented(1, 0).unwrap();
//! store.put(&key, Versioned::new(Value::from("alice"), clock.clone())).unwrap();
//!
//! let values = store.get(&key).unwrap();
//! assert_eq!(values.len(), 1);
//!
//! store.delete(&key, &clock.incremented(1, 0).unwrap()).unwrap();
//! store.close().unwrap();
//! ```

mod error;
mod iter;
mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use error::StoreError;
pub use iter::{ClosableIter, EntryIterator, KeyIterator};
pub use store::{Capability, RocksVersionedStore, VersionedStore};
