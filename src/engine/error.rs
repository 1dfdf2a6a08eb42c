// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Versioned store error types.

use crate::storage::{Key, StorageError};
use crate::version::VectorClock;

use super::Capability;

/// Errors that can occur in versioned store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("key {key:?} {version} is obsolete, it is no greater than the current version of {current}")]
    ObsoleteVersion {
        key: Key,
        version: VectorClock,
        current: VectorClock,
    },

    #[error("persistence failure: {0}")]
    Persistence(#[from] StorageError),

    #[error("failed to initialize store {store}: {source}")]
    StorageInitialization {
        store: String,
        #[source]
        source: StorageError,
    },

    #[error("call to next() on a closed iterator")]
    UseAfterClose,

    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),

    #[error("no capability {capability:?} for store {store}")]
    NoSuchCapability { capability: Capability, store: String },

    #[error("store {store} is already truncating, cannot start another one")]
    ConcurrentTruncation { store: String },

    #[error("store {store} is truncating and cannot serve any request")]
    Truncating { store: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
