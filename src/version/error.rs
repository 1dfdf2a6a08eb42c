// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Version error types.

/// Errors that can occur when building or advancing a vector clock.
#[derive(Debug, thiserror::Error)]
pub enum VersionError {
    #[error("counter overflow for node {0}")]
    CounterOverflow(u16),

    #[error("too many clock entries: {count} > {max}")]
    TooManyEntries { count: usize, max: usize },

    #[error("duplicate clock entry for node {0}")]
    DuplicateNode(u16),
}
