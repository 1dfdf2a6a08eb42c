// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Configuration for entry providers.

use super::StorageError;

/// Durability mode for commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DurabilityMode {
    /// Commits are synced to WAL but not fsynced to disk.
    /// Durable against process crashes but not power failures.
    #[default]
    WalOnly,
    /// Commits are fsynced to disk.
    /// Durable against power failures but slower.
    FsyncEveryWrite,
}

/// Options used when opening a provider session.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Sync behaviour of commits.
    pub durability: DurabilityMode,
    /// Create the database if the path holds none.
    pub create_if_missing: bool,
    /// Memtable size in bytes.
    pub write_buffer_size: usize,
    /// Number of memtables kept before stalling writes.
    pub max_write_buffer_number: i32,
    /// Bloom filter bits per key for point lookups.
    pub bloom_filter_bits: f64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            durability: DurabilityMode::default(),
            create_if_missing: true,
            write_buffer_size: 64 * 1024 * 1024, // 64MB
            max_write_buffer_number: 4,
            bloom_filter_bits: 10.0,
        }
    }
}

impl StoreConfig {
    /// Sets the durability mode.
    pub fn with_durability(mut self, durability: DurabilityMode) -> Self {
        self.durability = durability;
        self
    }

    /// Sets whether a missing database is created on open.
    pub fn with_create_if_missing(mut self, create: bool) -> Self {
        self.create_if_missing = create;
        self
    }

    /// Sets the memtable size.
    pub fn with_write_buffer_size(mut self, bytes: usize) -> Self {
        self.write_buffer_size = bytes;
        self
    }

    /// Sets the number of memtables.
    pub fn with_max_write_buffer_number(mut self, count: i32) -> Self {
        self.max_write_buffer_number = count;
        self
    }

    /// Sets bloom filter bits per key.
    pub fn with_bloom_filter_bits(mut self, bits: f64) -> Self {
        self.bloom_filter_bits = bits;
        self
    }

    /// Checks that all options are usable.
    pub fn validate(&self) -> Result<(), StorageError> {
        if self.write_buffer_size == 0 {
            return Err(StorageError::InvalidConfig(
                "write_buffer_size must be positive".to_string(),
            ));
        }
        if self.max_write_buffer_number < 1 {
            return Err(StorageError::InvalidConfig(format!(
                "max_write_buffer_number must be at least 1, got {}",
                self.max_write_buffer_number
            )));
        }
        if !self.bloom_filter_bits.is_finite() || self.bloom_filter_bits < 0.0 {
            return Err(StorageError::InvalidConfig(format!(
                "bloom_filter_bits must be a non-negative number, got {}",
                self.bloom_filter_bits
            )));
        }
        Ok(())
    }
}
