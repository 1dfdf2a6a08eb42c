// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Record value encoding.
//!
//! Format:
//! `[format:u8][entry_count:u16 BE]([node_id:u16 BE][counter:u64 BE])*[timestamp:u64 BE][payload]`

use crate::version::{ClockEntry, VectorClock, Versioned};

use super::{StorageError, Value};

/// Current record value format.
pub const RECORD_FORMAT_V1: u8 = 1;

const HEADER_LEN: usize = 1 + 2;
const ENTRY_LEN: usize = 2 + 8;
const TIMESTAMP_LEN: usize = 8;

/// Encodes a versioned value for storage.
pub fn encode_versioned(versioned: &Versioned) -> Vec<u8> {
    let clock = versioned.version();
    let payload = versioned.value().as_bytes();
    let mut encoded =
        Vec::with_capacity(HEADER_LEN + clock.entries().len() * ENTRY_LEN + TIMESTAMP_LEN + payload.len());

    encoded.push(RECORD_FORMAT_V1);
    // MAX_CLOCK_ENTRIES fits in a u16
    encoded.extend_from_slice(&(clock.entries().len() as u16).to_be_bytes());
    for entry in clock.entries() {
        encoded.extend_from_slice(&entry.node_id().to_be_bytes());
        encoded.extend_from_slice(&entry.counter().to_be_bytes());
    }
    encoded.extend_from_slice(&clock.timestamp().to_be_bytes());
    encoded.extend_from_slice(payload);

    encoded
}

/// Decodes a stored value back into a versioned value.
pub fn decode_versioned(encoded: &[u8]) -> Result<Versioned, StorageError> {
    if encoded.len() < HEADER_LEN {
        return Err(StorageError::Corruption(format!(
            "record value too short: {} bytes",
            encoded.len()
        )));
    }
    if encoded[0] != RECORD_FORMAT_V1 {
        return Err(StorageError::Corruption(format!(
            "unknown record format {}",
            encoded[0]
        )));
    }

    let count = u16::from_be_bytes([encoded[1], encoded[2]]) as usize;
    let payload_offset = HEADER_LEN + count * ENTRY_LEN + TIMESTAMP_LEN;
    if encoded.len() < payload_offset {
        return Err(StorageError::Corruption(format!(
            "record value truncated: {} clock entries need {} bytes, got {}",
            count,
            payload_offset,
            encoded.len()
        )));
    }

    let entries = encoded[HEADER_LEN..HEADER_LEN + count * ENTRY_LEN]
        .chunks_exact(ENTRY_LEN)
        .map(|chunk| {
            let node_id = u16::from_be_bytes([chunk[0], chunk[1]]);
            let mut counter = [0u8; 8];
            counter.copy_from_slice(&chunk[2..]);
            ClockEntry::new(node_id, u64::from_be_bytes(counter))
        });

    let ts_offset = HEADER_LEN + count * ENTRY_LEN;
    let mut timestamp = [0u8; TIMESTAMP_LEN];
    timestamp.copy_from_slice(&encoded[ts_offset..payload_offset]);

    let clock = VectorClock::from_entries(entries, u64::from_be_bytes(timestamp))
        .map_err(|e| StorageError::Corruption(format!("invalid stored clock: {}", e)))?;

    Ok(Versioned::new(Value::from(&encoded[payload_offset..]), clock))
}
