// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Record key encoding and decoding.
//!
//! Encodes user keys with a record id for RocksDB storage.
//! Format: `[key_len:u32 BE][key bytes][record_id:u64 BE]`
//!
//! Big-endian length and id keep every record of a user key contiguous and
//! ordered by id under RocksDB's default byte-order comparator.

use super::{Key, RecordId, StorageError};

/// Inclusive lower bound of the record keyspace.
pub const KEYSPACE_START: [u8; 4] = [0x00; 4];

/// Exclusive upper bound of the record keyspace.
///
/// No key can reach it because keys are far shorter than `u32::MAX` bytes.
pub const KEYSPACE_END: [u8; 4] = [0xff; 4];

const ID_LEN: usize = 8;

/// Encodes a user key and record id into a RocksDB key.
#[inline]
pub fn encode_record_key(key: &Key, id: RecordId) -> Vec<u8> {
    let key_bytes = key.as_bytes();
    let mut encoded = Vec::with_capacity(4 + key_bytes.len() + ID_LEN);

    encoded.extend_from_slice(&(key_bytes.len() as u32).to_be_bytes());
    encoded.extend_from_slice(key_bytes);
    encoded.extend_from_slice(&id.0.to_be_bytes());

    encoded
}

/// Decodes a RocksDB key back into user key and record id.
pub fn decode_record_key(encoded: &[u8]) -> Result<(Key, RecordId), StorageError> {
    let user_key = extract_user_key(encoded)?;

    let expected_len = 4 + user_key.len() + ID_LEN;
    if encoded.len() != expected_len {
        return Err(StorageError::InvalidKeyEncoding(format!(
            "expected {} bytes, got {}",
            expected_len,
            encoded.len()
        )));
    }

    let mut id_bytes = [0u8; ID_LEN];
    id_bytes.copy_from_slice(&encoded[4 + user_key.len()..]);

    Ok((Key::from(user_key), RecordId(u64::from_be_bytes(id_bytes))))
}

/// Returns the prefix shared by all records of a user key.
#[inline]
pub fn user_key_prefix(key: &Key) -> Vec<u8> {
    let key_bytes = key.as_bytes();
    let mut prefix = Vec::with_capacity(4 + key_bytes.len());
    prefix.extend_from_slice(&(key_bytes.len() as u32).to_be_bytes());
    prefix.extend_from_slice(key_bytes);
    prefix
}

/// Extracts the user key from an encoded record key without full decoding.
#[inline]
pub fn extract_user_key(encoded: &[u8]) -> Result<&[u8], StorageError> {
    if encoded.len() < 4 {
        return Err(StorageError::InvalidKeyEncoding(
            "key too short for length prefix".to_string(),
        ));
    }

    let key_len = u32::from_be_bytes([encoded[0], encoded[1], encoded[2], encoded[3]]) as usize;

    if encoded.len() < 4 + key_len {
        return Err(StorageError::InvalidKeyEncoding(
            "key too short for user key".to_string(),
        ));
    }

    Ok(&encoded[4..4 + key_len])
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn record_key_roundtrip(
            key_bytes in prop::collection::vec(any::<u8>(), 0..100),
            id in any::<u64>(),
        ) {
            let key = Key::new(key_bytes);
            let encoded = encode_record_key(&key, RecordId(id));
            let (decoded_key, decoded_id) = decode_record_key(&encoded).unwrap();

            prop_assert_eq!(key, decoded_key);
            prop_assert_eq!(RecordId(id), decoded_id);
        }

        #[test]
        fn id_order_is_preserved(
            key_bytes in prop::collection::vec(any::<u8>(), 1..50),
            a in any::<u64>(),
            b in any::<u64>(),
        ) {
            let key = Key::new(key_bytes);
            let ea = encode_record_key(&key, RecordId(a));
            let eb = encode_record_key(&key, RecordId(b));
            prop_assert_eq!(a.cmp(&b), ea.cmp(&eb));
        }
    }
}
