// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! A value tagged with the vector clock it was written at.

use crate::storage::Value;

use super::VectorClock;

/// A value together with its version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versioned {
    version: VectorClock,
    value: Value,
}

impl Versioned {
    /// Creates a versioned value.
    pub fn new(value: Value, version: VectorClock) -> Self {
        Self { version, value }
    }

    /// Wraps a value with an empty clock.
    pub fn unversioned(value: Value) -> Self {
        Self::new(value, VectorClock::new())
    }

    #[inline]
    pub fn version(&self) -> &VectorClock {
        &self.version
    }

    #[inline]
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Splits into `(version, value)`.
    pub fn into_parts(self) -> (VectorClock, Value) {
        (self.version, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unversioned_has_empty_clock() {
        let v = Versioned::unversioned(Value::from("cdef"));
        assert!(v.version().is_empty());
        assert_eq!(v.value().as_bytes(), b"cdef");
    }

    #[test]
    fn test_into_parts() {
        let clock = VectorClock::new().incremented(2, 9).unwrap();
        let (version, value) = Versioned::new(Value::from("x"), clock.clone()).into_parts();
        assert_eq!(version, clock);
        assert_eq!(value, Value::from("x"));
    }
}
