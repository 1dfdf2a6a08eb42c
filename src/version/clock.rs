// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Vector clock with a causal partial order.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use super::error::VersionError;

/// Maximum number of node entries a clock may carry.
pub const MAX_CLOCK_ENTRIES: usize = i16::MAX as usize;

/// Causal relation between two versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Occurred {
    /// The first version happened strictly before the second.
    Before,
    /// The first version happened strictly after the second.
    After,
    /// Both versions carry identical counters.
    Equal,
    /// Neither version dominates the other.
    Concurrent,
}

/// A single `(node, counter)` pair of a vector clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClockEntry {
    node_id: u16,
    counter: u64,
}

impl ClockEntry {
    /// Creates a new entry.
    #[inline]
    pub fn new(node_id: u16, counter: u64) -> Self {
        Self { node_id, counter }
    }

    /// Returns the node identifier.
    #[inline]
    pub fn node_id(&self) -> u16 {
        self.node_id
    }

    /// Returns the counter for the node.
    #[inline]
    pub fn counter(&self) -> u64 {
        self.counter
    }
}

/// A vector clock: one monotonically increasing counter per node.
///
/// Entries are kept sorted by node id and never hold a zero counter, so a
/// node that is absent counts as zero. The timestamp (milliseconds since the
/// Unix epoch) is informational only and takes no part in comparison,
/// equality or hashing.
#[derive(Debug, Clone, Default)]
pub struct VectorClock {
    entries: Vec<ClockEntry>,
    timestamp: u64,
}

impl VectorClock {
    /// Creates an empty clock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a clock from arbitrary entries.
    ///
    /// Entries are sorted by node id and zero counters are dropped.
    pub fn from_entries(
        entries: impl IntoIterator<Item = ClockEntry>,
        timestamp: u64,
    ) -> Result<Self, VersionError> {
        let mut entries: Vec<ClockEntry> = entries.into_iter().filter(|e| e.counter > 0).collect();
        entries.sort_by_key(|e| e.node_id);

        if let Some(pair) = entries.windows(2).find(|w| w[0].node_id == w[1].node_id) {
            return Err(VersionError::DuplicateNode(pair[0].node_id));
        }
        if entries.len() > MAX_CLOCK_ENTRIES {
            return Err(VersionError::TooManyEntries {
                count: entries.len(),
                max: MAX_CLOCK_ENTRIES,
            });
        }

        Ok(Self { entries, timestamp })
    }

    /// Returns the entries, sorted by node id.
    #[inline]
    pub fn entries(&self) -> &[ClockEntry] {
        &self.entries
    }

    /// Returns the timestamp recorded with the last increment.
    #[inline]
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Returns true if no node has ever incremented this clock.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the counter of `node_id`, zero if absent.
    pub fn counter_of(&self, node_id: u16) -> u64 {
        self.entries
            .binary_search_by_key(&node_id, |e| e.node_id)
            .map(|i| self.entries[i].counter)
            .unwrap_or(0)
    }

    /// Increments the counter of `node_id` and records `timestamp`.
    pub fn increment(&mut self, node_id: u16, timestamp: u64) -> Result<(), VersionError> {
        match self.entries.binary_search_by_key(&node_id, |e| e.node_id) {
            Ok(i) => {
                let entry = &mut self.entries[i];
                entry.counter = entry
                    .counter
                    .checked_add(1)
                    .ok_or(VersionError::CounterOverflow(node_id))?;
            }
            Err(i) => {
                if self.entries.len() >= MAX_CLOCK_ENTRIES {
                    return Err(VersionError::TooManyEntries {
                        count: self.entries.len() + 1,
                        max: MAX_CLOCK_ENTRIES,
                    });
                }
                self.entries.insert(i, ClockEntry::new(node_id, 1));
            }
        }
        self.timestamp = timestamp;
        Ok(())
    }

    /// Returns a copy of this clock incremented for `node_id`.
    pub fn incremented(&self, node_id: u16, timestamp: u64) -> Result<Self, VersionError> {
        let mut clock = self.clone();
        clock.increment(node_id, timestamp)?;
        Ok(clock)
    }

    /// Returns the per-node maximum of both clocks.
    ///
    /// The result dominates or equals both inputs and carries the later
    /// timestamp.
    pub fn merge(&self, other: &VectorClock) -> VectorClock {
        let mut merged = Vec::with_capacity(self.entries.len().max(other.entries.len()));
        let (mut i, mut j) = (0, 0);

        while i < self.entries.len() && j < other.entries.len() {
            let (a, b) = (self.entries[i], other.entries[j]);
            match a.node_id.cmp(&b.node_id) {
                Ordering::Less => {
                    merged.push(a);
                    i += 1;
                }
                Ordering::Greater => {
                    merged.push(b);
                    j += 1;
                }
                Ordering::Equal => {
                    merged.push(ClockEntry::new(a.node_id, a.counter.max(b.counter)));
                    i += 1;
                    j += 1;
                }
            }
        }
        merged.extend_from_slice(&self.entries[i..]);
        merged.extend_from_slice(&other.entries[j..]);

        VectorClock {
            entries: merged,
            timestamp: self.timestamp.max(other.timestamp),
        }
    }

    /// Compares this clock against `other`.
    ///
    /// `Before` means this clock happened strictly before `other`.
    pub fn compare(&self, other: &VectorClock) -> Occurred {
        let mut self_bigger = false;
        let mut other_bigger = false;
        let (mut i, mut j) = (0, 0);

        while i < self.entries.len() && j < other.entries.len() {
            let (a, b) = (self.entries[i], other.entries[j]);
            match a.node_id.cmp(&b.node_id) {
                Ordering::Less => {
                    self_bigger = true;
                    i += 1;
                }
                Ordering::Greater => {
                    other_bigger = true;
                    j += 1;
                }
                Ordering::Equal => {
                    match a.counter.cmp(&b.counter) {
                        Ordering::Greater => self_bigger = true,
                        Ordering::Less => other_bigger = true,
                        Ordering::Equal => {}
                    }
                    i += 1;
                    j += 1;
                }
            }
        }
        if i < self.entries.len() {
            self_bigger = true;
        }
        if j < other.entries.len() {
            other_bigger = true;
        }

        match (self_bigger, other_bigger) {
            (false, false) => Occurred::Equal,
            (true, false) => Occurred::After,
            (false, true) => Occurred::Before,
            (true, true) => Occurred::Concurrent,
        }
    }
}

impl PartialEq for VectorClock {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Eq for VectorClock {}

impl Hash for VectorClock {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.entries.hash(state);
    }
}

impl PartialOrd for VectorClock {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match self.compare(other) {
            Occurred::Before => Some(Ordering::Less),
            Occurred::After => Some(Ordering::Greater),
            Occurred::Equal => Some(Ordering::Equal),
            Occurred::Concurrent => None,
        }
    }
}

impl std::fmt::Display for VectorClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "version(")?;
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}:{}", entry.node_id, entry.counter)?;
        }
        write!(f, ") ts:{}", self.timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock(entries: &[(u16, u64)]) -> VectorClock {
        VectorClock::from_entries(entries.iter().map(|&(n, c)| ClockEntry::new(n, c)), 0).unwrap()
    }

    #[test]
    fn test_empty_clocks_are_equal() {
        assert_eq!(VectorClock::new().compare(&VectorClock::new()), Occurred::Equal);
    }

    #[test]
    fn test_compare_before_after() {
        let v1 = clock(&[(1, 1)]);
        let v2 = clock(&[(1, 2)]);
        assert_eq!(v1.compare(&v2), Occurred::Before);
        assert_eq!(v2.compare(&v1), Occurred::After);

        // Extra node on one side dominates
        let v3 = clock(&[(1, 1), (2, 1)]);
        assert_eq!(v1.compare(&v3), Occurred::Before);
        assert_eq!(v3.compare(&v1), Occurred::After);
    }

    #[test]
    fn test_compare_concurrent() {
        let a = clock(&[(1, 2), (2, 1)]);
        let b = clock(&[(1, 1), (2, 2)]);
        assert_eq!(a.compare(&b), Occurred::Concurrent);
        assert_eq!(b.compare(&a), Occurred::Concurrent);

        let c = clock(&[(1, 1)]);
        let d = clock(&[(2, 1)]);
        assert_eq!(c.compare(&d), Occurred::Concurrent);
        assert_eq!(c.partial_cmp(&d), None);
    }

    #[test]
    fn test_zero_counters_dropped() {
        let a = clock(&[(1, 0), (2, 3)]);
        let b = clock(&[(2, 3)]);
        assert_eq!(a, b);
        assert_eq!(a.compare(&b), Occurred::Equal);
    }

    #[test]
    fn test_equality_ignores_timestamp() {
        let a = VectorClock::new().incremented(1, 100).unwrap();
        let b = VectorClock::new().incremented(1, 200).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.timestamp(), 100);
        assert_eq!(b.timestamp(), 200);
    }

    #[test]
    fn test_increment() {
        let mut v = VectorClock::new();
        v.increment(3, 10).unwrap();
        v.increment(1, 11).unwrap();
        v.increment(3, 12).unwrap();

        assert_eq!(v.counter_of(1), 1);
        assert_eq!(v.counter_of(3), 2);
        assert_eq!(v.counter_of(7), 0);
        assert_eq!(v.timestamp(), 12);
        let nodes: Vec<u16> = v.entries().iter().map(|e| e.node_id()).collect();
        assert_eq!(nodes, vec![1, 3]);
    }

    #[test]
    fn test_increment_overflow() {
        let mut v = clock(&[(1, u64::MAX)]);
        assert!(matches!(v.increment(1, 0), Err(VersionError::CounterOverflow(1))));
        assert_eq!(v.counter_of(1), u64::MAX);
    }

    #[test]
    fn test_duplicate_node_rejected() {
        let result = VectorClock::from_entries([ClockEntry::new(4, 1), ClockEntry::new(4, 2)], 0);
        assert!(matches!(result, Err(VersionError::DuplicateNode(4))));
    }

    #[test]
    fn test_merge() {
        let a = VectorClock::from_entries([ClockEntry::new(1, 3), ClockEntry::new(2, 1)], 5).unwrap();
        let b = VectorClock::from_entries([ClockEntry::new(2, 4), ClockEntry::new(9, 1)], 7).unwrap();
        let m = a.merge(&b);

        assert_eq!(m, clock(&[(1, 3), (2, 4), (9, 1)]));
        assert_eq!(m.timestamp(), 7);
        assert_eq!(a.compare(&m), Occurred::Before);
        assert_eq!(b.compare(&m), Occurred::Before);
    }

    #[test]
    fn test_display() {
        let v = VectorClock::from_entries([ClockEntry::new(1, 2), ClockEntry::new(5, 1)], 42).unwrap();
        assert_eq!(v.to_string(), "version(1:2, 5:1) ts:42");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn arb_clock() -> impl Strategy<Value = VectorClock> {
        prop::collection::btree_map(0u16..8, 1u64..5, 0..6).prop_map(|m| {
            VectorClock::from_entries(m.into_iter().map(|(n, c)| ClockEntry::new(n, c)), 0).unwrap()
        })
    }

    proptest! {
        #[test]
        fn compare_is_antisymmetric(a in arb_clock(), b in arb_clock()) {
            let expected = match a.compare(&b) {
                Occurred::Before => Occurred::After,
                Occurred::After => Occurred::Before,
                other => other,
            };
            prop_assert_eq!(b.compare(&a), expected);
        }

        #[test]
        fn increment_dominates(a in arb_clock(), node in 0u16..8) {
            let next = a.incremented(node, 1).unwrap();
            prop_assert_eq!(a.compare(&next), Occurred::Before);
        }

        #[test]
        fn merge_dominates_both(a in arb_clock(), b in arb_clock()) {
            let m = a.merge(&b);
            prop_assert!(matches!(a.compare(&m), Occurred::Before | Occurred::Equal));
            prop_assert!(matches!(b.compare(&m), Occurred::Before | Occurred::Equal));
        }
    }
}
