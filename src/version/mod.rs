// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Causal versioning with vector clocks.
//!
//! Every stored value carries a [`VectorClock`]: one counter per node that
//! wrote it. Two clocks stand in exactly one of four relations:
//!
//! - **Before**: every counter is `<=` the other's and at least one is `<`
//! - **After**: the mirror image of `Before`
//! - **Equal**: all counters match
//! - **Concurrent**: each side is ahead on some node
//!
//! Concurrent versions of a key are kept side by side as siblings until a
//! write that dominates all of them replaces them.
//!
//! # Example
//!
//! ```
//! use strontiumkv::version::{Occurred, VectorClock};
//!
//! let base = VectorClock::new().incremented(1, 0).unwrap();
//! let left = base.incremented(1, 0).unwrap();
//! let right = base.incremented(2, 0).unwrap();
//!
//! assert_eq!(base.compare(&left), Occurred::Before);
//! assert_eq!(left.compare(&right), Occurred::Concurrent);
//! assert_eq!(left.merge(&right).compare(&left), Occurred::After);
//! ```

mod clock;
mod error;
mod versioned;

pub use clock::{ClockEntry, Occurred, VectorClock, MAX_CLOCK_ENTRIES};
pub use error::VersionError;
pub use versioned::Versioned;
