//! Bit-set wrapper class for `Flags` domains.
//!
//! A flag set is a 64-bit pattern where bit `i` stands for membership of the
//! i-th value of the owning domain's flag value set. Raw patterns can also be
//! wrapped directly from numeric or string input.

use std::fmt;

use serde::Serialize;

use super::Value;

/// A 64-bit flag set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FlagSet {
    bits: u64,
}

impl FlagSet {
    /// Wraps a raw bit pattern.
    pub fn new(bits: u64) -> Self {
        Self { bits }
    }

    /// Builds a flag set from member values, each of which must occur in
    /// `allowed`; the member's bit is its position in `allowed`.
    ///
    /// Returns `None` if any member is not in the allowed set or the set has
    /// more than 64 positions.
    pub fn from_members(members: &[Value], allowed: &[Value]) -> Option<Self> {
        if allowed.len() > 64 {
            return None;
        }
        let mut bits = 0u64;
        for member in members {
            let position = allowed.iter().position(|v| v == member)?;
            bits |= 1 << position;
        }
        Some(Self { bits })
    }

    /// Parses a raw bit pattern from decimal string input.
    pub fn parse(text: &str) -> Option<Self> {
        text.trim().parse::<u64>().ok().map(Self::new)
    }

    /// Returns the raw bit pattern.
    pub fn bits(&self) -> u64 {
        self.bits
    }

    /// Whether the bit at `position` is set.
    pub fn has(&self, position: u32) -> bool {
        position < 64 && self.bits & (1 << position) != 0
    }

    /// Union of two flag sets.
    pub fn union(&self, other: FlagSet) -> FlagSet {
        FlagSet::new(self.bits | other.bits)
    }
}

impl fmt::Display for FlagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0b{:b}", self.bits)
    }
}
