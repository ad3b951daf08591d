// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Score coordinates.

use std::fmt;

/// A position in the score: which system, and the offset within it.
///
/// Ordered by system first, then by position, so a sorted collection of
/// locations follows reading order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SystemLocation {
    /// Index of the system (0-based)
    pub system: usize,
    /// Offset within the system
    pub position: u32,
}

impl SystemLocation {
    /// Create a new location
    pub const fn new(system: usize, position: u32) -> Self {
        Self { system, position }
    }

    /// The very first location of any score
    pub const fn origin() -> Self {
        Self::new(0, 0)
    }
}

impl fmt::Display for SystemLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.system + 1, self.position)
    }
}
