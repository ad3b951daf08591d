// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Read-only score model consumed by the repeat indexer.
//!
//! This module provides:
//! - Locations: ordered (system, position) coordinates
//! - Barlines and alternate endings
//! - `ScoreView`: the narrow query surface the indexer scans
//! - `Score`: an in-memory implementation of that surface

pub mod location;

pub use location::SystemLocation;

use thiserror::Error;

/// Default number of passes for a repeat end without an explicit count
pub const DEFAULT_REPEAT_COUNT: u32 = 2;

/// Kind of barline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BarlineKind {
    /// Ordinary bar separator
    #[default]
    Plain,
    /// Opens a repeated section
    RepeatStart,
    /// Closes a repeated section; the count is the total number of passes
    RepeatEnd { repeat_count: u32 },
}

/// A barline within a system
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Barline {
    position: u32,
    kind: BarlineKind,
}

impl Barline {
    /// Create a barline of the given kind
    pub fn new(position: u32, kind: BarlineKind) -> Self {
        Self { position, kind }
    }

    /// Plain barline
    pub fn plain(position: u32) -> Self {
        Self::new(position, BarlineKind::Plain)
    }

    /// Repeat start barline
    pub fn repeat_start(position: u32) -> Self {
        Self::new(position, BarlineKind::RepeatStart)
    }

    /// Repeat end barline with an explicit pass count
    pub fn repeat_end(position: u32, repeat_count: u32) -> Self {
        Self::new(position, BarlineKind::RepeatEnd { repeat_count })
    }

    /// Position within the system
    pub fn position(&self) -> u32 {
        self.position
    }

    /// Barline kind
    pub fn kind(&self) -> BarlineKind {
        self.kind
    }

    /// Repeat count if this is a repeat end
    pub fn repeat_count(&self) -> Option<u32> {
        match self.kind {
            BarlineKind::RepeatEnd { repeat_count } => Some(repeat_count),
            _ => None,
        }
    }
}

/// An alternate ending ("volta") directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlternateEnding {
    position: u32,
    numbers: Vec<u32>,
}

impl AlternateEnding {
    /// Create an ending active for the given passes. Numbers are sorted and
    /// deduplicated.
    pub fn new(position: u32, numbers: impl IntoIterator<Item = u32>) -> Self {
        let mut numbers: Vec<u32> = numbers.into_iter().collect();
        numbers.sort_unstable();
        numbers.dedup();
        Self { position, numbers }
    }

    /// Position within the system
    pub fn position(&self) -> u32 {
        self.position
    }

    /// Pass numbers this ending is played on (ascending)
    pub fn numbers(&self) -> &[u32] {
        &self.numbers
    }
}

/// One line of the score
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct System {
    barlines: Vec<Barline>,
    alternate_endings: Vec<AlternateEnding>,
}

impl System {
    /// Create an empty system
    pub fn new() -> Self {
        Self::default()
    }

    /// Barlines in position order
    pub fn barlines(&self) -> &[Barline] {
        &self.barlines
    }

    /// Alternate endings in position order
    pub fn alternate_endings(&self) -> &[AlternateEnding] {
        &self.alternate_endings
    }

    /// Add a barline, keeping position order
    pub fn add_barline(&mut self, barline: Barline) {
        let index = self
            .barlines
            .partition_point(|b| b.position() <= barline.position());
        self.barlines.insert(index, barline);
    }

    /// Add an alternate ending, keeping position order
    pub fn add_alternate_ending(&mut self, ending: AlternateEnding) {
        let index = self
            .alternate_endings
            .partition_point(|e| e.position() <= ending.position());
        self.alternate_endings.insert(index, ending);
    }

    /// First barline strictly after `position`
    pub fn next_barline(&self, position: u32) -> Option<&Barline> {
        self.barlines.iter().find(|b| b.position() > position)
    }

    /// Endings positioned within `[first, last]`
    pub fn alternate_endings_in_range(&self, first: u32, last: u32) -> Vec<&AlternateEnding> {
        self.alternate_endings
            .iter()
            .filter(|e| e.position() >= first && e.position() <= last)
            .collect()
    }

    /// Builder: add barline
    pub fn with_barline(mut self, barline: Barline) -> Self {
        self.add_barline(barline);
        self
    }

    /// Builder: add alternate ending
    pub fn with_ending(mut self, ending: AlternateEnding) -> Self {
        self.add_alternate_ending(ending);
        self
    }
}

/// Read-only queries the repeat indexer needs from a score.
///
/// Barlines of a system are returned in position order. A bar is the span
/// between two consecutive barlines of the same system.
pub trait ScoreView {
    /// Number of systems
    fn system_count(&self) -> usize;

    /// Barlines of a system; empty for an out-of-range index
    fn barlines(&self, system: usize) -> &[Barline];

    /// Alternate endings of a system positioned within `[first, last]`
    fn alternate_endings_in_range(&self, system: usize, first: u32, last: u32)
        -> Vec<&AlternateEnding>;

    /// First barline strictly after `position` in the same system
    fn next_barline(&self, system: usize, position: u32) -> Option<&Barline> {
        self.barlines(system).iter().find(|b| b.position() > position)
    }

    /// Endings that begin inside the bar opened by barline `index`.
    ///
    /// The last barline of a system opens no bar.
    fn endings_in_bar(&self, system: usize, index: usize) -> Vec<&AlternateEnding> {
        let barlines = self.barlines(system);
        match (barlines.get(index), barlines.get(index + 1)) {
            (Some(bar), Some(next)) if next.position() > bar.position() => {
                self.alternate_endings_in_range(system, bar.position(), next.position() - 1)
            }
            _ => Vec::new(),
        }
    }

    /// Location of barline `index` in `system`
    fn barline_location(&self, system: usize, index: usize) -> Option<SystemLocation> {
        self.barlines(system)
            .get(index)
            .map(|b| SystemLocation::new(system, b.position()))
    }

    /// The barline that opens the bar played after crossing barline `index`:
    /// the barline itself, or the first barline of the next system when it
    /// closes its own system.
    fn opening_barline(&self, system: usize, index: usize) -> Option<(usize, usize)> {
        let count = self.barlines(system).len();
        if index + 1 < count {
            Some((system, index))
        } else {
            ((system + 1)..self.system_count())
                .find(|&s| !self.barlines(s).is_empty())
                .map(|s| (s, 0))
        }
    }

    /// Index of the barline at `location`, if there is one
    fn barline_index(&self, location: SystemLocation) -> Option<usize> {
        self.barlines(location.system)
            .binary_search_by_key(&location.position, |b| b.position())
            .ok()
    }
}

/// Errors found while validating a score document
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScoreError {
    #[error("System {system}: barline at position {position} is not after the previous barline")]
    BarlinesOutOfOrder { system: usize, position: u32 },

    #[error("Repeat end at {location} has repeat count {count}, expected at least 2")]
    InvalidRepeatCount { location: SystemLocation, count: u32 },

    #[error("Alternate ending at {location} has no pass numbers")]
    EmptyEnding { location: SystemLocation },

    #[error("Alternate ending at {location} uses pass number 0")]
    ZeroPassNumber { location: SystemLocation },
}

/// A complete score
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Score {
    title: String,
    systems: Vec<System>,
}

impl Score {
    /// Create an empty score
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            systems: Vec::new(),
        }
    }

    /// Score title
    pub fn title(&self) -> &str {
        &self.title
    }

    /// All systems
    pub fn systems(&self) -> &[System] {
        &self.systems
    }

    /// Append a system
    pub fn add_system(&mut self, system: System) {
        self.systems.push(system);
    }

    /// Builder: append system
    pub fn with_system(mut self, system: System) -> Self {
        self.systems.push(system);
        self
    }

    /// Total number of bars
    pub fn bar_count(&self) -> usize {
        self.systems
            .iter()
            .map(|s| s.barlines().len().saturating_sub(1))
            .sum()
    }

    /// Check the structural rules the indexer relies on
    pub fn validate(&self) -> Result<(), ScoreError> {
        for (index, system) in self.systems.iter().enumerate() {
            for pair in system.barlines().windows(2) {
                if pair[1].position() <= pair[0].position() {
                    return Err(ScoreError::BarlinesOutOfOrder {
                        system: index,
                        position: pair[1].position(),
                    });
                }
            }

            for barline in system.barlines() {
                if let Some(count) = barline.repeat_count() {
                    if count < DEFAULT_REPEAT_COUNT {
                        return Err(ScoreError::InvalidRepeatCount {
                            location: SystemLocation::new(index, barline.position()),
                            count,
                        });
                    }
                }
            }

            for ending in system.alternate_endings() {
                let location = SystemLocation::new(index, ending.position());
                if ending.numbers().is_empty() {
                    return Err(ScoreError::EmptyEnding { location });
                }
                if ending.numbers().contains(&0) {
                    return Err(ScoreError::ZeroPassNumber { location });
                }
            }
        }
        Ok(())
    }
}

impl ScoreView for Score {
    fn system_count(&self) -> usize {
        self.systems.len()
    }

    fn barlines(&self, system: usize) -> &[Barline] {
        self.systems.get(system).map(|s| s.barlines()).unwrap_or(&[])
    }

    fn alternate_endings_in_range(
        &self,
        system: usize,
        first: u32,
        last: u32,
    ) -> Vec<&AlternateEnding> {
        self.systems
            .get(system)
            .map(|s| s.alternate_endings_in_range(first, last))
            .unwrap_or_default()
    }
}
