// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! A single repeated section and its per-playback pass counter.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::score::SystemLocation;

/// One repeat region: a start bar, one or more end bars, and the
/// alternate endings branched to on each pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepeatedSection {
    /// Where each repeat jumps back to
    start: SystemLocation,
    /// End bar location -> total passes required by that bar
    end_bars: BTreeMap<SystemLocation, u32>,
    /// Pass number -> barline opening the ending for that pass
    alternate_endings: BTreeMap<u32, SystemLocation>,
    /// Pass currently being played (1-based)
    active_pass: u32,
}

impl RepeatedSection {
    /// Create a section starting at `start`
    pub fn new(start: SystemLocation) -> Self {
        Self {
            start,
            end_bars: BTreeMap::new(),
            alternate_endings: BTreeMap::new(),
            active_pass: 1,
        }
    }

    /// Start bar location
    pub fn start_location(&self) -> SystemLocation {
        self.start
    }

    /// Record an end bar. A second call for the same location replaces the
    /// earlier count.
    pub fn add_repeat_end_bar(&mut self, location: SystemLocation, repeat_count: u32) {
        self.end_bars.insert(location, repeat_count);
    }

    /// Record `branch` as the jump target for every pass in `numbers`
    pub fn add_alternate_ending(&mut self, numbers: &[u32], branch: SystemLocation) {
        for &number in numbers {
            self.alternate_endings.insert(number, branch);
        }
    }

    /// End bars in score order with their repeat counts
    pub fn end_bars(&self) -> &BTreeMap<SystemLocation, u32> {
        &self.end_bars
    }

    /// Last end bar, which bounds the section
    pub fn last_end_bar(&self) -> Option<SystemLocation> {
        self.end_bars.keys().next_back().copied()
    }

    /// Whether `location` is one of the end bars
    pub fn is_end_bar(&self, location: SystemLocation) -> bool {
        self.end_bars.contains_key(&location)
    }

    /// Jump target for a pass, if an ending was declared for it
    pub fn alternate_ending(&self, pass: u32) -> Option<SystemLocation> {
        self.alternate_endings.get(&pass).copied()
    }

    /// All ending targets by pass number
    pub fn alternate_endings(&self) -> &BTreeMap<u32, SystemLocation> {
        &self.alternate_endings
    }

    /// Number of distinct passes with an ending
    pub fn alternate_ending_count(&self) -> u32 {
        self.alternate_endings.len() as u32
    }

    /// Highest pass number with an ending (0 when there are none)
    pub fn highest_alternate_ending(&self) -> u32 {
        self.alternate_endings.keys().next_back().copied().unwrap_or(0)
    }

    /// Whether any alternate ending was recorded
    pub fn has_alternate_endings(&self) -> bool {
        !self.alternate_endings.is_empty()
    }

    /// Whether the ending placed last still leads into another pass, so the
    /// section needs an end bar after it
    pub fn final_ending_repeats(&self) -> bool {
        let Some(last) = self.alternate_endings.values().max() else {
            return false;
        };
        let total = self.total_passes();
        self.alternate_endings
            .iter()
            .any(|(pass, branch)| branch == last && *pass < total)
    }

    /// Number of times the section is played before falling through
    pub fn total_passes(&self) -> u32 {
        let by_end_bars = self.end_bars.values().copied().max().unwrap_or(0);
        self.alternate_ending_count().max(by_end_bars).max(1)
    }

    /// Pass currently being played
    pub fn active_pass(&self) -> u32 {
        self.active_pass
    }

    /// Start and last end bar, when the section has an end
    pub fn span(&self) -> Option<(SystemLocation, SystemLocation)> {
        self.last_end_bar().map(|end| (self.start, end))
    }

    /// Whether `location` lies within `[start, last end bar]`
    pub fn contains(&self, location: SystemLocation) -> bool {
        match self.span() {
            Some((start, end)) => start <= location && location <= end,
            None => false,
        }
    }

    /// Passes from 1 to `total_passes()` that have no ending while others do
    pub fn missing_passes(&self) -> Vec<u32> {
        if !self.has_alternate_endings() {
            return Vec::new();
        }
        (1..=self.total_passes())
            .filter(|pass| *pass > 1 && !self.alternate_endings.contains_key(pass))
            .collect()
    }

    /// Ending for the active pass when `location` opens the first ending.
    /// On the first pass that is `location` itself.
    pub fn first_ending_branch(&self, location: SystemLocation) -> Option<SystemLocation> {
        if self.alternate_ending(1) != Some(location) {
            return None;
        }
        self.alternate_ending(self.active_pass)
    }

    /// Decide where playback continues after crossing `location`.
    ///
    /// At the barline opening the first ending, later passes branch straight
    /// to their own ending. At an end bar, the section repeats while passes
    /// remain and becomes transparent afterwards.
    pub fn resolve(&mut self, location: SystemLocation) -> SystemLocation {
        if let Some(branch) = self.first_ending_branch(location) {
            return branch;
        }

        if !self.is_end_bar(location) {
            return location;
        }

        if self.active_pass < self.total_passes() {
            self.active_pass += 1;
            self.start
        } else {
            location
        }
    }

    /// Back to the first pass
    pub fn reset(&mut self) {
        self.active_pass = 1;
    }
}

impl PartialOrd for RepeatedSection {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RepeatedSection {
    fn cmp(&self, other: &Self) -> Ordering {
        self.start
            .cmp(&other.start)
            .then_with(|| self.end_bars.cmp(&other.end_bars))
            .then_with(|| self.alternate_endings.cmp(&other.alternate_endings))
            .then_with(|| self.active_pass.cmp(&other.active_pass))
    }
}
