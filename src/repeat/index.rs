// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Repeat index construction and playback navigation.
//!
//! The index is built by one left-to-right scan over every barline with a
//! stack of open sections. The bottom of the stack starts as an implicit
//! section rooted at the first barline of the score, so a repeat end with
//! no start repeats from the top.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, trace, warn};

use crate::score::{BarlineKind, ScoreView, SystemLocation};

use super::classify::{classify_after, decide, takes_end_bar, takes_ending, Decision};
use super::diagnostics::RepeatDiagnostic;
use super::section::RepeatedSection;

/// All repeated sections of a score, keyed by start location
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepeatIndex {
    sections: BTreeMap<SystemLocation, RepeatedSection>,
    diagnostics: Vec<RepeatDiagnostic>,
}

impl RepeatIndex {
    /// Scan a score and index every repeated section.
    ///
    /// Malformed repeat structures never fail the build; they produce
    /// best-effort sections plus entries in `diagnostics()`.
    pub fn build<S: ScoreView + ?Sized>(score: &S) -> Self {
        let mut builder = IndexBuilder::new(score);
        builder.scan();
        builder.finish()
    }

    /// Number of committed sections
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Whether the score has no repeats
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Sections in start order
    pub fn sections(&self) -> impl Iterator<Item = &RepeatedSection> {
        self.sections.values()
    }

    /// Section starting at `start`
    pub fn get(&self, start: SystemLocation) -> Option<&RepeatedSection> {
        self.sections.get(&start)
    }

    /// Findings from construction
    pub fn diagnostics(&self) -> &[RepeatDiagnostic] {
        &self.diagnostics
    }

    /// Innermost section whose `[start, last end bar]` contains `location`.
    ///
    /// Walks backwards from the greatest start at or before `location`;
    /// since sections nest, the first one still open at `location` is the
    /// innermost.
    pub fn find_repeat(&self, location: SystemLocation) -> Option<&RepeatedSection> {
        self.sections
            .range(..=location)
            .rev()
            .map(|(_, section)| section)
            .find(|section| section.contains(location))
    }

    fn find_repeat_mut(&mut self, location: SystemLocation) -> Option<&mut RepeatedSection> {
        self.sections
            .range_mut(..=location)
            .rev()
            .map(|(_, section)| section)
            .find(|section| section.contains(location))
    }

    /// Where playback continues after crossing the barline at `location`.
    ///
    /// Returns `location` itself to keep going, or a branch target. Pass
    /// counters of the enclosing section advance as a side effect. Locations
    /// outside every section always pass through.
    pub fn advance(&mut self, location: SystemLocation) -> SystemLocation {
        let Some(section) = self.find_repeat_mut(location) else {
            return location;
        };

        let next = section.resolve(location);
        if next != location {
            debug!(
                from = %location,
                to = %next,
                pass = section.active_pass(),
                "Repeat branch"
            );
        }
        next
    }

    /// Where playback continues after jumping onto the barline at `location`.
    ///
    /// The jump has already settled any end bar here, so only the branch
    /// into the active pass's ending applies. Pass counters are left alone.
    pub fn enter(&self, location: SystemLocation) -> SystemLocation {
        self.find_repeat(location)
            .and_then(|section| section.first_ending_branch(location))
            .unwrap_or(location)
    }

    /// Reset every section to its first pass
    pub fn reset_all(&mut self) {
        for section in self.sections.values_mut() {
            section.reset();
        }
    }
}

/// An entry on the construction stack
#[derive(Debug)]
struct OpenSection {
    section: RepeatedSection,
    /// The section rooted at the top of the score rather than at a barline
    implicit: bool,
}

impl OpenSection {
    fn is_untouched(&self) -> bool {
        self.section.end_bars().is_empty() && !self.section.has_alternate_endings()
    }
}

/// Scan state for one construction pass
struct IndexBuilder<'a, S: ScoreView + ?Sized> {
    score: &'a S,
    stack: Vec<OpenSection>,
    sections: BTreeMap<SystemLocation, RepeatedSection>,
    diagnostics: Vec<RepeatDiagnostic>,
}

impl<'a, S: ScoreView + ?Sized> IndexBuilder<'a, S> {
    fn new(score: &'a S) -> Self {
        let top = (0..score.system_count())
            .find_map(|system| score.barline_location(system, 0))
            .unwrap_or_else(SystemLocation::origin);

        Self {
            score,
            stack: vec![OpenSection {
                section: RepeatedSection::new(top),
                implicit: true,
            }],
            sections: BTreeMap::new(),
            diagnostics: Vec::new(),
        }
    }

    fn scan(&mut self) {
        let score = self.score;
        for system in 0..score.system_count() {
            for (index, barline) in score.barlines(system).iter().enumerate() {
                let location = SystemLocation::new(system, barline.position());
                match barline.kind() {
                    BarlineKind::RepeatStart => self.open(location),
                    BarlineKind::RepeatEnd { repeat_count } => {
                        self.end_bar(system, index, location, repeat_count)
                    }
                    BarlineKind::Plain => {}
                }
                self.attach_endings(system, index, location);
            }
        }
    }

    fn open(&mut self, location: SystemLocation) {
        // An explicit start at the top of the score takes over the implicit one
        if let [root] = self.stack.as_slice() {
            if root.implicit && root.section.start_location() == location && root.is_untouched() {
                self.stack.clear();
            }
        }

        trace!(start = %location, depth = self.stack.len(), "Open repeated section");
        self.stack.push(OpenSection {
            section: RepeatedSection::new(location),
            implicit: false,
        });
    }

    fn end_bar(&mut self, system: usize, index: usize, location: SystemLocation, repeat_count: u32) {
        if self.stack.last().is_some_and(|top| !top.section.end_bars().is_empty()) {
            let following = classify_after(self.score, system, index);
            while self
                .stack
                .last()
                .is_some_and(|top| !takes_end_bar(&top.section, &following))
            {
                trace!(end = %location, ?following, "End bar closes a deferred section");
                self.close();
            }
        }

        let Some(top) = self.stack.last_mut() else {
            self.report(RepeatDiagnostic::UnmatchedRepeatEnd { location });
            return;
        };

        top.section.add_repeat_end_bar(location, repeat_count);

        let decision = if top.section.has_alternate_endings() {
            let boundary = classify_after(self.score, system, index);
            let decision = decide(&top.section, &boundary);
            trace!(end = %location, ?boundary, ?decision, "Classified end bar");
            decision
        } else {
            Decision::Close
        };

        if decision == Decision::Close {
            self.close();
        }
    }

    fn attach_endings(&mut self, system: usize, index: usize, location: SystemLocation) {
        let score = self.score;
        for ending in score.endings_in_bar(system, index) {
            // Endings that restart the pass numbering belong further out
            while self
                .stack
                .last()
                .is_some_and(|top| !takes_ending(&top.section, ending.numbers()))
            {
                self.close();
            }

            match self.stack.last_mut() {
                Some(top) => top.section.add_alternate_ending(ending.numbers(), location),
                None => self.report(RepeatDiagnostic::UnexpectedAlternateEnding {
                    location,
                    numbers: ending.numbers().to_vec(),
                }),
            }
        }
    }

    fn close(&mut self) {
        if let Some(open) = self.stack.pop() {
            self.commit(open.section);
        }
    }

    fn commit(&mut self, section: RepeatedSection) {
        let start = section.start_location();
        let Some(end) = section.last_end_bar() else {
            return;
        };

        let conflict = self.sections.values().find_map(|existing| {
            let (other_start, other_end) = existing.span()?;
            let disjoint = end < other_start || other_end < start;
            let nested = (start <= other_start && other_end <= end)
                || (other_start <= start && end <= other_end);
            if other_start == start || !(disjoint || nested) {
                Some(other_start)
            } else {
                None
            }
        });
        if let Some(existing) = conflict {
            self.report(RepeatDiagnostic::OverlappingRepeat { start, existing });
            return;
        }

        for pass in section.missing_passes() {
            self.report(RepeatDiagnostic::MissingAlternateEnding { start, pass });
        }

        debug!(
            start = %start,
            end = %end,
            passes = section.total_passes(),
            endings = section.alternate_ending_count(),
            "Indexed repeated section"
        );
        self.sections.insert(start, section);
    }

    fn report(&mut self, diagnostic: RepeatDiagnostic) {
        warn!("{}", diagnostic);
        self.diagnostics.push(diagnostic);
    }

    fn finish(mut self) -> RepeatIndex {
        while let Some(open) = self.stack.pop() {
            if open.section.last_end_bar().is_some() {
                self.commit(open.section);
            } else if !open.implicit {
                self.report(RepeatDiagnostic::UnmatchedRepeatStart {
                    location: open.section.start_location(),
                });
            } else {
                // Endings with no repeat anywhere around them
                let locations: BTreeSet<SystemLocation> =
                    open.section.alternate_endings().values().copied().collect();
                for location in locations {
                    let numbers = open
                        .section
                        .alternate_endings()
                        .iter()
                        .filter(|(_, target)| **target == location)
                        .map(|(number, _)| *number)
                        .collect();
                    self.report(RepeatDiagnostic::UnexpectedAlternateEnding { location, numbers });
                }
            }
        }

        RepeatIndex {
            sections: self.sections,
            diagnostics: self.diagnostics,
        }
    }
}
