// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Lookahead classification used when a repeat end bar is reached.
//!
//! An end bar of a section with alternate endings may or may not be the
//! section's last one. `classify_after` looks past the end bar for the next
//! structural boundary and `decide` turns that into close-or-defer. Both are
//! pure functions of the score and the section.

use crate::score::{BarlineKind, ScoreView, SystemLocation};

use super::section::RepeatedSection;

/// The next structural boundary after a barline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Boundary {
    /// A repeat start barline
    RepeatStart(SystemLocation),
    /// A repeat end barline, reached with no alternate ending in between
    RepeatEnd(SystemLocation),
    /// A bar carrying alternate endings, opened by the barline at `location`
    Ending {
        location: SystemLocation,
        numbers: Vec<u32>,
    },
    /// Nothing follows
    EndOfScore,
}

/// What to do with the section on top of the stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Pop and commit it
    Close,
    /// Keep it open; more end bars or endings belong to it
    Defer,
}

/// Union of the pass numbers of every ending inside the bar opened by
/// barline `index`
fn ending_in_bar<S: ScoreView + ?Sized>(score: &S, system: usize, index: usize) -> Option<Boundary> {
    let endings = score.endings_in_bar(system, index);
    if endings.is_empty() {
        return None;
    }

    let mut numbers: Vec<u32> = endings
        .iter()
        .flat_map(|e| e.numbers().iter().copied())
        .collect();
    numbers.sort_unstable();
    numbers.dedup();

    let location = score.barline_location(system, index)?;
    Some(Boundary::Ending { location, numbers })
}

/// Classify what follows barline `index` of `system`.
///
/// The bar opened by crossing the barline is inspected first (continuing
/// into the next system when the barline closes its system), then every
/// later barline in score order.
pub fn classify_after<S: ScoreView + ?Sized>(score: &S, system: usize, index: usize) -> Boundary {
    if let Some((s, i)) = score.opening_barline(system, index) {
        if let Some(boundary) = ending_in_bar(score, s, i) {
            return boundary;
        }
    }

    let mut system = system;
    let mut index = index + 1;
    while system < score.system_count() {
        let barlines = score.barlines(system);
        if index >= barlines.len() {
            system += 1;
            index = 0;
            continue;
        }

        let location = SystemLocation::new(system, barlines[index].position());
        match barlines[index].kind() {
            BarlineKind::RepeatStart => return Boundary::RepeatStart(location),
            BarlineKind::RepeatEnd { .. } => return Boundary::RepeatEnd(location),
            BarlineKind::Plain => {}
        }

        if let Some(boundary) = ending_in_bar(score, system, index) {
            return boundary;
        }
        index += 1;
    }

    Boundary::EndOfScore
}

/// Decide whether the section that just received an end bar is complete.
///
/// An ending continues the section only if all of its passes come after
/// every pass already recorded; an ending that repeats a recorded number
/// starts somebody else's endings.
pub fn decide(section: &RepeatedSection, boundary: &Boundary) -> Decision {
    if !section.has_alternate_endings() {
        return Decision::Close;
    }

    match boundary {
        Boundary::RepeatEnd(_) => Decision::Defer,
        Boundary::Ending { numbers, .. } => {
            let lowest = numbers.first().copied().unwrap_or(0);
            if lowest > section.highest_alternate_ending() {
                Decision::Defer
            } else {
                Decision::Close
            }
        }
        Boundary::RepeatStart(_) | Boundary::EndOfScore => Decision::Close,
    }
}

/// Whether a section still open on the stack takes the end bar just
/// reached, given what follows that end bar.
///
/// A section that has not seen an end bar always does. A deferred section
/// takes it while its last ending leads into another pass, or when yet
/// another ending follows. Otherwise the end bar belongs to an enclosing
/// section and the deferred one is complete.
pub fn takes_end_bar(section: &RepeatedSection, following: &Boundary) -> bool {
    if section.end_bars().is_empty() || section.final_ending_repeats() {
        return true;
    }

    match following {
        Boundary::Ending { numbers, .. } => {
            numbers.first().copied().unwrap_or(0) > section.highest_alternate_ending()
        }
        _ => false,
    }
}

/// Whether the section on top of the stack takes an ending with `numbers`.
///
/// Once a section has an end bar, only endings for later passes belong
/// to it.
pub fn takes_ending(section: &RepeatedSection, numbers: &[u32]) -> bool {
    section.end_bars().is_empty()
        || numbers.first().copied().unwrap_or(0) > section.highest_alternate_ending()
}
