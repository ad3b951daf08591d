// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Repeat indexing and navigation.
//!
//! This module provides:
//! - Repeated sections: start bar, end bars, alternate endings, pass counter
//! - End bar classification: close-or-defer lookahead
//! - The repeat index: construction scan and playback navigation
//! - Diagnostics for malformed repeat structures

pub mod classify;
pub mod diagnostics;
pub mod index;
pub mod section;

pub use classify::{classify_after, decide, takes_end_bar, takes_ending, Boundary, Decision};
pub use diagnostics::RepeatDiagnostic;
pub use index::RepeatIndex;
pub use section::RepeatedSection;

use crate::score::ScoreView;

/// Build the repeat index for a score
pub fn build_index<S: ScoreView + ?Sized>(score: &S) -> RepeatIndex {
    RepeatIndex::build(score)
}
