// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Advisory findings reported while indexing repeats.
//!
//! None of these stop indexing. The indexer keeps a best-effort section
//! and records the anomaly so callers can surface it.

use thiserror::Error;

use crate::score::SystemLocation;

/// A structural anomaly found during index construction
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepeatDiagnostic {
    #[error("Repeat start at {location} has no matching repeat end")]
    UnmatchedRepeatStart { location: SystemLocation },

    #[error("Repeat end at {location} has no matching repeat start")]
    UnmatchedRepeatEnd { location: SystemLocation },

    #[error("Alternate ending {numbers:?} at {location} is outside any repeated section")]
    UnexpectedAlternateEnding {
        location: SystemLocation,
        numbers: Vec<u32>,
    },

    #[error("Repeated section at {start} has no alternate ending for pass {pass}")]
    MissingAlternateEnding { start: SystemLocation, pass: u32 },

    #[error("Repeated section at {start} overlaps the section at {existing} without nesting")]
    OverlappingRepeat {
        start: SystemLocation,
        existing: SystemLocation,
    },
}

impl RepeatDiagnostic {
    /// Location the finding refers to
    pub fn location(&self) -> SystemLocation {
        match self {
            RepeatDiagnostic::UnmatchedRepeatStart { location }
            | RepeatDiagnostic::UnmatchedRepeatEnd { location }
            | RepeatDiagnostic::UnexpectedAlternateEnding { location, .. } => *location,
            RepeatDiagnostic::MissingAlternateEnding { start, .. }
            | RepeatDiagnostic::OverlappingRepeat { start, .. } => *start,
        }
    }
}
