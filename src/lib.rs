// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Reprise - repeat indexing and navigation for musical scores.
//!
//! A score is read once into a [`RepeatIndex`] describing every repeated
//! section, its end bars and its alternate endings. During playback the
//! index answers "where next?" at each barline while tracking the pass
//! being played in every section.

pub mod config;
pub mod playback;
pub mod repeat;
pub mod score;

pub use config::{load_score, PlaybackConfig, ScoreFile};
pub use playback::{play_order, PlaybackState, Player};
pub use repeat::{build_index, RepeatDiagnostic, RepeatIndex, RepeatedSection};
pub use score::{AlternateEnding, Barline, BarlineKind, Score, ScoreError, ScoreView, System, SystemLocation};
