// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Score playback through repeats and alternate endings.

pub mod player;

pub use player::{PlaybackState, Player};

use crate::score::{ScoreView, SystemLocation};

/// Bars of `score` in playing order, from the first barline
pub fn play_order<S: ScoreView + ?Sized>(score: &S) -> Vec<SystemLocation> {
    Player::from_score(score).play_order()
}
