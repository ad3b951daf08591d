// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Bar-by-bar playback driver.
//!
//! Walks the barlines of a score in order and asks the repeat index where
//! to go at each one. Each player owns its index, so pass counters are
//! private to one traversal.

use tracing::{debug, warn};

use crate::config::PlaybackConfig;
use crate::repeat::RepeatIndex;
use crate::score::{ScoreView, SystemLocation};

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// At a barline, ready for the next bar
    #[default]
    Ready,
    /// Reached the end of the score
    Finished,
    /// Gave up after the step limit
    Aborted,
}

/// Plays a score through its repeats
pub struct Player<'a, S: ScoreView + ?Sized> {
    /// Score being played
    score: &'a S,
    /// Pass counters for this traversal
    index: RepeatIndex,
    /// Barline about to be crossed, as (system, barline index)
    cursor: Option<(usize, usize)>,
    /// The cursor was reached by a jump, so its end bar is already settled
    jumped: bool,
    /// Bars played plus jumps taken since the last restart
    steps: usize,
    state: PlaybackState,
    config: PlaybackConfig,
}

impl<'a, S: ScoreView + ?Sized> Player<'a, S> {
    /// Create a player over `score` using `index` for navigation
    pub fn new(score: &'a S, index: RepeatIndex) -> Self {
        let mut player = Self {
            score,
            index,
            cursor: None,
            jumped: false,
            steps: 0,
            state: PlaybackState::Ready,
            config: PlaybackConfig::default(),
        };
        player.restart();
        player
    }

    /// Index the score and create a player for it
    pub fn from_score(score: &'a S) -> Self {
        Self::new(score, RepeatIndex::build(score))
    }

    /// Builder: set playback config
    pub fn with_config(mut self, config: PlaybackConfig) -> Self {
        self.config = config;
        self
    }

    /// Repeat index with this player's pass counters
    pub fn index(&self) -> &RepeatIndex {
        &self.index
    }

    /// Playback state
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Location of the barline about to be crossed
    pub fn position(&self) -> Option<SystemLocation> {
        let (system, index) = self.cursor?;
        self.score.barline_location(system, index)
    }

    /// Check if playback is over
    pub fn is_at_end(&self) -> bool {
        self.state != PlaybackState::Ready
    }

    /// Back to the first barline with every section on its first pass
    pub fn restart(&mut self) {
        self.index.reset_all();
        self.cursor = (0..self.score.system_count())
            .find(|&system| !self.score.barlines(system).is_empty())
            .map(|system| (system, 0));
        self.jumped = false;
        self.steps = 0;
        self.state = if self.cursor.is_some() {
            PlaybackState::Ready
        } else {
            PlaybackState::Finished
        };
    }

    /// Rewind to the barline at `location`, resetting every pass counter.
    ///
    /// Returns false, leaving playback untouched, when no barline is there.
    pub fn seek(&mut self, location: SystemLocation) -> bool {
        let Some(index) = self.score.barline_index(location) else {
            return false;
        };

        self.index.reset_all();
        self.cursor = Some((location.system, index));
        self.jumped = false;
        self.steps = 0;
        self.state = PlaybackState::Ready;
        true
    }

    fn stop(&mut self, state: PlaybackState) -> Option<SystemLocation> {
        self.cursor = None;
        self.state = state;
        None
    }

    /// Cross the next barline and return the location of the barline that
    /// opens the bar to play, or `None` once playback is over.
    pub fn next_bar(&mut self) -> Option<SystemLocation> {
        loop {
            let (system, index) = self.cursor?;
            if self.steps >= self.config.max_steps {
                warn!(
                    max_steps = self.config.max_steps,
                    "Playback step limit reached, stopping"
                );
                return self.stop(PlaybackState::Aborted);
            }

            let Some(here) = self.score.barline_location(system, index) else {
                return self.stop(PlaybackState::Finished);
            };

            // A jump target only takes the first-ending branch
            let target = if self.jumped {
                self.index.enter(here)
            } else {
                self.index.advance(here)
            };
            if target != here {
                self.steps += 1;
                let Some(target_index) = self.score.barline_index(target) else {
                    warn!(target = %target, "Repeat target is not a barline, stopping");
                    return self.stop(PlaybackState::Aborted);
                };
                debug!(from = %here, to = %target, "Jump");
                self.cursor = Some((target.system, target_index));
                self.jumped = true;
                continue;
            }
            self.jumped = false;

            match self.score.opening_barline(system, index) {
                Some((opening, _)) if opening == system => {
                    self.steps += 1;
                    self.cursor = Some((system, index + 1));
                    return Some(here);
                }
                Some(next) => self.cursor = Some(next),
                None => return self.stop(PlaybackState::Finished),
            }
        }
    }

    /// Play from the current position to the end, collecting the bars
    pub fn play_order(&mut self) -> Vec<SystemLocation> {
        std::iter::from_fn(|| self.next_bar()).collect()
    }
}

impl<S: ScoreView + ?Sized> Iterator for Player<'_, S> {
    type Item = SystemLocation;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_bar()
    }
}
