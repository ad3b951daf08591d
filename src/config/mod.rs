// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Score documents and playback settings.
//!
//! Scores are described in YAML (or TOML, chosen by file extension) and
//! converted into the in-memory `Score` the indexer scans.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::score::{
    AlternateEnding, Barline, BarlineKind, Score, ScoreError, System, DEFAULT_REPEAT_COUNT,
};

/// Root of a score document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoreFile {
    /// Score title
    #[serde(default = "default_title")]
    pub title: String,
    /// Playback settings
    #[serde(default)]
    pub playback: PlaybackConfig,
    /// Systems in reading order
    #[serde(default)]
    pub systems: Vec<SystemConfig>,
}

fn default_title() -> String {
    "Untitled".to_string()
}

impl ScoreFile {
    /// Load a score document, YAML unless the extension is `.toml`
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read score file: {:?}", path))?;

        let is_toml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("toml"));

        let file = if is_toml {
            Self::from_toml(&contents)
        } else {
            Self::from_yaml(&contents)
        };
        file.with_context(|| format!("Invalid score file: {:?}", path))
    }

    /// Parse a score document from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("Failed to parse YAML score")
    }

    /// Parse a score document from a TOML string
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse TOML score")
    }

    /// Serialize to YAML string
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize score to YAML")
    }

    /// Save the document as YAML
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = self.to_yaml()?;
        fs::write(path.as_ref(), yaml)
            .with_context(|| format!("Failed to write score file: {:?}", path.as_ref()))
    }

    /// Describe an existing score
    pub fn from_score(score: &Score) -> Self {
        Self {
            title: score.title().to_string(),
            playback: PlaybackConfig::default(),
            systems: score
                .systems()
                .iter()
                .map(|system| SystemConfig {
                    barlines: system.barlines().iter().map(BarlineConfig::from).collect(),
                    alternate_endings: system
                        .alternate_endings()
                        .iter()
                        .map(|e| EndingConfig {
                            position: e.position(),
                            numbers: e.numbers().to_vec(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    /// Build and validate the score
    pub fn to_score(&self) -> Result<Score, ScoreError> {
        let mut score = Score::new(self.title.clone());
        for config in &self.systems {
            let mut system = System::new();
            for barline in &config.barlines {
                system.add_barline(barline.to_barline());
            }
            for ending in &config.alternate_endings {
                system.add_alternate_ending(AlternateEnding::new(
                    ending.position,
                    ending.numbers.iter().copied(),
                ));
            }
            score.add_system(system);
        }

        score.validate()?;
        Ok(score)
    }
}

/// Playback settings
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlaybackConfig {
    /// Upper bound on bars played plus jumps taken before playback gives up
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
}

fn default_max_steps() -> usize {
    10_000
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
        }
    }
}

/// One system of a score document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SystemConfig {
    /// Barlines of the system
    #[serde(default)]
    pub barlines: Vec<BarlineConfig>,
    /// Alternate endings of the system
    #[serde(default)]
    pub alternate_endings: Vec<EndingConfig>,
}

/// Barline type as written in score documents
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum BarlineType {
    #[default]
    Plain,
    RepeatStart,
    RepeatEnd,
}

/// A barline entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BarlineConfig {
    /// Position within the system
    pub position: u32,
    /// Barline type
    #[serde(default)]
    pub kind: BarlineType,
    /// Total passes for a repeat end (default 2)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat_count: Option<u32>,
}

impl BarlineConfig {
    fn to_barline(&self) -> Barline {
        let kind = match self.kind {
            BarlineType::Plain => BarlineKind::Plain,
            BarlineType::RepeatStart => BarlineKind::RepeatStart,
            BarlineType::RepeatEnd => BarlineKind::RepeatEnd {
                repeat_count: self.repeat_count.unwrap_or(DEFAULT_REPEAT_COUNT),
            },
        };
        Barline::new(self.position, kind)
    }
}

impl From<&Barline> for BarlineConfig {
    fn from(barline: &Barline) -> Self {
        let (kind, repeat_count) = match barline.kind() {
            BarlineKind::Plain => (BarlineType::Plain, None),
            BarlineKind::RepeatStart => (BarlineType::RepeatStart, None),
            BarlineKind::RepeatEnd { repeat_count } => (BarlineType::RepeatEnd, Some(repeat_count)),
        };
        Self {
            position: barline.position(),
            kind,
            repeat_count,
        }
    }
}

/// An alternate ending entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EndingConfig {
    /// Position within the system
    pub position: u32,
    /// Passes the ending is played on
    pub numbers: Vec<u32>,
}

/// Load a score document and build the validated score
pub fn load_score<P: AsRef<Path>>(path: P) -> Result<(Score, PlaybackConfig)> {
    let file = ScoreFile::load(path.as_ref())?;
    let score = file
        .to_score()
        .with_context(|| format!("Invalid score: {:?}", path.as_ref()))?;
    Ok((score, file.playback))
}
