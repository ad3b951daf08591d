// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Integration tests for Reprise
//!
//! These tests drive the public API end to end: score documents on disk,
//! index construction, and playback through randomly generated scores.

use std::collections::HashSet;
use std::fs;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempfile::tempdir;

use reprise::{
    load_score, AlternateEnding, Barline, BarlineKind, PlaybackConfig, PlaybackState, Player,
    RepeatIndex, Score, ScoreView, System, SystemLocation,
};

const BAR_WIDTH: u32 = 8;

/// Musical structure of a generated score
#[derive(Debug)]
enum Item {
    Bar,
    Repeat { count: u32, body: Vec<Item> },
    /// An empty body puts the first ending in the bar right after the start
    Endings { endings: u32, body: Vec<Item> },
}

/// The same structure with every bar assigned its index in the score
#[derive(Debug)]
enum Laid {
    Bar(usize),
    Repeat {
        head: usize,
        count: u32,
        body: Vec<Laid>,
        tail: usize,
    },
    Endings {
        head: usize,
        body: Vec<Laid>,
        endings: Vec<usize>,
        tail: usize,
    },
}

/// A bar: the barline that opens it and the ending numbers marked in it
type BarSpec = (BarlineKind, Vec<u32>);

fn random_block(rng: &mut StdRng, depth: usize) -> Vec<Item> {
    let len = rng.gen_range(1..=3);
    (0..len).map(|_| random_item(rng, depth)).collect()
}

fn random_item(rng: &mut StdRng, depth: usize) -> Item {
    if depth >= 3 {
        return Item::Bar;
    }
    match rng.gen_range(0..4) {
        0 | 1 => Item::Bar,
        2 => Item::Repeat {
            count: rng.gen_range(2..=3),
            body: random_block(rng, depth + 1),
        },
        _ => Item::Endings {
            endings: rng.gen_range(2..=3),
            body: if rng.gen_bool(0.25) {
                Vec::new()
            } else {
                random_block(rng, depth + 1)
            },
        },
    }
}

fn push_bar(bars: &mut Vec<BarSpec>, kind: BarlineKind, endings: Vec<u32>) -> usize {
    bars.push((kind, endings));
    bars.len() - 1
}

fn lay_out(items: &[Item], bars: &mut Vec<BarSpec>) -> Vec<Laid> {
    items
        .iter()
        .map(|item| match item {
            Item::Bar => Laid::Bar(push_bar(bars, BarlineKind::Plain, Vec::new())),
            Item::Repeat { count, body } => {
                let head = push_bar(bars, BarlineKind::RepeatStart, Vec::new());
                let body = lay_out(body, bars);
                let end = BarlineKind::RepeatEnd {
                    repeat_count: *count,
                };
                let tail = push_bar(bars, end, Vec::new());
                Laid::Repeat {
                    head,
                    count: *count,
                    body,
                    tail,
                }
            }
            Item::Endings { endings, body } if body.is_empty() => {
                let head = push_bar(bars, BarlineKind::RepeatStart, vec![1]);
                let mut ending_bars = vec![head];
                for number in 2..=*endings {
                    let end = BarlineKind::RepeatEnd { repeat_count: 2 };
                    ending_bars.push(push_bar(bars, end, vec![number]));
                }
                let tail = push_bar(bars, BarlineKind::Plain, Vec::new());
                Laid::Endings {
                    head,
                    body: Vec::new(),
                    endings: ending_bars,
                    tail,
                }
            }
            Item::Endings { endings, body } => {
                let head = push_bar(bars, BarlineKind::RepeatStart, Vec::new());
                let body = lay_out(body, bars);
                let mut ending_bars = vec![push_bar(bars, BarlineKind::Plain, vec![1])];
                for number in 2..=*endings {
                    let end = BarlineKind::RepeatEnd { repeat_count: 2 };
                    ending_bars.push(push_bar(bars, end, vec![number]));
                }
                let tail = push_bar(bars, BarlineKind::Plain, Vec::new());
                Laid::Endings {
                    head,
                    body,
                    endings: ending_bars,
                    tail,
                }
            }
        })
        .collect()
}

/// Expected playing order. Nested sections keep their pass counters, so a
/// section met again inside an outer repeat plays straight through (or
/// straight into its last ending). A first ending in the opening bar
/// replaces that bar, so the opening bar is not played on its own.
fn expected_order(laid: &[Laid], exhausted: &mut HashSet<usize>, out: &mut Vec<usize>) {
    for item in laid {
        match item {
            Laid::Bar(bar) => out.push(*bar),
            Laid::Repeat {
                head,
                count,
                body,
                tail,
            } => {
                let passes = if exhausted.contains(head) { 1 } else { *count };
                for _ in 0..passes {
                    out.push(*head);
                    expected_order(body, exhausted, out);
                }
                exhausted.insert(*head);
                out.push(*tail);
            }
            Laid::Endings {
                head,
                body,
                endings,
                tail,
            } => {
                let passes: Vec<usize> = if exhausted.contains(head) {
                    endings.last().copied().into_iter().collect()
                } else {
                    endings.clone()
                };
                for ending in passes {
                    if endings[0] != *head {
                        out.push(*head);
                        expected_order(body, exhausted, out);
                    }
                    out.push(ending);
                }
                exhausted.insert(*head);
                out.push(*tail);
            }
        }
    }
}

/// Spread bars over systems. Each system closes with a plain barline and
/// the next one opens with the barline of its first bar.
fn build_score(bars: &[BarSpec], rng: &mut StdRng) -> (Score, Vec<SystemLocation>) {
    let mut score = Score::new("Generated");
    let mut locations = Vec::with_capacity(bars.len());
    let mut system = System::new();
    let mut count = 0u32;

    for (kind, endings) in bars {
        if count > 0 && rng.gen_bool(0.2) {
            system.add_barline(Barline::plain(count * BAR_WIDTH));
            score.add_system(std::mem::take(&mut system));
            count = 0;
        }

        let position = count * BAR_WIDTH;
        system.add_barline(Barline::new(position, *kind));
        if !endings.is_empty() {
            system.add_alternate_ending(AlternateEnding::new(position + 1, endings.clone()));
        }
        locations.push(SystemLocation::new(score.system_count(), position));
        count += 1;
    }

    system.add_barline(Barline::plain(count * BAR_WIDTH));
    score.add_system(system);
    (score, locations)
}

struct Generated {
    score: Score,
    expected: Vec<SystemLocation>,
}

fn generate(seed: u64) -> Generated {
    let mut rng = StdRng::seed_from_u64(seed);
    let items = random_block(&mut rng, 0);

    let mut bars = Vec::new();
    let laid = lay_out(&items, &mut bars);

    let mut order = Vec::new();
    expected_order(&laid, &mut HashSet::new(), &mut order);

    let (score, locations) = build_score(&bars, &mut rng);
    let expected = order.into_iter().map(|bar| locations[bar]).collect();
    Generated { score, expected }
}

fn spans_nest(index: &RepeatIndex) -> bool {
    let spans: Vec<_> = index.sections().filter_map(|s| s.span()).collect();
    spans.iter().enumerate().all(|(i, a)| {
        spans.iter().skip(i + 1).all(|b| {
            let disjoint = a.1 < b.0 || b.1 < a.0;
            let nested = (a.0 <= b.0 && b.1 <= a.1) || (b.0 <= a.0 && a.1 <= b.1);
            disjoint || nested
        })
    })
}

fn loc(system: usize, position: u32) -> SystemLocation {
    SystemLocation::new(system, position)
}

/// Generated scores play in the order their structure implies
#[test]
fn test_random_scores_play_in_order() {
    for seed in 0..200 {
        let generated = generate(seed);
        let index = RepeatIndex::build(&generated.score);
        assert!(
            index.diagnostics().is_empty(),
            "seed {}: {:?}",
            seed,
            index.diagnostics()
        );

        let mut player = Player::new(&generated.score, index)
            .with_config(PlaybackConfig { max_steps: 100_000 });
        let order = player.play_order();

        assert_eq!(order, generated.expected, "seed {}", seed);
        assert_eq!(player.state(), PlaybackState::Finished, "seed {}", seed);
    }
}

/// Committed sections never partially overlap, even for arbitrary barlines
#[test]
fn test_sections_always_nest() {
    let mut rng = StdRng::seed_from_u64(7);

    for _ in 0..300 {
        let mut score = Score::new("Noise");
        for _ in 0..rng.gen_range(1..=3) {
            let mut system = System::new();
            let count = rng.gen_range(1..=10u32);
            for i in 0..count {
                let kind = match rng.gen_range(0..5) {
                    0 => BarlineKind::RepeatStart,
                    1 => BarlineKind::RepeatEnd {
                        repeat_count: rng.gen_range(2..=4),
                    },
                    _ => BarlineKind::Plain,
                };
                system.add_barline(Barline::new(i * BAR_WIDTH, kind));
                if rng.gen_bool(0.2) {
                    let first = rng.gen_range(1..=3u32);
                    system.add_alternate_ending(AlternateEnding::new(
                        i * BAR_WIDTH + 1,
                        first..=first + rng.gen_range(0..=1),
                    ));
                }
            }
            score.add_system(system);
        }

        let index = RepeatIndex::build(&score);
        assert!(spans_nest(&index), "{:?}", index);

        // Every barline resolves without panicking, and the bounded player stops
        let mut player = Player::new(&score, index).with_config(PlaybackConfig { max_steps: 500 });
        let _ = player.play_order();
        assert!(player.is_at_end());
    }
}

/// Resetting reproduces a fresh index exactly
#[test]
fn test_reset_restores_fresh_state() {
    for seed in 0..50 {
        let generated = generate(seed);
        let fresh = RepeatIndex::build(&generated.score);

        let mut player = Player::new(&generated.score, fresh.clone());
        let first = player.play_order();

        let mut index = player.index().clone();
        index.reset_all();
        assert_eq!(index, fresh, "seed {}", seed);

        player.restart();
        assert_eq!(player.play_order(), first, "seed {}", seed);
    }
}

/// advance never moves a location that lies outside every section
#[test]
fn test_locations_outside_sections_pass_through() {
    for seed in 0..50 {
        let generated = generate(seed);
        let mut index = RepeatIndex::build(&generated.score);

        for system in 0..generated.score.system_count() {
            for barline in generated.score.barlines(system) {
                let location = loc(system, barline.position());
                if index.find_repeat(location).is_none() {
                    assert_eq!(index.advance(location), location);
                }
            }
        }
    }
}

/// find_repeat returns the innermost enclosing section
#[test]
fn test_find_repeat_is_innermost() {
    for seed in 0..50 {
        let generated = generate(seed);
        let index = RepeatIndex::build(&generated.score);

        for system in 0..generated.score.system_count() {
            for barline in generated.score.barlines(system) {
                let location = loc(system, barline.position());
                let found = index.find_repeat(location);
                let innermost = index
                    .sections()
                    .filter(|s| s.contains(location))
                    .max_by_key(|s| s.start_location());
                assert_eq!(found, innermost, "seed {} at {}", seed, location);
            }
        }
    }
}

/// Score document on disk through to playing order
#[test]
fn test_load_and_play_document() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("song.yaml");
    fs::write(
        &path,
        r#"
title: "Verse and chorus"
playback:
  max_steps: 500
systems:
  - barlines:
      - position: 0
        kind: repeat-start
      - position: 4
      - position: 8
        kind: repeat-end
    alternate_endings:
      - position: 5
        numbers: [1]
  - barlines:
      - position: 0
      - position: 4
        kind: repeat-start
      - position: 8
        kind: repeat-end
        repeat_count: 3
      - position: 12
    alternate_endings:
      - position: 1
        numbers: [2]
"#,
    )
    .unwrap();

    let (score, config) = load_score(&path).unwrap();
    assert_eq!(score.title(), "Verse and chorus");
    assert_eq!(config.max_steps, 500);

    let index = RepeatIndex::build(&score);
    assert_eq!(index.len(), 2);
    assert!(index.diagnostics().is_empty());

    let mut player = Player::new(&score, index).with_config(config);
    assert_eq!(
        player.play_order(),
        vec![
            loc(0, 0),
            loc(0, 4),
            loc(0, 0),
            loc(1, 0),
            loc(1, 4),
            loc(1, 4),
            loc(1, 4),
            loc(1, 8),
        ]
    );
}

/// Malformed documents still index, with diagnostics
#[test]
fn test_malformed_document_reports_diagnostics() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.toml");
    fs::write(
        &path,
        r#"
title = "Broken"

[[systems]]
barlines = [
    { position = 0 },
    { position = 8, kind = "repeat-start" },
    { position = 16 },
    { position = 24, kind = "repeat-end" },
    { position = 32, kind = "repeat-end" },
    { position = 40, kind = "repeat-end" },
    { position = 48 },
]
"#,
    )
    .unwrap();

    let (score, _) = load_score(&path).unwrap();
    let index = RepeatIndex::build(&score);

    // The second end repeats from the top, the third has nothing left to close
    assert_eq!(index.len(), 2);
    assert_eq!(index.diagnostics().len(), 1);
    assert_eq!(index.diagnostics()[0].location(), loc(0, 40));
}

/// Invalid documents are rejected before indexing
#[test]
fn test_invalid_document_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("invalid.yaml");
    fs::write(
        &path,
        r#"
systems:
  - barlines:
      - position: 8
      - position: 8
"#,
    )
    .unwrap();

    assert!(load_score(&path).is_err());
    assert!(load_score(dir.path().join("missing.yaml")).is_err());
}
