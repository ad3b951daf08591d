// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

use anyhow::Result;
use reprise::{load_score, PlaybackState, Player, RepeatIndex, Score, ScoreView};
use std::env;
use tracing::Level;

fn print_usage() {
    println!("REPRISE - Repeat navigation for musical scores");
    println!();
    println!("Usage: reprise [--verbose] <COMMAND> <FILE>");
    println!();
    println!("Commands:");
    println!("  --index <FILE>   Print the repeated sections of a score");
    println!("  --play <FILE>    Print the bars of a score in playing order");
    println!("  --check <FILE>   Report repeat structure problems (exit 1 if any)");
    println!("  --help           Show this help message");
    println!();
    println!("Options:");
    println!("  --verbose        Log index construction and playback jumps");
    println!();
    println!("Score files are YAML, or TOML when the extension is .toml");
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn print_index(score: &Score, index: &RepeatIndex) {
    println!("{} - {} bars, {} repeated sections", score.title(), score.bar_count(), index.len());
    println!();

    for section in index.sections() {
        let end = section
            .last_end_bar()
            .map(|e| e.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "Section {} .. {}  ({} passes)",
            section.start_location(),
            end,
            section.total_passes()
        );
        for (location, count) in section.end_bars() {
            println!("  end bar   {:<8} x{}", location.to_string(), count);
        }
        for (pass, branch) in section.alternate_endings() {
            println!("  ending {:<3} {}", pass, branch);
        }
    }

    for diagnostic in index.diagnostics() {
        println!("warning: {}", diagnostic);
    }
}

fn print_play_order(score: &Score, index: RepeatIndex, config: reprise::PlaybackConfig) {
    let mut player = Player::new(score, index).with_config(config);
    let mut count = 0usize;

    while let Some(bar) = player.next_bar() {
        count += 1;
        println!("{:>5}  {}", count, bar);
    }

    if player.state() == PlaybackState::Aborted {
        eprintln!("Stopped after {} steps; raise playback.max_steps if this is expected", count);
    }
    println!();
    println!("{} bars played ({} written)", count, score.bar_count());
}

fn check(index: &RepeatIndex) -> bool {
    if index.diagnostics().is_empty() {
        println!("No repeat problems found ({} repeated sections)", index.len());
        return true;
    }

    for diagnostic in index.diagnostics() {
        println!("{}", diagnostic);
    }
    println!();
    println!("{} problem(s) found", index.diagnostics().len());
    false
}

fn main() -> Result<()> {
    let mut args: Vec<String> = env::args().skip(1).collect();
    let verbose = args.iter().any(|a| a == "--verbose" || a == "-v");
    args.retain(|a| a != "--verbose" && a != "-v");

    if args.is_empty() {
        println!("REPRISE - Repeat navigation for musical scores");
        println!("Run with --help for usage information");
        return Ok(());
    }

    if matches!(args[0].as_str(), "--help" | "-h") {
        print_usage();
        return Ok(());
    }

    let command = args[0].as_str();
    if !matches!(command, "--index" | "--play" | "--check") {
        eprintln!("Unknown option: {}", command);
        print_usage();
        std::process::exit(1);
    }

    let Some(path) = args.get(1) else {
        eprintln!("Error: {} requires a score file", command);
        std::process::exit(1);
    };

    init_logging(verbose);
    let (score, config) = load_score(path)?;
    let index = RepeatIndex::build(&score);
    tracing::debug!(
        systems = score.system_count(),
        sections = index.len(),
        "Score indexed"
    );

    match command {
        "--index" => print_index(&score, &index),
        "--play" => print_play_order(&score, index, config),
        _ => {
            if !check(&index) {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
