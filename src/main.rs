use clap::{Parser, Subcommand};
use commander_engine::card::{parse_card_abilities, parse_spell_effect, CardDatabase};
use commander_engine::config::{DeckList, GameConfig};
use commander_engine::game::PlayerId;
use commander_engine::simulation::{run_game, GameResult};
use indicatif::{ProgressBar, ProgressStyle};
use log::LevelFilter;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Parser)]
#[command(name = "commander-engine")]
#[command(about = "Commander 1v1 rules engine with an AI-vs-AI simulator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Game configuration file (names, life, decks)
    #[arg(short, long, default_value = "game.json")]
    config: String,

    /// Card database file
    #[arg(long, default_value = "cards.json")]
    cards: String,

    /// Replace the player's deck with this deck list file
    #[arg(long)]
    player_deck: Option<String>,

    /// Replace the opponent's deck with this deck list file
    #[arg(long)]
    opponent_deck: Option<String>,

    /// Enable debug diagnostics
    #[arg(short, long)]
    verbose: bool,

    /// Write diagnostics to this file instead of stderr
    #[arg(long)]
    log_file: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a single game and print its log (default)
    Play {
        /// Seed for reproducibility
        #[arg(short, long)]
        seed: Option<u64>,

        /// Export the game log as timestamped JSON
        #[arg(long)]
        save_log: Option<String>,
    },

    /// Run many games in parallel and report statistics
    Batch {
        /// Number of games to simulate
        #[arg(short, long, default_value = "200")]
        num_games: usize,

        /// Base seed; game i uses base + i
        #[arg(short, long)]
        seed: Option<u64>,
    },

    /// Show how a card's rules text is interpreted
    Parse {
        /// Exact card name
        name: String,
    },
}

#[derive(Serialize)]
struct LogExport<'a> {
    exported_at: String,
    config: &'a str,
    result: &'a GameResult,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_file.as_deref());

    let db = match CardDatabase::from_file(&cli.cards) {
        Ok(db) => {
            eprintln!("✓ Loaded {} cards from {}", db.card_count(), cli.cards);
            db
        }
        Err(e) => {
            eprintln!("✗ Failed to load cards: {}", e);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Parse { ref name }) => parse_card(&db, name),
        Some(Commands::Batch { num_games, seed }) => {
            let config = load_config(&cli);
            run_batch(&db, &config, num_games, seed);
        }
        Some(Commands::Play { seed, ref save_log }) => {
            let config = load_config(&cli);
            play_one(&db, &config, &cli.config, seed, save_log.as_deref());
        }
        None => {
            let config = load_config(&cli);
            play_one(&db, &config, &cli.config, None, None);
        }
    }
}

fn init_logging(verbose: bool, log_file: Option<&str>) {
    let level = if verbose { LevelFilter::Debug } else { LevelFilter::Warn };
    match log_file {
        Some(path) => {
            if let Err(e) = simple_logging::log_to_file(path, level) {
                eprintln!("✗ Cannot open log file '{}': {}", path, e);
                simple_logging::log_to_stderr(level);
            }
        }
        None => simple_logging::log_to_stderr(level),
    }
}

fn load_config(cli: &Cli) -> GameConfig {
    let mut config = match GameConfig::from_file(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("✗ Failed to load config '{}': {}", cli.config, e);
            std::process::exit(1);
        }
    };
    if let Some(path) = &cli.player_deck {
        config.player_deck = load_deck(path);
    }
    if let Some(path) = &cli.opponent_deck {
        config.opponent_deck = load_deck(path);
    }
    config
}

fn load_deck(path: &str) -> DeckList {
    match DeckList::from_file(path) {
        Ok(deck) if deck.card_count() > 0 => {
            eprintln!("✓ Loaded deck {} ({} cards)", path, deck.card_count());
            deck
        }
        Ok(_) => {
            eprintln!("✗ Deck '{}' has no cards", path);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("✗ Failed to load deck '{}': {}", path, e);
            std::process::exit(1);
        }
    }
}

fn clock_seed() -> u64 {
    chrono::Utc::now().timestamp_micros() as u64
}

fn play_one(db: &CardDatabase, config: &GameConfig, config_path: &str, seed: Option<u64>, save_log: Option<&str>) {
    let seed = seed.or(config.seed).unwrap_or_else(clock_seed);
    println!("\n=== Commander 1v1 ===\n");
    println!("{} vs {}", config.player_name, config.opponent_name);
    println!("Seed: {}\n", seed);

    let result = run_game(config, db, seed, true);
    if !result.missing_cards.is_empty() {
        eprintln!("⚠ Cards not found: {}", result.missing_cards.join(", "));
    }
    println!();
    println!("Final life: {} {} / {} {}", config.player_name, result.player_life, config.opponent_name, result.opponent_life);

    if let Some(path) = save_log {
        let export = LogExport {
            exported_at: chrono::Local::now().to_rfc3339(),
            config: config_path,
            result: &result,
        };
        let written = serde_json::to_string_pretty(&export)
            .map_err(|e| e.to_string())
            .and_then(|json| std::fs::write(path, json).map_err(|e| e.to_string()));
        match written {
            Ok(()) => println!("✓ Game log saved to {}", path),
            Err(e) => eprintln!("✗ Failed to save game log: {}", e),
        }
    }
}

fn run_batch(db: &CardDatabase, config: &GameConfig, num_games: usize, seed: Option<u64>) {
    let base_seed = seed.or(config.seed).unwrap_or_else(clock_seed);
    println!("\n=== Commander 1v1 Batch ===\n");
    println!("{} vs {}", config.player_name, config.opponent_name);
    println!("Games: {}", num_games);
    println!("Base seed: {}\n", base_seed);

    let progress = ProgressBar::new(num_games as u64);
    progress.set_style(
        ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} games ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let start = std::time::Instant::now();
    let results: Vec<GameResult> = (0..num_games)
        .into_par_iter()
        .map(|i| {
            let result = run_game(config, db, base_seed.wrapping_add(i as u64), false);
            progress.inc(1);
            result
        })
        .collect();
    progress.finish_and_clear();
    let elapsed = start.elapsed();

    let wins = |id: PlayerId| results.iter().filter(|r| r.winner == Some(id)).count();
    let player_wins = wins(PlayerId::Player);
    let opponent_wins = wins(PlayerId::Opponent);
    let draws = num_games - player_wins - opponent_wins;
    let decided: Vec<&GameResult> = results.iter().filter(|r| r.winner.is_some()).collect();
    let avg_turns = if decided.is_empty() {
        0.0
    } else {
        decided.iter().map(|r| r.turns as f64).sum::<f64>() / decided.len() as f64
    };

    let pct = |n: usize| n as f64 / num_games.max(1) as f64 * 100.0;
    println!("=== Results ===\n");
    println!("{:20} {:5.1}% ({})", config.player_name, pct(player_wins), player_wins);
    println!("{:20} {:5.1}% ({})", config.opponent_name, pct(opponent_wins), opponent_wins);
    println!("{:20} {:5.1}% ({})", "Turn limit", pct(draws), draws);
    println!("Average game length: {:.2} turns", avg_turns);
    println!();

    let mut turn_dist: BTreeMap<u32, usize> = BTreeMap::new();
    for r in &decided {
        *turn_dist.entry(r.turns).or_insert(0) += 1;
    }
    println!("Game length distribution:");
    for (turn, count) in turn_dist {
        let bar = "█".repeat((pct(count) / 2.0) as usize);
        println!("  Turn {:2}: {:5.1}% {} ({})", turn, pct(count), bar, count);
    }

    let missing: Vec<&String> = results.first().map(|r| r.missing_cards.iter().collect()).unwrap_or_default();
    if !missing.is_empty() {
        eprintln!("⚠ Cards not found: {:?}", missing);
    }

    println!();
    println!(
        "Simulation completed in {:.2?} ({:.0} games/sec)",
        elapsed,
        num_games as f64 / elapsed.as_secs_f64()
    );
}

fn parse_card(db: &CardDatabase, name: &str) {
    let card = match db.get_card(name) {
        Ok(card) => card,
        Err(e) => {
            eprintln!("✗ {}", e);
            std::process::exit(1);
        }
    };
    println!("{} {}", card.name, card.mana_cost);
    println!("{}\n", card.oracle_text);

    let mut abilities = parse_card_abilities(&card);
    abilities.extend(parse_spell_effect(&card));
    if abilities.is_empty() {
        println!("(no recognized abilities)");
    }
    for ability in abilities {
        match serde_json::to_string_pretty(&ability) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("✗ {}", e),
        }
    }
}
