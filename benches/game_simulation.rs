use commander_engine::card::{parse_card_abilities, CardDatabase, CardSource};
use commander_engine::config::GameConfig;
use commander_engine::simulation::engine::run_game;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn benchmark_single_game(c: &mut Criterion) {
    let db = CardDatabase::from_file("cards.json").expect("Failed to load cards");
    let config = GameConfig::from_file("game.json").expect("Failed to load game.json");

    c.bench_function("single_game_seed_12345", |b| {
        b.iter(|| run_game(black_box(&config), black_box(&db), black_box(12345), false))
    });
}

fn benchmark_multiple_games(c: &mut Criterion) {
    let db = CardDatabase::from_file("cards.json").expect("Failed to load cards");
    let config = GameConfig::from_file("game.json").expect("Failed to load game.json");

    c.bench_function("20_games", |b| {
        b.iter(|| {
            for seed in 0..20 {
                run_game(black_box(&config), black_box(&db), black_box(seed), false);
            }
        })
    });
}

fn benchmark_ability_parsing(c: &mut Criterion) {
    let db = CardDatabase::from_file("cards.json").expect("Failed to load cards");
    let cards: Vec<_> = db
        .card_names()
        .into_iter()
        .filter_map(|name| db.lookup_card_by_name(name).ok())
        .collect();

    c.bench_function("parse_card_pool", |b| {
        b.iter(|| {
            for card in &cards {
                black_box(parse_card_abilities(black_box(card)));
            }
        })
    });
}

criterion_group!(benches, benchmark_single_game, benchmark_multiple_games, benchmark_ability_parsing);
criterion_main!(benches);
