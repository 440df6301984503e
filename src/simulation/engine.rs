use crate::card::database::CardSource;
use crate::config::GameConfig;
use crate::game::actions::{perform, perform_logged, Action};
use crate::game::player::PlayerId;
use crate::game::state::{GameState, PendingChoice, Phase};
use crate::simulation::decisions::DecisionEngine;
use serde::Serialize;

/// Games still running after this many rounds are draws
pub const MAX_TURNS: u32 = 25;

/// Upper bound on main-phase actions per phase
const MAX_MAIN_PHASE_ACTIONS: usize = 30;

/// Result of a single simulated game
#[derive(Debug, Clone, Serialize)]
pub struct GameResult {
    pub seed: u64,
    /// None when the turn limit was reached
    pub winner: Option<PlayerId>,
    pub turns: u32,
    pub player_life: i32,
    pub opponent_life: i32,
    pub missing_cards: Vec<String>,
    pub log: Vec<String>,
}

/// Play one AI-vs-AI game to completion
pub fn run_game(config: &GameConfig, source: &dyn CardSource, seed: u64, verbose: bool) -> GameResult {
    let mut config = config.clone();
    config.seed = Some(seed);
    let setup = GameState::new_game(&config, source);
    let mut state = setup.state;
    let mut printed = 0;

    let winner = loop {
        if let Some(loser) = state.loser() {
            break Some(loser.other());
        }
        if state.turn > MAX_TURNS {
            break None;
        }
        state = play_phase(state);
        if verbose {
            for line in &state.log[printed..] {
                println!("{}", line);
            }
            printed = state.log.len();
        }
    };

    let summary = match winner {
        Some(id) => format!("{} wins", state.player(id).name),
        None => format!("Turn limit reached after {} turns", MAX_TURNS),
    };
    state.push_log(&summary);
    if verbose {
        println!("{}", summary);
    }
    log::info!("game {} finished: {}", seed, summary);

    GameResult {
        seed,
        winner,
        turns: state.turn,
        player_life: state.player.life,
        opponent_life: state.opponent.life,
        missing_cards: setup.missing,
        log: state.log,
    }
}

/// Let the AI act in the current phase, then advance
pub fn play_phase(state: GameState) -> GameState {
    let active = state.active_player;
    let mut state = state;
    match state.phase {
        Phase::Main1 | Phase::Main2 => state = main_phase(state, active),
        Phase::CombatAttackers => state = combat(state, active),
        _ => {}
    }
    let state = settle_searches(state);
    perform_logged(&state, active, &Action::AdvancePhase)
}

fn main_phase(mut state: GameState, actor: PlayerId) -> GameState {
    for _ in 0..MAX_MAIN_PHASE_ACTIONS {
        let Some(action) = DecisionEngine::choose_main_phase_action(&state, actor) else {
            break;
        };
        match perform(&state, actor, &action) {
            Ok(next) => state = settle_searches(next),
            Err(err) => {
                log::debug!("AI action {:?} refused: {}", action, err);
                break;
            }
        }
        if state.loser().is_some() {
            break;
        }
    }
    state
}

fn combat(state: GameState, attacker: PlayerId) -> GameState {
    let attackers = DecisionEngine::choose_attackers(&state, attacker);
    let state = perform_logged(&state, attacker, &Action::DeclareAttackers { attackers });
    let state = settle_searches(state);
    match state.pending {
        Some(PendingChoice::DeclareBlockers { defender }) => {
            let blocks = DecisionEngine::choose_blocks(&state, defender);
            perform_logged(&state, defender, &Action::DeclareBlockers { blocks })
        }
        _ => state,
    }
}

/// Resolve any open library search with the AI's picks
fn settle_searches(mut state: GameState) -> GameState {
    while let Some((player, chosen)) = DecisionEngine::choose_search(&state) {
        state = match perform(&state, player, &Action::ResolveSearch { chosen }) {
            Ok(next) => next,
            Err(err) => {
                log::warn!("search pick refused ({}); taking nothing", err);
                match perform(&state, player, &Action::ResolveSearch { chosen: Vec::new() }) {
                    Ok(next) => next,
                    Err(_) => {
                        state.pending = None;
                        state
                    }
                }
            }
        };
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::database::CardDatabase;

    fn setup() -> (GameConfig, CardDatabase) {
        let config = GameConfig::from_file("game.json").expect("Failed to load game.json");
        let db = CardDatabase::from_file("cards.json").expect("Failed to load cards");
        (config, db)
    }

    #[test]
    fn test_game_terminates() {
        let (config, db) = setup();
        let result = run_game(&config, &db, 42, false);
        assert!(result.turns <= MAX_TURNS + 1);
        assert!(result.missing_cards.is_empty());
        assert!(result.log.last().is_some_and(|l| l.contains("wins") || l.contains("Turn limit")));
    }

    #[test]
    fn test_same_seed_same_game() {
        let (config, db) = setup();
        let a = run_game(&config, &db, 7, false);
        let b = run_game(&config, &db, 7, false);
        assert_eq!(a.log, b.log);
        assert_eq!(a.winner, b.winner);
    }

    #[test]
    fn test_batch_of_seeds_runs_clean() {
        let (config, db) = setup();
        for seed in 0..5 {
            let result = run_game(&config, &db, seed, false);
            if result.winner.is_some() {
                assert!(result.turns <= MAX_TURNS);
            }
            assert!(result.log[0].contains("Game started"));
        }
    }
}
