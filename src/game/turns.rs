use crate::game::combat::resolve_combat_damage;
use crate::game::state::{GameState, PendingChoice, Phase};
use crate::game::triggers::{process_events, GameEvent};

/// Move to the next phase, applying that transition's effects
pub fn advance_phase(state: &GameState) -> GameState {
    let mut next = state.clone();
    step(&mut next);
    next
}

/// Skip the rest of the turn and start the next one at its untap step
pub fn pass_turn(state: &GameState) -> GameState {
    let mut next = state.clone();
    if matches!(next.pending, Some(PendingChoice::DeclareBlockers { .. })) {
        next.pending = None;
    }
    clear_combat(&mut next);
    next.phase = Phase::Untap;
    begin_turn(&mut next);
    next
}

pub(crate) fn step(state: &mut GameState) {
    let from = state.phase;
    state.phase = from.next();
    log::debug!("turn {}: {} -> {}", state.turn, from.name(), state.phase.name());
    match (from, state.phase) {
        (Phase::Cleanup, Phase::Untap) => begin_turn(state),
        (Phase::Untap, Phase::Upkeep) => {
            let player = state.active_player;
            process_events(state, vec![GameEvent::Upkeep { player }]);
        }
        (Phase::Upkeep, Phase::Draw) => draw_step(state),
        (Phase::CombatBlockers, Phase::CombatDamage) => combat_damage_step(state),
        (Phase::CombatDamage, Phase::CombatEnd) => clear_combat(state),
        _ => {}
    }
}

/// Flip the active player and untap their side. The turn number advances
/// when the starting player becomes active again.
fn begin_turn(state: &mut GameState) {
    state.active_player = state.active_player.other();
    if state.active_player == state.starting_player {
        state.turn += 1;
    }
    let active = state.player_mut(state.active_player);
    active.untap_step();
    let name = active.name.clone();
    state.push_log(format!("{}'s turn begins", name));
}

fn draw_step(state: &mut GameState) {
    let active = state.player_mut(state.active_player);
    let name = active.name.clone();
    if active.draw_card() {
        state.push_log(format!("{} draws a card", name));
    } else {
        state.push_log(format!("{} cannot draw: library is empty", name));
    }
}

fn combat_damage_step(state: &mut GameState) {
    if matches!(state.pending, Some(PendingChoice::DeclareBlockers { .. })) {
        state.pending = None;
        let defender = state.player(state.active_player.other()).name.clone();
        state.push_log(format!("{} declares no blockers", defender));
    }
    let attacker_id = state.active_player;
    let (attacking, defending) = state.pair(attacker_id);
    if attacking.attacking.is_empty() {
        return;
    }
    let outcome = resolve_combat_damage(&attacking.attacking, &defending.blocking, attacking, defending);

    let mut events: Vec<GameEvent> = outcome
        .player_hits
        .iter()
        .map(|&(source, amount)| GameEvent::CombatDamageToPlayer { source, controller: attacker_id, amount })
        .collect();
    events.extend(outcome.deaths.iter().map(|death| GameEvent::Died {
        card: death.card.clone(),
        controller: if death.controller_is_attacker { attacker_id } else { attacker_id.other() },
    }));

    for line in &outcome.log {
        state.push_log(line);
    }
    state.set_pair(attacker_id, outcome.attacking_player, outcome.defending_player);
    process_events(state, events);
}

fn clear_combat(state: &mut GameState) {
    for player in [&mut state.player, &mut state.opponent] {
        player.attacking.clear();
        player.blocking.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::database::CardDatabase;
    use crate::game::player::{AttackRecord, Player, PlayerId};
    use crate::game::zones::{CardInstance, InstanceId, Zone};

    fn game() -> GameState {
        GameState::new(
            Player::new(PlayerId::Player, "Alice", 40),
            Player::new(PlayerId::Opponent, "Bob", 40),
            PlayerId::Player,
            5,
        )
    }

    fn put(state: &mut GameState, owner: PlayerId, zone: Zone, name: &str) -> InstanceId {
        let db = CardDatabase::from_file("cards.json").expect("Failed to load cards");
        let definition = db.get_card(name).expect("card in cards.json");
        let player = state.player_mut(owner);
        let id = player.mint_id();
        player.zones.insert(zone, CardInstance::new(id, definition));
        id
    }

    fn advance_to(mut state: GameState, phase: Phase) -> GameState {
        while state.phase != phase {
            state = advance_phase(&state);
        }
        state
    }

    #[test]
    fn test_advance_does_not_modify_input() {
        let state = game();
        let next = advance_phase(&state);
        assert_eq!(state.phase, Phase::Main1);
        assert_eq!(next.phase, Phase::CombatBegin);
    }

    #[test]
    fn test_turn_increments_once_per_round() {
        let mut state = game();
        state = advance_to(state, Phase::Cleanup);
        state = advance_phase(&state);
        assert_eq!(state.phase, Phase::Untap);
        assert_eq!(state.active_player, PlayerId::Opponent);
        assert_eq!(state.turn, 1);

        state = advance_to(state, Phase::Cleanup);
        state = advance_phase(&state);
        assert_eq!(state.active_player, PlayerId::Player);
        assert_eq!(state.turn, 2);
    }

    #[test]
    fn test_untap_only_for_new_active_player() {
        let mut state = game();
        let forest = put(&mut state, PlayerId::Player, Zone::Battlefield, "Forest");
        let swamp = put(&mut state, PlayerId::Opponent, Zone::Battlefield, "Swamp");
        state.player.zones.battlefield[0].tapped = true;
        state.opponent.zones.battlefield[0].tapped = true;

        let state = pass_turn(&state);
        assert_eq!(state.phase, Phase::Untap);
        assert!(state.opponent.permanent(swamp).is_some_and(|c| !c.tapped));
        assert!(state.player.permanent(forest).is_some_and(|c| c.tapped));
    }

    #[test]
    fn test_draw_step_draws_one() {
        let mut state = game();
        put(&mut state, PlayerId::Opponent, Zone::Library, "Swamp");
        put(&mut state, PlayerId::Opponent, Zone::Library, "Swamp");
        let state = pass_turn(&state);
        let state = advance_to(state, Phase::Draw);
        assert_eq!(state.opponent.zones.hand.len(), 1);
        assert_eq!(state.opponent.zones.library.len(), 1);
    }

    #[test]
    fn test_draw_from_empty_library_is_logged() {
        let state = pass_turn(&game());
        let state = advance_to(state, Phase::Draw);
        assert!(state.log.iter().any(|l| l.contains("library is empty")));
        assert_eq!(state.loser(), None);
    }

    #[test]
    fn test_combat_end_clears_records() {
        let mut state = game();
        let bear = put(&mut state, PlayerId::Player, Zone::Battlefield, "Grizzly Bears");
        state.phase = Phase::CombatBlockers;
        state.player.attacking.push(AttackRecord { attacker: bear, target: PlayerId::Opponent });
        let state = advance_phase(&state);
        assert_eq!(state.opponent.life, 38);
        assert_eq!(state.player.attacking.len(), 1);
        let state = advance_phase(&state);
        assert!(state.player.attacking.is_empty());
    }

    #[test]
    fn test_pass_turn_clears_open_block_choice() {
        let mut state = game();
        state.pending = Some(PendingChoice::DeclareBlockers { defender: PlayerId::Opponent });
        let state = pass_turn(&state);
        assert_eq!(state.pending, None);
    }
}
