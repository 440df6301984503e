//! Hand-written behavior for cards whose rules text the parser cannot
//! express faithfully, keyed by exact card name.
//!
//! A hook returns `Some` when it handled the event for its card; the card's
//! parsed triggers are then skipped for that event. `None` lets the parsed
//! triggers run.

use crate::card::effects::{CounterKind, TokenKind, TokenSpec};
use crate::card::types::ManaCost;
use crate::game::mana::pay_cost;
use crate::game::player::PlayerId;
use crate::game::state::GameState;
use crate::game::triggers::GameEvent;
use crate::game::zones::{CardInstance, Zone};

type Hook = fn(&mut GameState, &CardInstance, PlayerId, &GameEvent) -> Option<Vec<GameEvent>>;

const HOOKS: [(&str, Hook); 4] = [
    ("Hapatra, Vizier of Poisons", hapatra),
    ("Blood Artist", blood_artist),
    ("Goblin Lackey", goblin_lackey),
    ("Edgar Markov", edgar_markov),
];

pub fn has_hook(card_name: &str) -> bool {
    HOOKS.iter().any(|(name, _)| *name == card_name)
}

pub fn run_hook(
    state: &mut GameState,
    source: &CardInstance,
    controller: PlayerId,
    event: &GameEvent,
) -> Option<Vec<GameEvent>> {
    let (_, hook) = HOOKS.iter().find(|(name, _)| *name == source.name())?;
    hook(state, source, controller, event)
}

/// Combat damage to a player puts a -1/-1 counter on the opponent's biggest
/// creature; each -1/-1 counter its controller places offers a Snake for {1}.
fn hapatra(state: &mut GameState, source: &CardInstance, controller: PlayerId, event: &GameEvent) -> Option<Vec<GameEvent>> {
    match event {
        GameEvent::CombatDamageToPlayer { source: hitter, .. } if *hitter == source.id => {
            let opponent = state.player_mut(controller.other());
            let Some(target) = opponent.biggest_creature().map(|c| c.id) else {
                state.push_log(format!("{}: no creature to put a -1/-1 counter on", source.name()));
                return Some(Vec::new());
            };
            let mut name = String::new();
            if let Some(card) = opponent.permanent_mut(target) {
                card.add_counters(CounterKind::MinusOne, 1);
                name = card.name().to_string();
            }
            state.push_log(format!("{} puts a -1/-1 counter on {}", source.name(), name));
            Some(vec![GameEvent::CounterPlaced { placer: controller, target, kind: CounterKind::MinusOne }])
        }
        GameEvent::CounterPlaced { placer, kind: CounterKind::MinusOne, .. } if *placer == controller => {
            let cost = ManaCost { generic: 1, ..Default::default() };
            let Some(payment) = pay_cost(state.player(controller), &cost) else {
                state.push_log(format!("{}: cannot pay {{1}} for a Snake", source.name()));
                return Some(Vec::new());
            };
            *state.player_mut(controller) = payment.player;
            let snakes = state.player_mut(controller).create_tokens(&TokenSpec::new(TokenKind::Snake), 1);
            state.push_log(format!("{} pays {{1}} and creates a Snake", source.name()));
            Some(
                snakes
                    .into_iter()
                    .map(|card| GameEvent::EnteredBattlefield { card, controller, is_land: false })
                    .collect(),
            )
        }
        _ => None,
    }
}

/// Any creature dying drains the opponent for 1
fn blood_artist(state: &mut GameState, source: &CardInstance, controller: PlayerId, event: &GameEvent) -> Option<Vec<GameEvent>> {
    let GameEvent::Died { card, .. } = event else {
        return None;
    };
    if !card.is_creature() {
        return Some(Vec::new());
    }
    state.player_mut(controller).life += 1;
    state.player_mut(controller.other()).life -= 1;
    let them = state.player(controller.other()).name.clone();
    state.push_log(format!("{}: {} died, {} loses 1 life and you gain 1", source.name(), card.name(), them));
    Some(Vec::new())
}

/// Combat damage to a player puts a Goblin from hand onto the battlefield
fn goblin_lackey(state: &mut GameState, source: &CardInstance, controller: PlayerId, event: &GameEvent) -> Option<Vec<GameEvent>> {
    match event {
        GameEvent::CombatDamageToPlayer { source: hitter, .. } if *hitter == source.id => {
            let player = state.player_mut(controller);
            let goblin = player
                .zones
                .hand
                .iter()
                .find(|c| c.is_creature() && c.definition.has_subtype("Goblin"))
                .map(|c| (c.id, c.name().to_string()));
            let Some((id, name)) = goblin else {
                state.push_log(format!("{}: no Goblin in hand", source.name()));
                return Some(Vec::new());
            };
            player.zones.move_card(Zone::Hand, Zone::Battlefield, id);
            state.push_log(format!("{} puts {} onto the battlefield", source.name(), name));
            Some(vec![GameEvent::EnteredBattlefield { card: id, controller, is_land: false }])
        }
        _ => None,
    }
}

/// Casting another Vampire creature spell makes a 1/1 Vampire, from the
/// battlefield or the command zone
fn edgar_markov(state: &mut GameState, source: &CardInstance, controller: PlayerId, event: &GameEvent) -> Option<Vec<GameEvent>> {
    let GameEvent::SpellCast { spell, caster } = event else {
        return None;
    };
    if *caster != controller || spell.id == source.id || !spell.is_creature() || !spell.definition.has_subtype("Vampire") {
        return Some(Vec::new());
    }
    let tokens = state.player_mut(controller).create_tokens(&TokenSpec::new(TokenKind::Vampire), 1);
    state.push_log(format!("{}: casting {} creates a Vampire", source.name(), spell.name()));
    Some(
        tokens
            .into_iter()
            .map(|card| GameEvent::EnteredBattlefield { card, controller, is_land: false })
            .collect(),
    )
}
