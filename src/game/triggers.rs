//! Game events and the triggered abilities they fire.
//!
//! Events are processed breadth-first from a queue. Each event scans a
//! snapshot of the relevant zones, so permanents created while an event is
//! being handled only see later events. Named hooks in
//! [`special_cards`](crate::game::special_cards) run before and supersede the
//! parsed triggers of their card.

use crate::card::abilities::{parse_card_abilities, ParsedAbility, TriggerCondition};
use crate::card::effects::CounterKind;
use crate::game::player::PlayerId;
use crate::game::resolve::{resolve_effects, EffectContext};
use crate::game::special_cards;
use crate::game::state::GameState;
use crate::game::zones::{CardInstance, InstanceId, Zone};
use std::collections::VecDeque;

/// Upper bound on events handled per batch; stops runaway loops
pub const MAX_EVENTS_PER_BATCH: usize = 256;

#[derive(Debug, Clone)]
pub enum GameEvent {
    EnteredBattlefield { card: InstanceId, controller: PlayerId, is_land: bool },
    CounterPlaced { placer: PlayerId, target: InstanceId, kind: CounterKind },
    CombatDamageToPlayer { source: InstanceId, controller: PlayerId, amount: u32 },
    /// `spell` is a snapshot of the card as it was cast
    SpellCast { spell: CardInstance, caster: PlayerId },
    /// `card` is a snapshot from just before it left the battlefield
    Died { card: CardInstance, controller: PlayerId },
    Attacked { attacker: InstanceId, controller: PlayerId },
    Upkeep { player: PlayerId },
}

/// A card that may respond to an event, and where it was seen
#[derive(Debug, Clone)]
struct Watcher {
    card: CardInstance,
    controller: PlayerId,
    zone: Zone,
}

/// Handle `events` and everything they cause, in order.
pub fn process_events(state: &mut GameState, events: Vec<GameEvent>) {
    let mut queue: VecDeque<GameEvent> = events.into();
    let mut handled = 0usize;
    while let Some(event) = queue.pop_front() {
        if handled == MAX_EVENTS_PER_BATCH {
            log::warn!("trigger chain exceeded {} events; {} left unprocessed", MAX_EVENTS_PER_BATCH, queue.len() + 1);
            state.push_log("Trigger chain stopped: too many events");
            break;
        }
        handled += 1;
        log::trace!("event {:?}", event);
        let raised = fire(state, &event);
        queue.extend(raised);
        queue.extend(state_based_deaths(state));
    }
}

fn watchers(state: &GameState, event: &GameEvent) -> Vec<Watcher> {
    let battlefield = |id: PlayerId| {
        state
            .player(id)
            .zones
            .battlefield
            .iter()
            .map(move |c| Watcher { card: c.clone(), controller: id, zone: Zone::Battlefield })
    };
    match event {
        GameEvent::EnteredBattlefield { controller, .. }
        | GameEvent::CombatDamageToPlayer { controller, .. }
        | GameEvent::Attacked { controller, .. } => battlefield(*controller).collect(),
        GameEvent::CounterPlaced { placer, .. } => battlefield(*placer).collect(),
        GameEvent::Upkeep { player } => battlefield(*player).collect(),
        GameEvent::SpellCast { caster, .. } => {
            let command = state
                .player(*caster)
                .zones
                .command
                .iter()
                .map(|c| Watcher { card: c.clone(), controller: *caster, zone: Zone::Command });
            battlefield(*caster).chain(command).collect()
        }
        GameEvent::Died { card, controller } => {
            let mut all: Vec<Watcher> = battlefield(PlayerId::Player).chain(battlefield(PlayerId::Opponent)).collect();
            all.push(Watcher { card: card.clone(), controller: *controller, zone: Zone::Graveyard });
            all
        }
    }
}

fn fire(state: &mut GameState, event: &GameEvent) -> Vec<GameEvent> {
    let mut raised = Vec::new();
    for watcher in watchers(state, event) {
        if let Some(events) = special_cards::run_hook(state, &watcher.card, watcher.controller, event) {
            raised.extend(events);
            continue;
        }
        for ability in parse_card_abilities(&watcher.card.definition) {
            let ParsedAbility::Triggered { condition, effects, raw_text } = ability else {
                continue;
            };
            if watcher.zone == Zone::Command && !raw_text.to_ascii_lowercase().starts_with("eminence") {
                continue;
            }
            if !condition_matches(&condition, &watcher, event) {
                continue;
            }
            state.push_log(format!("{} triggers: {}", watcher.card.name(), raw_text));
            let ctx = EffectContext::new(watcher.card.clone(), watcher.controller);
            raised.extend(resolve_effects(state, &ctx, &effects));
        }
    }
    raised
}

fn condition_matches(condition: &TriggerCondition, watcher: &Watcher, event: &GameEvent) -> bool {
    let me = &watcher.card;
    match (condition, event) {
        (TriggerCondition::EntersBattlefield, GameEvent::EnteredBattlefield { card, .. }) => *card == me.id,
        (TriggerCondition::Landfall, GameEvent::EnteredBattlefield { is_land, controller, .. }) => {
            *is_land && *controller == watcher.controller
        }
        (TriggerCondition::PutCounter, GameEvent::CounterPlaced { placer, .. }) => *placer == watcher.controller,
        (
            TriggerCondition::DealsCombatDamageToPlayer | TriggerCondition::DealsDamage,
            GameEvent::CombatDamageToPlayer { source, .. },
        ) => *source == me.id,
        (TriggerCondition::CastSpell(filter), GameEvent::SpellCast { spell, caster }) => {
            *caster == watcher.controller && spell.id != me.id && filter.matches(&spell.definition)
        }
        (TriggerCondition::Dies, GameEvent::Died { card, .. }) => card.id == me.id,
        (TriggerCondition::DiesOtherCreature { yours_only }, GameEvent::Died { card, controller }) => {
            card.is_creature() && (!yours_only || *controller == watcher.controller)
        }
        (TriggerCondition::Attacks, GameEvent::Attacked { attacker, .. }) => *attacker == me.id,
        (TriggerCondition::Upkeep, GameEvent::Upkeep { player }) => *player == watcher.controller,
        _ => false,
    }
}

/// Creatures at 0 toughness die; regeneration does not save them
fn state_based_deaths(state: &mut GameState) -> Vec<GameEvent> {
    let mut deaths = Vec::new();
    for id in [PlayerId::Player, PlayerId::Opponent] {
        let doomed: Vec<CardInstance> = state
            .player(id)
            .creatures()
            .filter(|c| c.effective_toughness() <= 0)
            .cloned()
            .collect();
        for card in doomed {
            state.player_mut(id).remove_from_battlefield(card.id);
            state.push_log(format!("{} has 0 toughness and dies", card.name()));
            deaths.push(GameEvent::Died { card, controller: id });
        }
    }
    deaths
}
