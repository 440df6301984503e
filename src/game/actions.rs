//! Public action entry points.
//!
//! [`perform`] never modifies its input: it returns the next state or an
//! error, and a refused action has no effect at all. [`perform_logged`]
//! folds every error into a game-log line instead.

use crate::card::abilities::{activated_abilities, has_keyword, parse_spell_effect, Keyword, ParsedAbility, SacrificeCost};
use crate::card::effects::{CounterKind, SearchSpec};
use crate::card::types::CardType;
use crate::game::mana::{can_pay_cost, pay_cost};
use crate::game::player::{AttackRecord, BlockRecord, PlayerId};
use crate::game::resolve::{resolve_effects, EffectContext};
use crate::game::state::{GameState, PendingChoice, Phase};
use crate::game::triggers::{process_events, GameEvent};
use crate::game::turns;
use crate::game::zones::{CardInstance, InstanceId, Zone};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// Play a land or cast a spell from hand, or cast the commander
    PlayCard { card: InstanceId, target: Option<InstanceId> },
    DeclareAttackers { attackers: Vec<InstanceId> },
    DeclareBlockers { blocks: Vec<BlockRecord> },
    /// `index` counts activated abilities only, in rules-text order
    ActivateAbility { card: InstanceId, index: usize, target: Option<InstanceId> },
    /// Cards picked for the pending library search; may be empty
    ResolveSearch { chosen: Vec<InstanceId> },
    AdvancePhase,
    PassTurn,
    ChangeLife { player: PlayerId, delta: i32 },
}

/// A well-formed action that the rules do not allow right now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Refusal {
    #[error("not enough mana")]
    NotEnoughMana,
    #[error("a land was already played this turn")]
    LandAlreadyPlayed,
    #[error("not allowed during the {} step", .phase.name())]
    WrongPhase { phase: Phase },
    #[error("only the active player can do that")]
    NotActivePlayer,
    #[error("it is not this player's combat step")]
    NotYourCombatStep,
    #[error("already tapped")]
    AlreadyTapped,
    #[error("not tapped")]
    NotTapped,
    #[error("not a creature")]
    NotACreature,
    #[error("that creature is not attacking")]
    NotAttacking,
    #[error("only creatures with flying or reach can block a flyer")]
    CannotBlockFlyer,
    #[error("the cost cannot be paid")]
    CostUnpayable,
    #[error("a choice is pending")]
    ChoicePending,
    #[error("there is no choice to make")]
    NoChoicePending,
    #[error("invalid choice")]
    InvalidChoice,
    #[error("not on the battlefield")]
    NotOnBattlefield,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error(transparent)]
    Refused(#[from] Refusal),
    #[error("card {card} is not in the expected zone ({zone})")]
    UnknownCard { card: InstanceId, zone: Zone },
    #[error("card {card} has no activated ability #{index}")]
    NoSuchAbility { card: InstanceId, index: usize },
}

/// Apply `action` for `actor`, or explain why not.
pub fn perform(state: &GameState, actor: PlayerId, action: &Action) -> Result<GameState, ActionError> {
    if let Some(PendingChoice::LibrarySearch { .. }) = state.pending {
        if !matches!(action, Action::ResolveSearch { .. } | Action::ChangeLife { .. }) {
            return Err(Refusal::ChoicePending.into());
        }
    }

    let mut next = state.clone();
    match action {
        Action::PlayCard { card, target } => play_card(&mut next, actor, *card, *target)?,
        Action::DeclareAttackers { attackers } => declare_attackers(&mut next, actor, attackers)?,
        Action::DeclareBlockers { blocks } => declare_blockers(&mut next, actor, blocks)?,
        Action::ActivateAbility { card, index, target } => activate_ability(&mut next, actor, *card, *index, *target)?,
        Action::ResolveSearch { chosen } => resolve_search(&mut next, actor, chosen)?,
        Action::AdvancePhase => {
            require_active(&next, actor)?;
            turns::step(&mut next);
        }
        Action::PassTurn => {
            require_active(&next, actor)?;
            next = turns::pass_turn(&next);
        }
        Action::ChangeLife { player, delta } => {
            let target = next.player_mut(*player);
            target.life += delta;
            let line = format!("{}'s life changes by {:+} to {}", target.name, delta, target.life);
            next.push_log(line);
        }
    }
    Ok(next)
}

/// Like [`perform`], but an error becomes a game-log line on the unchanged state
pub fn perform_logged(state: &GameState, actor: PlayerId, action: &Action) -> GameState {
    match perform(state, actor, action) {
        Ok(next) => next,
        Err(err) => {
            if !matches!(err, ActionError::Refused(_)) {
                log::warn!("{} sent an inconsistent action {:?}: {}", actor, action, err);
            }
            let mut next = state.clone();
            let name = next.player(actor).name.clone();
            next.push_log(format!("{} cannot do that: {}", name, err));
            next
        }
    }
}

fn require_active(state: &GameState, actor: PlayerId) -> Result<(), Refusal> {
    if state.active_player != actor {
        return Err(Refusal::NotActivePlayer);
    }
    Ok(())
}

/// The active player's own main phase
fn require_sorcery_timing(state: &GameState, actor: PlayerId) -> Result<(), Refusal> {
    require_active(state, actor)?;
    if !state.phase.is_main() {
        return Err(Refusal::WrongPhase { phase: state.phase });
    }
    Ok(())
}

fn play_card(state: &mut GameState, actor: PlayerId, card: InstanceId, target: Option<InstanceId>) -> Result<(), ActionError> {
    let player = state.player(actor);
    let (zone, instance) = [Zone::Hand, Zone::Command]
        .into_iter()
        .find_map(|z| player.zones.get(z, card).map(|c| (z, c.clone())))
        .ok_or(ActionError::UnknownCard { card, zone: Zone::Hand })?;

    if instance.is_land() {
        require_sorcery_timing(state, actor)?;
        if player.has_played_land_this_turn {
            return Err(Refusal::LandAlreadyPlayed.into());
        }
        let player = state.player_mut(actor);
        player.zones.move_card(zone, Zone::Battlefield, card);
        player.has_played_land_this_turn = true;
        let line = format!("{} plays {}", player.name, instance.name());
        state.push_log(line);
        process_events(state, vec![GameEvent::EnteredBattlefield { card, controller: actor, is_land: true }]);
        return Ok(());
    }

    let definition = instance.definition.clone();
    if definition.card_type != CardType::Instant {
        require_sorcery_timing(state, actor)?;
    }
    let cost = definition.cost();
    if !can_pay_cost(player, &cost) {
        return Err(Refusal::NotEnoughMana.into());
    }
    let payment = pay_cost(player, &cost).ok_or(Refusal::NotEnoughMana)?;
    let spent = payment.spent;
    *state.player_mut(actor) = payment.player;

    let player = state.player_mut(actor);
    let spell = player
        .zones
        .remove(zone, card)
        .ok_or(ActionError::UnknownCard { card, zone })?;
    let line = format!("{} casts {}", player.name, spell.name());
    state.push_log(line);

    let mut events = Vec::new();
    if definition.card_type.is_permanent() {
        state.player_mut(actor).zones.insert(Zone::Battlefield, spell.clone());
        events.push(GameEvent::EnteredBattlefield { card, controller: actor, is_land: false });
    } else {
        if let Some(ParsedAbility::Spell { effects, .. }) = parse_spell_effect(&definition) {
            let ctx = EffectContext { source: spell.clone(), controller: actor, target, spent };
            events.extend(resolve_effects(state, &ctx, &effects));
        }
        state.player_mut(actor).zones.insert(Zone::Graveyard, spell.clone());
    }
    events.push(GameEvent::SpellCast { spell, caster: actor });
    process_events(state, events);
    Ok(())
}

fn declare_attackers(state: &mut GameState, actor: PlayerId, attackers: &[InstanceId]) -> Result<(), ActionError> {
    require_active(state, actor)?;
    if state.phase != Phase::CombatAttackers {
        return Err(Refusal::WrongPhase { phase: state.phase }.into());
    }
    if state.pending.is_some() || !state.player(actor).attacking.is_empty() {
        return Err(Refusal::ChoicePending.into());
    }

    let mut chosen: Vec<InstanceId> = Vec::new();
    for &id in attackers {
        let card = state
            .player(actor)
            .permanent(id)
            .ok_or(ActionError::UnknownCard { card: id, zone: Zone::Battlefield })?;
        if !card.is_creature() {
            return Err(Refusal::NotACreature.into());
        }
        if card.tapped {
            return Err(Refusal::AlreadyTapped.into());
        }
        if !chosen.contains(&id) {
            chosen.push(id);
        }
    }

    let defender = actor.other();
    if chosen.is_empty() {
        let line = format!("{} declares no attackers", state.player(actor).name);
        state.push_log(line);
        return Ok(());
    }

    let player = state.player_mut(actor);
    let mut names = Vec::new();
    for &id in &chosen {
        if let Some(card) = player.permanent_mut(id) {
            if !has_keyword(&card.definition, Keyword::Vigilance) {
                card.tapped = true;
            }
            names.push(card.name().to_string());
        }
        player.attacking.push(AttackRecord { attacker: id, target: defender });
    }
    let line = format!("{} attacks with {}", player.name, names.join(", "));
    state.push_log(line);
    state.pending = Some(PendingChoice::DeclareBlockers { defender });

    let events = chosen
        .into_iter()
        .map(|attacker| GameEvent::Attacked { attacker, controller: actor })
        .collect();
    process_events(state, events);
    Ok(())
}

fn declare_blockers(state: &mut GameState, actor: PlayerId, blocks: &[BlockRecord]) -> Result<(), ActionError> {
    match state.pending {
        Some(PendingChoice::DeclareBlockers { defender }) if defender == actor => {}
        Some(PendingChoice::DeclareBlockers { .. }) => return Err(Refusal::NotYourCombatStep.into()),
        _ => return Err(Refusal::NoChoicePending.into()),
    }
    if !matches!(state.phase, Phase::CombatAttackers | Phase::CombatBlockers) {
        return Err(Refusal::WrongPhase { phase: state.phase }.into());
    }

    let (defender, attacker) = state.pair(actor);
    let mut lines = Vec::new();
    for block in blocks {
        let blocker = defender
            .permanent(block.blocker)
            .ok_or(ActionError::UnknownCard { card: block.blocker, zone: Zone::Battlefield })?;
        if !blocker.is_creature() {
            return Err(Refusal::NotACreature.into());
        }
        if blocker.tapped {
            return Err(Refusal::AlreadyTapped.into());
        }
        if !attacker.is_attacking(block.attacker) {
            return Err(Refusal::NotAttacking.into());
        }
        let attacking = attacker.permanent(block.attacker).ok_or(Refusal::NotOnBattlefield)?;
        if has_keyword(&attacking.definition, Keyword::Flying)
            && !has_keyword(&blocker.definition, Keyword::Flying)
            && !has_keyword(&blocker.definition, Keyword::Reach)
        {
            return Err(Refusal::CannotBlockFlyer.into());
        }
        lines.push(format!("{} blocks {}", blocker.name(), attacking.name()));
    }

    if lines.is_empty() {
        lines.push(format!("{} declares no blockers", defender.name));
    }
    state.player_mut(actor).blocking = blocks.to_vec();
    state.pending = None;
    for line in lines {
        state.push_log(line);
    }
    Ok(())
}

fn activate_ability(
    state: &mut GameState,
    actor: PlayerId,
    card: InstanceId,
    index: usize,
    target: Option<InstanceId>,
) -> Result<(), ActionError> {
    let source = state
        .player(actor)
        .permanent(card)
        .cloned()
        .ok_or(ActionError::UnknownCard { card, zone: Zone::Battlefield })?;
    let Some(ParsedAbility::Activated { cost, effects, raw_text }) = activated_abilities(&source.definition).into_iter().nth(index) else {
        return Err(ActionError::NoSuchAbility { card, index });
    };

    let mut player = state.player(actor).clone();
    let mut events = Vec::new();

    if cost.tap || cost.untap {
        let permanent = player.permanent_mut(card).ok_or(Refusal::NotOnBattlefield)?;
        if cost.tap {
            if permanent.tapped {
                return Err(Refusal::AlreadyTapped.into());
            }
            permanent.tapped = true;
        } else {
            if !permanent.tapped {
                return Err(Refusal::NotTapped.into());
            }
            permanent.tapped = false;
        }
    }

    if let Some(sacrifice) = &cost.sacrifice {
        let victim = match sacrifice {
            SacrificeCost::This => source.clone(),
            SacrificeCost::Another(qualifier) => player
                .zones
                .battlefield
                .iter()
                .filter(|c| c.id != card && matches_qualifier(c, qualifier))
                .min_by_key(|c| (c.effective_power(), c.effective_toughness()))
                .cloned()
                .ok_or(Refusal::CostUnpayable)?,
        };
        player.remove_from_battlefield(victim.id);
        if victim.is_creature() {
            events.push(GameEvent::Died { card: victim, controller: actor });
        }
    }

    if cost.minus_counter_on_self {
        let permanent = player.permanent_mut(card).ok_or(Refusal::CostUnpayable)?;
        permanent.add_counters(CounterKind::MinusOne, 1);
        events.push(GameEvent::CounterPlaced { placer: actor, target: card, kind: CounterKind::MinusOne });
    }

    if cost.life > 0 {
        if player.life < cost.life as i32 {
            return Err(Refusal::CostUnpayable.into());
        }
        player.life -= cost.life as i32;
    }

    if let Some(mana) = &cost.mana {
        if !can_pay_cost(&player, mana) {
            return Err(Refusal::NotEnoughMana.into());
        }
        player = pay_cost(&player, mana).ok_or(Refusal::NotEnoughMana)?.player;
    }

    let line = format!("{} activates {}: {}", player.name, source.name(), raw_text);
    *state.player_mut(actor) = player;
    state.push_log(line);

    let ctx = EffectContext { source, controller: actor, target, spent: Default::default() };
    events.extend(resolve_effects(state, &ctx, &effects));
    process_events(state, events);
    Ok(())
}

fn matches_qualifier(card: &CardInstance, qualifier: &str) -> bool {
    match qualifier {
        "creature" => card.is_creature(),
        "land" => card.is_land(),
        "permanent" => true,
        subtype => card.definition.has_subtype(subtype),
    }
}

fn resolve_search(state: &mut GameState, actor: PlayerId, chosen: &[InstanceId]) -> Result<(), ActionError> {
    let Some(PendingChoice::LibrarySearch { player, spec, candidates, .. }) = state.pending.clone() else {
        return Err(Refusal::NoChoicePending.into());
    };
    if player != actor {
        return Err(Refusal::InvalidChoice.into());
    }
    let distinct = chosen.iter().enumerate().all(|(i, id)| !chosen[..i].contains(id));
    if chosen.len() > spec.max_cards() || !distinct || chosen.iter().any(|id| !candidates.contains(id)) {
        return Err(Refusal::InvalidChoice.into());
    }

    state.pending = None;
    let searcher = state.player_mut(actor);
    let mut events = Vec::new();
    let mut lines = Vec::new();
    for (i, &id) in chosen.iter().enumerate() {
        let to_hand = matches!(spec, SearchSpec::UpToTwoBasicLands { .. }) && i > 0;
        let destination = if to_hand { Zone::Hand } else { Zone::Battlefield };
        if !searcher.zones.move_card(Zone::Library, destination, id) {
            return Err(ActionError::UnknownCard { card: id, zone: Zone::Library });
        }
        let Some(found) = searcher.zones.get_mut(destination, id) else {
            continue;
        };
        if destination == Zone::Battlefield {
            found.tapped = spec.tapped();
            events.push(GameEvent::EnteredBattlefield { card: id, controller: actor, is_land: found.is_land() });
        }
        lines.push(format!("{} puts {} into their {}", searcher.name, found.name(), destination));
    }
    if chosen.is_empty() {
        lines.push(format!("{} finds nothing", searcher.name));
    }
    for line in lines {
        state.push_log(line);
    }
    state.shuffle_library(actor);
    process_events(state, events);
    Ok(())
}
