//! Applying one resolved effect to a pair of players.
//!
//! Targets default to the opponent's creature with the highest effective
//! power (or the opponent's face for damage) when no explicit target is
//! given. Damage marked on a creature that survives is not tracked.

use crate::card::effects::{
    Amount, CounterKind, CounterTarget, DamageTarget, Effect, ManaProduction, PlayerTarget,
    ReturnScope, SearchSpec,
};
use crate::card::types::{CardDefinition, ManaColor};
use crate::game::combat::destroy_creature;
use crate::game::mana::{converge_count, preferred_color, ManaPool};
use crate::game::player::{Player, PlayerId};
use crate::game::state::{GameState, PendingChoice};
use crate::game::triggers::GameEvent;
use crate::game::zones::{CardInstance, InstanceId, Zone};

const BASIC_LAND_NAMES: [&str; 5] = ["Plains", "Island", "Swamp", "Mountain", "Forest"];

/// Who is applying an effect, from what, and with which spent mana
#[derive(Debug, Clone)]
pub struct EffectContext {
    /// The source as it was when the effect was put into motion
    pub source: CardInstance,
    pub controller: PlayerId,
    pub target: Option<InstanceId>,
    /// Mana spent to cast the source; empty for triggers and abilities
    pub spent: ManaPool,
}

impl EffectContext {
    pub fn new(source: CardInstance, controller: PlayerId) -> Self {
        EffectContext { source, controller, target: None, spent: ManaPool::new() }
    }
}

/// Both players after an effect, plus everything it set in motion
#[derive(Debug, Clone)]
pub struct EffectOutcome {
    /// The controller
    pub player: Player,
    pub opponent: Player,
    pub logs: Vec<String>,
    pub pending: Option<PendingChoice>,
    pub events: Vec<GameEvent>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Mine,
    Theirs,
}

struct Resolver<'a> {
    ctx: &'a EffectContext,
    me: Player,
    them: Player,
    logs: Vec<String>,
    pending: Option<PendingChoice>,
    events: Vec<GameEvent>,
}

/// Apply one effect; the inputs are never modified.
pub fn process_triggered_effect(effect: &Effect, ctx: &EffectContext, player: &Player, opponent: &Player) -> EffectOutcome {
    let mut r = Resolver {
        ctx,
        me: player.clone(),
        them: opponent.clone(),
        logs: Vec::new(),
        pending: None,
        events: Vec::new(),
    };
    r.apply(effect);
    EffectOutcome {
        player: r.me,
        opponent: r.them,
        logs: r.logs,
        pending: r.pending,
        events: r.events,
    }
}

/// Write an outcome back into the game and return the events it raised.
///
/// Only one choice can be pending at a time; a second search raised while
/// another choice is open is skipped.
pub fn apply_outcome(state: &mut GameState, controller: PlayerId, outcome: EffectOutcome) -> Vec<GameEvent> {
    state.set_pair(controller, outcome.player, outcome.opponent);
    for line in outcome.logs {
        state.push_log(line);
    }
    if let Some(choice) = outcome.pending {
        if state.pending.is_none() {
            state.pending = Some(choice);
        } else {
            log::warn!("dropping {:?}: another choice is already pending", choice);
            state.push_log("A second search could not be started and was skipped");
        }
    }
    outcome.events
}

/// Run a list of effects in order against the live game
pub fn resolve_effects(state: &mut GameState, ctx: &EffectContext, effects: &[Effect]) -> Vec<GameEvent> {
    let mut events = Vec::new();
    for effect in effects {
        let (me, them) = state.pair(ctx.controller);
        let outcome = process_triggered_effect(effect, ctx, me, them);
        events.extend(apply_outcome(state, ctx.controller, outcome));
    }
    events
}

pub fn is_basic_land(card: &CardDefinition) -> bool {
    card.is_land()
        && (BASIC_LAND_NAMES.contains(&card.name.as_str())
            || card.subtype.as_deref().is_some_and(|s| s.contains("Basic")))
}

/// Library cards a search may find
pub fn search_candidates(player: &Player, spec: &SearchSpec) -> Vec<InstanceId> {
    player
        .zones
        .library
        .iter()
        .filter(|c| match spec {
            SearchSpec::BasicLand { .. } | SearchSpec::UpToTwoBasicLands { .. } => is_basic_land(&c.definition),
            SearchSpec::TwoLandsToBattlefield { .. } => c.is_land(),
            SearchSpec::BasicOfTypes { land_types, .. } => {
                is_basic_land(&c.definition)
                    && land_types.iter().any(|t| c.name() == t || c.definition.has_subtype(t))
            }
        })
        .map(|c| c.id)
        .collect()
}

impl<'a> Resolver<'a> {
    fn side_mut(&mut self, side: Side) -> &mut Player {
        match side {
            Side::Mine => &mut self.me,
            Side::Theirs => &mut self.them,
        }
    }

    fn side_id(&self, side: Side) -> PlayerId {
        match side {
            Side::Mine => self.me.id,
            Side::Theirs => self.them.id,
        }
    }

    fn source_name(&self) -> &str {
        self.ctx.source.name()
    }

    fn resolve_amount(&self, amount: Amount) -> u32 {
        match amount {
            Amount::Fixed(n) => n,
            Amount::Converge => converge_count(&self.ctx.spent),
            Amount::GoblinsYouControl => self.me.count_subtype("Goblin") as u32,
            Amount::LandsYouControl => self.me.lands_in_play() as u32,
        }
    }

    fn explicit_target(&self) -> Option<(Side, InstanceId)> {
        let id = self.ctx.target?;
        if self.them.permanent(id).is_some() {
            Some((Side::Theirs, id))
        } else if self.me.permanent(id).is_some() {
            Some((Side::Mine, id))
        } else {
            None
        }
    }

    /// Explicit target if it is still on a battlefield, else the biggest
    /// creature on the preferred side
    fn creature_target(&self, prefer: Side) -> Option<(Side, InstanceId)> {
        if let Some(found) = self.explicit_target() {
            return Some(found);
        }
        let player = match prefer {
            Side::Mine => &self.me,
            Side::Theirs => &self.them,
        };
        player.biggest_creature().map(|c| (prefer, c.id))
    }

    fn apply(&mut self, effect: &Effect) {
        match effect {
            Effect::AddMana(production) => self.add_mana(production),
            Effect::Regenerate => {
                let target = if self.ctx.source.is_creature() {
                    Some(self.ctx.source.id)
                } else {
                    self.creature_target(Side::Mine).map(|(_, id)| id)
                };
                match target.and_then(|id| self.me.permanent_mut(id)) {
                    Some(card) => {
                        card.temp.regenerate = true;
                        let line = format!("{} gains a regeneration shield", card.name());
                        self.logs.push(line);
                    }
                    None => self.logs.push(format!("{}: nothing to regenerate", self.source_name())),
                }
            }
            Effect::UntapSelf => {
                let id = self.ctx.source.id;
                if let Some(card) = self.me.permanent_mut(id) {
                    card.tapped = false;
                    let line = format!("{} untaps", card.name());
                    self.logs.push(line);
                }
            }
            Effect::DrawCards { amount } => {
                let n = self.resolve_amount(*amount);
                let mut drawn = 0;
                for _ in 0..n {
                    if self.me.draw_card() {
                        drawn += 1;
                    }
                }
                self.logs.push(format!("{} draws {} card(s)", self.me.name, drawn));
                if drawn < n {
                    self.logs.push(format!("{} could not draw: library is empty", self.me.name));
                }
            }
            Effect::GainLife { amount } => {
                let n = self.resolve_amount(*amount);
                self.me.life += n as i32;
                self.logs.push(format!("{} gains {} life", self.me.name, n));
            }
            Effect::LoseLife { amount, who } => {
                let n = self.resolve_amount(*amount);
                let player = match who {
                    PlayerTarget::You => &mut self.me,
                    PlayerTarget::Opponent => &mut self.them,
                };
                player.life -= n as i32;
                let line = format!("{} loses {} life", player.name, n);
                self.logs.push(line);
            }
            Effect::DealDamage { amount, target } => {
                let n = self.resolve_amount(*amount);
                self.deal_damage(n, *target);
            }
            Effect::Destroy => match self.creature_target(Side::Theirs) {
                Some((side, id)) => self.destroy(side, id),
                None => self.logs.push(format!("{}: no creature to destroy", self.source_name())),
            },
            Effect::CounterSpell { .. } => {
                self.logs.push(format!("{}: there is no spell to counter", self.source_name()));
            }
            Effect::ReturnToHand { scope } => self.return_to_hand(*scope),
            Effect::Scry { amount } => {
                self.logs.push(format!("{} scries {} and keeps the cards on top", self.me.name, amount));
            }
            Effect::Proliferate => self.proliferate(),
            Effect::GivePoison { amount } => {
                self.them.poison += amount;
                self.logs.push(format!("{} gets {} poison counter(s)", self.them.name, amount));
            }
            Effect::PutCounter { kind, amount, target } => self.put_counters(*kind, *amount, *target),
            Effect::CreateToken { token, count } => {
                let n = self.resolve_amount(*count);
                let ids = self.me.create_tokens(token, n);
                self.logs.push(format!(
                    "{} creates {} {}/{} {} token(s)",
                    self.me.name,
                    ids.len(),
                    token.power,
                    token.toughness,
                    token.definition().name
                ));
                let controller = self.me.id;
                self.events.extend(
                    ids.into_iter()
                        .map(|card| GameEvent::EnteredBattlefield { card, controller, is_land: false }),
                );
            }
            Effect::SearchLibrary(spec) => self.search(spec),
            Effect::Pump { power, toughness } => {
                let target = if self.ctx.source.is_creature() && self.me.permanent(self.ctx.source.id).is_some() {
                    Some(self.ctx.source.id)
                } else {
                    self.creature_target(Side::Mine).map(|(_, id)| id)
                };
                match target.and_then(|id| self.me.permanent_mut(id)) {
                    Some(card) => {
                        card.temp.power += power;
                        card.temp.toughness += toughness;
                        let line = format!("{} gets {:+}/{:+} until end of turn", card.name(), power, toughness);
                        self.logs.push(line);
                    }
                    None => self.logs.push(format!("{}: no creature to pump", self.source_name())),
                }
            }
        }
    }

    fn add_mana(&mut self, production: &ManaProduction) {
        let added: Vec<ManaColor> = match production {
            ManaProduction::Fixed(colors) => colors.clone(),
            ManaProduction::OneOf(options) => vec![preferred_color(&self.me, options)],
            ManaProduction::AnyColor { amount } => {
                let color = preferred_color(&self.me, &ManaColor::COLORED);
                vec![color; *amount as usize]
            }
        };
        for &color in &added {
            self.me.mana_pool.add(color, 1);
        }
        let symbols: String = added.iter().map(|c| format!("{{{}}}", c.to_char())).collect();
        self.logs.push(format!("{} adds {}", self.me.name, symbols));
    }

    fn deal_damage(&mut self, amount: u32, target: DamageTarget) {
        let creature = match target {
            DamageTarget::Creature => self.creature_target(Side::Theirs),
            DamageTarget::AnyTarget => self.explicit_target(),
            DamageTarget::Player | DamageTarget::Opponent => None,
        };
        match (creature, target) {
            (Some((side, id)), _) => {
                let player = self.side_mut(side);
                let Some(card) = player.permanent(id) else {
                    return;
                };
                let lethal = amount as i32 >= card.effective_toughness();
                let name = card.name().to_string();
                self.logs.push(format!("{} deals {} damage to {}", self.source_name(), amount, name));
                if lethal {
                    self.destroy(side, id);
                }
            }
            (None, DamageTarget::Creature) => {
                self.logs.push(format!("{}: no creature to damage", self.source_name()));
            }
            (None, _) => {
                self.them.life -= amount as i32;
                self.logs.push(format!("{} deals {} damage to {}", self.source_name(), amount, self.them.name));
            }
        }
    }

    fn destroy(&mut self, side: Side, id: InstanceId) {
        let controller = self.side_id(side);
        let mut lines = Vec::new();
        let died = destroy_creature(self.side_mut(side), id, &mut lines);
        self.logs.extend(lines);
        if let Some(card) = died {
            self.events.push(GameEvent::Died { card, controller });
        }
    }

    fn return_to_hand(&mut self, scope: ReturnScope) {
        let targets: Vec<(Side, InstanceId)> = match scope {
            ReturnScope::TargetPermanent => self.creature_target(Side::Theirs).into_iter().collect(),
            ReturnScope::AllAttacking => {
                let mine = self.me.attacking.iter().map(|a| (Side::Mine, a.attacker));
                let theirs = self.them.attacking.iter().map(|a| (Side::Theirs, a.attacker));
                mine.chain(theirs).collect()
            }
        };
        if targets.is_empty() {
            self.logs.push(format!("{}: nothing to return", self.source_name()));
        }
        for (side, id) in targets {
            let player = self.side_mut(side);
            let Some(name) = player.permanent(id).map(|c| c.name().to_string()) else {
                continue;
            };
            player.attacking.retain(|a| a.attacker != id);
            player.blocking.retain(|b| b.blocker != id);
            player.zones.move_card(Zone::Battlefield, Zone::Hand, id);
            self.logs.push(format!("{} returns to its owner's hand", name));
        }
    }

    fn proliferate(&mut self) {
        let controller = self.me.id;
        let mut placed = Vec::new();
        for card in self.them.zones.battlefield.iter_mut().filter(|c| c.negative_counters > 0) {
            card.add_counters(CounterKind::MinusOne, 1);
            placed.push((card.id, CounterKind::MinusOne));
        }
        for card in self.me.zones.battlefield.iter_mut().filter(|c| c.positive_counters > 0) {
            card.add_counters(CounterKind::PlusOne, 1);
            placed.push((card.id, CounterKind::PlusOne));
        }
        if self.them.poison > 0 {
            self.them.poison += 1;
        }
        self.logs.push(format!("{} proliferates ({} permanent(s))", self.me.name, placed.len()));
        self.events.extend(
            placed
                .into_iter()
                .map(|(target, kind)| GameEvent::CounterPlaced { placer: controller, target, kind }),
        );
    }

    fn put_counters(&mut self, kind: CounterKind, amount: u32, target: CounterTarget) {
        let prefer = match kind {
            CounterKind::MinusOne => Side::Theirs,
            CounterKind::PlusOne => Side::Mine,
        };
        let targets: Vec<(Side, InstanceId)> = match target {
            CounterTarget::ThisPermanent => vec![(Side::Mine, self.ctx.source.id)],
            CounterTarget::TargetCreature => self.creature_target(prefer).into_iter().collect(),
            CounterTarget::AllCreatures { yours_only } => {
                let mut all: Vec<(Side, InstanceId)> = self.me.creatures().map(|c| (Side::Mine, c.id)).collect();
                if !yours_only {
                    all.extend(self.them.creatures().map(|c| (Side::Theirs, c.id)));
                }
                all
            }
        };
        let placer = self.me.id;
        for (side, id) in targets {
            let Some(card) = self.side_mut(side).permanent_mut(id) else {
                continue;
            };
            card.add_counters(kind, amount);
            let line = format!("{} gets {} {} counter(s)", card.name(), amount, kind.label());
            self.logs.push(line);
            self.events.push(GameEvent::CounterPlaced { placer, target: id, kind });
        }
    }

    fn search(&mut self, spec: &SearchSpec) {
        if let SearchSpec::BasicOfTypes { sacrifice_source: true, .. } = spec {
            let id = self.ctx.source.id;
            if self.me.remove_from_battlefield(id) {
                self.logs.push(format!("{} is sacrificed", self.source_name()));
                if self.ctx.source.is_creature() {
                    let controller = self.me.id;
                    self.events.push(GameEvent::Died { card: self.ctx.source.clone(), controller });
                }
            }
        }
        let candidates = search_candidates(&self.me, spec);
        if candidates.is_empty() {
            self.logs.push(format!("{} searches and finds no matching land", self.me.name));
            return;
        }
        self.logs.push(format!("{} searches their library", self.me.name));
        self.pending = Some(PendingChoice::LibrarySearch {
            player: self.me.id,
            source: self.ctx.source.id,
            spec: spec.clone(),
            candidates,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::effects::{TokenKind, TokenSpec};
    use crate::card::types::CardType;
    use std::sync::Arc;

    fn def(name: &str, card_type: CardType, power: Option<i32>, subtype: Option<&str>) -> CardDefinition {
        CardDefinition {
            name: name.to_string(),
            mana_cost: String::new(),
            cmc: 0,
            card_type,
            subtype: subtype.map(str::to_string),
            oracle_text: String::new(),
            power,
            toughness: power,
            colors: vec![],
            is_legendary: false,
        }
    }

    fn put(player: &mut Player, zone: Zone, d: CardDefinition) -> CardInstance {
        let id = player.mint_id();
        let card = CardInstance::new(id, Arc::new(d));
        player.zones.insert(zone, card.clone());
        card
    }

    fn setup() -> (Player, Player, CardInstance) {
        let mut me = Player::new(PlayerId::Player, "Me", 40);
        let them = Player::new(PlayerId::Opponent, "Them", 40);
        let source = put(&mut me, Zone::Battlefield, def("Source", CardType::Creature, Some(2), None));
        (me, them, source)
    }

    #[test]
    fn test_inputs_are_not_modified() {
        let (me, them, source) = setup();
        let ctx = EffectContext::new(source, PlayerId::Player);
        let out = process_triggered_effect(&Effect::GainLife { amount: Amount::Fixed(3) }, &ctx, &me, &them);
        assert_eq!(out.player.life, 43);
        assert_eq!(me.life, 40);
    }

    #[test]
    fn test_converge_amount_uses_spent_mana() {
        let (mut me, them, source) = setup();
        for _ in 0..5 {
            put(&mut me, Zone::Library, def("Island", CardType::Land, None, None));
        }
        let mut ctx = EffectContext::new(source, PlayerId::Player);
        ctx.spent.add(ManaColor::White, 1);
        ctx.spent.add(ManaColor::Black, 1);
        ctx.spent.add(ManaColor::Colorless, 3);
        let out = process_triggered_effect(&Effect::DrawCards { amount: Amount::Converge }, &ctx, &me, &them);
        assert_eq!(out.player.zones.hand.len(), 2);
    }

    #[test]
    fn test_damage_defaults_to_opponent_face() {
        let (me, them, source) = setup();
        let ctx = EffectContext::new(source, PlayerId::Player);
        let effect = Effect::DealDamage { amount: Amount::Fixed(3), target: DamageTarget::AnyTarget };
        let out = process_triggered_effect(&effect, &ctx, &me, &them);
        assert_eq!(out.opponent.life, 37);
    }

    #[test]
    fn test_lethal_damage_to_creature_raises_death() {
        let (me, mut them, source) = setup();
        let bear = put(&mut them, Zone::Battlefield, def("Bear", CardType::Creature, Some(2), None));
        let ctx = EffectContext::new(source, PlayerId::Player);
        let effect = Effect::DealDamage { amount: Amount::Fixed(2), target: DamageTarget::Creature };
        let out = process_triggered_effect(&effect, &ctx, &me, &them);
        assert!(out.opponent.permanent(bear.id).is_none());
        assert_eq!(out.opponent.zones.graveyard.len(), 1);
        assert!(matches!(&out.events[0], GameEvent::Died { card, controller: PlayerId::Opponent } if card.id == bear.id));
    }

    #[test]
    fn test_minus_counter_defaults_to_biggest_enemy() {
        let (me, mut them, source) = setup();
        put(&mut them, Zone::Battlefield, def("Small", CardType::Creature, Some(1), None));
        let big = put(&mut them, Zone::Battlefield, def("Big", CardType::Creature, Some(4), None));
        let ctx = EffectContext::new(source, PlayerId::Player);
        let effect = Effect::PutCounter { kind: CounterKind::MinusOne, amount: 1, target: CounterTarget::TargetCreature };
        let out = process_triggered_effect(&effect, &ctx, &me, &them);
        assert_eq!(out.opponent.permanent(big.id).map(|c| c.negative_counters), Some(1));
        assert!(matches!(out.events[0], GameEvent::CounterPlaced { placer: PlayerId::Player, kind: CounterKind::MinusOne, .. }));
    }

    #[test]
    fn test_goblin_count_token_creation() {
        let (mut me, them, _) = setup();
        let krenko = put(&mut me, Zone::Battlefield, def("Krenko", CardType::Creature, Some(3), Some("Goblin Warrior")));
        put(&mut me, Zone::Battlefield, def("Lackey", CardType::Creature, Some(1), Some("Goblin")));
        let ctx = EffectContext::new(krenko, PlayerId::Player);
        let effect = Effect::CreateToken { token: TokenSpec::new(TokenKind::Goblin), count: Amount::GoblinsYouControl };
        let out = process_triggered_effect(&effect, &ctx, &me, &them);
        assert_eq!(out.player.count_subtype("Goblin"), 4);
        assert_eq!(out.events.len(), 2);
    }

    #[test]
    fn test_search_opens_pending_choice() {
        let (mut me, them, source) = setup();
        put(&mut me, Zone::Library, def("Forest", CardType::Land, None, None));
        put(&mut me, Zone::Library, def("Bear", CardType::Creature, Some(2), None));
        let ctx = EffectContext::new(source.clone(), PlayerId::Player);
        let effect = Effect::SearchLibrary(SearchSpec::BasicLand { tapped: true });
        let out = process_triggered_effect(&effect, &ctx, &me, &them);
        match out.pending {
            Some(PendingChoice::LibrarySearch { player, candidates, .. }) => {
                assert_eq!(player, PlayerId::Player);
                assert_eq!(candidates.len(), 1);
            }
            other => panic!("expected search, got {:?}", other),
        }
    }

    #[test]
    fn test_three_type_search_sacrifices_source() {
        let mut me = Player::new(PlayerId::Player, "Me", 40);
        let them = Player::new(PlayerId::Opponent, "Them", 40);
        let overlook = put(&mut me, Zone::Battlefield, def("Riveteers Overlook", CardType::Land, None, None));
        put(&mut me, Zone::Library, def("Swamp", CardType::Land, None, None));
        put(&mut me, Zone::Library, def("Island", CardType::Land, None, None));
        let ctx = EffectContext::new(overlook.clone(), PlayerId::Player);
        let effect = Effect::SearchLibrary(SearchSpec::BasicOfTypes {
            land_types: vec!["Swamp".to_string(), "Mountain".to_string(), "Forest".to_string()],
            tapped: true,
            sacrifice_source: true,
        });
        let out = process_triggered_effect(&effect, &ctx, &me, &them);
        assert!(out.player.permanent(overlook.id).is_none());
        assert_eq!(out.player.zones.graveyard.len(), 1);
        assert!(matches!(out.pending, Some(PendingChoice::LibrarySearch { ref candidates, .. }) if candidates.len() == 1));
    }

    #[test]
    fn test_any_color_mana_follows_hand() {
        let (mut me, them, source) = setup();
        let mut spell = def("Counterspell", CardType::Instant, None, None);
        spell.mana_cost = "{U}{U}".to_string();
        put(&mut me, Zone::Hand, spell);
        let ctx = EffectContext::new(source, PlayerId::Player);
        let out = process_triggered_effect(&Effect::AddMana(ManaProduction::AnyColor { amount: 1 }), &ctx, &me, &them);
        assert_eq!(out.player.mana_pool.blue, 1);
    }

    #[test]
    fn test_pump_and_regenerate_on_source() {
        let (me, them, source) = setup();
        let ctx = EffectContext::new(source.clone(), PlayerId::Player);
        let out = process_triggered_effect(&Effect::Pump { power: 2, toughness: 2 }, &ctx, &me, &them);
        let pumped = out.player.permanent(source.id).expect("still there");
        assert_eq!(pumped.effective_power(), 4);
        let out = process_triggered_effect(&Effect::Regenerate, &ctx, &out.player, &out.opponent);
        assert!(out.player.permanent(source.id).is_some_and(|c| c.temp.regenerate));
    }
}
