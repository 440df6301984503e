use crate::card::abilities::{activated_abilities, has_keyword, parse_spell_effect, Keyword, ParsedAbility};
use crate::card::effects::Effect;
use crate::card::types::ManaColor;
use crate::game::actions::Action;
use crate::game::mana::{can_pay_cost, land_mana};
use crate::game::player::{BlockRecord, Player, PlayerId};
use crate::game::state::{GameState, PendingChoice};
use crate::game::zones::{CardInstance, InstanceId, Zone};
use std::collections::HashSet;

/// Default choices for an AI-controlled player
pub struct DecisionEngine;

impl DecisionEngine {
    /// Next thing to do in a main phase, or `None` to move on.
    ///
    /// Order: land drop, free tap abilities that build a board, then the
    /// most expensive affordable spell (the commander wins ties).
    pub fn choose_main_phase_action(state: &GameState, actor: PlayerId) -> Option<Action> {
        let player = state.player(actor);
        if let Some(card) = Self::choose_land_to_play(player) {
            return Some(Action::PlayCard { card, target: None });
        }
        if let Some((card, index)) = Self::choose_free_ability(player) {
            return Some(Action::ActivateAbility { card, index, target: None });
        }
        Self::choose_spell(player).map(|card| Action::PlayCard { card, target: None })
    }

    /// Land from hand that adds a color the hand is missing, else the first land
    pub fn choose_land_to_play(player: &Player) -> Option<InstanceId> {
        if player.has_played_land_this_turn {
            return None;
        }
        let lands: Vec<&CardInstance> = player.zones.hand.iter().filter(|c| c.is_land()).collect();
        let first = lands.first()?.id;

        let mut available: HashSet<ManaColor> = HashSet::new();
        for land in player.zones.battlefield.iter().filter(|c| c.is_land()) {
            let mana = land_mana(&land.definition);
            available.extend(ManaColor::ALL.iter().filter(|&&c| mana.can_produce(c)));
        }
        let missing: HashSet<ManaColor> = player
            .zones
            .hand
            .iter()
            .chain(player.zones.command.iter())
            .flat_map(|c| c.definition.cost().specific_requirements())
            .map(|(color, _)| color)
            .filter(|c| !available.contains(c))
            .collect();

        let fixer = lands.iter().find(|land| {
            let mana = land_mana(&land.definition);
            missing.iter().any(|&c| mana.can_produce(c))
        });
        Some(fixer.map(|c| c.id).unwrap_or(first))
    }

    /// Untapped permanent with a tap-only ability that makes tokens or
    /// draws cards
    fn choose_free_ability(player: &Player) -> Option<(InstanceId, usize)> {
        player.zones.battlefield.iter().filter(|c| !c.tapped).find_map(|card| {
            activated_abilities(&card.definition)
                .iter()
                .position(|ability| match ability {
                    ParsedAbility::Activated { cost, effects, .. } => {
                        cost.tap
                            && cost.mana.is_none()
                            && cost.sacrifice.is_none()
                            && cost.life == 0
                            && !cost.minus_counter_on_self
                            && effects
                                .iter()
                                .any(|e| matches!(e, Effect::CreateToken { .. } | Effect::DrawCards { .. }))
                    }
                    _ => false,
                })
                .map(|index| (card.id, index))
        })
    }

    fn choose_spell(player: &Player) -> Option<InstanceId> {
        let castable = |card: &&CardInstance| {
            if card.is_land() || !can_pay_cost(player, &card.definition.cost()) {
                return false;
            }
            match parse_spell_effect(&card.definition) {
                Some(ParsedAbility::Spell { effects, .. }) => effects
                    .iter()
                    .any(|e| !matches!(e, Effect::CounterSpell { .. } | Effect::Scry { .. })),
                _ => true,
            }
        };
        player
            .zones
            .command
            .iter()
            .chain(player.zones.hand.iter())
            .filter(castable)
            .max_by_key(|c| (c.definition.cmc, c.is_commander))
            .map(|c| c.id)
    }

    /// Creatures worth sending in: anything the defender cannot block
    /// profitably, or everything when the swing is lethal
    pub fn choose_attackers(state: &GameState, actor: PlayerId) -> Vec<InstanceId> {
        let (me, them) = state.pair(actor);
        let ready: Vec<&CardInstance> = me
            .creatures()
            .filter(|c| !c.tapped && c.effective_power() > 0)
            .collect();
        let total: i32 = ready.iter().map(|c| c.effective_power()).sum();
        let blockers: Vec<&CardInstance> = them.creatures().filter(|c| !c.tapped).collect();
        if total >= them.life && blockers.is_empty() {
            return ready.iter().map(|c| c.id).collect();
        }

        ready
            .into_iter()
            .filter(|attacker| {
                let flying = has_keyword(&attacker.definition, Keyword::Flying);
                !blockers.iter().any(|b| {
                    can_block(flying, b)
                        && b.effective_power() >= attacker.effective_toughness()
                        && b.effective_toughness() > attacker.effective_power()
                })
            })
            .map(|c| c.id)
            .collect()
    }

    /// Blocks that kill an attacker and survive, then even trades, then
    /// chump blocks only when the unblocked damage would be lethal
    pub fn choose_blocks(state: &GameState, defender: PlayerId) -> Vec<BlockRecord> {
        let (me, them) = state.pair(defender);
        let mut attackers: Vec<&CardInstance> = them
            .attacking
            .iter()
            .filter_map(|a| them.permanent(a.attacker))
            .collect();
        attackers.sort_by_key(|a| std::cmp::Reverse(a.effective_power()));

        let mut available: Vec<&CardInstance> = me.creatures().filter(|c| !c.tapped).collect();
        let mut blocks = Vec::new();
        let mut unblocked_damage: i32 = 0;
        let mut unblocked_poison: i32 = 0;
        let mut chump_candidates = Vec::new();

        for attacker in attackers {
            let flying = has_keyword(&attacker.definition, Keyword::Flying);
            let power = attacker.effective_power();
            let toughness = attacker.effective_toughness();

            let good = available
                .iter()
                .filter(|b| can_block(flying, b))
                .filter(|b| b.effective_toughness() > power)
                .min_by_key(|b| (std::cmp::Reverse(b.effective_power() >= toughness), b.effective_power()))
                .or_else(|| {
                    available
                        .iter()
                        .filter(|b| can_block(flying, b))
                        .filter(|b| b.effective_power() >= toughness && b.definition.cmc <= attacker.definition.cmc)
                        .min_by_key(|b| b.definition.cmc)
                })
                .map(|b| b.id);

            match good {
                Some(blocker) => {
                    available.retain(|b| b.id != blocker);
                    blocks.push(BlockRecord { blocker, attacker: attacker.id });
                }
                None => {
                    let infect = has_keyword(&attacker.definition, Keyword::Infect);
                    if infect {
                        unblocked_poison += power;
                    } else {
                        unblocked_damage += power;
                    }
                    chump_candidates.push((attacker.id, power, flying, infect));
                }
            }
        }

        for (attacker, power, flying, infect) in chump_candidates {
            let lethal = unblocked_damage >= me.life || unblocked_poison + me.poison as i32 >= 10;
            if !lethal {
                break;
            }
            let chump = available
                .iter()
                .filter(|b| can_block(flying, b))
                .min_by_key(|b| (b.definition.cmc, b.effective_power()))
                .map(|b| b.id);
            if let Some(blocker) = chump {
                available.retain(|b| b.id != blocker);
                blocks.push(BlockRecord { blocker, attacker });
                if infect {
                    unblocked_poison -= power;
                } else {
                    unblocked_damage -= power;
                }
            }
        }
        blocks
    }

    /// Cards to take for the pending search: distinct names first, in
    /// library order, up to the search's limit
    pub fn choose_search(state: &GameState) -> Option<(PlayerId, Vec<InstanceId>)> {
        let Some(PendingChoice::LibrarySearch { player, spec, candidates, .. }) = &state.pending else {
            return None;
        };
        let library = state.player(*player);
        let mut names = HashSet::new();
        let mut chosen: Vec<InstanceId> = candidates
            .iter()
            .filter(|&&id| {
                library
                    .zones
                    .get(Zone::Library, id)
                    .is_some_and(|c| names.insert(c.name().to_string()))
            })
            .copied()
            .take(spec.max_cards())
            .collect();
        if chosen.len() < spec.max_cards() {
            let extra: Vec<InstanceId> = candidates
                .iter()
                .filter(|id| !chosen.contains(id))
                .copied()
                .take(spec.max_cards() - chosen.len())
                .collect();
            chosen.extend(extra);
        }
        Some((*player, chosen))
    }
}

fn can_block(attacker_flies: bool, blocker: &CardInstance) -> bool {
    !attacker_flies
        || has_keyword(&blocker.definition, Keyword::Flying)
        || has_keyword(&blocker.definition, Keyword::Reach)
}
