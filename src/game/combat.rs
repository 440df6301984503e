//! Combat damage resolution.
//!
//! Every block pair is computed independently and at full power from the
//! pre-combat snapshot: an attacker blocked by two creatures deals its full
//! power to each of them. Removals are applied only after all pairs are
//! computed. First strike, trample, deathtouch and lifelink are not modeled.

use crate::card::abilities::{has_keyword, Keyword};
use crate::game::player::{AttackRecord, BlockRecord, Player};
use crate::game::zones::{CardInstance, InstanceId};
use std::collections::BTreeSet;

/// A creature that died in combat, as it was just before dying
#[derive(Debug, Clone)]
pub struct CombatDeath {
    pub card: CardInstance,
    pub controller_is_attacker: bool,
}

#[derive(Debug, Clone)]
pub struct CombatOutcome {
    pub attacking_player: Player,
    pub defending_player: Player,
    /// Ordinary damage dealt to the defending player
    pub damage_to_defender: u32,
    pub poison_to_defender: u32,
    pub commander_damage: u32,
    /// Unblocked attackers, each with the damage it dealt (possibly 0)
    pub player_hits: Vec<(InstanceId, u32)>,
    pub deaths: Vec<CombatDeath>,
    pub log: Vec<String>,
}

/// Resolve combat damage between `attacking` and `defending`.
///
/// Block pairs referencing creatures that are no longer on the battlefield
/// are skipped.
pub fn resolve_combat_damage(
    attackers: &[AttackRecord],
    blocks: &[BlockRecord],
    attacking: &Player,
    defending: &Player,
) -> CombatOutcome {
    let mut log = Vec::new();
    let mut attacker_deaths: BTreeSet<InstanceId> = BTreeSet::new();
    let mut blocker_deaths: BTreeSet<InstanceId> = BTreeSet::new();
    let mut blocked: BTreeSet<InstanceId> = BTreeSet::new();

    for block in blocks {
        let (Some(attacker), Some(blocker)) = (attacking.permanent(block.attacker), defending.permanent(block.blocker)) else {
            log::warn!("skipping block {} -> {}: creature left the battlefield", block.blocker, block.attacker);
            continue;
        };
        if !attackers.iter().any(|a| a.attacker == block.attacker) {
            continue;
        }
        blocked.insert(attacker.id);

        let attacker_power = attacker.effective_power();
        let blocker_power = blocker.effective_power();
        log.push(format!(
            "{} ({}/{}) blocks {} ({}/{})",
            blocker.name(),
            blocker_power,
            blocker.effective_toughness(),
            attacker.name(),
            attacker_power,
            attacker.effective_toughness()
        ));
        if attacker_power >= blocker.effective_toughness() {
            blocker_deaths.insert(blocker.id);
        }
        if blocker_power >= attacker.effective_toughness() {
            attacker_deaths.insert(attacker.id);
        }
    }

    let mut damage_to_defender = 0u32;
    let mut poison_to_defender = 0u32;
    let mut commander_damage = 0u32;
    let mut player_hits = Vec::new();

    for record in attackers {
        if blocked.contains(&record.attacker) {
            continue;
        }
        let Some(attacker) = attacking.permanent(record.attacker) else {
            continue;
        };
        let power = attacker.effective_power().max(0) as u32;
        player_hits.push((attacker.id, power));
        if power == 0 {
            continue;
        }
        if has_keyword(&attacker.definition, Keyword::Infect) {
            poison_to_defender += power;
            log.push(format!("{} deals {} poison to {}", attacker.name(), power, defending.name));
        } else {
            damage_to_defender += power;
            if attacker.is_commander {
                commander_damage += power;
            }
            log.push(format!("{} deals {} damage to {}", attacker.name(), power, defending.name));
        }
    }

    let mut attacking_player = attacking.clone();
    let mut defending_player = defending.clone();
    let mut deaths = Vec::new();

    for (player, dead, is_attacker) in [
        (&mut attacking_player, &attacker_deaths, true),
        (&mut defending_player, &blocker_deaths, false),
    ] {
        for &id in dead {
            if let Some(death) = destroy_creature(player, id, &mut log) {
                deaths.push(CombatDeath { card: death, controller_is_attacker: is_attacker });
            }
        }
    }

    defending_player.life -= damage_to_defender as i32;
    defending_player.poison += poison_to_defender;
    defending_player.commander_damage_received += commander_damage;

    CombatOutcome {
        attacking_player,
        defending_player,
        damage_to_defender,
        poison_to_defender,
        commander_damage,
        player_hits,
        deaths,
        log,
    }
}

/// Destroy a creature, honoring a regeneration shield.
/// Returns the creature as it was if it actually died.
pub fn destroy_creature(player: &mut Player, id: InstanceId, log: &mut Vec<String>) -> Option<CardInstance> {
    let card = player.permanent_mut(id)?;
    if card.temp.regenerate {
        card.temp.regenerate = false;
        card.tapped = true;
        log.push(format!("{} regenerates", card.name()));
        return None;
    }
    let snapshot = card.clone();
    player.remove_from_battlefield(id);
    let destination = if snapshot.is_token {
        "ceases to exist"
    } else if snapshot.is_commander {
        "returns to the command zone"
    } else {
        "goes to the graveyard"
    };
    log.push(format!("{} dies and {}", snapshot.name(), destination));
    Some(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::types::{CardDefinition, CardType};
    use crate::game::player::PlayerId;
    use crate::game::zones::Zone;
    use std::sync::Arc;

    fn creature(name: &str, power: i32, toughness: i32, text: &str) -> CardDefinition {
        CardDefinition {
            name: name.to_string(),
            mana_cost: String::new(),
            cmc: 0,
            card_type: CardType::Creature,
            subtype: None,
            oracle_text: text.to_string(),
            power: Some(power),
            toughness: Some(toughness),
            colors: vec![],
            is_legendary: false,
        }
    }

    fn put(player: &mut Player, def: CardDefinition) -> InstanceId {
        let id = player.mint_id();
        player.zones.insert(Zone::Battlefield, CardInstance::new(id, Arc::new(def)));
        id
    }

    fn attack(ids: &[InstanceId]) -> Vec<AttackRecord> {
        ids.iter().map(|&attacker| AttackRecord { attacker, target: PlayerId::Opponent }).collect()
    }

    #[test]
    fn test_unblocked_damage_hits_life() {
        let mut a = Player::new(PlayerId::Player, "A", 40);
        let d = Player::new(PlayerId::Opponent, "D", 40);
        let bear = put(&mut a, creature("Bear", 2, 2, ""));
        let outcome = resolve_combat_damage(&attack(&[bear]), &[], &a, &d);
        assert_eq!(outcome.defending_player.life, 38);
        assert_eq!(outcome.player_hits, vec![(bear, 2)]);
        assert!(outcome.deaths.is_empty());
    }

    #[test]
    fn test_blocker_survives_small_attacker() {
        let mut a = Player::new(PlayerId::Player, "A", 40);
        let mut d = Player::new(PlayerId::Opponent, "D", 40);
        let bear = put(&mut a, creature("Bear", 2, 2, ""));
        let wall = put(&mut d, creature("Wall", 0, 4, ""));
        let blocks = [BlockRecord { blocker: wall, attacker: bear }];
        let outcome = resolve_combat_damage(&attack(&[bear]), &blocks, &a, &d);
        assert!(outcome.deaths.is_empty());
        assert_eq!(outcome.defending_player.life, 40);
        assert!(outcome.player_hits.is_empty());
    }

    #[test]
    fn test_double_block_each_pair_at_full_damage() {
        let mut a = Player::new(PlayerId::Player, "A", 40);
        let mut d = Player::new(PlayerId::Opponent, "D", 40);
        let giant = put(&mut a, creature("Giant", 4, 6, ""));
        let b1 = put(&mut d, creature("Soldier", 2, 4, ""));
        let b2 = put(&mut d, creature("Soldier", 2, 4, ""));
        let blocks = [
            BlockRecord { blocker: b1, attacker: giant },
            BlockRecord { blocker: b2, attacker: giant },
        ];
        let outcome = resolve_combat_damage(&attack(&[giant]), &blocks, &a, &d);
        assert_eq!(outcome.deaths.len(), 2);
        assert!(outcome.attacking_player.permanent(giant).is_some());
        assert!(outcome.defending_player.zones.battlefield.is_empty());
    }

    #[test]
    fn test_commander_damage_and_command_zone_return() {
        let mut a = Player::new(PlayerId::Player, "A", 40);
        let mut d = Player::new(PlayerId::Opponent, "D", 40);
        let commander = put(&mut a, creature("Krenko", 3, 2, ""));
        if let Some(c) = a.permanent_mut(commander) {
            c.is_commander = true;
        }
        let outcome = resolve_combat_damage(&attack(&[commander]), &[], &a, &d);
        assert_eq!(outcome.defending_player.commander_damage_received, 3);

        let mut beaten = outcome.attacking_player.clone();
        if let Some(c) = beaten.permanent_mut(commander) {
            c.negative_counters = 1;
            c.tapped = true;
        }
        let killer = put(&mut d, creature("Ogre", 5, 5, ""));
        let blocks = [BlockRecord { blocker: killer, attacker: commander }];
        let outcome = resolve_combat_damage(&attack(&[commander]), &blocks, &beaten, &d);
        let back = &outcome.attacking_player.zones.command;
        assert_eq!(back.len(), 1);
        assert!(!back[0].tapped);
        assert_eq!(back[0].negative_counters, 0);
    }

    #[test]
    fn test_regeneration_shield_saves_creature() {
        let mut a = Player::new(PlayerId::Player, "A", 40);
        let mut d = Player::new(PlayerId::Opponent, "D", 40);
        let ogre = put(&mut a, creature("Ogre", 5, 5, ""));
        let mamba = put(&mut d, creature("Mamba", 1, 1, ""));
        if let Some(c) = d.permanent_mut(mamba) {
            c.temp.regenerate = true;
        }
        let blocks = [BlockRecord { blocker: mamba, attacker: ogre }];
        let outcome = resolve_combat_damage(&attack(&[ogre]), &blocks, &a, &d);
        assert!(outcome.deaths.is_empty());
        let saved = outcome.defending_player.permanent(mamba).expect("regenerated");
        assert!(saved.tapped);
        assert!(!saved.temp.regenerate);
    }

    #[test]
    fn test_zero_power_attacker_still_reported() {
        let mut a = Player::new(PlayerId::Player, "A", 40);
        let d = Player::new(PlayerId::Opponent, "D", 40);
        let wall = put(&mut a, creature("Plant", 0, 1, ""));
        let outcome = resolve_combat_damage(&attack(&[wall]), &[], &a, &d);
        assert_eq!(outcome.player_hits, vec![(wall, 0)]);
        assert_eq!(outcome.defending_player.life, 40);
    }

    #[test]
    fn test_token_dies_without_trace() {
        let mut a = Player::new(PlayerId::Player, "A", 40);
        let mut d = Player::new(PlayerId::Opponent, "D", 40);
        let goblin = a.create_tokens(&crate::card::TokenSpec::new(crate::card::TokenKind::Goblin), 1)[0];
        let ogre = put(&mut d, creature("Ogre", 5, 5, ""));
        let blocks = [BlockRecord { blocker: ogre, attacker: goblin }];
        let outcome = resolve_combat_damage(&attack(&[goblin]), &blocks, &a, &d);
        assert_eq!(outcome.deaths.len(), 1);
        assert!(outcome.attacking_player.zones.all_cards().all(|c| c.id != goblin));
    }
}
