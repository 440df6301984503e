use crate::card::database::CardSource;
use crate::card::effects::TokenSpec;
use crate::config::DeckList;
use crate::game::mana::ManaPool;
use crate::game::zones::{CardInstance, InstanceId, Zone, Zones};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The two seats of a 1v1 game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerId {
    Player,
    Opponent,
}

impl PlayerId {
    pub fn other(&self) -> PlayerId {
        match self {
            PlayerId::Player => PlayerId::Opponent,
            PlayerId::Opponent => PlayerId::Player,
        }
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerId::Player => f.write_str("player"),
            PlayerId::Opponent => f.write_str("opponent"),
        }
    }
}

/// Declared attacker and the player it attacks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackRecord {
    pub attacker: InstanceId,
    pub target: PlayerId,
}

/// Declared blocker and the attacker it blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRecord {
    pub blocker: InstanceId,
    pub attacker: InstanceId,
}

#[derive(Debug, Clone, Serialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub life: i32,
    pub mana_pool: ManaPool,
    pub zones: Zones,
    pub poison: u32,
    pub commander_damage_received: u32,
    pub has_drawn_this_turn: bool,
    pub has_played_land_this_turn: bool,
    pub attacking: Vec<AttackRecord>,
    pub blocking: Vec<BlockRecord>,
    next_serial: u32,
}

/// A player built from a deck list, plus the names the card source missed
#[derive(Debug, Clone)]
pub struct DeckBuild {
    pub player: Player,
    pub missing: Vec<String>,
}

impl Player {
    pub fn new(id: PlayerId, name: &str, life: i32) -> Self {
        Player {
            id,
            name: name.to_string(),
            life,
            mana_pool: ManaPool::new(),
            zones: Zones::new(),
            poison: 0,
            commander_damage_received: 0,
            has_drawn_this_turn: false,
            has_played_land_this_turn: false,
            attacking: Vec::new(),
            blocking: Vec::new(),
            next_serial: 0,
        }
    }

    /// Instantiate a deck: `quantity` instances per entry, in deck order.
    ///
    /// The first copy matching the designated commander goes to the command
    /// zone instead of the library. A commander absent from the entries is
    /// looked up on its own. Lookup misses are collected, never fatal.
    pub fn from_deck(id: PlayerId, name: &str, life: i32, deck: &DeckList, source: &dyn CardSource) -> DeckBuild {
        let mut player = Player::new(id, name, life);
        let mut missing = Vec::new();
        let commander_name = deck.commander.as_deref().map(str::trim);
        let mut commander_placed = false;

        for entry in &deck.entries {
            let definition = match source.lookup_card_by_name(&entry.card_name) {
                Ok(def) => def,
                Err(e) => {
                    log::warn!("deck for {}: {}", name, e);
                    missing.push(entry.card_name.clone());
                    continue;
                }
            };
            for _ in 0..entry.quantity {
                let mut card = CardInstance::new(player.mint_id(), definition.clone());
                if !commander_placed && commander_name == Some(definition.name.as_str()) {
                    card.is_commander = true;
                    commander_placed = true;
                    player.zones.insert(Zone::Command, card);
                } else {
                    player.zones.insert(Zone::Library, card);
                }
            }
        }

        if let (Some(commander), false) = (commander_name, commander_placed) {
            match source.lookup_card_by_name(commander) {
                Ok(def) => {
                    let mut card = CardInstance::new(player.mint_id(), def);
                    card.is_commander = true;
                    player.zones.insert(Zone::Command, card);
                }
                Err(e) => {
                    log::warn!("commander for {}: {}", name, e);
                    missing.push(commander.to_string());
                }
            }
        }

        DeckBuild { player, missing }
    }

    /// Fresh instance id for this player's next card or token
    pub fn mint_id(&mut self) -> InstanceId {
        let id = InstanceId { owner: self.id, serial: self.next_serial };
        self.next_serial += 1;
        id
    }

    /// Put `count` tokens onto the battlefield, returning their ids
    pub fn create_tokens(&mut self, spec: &TokenSpec, count: u32) -> Vec<InstanceId> {
        (0..count)
            .map(|_| {
                let id = self.mint_id();
                self.zones.insert(Zone::Battlefield, CardInstance::token(id, spec.definition()));
                id
            })
            .collect()
    }

    /// Draw one card; false on an empty library
    pub fn draw_card(&mut self) -> bool {
        let drew = self.zones.draw().is_some();
        if drew {
            self.has_drawn_this_turn = true;
        }
        drew
    }

    pub fn permanent(&self, id: InstanceId) -> Option<&CardInstance> {
        self.zones.get(Zone::Battlefield, id)
    }

    pub fn permanent_mut(&mut self, id: InstanceId) -> Option<&mut CardInstance> {
        self.zones.get_mut(Zone::Battlefield, id)
    }

    pub fn creatures(&self) -> impl Iterator<Item = &CardInstance> {
        self.zones.battlefield.iter().filter(|c| c.is_creature())
    }

    pub fn lands_in_play(&self) -> usize {
        self.zones.battlefield.iter().filter(|c| c.is_land()).count()
    }

    /// Permanents on the battlefield with the given subtype
    pub fn count_subtype(&self, subtype: &str) -> usize {
        self.zones
            .battlefield
            .iter()
            .filter(|c| c.definition.has_subtype(subtype))
            .count()
    }

    /// Opposing creature with the highest effective power
    pub fn biggest_creature(&self) -> Option<&CardInstance> {
        self.creatures().max_by_key(|c| (c.effective_power(), c.effective_toughness()))
    }

    pub fn is_attacking(&self, id: InstanceId) -> bool {
        self.attacking.iter().any(|a| a.attacker == id)
    }

    /// Send a permanent that left the battlefield to where it belongs:
    /// commanders to the command zone, tokens nowhere, everything else to the
    /// graveyard. Returns false when `id` is not on the battlefield.
    pub fn remove_from_battlefield(&mut self, id: InstanceId) -> bool {
        let Some(mut card) = self.zones.remove(Zone::Battlefield, id) else {
            return false;
        };
        self.attacking.retain(|a| a.attacker != id);
        self.blocking.retain(|b| b.blocker != id);
        if card.is_token {
            return true;
        }
        if card.is_commander {
            card.reset_for_command_zone();
            self.zones.insert(Zone::Command, card);
        } else {
            card.temp = Default::default();
            self.zones.insert(Zone::Graveyard, card);
        }
        true
    }

    /// Untap-step reset for this player's own turn
    pub fn untap_step(&mut self) {
        for card in self.zones.battlefield.iter_mut() {
            card.tapped = false;
            card.temp = Default::default();
        }
        self.has_drawn_this_turn = false;
        self.has_played_land_this_turn = false;
        self.mana_pool.clear();
    }
}
