use crate::card::effects::CounterKind;
use crate::card::types::CardDefinition;
use crate::game::player::PlayerId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Globally unique card instance id: owner plus a per-owner serial.
///
/// Deck copies take serials in deck order at setup; tokens draw fresh serials
/// from the owner's counter, so ids are never reused within a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstanceId {
    pub owner: PlayerId,
    pub serial: u32,
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.owner, self.serial)
    }
}

/// Until-end-of-turn state, cleared at the controller's untap step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TempModifiers {
    pub power: i32,
    pub toughness: i32,
    /// One-shot regeneration shield
    pub regenerate: bool,
}

/// One physical card (or token) in a game
#[derive(Debug, Clone, Serialize)]
pub struct CardInstance {
    pub id: InstanceId,
    pub definition: Arc<CardDefinition>,
    pub tapped: bool,
    pub positive_counters: u32,
    pub negative_counters: u32,
    pub is_commander: bool,
    pub is_token: bool,
    pub temp: TempModifiers,
}

impl CardInstance {
    pub fn new(id: InstanceId, definition: Arc<CardDefinition>) -> Self {
        CardInstance {
            id,
            definition,
            tapped: false,
            positive_counters: 0,
            negative_counters: 0,
            is_commander: false,
            is_token: false,
            temp: TempModifiers::default(),
        }
    }

    pub fn token(id: InstanceId, definition: CardDefinition) -> Self {
        CardInstance {
            is_token: true,
            ..CardInstance::new(id, Arc::new(definition))
        }
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn is_creature(&self) -> bool {
        self.definition.is_creature()
    }

    pub fn is_land(&self) -> bool {
        self.definition.is_land()
    }

    /// Base + counters + temporary modifiers, floored at 0
    pub fn effective_power(&self) -> i32 {
        let base = self.definition.power.unwrap_or(0);
        (base + self.positive_counters as i32 - self.negative_counters as i32 + self.temp.power).max(0)
    }

    pub fn effective_toughness(&self) -> i32 {
        let base = self.definition.toughness.unwrap_or(0);
        (base + self.positive_counters as i32 - self.negative_counters as i32 + self.temp.toughness).max(0)
    }

    pub fn add_counters(&mut self, kind: CounterKind, amount: u32) {
        match kind {
            CounterKind::PlusOne => self.positive_counters += amount,
            CounterKind::MinusOne => self.negative_counters += amount,
        }
    }

    pub fn counters(&self, kind: CounterKind) -> u32 {
        match kind {
            CounterKind::PlusOne => self.positive_counters,
            CounterKind::MinusOne => self.negative_counters,
        }
    }

    /// State a commander keeps when it returns to the command zone
    pub fn reset_for_command_zone(&mut self) {
        self.tapped = false;
        self.negative_counters = 0;
        self.temp = TempModifiers::default();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    Library,
    Hand,
    Battlefield,
    Graveyard,
    Exile,
    Command,
}

impl Zone {
    pub const ALL: [Zone; 6] = [
        Zone::Library,
        Zone::Hand,
        Zone::Battlefield,
        Zone::Graveyard,
        Zone::Exile,
        Zone::Command,
    ];
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Zone::Library => "library",
            Zone::Hand => "hand",
            Zone::Battlefield => "battlefield",
            Zone::Graveyard => "graveyard",
            Zone::Exile => "exile",
            Zone::Command => "command zone",
        };
        f.write_str(name)
    }
}

/// A player's six zones.
///
/// Library front is the top. Graveyard and exile grow at the back, so the
/// most recent card is last.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Zones {
    pub library: Vec<CardInstance>,
    pub hand: Vec<CardInstance>,
    pub battlefield: Vec<CardInstance>,
    pub graveyard: Vec<CardInstance>,
    pub exile: Vec<CardInstance>,
    pub command: Vec<CardInstance>,
}

impl Zones {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cards(&self, zone: Zone) -> &[CardInstance] {
        match zone {
            Zone::Library => &self.library,
            Zone::Hand => &self.hand,
            Zone::Battlefield => &self.battlefield,
            Zone::Graveyard => &self.graveyard,
            Zone::Exile => &self.exile,
            Zone::Command => &self.command,
        }
    }

    fn cards_mut(&mut self, zone: Zone) -> &mut Vec<CardInstance> {
        match zone {
            Zone::Library => &mut self.library,
            Zone::Hand => &mut self.hand,
            Zone::Battlefield => &mut self.battlefield,
            Zone::Graveyard => &mut self.graveyard,
            Zone::Exile => &mut self.exile,
            Zone::Command => &mut self.command,
        }
    }

    pub fn get(&self, zone: Zone, id: InstanceId) -> Option<&CardInstance> {
        self.cards(zone).iter().find(|c| c.id == id)
    }

    pub fn get_mut(&mut self, zone: Zone, id: InstanceId) -> Option<&mut CardInstance> {
        self.cards_mut(zone).iter_mut().find(|c| c.id == id)
    }

    /// Which zone currently holds `id`
    pub fn locate(&self, id: InstanceId) -> Option<Zone> {
        Zone::ALL.into_iter().find(|&z| self.get(z, id).is_some())
    }

    pub fn remove(&mut self, zone: Zone, id: InstanceId) -> Option<CardInstance> {
        let cards = self.cards_mut(zone);
        let index = cards.iter().position(|c| c.id == id)?;
        Some(cards.remove(index))
    }

    pub fn insert(&mut self, zone: Zone, card: CardInstance) {
        self.cards_mut(zone).push(card);
    }

    /// Remove-then-insert. Tokens leaving the battlefield cease to exist.
    /// Returns false when `id` is not in `from`.
    pub fn move_card(&mut self, from: Zone, to: Zone, id: InstanceId) -> bool {
        let Some(card) = self.remove(from, id) else {
            return false;
        };
        if !(card.is_token && from == Zone::Battlefield && to != Zone::Battlefield) {
            self.insert(to, card);
        }
        true
    }

    /// Library front to the back of the hand
    pub fn draw(&mut self) -> Option<InstanceId> {
        if self.library.is_empty() {
            return None;
        }
        let card = self.library.remove(0);
        let id = card.id;
        self.hand.push(card);
        Some(id)
    }

    pub fn all_cards(&self) -> impl Iterator<Item = &CardInstance> {
        Zone::ALL.into_iter().flat_map(move |z| self.cards(z).iter())
    }
}
