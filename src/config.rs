use crate::game::player::PlayerId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Deck for {0} has no cards")]
    EmptyDeck(String),
}

/// One deck line: `quantity` copies of `card_name`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckEntry {
    pub quantity: u32,
    pub card_name: String,
}

/// Parsed deck list plus an optional designated commander
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckList {
    #[serde(default)]
    pub commander: Option<String>,
    pub entries: Vec<DeckEntry>,
}

impl DeckList {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn card_count(&self) -> u32 {
        self.entries.iter().map(|e| e.quantity).sum()
    }
}

fn default_player_name() -> String {
    "Player".to_string()
}

fn default_opponent_name() -> String {
    "Opponent".to_string()
}

fn default_starting_life() -> i32 {
    40
}

fn default_opening_hand_size() -> usize {
    7
}

fn default_starting_player() -> PlayerId {
    PlayerId::Player
}

/// Everything needed to set up one game. Both decks are required.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    #[serde(default = "default_player_name")]
    pub player_name: String,
    #[serde(default = "default_opponent_name")]
    pub opponent_name: String,
    #[serde(default = "default_starting_life")]
    pub starting_life: i32,
    #[serde(default = "default_opening_hand_size")]
    pub opening_hand_size: usize,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_starting_player")]
    pub starting_player: PlayerId,
    pub player_deck: DeckList,
    pub opponent_deck: DeckList,
}

impl GameConfig {
    pub fn new(player_deck: DeckList, opponent_deck: DeckList) -> Self {
        GameConfig {
            player_name: default_player_name(),
            opponent_name: default_opponent_name(),
            starting_life: default_starting_life(),
            opening_hand_size: default_opening_hand_size(),
            seed: None,
            starting_player: default_starting_player(),
            player_deck,
            opponent_deck,
        }
    }

    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.player_deck.card_count() == 0 {
            return Err(ConfigError::EmptyDeck(self.player_name.clone()));
        }
        if self.opponent_deck.card_count() == 0 {
            return Err(ConfigError::EmptyDeck(self.opponent_name.clone()));
        }
        Ok(())
    }

    pub fn deck(&self, id: PlayerId) -> &DeckList {
        match id {
            PlayerId::Player => &self.player_deck,
            PlayerId::Opponent => &self.opponent_deck,
        }
    }

    pub fn name(&self, id: PlayerId) -> &str {
        match id {
            PlayerId::Player => &self.player_name,
            PlayerId::Opponent => &self.opponent_name,
        }
    }
}
