use crate::card::types::CardDefinition;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CardDatabaseError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Card not found: {0}")]
    CardNotFound(String),
    #[error("Invalid card data: {0}")]
    InvalidCard(String),
}

/// External card-data collaborator: exact-name lookup.
///
/// A miss is an expected outcome, reported as `CardNotFound`; callers building
/// decks keep going and collect the misses.
pub trait CardSource {
    fn lookup_card_by_name(&self, name: &str) -> Result<Arc<CardDefinition>, CardDatabaseError>;
}

/// Card database that loads card definitions from JSON
#[derive(Debug, Clone, Default)]
pub struct CardDatabase {
    cards: HashMap<String, Arc<CardDefinition>>,
}

impl CardDatabase {
    /// Load cards from a JSON file containing an array of definitions
    pub fn from_file(path: &str) -> Result<Self, CardDatabaseError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, CardDatabaseError> {
        let cards_vec: Vec<CardDefinition> = serde_json::from_str(content)?;
        let db = Self::from_definitions(cards_vec);
        db.validate()?;
        Ok(db)
    }

    pub fn from_definitions(definitions: impl IntoIterator<Item = CardDefinition>) -> Self {
        let cards = definitions
            .into_iter()
            .map(|card| (card.name.clone(), Arc::new(card)))
            .collect();
        CardDatabase { cards }
    }

    /// Get a card by name
    pub fn get_card(&self, name: &str) -> Result<Arc<CardDefinition>, CardDatabaseError> {
        self.cards
            .get(name)
            .cloned()
            .ok_or_else(|| CardDatabaseError::CardNotFound(name.to_string()))
    }

    /// Get all card names
    pub fn card_names(&self) -> Vec<&str> {
        self.cards.keys().map(|s| s.as_str()).collect()
    }

    /// Get total number of cards
    pub fn card_count(&self) -> usize {
        self.cards.len()
    }

    /// Reject empty pools and creatures without stats
    pub fn validate(&self) -> Result<(), CardDatabaseError> {
        if self.cards.is_empty() {
            return Err(CardDatabaseError::InvalidCard("No cards loaded".to_string()));
        }
        if let Some(bad) = self
            .cards
            .values()
            .find(|c| c.is_creature() && (c.power.is_none() || c.toughness.is_none()))
        {
            return Err(CardDatabaseError::InvalidCard(format!(
                "{} is a creature without power/toughness",
                bad.name
            )));
        }
        Ok(())
    }
}

impl CardSource for CardDatabase {
    fn lookup_card_by_name(&self, name: &str) -> Result<Arc<CardDefinition>, CardDatabaseError> {
        self.get_card(name.trim())
    }
}
