pub mod abilities;
pub mod database;
pub mod effects;
pub mod types;

pub use abilities::{
    activated_abilities, has_keyword, parse_card_abilities, parse_spell_effect, AbilityCost,
    Keyword, ParsedAbility, SacrificeCost, SpellFilter, TriggerCondition,
};
pub use database::{CardDatabase, CardDatabaseError, CardSource};
pub use effects::{
    parse_effect, Amount, CounterKind, CounterTarget, DamageTarget, Effect, ManaProduction,
    PlayerTarget, ReturnScope, SearchSpec, TokenKind, TokenSpec,
};
pub use types::{CardDefinition, CardType, ManaColor, ManaCost};
