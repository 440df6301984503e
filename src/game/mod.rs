pub mod actions;
pub mod combat;
pub mod mana;
pub mod player;
pub mod resolve;
pub mod special_cards;
pub mod state;
pub mod triggers;
pub mod turns;
pub mod zones;

pub use actions::{perform, perform_logged, Action, ActionError, Refusal};
pub use combat::{resolve_combat_damage, CombatOutcome};
pub use mana::{can_pay_cost, pay_cost, ManaPool};
pub use player::{AttackRecord, BlockRecord, Player, PlayerId};
pub use resolve::{process_triggered_effect, EffectContext, EffectOutcome};
pub use state::{GameSetup, GameState, PendingChoice, Phase};
pub use triggers::{process_events, GameEvent};
pub use turns::{advance_phase, pass_turn};
pub use zones::{CardInstance, InstanceId, Zone, Zones};
