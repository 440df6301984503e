pub mod decisions;
pub mod engine;

pub use decisions::DecisionEngine;
pub use engine::{run_game, GameResult};
