use crate::card::database::CardSource;
use crate::card::effects::SearchSpec;
use crate::config::GameConfig;
use crate::game::player::{Player, PlayerId};
use crate::game::zones::{InstanceId, Zone};
use crate::rng::GameRng;
use serde::Serialize;

/// Game phases, in turn order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Untap,
    Upkeep,
    Draw,
    Main1,
    CombatBegin,
    CombatAttackers,
    CombatBlockers,
    CombatDamage,
    CombatEnd,
    Main2,
    End,
    Cleanup,
}

impl Phase {
    pub const ALL: [Phase; 12] = [
        Phase::Untap,
        Phase::Upkeep,
        Phase::Draw,
        Phase::Main1,
        Phase::CombatBegin,
        Phase::CombatAttackers,
        Phase::CombatBlockers,
        Phase::CombatDamage,
        Phase::CombatEnd,
        Phase::Main2,
        Phase::End,
        Phase::Cleanup,
    ];

    pub fn next(&self) -> Phase {
        match self {
            Phase::Untap => Phase::Upkeep,
            Phase::Upkeep => Phase::Draw,
            Phase::Draw => Phase::Main1,
            Phase::Main1 => Phase::CombatBegin,
            Phase::CombatBegin => Phase::CombatAttackers,
            Phase::CombatAttackers => Phase::CombatBlockers,
            Phase::CombatBlockers => Phase::CombatDamage,
            Phase::CombatDamage => Phase::CombatEnd,
            Phase::CombatEnd => Phase::Main2,
            Phase::Main2 => Phase::End,
            Phase::End => Phase::Cleanup,
            Phase::Cleanup => Phase::Untap,
        }
    }

    pub fn is_main(&self) -> bool {
        matches!(self, Phase::Main1 | Phase::Main2)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Phase::Untap => "untap",
            Phase::Upkeep => "upkeep",
            Phase::Draw => "draw",
            Phase::Main1 => "main1",
            Phase::CombatBegin => "combat_begin",
            Phase::CombatAttackers => "combat_attackers",
            Phase::CombatBlockers => "combat_blockers",
            Phase::CombatDamage => "combat_damage",
            Phase::CombatEnd => "combat_end",
            Phase::Main2 => "main2",
            Phase::End => "end",
            Phase::Cleanup => "cleanup",
        }
    }
}

/// Points where the engine hands control back for a decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum PendingChoice {
    /// Attackers are declared; `defender` may now assign blockers
    DeclareBlockers { defender: PlayerId },
    /// A search effect found these candidates in `player`'s library
    LibrarySearch {
        player: PlayerId,
        source: InstanceId,
        spec: SearchSpec,
        candidates: Vec<InstanceId>,
    },
}

/// Complete game state
#[derive(Debug, Clone, Serialize)]
pub struct GameState {
    pub turn: u32,
    pub phase: Phase,
    pub active_player: PlayerId,
    pub starting_player: PlayerId,
    pub player: Player,
    pub opponent: Player,
    pub pending: Option<PendingChoice>,
    pub log: Vec<String>,
    seed: u64,
    shuffles: u64,
}

/// A freshly set-up game plus deck-building misses
#[derive(Debug, Clone)]
pub struct GameSetup {
    pub state: GameState,
    pub missing: Vec<String>,
}

impl GameState {
    /// Turn 1, first main phase, `starting_player` active
    pub fn new(player: Player, opponent: Player, starting_player: PlayerId, seed: u64) -> Self {
        GameState {
            turn: 1,
            phase: Phase::Main1,
            active_player: starting_player,
            starting_player,
            player,
            opponent,
            pending: None,
            log: Vec::new(),
            seed,
            shuffles: 0,
        }
    }

    /// Build both players from their deck lists, shuffle, and draw opening hands
    pub fn new_game(config: &GameConfig, source: &dyn CardSource) -> GameSetup {
        let rng = GameRng::new(config.seed);
        let seed = rng.seed();
        let mut missing = Vec::new();

        let mut build = |id: PlayerId| {
            let build = Player::from_deck(id, config.name(id), config.starting_life, config.deck(id), source);
            missing.extend(build.missing);
            build.player
        };
        let player = build(PlayerId::Player);
        let opponent = build(PlayerId::Opponent);

        let mut state = GameState::new(player, opponent, config.starting_player, seed);
        for id in [PlayerId::Player, PlayerId::Opponent] {
            state.shuffle_library(id);
            let hand_size = config.opening_hand_size;
            let p = state.player_mut(id);
            for _ in 0..hand_size {
                p.draw_card();
            }
            p.has_drawn_this_turn = false;
        }
        let starter = state.player(config.starting_player).name.clone();
        state.push_log(format!("Game started. {} goes first.", starter));
        log::info!("new game (seed {}), {} goes first", seed, starter);

        GameSetup { state, missing }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn player(&self, id: PlayerId) -> &Player {
        match id {
            PlayerId::Player => &self.player,
            PlayerId::Opponent => &self.opponent,
        }
    }

    pub fn player_mut(&mut self, id: PlayerId) -> &mut Player {
        match id {
            PlayerId::Player => &mut self.player,
            PlayerId::Opponent => &mut self.opponent,
        }
    }

    /// `id`'s player followed by the other
    pub fn pair(&self, id: PlayerId) -> (&Player, &Player) {
        match id {
            PlayerId::Player => (&self.player, &self.opponent),
            PlayerId::Opponent => (&self.opponent, &self.player),
        }
    }

    /// Write back a pair returned by a pure player-level operation
    pub fn set_pair(&mut self, id: PlayerId, mine: Player, theirs: Player) {
        match id {
            PlayerId::Player => {
                self.player = mine;
                self.opponent = theirs;
            }
            PlayerId::Opponent => {
                self.opponent = mine;
                self.player = theirs;
            }
        }
    }

    /// Append to the game log with the `[T<turn>]` prefix
    pub fn push_log(&mut self, message: impl AsRef<str>) {
        let line = format!("[T{}] {}", self.turn, message.as_ref());
        self.log.push(line);
    }

    /// Owner and zone of a card instance
    pub fn locate(&self, id: InstanceId) -> Option<(PlayerId, Zone)> {
        [PlayerId::Player, PlayerId::Opponent]
            .into_iter()
            .find_map(|p| self.player(p).zones.locate(id).map(|z| (p, z)))
    }

    /// Shuffle a library with a stream derived from the game seed
    pub fn shuffle_library(&mut self, id: PlayerId) {
        let mut rng = GameRng::new(Some(self.seed.wrapping_add(self.shuffles)));
        self.shuffles += 1;
        rng.shuffle(&mut self.player_mut(id).zones.library);
    }

    /// The first player to meet a loss condition: life at or below 0,
    /// 10 poison counters, or 21 commander damage
    pub fn loser(&self) -> Option<PlayerId> {
        [self.active_player, self.active_player.other()].into_iter().find(|&id| {
            let p = self.player(id);
            p.life <= 0 || p.poison >= 10 || p.commander_damage_received >= 21
        })
    }
}
