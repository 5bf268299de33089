//! Match State
//!
//! Everything a running match owns: the world, the map it was generated
//! from, scores, randomness and the pending event log. There is no global
//! state; the tick function receives this value explicitly.

use tracing::{debug, info};

use crate::config::ArenaConfig;
use crate::core::hash::{StateHash, compute_state_hash};
use crate::core::rng::DeterministicRng;
use crate::game::entity::PlayerId;
use crate::game::events::{GameEvent, GameEventData};
use crate::game::input::{InputEvent, InputFrame, Key};
use crate::game::map::MapGrid;
use crate::game::score::Scoreboard;
use crate::game::snapshot::Snapshot;
use crate::game::world::World;

/// Ticks that must pass between two full game resets.
pub const RESET_DEBOUNCE_TICKS: u64 = 20;

/// Complete state of a match.
#[derive(Clone, Debug)]
pub struct MatchState {
    /// Tunables
    pub config: ArenaConfig,

    /// Map the world is generated from (kept for resets)
    pub grid: MapGrid,

    /// Live entities
    pub world: World,

    /// Scores and round state
    pub scoreboard: Scoreboard,

    /// Deterministic RNG for soft walls and pickup drops
    pub rng: DeterministicRng,

    /// Ticks completed
    pub tick: u64,

    /// Round number, starting at 1
    pub round: u32,

    /// Ticks since the last full game reset
    pub reset_delay: u64,

    /// Events generated since the last `take_events`
    pub pending_events: Vec<GameEvent>,
}

impl MatchState {
    /// Start a match on `grid`.
    pub fn from_grid(grid: MapGrid, config: ArenaConfig) -> Self {
        let mut rng = DeterministicRng::new(config.seed);
        let mut world = World::new(grid.bounds());
        grid.populate(&mut world, &mut rng, config.soft_wall_rate);
        let scoreboard = Scoreboard::new(grid.roster());

        Self {
            config,
            grid,
            world,
            scoreboard,
            rng,
            tick: 0,
            round: 1,
            reset_delay: 0,
            pending_events: Vec::new(),
        }
    }

    /// Start a match on the built-in map.
    pub fn new(config: ArenaConfig) -> Self {
        Self::from_grid(MapGrid::default_map(), config)
    }

    // ===== INPUT =====

    /// Apply a press or release. Returns false if the player has no bomber.
    pub fn apply_input(&mut self, event: InputEvent) -> bool {
        match self.world.bomber_mut(event.player).and_then(|e| e.as_bomber_mut()) {
            Some(bomber) => {
                event.apply(&mut bomber.input);
                true
            }
            None => false,
        }
    }

    /// Latch a key for a player.
    pub fn press(&mut self, player: PlayerId, key: Key) -> bool {
        self.apply_input(InputEvent::press(player, key))
    }

    /// Clear a key for a player.
    pub fn release(&mut self, player: PlayerId, key: Key) -> bool {
        self.apply_input(InputEvent::release(player, key))
    }

    /// A player's latched keys.
    pub fn input(&self, player: PlayerId) -> Option<InputFrame> {
        self.world.bomber(player).and_then(|e| e.as_bomber()).map(|b| b.input)
    }

    // ===== ROUNDS =====

    /// A player's score.
    pub fn score(&self, player: PlayerId) -> u32 {
        self.scoreboard.score(player)
    }

    /// Has the current round been decided?
    pub fn round_concluded(&self) -> bool {
        self.scoreboard.round_concluded()
    }

    /// Regenerate the arena for the next round. Scores carry over.
    pub fn reset_map(&mut self) {
        self.world.clear();
        self.grid.populate(&mut self.world, &mut self.rng, self.config.soft_wall_rate);
        self.scoreboard.set_roster(self.grid.roster());
        self.scoreboard.begin_round();
        self.round += 1;

        info!(round = self.round, entities = self.world.len(), "map reset");
        self.push_event(GameEvent::new(self.tick, GameEventData::MapReset { round: self.round }));
    }

    /// Start the whole game over: fresh terrain, every score back to zero,
    /// round 1. The tick counter and RNG carry on.
    pub fn reset_game(&mut self) {
        self.world.clear();
        self.grid.populate(&mut self.world, &mut self.rng, self.config.soft_wall_rate);
        self.scoreboard = Scoreboard::new(self.grid.roster());
        self.round = 1;
        self.reset_delay = 0;

        info!(tick = self.tick, entities = self.world.len(), "game reset");
        self.push_event(GameEvent::new(self.tick, GameEventData::GameReset));
    }

    /// Reset the game unless the last reset was under
    /// [`RESET_DEBOUNCE_TICKS`] ago. Returns true if it happened.
    pub fn request_reset(&mut self) -> bool {
        if self.reset_delay < RESET_DEBOUNCE_TICKS {
            debug!(reset_delay = self.reset_delay, "game reset ignored");
            return false;
        }
        self.reset_game();
        true
    }

    // ===== OBSERVATION =====

    /// Read view of the current state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(self)
    }

    /// Compute hash of current state for verification.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.tick, self.config.seed, |hasher| {
            hasher.update_u32(self.round);
            hasher.update_u64(self.reset_delay);
            self.world.hash_into(hasher);

            for (player, score) in self.scoreboard.scores() {
                hasher.update_u8(player.0);
                hasher.update_u32(*score);
            }
            hasher.update_bool(self.scoreboard.round_concluded());

            let [s0, s1] = self.rng.state();
            hasher.update_u64(s0);
            hasher.update_u64(s1);
        })
    }

    /// Take pending events (consumes them).
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Push a game event.
    pub fn push_event(&mut self, event: GameEvent) {
        self.pending_events.push(event);
    }
}

// =============================================================================
// TESTS
// =============================================================================
