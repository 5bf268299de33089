//! Game Logic Module
//!
//! All arena simulation code. Deterministic given a seed and an input
//! sequence.
//!
//! ## Module Structure
//!
//! - `entity`: Entity record, ids, tile burn state
//! - `bomber`, `bomb`, `explosion`, `pickup`: Per-kind state and rules
//! - `world`: Entity registry and spatial queries
//! - `collision`: Penetration resolver and reaction dispatch
//! - `map`: Token grid parsing and world generation
//! - `score`: Last-survivor round state
//! - `state`: Match state
//! - `tick`: Fixed-step simulation loop
//! - `clock`: Wall time to tick conversion
//! - `events`: Game events for observers and replay checks
//! - `snapshot`: Read views for renderers

pub mod input;
pub mod entity;
pub mod pickup;
pub mod bomber;
pub mod bomb;
pub mod explosion;
pub mod world;
pub mod collision;
pub mod map;
pub mod score;
pub mod events;
pub mod state;
pub mod snapshot;
pub mod tick;
pub mod clock;

// Re-export key types
pub use input::{InputEvent, InputFrame, Key};
pub use entity::{Category, Entity, EntityId, EntityKind, PlayerId};
pub use world::{Slot, World};
pub use map::{MapError, MapGrid};
pub use score::{RoundOutcome, RoundPhase, Scoreboard};
pub use state::MatchState;
pub use snapshot::Snapshot;
pub use tick::{TickResult, replay_match, tick};
pub use clock::SimClock;
pub use events::{GameEvent, GameEventData};
