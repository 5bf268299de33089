//! # Blast Arena
//!
//! Deterministic simulation core for a grid-based bomb arena: bombers plant
//! timed bombs, blasts propagate along grid lines, soft walls burn and drop
//! pickups, and the last bomber standing scores the round.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        BLAST ARENA                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/            - Primitives                              │
//! │  ├── vec2.rs      - 2D vector, grid snapping                │
//! │  ├── rect.rs      - Axis-aligned rectangles                 │
//! │  ├── rng.rs       - Deterministic Xorshift128+ PRNG         │
//! │  └── hash.rs      - State hashing for verification          │
//! │                                                             │
//! │  game/            - Game logic (deterministic)              │
//! │  ├── entity.rs    - Entity record and kinds                 │
//! │  ├── world.rs     - Entity registry                         │
//! │  ├── collision.rs - Resolver and reaction table             │
//! │  ├── bomb.rs      - Fuse and kick state machine             │
//! │  ├── explosion.rs - Blast propagation                       │
//! │  ├── score.rs     - Round state machine                     │
//! │  ├── map.rs       - Map tokens and generation               │
//! │  ├── tick.rs      - Fixed-step simulation loop              │
//! │  └── snapshot.rs  - Render views                            │
//! │                                                             │
//! │  runtime/         - Headless driver (non-deterministic)     │
//! │  └── runner.rs    - Timed tick loop, snapshot publishing    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism
//!
//! The `core/` and `game/` modules never read the clock or the OS:
//! - All randomness comes from a seeded Xorshift128+
//! - Entities are visited in registry order (category, then insertion)
//! - Scores live in a BTreeMap for sorted iteration
//!
//! Given the same map, seed and input sequence, two runs produce identical
//! state hashes.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod config;
pub mod runtime;

// Re-export commonly used types
pub use crate::core::vec2::Vec2;
pub use crate::core::rect::Rect;
pub use crate::core::rng::DeterministicRng;
pub use crate::config::{ArenaConfig, ConfigError};
pub use crate::game::input::{InputEvent, InputFrame, Key};
pub use crate::game::entity::PlayerId;
pub use crate::game::state::MatchState;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Simulation tick rate (Hz)
pub const TICK_RATE: u32 = 60;

/// Side length of one grid cell, in world units
pub const TILE_SIZE: f32 = 32.0;
