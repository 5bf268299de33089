//! Core primitives.
//!
//! Geometry, grid snapping, seeded randomness and state hashing. Nothing in
//! this module knows about game rules.

pub mod vec2;
pub mod rect;
pub mod rng;
pub mod hash;

// Re-export core types
pub use vec2::{Vec2, snap_coord};
pub use rect::Rect;
pub use rng::DeterministicRng;
pub use hash::{StateHash, StateHasher, compute_state_hash};
