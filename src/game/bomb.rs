//! Bomb and Kick State Machine
//!
//! A bomb counts its fuse down and detonates on the update after the fuse
//! runs out. A kick-capable bomber can push an idle bomb face-on, sending it
//! sliding at a fixed velocity until it hits something solid.

use serde::{Serialize, Deserialize};

use crate::core::hash::StateHasher;
use crate::core::rect::Rect;
use crate::core::vec2::Vec2;
use crate::game::entity::{PlayerId, Tile};
use crate::game::input::{InputFrame, Key};

// =============================================================================
// KICK CONSTANTS
// =============================================================================

/// Slide speed of a kicked bomb (units per tick).
pub const KICK_SPEED: f32 = 6.0;

/// Largest perpendicular overlap that still counts as a face-on push.
pub const KICK_MAX_DEPTH: f32 = 6.0;

/// Largest centre misalignment that still counts as a face-on push.
pub const KICK_MAX_OFFSET: f32 = 8.0;

// =============================================================================
// KICK STATE
// =============================================================================

/// Side the kick came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum KickDirection {
    /// Kicked from above, slides down
    FromTop = 0,
    /// Kicked from below, slides up
    FromBottom = 1,
    /// Kicked from the left, slides right
    FromLeft = 2,
    /// Kicked from the right, slides left
    FromRight = 3,
}

impl KickDirection {
    /// Slide velocity.
    #[inline]
    pub fn velocity(self) -> Vec2 {
        match self {
            KickDirection::FromTop => Vec2::new(0.0, KICK_SPEED),
            KickDirection::FromBottom => Vec2::new(0.0, -KICK_SPEED),
            KickDirection::FromLeft => Vec2::new(KICK_SPEED, 0.0),
            KickDirection::FromRight => Vec2::new(-KICK_SPEED, 0.0),
        }
    }
}

/// Kick state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum KickState {
    /// Resting on its cell
    #[default]
    Idle,
    /// Sliding
    Moving(KickDirection),
}

// =============================================================================
// BOMB
// =============================================================================

/// A planted bomb.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bomb {
    /// Tile state (always breakable)
    pub tile: Tile,
    /// Player credited with the ammo on detonation
    pub owner: PlayerId,
    /// Blast range in tiles
    pub firepower: u8,
    /// Blast passes through soft walls
    pub pierce: bool,
    /// Fuse length
    pub fuse_ticks: u32,
    /// Ticks since planting
    pub elapsed: u32,
    /// Kick state
    pub kick: KickState,
}

impl Bomb {
    /// Create an idle bomb.
    pub fn new(owner: PlayerId, firepower: u8, pierce: bool, fuse_ticks: u32) -> Self {
        Self {
            tile: Tile::new(true),
            owner,
            firepower,
            pierce,
            fuse_ticks,
            elapsed: 0,
            kick: KickState::Idle,
        }
    }

    /// Is the bomb sliding?
    #[inline]
    pub fn is_moving(&self) -> bool {
        matches!(self.kick, KickState::Moving(_))
    }

    /// Current slide velocity (zero when idle).
    #[inline]
    pub fn velocity(&self) -> Vec2 {
        match self.kick {
            KickState::Idle => Vec2::ZERO,
            KickState::Moving(direction) => direction.velocity(),
        }
    }

    /// Idle -> Moving. Returns false if the bomb is already sliding.
    pub fn start_kick(&mut self, direction: KickDirection) -> bool {
        if self.is_moving() {
            return false;
        }
        self.kick = KickState::Moving(direction);
        true
    }

    /// Moving -> Idle. Returns false if the bomb was not sliding.
    ///
    /// The caller snaps the bomb back onto the grid.
    pub fn stop_kick(&mut self) -> bool {
        let was_moving = self.is_moving();
        self.kick = KickState::Idle;
        was_moving
    }

    /// Per-tick update. Returns true when the fuse has run out.
    pub fn update(&mut self, position: &mut Vec2) -> bool {
        let detonate = self.elapsed >= self.fuse_ticks;
        self.elapsed += 1;

        if let KickState::Moving(direction) = self.kick {
            *position += direction.velocity();
        }

        detonate
    }

    /// Hash bomb state.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u8(self.owner.0);
        hasher.update_u8(self.firepower);
        hasher.update_bool(self.pierce);
        hasher.update_u32(self.fuse_ticks);
        hasher.update_u32(self.elapsed);
        match self.kick {
            KickState::Idle => hasher.update_u8(0xFF),
            KickState::Moving(direction) => hasher.update_u8(direction as u8),
        }
    }
}

// =============================================================================
// BOMBER CONTACT
// =============================================================================

/// How a bomber's overlap with a bomb resolves.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BombContact {
    /// Kick to start, if any
    pub kick: Option<KickDirection>,
    /// Bomb acts as a solid obstacle for the bomber
    pub solid: bool,
}

/// Classify a bomber/bomb overlap.
///
/// The bomb is solid only when the bomber presses against one face: a thin
/// overlap on one axis with centres aligned on the other. A bomber standing
/// on a freshly planted bomb overlaps deeply and walks off freely. A face-on
/// contact starts a kick when the bomber can kick, the bomb is idle and the
/// direction toward the bomb is held.
pub fn bomber_contact(
    bomber: &Rect,
    bomb: &Rect,
    input: InputFrame,
    can_kick: bool,
    bomb_idle: bool,
) -> BombContact {
    let inter = bomber.intersection(bomb);
    let mut contact = BombContact::default();

    // Vertical face
    if inter.w >= inter.h
        && inter.h <= KICK_MAX_DEPTH
        && (bomber.center_x() - bomb.center_x()).abs() <= KICK_MAX_OFFSET
    {
        if can_kick && bomb_idle {
            if inter.max_y() >= bomber.max_y() && input.is_held(Key::Down) {
                contact.kick = Some(KickDirection::FromTop);
            }
            if inter.max_y() >= bomb.max_y() && input.is_held(Key::Up) {
                contact.kick = Some(KickDirection::FromBottom);
            }
        }
        contact.solid = true;
    }

    // Horizontal face
    if inter.h >= inter.w
        && inter.w <= KICK_MAX_DEPTH
        && (bomber.center_y() - bomb.center_y()).abs() <= KICK_MAX_OFFSET
    {
        if can_kick && bomb_idle && contact.kick.is_none() {
            if inter.max_x() >= bomber.max_x() && input.is_held(Key::Right) {
                contact.kick = Some(KickDirection::FromLeft);
            }
            if inter.max_x() >= bomb.max_x() && input.is_held(Key::Left) {
                contact.kick = Some(KickDirection::FromRight);
            }
        }
        contact.solid = true;
    }

    contact
}

/// Should a sliding bomb stop for this bomber?
///
/// True when the point one step ahead of the bomb's centre lies inside the
/// overlap, meaning the next move would push further into the bomber.
pub fn blocked_by_bomber(bomb: &Rect, bomber: &Rect, velocity: Vec2) -> bool {
    let probe = bomb.center() + velocity;
    bomb.intersection(bomber).contains(probe)
}
