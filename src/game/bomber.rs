//! Bomber
//!
//! Player-controlled entity: latched movement intent, life state and the
//! stat block that pickups modify.

use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::core::hash::StateHasher;
use crate::core::vec2::{Vec2, snap_coord};
use crate::game::entity::PlayerId;
use crate::game::input::{InputFrame, Key};
use crate::TILE_SIZE;

// =============================================================================
// CONSTANTS
// =============================================================================

/// Starting move speed (units per tick).
pub const START_SPEED: f32 = 1.0;
/// Move speed cap.
pub const MAX_SPEED: f32 = 4.0;
/// Firepower cap (tiles).
pub const MAX_FIREPOWER: u8 = 6;
/// Bomb slot cap.
pub const MAX_BOMBS: u8 = 6;
/// Starting fuse length in ticks.
pub const START_FUSE_TICKS: u32 = 250;
/// Shortest fuse a bomber can reach.
pub const MIN_FUSE_TICKS: u32 = 160;
/// Ticks a dead bomber stays in the world for its death animation.
pub const DEATH_TICKS: u32 = 344;

// =============================================================================
// STATS
// =============================================================================

/// Bomber stat block.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BomberStats {
    /// Units moved per tick per held direction
    pub move_speed: f32,
    /// Blast range in tiles
    pub firepower: u8,
    /// Bomb slots
    pub max_bombs: u8,
    /// Bombs currently available (0..=max_bombs)
    pub ammo: u8,
    /// Fuse given to newly planted bombs
    pub fuse_ticks: u32,
    /// Blasts pass through soft walls
    pub pierce: bool,
    /// Can kick bombs
    pub kick: bool,
}

impl Default for BomberStats {
    fn default() -> Self {
        Self {
            move_speed: START_SPEED,
            firepower: 1,
            max_bombs: 1,
            ammo: 1,
            fuse_ticks: START_FUSE_TICKS,
            pierce: false,
            kick: false,
        }
    }
}

impl BomberStats {
    /// Return one bomb to the pool.
    pub fn restore_ammo(&mut self) {
        self.ammo = (self.ammo + 1).min(self.max_bombs);
    }

    /// Raise max bombs and hand back one bomb.
    pub fn add_ammo(&mut self, amount: u8) {
        self.max_bombs = self.max_bombs.saturating_add(amount).min(MAX_BOMBS);
        self.restore_ammo();
    }

    /// Raise firepower.
    pub fn add_firepower(&mut self, amount: u8) {
        self.firepower = self.firepower.saturating_add(amount).min(MAX_FIREPOWER);
    }

    /// Raise move speed.
    pub fn add_speed(&mut self, amount: f32) {
        self.move_speed = (self.move_speed + amount).min(MAX_SPEED);
    }

    /// Shorten the fuse.
    pub fn reduce_fuse(&mut self, amount: u32) {
        self.fuse_ticks = self.fuse_ticks.saturating_sub(amount).max(MIN_FUSE_TICKS);
    }
}

// =============================================================================
// BOMBER
// =============================================================================

/// Life state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Life {
    /// In play
    #[default]
    Alive,
    /// Eliminated; `ticks` counts the death animation
    Dead {
        /// Ticks since death
        ticks: u32,
    },
}

/// Direction the bomber last moved in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum Facing {
    /// Up
    Up = 0,
    /// Down
    #[default]
    Down = 1,
    /// Left
    Left = 2,
    /// Right
    Right = 3,
}

/// Request to place a bomb, resolved by the world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlantRequest {
    /// Planting player
    pub owner: PlayerId,
    /// Grid cell the bomb would occupy
    pub location: Vec2,
    /// Bomb firepower
    pub firepower: u8,
    /// Bomb pierce
    pub pierce: bool,
    /// Bomb fuse
    pub fuse_ticks: u32,
}

/// Outcome of a bomber update.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BomberAction {
    /// Nothing beyond movement
    Idle,
    /// Action held with ammo available
    Plant(PlantRequest),
    /// Death animation finished
    Expire,
}

/// Player-controlled bomber.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Bomber {
    /// Owning player slot
    pub player: PlayerId,
    /// Latched keys
    pub input: InputFrame,
    /// Alive or animating death
    pub life: Life,
    /// Last movement direction
    pub facing: Facing,
    /// Stat block
    pub stats: BomberStats,
}

impl Bomber {
    /// Fresh bomber with starting stats.
    pub fn new(player: PlayerId) -> Self {
        Self {
            player,
            input: InputFrame::new(),
            life: Life::Alive,
            facing: Facing::Down,
            stats: BomberStats::default(),
        }
    }

    /// Is this bomber still in play?
    #[inline]
    pub fn is_alive(&self) -> bool {
        self.life == Life::Alive
    }

    /// Eliminate. Returns false if already dead.
    pub fn kill(&mut self) -> bool {
        if self.is_alive() {
            self.life = Life::Dead { ticks: 0 };
            self.input = InputFrame::new();
            true
        } else {
            false
        }
    }

    /// Per-tick update: movement, planting intent and death animation.
    pub fn update(&mut self, position: &mut Vec2) -> BomberAction {
        if let Life::Dead { ticks } = &mut self.life {
            *ticks += 1;
            return if *ticks >= DEATH_TICKS {
                BomberAction::Expire
            } else {
                BomberAction::Idle
            };
        }

        // Each held key applies independently; opposing keys cancel out
        let speed = self.stats.move_speed;
        if self.input.is_held(Key::Up) {
            self.facing = Facing::Up;
            position.y -= speed;
        }
        if self.input.is_held(Key::Down) {
            self.facing = Facing::Down;
            position.y += speed;
        }
        if self.input.is_held(Key::Left) {
            self.facing = Facing::Left;
            position.x -= speed;
        }
        if self.input.is_held(Key::Right) {
            self.facing = Facing::Right;
            position.x += speed;
        }

        if self.input.is_held(Key::Action) && self.stats.ammo > 0 {
            return BomberAction::Plant(PlantRequest {
                owner: self.player,
                location: plant_location(*position),
                firepower: self.stats.firepower,
                pierce: self.stats.pierce,
                fuse_ticks: self.stats.fuse_ticks,
            });
        }

        BomberAction::Idle
    }

    /// Consume one bomb after a successful plant.
    pub fn consume_ammo(&mut self) {
        self.stats.ammo = self.stats.ammo.saturating_sub(1);
        debug!(player = %self.player, ammo = self.stats.ammo, "bomb planted");
    }

    /// Hash bomber state.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u8(self.player.0);
        hasher.update_u8(self.input.flags);
        match self.life {
            Life::Alive => hasher.update_u8(0),
            Life::Dead { ticks } => {
                hasher.update_u8(1);
                hasher.update_u32(ticks);
            }
        }
        hasher.update_u8(self.facing as u8);
        hasher.update_f32(self.stats.move_speed);
        hasher.update_u8(self.stats.firepower);
        hasher.update_u8(self.stats.max_bombs);
        hasher.update_u8(self.stats.ammo);
        hasher.update_u32(self.stats.fuse_ticks);
        hasher.update_bool(self.stats.pierce);
        hasher.update_bool(self.stats.kick);
    }
}

/// Grid cell under a bomber's feet.
///
/// The sprite sits half a tile above its cell, hence the vertical offset.
pub fn plant_location(position: Vec2) -> Vec2 {
    Vec2::new(snap_coord(position.x), snap_coord(position.y + TILE_SIZE / 2.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bomber() -> Bomber {
        Bomber::new(PlayerId::new(1))
    }

    #[test]
    fn test_opposing_keys_cancel() {
        let mut b = bomber();
        b.input = InputFrame::with_keys(&[Key::Left, Key::Right, Key::Down]);
        let mut pos = Vec2::new(32.0, 16.0);

        assert_eq!(b.update(&mut pos), BomberAction::Idle);
        assert_eq!(pos, Vec2::new(32.0, 17.0));
        assert_eq!(b.facing, Facing::Right);
    }

    #[test]
    fn test_plant_request() {
        let mut b = bomber();
        b.input.press(Key::Action);
        let mut pos = Vec2::new(47.0, 30.0);

        match b.update(&mut pos) {
            BomberAction::Plant(request) => {
                assert_eq!(request.location, Vec2::new(32.0, 32.0));
                assert_eq!(request.fuse_ticks, START_FUSE_TICKS);
                assert_eq!(request.owner, PlayerId::new(1));
            }
            other => panic!("expected plant, got {:?}", other),
        }

        b.consume_ammo();
        assert_eq!(b.update(&mut pos), BomberAction::Idle);
    }

    #[test]
    fn test_plant_location_rounds_half_up() {
        assert_eq!(plant_location(Vec2::new(48.0, 0.0)), Vec2::new(64.0, 32.0));
        assert_eq!(plant_location(Vec2::new(47.9, -0.1)), Vec2::new(32.0, 0.0));
    }

    #[test]
    fn test_kill_once() {
        let mut b = bomber();
        b.input.press(Key::Up);
        assert!(b.kill());
        assert!(!b.kill());
        assert!(!b.is_alive());
        assert_eq!(b.input, InputFrame::new());
    }

    #[test]
    fn test_dead_bomber_expires_after_animation() {
        let mut b = bomber();
        b.kill();
        let mut pos = Vec2::ZERO;

        for _ in 1..DEATH_TICKS {
            assert_eq!(b.update(&mut pos), BomberAction::Idle);
        }
        assert_eq!(b.update(&mut pos), BomberAction::Expire);
        assert_eq!(pos, Vec2::ZERO);
    }

    #[test]
    fn test_restore_ammo_respects_max() {
        let mut stats = BomberStats::default();
        stats.restore_ammo();
        assert_eq!(stats.ammo, 1);

        stats.ammo = 0;
        stats.restore_ammo();
        assert_eq!(stats.ammo, 1);
    }
}
