//! Entity Model
//!
//! Every simulated object is an `Entity`: shared spatial fields plus a
//! closed `EntityKind` variant. Collision dispatch matches on the kind
//! tags of both participants, so adding a kind means extending the
//! reaction table in `collision.rs`.

use std::fmt;
use serde::{Serialize, Deserialize};

use crate::core::rect::Rect;
use crate::core::vec2::Vec2;
use crate::core::hash::StateHasher;
use crate::game::bomb::Bomb;
use crate::game::bomber::Bomber;
use crate::game::explosion::Explosion;
use crate::game::pickup::Pickup;
use crate::TILE_SIZE;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Stable entity identifier. Allocated monotonically, never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Player identifier: the spawn token (1..=4) that placed the bomber.
///
/// Stays the same across map resets, so scores key on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub u8);

impl PlayerId {
    /// Create from the raw slot number.
    pub const fn new(slot: u8) -> Self {
        Self(slot)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

// =============================================================================
// CATEGORIES
// =============================================================================

/// Registry category. Iteration visits categories in declaration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Category {
    /// Grid-aligned objects: walls, bombs, pickups
    Tile = 0,
    /// Blast rectangles
    Explosion = 1,
    /// Players
    Bomber = 2,
}

impl Category {
    /// Number of categories.
    pub const COUNT: usize = 3;

    /// All categories in iteration order.
    pub const ALL: [Category; Self::COUNT] = [Category::Tile, Category::Explosion, Category::Bomber];

    /// Index into per-category storage.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Concrete kind of an entity, without payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum KindTag {
    /// Soft or hard wall
    Wall = 0,
    /// Placed device
    Bomb = 1,
    /// Powerup
    Pickup = 2,
    /// Player
    Bomber = 3,
    /// Blast
    Explosion = 4,
}

// =============================================================================
// TILE STATE
// =============================================================================

/// Deferred destruction for breakable tiles.
///
/// The first explosion to touch a tile owns its destruction. The tile
/// burns once that explosion has finished and left the registry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BurnState {
    /// Not touched by any explosion
    #[default]
    Untouched,
    /// Touched; waits for this explosion to expire
    AwaitingBurn(EntityId),
    /// Burn completed; the tile is destroyed
    Burnt,
}

/// Fields shared by grid-aligned entities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    /// Can blasts destroy this tile?
    pub breakable: bool,
    /// Burn progress
    pub burn: BurnState,
}

impl Tile {
    /// Create tile state.
    pub const fn new(breakable: bool) -> Self {
        Self { breakable, burn: BurnState::Untouched }
    }

    /// Record explosion contact. Only the first contact sticks.
    pub fn touch(&mut self, explosion: EntityId) {
        if self.breakable && self.burn == BurnState::Untouched {
            self.burn = BurnState::AwaitingBurn(explosion);
        }
    }

    /// Explosion this tile is waiting on, if any.
    pub fn contact(&self) -> Option<EntityId> {
        match self.burn {
            BurnState::AwaitingBurn(id) => Some(id),
            _ => None,
        }
    }

    /// Advance the burn once the owning explosion is gone.
    ///
    /// Returns true when the tile has just burnt.
    pub fn advance_burn(&mut self, contact_live: bool) -> bool {
        match self.burn {
            BurnState::AwaitingBurn(_) if !contact_live => {
                self.burn = BurnState::Burnt;
                true
            }
            _ => false,
        }
    }
}

/// A wall tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wall {
    /// Breakability and burn progress
    pub tile: Tile,
    /// Neighbour code for hard walls: bit0 north, bit1 east, bit2 south, bit3 west
    pub adjacency: u8,
}

impl Wall {
    /// Breakable wall.
    pub const fn soft() -> Self {
        Self { tile: Tile::new(true), adjacency: 0 }
    }

    /// Unbreakable wall with its neighbour code.
    pub const fn hard(adjacency: u8) -> Self {
        Self { tile: Tile::new(false), adjacency: adjacency & 0x0F }
    }
}

// =============================================================================
// ENTITY
// =============================================================================

/// Kind-specific entity payload.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum EntityKind {
    /// Soft or hard wall
    Wall(Wall),
    /// Placed device
    Bomb(Bomb),
    /// Powerup
    Pickup(Pickup),
    /// Player
    Bomber(Bomber),
    /// Blast
    Explosion(Explosion),
}

/// A simulated object.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Entity {
    /// Stable id (assigned by the registry on spawn)
    pub id: EntityId,
    /// Top-left position
    pub position: Vec2,
    /// Rotation in degrees (presentation only)
    pub rotation: f32,
    /// Nominal width
    pub width: f32,
    /// Nominal height
    pub height: f32,
    destroyed: bool,
    /// Kind payload
    pub kind: EntityKind,
}

/// Nominal bomber sprite size.
pub const BOMBER_WIDTH: f32 = 32.0;
/// Nominal bomber sprite height (a half tile taller than the cell).
pub const BOMBER_HEIGHT: f32 = 48.0;

impl Entity {
    fn with_kind(position: Vec2, width: f32, height: f32, kind: EntityKind) -> Self {
        Self {
            id: EntityId(0),
            position,
            rotation: 0.0,
            width,
            height,
            destroyed: false,
            kind,
        }
    }

    /// Create a wall. Tile entities snap to the grid on creation.
    pub fn wall(position: Vec2, wall: Wall) -> Self {
        Self::with_kind(position.snap_to_grid(), TILE_SIZE, TILE_SIZE, EntityKind::Wall(wall))
    }

    /// Create a bomb.
    pub fn bomb(position: Vec2, bomb: Bomb) -> Self {
        Self::with_kind(position.snap_to_grid(), TILE_SIZE, TILE_SIZE, EntityKind::Bomb(bomb))
    }

    /// Create a pickup.
    pub fn pickup(position: Vec2, pickup: Pickup) -> Self {
        Self::with_kind(position.snap_to_grid(), TILE_SIZE, TILE_SIZE, EntityKind::Pickup(pickup))
    }

    /// Create a bomber. Bombers are free-moving; no snapping.
    pub fn bomber(position: Vec2, bomber: Bomber) -> Self {
        Self::with_kind(position, BOMBER_WIDTH, BOMBER_HEIGHT, EntityKind::Bomber(bomber))
    }

    /// Create an explosion. Its size is its extent.
    pub fn explosion(explosion: Explosion) -> Self {
        let extent = explosion.extent;
        Self::with_kind(
            Vec2::new(extent.x, extent.y),
            extent.w,
            extent.h,
            EntityKind::Explosion(explosion),
        )
    }

    /// Kind tag for dispatch.
    #[inline]
    pub fn tag(&self) -> KindTag {
        match self.kind {
            EntityKind::Wall(_) => KindTag::Wall,
            EntityKind::Bomb(_) => KindTag::Bomb,
            EntityKind::Pickup(_) => KindTag::Pickup,
            EntityKind::Bomber(_) => KindTag::Bomber,
            EntityKind::Explosion(_) => KindTag::Explosion,
        }
    }

    /// Registry category for this entity.
    #[inline]
    pub fn category(&self) -> Category {
        match self.kind {
            EntityKind::Wall(_) | EntityKind::Bomb(_) | EntityKind::Pickup(_) => Category::Tile,
            EntityKind::Explosion(_) => Category::Explosion,
            EntityKind::Bomber(_) => Category::Bomber,
        }
    }

    /// Collider derived from the current position.
    ///
    /// Computed on every read, so it always reflects this tick's position.
    #[inline]
    pub fn collider(&self) -> Rect {
        let p = self.position;
        match &self.kind {
            EntityKind::Wall(_) | EntityKind::Bomb(_) => Rect::at(p, self.width, self.height),
            EntityKind::Pickup(_) => Rect::new(p.x + 8.0, p.y + 8.0, self.width - 16.0, self.height - 16.0),
            // Feet only: the top half-tile of the sprite overlaps the row above
            EntityKind::Bomber(_) => Rect::new(p.x + 3.0, p.y + 16.0 + 3.0, self.width - 6.0, self.height - 16.0 - 6.0),
            EntityKind::Explosion(explosion) => explosion.extent,
        }
    }

    /// Tile state, for grid-aligned kinds.
    pub fn tile(&self) -> Option<&Tile> {
        match &self.kind {
            EntityKind::Wall(wall) => Some(&wall.tile),
            EntityKind::Bomb(bomb) => Some(&bomb.tile),
            EntityKind::Pickup(pickup) => Some(&pickup.tile),
            _ => None,
        }
    }

    /// Mutable tile state, for grid-aligned kinds.
    pub fn tile_mut(&mut self) -> Option<&mut Tile> {
        match &mut self.kind {
            EntityKind::Wall(wall) => Some(&mut wall.tile),
            EntityKind::Bomb(bomb) => Some(&mut bomb.tile),
            EntityKind::Pickup(pickup) => Some(&mut pickup.tile),
            _ => None,
        }
    }

    /// True if blasts can destroy this entity.
    pub fn is_breakable(&self) -> bool {
        self.tile().is_some_and(|tile| tile.breakable)
    }

    /// Bomber payload.
    pub fn as_bomber(&self) -> Option<&Bomber> {
        match &self.kind {
            EntityKind::Bomber(bomber) => Some(bomber),
            _ => None,
        }
    }

    /// Mutable bomber payload.
    pub fn as_bomber_mut(&mut self) -> Option<&mut Bomber> {
        match &mut self.kind {
            EntityKind::Bomber(bomber) => Some(bomber),
            _ => None,
        }
    }

    /// Bomb payload.
    pub fn as_bomb(&self) -> Option<&Bomb> {
        match &self.kind {
            EntityKind::Bomb(bomb) => Some(bomb),
            _ => None,
        }
    }

    /// Mutable bomb payload.
    pub fn as_bomb_mut(&mut self) -> Option<&mut Bomb> {
        match &mut self.kind {
            EntityKind::Bomb(bomb) => Some(bomb),
            _ => None,
        }
    }

    /// Mark for removal in the reap step.
    #[inline]
    pub fn destroy(&mut self) {
        self.destroyed = true;
    }

    /// Has this entity been marked for removal?
    #[inline]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Snap position to the nearest grid cell.
    #[inline]
    pub fn snap_to_grid(&mut self) {
        self.position = self.position.snap_to_grid();
    }

    /// Hash this entity for verification.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u32(self.id.0);
        hasher.update_u8(self.tag() as u8);
        hasher.update_vec2(self.position);
        hasher.update_bool(self.destroyed);
        match &self.kind {
            EntityKind::Wall(wall) => {
                hasher.update_bool(wall.tile.breakable);
                hasher.update_bool(wall.tile.contact().is_some());
            }
            EntityKind::Bomb(bomb) => bomb.hash_into(hasher),
            EntityKind::Pickup(pickup) => hasher.update_u8(pickup.kind as u8),
            EntityKind::Bomber(bomber) => bomber.hash_into(hasher),
            EntityKind::Explosion(explosion) => {
                hasher.update_rect(explosion.extent);
                hasher.update_u32(explosion.ticks);
            }
        }
    }
}
