//! Blast Propagation
//!
//! A detonating bomb spawns one horizontal and one vertical explosion. Each
//! arm of an explosion is found by stepping one tile at a time away from the
//! origin and probing what occupies that cell.

use serde::{Serialize, Deserialize};

use crate::core::rect::Rect;
use crate::core::vec2::Vec2;
use crate::TILE_SIZE;

/// Animation frames in an explosion.
pub const EXPLOSION_FRAMES: u32 = 8;
/// Ticks per animation frame.
pub const TICKS_PER_FRAME: u32 = 5;
/// Total explosion lifetime in ticks.
pub const EXPLOSION_TICKS: u32 = EXPLOSION_FRAMES * TICKS_PER_FRAME;

/// Explosion orientation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum BlastAxis {
    /// Left and right arms
    Horizontal = 0,
    /// Up and down arms
    Vertical = 1,
}

/// What a blast probe found in a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Occupancy {
    /// Nothing in the cell
    Empty,
    /// A breakable tile: soft wall or bomb
    Breakable,
    /// An unbreakable wall
    Solid,
}

impl Occupancy {
    /// Combine two occupants of the same cell. Solid wins.
    #[inline]
    pub fn merge(self, other: Occupancy) -> Occupancy {
        self.max(other)
    }
}

/// Distance one blast arm travels from the origin.
///
/// `step` is the signed probe stride (`-TILE_SIZE` or `TILE_SIZE`) and the
/// result is the signed offset of the last cell reached. A solid cell stops
/// the arm before it. A breakable cell is included and, without pierce,
/// ends the arm.
pub fn blast_reach<F>(firepower: u8, pierce: bool, step: f32, mut probe: F) -> f32
where
    F: FnMut(f32) -> Occupancy,
{
    let mut reach = 0.0;

    for _ in 0..firepower {
        let next = reach + step;
        match probe(next) {
            Occupancy::Solid => break,
            Occupancy::Breakable => {
                reach = next;
                if !pierce {
                    break;
                }
            }
            Occupancy::Empty => reach = next,
        }
    }

    reach
}

/// A live blast.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Explosion {
    /// Orientation
    pub axis: BlastAxis,
    /// Detonation cell
    pub origin: Vec2,
    /// Covered area, fixed at creation
    pub extent: Rect,
    /// Distance from the start of the extent to the origin cell
    pub centre_offset: f32,
    /// Ticks since creation
    pub ticks: u32,
}

impl Explosion {
    /// Build an explosion, probing the world once for each arm.
    ///
    /// `occupancy` answers what occupies the cell whose top-left corner is
    /// the given point.
    pub fn propagate<F>(axis: BlastAxis, origin: Vec2, firepower: u8, pierce: bool, mut occupancy: F) -> Self
    where
        F: FnMut(Vec2) -> Occupancy,
    {
        let (extent, centre_offset) = match axis {
            BlastAxis::Horizontal => {
                let mut probe = |dx: f32| occupancy(Vec2::new(origin.x + dx, origin.y));
                let left = blast_reach(firepower, pierce, -TILE_SIZE, &mut probe);
                let right = blast_reach(firepower, pierce, TILE_SIZE, &mut probe);
                let extent = Rect::new(origin.x + left, origin.y, right - left + TILE_SIZE, TILE_SIZE);
                (extent, -left)
            }
            BlastAxis::Vertical => {
                let mut probe = |dy: f32| occupancy(Vec2::new(origin.x, origin.y + dy));
                let top = blast_reach(firepower, pierce, -TILE_SIZE, &mut probe);
                let bottom = blast_reach(firepower, pierce, TILE_SIZE, &mut probe);
                let extent = Rect::new(origin.x, origin.y + top, TILE_SIZE, bottom - top + TILE_SIZE);
                (extent, -top)
            }
        };

        Self {
            axis,
            origin,
            extent,
            centre_offset,
            ticks: 0,
        }
    }

    /// Current animation frame.
    #[inline]
    pub fn frame(&self) -> u32 {
        (self.ticks / TICKS_PER_FRAME).min(EXPLOSION_FRAMES - 1)
    }

    /// Per-tick update. Returns true when the animation has finished.
    pub fn update(&mut self) -> bool {
        self.ticks += 1;
        self.ticks >= EXPLOSION_TICKS
    }
}
