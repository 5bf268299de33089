//! 2D Vector
//!
//! Float 2D vector used for entity positions and velocities.
//! Grid helpers snap positions to the 32-unit tile lattice.

use std::fmt;
use std::ops::{Add, Sub, Neg, AddAssign};
use serde::{Serialize, Deserialize};

use crate::TILE_SIZE;

/// 2D vector with `f32` components.
///
/// The Y axis grows downward, matching the map's row order.
#[derive(Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
}

impl Vec2 {
    /// Zero vector
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Create a new vector.
    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Position of the top-left corner of grid cell `(col, row)`.
    #[inline]
    pub fn from_cell(col: usize, row: usize) -> Self {
        Self {
            x: col as f32 * TILE_SIZE,
            y: row as f32 * TILE_SIZE,
        }
    }

    /// Scale by a scalar.
    #[inline]
    pub fn scale(self, scalar: f32) -> Self {
        Self {
            x: self.x * scalar,
            y: self.y * scalar,
        }
    }

    /// Snap to the nearest grid lattice point.
    ///
    /// Ties round toward positive infinity, so snapping is idempotent
    /// on lattice points and stable for negative coordinates.
    #[inline]
    pub fn snap_to_grid(self) -> Self {
        Self {
            x: snap_coord(self.x),
            y: snap_coord(self.y),
        }
    }

    /// Check whether both components lie on the grid lattice.
    #[inline]
    pub fn is_grid_aligned(self) -> bool {
        self.x % TILE_SIZE == 0.0 && self.y % TILE_SIZE == 0.0
    }
}

/// Round a single coordinate to the nearest multiple of the tile size.
#[inline]
pub fn snap_coord(value: f32) -> f32 {
    (value / TILE_SIZE + 0.5).floor() * TILE_SIZE
}

impl Add for Vec2 {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

impl AddAssign for Vec2 {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.x += other.x;
        self.y += other.y;
    }
}

impl Sub for Vec2 {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

impl Neg for Vec2 {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self {
            x: -self.x,
            y: -self.y,
        }
    }
}

impl fmt::Debug for Vec2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Vec2({:.2}, {:.2})", self.x, self.y)
    }
}

impl fmt::Display for Vec2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}
