//! Arena Map
//!
//! Token grid for an arena and the generator that turns it into entities.
//! Maps are rows of comma-separated tokens, one token per 32-unit cell.

use std::path::Path;

use tracing::debug;

use crate::core::rect::Rect;
use crate::core::rng::DeterministicRng;
use crate::core::vec2::Vec2;
use crate::game::bomber::Bomber;
use crate::game::entity::{Entity, PlayerId, Wall};
use crate::game::pickup::{Pickup, PickupKind};
use crate::game::world::World;
use crate::TILE_SIZE;

/// Built-in 15x13 arena: four corner spawns inside a ring of hard walls.
pub const DEFAULT_MAP: &str = "\
H,H,H,H,H,H,H,H,H,H,H,H,H,H,H
H,1,,S,S,S,S,S,S,S,S,S,,2,H
H,,H,S,H,S,H,S,H,S,H,S,H,,H
H,S,S,S,S,S,S,S,S,S,S,S,S,S,H
H,S,H,S,H,S,H,S,H,S,H,S,H,S,H
H,S,S,S,S,S,S,S,S,S,S,S,S,S,H
H,S,H,S,H,S,H,S,H,S,H,S,H,S,H
H,S,S,S,S,S,S,S,S,S,S,S,S,S,H
H,S,H,S,H,S,H,S,H,S,H,S,H,S,H
H,S,S,S,S,S,S,S,S,S,S,S,S,S,H
H,,H,S,H,S,H,S,H,S,H,S,H,,H
H,3,,S,S,S,S,S,S,S,S,S,,4,H
H,H,H,H,H,H,H,H,H,H,H,H,H,H,H
";

/// Adjacency bit for a hard wall to the north.
pub const ADJ_NORTH: u8 = 1;
/// Adjacency bit for a hard wall to the east.
pub const ADJ_EAST: u8 = 2;
/// Adjacency bit for a hard wall to the south.
pub const ADJ_SOUTH: u8 = 4;
/// Adjacency bit for a hard wall to the west.
pub const ADJ_WEST: u8 = 8;

/// Map loading errors.
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    /// No non-empty rows
    #[error("map has no rows")]
    Empty,

    /// Rows of differing length
    #[error("row {row} has {found} columns, expected {expected}")]
    Ragged {
        /// Offending row
        row: usize,
        /// Columns in the offending row
        found: usize,
        /// Columns in the first row
        expected: usize,
    },

    /// Map file could not be read
    #[error("failed to read map file: {0}")]
    Io(#[from] std::io::Error),
}

/// A single map cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Token {
    /// Nothing
    Empty,
    /// Breakable wall, placed with probability `soft_wall_rate`
    SoftWall,
    /// Unbreakable wall
    HardWall,
    /// Player spawn
    Spawn(PlayerId),
    /// Explicit pickup
    Pickup(PickupKind),
}

impl Token {
    /// Parse a single cell. Unknown tokens are empty cells.
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "S" => Token::SoftWall,
            "H" => Token::HardWall,
            "1" => Token::Spawn(PlayerId::new(1)),
            "2" => Token::Spawn(PlayerId::new(2)),
            "3" => Token::Spawn(PlayerId::new(3)),
            "4" => Token::Spawn(PlayerId::new(4)),
            other => PickupKind::from_token(other).map_or(Token::Empty, Token::Pickup),
        }
    }
}

/// Parsed, rectangular token grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MapGrid {
    cells: Vec<Token>,
    columns: usize,
    rows: usize,
}

impl MapGrid {
    /// Build from a row-major grid of raw tokens.
    pub fn from_rows<S: AsRef<str>>(rows: &[Vec<S>]) -> Result<Self, MapError> {
        let first = rows.first().ok_or(MapError::Empty)?;
        let columns = first.len();
        if columns == 0 {
            return Err(MapError::Empty);
        }

        let mut cells = Vec::with_capacity(columns * rows.len());
        for (row, tokens) in rows.iter().enumerate() {
            if tokens.len() != columns {
                return Err(MapError::Ragged { row, found: tokens.len(), expected: columns });
            }
            cells.extend(tokens.iter().map(|t| Token::parse(t.as_ref())));
        }

        Ok(Self { cells, columns, rows: rows.len() })
    }

    /// Parse map text. Blank lines are skipped.
    pub fn parse(text: &str) -> Result<Self, MapError> {
        let rows: Vec<Vec<&str>> = text
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .filter(|line| !line.trim().is_empty())
            .map(|line| line.split(',').collect())
            .collect();
        Self::from_rows(&rows)
    }

    /// Read and parse a map file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MapError> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// The built-in arena.
    pub fn default_map() -> Self {
        // The constant is a well-formed grid
        match Self::parse(DEFAULT_MAP) {
            Ok(grid) => grid,
            Err(e) => unreachable!("built-in map is invalid: {}", e),
        }
    }

    /// Width in cells.
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Height in cells.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Token at a cell; out-of-range cells are empty.
    pub fn token(&self, col: usize, row: usize) -> Token {
        if col >= self.columns || row >= self.rows {
            return Token::Empty;
        }
        self.cells[row * self.columns + col]
    }

    /// Arena extent in world units.
    pub fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.columns as f32 * TILE_SIZE, self.rows as f32 * TILE_SIZE)
    }

    /// Players with a spawn on this map, in slot order.
    pub fn roster(&self) -> Vec<PlayerId> {
        let mut players: Vec<PlayerId> = self
            .cells
            .iter()
            .filter_map(|t| match t {
                Token::Spawn(player) => Some(*player),
                _ => None,
            })
            .collect();
        players.sort();
        players.dedup();
        players
    }

    /// Neighbour code of a hard wall cell.
    pub fn adjacency(&self, col: usize, row: usize) -> u8 {
        let hard = |c: usize, r: usize| self.token(c, r) == Token::HardWall;
        let mut code = 0;
        if row > 0 && hard(col, row - 1) {
            code |= ADJ_NORTH;
        }
        if hard(col + 1, row) {
            code |= ADJ_EAST;
        }
        if hard(col, row + 1) {
            code |= ADJ_SOUTH;
        }
        if col > 0 && hard(col - 1, row) {
            code |= ADJ_WEST;
        }
        code
    }

    /// Spawn this map's entities into `world`.
    ///
    /// Soft walls appear with probability `soft_wall_rate`. A player with
    /// several spawn tokens gets a bomber at the first one only.
    pub fn populate(&self, world: &mut World, rng: &mut DeterministicRng, soft_wall_rate: f64) {
        let mut placed: Vec<PlayerId> = Vec::new();

        for row in 0..self.rows {
            for col in 0..self.columns {
                let cell = Vec2::from_cell(col, row);
                match self.token(col, row) {
                    Token::Empty => {}
                    Token::SoftWall => {
                        if rng.chance(soft_wall_rate) {
                            world.spawn(Entity::wall(cell, Wall::soft()));
                        }
                    }
                    Token::HardWall => {
                        world.spawn(Entity::wall(cell, Wall::hard(self.adjacency(col, row))));
                    }
                    Token::Spawn(player) => {
                        if placed.contains(&player) {
                            continue;
                        }
                        placed.push(player);
                        // Sprite stands half a tile above its cell
                        let position = Vec2::new(cell.x, cell.y - TILE_SIZE / 2.0);
                        world.spawn(Entity::bomber(position, Bomber::new(player)));
                    }
                    Token::Pickup(kind) => {
                        world.spawn(Entity::pickup(cell, Pickup::new(kind)));
                    }
                }
            }
        }

        debug!(entities = world.len(), players = placed.len(), "map populated");
    }
}
