//! Pickups
//!
//! Each pickup kind maps to one pure bonus function over bomber stats.
//! The table is closed: adding a kind forces a new table entry.

use serde::{Serialize, Deserialize};

use crate::game::bomber::BomberStats;
use crate::game::entity::Tile;

/// Powerup kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum PickupKind {
    /// One more bomb slot (and one ammo back)
    Ammo = 0,
    /// Firepower +1
    Firepower = 1,
    /// Firepower to the cap
    FirepowerMax = 2,
    /// Move speed +0.5
    Speed = 3,
    /// Blasts pass through soft walls
    Pierce = 4,
    /// Bombs can be kicked
    Kick = 5,
    /// Fuse 15 ticks shorter
    FuseReduce = 6,
}

/// Bonus application function.
pub type Bonus = fn(&mut BomberStats);

/// Pickup kind to bonus table.
pub const BONUS_TABLE: [(PickupKind, Bonus); 7] = [
    (PickupKind::Ammo, |stats| stats.add_ammo(1)),
    (PickupKind::Firepower, |stats| stats.add_firepower(1)),
    (PickupKind::FirepowerMax, |stats| stats.add_firepower(6)),
    (PickupKind::Speed, |stats| stats.add_speed(0.5)),
    (PickupKind::Pierce, |stats| stats.pierce = true),
    (PickupKind::Kick, |stats| stats.kick = true),
    (PickupKind::FuseReduce, |stats| stats.reduce_fuse(15)),
];

impl PickupKind {
    /// All kinds, in drop-table order.
    pub const ALL: [PickupKind; 7] = [
        PickupKind::Ammo,
        PickupKind::Firepower,
        PickupKind::FirepowerMax,
        PickupKind::Speed,
        PickupKind::Pierce,
        PickupKind::Kick,
        PickupKind::FuseReduce,
    ];

    /// Parse a map token (`PB`, `PU`, `PM`, `PS`, `PP`, `PK`, `PT`).
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "PB" => Some(PickupKind::Ammo),
            "PU" => Some(PickupKind::Firepower),
            "PM" => Some(PickupKind::FirepowerMax),
            "PS" => Some(PickupKind::Speed),
            "PP" => Some(PickupKind::Pierce),
            "PK" => Some(PickupKind::Kick),
            "PT" => Some(PickupKind::FuseReduce),
            _ => None,
        }
    }

    /// Bonus function for this kind.
    pub fn bonus(self) -> Bonus {
        BONUS_TABLE[self as usize].1
    }

    /// Apply this kind's bonus.
    pub fn grant(self, stats: &mut BomberStats) {
        (self.bonus())(stats)
    }
}

/// A pickup lying on the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pickup {
    /// Tile state (always breakable)
    pub tile: Tile,
    /// What it grants
    pub kind: PickupKind,
}

impl Pickup {
    /// Create a pickup.
    pub const fn new(kind: PickupKind) -> Self {
        Self { tile: Tile::new(true), kind }
    }
}
