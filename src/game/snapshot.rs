//! Render Snapshots
//!
//! Immutable, serializable view of a completed tick. Renderers and other
//! observers read snapshots and never touch live simulation state.

use serde::{Serialize, Deserialize};

use crate::core::rect::Rect;
use crate::core::vec2::Vec2;
use crate::game::bomber::{Facing, Life};
use crate::game::entity::{Entity, EntityId, EntityKind, PlayerId};
use crate::game::explosion::BlastAxis;
use crate::game::pickup::PickupKind;
use crate::game::score::RoundPhase;
use crate::game::state::MatchState;

/// Kind-specific drawing data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Appearance {
    /// Soft or hard wall
    Wall {
        /// Soft wall?
        breakable: bool,
        /// Hard wall neighbour code
        adjacency: u8,
    },
    /// Bomb
    Bomb {
        /// Sliding?
        moving: bool,
        /// Pierce bombs are drawn differently
        pierce: bool,
    },
    /// Pickup
    Pickup {
        /// Kind
        kind: PickupKind,
    },
    /// Bomber
    Bomber {
        /// Player slot
        player: PlayerId,
        /// Facing
        facing: Facing,
        /// Ticks into the death animation, if dead
        dying: Option<u32>,
    },
    /// Explosion
    Explosion {
        /// Orientation
        axis: BlastAxis,
        /// Offset of the centre cell within the extent
        centre_offset: f32,
        /// Animation frame
        frame: u32,
    },
}

/// One entity as seen by a renderer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntityView {
    /// Entity id
    pub id: EntityId,
    /// Top-left position
    pub position: Vec2,
    /// Rotation (degrees)
    pub rotation: f32,
    /// Collider (for debug overlays)
    pub collider: Rect,
    /// Kind-specific data
    pub appearance: Appearance,
}

impl EntityView {
    /// Build a view of an entity.
    pub fn of(entity: &Entity) -> Self {
        let appearance = match &entity.kind {
            EntityKind::Wall(wall) => Appearance::Wall {
                breakable: wall.tile.breakable,
                adjacency: wall.adjacency,
            },
            EntityKind::Bomb(bomb) => Appearance::Bomb {
                moving: bomb.is_moving(),
                pierce: bomb.pierce,
            },
            EntityKind::Pickup(pickup) => Appearance::Pickup { kind: pickup.kind },
            EntityKind::Bomber(bomber) => Appearance::Bomber {
                player: bomber.player,
                facing: bomber.facing,
                dying: match bomber.life {
                    Life::Alive => None,
                    Life::Dead { ticks } => Some(ticks),
                },
            },
            EntityKind::Explosion(explosion) => Appearance::Explosion {
                axis: explosion.axis,
                centre_offset: explosion.centre_offset,
                frame: explosion.frame(),
            },
        };

        Self {
            id: entity.id,
            position: entity.position,
            rotation: entity.rotation,
            collider: entity.collider(),
            appearance,
        }
    }
}

/// A player's standing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreLine {
    /// Player slot
    pub player: PlayerId,
    /// Rounds won
    pub score: u32,
}

/// Complete read view of one tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Tick this snapshot was taken after
    pub tick: u64,
    /// Round number (starting at 1)
    pub round: u32,
    /// Round state
    pub phase: RoundPhase,
    /// Arena extent
    pub bounds: Rect,
    /// Entities in draw order
    pub entities: Vec<EntityView>,
    /// Scores in player order
    pub scores: Vec<ScoreLine>,
}

impl Snapshot {
    /// Capture the current state.
    pub fn capture(state: &MatchState) -> Self {
        Self {
            tick: state.tick,
            round: state.round,
            phase: state.scoreboard.phase(),
            bounds: state.world.bounds(),
            entities: state.world.all().map(EntityView::of).collect(),
            scores: state
                .scoreboard
                .scores()
                .iter()
                .map(|(player, score)| ScoreLine { player: *player, score: *score })
                .collect(),
        }
    }

    /// Bombers still in play.
    pub fn living_players(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.entities.iter().filter_map(|view| match view.appearance {
            Appearance::Bomber { player, dying: None, .. } => Some(player),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ArenaConfig;
    use crate::game::map::MapGrid;

    #[test]
    fn test_capture_default_match() {
        let state = MatchState::from_grid(MapGrid::default_map(), ArenaConfig::default());
        let snapshot = Snapshot::capture(&state);

        assert_eq!(snapshot.tick, 0);
        assert_eq!(snapshot.round, 1);
        assert_eq!(snapshot.entities.len(), state.world.len());
        assert_eq!(snapshot.living_players().count(), 4);
        assert_eq!(snapshot.scores.len(), 4);

        // Bombers are drawn last
        let last = snapshot.entities.last().unwrap();
        assert!(matches!(last.appearance, Appearance::Bomber { .. }));
    }

    #[test]
    fn test_snapshot_serializes() {
        let state = MatchState::from_grid(MapGrid::default_map(), ArenaConfig::default());
        let snapshot = Snapshot::capture(&state);

        let json = serde_json::to_string(&snapshot).unwrap();
        let back: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }
}
