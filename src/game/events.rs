//! Game Events
//!
//! Events generated during simulation for observers, logging and replay
//! checks. They describe what happened; they never drive simulation logic.

use serde::{Serialize, Deserialize};

use crate::core::vec2::Vec2;
use crate::game::bomb::KickDirection;
use crate::game::entity::{EntityId, PlayerId};
use crate::game::pickup::PickupKind;

/// Game event data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GameEventData {
    /// A bomb was placed
    BombPlanted {
        bomb_id: EntityId,
        owner: PlayerId,
        position: Vec2,
    },

    /// A bomb detonated and spawned its explosions
    BombDetonated {
        bomb_id: EntityId,
        owner: PlayerId,
        position: Vec2,
    },

    /// A bomber set a bomb sliding
    KickStarted {
        bomb_id: EntityId,
        player: PlayerId,
        direction: KickDirection,
    },

    /// A sliding bomb came to rest
    KickStopped {
        bomb_id: EntityId,
        position: Vec2,
    },

    /// A bomber was caught in a blast
    PlayerEliminated {
        player: PlayerId,
    },

    /// A bomber picked up a powerup
    PickupCollected {
        player: PlayerId,
        kind: PickupKind,
    },

    /// A soft wall burnt, possibly leaving a pickup behind
    WallDestroyed {
        position: Vec2,
        drop: Option<PickupKind>,
    },

    /// Round ended with a survivor
    RoundWon {
        player: PlayerId,
        score: u32,
    },

    /// Round ended with nobody left standing
    RoundDrawn,

    /// Terrain regenerated for a new round
    MapReset {
        round: u32,
    },

    /// Whole game restarted with scores cleared
    GameReset,
}

/// A game event with timing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    /// Tick when event occurred
    pub tick: u64,

    /// Event data
    pub data: GameEventData,
}

impl GameEvent {
    /// Create a new event.
    pub fn new(tick: u64, data: GameEventData) -> Self {
        Self { tick, data }
    }

    /// Player the event concerns, if any.
    pub fn player(&self) -> Option<PlayerId> {
        match &self.data {
            GameEventData::BombPlanted { owner, .. } => Some(*owner),
            GameEventData::BombDetonated { owner, .. } => Some(*owner),
            GameEventData::KickStarted { player, .. } => Some(*player),
            GameEventData::PlayerEliminated { player } => Some(*player),
            GameEventData::PickupCollected { player, .. } => Some(*player),
            GameEventData::RoundWon { player, .. } => Some(*player),
            _ => None,
        }
    }

    /// Is this a round-level event?
    pub fn is_round_event(&self) -> bool {
        matches!(
            self.data,
            GameEventData::RoundWon { .. }
                | GameEventData::RoundDrawn
                | GameEventData::MapReset { .. }
                | GameEventData::GameReset
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_player() {
        let event = GameEvent::new(5, GameEventData::PlayerEliminated { player: PlayerId::new(2) });
        assert_eq!(event.player(), Some(PlayerId::new(2)));
        assert!(!event.is_round_event());

        let event = GameEvent::new(5, GameEventData::RoundDrawn);
        assert_eq!(event.player(), None);
        assert!(event.is_round_event());
    }

    #[test]
    fn test_event_serializes() {
        let event = GameEvent::new(
            12,
            GameEventData::PickupCollected { player: PlayerId::new(1), kind: PickupKind::Kick },
        );
        let json = serde_json::to_string(&event).unwrap();
        let back: GameEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
