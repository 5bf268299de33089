//! Match State Machine
//!
//! Last-survivor scoring. Each tick the scoreboard counts the dead among the
//! roster; a lone survivor earns a point and the round concludes. Once a
//! round has concluded nothing else is scored until the map resets.

use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};
use tracing::info;

use crate::game::entity::PlayerId;
use crate::game::world::World;

/// Round state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundPhase {
    /// Play in progress
    #[default]
    Active,
    /// Result decided; waiting for the reset gate
    Concluded,
}

/// How a round ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundOutcome {
    /// One player survived and scored
    Won(PlayerId),
    /// Everyone died; nobody scored
    Drawn,
}

/// Per-player scores and round state.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Scoreboard {
    roster: Vec<PlayerId>,
    scores: BTreeMap<PlayerId, u32>,
    phase: RoundPhase,
}

impl Scoreboard {
    /// Scoreboard for a roster, all scores zero.
    pub fn new(roster: Vec<PlayerId>) -> Self {
        let mut board = Self::default();
        board.set_roster(roster);
        board
    }

    /// Replace the roster. Existing scores are kept.
    pub fn set_roster(&mut self, roster: Vec<PlayerId>) {
        for player in &roster {
            self.scores.entry(*player).or_insert(0);
        }
        self.roster = roster;
    }

    /// Players taking part in the current round.
    pub fn roster(&self) -> &[PlayerId] {
        &self.roster
    }

    /// A player's score.
    pub fn score(&self, player: PlayerId) -> u32 {
        self.scores.get(&player).copied().unwrap_or(0)
    }

    /// All scores by player.
    pub fn scores(&self) -> &BTreeMap<PlayerId, u32> {
        &self.scores
    }

    /// Current round state.
    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    /// Has the round result been decided?
    pub fn round_concluded(&self) -> bool {
        self.phase == RoundPhase::Concluded
    }

    /// Evaluate round end against the world.
    ///
    /// A roster player whose bomber is dead or gone counts as dead. Does
    /// nothing once concluded, and never concludes with fewer than two
    /// players.
    pub fn evaluate(&mut self, world: &World) -> Option<RoundOutcome> {
        if self.round_concluded() || self.roster.len() < 2 {
            return None;
        }

        let alive: Vec<PlayerId> = self
            .roster
            .iter()
            .copied()
            .filter(|player| {
                world
                    .bomber(*player)
                    .and_then(|e| e.as_bomber())
                    .is_some_and(|b| b.is_alive())
            })
            .collect();
        let dead = self.roster.len() - alive.len();

        if dead == self.roster.len() - 1 {
            let winner = alive[0];
            let score = self.scores.entry(winner).or_insert(0);
            *score += 1;
            self.phase = RoundPhase::Concluded;
            info!(player = %winner, score = *score, "round won");
            Some(RoundOutcome::Won(winner))
        } else if dead >= self.roster.len() {
            self.phase = RoundPhase::Concluded;
            info!("round drawn, no survivors");
            Some(RoundOutcome::Drawn)
        } else {
            None
        }
    }

    /// Concluded and at most one bomber (alive or animating) remains.
    pub fn ready_for_reset(&self, world: &World) -> bool {
        self.round_concluded() && world.live_bombers().count() <= 1
    }

    /// Start a new round.
    pub fn begin_round(&mut self) {
        self.phase = RoundPhase::Active;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rect::Rect;
    use crate::core::vec2::Vec2;
    use crate::game::bomber::Bomber;
    use crate::game::entity::{Category, Entity};
    use crate::game::world::Slot;

    fn players() -> Vec<PlayerId> {
        (1..=4).map(PlayerId::new).collect()
    }

    fn world_with_bombers() -> World {
        let mut world = World::new(Rect::new(0.0, 0.0, 480.0, 416.0));
        for player in players() {
            world.spawn(Entity::bomber(Vec2::ZERO, Bomber::new(player)));
        }
        world
    }

    fn kill(world: &mut World, slots: &[u8]) {
        for slot in slots {
            if let Some(b) = world.bomber_mut(PlayerId::new(*slot)).and_then(|e| e.as_bomber_mut()) {
                b.kill();
            }
        }
    }

    #[test]
    fn test_single_elimination_scores_once() {
        let mut world = world_with_bombers();
        let mut board = Scoreboard::new(players());

        assert_eq!(board.evaluate(&world), None);

        kill(&mut world, &[1, 2, 4]);
        assert_eq!(board.evaluate(&world), Some(RoundOutcome::Won(PlayerId::new(3))));
        assert_eq!(board.score(PlayerId::new(3)), 1);
        assert!(board.round_concluded());

        // Same state again: no second point
        assert_eq!(board.evaluate(&world), None);
        assert_eq!(board.score(PlayerId::new(3)), 1);

        // Survivor dying afterwards changes nothing
        kill(&mut world, &[3]);
        assert_eq!(board.evaluate(&world), None);
        assert_eq!(board.score(PlayerId::new(3)), 1);
    }

    #[test]
    fn test_simultaneous_elimination_scores_nobody() {
        let mut world = world_with_bombers();
        let mut board = Scoreboard::new(players());

        kill(&mut world, &[1, 2, 3, 4]);
        assert_eq!(board.evaluate(&world), Some(RoundOutcome::Drawn));
        assert!(board.round_concluded());
        assert!(board.scores().values().all(|s| *s == 0));
    }

    #[test]
    fn test_reaped_bomber_counts_as_dead() {
        let mut world = world_with_bombers();
        let mut board = Scoreboard::new(players());

        kill(&mut world, &[1, 2]);
        // Player 4's bomber already removed from the registry
        let slot = world.slot_of(world.bomber(PlayerId::new(4)).unwrap().id).unwrap();
        world.remove(slot);

        assert_eq!(board.evaluate(&world), Some(RoundOutcome::Won(PlayerId::new(3))));
    }

    #[test]
    fn test_reset_gate() {
        let mut world = world_with_bombers();
        let mut board = Scoreboard::new(players());
        kill(&mut world, &[1, 2, 4]);
        board.evaluate(&world);

        // Dead bombers still animating hold the gate closed
        assert!(!board.ready_for_reset(&world));

        while world.category_len(Category::Bomber) > 1 {
            world.remove(Slot::new(Category::Bomber, 0));
        }
        assert!(board.ready_for_reset(&world));

        board.begin_round();
        assert_eq!(board.phase(), RoundPhase::Active);
    }

    #[test]
    fn test_small_roster_never_concludes() {
        let mut world = World::new(Rect::new(0.0, 0.0, 96.0, 96.0));
        world.spawn(Entity::bomber(Vec2::ZERO, Bomber::new(PlayerId::new(1))));
        kill(&mut world, &[1]);

        let mut board = Scoreboard::new(vec![PlayerId::new(1)]);
        assert_eq!(board.evaluate(&world), None);
        assert!(!board.round_concluded());
    }

    #[test]
    fn test_set_roster_keeps_scores() {
        let mut board = Scoreboard::new(players());
        let world = {
            let mut w = world_with_bombers();
            kill(&mut w, &[2, 3, 4]);
            w
        };
        board.evaluate(&world);
        board.set_roster(players());
        assert_eq!(board.score(PlayerId::new(1)), 1);
    }
}
