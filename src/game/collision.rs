//! Collision Detection and Response
//!
//! Overlap resolution for solid obstacles and the typed reaction table.
//!
//! Reactions are one-directional: when the entity whose pass is running
//! overlaps another, only the running entity reacts, right after its own
//! update. The other side reacts during its own pass, if at all.

use tracing::debug;

use crate::core::rect::Rect;
use crate::core::vec2::Vec2;
use crate::game::bomb::{bomber_contact, blocked_by_bomber};
use crate::game::entity::{Entity, EntityKind};
use crate::game::events::GameEventData;

/// Below this overlap on the unresolved axis, a corner nudge is applied.
pub const CORNER_SMOOTH_THRESHOLD: f32 = 16.0;

/// Size of a corner nudge.
pub const CORNER_NUDGE: f32 = 0.5;

// =============================================================================
// PENETRATION RESOLVER
// =============================================================================

/// Displacement that moves `mover` out of `obstacle`.
///
/// The shallow axis of the intersection is resolved in full. When the
/// overlap along the other axis is small the mover also slides half a unit
/// toward the nearer edge, so it rounds grid corners instead of snagging.
/// A square intersection resolves both axes.
///
/// A mover lying entirely within the obstacle along the resolved axis is
/// pushed back by its own extent, which can leave it partly inside. A
/// second push clears it.
pub fn penetration_push(mover: &Rect, obstacle: &Rect) -> Vec2 {
    let inter = mover.intersection(obstacle);
    let mut push = Vec2::ZERO;

    // Vertical collision
    if inter.w >= inter.h {
        if inter.max_y() >= mover.max_y() {
            push.y -= inter.h;
        } else if inter.max_y() >= obstacle.max_y() {
            push.y += inter.h;
        }

        if inter.w < CORNER_SMOOTH_THRESHOLD {
            if inter.max_x() >= mover.max_x() {
                push.x -= CORNER_NUDGE;
            } else if inter.max_x() >= obstacle.max_x() {
                push.x += CORNER_NUDGE;
            }
        }
    }

    // Horizontal collision
    if inter.h >= inter.w {
        if inter.max_x() >= mover.max_x() {
            push.x -= inter.w;
        } else if inter.max_x() >= obstacle.max_x() {
            push.x += inter.w;
        }

        if inter.h < CORNER_SMOOTH_THRESHOLD {
            if inter.max_y() >= mover.max_y() {
                push.y -= CORNER_NUDGE;
            } else if inter.max_y() >= obstacle.max_y() {
                push.y += CORNER_NUDGE;
            }
        }
    }

    push
}

/// Push an entity out of a solid obstacle.
pub fn solid_collision(mover: &mut Entity, obstacle: &Rect) {
    let push = penetration_push(&mover.collider(), obstacle);
    mover.position += push;
}

// =============================================================================
// REACTIONS
// =============================================================================

/// Run `receiver`'s reaction to overlapping `other`.
///
/// Unmodeled pairs do nothing. Returns an event when the reaction is worth
/// reporting.
pub fn react(receiver: &mut Entity, other: &mut Entity) -> Option<GameEventData> {
    if receiver.is_destroyed() || other.is_destroyed() {
        return None;
    }

    let other_id = other.id;
    let other_collider = other.collider();
    let receiver_collider = receiver.collider();

    #[cfg(feature = "debug-tracing")]
    tracing::trace!(receiver = %receiver.id, other = %other_id, "collision");

    match (&mut receiver.kind, &mut other.kind) {
        // ===== BOMBER =====
        (EntityKind::Bomber(_), EntityKind::Wall(_)) => {
            solid_collision(receiver, &other_collider);
            None
        }

        (EntityKind::Bomber(bomber), EntityKind::Bomb(bomb)) => {
            let contact = bomber_contact(
                &receiver_collider,
                &other_collider,
                bomber.input,
                bomber.stats.kick,
                !bomb.is_moving(),
            );
            let player = bomber.player;

            let event = match contact.kick {
                Some(direction) if bomb.start_kick(direction) => {
                    debug!(%player, bomb = %other_id, ?direction, "bomb kicked");
                    Some(GameEventData::KickStarted { bomb_id: other_id, player, direction })
                }
                _ => None,
            };

            if contact.solid {
                solid_collision(receiver, &other_collider);
            }
            event
        }

        (EntityKind::Bomber(bomber), EntityKind::Explosion(_)) => {
            if bomber.kill() {
                debug!(player = %bomber.player, "bomber caught in blast");
                Some(GameEventData::PlayerEliminated { player: bomber.player })
            } else {
                None
            }
        }

        (EntityKind::Bomber(bomber), EntityKind::Pickup(pickup)) => {
            if !bomber.is_alive() {
                return None;
            }
            pickup.kind.grant(&mut bomber.stats);
            let event = GameEventData::PickupCollected { player: bomber.player, kind: pickup.kind };
            other.destroy();
            Some(event)
        }

        // ===== BOMB =====
        (EntityKind::Bomb(bomb), EntityKind::Bomber(_)) => {
            if !bomb.is_moving() || !blocked_by_bomber(&receiver_collider, &other_collider, bomb.velocity()) {
                return None;
            }
            bomb.stop_kick();
            solid_collision(receiver, &other_collider);
            receiver.snap_to_grid();
            Some(GameEventData::KickStopped { bomb_id: receiver.id, position: receiver.position })
        }

        (EntityKind::Bomb(_), EntityKind::Wall(_) | EntityKind::Bomb(_)) => {
            solid_collision(receiver, &other_collider);
            stop_kick(receiver)
        }

        (EntityKind::Bomb(_), EntityKind::Explosion(_)) => {
            receiver.destroy();
            None
        }

        // ===== TILES HIT BY A BLAST =====
        (EntityKind::Wall(_) | EntityKind::Pickup(_), EntityKind::Explosion(_)) => {
            if let Some(tile) = receiver.tile_mut() {
                tile.touch(other_id);
            }
            None
        }

        (EntityKind::Pickup(_), EntityKind::Bomb(_)) => {
            receiver.destroy();
            None
        }

        _ => None,
    }
}

/// Bring a bomb to rest on the nearest cell.
///
/// Snaps even when the bomb was idle, which undoes any push it received.
fn stop_kick(entity: &mut Entity) -> Option<GameEventData> {
    let was_moving = entity.as_bomb_mut().is_some_and(|bomb| bomb.stop_kick());
    entity.snap_to_grid();

    if was_moving {
        debug!(bomb = %entity.id, x = entity.position.x, y = entity.position.y, "kick stopped");
        Some(GameEventData::KickStopped { bomb_id: entity.id, position: entity.position })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use crate::game::bomb::{Bomb, KickDirection, KickState};
    use crate::game::bomber::Bomber;
    use crate::game::entity::{BurnState, EntityId, PlayerId, Wall};
    use crate::game::explosion::{BlastAxis, Explosion, Occupancy};
    use crate::game::input::{InputFrame, Key};
    use crate::game::pickup::{Pickup, PickupKind};

    fn bomber_at(x: f32, y: f32) -> Entity {
        let mut e = Entity::bomber(Vec2::new(x, y), Bomber::new(PlayerId::new(1)));
        e.id = EntityId(100);
        e
    }

    fn explosion_at(x: f32, y: f32) -> Entity {
        let blast = Explosion::propagate(BlastAxis::Horizontal, Vec2::new(x, y), 1, false, |_| Occupancy::Empty);
        let mut e = Entity::explosion(blast);
        e.id = EntityId(200);
        e
    }

    #[test]
    fn test_push_up_out_of_floor() {
        let mover = Rect::new(0.0, 10.0, 26.0, 26.0);
        let floor = Rect::new(0.0, 32.0, 32.0, 32.0);
        assert_eq!(penetration_push(&mover, &floor), Vec2::new(0.0, -4.0));
    }

    #[test]
    fn test_push_right_out_of_wall() {
        let mover = Rect::new(30.0, 3.0, 26.0, 26.0);
        let wall = Rect::new(0.0, 0.0, 32.0, 32.0);
        assert_eq!(penetration_push(&mover, &wall), Vec2::new(2.0, 0.0));
    }

    #[test]
    fn test_corner_smoothing_nudges_toward_open_side() {
        // Overlap 4 deep vertically and 10 wide: slides left off the corner
        let mover = Rect::new(-16.0, -22.0, 26.0, 26.0);
        let block = Rect::new(0.0, 0.0, 32.0, 32.0);
        assert_eq!(penetration_push(&mover, &block), Vec2::new(-0.5, -4.0));
    }

    #[test]
    fn test_square_overlap_resolves_both_axes() {
        let mover = Rect::new(20.0, 20.0, 26.0, 26.0);
        let block = Rect::new(0.0, 0.0, 32.0, 32.0);
        assert_eq!(penetration_push(&mover, &block), Vec2::new(12.5, 12.5));
    }

    #[test]
    fn test_contained_mover_keeps_residual_overlap() {
        let obstacle = Rect::new(0.0, 0.0, 32.0, 32.0);

        let mover = Rect::new(3.0, 3.0, 26.0, 26.0);
        let push = penetration_push(&mover, &obstacle);
        assert_eq!(push, Vec2::new(-26.0, -26.0));
        let moved = Rect::new(mover.x + push.x, mover.y + push.y, mover.w, mover.h);
        assert_eq!(moved.intersection(&obstacle).area(), 9.0);

        let mover = Rect::new(3.0, 6.0, 26.0, 26.0);
        let push = penetration_push(&mover, &obstacle);
        let moved = Rect::new(mover.x + push.x, mover.y + push.y, mover.w, mover.h);
        assert_eq!(moved.intersection(&obstacle).area(), 18.0);
    }

    proptest! {
        // Offsets in 0..=6 put the mover wholly inside the obstacle on that
        // axis, where one push cannot clear it (see the test above). The
        // ranges keep a unit of margin around that band.
        #[test]
        fn prop_resolver_separates(
            dx in prop_oneof![-25.0f32..-1.0, 7.0f32..31.0],
            dy in prop_oneof![-25.0f32..-1.0, 7.0f32..31.0],
        ) {
            let obstacle = Rect::new(0.0, 0.0, 32.0, 32.0);
            let mover = Rect::new(dx, dy, 26.0, 26.0);
            prop_assume!(mover.intersects(&obstacle));

            let push = penetration_push(&mover, &obstacle);
            let moved = Rect::new(mover.x + push.x, mover.y + push.y, mover.w, mover.h);
            prop_assert!(moved.intersection(&obstacle).area() < 0.01);
        }
    }

    #[test]
    fn test_bomber_blocked_by_wall() {
        // Collider starts at x = 29, three units inside the wall
        let mut bomber = bomber_at(26.0, 16.0);
        let mut wall = Entity::wall(Vec2::new(0.0, 32.0), Wall::hard(0));

        assert!(react(&mut bomber, &mut wall).is_none());
        assert_eq!(bomber.collider().x, 32.0);
    }

    #[test]
    fn test_bomber_dies_once() {
        let mut bomber = bomber_at(32.0, 16.0);
        let mut blast = explosion_at(32.0, 32.0);

        let event = react(&mut bomber, &mut blast);
        assert_eq!(event, Some(GameEventData::PlayerEliminated { player: PlayerId::new(1) }));
        assert!(react(&mut bomber, &mut blast).is_none());
    }

    #[test]
    fn test_pickup_collected_by_living_bomber_only() {
        let mut bomber = bomber_at(64.0, 48.0);
        let mut pickup = Entity::pickup(Vec2::new(64.0, 64.0), Pickup::new(PickupKind::Kick));

        let event = react(&mut bomber, &mut pickup);
        assert!(matches!(event, Some(GameEventData::PickupCollected { kind: PickupKind::Kick, .. })));
        assert!(pickup.is_destroyed());
        assert!(bomber.as_bomber().unwrap().stats.kick);

        let mut dead = bomber_at(64.0, 48.0);
        dead.as_bomber_mut().unwrap().kill();
        let mut pickup = Entity::pickup(Vec2::new(64.0, 64.0), Pickup::new(PickupKind::Speed));
        assert!(react(&mut dead, &mut pickup).is_none());
        assert!(!pickup.is_destroyed());
    }

    #[test]
    fn test_bomber_kicks_bomb() {
        let mut bomber = bomber_at(37.0, 48.0);
        {
            let b = bomber.as_bomber_mut().unwrap();
            b.stats.kick = true;
            b.input = InputFrame::with_keys(&[Key::Right]);
        }
        let mut bomb = Entity::bomb(Vec2::new(64.0, 64.0), Bomb::new(PlayerId::new(1), 1, false, 250));

        let event = react(&mut bomber, &mut bomb);
        assert!(matches!(event, Some(GameEventData::KickStarted { direction: KickDirection::FromLeft, .. })));
        assert_eq!(bomb.as_bomb().unwrap().kick, KickState::Moving(KickDirection::FromLeft));
        // Pushed back out of the bomb face
        assert_eq!(bomber.position.x, 35.0);
    }

    #[test]
    fn test_sliding_bomb_stops_at_wall() {
        let mut bomb = Entity::bomb(Vec2::new(128.0, 64.0), Bomb::new(PlayerId::new(1), 1, false, 250));
        bomb.as_bomb_mut().unwrap().start_kick(KickDirection::FromLeft);
        bomb.position.x = 130.0;
        let mut wall = Entity::wall(Vec2::new(160.0, 64.0), Wall::hard(0));

        let event = react(&mut bomb, &mut wall);
        assert!(matches!(event, Some(GameEventData::KickStopped { .. })));
        assert_eq!(bomb.position, Vec2::new(128.0, 64.0));
        assert_eq!(bomb.as_bomb().unwrap().kick, KickState::Idle);
    }

    #[test]
    fn test_bomb_detonates_on_blast() {
        let mut bomb = Entity::bomb(Vec2::new(64.0, 32.0), Bomb::new(PlayerId::new(1), 1, false, 250));
        let mut blast = explosion_at(32.0, 32.0);

        react(&mut bomb, &mut blast);
        assert!(bomb.is_destroyed());
    }

    #[test]
    fn test_soft_wall_records_first_blast() {
        let mut wall = Entity::wall(Vec2::new(64.0, 32.0), Wall::soft());
        let mut first = explosion_at(32.0, 32.0);
        let mut second = explosion_at(64.0, 32.0);
        second.id = EntityId(201);

        react(&mut wall, &mut first);
        react(&mut wall, &mut second);
        assert_eq!(wall.tile().unwrap().burn, BurnState::AwaitingBurn(EntityId(200)));
        assert!(!wall.is_destroyed());

        let mut hard = Entity::wall(Vec2::new(64.0, 32.0), Wall::hard(0));
        react(&mut hard, &mut first);
        assert_eq!(hard.tile().unwrap().burn, BurnState::Untouched);
    }

    #[test]
    fn test_unmodeled_pair_is_noop() {
        let mut wall = Entity::wall(Vec2::new(32.0, 32.0), Wall::soft());
        let mut bomber = bomber_at(32.0, 16.0);
        let before = wall.position;

        assert!(react(&mut wall, &mut bomber).is_none());
        assert_eq!(wall.position, before);
        assert!(!wall.is_destroyed());
    }
}
