//! Simulation Tick
//!
//! One fixed step of the arena. Every entity is visited in registry order
//! (tiles, explosions, bombers; insertion order within each): it updates,
//! is reaped if destroyed, and otherwise reacts to every entity it overlaps.
//! Round scoring and the map reset run after the entity pass.
//!
//! Same state plus same inputs gives the same next state. The only
//! randomness comes from `state.rng`.

use std::collections::BTreeMap;

use tracing::debug;

use crate::config::ArenaConfig;
use crate::core::rng::DeterministicRng;
use crate::game::bomb::Bomb;
use crate::game::bomber::BomberAction;
use crate::game::collision::react;
use crate::game::entity::{Category, Entity, EntityKind};
use crate::game::events::{GameEvent, GameEventData};
use crate::game::explosion::{BlastAxis, Explosion};
use crate::game::input::InputEvent;
use crate::game::pickup::{Pickup, PickupKind};
use crate::game::score::RoundOutcome;
use crate::game::state::MatchState;
use crate::game::world::{Slot, World};

/// Result of a tick.
#[derive(Debug, Default)]
pub struct TickResult {
    /// Tick number just simulated
    pub tick: u64,
    /// Events generated this tick
    pub events: Vec<GameEvent>,
    /// Round decided this tick
    pub outcome: Option<RoundOutcome>,
    /// Map regenerated this tick
    pub map_reset: bool,
}

/// Borrowed pieces of the match the entity pass needs besides the world.
struct StepContext<'a> {
    tick: u64,
    config: &'a ArenaConfig,
    rng: &'a mut DeterministicRng,
    events: &'a mut Vec<GameEvent>,
}

impl StepContext<'_> {
    fn emit(&mut self, data: GameEventData) {
        self.events.push(GameEvent::new(self.tick, data));
    }
}

/// Run one simulation tick.
///
/// `inputs` are applied in order before anything moves; latched keys stay
/// held across ticks until released.
pub fn tick(state: &mut MatchState, inputs: &[InputEvent]) -> TickResult {
    let mut result = TickResult { tick: state.tick, ..Default::default() };

    // 1. Apply input transitions
    for event in inputs {
        state.apply_input(*event);
    }

    // 2. Bombers are kept in draw order
    state.world.sort_bombers();

    // 3. Entity pass
    {
        let MatchState { world, config, rng, pending_events, tick, .. } = state;
        let mut ctx = StepContext { tick: *tick, config, rng, events: pending_events };
        step_entities(world, &mut ctx);
    }

    // 4. Round state
    if !state.scoreboard.round_concluded() {
        result.outcome = state.scoreboard.evaluate(&state.world);
        match result.outcome {
            Some(RoundOutcome::Won(player)) => {
                let score = state.scoreboard.score(player);
                state.push_event(GameEvent::new(state.tick, GameEventData::RoundWon { player, score }));
            }
            Some(RoundOutcome::Drawn) => {
                state.push_event(GameEvent::new(state.tick, GameEventData::RoundDrawn));
            }
            None => {}
        }
    } else if state.scoreboard.ready_for_reset(&state.world) {
        state.reset_map();
        result.map_reset = true;
    }

    // 5. Advance counters
    state.tick += 1;
    state.reset_delay = state.reset_delay.saturating_add(1);
    result.events = state.take_events();
    result
}

// =============================================================================
// ENTITY PASS
// =============================================================================

fn step_entities(world: &mut World, ctx: &mut StepContext<'_>) {
    for category in Category::ALL {
        let mut index = 0;
        // Length is re-read every iteration: removals shift later entities
        // down, and spawns append to the end and are visited this tick.
        while index < world.category_len(category) {
            let slot = Slot::new(category, index);
            update_entity(world, slot, ctx);

            if world.at(slot).is_destroyed() {
                let entity = world.remove(slot);
                on_destroy(world, entity, ctx);
                continue;
            }

            collide_with_others(world, slot, ctx);
            index += 1;
        }
    }
}

/// Per-kind update. May destroy the entity or spawn a bomb.
fn update_entity(world: &mut World, slot: Slot, ctx: &mut StepContext<'_>) {
    // Tiles burn once the explosion that touched them is gone
    if let Some(contact) = world.at(slot).tile().and_then(|tile| tile.contact()) {
        let contact_live = world.contains(contact);
        let entity = world.at_mut(slot);
        if entity.tile_mut().is_some_and(|tile| tile.advance_burn(contact_live)) {
            entity.destroy();
        }
        return;
    }

    let entity = world.at_mut(slot);
    let action = match &mut entity.kind {
        EntityKind::Bomb(bomb) => {
            if bomb.update(&mut entity.position) {
                entity.destroy();
            }
            return;
        }
        EntityKind::Explosion(explosion) => {
            if explosion.update() {
                entity.destroy();
            }
            return;
        }
        EntityKind::Bomber(bomber) => bomber.update(&mut entity.position),
        EntityKind::Wall(_) | EntityKind::Pickup(_) => return,
    };

    match action {
        BomberAction::Idle => {}
        BomberAction::Expire => {
            entity.destroy();
        }
        BomberAction::Plant(request) => {
            // One tile entity per cell
            if world.tile_contains(request.location) {
                return;
            }

            let bomb = Bomb::new(request.owner, request.firepower, request.pierce, request.fuse_ticks);
            let bomb_id = world.spawn(Entity::bomb(request.location, bomb));
            if let Some(bomber) = world.at_mut(slot).as_bomber_mut() {
                bomber.consume_ammo();
            }
            ctx.emit(GameEventData::BombPlanted {
                bomb_id,
                owner: request.owner,
                position: request.location,
            });
        }
    }
}

/// The entity at `initiator` reacts to every other entity its collider
/// overlaps. Its collider is re-read per pair since a push-out moves it.
fn collide_with_others(world: &mut World, initiator: Slot, ctx: &mut StepContext<'_>) {
    for category in Category::ALL {
        for index in 0..world.category_len(category) {
            let target = Slot::new(category, index);
            if target == initiator {
                continue;
            }

            let initiator_collider = world.at(initiator).collider();
            if !initiator_collider.intersects(&world.at(target).collider()) {
                continue;
            }

            let (receiver, other) = world.pair_mut(initiator, target);
            if let Some(data) = react(receiver, other) {
                ctx.emit(data);
            }
        }
    }
}

/// Teardown for an entity just removed from the registry.
fn on_destroy(world: &mut World, entity: Entity, ctx: &mut StepContext<'_>) {
    match entity.kind {
        EntityKind::Bomb(bomb) => {
            let origin = entity.position.snap_to_grid();

            for axis in [BlastAxis::Horizontal, BlastAxis::Vertical] {
                let explosion = Explosion::propagate(axis, origin, bomb.firepower, bomb.pierce, |point| {
                    world.tile_occupancy(point)
                });
                world.spawn(Entity::explosion(explosion));
            }

            if let Some(owner) = world.bomber_mut(bomb.owner).and_then(|e| e.as_bomber_mut()) {
                owner.stats.restore_ammo();
            }

            debug!(bomb = %entity.id, owner = %bomb.owner, x = origin.x, y = origin.y, "bomb detonated");
            ctx.emit(GameEventData::BombDetonated {
                bomb_id: entity.id,
                owner: bomb.owner,
                position: origin,
            });
        }

        EntityKind::Wall(wall) if wall.tile.breakable => {
            let drop = if ctx.rng.chance(ctx.config.pickup_drop_rate) {
                ctx.rng.choose(&PickupKind::ALL).copied()
            } else {
                None
            };

            if let Some(kind) = drop {
                world.spawn(Entity::pickup(entity.position, Pickup::new(kind)));
            }
            ctx.emit(GameEventData::WallDestroyed { position: entity.position, drop });
        }

        _ => {}
    }
}

// =============================================================================
// REPLAY
// =============================================================================

/// Replay a match from recorded input transitions keyed by tick number.
///
/// Returns the final state and every event generated.
pub fn replay_match(
    initial_state: MatchState,
    recorded_inputs: &BTreeMap<u64, Vec<InputEvent>>,
    tick_count: u64,
) -> (MatchState, Vec<GameEvent>) {
    let mut state = initial_state;
    let mut all_events = Vec::new();

    for _ in 0..tick_count {
        let inputs = recorded_inputs
            .get(&state.tick)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let result = tick(&mut state, inputs);
        all_events.extend(result.events);
    }

    (state, all_events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rect::Rect;
    use crate::core::vec2::Vec2;
    use crate::game::bomb::{KickDirection, KickState};
    use crate::game::bomber::DEATH_TICKS;
    use crate::game::entity::{PlayerId, Wall};
    use crate::game::explosion::EXPLOSION_TICKS;
    use crate::game::input::Key;
    use crate::game::map::MapGrid;
    use crate::game::score::RoundPhase;
    use crate::game::state::RESET_DEBOUNCE_TICKS;

    const P1: PlayerId = PlayerId::new(1);
    const P2: PlayerId = PlayerId::new(2);

    /// Open 9x7 room with two bombers in opposite corners.
    const OPEN_ROOM: &str = "\
H,H,H,H,H,H,H,H,H
H,1,,,,,,,H
H,,,,,,,,H
H,,,,,,,,H
H,,,,,,,,H
H,,,,,,,2,H
H,H,H,H,H,H,H,H,H
";

    fn room(text: &str, config: ArenaConfig) -> MatchState {
        MatchState::from_grid(MapGrid::parse(text).unwrap(), config)
    }

    fn run(state: &mut MatchState, ticks: u64) -> Vec<GameEvent> {
        let mut events = Vec::new();
        for _ in 0..ticks {
            events.extend(tick(state, &[]).events);
        }
        events
    }

    fn bombs(state: &MatchState) -> Vec<&Entity> {
        state
            .world
            .category(Category::Tile)
            .iter()
            .filter(|e| e.as_bomb().is_some())
            .collect()
    }

    fn bomb_at(state: &mut MatchState, x: f32, y: f32, firepower: u8, fuse: u32) {
        state.world.spawn(Entity::bomb(Vec2::new(x, y), Bomb::new(P1, firepower, false, fuse)));
    }

    #[test]
    fn test_tick_determinism() {
        let config = ArenaConfig { seed: 12345, ..Default::default() };
        let mut state1 = MatchState::new(config.clone());
        let mut state2 = MatchState::new(config);

        let script: Vec<Vec<InputEvent>> = (0..300u64)
            .map(|t| match t {
                0 => vec![InputEvent::press(P1, Key::Right), InputEvent::press(P2, Key::Down)],
                40 => vec![InputEvent::press(P1, Key::Action)],
                45 => vec![InputEvent::release(P1, Key::Action), InputEvent::release(P1, Key::Right)],
                50 => vec![InputEvent::press(P1, Key::Left)],
                _ => Vec::new(),
            })
            .collect();

        for inputs in &script {
            tick(&mut state1, inputs);
            tick(&mut state2, inputs);
        }

        assert_eq!(state1.tick, 300);
        assert_eq!(state1.compute_hash(), state2.compute_hash());
        assert_eq!(state1.snapshot(), state2.snapshot());
    }

    #[test]
    fn test_replay_determinism() {
        let mut recorded: BTreeMap<u64, Vec<InputEvent>> = BTreeMap::new();
        recorded.insert(0, vec![InputEvent::press(P1, Key::Down), InputEvent::press(P1, Key::Action)]);
        recorded.insert(3, vec![InputEvent::release(P1, Key::Action)]);
        recorded.insert(10, vec![InputEvent::press(P2, Key::Left)]);

        let (final1, events1) = replay_match(MatchState::new(ArenaConfig::default()), &recorded, 400);
        let (final2, events2) = replay_match(MatchState::new(ArenaConfig::default()), &recorded, 400);

        assert_eq!(final1.compute_hash(), final2.compute_hash());
        assert_eq!(events1, events2);
        assert!(events1.iter().any(|e| matches!(e.data, GameEventData::BombDetonated { .. })));
    }

    #[test]
    fn test_bomber_moves_while_key_held() {
        let mut state = room(OPEN_ROOM, ArenaConfig::default());
        let start = state.world.bomber(P1).unwrap().position;

        tick(&mut state, &[InputEvent::press(P1, Key::Down)]);
        tick(&mut state, &[]);
        tick(&mut state, &[InputEvent::release(P1, Key::Down)]);
        tick(&mut state, &[]);

        // Released before the third update
        let end = state.world.bomber(P1).unwrap().position;
        assert_eq!(end, Vec2::new(start.x, start.y + 2.0));
    }

    #[test]
    fn test_plant_consumes_ammo_and_blocks_cell() {
        let mut state = room(OPEN_ROOM, ArenaConfig::default());

        let result = tick(&mut state, &[InputEvent::press(P1, Key::Action)]);
        assert!(matches!(
            result.events[0].data,
            GameEventData::BombPlanted { owner: P1, position, .. } if position == Vec2::new(32.0, 32.0)
        ));
        assert_eq!(bombs(&state).len(), 1);

        let bomber = state.world.bomber_mut(P1).unwrap().as_bomber_mut().unwrap();
        assert_eq!(bomber.stats.ammo, 0);

        // Extra ammo does not allow a second bomb in the same cell
        bomber.stats.max_bombs = 2;
        bomber.stats.ammo = 1;
        let result = tick(&mut state, &[]);
        assert!(result.events.is_empty());
        assert_eq!(bombs(&state).len(), 1);
        assert_eq!(state.world.bomber(P1).unwrap().as_bomber().unwrap().stats.ammo, 1);
    }

    #[test]
    fn test_detonation_restores_ammo() {
        let mut state = room(OPEN_ROOM, ArenaConfig::default());
        tick(&mut state, &[InputEvent::press(P1, Key::Action)]);
        tick(&mut state, &[InputEvent::release(P1, Key::Action)]);

        // Out of the blast, then wait for the fuse
        state.world.bomber_mut(P1).unwrap().position = Vec2::new(128.0, 112.0);
        let events = run(&mut state, 260);

        assert!(events.iter().any(|e| matches!(e.data, GameEventData::BombDetonated { owner: P1, .. })));
        let bomber = state.world.bomber(P1).unwrap().as_bomber().unwrap();
        assert_eq!(bomber.stats.ammo, 1);
    }

    #[test]
    fn test_chain_reaction() {
        let mut state = room(OPEN_ROOM, ArenaConfig::default());
        bomb_at(&mut state, 96.0, 96.0, 2, 0);
        bomb_at(&mut state, 160.0, 96.0, 1, 1000);

        let events = run(&mut state, 1);
        assert_eq!(events.iter().filter(|e| matches!(e.data, GameEventData::BombDetonated { .. })).count(), 1);
        assert_eq!(bombs(&state).len(), 1);

        // The second bomb was hit by the first blast and goes off next tick
        let events = run(&mut state, 1);
        assert!(events.iter().any(|e| matches!(
            e.data,
            GameEventData::BombDetonated { position, .. } if position == Vec2::new(160.0, 96.0)
        )));
        assert!(bombs(&state).is_empty());
        assert_eq!(state.world.category_len(Category::Explosion), 4);
    }

    #[test]
    fn test_soft_wall_burns_after_explosion_ends() {
        let config = ArenaConfig { pickup_drop_rate: 1.0, ..Default::default() };
        let mut state = room(OPEN_ROOM, config);
        let wall = state.world.spawn(Entity::wall(Vec2::new(128.0, 96.0), Wall::soft()));
        bomb_at(&mut state, 96.0, 96.0, 1, 0);

        run(&mut state, 1);
        assert!(state.world.contains(wall));
        assert_eq!(state.world.category_len(Category::Explosion), 2);

        // Explosions finish on their last animation tick
        run(&mut state, (EXPLOSION_TICKS - 1) as u64);
        assert_eq!(state.world.category_len(Category::Explosion), 0);
        assert!(state.world.contains(wall));

        // The wall notices on its next update
        let events = run(&mut state, 1);
        assert!(!state.world.contains(wall));
        let drop = events.iter().find_map(|e| match e.data {
            GameEventData::WallDestroyed { drop, .. } => Some(drop),
            _ => None,
        });
        let kind = drop.flatten().expect("drop rate 1.0 always leaves a pickup");

        let pickup = state
            .world
            .category(Category::Tile)
            .iter()
            .find_map(|e| match &e.kind {
                EntityKind::Pickup(p) => Some((e.position, p.kind)),
                _ => None,
            });
        assert_eq!(pickup, Some((Vec2::new(128.0, 96.0), kind)));
    }

    #[test]
    fn test_kick_slides_until_blocked() {
        let grid = "\
H,H,H,H,H,H,H,H
H,1,,,,,,H
H,,,,,H,,H
H,,,,,,2,H
H,H,H,H,H,H,H,H
";
        let mut state = room(grid, ArenaConfig::default());
        let bomb = state.world.spawn(Entity::bomb(Vec2::new(64.0, 64.0), Bomb::new(P2, 1, false, 250)));
        {
            let entity = state.world.bomber_mut(P1).unwrap();
            entity.position = Vec2::new(37.0, 48.0);
            entity.as_bomber_mut().unwrap().stats.kick = true;
        }

        let result = tick(&mut state, &[InputEvent::press(P1, Key::Right)]);
        assert!(result.events.iter().any(|e| matches!(
            e.data,
            GameEventData::KickStarted { player: P1, direction: KickDirection::FromLeft, .. }
        )));
        let kicked = state.world.get(bomb).unwrap();
        assert_eq!(kicked.as_bomb().unwrap().kick, KickState::Moving(KickDirection::FromLeft));
        assert_eq!(kicked.position, Vec2::new(64.0, 64.0));

        run(&mut state, 2);
        assert_eq!(state.world.get(bomb).unwrap().position, Vec2::new(76.0, 64.0));

        // Stopped in the same pass that hits the wall, never left inside it
        let wall = Rect::new(160.0, 64.0, 32.0, 32.0);
        let mut events = Vec::new();
        for _ in 0..20 {
            events.extend(tick(&mut state, &[]).events);
            assert_eq!(state.world.get(bomb).unwrap().collider().intersection(&wall).area(), 0.0);
        }
        let stopped = state.world.get(bomb).unwrap();
        assert_eq!(stopped.position, Vec2::new(128.0, 64.0));
        assert!(stopped.position.is_grid_aligned());
        assert!(!stopped.as_bomb().unwrap().is_moving());
        assert!(events.iter().any(|e| matches!(e.data, GameEventData::KickStopped { .. })));
    }

    #[test]
    fn test_bomber_pushed_out_of_wall_in_its_own_pass() {
        let mut state = room(OPEN_ROOM, ArenaConfig::default());
        state.world.bomber_mut(P1).unwrap().as_bomber_mut().unwrap().stats.move_speed = 4.0;
        tick(&mut state, &[InputEvent::press(P1, Key::Left)]);

        for _ in 0..5 {
            let bomber = state.world.bomber(P1).unwrap();
            let collider = bomber.collider();
            let overlap: f32 = state
                .world
                .category(Category::Tile)
                .iter()
                .filter(|e| matches!(e.kind, EntityKind::Wall(_)))
                .map(|wall| collider.intersection(&wall.collider()).area())
                .sum();

            // Flush against the border wall at x = 32
            assert_eq!(overlap, 0.0);
            assert_eq!(bomber.position.x, 29.0);
            tick(&mut state, &[]);
        }
    }

    #[test]
    fn test_pickup_collected_by_walking() {
        let grid = "\
H,H,H,H,H,H,H
H,1,PS,,,,H
H,,,,,2,H
H,H,H,H,H,H,H
";
        let mut state = room(grid, ArenaConfig::default());
        tick(&mut state, &[InputEvent::press(P1, Key::Right)]);
        let events = run(&mut state, 20);

        assert!(events.iter().any(|e| matches!(
            e.data,
            GameEventData::PickupCollected { player: P1, kind: PickupKind::Speed }
        )));
        let bomber = state.world.bomber(P1).unwrap().as_bomber().unwrap();
        assert_eq!(bomber.stats.move_speed, 1.5);
        assert!(!state.world.category(Category::Tile).iter().any(|e| matches!(e.kind, EntityKind::Pickup(_))));
    }

    #[test]
    fn test_round_won_then_map_reset() {
        let mut state = room(OPEN_ROOM, ArenaConfig::default());
        // Bomb under player 2's feet
        bomb_at(&mut state, 224.0, 160.0, 1, 0);

        let result = tick(&mut state, &[]);
        assert!(result.events.iter().any(|e| matches!(e.data, GameEventData::PlayerEliminated { player: P2 })));
        assert_eq!(result.outcome, Some(RoundOutcome::Won(P1)));
        assert!(result.events.iter().any(|e| matches!(e.data, GameEventData::RoundWon { player: P1, score: 1 })));
        assert_eq!(state.scoreboard.phase(), RoundPhase::Concluded);

        // The dead bomber animates, then is reaped, then the map resets
        let mut reset_at = None;
        for _ in 0..DEATH_TICKS + 5 {
            let result = tick(&mut state, &[]);
            assert_eq!(result.outcome, None);
            if result.map_reset {
                reset_at = Some(result.tick);
                break;
            }
        }

        // Killed after its tick 0 update; reaped and reset in the same tick
        assert_eq!(reset_at, Some(DEATH_TICKS as u64));
        assert_eq!(state.round, 2);
        assert_eq!(state.score(P1), 1);
        assert_eq!(state.score(P2), 0);
        assert_eq!(state.scoreboard.phase(), RoundPhase::Active);
        assert_eq!(state.world.category_len(Category::Bomber), 2);
        assert!(state.world.bomber(P2).unwrap().as_bomber().unwrap().is_alive());
    }

    #[test]
    fn test_game_reset_clears_scores_after_debounce() {
        let mut state = room(OPEN_ROOM, ArenaConfig::default());
        bomb_at(&mut state, 224.0, 160.0, 1, 0);

        run(&mut state, RESET_DEBOUNCE_TICKS - 1);
        assert_eq!(state.score(P1), 1);
        assert!(!state.request_reset());
        assert_eq!(state.score(P1), 1);

        run(&mut state, 1);
        assert!(state.request_reset());
        assert_eq!(state.round, 1);
        assert_eq!(state.score(P1), 0);
        assert_eq!(state.score(P2), 0);
        assert!(!state.round_concluded());
        assert!(state.world.bomber(P2).unwrap().as_bomber().unwrap().is_alive());
        assert!(matches!(
            state.take_events().as_slice(),
            [GameEvent { data: GameEventData::GameReset, .. }]
        ));

        // The debounce window starts over
        assert!(!state.request_reset());
        let result = tick(&mut state, &[]);
        assert_eq!(result.outcome, None);
        assert!(!result.map_reset);
    }

    #[test]
    fn test_simultaneous_elimination_is_a_draw() {
        let mut state = room(OPEN_ROOM, ArenaConfig::default());
        bomb_at(&mut state, 32.0, 32.0, 1, 0);
        bomb_at(&mut state, 224.0, 160.0, 1, 0);

        let result = tick(&mut state, &[]);
        assert_eq!(result.outcome, Some(RoundOutcome::Drawn));
        assert!(result.events.iter().any(|e| matches!(e.data, GameEventData::RoundDrawn)));
        assert_eq!(state.score(P1), 0);
        assert_eq!(state.score(P2), 0);
    }

    #[test]
    fn test_single_player_round_never_ends() {
        let grid = "\
H,H,H,H,H
H,1,,,H
H,,,,H
H,H,H,H,H
";
        let mut state = room(grid, ArenaConfig::default());
        bomb_at(&mut state, 32.0, 32.0, 1, 0);

        let events = run(&mut state, DEATH_TICKS as u64 + 10);
        assert!(events.iter().any(|e| matches!(e.data, GameEventData::PlayerEliminated { player: P1 })));
        assert!(!events.iter().any(GameEvent::is_round_event));
        assert!(!state.round_concluded());
        assert_eq!(state.world.category_len(Category::Bomber), 0);
    }

    #[test]
    fn test_events_stamped_with_tick() {
        let mut state = room(OPEN_ROOM, ArenaConfig::default());
        run(&mut state, 5);
        let result = tick(&mut state, &[InputEvent::press(P1, Key::Action)]);

        assert_eq!(result.tick, 5);
        assert!(result.events.iter().all(|e| e.tick == 5));
        assert_eq!(state.tick, 6);
    }
}
