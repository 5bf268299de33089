//! Headless Runner
//!
//! Drives a match in wall-clock time. The runner task is the only mutator of
//! the match state; after each batch of ticks it publishes an immutable
//! snapshot that observers read through a `watch` channel.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info, instrument};

use crate::config::ArenaConfig;
use crate::core::rng::DeterministicRng;
use crate::game::clock::SimClock;
use crate::game::entity::PlayerId;
use crate::game::events::GameEventData;
use crate::game::input::{InputEvent, Key};
use crate::game::snapshot::Snapshot;
use crate::game::state::MatchState;
use crate::game::tick::{tick, TickResult};

/// Supplies input transitions for the next tick.
pub trait InputSource: Send {
    /// Inputs to apply before the tick numbered `state.tick` runs.
    fn poll(&mut self, state: &MatchState) -> Vec<InputEvent>;
}

/// Plays back recorded inputs keyed by tick.
#[derive(Clone, Debug, Default)]
pub struct ScriptedInput {
    script: BTreeMap<u64, Vec<InputEvent>>,
}

impl ScriptedInput {
    /// Wrap a recording.
    pub fn new(script: BTreeMap<u64, Vec<InputEvent>>) -> Self {
        Self { script }
    }
}

impl InputSource for ScriptedInput {
    fn poll(&mut self, state: &MatchState) -> Vec<InputEvent> {
        self.script.remove(&state.tick).unwrap_or_default()
    }
}

const MOVES: [Key; 4] = [Key::Up, Key::Down, Key::Left, Key::Right];

/// Seeded bots that pick a new direction every few ticks and plant now and
/// then. Used by the demo binary and soak tests.
#[derive(Clone, Debug)]
pub struct WanderingBots {
    rng: DeterministicRng,
    players: Vec<PlayerId>,
    heading: BTreeMap<PlayerId, Key>,
    turn_every: u64,
    plant_chance: f64,
}

impl WanderingBots {
    /// Bots for every player on the match roster.
    pub fn for_match(state: &MatchState, seed: u64) -> Self {
        Self {
            rng: DeterministicRng::new(seed),
            players: state.scoreboard.roster().to_vec(),
            heading: BTreeMap::new(),
            turn_every: 24,
            plant_chance: 0.2,
        }
    }
}

impl InputSource for WanderingBots {
    fn poll(&mut self, state: &MatchState) -> Vec<InputEvent> {
        let mut events = Vec::new();
        if state.tick % self.turn_every != 0 {
            return events;
        }

        for &player in &self.players {
            if let Some(previous) = self.heading.remove(&player) {
                events.push(InputEvent::release(player, previous));
            }

            let key = self.rng.choose(&MOVES).copied().unwrap_or(Key::Down);
            events.push(InputEvent::press(player, key));
            self.heading.insert(player, key);

            if self.rng.chance(self.plant_chance) {
                events.push(InputEvent::press(player, Key::Action));
            } else {
                events.push(InputEvent::release(player, Key::Action));
            }
        }

        events
    }
}

/// What a finished run leaves behind.
#[derive(Debug)]
pub struct RunReport {
    /// Final match state
    pub state: MatchState,
    /// Every input applied, keyed by the tick it was applied before
    pub recorded_inputs: BTreeMap<u64, Vec<InputEvent>>,
    /// Ticks skipped because the runner fell behind
    pub dropped_ticks: u64,
    /// Stopped by Ctrl-C rather than the tick limit
    pub interrupted: bool,
}

/// Timed driver for one match.
pub struct Runner<S: InputSource> {
    state: MatchState,
    source: S,
    clock: SimClock,
    tick_limit: Option<u64>,
    recorded: BTreeMap<u64, Vec<InputEvent>>,
    snapshots: watch::Sender<Arc<Snapshot>>,
}

impl<S: InputSource> Runner<S> {
    /// Create a runner. The clock follows `config`.
    pub fn new(state: MatchState, source: S, config: &ArenaConfig) -> Self {
        let (snapshots, _) = watch::channel(Arc::new(state.snapshot()));
        Self {
            state,
            source,
            clock: SimClock::from_config(config),
            tick_limit: None,
            recorded: BTreeMap::new(),
            snapshots,
        }
    }

    /// Stop after this many ticks.
    pub fn with_tick_limit(mut self, limit: u64) -> Self {
        self.tick_limit = Some(limit);
        self
    }

    /// Subscribe to published snapshots.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.snapshots.subscribe()
    }

    /// Current state (read only).
    pub fn state(&self) -> &MatchState {
        &self.state
    }

    fn limit_reached(&self) -> bool {
        self.tick_limit.is_some_and(|limit| self.state.tick >= limit)
    }

    /// Poll inputs and run one tick.
    pub fn step(&mut self) -> TickResult {
        let inputs = self.source.poll(&self.state);
        if !inputs.is_empty() {
            self.recorded.insert(self.state.tick, inputs.clone());
        }
        tick(&mut self.state, &inputs)
    }

    /// Run whatever ticks `elapsed` makes due, then publish one snapshot.
    ///
    /// Returns the number of ticks run.
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        let due = self.clock.advance(elapsed);
        let mut ran = 0;

        for _ in 0..due {
            if self.limit_reached() {
                break;
            }
            let result = self.step();
            for event in &result.events {
                match &event.data {
                    GameEventData::RoundWon { player, score } => {
                        info!(tick = event.tick, %player, score, "round won");
                    }
                    GameEventData::RoundDrawn => info!(tick = event.tick, "round drawn"),
                    GameEventData::MapReset { round } => info!(tick = event.tick, round, "new round"),
                    _ => {}
                }
            }
            ran += 1;
        }

        if ran > 0 {
            self.snapshots.send_replace(Arc::new(self.state.snapshot()));
        }
        ran
    }

    /// Run in real time until the tick limit or Ctrl-C.
    #[instrument(skip(self), fields(seed = self.state.config.seed))]
    pub async fn run(mut self) -> RunReport {
        let mut ticker = interval(self.clock.tick_duration());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        let mut last = Instant::now();
        let mut interrupted = false;

        info!(limit = ?self.tick_limit, "runner started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let now = Instant::now();
                    self.advance(now - last);
                    last = now;

                    if self.limit_reached() {
                        break;
                    }
                }
                _ = &mut shutdown => {
                    info!("shutdown signal received");
                    interrupted = true;
                    break;
                }
            }
        }

        debug!(tick = self.state.tick, dropped = self.clock.dropped_ticks(), "runner stopped");

        RunReport {
            dropped_ticks: self.clock.dropped_ticks(),
            recorded_inputs: self.recorded,
            state: self.state,
            interrupted,
        }
    }
}

/// Log score changes as snapshots arrive. Ends when the runner is dropped.
pub async fn watch_scores(mut snapshots: watch::Receiver<Arc<Snapshot>>) {
    let mut last_round = 0;

    while snapshots.changed().await.is_ok() {
        let snapshot = snapshots.borrow_and_update().clone();
        if snapshot.round == last_round {
            continue;
        }
        last_round = snapshot.round;

        let standings: Vec<String> = snapshot
            .scores
            .iter()
            .map(|line| format!("{}={}", line.player, line.score))
            .collect();
        info!(round = snapshot.round, tick = snapshot.tick, scores = %standings.join(" "), "standings");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::tick::replay_match;

    fn fast_config() -> ArenaConfig {
        ArenaConfig { tick_rate: 1000, max_catch_up_ticks: 50, ..Default::default() }
    }

    #[test]
    fn test_advance_runs_due_ticks() {
        let config = ArenaConfig::default();
        let state = MatchState::new(config.clone());
        let bots = WanderingBots::for_match(&state, 7);
        let mut runner = Runner::new(state, bots, &config);
        let rx = runner.subscribe();

        assert_eq!(runner.advance(Duration::from_millis(50)), 3);
        assert_eq!(runner.state().tick, 3);
        assert_eq!(rx.borrow().tick, 3);

        // Not enough time for another tick: nothing published
        assert_eq!(runner.advance(Duration::from_millis(1)), 0);
    }

    #[test]
    fn test_tick_limit_caps_advance() {
        let config = ArenaConfig::default();
        let state = MatchState::new(config.clone());
        let mut runner = Runner::new(state, ScriptedInput::default(), &config).with_tick_limit(2);

        runner.advance(Duration::from_millis(80));
        assert_eq!(runner.state().tick, 2);
    }

    #[test]
    fn test_bots_turn_on_schedule() {
        let state = MatchState::new(ArenaConfig::default());
        let mut bots = WanderingBots::for_match(&state, 1);

        let first = bots.poll(&state);
        // One movement press and one action transition per player
        assert_eq!(first.len(), 8);
        assert!(first.iter().all(|e| e.pressed || e.key == Key::Action));

        let mut later = state.clone();
        later.tick = 5;
        assert!(bots.poll(&later).is_empty());
    }

    #[test]
    fn test_scripted_input_plays_once() {
        let p1 = PlayerId::new(1);
        let mut script = BTreeMap::new();
        script.insert(0, vec![InputEvent::press(p1, Key::Up)]);
        let mut source = ScriptedInput::new(script);

        let state = MatchState::new(ArenaConfig::default());
        assert_eq!(source.poll(&state).len(), 1);
        assert!(source.poll(&state).is_empty());
    }

    #[tokio::test]
    async fn test_run_publishes_and_replays() {
        let config = fast_config();
        let state = MatchState::new(config.clone());
        let bots = WanderingBots::for_match(&state, 99);
        let runner = Runner::new(state, bots, &config).with_tick_limit(40);
        let mut rx = runner.subscribe();

        let report = runner.run().await;
        assert!(!report.interrupted);
        assert_eq!(report.state.tick, 40);

        // Last published snapshot is the final tick
        let published = rx.borrow_and_update().clone();
        assert_eq!(published.tick, 40);

        // Recorded inputs reproduce the run exactly
        let (replayed, _) = replay_match(MatchState::new(config), &report.recorded_inputs, 40);
        assert_eq!(replayed.compute_hash(), report.state.compute_hash());
    }
}
