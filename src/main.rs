//! Blast Arena Headless Runner
//!
//! Plays a bot match in real time, logs rounds as they finish, then checks
//! determinism by replaying the recorded inputs.
//!
//! ```text
//! blast-arena [--map PATH] [--config PATH] [--ticks N] [--snapshot PATH]
//! ```

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use blast_arena::{
    ArenaConfig, TICK_RATE, VERSION,
    game::{map::MapGrid, state::MatchState, tick::replay_match},
    runtime::{watch_scores, Runner, WanderingBots},
};

/// Default match length: two minutes of simulated time.
const DEFAULT_TICKS: u64 = 120 * TICK_RATE as u64;

#[derive(Debug, Default)]
struct Args {
    map: Option<PathBuf>,
    config: Option<PathBuf>,
    ticks: Option<u64>,
    snapshot: Option<PathBuf>,
}

fn parse_args() -> Result<Args> {
    let mut args = Args::default();
    let mut iter = std::env::args().skip(1);

    while let Some(flag) = iter.next() {
        let mut value = || iter.next().with_context(|| format!("{flag} needs a value"));
        match flag.as_str() {
            "--map" => args.map = Some(value()?.into()),
            "--config" => args.config = Some(value()?.into()),
            "--ticks" => args.ticks = Some(value()?.parse().context("--ticks must be a number")?),
            "--snapshot" => args.snapshot = Some(value()?.into()),
            other => bail!("unknown argument: {other}"),
        }
    }

    Ok(args)
}

fn load_map(path: Option<&PathBuf>) -> MapGrid {
    let Some(path) = path else {
        return MapGrid::default_map();
    };

    match MapGrid::load(path) {
        Ok(grid) => grid,
        Err(e) => {
            warn!("Could not load map {}: {}; using the built-in map", path.display(), e);
            MapGrid::default_map()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = parse_args()?;

    let config = match &args.config {
        Some(path) => ArenaConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => ArenaConfig::default(),
    }
    .with_env_overrides()?;

    info!("Blast Arena v{}", VERSION);
    info!("Tick Rate: {} Hz, Seed: {}", config.tick_rate, config.seed);

    let grid = load_map(args.map.as_ref());
    info!("Map: {}x{} cells", grid.columns(), grid.rows());

    let state = MatchState::from_grid(grid.clone(), config.clone());
    let bots = WanderingBots::for_match(&state, config.seed.rotate_left(17));
    let tick_limit = args.ticks.unwrap_or(DEFAULT_TICKS);

    let runner = Runner::new(state, bots, &config).with_tick_limit(tick_limit);
    let observer = tokio::spawn(watch_scores(runner.subscribe()));

    let report = runner.run().await;
    observer.await.context("score observer panicked")?;

    // Print final results
    info!("=== Match Results ===");
    let final_state = &report.state;
    info!("Ticks: {} (dropped {}), rounds: {}", final_state.tick, report.dropped_ticks, final_state.round);
    for (player, score) in final_state.scoreboard.scores() {
        info!("{}: {} round(s)", player, score);
    }

    let hash = final_state.compute_hash();
    info!("Final State Hash: {}", hex::encode(hash));

    if let Some(path) = &args.snapshot {
        let file = std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
        serde_json::to_writer_pretty(file, &final_state.snapshot())?;
        info!("Snapshot written to {}", path.display());
    }

    // Verify determinism by replaying
    info!("=== Verifying Determinism ===");
    let (replayed, _) = replay_match(
        MatchState::from_grid(grid, config),
        &report.recorded_inputs,
        final_state.tick,
    );
    let replay_hash = replayed.compute_hash();
    info!("Replay State Hash: {}", hex::encode(replay_hash));

    if hash == replay_hash {
        info!("DETERMINISM VERIFIED: Hashes match!");
        Ok(())
    } else {
        bail!("determinism failure: replay hash differs")
    }
}
