//! Runtime Module
//!
//! Wall-clock driving of the deterministic core. Timing here is
//! non-deterministic; everything it feeds the simulation is recorded.

pub mod runner;

pub use runner::{InputSource, RunReport, Runner, ScriptedInput, WanderingBots, watch_scores};
