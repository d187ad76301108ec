//! Headless match runner for scripted play and CI verification.
//!
//! This crate drives a [`lane_core::simulation::Match`] without graphics,
//! controlled via JSON commands on stdin with match state on stdout. This
//! enables:
//!
//! - **Scripted play**: A controller can set up and fight a match line by line
//! - **CI verification**: Automated checks of match logic and determinism
//! - **Seed sweeps**: Many auto-played matches in parallel for statistics
//!
//! # Protocol
//!
//! Communication uses JSON lines (one JSON object per line):
//!
//! - **stdin**: Commands from controller (tick, place, begin_battle, etc.)
//! - **stdout**: State updates and responses (JSON)
//! - **stderr**: Debug logs (human-readable)
//!
//! See [`protocol`] module for the full command/response specification.
//!
//! # Example
//!
//! ```bash
//! # Run interactively
//! echo '{"cmd":"select_passive","id":"ATTACK_BOOST"}' | cargo run -p lane_headless
//!
//! # Auto-play a scenario
//! cargo run -p lane_headless -- simulate --scenario scenarios/default.ron
//!
//! # Verify determinism
//! cargo run -p lane_headless -- verify --runs 5
//! ```

pub mod batch;
pub mod protocol;
pub mod runner;
pub mod scenario;

pub use batch::{run_batch, verify_determinism, BatchConfig, BatchResults, BatchSummary};
pub use protocol::{Command, GameResult, Response};
pub use runner::{autoplay, HeadlessConfig, HeadlessRunner, MatchSummary};
pub use scenario::{Placement, Scenario, ScenarioError};
