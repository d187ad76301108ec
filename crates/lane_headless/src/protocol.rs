//! JSON protocol for headless match communication.
//!
//! The headless runner communicates via JSON lines (one JSON object per line):
//!
//! **Input (stdin):** Commands from the controller
//! **Output (stdout):** Match state updates and responses
//!
//! # Protocol Flow
//!
//! 1. Runner starts, outputs `{"type":"ready","version":"1.0","tick":0}`
//! 2. Controller walks the setup phases with `select_passive`,
//!    `toggle_roster`, `confirm_roster`, `place` and `begin_battle`
//! 3. Controller sends `tick` and `query` during battle
//! 4. On match end, outputs `{"type":"game_over","result":"victory"|"defeat",...}`
//!
//! # Example Session
//!
//! ```text
//! <- {"type":"ready","version":"1.0","tick":0}
//! -> {"cmd":"select_passive","id":"HP_BOOST"}
//! <- {"type":"ack","cmd":"select_passive"}
//! -> {"cmd":"toggle_roster","archetype":"MAGE"}
//! <- {"type":"ack","cmd":"toggle_roster"}
//! -> {"cmd":"confirm_roster"}
//! <- {"type":"ack","cmd":"confirm_roster"}
//! -> {"cmd":"place","archetype":"MAGE","x":600,"y":300}
//! <- {"type":"ack","cmd":"place"}
//! -> {"cmd":"begin_battle"}
//! <- {"type":"ack","cmd":"begin_battle"}
//! -> {"cmd":"tick","count":60}
//! <- {"type":"ack","cmd":"tick"}
//! -> {"cmd":"query"}
//! <- {"type":"state","tick":60,"phase":"battle",...,"hash":1234}
//! ```

use lane_core::events::LogMessage;
use lane_core::phase::MatchPhase;
use lane_core::snapshot::MatchSnapshot;
use serde::{Deserialize, Serialize};

// ============================================================================
// Input Commands (controller -> runner)
// ============================================================================

/// Commands that can be sent to the headless runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    /// Advance the battle by N ticks (default: 1).
    Tick {
        /// Ticks to run.
        #[serde(default = "default_tick_count")]
        count: u32,
    },

    /// Query current match state without advancing time.
    Query,

    /// Fetch the retained log lines.
    Messages,

    /// Choose the party-wide passive.
    SelectPassive {
        /// Passive id.
        id: String,
    },

    /// Add or remove an archetype from the roster.
    ToggleRoster {
        /// Archetype id.
        archetype: String,
    },

    /// Lock the roster and move to placement.
    ConfirmRoster,

    /// Place a roster member.
    Place {
        /// Archetype id.
        archetype: String,
        /// Field x.
        x: f64,
        /// Field y.
        y: f64,
    },

    /// Start the current wave.
    BeginBattle,

    /// Report the current state hash (for determinism verification).
    Hash,

    /// Quit the runner.
    Quit,
}

fn default_tick_count() -> u32 {
    1
}

// ============================================================================
// Output Responses (runner -> controller)
// ============================================================================

/// Responses sent from the headless runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Runner is ready to accept commands.
    Ready {
        /// Protocol version.
        version: String,
        /// Current tick.
        tick: u64,
    },

    /// Acknowledgment of a command.
    Ack {
        /// Command name.
        cmd: String,
    },

    /// Error processing a command.
    Error {
        /// Reason.
        message: String,
        /// Command name, when the line parsed.
        cmd: Option<String>,
    },

    /// Current match state.
    State {
        /// Snapshot fields, inlined.
        #[serde(flatten)]
        snapshot: MatchSnapshot,
        /// State hash.
        hash: u64,
    },

    /// Retained log lines, oldest first.
    Messages {
        /// Log lines.
        lines: Vec<LogMessage>,
    },

    /// The match has ended.
    GameOver {
        /// Outcome.
        result: GameResult,
        /// Battle ticks elapsed.
        ticks: u64,
        /// Points at the end.
        points: u32,
    },

    /// State hash for determinism verification.
    StateHash {
        /// Current tick.
        tick: u64,
        /// Hash value.
        hash: u64,
    },

    /// Goodbye message before shutdown.
    Bye,
}

/// Match result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameResult {
    /// Every wave cleared.
    Victory,
    /// The wall fell.
    Defeat,
    /// Stopped before an outcome.
    Timeout,
}

impl GameResult {
    /// Result for a phase, if the phase is terminal.
    pub fn from_phase(phase: MatchPhase) -> Option<Self> {
        match phase {
            MatchPhase::Victory => Some(Self::Victory),
            MatchPhase::Defeat => Some(Self::Defeat),
            _ => None,
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

impl Response {
    /// Create a ready response.
    pub fn ready(tick: u64) -> Self {
        Self::Ready {
            version: "1.0".to_string(),
            tick,
        }
    }

    /// Create an acknowledgment.
    pub fn ack(cmd: &str) -> Self {
        Self::Ack {
            cmd: cmd.to_string(),
        }
    }

    /// Create an error response.
    pub fn error(message: impl Into<String>, cmd: Option<&str>) -> Self {
        Self::Error {
            message: message.into(),
            cmd: cmd.map(String::from),
        }
    }

    /// Serialize to JSON line (with newline).
    pub fn to_json_line(&self) -> String {
        let mut json = serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"type":"error","message":"Serialization failed: {e}"}}"#)
        });
        json.push('\n');
        json
    }
}

impl Command {
    /// Parse from a JSON line.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Get command name for acknowledgment.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Tick { .. } => "tick",
            Self::Query => "query",
            Self::Messages => "messages",
            Self::SelectPassive { .. } => "select_passive",
            Self::ToggleRoster { .. } => "toggle_roster",
            Self::ConfirmRoster => "confirm_roster",
            Self::Place { .. } => "place",
            Self::BeginBattle => "begin_battle",
            Self::Hash => "hash",
            Self::Quit => "quit",
        }
    }
}
