//! Headless match runner implementation.
//!
//! [`HeadlessRunner`] drives one [`Match`] from protocol commands. It reads
//! JSON lines from any `BufRead` and writes responses to any `Write`, so the
//! binary wires it to stdin/stdout and tests wire it to buffers.

use std::io::{self, BufRead, Write};

use lane_core::math::Vec2Fixed;
use lane_core::phase::MatchPhase;
use lane_core::simulation::{coordinate, Match};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::protocol::{Command, GameResult, Response};
use crate::scenario::Scenario;

/// Headless runner configuration.
#[derive(Debug, Clone, Default)]
pub struct HeadlessConfig {
    /// Output state after every `tick` command (vs only on query).
    pub auto_state_output: bool,
}

/// Headless runner for controller-driven matches.
pub struct HeadlessRunner {
    game: Match,
    config: HeadlessConfig,
    game_over_sent: bool,
}

impl HeadlessRunner {
    /// Create a runner around `game`.
    pub fn new(game: Match) -> Self {
        Self::with_config(game, HeadlessConfig::default())
    }

    /// Create a runner with custom configuration.
    pub fn with_config(game: Match, config: HeadlessConfig) -> Self {
        Self {
            game,
            config,
            game_over_sent: false,
        }
    }

    /// The match being driven.
    pub fn game(&self) -> &Match {
        &self.game
    }

    /// Run the command loop until `quit` or end of input.
    ///
    /// Malformed lines produce an error response and are otherwise ignored.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> io::Result<()> {
        output.write_all(Response::ready(self.game.tick_count()).to_json_line().as_bytes())?;
        output.flush()?;

        for line in input.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let responses = match Command::from_json(line) {
                Ok(Command::Quit) => {
                    output.write_all(Response::Bye.to_json_line().as_bytes())?;
                    output.flush()?;
                    info!("Quit received");
                    return Ok(());
                }
                Ok(command) => self.handle(command),
                Err(e) => {
                    warn!(error = %e, "Unparseable command");
                    vec![Response::error(format!("Parse error: {e}"), None)]
                }
            };

            for response in responses {
                output.write_all(response.to_json_line().as_bytes())?;
            }
            output.flush()?;
        }

        output.write_all(Response::Bye.to_json_line().as_bytes())?;
        output.flush()
    }

    /// Apply one command and collect the responses it produces.
    pub fn handle(&mut self, command: Command) -> Vec<Response> {
        let name = command.name();
        debug!(cmd = name, "Handling command");

        let result = match command {
            Command::Tick { count } => {
                for _ in 0..count {
                    if self.game.phase() != MatchPhase::Battle {
                        break;
                    }
                    self.game.tick();
                }
                let mut responses = if self.config.auto_state_output {
                    vec![self.state()]
                } else {
                    vec![Response::ack(name)]
                };
                responses.extend(self.game_over());
                return responses;
            }
            Command::Query => return vec![self.state()],
            Command::Messages => {
                return vec![Response::Messages {
                    lines: self.game.messages().iter().cloned().collect(),
                }]
            }
            Command::Hash => {
                return vec![Response::StateHash {
                    tick: self.game.tick_count(),
                    hash: self.game.state_hash(),
                }]
            }
            Command::Quit => return vec![Response::Bye],
            Command::SelectPassive { id } => self.game.select_passive(&id),
            Command::ToggleRoster { archetype } => {
                self.game.toggle_roster_member(&archetype).map(|_| ())
            }
            Command::ConfirmRoster => self.game.confirm_roster(),
            Command::Place { archetype, x, y } => self
                .game
                .place_unit(&archetype, Vec2Fixed::new(coordinate(x), coordinate(y)))
                .map(|_| ()),
            Command::BeginBattle => self.game.begin_battle(),
        };

        match result {
            Ok(()) => vec![Response::ack(name)],
            Err(e) => vec![Response::error(e.to_string(), Some(name))],
        }
    }

    fn state(&self) -> Response {
        Response::State {
            snapshot: self.game.snapshot(),
            hash: self.game.state_hash(),
        }
    }

    fn game_over(&mut self) -> Option<Response> {
        if self.game_over_sent {
            return None;
        }
        let result = GameResult::from_phase(self.game.phase())?;
        self.game_over_sent = true;
        info!(?result, ticks = self.game.tick_count(), "Match over");
        Some(Response::GameOver {
            result,
            ticks: self.game.tick_count(),
            points: self.game.points(),
        })
    }
}

/// Outcome of an auto-played match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSummary {
    /// Scenario name.
    pub scenario: String,
    /// Spawn seed.
    pub seed: u64,
    /// How the match ended.
    pub result: GameResult,
    /// Battle ticks elapsed.
    pub ticks: u64,
    /// Points at the end.
    pub points: u32,
    /// Waves cleared.
    pub waves_cleared: usize,
    /// Final state hash.
    pub final_hash: u64,
}

/// Play `scenario` until the match ends or its tick limit is reached.
///
/// Between waves each roster member is placed again at its scenario position.
pub fn autoplay(scenario: &Scenario) -> Result<MatchSummary, crate::scenario::ScenarioError> {
    let mut game = scenario.build_match()?;
    let mut waves_cleared = 0;

    while game.tick_count() < scenario.max_ticks {
        match game.phase() {
            MatchPhase::Battle => {
                game.tick();
            }
            MatchPhase::Placement => {
                waves_cleared += 1;
                debug!(wave = game.wave_index(), "Re-placing roster");
                for placement in &scenario.placements {
                    game.place_unit(&placement.archetype, placement.position())?;
                }
                game.begin_battle()?;
            }
            _ => break,
        }
    }

    let result = GameResult::from_phase(game.phase()).unwrap_or(GameResult::Timeout);
    if result == GameResult::Victory {
        waves_cleared += 1;
    }

    Ok(MatchSummary {
        scenario: scenario.name.clone(),
        seed: scenario.config.seed,
        result,
        ticks: game.tick_count(),
        points: game.points(),
        waves_cleared,
        final_hash: game.state_hash(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lane_core::data::MatchConfig;
    use lane_test_utils::fixtures::{battle_match, fixed, DEFAULT_ROSTER};
    use std::io::Cursor;

    fn fresh_runner() -> HeadlessRunner {
        HeadlessRunner::new(Match::with_builtin(MatchConfig::default()).unwrap())
    }

    fn run_script(runner: &mut HeadlessRunner, script: &str) -> Vec<serde_json::Value> {
        let mut output = Vec::new();
        runner.run(Cursor::new(script), &mut output).unwrap();
        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_setup_session() {
        let script = r#"
{"cmd":"select_passive","id":"HP_BOOST"}
{"cmd":"toggle_roster","archetype":"MAGE"}
{"cmd":"confirm_roster"}
{"cmd":"place","archetype":"MAGE","x":600,"y":300}
{"cmd":"begin_battle"}
{"cmd":"tick","count":10}
{"cmd":"query"}
{"cmd":"quit"}
"#;
        let mut runner = fresh_runner();
        let lines = run_script(&mut runner, script);

        assert_eq!(lines[0]["type"], "ready");
        for line in &lines[1..7] {
            assert_eq!(line["type"], "ack", "{line}");
        }
        assert_eq!(lines[7]["type"], "state");
        assert_eq!(lines[7]["tick"], 10);
        assert_eq!(lines[7]["phase"], "battle");
        assert_eq!(lines[8]["type"], "bye");
    }

    #[test]
    fn test_rejection_and_parse_errors() {
        let script = r#"
{"cmd":"begin_battle"}
not json
{"cmd":"messages"}
"#;
        let mut runner = fresh_runner();
        let lines = run_script(&mut runner, script);

        assert_eq!(lines[1]["type"], "error");
        assert_eq!(lines[1]["cmd"], "begin_battle");
        assert_eq!(lines[2]["type"], "error");
        assert!(lines[2]["cmd"].is_null());
        assert_eq!(lines[3]["type"], "messages");
        assert_eq!(lines[3]["lines"][0]["severity"], "warning");
        assert_eq!(lines.last().unwrap()["type"], "bye");
    }

    #[test]
    fn test_game_over_sent_once() {
        let config = MatchConfig {
            wall_hp: fixed(1),
            ..MatchConfig::default()
        };
        let mut game = battle_match(config, "ATTACK_BOOST", &DEFAULT_ROSTER);
        game.units_mut().clear();
        let mut runner = HeadlessRunner::new(game);

        let responses = runner.handle(Command::Tick { count: 20_000 });
        assert!(matches!(
            responses.last(),
            Some(Response::GameOver {
                result: GameResult::Defeat,
                ..
            })
        ));
        let again = runner.handle(Command::Tick { count: 1 });
        assert_eq!(again, vec![Response::ack("tick")]);
    }

    #[test]
    fn test_hash_matches_match_state() {
        let mut runner = fresh_runner();
        let responses = runner.handle(Command::Hash);
        assert_eq!(
            responses,
            vec![Response::StateHash {
                tick: 0,
                hash: runner.game().state_hash()
            }]
        );
    }

    #[test]
    fn test_autoplay_is_reproducible() {
        let mut scenario = Scenario::default();
        scenario.max_ticks = 1_500;
        let first = autoplay(&scenario).unwrap();
        let second = autoplay(&scenario).unwrap();
        assert_eq!(first, second);
        assert!(first.ticks <= 1_500);
    }
}
