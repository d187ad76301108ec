//! Match orchestration.
//!
//! [`Match`] owns every collection, accepts player commands during the setup
//! phases and advances the battle one tick at a time.
//!
//! # Determinism
//!
//! All operations in this module are fully deterministic:
//! - No floating-point math (uses fixed-point via [`Fixed`])
//! - Spawn randomness comes from a seeded RNG owned by the wave scheduler
//! - Units and attackers are processed in list order
//! - Same commands and seed always produce the same match
//!
//! # Example
//!
//! ```
//! use lane_core::data::MatchConfig;
//! use lane_core::math::Vec2Fixed;
//! use lane_core::phase::MatchPhase;
//! use lane_core::simulation::Match;
//!
//! let mut game = Match::with_builtin(MatchConfig::default()).unwrap();
//! game.select_passive("HP_BOOST").unwrap();
//! game.toggle_roster_member("MAGE").unwrap();
//! game.confirm_roster().unwrap();
//! game.place_unit("MAGE", Vec2Fixed::from_ints(600, 300)).unwrap();
//! game.begin_battle().unwrap();
//!
//! game.tick();
//! assert_eq!(game.phase(), MatchPhase::Battle);
//! assert_eq!(game.tick_count(), 1);
//! ```

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, VecDeque};
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::components::{Attacker, EntityId, FloatingText, Unit, Wall};
use crate::data::{GameData, MatchConfig};
use crate::error::{CommandError, ConfigError, Result};
use crate::events::{LogMessage, MatchEvent, Outbox, TickEvents};
use crate::fields::FieldEffect;
use crate::math::{Fixed, Vec2Fixed};
use crate::phase::{evaluate_battle, BattleOutcome, MatchPhase, Roster};
use crate::scheduler::WaveScheduler;
use crate::snapshot::{
    AttackerSnapshot, FieldSnapshot, FloatingTextSnapshot, MatchSnapshot, UnitSnapshot,
    WallSnapshot,
};
use crate::systems::{attacker_system, field_system, unit_system};

/// Outcome of a player command.
pub type CommandResult<T> = std::result::Result<T, CommandError>;

/// A player command, as accepted by [`Match::apply`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerCommand {
    /// Choose the party-wide passive.
    SelectPassive(String),
    /// Add or remove an archetype from the roster.
    ToggleRosterMember(String),
    /// Lock the roster and move to placement.
    ConfirmRoster,
    /// Put a roster member on the field.
    PlaceUnit {
        /// Archetype id.
        archetype: String,
        /// Field position.
        position: Vec2Fixed,
    },
    /// Start the current wave.
    BeginBattle,
}

/// One lane-defense match.
#[derive(Debug, Clone)]
pub struct Match {
    tick: u64,
    config: MatchConfig,
    data: GameData,
    phase: MatchPhase,
    passive: Option<String>,
    passive_applied: bool,
    roster: Roster,
    templates: BTreeMap<String, Unit>,
    units: Vec<Unit>,
    attackers: Vec<Attacker>,
    fields: Vec<FieldEffect>,
    floating_texts: Vec<FloatingText>,
    wall: Wall,
    wave_index: usize,
    scheduler: Option<WaveScheduler>,
    next_id: EntityId,
    points: u32,
    messages: VecDeque<LogMessage>,
}

impl Match {
    /// Create a match in passive selection.
    ///
    /// Data faults are reported as error messages but do not prevent the
    /// match from starting; the affected skills and spawns are skipped later.
    #[must_use]
    pub fn new(config: MatchConfig, data: GameData) -> Self {
        let mut game = Self {
            tick: 0,
            wall: Wall::new(config.wall_hp, config.wall_position()),
            roster: Roster::new(config.roster_cap),
            points: config.starting_points,
            messages: VecDeque::with_capacity(config.message_log_capacity),
            config,
            data,
            phase: MatchPhase::PassiveSelection,
            passive: None,
            passive_applied: false,
            templates: BTreeMap::new(),
            units: Vec::new(),
            attackers: Vec::new(),
            fields: Vec::new(),
            floating_texts: Vec::new(),
            wave_index: 0,
            scheduler: None,
            next_id: 1,
        };

        for fault in game.data.validate() {
            game.report_fault(&fault);
        }

        game
    }

    /// Create a match using the bundled content.
    pub fn with_builtin(config: MatchConfig) -> Result<Self> {
        Ok(Self::new(config, GameData::builtin()?))
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    /// Apply any player command.
    pub fn apply(&mut self, command: PlayerCommand) -> CommandResult<()> {
        match command {
            PlayerCommand::SelectPassive(id) => self.select_passive(&id),
            PlayerCommand::ToggleRosterMember(archetype) => {
                self.toggle_roster_member(&archetype).map(|_| ())
            }
            PlayerCommand::ConfirmRoster => self.confirm_roster(),
            PlayerCommand::PlaceUnit {
                archetype,
                position,
            } => self.place_unit(&archetype, position).map(|_| ()),
            PlayerCommand::BeginBattle => self.begin_battle(),
        }
    }

    /// Choose the party-wide passive and move to party selection.
    pub fn select_passive(&mut self, id: &str) -> CommandResult<()> {
        let result = self.try_select_passive(id);
        self.report(result)
    }

    fn try_select_passive(&mut self, id: &str) -> CommandResult<()> {
        self.expect_phase("select_passive", MatchPhase::PassiveSelection)?;
        if self.data.get_passive(id).is_none() {
            return Err(CommandError::UnknownPassive(id.to_string()));
        }
        self.passive = Some(id.to_string());
        self.transition(MatchPhase::PartySelection);
        Ok(())
    }

    /// Add or remove an archetype. Returns whether it is now selected.
    pub fn toggle_roster_member(&mut self, archetype: &str) -> CommandResult<bool> {
        let result = self.try_toggle_roster_member(archetype);
        self.report(result)
    }

    fn try_toggle_roster_member(&mut self, archetype: &str) -> CommandResult<bool> {
        self.expect_phase("toggle_roster_member", MatchPhase::PartySelection)?;
        if self.data.get_unit(archetype).is_none() {
            return Err(CommandError::UnknownArchetype(archetype.to_string()));
        }
        self.roster.toggle(archetype)
    }

    /// Lock the roster, build unit templates and move to placement.
    pub fn confirm_roster(&mut self) -> CommandResult<()> {
        let result = self.try_confirm_roster();
        self.report(result)
    }

    fn try_confirm_roster(&mut self) -> CommandResult<()> {
        self.expect_phase("confirm_roster", MatchPhase::PartySelection)?;
        if self.roster.is_empty() {
            return Err(CommandError::EmptyRoster);
        }

        let mut faults = Vec::new();
        let mut templates = BTreeMap::new();
        for archetype in self.roster.members() {
            match self.data.build_unit(archetype, &mut faults) {
                Ok(unit) => {
                    templates.insert(archetype.clone(), unit);
                }
                Err(fault) => faults.push(fault),
            }
        }
        for fault in &faults {
            self.report_fault(fault);
        }

        self.templates = templates;
        self.transition(MatchPhase::Placement);
        Ok(())
    }

    /// Put one instance of a roster member on the field. Returns its id.
    pub fn place_unit(
        &mut self,
        archetype: &str,
        position: Vec2Fixed,
    ) -> CommandResult<EntityId> {
        let result = self.try_place_unit(archetype, position);
        self.report(result)
    }

    fn try_place_unit(
        &mut self,
        archetype: &str,
        position: Vec2Fixed,
    ) -> CommandResult<EntityId> {
        self.expect_phase("place_unit", MatchPhase::Placement)?;
        if !self.config.in_bounds(position) {
            return Err(CommandError::OutOfBounds {
                x: position.x.to_num(),
                y: position.y.to_num(),
            });
        }
        self.roster.check_placeable(archetype)?;
        let template = self
            .templates
            .get(archetype)
            .ok_or_else(|| CommandError::UnknownArchetype(archetype.to_string()))?;

        let mut unit = template.clone();
        unit.id = self.next_id;
        unit.position = position;
        self.next_id += 1;

        let id = unit.id;
        debug!(id, archetype, x = %position.x, y = %position.y, "Unit placed");
        self.units.push(unit);
        self.roster.mark_placed(archetype);
        Ok(id)
    }

    /// Start the current wave once every roster member is placed.
    pub fn begin_battle(&mut self) -> CommandResult<()> {
        let result = self.try_begin_battle();
        self.report(result)
    }

    fn try_begin_battle(&mut self) -> CommandResult<()> {
        self.expect_phase("begin_battle", MatchPhase::Placement)?;
        self.roster.check_complete()?;

        self.ensure_passive_applied();

        let seed = self.config.seed.wrapping_add(self.wave_index as u64);
        self.scheduler = self
            .data
            .waves
            .get(self.wave_index)
            .map(|wave| WaveScheduler::new(wave, seed));
        self.record(&MatchEvent::WaveStarted {
            wave: self.wave_index,
        });
        self.transition(MatchPhase::Battle);
        Ok(())
    }

    fn expect_phase(
        &self,
        command: &'static str,
        expected: MatchPhase,
    ) -> CommandResult<()> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(CommandError::WrongPhase {
                command,
                phase: self.phase,
            })
        }
    }

    fn report<T>(
        &mut self,
        result: CommandResult<T>,
    ) -> CommandResult<T> {
        if let Err(err) = &result {
            warn!(error = %err, phase = %self.phase, "Command rejected");
            self.record(&MatchEvent::CommandRejected {
                reason: err.to_string(),
            });
        }
        result
    }

    fn report_fault(&mut self, fault: &ConfigError) {
        error!(fault = %fault, "Configuration fault");
        self.record(&MatchEvent::ConfigFault {
            detail: fault.to_string(),
        });
    }

    /// Apply the chosen passive to templates and placed units, once per match.
    fn ensure_passive_applied(&mut self) {
        if self.passive_applied {
            return;
        }
        self.passive_applied = true;

        let Some(passive) = self
            .passive
            .as_deref()
            .and_then(|id| self.data.get_passive(id))
            .cloned()
        else {
            return;
        };

        for template in self.templates.values_mut() {
            passive.apply(template);
        }
        for unit in &mut self.units {
            passive.apply(unit);
        }
        info!(passive = %passive.id, "Passive applied");
        self.record(&MatchEvent::PassiveApplied {
            passive: passive.name,
        });
    }

    fn transition(&mut self, to: MatchPhase) {
        let from = self.phase;
        if from == to {
            return;
        }
        self.phase = to;
        info!(%from, %to, wave = self.wave_index, "Phase changed");
        self.record(&MatchEvent::PhaseChanged { from, to });
    }

    fn record(&mut self, event: &MatchEvent) {
        self.messages.push_back(event.to_log());
        while self.messages.len() > self.config.message_log_capacity {
            self.messages.pop_front();
        }
    }

    // ------------------------------------------------------------------
    // Battle loop
    // ------------------------------------------------------------------

    /// Advance the battle by one tick.
    ///
    /// Outside the battle phase this does nothing and returns no events.
    ///
    /// # System Order
    ///
    /// 1. Units (cooldowns, shields, passive attacks, skills)
    /// 2. Attackers (melee, movement, wall hits)
    /// 3. Field effects (slow, periodic damage, expiry)
    /// 4. Reap (rewards, removal of the dead, text and field expiry)
    /// 5. Scheduler (at most one spawn)
    /// 6. Phase check (defeat, next wave, victory)
    pub fn tick(&mut self) -> TickEvents {
        if self.phase != MatchPhase::Battle {
            return TickEvents::default();
        }

        let mut outbox = Outbox::default();
        let mut events = TickEvents::default();

        // 1. Units
        let spawned_fields = unit_system(&mut self.units, &mut self.attackers, &mut outbox);
        self.fields.extend(spawned_fields);

        // 2. Attackers
        attacker_system(
            &mut self.attackers,
            &mut self.units,
            &mut self.wall,
            &mut outbox,
        );

        // 3. Fields
        field_system(&mut self.fields, &mut self.attackers, &mut outbox);

        // 4. Reap
        self.reap(&mut outbox, &mut events.deaths);

        // 5. Scheduler
        self.run_scheduler(&mut outbox, &mut events.spawned);

        for event in &outbox.events {
            self.record(event);
        }
        events.events = outbox.events;

        self.tick += 1;

        // 6. Phase check
        self.check_battle_outcome(&mut events.events);

        #[cfg(feature = "debug-validation")]
        self.validate_invariants();

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            debug!(tick = self.tick, state_hash = hash, "Match state hash");
        }

        events
    }

    fn reap(&mut self, outbox: &mut Outbox, deaths: &mut Vec<EntityId>) {
        let (alive, dead): (Vec<_>, Vec<_>) = std::mem::take(&mut self.attackers)
            .into_iter()
            .partition(Attacker::is_alive);
        self.attackers = alive;
        for attacker in dead {
            self.points = self.points.saturating_add(attacker.reward);
            outbox.push(MatchEvent::AttackerDefeated {
                id: attacker.id,
                name: attacker.name,
                reward: attacker.reward,
            });
            deaths.push(attacker.id);
        }

        let (active, fallen): (Vec<_>, Vec<_>) = std::mem::take(&mut self.units)
            .into_iter()
            .partition(Unit::is_active);
        self.units = active;
        deaths.extend(fallen.iter().map(|u| u.id));

        for text in &mut self.floating_texts {
            text.tick();
        }
        self.floating_texts.append(&mut outbox.floating_texts);
        self.floating_texts.retain(|t| !t.is_expired());

        self.fields.retain(|f| !f.is_expired());
    }

    fn run_scheduler(&mut self, outbox: &mut Outbox, spawned: &mut Vec<EntityId>) {
        let area = self.config.spawn_area();
        let Some(request) = self.scheduler.as_mut().and_then(|s| s.tick(&area)) else {
            return;
        };

        match self
            .data
            .build_attacker(&request.archetype, self.next_id, request.position)
        {
            Ok(attacker) => {
                self.next_id += 1;
                outbox.push(MatchEvent::AttackerSpawned {
                    id: attacker.id,
                    name: attacker.name.clone(),
                });
                spawned.push(attacker.id);
                self.attackers.push(attacker);
            }
            Err(fault) => {
                error!(fault = %fault, "Spawn skipped");
                outbox.push(MatchEvent::ConfigFault {
                    detail: fault.to_string(),
                });
            }
        }
    }

    fn check_battle_outcome(&mut self, events: &mut Vec<MatchEvent>) {
        let phase_before = self.phase;

        let outcome = evaluate_battle(
            self.wall.is_breached(),
            self.is_wave_cleared(),
            self.wave_index + 1 < self.data.waves.len(),
        );

        match outcome {
            BattleOutcome::Continue => return,
            BattleOutcome::Defeat => {
                events.push(MatchEvent::PhaseChanged {
                    from: phase_before,
                    to: MatchPhase::Defeat,
                });
                self.transition(MatchPhase::Defeat);
            }
            BattleOutcome::Victory => {
                let cleared = MatchEvent::WaveCleared {
                    wave: self.wave_index,
                };
                self.record(&cleared);
                events.push(cleared);
                events.push(MatchEvent::PhaseChanged {
                    from: phase_before,
                    to: MatchPhase::Victory,
                });
                self.transition(MatchPhase::Victory);
            }
            BattleOutcome::NextWave => {
                let cleared = MatchEvent::WaveCleared {
                    wave: self.wave_index,
                };
                self.record(&cleared);
                events.push(cleared);
                self.ensure_passive_applied();

                self.units.clear();
                self.attackers.clear();
                self.fields.clear();
                self.scheduler = None;
                self.roster.clear_placements();
                self.wave_index += 1;

                events.push(MatchEvent::PhaseChanged {
                    from: phase_before,
                    to: MatchPhase::Placement,
                });
                self.transition(MatchPhase::Placement);
            }
        }

        debug!(?outcome, wave = self.wave_index, "Battle resolved");
    }

    fn is_wave_cleared(&self) -> bool {
        let exhausted = self
            .scheduler
            .as_ref()
            .map_or(true, WaveScheduler::is_exhausted);
        exhausted && self.attackers.is_empty()
    }

    #[cfg(feature = "debug-validation")]
    fn validate_invariants(&self) {
        for unit in &self.units {
            debug_assert!(unit.alive, "dead unit {} left on the field", unit.id);
            debug_assert!(unit.shield.hp >= Fixed::ZERO, "negative shield on {}", unit.id);
        }
        for attacker in &self.attackers {
            debug_assert!(attacker.is_alive(), "dead attacker {} not reaped", attacker.id);
            let expected = crate::fields::active_slow(&self.fields, attacker.id)
                .map_or(attacker.original_speed, |m| attacker.original_speed * m);
            debug_assert_eq!(
                attacker.speed, expected,
                "attacker {} speed out of step with its fields",
                attacker.id
            );
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Battle ticks elapsed across all waves.
    #[must_use]
    pub const fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> MatchPhase {
        self.phase
    }

    /// Match configuration.
    #[must_use]
    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Content the match draws from.
    #[must_use]
    pub fn data(&self) -> &GameData {
        &self.data
    }

    /// Chosen passive id.
    #[must_use]
    pub fn passive(&self) -> Option<&str> {
        self.passive.as_deref()
    }

    /// Selected archetypes and placement state.
    #[must_use]
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Units on the field, in placement order.
    #[must_use]
    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    /// Attackers on the field, in spawn order.
    #[must_use]
    pub fn attackers(&self) -> &[Attacker] {
        &self.attackers
    }

    /// Live fields.
    #[must_use]
    pub fn fields(&self) -> &[FieldEffect] {
        &self.fields
    }

    /// Floating damage numbers.
    #[must_use]
    pub fn floating_texts(&self) -> &[FloatingText] {
        &self.floating_texts
    }

    /// The wall.
    #[must_use]
    pub fn wall(&self) -> &Wall {
        &self.wall
    }

    /// Zero-based index of the current wave.
    #[must_use]
    pub const fn wave_index(&self) -> usize {
        self.wave_index
    }

    /// Points earned so far, including the starting amount.
    #[must_use]
    pub const fn points(&self) -> u32 {
        self.points
    }

    /// Retained log lines, oldest first.
    #[must_use]
    pub fn messages(&self) -> &VecDeque<LogMessage> {
        &self.messages
    }

    /// Mutable access to the units, for scripted setups and tests.
    pub fn units_mut(&mut self) -> &mut Vec<Unit> {
        &mut self.units
    }

    /// Mutable access to the attackers, for scripted setups and tests.
    pub fn attackers_mut(&mut self) -> &mut Vec<Attacker> {
        &mut self.attackers
    }

    /// Presentation view of the current state.
    #[must_use]
    pub fn snapshot(&self) -> MatchSnapshot {
        MatchSnapshot {
            tick: self.tick,
            phase: self.phase,
            wave_index: self.wave_index,
            wave_count: self.data.waves.len(),
            points: self.points,
            passive: self.passive.clone(),
            roster: self.roster.members().to_vec(),
            wall: WallSnapshot::from(&self.wall),
            units: self.units.iter().map(UnitSnapshot::from).collect(),
            attackers: self.attackers.iter().map(AttackerSnapshot::from).collect(),
            fields: self.fields.iter().map(FieldSnapshot::from).collect(),
            floating_texts: self
                .floating_texts
                .iter()
                .map(FloatingTextSnapshot::from)
                .collect(),
        }
    }

    /// Compute a deterministic hash of the match state.
    ///
    /// Used to detect desyncs between repeated runs. Two matches fed the same
    /// commands and seed produce the same hash after every tick.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.tick.hash(&mut hasher);
        self.phase.hash(&mut hasher);
        self.wave_index.hash(&mut hasher);
        self.points.hash(&mut hasher);
        self.next_id.hash(&mut hasher);
        self.wall.health.current.to_bits().hash(&mut hasher);

        self.units.len().hash(&mut hasher);
        for unit in &self.units {
            unit.id.hash(&mut hasher);
            hash_position(unit.position, &mut hasher);
            unit.health.current.to_bits().hash(&mut hasher);
            unit.health.max.to_bits().hash(&mut hasher);
            unit.shield.hp.to_bits().hash(&mut hasher);
            unit.shield.remaining.hash(&mut hasher);
            unit.attack_cooldown.hash(&mut hasher);
            unit.skill_cooldown.hash(&mut hasher);
            unit.policy.stacks().hash(&mut hasher);
            for skill in &unit.skills {
                skill.remaining.hash(&mut hasher);
            }
        }

        self.attackers.len().hash(&mut hasher);
        for attacker in &self.attackers {
            attacker.id.hash(&mut hasher);
            hash_position(attacker.position, &mut hasher);
            attacker.health.current.to_bits().hash(&mut hasher);
            attacker.speed.to_bits().hash(&mut hasher);
            attacker.attack_cooldown.hash(&mut hasher);
        }

        self.fields.len().hash(&mut hasher);
        for field in &self.fields {
            field.caster.hash(&mut hasher);
            hash_position(field.anchor, &mut hasher);
            field.remaining.hash(&mut hasher);
            field.damage_timer.hash(&mut hasher);
        }

        if let Some(scheduler) = &self.scheduler {
            scheduler.segment_index().hash(&mut hasher);
            scheduler.emitted().hash(&mut hasher);
        }

        hasher.finish()
    }
}

fn hash_position(position: Vec2Fixed, hasher: &mut DefaultHasher) {
    position.x.to_bits().hash(hasher);
    position.y.to_bits().hash(hasher);
}

/// Convert a caller-supplied float coordinate, saturating at the fixed range.
#[must_use]
pub fn coordinate(value: f64) -> Fixed {
    if value.is_nan() {
        Fixed::ZERO
    } else {
        Fixed::saturating_from_num(value)
    }
}
