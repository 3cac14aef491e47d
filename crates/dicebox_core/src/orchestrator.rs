//! Roll orchestration: the settle and failsafe state machine
//!
//! A roll spawns every requested die just outside the table with a throw
//! toward the centre, then watches the simulation each frame. The happy path
//! is simply "everything stopped moving, every die is flat, read the faces".
//! The rest of this module is the failure ladder that makes the happy path a
//! guarantee instead of a hope:
//!
//! 1. A die whose body vanished from the solver is rerolled immediately.
//! 2. Dice still awake past the stuck timeout are rerolled individually.
//! 3. A roll still moving past the complete timeout is re-thrown whole.
//! 4. Any die (or roll) that exhausts its attempts is forced to the
//!    fallback value and culled from the table.
//!
//! Every roll therefore produces exactly one result in bounded time, no
//! matter how the physics behaves.

use std::collections::{HashMap, HashSet};
use std::fmt;

use nalgebra::{Point3, Vector3};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use dicebox_geom::resolve;
use dicebox_physics::{RigidBodyHandle, RigidBodySimulation};

use crate::play_area::PlayAreaConfig;
use crate::pool::{DieInstance, DieInstancePool, DieKey};
use crate::shape_cache::{DieShapeCache, ShapeError};
use crate::spawn::{angular_velocity, spawn_pose, throw_velocity, SpawnConfig, SpawnEdge};
use crate::types::{DiceGroup, DiceRollResult, DieType, ResultProcessing};

/// Tunables for settle detection and the failsafe ladder
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RollConfig {
    /// Linear speed below which a die counts as asleep
    pub sleep_linear_threshold: f32,
    /// Angular speed below which a die counts as asleep
    pub sleep_angular_threshold: f32,
    /// How long the whole roll must stay asleep before it is trusted
    pub settle_debounce_s: f32,
    /// Motion time after which dice still awake are rerolled individually
    pub stuck_timeout_s: f32,
    /// Motion time after which the entire roll is re-thrown
    pub complete_timeout_s: f32,
    /// Attempt budget shared by the per-die and whole-roll ladders
    pub max_reroll_attempts: u32,
    /// Value assigned to a die whose attempts run out
    pub fallback_value: i32,
    /// Alignment below which a settled die counts as canted and gets nudged
    pub alignment_threshold: f32,
    /// Linear impulse magnitude per unit mass used to un-cant a die
    pub nudge_impulse: f32,
    /// Torque impulse magnitude per unit mass used to un-cant a die
    pub nudge_torque: f32,
    /// Fixed RNG seed for reproducible rolls; None seeds from the OS
    pub seed: Option<u64>,
}

impl Default for RollConfig {
    fn default() -> Self {
        Self {
            sleep_linear_threshold: 0.12,
            sleep_angular_threshold: 0.4,
            settle_debounce_s: 0.3,
            stuck_timeout_s: 6.0,
            complete_timeout_s: 14.0,
            max_reroll_attempts: 3,
            fallback_value: 1,
            alignment_threshold: 0.94,
            nudge_impulse: 1.2,
            nudge_torque: 0.6,
            seed: None,
        }
    }
}

/// Error type for roll requests
///
/// These are caller bugs in the request itself, not runtime physics
/// conditions; physics anomalies are retried invisibly and never surface.
#[derive(Debug)]
pub enum RollError {
    /// The request contained no groups
    EmptyRequest,
    /// A group asked for zero dice
    EmptyGroup(String),
    /// A group reused another group's id
    DuplicateGroupId(String),
    /// A group's scale was zero, negative, or not finite
    InvalidScale(String),
    /// A required collision shape could not be built
    Shape(ShapeError),
}

impl fmt::Display for RollError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RollError::EmptyRequest => write!(f, "roll request has no groups"),
            RollError::EmptyGroup(id) => write!(f, "group '{id}' has no dice"),
            RollError::DuplicateGroupId(id) => write!(f, "group id '{id}' used twice"),
            RollError::InvalidScale(id) => write!(f, "group '{id}' has an invalid scale"),
            RollError::Shape(err) => write!(f, "shape construction failed: {err}"),
        }
    }
}

impl std::error::Error for RollError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RollError::Shape(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ShapeError> for RollError {
    fn from(err: ShapeError) -> Self {
        RollError::Shape(err)
    }
}

/// Per-die session state
///
/// Exactly one of `body` or `forced` is set for every active die, except for
/// the single frame between noticing a vanished body and respawning it.
struct ActiveDie {
    /// Pooled instance carrying the die's visual state
    key: DieKey,
    /// Index into the session's group list
    group_index: usize,
    /// Live physics body, when the die is simulated
    body: Option<RigidBodyHandle>,
    /// Reroll attempts consumed so far
    attempts: u32,
    /// Result assigned by the failsafe ladder instead of physics
    forced: Option<i32>,
}

enum RollState {
    /// No roll in flight; the previous result (if any) stays on display
    Idle,
    /// Dice are moving
    Rolling,
    /// Nothing moved this frame; waiting out the debounce before trusting it
    Settling { debounce: f32 },
}

/// The roll engine: owns the simulation, shape cache, and die pool, and runs
/// the settle/failsafe state machine over them
///
/// Two call cadences drive it: [`physics_step`](Self::physics_step) at a
/// fixed rate and [`update`](Self::update) at frame rate. Both must come
/// from the same thread; all session logic runs strictly between steps.
pub struct RollOrchestrator {
    sim: RigidBodySimulation,
    cache: DieShapeCache,
    pool: DieInstancePool,
    config: RollConfig,
    spawn: SpawnConfig,
    play_area: PlayAreaConfig,
    /// Model vertices for dice whose colliders cannot be synthesized
    d4_model: Option<Vec<Point3<f32>>>,
    rng: Pcg32,
    groups: Vec<DiceGroup>,
    active: Vec<ActiveDie>,
    state: RollState,
    /// Accumulated motion time; reset by every corrective action
    motion_elapsed: f32,
    complete_attempts: u32,
    half_width: f32,
    half_depth: f32,
}

impl RollOrchestrator {
    /// Create an orchestrator over the given simulation, cache, and pool
    ///
    /// The arena is created (or repositioned) at the smallest zoom tier;
    /// each roll resizes it for its own die count.
    pub fn new(
        mut sim: RigidBodySimulation,
        cache: DieShapeCache,
        pool: DieInstancePool,
        config: RollConfig,
        spawn: SpawnConfig,
        play_area: PlayAreaConfig,
    ) -> Self {
        let rng = match config.seed {
            Some(seed) => Pcg32::seed_from_u64(seed),
            None => Pcg32::from_rng(&mut rand::rng()),
        };
        let (width, depth) = play_area.extents_for(0);
        sim.create_arena(width, depth);
        Self {
            sim,
            cache,
            pool,
            config,
            spawn,
            play_area,
            d4_model: None,
            rng,
            groups: Vec::new(),
            active: Vec::new(),
            state: RollState::Idle,
            motion_elapsed: 0.0,
            complete_attempts: 0,
            half_width: width * 0.5,
            half_depth: depth * 0.5,
        }
    }

    /// Supply the model vertices used to build vertex-based die colliders
    pub fn with_d4_model(mut self, vertices: Vec<Point3<f32>>) -> Self {
        self.d4_model = Some(vertices);
        self
    }

    /// Start a roll
    ///
    /// A roll issued while a previous session is still in flight is a hard
    /// interrupt: the old session is force-completed from its current state
    /// and its result is returned here, so every roll still gets exactly one
    /// result. Request validation and shape construction happen before any
    /// teardown, so a bad request leaves an in-flight roll untouched.
    pub fn roll(&mut self, groups: Vec<DiceGroup>) -> Result<Option<DiceRollResult>, RollError> {
        Self::validate(&groups)?;
        for group in &groups {
            self.cache
                .ensure_shape(group.die_type, group.scale, self.d4_model.as_deref())?;
        }

        let interrupted = if matches!(self.state, RollState::Idle) {
            None
        } else {
            log::info!("roll interrupted mid-session; force-completing previous roll");
            Some(self.finalize())
        };
        self.retire_active();

        let total: u32 = groups.iter().map(|g| g.dice).sum();
        let (width, depth) = self.play_area.extents_for(total);
        self.sim.update_arena_bounds(width, depth);
        self.half_width = width * 0.5;
        self.half_depth = depth * 0.5;

        self.groups = groups;
        for group_index in 0..self.groups.len() {
            // One edge per group: a group's dice enter together
            let edge = SpawnEdge::pick(&mut self.rng);
            for _ in 0..self.groups[group_index].dice {
                self.spawn_new_die(group_index, edge);
            }
        }
        self.state = RollState::Rolling;
        self.motion_elapsed = 0.0;
        self.complete_attempts = 0;
        log::info!(
            "roll started: {} dice in {} groups",
            total,
            self.groups.len()
        );
        Ok(interrupted)
    }

    /// Advance the physics world one fixed timestep
    pub fn physics_step(&mut self, dt: f32) {
        self.sim.step(dt);
    }

    /// Run one frame of session logic
    ///
    /// Returns the finished [`DiceRollResult`] exactly once, on the frame
    /// the roll completes; `None` on every other frame.
    pub fn update(&mut self, dt: f32) -> Option<DiceRollResult> {
        if matches!(self.state, RollState::Idle) {
            return None;
        }
        self.sync_visuals();

        // A body the solver silently dropped gets handled before anything else
        let missing = self.missing_dice();
        if !missing.is_empty() {
            log::warn!("{} dice lost their physics bodies; rerolling", missing.len());
            for index in missing {
                self.reroll_die(index);
            }
            return None;
        }

        if self.any_motion() {
            // Motion cancels any pending settle debounce
            self.state = RollState::Rolling;
            self.motion_elapsed += dt;
            if self.motion_elapsed >= self.config.stuck_timeout_s {
                self.handle_stuck_dice();
                return None;
            }
            if self.motion_elapsed >= self.config.complete_timeout_s {
                return self.handle_complete_timeout();
            }
            return None;
        }

        let debounce = match &mut self.state {
            RollState::Settling { debounce } => {
                *debounce += dt;
                *debounce
            }
            _ => {
                self.state = RollState::Settling { debounce: 0.0 };
                0.0
            }
        };
        if debounce < self.config.settle_debounce_s {
            return None;
        }

        let off_field = self.off_field_dice();
        if !off_field.is_empty() {
            log::warn!("{} dice settled off-field; re-throwing", off_field.len());
            for index in off_field {
                self.rethrow_die(index);
            }
            self.motion_elapsed = 0.0;
            self.state = RollState::Rolling;
            return None;
        }

        if self.nudge_canted_dice() > 0 {
            self.motion_elapsed = 0.0;
            self.state = RollState::Rolling;
            return None;
        }

        Some(self.finalize())
    }

    /// Iterate the active dice for rendering
    ///
    /// Culled dice are still yielded with their flag set; excluding them
    /// from drawing is the renderer's side of the contract.
    pub fn dice(&self) -> impl Iterator<Item = &DieInstance> {
        self.active.iter().filter_map(|die| self.pool.get(die.key))
    }

    /// Whether no roll is in flight
    pub fn is_idle(&self) -> bool {
        matches!(self.state, RollState::Idle)
    }

    /// Number of dice in the current (or last) session
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Body handles of the active dice, in spawn order
    ///
    /// `None` marks dice currently running on a forced result.
    pub fn active_bodies(&self) -> Vec<Option<RigidBodyHandle>> {
        self.active.iter().map(|die| die.body).collect()
    }

    /// The underlying simulation
    pub fn simulation(&self) -> &RigidBodySimulation {
        &self.sim
    }

    /// Mutable access to the underlying simulation
    pub fn simulation_mut(&mut self) -> &mut RigidBodySimulation {
        &mut self.sim
    }

    /// The die instance pool
    pub fn pool(&self) -> &DieInstancePool {
        &self.pool
    }

    fn validate(groups: &[DiceGroup]) -> Result<(), RollError> {
        if groups.is_empty() {
            return Err(RollError::EmptyRequest);
        }
        let mut seen = HashSet::new();
        for group in groups {
            if group.dice == 0 {
                return Err(RollError::EmptyGroup(group.group_id.clone()));
            }
            if group.scale <= 0.0 || !group.scale.is_finite() {
                return Err(RollError::InvalidScale(group.group_id.clone()));
            }
            if !seen.insert(group.group_id.as_str()) {
                return Err(RollError::DuplicateGroupId(group.group_id.clone()));
            }
        }
        Ok(())
    }

    /// Release every instance and body from the previous session
    fn retire_active(&mut self) {
        for die in &mut self.active {
            if let Some(handle) = die.body.take() {
                self.sim.remove_body(handle);
            }
        }
        for die in &self.active {
            self.pool.release(die.key);
        }
        self.active.clear();
    }

    fn spawn_new_die(&mut self, group_index: usize, edge: SpawnEdge) {
        let key = self.pool.acquire();
        let (die_type, scale, tint, group_id) = {
            let group = &self.groups[group_index];
            (
                group.die_type,
                group.scale,
                group.tint,
                group.group_id.clone(),
            )
        };
        if let Some(instance) = self.pool.get_mut(key) {
            instance.group_id = group_id;
            instance.tint = tint;
            instance.die_type = die_type;
            instance.scale = scale;
            instance.culled = false;
        }
        let spawned = self.spawn_body(die_type, scale, edge);
        if let Some((pose, _)) = spawned {
            if let Some(instance) = self.pool.get_mut(key) {
                instance.transform = pose;
            }
        }
        self.active.push(ActiveDie {
            key,
            group_index,
            body: spawned.map(|(_, handle)| handle),
            attempts: 0,
            forced: None,
        });
    }

    /// Create a physics body entering from `edge` for a die of the given
    /// type and scale
    fn spawn_body(
        &mut self,
        die_type: DieType,
        scale: f32,
        edge: SpawnEdge,
    ) -> Option<(nalgebra::Isometry3<f32>, RigidBodyHandle)> {
        let (shape, mass) = match self.cache.get(die_type, scale) {
            Some(entry) => (entry.shape.clone(), entry.mass),
            None => {
                log::error!("no cached shape for {die_type:?} at scale {scale}");
                return None;
            }
        };
        let pose = spawn_pose(
            &mut self.rng,
            edge,
            self.half_width,
            self.half_depth,
            &self.spawn,
        );
        let linvel = throw_velocity(&mut self.rng, &pose.translation.vector, &self.spawn);
        let angvel = angular_velocity(&mut self.rng, &self.spawn);
        let handle = self.sim.add_body(shape, mass, pose, linvel, angvel);
        Some((pose, handle))
    }

    /// Copy body poses into the pooled instances for the renderer
    fn sync_visuals(&mut self) {
        for die in &self.active {
            if die.forced.is_some() {
                continue;
            }
            if let Some(pose) = die.body.and_then(|handle| self.sim.body_pose(handle)) {
                if let Some(instance) = self.pool.get_mut(die.key) {
                    instance.transform = pose;
                }
            }
        }
    }

    /// Indices of dice that have neither a live body nor a forced result
    fn missing_dice(&self) -> Vec<usize> {
        let live = self
            .active
            .iter()
            .filter(|die| die.body.map_or(false, |handle| self.sim.contains(handle)))
            .count();
        let forced = self.active.iter().filter(|die| die.forced.is_some()).count();
        if live + forced >= self.active.len() {
            return Vec::new();
        }
        self.active
            .iter()
            .enumerate()
            .filter(|(_, die)| {
                die.forced.is_none()
                    && !die.body.map_or(false, |handle| self.sim.contains(handle))
            })
            .map(|(index, _)| index)
            .collect()
    }

    /// Whether any live die is above the sleep thresholds
    fn any_motion(&self) -> bool {
        self.active.iter().any(|die| {
            die.body
                .and_then(|handle| self.sim.body_velocities(handle))
                .map_or(false, |(linvel, angvel)| {
                    linvel.norm() > self.config.sleep_linear_threshold
                        || angvel.norm() > self.config.sleep_angular_threshold
                })
        })
    }

    /// Indices of live dice resting outside the visible rectangle
    fn off_field_dice(&self) -> Vec<usize> {
        self.active
            .iter()
            .enumerate()
            .filter(|(_, die)| {
                die.body
                    .and_then(|handle| self.sim.body_pose(handle))
                    .map_or(false, |pose| {
                        let t = pose.translation.vector;
                        t.x.abs() > self.half_width
                            || t.z.abs() > self.half_depth
                            || t.y < -0.5
                    })
            })
            .map(|(index, _)| index)
            .collect()
    }

    /// Reroll dice that are still awake after the stuck timeout
    fn handle_stuck_dice(&mut self) {
        let stuck: Vec<usize> = self
            .active
            .iter()
            .enumerate()
            .filter(|(_, die)| {
                die.body
                    .and_then(|handle| self.sim.body_velocities(handle))
                    .map_or(false, |(linvel, angvel)| {
                        linvel.norm() > self.config.sleep_linear_threshold
                            || angvel.norm() > self.config.sleep_angular_threshold
                    })
            })
            .map(|(index, _)| index)
            .collect();
        log::warn!("stuck-dice timeout: rerolling {} dice still awake", stuck.len());
        for index in stuck {
            self.reroll_die(index);
        }
        self.motion_elapsed = 0.0;
        self.state = RollState::Rolling;
    }

    /// One rung of the per-die ladder: charge an attempt, then respawn or force
    fn reroll_die(&mut self, index: usize) {
        if let Some(handle) = self.active[index].body.take() {
            self.sim.remove_body(handle);
        }
        self.active[index].attempts += 1;
        if self.active[index].attempts >= self.config.max_reroll_attempts {
            self.force_die(index);
        } else {
            let edge = SpawnEdge::pick(&mut self.rng);
            self.respawn_die(index, edge);
            log::debug!(
                "die {} rerolled (attempt {})",
                index,
                self.active[index].attempts
            );
        }
        self.motion_elapsed = 0.0;
    }

    /// Re-throw a die that settled off-field; costs no attempt
    fn rethrow_die(&mut self, index: usize) {
        if let Some(handle) = self.active[index].body.take() {
            self.sim.remove_body(handle);
        }
        let edge = SpawnEdge::pick(&mut self.rng);
        self.respawn_die(index, edge);
    }

    /// Give a die a fresh body entering from `edge`
    fn respawn_die(&mut self, index: usize, edge: SpawnEdge) {
        let group_index = self.active[index].group_index;
        let (die_type, scale) = {
            let group = &self.groups[group_index];
            (group.die_type, group.scale)
        };
        match self.spawn_body(die_type, scale, edge) {
            Some((pose, handle)) => {
                self.active[index].body = Some(handle);
                if let Some(instance) = self.pool.get_mut(self.active[index].key) {
                    instance.transform = pose;
                    instance.culled = false;
                }
            }
            None => self.force_die(index),
        }
    }

    /// Assign the fallback value and cull the die from the table
    fn force_die(&mut self, index: usize) {
        if let Some(handle) = self.active[index].body.take() {
            self.sim.remove_body(handle);
        }
        self.active[index].forced = Some(self.config.fallback_value);
        if let Some(instance) = self.pool.get_mut(self.active[index].key) {
            instance.culled = true;
        }
        log::warn!(
            "die {} forced to fallback value {}",
            index,
            self.config.fallback_value
        );
    }

    /// Apply a small random kick to every settled-but-canted die
    fn nudge_canted_dice(&mut self) -> usize {
        let mut nudged = 0;
        for index in 0..self.active.len() {
            let handle = match self.active[index].body {
                Some(handle) => handle,
                None => continue,
            };
            let pose = match self.sim.body_pose(handle) {
                Some(pose) => pose,
                None => continue,
            };
            let (die_type, scale) = {
                let group = &self.groups[self.active[index].group_index];
                (group.die_type, group.scale)
            };
            let (vertices, mass) = match self.cache.get(die_type, scale) {
                Some(entry) => (entry.vertices.clone(), entry.mass),
                None => continue,
            };
            let reading = resolve(die_type, &pose.rotation, Some(vertices.as_slice()));
            if reading.alignment >= self.config.alignment_threshold {
                continue;
            }
            let impulse = Vector3::new(
                self.rng.random_range(-1.0..1.0),
                self.rng.random_range(0.6..1.2),
                self.rng.random_range(-1.0..1.0),
            ) * (self.config.nudge_impulse * mass);
            let torque = Vector3::new(
                self.rng.random_range(-1.0..1.0),
                self.rng.random_range(-1.0..1.0),
                self.rng.random_range(-1.0..1.0),
            ) * (self.config.nudge_torque * mass);
            self.sim.nudge(handle, impulse, torque);
            log::debug!(
                "die {index} canted (alignment {:.2}); nudged in place",
                reading.alignment
            );
            nudged += 1;
        }
        nudged
    }

    /// One rung of the whole-roll ladder: re-throw everything, or give up and
    /// force every die
    fn handle_complete_timeout(&mut self) -> Option<DiceRollResult> {
        self.complete_attempts += 1;
        if self.complete_attempts >= self.config.max_reroll_attempts {
            log::error!("roll never stabilized; forcing every die to the fallback value");
            for index in 0..self.active.len() {
                self.force_die(index);
            }
            return Some(self.finalize());
        }
        log::warn!(
            "complete-roll timeout: re-throwing the whole roll (attempt {})",
            self.complete_attempts
        );
        let edges: Vec<SpawnEdge> = (0..self.groups.len())
            .map(|_| SpawnEdge::pick(&mut self.rng))
            .collect();
        for index in 0..self.active.len() {
            if let Some(handle) = self.active[index].body.take() {
                self.sim.remove_body(handle);
            }
            self.active[index].forced = None;
            let edge = edges[self.active[index].group_index];
            self.respawn_die(index, edge);
        }
        self.motion_elapsed = 0.0;
        self.state = RollState::Rolling;
        None
    }

    /// Read every die and assemble the grouped result
    fn finalize(&mut self) -> DiceRollResult {
        let mut values_per_group: Vec<Vec<i32>> = vec![Vec::new(); self.groups.len()];
        for die in &self.active {
            let group = &self.groups[die.group_index];
            let value = match die.forced {
                Some(value) => value,
                None => match die.body.and_then(|handle| self.sim.body_pose(handle)) {
                    Some(pose) => {
                        let vertices = self
                            .cache
                            .get(group.die_type, group.scale)
                            .map(|entry| entry.vertices.clone());
                        resolve(
                            group.die_type,
                            &pose.rotation,
                            vertices.as_deref().map(Vec::as_slice),
                        )
                        .value
                    }
                    None => self.config.fallback_value,
                },
            };
            values_per_group[die.group_index].push(value);
        }

        for die in &mut self.active {
            if let Some(handle) = die.body.take() {
                self.sim.remove_body(handle);
            }
        }

        let mut results_by_group = HashMap::new();
        for (group, values) in self.groups.iter().zip(values_per_group) {
            let list = match group.processing {
                ResultProcessing::Sum => vec![values.iter().sum()],
                ResultProcessing::IndividualValues => values,
            };
            results_by_group.insert(group.group_id.clone(), list);
        }

        self.state = RollState::Idle;
        self.motion_elapsed = 0.0;
        self.complete_attempts = 0;
        let result = DiceRollResult { results_by_group };
        log::info!("roll completed: {:?}", result.results_by_group);
        result
    }
}
