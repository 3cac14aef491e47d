//! Rigid-body world and fixed-step advancement
//!
//! [`RigidBodySimulation`] owns the rapier3d pipeline and body/collider
//! storage. Callers drive it at a fixed timestep, decoupled from whatever
//! cadence reads poses back out; all mutation goes through this type so the
//! settle logic upstairs never races a solver step.

use rapier3d::prelude::*;

use crate::arena::Arena;
use crate::config::SimConfig;

/// The simulation world containing the dice bodies and boundary geometry
pub struct RigidBodySimulation {
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
    arena: Option<Arena>,
    config: SimConfig,
}

impl RigidBodySimulation {
    /// Create an empty world with the given tuning parameters
    pub fn new(config: SimConfig) -> Self {
        Self {
            gravity: vector![0.0, config.gravity, 0.0],
            integration_parameters: IntegrationParameters::default(),
            pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            arena: None,
            config,
        }
    }

    /// Build the floor and walls bounding a `width` x `depth` play rectangle
    ///
    /// Idempotent with respect to world structure: calling this a second time
    /// only repositions the existing boundary.
    pub fn create_arena(&mut self, width: f32, depth: f32) {
        match self.arena.as_mut() {
            Some(arena) => arena.reposition(&mut self.colliders, &self.config, width, depth),
            None => {
                self.arena = Some(Arena::build(&mut self.colliders, &self.config, width, depth));
                log::info!("arena created at {width:.1} x {depth:.1}");
            }
        }
    }

    /// Reposition the boundary walls so the inner faces bound a new rectangle
    pub fn update_arena_bounds(&mut self, width: f32, depth: f32) {
        match self.arena.as_mut() {
            Some(arena) => arena.reposition(&mut self.colliders, &self.config, width, depth),
            None => log::warn!("update_arena_bounds called before create_arena"),
        }
    }

    /// Current play rectangle as (width, depth), if the arena exists
    pub fn arena_bounds(&self) -> Option<(f32, f32)> {
        self.arena.as_ref().map(Arena::bounds)
    }

    /// Spawn a dynamic body with the given hull shape and mass
    ///
    /// Continuous collision detection is always enabled; freshly thrown dice
    /// are fast enough to tunnel through the walls and floor without it.
    pub fn add_body(
        &mut self,
        shape: SharedShape,
        mass: f32,
        pose: Isometry<Real>,
        linvel: Vector<Real>,
        angvel: Vector<Real>,
    ) -> RigidBodyHandle {
        let body = RigidBodyBuilder::dynamic()
            .position(pose)
            .linvel(linvel)
            .angvel(angvel)
            .linear_damping(self.config.linear_damping)
            .angular_damping(self.config.angular_damping)
            .ccd_enabled(true)
            .build();
        let handle = self.bodies.insert(body);
        let collider = ColliderBuilder::new(shape)
            .mass(mass)
            .restitution(self.config.restitution)
            .friction(self.config.friction)
            .build();
        self.colliders
            .insert_with_parent(collider, handle, &mut self.bodies);
        handle
    }

    /// Remove a body and its collider. No-op when the handle is already gone.
    pub fn remove_body(&mut self, handle: RigidBodyHandle) {
        if self
            .bodies
            .remove(
                handle,
                &mut self.island_manager,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                true,
            )
            .is_none()
        {
            log::trace!("remove_body on absent handle {handle:?}");
        }
    }

    /// Whether a body still exists in the world
    pub fn contains(&self, handle: RigidBodyHandle) -> bool {
        self.bodies.contains(handle)
    }

    /// Number of dynamic bodies currently in the world
    pub fn dynamic_body_count(&self) -> usize {
        self.bodies.len()
    }

    /// World pose of a body
    pub fn body_pose(&self, handle: RigidBodyHandle) -> Option<Isometry<Real>> {
        self.bodies.get(handle).map(|body| *body.position())
    }

    /// Linear and angular velocity of a body
    pub fn body_velocities(&self, handle: RigidBodyHandle) -> Option<(Vector<Real>, Vector<Real>)> {
        self.bodies
            .get(handle)
            .map(|body| (*body.linvel(), *body.angvel()))
    }

    /// Teleport a body, waking it
    pub fn set_body_pose(&mut self, handle: RigidBodyHandle, pose: Isometry<Real>) {
        if let Some(body) = self.bodies.get_mut(handle) {
            body.set_position(pose, true);
        }
    }

    /// Overwrite a body's velocities, waking it
    pub fn set_body_velocities(
        &mut self,
        handle: RigidBodyHandle,
        linvel: Vector<Real>,
        angvel: Vector<Real>,
    ) {
        if let Some(body) = self.bodies.get_mut(handle) {
            body.set_linvel(linvel, true);
            body.set_angvel(angvel, true);
        }
    }

    /// Kick a body in place with a linear impulse and a torque impulse
    pub fn nudge(&mut self, handle: RigidBodyHandle, impulse: Vector<Real>, torque: Vector<Real>) {
        if let Some(body) = self.bodies.get_mut(handle) {
            body.apply_impulse(impulse, true);
            body.apply_torque_impulse(torque, true);
        }
    }

    /// Advance the simulation by one fixed timestep
    ///
    /// The caller owns the cadence; this must be fed a constant `dt` for
    /// stable integration regardless of how often poses are read.
    pub fn step(&mut self, dt: f32) {
        self.integration_parameters.dt = dt;
        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
    }

    /// Tuning parameters this world was built with
    pub fn config(&self) -> &SimConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn die_shape() -> SharedShape {
        SharedShape::cuboid(0.5, 0.5, 0.5)
    }

    fn spawn_at(sim: &mut RigidBodySimulation, y: f32) -> RigidBodyHandle {
        sim.add_body(
            die_shape(),
            1.0,
            Isometry::translation(0.0, y, 0.0),
            vector![0.0, 0.0, 0.0],
            vector![0.0, 0.0, 0.0],
        )
    }

    #[test]
    fn test_gravity_pulls_bodies_down() {
        let mut sim = RigidBodySimulation::new(SimConfig::default());
        let handle = spawn_at(&mut sim, 10.0);

        for _ in 0..30 {
            sim.step(DT);
        }

        let pose = sim.body_pose(handle).expect("body exists");
        assert!(pose.translation.y < 10.0);
        let (linvel, _) = sim.body_velocities(handle).expect("body exists");
        assert!(linvel.y < 0.0);
    }

    #[test]
    fn test_body_rests_on_floor() {
        let mut sim = RigidBodySimulation::new(SimConfig::default());
        sim.create_arena(10.0, 10.0);
        let handle = spawn_at(&mut sim, 3.0);

        for _ in 0..600 {
            sim.step(DT);
        }

        let pose = sim.body_pose(handle).expect("body exists");
        // A unit cube resting on the floor has its centre near y = 0.5
        assert!(pose.translation.y > 0.2, "y = {}", pose.translation.y);
        assert!(pose.translation.y < 1.0, "y = {}", pose.translation.y);
        let (linvel, _) = sim.body_velocities(handle).expect("body exists");
        assert!(linvel.norm() < 0.5);
    }

    #[test]
    fn test_fast_body_does_not_tunnel_floor() {
        let mut sim = RigidBodySimulation::new(SimConfig::default());
        sim.create_arena(10.0, 10.0);
        let handle = sim.add_body(
            die_shape(),
            1.0,
            Isometry::translation(0.0, 5.0, 0.0),
            vector![0.0, -80.0, 0.0],
            vector![0.0, 0.0, 0.0],
        );

        for _ in 0..120 {
            sim.step(DT);
        }

        let pose = sim.body_pose(handle).expect("body exists");
        assert!(pose.translation.y > -0.5, "y = {}", pose.translation.y);
    }

    #[test]
    fn test_walls_contain_fast_body() {
        let mut sim = RigidBodySimulation::new(SimConfig::default());
        sim.create_arena(8.0, 8.0);
        let handle = sim.add_body(
            die_shape(),
            1.0,
            Isometry::translation(0.0, 1.0, 0.0),
            vector![60.0, 0.0, 0.0],
            vector![0.0, 0.0, 0.0],
        );

        for _ in 0..300 {
            sim.step(DT);
        }

        let pose = sim.body_pose(handle).expect("body exists");
        assert!(
            pose.translation.x.abs() < 8.0,
            "x = {}",
            pose.translation.x
        );
    }

    #[test]
    fn test_remove_body_is_idempotent() {
        let mut sim = RigidBodySimulation::new(SimConfig::default());
        let handle = spawn_at(&mut sim, 5.0);
        assert!(sim.contains(handle));
        assert_eq!(sim.dynamic_body_count(), 1);

        sim.remove_body(handle);
        assert!(!sim.contains(handle));
        assert_eq!(sim.dynamic_body_count(), 0);

        // Second removal of the same handle is a no-op
        sim.remove_body(handle);
        assert_eq!(sim.dynamic_body_count(), 0);
    }

    #[test]
    fn test_queries_on_absent_handle() {
        let mut sim = RigidBodySimulation::new(SimConfig::default());
        let handle = spawn_at(&mut sim, 5.0);
        sim.remove_body(handle);

        assert!(sim.body_pose(handle).is_none());
        assert!(sim.body_velocities(handle).is_none());
    }

    #[test]
    fn test_set_pose_roundtrip() {
        let mut sim = RigidBodySimulation::new(SimConfig::default());
        let handle = spawn_at(&mut sim, 5.0);

        let target = Isometry::translation(1.0, 2.0, 3.0);
        sim.set_body_pose(handle, target);
        let pose = sim.body_pose(handle).expect("body exists");
        assert!((pose.translation.vector - target.translation.vector).norm() < 1e-6);
    }

    #[test]
    fn test_nudge_wakes_and_moves_body() {
        let config = SimConfig {
            gravity: 0.0,
            ..SimConfig::default()
        };
        let mut sim = RigidBodySimulation::new(config);
        let handle = spawn_at(&mut sim, 1.0);

        sim.nudge(handle, vector![0.5, 0.5, 0.0], vector![0.0, 0.2, 0.0]);
        let (linvel, angvel) = sim.body_velocities(handle).expect("body exists");
        assert!(linvel.norm() > 0.0);
        assert!(angvel.norm() > 0.0);
    }

    #[test]
    fn test_arena_reposition_keeps_handles() {
        let mut sim = RigidBodySimulation::new(SimConfig::default());
        sim.create_arena(10.0, 10.0);
        let colliders_before = sim.colliders.len();

        sim.update_arena_bounds(14.0, 14.0);
        assert_eq!(sim.colliders.len(), colliders_before);
        assert_eq!(sim.arena_bounds(), Some((14.0, 14.0)));
    }

    #[test]
    fn test_create_arena_twice_only_repositions() {
        let mut sim = RigidBodySimulation::new(SimConfig::default());
        sim.create_arena(10.0, 10.0);
        let colliders_before = sim.colliders.len();

        sim.create_arena(18.0, 18.0);
        assert_eq!(sim.colliders.len(), colliders_before);
        assert_eq!(sim.arena_bounds(), Some((18.0, 18.0)));
    }
}
