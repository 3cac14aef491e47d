//! Static boundary geometry: a floor slab plus four walls
//!
//! The walls and floor are built once at generous extents; resizing the play
//! area only moves the wall colliders so their inner faces bound the new
//! rectangle. Nothing is ever rebuilt, which keeps body and collider handles
//! stable across zoom changes.

use rapier3d::prelude::*;

use crate::config::SimConfig;

/// Handles to the boundary colliders and the rectangle they currently bound
pub struct Arena {
    floor: ColliderHandle,
    /// Walls in +X, -X, +Z, -Z order
    walls: [ColliderHandle; 4],
    width: f32,
    depth: f32,
}

fn insert_boundary(
    colliders: &mut ColliderSet,
    config: &SimConfig,
    half_extents: Vector<f32>,
) -> ColliderHandle {
    colliders.insert(
        ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            .restitution(config.restitution)
            .friction(config.friction)
            .build(),
    )
}

impl Arena {
    /// Build the floor and walls into `colliders`, with the wall inner faces
    /// bounding a `width` x `depth` rectangle centred on the origin. The
    /// floor's top face sits at y = 0.
    pub fn build(colliders: &mut ColliderSet, config: &SimConfig, width: f32, depth: f32) -> Self {
        let reach = config.max_half_extent;
        let floor = colliders.insert(
            ColliderBuilder::cuboid(reach, config.floor_thickness * 0.5, reach)
                .translation(vector![0.0, -config.floor_thickness * 0.5, 0.0])
                .restitution(config.restitution)
                .friction(config.friction)
                .build(),
        );

        let half_t = config.wall_thickness * 0.5;
        let half_h = config.wall_height * 0.5;
        let walls = [
            insert_boundary(colliders, config, vector![half_t, half_h, reach]),
            insert_boundary(colliders, config, vector![half_t, half_h, reach]),
            insert_boundary(colliders, config, vector![reach, half_h, half_t]),
            insert_boundary(colliders, config, vector![reach, half_h, half_t]),
        ];

        let mut arena = Self {
            floor,
            walls,
            width,
            depth,
        };
        arena.reposition(colliders, config, width, depth);
        arena
    }

    /// Move the walls so their inner faces bound a new rectangle
    pub fn reposition(
        &mut self,
        colliders: &mut ColliderSet,
        config: &SimConfig,
        width: f32,
        depth: f32,
    ) {
        let half_w = width * 0.5;
        let half_d = depth * 0.5;
        let half_t = config.wall_thickness * 0.5;
        let y = config.wall_height * 0.5;
        let positions = [
            vector![half_w + half_t, y, 0.0],
            vector![-(half_w + half_t), y, 0.0],
            vector![0.0, y, half_d + half_t],
            vector![0.0, y, -(half_d + half_t)],
        ];
        for (handle, position) in self.walls.iter().zip(positions) {
            if let Some(collider) = colliders.get_mut(*handle) {
                collider.set_translation(position);
            }
        }
        self.width = width;
        self.depth = depth;
        log::debug!("arena bounds set to {width:.1} x {depth:.1}");
    }

    /// Current bounded rectangle as (width, depth)
    pub fn bounds(&self) -> (f32, f32) {
        (self.width, self.depth)
    }

    /// Handle of the floor collider
    pub fn floor(&self) -> ColliderHandle {
        self.floor
    }

    /// Handles of the wall colliders
    pub fn walls(&self) -> &[ColliderHandle; 4] {
        &self.walls
    }
}
