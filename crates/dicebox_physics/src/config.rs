//! Simulation tuning parameters

use serde::{Deserialize, Serialize};

/// Configuration for the rigid-body simulation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimConfig {
    /// Gravity acceleration on the Y axis (negative = down). Tuned lighter
    /// than true scale so tumbling dice stay readable.
    pub gravity: f32,
    /// Restitution applied to dice and boundary geometry
    pub restitution: f32,
    /// Friction applied to dice and boundary geometry
    pub friction: f32,
    /// Linear damping on dice bodies
    pub linear_damping: f32,
    /// Angular damping on dice bodies
    pub angular_damping: f32,
    /// Height of the boundary walls. Tall enough that no bounce inside the
    /// field clears them; spawn throws enter by arcing over the top.
    pub wall_height: f32,
    /// Thickness of the boundary walls
    pub wall_thickness: f32,
    /// Thickness of the floor slab
    pub floor_thickness: f32,
    /// Half-length the walls and floor are built at. The play area can be
    /// repositioned up to this extent without rebuilding anything.
    pub max_half_extent: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            gravity: -18.0,
            restitution: 0.35,
            friction: 0.6,
            linear_damping: 0.05,
            angular_damping: 0.2,
            wall_height: 3.0,
            wall_thickness: 0.5,
            floor_thickness: 1.0,
            max_half_extent: 30.0,
        }
    }
}
