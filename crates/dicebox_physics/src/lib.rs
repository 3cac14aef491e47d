//! Rigid-body simulation layer for the dicebox engine
//!
//! This crate wraps the rapier3d dynamics pipeline behind the narrow surface
//! the roll orchestration needs:
//!
//! - [`RigidBodySimulation`] - world ownership, body add/remove/query, and
//!   fixed-timestep advancement
//! - [`Arena`] - the floor-plus-walls boundary, repositionable without
//!   rebuilding the world
//! - [`SimConfig`] - gravity, materials, and boundary dimensions
//!
//! Dice bodies always run with continuous collision detection; spawn-speed
//! dice tunnel through the thin boundary geometry without it.

pub mod arena;
pub mod config;
pub mod sim;

pub use arena::Arena;
pub use config::SimConfig;
pub use sim::RigidBodySimulation;

// Re-export the handle and shape types callers hold
pub use rapier3d::prelude::{ColliderHandle, RigidBodyHandle, SharedShape};
