//! Roll orchestration for the dicebox engine
//!
//! This crate turns a request of named dice groups into a grouped integer
//! result by driving the physics layer and reading settled faces:
//!
//! - [`DiceGroup`] / [`DiceRollResult`] - the request and result model
//! - [`DieShapeCache`] - lazy, never-evicted store of bevelled hull shapes
//! - [`DieInstancePool`] - grow-only pool of reusable die instances
//! - [`PlayAreaConfig`] - zoom tiers sizing the table to the roll
//! - [`RollOrchestrator`] - the settle and failsafe state machine
//!
//! The orchestrator takes its collaborators by value at construction; there
//! is no ambient global state anywhere in the engine.

pub mod orchestrator;
pub mod play_area;
pub mod pool;
pub mod shape_cache;
pub mod spawn;
pub mod types;

pub use orchestrator::{RollConfig, RollError, RollOrchestrator};
pub use play_area::{PlayAreaConfig, ZoomTier};
pub use pool::{DieInstance, DieInstancePool, DieKey};
pub use shape_cache::{DieShapeCache, ShapeCacheEntry, ShapeConfig, ShapeError};
pub use spawn::{SpawnConfig, SpawnEdge};
pub use types::{DiceGroup, DiceRollResult, DieType, ResultProcessing, Tint};

// Re-export the geometry and physics surfaces callers commonly need
pub use dicebox_geom::{resolve, FaceReading};
pub use dicebox_physics::{RigidBodySimulation, SimConfig};
