//! dicebox - physics-simulated dice rolling
//!
//! The binary crate's library surface: configuration loading and dice
//! notation parsing. The engine itself lives in the `dicebox_core`,
//! `dicebox_physics`, and `dicebox_geom` crates.

pub mod config;
pub mod notation;
