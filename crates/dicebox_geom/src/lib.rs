//! Die geometry for the dicebox engine
//!
//! This crate holds the pure geometric half of roll resolution:
//!
//! - [`DieType`] - the supported die kinds and their face tables
//! - [`bevelled_cube_points`] / [`bevelled_hull_points`] - chamfered point
//!   clouds that collider hulls are built from
//! - [`resolve`] - reading the resting face (and how flat the rest is) off a
//!   settled die's orientation
//!
//! Everything is side-effect free and deterministic; the physics and
//! orchestration layers live in their own crates.

mod bevel;
mod faces;
mod resolve;

pub use bevel::{bevelled_cube_points, bevelled_hull_points};
pub use faces::{d4_canonical_vertices, d4_face_normals, DieType, D4_CANONICAL_VERTICES, D6_FACES};
pub use resolve::{resolve, FaceReading, D4_FLATNESS_EPS};
