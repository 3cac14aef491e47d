//! Face-value resolution from a settled die's orientation
//!
//! Given the final world orientation of a die body, these functions decide
//! which face it is resting on and how flat that rest is. Everything here is
//! pure and deterministic: identical inputs always produce identical
//! readings, which is what makes the settle logic testable.

use nalgebra::{Point3, UnitQuaternion, Vector3};

use crate::faces::{d4_face_normals, DieType, D6_FACES};

/// Vertical spread below which the three lowest vertices of a four-sided die
/// count as a flat resting face
pub const D4_FLATNESS_EPS: f32 = 0.05;

/// The outcome of reading a settled die
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceReading {
    /// Face value shown by the die
    pub value: i32,
    /// How flat the rest is: 1.0 is perfectly flat, lower is canted
    pub alignment: f32,
}

/// Read the resting face off a die's world orientation
///
/// For four-sided dice the collider vertices (in the die's local frame)
/// select the preferred vertex-based method; without them the normal-based
/// fallback is used. Six-sided dice ignore the vertices.
pub fn resolve(
    die_type: DieType,
    orientation: &UnitQuaternion<f32>,
    collider_vertices: Option<&[Point3<f32>]>,
) -> FaceReading {
    match die_type {
        DieType::D6 => resolve_d6(orientation),
        DieType::D4 => match collider_vertices {
            Some(vertices) if vertices.len() >= 4 => resolve_d4_vertices(orientation, vertices),
            _ => resolve_d4_normals(orientation),
        },
    }
}

/// Cube dice: the face whose world axis points most upward wins
fn resolve_d6(orientation: &UnitQuaternion<f32>) -> FaceReading {
    let mut best_value = 0;
    let mut best_dot = f32::MIN;
    for (axis, value) in D6_FACES {
        let world = orientation * Vector3::from(axis);
        if world.y > best_dot {
            best_dot = world.y;
            best_value = value;
        }
    }
    FaceReading {
        value: best_value,
        alignment: best_dot.clamp(0.0, 1.0),
    }
}

/// Four-sided dice, normal-based fallback: a tetrahedron shows the face it
/// rests ON, so the winning canonical direction is the one pointing most
/// toward world-down
fn resolve_d4_normals(orientation: &UnitQuaternion<f32>) -> FaceReading {
    let mut best_value = 0;
    let mut best_dot = f32::MIN;
    for (i, normal) in d4_face_normals().iter().enumerate() {
        let world = orientation * normal;
        let down = -world.y;
        if down > best_dot {
            best_dot = down;
            best_value = (i + 1) as i32;
        }
    }
    FaceReading {
        value: best_value,
        alignment: best_dot.clamp(0.0, 1.0),
    }
}

/// Four-sided dice, vertex-based: the three lowest world-space vertices are
/// the presumed resting face; the single highest vertex identifies which
/// face that is via its local position
fn resolve_d4_vertices(orientation: &UnitQuaternion<f32>, vertices: &[Point3<f32>]) -> FaceReading {
    let mut heights: Vec<(f32, usize)> = vertices
        .iter()
        .enumerate()
        .map(|(i, p)| ((orientation * p.coords).y, i))
        .collect();
    heights.sort_by(|a, b| a.0.total_cmp(&b.0));

    // Binary flatness: either the bottom three vertices form a level face or
    // the die is treated as fully canted
    let spread = heights[2].0 - heights[0].0;
    let alignment = if spread < D4_FLATNESS_EPS { 1.0 } else { 0.0 };

    let apex_index = heights[heights.len() - 1].1;
    let apex_dir = vertices[apex_index].coords.normalize();
    let mut best_value = 0;
    let mut best_dot = f32::MIN;
    for (i, normal) in d4_face_normals().iter().enumerate() {
        let d = normal.dot(&apex_dir);
        if d > best_dot {
            best_dot = d;
            best_value = (i + 1) as i32;
        }
    }
    FaceReading {
        value: best_value,
        alignment,
    }
}
