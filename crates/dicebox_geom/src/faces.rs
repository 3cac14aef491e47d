//! Canonical face tables for the supported die types
//!
//! Face values are a property of the die model, not of any particular roll:
//! a cube die always carries Up=6/Down=1/Right=3/Left=4/Back=5/Front=2
//! (opposite faces sum to 7, the standard die convention), and a four-sided
//! die derives its face directions from the canonical regular tetrahedron.

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// The kinds of dice the engine can simulate
///
/// The type selects both the collider geometry and the face-resolution
/// algorithm used once the die has settled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DieType {
    /// Four-sided die (tetrahedron, read from the face it rests on)
    D4,
    /// Six-sided die (cube, read from the face pointing up)
    D6,
}

impl DieType {
    /// Number of faces on this die type
    pub fn face_count(self) -> u32 {
        match self {
            DieType::D4 => 4,
            DieType::D6 => 6,
        }
    }

    /// Largest value this die can show
    pub fn max_value(self) -> i32 {
        self.face_count() as i32
    }
}

/// Local face axes of a cube die paired with their pip values
///
/// The axis is the outward face normal in the die's local frame. Opposite
/// entries sum to 7.
pub const D6_FACES: [([f32; 3], i32); 6] = [
    ([0.0, 1.0, 0.0], 6),  // up
    ([0.0, -1.0, 0.0], 1), // down
    ([1.0, 0.0, 0.0], 3),  // right
    ([-1.0, 0.0, 0.0], 4), // left
    ([0.0, 0.0, 1.0], 5),  // back
    ([0.0, 0.0, -1.0], 2), // front
];

/// Vertices of the canonical regular tetrahedron, in face-value order
///
/// Vertex `i` corresponds to face value `i + 1`; the face directions in
/// [`d4_face_normals`] are these vertices normalized.
pub const D4_CANONICAL_VERTICES: [[f32; 3]; 4] = [
    [1.0, 1.0, 1.0],
    [1.0, -1.0, -1.0],
    [-1.0, 1.0, -1.0],
    [-1.0, -1.0, 1.0],
];

/// The canonical tetrahedron vertices as points
pub fn d4_canonical_vertices() -> [Point3<f32>; 4] {
    D4_CANONICAL_VERTICES.map(|v| Point3::new(v[0], v[1], v[2]))
}

/// Canonical face directions of a four-sided die
///
/// Entry `i` carries face value `i + 1`.
pub fn d4_face_normals() -> [Vector3<f32>; 4] {
    D4_CANONICAL_VERTICES.map(|v| Vector3::new(v[0], v[1], v[2]).normalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_face_counts() {
        assert_eq!(DieType::D4.face_count(), 4);
        assert_eq!(DieType::D6.face_count(), 6);
        assert_eq!(DieType::D6.max_value(), 6);
    }

    #[test]
    fn test_d6_opposite_faces_sum_to_seven() {
        for (axis, value) in D6_FACES {
            let opposite = [-axis[0], -axis[1], -axis[2]];
            let (_, opposite_value) = D6_FACES
                .iter()
                .find(|(a, _)| *a == opposite)
                .expect("every face has an opposite");
            assert_eq!(value + opposite_value, 7);
        }
    }

    #[test]
    fn test_d6_axes_are_unit_length() {
        for (axis, _) in D6_FACES {
            let len = (axis[0] * axis[0] + axis[1] * axis[1] + axis[2] * axis[2]).sqrt();
            assert!((len - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_d4_normals_are_unit_length() {
        for n in d4_face_normals() {
            assert!((n.norm() - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_d4_normals_pairwise_angle() {
        // Regular tetrahedron vertex directions meet at acos(-1/3)
        let normals = d4_face_normals();
        for i in 0..4 {
            for j in (i + 1)..4 {
                let d = normals[i].dot(&normals[j]);
                assert!((d - (-1.0 / 3.0)).abs() < 1e-5);
            }
        }
    }
}
