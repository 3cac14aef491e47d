//! Bevelled collider point clouds
//!
//! Dice colliders are convex hulls of bevelled point sets rather than exact
//! polyhedra. A perfect cube can come to rest balanced on an edge and a
//! perfect tetrahedron tumbles stiffly; chamfering the corners and edges
//! before hull construction makes every landing tip onto a face.

use nalgebra::Point3;

/// Generate the point cloud for a bevelled cube die
///
/// Each of the 8 cube corners contributes three points, one pulled inward
/// along each axis by `bevel_fraction` of the half size. The convex hull of
/// the resulting 24 points is a cube with chamfered corners and edges.
pub fn bevelled_cube_points(half_size: f32, bevel_fraction: f32) -> Vec<Point3<f32>> {
    let inset = half_size * bevel_fraction;
    let mut points = Vec::with_capacity(24);
    for &sx in &[-1.0f32, 1.0] {
        for &sy in &[-1.0f32, 1.0] {
            for &sz in &[-1.0f32, 1.0] {
                let (cx, cy, cz) = (sx * half_size, sy * half_size, sz * half_size);
                points.push(Point3::new(cx - sx * inset, cy, cz));
                points.push(Point3::new(cx, cy - sy * inset, cz));
                points.push(Point3::new(cx, cy, cz - sz * inset));
            }
        }
    }
    points
}

/// Bevel an arbitrary convex vertex set by edge interpolation
///
/// For every ordered pair (i, j) of distinct corners, the point interpolated
/// from corner `i` toward corner `j` by `bevel_ratio` is inserted. The
/// original corners are not kept, so every edge is rounded, not just the
/// corners. Input and output are deduplicated by exact coordinate match;
/// mesh vertex data commonly repeats corners once per adjacent face.
pub fn bevelled_hull_points(vertices: &[Point3<f32>], bevel_ratio: f32) -> Vec<Point3<f32>> {
    let corners = dedup_exact(vertices);
    let mut points = Vec::with_capacity(corners.len() * corners.len());
    for (i, a) in corners.iter().enumerate() {
        for (j, b) in corners.iter().enumerate() {
            if i == j {
                continue;
            }
            points.push(Point3::from(a.coords + (b.coords - a.coords) * bevel_ratio));
        }
    }
    dedup_exact(&points)
}

/// Remove duplicate points, comparing coordinates bit-for-bit
fn dedup_exact(points: &[Point3<f32>]) -> Vec<Point3<f32>> {
    let mut out: Vec<Point3<f32>> = Vec::with_capacity(points.len());
    for p in points {
        let seen = out.iter().any(|q| {
            q.x.to_bits() == p.x.to_bits()
                && q.y.to_bits() == p.y.to_bits()
                && q.z.to_bits() == p.z.to_bits()
        });
        if !seen {
            out.push(*p);
        }
    }
    out
}
