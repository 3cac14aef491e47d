//! Lazy cache of die collision shapes
//!
//! Hull construction is not free, so shapes are built once per
//! (die type, scale) pair and kept for the life of the process. The key
//! space is a handful of discrete scale tiers per die type, so the cache is
//! never evicted.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use nalgebra::Point3;

use dicebox_geom::{bevelled_cube_points, bevelled_hull_points, DieType};
use dicebox_physics::SharedShape;
use serde::{Deserialize, Serialize};

/// Geometry and mass parameters used when building shapes
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ShapeConfig {
    /// Half size of the cube die at scale 1.0
    pub cube_half_size: f32,
    /// Corner inset of the cube die, as a fraction of the half size
    pub cube_bevel_fraction: f32,
    /// Edge interpolation ratio for vertex-supplied dice
    pub tetra_bevel_ratio: f32,
    /// Die mass at scale 1.0; scaled by the cube of the linear scale
    pub base_mass: f32,
}

impl Default for ShapeConfig {
    fn default() -> Self {
        Self {
            cube_half_size: 0.5,
            cube_bevel_fraction: 0.25,
            tetra_bevel_ratio: 0.15,
            base_mass: 1.0,
        }
    }
}

/// Error type for shape construction
#[derive(Debug)]
pub enum ShapeError {
    /// A die type requiring model vertices was requested without any
    MissingVertices(DieType),
    /// The point cloud did not produce a usable convex hull
    DegenerateHull(DieType),
}

impl fmt::Display for ShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShapeError::MissingVertices(die_type) => {
                write!(f, "{die_type:?} collider requires model vertices")
            }
            ShapeError::DegenerateHull(die_type) => {
                write!(f, "{die_type:?} point cloud has no volume")
            }
        }
    }
}

impl std::error::Error for ShapeError {}

/// A cached collision shape with its mass and object-space hull points
pub struct ShapeCacheEntry {
    /// The convex hull collider
    pub shape: SharedShape,
    /// Mass after volume scaling; inertia derives from the hull at this mass
    pub mass: f32,
    /// The bevelled point cloud the hull was built from, in object space
    pub vertices: Arc<Vec<Point3<f32>>>,
}

/// Cache key: the die type plus the exact bits of the scale factor
///
/// Scales come from a small set of discrete tiers, so bit-exact matching is
/// the right equality; no epsilon bucketing is wanted here.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct ShapeKey {
    die_type: DieType,
    scale_bits: u32,
}

/// Lazily built, never-evicted store of die collision shapes
pub struct DieShapeCache {
    config: ShapeConfig,
    entries: HashMap<ShapeKey, ShapeCacheEntry>,
}

impl Default for DieShapeCache {
    fn default() -> Self {
        Self::new(ShapeConfig::default())
    }
}

impl DieShapeCache {
    /// Create an empty cache with the given build parameters
    pub fn new(config: ShapeConfig) -> Self {
        Self {
            config,
            entries: HashMap::new(),
        }
    }

    /// Build the shape for (die type, scale) unless it is already cached
    ///
    /// The first call for a key constructs the hull; later calls return the
    /// same entry untouched. D4 shapes require externally supplied model
    /// vertices; requesting one without them is a caller bug and comes back
    /// as [`ShapeError::MissingVertices`].
    pub fn ensure_shape(
        &mut self,
        die_type: DieType,
        scale: f32,
        model_vertices: Option<&[Point3<f32>]>,
    ) -> Result<&ShapeCacheEntry, ShapeError> {
        let key = ShapeKey {
            die_type,
            scale_bits: scale.to_bits(),
        };
        if !self.entries.contains_key(&key) {
            let entry = Self::build(&self.config, die_type, scale, model_vertices)?;
            log::debug!(
                "built {:?} collider at scale {} ({} hull points, mass {:.3})",
                die_type,
                scale,
                entry.vertices.len(),
                entry.mass
            );
            self.entries.insert(key, entry);
        }
        Ok(&self.entries[&key])
    }

    /// Look up an already-built entry without constructing anything
    pub fn get(&self, die_type: DieType, scale: f32) -> Option<&ShapeCacheEntry> {
        self.entries.get(&ShapeKey {
            die_type,
            scale_bits: scale.to_bits(),
        })
    }

    /// Number of shapes built so far
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no shapes have been built yet
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn build(
        config: &ShapeConfig,
        die_type: DieType,
        scale: f32,
        model_vertices: Option<&[Point3<f32>]>,
    ) -> Result<ShapeCacheEntry, ShapeError> {
        let points: Vec<Point3<f32>> = match die_type {
            DieType::D6 => {
                bevelled_cube_points(config.cube_half_size * scale, config.cube_bevel_fraction)
            }
            DieType::D4 => {
                let model =
                    model_vertices.ok_or(ShapeError::MissingVertices(die_type))?;
                if model.is_empty() {
                    return Err(ShapeError::MissingVertices(die_type));
                }
                bevelled_hull_points(model, config.tetra_bevel_ratio)
                    .into_iter()
                    .map(|p| Point3::from(p.coords * scale))
                    .collect()
            }
        };
        let shape =
            SharedShape::convex_hull(&points).ok_or(ShapeError::DegenerateHull(die_type))?;
        let mass = config.base_mass * scale * scale * scale;
        Ok(ShapeCacheEntry {
            shape,
            mass,
            vertices: Arc::new(points),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dicebox_geom::d4_canonical_vertices;

    #[test]
    fn test_d6_shape_builds_without_vertices() {
        let mut cache = DieShapeCache::default();
        let entry = cache
            .ensure_shape(DieType::D6, 1.0, None)
            .expect("cube shape builds analytically");
        assert_eq!(entry.vertices.len(), 24);
        assert!((entry.mass - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_d4_shape_requires_vertices() {
        let mut cache = DieShapeCache::default();
        let err = cache.ensure_shape(DieType::D4, 1.0, None);
        assert!(matches!(err, Err(ShapeError::MissingVertices(DieType::D4))));

        let err = cache.ensure_shape(DieType::D4, 1.0, Some(&[]));
        assert!(matches!(err, Err(ShapeError::MissingVertices(DieType::D4))));
    }

    #[test]
    fn test_d4_shape_builds_with_vertices() {
        let mut cache = DieShapeCache::default();
        let model = d4_canonical_vertices();
        let entry = cache
            .ensure_shape(DieType::D4, 1.0, Some(&model))
            .expect("tetra shape builds from model vertices");
        assert_eq!(entry.vertices.len(), 12);
    }

    #[test]
    fn test_ensure_shape_is_idempotent() {
        let mut cache = DieShapeCache::default();
        let first_vertices = cache
            .ensure_shape(DieType::D6, 1.0, None)
            .expect("builds")
            .vertices
            .clone();
        let second = cache.ensure_shape(DieType::D6, 1.0, None).expect("cached");
        // Same entry, not a rebuilt copy
        assert!(Arc::ptr_eq(&first_vertices, &second.vertices));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_distinct_scales_get_distinct_entries() {
        let mut cache = DieShapeCache::default();
        cache.ensure_shape(DieType::D6, 1.0, None).expect("builds");
        cache.ensure_shape(DieType::D6, 1.5, None).expect("builds");
        assert_eq!(cache.len(), 2);
        assert!(cache.get(DieType::D6, 1.0).is_some());
        assert!(cache.get(DieType::D6, 1.5).is_some());
        assert!(cache.get(DieType::D6, 2.0).is_none());
    }

    #[test]
    fn test_mass_scales_with_volume() {
        let mut cache = DieShapeCache::default();
        let small = cache
            .ensure_shape(DieType::D6, 1.0, None)
            .expect("builds")
            .mass;
        let big = cache
            .ensure_shape(DieType::D6, 2.0, None)
            .expect("builds")
            .mass;
        assert!((big - small * 8.0).abs() < 1e-5);
    }

    #[test]
    fn test_scaled_d6_points_scale_linearly() {
        let mut cache = DieShapeCache::default();
        let entry = cache
            .ensure_shape(DieType::D6, 2.0, None)
            .expect("builds");
        let max_coord = entry
            .vertices
            .iter()
            .map(|p| p.x.abs().max(p.y.abs()).max(p.z.abs()))
            .fold(0.0f32, f32::max);
        assert!((max_coord - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_error_display() {
        let err = ShapeError::MissingVertices(DieType::D4);
        assert!(format!("{err}").contains("requires model vertices"));
    }
}
