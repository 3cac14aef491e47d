//! Roll request and result types
//!
//! A roll request is a list of [`DiceGroup`]s; the engine answers with one
//! [`DiceRollResult`] carrying an entry for every requested group id.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub use dicebox_geom::DieType;

/// RGBA tint applied to a die's visual
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tint {
    /// Color as RGBA (each component 0.0-1.0)
    pub rgba: [f32; 4],
}

impl Default for Tint {
    fn default() -> Self {
        Self::WHITE
    }
}

impl Tint {
    /// Create a new tint with the given RGBA color
    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { rgba: [r, g, b, a] }
    }

    /// Create a new opaque tint with the given RGB color
    pub fn from_rgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(r, g, b, 1.0)
    }

    /// White tint
    pub const WHITE: Self = Self {
        rgba: [1.0, 1.0, 1.0, 1.0],
    };

    /// Ivory tint
    pub const IVORY: Self = Self {
        rgba: [1.0, 1.0, 0.9, 1.0],
    };

    /// Red tint
    pub const RED: Self = Self {
        rgba: [0.9, 0.15, 0.15, 1.0],
    };

    /// Blue tint
    pub const BLUE: Self = Self {
        rgba: [0.2, 0.35, 0.95, 1.0],
    };

    /// Green tint
    pub const GREEN: Self = Self {
        rgba: [0.15, 0.8, 0.3, 1.0],
    };
}

/// How a group's individual die values are turned into its result list
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultProcessing {
    /// Collapse the group to a single summed value
    Sum,
    /// Keep one value per die, in spawn order
    IndividualValues,
}

/// One named group of identical dice within a roll request
///
/// Immutable once submitted; the group id must be unique within a request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DiceGroup {
    /// Identifier the group's results are keyed by
    pub group_id: String,
    /// Number of dice in the group
    pub dice: u32,
    /// Kind of die rolled by every member of the group
    pub die_type: DieType,
    /// Linear scale factor applied to the die model and collider
    pub scale: f32,
    /// Visual tint shared by the group
    pub tint: Tint,
    /// How the group's values are aggregated
    pub processing: ResultProcessing,
}

impl DiceGroup {
    /// Create a group with scale 1.0, white tint, and summed results
    pub fn new(group_id: impl Into<String>, dice: u32, die_type: DieType) -> Self {
        Self {
            group_id: group_id.into(),
            dice,
            die_type,
            scale: 1.0,
            tint: Tint::WHITE,
            processing: ResultProcessing::Sum,
        }
    }

    /// Set the die scale
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    /// Set the group tint
    pub fn with_tint(mut self, tint: Tint) -> Self {
        self.tint = tint;
        self
    }

    /// Set how the group's values are aggregated
    pub fn with_processing(mut self, processing: ResultProcessing) -> Self {
        self.processing = processing;
        self
    }
}

/// The final outcome of a roll, grouped by group id
///
/// Built once when the roll completes and immutable afterwards. Contains
/// exactly one entry per requested group: a single summed value for
/// [`ResultProcessing::Sum`] groups, one value per die otherwise.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DiceRollResult {
    /// Resolved values keyed by group id
    pub results_by_group: HashMap<String, Vec<i32>>,
}

impl DiceRollResult {
    /// Values for one group, if it was part of the request
    pub fn group(&self, group_id: &str) -> Option<&[i32]> {
        self.results_by_group.get(group_id).map(Vec::as_slice)
    }

    /// Number of groups in the result
    pub fn group_count(&self) -> usize {
        self.results_by_group.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_builder_defaults() {
        let group = DiceGroup::new("dmg", 2, DieType::D6);
        assert_eq!(group.group_id, "dmg");
        assert_eq!(group.dice, 2);
        assert_eq!(group.scale, 1.0);
        assert_eq!(group.processing, ResultProcessing::Sum);
    }

    #[test]
    fn test_group_builder_methods() {
        let group = DiceGroup::new("crit", 3, DieType::D4)
            .with_scale(1.5)
            .with_tint(Tint::RED)
            .with_processing(ResultProcessing::IndividualValues);
        assert_eq!(group.scale, 1.5);
        assert_eq!(group.tint, Tint::RED);
        assert_eq!(group.processing, ResultProcessing::IndividualValues);
    }

    #[test]
    fn test_tint_constants_opaque() {
        for tint in [Tint::WHITE, Tint::IVORY, Tint::RED, Tint::BLUE, Tint::GREEN] {
            assert_eq!(tint.rgba[3], 1.0);
        }
    }

    #[test]
    fn test_result_lookup() {
        let mut result = DiceRollResult::default();
        result
            .results_by_group
            .insert("dmg".to_string(), vec![8]);
        assert_eq!(result.group("dmg"), Some(&[8][..]));
        assert_eq!(result.group("other"), None);
        assert_eq!(result.group_count(), 1);
    }
}
