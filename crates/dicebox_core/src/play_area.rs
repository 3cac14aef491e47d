//! Play-area sizing tiers
//!
//! The visible table grows with the number of dice in flight so big rolls do
//! not pile up: a small roll plays tight, a medium roll zooms out a step,
//! anything larger gets the widest rectangle.

use serde::{Deserialize, Serialize};

/// One sizing tier: the largest roll it covers and the rectangle it maps to
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ZoomTier {
    /// Largest total die count this tier covers
    pub max_dice: u32,
    /// Play rectangle width at this tier
    pub width: f32,
    /// Play rectangle depth at this tier
    pub depth: f32,
}

/// The tier table plus the fallback rectangle for oversized rolls
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlayAreaConfig {
    /// Tiers in ascending `max_dice` order
    pub tiers: Vec<ZoomTier>,
    /// Rectangle width used when no tier covers the roll
    pub wide_width: f32,
    /// Rectangle depth used when no tier covers the roll
    pub wide_depth: f32,
}

impl Default for PlayAreaConfig {
    fn default() -> Self {
        Self {
            tiers: vec![
                ZoomTier {
                    max_dice: 8,
                    width: 10.0,
                    depth: 10.0,
                },
                ZoomTier {
                    max_dice: 20,
                    width: 14.0,
                    depth: 14.0,
                },
            ],
            wide_width: 18.0,
            wide_depth: 18.0,
        }
    }
}

impl PlayAreaConfig {
    /// Rectangle (width, depth) for a roll of `dice` total dice
    pub fn extents_for(&self, dice: u32) -> (f32, f32) {
        for tier in &self.tiers {
            if dice <= tier.max_dice {
                return (tier.width, tier.depth);
            }
        }
        (self.wide_width, self.wide_depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_selection() {
        let config = PlayAreaConfig::default();
        assert_eq!(config.extents_for(1), (10.0, 10.0));
        assert_eq!(config.extents_for(8), (10.0, 10.0));
        assert_eq!(config.extents_for(9), (14.0, 14.0));
        assert_eq!(config.extents_for(20), (14.0, 14.0));
        assert_eq!(config.extents_for(21), (18.0, 18.0));
        assert_eq!(config.extents_for(100), (18.0, 18.0));
    }

    #[test]
    fn test_empty_tier_table_uses_wide() {
        let config = PlayAreaConfig {
            tiers: Vec::new(),
            wide_width: 12.0,
            wide_depth: 9.0,
        };
        assert_eq!(config.extents_for(1), (12.0, 9.0));
    }
}
