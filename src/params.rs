use serde::{Deserialize, Serialize};

use crate::SpacingError;

/// Target proportional white area
pub const DEFAULT_AREA: f64 = 400.0;
/// Maximum counter depth, as a percentage of the x-height
pub const DEFAULT_DEPTH: f64 = 12.0;
/// Overshoot added around the reference zone, as a percentage of the x-height
pub const DEFAULT_OVERSHOOT: f64 = 0.0;
/// Vertical sampling step, in font units
pub const DEFAULT_FREQUENCY: f64 = 5.0;

/// The numbers the spacing engine needs from a master
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterParameters {
    pub x_height: f64,
    #[serde(default)]
    pub italic_angle: f64,
    pub units_per_em: f64,
    #[serde(rename = "paramArea", default = "default_area")]
    pub area: f64,
    #[serde(rename = "paramDepth", default = "default_depth")]
    pub depth: f64,
    #[serde(rename = "paramOver", default)]
    pub overshoot: f64,
    #[serde(rename = "paramFreq", default = "default_frequency")]
    pub frequency: f64,
}

fn default_area() -> f64 {
    DEFAULT_AREA
}

fn default_depth() -> f64 {
    DEFAULT_DEPTH
}

fn default_frequency() -> f64 {
    DEFAULT_FREQUENCY
}

impl MasterParameters {
    /// Parameters with the stock area, depth, overshoot and frequency
    pub fn new(x_height: f64, italic_angle: f64, units_per_em: f64) -> Self {
        MasterParameters {
            x_height,
            italic_angle,
            units_per_em,
            area: DEFAULT_AREA,
            depth: DEFAULT_DEPTH,
            overshoot: DEFAULT_OVERSHOOT,
            frequency: DEFAULT_FREQUENCY,
        }
    }

    /// Maximum counter depth in font units
    pub fn depth_units(&self) -> f64 {
        self.x_height * self.depth / 100.0
    }

    /// Overshoot in font units
    pub fn overshoot_units(&self) -> f64 {
        self.x_height * self.overshoot / 100.0
    }

    /// Check that every value can be fed to the engine
    pub fn validate(&self) -> Result<(), SpacingError> {
        fn positive(name: &'static str, value: f64) -> Result<(), SpacingError> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(SpacingError::InvalidParameter {
                    name,
                    reason: format!("must be a positive number, got {value}"),
                })
            }
        }
        fn non_negative(name: &'static str, value: f64) -> Result<(), SpacingError> {
            if value.is_finite() && value >= 0.0 {
                Ok(())
            } else {
                Err(SpacingError::InvalidParameter {
                    name,
                    reason: format!("must be zero or more, got {value}"),
                })
            }
        }
        positive("xHeight", self.x_height)?;
        positive("unitsPerEm", self.units_per_em)?;
        positive("paramFreq", self.frequency)?;
        non_negative("paramArea", self.area)?;
        non_negative("paramDepth", self.depth)?;
        if !self.overshoot.is_finite() {
            return Err(SpacingError::InvalidParameter {
                name: "paramOver",
                reason: format!("must be finite, got {}", self.overshoot),
            });
        }
        if !self.italic_angle.is_finite() || self.italic_angle.abs() >= 90.0 {
            return Err(SpacingError::InvalidParameter {
                name: "italicAngle",
                reason: format!("must be between -90 and 90 degrees, got {}", self.italic_angle),
            });
        }
        Ok(())
    }
}
