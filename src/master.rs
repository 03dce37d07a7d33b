use serde::{Deserialize, Serialize};

use crate::{
    params::{MasterParameters, DEFAULT_AREA, DEFAULT_DEPTH, DEFAULT_FREQUENCY, DEFAULT_OVERSHOOT},
    rules::RuleOverrides,
};

/// Spacing parameters a master may set for itself
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomParameters {
    #[serde(rename = "paramArea", default, skip_serializing_if = "Option::is_none")]
    pub area: Option<f64>,
    #[serde(rename = "paramDepth", default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<f64>,
    #[serde(rename = "paramOver", default, skip_serializing_if = "Option::is_none")]
    pub overshoot: Option<f64>,
    #[serde(rename = "paramFreq", default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<f64>,
}

impl CustomParameters {
    pub fn is_empty(&self) -> bool {
        *self == CustomParameters::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Master {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub x_height: f64,
    #[serde(default)]
    pub italic_angle: f64,
    #[serde(default, skip_serializing_if = "CustomParameters::is_empty")]
    pub custom_parameters: CustomParameters,
    /// Factors replacing those of the font's rules for this master only
    #[serde(default, skip_serializing_if = "RuleOverrides::is_empty")]
    pub rule_overrides: RuleOverrides,
}

impl Master {
    pub fn new<T, U>(name: T, id: U, x_height: f64) -> Self
    where
        T: Into<String>,
        U: Into<String>,
    {
        Master {
            name: name.into(),
            id: id.into(),
            x_height,
            ..Default::default()
        }
    }

    /// Spacing parameters for this master, filling unset ones with defaults
    pub fn parameters(&self, upm: u16) -> MasterParameters {
        let pick = |name: &str, custom: Option<f64>, default: f64| match custom {
            Some(value) => {
                log::info!("{}: using master custom parameter {}: {}", self.id, name, value);
                value
            }
            None => {
                log::info!("{}: using default parameter {}: {}", self.id, name, default);
                default
            }
        };
        let custom = &self.custom_parameters;
        MasterParameters {
            x_height: self.x_height,
            italic_angle: self.italic_angle,
            units_per_em: f64::from(upm),
            area: pick("paramArea", custom.area, DEFAULT_AREA),
            depth: pick("paramDepth", custom.depth, DEFAULT_DEPTH),
            overshoot: pick("paramOver", custom.overshoot, DEFAULT_OVERSHOOT),
            frequency: pick("paramFreq", custom.frequency, DEFAULT_FREQUENCY),
        }
    }
}
