//! Group configuration.
//!
//! Every field has a default, so a host may pass a partial JSON object and
//! only override what it cares about. Values are checked by [`GroupConfig::validate`]
//! before a group is built from them.

use serde::{Deserialize, Serialize};

use crate::gesture::SpanMetric;
use crate::transform::{AnchorMode, ZoomPolicy};
use crate::ViewError;

/// Default half side of a surface in pixels. The backing buffer is twice this.
pub const DEFAULT_VIEWPORT_SIZE: u32 = 150;
/// Wheel zoom base: one unit of `deltaY` zooms by `1 / rate`.
pub const DEFAULT_ZOOM_RATE: f64 = 1.001;
pub const DEFAULT_MIN_MAGNIFICATION: f64 = 1e-4;
pub const DEFAULT_MAX_MAGNIFICATION: f64 = 1e4;

/// Configuration shared by every surface in a group.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupConfig {
    /// Half side of each surface in pixels (backing buffer is `2 * viewport_size` square)
    pub viewport_size: u32,
    /// Wheel zoom base, must be greater than 1
    pub zoom_rate: f64,
    /// Smallest magnification a zoom step may reach
    pub min_magnification: f64,
    /// Largest magnification a zoom step may reach
    pub max_magnification: f64,
    /// Distance formula used for pinch spans
    pub span_metric: SpanMetric,
    /// Pan correction rule for anchored zoom steps
    pub anchor_mode: AnchorMode,
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self {
            viewport_size: DEFAULT_VIEWPORT_SIZE,
            zoom_rate: DEFAULT_ZOOM_RATE,
            min_magnification: DEFAULT_MIN_MAGNIFICATION,
            max_magnification: DEFAULT_MAX_MAGNIFICATION,
            span_metric: SpanMetric::default(),
            anchor_mode: AnchorMode::default(),
        }
    }
}

impl GroupConfig {
    pub fn with_viewport_size(viewport_size: u32) -> Self {
        Self {
            viewport_size,
            ..Self::default()
        }
    }

    /// Parse a JSON object and validate the result.
    pub fn from_json(json: &str) -> Result<Self, ViewError> {
        let config: GroupConfig =
            serde_json::from_str(json).map_err(|e| ViewError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Wheel zoom rate derived from a base-10 sensitivity exponent: `1 + 10^exponent`.
    ///
    /// An exponent of -3.5 gives a rate of about 1.000316.
    pub fn zoom_rate_from_sensitivity(exponent: f64) -> f64 {
        1.0 + 10f64.powf(exponent)
    }

    pub fn zoom_policy(&self) -> ZoomPolicy {
        ZoomPolicy {
            min_magnification: self.min_magnification,
            max_magnification: self.max_magnification,
            anchor: self.anchor_mode,
        }
    }

    pub fn validate(&self) -> Result<(), ViewError> {
        if self.viewport_size == 0 {
            return Err(ViewError::InvalidConfig(
                "viewport_size must be positive".to_string(),
            ));
        }
        validate_zoom_rate(self.zoom_rate)?;
        let (min, max) = (self.min_magnification, self.max_magnification);
        if !(min.is_finite() && max.is_finite() && min > 0.0 && min <= max) {
            return Err(ViewError::InvalidConfig(format!(
                "magnification bounds must satisfy 0 < min <= max (got {min}..{max})"
            )));
        }
        Ok(())
    }
}

pub(crate) fn validate_zoom_rate(rate: f64) -> Result<(), ViewError> {
    if rate.is_finite() && rate > 1.0 {
        Ok(())
    } else {
        Err(ViewError::InvalidConfig(format!(
            "zoom_rate must be a finite value greater than 1 (got {rate})"
        )))
    }
}
