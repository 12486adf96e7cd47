//! Tunable thresholds for every pipeline stage.
//!
//! Defaults reproduce the hand-tuned constants of the camera app this
//! pipeline was built for, including the truncated aspect ratios.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Exact short-side aspect ratio (17/6). The tuned default truncates it to 2.
pub const UNTRUNCATED_SHORT_ASPECT: f64 = 17.0 / 6.0;
/// Exact long-side aspect ratio (23/6). The tuned default truncates it to 3.
pub const UNTRUNCATED_LONG_ASPECT: f64 = 23.0 / 6.0;

/// Full pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Gaussian kernel side length (odd)
    pub blur_kernel: u32,

    /// Single-shape acceptance band
    pub shape: EyeShapeConfig,

    /// Two-shape pairing heuristics
    pub pairing: PairingConfig,

    /// Placement of the sprite relative to a pair
    pub overlay: OverlayConfig,

    /// Debug stage cycling
    pub schedule: ScheduleConfig,

    /// Debug drawing
    pub annotation: AnnotationConfig,
}

/// Geometric band a single eye outline must fall into
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EyeShapeConfig {
    pub min_width: f64,
    pub max_width: f64,
    pub short_aspect: f64,
    pub long_aspect: f64,
    /// Aspect band is `[long_aspect * tolerance, long_aspect / tolerance]`
    pub tolerance: f64,
    /// Factor applied to loosen all bounds while visualizing raw candidates
    pub relax_factor: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PairingConfig {
    /// Largest allowed width (and height) ratio between the two boxes
    pub max_size_ratio: f64,
    /// Largest allowed angle difference in degrees
    pub max_angle_delta: f64,
    /// Expected centroid distance in multiples of the first box's short side
    pub spacing_factor: f64,
    pub distance_tolerance: f64,
    /// Largest far/near corner distance ratio
    pub max_symmetry_ratio: f64,
    /// Collapse (i, j) and (j, i) into one unordered pair
    pub dedup: bool,
}

/// Destination triangle coefficients, in multiples of the pair's extent
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Length of one schedule step in milliseconds
    pub step_ms: u64,
    /// End of the final stage, in steps since the epoch
    pub final_stage_end_steps: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationConfig {
    pub enabled: bool,
    pub label_anchor: (i32, i32),
    pub label_scale: f32,
    pub eye_color: [u8; 3],
    pub draw_size_guides: bool,
    pub guide_anchor: (i32, i32),
    pub guide_color: [u8; 3],
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            blur_kernel: 7,
            shape: EyeShapeConfig::default(),
            pairing: PairingConfig::default(),
            overlay: OverlayConfig::default(),
            schedule: ScheduleConfig::default(),
            annotation: AnnotationConfig::default(),
        }
    }
}

impl Default for EyeShapeConfig {
    fn default() -> Self {
        Self {
            min_width: 10.0,
            max_width: 40.0,
            short_aspect: 2.0,
            long_aspect: 3.0,
            tolerance: 0.7,
            relax_factor: 0.8,
        }
    }
}

impl EyeShapeConfig {
    /// Same band with the exact 17/6 and 23/6 ratios
    pub fn untruncated() -> Self {
        Self {
            short_aspect: UNTRUNCATED_SHORT_ASPECT,
            long_aspect: UNTRUNCATED_LONG_ASPECT,
            ..Self::default()
        }
    }

    pub fn min_height(&self) -> f64 {
        self.short_aspect * self.min_width
    }

    pub fn max_height(&self) -> f64 {
        self.long_aspect * self.max_width
    }
}

impl Default for PairingConfig {
    fn default() -> Self {
        Self {
            max_size_ratio: 1.4,
            max_angle_delta: 3.0,
            spacing_factor: 5.0,
            distance_tolerance: 0.7,
            max_symmetry_ratio: 1.3,
            dedup: true,
        }
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            left: 1.5,
            top: 2.3,
            right: 1.8,
            bottom: 3.4,
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            step_ms: 3000,
            final_stage_end_steps: 80,
        }
    }
}

impl ScheduleConfig {
    pub fn step(&self) -> Duration {
        Duration::from_millis(self.step_ms)
    }
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            label_anchor: (140, 140),
            label_scale: 64.0,
            eye_color: [255, 0, 0],
            draw_size_guides: true,
            guide_anchor: (500, 500),
            guide_color: [0, 255, 0],
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a JSON file. Missing fields keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.blur_kernel == 0 || self.blur_kernel % 2 == 0 {
            return Err(Error::Config(format!(
                "blur_kernel must be odd, got {}",
                self.blur_kernel
            )));
        }
        if self.shape.tolerance <= 0.0 || self.shape.relax_factor <= 0.0 {
            return Err(Error::Config(
                "shape tolerance and relax_factor must be positive".to_string(),
            ));
        }
        if self.pairing.distance_tolerance <= 0.0 {
            return Err(Error::Config(
                "pairing distance_tolerance must be positive".to_string(),
            ));
        }
        if self.schedule.step_ms == 0 || self.schedule.final_stage_end_steps < 6 {
            return Err(Error::Config(format!(
                "schedule needs a non-zero step and at least 6 steps, got {}ms x {}",
                self.schedule.step_ms, self.schedule.final_stage_end_steps
            )));
        }
        Ok(())
    }
}
