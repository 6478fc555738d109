//! Registration configuration.
//!
//! All calibration constants of the scan are exposed here with defaults
//! matching the frame hardware; change them only for a different marker set
//! or scanner protocol.

use std::path::Path;

use fidframe_core::frame::FrameGeometry;

const DEFAULT_RESCALE_INTERCEPT: i32 = -1024;
const DEFAULT_CANDIDATE_THRESHOLD: i32 = 3300;
const DEFAULT_DIAGONAL_TOLERANCE_VOX: f64 = 30.0;
const DEFAULT_MIN_SUPPORT_VOXELS: usize = 50;

/// Tunable constants of the fiducial scan plus the frame geometry.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistrationConfig {
    /// CT rescale intercept. Combined with `0xff` into the bitwise
    /// candidate mask applied to raw samples (`-769` at the default,
    /// clearing bits 8 and 9).
    pub rescale_intercept: i32,
    /// A voxel is a marker candidate when its masked intensity exceeds
    /// this value.
    pub candidate_threshold: i32,
    /// Half-width of the accepted band around each quadrant diagonal, in
    /// voxel-index units (equal to mm at 1 mm spacing).
    pub diagonal_tolerance_vox: f64,
    /// Minimum voxels per slot for a detection to count as reliable.
    pub min_support_voxels: usize,
    /// Known fiducial positions of the frame.
    pub frame: FrameGeometry,
}

impl RegistrationConfig {
    /// Check value ranges and the embedded frame geometry.
    pub fn validate(&self) -> Result<(), String> {
        if !self.diagonal_tolerance_vox.is_finite() || self.diagonal_tolerance_vox <= 0.0 {
            return Err("diagonal_tolerance_vox must be finite and > 0".to_string());
        }
        if self.min_support_voxels == 0 {
            return Err("min_support_voxels must be >= 1".to_string());
        }
        self.frame.validate()
    }

    /// Load a configuration from a JSON file and validate it.
    pub fn from_json_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let data = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            rescale_intercept: DEFAULT_RESCALE_INTERCEPT,
            candidate_threshold: DEFAULT_CANDIDATE_THRESHOLD,
            diagonal_tolerance_vox: DEFAULT_DIAGONAL_TOLERANCE_VOX,
            min_support_voxels: DEFAULT_MIN_SUPPORT_VOXELS,
            frame: FrameGeometry::default(),
        }
    }
}
