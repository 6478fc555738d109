//! End-to-end frame registration: locate → estimate → apply.

use nalgebra::Matrix3;

use fidframe_core::FiducialSet;
use fidframe_core::centroid::CentroidError;
use fidframe_core::frame::FrameGeometry;
use fidframe_core::orientation::{
    OrientationError, alignment_residuals, estimate_rigid_transform,
};

use crate::apply::apply_transform;
use crate::config::RegistrationConfig;
use crate::finder::locate_fiducials;
use crate::progress::ProgressSink;
use crate::volume::{Volume, physical_center_mm};

/// Progress label reported once the transform has been applied.
pub const READY_STAGE_LABEL: &str = "Ready";

// ── Error type ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum RegistrationError {
    /// The volume boundary cannot support the scan.
    InvalidVolume(String),
    /// The configuration failed validation.
    InvalidConfig(String),
    /// A fiducial slot gathered fewer voxels than the support threshold.
    InsufficientSupport {
        slot: usize,
        count: usize,
        required: usize,
    },
    /// A fiducial slot reached finalization with no accumulated weight.
    DegenerateAccumulation { slot: usize },
    /// The orientation solve failed.
    SvdFailed,
}

impl std::fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidVolume(msg) => write!(f, "invalid volume: {}", msg),
            Self::InvalidConfig(msg) => write!(f, "invalid configuration: {}", msg),
            Self::InsufficientSupport {
                slot,
                count,
                required,
            } => {
                write!(
                    f,
                    "fiducial {} unreliable: only {} voxels, need {}",
                    slot, count, required
                )
            }
            Self::DegenerateAccumulation { slot } => {
                write!(f, "fiducial {} accumulated zero weight", slot)
            }
            Self::SvdFailed => write!(f, "SVD of the correlation matrix failed"),
        }
    }
}

impl std::error::Error for RegistrationError {}

impl From<CentroidError> for RegistrationError {
    fn from(err: CentroidError) -> Self {
        match err {
            CentroidError::InsufficientSupport {
                slot,
                count,
                required,
            } => Self::InsufficientSupport {
                slot,
                count,
                required,
            },
            CentroidError::DegenerateWeight { slot } => Self::DegenerateAccumulation { slot },
        }
    }
}

impl From<OrientationError> for RegistrationError {
    fn from(err: OrientationError) -> Self {
        match err {
            OrientationError::SvdFailed => Self::SvdFailed,
        }
    }
}

// ── Result ───────────────────────────────────────────────────────────────

/// Serializable summary of a successful registration run.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RegistrationResult {
    /// Detected fiducial centroids and their voxel support.
    pub fiducials: FiducialSet,
    /// Rotation matrix rows.
    pub rotation: [[f64; 3]; 3],
    /// Translation to the frame target point, in mm.
    pub translation: [f64; 3],
    /// `det(rotation)` diagnostic; negative means the solve produced a
    /// reflection.
    pub det: f64,
    /// Per-slot alignment residual norms, in mm.
    pub residual_norms_mm: [f64; 4],
}

// ── Pipeline ─────────────────────────────────────────────────────────────

/// Primary registration interface.
///
/// Wraps a [`RegistrationConfig`]. Create once, register many volumes.
///
/// # Examples
///
/// ```no_run
/// use fidframe::{CtVolume, FrameRegistration};
///
/// let registration = FrameRegistration::new();
/// let mut volume = CtVolume::filled([512, 512, 160], [0.9375, 0.9375, 1.0], 0);
/// match registration.register(&mut volume, None) {
///     Ok(result) => println!("rotation determinant {:.3}", result.det),
///     Err(err) => eprintln!("registration failed: {}", err),
/// }
/// ```
pub struct FrameRegistration {
    config: RegistrationConfig,
}

impl FrameRegistration {
    /// Create with the default configuration and frame geometry.
    pub fn new() -> Self {
        Self {
            config: RegistrationConfig::default(),
        }
    }

    /// Create with default scan constants but a custom frame geometry.
    pub fn with_frame(frame: FrameGeometry) -> Self {
        let mut config = RegistrationConfig::default();
        config.frame = frame;
        Self { config }
    }

    /// Create with full configuration control.
    pub fn with_config(config: RegistrationConfig) -> Self {
        Self { config }
    }

    /// Access the current configuration.
    pub fn config(&self) -> &RegistrationConfig {
        &self.config
    }

    /// Mutable access to the configuration for post-construction tuning.
    pub fn config_mut(&mut self) -> &mut RegistrationConfig {
        &mut self.config
    }

    /// Run the full pipeline on a volume: locate the fiducials, estimate the
    /// rigid transform, write the image attributes.
    ///
    /// On any failure the volume is left untouched. After a successful apply
    /// the progress sink receives `("Ready", -1)`.
    pub fn register<V: Volume>(
        &self,
        volume: &mut V,
        mut progress: Option<&mut (dyn ProgressSink + '_)>,
    ) -> Result<RegistrationResult, RegistrationError> {
        let fiducials = locate_fiducials(volume, &self.config, progress.as_deref_mut())?;
        let center = physical_center_mm(volume);
        let transform = estimate_rigid_transform(&fiducials, center, &self.config.frame)?;

        let residuals = alignment_residuals(&transform, &fiducials, &self.config.frame);
        let residual_norms_mm = residual_norms(&residuals);
        let rotation = rotation_rows(&transform.rotation);
        tracing::info!(
            "frame transform: det {:.6}, translation ({:.2}, {:.2}, {:.2}) mm",
            transform.det,
            transform.translation.x,
            transform.translation.y,
            transform.translation.z
        );
        tracing::debug!("rotation rows: {:?}", rotation);
        tracing::debug!("alignment residual norms (mm): {:?}", residual_norms_mm);

        apply_transform(volume, &transform);
        if let Some(sink) = progress.as_deref_mut() {
            sink.percent_done(READY_STAGE_LABEL, -1);
        }

        Ok(RegistrationResult {
            fiducials,
            rotation,
            translation: [
                transform.translation.x,
                transform.translation.y,
                transform.translation.z,
            ],
            det: transform.det,
            residual_norms_mm,
        })
    }
}

impl Default for FrameRegistration {
    fn default() -> Self {
        Self::new()
    }
}

fn rotation_rows(r: &Matrix3<f64>) -> [[f64; 3]; 3] {
    let mut rows = [[0.0f64; 3]; 3];
    for row in 0..3 {
        for col in 0..3 {
            rows[row][col] = r[(row, col)];
        }
    }
    rows
}

fn residual_norms(residuals: &[[f64; 3]; 4]) -> [f64; 4] {
    let mut norms = [0.0f64; 4];
    for (slot, r) in residuals.iter().enumerate() {
        norms[slot] = (r[0] * r[0] + r[1] * r[1] + r[2] * r[2]).sqrt();
    }
    norms
}
