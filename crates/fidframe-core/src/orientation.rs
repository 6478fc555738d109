//! Absolute orientation from the four fiducial correspondences.
//!
//! Closed-form Kabsch-style solve: a 3×3 correlation matrix accumulated from
//! the centered detected points against the known frame points is decomposed
//! by SVD, giving the rotation; the translation follows from the centroid
//! offset and the frame target offset.

use nalgebra::{Matrix3, Vector3};

use crate::FiducialSet;
use crate::frame::FrameGeometry;

// ── Error type ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrientationError {
    /// The SVD backend did not return both orthogonal factors.
    SvdFailed,
}

impl std::fmt::Display for OrientationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SvdFailed => write!(f, "SVD of the correlation matrix failed"),
        }
    }
}

impl std::error::Error for OrientationError {}

// ── Transform ────────────────────────────────────────────────────────────

/// Rigid volume-to-frame transform recovered from the fiducials.
#[derive(Debug, Clone, PartialEq)]
pub struct RigidTransform {
    /// Rotation mapping centered volume offsets onto frame axes.
    pub rotation: Matrix3<f64>,
    /// Translation to the frame target point, in mm.
    pub translation: Vector3<f64>,
    /// `det(rotation)` diagnostic. Orthonormality makes it ±1; a negative
    /// value means the data demanded a genuine reflection, which is
    /// reported but not corrected.
    pub det: f64,
}

/// Estimate the rigid transform mapping detected fiducials onto the frame.
///
/// `volume_center_mm` is the physical center of the scanned extent; the
/// translation carries it through the rotation onto the frame target point.
///
/// The correlation matrix sums outer products of each centered detected
/// point with its un-centered known counterpart; the known points are
/// already expressed relative to the frame origin.
///
/// Coplanar fiducials (the default frame) make the correlation rank
/// deficient, leaving the sign of its null singular direction arbitrary;
/// the solve resolves that sign so the result is a proper rotation. A
/// negative determinant therefore only survives genuinely reflective,
/// full-rank geometry, and is recorded and warned about, never corrected.
pub fn estimate_rigid_transform(
    detected: &FiducialSet,
    volume_center_mm: [f64; 3],
    frame: &FrameGeometry,
) -> Result<RigidTransform, OrientationError> {
    let centroid = detected.centroid();

    let mut corr = Matrix3::zeros();
    for slot in 0..4 {
        let p = detected.points[slot];
        let k = frame.fiducials_mm[slot];
        let m = Vector3::new(p[0] - centroid[0], p[1] - centroid[1], p[2] - centroid[2]);
        let d = Vector3::new(k[0], k[1], k[2]);
        corr += m * d.transpose();
    }

    tracing::debug!(
        "correlation matrix: [{:.1}, {:.1}, {:.1}; {:.1}, {:.1}, {:.1}; {:.1}, {:.1}, {:.1}]",
        corr[(0, 0)],
        corr[(0, 1)],
        corr[(0, 2)],
        corr[(1, 0)],
        corr[(1, 1)],
        corr[(1, 2)],
        corr[(2, 0)],
        corr[(2, 1)],
        corr[(2, 2)]
    );

    let svd = corr.svd(true, true);
    let u = svd.u.ok_or(OrientationError::SvdFailed)?;
    let mut v_t = svd.v_t.ok_or(OrientationError::SvdFailed)?;

    let mut rotation = v_t.transpose() * u.transpose();
    // A zero smallest singular value makes the sign of the null direction a
    // free gauge: either sign factors the correlation exactly. Pick the
    // proper rotation. Full-rank reflective data has no such freedom and
    // keeps its negative determinant.
    if rotation.determinant() < 0.0 && svd.singular_values[2] <= svd.singular_values[0] * 1e-9 {
        v_t.row_mut(2).neg_mut();
        rotation = v_t.transpose() * u.transpose();
    }

    let det = rotation.determinant();
    if det < 0.0 {
        tracing::warn!("rotation determinant {:.6}: solve produced a reflection", det);
    }

    let mbar = Vector3::new(
        volume_center_mm[0] - centroid[0],
        volume_center_mm[1] - centroid[1],
        volume_center_mm[2] - centroid[2],
    );
    let offset = frame.target_offset_mm();
    let dbar = Vector3::new(offset[0], offset[1], offset[2]);
    let translation = dbar - rotation * mbar;

    Ok(RigidTransform {
        rotation,
        translation,
        det,
    })
}

/// Per-slot residuals of the rotational alignment: the centered detected
/// point mapped through the rotation, minus the known point relative to the
/// known centroid. For the default frame the known centroid is the origin.
pub fn alignment_residuals(
    transform: &RigidTransform,
    detected: &FiducialSet,
    frame: &FrameGeometry,
) -> [[f64; 3]; 4] {
    let centroid = detected.centroid();
    let known_centroid = frame.centroid_mm();
    let mut residuals = [[0.0f64; 3]; 4];

    for slot in 0..4 {
        let p = detected.points[slot];
        let k = frame.fiducials_mm[slot];
        let m = Vector3::new(p[0] - centroid[0], p[1] - centroid[1], p[2] - centroid[2]);
        let mapped = transform.rotation * m;
        for axis in 0..3 {
            residuals[slot][axis] = mapped[axis] - (k[axis] - known_centroid[axis]);
        }
    }

    residuals
}
