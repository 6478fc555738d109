//! Quadrant classification of candidate voxels.
//!
//! Candidate voxels are classified by the signs of their in-plane offsets
//! from the volume center, then gated to a band around the quadrant diagonal
//! where the marker rods sit.

/// One fiducial quadrant in the axial plane, identified by the signs of the
/// center-relative offsets `(tx, tz)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quadrant {
    /// `tx < 0`, `tz < 0` – slot 0.
    NegNeg,
    /// `tx >= 0`, `tz < 0` – slot 1.
    PosNeg,
    /// `tx < 0`, `tz >= 0` – slot 2.
    NegPos,
    /// `tx >= 0`, `tz >= 0` – slot 3.
    PosPos,
}

impl Quadrant {
    /// Classify center-relative offsets. Zero counts as non-negative, so a
    /// voxel exactly on a center line lands in the `+` half instead of being
    /// dropped.
    #[inline]
    pub fn from_offsets(tx: f64, tz: f64) -> Self {
        match (tx >= 0.0, tz >= 0.0) {
            (false, false) => Self::NegNeg,
            (true, false) => Self::PosNeg,
            (false, true) => Self::NegPos,
            (true, true) => Self::PosPos,
        }
    }

    /// Slot index used to address accumulators and known frame points.
    #[inline]
    pub fn slot(self) -> usize {
        match self {
            Self::NegNeg => 0,
            Self::PosNeg => 1,
            Self::NegPos => 2,
            Self::PosPos => 3,
        }
    }
}

/// True when the offsets lie within `tolerance` of the quadrant diagonal,
/// i.e. `||tx| - |tz|| < tolerance`.
#[inline]
pub fn within_diagonal_band(tx: f64, tz: f64, tolerance: f64) -> bool {
    (tx.abs() - tz.abs()).abs() < tolerance
}
