//! fidframe-core — algorithms for fiducial-based frame registration of CT volumes.
//!
//! Locates the four frame fiducials in a scanned volume and recovers the rigid
//! transform mapping volume coordinates onto the frame. The stages are:
//!
//! 1. **Quadrant** – sign classification of candidate voxels relative to the
//!    volume center, gated to a band around the quadrant diagonals.
//! 2. **Centroid** – four-slot weighted centroid accumulation with
//!    support-checked finalization.
//! 3. **Orientation** – absolute orientation via SVD of the detected-to-known
//!    correlation matrix, plus the frame translation.
//!
//! Known frame geometry lives in [`frame`]. The voxel scan feeding the
//! accumulator is part of the `fidframe` crate.

pub mod frame;
pub mod quadrant;
pub mod centroid;
pub mod orientation;

/// The four detected fiducial centroids with their voxel support.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FiducialSet {
    /// Centroid per slot in volume physical coordinates (mm).
    pub points: [[f64; 3]; 4],
    /// Number of voxels that contributed to each slot.
    pub pixel_counts: [usize; 4],
}

impl FiducialSet {
    /// Centroid for `slot`, or `None` when the slot index is out of range.
    pub fn point(&self, slot: usize) -> Option<[f64; 3]> {
        self.points.get(slot).copied()
    }

    /// Unweighted mean of the four slot centroids.
    pub fn centroid(&self) -> [f64; 3] {
        let mut c = [0.0f64; 3];
        for p in &self.points {
            for axis in 0..3 {
                c[axis] += p[axis];
            }
        }
        for axis in 0..3 {
            c[axis] /= 4.0;
        }
        c
    }
}
