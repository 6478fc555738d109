//! Weighted centroid accumulation over the four fiducial slots.
//!
//! The scan deposits one contribution per accepted voxel. Finalization walks
//! the slots in index order and checks voxel support and accumulated weight
//! before normalizing, so a failing slot never produces NaN centroids.

use crate::FiducialSet;
use crate::quadrant::Quadrant;

// ── Error type ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CentroidError {
    /// A slot gathered fewer voxels than the support threshold.
    InsufficientSupport {
        slot: usize,
        count: usize,
        required: usize,
    },
    /// A slot reached finalization with no accumulated weight.
    DegenerateWeight { slot: usize },
}

impl std::fmt::Display for CentroidError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InsufficientSupport {
                slot,
                count,
                required,
            } => {
                write!(f, "fiducial {}: only {} voxels, need {}", slot, count, required)
            }
            Self::DegenerateWeight { slot } => {
                write!(f, "fiducial {}: zero accumulated weight", slot)
            }
        }
    }
}

impl std::error::Error for CentroidError {}

// ── Accumulator ──────────────────────────────────────────────────────────

/// Running sums for one fiducial slot.
///
/// The weight sum is kept per axis. Every contribution adds the same weight
/// to all three, so the sums stay equal; normalization still divides each
/// axis by its own sum.
#[derive(Debug, Clone, Copy, Default)]
struct SlotAccum {
    position_sum_mm: [f64; 3],
    weight_sum: [f64; 3],
    pixel_count: usize,
}

/// Four-slot weighted centroid accumulator.
///
/// Construct fresh (or [`reset`](Self::reset)) per scan, [`add`](Self::add)
/// once per accepted voxel, then [`finalize`](Self::finalize) once the scan
/// completes.
#[derive(Debug, Clone, Default)]
pub struct FiducialAccumulator {
    slots: [SlotAccum; 4],
}

impl FiducialAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero all four slots.
    pub fn reset(&mut self) {
        self.slots = [SlotAccum::default(); 4];
    }

    /// Deposit one voxel contribution into the quadrant's slot.
    ///
    /// `position_mm` is the voxel's physical position (index × spacing).
    pub fn add(&mut self, quadrant: Quadrant, weight: f64, position_mm: [f64; 3]) {
        let slot = &mut self.slots[quadrant.slot()];
        for axis in 0..3 {
            slot.position_sum_mm[axis] += weight * position_mm[axis];
            slot.weight_sum[axis] += weight;
        }
        slot.pixel_count += 1;
    }

    /// Normalize all slots into a [`FiducialSet`].
    ///
    /// Slots are checked in index order: voxel support first, then nonzero
    /// weight. The first failing slot is reported.
    pub fn finalize(&self, min_support: usize) -> Result<FiducialSet, CentroidError> {
        let mut points = [[0.0f64; 3]; 4];
        let mut pixel_counts = [0usize; 4];

        for (slot, accum) in self.slots.iter().enumerate() {
            if accum.pixel_count < min_support {
                return Err(CentroidError::InsufficientSupport {
                    slot,
                    count: accum.pixel_count,
                    required: min_support,
                });
            }
            if accum.weight_sum.iter().any(|&w| w <= 0.0) {
                return Err(CentroidError::DegenerateWeight { slot });
            }
            for axis in 0..3 {
                points[slot][axis] = accum.position_sum_mm[axis] / accum.weight_sum[axis];
            }
            pixel_counts[slot] = accum.pixel_count;
        }

        Ok(FiducialSet {
            points,
            pixel_counts,
        })
    }
}
