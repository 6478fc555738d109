//! Shared test fixtures for volume-based unit tests.
//!
//! Consolidated here so the finder and registration tests build their marker
//! phantoms from one geometry instead of near-identical copies.

use crate::volume::CtVolume;

/// Raw sample value whose masked intensity clears the candidate threshold
/// comfortably: 4600 & -769 = 4344.
pub(crate) const BRIGHT: i16 = 4600;

/// Fill an axis-aligned cube of `(2 * half_extent + 1)^3` voxels around
/// `center` with `value`.
pub(crate) fn paint_cluster(
    volume: &mut CtVolume,
    center: [usize; 3],
    half_extent: usize,
    value: i16,
) {
    for z in center[2] - half_extent..=center[2] + half_extent {
        for y in center[1] - half_extent..=center[1] + half_extent {
            for x in center[0] - half_extent..=center[0] + half_extent {
                volume.set_voxel(x, y, z, value);
            }
        }
    }
}

/// Voxel-index centers of four markers placed `arm` voxels out along the
/// quadrant diagonals, slot-ordered to match the classifier: 0 = (-x, -z),
/// 1 = (+x, -z), 2 = (-x, +z), 3 = (+x, +z). The z offsets are mirrored
/// because the in-slice z axis is flipped relative to the voxel z index.
pub(crate) fn cluster_centers(size: [usize; 3], arm: usize) -> [[usize; 3]; 4] {
    let cx = size[0] / 2;
    let cy = size[1] / 2;
    let cz = size[2] / 2;
    [
        [cx - arm, cy, cz + arm],
        [cx + arm, cy, cz + arm],
        [cx - arm, cy, cz - arm],
        [cx + arm, cy, cz - arm],
    ]
}

/// Zero-filled volume with a bright cubic cluster in each quadrant.
pub(crate) fn quadrant_phantom(
    size: [usize; 3],
    spacing_mm: [f32; 3],
    arm: usize,
    half_extent: usize,
) -> CtVolume {
    let mut volume = CtVolume::filled(size, spacing_mm, 0);
    for center in cluster_centers(size, arm) {
        paint_cluster(&mut volume, center, half_extent, BRIGHT);
    }
    volume
}
