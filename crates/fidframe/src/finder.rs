//! Single-pass fiducial scan.
//!
//! Walks every voxel once in fixed x → y → z order, keeps voxels whose
//! masked intensity clears the candidate threshold, classifies them into a
//! quadrant slot, and accumulates per-slot weighted centroids. The fixed
//! iteration order makes repeated runs on the same volume bit-identical.

use fidframe_core::FiducialSet;
use fidframe_core::centroid::FiducialAccumulator;
use fidframe_core::quadrant::{self, Quadrant};

use crate::config::RegistrationConfig;
use crate::progress::ProgressSink;
use crate::registration::RegistrationError;
use crate::volume::Volume;

/// Progress label reported while the scan runs.
pub const SCAN_STAGE_LABEL: &str = "Finding fiducials";

/// Scan the volume and locate the four fiducial centroids.
///
/// The volume is read-only; progress (when a sink is given) is reported once
/// per outer-axis slice. Fails without partial results when the volume or
/// configuration is unusable or a slot ends up under-supported.
pub fn locate_fiducials<V: Volume>(
    volume: &V,
    config: &RegistrationConfig,
    mut progress: Option<&mut (dyn ProgressSink + '_)>,
) -> Result<FiducialSet, RegistrationError> {
    validate_volume(volume)?;
    config.validate().map_err(RegistrationError::InvalidConfig)?;

    let xsize = volume.size(0);
    let ysize = volume.size(1);
    let zsize = volume.size(2);
    let spacing = [
        f64::from(volume.sample_spacing(0)),
        f64::from(volume.sample_spacing(1)),
        f64::from(volume.sample_spacing(2)),
    ];

    let mut accum = FiducialAccumulator::new();

    for x in 0..xsize {
        if let Some(sink) = progress.as_deref_mut() {
            let percent = (x as f32 / xsize as f32 * 100.0).round() as i32;
            sink.percent_done(SCAN_STAGE_LABEL, percent);
        }
        let tx = x as f64 - xsize as f64 / 2.0;

        for y in 0..ysize {
            for z in 0..zsize {
                // Candidate gate: the mask `0xff + intercept` (-769 by
                // default) clears bits 8 and 9 of the raw sample; saturated
                // 12-bit samples (4069..=4095) stay above the threshold.
                let masked = i32::from(volume.voxel(x, y, z)) & (0xff + config.rescale_intercept);
                if masked <= config.candidate_threshold {
                    continue;
                }

                // Keep only voxels near the quadrant diagonals.
                let tz = -(z as f64 - zsize as f64 / 2.0);
                if !quadrant::within_diagonal_band(tx, tz, config.diagonal_tolerance_vox) {
                    continue;
                }

                let position_mm = [
                    spacing[0] * x as f64,
                    spacing[1] * y as f64,
                    spacing[2] * z as f64,
                ];
                accum.add(Quadrant::from_offsets(tx, tz), 1.0, position_mm);
            }
        }
    }

    let set = accum.finalize(config.min_support_voxels)?;
    for slot in 0..4 {
        let p = set.points[slot];
        tracing::info!(
            "fiducial {}: centroid ({:.2}, {:.2}, {:.2}) mm from {} voxels",
            slot,
            p[0],
            p[1],
            p[2],
            set.pixel_counts[slot]
        );
    }
    Ok(set)
}

fn validate_volume<V: Volume>(volume: &V) -> Result<(), RegistrationError> {
    let dims = volume.dimensionality();
    if dims < 3 {
        return Err(RegistrationError::InvalidVolume(format!(
            "registration needs a 3D volume, got {} axes",
            dims
        )));
    }
    for axis in 0..3 {
        if volume.size(axis) == 0 {
            return Err(RegistrationError::InvalidVolume(format!(
                "axis {} has zero extent",
                axis
            )));
        }
        let spacing = volume.sample_spacing(axis);
        if !spacing.is_finite() || spacing <= 0.0 {
            return Err(RegistrationError::InvalidVolume(format!(
                "axis {} spacing must be finite and > 0, got {}",
                axis, spacing
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{BRIGHT, cluster_centers, paint_cluster, quadrant_phantom};
    use crate::volume::CtVolume;
    use approx::assert_relative_eq;

    #[test]
    fn locates_symmetric_clusters_at_their_centers() {
        let size = [120, 40, 120];
        let volume = quadrant_phantom(size, [1.0, 1.0, 1.0], 40, 2);
        let config = RegistrationConfig::default();

        let set = locate_fiducials(&volume, &config, None).expect("phantom has four markers");
        let centers = cluster_centers(size, 40);
        for slot in 0..4 {
            assert_eq!(set.pixel_counts[slot], 125, "slot {} support", slot);
            for axis in 0..3 {
                assert_relative_eq!(
                    set.points[slot][axis],
                    centers[slot][axis] as f64,
                    epsilon = 1e-9
                );
            }
        }
    }

    #[test]
    fn centroids_scale_with_sample_spacing() {
        let size = [120, 40, 120];
        let spacing = [0.5f32, 2.0, 1.0];
        let volume = quadrant_phantom(size, spacing, 40, 2);
        let config = RegistrationConfig::default();

        let set = locate_fiducials(&volume, &config, None).expect("phantom has four markers");
        let centers = cluster_centers(size, 40);
        for slot in 0..4 {
            for axis in 0..3 {
                let expected = centers[slot][axis] as f64 * f64::from(spacing[axis]);
                assert_relative_eq!(set.points[slot][axis], expected, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn under_supported_slot_fails_by_index() {
        let size = [120, 40, 120];
        let mut volume = CtVolume::filled(size, [1.0, 1.0, 1.0], 0);
        let centers = cluster_centers(size, 40);
        for (slot, &center) in centers.iter().enumerate() {
            // Slot 2 gets a 3x3x3 cluster, below the default 50-voxel support.
            let half_extent = if slot == 2 { 1 } else { 2 };
            paint_cluster(&mut volume, center, half_extent, BRIGHT);
        }

        let err = locate_fiducials(&volume, &RegistrationConfig::default(), None)
            .expect_err("slot 2 is under-supported");
        assert_eq!(
            err,
            RegistrationError::InsufficientSupport {
                slot: 2,
                count: 27,
                required: 50,
            }
        );
    }

    #[test]
    fn candidate_threshold_is_strict() {
        let size = [120, 40, 120];
        let mut volume = CtVolume::filled(size, [1.0, 1.0, 1.0], 0);
        let centers = cluster_centers(size, 40);
        let config = RegistrationConfig::default();
        // Masked intensities land exactly on the threshold: 4068 & -769 =
        // 3300 is not a candidate, 4069 & -769 = 3301 is.
        for &center in &centers {
            paint_cluster(&mut volume, center, 2, 4068);
        }
        assert!(matches!(
            locate_fiducials(&volume, &config, None),
            Err(RegistrationError::InsufficientSupport { slot: 0, .. })
        ));

        for &center in &centers {
            paint_cluster(&mut volume, center, 2, 4069);
        }
        let set = locate_fiducials(&volume, &config, None).expect("one unit above threshold");
        assert_eq!(set.pixel_counts, [125, 125, 125, 125]);
    }

    #[test]
    fn saturated_samples_clear_the_candidate_mask() {
        let size = [120, 40, 120];
        let mut volume = CtVolume::filled(size, [1.0, 1.0, 1.0], 0);
        // Metal markers saturate a 12-bit scanner at 4095, which masks to
        // 3327. A cluster of them must still be located.
        for &center in &cluster_centers(size, 40) {
            paint_cluster(&mut volume, center, 2, 4095);
        }

        let set = locate_fiducials(&volume, &RegistrationConfig::default(), None)
            .expect("saturated markers are candidates");
        assert_eq!(set.pixel_counts, [125, 125, 125, 125]);
    }

    #[test]
    fn mid_range_samples_between_mask_bands_are_rejected() {
        let size = [120, 40, 120];
        let mut volume = quadrant_phantom(size, [1.0, 1.0, 1.0], 40, 2);
        // 3500 has bit 8 set, so it masks down to 3244 and stays below the
        // threshold even though its raw value is above it.
        volume.set_voxel(30, 20, 90, 3500);

        let set = locate_fiducials(&volume, &RegistrationConfig::default(), None)
            .expect("phantom has four markers");
        assert_eq!(set.pixel_counts, [125, 125, 125, 125]);
    }

    #[test]
    fn center_line_voxels_land_in_the_positive_half() {
        let size = [120, 40, 120];
        let mut volume = quadrant_phantom(size, [1.0, 1.0, 1.0], 40, 2);
        // tx = 0, tz = -10: slot 1. tx = 0, tz = 0: slot 3.
        volume.set_voxel(60, 20, 70, BRIGHT);
        volume.set_voxel(60, 20, 60, BRIGHT);

        let set = locate_fiducials(&volume, &RegistrationConfig::default(), None)
            .expect("phantom has four markers");
        assert_eq!(set.pixel_counts, [125, 126, 125, 126]);
    }

    #[test]
    fn repeated_scans_are_bit_identical() {
        let volume = quadrant_phantom([120, 40, 120], [1.0, 1.0, 1.0], 40, 2);
        let config = RegistrationConfig::default();

        let first = locate_fiducials(&volume, &config, None).expect("scan");
        let second = locate_fiducials(&volume, &config, None).expect("scan");
        assert_eq!(first, second);
    }

    #[test]
    fn progress_covers_every_slice_in_order() {
        let volume = quadrant_phantom([120, 40, 120], [1.0, 1.0, 1.0], 40, 2);
        let config = RegistrationConfig::default();

        let mut events: Vec<(String, i32)> = Vec::new();
        let mut sink = |label: &str, percent: i32| events.push((label.to_string(), percent));
        locate_fiducials(&volume, &config, Some(&mut sink)).expect("scan");

        assert_eq!(events.len(), 120);
        assert_eq!(events[0], (SCAN_STAGE_LABEL.to_string(), 0));
        for pair in events.windows(2) {
            assert!(pair[1].1 >= pair[0].1, "progress went backwards: {:?}", pair);
        }
        assert!(events.iter().all(|(label, p)| label == SCAN_STAGE_LABEL && (0..=100).contains(p)));
    }

    #[test]
    fn one_sink_can_follow_repeated_scans() {
        let volume = quadrant_phantom([120, 40, 120], [1.0, 1.0, 1.0], 40, 2);
        let config = RegistrationConfig::default();

        let mut percents: Vec<i32> = Vec::new();
        let mut sink = |_: &str, percent: i32| percents.push(percent);
        let mut progress: Option<&mut dyn ProgressSink> = Some(&mut sink);
        locate_fiducials(&volume, &config, progress.as_deref_mut()).expect("scan");
        locate_fiducials(&volume, &config, progress.as_deref_mut()).expect("scan");

        assert_eq!(percents.len(), 240);
    }

    #[test]
    fn rejects_unusable_volumes() {
        let config = RegistrationConfig::default();

        let flat = CtVolume::filled([0, 4, 4], [1.0, 1.0, 1.0], 0);
        assert!(matches!(
            locate_fiducials(&flat, &config, None),
            Err(RegistrationError::InvalidVolume(_))
        ));

        let bad_spacing = CtVolume::filled([4, 4, 4], [1.0, 0.0, 1.0], 0);
        assert!(matches!(
            locate_fiducials(&bad_spacing, &config, None),
            Err(RegistrationError::InvalidVolume(_))
        ));
    }

    #[test]
    fn rejects_invalid_config() {
        let volume = CtVolume::filled([4, 4, 4], [1.0, 1.0, 1.0], 0);
        let mut config = RegistrationConfig::default();
        config.min_support_voxels = 0;
        assert!(matches!(
            locate_fiducials(&volume, &config, None),
            Err(RegistrationError::InvalidConfig(_))
        ));
    }
}
