//! fidframe — stereotactic frame registration for CT volumes.
//!
//! Locates the four fiducial rods of a localizer frame in a CT volume and
//! solves for the rigid transform mapping voxel space onto frame
//! coordinates. The pipeline stages are:
//!
//! 1. **Scan** – single pass over the volume collecting bright voxels near
//!    the quadrant diagonals of the axial slices.
//! 2. **Centroids** – intensity-weighted mean position per quadrant slot,
//!    with voxel-support checks.
//! 3. **Orientation** – SVD solve of the rotation between detected and
//!    known fiducials, plus the translation to the frame target point.
//! 4. **Apply** – orientation, position and translation attributes written
//!    back onto the volume.
//!
//! # Public API
//! The stable surface is intentionally small:
//! - [`FrameRegistration`] as primary entry point
//! - [`RegistrationConfig`] and [`FrameGeometry`] for tuning
//! - [`Volume`] trait and the in-memory [`CtVolume`]
//! - [`ProgressSink`] for stage progress reporting
//!
//! Scan internals and the accumulator live in `fidframe-core` and are not
//! part of the public surface.

mod apply;
mod config;
mod finder;
mod progress;
mod registration;
#[cfg(test)]
mod test_utils;
mod volume;

pub use apply::{ORIENTATION_KEY, POSITION_KEY, TRANSLATION_KEY, apply_transform};
pub use config::RegistrationConfig;
pub use finder::{SCAN_STAGE_LABEL, locate_fiducials};
pub use progress::ProgressSink;
pub use registration::{
    FrameRegistration, READY_STAGE_LABEL, RegistrationError, RegistrationResult,
};
pub use volume::{AttributeValue, CtVolume, Volume, physical_center_mm};

pub use fidframe_core::FiducialSet;
pub use fidframe_core::frame::FrameGeometry;
pub use fidframe_core::orientation::{RigidTransform, estimate_rigid_transform};
