//! Known fiducial geometry of the reference frame.
//!
//! The frame carries four marker rods at fixed positions in frame
//! coordinates. Slot order matches the scan quadrants (see
//! [`quadrant`](crate::quadrant)): 0 = (-x, -z), 1 = (+x, -z), 2 = (-x, +z),
//! 3 = (+x, +z).

const DEFAULT_FIDUCIALS_MM: [[f64; 3]; 4] = [
    [-80.0, -80.0, 0.0],
    [80.0, -80.0, 0.0],
    [-80.0, 80.0, 0.0],
    [80.0, 80.0, 0.0],
];

/// Axial offset of the frame target point from the fiducial plane:
/// 150 - (161 - 12.7 + 3.9 + 1.17), from the frame mounting dimensions.
const DEFAULT_AXIAL_OFFSET_MM: f64 = -3.37;

/// Known fiducial positions of the reference frame.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FrameGeometry {
    /// Fiducial coordinates in frame mm, slot-ordered.
    pub fiducials_mm: [[f64; 3]; 4],
    /// Axial (z) offset of the frame target point in mm.
    pub axial_offset_mm: f64,
}

impl FrameGeometry {
    /// Check that all coordinates and the axial offset are finite.
    pub fn validate(&self) -> Result<(), String> {
        for (slot, p) in self.fiducials_mm.iter().enumerate() {
            if p.iter().any(|v| !v.is_finite()) {
                return Err(format!("fiducial {} has a non-finite coordinate", slot));
            }
        }
        if !self.axial_offset_mm.is_finite() {
            return Err("axial_offset_mm must be finite".to_string());
        }
        Ok(())
    }

    /// Unweighted centroid of the four known fiducials.
    pub fn centroid_mm(&self) -> [f64; 3] {
        let mut c = [0.0f64; 3];
        for p in &self.fiducials_mm {
            for axis in 0..3 {
                c[axis] += p[axis];
            }
        }
        for axis in 0..3 {
            c[axis] /= 4.0;
        }
        c
    }

    /// Offset of the frame target point: `(0, 0, axial_offset_mm)`.
    pub fn target_offset_mm(&self) -> [f64; 3] {
        [0.0, 0.0, self.axial_offset_mm]
    }
}

impl Default for FrameGeometry {
    fn default() -> Self {
        Self {
            fiducials_mm: DEFAULT_FIDUCIALS_MM,
            axial_offset_mm: DEFAULT_AXIAL_OFFSET_MM,
        }
    }
}
