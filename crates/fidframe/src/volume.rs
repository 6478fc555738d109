//! Volume access boundary.
//!
//! The registration pipeline reads any [`Volume`] implementation; the dense
//! in-memory [`CtVolume`] ships for stand-alone use and tests.

use std::collections::HashMap;

/// Attribute value written back onto a volume.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    /// A small array of floats (direction cosines and the like).
    Floats(Vec<f32>),
    /// A 3-vector.
    Vector3([f32; 3]),
}

/// Read access to a scanned volume plus attribute write-back.
///
/// Axes are indexed `0..dimensionality()`; registration consumes the first
/// three. Sample indices passed to [`voxel`](Self::voxel) must be in range.
pub trait Volume {
    /// Number of axes (>= 3 required for registration).
    fn dimensionality(&self) -> usize;

    /// Voxel count along `axis`.
    fn size(&self, axis: usize) -> usize;

    /// Physical sample spacing along `axis`, in mm per voxel.
    fn sample_spacing(&self, axis: usize) -> f32;

    /// Raw stored sample at `(x, y, z)`.
    fn voxel(&self, x: usize, y: usize, z: usize) -> i16;

    /// Set a named attribute on the volume.
    fn set_attribute(&mut self, key: &str, value: AttributeValue);
}

/// Physical center of the scanned extent (size × spacing / 2), in mm.
pub fn physical_center_mm<V: Volume + ?Sized>(volume: &V) -> [f64; 3] {
    let mut center = [0.0f64; 3];
    for (axis, c) in center.iter_mut().enumerate() {
        *c = volume.size(axis) as f64 * f64::from(volume.sample_spacing(axis)) / 2.0;
    }
    center
}

/// A dense in-memory CT volume with x-fastest sample layout.
#[derive(Debug, Clone)]
pub struct CtVolume {
    size: [usize; 3],
    spacing_mm: [f32; 3],
    data: Vec<i16>,
    attributes: HashMap<String, AttributeValue>,
}

impl CtVolume {
    /// Create a volume with every sample set to `fill`.
    pub fn filled(size: [usize; 3], spacing_mm: [f32; 3], fill: i16) -> Self {
        let n = size[0] * size[1] * size[2];
        Self {
            size,
            spacing_mm,
            data: vec![fill; n],
            attributes: HashMap::new(),
        }
    }

    /// Create a volume from raw samples in x-fastest layout.
    pub fn from_samples(
        size: [usize; 3],
        spacing_mm: [f32; 3],
        data: Vec<i16>,
    ) -> Result<Self, String> {
        let n = size[0] * size[1] * size[2];
        if data.len() != n {
            return Err(format!(
                "sample count {} does not match dimensions {}x{}x{}",
                data.len(),
                size[0],
                size[1],
                size[2]
            ));
        }
        Ok(Self {
            size,
            spacing_mm,
            data,
            attributes: HashMap::new(),
        })
    }

    #[inline]
    fn index(&self, x: usize, y: usize, z: usize) -> usize {
        (z * self.size[1] + y) * self.size[0] + x
    }

    /// Overwrite the sample at `(x, y, z)`.
    pub fn set_voxel(&mut self, x: usize, y: usize, z: usize, value: i16) {
        let idx = self.index(x, y, z);
        self.data[idx] = value;
    }

    /// Read back a previously set attribute.
    pub fn attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }
}

impl Volume for CtVolume {
    fn dimensionality(&self) -> usize {
        3
    }

    fn size(&self, axis: usize) -> usize {
        self.size[axis]
    }

    fn sample_spacing(&self, axis: usize) -> f32 {
        self.spacing_mm[axis]
    }

    fn voxel(&self, x: usize, y: usize, z: usize) -> i16 {
        self.data[self.index(x, y, z)]
    }

    fn set_attribute(&mut self, key: &str, value: AttributeValue) {
        self.attributes.insert(key.to_string(), value);
    }
}
