//! Attribute write-back of the recovered transform.

use fidframe_core::orientation::RigidTransform;

use crate::volume::{AttributeValue, Volume};

/// Attribute key for the six-component orientation (rotation rows 0 and 1).
pub const ORIENTATION_KEY: &str = "ImageOrientation";
/// Attribute key for the image position. Always written as the zero vector.
pub const POSITION_KEY: &str = "ImagePosition";
/// Attribute key for the frame translation.
pub const TRANSLATION_KEY: &str = "ImageTranslation";

/// Write the transform onto the volume's attributes.
///
/// The orientation is stored as the first two rotation rows in the
/// direction-cosine convention; the position is always the zero vector; the
/// translation is stored with its axial component negated.
pub fn apply_transform<V: Volume>(volume: &mut V, transform: &RigidTransform) {
    let r = &transform.rotation;
    let orientation = vec![
        r[(0, 0)] as f32,
        r[(0, 1)] as f32,
        r[(0, 2)] as f32,
        r[(1, 0)] as f32,
        r[(1, 1)] as f32,
        r[(1, 2)] as f32,
    ];
    volume.set_attribute(ORIENTATION_KEY, AttributeValue::Floats(orientation));
    volume.set_attribute(POSITION_KEY, AttributeValue::Vector3([0.0, 0.0, 0.0]));

    let t = &transform.translation;
    volume.set_attribute(
        TRANSLATION_KEY,
        AttributeValue::Vector3([t.x as f32, t.y as f32, -t.z as f32]),
    );
}
