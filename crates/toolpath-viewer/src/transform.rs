//! Per-frame model-to-clip transform.
//!
//! Not a pinhole camera: the toolpath is centered, scaled into the unit
//! sphere (with Z flipped), rotated, pushed to `z ∈ [0, 2]` and divided by
//! `z + 1`.

use crate::camera::CameraState;
use glam::{DMat4, DVec3, DVec4};
use toolpath::GeometryMetadata;

/// Composes `project · depth_shift · rotate · normalize · center` for one frame.
pub fn compose_transform(meta: &GeometryMetadata, camera: &CameraState, aspect: f64) -> DMat4 {
    let translate_around_zero = DMat4::from_translation(-(meta.center + camera.pan_offset));

    let scale = 2.0 / meta.normalization_range();
    let shrink_to_unit_sphere = DMat4::from_scale(DVec3::new(scale, scale, -scale));

    let rotate = DMat4::from_quat(camera.orientation);

    let depth_shift = DMat4::from_translation(DVec3::Z);

    // Rows: [zoom/aspect 0 0 0], [0 zoom 0 0], [0 0 1 0], [0 0 1 1].
    let project = DMat4::from_cols(
        DVec4::new(camera.zoom / aspect, 0.0, 0.0, 0.0),
        DVec4::new(0.0, camera.zoom, 0.0, 0.0),
        DVec4::new(0.0, 0.0, 1.0, 1.0),
        DVec4::new(0.0, 0.0, 0.0, 1.0),
    );

    project * depth_shift * rotate * shrink_to_unit_sphere * translate_around_zero
}
