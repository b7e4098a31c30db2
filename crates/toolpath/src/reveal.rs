use crate::geometry::GeometryMetadata;
use std::ops::RangeInclusive;

/// Slack added to the height cutoff so vertices lying exactly on it stay lit.
pub const HEIGHT_EPSILON: f64 = 0.001;

/// Progressive-reveal cutoffs. `None` means "show everything" along that axis.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RevealParameters {
    /// Machine Z below which the path is drawn fully opaque.
    pub height_cutoff: Option<f64>,
    /// Cumulative travel below which the path is drawn fully opaque.
    pub distance_cutoff: Option<f64>,
}

impl RevealParameters {
    /// Depth cutoff handed to the renderer.
    pub fn effective_height(&self, meta: &GeometryMetadata) -> f64 {
        self.height_value(meta) + HEIGHT_EPSILON
    }

    /// Distance cutoff handed to the renderer.
    pub fn effective_distance(&self, meta: &GeometryMetadata) -> f64 {
        self.distance_value(meta)
    }

    /// Height as shown on the slider (cutoff without epsilon).
    pub fn height_value(&self, meta: &GeometryMetadata) -> f64 {
        self.height_cutoff.unwrap_or(meta.bounds.max.z)
    }

    pub fn distance_value(&self, meta: &GeometryMetadata) -> f64 {
        self.distance_cutoff.unwrap_or(meta.total_travel)
    }

    /// Slider domain for the height cutoff. The lower end sits below the
    /// lowest vertex so the whole path can be dimmed.
    pub fn height_range(meta: &GeometryMetadata) -> RangeInclusive<f64> {
        (meta.bounds.min.z - 2.0 * HEIGHT_EPSILON)..=meta.bounds.max.z
    }

    pub fn distance_range(meta: &GeometryMetadata) -> RangeInclusive<f64> {
        0.0..=meta.total_travel
    }

    pub fn set_height(&mut self, value: f64, meta: &GeometryMetadata) {
        let range = Self::height_range(meta);
        self.height_cutoff = Some(value.clamp(*range.start(), *range.end()));
    }

    pub fn set_distance(&mut self, value: f64, meta: &GeometryMetadata) {
        let range = Self::distance_range(meta);
        self.distance_cutoff = Some(value.clamp(*range.start(), *range.end()));
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
