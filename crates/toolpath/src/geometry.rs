//! Derived geometry of a toolpath: bounds, cumulative travel and the
//! center/range pair used to normalize the path into the unit cube.

use glam::DVec3;

/// A single toolpath vertex in machine units (mm).
pub type Point = DVec3;

/// Lower bound applied to the bounding-box diagonal before it is used as a
/// divisor. Single-point and coincident-point paths have a zero diagonal.
pub const MIN_RANGE: f64 = 1e-9;

/// An ordered, immutable sequence of points describing tool motion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Toolpath {
    points: Vec<Point>,
}

impl Toolpath {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    #[inline]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Convenience wrapper around [`compute_metadata`].
    pub fn metadata(&self) -> GeometryMetadata {
        compute_metadata(&self.points)
    }
}

impl From<Vec<[f64; 3]>> for Toolpath {
    fn from(raw: Vec<[f64; 3]>) -> Self {
        Self::new(raw.into_iter().map(DVec3::from_array).collect())
    }
}

/// Component-wise extent of a toolpath.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: DVec3,
    pub max: DVec3,
}

impl BoundingBox {
    /// Box reported for an empty toolpath so normalization stays well defined.
    pub const UNIT: Self = Self {
        min: DVec3::NEG_ONE,
        max: DVec3::ONE,
    };

    pub fn of(points: &[Point]) -> Self {
        let Some((first, rest)) = points.split_first() else {
            return Self::UNIT;
        };

        rest.iter().fold(
            Self {
                min: *first,
                max: *first,
            },
            |bounds, p| Self {
                min: bounds.min.min(*p),
                max: bounds.max.max(*p),
            },
        )
    }

    /// Per-axis midpoint of `min` and `max`.
    #[inline]
    pub fn center(&self) -> DVec3 {
        (self.min + self.max) / 2.0
    }

    /// Euclidean length of the box diagonal.
    #[inline]
    pub fn diagonal(&self) -> f64 {
        self.min.distance(self.max)
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::UNIT
    }
}

/// A toolpath vertex together with the path length travelled to reach it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnotatedPoint {
    pub position: Point,
    /// Sum of segment lengths from the first point through this one.
    pub travel: f64,
}

/// Everything the viewer derives from a toolpath. Recomputed wholesale
/// whenever the toolpath changes.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryMetadata {
    pub bounds: BoundingBox,
    pub center: DVec3,
    /// Bounding-box diagonal; zero for single-point paths.
    pub max_range: f64,
    pub annotated_points: Vec<AnnotatedPoint>,
    /// Travel at the last vertex, 0 for fewer than two points.
    pub total_travel: f64,
}

impl GeometryMetadata {
    /// Diagonal used for scaling, floored at [`MIN_RANGE`].
    #[inline]
    pub fn normalization_range(&self) -> f64 {
        self.max_range.max(MIN_RANGE)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.annotated_points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.annotated_points.is_empty()
    }
}

/// Derives bounds, cumulative travel, center and range for `points`.
///
/// Pure and O(n). An empty input yields [`BoundingBox::UNIT`], no annotated
/// points and zero travel.
pub fn compute_metadata(points: &[Point]) -> GeometryMetadata {
    let bounds = BoundingBox::of(points);

    let mut annotated_points = Vec::with_capacity(points.len());
    let mut travel = 0.0;
    let mut previous: Option<Point> = None;

    for &position in points {
        if let Some(prev) = previous {
            travel += prev.distance(position);
        }
        annotated_points.push(AnnotatedPoint { position, travel });
        previous = Some(position);
    }

    GeometryMetadata {
        bounds,
        center: bounds.center(),
        max_range: bounds.diagonal(),
        annotated_points,
        total_travel: travel,
    }
}
