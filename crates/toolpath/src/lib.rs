//! Toolpath geometry for the CNC toolpath viewer.
//!
//! - A toolpath is an ordered sequence of `[x, y, z]` points in machine units (mm).
//! - `compute_metadata` derives the bounding box, per-vertex cumulative travel,
//!   the normalization center and the bounding-box diagonal in one O(n) pass.
//! - `RevealParameters` holds the height/distance cutoffs used to dim the part
//!   of the path that has not been "machined" yet.
//!
//! File layout (UTF-8 JSON):
//!   [[x0, y0, z0], [x1, y1, z1], ...]
//!
//! An empty array is a valid, empty toolpath.

pub mod error;
pub mod geometry;
pub mod io;
pub mod reveal;

pub use error::ToolpathError;
pub use geometry::{
    compute_metadata, AnnotatedPoint, BoundingBox, GeometryMetadata, Point, Toolpath, MIN_RANGE,
};
pub use io::{parse_points, read_file, write_file};
pub use reveal::{RevealParameters, HEIGHT_EPSILON};
