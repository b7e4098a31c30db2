//! GPU-facing data layouts for the toolpath viewer.

use glam::Mat4;
use toolpath::AnnotatedPoint;

/// Per-vertex data uploaded to the toolpath vertex buffer.
/// Must match `VsIn` in `toolpath.wgsl`.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable, Debug, PartialEq)]
pub struct ToolpathVertex {
    /// Machine coordinates in mm.
    pub position: [f32; 3],
    /// Cumulative travel up to this vertex, in mm.
    pub travel: f32,
}

impl From<&AnnotatedPoint> for ToolpathVertex {
    fn from(point: &AnnotatedPoint) -> Self {
        Self {
            position: point.position.as_vec3().to_array(),
            travel: point.travel as f32,
        }
    }
}

/// Uniform block for the toolpath pipeline, respecting std140 layout.
/// Must match `ToolpathUniform` in `toolpath.wgsl`.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable, Debug)]
pub struct ToolpathUniform {
    /// Model-to-clip transform for this frame.
    pub transformation: [[f32; 4]; 4], // 64 B
    /// Machine Z below which vertices are fully revealed.
    pub depth_cutoff: f32, // +4
    /// Travel below which vertices are fully revealed.
    pub distance_cutoff: f32, // +4
    pub _pad: [f32; 2], // +8 -> 80
}

const _: [(); 80] = [(); core::mem::size_of::<ToolpathUniform>()];
const _: [(); 16] = [(); core::mem::size_of::<ToolpathVertex>()];

impl ToolpathUniform {
    pub fn new(transformation: Mat4, depth_cutoff: f32, distance_cutoff: f32) -> Self {
        Self {
            transformation: transformation.to_cols_array_2d(),
            depth_cutoff,
            distance_cutoff,
            _pad: [0.0; 2],
        }
    }
}
