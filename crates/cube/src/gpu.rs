//! The GPU calls a render session depends on.
//!
//! [`GpuBackend`] is shaped after a small immediate-mode graphics API: programs
//! and buffers are referred to by opaque handles, shader inputs are looked up by
//! name, and state is set before a draw is issued. The client crate implements it
//! on top of wgpu; tests implement it by recording every call.

use crate::math::Matrix;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    Vertex,
    Index,
}

/// Shader text for one program. Both stages live in the same source.
#[derive(Debug, Clone, Copy)]
pub struct ShaderSource<'a> {
    pub label: &'a str,
    pub source: &'a str,
    pub vertex_entry: &'a str,
    pub fragment_entry: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CullFace {
    Front,
    Back,
}

/// Fixed-function state. Front faces are counter-clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderFlags {
    pub depth_test: bool,
    pub blend: bool,
    pub cull_face: Option<CullFace>,
}

impl RenderFlags {
    /// Depth tested, opaque, front faces culled.
    pub const CUBE: Self = Self {
        depth_test: true,
        blend: false,
        cull_face: Some(CullFace::Front),
    };
}

impl Default for RenderFlags {
    fn default() -> Self {
        Self {
            depth_test: false,
            blend: false,
            cull_face: None,
        }
    }
}

/// Layout of one float vertex attribute inside the bound vertex buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttribPointer {
    pub components: u32,
    pub normalized: bool,
    /// Bytes between consecutive vertices.
    pub stride: u32,
    /// Byte offset of the attribute within a vertex.
    pub offset: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum GpuError {
    #[error("failed to link program `{label}`: {reason}")]
    ProgramLink { label: String, reason: String },
    #[error("failed to upload buffer `{label}`: {reason}")]
    BufferUpload { label: String, reason: String },
    #[error("surface lost or outdated")]
    SurfaceLost,
    #[error("timed out acquiring the next surface texture")]
    SurfaceTimeout,
    #[error("out of GPU memory")]
    OutOfMemory,
    #[error("surface error: {0}")]
    Surface(String),
}

pub trait GpuBackend {
    fn link_program(&mut self, shader: &ShaderSource<'_>) -> Result<ProgramId, GpuError>;

    /// `None` when the program has no vertex input called `name`.
    fn attrib_location(&self, program: ProgramId, name: &str) -> Option<u32>;

    /// `None` when the program has no uniform called `name`.
    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<u32>;

    /// Uploads `contents` once into a buffer that is never written again.
    fn create_static_buffer(
        &mut self,
        target: BufferTarget,
        label: &str,
        contents: &[u8],
    ) -> Result<BufferId, GpuError>;

    fn set_render_flags(&mut self, flags: RenderFlags);

    fn set_clear_color(&mut self, color: [f32; 4]);

    fn set_clear_depth(&mut self, depth: f32);

    fn set_viewport(&mut self, viewport: Viewport);

    /// Clears color and depth of the current frame.
    fn clear(&mut self);

    fn use_program(&mut self, program: ProgramId);

    fn bind_buffer(&mut self, target: BufferTarget, buffer: BufferId);

    /// Describes attribute `location` relative to the bound vertex buffer and enables it.
    fn vertex_attrib_pointer(&mut self, location: u32, pointer: AttribPointer);

    fn uniform_matrix(&mut self, location: u32, matrix: &Matrix);

    /// Draws `index_count` `u16` indices from the bound index buffer as a triangle list.
    fn draw_indexed(&mut self, index_count: u32);

    fn delete_program(&mut self, program: ProgramId);

    fn delete_buffer(&mut self, buffer: BufferId);

    /// Shows everything drawn since the previous present.
    fn present(&mut self) -> Result<(), GpuError>;
}
