use bytemuck::{Pod, Zeroable};

/// Interleaved position + color vertex.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

impl Vertex {
    pub const STRIDE: u32 = std::mem::size_of::<Vertex>() as u32;
    pub const POSITION_OFFSET: u32 = 0;
    pub const COLOR_OFFSET: u32 = std::mem::size_of::<[f32; 3]>() as u32;

    const fn new(position: [f32; 3], color: [f32; 3]) -> Self {
        Self { position, color }
    }
}

#[rustfmt::skip]
pub const VERTICES: &[Vertex] = &[
    Vertex::new([ 0.5,  0.5, -0.5], [1.0, 1.0, 1.0]),
    Vertex::new([ 0.5, -0.5, -0.5], [1.0, 0.0, 0.0]),
    Vertex::new([-0.5,  0.5, -0.5], [1.0, 1.0, 0.0]),
    Vertex::new([-0.5, -0.5, -0.5], [1.0, 0.0, 1.0]),
    Vertex::new([-0.5,  0.5,  0.5], [0.0, 1.0, 1.0]),
    Vertex::new([-0.5, -0.5,  0.5], [0.0, 1.0, 0.0]),
    Vertex::new([ 0.5,  0.5,  0.5], [0.0, 0.0, 1.0]),
    Vertex::new([ 0.5, -0.5,  0.5], [0.5, 1.0, 0.5]),
];

// Wound for front-face culling; see `RenderFlags::CUBE`.
#[rustfmt::skip]
pub const INDICES: &[u16] = &[
    0, 2, 3, 0, 3, 1, // Front  (-Z)
    2, 4, 5, 2, 5, 3, // Left   (-X)
    4, 6, 7, 4, 7, 5, // Back   (+Z)
    6, 0, 1, 6, 1, 7, // Right  (+X)
    0, 6, 4, 0, 4, 2, // Top    (+Y)
    1, 3, 5, 1, 5, 7, // Bottom (-Y)
];

pub fn vertices_as_bytes(vertices: &[Vertex]) -> &[u8] {
    bytemuck::cast_slice(vertices)
}

pub fn indices_as_bytes(indices: &[u16]) -> &[u8] {
    bytemuck::cast_slice(indices)
}
