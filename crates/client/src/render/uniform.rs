use bytemuck::{Pod, Zeroable};
use spincube::Matrix;

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct MvpUniform {
    mvp: [f32; 16],
}

impl MvpUniform {
    pub const SIZE: wgpu::BufferAddress = std::mem::size_of::<Self>() as wgpu::BufferAddress;

    pub fn from_matrix(matrix: &Matrix) -> Self {
        Self {
            mvp: matrix.to_gpu_array(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

impl Default for MvpUniform {
    fn default() -> Self {
        Self::from_matrix(&Matrix::identity())
    }
}
