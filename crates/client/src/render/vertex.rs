use std::collections::BTreeMap;

use spincube::AttribPointer;
use wgpu::{VertexAttribute, VertexBufferLayout, VertexFormat, VertexStepMode};

/// Vertex buffer layout assembled from the attribute pointers set for a draw.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeLayout {
    stride: wgpu::BufferAddress,
    attributes: Vec<VertexAttribute>,
}

impl AttributeLayout {
    pub fn from_pointers(pointers: &BTreeMap<u32, AttribPointer>) -> Self {
        let stride = pointers
            .values()
            .map(|p| p.stride as wgpu::BufferAddress)
            .max()
            .unwrap_or(0);

        let attributes = pointers
            .iter()
            .filter_map(|(&location, pointer)| {
                let Some(format) = float_format(pointer.components) else {
                    log::warn!(
                        "attribute {} has unsupported component count {}",
                        location,
                        pointer.components
                    );
                    return None;
                };
                Some(VertexAttribute {
                    format,
                    offset: pointer.offset as wgpu::BufferAddress,
                    shader_location: location,
                })
            })
            .collect();

        Self { stride, attributes }
    }

    pub fn buffer_layout(&self) -> VertexBufferLayout<'_> {
        VertexBufferLayout {
            array_stride: self.stride,
            step_mode: VertexStepMode::Vertex,
            attributes: &self.attributes,
        }
    }

    pub fn covers(&self, location: u32) -> bool {
        self.attributes.iter().any(|a| a.shader_location == location)
    }
}

fn float_format(components: u32) -> Option<VertexFormat> {
    match components {
        1 => Some(VertexFormat::Float32),
        2 => Some(VertexFormat::Float32x2),
        3 => Some(VertexFormat::Float32x3),
        4 => Some(VertexFormat::Float32x4),
        _ => None,
    }
}
