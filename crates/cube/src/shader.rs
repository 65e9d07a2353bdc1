use crate::gpu::ShaderSource;

pub const POSITION_ATTRIB: &str = "a_position";
pub const COLOR_ATTRIB: &str = "a_color";
pub const MVP_UNIFORM: &str = "u_mvpMatrix";

pub const POSITION_LOCATION: u32 = 0;
pub const COLOR_LOCATION: u32 = 1;
/// `@group(0) @binding(0)`.
pub const MVP_BINDING: u32 = 0;

/// Every `@location` the vertex stage reads.
pub const VERTEX_INPUTS: [u32; 2] = [POSITION_LOCATION, COLOR_LOCATION];

pub fn attribute_location(name: &str) -> Option<u32> {
    match name {
        POSITION_ATTRIB => Some(POSITION_LOCATION),
        COLOR_ATTRIB => Some(COLOR_LOCATION),
        _ => None,
    }
}

pub fn uniform_binding(name: &str) -> Option<u32> {
    match name {
        MVP_UNIFORM => Some(MVP_BINDING),
        _ => None,
    }
}

/// Transforms by `u_mvpMatrix` and passes the vertex color straight through.
pub const CUBE_SHADER: ShaderSource<'static> = ShaderSource {
    label: "Cube Shader",
    source: include_str!("../shaders/cube.wgsl"),
    vertex_entry: "vs_main",
    fragment_entry: "fs_main",
};
