pub mod config;
pub mod event;
pub mod gpu;
pub mod math;
pub mod mesh;
pub mod session;
pub mod shader;

pub use config::{DemoConfig, Projection, SpinConfig};
pub use event::{AppEvent, EventQueue, Key, LoopAction, LoopState};
pub use gpu::{
    AttribPointer, BufferId, BufferTarget, CullFace, GpuBackend, GpuError, ProgramId, RenderFlags,
    ShaderSource, Viewport,
};
pub use math::Matrix;
pub use mesh::{INDICES, VERTICES, Vertex};
pub use session::{FrameMatrices, RenderSession, ShaderLocations, Spin};
pub use shader::CUBE_SHADER;
