use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub fovy_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            fovy_degrees: 30.0,
            near: 0.1,
            far: 30.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpinConfig {
    /// Degrees added to the angle after every rendered frame.
    pub step_degrees: f32,
    pub axis: [f32; 3],
    /// Offset applied along the local axes before rotating.
    pub offset: [f32; 3],
}

impl Default for SpinConfig {
    fn default() -> Self {
        Self {
            step_degrees: 0.3,
            axis: [1.0, 1.0, 0.0],
            offset: [0.0, 0.0, -4.0],
        }
    }
}

#[derive(Debug, Clone)]
pub struct DemoConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub fullscreen: bool,
    pub background_delay: Duration,
    pub clear_color: [f32; 4],
    pub projection: Projection,
    pub spin: SpinConfig,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            title: "GLES 2.0 sample".to_string(),
            width: 1920,
            height: 1080,
            fullscreen: true,
            background_delay: Duration::from_millis(30),
            clear_color: [0.0, 0.0, 0.0, 1.0],
            projection: Projection::default(),
            spin: SpinConfig::default(),
        }
    }
}
