use spincube::{
    AttribPointer, BufferId, BufferTarget, DemoConfig, GpuBackend, GpuError, Matrix, ProgramId,
    RenderFlags, RenderSession, ShaderSource, Viewport, INDICES,
};

#[derive(Debug, Clone, PartialEq)]
enum Call {
    LinkProgram(String),
    CreateBuffer(BufferTarget, usize),
    RenderFlags(RenderFlags),
    ClearColor([f32; 4]),
    ClearDepth(f32),
    Viewport(Viewport),
    Clear,
    UseProgram(ProgramId),
    BindBuffer(BufferTarget, BufferId),
    AttribPointer(u32, AttribPointer),
    UniformMatrix(u32, [f32; 16]),
    DrawIndexed(u32),
    DeleteProgram(ProgramId),
    DeleteBuffer(BufferId),
    Present,
}

#[derive(Default)]
struct RecordingGpu {
    calls: Vec<Call>,
    next_id: u32,
    missing: Vec<&'static str>,
    fail_link: bool,
    fail_buffer: Option<BufferTarget>,
    failing_presents: usize,
}

impl RecordingGpu {
    fn location(&self, name: &str) -> Option<u32> {
        if self.missing.contains(&name) {
            return None;
        }
        match name {
            "a_position" => Some(0),
            "a_color" => Some(1),
            "u_mvpMatrix" => Some(0),
            _ => None,
        }
    }

    fn take(&mut self) -> Vec<Call> {
        std::mem::take(&mut self.calls)
    }
}

impl GpuBackend for RecordingGpu {
    fn link_program(&mut self, shader: &ShaderSource<'_>) -> Result<ProgramId, GpuError> {
        self.calls.push(Call::LinkProgram(shader.label.to_string()));
        if self.fail_link {
            return Err(GpuError::ProgramLink {
                label: shader.label.to_string(),
                reason: "forced".to_string(),
            });
        }
        self.next_id += 1;
        Ok(ProgramId(self.next_id))
    }

    fn attrib_location(&self, _program: ProgramId, name: &str) -> Option<u32> {
        self.location(name)
    }

    fn uniform_location(&self, _program: ProgramId, name: &str) -> Option<u32> {
        self.location(name)
    }

    fn create_static_buffer(
        &mut self,
        target: BufferTarget,
        label: &str,
        contents: &[u8],
    ) -> Result<BufferId, GpuError> {
        self.calls.push(Call::CreateBuffer(target, contents.len()));
        if self.fail_buffer == Some(target) {
            return Err(GpuError::BufferUpload {
                label: label.to_string(),
                reason: "forced".to_string(),
            });
        }
        self.next_id += 1;
        Ok(BufferId(self.next_id))
    }

    fn set_render_flags(&mut self, flags: RenderFlags) {
        self.calls.push(Call::RenderFlags(flags));
    }

    fn set_clear_color(&mut self, color: [f32; 4]) {
        self.calls.push(Call::ClearColor(color));
    }

    fn set_clear_depth(&mut self, depth: f32) {
        self.calls.push(Call::ClearDepth(depth));
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.calls.push(Call::Viewport(viewport));
    }

    fn clear(&mut self) {
        self.calls.push(Call::Clear);
    }

    fn use_program(&mut self, program: ProgramId) {
        self.calls.push(Call::UseProgram(program));
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: BufferId) {
        self.calls.push(Call::BindBuffer(target, buffer));
    }

    fn vertex_attrib_pointer(&mut self, location: u32, pointer: AttribPointer) {
        self.calls.push(Call::AttribPointer(location, pointer));
    }

    fn uniform_matrix(&mut self, location: u32, matrix: &Matrix) {
        self.calls
            .push(Call::UniformMatrix(location, matrix.to_gpu_array()));
    }

    fn draw_indexed(&mut self, index_count: u32) {
        self.calls.push(Call::DrawIndexed(index_count));
    }

    fn delete_program(&mut self, program: ProgramId) {
        self.calls.push(Call::DeleteProgram(program));
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        self.calls.push(Call::DeleteBuffer(buffer));
    }

    fn present(&mut self) -> Result<(), GpuError> {
        self.calls.push(Call::Present);
        if self.failing_presents > 0 {
            self.failing_presents -= 1;
            return Err(GpuError::SurfaceLost);
        }
        Ok(())
    }
}

fn circular_diff(a: f32, b: f32) -> f32 {
    let d = (a - b).rem_euclid(360.0);
    d.min(360.0 - d)
}

fn initialized() -> (RecordingGpu, RenderSession) {
    let mut gpu = RecordingGpu::default();
    let session = RenderSession::initialize(&mut gpu, &DemoConfig::default(), 1920, 1080)
        .expect("initialize");
    (gpu, session)
}

#[test]
fn initialize_follows_setup_order() {
    let (mut gpu, session) = initialized();
    let calls = gpu.take();

    assert_eq!(
        calls,
        vec![
            Call::LinkProgram("Cube Shader".to_string()),
            Call::CreateBuffer(BufferTarget::Vertex, 8 * 24),
            Call::CreateBuffer(BufferTarget::Index, 36 * 2),
            Call::RenderFlags(RenderFlags::CUBE),
            Call::ClearColor([0.0, 0.0, 0.0, 1.0]),
            Call::ClearDepth(1.0),
            Call::Viewport(Viewport {
                x: 0,
                y: 0,
                width: 1920,
                height: 1080,
            }),
        ]
    );

    let locations = session.locations();
    assert_eq!(locations.position, Some(0));
    assert_eq!(locations.color, Some(1));
    assert_eq!(locations.mvp, Some(0));

    let mut expected = Matrix::identity();
    expected.perspective(30.0, 1920.0 / 1080.0, 0.1, 30.0);
    assert_eq!(*session.projection(), expected);
    assert_eq!(*session.modelview(), Matrix::identity());
    assert_eq!(*session.mvp(), Matrix::identity());
    assert_eq!(session.angle(), 0.0);
}

#[test]
fn render_frame_binds_and_draws() {
    let (mut gpu, mut session) = initialized();
    gpu.take();

    session.render_frame(&mut gpu);
    let calls = gpu.take();

    let mvp = session.mvp().to_gpu_array();
    assert_eq!(
        calls,
        vec![
            Call::Clear,
            Call::UseProgram(ProgramId(1)),
            Call::BindBuffer(BufferTarget::Vertex, BufferId(2)),
            Call::AttribPointer(
                0,
                AttribPointer {
                    components: 3,
                    normalized: false,
                    stride: 24,
                    offset: 0,
                }
            ),
            Call::AttribPointer(
                1,
                AttribPointer {
                    components: 3,
                    normalized: false,
                    stride: 24,
                    offset: 12,
                }
            ),
            Call::UniformMatrix(0, mvp),
            Call::BindBuffer(BufferTarget::Index, BufferId(3)),
            Call::DrawIndexed(INDICES.len() as u32),
        ]
    );
}

#[test]
fn one_frame_advances_angle_and_composes_mvp() {
    let (mut gpu, mut session) = initialized();
    session.render_frame(&mut gpu);

    assert_eq!(session.angle(), 0.3);

    let mut modelview = Matrix::identity();
    modelview.translate(0.0, 0.0, -4.0);
    modelview.rotate(0.0, 1.0, 1.0, 0.0);
    assert_eq!(*session.modelview(), modelview);

    let expected = Matrix::multiply(session.modelview(), session.projection());
    assert_eq!(*session.mvp(), expected);
}

#[test]
fn second_frame_uses_advanced_angle() {
    let (mut gpu, mut session) = initialized();
    session.render_frame(&mut gpu);
    session.render_frame(&mut gpu);

    let mut modelview = Matrix::identity();
    modelview.translate(0.0, 0.0, -4.0);
    modelview.rotate(0.3, 1.0, 1.0, 0.0);
    assert_eq!(*session.modelview(), modelview);
    assert!(session.mvp().abs_diff_eq(
        &Matrix::multiply(&modelview, session.projection()),
        1e-6
    ));
}

#[test]
fn angle_wraps_after_a_full_turn() {
    let (mut gpu, mut session) = initialized();
    for _ in 0..1200 {
        session.render_frame(&mut gpu);
        assert!((0.0..360.0).contains(&session.angle()));
    }
    assert_eq!(session.frame_count(), 1200);
    assert!(circular_diff(session.angle(), 0.0) < 0.05);

    for _ in 0..100 {
        session.render_frame(&mut gpu);
    }
    assert!(circular_diff(session.angle(), 30.0) < 0.05);
}

#[test]
fn missing_locations_are_skipped() {
    let mut gpu = RecordingGpu {
        missing: vec!["a_color", "u_mvpMatrix"],
        ..Default::default()
    };
    let mut session =
        RenderSession::initialize(&mut gpu, &DemoConfig::default(), 800, 600).expect("initialize");
    gpu.take();

    session.render_frame(&mut gpu);
    let calls = gpu.take();

    assert!(!calls
        .iter()
        .any(|c| matches!(c, Call::UniformMatrix(..))));
    let pointers: Vec<u32> = calls
        .iter()
        .filter_map(|c| match c {
            Call::AttribPointer(location, _) => Some(*location),
            _ => None,
        })
        .collect();
    assert_eq!(pointers, vec![0]);
    assert_eq!(calls.last(), Some(&Call::DrawIndexed(36)));
    assert_eq!(session.angle(), 0.3);
}

#[test]
fn link_failure_is_fatal() {
    let mut gpu = RecordingGpu {
        fail_link: true,
        ..Default::default()
    };
    let result = RenderSession::initialize(&mut gpu, &DemoConfig::default(), 1920, 1080);
    assert!(matches!(result, Err(GpuError::ProgramLink { .. })));
    assert_eq!(gpu.take(), vec![Call::LinkProgram("Cube Shader".to_string())]);
}

#[test]
fn index_upload_failure_releases_earlier_resources() {
    let mut gpu = RecordingGpu {
        fail_buffer: Some(BufferTarget::Index),
        ..Default::default()
    };
    let result = RenderSession::initialize(&mut gpu, &DemoConfig::default(), 1920, 1080);
    assert!(matches!(result, Err(GpuError::BufferUpload { .. })));

    let calls = gpu.take();
    assert_eq!(
        &calls[calls.len() - 2..],
        &[Call::DeleteBuffer(BufferId(2)), Call::DeleteProgram(ProgramId(1))]
    );
    assert!(!calls.iter().any(|c| matches!(c, Call::Viewport(_))));
}

#[test]
fn finalize_releases_then_clears_twice() {
    let (mut gpu, mut session) = initialized();
    session.render_frame(&mut gpu);
    gpu.take();

    session.finalize(&mut gpu).expect("finalize");
    assert_eq!(
        gpu.take(),
        vec![
            Call::DeleteProgram(ProgramId(1)),
            Call::DeleteBuffer(BufferId(2)),
            Call::DeleteBuffer(BufferId(3)),
            Call::ClearColor([0.0, 0.0, 0.0, 1.0]),
            Call::Clear,
            Call::Present,
            Call::Clear,
            Call::Present,
        ]
    );
}

#[test]
fn finalize_presents_twice_when_the_first_present_fails() {
    let (mut gpu, session) = initialized();
    gpu.take();
    gpu.failing_presents = 1;

    let result = session.finalize(&mut gpu);
    assert!(matches!(result, Err(GpuError::SurfaceLost)));

    let calls = gpu.take();
    let presents = calls.iter().filter(|c| **c == Call::Present).count();
    assert_eq!(presents, 2);
    assert_eq!(
        &calls[calls.len() - 4..],
        &[Call::Clear, Call::Present, Call::Clear, Call::Present]
    );
}

#[test]
fn initialize_with_zero_size_keeps_projection_finite() {
    let mut gpu = RecordingGpu::default();
    let session =
        RenderSession::initialize(&mut gpu, &DemoConfig::default(), 0, 0).expect("initialize");

    assert!(session
        .projection()
        .to_gpu_array()
        .iter()
        .all(|v| v.is_finite()));
    assert!(gpu.take().contains(&Call::Viewport(Viewport {
        x: 0,
        y: 0,
        width: 1,
        height: 1,
    })));
}

#[test]
fn resize_rebuilds_projection_only() {
    let (mut gpu, mut session) = initialized();
    session.render_frame(&mut gpu);
    let angle = session.angle();
    gpu.take();

    session.resize(&mut gpu, 1000, 1000);
    let mut expected = Matrix::identity();
    expected.perspective(30.0, 1.0, 0.1, 30.0);
    assert_eq!(*session.projection(), expected);
    assert_eq!(session.angle(), angle);
    assert_eq!(
        gpu.take(),
        vec![Call::Viewport(Viewport {
            x: 0,
            y: 0,
            width: 1000,
            height: 1000,
        })]
    );

    session.resize(&mut gpu, 0, 1000);
    assert!(gpu.take().is_empty());
    assert_eq!(*session.projection(), expected);
}
