//! Render state for the spinning cube and the protocol that drives it.
//!
//! A [`RenderSession`] is created by [`RenderSession::initialize`], advanced by
//! [`RenderSession::render_frame`] and torn down by [`RenderSession::finalize`],
//! which consumes it. All GPU work goes through the [`GpuBackend`] passed to
//! each call; the session itself only owns handles and matrices.

mod spin;

pub use spin::{FrameMatrices, Spin};

use crate::config::{DemoConfig, Projection};
use crate::gpu::{
    AttribPointer, BufferId, BufferTarget, GpuBackend, GpuError, ProgramId, RenderFlags, Viewport,
};
use crate::math::Matrix;
use crate::mesh::{self, Vertex, INDICES, VERTICES};
use crate::shader::{COLOR_ATTRIB, CUBE_SHADER, MVP_UNIFORM, POSITION_ATTRIB};

const POSITION_POINTER: AttribPointer = AttribPointer {
    components: 3,
    normalized: false,
    stride: Vertex::STRIDE,
    offset: Vertex::POSITION_OFFSET,
};

const COLOR_POINTER: AttribPointer = AttribPointer {
    components: 3,
    normalized: false,
    stride: Vertex::STRIDE,
    offset: Vertex::COLOR_OFFSET,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShaderLocations {
    pub position: Option<u32>,
    pub color: Option<u32>,
    pub mvp: Option<u32>,
}

pub struct RenderSession {
    program: ProgramId,
    vertex_buffer: BufferId,
    index_buffer: BufferId,
    locations: ShaderLocations,
    index_count: u32,
    lens: Projection,
    projection: Matrix,
    modelview: Matrix,
    mvp: Matrix,
    spin: Spin,
    frames: u64,
}

impl RenderSession {
    /// Links the cube program, uploads the mesh and sets fixed state.
    ///
    /// A zero `width` or `height` is treated as 1.
    ///
    /// Program and buffer failures are fatal. Missing shader locations are not:
    /// they are logged and the matching bind is skipped on every frame.
    pub fn initialize<G>(
        gpu: &mut G,
        config: &DemoConfig,
        width: u32,
        height: u32,
    ) -> Result<Self, GpuError>
    where
        G: GpuBackend + ?Sized,
    {
        let (width, height) = (width.max(1), height.max(1));
        let program = gpu.link_program(&CUBE_SHADER)?;
        log::debug!("linked program {:?}", program);

        let locations = ShaderLocations {
            position: gpu.attrib_location(program, POSITION_ATTRIB),
            color: gpu.attrib_location(program, COLOR_ATTRIB),
            mvp: gpu.uniform_location(program, MVP_UNIFORM),
        };
        warn_missing(&locations);

        let vertex_buffer = match gpu.create_static_buffer(
            BufferTarget::Vertex,
            "Cube Vertex Buffer",
            mesh::vertices_as_bytes(VERTICES),
        ) {
            Ok(buffer) => buffer,
            Err(e) => {
                gpu.delete_program(program);
                return Err(e);
            }
        };

        let index_buffer = match gpu.create_static_buffer(
            BufferTarget::Index,
            "Cube Index Buffer",
            mesh::indices_as_bytes(INDICES),
        ) {
            Ok(buffer) => buffer,
            Err(e) => {
                gpu.delete_buffer(vertex_buffer);
                gpu.delete_program(program);
                return Err(e);
            }
        };

        gpu.set_render_flags(RenderFlags::CUBE);
        gpu.set_clear_color(config.clear_color);
        gpu.set_clear_depth(1.0);

        let lens = config.projection;
        let projection = projection_matrix(&lens, width, height);
        gpu.set_viewport(full_viewport(width, height));

        log::info!(
            "render session initialized ({}x{}, fovy {}°)",
            width,
            height,
            lens.fovy_degrees
        );

        Ok(Self {
            program,
            vertex_buffer,
            index_buffer,
            locations,
            index_count: INDICES.len() as u32,
            lens,
            projection,
            modelview: Matrix::identity(),
            mvp: Matrix::identity(),
            spin: Spin::new(&config.spin),
            frames: 0,
        })
    }

    /// Recomputes the transforms, advances the spin and draws the cube.
    ///
    /// Presenting the frame is left to the caller.
    pub fn render_frame<G>(&mut self, gpu: &mut G)
    where
        G: GpuBackend + ?Sized,
    {
        let FrameMatrices { modelview, mvp } = self.spin.update(&self.projection);
        self.modelview = modelview;
        self.mvp = mvp;
        self.frames += 1;

        gpu.clear();
        gpu.use_program(self.program);

        gpu.bind_buffer(BufferTarget::Vertex, self.vertex_buffer);
        if let Some(location) = self.locations.position {
            gpu.vertex_attrib_pointer(location, POSITION_POINTER);
        }
        if let Some(location) = self.locations.color {
            gpu.vertex_attrib_pointer(location, COLOR_POINTER);
        }

        if let Some(location) = self.locations.mvp {
            gpu.uniform_matrix(location, &self.mvp);
        }

        gpu.bind_buffer(BufferTarget::Index, self.index_buffer);
        gpu.draw_indexed(self.index_count);
    }

    /// Recomputes the projection for a new surface size and resets the viewport.
    pub fn resize<G>(&mut self, gpu: &mut G, width: u32, height: u32)
    where
        G: GpuBackend + ?Sized,
    {
        if width == 0 || height == 0 {
            return;
        }
        self.projection = projection_matrix(&self.lens, width, height);
        gpu.set_viewport(full_viewport(width, height));
        log::debug!("projection rebuilt for {}x{}", width, height);
    }

    /// Releases the program and buffers, then clears and presents twice.
    ///
    /// Both presents always run; the first error is returned.
    pub fn finalize<G>(self, gpu: &mut G) -> Result<(), GpuError>
    where
        G: GpuBackend + ?Sized,
    {
        gpu.delete_program(self.program);
        gpu.delete_buffer(self.vertex_buffer);
        gpu.delete_buffer(self.index_buffer);

        gpu.set_clear_color([0.0, 0.0, 0.0, 1.0]);

        let mut result = Ok(());
        for _ in 0..2 {
            gpu.clear();
            if let Err(e) = gpu.present() {
                result = result.and(Err(e));
            }
        }

        log::info!("render session finalized after {} frames", self.frames);
        result
    }

    pub fn angle(&self) -> f32 {
        self.spin.angle()
    }

    pub fn projection(&self) -> &Matrix {
        &self.projection
    }

    pub fn modelview(&self) -> &Matrix {
        &self.modelview
    }

    pub fn mvp(&self) -> &Matrix {
        &self.mvp
    }

    pub fn locations(&self) -> ShaderLocations {
        self.locations
    }

    pub fn frame_count(&self) -> u64 {
        self.frames
    }
}

fn projection_matrix(lens: &Projection, width: u32, height: u32) -> Matrix {
    let aspect = width as f32 / height as f32;
    let mut projection = Matrix::identity();
    projection.perspective(lens.fovy_degrees, aspect, lens.near, lens.far);
    projection
}

fn full_viewport(width: u32, height: u32) -> Viewport {
    Viewport {
        x: 0,
        y: 0,
        width,
        height,
    }
}

fn warn_missing(locations: &ShaderLocations) {
    let named = [
        (POSITION_ATTRIB, locations.position),
        (COLOR_ATTRIB, locations.color),
        (MVP_UNIFORM, locations.mvp),
    ];
    for (name, location) in named {
        if location.is_none() {
            log::warn!("shader location `{}` not found, it will not be bound", name);
        }
    }
}
