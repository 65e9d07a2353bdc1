mod uniform;
mod vertex;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use anyhow::Result;
use spincube::shader::{self, MVP_BINDING};
use spincube::{
    AttribPointer, BufferId, BufferTarget, CullFace, GpuBackend, GpuError, Matrix, ProgramId,
    RenderFlags, ShaderSource, Viewport,
};
use wgpu::util::DeviceExt;
use winit::window::Window;

use uniform::MvpUniform;
use vertex::AttributeLayout;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

struct Program {
    label: String,
    module: wgpu::ShaderModule,
    vertex_entry: String,
    fragment_entry: String,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
}

struct StaticBuffer {
    target: BufferTarget,
    buffer: wgpu::Buffer,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PipelineKey {
    flags: RenderFlags,
    attributes: Vec<(u32, AttribPointer)>,
}

#[derive(Default)]
struct Bindings {
    program: Option<ProgramId>,
    vertex: Option<BufferId>,
    index: Option<BufferId>,
    attributes: BTreeMap<u32, AttribPointer>,
}

struct DrawCall {
    program: ProgramId,
    key: PipelineKey,
    vertex: BufferId,
    index: BufferId,
    index_count: u32,
    viewport: Viewport,
}

/// Work recorded since the last present.
#[derive(Default)]
struct Frame {
    clear: Option<(wgpu::Color, f32)>,
    draws: Vec<DrawCall>,
}

/// [`GpuBackend`] on top of wgpu.
///
/// Calls are recorded as they arrive and replayed in a single render pass when
/// [`GpuBackend::present`] is called. Render pipelines are built lazily on the
/// first draw with a given attribute layout and flag set.
pub struct WgpuBackend {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    depth_view: wgpu::TextureView,
    pipeline_layout: wgpu::PipelineLayout,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    programs: HashMap<ProgramId, Program>,
    buffers: HashMap<BufferId, StaticBuffer>,
    next_handle: u32,
    flags: RenderFlags,
    clear_color: wgpu::Color,
    clear_depth: f32,
    viewport: Viewport,
    bound: Bindings,
    frame: Frame,
    warned_unbound: bool,
    pub size: winit::dpi::PhysicalSize<u32>,
}

impl WgpuBackend {
    pub async fn new(window: Arc<Window>) -> Result<Self> {
        let inner = window.inner_size();
        let size = winit::dpi::PhysicalSize::new(inner.width.max(1), inner.height.max(1));

        let instance = Self::create_instance();
        let surface = instance.create_surface(window)?;
        let adapter = Self::request_adapter(&instance, &surface).await?;
        log::info!("using adapter {:?}", adapter.get_info().name);

        let (device, queue) = Self::request_device(&adapter).await?;
        let config = Self::create_surface_config(&surface, &adapter, size);
        surface.configure(&device, &config);

        let uniform_buffer = Self::create_uniform_buffer(&device);
        let uniform_bind_group_layout = Self::create_uniform_bind_group_layout(&device);
        let uniform_bind_group =
            Self::create_uniform_bind_group(&device, &uniform_bind_group_layout, &uniform_buffer);

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Cube Pipeline Layout"),
            bind_group_layouts: &[&uniform_bind_group_layout],
            immediate_size: 0,
        });

        let depth_view = Self::create_depth_view(&device, &config);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            depth_view,
            pipeline_layout,
            uniform_buffer,
            uniform_bind_group,
            programs: HashMap::new(),
            buffers: HashMap::new(),
            next_handle: 0,
            flags: RenderFlags::default(),
            clear_color: wgpu::Color::BLACK,
            clear_depth: 1.0,
            viewport: Viewport {
                x: 0,
                y: 0,
                width: size.width,
                height: size.height,
            },
            bound: Bindings::default(),
            frame: Frame::default(),
            warned_unbound: false,
            size,
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.size = new_size;
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
        self.depth_view = Self::create_depth_view(&self.device, &self.config);
    }

    fn next_handle(&mut self) -> u32 {
        self.next_handle += 1;
        self.next_handle
    }

    fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }

    fn record_pass(&self, frame: &Frame, target: &wgpu::TextureView) -> wgpu::CommandBuffer {
        let mut encoder = self.device.create_command_encoder(&Default::default());

        let (color_load, depth_load) = match frame.clear {
            Some((color, depth)) => (wgpu::LoadOp::Clear(color), wgpu::LoadOp::Clear(depth)),
            None => (wgpu::LoadOp::Load, wgpu::LoadOp::Load),
        };

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Cube Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: color_load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: depth_load,
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            for draw in &frame.draws {
                let Some(pipeline) = self
                    .programs
                    .get(&draw.program)
                    .and_then(|p| p.pipelines.get(&draw.key))
                else {
                    continue;
                };
                let (Some(vertices), Some(indices)) =
                    (self.buffers.get(&draw.vertex), self.buffers.get(&draw.index))
                else {
                    continue;
                };
                let Some((x, y, width, height)) = self.clamp_viewport(draw.viewport) else {
                    continue;
                };

                pass.set_pipeline(pipeline);
                pass.set_bind_group(0, &self.uniform_bind_group, &[]);
                pass.set_viewport(x, y, width, height, 0.0, 1.0);
                pass.set_vertex_buffer(0, vertices.buffer.slice(..));
                pass.set_index_buffer(indices.buffer.slice(..), wgpu::IndexFormat::Uint16);
                pass.draw_indexed(0..draw.index_count, 0, 0..1);
            }
        }

        encoder.finish()
    }

    /// Keeps the viewport inside the surface; wgpu rejects anything larger.
    fn clamp_viewport(&self, viewport: Viewport) -> Option<(f32, f32, f32, f32)> {
        let x = viewport.x.min(self.config.width);
        let y = viewport.y.min(self.config.height);
        let width = viewport.width.min(self.config.width - x);
        let height = viewport.height.min(self.config.height - y);
        if width == 0 || height == 0 {
            return None;
        }
        Some((x as f32, y as f32, width as f32, height as f32))
    }

    fn create_instance() -> wgpu::Instance {
        wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        })
    }

    async fn request_adapter(
        instance: &wgpu::Instance,
        surface: &wgpu::Surface<'static>,
    ) -> Result<wgpu::Adapter> {
        Ok(instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::LowPower,
                compatible_surface: Some(surface),
                force_fallback_adapter: false,
            })
            .await?)
    }

    async fn request_device(adapter: &wgpu::Adapter) -> Result<(wgpu::Device, wgpu::Queue)> {
        Ok(adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
                experimental_features: wgpu::ExperimentalFeatures::default(),
            })
            .await?)
    }

    fn create_surface_config(
        surface: &wgpu::Surface,
        adapter: &wgpu::Adapter,
        size: winit::dpi::PhysicalSize<u32>,
    ) -> wgpu::SurfaceConfiguration {
        let caps = surface.get_capabilities(adapter);
        // Vertex colors go out unconverted, as with a plain GL framebuffer.
        let format = caps
            .formats
            .iter()
            .find(|f| !f.is_srgb())
            .copied()
            .unwrap_or(caps.formats[0]);

        wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width,
            height: size.height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        }
    }

    fn create_uniform_buffer(device: &wgpu::Device) -> wgpu::Buffer {
        device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("MVP Buffer"),
            contents: MvpUniform::default().as_bytes(),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        })
    }

    fn create_uniform_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("MVP Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: MVP_BINDING,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(MvpUniform::SIZE),
                },
                count: None,
            }],
        })
    }

    fn create_uniform_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        buffer: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("MVP Bind Group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: MVP_BINDING,
                resource: buffer.as_entire_binding(),
            }],
        })
    }

    fn create_pipeline(
        device: &wgpu::Device,
        layout: &wgpu::PipelineLayout,
        program: &Program,
        attributes: &AttributeLayout,
        flags: RenderFlags,
        format: wgpu::TextureFormat,
    ) -> wgpu::RenderPipeline {
        log::debug!("building pipeline for `{}` with {:?}", program.label, flags);

        let (depth_compare, depth_write_enabled) = if flags.depth_test {
            (wgpu::CompareFunction::Less, true)
        } else {
            (wgpu::CompareFunction::Always, false)
        };

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&program.label),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: &program.module,
                entry_point: Some(&program.vertex_entry),
                buffers: &[attributes.buffer_layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &program.module,
                entry_point: Some(&program.fragment_entry),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: flags.blend.then_some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: flags.cull_face.map(|face| match face {
                    CullFace::Front => wgpu::Face::Front,
                    CullFace::Back => wgpu::Face::Back,
                }),
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled,
                depth_compare,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        })
    }

    fn create_depth_view(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
    ) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth Texture"),
            size: wgpu::Extent3d {
                width: config.width,
                height: config.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }
}

impl GpuBackend for WgpuBackend {
    fn link_program(&mut self, shader: &ShaderSource<'_>) -> Result<ProgramId, GpuError> {
        for (stage, entry) in [
            ("@vertex", shader.vertex_entry),
            ("@fragment", shader.fragment_entry),
        ] {
            if !shader.source.contains(&format!("fn {entry}(")) {
                return Err(GpuError::ProgramLink {
                    label: shader.label.to_string(),
                    reason: format!("no {stage} fn `{entry}`"),
                });
            }
        }

        let module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(shader.label),
                source: wgpu::ShaderSource::Wgsl(shader.source.into()),
            });

        let id = ProgramId(self.next_handle());
        self.programs.insert(
            id,
            Program {
                label: shader.label.to_string(),
                module,
                vertex_entry: shader.vertex_entry.to_string(),
                fragment_entry: shader.fragment_entry.to_string(),
                pipelines: HashMap::new(),
            },
        );
        Ok(id)
    }

    fn attrib_location(&self, program: ProgramId, name: &str) -> Option<u32> {
        if !self.programs.contains_key(&program) {
            return None;
        }
        shader::attribute_location(name)
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<u32> {
        if !self.programs.contains_key(&program) {
            return None;
        }
        shader::uniform_binding(name)
    }

    fn create_static_buffer(
        &mut self,
        target: BufferTarget,
        label: &str,
        contents: &[u8],
    ) -> Result<BufferId, GpuError> {
        if contents.is_empty() {
            return Err(GpuError::BufferUpload {
                label: label.to_string(),
                reason: "no data".to_string(),
            });
        }

        let usage = match target {
            BufferTarget::Vertex => wgpu::BufferUsages::VERTEX,
            BufferTarget::Index => wgpu::BufferUsages::INDEX,
        };
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents,
                usage,
            });

        let id = BufferId(self.next_handle());
        log::debug!("uploaded `{}` ({} bytes) as {:?}", label, contents.len(), id);
        self.buffers.insert(id, StaticBuffer { target, buffer });
        Ok(id)
    }

    fn set_render_flags(&mut self, flags: RenderFlags) {
        self.flags = flags;
    }

    fn set_clear_color(&mut self, [r, g, b, a]: [f32; 4]) {
        self.clear_color = wgpu::Color {
            r: r as f64,
            g: g as f64,
            b: b as f64,
            a: a as f64,
        };
    }

    fn set_clear_depth(&mut self, depth: f32) {
        self.clear_depth = depth;
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    fn clear(&mut self) {
        // Anything drawn earlier in the frame would be wiped by this clear.
        self.frame.draws.clear();
        self.frame.clear = Some((self.clear_color, self.clear_depth));
    }

    fn use_program(&mut self, program: ProgramId) {
        self.bound.program = Some(program);
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: BufferId) {
        match self.buffers.get(&buffer) {
            Some(b) if b.target == target => {}
            Some(b) => log::warn!("{:?} bound as {:?} but created as {:?}", buffer, target, b.target),
            None => log::warn!("binding unknown {:?}", buffer),
        }
        match target {
            BufferTarget::Vertex => self.bound.vertex = Some(buffer),
            BufferTarget::Index => self.bound.index = Some(buffer),
        }
    }

    fn vertex_attrib_pointer(&mut self, location: u32, pointer: AttribPointer) {
        self.bound.attributes.insert(location, pointer);
    }

    fn uniform_matrix(&mut self, location: u32, matrix: &Matrix) {
        if location != MVP_BINDING {
            log::trace!("ignoring matrix for unknown uniform slot {}", location);
            return;
        }
        self.queue.write_buffer(
            &self.uniform_buffer,
            0,
            MvpUniform::from_matrix(matrix).as_bytes(),
        );
    }

    fn draw_indexed(&mut self, index_count: u32) {
        let (Some(program_id), Some(vertex), Some(index)) =
            (self.bound.program, self.bound.vertex, self.bound.index)
        else {
            log::warn!("draw skipped: program or buffers not bound");
            return;
        };
        let Some(program) = self.programs.get_mut(&program_id) else {
            log::warn!("draw skipped: {:?} was deleted", program_id);
            return;
        };

        let layout = AttributeLayout::from_pointers(&self.bound.attributes);
        if let Some(missing) = shader::VERTEX_INPUTS
            .into_iter()
            .find(|location| !layout.covers(*location))
        {
            if !self.warned_unbound {
                log::warn!("draw skipped: vertex input {} has no attribute pointer", missing);
                self.warned_unbound = true;
            }
            return;
        }

        let key = PipelineKey {
            flags: self.flags,
            attributes: self.bound.attributes.iter().map(|(l, p)| (*l, *p)).collect(),
        };
        if !program.pipelines.contains_key(&key) {
            let pipeline = Self::create_pipeline(
                &self.device,
                &self.pipeline_layout,
                program,
                &layout,
                self.flags,
                self.config.format,
            );
            program.pipelines.insert(key.clone(), pipeline);
        }

        self.frame.draws.push(DrawCall {
            program: program_id,
            key,
            vertex,
            index,
            index_count,
            viewport: self.viewport,
        });
    }

    fn delete_program(&mut self, program: ProgramId) {
        if self.programs.remove(&program).is_some() {
            log::debug!("deleted {:?}", program);
        }
        if self.bound.program == Some(program) {
            self.bound.program = None;
        }
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        if let Some(b) = self.buffers.remove(&buffer) {
            b.buffer.destroy();
            log::debug!("deleted {:?}", buffer);
        }
        if self.bound.vertex == Some(buffer) {
            self.bound.vertex = None;
        }
        if self.bound.index == Some(buffer) {
            self.bound.index = None;
        }
    }

    fn present(&mut self) -> Result<(), GpuError> {
        let frame = std::mem::take(&mut self.frame);

        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.reconfigure();
                return Err(GpuError::SurfaceLost);
            }
            Err(wgpu::SurfaceError::Timeout) => return Err(GpuError::SurfaceTimeout),
            Err(wgpu::SurfaceError::OutOfMemory) => return Err(GpuError::OutOfMemory),
            Err(e) => return Err(GpuError::Surface(e.to_string())),
        };

        let view = output.texture.create_view(&Default::default());
        let commands = self.record_pass(&frame, &view);
        self.queue.submit(std::iter::once(commands));
        output.present();
        Ok(())
    }
}
