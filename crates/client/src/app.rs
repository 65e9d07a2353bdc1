use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use spincube::{
    AppEvent, DemoConfig, GpuBackend, GpuError, Key, LoopAction, LoopState, RenderSession,
};
use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Fullscreen, Window, WindowId};

use crate::render::WgpuBackend;

pub struct App {
    config: DemoConfig,
    window: Option<Arc<Window>>,
    gpu: Option<WgpuBackend>,
    session: Option<RenderSession>,
    loop_state: LoopState,
    setup_error: Option<anyhow::Error>,
}

impl App {
    pub fn new(config: DemoConfig) -> Self {
        let loop_state = LoopState::new(config.background_delay);
        Self {
            config,
            window: None,
            gpu: None,
            session: None,
            loop_state,
            setup_error: None,
        }
    }

    /// Returns the error that stopped startup, if any.
    pub fn finish(self) -> anyhow::Result<()> {
        match self.setup_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn setup(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let mut attrs = Window::default_attributes()
            .with_title(&self.config.title)
            .with_inner_size(winit::dpi::PhysicalSize::new(
                self.config.width,
                self.config.height,
            ));
        if self.config.fullscreen {
            attrs = attrs.with_fullscreen(Some(Fullscreen::Borderless(None)));
        }

        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("failed to create window")?,
        );

        let rt = tokio::runtime::Builder::new_current_thread()
            .build()
            .context("failed to start async runtime")?;
        let mut gpu = rt
            .block_on(WgpuBackend::new(window.clone()))
            .context("failed to initialize GPU")?;

        let size = gpu.size;
        let session = RenderSession::initialize(&mut gpu, &self.config, size.width, size.height)
            .context("failed to set up rendering")?;

        self.window = Some(window);
        self.gpu = Some(gpu);
        self.session = Some(session);
        Ok(())
    }

    fn handle_resize(&mut self, size: winit::dpi::PhysicalSize<u32>) {
        let (Some(gpu), Some(session)) = (&mut self.gpu, &mut self.session) else {
            return;
        };
        gpu.resize(size);
        session.resize(gpu, size.width, size.height);
    }

    fn handle_frame(&mut self, event_loop: &ActiveEventLoop) {
        match self.loop_state.poll() {
            LoopAction::Render => {
                event_loop.set_control_flow(ControlFlow::Poll);
                self.render();
            }
            LoopAction::Throttle(delay) => {
                event_loop.set_control_flow(ControlFlow::WaitUntil(Instant::now() + delay));
            }
            LoopAction::Exit => {
                self.shutdown();
                event_loop.exit();
            }
        }
    }

    fn render(&mut self) {
        let (Some(gpu), Some(session)) = (&mut self.gpu, &mut self.session) else {
            return;
        };

        session.render_frame(gpu);
        match gpu.present() {
            Ok(()) => {}
            Err(GpuError::SurfaceLost) => log::warn!("surface reconfigured, frame dropped"),
            Err(GpuError::SurfaceTimeout) => log::debug!("surface timeout, frame dropped"),
            Err(GpuError::OutOfMemory) => {
                log::error!("out of GPU memory, quitting");
                self.loop_state.push(AppEvent::Quit);
            }
            Err(e) => log::error!("present failed: {e}"),
        }
    }

    fn shutdown(&mut self) {
        let (Some(session), Some(gpu)) = (self.session.take(), &mut self.gpu) else {
            return;
        };
        log::info!("finalizing after {} frames", session.frame_count());
        if let Err(e) = session.finalize(gpu) {
            log::warn!("final present failed: {e}");
        }
    }
}

fn map_key(key: PhysicalKey) -> Key {
    match key {
        PhysicalKey::Code(KeyCode::ArrowLeft) => Key::Left,
        _ => Key::Other,
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            self.loop_state.push(AppEvent::EnteredForeground);
            return;
        }
        if self.setup_error.is_some() {
            return;
        }

        if let Err(e) = self.setup(event_loop) {
            log::error!("{e:#}");
            self.setup_error = Some(e);
            event_loop.exit();
        }
    }

    fn suspended(&mut self, _event_loop: &ActiveEventLoop) {
        self.loop_state.push(AppEvent::EnteredBackground);
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.loop_state.push(AppEvent::Quit),
            WindowEvent::Occluded(occluded) => self.loop_state.push(if occluded {
                AppEvent::EnteredBackground
            } else {
                AppEvent::EnteredForeground
            }),
            WindowEvent::Resized(size) => self.handle_resize(size),
            WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
                self.loop_state
                    .push(AppEvent::KeyDown(map_key(event.physical_key)));
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.session.is_none() {
            return;
        }
        self.handle_frame(event_loop);
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.shutdown();
        self.gpu = None;
        self.window = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::keyboard::NativeKeyCode;

    #[test]
    fn only_left_arrow_maps_to_left() {
        assert_eq!(map_key(PhysicalKey::Code(KeyCode::ArrowLeft)), Key::Left);
        assert_eq!(map_key(PhysicalKey::Code(KeyCode::ArrowRight)), Key::Other);
        assert_eq!(map_key(PhysicalKey::Code(KeyCode::Escape)), Key::Other);
        assert_eq!(
            map_key(PhysicalKey::Unidentified(NativeKeyCode::Unidentified)),
            Key::Other
        );
    }
}
