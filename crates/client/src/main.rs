mod app;
mod render;

use spincube::DemoConfig;
use winit::event_loop::EventLoop;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let event_loop = EventLoop::new()?;
    let mut app = app::App::new(DemoConfig::default());
    event_loop.run_app(&mut app)?;
    app.finish()
}
