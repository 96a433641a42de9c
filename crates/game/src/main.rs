//! First-person walk over a heightmapped island: vegetation, birds, a day/night
//! cycle and a handful of props, rendered with wgpu.

mod config;
mod day_night;
mod events;
mod resources;
mod scene;
mod state;
mod vegetation;

use anyhow::Result;
use std::sync::Arc;
use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, DeviceId, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Fullscreen, Window, WindowId},
};

use state::GameState;

/// Application handler for winit.
struct App {
    state: Option<GameState>,
    /// Startup failure, returned from `main` once the loop has stopped.
    init_error: Option<anyhow::Error>,
}

impl App {
    fn new() -> Self {
        Self {
            state: None,
            init_error: None,
        }
    }

    /// Outcome of the run once the event loop has returned.
    fn finish(mut self) -> Result<()> {
        match self.init_error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        let config = config::GameConfig::load();
        let mut window_attrs = Window::default_attributes()
            .with_title("Terrain Engine")
            .with_inner_size(winit::dpi::LogicalSize::new(config.window_width, config.window_height));
        if config.fullscreen {
            window_attrs = window_attrs.with_fullscreen(Some(Fullscreen::Borderless(None)));
        }

        let window = match event_loop.create_window(window_attrs) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                log::error!("Failed to create window: {}", e);
                self.init_error = Some(anyhow::anyhow!("creating window: {e}"));
                event_loop.exit();
                return;
            }
        };

        match pollster::block_on(GameState::new(window.clone(), config)) {
            Ok(s) => {
                self.state = Some(s);
                window.request_redraw();
            }
            Err(e) => {
                log::error!("Failed to initialize game: {:#}", e);
                self.init_error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if let Some(state) = &mut self.state {
            if state.handle_window_event(event) || !state.running {
                event_loop.exit();
            }
        }
    }

    fn device_event(&mut self, _: &ActiveEventLoop, _: DeviceId, event: DeviceEvent) {
        if let Some(state) = &mut self.state {
            state.handle_device_event(event);
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("╔══════════════════════════════════════════════════════╗");
    println!("║                    Terrain Engine                    ║");
    println!("╠══════════════════════════════════════════════════════╣");
    println!("║  CONTROLS:                                           ║");
    println!("║    Click      - Grab cursor  │  Mouse  - Look around ║");
    println!("║    WASD       - Move         │  Space  - Jump        ║");
    println!("║    Left Ctrl  - Sprint       │  Click  - Plant flower║");
    println!("║    N          - Nightfall    │  I      - Dragon      ║");
    println!("║    Escape     - Release cursor, press again to quit  ║");
    println!("╚══════════════════════════════════════════════════════╝");

    log::info!("Starting terrain engine");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new();
    event_loop.run_app(&mut app)?;

    app.finish()
}
