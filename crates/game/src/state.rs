//! Game state: owns the window-bound renderer and drives one tick per redraw.

use std::sync::Arc;

use anyhow::{Context, Result};
use engine_core::{Camera, Entity, FrameClock, Projection, Time};
use glam::Vec2;
use input::{InputState, KeyCode};
use physics::{ndc_from_pointer, GroundedMovement, MousePicker, MovementConfig, MovementState};
use rand::{rngs::StdRng, SeedableRng};
use renderer::{GpuRenderer, MasterRenderer};
use winit::window::{CursorGrabMode, Window};

use crate::config::GameConfig;
use crate::scene::Scene;

pub struct GameState {
    pub(crate) window: Arc<Window>,
    pub(crate) renderer: GpuRenderer,
    pub(crate) master: MasterRenderer,
    pub(crate) input: InputState,
    pub(crate) running: bool,
    config: GameConfig,
    time: Time,
    scene: Scene,
    movement: GroundedMovement,
    picker: MousePicker,
    camera: Camera,
}

impl GameState {
    pub async fn new(window: Arc<Window>, config: GameConfig) -> Result<Self> {
        let mut renderer = GpuRenderer::new(window.clone(), config.vsync)
            .await
            .context("initialising renderer")?;
        let (width, height) = renderer.dimensions();

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let scene = Scene::load(&config, &mut renderer, &mut rng)?;

        let mut master = MasterRenderer::new(Projection::new(width, height));
        master.set_skybox(scene.skybox.0, scene.skybox.1);

        let camera = scene
            .player_transform()
            .map(|t| Camera::follow(&t, 0.0))
            .unwrap_or_default();

        Ok(Self {
            window,
            renderer,
            master,
            input: InputState::new(),
            running: true,
            config,
            time: Time::new(),
            scene,
            movement: GroundedMovement::new(MovementConfig::default()),
            picker: MousePicker::new(),
            camera,
        })
    }

    pub(crate) fn resize(&mut self, width: u32, height: u32) {
        self.renderer.resize(width, height);
        self.master.resize(width, height);
    }

    pub(crate) fn grab_cursor(&mut self, grab: bool) {
        if grab {
            let _ = self
                .window
                .set_cursor_grab(CursorGrabMode::Locked)
                .or_else(|_| self.window.set_cursor_grab(CursorGrabMode::Confined));
        } else {
            let _ = self.window.set_cursor_grab(CursorGrabMode::None);
        }
        self.window.set_cursor_visible(!grab);
        self.input.set_cursor_locked(grab);
    }

    /// One simulation tick.
    pub(crate) fn update(&mut self) {
        self.time.update();
        let dt = self.time.elapsed_millis();
        let playing = self.input.is_cursor_locked();

        if self.input.is_key_pressed(KeyCode::KeyI) {
            self.scene.reveal_dragon();
        }

        // The player only moves while the cursor is grabbed.
        if playing {
            let intent = self.input.movement_intent(self.config.sensitivity);
            let player = self.scene.player;
            if let Ok((entity, state)) = self
                .scene
                .world
                .query_one_mut::<(&mut Entity, &mut MovementState)>(player)
            {
                self.movement
                    .step(&mut entity.transform, state, &intent, dt, &self.scene.terrain);
                self.camera = Camera::follow(&entity.transform, state.head_pitch);
            }
        }

        let night_requested = self.input.is_key_held(KeyCode::KeyN);
        self.scene
            .tick(dt, self.time.now_millis(), night_requested, self.camera.position);
        self.master.set_fade(self.scene.day_night.fade());
        self.master.advance_sky(dt);

        let pointer = if playing {
            Vec2::ZERO
        } else {
            let (width, height) = self.renderer.dimensions();
            ndc_from_pointer(self.input.mouse_position(), width as f32, height as f32)
        };
        let projection = self.master.projection_matrix();
        let point = self
            .picker
            .update(&self.camera, &projection, pointer, &self.scene.terrain);
        if let (Some(point), true) = (point, playing && self.input.is_place_held()) {
            self.scene.place_flower(point);
        }

        // Clear input for next frame
        self.input.begin_frame();
    }

    pub(crate) fn render(&mut self) -> Result<()> {
        self.scene.submit(&mut self.master);
        let stats = self.master.flush(
            &mut self.renderer,
            self.scene.models(),
            &self.scene.lights,
            &self.camera,
        )?;
        if self.time.frame_count() % 600 == 0 {
            log::debug!(
                "{:.0} fps, {} batches, {} draws, {} skipped",
                self.time.fps(),
                stats.batches,
                stats.draw_calls,
                stats.skipped_batches
            );
        }
        Ok(())
    }
}
