//! Ground-following character movement.
//!
//! Speeds are in world units per millisecond and the controller is stepped
//! with the elapsed milliseconds of the frame.

use engine_core::{MovementIntent, Transform};
use glam::{Vec2, Vec3};
use terrain::Ground;

/// Tunables for [`GroundedMovement`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementConfig {
    pub forward_speed: f32,
    pub side_speed: f32,
    /// Vertical acceleration, units/ms^2.
    pub gravity: f32,
    pub jump_power: f32,
    /// Airborne entities this close above the ground are snapped down.
    pub downhill_tolerance: f32,
    /// Applied to both axes when moving diagonally.
    pub diagonal_factor: f32,
    pub sprint_multiplier: f32,
    pub sprint_jump_multiplier: f32,
    /// Degrees of turn per unit of mouse motion.
    pub look_sensitivity: f32,
    /// Inclusive `(min, max)` clamp for X and Z.
    pub bounds: Option<(f32, f32)>,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            forward_speed: 0.015,
            side_speed: 0.01,
            gravity: -0.00015,
            jump_power: 0.04,
            downhill_tolerance: 0.04,
            diagonal_factor: 0.7,
            sprint_multiplier: 10.0,
            sprint_jump_multiplier: 5.0,
            look_sensitivity: 0.1,
            bounds: Some((35.0, 765.0)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GroundState {
    #[default]
    Grounded,
    Airborne,
}

/// Per-entity movement state, kept next to the entity it drives.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MovementState {
    pub forward_speed: f32,
    pub side_speed: f32,
    pub vertical_speed: f32,
    pub ground: GroundState,
    /// Degrees; positive looks down.
    pub head_pitch: f32,
}

impl MovementState {
    pub fn airborne() -> Self {
        Self {
            ground: GroundState::Airborne,
            ..Default::default()
        }
    }

    pub fn is_grounded(&self) -> bool {
        self.ground == GroundState::Grounded
    }
}

/// Moves an entity over a height field with a jump/fall state machine.
#[derive(Debug, Clone, Copy, Default)]
pub struct GroundedMovement {
    pub config: MovementConfig,
}

impl GroundedMovement {
    pub fn new(config: MovementConfig) -> Self {
        Self { config }
    }

    /// Turn the body and tilt the head from mouse motion.
    pub fn look(&self, transform: &mut Transform, state: &mut MovementState, delta: Vec2, sensitivity: f32) {
        let scale = self.config.look_sensitivity * sensitivity;
        transform.rotate(Vec3::new(0.0, -delta.x * scale, 0.0));
        state.head_pitch -= delta.y * scale;
    }

    /// Intent is only read on the ground; in the air the last speeds carry on.
    fn apply_intent(&self, state: &mut MovementState, intent: &MovementIntent) {
        if !state.is_grounded() {
            return;
        }
        let c = &self.config;
        state.forward_speed = c.forward_speed * axis(intent.forward);
        state.side_speed = c.side_speed * axis(intent.side);
        if intent.jump {
            state.vertical_speed = c.jump_power;
            state.ground = GroundState::Airborne;
        }
        if intent.sprint {
            state.forward_speed *= c.sprint_multiplier;
            state.vertical_speed *= c.sprint_jump_multiplier;
        }
    }

    /// Advance one tick of `dt_ms` milliseconds and reconcile with the ground.
    pub fn step(
        &self,
        transform: &mut Transform,
        state: &mut MovementState,
        intent: &MovementIntent,
        dt_ms: f32,
        ground: &impl Ground,
    ) {
        let c = &self.config;
        self.look(transform, state, intent.look, 1.0);
        self.apply_intent(state, intent);

        let forward = state.forward_speed * dt_ms;
        let side = state.side_speed * dt_ms;
        let (sin, cos) = transform.rot_y().to_radians().sin_cos();
        let mut dx = sin * forward - cos * side;
        let mut dz = cos * forward + sin * side;
        if forward != 0.0 && side != 0.0 {
            dx *= c.diagonal_factor;
            dz *= c.diagonal_factor;
        }

        state.vertical_speed += c.gravity * dt_ms;
        transform.translate(Vec3::new(dx, state.vertical_speed * dt_ms, dz));

        // Clamp first so the height is sampled where the entity ends up.
        let position = &mut transform.position;
        if let Some((min, max)) = c.bounds {
            position.x = position.x.clamp(min, max);
            position.z = position.z.clamp(min, max);
        }

        let height = ground.height_at(position.x, position.z);
        if position.y <= height {
            if state.ground == GroundState::Airborne {
                log::trace!("Landed at {:?}", *position);
            }
            state.vertical_speed = 0.0;
            state.ground = GroundState::Grounded;
            position.y = height;
        } else if state.is_grounded() || position.y < height + c.downhill_tolerance {
            state.vertical_speed = 0.0;
            position.y = height;
        }
    }
}

/// Collapse an analog axis to -1, 0 or 1.
fn axis(value: f32) -> f32 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}
