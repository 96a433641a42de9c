//! Common components used across the engine.

use glam::{Vec2, Vec3};

use crate::{ModelHandle, Transform};

/// A placed instance of a registered model.
///
/// Many entities may share one [`ModelHandle`]; the renderer batches by it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Entity {
    pub model: ModelHandle,
    pub transform: Transform,
    /// Cell in the model texture's atlas, row-major.
    pub texture_index: u32,
}

impl Entity {
    pub fn new(model: ModelHandle, position: Vec3, rotation: Vec3, scale: f32) -> Self {
        Self {
            model,
            transform: Transform::new(position, rotation, scale),
            texture_index: 0,
        }
    }

    pub fn with_texture_index(mut self, index: u32) -> Self {
        self.texture_index = index;
        self
    }

    /// UV offset of this entity's atlas cell for an atlas of `rows` x `rows`.
    pub fn texture_offset(&self, rows: u32) -> Vec2 {
        let rows = rows.max(1);
        let column = self.texture_index % rows;
        let row = self.texture_index / rows;
        Vec2::new(column as f32 / rows as f32, row as f32 / rows as f32)
    }

    pub fn position(&self) -> Vec3 {
        self.transform.position
    }
}

/// Tag component for the player entity.
#[derive(Debug, Clone, Copy, Default)]
pub struct Player;

/// Maximum number of lights a single draw call consumes.
pub const MAX_LIGHTS: usize = 4;

/// Point light. Attenuation is `(constant, linear, quadratic)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub position: Vec3,
    pub color: Vec3,
    pub attenuation: Vec3,
}

impl Light {
    /// Light without distance falloff.
    pub fn new(position: Vec3, color: Vec3) -> Self {
        Self {
            position,
            color,
            attenuation: Vec3::X,
        }
    }

    pub fn with_attenuation(position: Vec3, color: Vec3, attenuation: Vec3) -> Self {
        Self {
            position,
            color,
            attenuation,
        }
    }

    /// Zero-intensity slot filler.
    pub fn padding() -> Self {
        Self::new(Vec3::ZERO, Vec3::ZERO)
    }
}

/// Fixed-capacity light array handed to each draw.
///
/// Lights beyond [`MAX_LIGHTS`] are ignored; unused slots hold
/// [`Light::padding`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightSet {
    slots: [Light; MAX_LIGHTS],
    active: usize,
}

impl Default for LightSet {
    fn default() -> Self {
        Self {
            slots: [Light::padding(); MAX_LIGHTS],
            active: 0,
        }
    }
}

impl LightSet {
    pub fn from_lights(lights: &[Light]) -> Self {
        let mut set = Self::default();
        for light in lights {
            set.push(*light);
        }
        set
    }

    /// Add a light. Returns `false` when the set is already full.
    pub fn push(&mut self, light: Light) -> bool {
        if self.active == MAX_LIGHTS {
            return false;
        }
        self.slots[self.active] = light;
        self.active += 1;
        true
    }

    pub fn active_count(&self) -> usize {
        self.active
    }

    /// All slots including padding.
    pub fn slots(&self) -> &[Light; MAX_LIGHTS] {
        &self.slots
    }

    pub fn active(&self) -> &[Light] {
        &self.slots[..self.active]
    }
}

/// What the player wants to do this tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MovementIntent {
    /// +1 forwards, -1 backwards.
    pub forward: f32,
    /// +1 strafes right, -1 left.
    pub side: f32,
    pub jump: bool,
    pub sprint: bool,
    /// Raw mouse motion since the last tick.
    pub look: Vec2,
}
