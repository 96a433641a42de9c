//! Screen-to-terrain picking.

use engine_core::Camera;
use glam::{Mat4, Vec2, Vec3, Vec4};
use terrain::Ground;

/// Furthest distance along the ray that is searched.
pub const RAY_RANGE: f32 = 600.0;
/// Number of bisection steps.
pub const RECURSION_COUNT: u32 = 200;

/// Window pixel position to normalized device coordinates. Window Y grows
/// downwards, NDC Y upwards.
pub fn ndc_from_pointer(pointer: Vec2, width: f32, height: f32) -> Vec2 {
    Vec2::new(2.0 * pointer.x / width - 1.0, 1.0 - 2.0 * pointer.y / height)
}

/// Unit world-space direction through `ndc` for the given matrices.
pub fn world_ray(ndc: Vec2, projection: &Mat4, view: &Mat4) -> Vec3 {
    let clip = Vec4::new(ndc.x, ndc.y, -1.0, 1.0);
    let eye = projection.inverse() * clip;
    // Forward direction, not a point.
    let eye = Vec4::new(eye.x, eye.y, -1.0, 0.0);
    let world = view.inverse() * eye;
    world.truncate().normalize()
}

/// Result of a terrain pick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    /// Distance along the ray to the hit point.
    pub distance: f32,
    /// World position of the hit.
    pub point: Vec3,
}

fn is_under_ground(point: Vec3, ground: &impl Ground) -> bool {
    point.y < ground.height_at(point.x, point.z)
}

/// `true` when the ray is above ground at `start` and below it at `finish`.
fn crosses_ground(origin: Vec3, ray: Vec3, start: f32, finish: f32, ground: &impl Ground) -> bool {
    !is_under_ground(origin + ray * start, ground) && is_under_ground(origin + ray * finish, ground)
}

/// Bisect `[0, RAY_RANGE]` for the point where the ray enters the ground.
///
/// Only the two ends of each sub-range are tested, so a ray that dips under
/// a ridge and comes back out before `RAY_RANGE` is not reported.
pub fn intersect_ground(origin: Vec3, ray: Vec3, ground: &impl Ground) -> Option<RaycastHit> {
    if !crosses_ground(origin, ray, 0.0, RAY_RANGE, ground) {
        return None;
    }
    let (mut start, mut finish) = (0.0_f32, RAY_RANGE);
    for _ in 0..RECURSION_COUNT {
        let half = start + (finish - start) / 2.0;
        if crosses_ground(origin, ray, start, half, ground) {
            finish = half;
        } else {
            start = half;
        }
    }
    let distance = start + (finish - start) / 2.0;
    Some(RaycastHit {
        distance,
        point: origin + ray * distance,
    })
}

/// Tracks the terrain point under the pointer.
#[derive(Debug, Clone, Default)]
pub struct MousePicker {
    current_ray: Vec3,
    current_point: Option<Vec3>,
}

impl MousePicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute the ray and the terrain point under `pointer_ndc`.
    pub fn update(
        &mut self,
        camera: &Camera,
        projection: &Mat4,
        pointer_ndc: Vec2,
        ground: &impl Ground,
    ) -> Option<Vec3> {
        self.current_ray = world_ray(pointer_ndc, projection, &camera.view_matrix());
        self.current_point = intersect_ground(camera.position, self.current_ray, ground).map(|hit| hit.point);
        self.current_point
    }

    pub fn current_ray(&self) -> Vec3 {
        self.current_ray
    }

    pub fn current_point(&self) -> Option<Vec3> {
        self.current_point
    }
}
