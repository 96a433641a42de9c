//! One-way day to night transition.

use glam::Vec3;

/// Fade value nightfall starts from once triggered.
pub const NIGHT_START_FADE: f32 = 0.0003;
/// Fade gained per millisecond.
pub const NIGHT_FADE_SPEED: f32 = 0.00002;
/// Walking past this X brings on the night.
pub const NIGHT_TRIGGER_X: f32 = 600.0;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DayNight {
    fade: f32,
}

impl DayNight {
    pub fn new() -> Self {
        Self::default()
    }

    /// 0 is full day, 1 full night.
    pub fn fade(&self) -> f32 {
        self.fade
    }

    pub fn is_night(&self) -> bool {
        self.fade >= 1.0
    }

    /// Advance by `dt_ms`. `trigger` only matters while it is still day.
    pub fn update(&mut self, dt_ms: f32, trigger: bool) {
        if self.fade >= 1.0 {
            return;
        }
        if self.fade > 0.0 {
            self.fade = (self.fade + NIGHT_FADE_SPEED * dt_ms).min(1.0);
            if self.fade >= 1.0 {
                log::info!("Night has fallen");
            }
        } else if trigger {
            log::info!("Night is falling");
            self.fade = NIGHT_START_FADE;
        }
    }

    /// The sun dims to black as night falls.
    pub fn sun_color(&self) -> Vec3 {
        Vec3::splat(1.0 - self.fade)
    }

    /// At full night the tree light steps red, green, blue once a second.
    pub fn tree_light_color(&self, now_millis: u64) -> Option<Vec3> {
        if !self.is_night() {
            return None;
        }
        Some(match (now_millis / 1000) % 3 {
            0 => Vec3::X,
            1 => Vec3::Y,
            _ => Vec3::Z,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stays_day_until_triggered() {
        let mut cycle = DayNight::new();
        for _ in 0..100 {
            cycle.update(16.0, false);
        }
        assert_eq!(cycle.fade(), 0.0);
        assert_eq!(cycle.sun_color(), Vec3::ONE);
        assert_eq!(cycle.tree_light_color(5000), None);
    }

    #[test]
    fn trigger_seeds_then_fades_without_it() {
        let mut cycle = DayNight::new();
        cycle.update(16.0, true);
        assert_eq!(cycle.fade(), NIGHT_START_FADE);

        cycle.update(1000.0, false);
        assert!((cycle.fade() - (NIGHT_START_FADE + 0.02)).abs() < 1e-6);
        assert!((cycle.sun_color().x - (1.0 - cycle.fade())).abs() < 1e-6);
    }

    /// About 50 s from trigger to full night, then it stays there.
    #[test]
    fn reaches_full_night_and_clamps() {
        let mut cycle = DayNight::new();
        cycle.update(0.0, true);
        for _ in 0..60 {
            cycle.update(1000.0, false);
        }
        assert_eq!(cycle.fade(), 1.0);
        assert!(cycle.is_night());
        assert_eq!(cycle.sun_color(), Vec3::ZERO);
        cycle.update(1000.0, true);
        assert_eq!(cycle.fade(), 1.0);
    }

    #[test]
    fn tree_light_cycles_each_second() {
        let mut cycle = DayNight::new();
        cycle.update(0.0, true);
        cycle.update(60_000.0, false);
        assert_eq!(cycle.tree_light_color(0), Some(Vec3::X));
        assert_eq!(cycle.tree_light_color(1500), Some(Vec3::Y));
        assert_eq!(cycle.tree_light_color(2999), Some(Vec3::Z));
        assert_eq!(cycle.tree_light_color(3000), Some(Vec3::X));
    }
}
