//! Scatters plants over the terrain from a vegetation map: light pixels
//! grow plants, dark pixels stay bare.

use engine_core::{Entity, ModelHandle};
use glam::Vec3;
use rand::Rng;
use terrain::{Ground, Heightmap, TERRAIN_SIZE};

/// Random offset applied to each plant, in world units either way.
const JITTER: f32 = 2.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlantKind {
    BigTree,
    Oak,
    Fir,
    Flower,
    Bush,
    Grass,
}

impl PlantKind {
    pub const ALL: [PlantKind; 6] = [
        PlantKind::BigTree,
        PlantKind::Oak,
        PlantKind::Fir,
        PlantKind::Flower,
        PlantKind::Bush,
        PlantKind::Grass,
    ];

    /// Model and texture name inside the asset directory.
    pub fn asset_name(self) -> &'static str {
        match self {
            PlantKind::BigTree => "trees/bigtree1",
            PlantKind::Oak => "trees/oak1",
            PlantKind::Fir => "trees/christmastree",
            PlantKind::Flower => "trees/flower",
            PlantKind::Bush => "assets/bush",
            PlantKind::Grass => "assets/grass",
        }
    }

    /// Share of spawned plants of this kind.
    pub fn weight(self) -> f32 {
        match self {
            PlantKind::BigTree | PlantKind::Oak | PlantKind::Flower => 0.1,
            PlantKind::Fir | PlantKind::Bush => 0.05,
            PlantKind::Grass => 0.6,
        }
    }

    /// `(min, max)` uniform scale.
    pub fn scale_range(self) -> (f32, f32) {
        match self {
            PlantKind::BigTree => (2.0, 4.0),
            PlantKind::Oak => (36.0, 42.0),
            PlantKind::Fir => (25.0, 31.0),
            PlantKind::Flower => (15.0, 19.0),
            PlantKind::Bush => (15.0, 35.0),
            PlantKind::Grass => (8.0, 18.0),
        }
    }

    /// Grass and flowers are alpha-cut quads.
    pub fn is_transparent(self) -> bool {
        matches!(self, PlantKind::Flower | PlantKind::Grass)
    }

    /// Map a roll in `[0, 1)` onto the weighted kinds.
    pub fn pick(roll: f32) -> PlantKind {
        let mut threshold = 0.0;
        for kind in Self::ALL {
            threshold += kind.weight();
            if roll < threshold {
                return kind;
            }
        }
        PlantKind::Grass
    }
}

/// One entity per pixel that passes its `(1 - darkness) * density` roll.
pub fn scatter(
    map: &Heightmap,
    ground: &impl Ground,
    density: f32,
    rng: &mut impl Rng,
    model_for: impl Fn(PlantKind) -> ModelHandle,
) -> Vec<Entity> {
    let count = map.resolution();
    let cell = TERRAIN_SIZE / count as f32;
    let mut plants = Vec::new();

    for i in 0..count {
        for j in 0..count {
            let chance = (1.0 - map.darkness(j as i64, i as i64)) * density;
            if chance <= rng.gen::<f32>() {
                continue;
            }

            let kind = PlantKind::pick(rng.gen());
            let (min, max) = kind.scale_range();
            let scale = min + rng.gen::<f32>() * (max - min);
            let x = cell * j as f32 + rng.gen_range(-JITTER..JITTER);
            let z = cell * i as f32 + rng.gen_range(-JITTER..JITTER);
            let yaw = rng.gen::<f32>() * 360.0;

            let position = Vec3::new(x, ground.height_at(x, z), z);
            plants.push(Entity::new(model_for(kind), position, Vec3::new(0.0, yaw, 0.0), scale));
        }
    }

    log::info!("Scattered {} plants over {}x{} cells", plants.len(), count, count);
    plants
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};
    use terrain::pack_argb;

    struct Slope;

    impl Ground for Slope {
        fn height_at(&self, x: f32, _z: f32) -> f32 {
            x * 0.01
        }
    }

    fn uniform_map(resolution: usize, value: u8) -> Heightmap {
        Heightmap::from_pixels(resolution, vec![pack_argb(value, value, value); resolution * resolution]).unwrap()
    }

    fn handle(kind: PlantKind) -> ModelHandle {
        ModelHandle(PlantKind::ALL.iter().position(|k| *k == kind).unwrap() as u32)
    }

    #[test]
    fn weights_sum_to_one() {
        let total: f32 = PlantKind::ALL.iter().map(|k| k.weight()).sum();
        assert!((total - 1.0).abs() < 1e-6);
    }

    #[test]
    fn pick_follows_cumulative_weights() {
        assert_eq!(PlantKind::pick(0.0), PlantKind::BigTree);
        assert_eq!(PlantKind::pick(0.15), PlantKind::Oak);
        assert_eq!(PlantKind::pick(0.22), PlantKind::Fir);
        assert_eq!(PlantKind::pick(0.3), PlantKind::Flower);
        assert_eq!(PlantKind::pick(0.38), PlantKind::Bush);
        assert_eq!(PlantKind::pick(0.41), PlantKind::Grass);
        assert_eq!(PlantKind::pick(0.999), PlantKind::Grass);
    }

    #[test]
    fn black_map_grows_nothing() {
        let mut rng = StdRng::seed_from_u64(1);
        let plants = scatter(&uniform_map(16, 0), &Slope, 1.0, &mut rng, handle);
        assert!(plants.is_empty());
    }

    #[test]
    fn white_map_fills_every_cell() {
        let mut rng = StdRng::seed_from_u64(2);
        // A chance above 1 beats every roll.
        let plants = scatter(&uniform_map(8, 255), &Slope, 2.0, &mut rng, handle);
        assert_eq!(plants.len(), 64);

        for plant in &plants {
            let p = plant.position();
            assert!(p.x >= -JITTER && p.x <= 700.0 + JITTER);
            assert!(p.z >= -JITTER && p.z <= 700.0 + JITTER);
            assert!((p.y - p.x * 0.01).abs() < 1e-5);

            let kind = PlantKind::ALL[plant.model.0 as usize];
            let (min, max) = kind.scale_range();
            assert!(plant.transform.scale >= min && plant.transform.scale <= max);
            assert!((0.0..360.0).contains(&plant.transform.rotation.y));
        }
    }

    #[test]
    fn same_seed_same_forest() {
        let map = uniform_map(32, 200);
        let a = scatter(&map, &Slope, 0.3, &mut StdRng::seed_from_u64(9), handle);
        let b = scatter(&map, &Slope, 0.3, &mut StdRng::seed_from_u64(9), handle);
        assert_eq!(a, b);
        assert!(!a.is_empty());
    }
}
