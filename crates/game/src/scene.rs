//! The forest level: what is placed where, and the per-tick systems that
//! move things around.

use anyhow::{Context, Result};
use engine_core::{AssetLoader, CubeMapHandle, Entity, Light, Material, ModelRegistry, Player, Transform};
use glam::{Vec2, Vec3};
use hecs::{Entity as EntityId, World};
use physics::MovementState;
use rand::Rng;
use renderer::MasterRenderer;
use terrain::{Ground, Heightmap, Terrain, TerrainTexturePack, TERRAIN_SIZE};

use crate::config::GameConfig;
use crate::day_night::DayNight;
use crate::resources::Resources;
use crate::vegetation::{self, PlantKind};

pub const CAMERA_LAMP: usize = 0;
pub const DINO_LAMP: usize = 1;
pub const SUN: usize = 2;
pub const TREE_LIGHT: usize = 3;

pub const PLAYER_SPAWN: Vec2 = Vec2::new(400.0, 400.0);
/// Lamps hang this far above whatever they follow.
pub const LAMP_HEIGHT: f32 = 7.0;
/// Birds fly this many units per millisecond along their heading.
pub const BIRD_SPEED: f32 = 0.023;

/// Flies along its heading and wraps around the tile.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bird;

/// Circles `center` on the ground, facing along the path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orbit {
    pub center: Vec2,
    pub radius: f32,
    /// Radians.
    pub angle: f32,
    /// Radians per millisecond.
    pub speed: f32,
}

/// Turns about Y at a fixed rate (degrees per millisecond).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spin(pub f32);

/// Not drawn (and not spun) until revealed.
#[derive(Debug, Clone, Copy, Default)]
pub struct Hidden;

/// A fixed prop: model name, ground sample point, lift above the ground,
/// yaw and scale.
struct Prop {
    name: &'static str,
    at: (f32, f32),
    ground: (f32, f32),
    lift: f32,
    yaw: f32,
    scale: f32,
    shiny: bool,
}

const fn prop(name: &'static str, x: f32, z: f32, lift: f32, yaw: f32, scale: f32) -> Prop {
    Prop {
        name,
        at: (x, z),
        ground: (x, z),
        lift,
        yaw,
        scale,
        shiny: false,
    }
}

const PROPS: &[Prop] = &[
    prop("trees/christmastree", 430.0, 380.0, 0.0, 0.0, 18.0),
    Prop {
        shiny: true,
        ..prop("trees/shinytree", 430.0, 380.0, 0.0, 0.0, 18.0)
    },
    prop("cavefinal", 185.0, 216.0, 10.0, -30.0, 60.0),
    Prop {
        ground: (185.0, 216.0),
        ..prop("dickemap", 167.0, 210.0, 5.0, -30.0, 1.7)
    },
    prop("assets/stativ", 200.0, 120.0, -1.0, -30.0, 15.0),
    prop("assets/house", 400.0, 400.0, 0.0, 180.0, 18.0),
    prop("trees/parrottree", 390.0, 370.0, 0.0, 0.0, 18.0),
    prop("failes/birdcolor", 190.0, 130.0, 20.0, 0.0, 18.0),
    Prop {
        ground: (210.0, 110.0),
        ..prop("failes/forestfailes", 210.0, 90.0, 20.0, 0.0, 18.0)
    },
    prop("failes/newplayer", 210.0, 130.0, 10.0, 0.0, 18.0),
    prop("failes/olduser", 210.0, 110.0, 15.0, 0.0, 18.0),
    prop("failes/runtree", 220.0, 110.0, 12.5, 0.0, 18.0),
];

fn shiny(material: Material) -> Material {
    material.shiny(15.0, 1.0)
}

pub struct Scene {
    pub world: World,
    pub resources: Resources,
    pub terrain: Terrain,
    pub lights: Vec<Light>,
    pub day_night: DayNight,
    pub skybox: (CubeMapHandle, CubeMapHandle),
    pub player: EntityId,
    pub flower: EntityId,
    pub dragon: EntityId,
}

impl Scene {
    /// Load every asset and place the level.
    pub fn load(config: &GameConfig, loader: &mut impl AssetLoader, rng: &mut impl Rng) -> Result<Self> {
        let mut resources = Resources::new(&config.asset_dir);

        let textures = TerrainTexturePack {
            background: resources.texture(loader, "grass")?,
            r: resources.texture(loader, "mud")?,
            g: resources.texture(loader, "grassFlowers")?,
            b: resources.texture(loader, "path")?,
        };
        let blend_map = loader
            .load_data_texture(&resources.png("blendMap"))
            .context("loading blend map")?;
        let terrain = Terrain::load(0, 0, resources.png(&config.heightmap), textures, blend_map, loader)
            .with_context(|| format!("building terrain from {}", config.heightmap))?;
        let skybox = (resources.cube_map(loader, "skybox")?, resources.cube_map(loader, "skyboxN")?);

        let mut world = World::new();

        for p in PROPS {
            let model = if p.shiny {
                resources.model(loader, p.name, shiny)?
            } else {
                resources.model(loader, p.name, |m| m)?
            };
            let y = terrain.height_at(p.ground.0, p.ground.1) + p.lift;
            world.spawn((Entity::new(model, Vec3::new(p.at.0, y, p.at.1), Vec3::new(0.0, p.yaw, 0.0), p.scale),));
        }

        let diamond = resources.model(loader, "assets/diamond", shiny)?;
        let y = terrain.height_at(200.0, 120.0) + 9.0;
        world.spawn((
            Entity::new(diamond, Vec3::new(200.0, y, 120.0), Vec3::new(0.0, -30.0, 0.0), 20.0),
            Spin(0.01),
        ));

        let dino = resources.model(loader, "assets/unsafedino", shiny)?;
        world.spawn((
            Entity::new(dino, Vec3::ZERO, Vec3::ZERO, 18.0),
            Orbit {
                center: PLAYER_SPAWN,
                radius: 130.0,
                angle: 0.0,
                speed: 0.0002,
            },
        ));

        let dragon = resources.model_with_texture(loader, "dragon", "blue", shiny)?;
        let y = terrain.height_at(410.0, 375.0);
        let dragon = world.spawn((
            Entity::new(dragon, Vec3::new(410.0, y, 375.0), Vec3::ZERO, 1.0),
            Spin(0.02),
            Hidden,
        ));

        let bird = resources.model(loader, "trees/firstbird", |m| m)?;
        for i in 0..config.bird_count {
            let position = Vec3::new(
                rng.gen::<f32>() * TERRAIN_SIZE,
                65.0 * rng.gen::<f32>() + 60.0,
                rng.gen::<f32>() * TERRAIN_SIZE,
            );
            let scale = rng.gen::<f32>() * 2.0 + 2.0;
            world.spawn((Entity::new(bird, position, Vec3::new(0.0, i as f32, 0.0), scale), Bird));
        }

        let flower = resources.model(loader, PlantKind::Flower.asset_name(), plant_material(PlantKind::Flower))?;
        let y = terrain.height_at(430.0, 380.0);
        let flower = world.spawn((Entity::new(flower, Vec3::new(430.0, y, 380.0), Vec3::ZERO, 18.0),));

        let vegetation_map = Heightmap::load(resources.png(&config.vegetation_map))
            .with_context(|| format!("loading vegetation map {}", config.vegetation_map))?;
        let mut plant_models = Vec::with_capacity(PlantKind::ALL.len());
        for kind in PlantKind::ALL {
            plant_models.push(resources.model(loader, kind.asset_name(), plant_material(kind))?);
        }
        let plants = vegetation::scatter(&vegetation_map, &terrain, config.vegetation_density, rng, |kind| {
            let index = PlantKind::ALL.iter().position(|k| *k == kind).unwrap_or(0);
            plant_models[index]
        });
        world.spawn_batch(plants.into_iter().map(|plant| (plant,)));

        let player_model = resources.model(loader, "assets/player", |m| m)?;
        let spawn_y = terrain.height_at(PLAYER_SPAWN.x, PLAYER_SPAWN.y);
        let player = world.spawn((
            Entity::new(
                player_model,
                Vec3::new(PLAYER_SPAWN.x, spawn_y, PLAYER_SPAWN.y),
                Vec3::new(0.0, 180.0, 0.0),
                8.0,
            ),
            Player,
            MovementState::default(),
        ));

        let lights = vec![
            Light::with_attenuation(Vec3::ZERO, Vec3::ONE, Vec3::new(1.0, 0.01, 0.001)),
            Light::with_attenuation(Vec3::ZERO, Vec3::ONE, Vec3::new(1.0, 0.01, 0.001)),
            Light::new(Vec3::new(600.0, 3000.0, -500.0), Vec3::ONE),
            Light::with_attenuation(
                Vec3::new(430.0, terrain.height_at(430.0, 380.0) + 10.0, 380.0),
                Vec3::ZERO,
                Vec3::new(1.0, 0.01, 0.01),
            ),
        ];

        log::info!(
            "Scene ready: {} entities, {} models",
            world.len(),
            resources.models().len()
        );

        Ok(Self {
            world,
            resources,
            terrain,
            lights,
            day_night: DayNight::new(),
            skybox,
            player,
            flower,
            dragon,
        })
    }

    pub fn models(&self) -> &ModelRegistry {
        self.resources.models()
    }

    pub fn player_transform(&self) -> Option<Transform> {
        self.world.get::<&Entity>(self.player).ok().map(|e| e.transform)
    }

    pub fn reveal_dragon(&mut self) {
        if self.world.remove_one::<Hidden>(self.dragon).is_ok() {
            log::info!("Dragon revealed");
        }
    }

    pub fn place_flower(&mut self, point: Vec3) {
        if let Ok(mut flower) = self.world.get::<&mut Entity>(self.flower) {
            flower.transform.position = point;
        }
    }

    /// Advance the ambient motion and the day/night cycle by `dt_ms`.
    pub fn tick(&mut self, dt_ms: f32, now_millis: u64, night_requested: bool, camera_position: Vec3) {
        spin(&mut self.world, dt_ms);
        fly_birds(&mut self.world, dt_ms);
        let dino = orbit(&mut self.world, &self.terrain, dt_ms);
        hang_lamps(&mut self.lights, camera_position, dino);

        let player_x = self.player_transform().map_or(0.0, |t| t.position.x);
        self.day_night
            .update(dt_ms, night_requested || player_x > crate::day_night::NIGHT_TRIGGER_X);
        self.lights[SUN].color = self.day_night.sun_color();
        if let Some(color) = self.day_night.tree_light_color(now_millis) {
            self.lights[TREE_LIGHT].color = color;
        }
    }

    /// Queue the terrain and every visible entity for this frame.
    pub fn submit(&self, master: &mut MasterRenderer) {
        master.submit_terrain(&self.terrain);
        submit_visible(&self.world, master);
    }
}

fn plant_material(kind: PlantKind) -> impl FnOnce(Material) -> Material {
    move |material| {
        if kind.is_transparent() {
            material.transparent().fake_lit()
        } else {
            material
        }
    }
}

/// Move the camera lamp, and the dino lamp when the dino moved.
pub fn hang_lamps(lights: &mut [Light], camera_position: Vec3, dino: Option<Vec3>) {
    let lift = Vec3::new(0.0, LAMP_HEIGHT, 0.0);
    lights[CAMERA_LAMP].position = camera_position + lift;
    if let Some(dino) = dino {
        lights[DINO_LAMP].position = dino + lift;
    }
}

/// Turn every visible spinner.
pub fn spin(world: &mut World, dt_ms: f32) {
    for (_, (entity, spin, hidden)) in world.query_mut::<(&mut Entity, &Spin, Option<&Hidden>)>() {
        if hidden.is_none() {
            entity.transform.rotate(Vec3::new(0.0, spin.0 * dt_ms, 0.0));
        }
    }
}

/// Move birds along their heading, wrapping at the tile edges.
pub fn fly_birds(world: &mut World, dt_ms: f32) {
    let step = BIRD_SPEED * dt_ms;
    for (_, (entity, _)) in world.query_mut::<(&mut Entity, &Bird)>() {
        let (sin, cos) = entity.transform.rot_y().to_radians().sin_cos();
        entity.transform.translate(Vec3::new(sin * step, 0.0, cos * step));
        let p = &mut entity.transform.position;
        p.x = wrap(p.x);
        p.z = wrap(p.z);
    }
}

fn wrap(v: f32) -> f32 {
    if v > TERRAIN_SIZE {
        0.0
    } else if v < 0.0 {
        TERRAIN_SIZE
    } else {
        v
    }
}

/// Place orbiters for their current angle, then advance it. Returns the
/// last orbiter's position.
pub fn orbit(world: &mut World, ground: &impl Ground, dt_ms: f32) -> Option<Vec3> {
    let mut last = None;
    for (_, (entity, orbit)) in world.query_mut::<(&mut Entity, &mut Orbit)>() {
        let (sin, cos) = orbit.angle.sin_cos();
        let x = sin * orbit.radius + orbit.center.x;
        let z = cos * orbit.radius + orbit.center.y;
        entity.transform.position = Vec3::new(x, ground.height_at(x, z), z);
        entity.transform.rotation.y = orbit.angle.to_degrees() + 90.0;
        orbit.angle += orbit.speed * dt_ms;
        last = Some(entity.transform.position);
    }
    last
}

pub fn submit_visible(world: &World, master: &mut MasterRenderer) {
    for (_, (entity, hidden)) in world.query::<(&Entity, Option<&Hidden>)>().iter() {
        if hidden.is_none() {
            master.submit(entity);
        }
    }
}
