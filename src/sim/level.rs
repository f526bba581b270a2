/// Level definition and runtime level state.
///
/// ## Sources (priority order):
///   1. `level_file` from config.toml (TOML, same schema as below)
///   2. The built-in level embedded at compile time
///
/// A broken override file is logged and the built-in level is used.
///
/// ## Schema
///   ```toml
///   name = "Mesa Run"
///   level_end_x = 3600
///
///   [scenery]            # background layers, tiled
///   layers = ["air", "third", "second", "first"]
///   tile_width = 719
///   first_tile = -1
///   tiles = 6
///   clouds = [0, 720]
///
///   [chickens]           # count + random x spread
///   count = 6
///   min_x = 400
///   max_x = 2000
///
///   [coins]              # as above, plus a y spread
///   [bottles]            # as chickens; also used for refills
///   [boss]
///   x = 3650
///   ```
///
/// The boss is always the last enemy in `Level::enemies`.

use std::path::{Path, PathBuf};

use log::{info, warn};
use rand::Rng;
use serde::Deserialize;
use thiserror::Error;

use crate::domain::ai::Boss;
use crate::domain::enemy::{Chicken, Enemy};
use crate::domain::entity::Pickup;
use crate::domain::projectile::Projectile;
use crate::domain::rules::CANVAS_WIDTH;
use crate::domain::sprite::Layer;

const EMBEDDED_LEVEL: &str = include_str!("../../levels/level1.toml");

/// Ground bottles placed when the player has run dry.
pub const REFILL_BOTTLES: usize = 6;
/// Cloud drift per movement tick.
pub const CLOUD_DRIFT: f32 = 0.15;

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("could not read level file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("level definition is malformed: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("level has no boss")]
    NoBoss,
    #[error("level is narrower than one screen (level_end_x = {0})")]
    TooNarrow(f32),
    #[error("{what}: min {min} is above max {max}")]
    BadSpread { what: &'static str, min: f32, max: f32 },
}

// ══════════════════════════════════════════════════════════════
// Definition (static data)
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Debug, Deserialize)]
pub struct LevelDef {
    pub name: String,
    pub level_end_x: f32,
    #[serde(default)]
    pub scenery: SceneryDef,
    #[serde(default)]
    pub chickens: Spread,
    #[serde(default)]
    pub coins: CoinSpread,
    #[serde(default)]
    pub bottles: Spread,
    pub boss: Option<BossDef>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct SceneryDef {
    #[serde(default)]
    pub layers: Vec<Layer>,
    #[serde(default)]
    pub tile_width: f32,
    #[serde(default)]
    pub first_tile: i32,
    #[serde(default)]
    pub tiles: u32,
    #[serde(default)]
    pub clouds: Vec<f32>,
}

/// `count` items at uniformly random x in `[min_x, max_x)`.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct Spread {
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub min_x: f32,
    #[serde(default)]
    pub max_x: f32,
}

#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct CoinSpread {
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub min_x: f32,
    #[serde(default)]
    pub max_x: f32,
    #[serde(default)]
    pub min_y: f32,
    #[serde(default)]
    pub max_y: f32,
}

#[derive(Clone, Copy, Debug, Deserialize)]
pub struct BossDef {
    pub x: f32,
}

impl LevelDef {
    pub fn embedded() -> Result<Self, LevelError> {
        LevelDef::parse(EMBEDDED_LEVEL)
    }

    pub fn parse(text: &str) -> Result<Self, LevelError> {
        let def: LevelDef = toml::from_str(text)?;
        def.validate()?;
        Ok(def)
    }

    pub fn load(path: &Path) -> Result<Self, LevelError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| LevelError::Read { path: path.to_path_buf(), source })?;
        LevelDef::parse(&text)
    }

    fn validate(&self) -> Result<(), LevelError> {
        if self.boss.is_none() {
            return Err(LevelError::NoBoss);
        }
        if self.level_end_x <= CANVAS_WIDTH {
            return Err(LevelError::TooNarrow(self.level_end_x));
        }
        let spreads = [
            ("chickens", self.chickens.min_x, self.chickens.max_x),
            ("bottles", self.bottles.min_x, self.bottles.max_x),
            ("coins x", self.coins.min_x, self.coins.max_x),
            ("coins y", self.coins.min_y, self.coins.max_y),
        ];
        for (what, min, max) in spreads {
            if min > max {
                return Err(LevelError::BadSpread { what, min, max });
            }
        }
        Ok(())
    }
}

/// The override file if it loads, the built-in level otherwise.
pub fn load_level_def(override_path: Option<&Path>) -> Result<LevelDef, LevelError> {
    if let Some(path) = override_path {
        match LevelDef::load(path) {
            Ok(def) => {
                info!("loaded level '{}' from {}", def.name, path.display());
                return Ok(def);
            }
            Err(e) => warn!("{e}; using the built-in level"),
        }
    }
    LevelDef::embedded()
}

/// Uniform in `[min, max)`; a collapsed range yields `min`.
fn sample<R: Rng>(rng: &mut R, min: f32, max: f32) -> f32 {
    if min < max { rng.gen_range(min..max) } else { min }
}

// ══════════════════════════════════════════════════════════════
// Runtime level
// ══════════════════════════════════════════════════════════════

/// One tile of a background layer, full canvas size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Backdrop {
    pub layer: Layer,
    pub x: f32,
}

#[derive(Clone, Debug)]
pub struct Level {
    pub name: String,
    pub level_end_x: f32,
    pub backdrops: Vec<Backdrop>,
    pub enemies: Vec<Enemy>,
    pub coins: Vec<Pickup>,
    pub bottles: Vec<Pickup>,
    pub projectiles: Vec<Projectile>,
    bottle_spread: Spread,
    next_id: u64,
}

impl Level {
    pub fn build<R: Rng>(def: &LevelDef, rng: &mut R) -> Self {
        let mut level = Level {
            name: def.name.clone(),
            level_end_x: def.level_end_x,
            backdrops: Vec::new(),
            enemies: Vec::new(),
            coins: Vec::new(),
            bottles: Vec::new(),
            projectiles: Vec::new(),
            bottle_spread: def.bottles,
            next_id: 1,
        };

        let s = &def.scenery;
        for i in 0..s.tiles as i32 {
            let x = (s.first_tile + i) as f32 * s.tile_width;
            level.backdrops.extend(s.layers.iter().map(|&layer| Backdrop { layer, x }));
        }
        level.backdrops.extend(s.clouds.iter().map(|&x| Backdrop { layer: Layer::Clouds, x }));

        for _ in 0..def.chickens.count {
            let x = sample(rng, def.chickens.min_x, def.chickens.max_x);
            level.enemies.push(Enemy::Patrol(Chicken::with_random_speed(x, rng)));
        }
        if let Some(boss) = def.boss {
            level.enemies.push(Enemy::Boss(Boss::new(boss.x)));
        }

        let c = def.coins;
        for _ in 0..c.count {
            let x = sample(rng, c.min_x, c.max_x);
            let y = sample(rng, c.min_y, c.max_y);
            let id = level.next_id();
            level.coins.push(Pickup::coin(id, x, y));
        }

        level.place_bottles(def.bottles.count, rng);
        level
    }

    /// Fresh id for a pickup or projectile.
    pub fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn boss(&self) -> Option<&Boss> {
        match self.enemies.last() {
            Some(Enemy::Boss(b)) => Some(b),
            _ => None,
        }
    }

    pub fn boss_mut(&mut self) -> Option<&mut Boss> {
        match self.enemies.last_mut() {
            Some(Enemy::Boss(b)) => Some(b),
            _ => None,
        }
    }

    /// Scatter `REFILL_BOTTLES` new ground bottles over the bottle spread.
    pub fn refill_bottles<R: Rng>(&mut self, rng: &mut R) -> usize {
        self.place_bottles(REFILL_BOTTLES, rng);
        REFILL_BOTTLES
    }

    fn place_bottles<R: Rng>(&mut self, count: usize, rng: &mut R) {
        let spread = self.bottle_spread;
        for _ in 0..count {
            let x = sample(rng, spread.min_x, spread.max_x);
            let id = self.next_id();
            self.bottles.push(Pickup::bottle(id, x));
        }
    }

    /// Remove a thrown bottle by id. Unknown ids are a no-op.
    pub fn remove_projectile(&mut self, id: u64) -> bool {
        let before = self.projectiles.len();
        self.projectiles.retain(|p| p.id != id);
        self.projectiles.len() != before
    }

    pub fn drift_clouds(&mut self) {
        for b in self.backdrops.iter_mut().filter(|b| b.layer == Layer::Clouds) {
            b.x -= CLOUD_DRIFT;
        }
    }
}
