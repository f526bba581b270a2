/// WorldState: the complete state of a running session.
///
/// ## Clock
///
/// `tick` counts base ticks; `now_ms` is simulated time and advances by
/// `timing.tick_rate_ms` per tick. All timers (hurt windows, fatigue,
/// scheduled tasks) read `now_ms`, never the wall clock, so a session is
/// fully reproducible from its seed and input sequence.
///
/// ## Camera
///
/// `camera_x` is the horizontal translation applied to world coordinates
/// when drawing: `screen_x = world_x + camera_x`. It is clamped to
/// `[-max_camera_x, 60]` (see `rules::camera_offset`).
///
/// ## Snapshot
///
/// `snapshot()` flattens everything drawable into canvas-space draw items,
/// back to front. The renderer never touches entities directly.

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::config::{GameplayConfig, TimingConfig};
use crate::domain::ai::{self, BossSenses};
use crate::domain::character::Character;
use crate::domain::entity::{Body, Facing};
use crate::domain::physics::{self, Rect};
use crate::domain::rules::{self, CANVAS_HEIGHT, CANVAS_WIDTH};
use crate::domain::sprite::Sprite;
use super::level::{Level, LevelDef};
use super::schedule::Scheduler;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Outcome {
    Victory,
    Defeat,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Playing,
    Halted(Outcome),
}

/// Status-bar mirrors, refreshed at the end of every step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Hud {
    pub health_percent: u32,
    pub bottle_percent: u32,
    pub coins: u32,
    pub boss_percent: u32,
    pub boss_visible: bool,
}

/// One sprite placed on the canvas.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawItem {
    pub rect: Rect,
    pub sprite: Sprite,
    pub flipped: bool,
}

#[derive(Clone, Debug)]
pub struct WorldState {
    pub phase: Phase,
    pub tick: u64,
    pub now_ms: u64,
    pub character: Character,
    pub level: Level,
    pub camera_x: f32,
    pub hud: Hud,
    pub victory_shown: bool,
    pub defeat_shown: bool,
    pub scheduler: Scheduler,
    pub rng: StdRng,
    pub timing: TimingConfig,
    pub gameplay: GameplayConfig,
}

impl WorldState {
    pub fn new(def: &LevelDef, timing: TimingConfig, gameplay: GameplayConfig) -> Self {
        let mut rng = match gameplay.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let level = Level::build(def, &mut rng);
        let character = Character::new(0);
        let camera_x = rules::camera_offset(character.body.x, level.level_end_x);

        let mut world = WorldState {
            phase: Phase::Playing,
            tick: 0,
            now_ms: 0,
            character,
            level,
            camera_x,
            hud: Hud::default(),
            victory_shown: false,
            defeat_shown: false,
            scheduler: Scheduler::new(),
            rng,
            timing,
            gameplay,
        };
        world.refresh_hud();
        world
    }

    pub fn is_halted(&self) -> bool {
        matches!(self.phase, Phase::Halted(_))
    }

    pub fn outcome(&self) -> Option<Outcome> {
        match self.phase {
            Phase::Halted(o) => Some(o),
            Phase::Playing => None,
        }
    }

    /// True on ticks where a sub-phase with the given cadence runs.
    pub fn is_due(&self, every: u32) -> bool {
        self.tick % u64::from(every.max(1)) == 0
    }

    pub fn boss_senses(&self) -> Option<BossSenses> {
        self.level.boss().map(|b| {
            BossSenses::observe(&b.body, &self.character.body, self.camera_x, CANVAS_WIDTH)
        })
    }

    pub fn refresh_hud(&mut self) {
        let c = &self.character;
        let boss = self.level.boss();
        self.hud = Hud {
            health_percent: c.body.health_percent(),
            bottle_percent: rules::bottle_percent(c.bottles),
            coins: c.coins,
            boss_percent: boss.map_or(0, |b| b.body.health_percent()),
            boss_visible: boss.map_or(false, |b| {
                ai::is_on_screen(&b.body, self.camera_x, CANVAS_WIDTH)
            }),
        };
    }

    // ── Snapshot ──

    pub fn snapshot(&self) -> Vec<DrawItem> {
        let mut items = Vec::new();
        let cam = self.camera_x;

        for b in &self.level.backdrops {
            items.push(DrawItem {
                rect: Rect { x: b.x + cam, y: 0.0, w: CANVAS_WIDTH, h: CANVAS_HEIGHT },
                sprite: Sprite::Layer(b.layer),
                flipped: false,
            });
        }

        let mut push_body = |body: &Body, flipped: bool| {
            if let Some(frame) = body.frame() {
                let rect = physics::bounds(body);
                items.push(DrawItem {
                    rect: Rect { x: rect.x + cam, ..rect },
                    sprite: Sprite::Frame(frame),
                    flipped,
                });
            }
        };

        for p in self.level.coins.iter().chain(&self.level.bottles) {
            push_body(&p.body, false);
        }
        for e in &self.level.enemies {
            push_body(e.body(), e.flipped());
        }
        push_body(&self.character.body, self.character.body.facing == Facing::Left);
        for p in &self.level.projectiles {
            push_body(&p.body, false);
        }

        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sprite::{Layer, Sequence};

    fn world() -> WorldState {
        let def = LevelDef::embedded().unwrap();
        let gameplay = GameplayConfig { seed: Some(11), ..GameplayConfig::default() };
        WorldState::new(&def, TimingConfig::default(), gameplay)
    }

    #[test]
    fn fresh_world_hud() {
        let w = world();
        assert_eq!(w.phase, Phase::Playing);
        assert_eq!(w.hud, Hud {
            health_percent: 100,
            bottle_percent: 0,
            coins: 0,
            boss_percent: 100,
            boss_visible: false,
        });
        assert_eq!(w.camera_x, 0.0);
    }

    #[test]
    fn boss_bar_shows_once_boss_is_in_view() {
        let mut w = world();
        w.character.body.x = 3300.0;
        w.camera_x = rules::camera_offset(w.character.body.x, w.level.level_end_x);
        w.refresh_hud();
        assert!(w.hud.boss_visible);
    }

    #[test]
    fn snapshot_applies_camera_and_orders_back_to_front() {
        let mut w = world();
        w.camera_x = -500.0;
        w.character.body.facing = Facing::Left;
        let items = w.snapshot();

        assert!(matches!(items[0].sprite, Sprite::Layer(Layer::Air)));
        let is_seq = |i: &DrawItem, s: Sequence| matches!(i.sprite, Sprite::Frame(f) if f.sequence == s);

        let hero_pos = items.iter().position(|i| is_seq(i, Sequence::CharacterIdle)).unwrap();
        let hero = items[hero_pos];
        assert_eq!(hero.rect.x, w.character.body.x - 500.0);
        assert!(hero.flipped);

        // Enemies are drawn behind the character
        let boss_pos = items.iter().position(|i| is_seq(i, Sequence::BossWalk)).unwrap();
        assert!(boss_pos < hero_pos);
        assert!(!items[boss_pos].flipped);
    }

    #[test]
    fn cadence_check() {
        let mut w = world();
        w.tick = 12;
        assert!(w.is_due(6));
        assert!(w.is_due(1));
        assert!(!w.is_due(8));
    }
}
