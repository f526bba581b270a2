/// Entities: the shared `Body` every simulated object is built on,
/// plus the static pickups (coins, ground bottles).
///
/// Variant behavior lives next to its data:
///   - `character::Character`: the player
///   - `enemy::Enemy`        : tagged {Patrol, Boss}
///   - `projectile::Projectile`
///   - `Pickup` (here)
///
/// Each of them owns a `Body`; nothing inherits from anything.

use super::animation::Animation;
use super::sprite::{Sequence, SpriteFrame};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Facing {
    Left,
    Right,
}

impl Facing {
    /// +1.0 for right, -1.0 for left.
    pub fn sign(self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }
}

/// Per-side inset that shrinks the visual box to the hitbox.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Offsets {
    pub left: f32,
    pub right: f32,
    pub up: f32,
    pub down: f32,
}

impl Offsets {
    pub const NONE: Offsets = Offsets { left: 0.0, right: 0.0, up: 0.0, down: 0.0 };

    pub const fn new(left: f32, right: f32, up: f32, down: f32) -> Self {
        Offsets { left, right, up, down }
    }
}

/// Level state of the input device for one tick.
/// Movement keys are continuous (held); the simulation decides which
/// actions are edge-sensitive (jump only from the ground, one throw in flight).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InputFlags {
    pub left: bool,
    pub right: bool,
    pub jump: bool,
    pub throw: bool,
}

impl InputFlags {
    pub fn any_direction(&self) -> bool {
        self.left || self.right
    }
}

#[derive(Clone, Debug)]
pub struct Body {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Vertical speed, positive = upward.
    pub velocity: f32,
    /// Subtracted from `velocity` on every gravity step.
    pub acceleration: f32,
    /// Ground line for `y`; gravity clamps here.
    pub base_y: f32,
    /// Projectiles never land; gravity keeps pulling them.
    pub always_airborne: bool,
    pub health: i32,
    pub max_health: i32,
    pub offsets: Offsets,
    pub facing: Facing,
    pub anim: Animation,
    pub last_hit_ms: Option<u64>,
}

impl Body {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Body {
            x, y, width, height,
            velocity: 0.0,
            acceleration: 2.5,
            base_y: y,
            always_airborne: false,
            health: 100,
            max_health: 100,
            offsets: Offsets::NONE,
            facing: Facing::Right,
            anim: Animation::new(),
            last_hit_ms: None,
        }
    }

    pub fn with_offsets(mut self, offsets: Offsets) -> Self {
        self.offsets = offsets;
        self
    }

    pub fn with_health(mut self, health: i32) -> Self {
        self.health = health;
        self.max_health = health;
        self
    }

    pub fn with_acceleration(mut self, acceleration: f32) -> Self {
        self.acceleration = acceleration;
        self
    }

    pub fn with_facing(mut self, facing: Facing) -> Self {
        self.facing = facing;
        self
    }

    /// Show `sequence` from the first frame on, before any animation tick.
    pub fn with_sequence(mut self, sequence: Sequence) -> Self {
        self.anim = Animation::starting_at(sequence);
        self
    }

    /// Subtract `damage`, clamped at 0, and stamp the hit time.
    /// A dead body ignores further hits. Returns the damage actually taken.
    pub fn hit(&mut self, damage: i32, now_ms: u64) -> i32 {
        if self.is_dead() || damage <= 0 {
            return 0;
        }
        let before = self.health;
        self.health = (self.health - damage).max(0);
        self.last_hit_ms = Some(now_ms);
        before - self.health
    }

    /// Force the body straight to zero health.
    pub fn kill(&mut self, now_ms: u64) {
        if self.health > 0 {
            self.health = 0;
            self.last_hit_ms = Some(now_ms);
        }
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0
    }

    /// Within `window_ms` of the last hit and still alive.
    pub fn is_hurt(&self, now_ms: u64, window_ms: u64) -> bool {
        if self.is_dead() {
            return false;
        }
        match self.last_hit_ms {
            Some(t) => now_ms.saturating_sub(t) < window_ms,
            None => false,
        }
    }

    /// Health as 0..=100 for status bars.
    pub fn health_percent(&self) -> u32 {
        if self.max_health <= 0 {
            return 0;
        }
        (self.health.max(0) as u32 * 100) / self.max_health as u32
    }

    pub fn walk_left(&mut self, speed: f32) {
        self.x -= speed;
    }

    pub fn walk_right(&mut self, speed: f32) {
        self.x += speed;
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn frame(&self) -> Option<SpriteFrame> {
        self.anim.current()
    }
}

// ── Pickups ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PickupKind {
    Coin,
    Bottle,
}

/// A static collectible. Picking it up removes it from the level.
#[derive(Clone, Debug)]
pub struct Pickup {
    pub id: u64,
    pub kind: PickupKind,
    pub body: Body,
}

impl Pickup {
    pub fn coin(id: u64, x: f32, y: f32) -> Self {
        let body = Body::new(x, y, 100.0, 100.0)
            .with_offsets(Offsets::new(35.0, 35.0, 35.0, 35.0))
            .with_sequence(Sequence::Coin);
        Pickup { id, kind: PickupKind::Coin, body }
    }

    pub fn bottle(id: u64, x: f32) -> Self {
        let body = Body::new(x, 340.0, 80.0, 80.0)
            .with_offsets(Offsets::new(40.0, 0.0, 0.0, 0.0))
            .with_sequence(Sequence::BottleGround);
        Pickup { id, kind: PickupKind::Bottle, body }
    }

    pub fn animate(&mut self) {
        let seq = match self.kind {
            PickupKind::Coin => Sequence::Coin,
            PickupKind::Bottle => Sequence::BottleGround,
        };
        self.body.anim.play(seq);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_clamps_at_zero() {
        for h in [0, 1, 5, 20, 99, 100] {
            for d in [0, 1, 5, 20, 100, 250] {
                let mut b = Body::new(0.0, 0.0, 10.0, 10.0).with_health(100);
                b.health = h;
                b.hit(d, 0);
                assert_eq!(b.health, (h - d).max(0), "h={h} d={d}");
                assert_eq!(b.is_dead(), b.health == 0);
            }
        }
    }

    #[test]
    fn three_small_hits_leave_character_alive() {
        let mut b = Body::new(0.0, 0.0, 10.0, 10.0).with_health(100);
        for t in 0..3 {
            b.hit(5, t * 10);
        }
        assert_eq!(b.health, 85);
        assert!(!b.is_dead());
    }

    #[test]
    fn dead_body_takes_no_more_damage() {
        let mut b = Body::new(0.0, 0.0, 10.0, 10.0).with_health(10);
        assert_eq!(b.hit(25, 100), 10);
        assert_eq!(b.hit(25, 200), 0);
        // Last hit stays at the killing blow
        assert_eq!(b.last_hit_ms, Some(100));
    }

    #[test]
    fn hurt_window_expires_and_never_applies_to_dead() {
        let mut b = Body::new(0.0, 0.0, 10.0, 10.0).with_health(50);
        assert!(!b.is_hurt(0, 1000));
        b.hit(10, 500);
        assert!(b.is_hurt(500, 1000));
        assert!(b.is_hurt(1499, 1000));
        assert!(!b.is_hurt(1500, 1000));

        b.hit(100, 2000);
        assert!(!b.is_hurt(2000, 1000));
    }

    #[test]
    fn health_percent_scales_to_max() {
        let mut b = Body::new(0.0, 0.0, 10.0, 10.0).with_health(115);
        assert_eq!(b.health_percent(), 100);
        b.hit(23, 0);
        assert_eq!(b.health_percent(), 80);
        b.hit(500, 0);
        assert_eq!(b.health_percent(), 0);
    }
}
