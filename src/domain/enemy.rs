/// Enemies, as a tagged variant over {Patrol, Boss}.
///
/// The step treats every enemy uniformly through `Enemy` (body, contact
/// damage, liveness) and dispatches to the variant for behavior.

use rand::Rng;

use super::ai::Boss;
use super::entity::{Body, Facing};
use super::sprite::Sequence;

pub const CHICKEN_DAMAGE: i32 = 5;
pub const CHICKEN_HEALTH: i32 = 100;
const CHICKEN_Y: f32 = 340.0;
const CHICKEN_SPEED_MIN: f32 = 0.30;
const CHICKEN_SPEED_MAX: f32 = 0.55;

/// Simple walker: drifts left forever, dies in one stomp or one bottle.
#[derive(Clone, Debug)]
pub struct Chicken {
    pub body: Body,
    pub speed: f32,
    /// Ambient clucking; goes quiet on death.
    pub voice: bool,
}

impl Chicken {
    pub fn new(x: f32, speed: f32) -> Self {
        let body = Body::new(x, CHICKEN_Y, 80.0, 80.0)
            .with_health(CHICKEN_HEALTH)
            .with_facing(Facing::Left)
            .with_sequence(Sequence::ChickenWalk);
        Chicken { body, speed, voice: true }
    }

    /// Random drift speed in the calibrated range.
    pub fn with_random_speed<R: Rng>(x: f32, rng: &mut R) -> Self {
        Chicken::new(x, rng.gen_range(CHICKEN_SPEED_MIN..CHICKEN_SPEED_MAX))
    }

    /// Movement tick.
    pub fn advance(&mut self) {
        if !self.body.is_dead() {
            self.body.walk_left(self.speed);
        }
    }

    /// Animation tick. Returns true on the tick the voice goes quiet.
    pub fn animate(&mut self) -> bool {
        if self.body.is_dead() {
            self.body.anim.play(Sequence::ChickenDead);
            if self.voice {
                self.voice = false;
                return true;
            }
            return false;
        }
        self.body.anim.play(Sequence::ChickenWalk);
        false
    }
}

#[derive(Clone, Debug)]
pub enum Enemy {
    Patrol(Chicken),
    Boss(Boss),
}

impl Enemy {
    pub fn body(&self) -> &Body {
        match self {
            Enemy::Patrol(c) => &c.body,
            Enemy::Boss(b) => &b.body,
        }
    }

    pub fn body_mut(&mut self) -> &mut Body {
        match self {
            Enemy::Patrol(c) => &mut c.body,
            Enemy::Boss(b) => &mut b.body,
        }
    }

    pub fn is_boss(&self) -> bool {
        matches!(self, Enemy::Boss(_))
    }

    pub fn is_dead(&self) -> bool {
        self.body().is_dead()
    }

    /// Damage dealt to the character on plain contact.
    pub fn contact_damage(&self) -> i32 {
        match self {
            Enemy::Patrol(_) => CHICKEN_DAMAGE,
            Enemy::Boss(_) => super::ai::CONTACT_DAMAGE,
        }
    }

    /// Sprite orientation: chickens always face left; the boss sprite
    /// is drawn mirrored while it walks right.
    pub fn flipped(&self) -> bool {
        match self {
            Enemy::Patrol(_) => false,
            Enemy::Boss(b) => b.body.facing == Facing::Right,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn chicken_drifts_left_until_dead() {
        let mut c = Chicken::new(1000.0, 0.5);
        for _ in 0..10 { c.advance(); }
        assert!((c.body.x - 995.0).abs() < 1e-3);

        c.body.kill(0);
        c.advance();
        assert!((c.body.x - 995.0).abs() < 1e-3);
    }

    #[test]
    fn random_speed_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let c = Chicken::with_random_speed(500.0, &mut rng);
            assert!(c.speed >= CHICKEN_SPEED_MIN && c.speed < CHICKEN_SPEED_MAX);
        }
    }

    #[test]
    fn dead_chicken_goes_quiet_once() {
        let mut c = Chicken::new(500.0, 0.4);
        assert!(!c.animate());
        assert!(c.voice);

        c.body.hit(CHICKEN_HEALTH, 10);
        assert!(c.animate());
        assert!(!c.voice);
        assert!(!c.animate());

        let f = c.body.frame().unwrap();
        assert_eq!(f.sequence, Sequence::ChickenDead);
        assert_eq!(f.index, 0);
    }

    #[test]
    fn contact_damage_by_variant() {
        let chicken = Enemy::Patrol(Chicken::new(0.0, 0.3));
        let boss = Enemy::Boss(Boss::new(3650.0));
        assert_eq!(chicken.contact_damage(), 5);
        assert_eq!(boss.contact_damage(), 10);
        assert!(boss.is_boss());
        assert!(!chicken.is_boss());
    }
}
