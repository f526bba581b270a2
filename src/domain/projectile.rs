/// Thrown bottle: ballistic flight, splash, cleanup.
///
/// Horizontal motion is a constant push per movement tick in the throw
/// direction; vertical motion is the shared gravity model with a stronger
/// pull than the character's. `splashed` is one-way: once set, the body
/// stops dead and only the splash animation plays.

use super::entity::{Body, Facing};
use super::sprite::Sequence;

pub const DAMAGE: i32 = 20;
/// Horizontal pixels per movement tick.
pub const HORIZONTAL_FORCE: f32 = 5.0;
pub const LAUNCH_VELOCITY: f32 = 20.0;
pub const ACCELERATION: f32 = 3.0;
/// Falling past this y removes the projectile outright.
pub const BOTTOM_BOUND: f32 = 380.0;
/// How long the splash stays on screen before removal.
pub const LINGER_MS: u64 = 1500;

#[derive(Clone, Debug)]
pub struct Projectile {
    pub id: u64,
    pub body: Body,
    pub force: f32,
    pub splashed: bool,
}

impl Projectile {
    pub fn launch(id: u64, x: f32, y: f32, facing: Facing) -> Self {
        let mut body = Body::new(x, y, 80.0, 80.0)
            .with_health(DAMAGE)
            .with_acceleration(ACCELERATION)
            .with_facing(facing)
            .with_sequence(Sequence::BottleRotate);
        body.always_airborne = true;
        body.velocity = LAUNCH_VELOCITY;
        Projectile { id, body, force: HORIZONTAL_FORCE, splashed: false }
    }

    /// Movement tick.
    pub fn advance(&mut self) {
        self.body.x += self.force * self.body.facing.sign();
    }

    /// Break the bottle. Returns true only on the first call.
    pub fn splash(&mut self) -> bool {
        if self.splashed {
            return false;
        }
        self.splashed = true;
        self.force = 0.0;
        self.body.health = 0;
        self.body.velocity = 0.0;
        self.body.acceleration = 0.0;
        self.body.anim.play_once(Sequence::BottleSplash);
        true
    }

    /// Animation tick.
    pub fn animate(&mut self) {
        if self.splashed {
            self.body.anim.play_once(Sequence::BottleSplash);
        } else {
            self.body.anim.play(Sequence::BottleRotate);
        }
    }

    pub fn is_out_of_bounds(&self) -> bool {
        self.body.y > BOTTOM_BOUND
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::physics;

    #[test]
    fn flies_in_throw_direction() {
        let mut right = Projectile::launch(1, 100.0, 140.0, Facing::Right);
        let mut left = Projectile::launch(2, 100.0, 140.0, Facing::Left);
        for _ in 0..4 {
            right.advance();
            left.advance();
        }
        assert_eq!(right.body.x, 120.0);
        assert_eq!(left.body.x, 80.0);
    }

    #[test]
    fn arcs_up_then_falls_out_of_bounds() {
        let mut p = Projectile::launch(1, 0.0, 140.0, Facing::Right);
        physics::apply_gravity(&mut p.body);
        assert_eq!(p.body.y, 120.0);

        let mut steps = 1;
        while !p.is_out_of_bounds() {
            physics::apply_gravity(&mut p.body);
            steps += 1;
            assert!(steps < 100, "never fell out");
        }
        assert!(physics::is_falling(&p.body));
    }

    #[test]
    fn splash_is_one_way_and_stops_motion() {
        let mut p = Projectile::launch(1, 0.0, 140.0, Facing::Right);
        p.animate();
        p.animate();
        assert_eq!(p.body.frame().unwrap().sequence, Sequence::BottleRotate);

        assert!(p.splash());
        assert!(!p.splash());

        let (x, y) = (p.body.x, p.body.y);
        p.advance();
        physics::apply_gravity(&mut p.body);
        assert_eq!((p.body.x, p.body.y), (x, y));

        for _ in 0..20 {
            p.animate();
            assert_eq!(p.body.frame().unwrap().sequence, Sequence::BottleSplash);
        }
        assert_eq!(p.body.frame().unwrap().index, Sequence::BottleSplash.len() - 1);
    }
}
