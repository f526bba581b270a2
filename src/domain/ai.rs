/// Boss AI: a small state machine driven by what the boss can sense.
///
/// States, by precedence (re-evaluated every animation tick):
///   1. **Dead**  : health 0. Sinks out of the level, entered once.
///   2. **Hurt**  : inside the hurt window. One evasive hop per entry.
///   3. **Attack**: character center inside the attack rectangle.
///                   Stands still, faces the character, loops the attack.
///   4. **Alert** : on screen but not yet spotted. Stands still; one full
///                   alert loop confirms the sighting (`spotted`).
///   5. **Chase** : spotted: walks toward the character at the fast speed.
///   6. **Patrol**: not spotted: drifts left at the slow speed.
///
/// `spotted` is one-way. Movement happens on the faster movement tick in
/// `advance`, using the state chosen by the last `think`.

use super::entity::{Body, Facing, Offsets};
use super::physics;
use super::sprite::Sequence;

pub const MAX_HEALTH: i32 = 115;
/// Damage to the character on plain contact.
pub const CONTACT_DAMAGE: i32 = 10;
/// Damage taken when the character lands on the boss.
pub const STOMP_DAMAGE: i32 = 5;
pub const FOLLOW_SPEED: f32 = 0.5;
pub const FOLLOW_SPEED_SPOTTED: f32 = 2.0;
pub const ATTACK_SPEED: f32 = 0.0;
pub const ATTACK_RANGE_X: f32 = 150.0;
pub const ATTACK_RANGE_Y: f32 = 180.0;
/// Patrol never drifts further left than this.
pub const PATROL_MIN_X: f32 = 500.0;
pub const HURT_WINDOW_MS: u64 = 1925;
pub const HOP_FORCE: f32 = 15.0;
pub const DEATH_SINK: f32 = 10.0;
const BASE_Y: f32 = 55.0;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BossState {
    Patrol,
    Alert,
    Chase,
    Attack,
    Hurt,
    Dead,
}

/// Notable things a `think` produced, for the step to report.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BossSignal {
    Alerted,
    Spotted,
    Died,
}

/// Everything the boss knows about the world for one decision.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BossSenses {
    pub on_screen: bool,
    pub in_range: bool,
    pub target_x: f32,
}

impl BossSenses {
    pub fn observe(boss: &Body, target: &Body, camera_x: f32, view_width: f32) -> Self {
        BossSenses {
            on_screen: is_on_screen(boss, camera_x, view_width),
            in_range: is_in_range(boss, target),
            target_x: target.x,
        }
    }
}

/// The viewport spans world x in `[-camera_x, -camera_x + view_width)`.
pub fn is_on_screen(boss: &Body, camera_x: f32, view_width: f32) -> bool {
    let left = -camera_x;
    let right = left + view_width;
    boss.x + boss.width > left && boss.x < right
}

/// Center-to-center distance inside the attack rectangle.
pub fn is_in_range(boss: &Body, target: &Body) -> bool {
    let (bx, by) = boss.center();
    let (tx, ty) = target.center();
    (bx - tx).abs() <= ATTACK_RANGE_X && (by - ty).abs() <= ATTACK_RANGE_Y
}

#[derive(Clone, Debug)]
pub struct Boss {
    pub body: Body,
    pub state: BossState,
    pub spotted: bool,
    pub speed: f32,
    hopped: bool,
    death_started: bool,
}

impl Boss {
    pub fn new(x: f32) -> Self {
        let body = Body::new(x, BASE_Y, 400.0, 400.0)
            .with_offsets(Offsets::new(60.0, 2.5, 35.0, 2.5))
            .with_health(MAX_HEALTH)
            .with_facing(Facing::Left)
            .with_sequence(Sequence::BossWalk);
        Boss {
            body,
            state: BossState::Patrol,
            spotted: false,
            speed: FOLLOW_SPEED,
            hopped: false,
            death_started: false,
        }
    }

    pub fn resolve_state(&self, senses: &BossSenses, now_ms: u64) -> BossState {
        if self.body.is_dead() {
            BossState::Dead
        } else if self.body.is_hurt(now_ms, HURT_WINDOW_MS) {
            BossState::Hurt
        } else if senses.in_range {
            BossState::Attack
        } else if !self.spotted && senses.on_screen {
            BossState::Alert
        } else if self.spotted {
            BossState::Chase
        } else {
            BossState::Patrol
        }
    }

    /// Animation tick: pick the state, play its animation, run its
    /// one-shot effects.
    pub fn think(&mut self, senses: &BossSenses, now_ms: u64) -> Option<BossSignal> {
        let next = self.resolve_state(senses, now_ms);
        let mut signal = None;

        match next {
            BossState::Dead => {
                if !self.death_started {
                    self.death_started = true;
                    self.speed = 0.0;
                    self.body.velocity = 0.0;
                    signal = Some(BossSignal::Died);
                }
                self.body.anim.play(Sequence::BossDead);
                self.body.y += DEATH_SINK;
            }
            BossState::Hurt => {
                self.body.anim.play(Sequence::BossHurt);
                if !self.hopped && physics::jump(&mut self.body, HOP_FORCE) {
                    self.hopped = true;
                }
                self.speed = self.follow_speed();
            }
            BossState::Attack => {
                self.speed = ATTACK_SPEED;
                self.body.facing = if senses.target_x > self.body.x { Facing::Right } else { Facing::Left };
                self.body.anim.play(Sequence::BossAttack);
            }
            BossState::Alert => {
                self.speed = 0.0;
                if self.state != BossState::Alert {
                    signal = Some(BossSignal::Alerted);
                }
                if self.body.anim.play(Sequence::BossAlert) {
                    self.spotted = true;
                    signal = Some(BossSignal::Spotted);
                }
            }
            BossState::Chase | BossState::Patrol => {
                self.speed = self.follow_speed();
                self.body.anim.play(Sequence::BossWalk);
            }
        }

        // Re-arm the hop once the hurt episode is over and we have landed
        if next != BossState::Hurt && physics::is_grounded(&self.body) {
            self.hopped = false;
        }
        self.state = next;
        signal
    }

    /// Movement tick.
    pub fn advance(&mut self, senses: &BossSenses) {
        match self.state {
            BossState::Dead | BossState::Alert | BossState::Attack => {}
            _ if self.spotted => self.follow(senses.target_x),
            _ => {
                if self.body.x > PATROL_MIN_X {
                    self.body.walk_left(self.speed);
                    self.body.facing = Facing::Left;
                }
            }
        }
    }

    fn follow(&mut self, target_x: f32) {
        if self.body.x > target_x {
            self.body.walk_left(self.speed);
            self.body.facing = Facing::Left;
        } else {
            self.body.walk_right(self.speed);
            self.body.facing = Facing::Right;
        }
    }

    fn follow_speed(&self) -> f32 {
        if self.spotted { FOLLOW_SPEED_SPOTTED } else { FOLLOW_SPEED }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEW: f32 = 720.0;

    fn senses(on_screen: bool, in_range: bool, target_x: f32) -> BossSenses {
        BossSenses { on_screen, in_range, target_x }
    }

    /// Think until the boss settles, returning every signal seen.
    fn think_n(boss: &mut Boss, s: &BossSenses, n: u64, start_ms: u64) -> Vec<BossSignal> {
        (0..n).filter_map(|i| boss.think(s, start_ms + i * 100)).collect()
    }

    #[test]
    fn screen_and_range_checks() {
        let boss = Boss::new(3650.0);
        // Viewport 2930..3650: boss starts exactly at the right edge → off
        assert!(!is_on_screen(&boss.body, -2930.0, VIEW));
        assert!(is_on_screen(&boss.body, -2931.0, VIEW));

        let mut target = Body::new(0.0, 110.0, 150.0, 325.0);
        // Boss center x = 3850; 150 px apart horizontally
        target.x = 3850.0 - 75.0 - 150.0;
        assert!(is_in_range(&boss.body, &target));
        target.x -= 1.0;
        assert!(!is_in_range(&boss.body, &target));
    }

    #[test]
    fn patrol_drifts_left_slowly_and_stops_at_min_x() {
        let mut boss = Boss::new(502.0);
        let s = senses(false, false, 0.0);
        boss.think(&s, 0);
        assert_eq!(boss.state, BossState::Patrol);
        for _ in 0..10 { boss.advance(&s); }
        assert!(boss.body.x <= PATROL_MIN_X);
        assert!(boss.body.x > PATROL_MIN_X - FOLLOW_SPEED);
    }

    #[test]
    fn alert_loop_confirms_sighting() {
        let mut boss = Boss::new(3000.0);
        let s = senses(true, false, 2000.0);

        assert_eq!(boss.think(&s, 0), Some(BossSignal::Alerted));
        assert_eq!(boss.state, BossState::Alert);
        assert!(!boss.spotted);

        // Standing still during alert
        let x = boss.body.x;
        boss.advance(&s);
        assert_eq!(boss.body.x, x);

        // Remaining frames of the alert loop, then the wrap confirms
        let signals = think_n(&mut boss, &s, Sequence::BossAlert.len() as u64, 100);
        assert_eq!(signals, vec![BossSignal::Spotted]);
        assert!(boss.spotted);

        boss.think(&s, 2000);
        assert_eq!(boss.state, BossState::Chase);
        assert_eq!(boss.speed, FOLLOW_SPEED_SPOTTED);
    }

    #[test]
    fn spotted_never_reverts() {
        let mut boss = Boss::new(3000.0);
        boss.spotted = true;
        for (i, s) in [
            senses(false, false, 0.0),
            senses(true, true, 2900.0),
            senses(true, false, 5000.0),
        ].iter().enumerate() {
            boss.think(s, i as u64 * 100);
            boss.advance(s);
            assert!(boss.spotted);
        }
        boss.body.hit(MAX_HEALTH, 500);
        boss.think(&senses(false, false, 0.0), 600);
        assert!(boss.spotted);
    }

    #[test]
    fn chase_follows_target_in_both_directions() {
        let mut boss = Boss::new(3000.0);
        boss.spotted = true;
        let left = senses(true, false, 2000.0);
        boss.think(&left, 0);
        boss.advance(&left);
        assert_eq!(boss.body.x, 3000.0 - FOLLOW_SPEED_SPOTTED);
        assert_eq!(boss.body.facing, Facing::Left);

        let right = senses(true, false, 4000.0);
        boss.think(&right, 100);
        boss.advance(&right);
        assert_eq!(boss.body.x, 3000.0);
        assert_eq!(boss.body.facing, Facing::Right);
    }

    #[test]
    fn attack_freezes_and_faces_target() {
        let mut boss = Boss::new(3000.0);
        boss.spotted = true;
        let s = senses(true, true, 3100.0);
        boss.think(&s, 0);
        assert_eq!(boss.state, BossState::Attack);
        assert_eq!(boss.speed, ATTACK_SPEED);
        assert_eq!(boss.body.facing, Facing::Right);
        boss.advance(&s);
        assert_eq!(boss.body.x, 3000.0);

        // Out of range again: back to chasing
        boss.think(&senses(true, false, 2000.0), 100);
        assert_eq!(boss.state, BossState::Chase);
    }

    #[test]
    fn hurt_hops_once_per_episode() {
        let mut boss = Boss::new(3000.0);
        boss.spotted = true;
        let s = senses(true, true, 3100.0);
        boss.body.hit(20, 0);

        boss.think(&s, 100);
        assert_eq!(boss.state, BossState::Hurt);
        assert_eq!(boss.body.velocity, HOP_FORCE);

        // Land again while still hurt: no second hop
        while physics::is_above_ground(&boss.body) || boss.body.velocity > 0.0 {
            physics::apply_gravity(&mut boss.body);
        }
        boss.think(&s, 200);
        assert_eq!(boss.body.velocity, 0.0);

        // Hurt window over: attack resumes, hop re-arms
        boss.think(&s, 100 + HURT_WINDOW_MS);
        assert_eq!(boss.state, BossState::Attack);
        boss.body.hit(20, 3000);
        boss.think(&s, 3100);
        assert_eq!(boss.body.velocity, HOP_FORCE);
    }

    #[test]
    fn death_runs_once_and_sinks() {
        let mut boss = Boss::new(3000.0);
        boss.body.hit(MAX_HEALTH + 50, 0);
        assert_eq!(boss.body.health, 0);

        let s = senses(true, true, 3000.0);
        let signals = think_n(&mut boss, &s, 5, 100);
        assert_eq!(signals, vec![BossSignal::Died]);
        assert_eq!(boss.body.y, BASE_Y + 5.0 * DEATH_SINK);

        let x = boss.body.x;
        boss.advance(&s);
        assert_eq!(boss.body.x, x);
    }
}
