/// Character controller: input-driven motion plus the pose state machine.
///
/// Two entry points, called at different cadences by the step:
///   - `apply_input`: every movement tick (walk, jump, facing)
///   - `animate`    : every animation tick (pose + frame advance)
///
/// Pose priority, strictly: Dead > Hurt > Jump > Walk > Idle/Tired.
/// Idle escalates to Tired after `TIRED_AFTER_MS` without any action.

use super::entity::{Body, Facing, InputFlags, Offsets, PickupKind};
use super::physics;
use super::sprite::Sequence;

pub const SPEED: f32 = 7.0;
pub const JUMP_FORCE: f32 = 25.0;
pub const ACCELERATION: f32 = 2.5;
pub const MAX_HEALTH: i32 = 100;
/// Damage dealt when landing on an enemy.
pub const STOMP_DAMAGE: i32 = 100;
pub const LEFT_BOUND: f32 = -100.0;
pub const HURT_WINDOW_MS: u64 = 1100;
pub const TIRED_AFTER_MS: u64 = 4000;
/// Pixels the corpse sinks per animation tick.
pub const DEATH_SINK: f32 = 20.0;

const START_X: f32 = 100.0;
const BASE_Y: f32 = 110.0;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CharacterState {
    Idle,
    Tired,
    Walk,
    Jump,
    Hurt,
    Dead,
}

/// What one movement tick did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Motion {
    pub walking: bool,
    pub jumped: bool,
}

#[derive(Clone, Debug)]
pub struct Character {
    pub body: Body,
    pub bottles: u32,
    pub coins: u32,
    pub state: CharacterState,
    pub last_action_ms: u64,
    /// Set by a stomp kill; cleared when contact damage lands.
    /// Suppresses the hurt pose right after killing an enemy.
    pub has_killed: bool,
    /// Mirrors of the looping sounds, so only transitions are reported.
    pub walking: bool,
}

impl Character {
    pub fn new(now_ms: u64) -> Self {
        let body = Body::new(START_X, BASE_Y, 150.0, 325.0)
            .with_offsets(Offsets::new(50.0, 50.0, 185.0, 5.0))
            .with_health(MAX_HEALTH)
            .with_acceleration(ACCELERATION)
            .with_sequence(Sequence::CharacterIdle);
        Character {
            body,
            bottles: 0,
            coins: 0,
            state: CharacterState::Idle,
            last_action_ms: now_ms,
            has_killed: false,
            walking: false,
        }
    }

    pub fn is_dead(&self) -> bool {
        self.body.is_dead()
    }

    pub fn is_hurt(&self, now_ms: u64) -> bool {
        self.body.is_hurt(now_ms, HURT_WINDOW_MS)
    }

    // ── Movement tick ──

    /// Walk and jump from the held input. Dead characters ignore input.
    pub fn apply_input(&mut self, input: InputFlags, level_end_x: f32, now_ms: u64) -> Motion {
        if self.is_dead() {
            return Motion::default();
        }

        let right = input.right && self.body.x < level_end_x;
        let left = input.left && self.body.x > LEFT_BOUND;

        if right {
            self.body.walk_right(SPEED);
            self.body.facing = Facing::Right;
            self.last_action_ms = now_ms;
        }
        if left {
            self.body.walk_left(SPEED);
            self.body.facing = Facing::Left;
            self.last_action_ms = now_ms;
        }

        let mut jumped = false;
        if input.jump && physics::jump(&mut self.body, JUMP_FORCE) {
            jumped = true;
            self.last_action_ms = now_ms;
        }
        if input.throw {
            self.last_action_ms = now_ms;
        }

        Motion { walking: right || left, jumped }
    }

    /// Landing on an enemy: velocity reset to the jump force.
    pub fn bounce(&mut self) {
        self.body.velocity = JUMP_FORCE;
    }

    // ── Animation tick ──

    pub fn resolve_state(&self, input: InputFlags, now_ms: u64) -> CharacterState {
        if self.is_dead() {
            CharacterState::Dead
        } else if self.is_hurt(now_ms) && !self.has_killed {
            CharacterState::Hurt
        } else if physics::is_above_ground(&self.body) {
            CharacterState::Jump
        } else if input.any_direction() {
            CharacterState::Walk
        } else if !input.throw && self.is_tired(now_ms) {
            CharacterState::Tired
        } else {
            CharacterState::Idle
        }
    }

    /// Re-evaluate the pose and advance its animation.
    /// Returns the previous state when the pose changed.
    pub fn animate(&mut self, input: InputFlags, now_ms: u64) -> Option<CharacterState> {
        let next = self.resolve_state(input, now_ms);
        let seq = match next {
            CharacterState::Dead => {
                self.body.y += DEATH_SINK;
                Sequence::CharacterDead
            }
            CharacterState::Hurt => Sequence::CharacterHurt,
            CharacterState::Jump => Sequence::CharacterJump,
            CharacterState::Walk => Sequence::CharacterWalk,
            CharacterState::Tired => Sequence::CharacterTired,
            CharacterState::Idle => Sequence::CharacterIdle,
        };
        self.body.anim.play(seq);

        let prev = self.state;
        self.state = next;
        (prev != next).then_some(prev)
    }

    fn is_tired(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.last_action_ms) > TIRED_AFTER_MS
    }

    // ── Inventory ──

    pub fn collect(&mut self, kind: PickupKind) {
        match kind {
            PickupKind::Bottle => self.bottles += 1,
            PickupKind::Coin => self.coins += 1,
        }
    }
}
