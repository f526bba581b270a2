/// Gameplay rules: pure functions, no side effects.
///
/// These encode "what happens" for a given situation; the step applies it.
///
/// ## Character × Enemy contact
/// ┌───────────────────────────────┬────────────────┬──────────────────────┐
/// │ Condition (priority order)     │ Outcome        │ Effect               │
/// ├───────────────────────────────┼────────────────┼──────────────────────┤
/// │ enemy dead                     │ None           │ corpses are harmless │
/// │ character falling, enemy boss  │ StompBoss      │ boss -5, bounce      │
/// │ character falling, patrol      │ Stomp          │ enemy -100, bounce   │
/// │ stomp kill earlier this pass   │ None           │ no counter-damage    │
/// │ damage cooldown running        │ None           │ (off by default)     │
/// │ otherwise                      │ Hurt(damage)   │ character -damage    │
/// └───────────────────────────────┴────────────────┴──────────────────────┘
///
/// ## Throw
/// ┌───────────────────────────────┬────────┐
/// │ Condition                      │ Allow? │
/// ├───────────────────────────────┼────────┤
/// │ bottles == 0                   │ DENY   │
/// │ any thrown bottle still exists │ DENY   │
/// │ otherwise                      │ ALLOW  │
/// └───────────────────────────────┴────────┘
///
/// ## Camera
///
///   camera_x = clamp(-x + 100, -max_camera_x, 60)
///   max_camera_x = level_end_x - CANVAS_WIDTH + 100
///
/// The viewport shows world x in `[-camera_x, -camera_x + CANVAS_WIDTH)`.

use super::entity::{Body, Facing};
use super::enemy::Enemy;

pub const CANVAS_WIDTH: f32 = 720.0;
pub const CANVAS_HEIGHT: f32 = 480.0;
/// Most the camera leads to the right of the world origin.
pub const CAMERA_LEAD: f32 = 60.0;
/// Screen x the character is kept at while scrolling.
pub const CAMERA_ANCHOR: f32 = 100.0;
/// Bottles that fill the bottle bar.
pub const BOTTLE_BAR_CAPACITY: u32 = 5;

// ══════════════════════════════════════════════════════════════
// Camera
// ══════════════════════════════════════════════════════════════

pub fn max_camera_x(level_end_x: f32) -> f32 {
    level_end_x - CANVAS_WIDTH + CAMERA_ANCHOR
}

pub fn camera_offset(character_x: f32, level_end_x: f32) -> f32 {
    (-character_x + CAMERA_ANCHOR)
        .min(CAMERA_LEAD)
        .max(-max_camera_x(level_end_x))
}

// ══════════════════════════════════════════════════════════════
// Contact
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Contact {
    None,
    StompBoss,
    Stomp,
    Hurt(i32),
}

/// Decide what an overlap between the character and `enemy` does.
/// `damage_allowed` folds in both the stomp-kill flag and the cooldown.
pub fn resolve_contact(falling: bool, enemy: &Enemy, damage_allowed: bool) -> Contact {
    if enemy.is_dead() {
        Contact::None
    } else if falling && enemy.is_boss() {
        Contact::StompBoss
    } else if falling {
        Contact::Stomp
    } else if !damage_allowed {
        Contact::None
    } else {
        Contact::Hurt(enemy.contact_damage())
    }
}

/// Contact damage gate. A zero cooldown never blocks.
pub fn may_take_damage(body: &Body, now_ms: u64, cooldown_ms: u64) -> bool {
    if cooldown_ms == 0 {
        return true;
    }
    match body.last_hit_ms {
        Some(t) => now_ms.saturating_sub(t) >= cooldown_ms,
        None => true,
    }
}

// ══════════════════════════════════════════════════════════════
// Throw
// ══════════════════════════════════════════════════════════════

pub fn check_throw_allowed(bottles: u32, projectiles_present: usize) -> bool {
    bottles > 0 && projectiles_present == 0
}

/// Spawn point of a thrown bottle relative to the character.
pub fn throw_origin(character: &Body) -> (f32, f32) {
    let x = match character.facing {
        Facing::Right => character.x + 130.0,
        Facing::Left => character.x - 20.0,
    };
    (x, character.y + 30.0)
}

// ══════════════════════════════════════════════════════════════
// Status bars
// ══════════════════════════════════════════════════════════════

/// Image index 0..=5 for a 0..=100 percentage (0, 20, 40, 60, 80, 100).
pub fn bar_step(percent: u32) -> usize {
    if percent >= 100 { 5 }
    else if percent > 80 { 4 }
    else if percent > 60 { 3 }
    else if percent > 40 { 2 }
    else if percent > 20 { 1 }
    else { 0 }
}

pub fn bottle_percent(bottles: u32) -> u32 {
    (bottles.min(BOTTLE_BAR_CAPACITY) * 100) / BOTTLE_BAR_CAPACITY
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ai::Boss;
    use crate::domain::enemy::Chicken;

    const END: f32 = 3600.0;

    #[test]
    fn camera_stays_in_range_across_level() {
        let lo = -max_camera_x(END);
        let mut x = -100.0;
        while x <= END + 7.0 {
            let c = camera_offset(x, END);
            assert!(c >= lo && c <= CAMERA_LEAD, "x={x} camera={c}");
            x += 7.0;
        }
    }

    #[test]
    fn camera_tracks_then_clamps() {
        assert_eq!(camera_offset(-100.0, END), 60.0);
        assert_eq!(camera_offset(100.0, END), 0.0);
        assert_eq!(camera_offset(1000.0, END), -900.0);
        assert_eq!(camera_offset(END, END), -2980.0);
    }

    #[test]
    fn contact_outcomes() {
        let chicken = Enemy::Patrol(Chicken::new(0.0, 0.3));
        let boss = Enemy::Boss(Boss::new(0.0));

        assert_eq!(resolve_contact(true, &boss, true), Contact::StompBoss);
        assert_eq!(resolve_contact(true, &chicken, true), Contact::Stomp);
        assert_eq!(resolve_contact(false, &chicken, true), Contact::Hurt(5));
        assert_eq!(resolve_contact(false, &boss, true), Contact::Hurt(10));
        assert_eq!(resolve_contact(false, &boss, false), Contact::None);
        // A stomp still lands while damage is blocked
        assert_eq!(resolve_contact(true, &chicken, false), Contact::Stomp);
    }

    #[test]
    fn dead_enemies_are_inert() {
        let mut chicken = Enemy::Patrol(Chicken::new(0.0, 0.3));
        chicken.body_mut().kill(0);
        assert_eq!(resolve_contact(true, &chicken, true), Contact::None);
        assert_eq!(resolve_contact(false, &chicken, true), Contact::None);
    }

    #[test]
    fn zero_cooldown_never_blocks() {
        let mut b = Body::new(0.0, 0.0, 1.0, 1.0);
        b.hit(5, 100);
        assert!(may_take_damage(&b, 100, 0));
        assert!(!may_take_damage(&b, 100, 500));
        assert!(!may_take_damage(&b, 599, 500));
        assert!(may_take_damage(&b, 600, 500));
    }

    #[test]
    fn throw_needs_bottles_and_a_clear_sky() {
        assert!(!check_throw_allowed(0, 0));
        assert!(!check_throw_allowed(3, 1));
        assert!(check_throw_allowed(1, 0));
    }

    #[test]
    fn throw_origin_follows_facing() {
        let mut b = Body::new(500.0, 110.0, 150.0, 325.0);
        assert_eq!(throw_origin(&b), (630.0, 140.0));
        b.facing = Facing::Left;
        assert_eq!(throw_origin(&b), (480.0, 140.0));
    }

    #[test]
    fn bar_steps() {
        let cases = [(0, 0), (20, 0), (21, 1), (40, 1), (60, 2), (61, 3), (80, 3), (99, 4), (100, 5), (130, 5)];
        for (p, want) in cases {
            assert_eq!(bar_step(p), want, "percent {p}");
        }
        assert_eq!(bottle_percent(0), 0);
        assert_eq!(bottle_percent(2), 40);
        assert_eq!(bottle_percent(9), 100);
    }
}
