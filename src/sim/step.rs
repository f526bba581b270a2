/// The step function: advances the world by one base tick.
///
/// Processing order:
///   1. Movement      (every tick)  character input, camera, enemies, bottles
///   2. Gravity       (cadence)     character, boss, thrown bottles
///   3. Animation     (cadence)     pose + AI state machines, frame advance
///   4. Collisions    (every tick)  contact, pickups, bottle hits
///   5. Status        (cadence)     throw, refill, outcome
///   6. Scheduled tasks             removals, halt
///   7. Cleanup                     bottles that fell off the world
///   8. HUD refresh
///
/// A halted world is frozen: `step` returns no events and changes nothing.

use log::{debug, info};

use crate::domain::ai::{self, BossSignal};
use crate::domain::character::{self, CharacterState};
use crate::domain::enemy::Enemy;
use crate::domain::entity::{Body, InputFlags, Pickup, PickupKind};
use crate::domain::physics;
use crate::domain::projectile::{self, Projectile};
use crate::domain::rules::{self, Contact};
use super::event::GameEvent;
use super::schedule::Task;
use super::world::{Outcome, Phase, WorldState};

/// Delay between the outcome fanfare and the halt.
pub const DEFEAT_HALT_MS: u64 = 760;
pub const VICTORY_HALT_MS: u64 = 1160;

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(world: &mut WorldState, input: InputFlags) -> Vec<GameEvent> {
    if world.is_halted() { return vec![]; }

    let mut events: Vec<GameEvent> = Vec::new();
    world.tick += 1;
    world.now_ms += world.timing.tick_rate_ms;

    resolve_movement(world, input, &mut events);
    if world.is_due(world.timing.gravity_every) {
        resolve_gravity(world);
    }
    if world.is_due(world.timing.animation_every) {
        resolve_animation(world, input, &mut events);
    }
    resolve_enemy_contact(world, &mut events);
    resolve_pickups(world, &mut events);
    resolve_projectile_hits(world, &mut events);
    if world.is_due(world.timing.status_every) {
        resolve_throw(world, input, &mut events);
        resolve_refill(world, &mut events);
        resolve_outcome(world, &mut events);
    }
    if !resolve_scheduled(world, &mut events) {
        resolve_cleanup(world, &mut events);
    }
    world.refresh_hud();

    events
}

// ══════════════════════════════════════════════════════════════
// Movement
// ══════════════════════════════════════════════════════════════

fn resolve_movement(world: &mut WorldState, input: InputFlags, events: &mut Vec<GameEvent>) {
    let end = world.level.level_end_x;
    let c = &mut world.character;

    let motion = c.apply_input(input, end, world.now_ms);
    if motion.jumped {
        events.push(GameEvent::Jumped);
    }
    // The footsteps loop only runs on the ground
    let walking = motion.walking && !physics::is_above_ground(&c.body);
    if walking != c.walking {
        c.walking = walking;
        events.push(if walking { GameEvent::WalkStarted } else { GameEvent::WalkStopped });
    }
    world.camera_x = rules::camera_offset(c.body.x, end);

    for e in &mut world.level.enemies {
        if let Enemy::Patrol(chicken) = e {
            chicken.advance();
        }
    }
    if let Some(senses) = world.boss_senses() {
        if let Some(boss) = world.level.boss_mut() {
            boss.advance(&senses);
        }
    }
    for p in &mut world.level.projectiles {
        p.advance();
    }
    world.level.drift_clouds();
}

fn resolve_gravity(world: &mut WorldState) {
    physics::apply_gravity(&mut world.character.body);
    if let Some(boss) = world.level.boss_mut() {
        physics::apply_gravity(&mut boss.body);
    }
    for p in &mut world.level.projectiles {
        physics::apply_gravity(&mut p.body);
    }
}

// ══════════════════════════════════════════════════════════════
// Animation + state machines
// ══════════════════════════════════════════════════════════════

fn resolve_animation(world: &mut WorldState, input: InputFlags, events: &mut Vec<GameEvent>) {
    let now = world.now_ms;

    if let Some(prev) = world.character.animate(input, now) {
        let next = world.character.state;
        debug!("character {prev:?} -> {next:?}");
        if prev == CharacterState::Tired {
            events.push(GameEvent::SnoreStopped);
        }
        if next == CharacterState::Tired {
            events.push(GameEvent::SnoreStarted);
        }
    }

    for (i, e) in world.level.enemies.iter_mut().enumerate() {
        if let Enemy::Patrol(chicken) = e {
            if chicken.animate() {
                events.push(GameEvent::ChickenSilenced { enemy: i });
            }
        }
    }

    if let Some(senses) = world.boss_senses() {
        if let Some(boss) = world.level.boss_mut() {
            let before = boss.state;
            let signal = boss.think(&senses, now);
            if boss.state != before {
                debug!("boss {before:?} -> {:?}", boss.state);
            }
            match signal {
                Some(BossSignal::Alerted) => events.push(GameEvent::BossAlerted),
                Some(BossSignal::Spotted) => events.push(GameEvent::BossSpotted),
                Some(BossSignal::Died) => {
                    info!("boss down at {now} ms");
                    events.push(GameEvent::BossDied);
                }
                None => {}
            }
        }
    }

    for p in &mut world.level.projectiles {
        p.animate();
    }
    for p in world.level.coins.iter_mut().chain(world.level.bottles.iter_mut()) {
        p.animate();
    }
}

// ══════════════════════════════════════════════════════════════
// Collisions
// ══════════════════════════════════════════════════════════════

/// Character × enemies. `stomped` blocks counter-damage for the rest
/// of this pass once the character has landed on something.
fn resolve_enemy_contact(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if world.character.is_dead() { return; }

    let now = world.now_ms;
    let cooldown = world.gameplay.damage_cooldown_ms;
    let c = &mut world.character;
    let falling = physics::is_falling(&c.body);
    let mut stomped = false;

    for (i, enemy) in world.level.enemies.iter_mut().enumerate() {
        if !physics::is_colliding(&c.body, enemy.body()) { continue; }

        let allowed = !stomped && rules::may_take_damage(&c.body, now, cooldown);
        match rules::resolve_contact(falling, enemy, allowed) {
            Contact::None => {}
            Contact::StompBoss => {
                enemy.body_mut().hit(ai::STOMP_DAMAGE, now);
                c.has_killed = false;
                c.bounce();
                stomped = true;
                events.push(GameEvent::BossStomped { health: enemy.body().health });
            }
            Contact::Stomp => {
                enemy.body_mut().hit(character::STOMP_DAMAGE, now);
                stomped = true;
                events.push(GameEvent::EnemyStomped { enemy: i });
                if enemy.is_dead() {
                    c.has_killed = true;
                    events.push(GameEvent::ChickenKilled { enemy: i });
                }
            }
            Contact::Hurt(damage) => {
                let taken = c.body.hit(damage, now);
                c.has_killed = false;
                if taken > 0 {
                    events.push(GameEvent::CharacterHurt { damage: taken, health: c.body.health });
                }
                if c.is_dead() {
                    info!("character down at {now} ms");
                    events.push(GameEvent::CharacterDied);
                    break;
                }
            }
        }
    }
}

fn resolve_pickups(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if world.character.is_dead() { return; }

    let body = &world.character.body;
    let bottles = take_colliding(&mut world.level.bottles, body);
    let coins = take_colliding(&mut world.level.coins, body);

    let c = &mut world.character;
    for _ in 0..bottles {
        c.collect(PickupKind::Bottle);
        events.push(GameEvent::BottleCollected { bottles: c.bottles });
    }
    for _ in 0..coins {
        c.collect(PickupKind::Coin);
        events.push(GameEvent::CoinCollected { coins: c.coins });
    }
}

/// Remove every pickup touching `body`; returns how many were taken.
fn take_colliding(items: &mut Vec<Pickup>, body: &Body) -> usize {
    let before = items.len();
    items.retain(|p| !physics::is_colliding(body, &p.body));
    before - items.len()
}

/// Thrown bottles × living enemies. A bottle breaks on the first enemy
/// it touches; chickens die outright, the boss loses `projectile::DAMAGE`.
fn resolve_projectile_hits(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let now = world.now_ms;
    let level = &mut world.level;

    for p in level.projectiles.iter_mut().filter(|p| !p.splashed) {
        let target = level.enemies.iter_mut().enumerate()
            .find(|(_, e)| !e.is_dead() && physics::is_colliding(&p.body, e.body()));
        let Some((i, enemy)) = target else { continue };

        p.splash();
        events.push(GameEvent::BottleSplashed { id: p.id, x: p.body.x, y: p.body.y });
        world.scheduler.schedule(now + projectile::LINGER_MS, Task::RemoveProjectile(p.id));

        enemy.body_mut().hit(projectile::DAMAGE, now);
        match enemy {
            Enemy::Boss(boss) => {
                debug!("boss hit, health {}", boss.body.health);
                events.push(GameEvent::BossHit { health: boss.body.health });
            }
            Enemy::Patrol(chicken) => {
                chicken.body.kill(now);
                events.push(GameEvent::ChickenKilled { enemy: i });
            }
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Status: throw, refill, outcome
// ══════════════════════════════════════════════════════════════

fn resolve_throw(world: &mut WorldState, input: InputFlags, events: &mut Vec<GameEvent>) {
    let c = &world.character;
    if !input.throw || c.is_dead() { return; }
    if !rules::check_throw_allowed(c.bottles, world.level.projectiles.len()) { return; }

    let (x, y) = rules::throw_origin(&c.body);
    let facing = c.body.facing;
    let id = world.level.next_id();
    world.level.projectiles.push(Projectile::launch(id, x, y, facing));
    world.character.bottles -= 1;
    events.push(GameEvent::BottleThrown { id });
}

fn resolve_refill(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let level = &world.level;
    if !level.bottles.is_empty() || !level.projectiles.is_empty() || world.character.bottles > 0 {
        return;
    }
    let count = world.level.refill_bottles(&mut world.rng);
    debug!("out of bottles, placed {count} more");
    events.push(GameEvent::BottlesRefilled { count });
}

/// Defeat is checked before victory; whichever fires first wins and
/// nothing else is announced afterwards.
fn resolve_outcome(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if world.defeat_shown || world.victory_shown { return; }

    let now = world.now_ms;
    if world.character.is_dead() {
        world.defeat_shown = true;
        info!("defeat; halting in {DEFEAT_HALT_MS} ms");
        events.push(GameEvent::Defeat);
        world.scheduler.schedule(now + DEFEAT_HALT_MS, Task::Halt(Outcome::Defeat));
    } else if world.level.boss().map_or(false, |b| b.body.is_dead()) {
        world.victory_shown = true;
        info!("victory; halting in {VICTORY_HALT_MS} ms");
        events.push(GameEvent::Victory);
        world.scheduler.schedule(now + VICTORY_HALT_MS, Task::Halt(Outcome::Victory));
    }
}

// ══════════════════════════════════════════════════════════════
// Scheduled tasks + cleanup
// ══════════════════════════════════════════════════════════════

/// Run due tasks. Returns true if the session halted.
fn resolve_scheduled(world: &mut WorldState, events: &mut Vec<GameEvent>) -> bool {
    for task in world.scheduler.take_due(world.now_ms) {
        match task {
            Task::RemoveProjectile(id) => {
                if world.level.remove_projectile(id) {
                    events.push(GameEvent::BottleRemoved { id });
                }
            }
            Task::Halt(outcome) => {
                let cancelled = world.scheduler.cancel_all();
                world.phase = Phase::Halted(outcome);
                info!("session halted ({outcome:?}), {cancelled} pending tasks cancelled");
                events.push(GameEvent::SessionHalted(outcome));
                return true;
            }
        }
    }
    false
}

/// Bottles that fell past the bottom bound break and vanish at once.
fn resolve_cleanup(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let mut gone = Vec::new();
    for p in world.level.projectiles.iter_mut().filter(|p| p.is_out_of_bounds()) {
        if p.splash() {
            events.push(GameEvent::BottleSplashed { id: p.id, x: p.body.x, y: p.body.y });
        }
        gone.push(p.id);
    }
    for id in gone {
        if world.level.remove_projectile(id) {
            events.push(GameEvent::BottleRemoved { id });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GameplayConfig, TimingConfig};
    use crate::domain::enemy::Chicken;
    use crate::domain::entity::Facing;
    use crate::domain::sprite::Sequence;
    use crate::sim::level::LevelDef;

    /// Empty level: just the character and the boss.
    const ARENA: &str = r#"
        name = "arena"
        level_end_x = 3600
        [bottles]
        count = 0
        min_x = 400
        max_x = 2000
        [boss]
        x = 3650
    "#;

    fn arena_with(gameplay: GameplayConfig) -> WorldState {
        let def = LevelDef::parse(ARENA).unwrap();
        WorldState::new(&def, TimingConfig::default(), gameplay)
    }

    fn arena() -> WorldState {
        arena_with(GameplayConfig { seed: Some(1), ..GameplayConfig::default() })
    }

    fn run(world: &mut WorldState, input: InputFlags, ticks: usize) -> Vec<GameEvent> {
        (0..ticks).flat_map(|_| step(world, input)).collect()
    }

    fn count(events: &[GameEvent], f: impl Fn(&GameEvent) -> bool) -> usize {
        events.iter().filter(|e| f(e)).count()
    }

    fn idle() -> InputFlags {
        InputFlags::default()
    }

    /// Put a chicken in front of everything else, keeping the boss last.
    fn add_chicken(world: &mut WorldState, x: f32) -> usize {
        world.level.enemies.insert(0, Enemy::Patrol(Chicken::new(x, 0.3)));
        0
    }

    // ── Session flow ──

    #[test]
    fn halted_world_is_frozen() {
        let mut w = arena();
        w.phase = Phase::Halted(Outcome::Defeat);
        let x = w.character.body.x;
        assert!(step(&mut w, InputFlags { right: true, ..idle() }).is_empty());
        assert_eq!(w.tick, 0);
        assert_eq!(w.character.body.x, x);
    }

    #[test]
    fn six_bottles_beat_the_boss_and_victory_fires_once() {
        let mut w = arena();
        let bx = w.level.boss().unwrap().body.x;
        for _ in 0..6 {
            let id = w.level.next_id();
            w.level.projectiles.push(Projectile::launch(id, bx + 150.0, 200.0, Facing::Right));
        }

        let first = step(&mut w, idle());
        assert_eq!(count(&first, |e| matches!(e, GameEvent::BossHit { .. })), 6);
        assert!(w.level.boss().unwrap().body.is_dead());
        assert!(w.level.projectiles.iter().all(|p| p.splashed));

        let events = run(&mut w, idle(), 200);
        assert_eq!(count(&events, |e| *e == GameEvent::Victory), 1);
        assert_eq!(count(&events, |e| *e == GameEvent::BossDied), 1);
        assert_eq!(count(&events, |e| *e == GameEvent::Defeat), 0);
        assert!(events.contains(&GameEvent::SessionHalted(Outcome::Victory)));
        assert_eq!(w.outcome(), Some(Outcome::Victory));
        assert!(w.scheduler.is_empty());

        assert!(step(&mut w, idle()).is_empty());
    }

    #[test]
    fn victory_waits_before_halting() {
        let mut w = arena();
        w.level.boss_mut().unwrap().body.kill(0);

        let events = run(&mut w, idle(), 8);
        assert!(events.contains(&GameEvent::Victory));
        let announced_at = w.now_ms;

        while !w.is_halted() {
            step(&mut w, idle());
            assert!(w.tick < 1000);
        }
        assert!(w.now_ms >= announced_at + VICTORY_HALT_MS);
        assert!(w.now_ms < announced_at + VICTORY_HALT_MS + w.timing.tick_rate_ms);
    }

    #[test]
    fn defeat_is_checked_before_victory() {
        let mut w = arena();
        w.character.body.kill(0);
        w.level.boss_mut().unwrap().body.kill(0);

        let events = run(&mut w, idle(), 200);
        assert_eq!(count(&events, |e| *e == GameEvent::Defeat), 1);
        assert_eq!(count(&events, |e| *e == GameEvent::Victory), 0);
        assert_eq!(w.outcome(), Some(Outcome::Defeat));
    }

    // ── Contact ──

    #[test]
    fn three_bites_leave_the_character_at_85() {
        let mut w = arena();
        add_chicken(&mut w, 130.0);

        let events = run(&mut w, idle(), 3);
        assert_eq!(w.character.body.health, 85);
        assert!(!w.character.is_dead());
        assert_eq!(count(&events, |e| matches!(e, GameEvent::CharacterHurt { damage: 5, .. })), 3);
    }

    #[test]
    fn damage_cooldown_gates_repeat_bites() {
        let mut w = arena_with(GameplayConfig { damage_cooldown_ms: 500, seed: Some(1) });
        add_chicken(&mut w, 130.0);
        run(&mut w, idle(), 3);
        assert_eq!(w.character.body.health, 95);
    }

    #[test]
    fn stomp_kills_chicken_and_corpse_is_harmless() {
        let mut w = arena();
        let i = add_chicken(&mut w, 130.0);
        w.character.body.y = 60.0;
        w.character.body.velocity = -5.0;

        let events = step(&mut w, idle());
        assert!(events.contains(&GameEvent::ChickenKilled { enemy: i }));
        assert!(w.level.enemies[i].is_dead());
        assert!(w.character.has_killed);
        assert_eq!(w.character.body.health, 100);

        // Land on the corpse and stand in it for a while
        run(&mut w, idle(), 60);
        assert_eq!(w.character.body.health, 100);
        assert!(physics::is_grounded(&w.character.body));
    }

    #[test]
    fn stomping_the_boss_chips_it_and_bounces() {
        let mut w = arena();
        w.character.body.x = 3700.0;
        w.character.body.y = 0.0;
        w.character.body.velocity = -3.0;

        let events = step(&mut w, idle());
        assert!(events.contains(&GameEvent::BossStomped { health: ai::MAX_HEALTH - ai::STOMP_DAMAGE }));
        assert_eq!(w.character.body.velocity, character::JUMP_FORCE);
        assert_eq!(w.character.body.health, 100);
    }

    #[test]
    fn dead_character_takes_no_more_damage() {
        let mut w = arena();
        add_chicken(&mut w, 130.0);
        w.character.body.health = 5;

        let events = run(&mut w, idle(), 5);
        assert_eq!(w.character.body.health, 0);
        assert_eq!(count(&events, |e| *e == GameEvent::CharacterDied), 1);
        assert_eq!(count(&events, |e| matches!(e, GameEvent::CharacterHurt { .. })), 1);
    }

    // ── Pickups ──

    #[test]
    fn pickups_are_consumed_once() {
        let mut w = arena();
        let coin = w.level.next_id();
        w.level.coins.push(Pickup::coin(coin, 100.0, 250.0));
        let bottle = w.level.next_id();
        w.level.bottles.push(Pickup::bottle(bottle, 100.0));

        let events = step(&mut w, idle());
        assert!(events.contains(&GameEvent::CoinCollected { coins: 1 }));
        assert!(events.contains(&GameEvent::BottleCollected { bottles: 1 }));
        assert!(w.level.coins.is_empty() && w.level.bottles.is_empty());

        step(&mut w, idle());
        assert_eq!((w.character.coins, w.character.bottles), (1, 1));
        assert_eq!(w.hud.coins, 1);
        assert_eq!(w.hud.bottle_percent, 20);
    }

    // ── Throwing ──

    #[test]
    fn throw_without_bottles_spawns_nothing() {
        let mut w = arena();
        assert!(!rules::check_throw_allowed(w.character.bottles, w.level.projectiles.len()));
        let events = run(&mut w, InputFlags { throw: true, ..idle() }, 40);
        assert!(w.level.projectiles.is_empty());
        assert_eq!(count(&events, |e| matches!(e, GameEvent::BottleThrown { .. })), 0);
    }

    #[test]
    fn one_bottle_in_flight_at_a_time() {
        let mut w = arena();
        w.character.bottles = 2;
        let throw = InputFlags { throw: true, ..idle() };

        let events = run(&mut w, throw, 24);
        assert_eq!(count(&events, |e| matches!(e, GameEvent::BottleThrown { .. })), 1);
        assert_eq!(w.level.projectiles.len(), 1);
        assert_eq!(w.character.bottles, 1);
        let p = &w.level.projectiles[0];
        assert!(p.body.x > w.character.body.x + 130.0);

        // The first one falls off the world, then the second goes
        let events = run(&mut w, throw, 60);
        assert!(events.iter().any(|e| matches!(e, GameEvent::BottleRemoved { .. })));
        assert_eq!(count(&events, |e| matches!(e, GameEvent::BottleThrown { .. })), 1);
        assert_eq!(w.character.bottles, 0);
    }

    #[test]
    fn splashed_bottle_lingers_then_goes() {
        let mut w = arena();
        let i = add_chicken(&mut w, 600.0);
        let id = w.level.next_id();
        w.level.projectiles.push(Projectile::launch(id, 600.0, 330.0, Facing::Right));

        let events = step(&mut w, idle());
        assert!(events.contains(&GameEvent::ChickenKilled { enemy: i }));
        assert!(w.level.projectiles[0].splashed);

        let mut removed = false;
        for _ in 0..120 {
            let events = step(&mut w, idle());
            if events.contains(&GameEvent::BottleRemoved { id }) {
                removed = true;
                break;
            }
            let frame = w.level.projectiles[0].body.frame().unwrap();
            assert_eq!(frame.sequence, Sequence::BottleSplash);
        }
        assert!(removed);
        assert!(w.now_ms >= 16 + projectile::LINGER_MS);
    }

    #[test]
    fn refill_when_completely_out() {
        let mut w = arena();
        let events = run(&mut w, idle(), 8);
        assert!(events.contains(&GameEvent::BottlesRefilled { count: 6 }));
        assert_eq!(w.level.bottles.len(), 6);

        // Not again while bottles are lying around
        let events = run(&mut w, idle(), 16);
        assert!(!events.iter().any(|e| matches!(e, GameEvent::BottlesRefilled { .. })));
    }

    // ── Movement + boss ──

    #[test]
    fn walking_moves_camera_and_toggles_footsteps() {
        let mut w = arena();
        let events = run(&mut w, InputFlags { right: true, ..idle() }, 10);
        assert_eq!(w.character.body.x, 170.0);
        assert_eq!(w.camera_x, -70.0);
        assert_eq!(count(&events, |e| *e == GameEvent::WalkStarted), 1);

        let events = step(&mut w, idle());
        assert!(events.contains(&GameEvent::WalkStopped));
    }

    #[test]
    fn boss_notices_character_in_view() {
        let mut w = arena();
        w.character.body.x = 3300.0;

        let events = run(&mut w, idle(), 120);
        assert!(events.contains(&GameEvent::BossAlerted));
        assert!(events.contains(&GameEvent::BossSpotted));
        let boss = w.level.boss().unwrap();
        assert!(boss.spotted);
        assert!(boss.body.x < 3650.0);
        assert!(w.hud.boss_visible);
    }
}
