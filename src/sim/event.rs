/// Events emitted during a simulation step.
/// The presentation layer consumes these for sound and overlays.

use super::world::Outcome;

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum GameEvent {
    Jumped,
    WalkStarted,
    WalkStopped,
    SnoreStarted,
    SnoreStopped,
    CharacterHurt { damage: i32, health: i32 },
    CharacterDied,
    /// Landed on a chicken (it may or may not have died).
    EnemyStomped { enemy: usize },
    BossStomped { health: i32 },
    ChickenKilled { enemy: usize },
    /// A dead chicken's ambient voice went quiet.
    ChickenSilenced { enemy: usize },
    BossHit { health: i32 },
    BossAlerted,
    BossSpotted,
    BossDied,
    CoinCollected { coins: u32 },
    BottleCollected { bottles: u32 },
    BottleThrown { id: u64 },
    BottleSplashed { id: u64, x: f32, y: f32 },
    BottleRemoved { id: u64 },
    BottlesRefilled { count: usize },
    Victory,
    Defeat,
    SessionHalted(Outcome),
}
