/// Image sequences and their properties.
/// Frame counts are queried via methods, not stored per entity,
/// so sprite semantics are centralized here.

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Sequence {
    CharacterIdle,
    CharacterTired,
    CharacterWalk,
    CharacterJump,
    CharacterHurt,
    CharacterDead,
    ChickenWalk,
    ChickenDead,
    BossWalk,
    BossAlert,
    BossAttack,
    BossHurt,
    BossDead,
    BottleRotate,
    BottleSplash,
    BottleGround,
    Coin,
}

impl Sequence {
    /// Number of images in the sequence.
    pub fn len(self) -> usize {
        match self {
            Sequence::CharacterIdle | Sequence::CharacterTired => 10,
            Sequence::CharacterWalk => 6,
            Sequence::CharacterJump => 9,
            Sequence::CharacterHurt => 3,
            Sequence::CharacterDead => 7,
            Sequence::ChickenWalk => 3,
            Sequence::ChickenDead => 1,
            Sequence::BossWalk => 4,
            Sequence::BossAlert | Sequence::BossAttack => 8,
            Sequence::BossHurt | Sequence::BossDead => 3,
            Sequence::BottleRotate => 4,
            Sequence::BottleSplash => 6,
            Sequence::BottleGround | Sequence::Coin => 2,
        }
    }
}

/// One concrete image: a sequence plus the frame inside it.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SpriteFrame {
    pub sequence: Sequence,
    pub index: usize,
}

/// Static background layers, back to front.
#[derive(Clone, Copy, PartialEq, Eq, Debug, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    Air,
    Clouds,
    Third,
    Second,
    First,
}

/// Anything the render surface can be asked to draw.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Sprite {
    Frame(SpriteFrame),
    Layer(Layer),
}
