/// Animation cursor: which sequence is showing and at which frame.
///
/// Re-playing the same sequence advances the cursor; switching to a
/// different sequence restarts it at frame 0. Callers invoke `play`
/// once per animation tick, usually with the same sequence, so this
/// avoids restart thrash.

use super::sprite::{Sequence, SpriteFrame};

#[derive(Clone, Debug, Default)]
pub struct Animation {
    sequence: Option<Sequence>,
    frame: usize,
}

impl Animation {
    pub fn new() -> Self {
        Animation::default()
    }

    /// Start at a given sequence without advancing.
    pub fn starting_at(sequence: Sequence) -> Self {
        Animation { sequence: Some(sequence), frame: 0 }
    }

    /// Loop through `sequence`. Returns true when this call wrapped
    /// from the last frame back to the first (one full loop completed).
    pub fn play(&mut self, sequence: Sequence) -> bool {
        if self.sequence != Some(sequence) {
            self.sequence = Some(sequence);
            self.frame = 0;
            return false;
        }
        self.frame += 1;
        if self.frame >= sequence.len() {
            self.frame = 0;
            return true;
        }
        false
    }

    /// Advance through `sequence` and hold on its last frame.
    /// Returns true once the last frame is showing.
    pub fn play_once(&mut self, sequence: Sequence) -> bool {
        if self.sequence != Some(sequence) {
            self.sequence = Some(sequence);
            self.frame = 0;
        } else if self.frame + 1 < sequence.len() {
            self.frame += 1;
        }
        self.frame + 1 >= sequence.len()
    }

    pub fn sequence(&self) -> Option<Sequence> {
        self.sequence
    }

    pub fn current(&self) -> Option<SpriteFrame> {
        self.sequence.map(|sequence| SpriteFrame { sequence, index: self.frame })
    }
}
