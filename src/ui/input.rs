/// Keyboard input tracker.
///
/// Tracks which keys are currently held so movement can be continuous
/// and menu keys edge-triggered. Uses crossterm's keyboard enhancement
/// for Release events when the terminal supports it, otherwise a key
/// counts as released once no Press/Repeat has arrived for `HOLD_TIMEOUT`.
///
/// Gameplay keys:
///   ← / A        walk left
///   → / D        walk right
///   ↑ / Space    jump
///   F / J        throw
///   M            mute toggle (menu-level)

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, poll};

use crate::domain::entity::InputFlags;

/// Without Release events, a key is considered released after this long.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

pub const LEFT_KEYS: [KeyCode; 2] = [KeyCode::Left, KeyCode::Char('a')];
pub const RIGHT_KEYS: [KeyCode; 2] = [KeyCode::Right, KeyCode::Char('d')];
pub const JUMP_KEYS: [KeyCode; 2] = [KeyCode::Up, KeyCode::Char(' ')];
pub const THROW_KEYS: [KeyCode; 2] = [KeyCode::Char('f'), KeyCode::Char('j')];

pub struct InputState {
    last_active: HashMap<KeyCode, Instant>,
    /// Keys that went from released to held during the last drain.
    fresh_presses: Vec<KeyCode>,
    /// Raw events from the last drain, for Ctrl+C detection.
    raw_events: Vec<KeyEvent>,
    /// Only true once keyboard enhancement is confirmed.
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
            honor_release: false,
        }
    }

    /// Drain all pending terminal events. Call once per frame.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.record(key, Instant::now());
            }
        }
        self.expire(Instant::now());
    }

    fn record(&mut self, key: KeyEvent, at: Instant) {
        self.raw_events.push(key);
        let code = normalize(key.code);
        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                self.last_active.remove(&code);
            }
            KeyEventKind::Release => {}
            _ => {
                if !self.is_held_at(code, at) {
                    self.fresh_presses.push(code);
                }
                self.last_active.insert(code, at);
            }
        }
    }

    fn expire(&mut self, now: Instant) {
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    pub fn is_held(&self, code: KeyCode) -> bool {
        self.is_held_at(code, Instant::now())
    }

    pub fn any_held(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.is_held(*c))
    }

    /// Freshly pressed during the last drain (edge trigger).
    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.fresh_presses.contains(&code)
    }

    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && matches!(k.code, KeyCode::Char('c') | KeyCode::Char('C'))
        })
    }

    /// Held gameplay actions for this tick.
    pub fn flags(&self) -> InputFlags {
        InputFlags {
            left: self.any_held(&LEFT_KEYS),
            right: self.any_held(&RIGHT_KEYS),
            jump: self.any_held(&JUMP_KEYS),
            throw: self.any_held(&THROW_KEYS),
        }
    }

    fn is_held_at(&self, code: KeyCode, at: Instant) -> bool {
        self.last_active.get(&code)
            .map_or(false, |t| at.saturating_duration_since(*t) < HOLD_TIMEOUT)
    }
}

/// Letters are tracked lowercase so Shift or Caps Lock don't drop a key.
fn normalize(code: KeyCode) -> KeyCode {
    match code {
        KeyCode::Char(c) => KeyCode::Char(c.to_ascii_lowercase()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn release(code: KeyCode) -> KeyEvent {
        KeyEvent::new_with_kind(code, KeyModifiers::NONE, KeyEventKind::Release)
    }

    #[test]
    fn press_is_fresh_once_then_held() {
        let mut s = InputState::new();
        let t = Instant::now();
        s.record(press(KeyCode::Right), t);
        assert!(s.was_pressed(KeyCode::Right));
        assert!(s.is_held_at(KeyCode::Right, t));

        s.fresh_presses.clear();
        s.record(press(KeyCode::Right), t + Duration::from_millis(30));
        assert!(!s.was_pressed(KeyCode::Right));
    }

    #[test]
    fn held_key_times_out_without_release_events() {
        let mut s = InputState::new();
        let t = Instant::now();
        s.record(press(KeyCode::Char(' ')), t);
        s.expire(t + HOLD_TIMEOUT);
        assert!(!s.is_held_at(KeyCode::Char(' '), t + HOLD_TIMEOUT));
    }

    #[test]
    fn release_only_counts_with_enhancement() {
        let mut s = InputState::new();
        let t = Instant::now();
        s.record(press(KeyCode::Left), t);
        s.record(release(KeyCode::Left), t);
        assert!(s.is_held_at(KeyCode::Left, t));

        s.honor_release = true;
        s.record(release(KeyCode::Left), t);
        assert!(!s.is_held_at(KeyCode::Left, t));
    }

    #[test]
    fn uppercase_letters_map_to_the_same_action() {
        let mut s = InputState::new();
        s.record(press(KeyCode::Char('F')), Instant::now());
        assert!(s.flags().throw);
        assert!(!s.flags().jump);
    }

    #[test]
    fn ctrl_c_is_detected() {
        let mut s = InputState::new();
        s.record(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL), Instant::now());
        assert!(s.ctrl_c_pressed());
    }
}
