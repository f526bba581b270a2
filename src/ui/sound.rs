/// Sound: procedural 8-bit style clips played through rodio.
///
/// The simulation never touches audio. It emits `GameEvent`s, and
/// `route` turns them into `play`/`stop` calls on a `SoundOutput`.
/// One-shot clips are fire-and-forget; loop clips (footsteps, snoring,
/// chicken chatter, music) keep one sink each until stopped.
///
/// Build without the "sound" feature, or run without an audio device,
/// and `open` hands back a `NullSound` that does nothing.

use log::debug;

use crate::config::SoundConfig;
use crate::domain::enemy::Enemy;
use crate::sim::event::GameEvent;
use crate::sim::world::WorldState;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Clip {
    Jump,
    Hurt,
    Death,
    Stomp,
    Coin,
    BottlePickup,
    Throw,
    Splash,
    BossHit,
    BossAlert,
    ChickenDeath,
    Victory,
    Defeat,
    Walk,
    Snore,
    ChickenAmbience,
    Music,
}

impl Clip {
    pub const ALL: [Clip; 17] = [
        Clip::Jump, Clip::Hurt, Clip::Death, Clip::Stomp, Clip::Coin,
        Clip::BottlePickup, Clip::Throw, Clip::Splash, Clip::BossHit,
        Clip::BossAlert, Clip::ChickenDeath, Clip::Victory, Clip::Defeat,
        Clip::Walk, Clip::Snore, Clip::ChickenAmbience, Clip::Music,
    ];

    pub const LOOPS: [Clip; 4] = [Clip::Walk, Clip::Snore, Clip::ChickenAmbience, Clip::Music];

    pub fn is_loop(self) -> bool {
        Clip::LOOPS.contains(&self)
    }
}

/// Anything that can play named clips.
pub trait SoundOutput {
    /// Loop clips already playing are left alone.
    fn play(&mut self, clip: Clip);
    fn stop(&mut self, clip: Clip);
    fn stop_all(&mut self);
    fn set_muted(&mut self, muted: bool);
    fn set_volume(&mut self, volume: f32);
}

pub struct NullSound;

impl SoundOutput for NullSound {
    fn play(&mut self, _clip: Clip) {}
    fn stop(&mut self, _clip: Clip) {}
    fn stop_all(&mut self) {}
    fn set_muted(&mut self, _muted: bool) {}
    fn set_volume(&mut self, _volume: f32) {}
}

/// Open the audio device, or fall back to silence.
pub fn open(cfg: &SoundConfig, muted: bool) -> Box<dyn SoundOutput> {
    if !cfg.enabled {
        debug!("sound disabled in config");
        return Box::new(NullSound);
    }

    #[cfg(feature = "sound")]
    {
        match inner::RodioSound::new() {
            Ok(mut out) => {
                out.set_volume(cfg.volume);
                out.set_muted(muted);
                return Box::new(out);
            }
            Err(e) => debug!("no audio output: {e}"),
        }
    }
    #[cfg(not(feature = "sound"))]
    {
        let _ = muted;
        debug!("built without sound support");
    }

    Box::new(NullSound)
}

/// Loops that run for the whole session.
pub fn start_session(out: &mut dyn SoundOutput) {
    out.play(Clip::Music);
    out.play(Clip::ChickenAmbience);
}

/// Translate one step's events into playback.
pub fn route(events: &[GameEvent], world: &WorldState, out: &mut dyn SoundOutput) {
    for event in events {
        match *event {
            GameEvent::Jumped => out.play(Clip::Jump),
            GameEvent::WalkStarted => out.play(Clip::Walk),
            GameEvent::WalkStopped => out.stop(Clip::Walk),
            GameEvent::SnoreStarted => out.play(Clip::Snore),
            GameEvent::SnoreStopped => out.stop(Clip::Snore),
            GameEvent::CharacterHurt { .. } => out.play(Clip::Hurt),
            GameEvent::CharacterDied => out.play(Clip::Death),
            GameEvent::EnemyStomped { .. } | GameEvent::BossStomped { .. } => out.play(Clip::Stomp),
            GameEvent::ChickenKilled { .. } => out.play(Clip::ChickenDeath),
            GameEvent::ChickenSilenced { .. } => {
                if !any_chicken_alive(world) {
                    out.stop(Clip::ChickenAmbience);
                }
            }
            GameEvent::BossHit { .. } => out.play(Clip::BossHit),
            GameEvent::BossAlerted => out.play(Clip::BossAlert),
            GameEvent::CoinCollected { .. } => out.play(Clip::Coin),
            GameEvent::BottleCollected { .. } => out.play(Clip::BottlePickup),
            GameEvent::BottleThrown { .. } => out.play(Clip::Throw),
            GameEvent::BottleSplashed { .. } => out.play(Clip::Splash),
            GameEvent::Victory => finale(out, Clip::Victory),
            GameEvent::Defeat => finale(out, Clip::Defeat),
            GameEvent::SessionHalted(_) => out.stop_all(),
            GameEvent::BossSpotted
            | GameEvent::BossDied
            | GameEvent::BottleRemoved { .. }
            | GameEvent::BottlesRefilled { .. } => {}
        }
    }
}

fn finale(out: &mut dyn SoundOutput, fanfare: Clip) {
    for clip in Clip::LOOPS {
        out.stop(clip);
    }
    out.play(fanfare);
}

fn any_chicken_alive(world: &WorldState) -> bool {
    world.level.enemies.iter()
        .any(|e| matches!(e, Enemy::Patrol(c) if !c.body.is_dead()))
}

#[cfg(feature = "sound")]
mod inner {
    use std::collections::HashMap;
    use std::f32::consts::PI;

    use log::debug;
    use rodio::buffer::SamplesBuffer;
    use rodio::{OutputStream, OutputStreamHandle, Sink, Source};

    use super::{Clip, SoundOutput};

    const SAMPLE_RATE: u32 = 22050;

    pub struct RodioSound {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        samples: HashMap<Clip, Vec<f32>>,
        loops: HashMap<Clip, Sink>,
        volume: f32,
        muted: bool,
    }

    impl RodioSound {
        pub fn new() -> Result<Self, rodio::StreamError> {
            let (stream, handle) = OutputStream::try_default()?;
            let samples = Clip::ALL.iter().map(|&c| (c, generate(c))).collect();
            Ok(RodioSound {
                _stream: stream,
                handle,
                samples,
                loops: HashMap::new(),
                volume: 1.0,
                muted: false,
            })
        }

        fn effective_volume(&self) -> f32 {
            if self.muted { 0.0 } else { self.volume }
        }

        fn buffer(&self, clip: Clip) -> Option<SamplesBuffer<f32>> {
            self.samples.get(&clip).map(|s| SamplesBuffer::new(1, SAMPLE_RATE, s.clone()))
        }
    }

    impl SoundOutput for RodioSound {
        fn play(&mut self, clip: Clip) {
            if clip.is_loop() {
                if self.loops.contains_key(&clip) {
                    return;
                }
                let Some(buf) = self.buffer(clip) else { return };
                match Sink::try_new(&self.handle) {
                    Ok(sink) => {
                        sink.set_volume(self.effective_volume());
                        sink.append(buf.repeat_infinite());
                        self.loops.insert(clip, sink);
                    }
                    Err(e) => debug!("loop {clip:?} failed: {e}"),
                }
                return;
            }

            // Muted one-shots are simply skipped.
            if self.muted {
                return;
            }
            let Some(buf) = self.buffer(clip) else { return };
            match Sink::try_new(&self.handle) {
                Ok(sink) => {
                    sink.set_volume(self.volume);
                    sink.append(buf);
                    sink.detach();
                }
                Err(e) => debug!("clip {clip:?} failed: {e}"),
            }
        }

        fn stop(&mut self, clip: Clip) {
            if let Some(sink) = self.loops.remove(&clip) {
                sink.stop();
            }
        }

        fn stop_all(&mut self) {
            for (_, sink) in self.loops.drain() {
                sink.stop();
            }
        }

        fn set_muted(&mut self, muted: bool) {
            self.muted = muted;
            let v = self.effective_volume();
            for sink in self.loops.values() {
                sink.set_volume(v);
            }
        }

        fn set_volume(&mut self, volume: f32) {
            self.volume = volume.clamp(0.0, 1.0);
            let v = self.effective_volume();
            for sink in self.loops.values() {
                sink.set_volume(v);
            }
        }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators: mono f32 samples
    // ════════════════════════════════════════════════════════════

    fn generate(clip: Clip) -> Vec<f32> {
        match clip {
            Clip::Jump => sweep(300.0, 700.0, 0.12, 0.25),
            Clip::Hurt => noisy_sweep(500.0, 200.0, 0.18, 0.5, 7),
            Clip::Death => notes(&[440.0, 370.0, 311.0, 261.0], 0.14, 0.3),
            Clip::Stomp => noisy_sweep(180.0, 80.0, 0.1, 0.6, 11),
            Clip::Coin => notes(&[1319.0, 1976.0], 0.06, 0.22),
            Clip::BottlePickup => notes(&[784.0, 1047.0], 0.05, 0.22),
            Clip::Throw => sweep(900.0, 400.0, 0.15, 0.18),
            Clip::Splash => noisy_sweep(1200.0, 300.0, 0.3, 0.85, 23),
            Clip::BossHit => noisy_sweep(220.0, 110.0, 0.25, 0.4, 31),
            Clip::BossAlert => notes(&[220.0, 277.0, 220.0, 277.0], 0.09, 0.28),
            Clip::ChickenDeath => sweep(1400.0, 500.0, 0.2, 0.22),
            Clip::Victory => notes(&[523.0, 659.0, 784.0, 1047.0, 1047.0], 0.12, 0.3),
            Clip::Defeat => notes(&[392.0, 330.0, 262.0, 196.0], 0.2, 0.3),
            Clip::Walk => footsteps(),
            Clip::Snore => snore(),
            Clip::ChickenAmbience => clucks(),
            Clip::Music => melody(),
        }
    }

    fn tone(freq: f32, i: usize) -> f32 {
        let t = i as f32 / SAMPLE_RATE as f32;
        // Sine plus a third harmonic for a squarish edge.
        (t * freq * 2.0 * PI).sin() * 0.75 + (t * freq * 3.0 * 2.0 * PI).sin() * 0.25
    }

    fn len(seconds: f32) -> usize {
        (SAMPLE_RATE as f32 * seconds) as usize
    }

    fn silence(seconds: f32) -> Vec<f32> {
        vec![0.0; len(seconds)]
    }

    /// Linear pitch glide with a fade-out.
    fn sweep(from: f32, to: f32, seconds: f32, volume: f32) -> Vec<f32> {
        let n = len(seconds);
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let p = i as f32 / n as f32;
                phase += (from + (to - from) * p) / SAMPLE_RATE as f32;
                (phase * 2.0 * PI).sin() * (1.0 - p) * volume
            })
            .collect()
    }

    /// Pitch glide mixed with LCG noise; `grit` is the noise share.
    fn noisy_sweep(from: f32, to: f32, seconds: f32, grit: f32, seed: u32) -> Vec<f32> {
        let mut rng = seed;
        sweep(from, to, seconds, 1.0)
            .into_iter()
            .enumerate()
            .map(|(i, s)| {
                rng = rng.wrapping_mul(1103515245).wrapping_add(12345);
                let noise = (rng as f32 / u32::MAX as f32) * 2.0 - 1.0;
                let env = 1.0 - i as f32 / len(seconds) as f32;
                (s * (1.0 - grit) + noise * grit * env) * 0.3
            })
            .collect()
    }

    fn notes(freqs: &[f32], note_seconds: f32, volume: f32) -> Vec<f32> {
        let n = len(note_seconds);
        freqs
            .iter()
            .flat_map(|&f| {
                (0..n).map(move |i| tone(f, i) * (1.0 - (i as f32 / n as f32) * 0.4) * volume)
            })
            .collect()
    }

    fn footsteps() -> Vec<f32> {
        let mut out = noisy_sweep(160.0, 90.0, 0.05, 0.7, 3);
        out.extend(silence(0.2));
        out
    }

    fn snore() -> Vec<f32> {
        let n = len(1.6);
        (0..n)
            .map(|i| {
                let p = i as f32 / n as f32;
                let breath = (p * PI).sin().powi(2);
                tone(70.0 + 20.0 * breath, i) * breath * 0.15
            })
            .collect()
    }

    fn clucks() -> Vec<f32> {
        let mut out = Vec::new();
        for &f in &[900.0, 1100.0, 850.0] {
            out.extend(sweep(f, f * 0.7, 0.06, 0.08));
            out.extend(silence(0.08));
        }
        out.extend(silence(1.2));
        out
    }

    fn melody() -> Vec<f32> {
        let bar = [262.0, 330.0, 392.0, 330.0, 294.0, 349.0, 440.0, 349.0];
        let mut out = notes(&bar, 0.18, 0.08);
        out.extend(notes(&[392.0, 330.0, 262.0, 196.0], 0.36, 0.08));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GameplayConfig, TimingConfig};
    use crate::sim::level::LevelDef;
    use crate::sim::world::Outcome;

    #[derive(Debug, PartialEq)]
    enum Call {
        Play(Clip),
        Stop(Clip),
        StopAll,
    }

    #[derive(Default)]
    struct Recorder(Vec<Call>);

    impl SoundOutput for Recorder {
        fn play(&mut self, clip: Clip) { self.0.push(Call::Play(clip)); }
        fn stop(&mut self, clip: Clip) { self.0.push(Call::Stop(clip)); }
        fn stop_all(&mut self) { self.0.push(Call::StopAll); }
        fn set_muted(&mut self, _muted: bool) {}
        fn set_volume(&mut self, _volume: f32) {}
    }

    fn world() -> WorldState {
        let def = LevelDef::embedded().unwrap();
        let gameplay = GameplayConfig { seed: Some(5), ..GameplayConfig::default() };
        WorldState::new(&def, TimingConfig::default(), gameplay)
    }

    #[test]
    fn only_ambient_clips_loop() {
        let loops: Vec<Clip> = Clip::ALL.iter().copied().filter(|c| c.is_loop()).collect();
        assert_eq!(loops, Clip::LOOPS.to_vec());
    }

    #[test]
    fn footsteps_follow_walk_events() {
        let w = world();
        let mut rec = Recorder::default();
        route(&[GameEvent::WalkStarted, GameEvent::Jumped, GameEvent::WalkStopped], &w, &mut rec);
        assert_eq!(rec.0, vec![Call::Play(Clip::Walk), Call::Play(Clip::Jump), Call::Stop(Clip::Walk)]);
    }

    #[test]
    fn chicken_chatter_stops_with_the_last_chicken() {
        let mut w = world();
        let mut rec = Recorder::default();
        route(&[GameEvent::ChickenSilenced { enemy: 0 }], &w, &mut rec);
        assert!(rec.0.is_empty());

        for e in &mut w.level.enemies {
            if let Enemy::Patrol(c) = e {
                c.body.kill(0);
            }
        }
        route(&[GameEvent::ChickenSilenced { enemy: 0 }], &w, &mut rec);
        assert_eq!(rec.0, vec![Call::Stop(Clip::ChickenAmbience)]);
    }

    #[test]
    fn outcome_silences_loops_then_halt_stops_everything() {
        let w = world();
        let mut rec = Recorder::default();
        route(&[GameEvent::Victory, GameEvent::SessionHalted(Outcome::Victory)], &w, &mut rec);

        let stops = rec.0.iter().filter(|c| matches!(c, Call::Stop(_))).count();
        assert_eq!(stops, Clip::LOOPS.len());
        assert!(rec.0.contains(&Call::Play(Clip::Victory)));
        assert_eq!(rec.0.last(), Some(&Call::StopAll));
    }

    #[test]
    fn disabled_config_yields_silence() {
        let cfg = SoundConfig { enabled: false, volume: 0.6 };
        let mut out = open(&cfg, false);
        out.play(Clip::Music);
        out.stop_all();
    }
}
