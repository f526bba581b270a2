/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::PathBuf;

// ── Public Config Structs ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub timing: TimingConfig,
    pub gameplay: GameplayConfig,
    pub sound: SoundConfig,
    pub gamepad: GamepadConfig,
    pub level_file: Option<PathBuf>,
    pub log_file: PathBuf,
    /// Problems found while loading, reported once logging is up.
    pub warnings: Vec<String>,
}

/// Cadences of the fixed-step loop. Every sub-phase runs on a multiple
/// of the base tick, so one `step()` call is one base tick.
#[derive(Clone, Debug)]
pub struct TimingConfig {
    pub tick_rate_ms: u64,
    pub gravity_every: u32,   // gravity integration (~30/s)
    pub animation_every: u32, // frame advance + state machines (~10/s)
    pub status_every: u32,    // throw, refill, outcome (~8/s)
    pub halt_display_ms: u64, // frozen overlay before returning to the title
}

#[derive(Clone, Debug)]
pub struct GameplayConfig {
    /// 0 keeps the classic behavior: contact damage is never gated.
    pub damage_cooldown_ms: u64,
    pub seed: Option<u64>,
}

#[derive(Clone, Debug)]
pub struct SoundConfig {
    pub enabled: bool,
    pub volume: f32,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub jump: Vec<String>,
    pub throw: Vec<String>,
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
}

impl Default for TimingConfig {
    fn default() -> Self {
        TimingConfig {
            tick_rate_ms: default_tick_rate(),
            gravity_every: default_gravity_every(),
            animation_every: default_animation_every(),
            status_every: default_status_every(),
            halt_display_ms: default_halt_display(),
        }
    }
}

impl Default for GameplayConfig {
    fn default() -> Self {
        GameplayConfig { damage_cooldown_ms: 0, seed: None }
    }
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    gameplay: TomlGameplay,
    #[serde(default)]
    sound: TomlSound,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default = "default_gravity_every")]
    gravity_every: u32,
    #[serde(default = "default_animation_every")]
    animation_every: u32,
    #[serde(default = "default_status_every")]
    status_every: u32,
    #[serde(default = "default_halt_display")]
    halt_display_ms: u64,
}

#[derive(Deserialize, Debug, Default)]
struct TomlGameplay {
    #[serde(default)]
    damage_cooldown_ms: u64,
    #[serde(default)]
    seed: Option<u64>,
}

#[derive(Deserialize, Debug)]
struct TomlSound {
    #[serde(default = "default_sound_enabled")]
    enabled: bool,
    #[serde(default = "default_volume")]
    volume: f32,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_pad_jump")]
    jump: Vec<String>,
    #[serde(default = "default_pad_throw")]
    throw: Vec<String>,
    #[serde(default = "default_pad_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_pad_cancel")]
    cancel: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default)]
    level_file: Option<String>,
    #[serde(default = "default_log_file")]
    log_file: String,
}

// ── Defaults ──

fn default_tick_rate() -> u64 { 16 }       // ~60 ticks/s
fn default_gravity_every() -> u32 { 2 }
fn default_animation_every() -> u32 { 6 }
fn default_status_every() -> u32 { 8 }
fn default_halt_display() -> u64 { 2500 }
fn default_sound_enabled() -> bool { true }
fn default_volume() -> f32 { 0.6 }

fn default_pad_jump() -> Vec<String> { vec!["A".into(), "Y".into()] }
fn default_pad_throw() -> Vec<String> { vec!["B".into(), "X".into(), "R1".into()] }
fn default_pad_confirm() -> Vec<String> { vec!["Start".into()] }
fn default_pad_cancel() -> Vec<String> { vec!["Select".into()] }
fn default_log_file() -> String { "salsa-run.log".into() }

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            tick_rate_ms: default_tick_rate(),
            gravity_every: default_gravity_every(),
            animation_every: default_animation_every(),
            status_every: default_status_every(),
            halt_display_ms: default_halt_display(),
        }
    }
}

impl Default for TomlSound {
    fn default() -> Self {
        TomlSound { enabled: default_sound_enabled(), volume: default_volume() }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            jump: default_pad_jump(),
            throw: default_pad_throw(),
            confirm: default_pad_confirm(),
            cancel: default_pad_cancel(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral { level_file: None, log_file: default_log_file() }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory,
    /// (3) `~/.local/share/salsa-run`.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let (toml_cfg, warning) = load_toml(&search_dirs);
        let mut cfg = GameConfig::from_toml(toml_cfg, &search_dirs);
        cfg.warnings.extend(warning);
        cfg
    }

    fn from_toml(toml_cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        let level_file = toml_cfg.general.level_file.map(|name| {
            let path = PathBuf::from(&name);
            if path.is_absolute() {
                path
            } else {
                search_dirs.iter()
                    .map(|d| d.join(&name))
                    .find(|p| p.is_file())
                    .unwrap_or(path)
            }
        });

        GameConfig {
            timing: TimingConfig {
                tick_rate_ms: toml_cfg.timing.tick_rate_ms.max(1),
                gravity_every: toml_cfg.timing.gravity_every.max(1),
                animation_every: toml_cfg.timing.animation_every.max(1),
                status_every: toml_cfg.timing.status_every.max(1),
                halt_display_ms: toml_cfg.timing.halt_display_ms,
            },
            gameplay: GameplayConfig {
                damage_cooldown_ms: toml_cfg.gameplay.damage_cooldown_ms,
                seed: toml_cfg.gameplay.seed,
            },
            sound: SoundConfig {
                enabled: toml_cfg.sound.enabled,
                volume: toml_cfg.sound.volume.clamp(0.0, 1.0),
            },
            gamepad: GamepadConfig {
                jump: toml_cfg.gamepad.jump,
                throw: toml_cfg.gamepad.throw,
                confirm: toml_cfg.gamepad.confirm,
                cancel: toml_cfg.gamepad.cancel,
            },
            level_file,
            log_file: PathBuf::from(toml_cfg.general.log_file),
            warnings: vec![],
        }
    }

    #[cfg(test)]
    fn parse(text: &str) -> Result<Self, toml::de::Error> {
        let parsed = toml::from_str::<TomlConfig>(text)?;
        Ok(GameConfig::from_toml(parsed, &[]))
    }
}

/// Candidate directories to search: exe dir + CWD + data home (deduplicated).
pub fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/salsa-run");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> (TomlConfig, Option<String>) {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            return match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => (cfg, None),
                    Err(e) => (
                        TomlConfig::default(),
                        Some(format!("config.toml parse error, using defaults: {e}")),
                    ),
                },
                Err(e) => (
                    TomlConfig::default(),
                    Some(format!("could not read {}: {e}", path.display())),
                ),
            };
        }
    }
    (TomlConfig::default(), None)
}
