/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::fs::File;
use std::time::{Duration, Instant};

use crossterm::event::KeyCode;
use log::{info, warn};

use config::GameConfig;
use domain::entity::InputFlags;
use sim::level::{load_level_def, LevelDef};
use sim::prefs::{Prefs, PrefsStore};
use sim::step::step;
use sim::world::{Outcome, WorldState};
use ui::gamepad::GamepadState;
use ui::input::InputState;
use ui::renderer::{draw_world, RenderSurface, Renderer};
use ui::sound::{self, SoundOutput};

const FRAME_SLEEP: Duration = Duration::from_millis(5);

const CONFIRM_KEY: KeyCode = KeyCode::Enter;
const QUIT_KEYS: [KeyCode; 2] = [KeyCode::Esc, KeyCode::Char('q')];
const MUTE_KEY: KeyCode = KeyCode::Char('m');

enum Screen {
    Title,
    Playing(Box<WorldState>),
    Halted { world: Box<WorldState>, outcome: Outcome, since: Instant },
}

fn main() {
    let config = GameConfig::load();
    init_logging(&config);
    for w in &config.warnings {
        warn!("{w}");
    }

    let level = match load_level_def(config.level_file.as_deref()) {
        Ok(def) => def,
        Err(e) => {
            eprintln!("No playable level: {e}");
            return;
        }
    };

    let store = PrefsStore::locate();
    let prefs = store.load_or_default();
    let mut audio = sound::open(&config.sound, prefs.muted);

    let mut renderer = Renderer::new();
    renderer.muted = prefs.muted;
    let honor_release = match renderer.init() {
        Ok(enhanced) => enhanced,
        Err(e) => {
            eprintln!("Terminal init failed: {e}");
            return;
        }
    };

    let mut session = Session { config: &config, level: &level, store, prefs };
    let result = session.game_loop(&mut renderer, audio.as_mut(), honor_release);
    audio.stop_all();

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    if let Err(e) = result {
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing Salsa Run!");
}

/// The terminal belongs to the renderer, so logs go to a file.
fn init_logging(config: &GameConfig) {
    let file = match File::create(&config.log_file) {
        Ok(f) => f,
        Err(_) => return,
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
}

struct Session<'a> {
    config: &'a GameConfig,
    level: &'a LevelDef,
    store: PrefsStore,
    prefs: Prefs,
}

impl Session<'_> {
    fn game_loop(
        &mut self,
        renderer: &mut Renderer,
        audio: &mut dyn SoundOutput,
        honor_release: bool,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let mut kb = InputState::new();
        kb.honor_release = honor_release;
        let mut gp = GamepadState::new(&self.config.gamepad);
        let tick_rate = Duration::from_millis(self.config.timing.tick_rate_ms);
        let halt_display = Duration::from_millis(self.config.timing.halt_display_ms);
        let mut last_tick = Instant::now();
        let mut screen = Screen::Title;
        renderer.invalidate()?;

        loop {
            kb.drain_events();
            gp.update();

            if kb.ctrl_c_pressed() {
                break;
            }
            if kb.was_pressed(MUTE_KEY) {
                self.toggle_mute(renderer, audio);
            }

            let confirm = kb.was_pressed(CONFIRM_KEY) || gp.confirm_pressed();
            let cancel = kb.any_pressed(&QUIT_KEYS) || gp.cancel_pressed();

            let next = match &screen {
                Screen::Title if cancel => break,
                Screen::Title if confirm => Some(self.start(audio)),
                Screen::Playing(_) if cancel => {
                    info!("session abandoned");
                    audio.stop_all();
                    Some(Screen::Title)
                }
                Screen::Halted { since, .. } if confirm || since.elapsed() >= halt_display => {
                    Some(Screen::Title)
                }
                _ => None,
            };
            if let Some(next) = next {
                screen = next;
                renderer.invalidate()?;
            }

            if last_tick.elapsed() >= tick_rate {
                last_tick = Instant::now();

                if let Screen::Playing(world) = &mut screen {
                    let input = merge(kb.flags(), gp.flags());
                    let events = step(world, input);
                    sound::route(&events, world, audio);
                }
                let finished = match &screen {
                    Screen::Playing(world) => world.outcome(),
                    _ => None,
                };
                if let Some(outcome) = finished {
                    screen = halt(&mut screen, outcome);
                }

                match &screen {
                    Screen::Title => renderer.draw_title(&self.level.name, gp.connected),
                    Screen::Playing(world) => draw_world(world, renderer),
                    Screen::Halted { world, outcome, .. } => {
                        draw_world(world, renderer);
                        renderer.draw_outcome(*outcome);
                    }
                }
                renderer.present()?;
            }

            std::thread::sleep(FRAME_SLEEP);
        }

        Ok(())
    }

    fn start(&self, audio: &mut dyn SoundOutput) -> Screen {
        let world = WorldState::new(self.level, self.config.timing.clone(), self.config.gameplay.clone());
        info!("session started on '{}'", self.level.name);
        sound::start_session(audio);
        Screen::Playing(Box::new(world))
    }

    fn toggle_mute(&mut self, renderer: &mut Renderer, audio: &mut dyn SoundOutput) {
        self.prefs.muted = !self.prefs.muted;
        audio.set_muted(self.prefs.muted);
        renderer.muted = self.prefs.muted;
        if let Err(e) = self.store.save(&self.prefs) {
            warn!("{e}");
        }
    }
}

/// Move a finished session into the halted screen.
fn halt(screen: &mut Screen, outcome: Outcome) -> Screen {
    match std::mem::replace(screen, Screen::Title) {
        Screen::Playing(world) => {
            info!("showing {outcome:?}");
            Screen::Halted { world, outcome, since: Instant::now() }
        }
        other => other,
    }
}

fn merge(a: InputFlags, b: InputFlags) -> InputFlags {
    InputFlags {
        left: a.left || b.left,
        right: a.right || b.right,
        jump: a.jump || b.jump,
        throw: a.throw || b.throw,
    }
}
