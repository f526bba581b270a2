/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// The world is drawn in canvas pixels (720 × 480). Each frame:
///   1. `draw_world` asks the `RenderSurface` to clear, then draws every
///      snapshot item and the HUD
///   2. the terminal surface scales canvas rects onto cells of `front`
///   3. `present` emits commands only for cells that differ from `back`,
///      batched with `queue!` and flushed once, then swaps the buffers

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};
use log::debug;

use crate::domain::physics::Rect;
use crate::domain::rules::{bar_step, CANVAS_HEIGHT, CANVAS_WIDTH};
use crate::domain::sprite::{Layer, Sequence, Sprite};
use crate::sim::world::{Hud, Outcome, WorldState};

/// Anything that can show a frame of the world.
pub trait RenderSurface {
    fn clear(&mut self);
    fn draw_sprite(&mut self, rect: Rect, sprite: Sprite, flipped: bool);
    fn draw_hud(&mut self, hud: &Hud);
    fn present(&mut self) -> io::Result<()>;
}

/// Compose one frame of the world. The caller presents it.
pub fn draw_world(world: &WorldState, surface: &mut dyn RenderSurface) {
    surface.clear();
    for item in world.snapshot() {
        surface.draw_sprite(item.rect, item.sprite, item.flipped);
    }
    surface.draw_hud(&world.hud);
}

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Same RGB for `Clear` and every empty cell so row gaps don't show.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Differs from every real cell, so a buffer full of these repaints all.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        Cell { ch, fg, bg }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Keeps the background already in each cell.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color) {
        for (i, ch) in s.chars().enumerate() {
            let bg = self.get(x + i, y).bg;
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    fn fill(&mut self, x0: usize, y0: usize, x1: usize, y1: usize, cell: Cell) {
        for y in y0..y1.min(self.height) {
            for x in x0..x1.min(self.width) {
                self.set(x, y, cell);
            }
        }
    }
}

// ── Canvas → terminal projection ──

/// Rows above the canvas, used by the HUD.
const HUD_ROWS: usize = 2;

/// Terminal area the canvas is scaled into.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Viewport {
    top: usize,
    cols: usize,
    rows: usize,
}

impl Viewport {
    fn for_terminal(w: usize, h: usize) -> Self {
        Viewport { top: HUD_ROWS, cols: w.max(1), rows: h.saturating_sub(HUD_ROWS).max(1) }
    }

    /// Cell range covered by a canvas rect, clipped. `None` when off-screen.
    fn project(&self, r: Rect) -> Option<(usize, usize, usize, usize)> {
        let sx = self.cols as f32 / CANVAS_WIDTH;
        let sy = self.rows as f32 / CANVAS_HEIGHT;
        let x0 = (r.x * sx).floor().max(0.0);
        let y0 = (r.y * sy).floor().max(0.0);
        let x1 = (r.right() * sx).ceil().min(self.cols as f32);
        let y1 = (r.bottom() * sy).ceil().min(self.rows as f32);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some((x0 as usize, self.top + y0 as usize, x1 as usize, self.top + y1 as usize))
    }
}

// ── Sprite styling ──

const SKY: Color = Color::Rgb { r: 250, g: 214, b: 140 };
const CLOUD: Color = Color::Rgb { r: 255, g: 244, b: 226 };
const SAND: Color = Color::Rgb { r: 214, g: 160, b: 92 };

/// Background layers only paint their lower band so the ones behind show.
fn layer_style(layer: Layer) -> (f32, char, Color, Color) {
    match layer {
        Layer::Air => (0.0, ' ', SKY, SKY),
        Layer::Clouds => (0.05, '░', CLOUD, SKY),
        Layer::Third => (0.55, '▲', Color::Rgb { r: 196, g: 140, b: 110 }, Color::Rgb { r: 225, g: 175, b: 130 }),
        Layer::Second => (0.7, '▴', Color::Rgb { r: 120, g: 150, b: 80 }, Color::Rgb { r: 190, g: 150, b: 95 }),
        Layer::First => (0.88, '▒', Color::Rgb { r: 150, g: 100, b: 50 }, SAND),
    }
}

/// Glyph and colours for one animation frame. Odd frames alternate glyphs.
fn frame_style(seq: Sequence, index: usize) -> (char, Color, Color) {
    let alt = index % 2 == 1;
    match seq {
        Sequence::CharacterIdle => ('@', Color::Black, Color::Rgb { r: 240, g: 200, b: 60 }),
        Sequence::CharacterTired => (if alt { 'z' } else { 'Z' }, Color::Black, Color::Rgb { r: 200, g: 170, b: 70 }),
        Sequence::CharacterWalk => (if alt { '/' } else { '\\' }, Color::Black, Color::Rgb { r: 240, g: 200, b: 60 }),
        Sequence::CharacterJump => ('^', Color::Black, Color::Rgb { r: 255, g: 220, b: 90 }),
        Sequence::CharacterHurt => ('!', Color::White, Color::Rgb { r: 220, g: 60, b: 40 }),
        Sequence::CharacterDead => ('x', Color::White, Color::Rgb { r: 90, g: 70, b: 70 }),
        Sequence::ChickenWalk => (if alt { 'v' } else { 'V' }, Color::Black, Color::Rgb { r: 150, g: 100, b: 60 }),
        Sequence::ChickenDead => ('x', Color::Black, Color::Rgb { r: 110, g: 90, b: 80 }),
        Sequence::BossWalk => ('W', Color::White, Color::Rgb { r: 160, g: 70, b: 40 }),
        Sequence::BossAlert => (if alt { '?' } else { '!' }, Color::Black, Color::Rgb { r: 230, g: 150, b: 40 }),
        Sequence::BossAttack => ('M', Color::White, Color::Rgb { r: 200, g: 40, b: 30 }),
        Sequence::BossHurt => ('*', Color::White, Color::Rgb { r: 240, g: 90, b: 90 }),
        Sequence::BossDead => ('x', Color::White, Color::Rgb { r: 80, g: 50, b: 40 }),
        Sequence::BottleRotate => (['|', '/', '-', '\\'][index % 4], Color::Black, Color::Rgb { r: 60, g: 170, b: 80 }),
        Sequence::BottleSplash => ('~', Color::Rgb { r: 200, g: 30, b: 20 }, Color::Rgb { r: 250, g: 120, b: 60 }),
        Sequence::BottleGround => ('i', Color::Black, Color::Rgb { r: 60, g: 170, b: 80 }),
        Sequence::Coin => (if alt { 'o' } else { 'O' }, Color::Black, Color::Rgb { r: 255, g: 215, b: 0 }),
    }
}

// ── Renderer ──

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    view: Viewport,
    enhanced_keys: bool,
    pub muted: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            view: Viewport::for_terminal(0, 0),
            enhanced_keys: false,
            muted: false,
        }
    }

    /// Enter raw mode and the alternate screen. Returns whether the
    /// terminal will report key releases.
    pub fn init(&mut self) -> io::Result<bool> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        if terminal::supports_keyboard_enhancement().unwrap_or(false) {
            execute!(
                self.writer,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
            self.enhanced_keys = true;
        }
        debug!("keyboard release events: {}", self.enhanced_keys);

        self.sync_size();
        Ok(self.enhanced_keys)
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.enhanced_keys {
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
        }
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    /// Pick up terminal resizes; forces a full repaint when the size changed.
    fn sync_size(&mut self) {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        let (tw, th) = (tw as usize, th as usize);
        if tw != self.front.width || th != self.front.height {
            self.front.resize(tw, th);
            self.back.resize(tw, th);
            self.back.cells.fill(Cell::INVALID);
            self.view = Viewport::for_terminal(tw, th);
        }
    }

    /// Force a full repaint next frame, e.g. on a screen change.
    pub fn invalidate(&mut self) -> io::Result<()> {
        self.back.cells.fill(Cell::INVALID);
        queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))
    }

    // ── Screens ──

    pub fn draw_title(&mut self, level_name: &str, gamepad: bool) {
        self.front.clear();
        let title = [
            r"  ___       _            ___           ",
            r" / __| __ _| |___ __ _  | _ \_  _ _ _  ",
            r" \__ \/ _` | (_-</ _` | |   / || | ' \ ",
            r" |___/\__,_|_/__/\__,_| |_|_\\_,_|_||_|",
        ];
        let gold = Color::Rgb { r: 255, g: 200, b: 50 };
        for (i, line) in title.iter().enumerate() {
            self.front.put_str(2, 1 + i, line, gold);
        }
        let stage = format!("Stage: {level_name}");
        self.front.put_str(4, 6, &stage, Color::Rgb { r: 250, g: 150, b: 60 });

        let hi = Color::Rgb { r: 80, g: 255, b: 80 };
        self.front.put_str(4, 8, "ENTER   Start", hi);
        self.front.put_str(4, 9, "  M     Sound on/off", Color::White);
        self.front.put_str(4, 10, "  Q     Quit", Color::White);

        let help = [
            "Controls",
            "  ←→ / A D     Walk",
            "  ↑ / Space    Jump (land on enemies to stomp)",
            "  F / J        Throw a salsa bottle",
        ];
        for (i, line) in help.iter().enumerate() {
            let color = if i == 0 { gold } else { Color::White };
            self.front.put_str(4, 12 + i, line, color);
        }

        let status = format!(
            "  sound {}{}",
            if self.muted { "off" } else { "on" },
            if gamepad { "   gamepad connected" } else { "" },
        );
        self.front.put_str(4, 12 + help.len() + 1, &status, Color::DarkGrey);
    }

    /// Banner over the frozen last frame.
    pub fn draw_outcome(&mut self, outcome: Outcome) {
        let (label, color) = match outcome {
            Outcome::Victory => ("  ★  YOU WIN!  ★  ", Color::Rgb { r: 255, g: 220, b: 50 }),
            Outcome::Defeat => ("   ✕ GAME OVER ✕  ", Color::Rgb { r: 255, g: 60, b: 60 }),
        };
        let box_w = 24.min(self.front.width);
        let x = self.front.width.saturating_sub(box_w) / 2;
        let y = self.view.top + self.view.rows.saturating_sub(3) / 2;
        let dim = Color::Rgb { r: 40, g: 40, b: 40 };
        self.front.fill(x, y, x + box_w, y + 3, Cell::new(' ', color, dim));
        self.front.put_str(x + 3, y + 1, label, color);
    }

    fn draw_bar(&mut self, x: usize, label: &str, percent: u32, color: Color) -> usize {
        let filled = bar_step(percent);
        let text = format!("{label} [{}{}]", "█".repeat(filled), "·".repeat(5 - filled));
        self.front.put_str(x, 0, &text, color);
        x + text.chars().count() + 2
    }
}

impl RenderSurface for Renderer {
    fn clear(&mut self) {
        self.sync_size();
        self.front.clear();
    }

    fn draw_sprite(&mut self, rect: Rect, sprite: Sprite, flipped: bool) {
        match sprite {
            Sprite::Layer(layer) => {
                let (band, ch, fg, bg) = layer_style(layer);
                let banded = Rect { y: rect.y + rect.h * band, h: rect.h * (1.0 - band), ..rect };
                if let Some((x0, y0, x1, y1)) = self.view.project(banded) {
                    self.front.fill(x0, y0, x1, y1, Cell::new(ch, fg, bg));
                }
            }
            Sprite::Frame(frame) => {
                let Some((x0, y0, x1, y1)) = self.view.project(rect) else { return };
                let (ch, fg, bg) = frame_style(frame.sequence, frame.index);
                self.front.fill(x0, y0, x1, y1, Cell::new(' ', fg, bg));
                // Glyph on the top row, at the facing edge.
                let gx = if flipped { x0 } else { x1.saturating_sub(1) };
                self.front.set(gx, y0, Cell::new(ch, fg, bg));
            }
        }
    }

    fn draw_hud(&mut self, hud: &Hud) {
        let hud_bg = Color::Rgb { r: 30, g: 30, b: 45 };
        let w = self.front.width;
        self.front.fill(0, 0, w, 1, Cell::new(' ', Color::White, hud_bg));

        let mut x = 1;
        x = self.draw_bar(x, "♥", hud.health_percent, Color::Rgb { r: 120, g: 220, b: 90 });
        x = self.draw_bar(x, "◆", hud.bottle_percent, Color::Rgb { r: 80, g: 200, b: 120 });
        let coins = format!("● {}", hud.coins);
        self.front.put_str(x, 0, &coins, Color::Rgb { r: 255, g: 215, b: 0 });

        if self.muted {
            self.front.put_str(x + 8, 0, "♪ off", Color::DarkGrey);
        }
        if hud.boss_visible {
            let bx = w.saturating_sub(14);
            self.draw_bar(bx, "☠", hud.boss_percent, Color::Rgb { r: 240, g: 90, b: 60 });
        }
    }

    fn present(&mut self) -> io::Result<()> {
        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }
}

impl Renderer {
    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        queue!(self.writer, SetForegroundColor(last_fg), SetBackgroundColor(last_bg))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    continue;
                }
                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }
}
