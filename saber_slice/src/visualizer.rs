//! Software-rendered visualizer using `minifb`.
//!
//! Layout:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ SCORE 120   COMBO X3                       TIME 42   BEST 300│
//! │                                                              │
//! │        ◯ falling objects, sliced halves, particles           │
//! │                                                              │
//! │            ╲│╱  four blades per hand, fading trail           │
//! │                                                              │
//! │ P=pause  R=restart  Q=quit                         player    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Drawing goes through [`Canvas`], a plain ARGB buffer that can be resized
//! with the window and tested without one.

use std::sync::mpsc::Sender;
use std::time::Duration;

use glam::Vec2;
use minifb::{Key, KeyRepeat, MouseMode, ScaleMode, Window, WindowOptions};

use blade_tracking::{BladeModel, Handedness, Segment, Viewport};
use slice_sim::{Category, FallingObject, Game, Millis, Phase};

use crate::effects::{self, blend, blade_color, category_color, BLADE_CORE};
use crate::tracker::SimInput;

// ════════════════════════════════════════════════════════════════════════════
// Palette / layout
// ════════════════════════════════════════════════════════════════════════════

const BG_COLOR:     u32 = 0xFF0B0B1A;
const HUD_COLOR:    u32 = 0xFFEEEEEE;
const HUD_DIM:      u32 = 0xFF888888;
const HUD_ACCENT:   u32 = 0xFFFFD700;
const HAZARD_RIM:   u32 = 0xFFFF2020;
const BANNER_BG:    u32 = 0xFF16213E;
const CORE_WIDTH:   f32 = 6.0;
const FLARE_RADIUS: f32 = 7.0;
const TRAIL_RADIUS: f32 = 5.0;
const TEXT_SCALE:   usize = 3;

/// Key actions the app cares about.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UiAction {
    TogglePause,
    Reset,
    Quit,
}

/// HUD values not held by the game itself.
#[derive(Clone, Debug, Default)]
pub struct Hud<'a> {
    pub player: Option<&'a str>,
    pub best:   Option<u32>,
    pub status: &'a str,
}

// ════════════════════════════════════════════════════════════════════════════
// Canvas
// ════════════════════════════════════════════════════════════════════════════

pub struct Canvas {
    buf:    Vec<u32>,
    width:  usize,
    height: usize,
}

impl Canvas {
    pub fn new(width: usize, height: usize) -> Self {
        Canvas { buf: vec![BG_COLOR; width * height], width, height }
    }

    pub fn width(&self)  -> usize { self.width }
    pub fn height(&self) -> usize { self.height }
    pub fn pixels(&self) -> &[u32] { &self.buf }

    pub fn pixel(&self, x: usize, y: usize) -> Option<u32> {
        (x < self.width && y < self.height).then(|| self.buf[y * self.width + x])
    }

    /// Match the window size. Returns true if it changed.
    pub fn resize(&mut self, width: usize, height: usize) -> bool {
        if (width, height) == (self.width, self.height) {
            return false;
        }
        self.width = width;
        self.height = height;
        self.buf.resize(width * height, BG_COLOR);
        true
    }

    pub fn clear(&mut self, color: u32) { self.buf.fill(color); }

    // ── Primitive drawing helpers ─────────────────────────────────────────

    fn put(&mut self, x: i64, y: i64, color: u32, alpha: f32) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        let i = y as usize * self.width + x as usize;
        self.buf[i] = if alpha >= 1.0 { color } else { blend(self.buf[i], color, alpha) };
    }

    /// Visit every pixel centre in the box around `lo..hi`.
    fn each_in(&mut self, lo: Vec2, hi: Vec2, mut f: impl FnMut(&mut Self, i64, i64, Vec2)) {
        let x0 = lo.x.floor().max(0.0) as i64;
        let y0 = lo.y.floor().max(0.0) as i64;
        let x1 = (hi.x.ceil() as i64).min(self.width as i64 - 1);
        let y1 = (hi.y.ceil() as i64).min(self.height as i64 - 1);
        for y in y0..=y1 {
            for x in x0..=x1 {
                f(self, x, y, Vec2::new(x as f32 + 0.5, y as f32 + 0.5));
            }
        }
    }

    pub fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for row in y..(y + h).min(self.height) {
            for col in x..(x + w).min(self.width) {
                self.buf[row * self.width + col] = color;
            }
        }
    }

    pub fn fill_circle(&mut self, c: Vec2, r: f32, color: u32, alpha: f32) {
        let r2 = r * r;
        self.each_in(c - Vec2::splat(r), c + Vec2::splat(r), |cv, x, y, p| {
            if p.distance_squared(c) <= r2 { cv.put(x, y, color, alpha); }
        });
    }

    pub fn ring(&mut self, c: Vec2, r: f32, width: f32, color: u32) {
        let (inner, outer) = ((r - width).max(0.0), r);
        self.each_in(c - Vec2::splat(r), c + Vec2::splat(r), |cv, x, y, p| {
            let d = p.distance(c);
            if d <= outer && d >= inner { cv.put(x, y, color, 1.0); }
        });
    }

    /// The part of a disc on one side of the line through `c` along `cut`.
    pub fn half_disc(&mut self, c: Vec2, r: f32, cut: Vec2, upper: bool, color: u32) {
        let normal = cut.perp();
        let r2 = r * r;
        self.each_in(c - Vec2::splat(r), c + Vec2::splat(r), |cv, x, y, p| {
            let side = (p - c).dot(normal) >= 0.0;
            if side != upper && p.distance_squared(c) <= r2 { cv.put(x, y, color, 1.0); }
        });
    }

    pub fn thick_line(&mut self, a: Vec2, b: Vec2, width: f32, color: u32, alpha: f32) {
        let seg = Segment::new(a, b);
        let half = width / 2.0;
        self.each_in(a.min(b) - Vec2::splat(half), a.max(b) + Vec2::splat(half), |cv, x, y, p| {
            if seg.distance_to(p) <= half { cv.put(x, y, color, alpha); }
        });
    }

    /// Text in the 3×5 bitmap font, each font pixel drawn `scale`×`scale`.
    pub fn draw_label(&mut self, text: &str, x: usize, y: usize, scale: usize, color: u32) {
        let mut cx = x;
        for ch in text.chars() {
            let glyph = char_glyph(ch);
            for (row, &bits) in glyph.iter().enumerate() {
                for col in 0..3usize {
                    if bits & (1 << (2 - col)) != 0 {
                        self.fill_rect(cx + col * scale, y + row * scale, scale, scale, color);
                    }
                }
            }
            cx += 4 * scale; // 3 wide + 1 gap
            if cx >= self.width { break; }
        }
    }

    pub fn label_width(text: &str, scale: usize) -> usize {
        text.chars().count() * 4 * scale
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Scene
// ════════════════════════════════════════════════════════════════════════════

/// Draw one frame of the game into `cv`. `now` is round time.
pub fn draw_scene(cv: &mut Canvas, game: &Game, blades: &BladeModel, now: Millis, hud: &Hud) {
    cv.clear(BG_COLOR);

    // ── Trails ────────────────────────────────────────────────────────────
    for handedness in [Handedness::Left, Handedness::Right] {
        let color = blade_color(handedness);
        for p in blades.trail(handedness) {
            let alpha = effects::trail_alpha(now.saturating_sub(p.at)) * 0.6;
            cv.fill_circle(p.point, TRAIL_RADIUS, color, alpha);
        }
    }

    // ── Objects ───────────────────────────────────────────────────────────
    for obj in game.objects() {
        match effects::slice_effect(obj, now) {
            Some(fx) => {
                let cut = Vec2::from_angle(fx.cut_angle);
                cv.half_disc(fx.halves[0], fx.radius, cut, true,  fx.color);
                cv.half_disc(fx.halves[1], fx.radius, cut, false, fx.color);
                for p in &fx.particles {
                    if p.alpha > 0.0 {
                        cv.each_in(p.pos - Vec2::splat(p.half), p.pos + Vec2::splat(p.half), |c, x, y, _| {
                            c.put(x, y, p.color, p.alpha);
                        });
                    }
                }
            }
            None => draw_whole(cv, obj),
        }
    }

    // ── Blades ────────────────────────────────────────────────────────────
    for hand in game.hands() {
        let color = blade_color(hand.handedness);
        if let Some(swing) = blades.swing(hand.handedness) {
            cv.thick_line(swing.start, swing.end, CORE_WIDTH, color, 0.5);
        }
        let glow = effects::glow_width(hand.scale);
        for seg in hand.segments() {
            cv.thick_line(seg.start, seg.end, glow, color, 0.45);
        }
        for seg in hand.segments() {
            cv.thick_line(seg.start, seg.end, CORE_WIDTH, BLADE_CORE, 1.0);
        }
        cv.fill_circle(effects::tip_flare(hand), FLARE_RADIUS, BLADE_CORE, 0.6);
    }

    draw_hud(cv, game, hud);
}

fn draw_whole(cv: &mut Canvas, obj: &FallingObject) {
    let r = obj.size / 2.0;
    let color = category_color(obj.category);
    cv.fill_circle(obj.position + Vec2::splat(2.0), r, 0xFF000000, 0.3);
    cv.fill_circle(obj.position, r, color, 1.0);
    match obj.category {
        Category::Hazard => cv.ring(obj.position, r, 3.0, HAZARD_RIM),
        Category::Bonus  => cv.ring(obj.position, r, 4.0, HUD_ACCENT),
        Category::Common(_) => {
            // Highlight offset by the spin so rotation is visible.
            let spot = obj.position + Vec2::from_angle(obj.rotation.to_radians()) * (r * 0.45);
            cv.fill_circle(spot, r * 0.2, 0xFFFFFFFF, 0.35);
        }
    }
}

fn draw_hud(cv: &mut Canvas, game: &Game, hud: &Hud) {
    let round = game.round();
    let s = TEXT_SCALE;
    let line = 6 * s;
    let (w, h) = (cv.width(), cv.height());

    cv.draw_label(&format!("SCORE {}", round.score), 12, 12, s, HUD_COLOR);
    if round.combo > 0 {
        cv.draw_label(&format!("COMBO X{}", round.combo + 1), 12, 12 + line, s, HUD_ACCENT);
    }

    let time = format!("TIME {}", round.time_remaining);
    cv.draw_label(&time, w.saturating_sub(Canvas::label_width(&time, s) + 12), 12, s, HUD_COLOR);
    if let Some(best) = hud.best {
        let best = format!("BEST {best}");
        cv.draw_label(&best, w.saturating_sub(Canvas::label_width(&best, s) + 12), 12 + line, s, HUD_DIM);
    }

    let banner = match round.phase {
        Phase::Playing => None,
        Phase::Paused  => Some("PAUSED - P TO RESUME".to_string()),
        Phase::Ended   => Some(format!("ROUND OVER - SCORE {} - R TO RESTART", round.score)),
    };
    if let Some(text) = banner {
        let bw = Canvas::label_width(&text, s) + 24;
        let bx = w.saturating_sub(bw) / 2;
        let by = h / 2;
        cv.fill_rect(bx, by.saturating_sub(12), bw, 5 * s + 24, BANNER_BG);
        cv.draw_label(&text, bx + 12, by, s, HUD_COLOR);
    }

    let foot = h.saturating_sub(5 * 2 + 10);
    cv.draw_label("P=PAUSE  R=RESTART  Q=QUIT", 12, foot, 2, HUD_DIM);
    if !hud.status.is_empty() {
        cv.draw_label(hud.status, 12, foot.saturating_sub(16), 2, HUD_DIM);
    }
    if let Some(player) = hud.player {
        cv.draw_label(player, w.saturating_sub(Canvas::label_width(player, 2) + 12), foot, 2, HUD_DIM);
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Visualizer
// ════════════════════════════════════════════════════════════════════════════

pub struct Visualizer {
    window: Window,
    canvas: Canvas,
    sim_tx: Sender<SimInput>,
}

impl Visualizer {
    pub fn new(width: usize, height: usize, sim_tx: Sender<SimInput>) -> Result<Self, minifb::Error> {
        let mut window = Window::new(
            "Saber Slice",
            width, height,
            WindowOptions {
                resize:     true,
                scale_mode: ScaleMode::UpperLeft,
                ..WindowOptions::default()
            },
        )?;

        window.limit_update_rate(Some(Duration::from_millis(16))); // ~60fps

        Ok(Visualizer { window, canvas: Canvas::new(width, height), sim_tx })
    }

    /// Returns false when the window should close.
    pub fn is_open(&self) -> bool { self.window.is_open() }

    /// Current drawable area.
    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.canvas.width() as f32, self.canvas.height() as f32)
    }

    /// Forward the pointer to the simulated sensor and collect key actions.
    pub fn poll_input(&mut self) -> Vec<UiAction> {
        let (w, h) = self.window.get_size();
        self.canvas.resize(w, h);

        let pointer = match self.window.get_mouse_pos(MouseMode::Discard) {
            Some((x, y)) => SimInput::PointerMoved { x, y, width: w as f32, height: h as f32 },
            None         => SimInput::PointerLeft,
        };
        let _ = self.sim_tx.send(pointer);

        let mut actions = Vec::new();
        let one_shot = |k: Key| self.window.is_key_pressed(k, KeyRepeat::No);
        if one_shot(Key::P) { actions.push(UiAction::TogglePause); }
        if one_shot(Key::R) { actions.push(UiAction::Reset); }
        if one_shot(Key::Q) || one_shot(Key::Escape) { actions.push(UiAction::Quit); }
        actions
    }

    /// Render one frame.
    pub fn render(&mut self, game: &Game, blades: &BladeModel, now: Millis, hud: &Hud) {
        draw_scene(&mut self.canvas, game, blades, now, hud);
        let (w, h) = (self.canvas.width(), self.canvas.height());
        if let Err(e) = self.window.update_with_buffer(self.canvas.pixels(), w, h) {
            tracing::warn!(error = %e, "window update failed");
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Minimal 3×5 bitmap font
// ────────────────────────────────────────────────────────────────────────────

fn char_glyph(c: char) -> [u8; 5] {
    match c.to_ascii_uppercase() {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'A' => [0b111, 0b101, 0b111, 0b101, 0b101],
        'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'C' => [0b111, 0b100, 0b100, 0b100, 0b111],
        'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'E' => [0b111, 0b100, 0b111, 0b100, 0b111],
        'F' => [0b111, 0b100, 0b111, 0b100, 0b100],
        'G' => [0b111, 0b100, 0b101, 0b101, 0b111],
        'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'J' => [0b001, 0b001, 0b001, 0b101, 0b111],
        'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'M' => [0b101, 0b111, 0b101, 0b101, 0b101],
        'N' => [0b111, 0b101, 0b101, 0b101, 0b101],
        'O' => [0b111, 0b101, 0b101, 0b101, 0b111],
        'P' => [0b111, 0b101, 0b111, 0b100, 0b100],
        'Q' => [0b111, 0b101, 0b101, 0b111, 0b001],
        'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        'S' => [0b111, 0b100, 0b111, 0b001, 0b111],
        'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'V' => [0b101, 0b101, 0b101, 0b010, 0b010],
        'W' => [0b101, 0b101, 0b101, 0b111, 0b101],
        'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'Y' => [0b101, 0b101, 0b111, 0b010, 0b010],
        'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '_' => [0b000, 0b000, 0b000, 0b000, 0b111],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        '!' => [0b010, 0b010, 0b010, 0b000, 0b010],
        ' ' => [0b000, 0b000, 0b000, 0b000, 0b000],
        _   => [0b000, 0b000, 0b010, 0b000, 0b000], // fallback dot
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
