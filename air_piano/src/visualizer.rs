//! Software-rendered keyboard overlay using `minifb`.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                                                              │
//! │            ●  fingertips                                     │
//! │   ┌─┬█┬─┬█┬─┬─┬█┬─┬█┬─┬█┬─┐┌─┬█┬─┬█┬─┬─┬█┬─┬█┬─┬█┬─┐   y 400  │
//! │   │ │█│ │█│ │ │█│ │█│ │█│ ││ │█│ │█│ │ │█│ │█│ │█│ │   y 530  │
//! │   │C│ │D│ │E│F│ │G│ │A│ │B││C│ │D│ │E│F│ │G│ │A│ │B│          │
//! │   └─┴─┴─┴─┴─┴─┴─┴─┴─┴─┴─┴─┘└─┴─┴─┴─┴─┴─┴─┴─┴─┴─┴─┴─┘   y 600  │
//! │  status                                                      │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! All drawing goes through [`Canvas`], which clips to its own bounds and
//! has no window attached, so frames can be painted and inspected in tests.

use std::sync::mpsc::Sender;

use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};

use keyboard_layout::{Board, KeyId, KeyKind, KeyRegion, Layout};
use press_tracker::FingerPoint;

use crate::config::WindowConfig;
use crate::error::AppError;
use crate::source::SimInput;

// ════════════════════════════════════════════════════════════════════════════
// Colours
// ════════════════════════════════════════════════════════════════════════════

const BG_COLOR:          u32 = 0xFF1A1A2E;
const WHITE_KEY:         u32 = 0xFFF5F5F5;
const WHITE_KEY_ACTIVE:  u32 = 0xFFAADDFF;
const BLACK_KEY:         u32 = 0xFF101010;
const BLACK_KEY_ACTIVE:  u32 = 0xFF3A6EA5;
const KEY_BORDER:        u32 = 0xFF000000;
const FINGERTIP:         u32 = 0xFF00E676;
const STATUS_BG:         u32 = 0xFF0F3460;
const STATUS_TEXT:       u32 = 0xFFEEEEEE;
const LEGEND_TEXT:       u32 = 0xFF888888;

const LABEL_SCALE:   i32 = 3;
const STATUS_SCALE:  i32 = 2;
const STATUS_H:      i32 = 28;
const FINGERTIP_R:   i32 = 8;

// ════════════════════════════════════════════════════════════════════════════
// Canvas
// ════════════════════════════════════════════════════════════════════════════

/// An ARGB framebuffer with clipped drawing primitives.
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
    pub fn buffer(&self) -> &[u32] { &self.buf }

    /// Match a new window size; contents are discarded.
    pub fn resize(&mut self, width: usize, height: usize) {
        if (width, height) != (self.width, self.height) {
            self.width  = width;
            self.height = height;
            self.buf    = vec![BG_COLOR; width * height];
        }
    }

    pub fn clear(&mut self, color: u32) { self.buf.fill(color); }

    pub fn pixel(&self, x: i32, y: i32) -> Option<u32> {
        self.index(x, y).map(|i| self.buf[i])
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 { return None; }
        let (x, y) = (x as usize, y as usize);
        (x < self.width && y < self.height).then(|| y * self.width + x)
    }

    pub fn set_pixel(&mut self, x: i32, y: i32, color: u32) {
        if let Some(i) = self.index(x, y) {
            self.buf[i] = color;
        }
    }

    pub fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: u32) {
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + w).min(self.width as i32);
        let y1 = (y + h).min(self.height as i32);
        for row in y0..y1 {
            let base = row as usize * self.width;
            for col in x0..x1 {
                self.buf[base + col as usize] = color;
            }
        }
    }

    /// One-pixel outline of the rectangle `[x, x+w) × [y, y+h)`.
    pub fn draw_border(&mut self, x: i32, y: i32, w: i32, h: i32, color: u32) {
        if w <= 0 || h <= 0 { return; }
        self.fill_rect(x,         y,         w, 1, color);
        self.fill_rect(x,         y + h - 1, w, 1, color);
        self.fill_rect(x,         y,         1, h, color);
        self.fill_rect(x + w - 1, y,         1, h, color);
    }

    pub fn fill_circle(&mut self, cx: i32, cy: i32, r: i32, color: u32) {
        for dy in -r..=r {
            for dx in -r..=r {
                if dx * dx + dy * dy <= r * r {
                    self.set_pixel(cx + dx, cy + dy, color);
                }
            }
        }
    }

    /// Minimal bitmap font: 3×5 glyphs, each pixel drawn as a
    /// `scale`×`scale` block.
    pub fn draw_text(&mut self, text: &str, x: i32, y: i32, scale: i32, color: u32) {
        let scale = scale.max(1);
        let mut cx = x;
        for ch in text.chars() {
            let glyph = char_glyph(ch);
            for (row, &bits) in glyph.iter().enumerate() {
                for col in 0..3 {
                    if bits & (1 << (2 - col)) != 0 {
                        self.fill_rect(cx + col * scale, y + row as i32 * scale, scale, scale, color);
                    }
                }
            }
            cx += 4 * scale; // 3 wide + 1 gap
            if cx >= self.width as i32 { break; }
        }
    }
}

/// Width in pixels of `text` as drawn by [`Canvas::draw_text`].
pub fn text_width(text: &str, scale: i32) -> i32 {
    let n = text.chars().count() as i32;
    if n == 0 { 0 } else { (4 * n - 1) * scale.max(1) }
}

// ════════════════════════════════════════════════════════════════════════════
// Frame painting
// ════════════════════════════════════════════════════════════════════════════

/// Paint one frame: both keyboards, the fingertips and the status bar.
///
/// White keys go down first and black keys on top, so a black key covers the
/// upper part of its neighbours.  Keys listed in `active` are highlighted.
pub fn paint_frame(
    canvas: &mut Canvas,
    layout: &Layout,
    points: &[FingerPoint],
    active: &[(KeyId, Board)],
    status: &str,
) {
    canvas.clear(BG_COLOR);

    let is_active = |r: &KeyRegion| active.contains(&(r.id, r.board));

    for r in layout.regions() {
        match r.kind() {
            KeyKind::White => {
                let fill = if is_active(r) { WHITE_KEY_ACTIVE } else { WHITE_KEY };
                paint_key(canvas, r, fill);
                let label_y = r.y_max - 5 * LABEL_SCALE - 8;
                canvas.draw_text(r.id.label(), r.x_min + 10, label_y, LABEL_SCALE, KEY_BORDER);
            }
            KeyKind::Black => {
                let fill = if is_active(r) { BLACK_KEY_ACTIVE } else { BLACK_KEY };
                paint_key(canvas, r, fill);
                let label_y = r.y_max - 5 * STATUS_SCALE - 4;
                canvas.draw_text(r.id.label(), r.x_min + 2, label_y, STATUS_SCALE, WHITE_KEY);
            }
        }
    }

    for p in points {
        canvas.fill_circle(p.x, p.y, FINGERTIP_R, FINGERTIP);
    }

    let h = canvas.height() as i32;
    let w = canvas.width() as i32;
    canvas.fill_rect(0, h - STATUS_H, w, STATUS_H, STATUS_BG);
    canvas.draw_text(status, 8, h - STATUS_H + 8, STATUS_SCALE, STATUS_TEXT);

    let legend = "hold mouse = fingertip   i = instrument   q = quit";
    let lx = w - text_width(legend, 1) - 8;
    canvas.draw_text(legend, lx, h - STATUS_H - 10, 1, LEGEND_TEXT);
}

fn paint_key(canvas: &mut Canvas, r: &KeyRegion, fill: u32) {
    let (w, h) = (r.width() + 1, r.height() + 1);
    canvas.fill_rect(r.x_min, r.y_min, w, h, fill);
    if r.kind() == KeyKind::White {
        canvas.draw_border(r.x_min, r.y_min, w, h, KEY_BORDER);
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Visualizer
// ════════════════════════════════════════════════════════════════════════════

pub struct Visualizer {
    window:     Window,
    canvas:     Canvas,
    sim_tx:     Sender<SimInput>,
    mouse_down: bool,
}

impl Visualizer {
    pub fn new(sim_tx: Sender<SimInput>, cfg: &WindowConfig) -> Result<Self, AppError> {
        let mut window = Window::new(
            "Air Piano — two-octave fingertip keyboard",
            cfg.width, cfg.height,
            WindowOptions {
                resize: cfg.resizable,
                ..WindowOptions::default()
            },
        ).map_err(|e| AppError::Window(e.to_string()))?;

        window.set_target_fps(60);

        Ok(Visualizer {
            window,
            canvas: Canvas::new(cfg.width, cfg.height),
            sim_tx,
            mouse_down: false,
        })
    }

    /// Returns false when the window should close.
    pub fn is_open(&self) -> bool { self.window.is_open() }

    /// Current drawable size; the keyboard layout follows it.
    pub fn size(&self) -> (u32, u32) {
        let (w, h) = self.window.get_size();
        (w as u32, h as u32)
    }

    /// Poll keyboard and mouse.  The mouse becomes [`SimInput`] on the sim
    /// channel; a key command is returned to the caller.  A closed window
    /// reads as [`KeyAction::Quit`].
    pub fn poll_input(&mut self) -> Option<KeyAction> {
        if !self.window.is_open() { return Some(KeyAction::Quit); }

        let action = key_action(&self.window.get_keys_pressed(KeyRepeat::No));
        if action == Some(KeyAction::Quit) {
            let _ = self.sim_tx.send(SimInput::Quit);
            return action;
        }

        let (input, down) = pointer_input(
            self.window.get_mouse_pos(MouseMode::Discard),
            self.window.get_mouse_down(MouseButton::Left),
            self.window.get_size(),
            self.mouse_down,
        );
        self.mouse_down = down;
        if let Some(input) = input {
            let _ = self.sim_tx.send(input);
        }
        action
    }

    /// Render one frame.
    pub fn render(
        &mut self,
        layout: &Layout,
        points: &[FingerPoint],
        active: &[(KeyId, Board)],
        status: &str,
    ) {
        let (w, h) = self.window.get_size();
        self.canvas.resize(w.max(1), h.max(1));
        paint_frame(&mut self.canvas, layout, points, active, status);

        let (cw, ch) = (self.canvas.width(), self.canvas.height());
        if let Err(e) = self.window.update_with_buffer(self.canvas.buffer(), cw, ch) {
            log::warn!("Window update failed: {}", e);
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Input mapping
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyAction {
    Quit,
    /// Switch to the next instrument in the table.
    NextInstrument,
}

/// Map this frame's newly pressed keys to a command; quit wins.
pub fn key_action(pressed: &[Key]) -> Option<KeyAction> {
    if pressed.iter().any(|k| matches!(k, Key::Q | Key::Escape)) {
        Some(KeyAction::Quit)
    } else if pressed.contains(&Key::I) {
        Some(KeyAction::NextInstrument)
    } else {
        None
    }
}

/// One frame of the mouse-as-fingertip rule.
///
/// While the left button is down over a non-empty window the pointer is sent
/// every frame, normalized to the window size.  The first frame it is not
/// (button up, pointer outside the window) sends a single `Lift`.  Returns the
/// input to send, if any, and whether the fingertip is now down.
pub fn pointer_input(
    pos:      Option<(f32, f32)>,
    down:     bool,
    size:     (usize, usize),
    was_down: bool,
) -> (Option<SimInput>, bool) {
    let (w, h) = size;
    match pos.filter(|_| down && w > 0 && h > 0) {
        Some((mx, my)) => (Some(SimInput::Pointer { nx: mx / w as f32, ny: my / h as f32 }), true),
        None if was_down => (Some(SimInput::Lift), false),
        None => (None, false),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Minimal 3×5 bitmap font
// ────────────────────────────────────────────────────────────────────────────

fn char_glyph(c: char) -> [u8; 5] {
    match c {
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
        'a' | 'A' => [0b111, 0b101, 0b111, 0b101, 0b101],
        'b' | 'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'c' | 'C' => [0b111, 0b100, 0b100, 0b100, 0b111],
        'd' | 'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'e' | 'E' => [0b111, 0b100, 0b111, 0b100, 0b111],
        'f' | 'F' => [0b111, 0b100, 0b111, 0b100, 0b100],
        'g' | 'G' => [0b111, 0b100, 0b101, 0b101, 0b111],
        'h' | 'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'i' | 'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'j' | 'J' => [0b001, 0b001, 0b001, 0b101, 0b111],
        'k' | 'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'l' | 'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'm' | 'M' => [0b101, 0b111, 0b101, 0b101, 0b101],
        'n' | 'N' => [0b111, 0b101, 0b101, 0b101, 0b101],
        'o' | 'O' => [0b111, 0b101, 0b101, 0b101, 0b111],
        'p' | 'P' => [0b111, 0b101, 0b111, 0b100, 0b100],
        'q' | 'Q' => [0b111, 0b101, 0b101, 0b111, 0b001],
        'r' | 'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        's' | 'S' => [0b111, 0b100, 0b111, 0b001, 0b111],
        't' | 'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'u' | 'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'v' | 'V' => [0b101, 0b101, 0b101, 0b010, 0b010],
        'w' | 'W' => [0b101, 0b101, 0b101, 0b111, 0b101],
        'x' | 'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'y' | 'Y' => [0b101, 0b101, 0b111, 0b010, 0b010],
        'z' | 'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '(' => [0b010, 0b100, 0b100, 0b100, 0b010],
        ')' => [0b010, 0b001, 0b001, 0b001, 0b010],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        '+' => [0b000, 0b010, 0b111, 0b010, 0b000],
        ' ' => [0b000, 0b000, 0b000, 0b000, 0b000],
        _   => [0b000, 0b000, 0b010, 0b000, 0b000], // fallback dot
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use keyboard_layout::compute_layout;
    use press_tracker::FingerId;

    #[test]
    fn fill_rect_clips_to_canvas() {
        let mut c = Canvas::new(10, 10);
        c.fill_rect(-5, 8, 20, 20, 0xFFFF0000);
        assert_eq!(c.pixel(0, 8), Some(0xFFFF0000));
        assert_eq!(c.pixel(9, 9), Some(0xFFFF0000));
        assert_eq!(c.pixel(0, 7), Some(BG_COLOR));
        assert_eq!(c.pixel(10, 9), None);
        assert_eq!(c.pixel(-1, 9), None);
    }

    #[test]
    fn border_is_hollow() {
        let mut c = Canvas::new(10, 10);
        c.draw_border(2, 2, 5, 5, 0xFF00FF00);
        assert_eq!(c.pixel(2, 2), Some(0xFF00FF00));
        assert_eq!(c.pixel(6, 6), Some(0xFF00FF00));
        assert_eq!(c.pixel(4, 4), Some(BG_COLOR));
        assert_eq!(c.pixel(7, 7), Some(BG_COLOR));
    }

    #[test]
    fn circle_off_canvas_does_not_panic() {
        let mut c = Canvas::new(10, 10);
        c.fill_circle(-3, -3, 5, 0xFF00FF00);
        c.fill_circle(100, 4, 5, 0xFF00FF00);
        assert_eq!(c.pixel(0, 0), Some(0xFF00FF00));
        assert_eq!(c.pixel(9, 9), Some(BG_COLOR));
    }

    #[test]
    fn text_is_scaled() {
        let mut c = Canvas::new(40, 20);
        c.draw_text("1", 0, 0, 2, 0xFFFFFFFF);
        // '1' row 0 is 0b010: only the middle column is lit
        assert_eq!(c.pixel(0, 0), Some(BG_COLOR));
        assert_eq!(c.pixel(2, 0), Some(0xFFFFFFFF));
        assert_eq!(c.pixel(3, 1), Some(0xFFFFFFFF));
        assert_eq!(text_width("Cb", 3), 21);
        assert_eq!(text_width("", 3), 0);
    }

    #[test]
    fn resize_reallocates() {
        let mut c = Canvas::new(4, 4);
        c.resize(8, 2);
        assert_eq!(c.buffer().len(), 16);
        assert_eq!((c.width(), c.height()), (8, 2));
    }

    // ── input mapping ────────────────────────────────────────────────────
    #[test]
    fn quit_and_instrument_keys() {
        assert_eq!(key_action(&[Key::Q]), Some(KeyAction::Quit));
        assert_eq!(key_action(&[Key::Escape]), Some(KeyAction::Quit));
        assert_eq!(key_action(&[Key::I]), Some(KeyAction::NextInstrument));
        assert_eq!(key_action(&[Key::I, Key::Q]), Some(KeyAction::Quit));
        assert_eq!(key_action(&[Key::A]), None);
        assert_eq!(key_action(&[]), None);
    }

    #[test]
    fn press_hold_release() {
        let size = (1000, 500);

        // idle: nothing sent
        assert_eq!(pointer_input(Some((100.0, 100.0)), false, size, false), (None, false));

        // press: normalized pointer
        let (input, down) = pointer_input(Some((250.0, 400.0)), true, size, false);
        assert_eq!(input, Some(SimInput::Pointer { nx: 0.25, ny: 0.8 }));
        assert!(down);

        // hold: pointer keeps coming
        let (input, down) = pointer_input(Some((500.0, 400.0)), true, size, true);
        assert_eq!(input, Some(SimInput::Pointer { nx: 0.5, ny: 0.8 }));
        assert!(down);

        // release: exactly one Lift
        assert_eq!(pointer_input(Some((500.0, 400.0)), false, size, true), (Some(SimInput::Lift), false));
        assert_eq!(pointer_input(Some((500.0, 400.0)), false, size, false), (None, false));
    }

    #[test]
    fn leaving_the_window_lifts_once() {
        let size = (1000, 500);
        assert_eq!(pointer_input(None, true, size, true), (Some(SimInput::Lift), false));
        // still held outside the window: nothing more
        assert_eq!(pointer_input(None, true, size, false), (None, false));
    }

    #[test]
    fn zero_size_window_sends_no_pointer() {
        assert_eq!(pointer_input(Some((0.0, 0.0)), true, (0, 0), false), (None, false));
        assert_eq!(pointer_input(Some((0.0, 0.0)), true, (0, 500), true), (Some(SimInput::Lift), false));
    }

    #[test]
    fn frame_shows_keys_and_highlights() {
        let layout = compute_layout(1680, 720);
        let mut c = Canvas::new(1680, 720);
        let finger = [FingerPoint::new(FingerId::new(0, 0), 300, 200)];
        paint_frame(&mut c, &layout, &finger, &[(KeyId::D, Board::Right)], "ready");

        // inside left C below the black band, away from its label
        assert_eq!(c.pixel(60, 545), Some(WHITE_KEY));
        // left Cb is drawn over the C/D boundary
        assert_eq!(c.pixel(120, 450), Some(BLACK_KEY));
        // right D (x 960..1080) is highlighted
        assert_eq!(c.pixel(1020, 545), Some(WHITE_KEY_ACTIVE));
        // left D is not
        assert_eq!(c.pixel(180, 545), Some(WHITE_KEY));
        // fingertip
        assert_eq!(c.pixel(300, 200), Some(FINGERTIP));
        // above the keyboard is background
        assert_eq!(c.pixel(800, 100), Some(BG_COLOR));
        // status bar
        assert_eq!(c.pixel(1000, 719), Some(STATUS_BG));
    }
}
