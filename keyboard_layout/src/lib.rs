//! # keyboard_layout
//!
//! Pixel-space layout of two mirrored one-octave piano keyboards drawn side
//! by side across a video frame.
//!
//! The layout is a pure function of the frame size: call [`compute_layout`]
//! once per frame and throw the previous [`Layout`] away.  Nothing here is
//! stateful and nothing can fail.
//!
//! ```text
//!  start_x                     start_x + 7·kw                start_x + 14·kw
//!  │ C │ D │ E │ F │ G │ A │ B │ C │ D │ E │ F │ G │ A │ B │
//!  └──── left keyboard ────────┴──── right keyboard ───────┘
//! ```
//!
//! White keys fill the band `y ∈ [400, 600]`; black keys straddle the right
//! edge of white keys 0, 1, 3, 4 and 5 and only reach down to `y = 530`.
//! The band is fixed in pixels and does not follow the frame height.
//!
//! ## Quick start
//!
//! ```rust
//! use keyboard_layout::{compute_layout, KeyId};
//!
//! let layout = compute_layout(1680, 720);
//! assert_eq!(layout.key_width, 120);
//! assert_eq!(layout.white()[0].id, KeyId::C);
//! assert_eq!(layout.black().len(), 10);
//! ```

use std::fmt;

// ════════════════════════════════════════════════════════════════════════════
// Geometry constants
// ════════════════════════════════════════════════════════════════════════════

/// Top edge of both keyboards (pixels from the top of the frame).
pub const KEYBOARD_TOP:      i32 = 400;
/// Bottom edge of the white keys.
pub const KEYBOARD_BOTTOM:   i32 = 600;
/// Bottom edge of the black keys.
pub const BLACK_KEY_BOTTOM:  i32 = 530;

pub const WHITE_KEYS_PER_BOARD: usize = 7;
pub const BLACK_KEYS_PER_BOARD: usize = 5;
pub const BOARD_COUNT:          usize = 2;
pub const WHITE_KEY_COUNT:      usize = WHITE_KEYS_PER_BOARD * BOARD_COUNT;
pub const BLACK_KEY_COUNT:      usize = BLACK_KEYS_PER_BOARD * BOARD_COUNT;

// ════════════════════════════════════════════════════════════════════════════
// KeyKind / KeyId
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyKind {
    White,
    Black,
}

impl KeyKind {
    pub fn name(self) -> &'static str {
        match self {
            KeyKind::White => "white",
            KeyKind::Black => "black",
        }
    }
}

/// One of the twelve key labels of an octave.
///
/// The black keys keep the labels the instrument has always shown
/// (`Cb` is the key between C and D, and so on).  Both keyboards reuse the
/// same twelve labels, so a `KeyId` alone does not say which keyboard was
/// touched; the [`KeyRegion`] it came from does.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyId {
    C, D, E, F, G, A, B,
    Cb, Eb, Fb, Gb, Bb,
}

impl KeyId {
    /// White keys in left-to-right order.
    pub const WHITE: [KeyId; WHITE_KEYS_PER_BOARD] =
        [KeyId::C, KeyId::D, KeyId::E, KeyId::F, KeyId::G, KeyId::A, KeyId::B];

    /// Black keys in left-to-right order.
    pub const BLACK: [KeyId; BLACK_KEYS_PER_BOARD] =
        [KeyId::Cb, KeyId::Eb, KeyId::Fb, KeyId::Gb, KeyId::Bb];

    pub fn kind(self) -> KeyKind {
        match self {
            KeyId::Cb | KeyId::Eb | KeyId::Fb | KeyId::Gb | KeyId::Bb => KeyKind::Black,
            _ => KeyKind::White,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            KeyId::C  => "C",
            KeyId::D  => "D",
            KeyId::E  => "E",
            KeyId::F  => "F",
            KeyId::G  => "G",
            KeyId::A  => "A",
            KeyId::B  => "B",
            KeyId::Cb => "Cb",
            KeyId::Eb => "Eb",
            KeyId::Fb => "Fb",
            KeyId::Gb => "Gb",
            KeyId::Bb => "Bb",
        }
    }

    /// Chromatic offset (0–11) of the key's physical position in the octave.
    ///
    /// Black keys are placed by where they sit, not by their label:
    /// the key between C and D is semitone 1.
    pub fn semitone(self) -> u8 {
        match self {
            KeyId::C  => 0,
            KeyId::Cb => 1,
            KeyId::D  => 2,
            KeyId::Eb => 3,
            KeyId::E  => 4,
            KeyId::F  => 5,
            KeyId::Fb => 6,
            KeyId::G  => 7,
            KeyId::Gb => 8,
            KeyId::A  => 9,
            KeyId::Bb => 10,
            KeyId::B  => 11,
        }
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Black key sitting on the right edge of each white key, by white index.
pub const BLACK_KEY_AFTER: [Option<KeyId>; WHITE_KEYS_PER_BOARD] = [
    Some(KeyId::Cb),
    Some(KeyId::Eb),
    None,
    Some(KeyId::Fb),
    Some(KeyId::Gb),
    Some(KeyId::Bb),
    None,
];

// ════════════════════════════════════════════════════════════════════════════
// Board
// ════════════════════════════════════════════════════════════════════════════

/// Which of the two keyboards a region belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Board {
    Left,
    Right,
}

impl Board {
    pub const ALL: [Board; BOARD_COUNT] = [Board::Left, Board::Right];

    pub fn index(self) -> usize {
        match self {
            Board::Left  => 0,
            Board::Right => 1,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Board::Left  => "left",
            Board::Right => "right",
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// KeyRegion
// ════════════════════════════════════════════════════════════════════════════

/// Axis-aligned rectangle of one key, in pixels.
///
/// Containment is strict on every edge: a point on a shared boundary belongs
/// to neither neighbour.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyRegion {
    pub id:    KeyId,
    pub board: Board,
    pub x_min: i32,
    pub x_max: i32,
    pub y_min: i32,
    pub y_max: i32,
}

impl KeyRegion {
    pub fn kind(&self) -> KeyKind { self.id.kind() }

    pub fn width(&self)  -> i32 { self.x_max - self.x_min }
    pub fn height(&self) -> i32 { self.y_max - self.y_min }

    /// `x_min < x < x_max`
    pub fn contains_x(&self, x: i32) -> bool {
        self.x_min < x && x < self.x_max
    }

    /// Strict containment on both axes.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.contains_x(x) && self.y_min < y && y < self.y_max
    }

    fn shifted(self, dx: i32, board: Board) -> Self {
        KeyRegion {
            board,
            x_min: self.x_min + dx,
            x_max: self.x_max + dx,
            ..self
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Layout
// ════════════════════════════════════════════════════════════════════════════

/// Every key region for one frame size.
///
/// Regions are stored in scan order: left keyboard before right keyboard,
/// ascending key index within each.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layout {
    pub frame_width:  u32,
    pub frame_height: u32,
    /// Width of one white key; never less than 1.
    pub key_width:    i32,
    /// Left margin that centres the 14-key span.
    pub start_x:      i32,
    white: [KeyRegion; WHITE_KEY_COUNT],
    black: [KeyRegion; BLACK_KEY_COUNT],
}

impl Layout {
    /// All 14 white regions, left keyboard first.
    pub fn white(&self) -> &[KeyRegion] { &self.white }

    /// All 10 black regions, left keyboard first.
    pub fn black(&self) -> &[KeyRegion] { &self.black }

    pub fn white_on(&self, board: Board) -> &[KeyRegion] {
        let i = board.index() * WHITE_KEYS_PER_BOARD;
        &self.white[i..i + WHITE_KEYS_PER_BOARD]
    }

    pub fn black_on(&self, board: Board) -> &[KeyRegion] {
        let i = board.index() * BLACK_KEYS_PER_BOARD;
        &self.black[i..i + BLACK_KEYS_PER_BOARD]
    }

    /// White regions followed by black regions (draw order).
    pub fn regions(&self) -> impl Iterator<Item = &KeyRegion> {
        self.white.iter().chain(self.black.iter())
    }

    /// Horizontal extent `[start, end)` covered by one keyboard's white keys.
    pub fn board_span(&self, board: Board) -> (i32, i32) {
        let keys = self.white_on(board);
        (keys[0].x_min, keys[WHITE_KEYS_PER_BOARD - 1].x_max)
    }

    /// Horizontal extent `[start, end)` of both keyboards together.
    pub fn key_span(&self) -> (i32, i32) {
        (self.start_x, self.start_x + self.key_width * WHITE_KEY_COUNT as i32)
    }

    /// Distance between a left-keyboard region and its right-keyboard twin.
    pub fn board_offset(&self) -> i32 {
        self.key_width * WHITE_KEYS_PER_BOARD as i32
    }
}

// ════════════════════════════════════════════════════════════════════════════
// compute_layout
// ════════════════════════════════════════════════════════════════════════════

/// Compute every key region for a frame of `frame_width × frame_height`.
///
/// Frames narrower than 14 pixels get 1-pixel keys instead of an empty
/// layout, so a transient resize never leaves the caller without regions.
pub fn compute_layout(frame_width: u32, frame_height: u32) -> Layout {
    let width     = frame_width.min(i32::MAX as u32) as i32;
    let key_width = (width / WHITE_KEY_COUNT as i32).max(1);
    let start_x   = (width - key_width * WHITE_KEY_COUNT as i32).max(0) / 2;
    let offset    = key_width * WHITE_KEYS_PER_BOARD as i32;

    let left_white: [KeyRegion; WHITE_KEYS_PER_BOARD] = std::array::from_fn(|i| {
        let x_min = start_x + i as i32 * key_width;
        KeyRegion {
            id:    KeyId::WHITE[i],
            board: Board::Left,
            x_min,
            x_max: x_min + key_width,
            y_min: KEYBOARD_TOP,
            y_max: KEYBOARD_BOTTOM,
        }
    });

    // Black keys are centred on the right edge of their anchor white key.
    let half = key_width / 3;
    let mut left_black = Vec::with_capacity(BLACK_KEYS_PER_BOARD);
    for (anchor, slot) in left_white.iter().zip(BLACK_KEY_AFTER) {
        if let Some(id) = slot {
            left_black.push(KeyRegion {
                id,
                board: Board::Left,
                x_min: anchor.x_max - half,
                x_max: anchor.x_max + half,
                y_min: KEYBOARD_TOP,
                y_max: BLACK_KEY_BOTTOM,
            });
        }
    }

    let white = std::array::from_fn(|i| {
        let key = left_white[i % WHITE_KEYS_PER_BOARD];
        if i < WHITE_KEYS_PER_BOARD { key } else { key.shifted(offset, Board::Right) }
    });
    let black = std::array::from_fn(|i| {
        let key = left_black[i % BLACK_KEYS_PER_BOARD];
        if i < BLACK_KEYS_PER_BOARD { key } else { key.shifted(offset, Board::Right) }
    });

    Layout {
        frame_width,
        frame_height,
        key_width,
        start_x,
        white,
        black,
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    const WIDTHS: [u32; 9] = [14, 15, 100, 641, 1024, 1280, 1680, 1690, 3840];

    // ── KeyId ────────────────────────────────────────────────────────────
    #[test]
    fn key_kinds() {
        for k in KeyId::WHITE { assert_eq!(k.kind(), KeyKind::White); }
        for k in KeyId::BLACK { assert_eq!(k.kind(), KeyKind::Black); }
    }

    #[test]
    fn semitones_cover_the_octave_once() {
        let mut seen: Vec<u8> = KeyId::WHITE.iter()
            .chain(KeyId::BLACK.iter())
            .map(|k| k.semitone())
            .collect();
        seen.sort();
        assert_eq!(seen, (0..12).collect::<Vec<u8>>());
    }

    #[test]
    fn labels_display() {
        assert_eq!(KeyId::Gb.label(), "Gb");
        assert_eq!(KeyId::Bb.to_string(), "Bb");
    }

    // ── counts and order ─────────────────────────────────────────────────
    #[test]
    fn fourteen_white_ten_black() {
        for w in WIDTHS {
            let l = compute_layout(w, 720);
            assert_eq!(l.white().len(), 14);
            assert_eq!(l.black().len(), 10);
            assert_eq!(l.regions().count(), 24);
            assert!(l.white().iter().all(|r| r.kind() == KeyKind::White));
            assert!(l.black().iter().all(|r| r.kind() == KeyKind::Black));
        }
    }

    #[test]
    fn labels_in_keyboard_order() {
        let l = compute_layout(1280, 720);
        for board in Board::ALL {
            let ids: Vec<KeyId> = l.white_on(board).iter().map(|r| r.id).collect();
            assert_eq!(ids, KeyId::WHITE.to_vec());
            let ids: Vec<KeyId> = l.black_on(board).iter().map(|r| r.id).collect();
            assert_eq!(ids, KeyId::BLACK.to_vec());
            assert!(l.white_on(board).iter().all(|r| r.board == board));
        }
    }

    // ── white partition ──────────────────────────────────────────────────
    #[test]
    fn white_keys_tile_each_board_without_gaps() {
        for w in WIDTHS {
            let l = compute_layout(w, 720);
            let kw = l.key_width;
            for board in Board::ALL {
                let keys = l.white_on(board);
                let start = l.start_x + board.index() as i32 * 7 * kw;
                assert_eq!(keys[0].x_min, start);
                for pair in keys.windows(2) {
                    assert_eq!(pair[0].x_max, pair[1].x_min, "gap or overlap at w={}", w);
                }
                assert_eq!(keys[6].x_max, start + 7 * kw);
                assert!(keys.iter().all(|k| k.width() == kw));
            }
        }
    }

    #[test]
    fn right_board_is_left_shifted() {
        for w in WIDTHS {
            let l = compute_layout(w, 480);
            let dx = 7 * l.key_width;
            assert_eq!(l.board_offset(), dx);
            for (a, b) in l.white_on(Board::Left).iter().zip(l.white_on(Board::Right)) {
                assert_eq!((a.id, a.x_min + dx, a.x_max + dx, a.y_min, a.y_max),
                           (b.id, b.x_min,      b.x_max,      b.y_min, b.y_max));
            }
            for (a, b) in l.black_on(Board::Left).iter().zip(l.black_on(Board::Right)) {
                assert_eq!((a.id, a.x_min + dx, a.x_max + dx), (b.id, b.x_min, b.x_max));
            }
        }
    }

    #[test]
    fn span_is_centred() {
        let l = compute_layout(1690, 720);
        assert_eq!(l.key_width, 120);
        assert_eq!(l.start_x, 5);
        assert_eq!(l.key_span(), (5, 1685));
        assert_eq!(l.board_span(Board::Right), (845, 1685));
    }

    // ── black keys ───────────────────────────────────────────────────────
    #[test]
    fn black_keys_straddle_their_anchor_edge() {
        for w in WIDTHS {
            let l = compute_layout(w, 720);
            let half = l.key_width / 3;
            for board in Board::ALL {
                let whites = l.white_on(board);
                let mut blacks = l.black_on(board).iter();
                for (i, slot) in BLACK_KEY_AFTER.iter().enumerate() {
                    let Some(id) = slot else { continue };
                    let b = blacks.next().unwrap();
                    assert_eq!(b.id, *id);
                    let edge = whites[i].x_max;
                    assert_eq!((b.x_min, b.x_max), (edge - half, edge + half));
                    // strictly inside the two neighbours, and shorter
                    assert!(b.x_min > whites[i].x_min);
                    assert!(b.x_max < whites[i + 1].x_max);
                    assert_eq!(b.y_min, KEYBOARD_TOP);
                    assert!(b.y_max < whites[i].y_max);
                }
            }
        }
    }

    #[test]
    fn black_keys_do_not_overlap_each_other() {
        for w in WIDTHS {
            let l = compute_layout(w, 720);
            for pair in l.black().windows(2) {
                assert!(pair[0].x_max <= pair[1].x_min);
            }
        }
    }

    // ── concrete frame ───────────────────────────────────────────────────
    #[test]
    fn layout_1680() {
        let l = compute_layout(1680, 720);
        assert_eq!(l.key_width, 120);
        assert_eq!(l.start_x, 0);
        let c = l.white()[0];
        assert_eq!((c.id, c.x_min, c.x_max, c.y_min, c.y_max), (KeyId::C, 0, 120, 400, 600));
        let cb = l.black()[0];
        assert_eq!((cb.id, cb.x_min, cb.x_max, cb.y_max), (KeyId::Cb, 80, 160, 530));
        assert_eq!(l.key_span(), (0, 1680));
        assert!(c.contains(50, 500));
        assert!(cb.contains(110, 500));
    }

    #[test]
    fn height_does_not_move_the_band() {
        let a = compute_layout(1280, 480);
        let b = compute_layout(1280, 1080);
        assert_eq!(a.white(), b.white());
        assert_eq!(a.black(), b.black());
    }

    // ── degenerate widths ────────────────────────────────────────────────
    #[test]
    fn narrow_frame_clamps_key_width() {
        for w in [0, 1, 5, 13] {
            let l = compute_layout(w, 100);
            assert_eq!(l.key_width, 1);
            assert_eq!(l.start_x, 0);
            assert_eq!(l.white()[13].x_max, 14);
        }
    }

    #[test]
    fn region_containment_is_strict() {
        let l = compute_layout(1680, 720);
        let d = l.white()[1];
        assert!(!d.contains(120, 500));
        assert!(!d.contains(130, 400));
        assert!(!d.contains(130, 600));
        assert!(d.contains(130, 401));
    }
}
