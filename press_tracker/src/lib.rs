//! # press_tracker
//!
//! Turns a per-frame stream of fingertip positions into discrete, debounced
//! key presses on a [`Layout`].
//!
//! Each frame:
//!
//! 1. every [`FingerPoint`] is hit-tested against the layout, black keys
//!    first (they sit on top of the white keys), then white keys;
//! 2. the hit is compared with the key that finger held on the previous
//!    frame.  A different key emits a [`Trigger`]; the same key is a held
//!    note and emits nothing;
//! 3. a point that hits nothing clears the finger's entry, so lifting off
//!    and pressing the same key again sounds it again.
//!
//! ```rust
//! use keyboard_layout::{compute_layout, KeyId};
//! use press_tracker::{FingerId, FingerPoint, PressTracker};
//!
//! let layout = compute_layout(1680, 720);
//! let mut tracker = PressTracker::default();
//! let index = FingerId::new(0, 0);
//!
//! let fired = tracker.process_frame(&layout, &[FingerPoint::new(index, 50, 500)]);
//! assert_eq!(fired[0].key, KeyId::C);
//! // still there next frame: no repeat
//! assert!(tracker.process_frame(&layout, &[FingerPoint::new(index, 52, 505)]).is_empty());
//! ```
//!
//! Finger identity is positional: a [`FingerId`] is the hand's slot in the
//! detector's output for this frame plus the fingertip's slot within the
//! hand.  Nothing follows a physical finger across frames, so a different
//! finger arriving in the same slot inherits the previous one's state.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use keyboard_layout::{
    Board, KeyId, KeyRegion, Layout, BLACK_KEY_BOTTOM, KEYBOARD_BOTTOM, KEYBOARD_TOP,
};

// ════════════════════════════════════════════════════════════════════════════
// FingerId / FingerPoint
// ════════════════════════════════════════════════════════════════════════════

/// Frame-local fingertip slot: which detected hand, which tracked tip.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FingerId {
    pub hand: u8,
    pub tip:  u8,
}

impl FingerId {
    pub fn new(hand: u8, tip: u8) -> Self {
        FingerId { hand, tip }
    }
}

impl fmt::Display for FingerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "h{}.t{}", self.hand, self.tip)
    }
}

/// One fingertip in pixel coordinates for the current frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FingerPoint {
    pub finger: FingerId,
    pub x:      i32,
    pub y:      i32,
}

impl FingerPoint {
    pub fn new(finger: FingerId, x: i32, y: i32) -> Self {
        FingerPoint { finger, x, y }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Trigger
// ════════════════════════════════════════════════════════════════════════════

/// A "note on": `finger` just arrived on `key`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Trigger {
    pub finger: FingerId,
    pub key:    KeyId,
    /// Keyboard whose region matched.  Informational only; debounce
    /// compares `key`.
    pub board:  Board,
}

// ════════════════════════════════════════════════════════════════════════════
// Hit testing
// ════════════════════════════════════════════════════════════════════════════

/// Find the key under `(x, y)`, black keys taking priority.
///
/// Points outside the open band `400 < y < 600` never hit.  Within a kind,
/// regions are scanned left keyboard first, ascending index, and the first
/// match wins.
pub fn hit_test(layout: &Layout, x: i32, y: i32) -> Option<&KeyRegion> {
    if !(KEYBOARD_TOP < y && y < KEYBOARD_BOTTOM) {
        return None;
    }

    if y < BLACK_KEY_BOTTOM {
        if let Some(r) = layout.black().iter().find(|r| r.contains_x(x)) {
            return Some(r);
        }
    }

    layout.white().iter().find(|r| r.contains_x(x))
}

// ════════════════════════════════════════════════════════════════════════════
// PressState
// ════════════════════════════════════════════════════════════════════════════

/// Last key held by each finger slot seen this session.
///
/// An entry of `None` means the finger was seen but is not on a key.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PressState {
    last: BTreeMap<FingerId, Option<KeyId>>,
}

impl PressState {
    /// Key `finger` held after the most recent frame, if any.
    pub fn last_key(&self, finger: FingerId) -> Option<KeyId> {
        self.last.get(&finger).copied().flatten()
    }

    /// Number of finger slots seen since the last reset.
    pub fn len(&self) -> usize { self.last.len() }
    pub fn is_empty(&self) -> bool { self.last.is_empty() }

    fn set(&mut self, finger: FingerId, key: Option<KeyId>) {
        self.last.insert(finger, key);
    }

    fn release_all_except(&mut self, present: &BTreeSet<FingerId>) {
        for (finger, key) in self.last.iter_mut() {
            if !present.contains(finger) {
                *key = None;
            }
        }
    }

    fn clear(&mut self) {
        self.last.clear();
    }
}

// ════════════════════════════════════════════════════════════════════════════
// PressTracker
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TrackerOptions {
    /// Release fingers that are missing from a frame's point list, as if
    /// they had left the keyboard.  Off: a missing finger keeps its key.
    pub release_missing: bool,
}

/// Owns the debounce state for one playing session.
#[derive(Clone, Debug, Default)]
pub struct PressTracker {
    state:   PressState,
    options: TrackerOptions,
}

impl PressTracker {
    pub fn new(options: TrackerOptions) -> Self {
        PressTracker { state: PressState::default(), options }
    }

    /// Forget every finger; call at the start of a capture session.
    pub fn reset(&mut self) {
        self.state.clear();
    }

    pub fn state(&self) -> &PressState { &self.state }

    /// Fingers currently holding a key, in finger order.
    pub fn held(&self) -> impl Iterator<Item = (FingerId, KeyId)> + '_ {
        self.state.last.iter().filter_map(|(f, k)| k.map(|k| (*f, k)))
    }

    /// Hit-test every point of one frame and return the new presses.
    ///
    /// Emits at most one trigger per point.  Triggers come out in point
    /// order.  An empty `points` slice yields nothing.
    pub fn process_frame(&mut self, layout: &Layout, points: &[FingerPoint]) -> Vec<Trigger> {
        let mut fired = Vec::new();

        for p in points {
            let Some(region) = hit_test(layout, p.x, p.y) else {
                self.state.set(p.finger, None);
                continue;
            };

            if self.state.last_key(p.finger) == Some(region.id) {
                log::trace!("{} holding {} at ({}, {})", p.finger, region.id, p.x, p.y);
                continue;
            }

            log::debug!("{} pressed {} ({} board) at ({}, {})",
                p.finger, region.id, region.board.name(), p.x, p.y);
            self.state.set(p.finger, Some(region.id));
            fired.push(Trigger { finger: p.finger, key: region.id, board: region.board });
        }

        if self.options.release_missing {
            let present: BTreeSet<FingerId> = points.iter().map(|p| p.finger).collect();
            self.state.release_all_except(&present);
        }

        fired
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use keyboard_layout::{compute_layout, KeyKind};

    const F0: FingerId = FingerId { hand: 0, tip: 0 };
    const F1: FingerId = FingerId { hand: 0, tip: 1 };
    const F3: FingerId = FingerId { hand: 1, tip: 0 };

    fn layout() -> Layout { compute_layout(1680, 720) }

    fn at(finger: FingerId, x: i32, y: i32) -> FingerPoint {
        FingerPoint::new(finger, x, y)
    }

    fn keys(fired: &[Trigger]) -> Vec<KeyId> {
        fired.iter().map(|t| t.key).collect()
    }

    // ── hit_test ─────────────────────────────────────────────────────────
    #[test]
    fn white_key_hit() {
        let l = layout();
        let r = hit_test(&l, 50, 500).unwrap();
        assert_eq!((r.id, r.board), (KeyId::C, Board::Left));
    }

    #[test]
    fn white_key_below_black_band() {
        let l = layout();
        // x=110 is under Cb, but y=560 is below the black keys
        assert_eq!(hit_test(&l, 110, 560).unwrap().id, KeyId::C);
    }

    #[test]
    fn black_key_wins_over_white() {
        let l = layout();
        let r = hit_test(&l, 110, 500).unwrap();
        assert_eq!(r.id, KeyId::Cb);
        assert_eq!(r.kind(), KeyKind::Black);
        // the other side of the same black key
        assert_eq!(hit_test(&l, 150, 450).unwrap().id, KeyId::Cb);
    }

    #[test]
    fn every_white_interior_hits_its_own_key() {
        for w in [640, 1280, 1680, 1920] {
            let l = compute_layout(w, 720);
            for white in l.white() {
                let x = white.x_min + white.width() / 2;
                let r = hit_test(&l, x, 580).unwrap();
                assert_eq!((r.id, r.board), (white.id, white.board));
            }
        }
    }

    #[test]
    fn every_black_interior_hits_its_own_key() {
        let l = layout();
        for black in l.black() {
            let r = hit_test(&l, black.x_min + 1, 450).unwrap();
            assert_eq!((r.id, r.board), (black.id, black.board));
        }
    }

    #[test]
    fn right_board_hits() {
        let l = layout();
        let r = hit_test(&l, 840 + 50, 500).unwrap();
        assert_eq!((r.id, r.board), (KeyId::C, Board::Right));
        let r = hit_test(&l, 840 + 110, 500).unwrap();
        assert_eq!((r.id, r.board), (KeyId::Cb, Board::Right));
    }

    #[test]
    fn misses() {
        let l = layout();
        assert!(hit_test(&l, 1730, 500).is_none(), "beyond the span");
        assert!(hit_test(&l, 50, 400).is_none(), "top edge");
        assert!(hit_test(&l, 50, 600).is_none(), "bottom edge");
        assert!(hit_test(&l, 50, 200).is_none());
        assert!(hit_test(&l, 50, 700).is_none());
        assert!(hit_test(&l, -5, 500).is_none());
        // boundary between E and F has no black key
        assert!(hit_test(&l, 360, 450).is_none());
    }

    // ── debounce ─────────────────────────────────────────────────────────
    #[test]
    fn held_finger_fires_once() {
        let l = layout();
        let mut t = PressTracker::default();
        assert_eq!(keys(&t.process_frame(&l, &[at(F0, 50, 500)])), [KeyId::C]);
        for i in 0..50 {
            let jitter = i % 7;
            assert!(t.process_frame(&l, &[at(F0, 50 + jitter, 500 - jitter)]).is_empty());
        }
        assert_eq!(t.state().last_key(F0), Some(KeyId::C));
    }

    #[test]
    fn sliding_to_next_key_fires_once() {
        let l = layout();
        let mut t = PressTracker::default();
        t.process_frame(&l, &[at(F0, 50, 560)]);
        let fired = t.process_frame(&l, &[at(F0, 170, 560)]);
        assert_eq!(keys(&fired), [KeyId::D]);
        assert!(t.process_frame(&l, &[at(F0, 175, 560)]).is_empty());
    }

    #[test]
    fn lift_and_return_refires() {
        let l = layout();
        let mut t = PressTracker::default();
        t.process_frame(&l, &[at(F0, 50, 500)]);
        assert!(t.process_frame(&l, &[at(F0, 50, 300)]).is_empty());
        assert_eq!(t.state().last_key(F0), None);
        assert_eq!(keys(&t.process_frame(&l, &[at(F0, 50, 500)])), [KeyId::C]);
    }

    #[test]
    fn gap_clears_state() {
        let l = layout();
        let mut t = PressTracker::default();
        t.process_frame(&l, &[at(F0, 300, 450)]);
        // on the E|F boundary: no region
        t.process_frame(&l, &[at(F0, 360, 450)]);
        assert_eq!(t.state().last_key(F0), None);
        assert_eq!(keys(&t.process_frame(&l, &[at(F0, 300, 450)])), [KeyId::E]);
    }

    #[test]
    fn same_label_on_other_board_is_a_hold() {
        let l = layout();
        let mut t = PressTracker::default();
        t.process_frame(&l, &[at(F0, 50, 500)]);
        // left C → right C directly: same KeyId, no new event
        assert!(t.process_frame(&l, &[at(F0, 840 + 50, 500)]).is_empty());
    }

    #[test]
    fn fingers_are_independent() {
        let l = layout();
        let mut t = PressTracker::default();
        let fired = t.process_frame(&l, &[at(F0, 50, 500), at(F1, 290, 500)]);
        assert_eq!(fired.len(), 2);
        assert_eq!((fired[0].finger, fired[0].key), (F0, KeyId::C));
        assert_eq!((fired[1].finger, fired[1].key), (F1, KeyId::E));

        // F1 moves onto C, which F0 is holding: still a new press for F1
        let fired = t.process_frame(&l, &[at(F0, 50, 500), at(F1, 60, 500)]);
        assert_eq!(fired, [Trigger { finger: F1, key: KeyId::C, board: Board::Left }]);
    }

    #[test]
    fn point_order_only_changes_emission_order() {
        let l = layout();
        let pts = [at(F0, 50, 560), at(F1, 290, 560), at(F3, 530, 560)];
        let mut rev = pts;
        rev.reverse();

        let mut a = PressTracker::default();
        let mut b = PressTracker::default();
        let mut fa = a.process_frame(&l, &pts);
        let mut fb = b.process_frame(&l, &rev);
        fa.sort_by_key(|t| t.finger);
        fb.sort_by_key(|t| t.finger);
        assert_eq!(fa, fb);
        assert_eq!(a.state(), b.state());
    }

    #[test]
    fn empty_frame_is_silent() {
        let l = layout();
        let mut t = PressTracker::default();
        assert!(t.process_frame(&l, &[]).is_empty());
        assert!(t.state().is_empty());
    }

    #[test]
    fn missing_finger_keeps_its_key_by_default() {
        let l = layout();
        let mut t = PressTracker::default();
        t.process_frame(&l, &[at(F0, 50, 500)]);
        t.process_frame(&l, &[]);
        assert!(t.process_frame(&l, &[at(F0, 50, 500)]).is_empty());
    }

    #[test]
    fn release_missing_option() {
        let l = layout();
        let mut t = PressTracker::new(TrackerOptions { release_missing: true });
        t.process_frame(&l, &[at(F0, 50, 500), at(F1, 290, 500)]);
        t.process_frame(&l, &[at(F1, 290, 500)]);
        assert_eq!(t.state().last_key(F0), None);
        assert_eq!(t.state().last_key(F1), Some(KeyId::E));
        assert_eq!(keys(&t.process_frame(&l, &[at(F0, 50, 500), at(F1, 290, 500)])), [KeyId::C]);
    }

    #[test]
    fn reset_forgets_everything() {
        let l = layout();
        let mut t = PressTracker::default();
        t.process_frame(&l, &[at(F0, 50, 500)]);
        t.reset();
        assert!(t.state().is_empty());
        assert_eq!(keys(&t.process_frame(&l, &[at(F0, 50, 500)])), [KeyId::C]);
    }

    #[test]
    fn held_lists_fingers_on_keys() {
        let l = layout();
        let mut t = PressTracker::default();
        t.process_frame(&l, &[at(F3, 110, 500), at(F0, 50, 300), at(F1, 50, 560)]);
        let held: Vec<_> = t.held().collect();
        assert_eq!(held, [(F1, KeyId::C), (F3, KeyId::Cb)]);
    }

    #[test]
    fn layout_change_between_frames() {
        let mut t = PressTracker::default();
        let wide = compute_layout(1680, 720);
        let narrow = compute_layout(840, 720);
        // x=100: C at 1680 wide (kw 120), Eb at 840 wide (kw 60, Eb spans 100..140)
        assert_eq!(keys(&t.process_frame(&wide, &[at(F0, 100, 560)])), [KeyId::C]);
        assert_eq!(keys(&t.process_frame(&narrow, &[at(F0, 110, 500)])), [KeyId::Eb]);
    }
}
