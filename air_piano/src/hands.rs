//! Hand landmarks from the pose estimator, and their conversion to the
//! pixel-space fingertips the press tracker consumes.

use serde::{Deserialize, Serialize};

use press_tracker::{FingerId, FingerPoint};

/// Hand landmark indices (MediaPipe hand model convention).
pub mod landmarks {
    pub const INDEX_FINGER_TIP:  usize = 8;
    pub const MIDDLE_FINGER_TIP: usize = 12;
    pub const PINKY_TIP:         usize = 20;
    pub const COUNT:             usize = 21;
}

/// Landmarks used as fingertips, in tip-slot order.
pub const TRACKED_TIPS: [usize; 3] = [
    landmarks::INDEX_FINGER_TIP,
    landmarks::MIDDLE_FINGER_TIP,
    landmarks::PINKY_TIP,
];

/// Display names of the tracked tips, in tip-slot order.
pub const TIP_NAMES: [&str; 3] = ["index", "middle", "pinky"];

/// Hands the detector reports per frame.
pub const MAX_HANDS: usize = 2;

// ════════════════════════════════════════════════════════════════════════════
// NormPoint / Hand
// ════════════════════════════════════════════════════════════════════════════

/// A point in normalized frame coordinates, `(0,0)` top-left, `(1,1)`
/// bottom-right.  Serialised as a two-element list `[x, y]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 2]", into = "[f32; 2]")]
pub struct NormPoint {
    pub x: f32,
    pub y: f32,
}

impl NormPoint {
    pub fn new(x: f32, y: f32) -> Self { NormPoint { x, y } }

    /// Scale to pixels, truncating toward zero.
    pub fn to_pixels(self, width: u32, height: u32) -> (i32, i32) {
        ((self.x * width as f32) as i32, (self.y * height as f32) as i32)
    }
}

impl From<[f32; 2]> for NormPoint {
    fn from([x, y]: [f32; 2]) -> Self { NormPoint { x, y } }
}

impl From<NormPoint> for [f32; 2] {
    fn from(p: NormPoint) -> Self { [p.x, p.y] }
}

/// One detected hand: its tracked fingertips, one slot per
/// [`TRACKED_TIPS`] entry.  `None` marks a tip the detector did not report.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Hand {
    #[serde(default)]
    pub tips: Vec<Option<NormPoint>>,
}

impl Hand {
    /// A hand with only its index fingertip tracked.
    pub fn index_only(tip: NormPoint) -> Self {
        Hand { tips: vec![Some(tip)] }
    }

    /// Pick the tracked tips out of a full landmark list.
    pub fn from_landmarks(all: &[NormPoint]) -> Self {
        Hand {
            tips: TRACKED_TIPS.iter().map(|&i| all.get(i).copied()).collect(),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// fingertip_points
// ════════════════════════════════════════════════════════════════════════════

/// Scale every tracked fingertip of up to `max_hands` hands to pixels.
///
/// The finger id is `(hand slot, tip slot)` in the order the detector
/// reported them this frame.
pub fn fingertip_points(hands: &[Hand], width: u32, height: u32, max_hands: usize) -> Vec<FingerPoint> {
    let mut out = Vec::with_capacity(hands.len() * TRACKED_TIPS.len());
    for (h, hand) in hands.iter().take(max_hands).enumerate() {
        for (t, tip) in hand.tips.iter().take(TRACKED_TIPS.len()).enumerate() {
            if let Some(p) = tip {
                let (x, y) = p.to_pixels(width, height);
                out.push(FingerPoint::new(FingerId::new(h as u8, t as u8), x, y));
            }
        }
    }
    out
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
