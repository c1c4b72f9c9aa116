//! # air_piano
//!
//! A two-octave virtual piano drawn over the frame and played with tracked
//! fingertips.  Every frame the key regions are recomputed for the current
//! window size, each fingertip is hit-tested (black keys first), and a note
//! sounds once when a fingertip arrives on a key.  It does not repeat while
//! the finger stays there.
//!
//! ## Pipeline
//!
//! ```text
//! HandSource ──► hands::fingertip_points ──► PressTracker ──► Player (MIDI)
//!                       ▲                         ▲       └──► SessionRecorder
//!   window size ──► compute_layout ───────────────┘
//! ```
//!
//! ## Fingertip sources
//!
//! * (default) **Simulation**: hold the left mouse button in the window and
//!   the pointer acts as one hand's index fingertip; release to lift it.
//! * `--replay trace.yaml`: plays back a recorded trace of normalized
//!   fingertip landmarks, frame by frame (see [`source::Trace`]).
//!
//! ### Keys
//!
//! | Key | Action |
//! |---|---|
//! | mouse (left button held) | fingertip |
//! | `Q` / `Esc` | Quit |

pub mod app;
pub mod config;
pub mod error;
pub mod hands;
pub mod player;
pub mod source;
pub mod visualizer;
