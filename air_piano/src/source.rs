//! Fingertip sources — where each frame's hands come from.
//!
//! The frame loop calls [`HandSource::next_frame`] once per frame and does
//! not care whether the hands come from the simulation window or a replayed
//! trace.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use serde::{Deserialize, Serialize};

use crate::hands::{Hand, NormPoint};

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Failed to read trace {path:?}: {source}")]
    Read {
        path:   PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse trace: {0}")]
    Parse(#[from] serde_yaml::Error),
}

// ════════════════════════════════════════════════════════════════════════════
// HandSource trait
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can deliver one frame's hands at a time.
pub trait HandSource {
    /// Hands visible this frame (possibly none), or `None` once the source
    /// is finished and the loop should stop.
    fn next_frame(&mut self) -> Option<Vec<Hand>>;
}

// ════════════════════════════════════════════════════════════════════════════
// SimHandSource — mouse pointer as a fingertip
// ════════════════════════════════════════════════════════════════════════════

/// Raw input from the simulation window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SimInput {
    /// Fingertip down at this normalized position.
    Pointer { nx: f32, ny: f32 },
    /// Fingertip lifted.
    Lift,
    Quit,
}

/// Translates [`SimInput`] from the window into a single hand whose index
/// fingertip follows the pointer while it is down.
pub struct SimHandSource {
    rx:      Receiver<SimInput>,
    pointer: Option<NormPoint>,
}

impl SimHandSource {
    pub fn new(rx: Receiver<SimInput>) -> Self {
        SimHandSource { rx, pointer: None }
    }
}

/// Create a connected window-side sender and simulated source.
pub fn sim_channel() -> (Sender<SimInput>, SimHandSource) {
    let (tx, rx) = mpsc::channel();
    (tx, SimHandSource::new(rx))
}

impl HandSource for SimHandSource {
    fn next_frame(&mut self) -> Option<Vec<Hand>> {
        loop {
            match self.rx.try_recv() {
                Ok(SimInput::Pointer { nx, ny }) => self.pointer = Some(NormPoint::new(nx, ny)),
                Ok(SimInput::Lift)               => self.pointer = None,
                Ok(SimInput::Quit)               => return None,
                Err(TryRecvError::Empty)         => break,
                Err(TryRecvError::Disconnected)  => return None,
            }
        }
        Some(self.pointer.map(Hand::index_only).into_iter().collect())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ReplayHandSource — recorded trace
// ════════════════════════════════════════════════════════════════════════════

/// A recorded fingertip trace.
///
/// ```yaml
/// frame_width: 1680       # optional, used by --headless
/// frame_height: 720
/// frames:
///   - hands:
///       - tips: [[0.03, 0.7], null, [0.2, 0.8]]
///     repeat: 10          # optional, hold this frame for 10 frames
///   - hands: []
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_width:  Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_height: Option<u32>,
    #[serde(default)]
    pub frames:       Vec<TraceFrame>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TraceFrame {
    #[serde(default)]
    pub hands:  Vec<Hand>,
    #[serde(default = "one")]
    pub repeat: usize,
}

fn one() -> usize { 1 }

impl Trace {
    pub fn from_yaml(contents: &str) -> Result<Self, SourceError> {
        Ok(serde_yaml::from_str(contents)?)
    }

    pub fn load(path: &Path) -> Result<Self, SourceError> {
        let contents = std::fs::read_to_string(path).map_err(|source| SourceError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let trace = Trace::from_yaml(&contents)?;
        log::info!("Loaded trace {:?}: {} frames", path, trace.frame_count());
        Ok(trace)
    }

    /// Total frames after expanding `repeat`.
    pub fn frame_count(&self) -> usize {
        self.frames.iter().map(|f| f.repeat).sum()
    }

    pub fn frame_size(&self) -> Option<(u32, u32)> {
        self.frame_width.zip(self.frame_height)
    }
}

/// Plays a [`Trace`] back one frame per call, then reports the end.
pub struct ReplayHandSource {
    trace:  Trace,
    index:  usize,
    served: usize,
}

impl ReplayHandSource {
    pub fn new(trace: Trace) -> Self {
        ReplayHandSource { trace, index: 0, served: 0 }
    }

    pub fn trace(&self) -> &Trace { &self.trace }
}

impl HandSource for ReplayHandSource {
    fn next_frame(&mut self) -> Option<Vec<Hand>> {
        loop {
            let frame = self.trace.frames.get(self.index)?;
            if self.served < frame.repeat {
                self.served += 1;
                return Some(frame.hands.clone());
            }
            self.index += 1;
            self.served = 0;
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
