//! Application configuration schema and loader.
//!
//! Stored as YAML.  Default location: `<config dir>/air_piano/config.yaml`
//! (e.g. `~/.config/air_piano/config.yaml` on Linux).  Every field is
//! optional; anything missing takes its default.
//!
//! ```yaml
//! window:
//!   width: 1280
//!   height: 720
//! midi:
//!   port_match: fluid
//!   instrument: 0
//!   note_length_ms: 400
//! tracking:
//!   release_missing: false
//! record_path: session.mid
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use piano_midi::NoteMap;
use press_tracker::TrackerOptions;

use crate::hands::MAX_HANDS;
use crate::player::PlayerSettings;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path:?}: {source}")]
    Read {
        path:   PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

// ════════════════════════════════════════════════════════════════════════════
// Schema
// ════════════════════════════════════════════════════════════════════════════

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub window:   WindowConfig,
    pub midi:     MidiConfig,
    pub tracking: TrackingConfig,
    /// Write the session's notes to this MIDI file on exit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Initial size; the keyboard follows the window when it is resized.
    pub width:     usize,
    pub height:    usize,
    pub resizable: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        WindowConfig {
            width:     1280,
            height:    720,
            resizable: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MidiConfig {
    /// Case-insensitive substring of the output port name to prefer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port_match:        Option<String>,
    /// General MIDI program (0–127).
    pub instrument:        u8,
    /// MIDI channel (0–15).
    pub channel:           u8,
    pub velocity:          u8,
    /// Note sounded by the left keyboard's C.
    pub root_note:         u8,
    /// Octaves added to the right keyboard (0 = both keyboards sound alike).
    pub right_board_shift: i8,
    /// How long each struck note rings before its note-off.
    pub note_length_ms:    u64,
}

impl Default for MidiConfig {
    fn default() -> Self {
        MidiConfig {
            port_match:        None,
            instrument:        0,
            channel:           0,
            velocity:          100,
            root_note:         60,
            right_board_shift: 0,
            note_length_ms:    400,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Treat a fingertip missing from a frame as lifted.
    pub release_missing: bool,
    /// Hands read per frame; extra hands are ignored.
    pub max_hands:       usize,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        TrackingConfig {
            release_missing: false,
            max_hands:       MAX_HANDS,
        }
    }
}

impl AppConfig {
    /// Parse YAML, then clamp out-of-range MIDI values.
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let cfg: AppConfig = serde_yaml::from_str(contents)?;
        Ok(cfg.sanitized())
    }

    fn sanitized(mut self) -> Self {
        self.midi.instrument = self.midi.instrument.min(127);
        self.midi.channel    = self.midi.channel & 0x0F;
        self.midi.velocity   = self.midi.velocity.min(127);
        self.midi.root_note  = self.midi.root_note.min(127);
        self.midi.note_length_ms = self.midi.note_length_ms.max(10);
        self.tracking.max_hands  = self.tracking.max_hands.min(u8::MAX as usize);
        self
    }

    pub fn note_map(&self) -> NoteMap {
        NoteMap {
            root:              self.midi.root_note,
            right_board_shift: self.midi.right_board_shift,
        }
    }

    pub fn tracker_options(&self) -> TrackerOptions {
        TrackerOptions { release_missing: self.tracking.release_missing }
    }

    pub fn player_settings(&self) -> PlayerSettings {
        PlayerSettings {
            port_match:  self.midi.port_match.clone(),
            program:     self.midi.instrument,
            channel:     self.midi.channel,
            note_length: Duration::from_millis(self.midi.note_length_ms),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Loading
// ════════════════════════════════════════════════════════════════════════════

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("air_piano")
        .join("config.yaml")
}

/// Load configuration from a YAML file.
///
/// A missing file is not an error: the defaults are returned.  A file that
/// exists but cannot be read or parsed is.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        log::info!("load_config: {:?} not found, using defaults", path);
        return Ok(AppConfig::default());
    }

    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let cfg = AppConfig::from_yaml(&contents)?;
    log::info!(
        "load_config: loaded {:?} ({}×{}, program {}, port match {:?})",
        path, cfg.window.width, cfg.window.height, cfg.midi.instrument, cfg.midi.port_match
    );
    Ok(cfg)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
