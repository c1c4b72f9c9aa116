//! # piano_midi
//!
//! MIDI side of the virtual piano:
//!
//! * [`NoteMap`] — which MIDI note a key of either keyboard sounds;
//! * [`Instrument`] — General MIDI programs that make sense for the piano;
//! * [`SessionRecorder`] — collects the notes struck during a session and
//!   writes them as a Standard MIDI File (Type 0, single track).
//!
//! MIDI bytes are written directly; no external crates are involved.
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use keyboard_layout::{Board, KeyId};
//! use piano_midi::{Instrument, NoteMap, SessionRecorder};
//!
//! let map = NoteMap::default();
//! let mut rec = SessionRecorder::new(Instrument::AcousticGrandPiano, 250);
//! rec.record(Duration::from_millis(0),   map.note_for(KeyId::C, Board::Left), 100);
//! rec.record(Duration::from_millis(400), map.note_for(KeyId::E, Board::Left), 100);
//! rec.write_file("session.mid").unwrap();
//! ```

use std::io::Write;
use std::path::Path;
use std::time::Duration;

use keyboard_layout::{Board, KeyId};

// ════════════════════════════════════════════════════════════════════════════
// Instrument — General MIDI programs offered by the app
// ════════════════════════════════════════════════════════════════════════════

/// General MIDI program numbers (0-indexed, as sent in Program Change).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Instrument {
    AcousticGrandPiano  = 0,
    BrightAcousticPiano = 1,
    ElectricGrandPiano  = 2,
    HonkyTonkPiano      = 3,
    ElectricPiano1      = 4,
    ElectricPiano2      = 5,
    Harpsichord         = 6,
    Clavinet            = 7,
    Celesta             = 8,
    Glockenspiel        = 9,
    MusicBox            = 10,
    Vibraphone          = 11,
    Marimba             = 12,
    Xylophone           = 13,
    DrawbarOrgan        = 16,
    ChurchOrgan         = 19,
    Kalimba             = 108,
    SteelDrums          = 114,
}

impl Instrument {
    pub const ALL: [Instrument; 18] = [
        Instrument::AcousticGrandPiano,
        Instrument::BrightAcousticPiano,
        Instrument::ElectricGrandPiano,
        Instrument::HonkyTonkPiano,
        Instrument::ElectricPiano1,
        Instrument::ElectricPiano2,
        Instrument::Harpsichord,
        Instrument::Clavinet,
        Instrument::Celesta,
        Instrument::Glockenspiel,
        Instrument::MusicBox,
        Instrument::Vibraphone,
        Instrument::Marimba,
        Instrument::Xylophone,
        Instrument::DrawbarOrgan,
        Instrument::ChurchOrgan,
        Instrument::Kalimba,
        Instrument::SteelDrums,
    ];

    /// Raw MIDI program number (0–127).
    pub fn program(self) -> u8 { self as u8 }

    pub fn from_program(program: u8) -> Option<Instrument> {
        Instrument::ALL.iter().copied().find(|i| i.program() == program)
    }

    pub fn name(self) -> &'static str {
        match self {
            Instrument::AcousticGrandPiano  => "Acoustic Grand Piano",
            Instrument::BrightAcousticPiano => "Bright Acoustic Piano",
            Instrument::ElectricGrandPiano  => "Electric Grand Piano",
            Instrument::HonkyTonkPiano      => "Honky-Tonk Piano",
            Instrument::ElectricPiano1      => "Electric Piano 1",
            Instrument::ElectricPiano2      => "Electric Piano 2",
            Instrument::Harpsichord         => "Harpsichord",
            Instrument::Clavinet            => "Clavinet",
            Instrument::Celesta             => "Celesta",
            Instrument::Glockenspiel        => "Glockenspiel",
            Instrument::MusicBox            => "Music Box",
            Instrument::Vibraphone          => "Vibraphone",
            Instrument::Marimba             => "Marimba",
            Instrument::Xylophone           => "Xylophone",
            Instrument::DrawbarOrgan        => "Drawbar Organ",
            Instrument::ChurchOrgan         => "Church Organ",
            Instrument::Kalimba             => "Kalimba",
            Instrument::SteelDrums          => "Steel Drums",
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// NoteMap — key + keyboard → MIDI note number
// ════════════════════════════════════════════════════════════════════════════

/// Maps a struck key to a MIDI note number.
///
/// `note = root + key.semitone() + 12 · right_board_shift` (the shift only
/// applies to the right keyboard), clamped to 0–127.  With the default shift
/// of 0 both keyboards sound the same octave.
///
/// ```rust
/// use keyboard_layout::{Board, KeyId};
/// use piano_midi::NoteMap;
///
/// let map = NoteMap { root: 60, right_board_shift: 1 };
/// assert_eq!(map.note_for(KeyId::C,  Board::Left),  60);
/// assert_eq!(map.note_for(KeyId::Cb, Board::Left),  61);
/// assert_eq!(map.note_for(KeyId::C,  Board::Right), 72);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NoteMap {
    /// MIDI note number of the left keyboard's C.
    pub root: u8,
    /// Octaves added to every key of the right keyboard.
    pub right_board_shift: i8,
}

impl Default for NoteMap {
    fn default() -> Self {
        NoteMap { root: 60, right_board_shift: 0 }
    }
}

impl NoteMap {
    pub fn note_for(&self, key: KeyId, board: Board) -> u8 {
        let shift = match board {
            Board::Left  => 0,
            Board::Right => self.right_board_shift as i32 * 12,
        };
        let note = self.root as i32 + key.semitone() as i32 + shift;
        note.clamp(0, 127) as u8
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SessionRecorder — struck notes → Standard MIDI File
// ════════════════════════════════════════════════════════════════════════════

/// One struck note, `at` measured from the start of the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecordedNote {
    pub at:       Duration,
    pub pitch:    u8,
    pub velocity: u8,
}

/// Accumulates struck notes and serialises them as a Type-0 MIDI file.
///
/// Every note lasts `note_length_ms`; notes struck by different fingers may
/// overlap.
#[derive(Clone, Debug)]
pub struct SessionRecorder {
    pub notes:             Vec<RecordedNote>,
    pub instrument:        u8,
    pub channel:           u8,
    pub note_length_ms:    u64,
    pub tempo_bpm:         u32,
    pub ticks_per_quarter: u16,
    /// Embedded as the track name.
    pub description:       String,
}

impl SessionRecorder {
    /// Defaults: channel 0, 120 BPM, 480 ticks per quarter.
    pub fn new(instrument: Instrument, note_length_ms: u64) -> Self {
        SessionRecorder {
            notes:             Vec::new(),
            instrument:        instrument.program(),
            channel:           0,
            note_length_ms,
            tempo_bpm:         120,
            ticks_per_quarter: 480,
            description:       "air_piano session".to_string(),
        }
    }

    /// Use a raw program number instead of an [`Instrument`].
    pub fn with_program(mut self, program: u8) -> Self {
        self.instrument = program.min(127);
        self
    }

    pub fn with_channel(mut self, channel: u8) -> Self {
        self.channel = channel & 0x0F;
        self
    }

    pub fn record(&mut self, at: Duration, pitch: u8, velocity: u8) {
        self.notes.push(RecordedNote {
            at,
            pitch:    pitch.min(127),
            velocity: velocity.min(127),
        });
    }

    pub fn len(&self) -> usize { self.notes.len() }
    pub fn is_empty(&self) -> bool { self.notes.is_empty() }

    /// Convert a wall-clock offset into MIDI ticks at the recorder's tempo.
    pub fn ms_to_ticks(&self, ms: u64) -> u32 {
        // ticks = ms · tpq · bpm / 60 000
        let ticks = ms
            .saturating_mul(self.ticks_per_quarter as u64)
            .saturating_mul(self.tempo_bpm.max(1) as u64)
            / 60_000;
        ticks.min(u32::MAX as u64) as u32
    }

    /// Serialise to a standard MIDI Type-0 file and write to `path`.
    pub fn write_file(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let bytes = self.to_bytes();
        let mut f = std::fs::File::create(path)?;
        f.write_all(&bytes)
    }

    /// Serialise to a `Vec<u8>` containing a valid MIDI Type-0 file.
    pub fn to_bytes(&self) -> Vec<u8> {
        let track = self.build_track_chunk();

        let mut out = Vec::with_capacity(22 + track.len());
        // MThd  length=6  format=0  ntrks=1  division
        out.extend_from_slice(b"MThd");
        out.extend_from_slice(&6u32.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes());
        out.extend_from_slice(&1u16.to_be_bytes());
        out.extend_from_slice(&self.ticks_per_quarter.to_be_bytes());

        out.extend_from_slice(b"MTrk");
        out.extend_from_slice(&(track.len() as u32).to_be_bytes());
        out.extend_from_slice(&track);
        out
    }

    /// Note on/off messages at absolute ticks, in file order.
    ///
    /// At equal ticks a note-off sorts before a note-on so a key struck
    /// again right as its previous note ends is not cut short.
    fn timeline(&self) -> Vec<(u32, [u8; 3])> {
        let ch  = self.channel & 0x0F;
        let len = self.ms_to_ticks(self.note_length_ms).max(1);

        let mut events: Vec<(u32, u8, [u8; 3])> = Vec::with_capacity(self.notes.len() * 2);
        for n in &self.notes {
            let on = self.ms_to_ticks(n.at.as_millis().min(u64::MAX as u128) as u64);
            events.push((on,                    1, [0x90 | ch, n.pitch, n.velocity]));
            events.push((on.saturating_add(len), 0, [0x80 | ch, n.pitch, 0]));
        }
        events.sort_by_key(|&(tick, order, _)| (tick, order));
        events.into_iter().map(|(tick, _, msg)| (tick, msg)).collect()
    }

    fn build_track_chunk(&self) -> Vec<u8> {
        let mut t: Vec<u8> = Vec::new();
        let ch = self.channel & 0x0F;

        // Tempo
        let micros = 60_000_000u32 / self.tempo_bpm.max(1);
        t.extend_from_slice(&[0x00, 0xFF, 0x51, 0x03]);
        t.extend_from_slice(&micros.to_be_bytes()[1..]);

        // Track name
        let name = self.description.as_bytes();
        t.extend_from_slice(&[0x00, 0xFF, 0x03]);
        write_vlq(&mut t, name.len() as u32);
        t.extend_from_slice(name);

        // Program change
        t.extend_from_slice(&[0x00, 0xC0 | ch, self.instrument]);

        let mut now = 0u32;
        for (tick, msg) in self.timeline() {
            write_vlq(&mut t, tick - now);
            t.extend_from_slice(&msg);
            now = tick;
        }

        // End of track
        t.extend_from_slice(&[0x00, 0xFF, 0x2F, 0x00]);
        t
    }
}

/// Write a MIDI variable-length quantity (VLQ).
fn write_vlq(buf: &mut Vec<u8>, mut value: u32) {
    let mut bytes = [0u8; 5];
    let mut i = 4;
    bytes[i] = (value & 0x7F) as u8;
    value >>= 7;
    while value > 0 {
        i -= 1;
        bytes[i] = ((value & 0x7F) | 0x80) as u8;
        value >>= 7;
    }
    buf.extend_from_slice(&bytes[i..]);
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
