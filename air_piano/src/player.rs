//! Real-time MIDI output thread.
//!
//! Each struck key becomes a note-on sent to the chosen MIDI output port and a
//! note-off scheduled `note_length` later.  The frame loop never blocks on
//! MIDI: it only pushes commands down a channel.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

// ════════════════════════════════════════════════════════════════════════════
// PlayerCommand — sent to the output thread
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerCommand {
    /// Sound `pitch` now; it is released after the configured note length.
    Strike { pitch: u8, velocity: u8 },
    /// Change instrument (MIDI program 0–127).
    SetInstrument(u8),
    /// Release every sounding note immediately.
    AllOff,
    /// Release everything and terminate the thread.
    Quit,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerSettings {
    /// Case-insensitive substring of the preferred output port's name.
    pub port_match:  Option<String>,
    pub program:     u8,
    pub channel:     u8,
    pub note_length: Duration,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        PlayerSettings {
            port_match:  None,
            program:     0,
            channel:     0,
            note_length: Duration::from_millis(400),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// MidiOut — abstraction over midir / null (for testing)
// ════════════════════════════════════════════════════════════════════════════

trait MidiOut: Send {
    fn program_change(&mut self, channel: u8, program: u8);
    fn note_on(&mut self,  channel: u8, note: u8, velocity: u8);
    fn note_off(&mut self, channel: u8, note: u8);
}

// ── midir backend ─────────────────────────────────────────────────────────

struct MidirOut {
    conn: midir::MidiOutputConnection,
}

impl MidiOut for MidirOut {
    fn program_change(&mut self, channel: u8, program: u8) {
        self.send(&[0xC0 | (channel & 0x0F), program & 0x7F]);
    }
    fn note_on(&mut self, channel: u8, note: u8, velocity: u8) {
        self.send(&[0x90 | (channel & 0x0F), note & 0x7F, velocity & 0x7F]);
    }
    fn note_off(&mut self, channel: u8, note: u8) {
        self.send(&[0x80 | (channel & 0x0F), note & 0x7F, 0]);
    }
}

impl MidirOut {
    fn send(&mut self, msg: &[u8]) {
        if let Err(e) = self.conn.send(msg) {
            log::warn!("MIDI send failed: {}", e);
        }
    }
}

// ── null backend (used when no MIDI port is available) ────────────────────

struct NullOut;
impl MidiOut for NullOut {
    fn program_change(&mut self, _ch: u8, _p: u8)   {}
    fn note_on(&mut self, _ch: u8, _n: u8, _v: u8)  {}
    fn note_off(&mut self, _ch: u8, _n: u8)          {}
}

// ════════════════════════════════════════════════════════════════════════════
// open_midi_output — enumerate ports and pick one
// ════════════════════════════════════════════════════════════════════════════

const SOFT_SYNTH_HINTS: [&str; 5] = ["fluid", "timidity", "microsoft", "gm", "synth"];

/// Index of the port to open: the first whose name contains `port_match`,
/// else the first that looks like a soft synth, else port 0.
fn choose_port(names: &[String], port_match: Option<&str>) -> Option<usize> {
    if names.is_empty() {
        return None;
    }
    let lowered: Vec<String> = names.iter().map(|n| n.to_lowercase()).collect();

    if let Some(wanted) = port_match.map(str::to_lowercase).filter(|w| !w.is_empty()) {
        match lowered.iter().position(|n| n.contains(&wanted)) {
            Some(i) => return Some(i),
            None    => log::warn!("No MIDI port matches {:?}", wanted),
        }
    }

    lowered.iter()
        .position(|n| SOFT_SYNTH_HINTS.iter().any(|h| n.contains(h)))
        .or(Some(0))
}

/// Open the preferred MIDI output port, falling back to `NullOut` with a
/// warning when there is none.
fn open_midi_output(port_match: Option<&str>) -> Box<dyn MidiOut> {
    let midi_out = match midir::MidiOutput::new("air_piano") {
        Ok(m)  => m,
        Err(e) => {
            log::warn!("MIDI init error: {}; notes will be silent", e);
            return Box::new(NullOut);
        }
    };

    let ports = midi_out.ports();
    let names: Vec<String> = ports.iter()
        .map(|p| midi_out.port_name(p).unwrap_or_else(|_| "Unknown".to_string()))
        .collect();

    let Some(idx) = choose_port(&names, port_match) else {
        log::warn!("No MIDI output ports found; notes will be silent.");
        log::warn!("Start a MIDI synthesiser such as `fluidsynth` or `timidity -iA`.");
        return Box::new(NullOut);
    };

    log::info!("Opening MIDI port: {}", names[idx]);
    match midi_out.connect(&ports[idx], "air-piano-out") {
        Ok(conn) => Box::new(MidirOut { conn }),
        Err(e) => {
            log::warn!("Failed to connect to {}: {}; notes will be silent", names[idx], e);
            Box::new(NullOut)
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// PendingOffs — note-off schedule
// ════════════════════════════════════════════════════════════════════════════

/// Sounding notes and when each is due to be released.  At most one entry
/// per pitch: striking a sounding pitch again moves its deadline.
#[derive(Debug, Default)]
struct PendingOffs {
    entries: Vec<(u8, Instant)>,
}

impl PendingOffs {
    fn schedule(&mut self, pitch: u8, at: Instant) {
        match self.entries.iter_mut().find(|(p, _)| *p == pitch) {
            Some(entry) => entry.1 = at,
            None        => self.entries.push((pitch, at)),
        }
    }

    fn is_sounding(&self, pitch: u8) -> bool {
        self.entries.iter().any(|(p, _)| *p == pitch)
    }

    /// Remove and return every pitch due at or before `now`.
    fn take_due(&mut self, now: Instant) -> Vec<u8> {
        let mut due = Vec::new();
        self.entries.retain(|&(p, at)| {
            if at <= now { due.push(p); false } else { true }
        });
        due
    }

    fn take_all(&mut self) -> Vec<u8> {
        self.entries.drain(..).map(|(p, _)| p).collect()
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.entries.iter().map(|&(_, at)| at).min()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Player — handle to the output thread
// ════════════════════════════════════════════════════════════════════════════

/// Handle to the MIDI output thread.  Dropping it releases every sounding
/// note and joins the thread.
pub struct Player {
    cmd_tx: Sender<PlayerCommand>,
    handle: Option<JoinHandle<()>>,
}

impl Player {
    /// Spawn the output thread; the MIDI port is opened on that thread.
    pub fn spawn(settings: PlayerSettings) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel::<PlayerCommand>();
        let handle = thread::spawn(move || {
            let midi = open_midi_output(settings.port_match.as_deref());
            player_thread(midi, settings, cmd_rx);
        });
        Player { cmd_tx, handle: Some(handle) }
    }

    #[cfg(test)]
    fn with_output(midi: Box<dyn MidiOut>, settings: PlayerSettings) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel::<PlayerCommand>();
        let handle = thread::spawn(move || player_thread(midi, settings, cmd_rx));
        Player { cmd_tx, handle: Some(handle) }
    }

    pub fn strike(&self, pitch: u8, velocity: u8) {
        self.send(PlayerCommand::Strike { pitch, velocity });
    }

    pub fn set_instrument(&self, program: u8) {
        self.send(PlayerCommand::SetInstrument(program));
    }

    pub fn all_off(&self) { self.send(PlayerCommand::AllOff); }

    fn send(&self, cmd: PlayerCommand) {
        if self.cmd_tx.send(cmd).is_err() {
            log::warn!("MIDI thread has stopped; dropping {:?}", cmd);
        }
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(PlayerCommand::Quit);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("MIDI thread panicked");
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// player_thread — the actual loop
// ════════════════════════════════════════════════════════════════════════════

/// Longest the thread waits for a command when nothing is sounding.
const IDLE_WAIT: Duration = Duration::from_millis(100);

fn player_thread(
    mut midi:     Box<dyn MidiOut>,
    settings:     PlayerSettings,
    cmd_rx:       Receiver<PlayerCommand>,
) {
    let channel = settings.channel & 0x0F;
    let mut pending = PendingOffs::default();

    midi.program_change(channel, settings.program);

    loop {
        let wait = pending.next_deadline()
            .map(|at| at.saturating_duration_since(Instant::now()))
            .unwrap_or(IDLE_WAIT);

        match cmd_rx.recv_timeout(wait) {
            Ok(PlayerCommand::Strike { pitch, velocity }) => {
                // retrigger: a sounding pitch is released before it restarts
                if pending.is_sounding(pitch) {
                    midi.note_off(channel, pitch);
                }
                midi.note_on(channel, pitch, velocity);
                pending.schedule(pitch, Instant::now() + settings.note_length);
            }
            Ok(PlayerCommand::SetInstrument(p)) => {
                midi.program_change(channel, p);
            }
            Ok(PlayerCommand::AllOff) => {
                for pitch in pending.take_all() {
                    midi.note_off(channel, pitch);
                }
            }
            Ok(PlayerCommand::Quit) | Err(RecvTimeoutError::Disconnected) => {
                for pitch in pending.take_all() {
                    midi.note_off(channel, pitch);
                }
                return;
            }
            Err(RecvTimeoutError::Timeout) => {}
        }

        for pitch in pending.take_due(Instant::now()) {
            midi.note_off(channel, pitch);
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
