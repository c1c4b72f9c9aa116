//! Top-level frame loop.
//!
//! `AppState` owns the press tracker, the current layout and the optional
//! session recorder.  Each frame it takes the hands from a [`HandSource`],
//! turns new key presses into [`Strike`]s, and hands them to the player.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use keyboard_layout::{compute_layout, Board, KeyId, Layout};
use piano_midi::{Instrument, NoteMap, SessionRecorder};
use press_tracker::{hit_test, FingerPoint, PressTracker, Trigger};

use crate::config::AppConfig;
use crate::error::AppError;
use crate::hands::{fingertip_points, Hand, TIP_NAMES};
use crate::player::Player;
use crate::source::{sim_channel, HandSource, ReplayHandSource};
use crate::visualizer::{KeyAction, Visualizer};

/// Simulated frame period used when replaying without a window (~60 fps).
pub const FRAME_PERIOD: Duration = Duration::from_micros(16_667);

// ════════════════════════════════════════════════════════════════════════════
// Strike
// ════════════════════════════════════════════════════════════════════════════

/// A new key press resolved to the MIDI note it sounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Strike {
    pub trigger: Trigger,
    pub pitch:   u8,
}

// ════════════════════════════════════════════════════════════════════════════
// AppState
// ════════════════════════════════════════════════════════════════════════════

pub struct AppState {
    // ── tracking ─────────────────────────────────────────────────────────
    tracker:    PressTracker,
    layout:     Layout,
    points:     Vec<FingerPoint>,
    max_hands:  usize,

    // ── sound ────────────────────────────────────────────────────────────
    note_map:   NoteMap,
    velocity:   u8,
    instrument: u8,
    recorder:   Option<(PathBuf, SessionRecorder)>,
    strikes:    usize,

    // ── status message ───────────────────────────────────────────────────
    last_event: String,
}

/// Table name of a GM program, or its number when it is not in the table.
pub fn instrument_name(program: u8) -> String {
    match Instrument::from_program(program) {
        Some(i) => i.name().to_string(),
        None    => format!("GM program {}", program),
    }
}

impl AppState {
    pub fn new(cfg: &AppConfig, width: u32, height: u32) -> Self {
        let program = cfg.midi.instrument;
        log::info!("Instrument: {}", instrument_name(program));

        let recorder = cfg.record_path.clone().map(|path| {
            let length = cfg.midi.note_length_ms;
            let rec = match Instrument::from_program(program) {
                Some(i) => SessionRecorder::new(i, length),
                None    => SessionRecorder::new(Instrument::AcousticGrandPiano, length).with_program(program),
            };
            (path, rec.with_channel(cfg.midi.channel))
        });

        AppState {
            tracker:    PressTracker::new(cfg.tracker_options()),
            layout:     compute_layout(width, height),
            points:     Vec::new(),
            max_hands:  cfg.tracking.max_hands,
            note_map:   cfg.note_map(),
            velocity:   cfg.midi.velocity,
            instrument: program,
            recorder,
            strikes:    0,
            last_event: "Hold the mouse over a key (or replay a trace)".to_string(),
        }
    }

    pub fn layout(&self) -> &Layout { &self.layout }

    /// Fingertips seen in the last frame, in pixels.
    pub fn points(&self) -> &[FingerPoint] { &self.points }

    pub fn velocity(&self) -> u8 { self.velocity }

    /// Notes struck since the session started.
    pub fn strikes(&self) -> usize { self.strikes }

    pub fn instrument(&self) -> u8 { self.instrument }

    /// Step to the next instrument in the table and return its program.
    /// A program outside the table moves to the first entry.
    pub fn next_instrument(&mut self) -> u8 {
        let next = Instrument::from_program(self.instrument)
            .and_then(|cur| Instrument::ALL.iter().position(|&i| i == cur))
            .map_or(0, |idx| (idx + 1) % Instrument::ALL.len());
        let inst = Instrument::ALL[next];

        self.instrument = inst.program();
        log::info!("Instrument: {}", inst.name());
        self.last_event = format!("instrument: {}", inst.name());
        self.instrument
    }

    /// Status line: the last event, then every finger holding a key.
    pub fn status(&self) -> String {
        let held: Vec<String> = self.tracker.held()
            .map(|(f, k)| {
                let tip = TIP_NAMES.get(f.tip as usize).copied().unwrap_or("tip");
                format!("h{} {} {}", f.hand, tip, k)
            })
            .collect();
        if held.is_empty() {
            self.last_event.clone()
        } else {
            format!("{}   holding: {}", self.last_event, held.join(", "))
        }
    }

    /// Process one frame of hands at frame size `width × height`, `now`
    /// after the start of the session.
    pub fn step(&mut self, width: u32, height: u32, hands: &[Hand], now: Duration) -> Vec<Strike> {
        self.layout = compute_layout(width, height);
        self.points = fingertip_points(hands, width, height, self.max_hands);

        let triggers = self.tracker.process_frame(&self.layout, &self.points);
        let mut out = Vec::with_capacity(triggers.len());

        for trigger in triggers {
            let pitch = self.note_map.note_for(trigger.key, trigger.board);
            let kind  = trigger.key.kind().name();
            log::info!("♪ {} note played ({} key)", trigger.key, kind);

            if let Some((_, rec)) = self.recorder.as_mut() {
                rec.record(now, pitch, self.velocity);
            }
            self.strikes += 1;
            self.last_event = format!(
                "{} note played ({} key, {} keyboard)   notes: {}",
                trigger.key, kind, trigger.board.name(), self.strikes
            );
            out.push(Strike { trigger, pitch });
        }
        out
    }

    /// Keys under a fingertip this frame, for highlighting.
    pub fn active_keys(&self) -> Vec<(KeyId, Board)> {
        let mut keys = Vec::new();
        for p in &self.points {
            if let Some(r) = hit_test(&self.layout, p.x, p.y) {
                if !keys.contains(&(r.id, r.board)) {
                    keys.push((r.id, r.board));
                }
            }
        }
        keys
    }

    /// End the session, writing the recording if one was requested.
    pub fn finish(self) -> Result<(), AppError> {
        let Some((path, rec)) = self.recorder else { return Ok(()) };
        if rec.is_empty() {
            log::warn!("No notes were played; {:?} will hold an empty track", path);
        }
        rec.write_file(&path).map_err(|source| AppError::Record { path: path.clone(), source })?;
        log::info!("Wrote {} notes to {:?}", rec.len(), path);
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// run — windowed session
// ════════════════════════════════════════════════════════════════════════════

/// Open the window and play until it is closed, the user quits, or the
/// replay trace runs out.
pub fn run(cfg: AppConfig, replay: Option<ReplayHandSource>) -> Result<(), AppError> {
    // ── Sim input channel ─────────────────────────────────────────────────
    let (sim_tx, sim_source) = sim_channel();

    // ── Visualizer (owns the window and the sim input sender) ────────────
    let mut vis = Visualizer::new(sim_tx, &cfg.window)?;

    let mut source: Box<dyn HandSource> = match replay {
        Some(r) => Box::new(r),
        None    => Box::new(sim_source),
    };

    let player = Player::spawn(cfg.player_settings());
    let (w, h) = vis.size();
    let mut app = AppState::new(&cfg, w, h);
    let started = Instant::now();

    // ── Main loop ─────────────────────────────────────────────────────────
    while vis.is_open() {
        // 1. Poll window input → SimInput / key commands
        match vis.poll_input() {
            Some(KeyAction::Quit)           => break,
            Some(KeyAction::NextInstrument) => player.set_instrument(app.next_instrument()),
            None                            => {}
        }

        // 2. This frame's hands
        let Some(hands) = source.next_frame() else {
            log::info!("Fingertip source finished");
            break;
        };

        // 3. Per-frame logic
        let (w, h) = vis.size();
        for strike in app.step(w, h, &hands, started.elapsed()) {
            player.strike(strike.pitch, app.velocity());
        }

        // 4. Render
        let active = app.active_keys();
        vis.render(app.layout(), app.points(), &active, &app.status());
    }

    player.all_off();
    drop(player);
    app.finish()
}

// ════════════════════════════════════════════════════════════════════════════
// run_headless — replay without a window
// ════════════════════════════════════════════════════════════════════════════

/// Replay a trace on a simulated frame clock, logging every note.  The frame
/// size comes from the trace, else from the window config.
pub fn run_headless(cfg: AppConfig, mut replay: ReplayHandSource) -> Result<Vec<Strike>, AppError> {
    let (w, h) = replay.trace().frame_size()
        .unwrap_or((cfg.window.width as u32, cfg.window.height as u32));
    log::info!("Headless replay at {}×{}", w, h);

    let mut app = AppState::new(&cfg, w, h);
    let mut strikes = Vec::new();
    let mut frame: u32 = 0;

    while let Some(hands) = replay.next_frame() {
        strikes.extend(app.step(w, h, &hands, FRAME_PERIOD * frame));
        frame += 1;
    }

    log::info!("Replayed {} frames, {} notes", frame, strikes.len());
    app.finish()?;
    Ok(strikes)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
