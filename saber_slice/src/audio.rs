//! Audio collaborator: cue and background-music thread over MIDI.
//!
//! Everything is fire-and-forget: the game sends [`AudioCommand`]s and never
//! waits. When no MIDI port is available the thread runs against a silent
//! output, so the round is never affected by audio trouble.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

// ════════════════════════════════════════════════════════════════════════════
// Commands
// ════════════════════════════════════════════════════════════════════════════

/// A discrete sound effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cue {
    /// Blades light up at round start.
    Ignition,
    /// Any non-hazard slice; one of two variants at random.
    Slice,
    /// A bomb was hit.
    Hazard,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AudioCommand {
    Cue(Cue),
    /// Start the music loop from the top.
    PlayMusic,
    PauseMusic,
    /// Continue the loop where it was paused.
    ResumeMusic,
    /// Terminate the thread.
    Quit,
}

// ════════════════════════════════════════════════════════════════════════════
// SoundOut: abstraction over midir / null (for testing)
// ════════════════════════════════════════════════════════════════════════════

pub trait SoundOut: Send {
    fn program_change(&mut self, channel: u8, program: u8);
    fn note_on(&mut self,  channel: u8, note: u8, velocity: u8);
    fn note_off(&mut self, channel: u8, note: u8);
}

// ── midir backend ─────────────────────────────────────────────────────────

struct MidirOut {
    conn: midir::MidiOutputConnection,
}

impl MidirOut {
    fn send(&mut self, msg: &[u8]) {
        if let Err(e) = self.conn.send(msg) {
            debug!(error = %e, "MIDI send failed");
        }
    }
}

impl SoundOut for MidirOut {
    fn program_change(&mut self, channel: u8, program: u8) {
        self.send(&[0xC0 | (channel & 0x0F), program]);
    }
    fn note_on(&mut self, channel: u8, note: u8, velocity: u8) {
        self.send(&[0x90 | (channel & 0x0F), note, velocity]);
    }
    fn note_off(&mut self, channel: u8, note: u8) {
        self.send(&[0x80 | (channel & 0x0F), note, 0]);
    }
}

// ── null backend (used when no MIDI port is available) ────────────────────

pub struct NullOut;
impl SoundOut for NullOut {
    fn program_change(&mut self, _ch: u8, _p: u8)   {}
    fn note_on(&mut self, _ch: u8, _n: u8, _v: u8)  {}
    fn note_off(&mut self, _ch: u8, _n: u8)          {}
}

/// Open the first MIDI output port, preferring a softsynth.
/// Falls back to [`NullOut`] with a warning if none is usable.
fn open_sound_output() -> Box<dyn SoundOut> {
    let midi_out = match midir::MidiOutput::new("saber_slice") {
        Ok(m)  => m,
        Err(e) => {
            warn!(error = %e, "MIDI init failed; audio disabled");
            return Box::new(NullOut);
        }
    };

    let ports = midi_out.ports();
    if ports.is_empty() {
        warn!("no MIDI output ports found; audio disabled (try `timidity -iA` or `fluidsynth`)");
        return Box::new(NullOut);
    }

    let port_idx = ports.iter()
        .position(|p| {
            midi_out.port_name(p).map(|n| {
                let n = n.to_lowercase();
                n.contains("fluid") || n.contains("timidity") ||
                n.contains("microsoft") || n.contains("synth")
            }).unwrap_or(false)
        })
        .unwrap_or(0);

    let port = &ports[port_idx];
    let name = midi_out.port_name(port).unwrap_or_else(|_| "unknown".to_string());

    match midi_out.connect(port, "saber-slice-out") {
        Ok(conn) => {
            info!(port = %name, "MIDI output open");
            Box::new(MidirOut { conn })
        }
        Err(e) => {
            warn!(port = %name, error = %e, "MIDI connect failed; audio disabled");
            Box::new(NullOut)
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Sound design
// ════════════════════════════════════════════════════════════════════════════

const CUE_CHANNEL:   u8 = 0;
const MUSIC_CHANNEL: u8 = 1;
const CUE_PROGRAM:   u8 = 81;   // Lead 2 (sawtooth)
const MUSIC_PROGRAM: u8 = 38;   // Synth Bass 1

/// `(offset_ms, note, length_ms, velocity)`
type Phrase = &'static [(u64, u8, u64, u8)];

const IGNITION: Phrase = &[(0, 48, 260, 90), (60, 55, 220, 90), (120, 60, 200, 95), (180, 67, 320, 100)];
const SLICE_A:  Phrase = &[(0, 84, 80, 110), (30, 91, 60, 90)];
const SLICE_B:  Phrase = &[(0, 88, 70, 110), (25, 95, 50, 90)];
const HAZARD:   Phrase = &[(0, 36, 420, 127), (0, 37, 420, 120), (90, 30, 500, 120)];

const MUSIC_STEP_MS:  u64 = 214;    // eighth notes at 140 BPM
const MUSIC_GATE_MS:  u64 = 180;
const MUSIC_VELOCITY: u8  = 70;
const MUSIC_PATTERN: [u8; 8] = [45, 45, 52, 45, 48, 45, 52, 50];

// ════════════════════════════════════════════════════════════════════════════
// Mixer: pure scheduling, driven with explicit time
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq)]
enum Midi {
    On  { channel: u8, note: u8, velocity: u8 },
    Off { channel: u8, note: u8 },
}

#[derive(Debug)]
struct Scheduled {
    at:  u64,
    msg: Midi,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Music {
    Stopped,
    Playing { step: usize, next_at: u64 },
    Paused  { step: usize },
}

/// Pending MIDI messages and the music loop position, in ms since start.
struct Mixer {
    queue:    Vec<Scheduled>,
    music:    Music,
    sounding: Option<u8>,
    rng:      StdRng,
}

impl Mixer {
    fn new(rng: StdRng) -> Self {
        Mixer { queue: Vec::new(), music: Music::Stopped, sounding: None, rng }
    }

    fn init(&self, out: &mut dyn SoundOut) {
        out.program_change(CUE_CHANNEL, CUE_PROGRAM);
        out.program_change(MUSIC_CHANNEL, MUSIC_PROGRAM);
    }

    fn handle(&mut self, cmd: AudioCommand, now: u64, out: &mut dyn SoundOut) {
        match cmd {
            AudioCommand::Cue(cue) => {
                let phrase = match cue {
                    Cue::Ignition => IGNITION,
                    Cue::Hazard   => HAZARD,
                    Cue::Slice if self.rng.gen_bool(0.5) => SLICE_A,
                    Cue::Slice    => SLICE_B,
                };
                self.schedule(phrase, now);
            }
            AudioCommand::PlayMusic => {
                self.silence_music(out);
                self.music = Music::Playing { step: 0, next_at: now };
            }
            AudioCommand::PauseMusic => {
                if let Music::Playing { step, .. } = self.music {
                    self.silence_music(out);
                    self.music = Music::Paused { step };
                }
            }
            AudioCommand::ResumeMusic => {
                if let Music::Paused { step } = self.music {
                    self.music = Music::Playing { step, next_at: now };
                }
            }
            AudioCommand::Quit => {}
        }
    }

    fn schedule(&mut self, phrase: Phrase, now: u64) {
        for &(offset, note, len, velocity) in phrase {
            let at = now + offset;
            self.queue.push(Scheduled { at, msg: Midi::On { channel: CUE_CHANNEL, note, velocity } });
            self.queue.push(Scheduled { at: at + len, msg: Midi::Off { channel: CUE_CHANNEL, note } });
        }
    }

    /// Emit everything due at `now`.
    fn advance(&mut self, now: u64, out: &mut dyn SoundOut) {
        if let Music::Playing { step, next_at } = self.music {
            if now >= next_at {
                let note = MUSIC_PATTERN[step % MUSIC_PATTERN.len()];
                self.silence_music(out);
                out.note_on(MUSIC_CHANNEL, note, MUSIC_VELOCITY);
                self.sounding = Some(note);
                self.queue.push(Scheduled { at: now + MUSIC_GATE_MS, msg: Midi::Off { channel: MUSIC_CHANNEL, note } });
                self.music = Music::Playing { step: step + 1, next_at: next_at + MUSIC_STEP_MS };
            }
        }

        // Stable sort keeps each note-on ahead of its note-off at equal times.
        self.queue.sort_by_key(|s| s.at);
        let due = self.queue.partition_point(|s| s.at <= now);
        for s in self.queue.drain(..due) {
            match s.msg {
                Midi::On  { channel, note, velocity } => out.note_on(channel, note, velocity),
                Midi::Off { channel, note } => {
                    if channel == MUSIC_CHANNEL && self.sounding == Some(note) {
                        self.sounding = None;
                    }
                    out.note_off(channel, note);
                }
            }
        }
    }

    fn silence_music(&mut self, out: &mut dyn SoundOut) {
        if let Some(note) = self.sounding.take() {
            out.note_off(MUSIC_CHANNEL, note);
        }
        self.queue.retain(|s| !matches!(s.msg, Midi::Off { channel: MUSIC_CHANNEL, .. }));
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Audio: the playback thread
// ════════════════════════════════════════════════════════════════════════════

/// Handle to the audio thread.
pub struct Audio {
    pub cmd_tx: Sender<AudioCommand>,
}

impl Audio {
    /// Spawn the audio thread on the first usable MIDI port.
    pub fn spawn() -> Self {
        Self::spawn_with(open_sound_output)
    }

    /// Spawn with an explicit output, e.g. [`NullOut`] for a silent run.
    pub fn spawn_with<F>(open: F) -> Self
    where
        F: FnOnce() -> Box<dyn SoundOut> + Send + 'static,
    {
        let (cmd_tx, cmd_rx) = mpsc::channel::<AudioCommand>();
        thread::spawn(move || audio_thread(open(), cmd_rx));
        Audio { cmd_tx }
    }

    pub fn cue(&self, cue: Cue) { self.send(AudioCommand::Cue(cue)); }
    pub fn play_music(&self)    { self.send(AudioCommand::PlayMusic); }
    pub fn pause_music(&self)   { self.send(AudioCommand::PauseMusic); }
    pub fn resume_music(&self)  { self.send(AudioCommand::ResumeMusic); }
    pub fn quit(&self)          { self.send(AudioCommand::Quit); }

    fn send(&self, cmd: AudioCommand) {
        if self.cmd_tx.send(cmd).is_err() {
            debug!(?cmd, "audio thread gone; dropping command");
        }
    }
}

fn audio_thread(mut out: Box<dyn SoundOut>, cmd_rx: Receiver<AudioCommand>) {
    let start = Instant::now();
    let mut mixer = Mixer::new(StdRng::from_entropy());
    mixer.init(out.as_mut());

    loop {
        let now = start.elapsed().as_millis() as u64;

        // ── drain commands ────────────────────────────────────────────────
        loop {
            match cmd_rx.try_recv() {
                Ok(AudioCommand::Quit) | Err(TryRecvError::Disconnected) => {
                    mixer.handle(AudioCommand::PauseMusic, now, out.as_mut());
                    mixer.advance(u64::MAX, out.as_mut());
                    return;
                }
                Ok(cmd) => mixer.handle(cmd, now, out.as_mut()),
                Err(TryRecvError::Empty) => break,
            }
        }

        mixer.advance(now, out.as_mut());
        thread::sleep(Duration::from_millis(5));
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    /// Records `(kind, channel, note)` with kind 'p', '+' or '-'.
    #[derive(Default)]
    struct Recording(Vec<(char, u8, u8)>);

    impl SoundOut for Recording {
        fn program_change(&mut self, channel: u8, program: u8) { self.0.push(('p', channel, program)); }
        fn note_on(&mut self, channel: u8, note: u8, _v: u8)    { self.0.push(('+', channel, note)); }
        fn note_off(&mut self, channel: u8, note: u8)           { self.0.push(('-', channel, note)); }
    }

    fn mixer() -> Mixer { Mixer::new(StdRng::seed_from_u64(3)) }

    fn balanced(rec: &Recording, channel: u8) -> bool {
        let on  = rec.0.iter().filter(|e| e.0 == '+' && e.1 == channel).count();
        let off = rec.0.iter().filter(|e| e.0 == '-' && e.1 == channel).count();
        on == off
    }

    #[test]
    fn ignition_plays_its_phrase_in_order() {
        let mut m = mixer();
        let mut rec = Recording::default();
        m.handle(AudioCommand::Cue(Cue::Ignition), 1_000, &mut rec);
        m.advance(1_000, &mut rec);
        assert_eq!(rec.0, vec![('+', CUE_CHANNEL, 48)]);
        m.advance(1_200, &mut rec);
        let ons: Vec<u8> = rec.0.iter().filter(|e| e.0 == '+').map(|e| e.2).collect();
        assert_eq!(ons, vec![48, 55, 60, 67]);
        m.advance(2_000, &mut rec);
        assert!(balanced(&rec, CUE_CHANNEL));
        assert!(m.queue.is_empty());
    }

    #[test]
    fn slice_uses_one_of_two_variants() {
        let mut seen = std::collections::HashSet::new();
        let mut m = mixer();
        for i in 0..40 {
            let mut rec = Recording::default();
            m.handle(AudioCommand::Cue(Cue::Slice), i * 1_000, &mut rec);
            m.advance(i * 1_000, &mut rec);
            let first_on = rec.0.iter().find(|e| e.0 == '+').map(|e| e.2);
            seen.extend(first_on);
        }
        assert_eq!(seen, [84u8, 88].into_iter().collect());
    }

    #[test]
    fn music_loops_pauses_and_resumes() {
        let mut m = mixer();
        let mut rec = Recording::default();
        m.handle(AudioCommand::PlayMusic, 0, &mut rec);
        for t in (0..=MUSIC_STEP_MS * 2 + 2).step_by(5) { m.advance(t, &mut rec); }
        let played: Vec<u8> = rec.0.iter().filter(|e| e.0 == '+').map(|e| e.2).collect();
        assert_eq!(played, MUSIC_PATTERN[..3].to_vec());

        m.handle(AudioCommand::PauseMusic, 450, &mut rec);
        assert!(balanced(&rec, MUSIC_CHANNEL));
        let before = rec.0.len();
        for t in (450..5_000).step_by(5) { m.advance(t, &mut rec); }
        assert_eq!(rec.0.len(), before);

        m.handle(AudioCommand::ResumeMusic, 5_000, &mut rec);
        m.advance(5_000, &mut rec);
        assert_eq!(rec.0.last(), Some(&('+', MUSIC_CHANNEL, MUSIC_PATTERN[3])));
    }

    #[test]
    fn resume_without_pause_is_ignored() {
        let mut m = mixer();
        let mut rec = Recording::default();
        m.handle(AudioCommand::ResumeMusic, 0, &mut rec);
        m.advance(1_000, &mut rec);
        assert!(rec.0.is_empty());
    }

    #[test]
    fn null_thread_accepts_commands_and_quits() {
        let audio = Audio::spawn_with(|| Box::new(NullOut));
        audio.cue(Cue::Ignition);
        audio.play_music();
        audio.pause_music();
        audio.quit();
        // Sending after quit is swallowed.
        thread::sleep(Duration::from_millis(30));
        audio.cue(Cue::Slice);
    }
}
