//! Top-level application state machine.
//!
//! `AppState` owns the `Game`, the `BladeModel`, the tracker and audio
//! handles and the scoreboard. It turns tracker samples into hands, turns
//! game events into sound and score submissions, and keeps pause/reset in
//! step across all of them.

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver};
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use blade_tracking::{normalize_all, BladeModel, RawHandSample, Viewport};
use slice_sim::{Game, GameConfig, GameEvent, Millis, Phase};

use crate::audio::{Audio, Cue};
use crate::leaderboard::{LocalScoreBoard, ScoreBoard, ScoreBoardError};
use crate::tracker::{spawn_tracker, PointerSensor, SimInput, TrackerHandle};
use crate::visualizer::{Hud, UiAction, Visualizer};

// ════════════════════════════════════════════════════════════════════════════
// AppConfig
// ════════════════════════════════════════════════════════════════════════════

/// Configuration for the full application.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub game:        GameConfig,
    pub width:       usize,
    pub height:      usize,
    /// Fixed spawn sequence; `None` seeds from entropy.
    pub seed:        Option<u64>,
    /// Signed in (or signed up) before the first round.
    pub player:      Option<String>,
    /// JSON scoreboard file; `None` keeps scores in memory.
    pub leaderboard: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            game:        GameConfig::default(),
            width:       1280,
            height:      720,
            seed:        None,
            player:      None,
            leaderboard: None,
        }
    }
}

impl AppConfig {
    pub fn new_game(&self) -> Game {
        let viewport = Viewport::new(self.width as f32, self.height as f32);
        match self.seed {
            Some(seed) => Game::with_seed(self.game.clone(), viewport, seed),
            None       => Game::new(self.game.clone(), viewport),
        }
    }

    /// Open the configured scoreboard and sign the player in, creating the
    /// profile on first use.
    pub fn open_scoreboard(&self) -> Result<LocalScoreBoard> {
        let mut board = match &self.leaderboard {
            Some(path) => LocalScoreBoard::open(path)
                .with_context(|| format!("failed to open leaderboard {}", path.display()))?,
            None => LocalScoreBoard::in_memory(),
        };
        if let Some(name) = &self.player {
            match board.sign_in(name) {
                Err(ScoreBoardError::UnknownUser(_)) => board.sign_up(name)
                    .with_context(|| format!("failed to create player {name:?}"))?,
                other => other.with_context(|| format!("failed to sign in {name:?}"))?,
            }
        }
        Ok(board)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// AppState
// ════════════════════════════════════════════════════════════════════════════

pub struct AppState {
    game:    Game,
    blades:  BladeModel,
    audio:   Audio,
    tracker: TrackerHandle,
    board:   Box<dyn ScoreBoard>,

    // ── status line ──────────────────────────────────────────────────────
    pub status: String,
}

impl AppState {
    pub fn new(game: Game, audio: Audio, tracker: TrackerHandle, board: Box<dyn ScoreBoard>) -> Self {
        AppState {
            game,
            blades: BladeModel::new(),
            audio,
            tracker,
            board,
            status: String::new(),
        }
    }

    /// Light the blades and start the music for the first round.
    pub fn start(&mut self) {
        self.audio.cue(Cue::Ignition);
        self.audio.play_music();
        info!(duration = self.game.config().round_duration_secs, "round start");
    }

    // ── tracking ──────────────────────────────────────────────────────────

    /// A fresh tracker sample replaces the current hand set.
    pub fn on_samples(&mut self, samples: &[RawHandSample]) {
        let hands = normalize_all(samples, self.game.viewport());
        self.blades.observe(&hands);
        self.game.set_hands(hands);
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        if viewport != self.game.viewport() {
            debug!(width = viewport.width, height = viewport.height, "viewport changed");
            self.game.set_viewport(viewport);
        }
    }

    // ── per-frame tick ────────────────────────────────────────────────────

    pub fn frame(&mut self, now: Millis) {
        for event in self.game.tick(now) {
            self.handle_event(event);
        }
        if self.game.round().phase == Phase::Playing {
            let t = self.game.round_time(now);
            self.blades.record_trail(self.game.hands(), t);
        }
    }

    fn handle_event(&mut self, event: GameEvent) {
        match event {
            GameEvent::Sliced { category, .. } if category.is_hazard() => {
                self.audio.cue(Cue::Hazard);
            }
            GameEvent::Sliced { .. } => self.audio.cue(Cue::Slice),
            GameEvent::Missed { id } => debug!(%id, "missed"),
            GameEvent::ComboExpired  => debug!("combo expired"),
            GameEvent::Spawned { .. } => {}
            GameEvent::RoundEnded { score } => self.finish_round(score),
        }
    }

    fn finish_round(&mut self, score: u32) {
        self.tracker.disable();
        self.audio.pause_music();
        if self.board.current_user().is_none() {
            self.status = "SIGN IN WITH --PLAYER TO SAVE SCORES".to_string();
            return;
        }
        self.status = match self.board.submit_score(score) {
            Ok(true)  => "NEW BEST!".to_string(),
            Ok(false) => String::new(),
            Err(e) => {
                warn!(error = %e, "score submission failed");
                "SCORE NOT SAVED".to_string()
            }
        };
    }

    // ── user actions ──────────────────────────────────────────────────────

    /// Returns false when the app should quit.
    pub fn handle_action(&mut self, action: UiAction, now: Millis) -> bool {
        match action {
            UiAction::TogglePause => match self.game.toggle_pause(now) {
                Phase::Paused => {
                    self.tracker.disable();
                    self.audio.pause_music();
                }
                Phase::Playing => {
                    self.tracker.enable();
                    self.audio.resume_music();
                }
                Phase::Ended => {}
            },
            UiAction::Reset => {
                self.game.reset();
                self.blades.reset();
                self.status.clear();
                self.tracker.enable();
                self.start();
            }
            UiAction::Quit => return false,
        }
        true
    }

    pub fn shutdown(&self) {
        self.tracker.quit();
        self.audio.quit();
    }

    // ── accessors for the render loop ─────────────────────────────────────

    pub fn game(&self)    -> &Game        { &self.game }
    pub fn blades(&self)  -> &BladeModel  { &self.blades }
    pub fn tracker(&self) -> &TrackerHandle { &self.tracker }
    pub fn board(&self)   -> &dyn ScoreBoard { self.board.as_ref() }

    pub fn hud(&self) -> Hud<'_> {
        let user = self.board.current_user();
        Hud {
            player: user.map(|p| p.username.as_str()),
            best:   user.map(|p| p.high_score),
            status: &self.status,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// run(): the main application loop
// ════════════════════════════════════════════════════════════════════════════

/// Pick the tracking sensor: LeapMotion when built with `leap` and a device
/// answers, otherwise the pointer simulator.
fn open_tracker(sim_rx: Receiver<SimInput>) -> TrackerHandle {
    #[cfg(feature = "leap")]
    match crate::tracker::LeapSensor::open() {
        Ok(sensor) => {
            info!("tracking with LeapMotion");
            return spawn_tracker(sensor);
        }
        Err(e) => warn!(error = %e, "LeapMotion unavailable; tracking the mouse pointer"),
    }
    spawn_tracker(PointerSensor::new(sim_rx))
}

/// Run the full application.
///
/// Creates the window, the tracker and audio threads, and drives the
/// event/render loop at ~60 fps until the window closes or `Q` is pressed.
pub fn run(cfg: AppConfig) -> Result<()> {
    let board = cfg.open_scoreboard()?;

    // ── Sim pointer channel ───────────────────────────────────────────────
    let (sim_tx, sim_rx) = mpsc::channel::<SimInput>();
    let tracker = open_tracker(sim_rx);

    let mut vis = Visualizer::new(cfg.width, cfg.height, sim_tx)
        .context("failed to open game window")?;

    let mut app = AppState::new(cfg.new_game(), Audio::spawn(), tracker, Box::new(board));
    app.start();

    let clock = Instant::now();
    'frames: while vis.is_open() {
        let now = clock.elapsed().as_millis() as Millis;

        // 1. Window input
        for action in vis.poll_input() {
            if !app.handle_action(action, now) { break 'frames; }
        }
        app.set_viewport(vis.viewport());

        // 2. Newest tracking sample, if any
        if let Some(samples) = app.tracker().latest() {
            app.on_samples(&samples);
        }

        // 3. Simulation
        app.frame(now);

        // 4. Render
        let t = app.game().round_time(now);
        vis.render(app.game(), app.blades(), t, &app.hud());
    }

    info!(score = app.game().round().score, "exiting");
    app.shutdown();
    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::AudioCommand;
    use crate::tracker::{pointer_hand, TrackerCommand};
    use std::sync::mpsc::Sender;

    struct Rig {
        app:       AppState,
        audio_rx:  Receiver<AudioCommand>,
        track_rx:  Receiver<TrackerCommand>,
        _samples:  Sender<Vec<RawHandSample>>,
    }

    impl Rig {
        fn audio(&self) -> Vec<AudioCommand> { self.audio_rx.try_iter().collect() }
        fn tracking(&self) -> Vec<TrackerCommand> { self.track_rx.try_iter().collect() }
    }

    fn rig_with(cfg: GameConfig, board: LocalScoreBoard) -> Rig {
        let (audio_tx, audio_rx) = mpsc::channel();
        let (cmd_tx, track_rx) = mpsc::channel();
        let (sample_tx, sample_rx) = mpsc::channel();
        let game = Game::with_seed(cfg, Viewport::new(1280.0, 720.0), 5);
        let app = AppState::new(
            game,
            Audio { cmd_tx: audio_tx },
            TrackerHandle { cmd_tx, sample_rx },
            Box::new(board),
        );
        Rig { app, audio_rx, track_rx, _samples: sample_tx }
    }

    fn rig() -> Rig { rig_with(GameConfig::default(), LocalScoreBoard::in_memory()) }

    fn eager() -> GameConfig {
        GameConfig {
            spawn_interval_min_ms: 0,
            spawn_interval_max_ms: 0,
            bonus_probability:     0.0,
            hazard_probability:    0.0,
            ..GameConfig::default()
        }
    }

    #[test]
    fn start_lights_blades_and_music() {
        let mut r = rig();
        r.app.start();
        assert_eq!(r.audio(), vec![AudioCommand::Cue(Cue::Ignition), AudioCommand::PlayMusic]);
    }

    #[test]
    fn pause_stops_tracking_and_music() {
        let mut r = rig();
        r.app.frame(0);
        assert!(r.app.handle_action(UiAction::TogglePause, 100));
        assert_eq!(r.app.game().round().phase, Phase::Paused);
        assert_eq!(r.tracking(), vec![TrackerCommand::Disable]);
        assert_eq!(r.audio(), vec![AudioCommand::PauseMusic]);

        r.app.handle_action(UiAction::TogglePause, 200);
        assert_eq!(r.tracking(), vec![TrackerCommand::Enable]);
        assert_eq!(r.audio(), vec![AudioCommand::ResumeMusic]);
    }

    #[test]
    fn samples_become_hands_and_trails() {
        let mut r = rig();
        r.app.on_samples(&[pointer_hand(0.5, 0.5)]);
        assert_eq!(r.app.game().hands().len(), 1);
        r.app.frame(0);
        r.app.frame(16);
        let h = r.app.game().hands()[0].handedness;
        assert_eq!(r.app.blades().trail_len(h), 2);

        r.app.on_samples(&[pointer_hand(0.6, 0.5)]);
        let swing = r.app.blades().swing(h).unwrap();
        assert!((swing.delta().x - 0.1 * 1280.0).abs() < 1e-2);

        r.app.on_samples(&[]);
        assert!(r.app.game().hands().is_empty());
    }

    #[test]
    fn slicing_plays_slice_cue() {
        let mut r = rig_with(eager(), LocalScoreBoard::in_memory());
        r.app.frame(0);
        r.app.frame(16);
        let obj = r.app.game().objects()[0].clone();
        // Put the index tip right on the object.
        let vp = r.app.game().viewport();
        r.app.on_samples(&[pointer_hand(obj.position.x / vp.width, obj.position.y / vp.height)]);
        r.app.frame(17);
        assert!(r.audio().contains(&AudioCommand::Cue(Cue::Slice)));
        assert!(r.app.game().round().score > 0);
    }

    #[test]
    fn round_end_submits_for_signed_in_player() {
        let mut board = LocalScoreBoard::in_memory();
        board.sign_up("piper").unwrap();
        let mut r = rig_with(eager(), board);
        r.app.frame(0);
        r.app.frame(16);
        let obj = r.app.game().objects()[0].clone();
        let vp = r.app.game().viewport();
        r.app.on_samples(&[pointer_hand(obj.position.x / vp.width, obj.position.y / vp.height)]);
        r.app.frame(17);
        let score = r.app.game().round().score;
        assert!(score > 0);

        r.app.frame(60_000);
        assert_eq!(r.app.game().round().phase, Phase::Ended);
        assert_eq!(r.app.board().current_user().map(|p| p.high_score), Some(score));
        assert_eq!(r.app.status, "NEW BEST!");
        assert!(r.tracking().contains(&TrackerCommand::Disable));
        assert_eq!(r.app.hud().best, Some(score));
    }

    #[test]
    fn round_end_without_player_only_sets_status() {
        let mut r = rig();
        r.app.frame(0);
        r.app.frame(60_000);
        assert!(r.app.status.contains("PLAYER"));
        assert!(r.app.board().top(10).is_empty());
    }

    #[test]
    fn reset_rearms_everything() {
        let mut r = rig();
        r.app.frame(0);
        r.app.frame(60_000);
        r.tracking();
        r.audio();

        assert!(r.app.handle_action(UiAction::Reset, 61_000));
        assert_eq!(r.app.game().round().phase, Phase::Playing);
        assert!(r.app.status.is_empty());
        assert_eq!(r.tracking(), vec![TrackerCommand::Enable]);
        assert_eq!(r.audio(), vec![AudioCommand::Cue(Cue::Ignition), AudioCommand::PlayMusic]);
    }

    #[test]
    fn quit_action_stops_loop() {
        let mut r = rig();
        assert!(!r.app.handle_action(UiAction::Quit, 0));
    }

    #[test]
    fn config_signs_up_unknown_player() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = AppConfig {
            player:      Some("nichochar".into()),
            leaderboard: Some(dir.path().join("scores.json")),
            ..AppConfig::default()
        };
        let board = cfg.open_scoreboard().unwrap();
        assert_eq!(board.current_user().map(|p| p.username.as_str()), Some("nichochar"));

        // Second open finds the saved profile and signs in.
        let again = cfg.open_scoreboard().unwrap();
        assert!(again.current_user().is_some());
    }

    #[test]
    fn config_rejects_invalid_player() {
        let cfg = AppConfig { player: Some("bad name".into()), ..AppConfig::default() };
        assert!(cfg.open_scoreboard().is_err());
    }
}
