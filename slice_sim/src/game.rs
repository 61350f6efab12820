//! The explicit game-loop object.
//!
//! An outer driver owns the frame schedule and calls [`Game::tick`] with a
//! monotonic millisecond clock. The game converts that into round time,
//! which excludes paused spans, and runs one step:
//!
//! ```text
//!   clock ─▶ combo decay ─▶ integrate ─▶ prune ─▶ spawn ─▶ collide
//! ```
//!
//! Nothing runs unless the round is `Playing`.

use tracing::info;

use blade_tracking::{Hand, Viewport};

use crate::collision;
use crate::config::GameConfig;
use crate::object::{Category, FallingObject, ObjectId};
use crate::round::{Phase, RoundState};
use crate::spawner::Spawner;
use crate::stepper;
use crate::Millis;

/// What happened during one tick, in the order it happened.
#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    Spawned      { id: ObjectId, category: Category },
    Sliced       { id: ObjectId, category: Category, angle: f32, delta: i64, combo: u32 },
    Missed       { id: ObjectId },
    ComboExpired,
    RoundEnded   { score: u32 },
}

// ════════════════════════════════════════════════════════════════════════════
// RoundClock
// ════════════════════════════════════════════════════════════════════════════

/// Maps driver time onto round time.
#[derive(Debug, Default)]
struct RoundClock {
    started_at:   Option<Millis>,
    paused_at:    Option<Millis>,
    paused_total: Millis,
}

impl RoundClock {
    /// Round time at `now`, anchoring the start on first use.
    fn advance(&mut self, now: Millis) -> Millis {
        let start = *self.started_at.get_or_insert(now);
        now.saturating_sub(start).saturating_sub(self.paused_total)
    }

    /// Round time at `now` without anchoring; frozen while paused.
    fn peek(&self, now: Millis) -> Millis {
        let Some(start) = self.started_at else { return 0 };
        let at = self.paused_at.unwrap_or(now);
        at.saturating_sub(start).saturating_sub(self.paused_total)
    }

    fn pause(&mut self, now: Millis) {
        self.paused_at = Some(now);
    }

    fn resume(&mut self, now: Millis) {
        if let Some(at) = self.paused_at.take() {
            if self.started_at.is_some() {
                self.paused_total += now.saturating_sub(at);
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Game
// ════════════════════════════════════════════════════════════════════════════

pub struct Game {
    cfg:      GameConfig,
    viewport: Viewport,
    objects:  Vec<FallingObject>,
    hands:    Vec<Hand>,
    spawner:  Spawner,
    round:    RoundState,
    clock:    RoundClock,
}

impl Game {
    pub fn new(cfg: GameConfig, viewport: Viewport) -> Self {
        Self::with_spawner(cfg, viewport, Spawner::new())
    }

    /// A game whose spawn sequence is fully determined by `seed`.
    pub fn with_seed(cfg: GameConfig, viewport: Viewport, seed: u64) -> Self {
        Self::with_spawner(cfg, viewport, Spawner::seeded(seed))
    }

    fn with_spawner(cfg: GameConfig, viewport: Viewport, spawner: Spawner) -> Self {
        let round = RoundState::new(cfg.round_duration_secs);
        Game {
            cfg,
            viewport,
            objects: Vec::new(),
            hands: Vec::new(),
            spawner,
            round,
            clock: RoundClock::default(),
        }
    }

    /// Run one frame at driver time `now`.
    pub fn tick(&mut self, now: Millis) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if !self.round.is_playing() {
            return events;
        }
        let t = self.clock.advance(now);

        let remaining = stepper::time_remaining(self.cfg.round_duration_secs, t);
        if self.round.update_clock(remaining) {
            info!(score = self.round.score, "round over");
            events.push(GameEvent::RoundEnded { score: self.round.score });
            return events;
        }

        if self.round.expire_combo(t) {
            events.push(GameEvent::ComboExpired);
        }

        stepper::integrate(&mut self.objects, self.cfg.gravity);
        let report = stepper::prune(&mut self.objects, t, self.viewport, &self.cfg);
        for id in report.missed {
            self.round.break_combo();
            events.push(GameEvent::Missed { id });
        }

        if let Some(obj) = self.spawner.maybe_spawn(t, self.viewport, &self.cfg) {
            events.push(GameEvent::Spawned { id: obj.id, category: obj.category });
            self.objects.push(obj);
        }

        let hits = collision::resolve(&mut self.objects, &self.hands, &mut self.round, t, &self.cfg);
        events.extend(hits.into_iter().map(|h| GameEvent::Sliced {
            id:       h.id,
            category: h.category,
            angle:    h.angle,
            delta:    h.delta,
            combo:    h.combo,
        }));
        events
    }

    /// Replace the current hand snapshot. Read by every later tick.
    pub fn set_hands(&mut self, hands: Vec<Hand>) {
        self.hands = hands;
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Toggle `Playing`/`Paused`. Returns the new phase.
    pub fn toggle_pause(&mut self, now: Millis) -> Phase {
        if self.round.toggle_pause() {
            match self.round.phase {
                Phase::Paused => self.clock.pause(now),
                _             => self.clock.resume(now),
            }
            info!(phase = ?self.round.phase, "pause toggled");
        }
        self.round.phase
    }

    /// Start a fresh round. The clock anchors on the next tick.
    pub fn reset(&mut self) {
        self.round = RoundState::new(self.cfg.round_duration_secs);
        self.objects.clear();
        self.hands.clear();
        self.clock = RoundClock::default();
        self.spawner.rewind(0);
        info!(duration = self.cfg.round_duration_secs, "round reset");
    }

    /// Round time at driver time `now`, for slice display windows.
    pub fn round_time(&self, now: Millis) -> Millis { self.clock.peek(now) }

    pub fn round(&self) -> &RoundState { &self.round }
    pub fn objects(&self) -> &[FallingObject] { &self.objects }
    pub fn hands(&self) -> &[Hand] { &self.hands }
    pub fn config(&self) -> &GameConfig { &self.cfg }
    pub fn viewport(&self) -> Viewport { self.viewport }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use blade_tracking::Handedness;
    use glam::{Vec2, Vec3};

    fn quiet() -> GameConfig {
        GameConfig { spawn_interval_min_ms: 100_000, spawn_interval_max_ms: 100_000, ..GameConfig::default() }
    }

    fn eager() -> GameConfig {
        GameConfig {
            spawn_interval_min_ms: 0,
            spawn_interval_max_ms: 0,
            bonus_probability:     0.0,
            hazard_probability:    0.0,
            ..GameConfig::default()
        }
    }

    fn sweeping_hand(y: f32) -> Hand {
        Hand {
            handedness: Handedness::Right,
            palm:       Vec2::new(0.0, y),
            tips:       [Vec2::new(2_000.0, y); 4],
            pointing:   Vec3::X,
            scale:      1.0,
        }
    }

    #[test]
    fn first_tick_anchors_round() {
        let mut g = Game::with_seed(quiet(), Viewport::default(), 1);
        g.tick(5_000);
        assert_eq!(g.round().time_remaining, 60);
        g.tick(6_000);
        assert_eq!(g.round().time_remaining, 59);
    }

    #[test]
    fn round_ends_once_and_stays_ended() {
        let mut g = Game::with_seed(quiet(), Viewport::default(), 1);
        g.tick(0);
        assert!(g.tick(59_999).iter().all(|e| !matches!(e, GameEvent::RoundEnded { .. })));
        assert_eq!(g.tick(60_000), vec![GameEvent::RoundEnded { score: 0 }]);
        assert_eq!(g.round().phase, Phase::Ended);
        assert!(g.tick(61_000).is_empty());
        assert_eq!(g.toggle_pause(62_000), Phase::Ended);
    }

    #[test]
    fn pause_freezes_clock() {
        let mut g = Game::with_seed(quiet(), Viewport::default(), 1);
        g.tick(0);
        g.tick(10_000);
        assert_eq!(g.toggle_pause(10_000), Phase::Paused);
        assert!(g.tick(40_000).is_empty());
        assert_eq!(g.round_time(40_000), 10_000);
        assert_eq!(g.toggle_pause(50_000), Phase::Playing);
        g.tick(51_000);
        assert_eq!(g.round().time_remaining, 49);
        assert_eq!(g.round_time(51_000), 11_000);
    }

    #[test]
    fn objects_freeze_while_paused() {
        let mut g = Game::with_seed(eager(), Viewport::default(), 1);
        g.tick(0);
        g.tick(16);
        let before = g.objects().to_vec();
        g.toggle_pause(16);
        g.tick(32);
        g.tick(48);
        assert_eq!(g.objects(), &before[..]);
    }

    #[test]
    fn spawned_objects_get_sliced_by_hands() {
        let mut g = Game::with_seed(eager(), Viewport::default(), 3);
        g.tick(0);
        let events = g.tick(16);
        assert!(matches!(events[0], GameEvent::Spawned { .. }));
        let y = g.objects()[0].position.y;
        g.set_hands(vec![sweeping_hand(y)]);

        let events = g.tick(32);
        let sliced: Vec<_> = events.iter()
            .filter(|e| matches!(e, GameEvent::Sliced { .. }))
            .collect();
        assert!(!sliced.is_empty());
        assert!(g.round().score >= 10);
    }

    #[test]
    fn reset_restores_fresh_round() {
        let mut g = Game::with_seed(eager(), Viewport::default(), 1);
        g.tick(0);
        g.tick(16);
        g.set_hands(vec![sweeping_hand(100.0)]);
        g.tick(60_000);
        assert_eq!(g.round().phase, Phase::Ended);

        g.reset();
        assert_eq!(g.round().phase, Phase::Playing);
        assert_eq!(g.round().score, 0);
        assert_eq!(g.round().time_remaining, 60);
        assert!(g.objects().is_empty());
        assert!(g.hands().is_empty());

        g.tick(100_000);
        assert_eq!(g.round().time_remaining, 60);
    }

    #[test]
    fn viewport_change_is_used_by_spawner() {
        let mut g = Game::with_seed(eager(), Viewport::default(), 9);
        g.set_viewport(Viewport::new(400.0, 800.0));
        g.tick(0);
        g.tick(16);
        let obj = &g.objects()[0];
        assert_eq!(obj.position.y, 850.0);
        assert!(obj.size < 70.0);
    }
}
