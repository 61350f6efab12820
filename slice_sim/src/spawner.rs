//! Object Spawner: decides once per tick whether to launch a new object.
//!
//! Per call:
//!
//! 1. **Gate**: a threshold is drawn from `[spawn_interval_min, max)`; the
//!    call does nothing unless the time since the last spawn exceeds it.
//!    Passing the gate stamps `last_spawn` immediately.
//! 2. **Category**, in priority order: bonus (only after the bonus cooldown,
//!    then with `bonus_probability`), else hazard (`hazard_probability`),
//!    else a uniformly chosen common kind.
//! 3. **Kinematics**: x uniform between the edge margins, y just below the
//!    bottom edge, a small signed vx, a strong upward vy, and a random spin.
//!    Narrow screens use the slower, smaller [`LaunchProfile`].

use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use blade_tracking::Viewport;

use crate::config::{GameConfig, LaunchProfile};
use crate::object::{Category, CommonKind, FallingObject, ObjectId};
use crate::Millis;

pub struct Spawner {
    last_spawn_ms: Millis,
    last_bonus_ms: Millis,
    next_id:       u64,
    rng:           StdRng,
}

impl Spawner {
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Deterministic spawner for replays and tests.
    pub fn seeded(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Spawner { last_spawn_ms: 0, last_bonus_ms: 0, next_id: 1, rng }
    }

    /// Re-anchor both timers, e.g. at the start of a new round.
    /// Ids keep counting so they stay unique across rounds.
    pub fn rewind(&mut self, now: Millis) {
        self.last_spawn_ms = now;
        self.last_bonus_ms = now;
    }

    pub fn last_spawn_ms(&self) -> Millis { self.last_spawn_ms }
    pub fn last_bonus_ms(&self) -> Millis { self.last_bonus_ms }

    pub fn maybe_spawn(
        &mut self,
        now:      Millis,
        viewport: Viewport,
        cfg:      &GameConfig,
    ) -> Option<FallingObject> {
        // ── 1. gate ───────────────────────────────────────────────────────
        let span = cfg.spawn_interval_max_ms.saturating_sub(cfg.spawn_interval_min_ms) as f64;
        let threshold = cfg.spawn_interval_min_ms as f64 + self.rng.gen::<f64>() * span;
        let elapsed = now.saturating_sub(self.last_spawn_ms) as f64;
        if elapsed <= threshold {
            return None;
        }
        self.last_spawn_ms = now;

        // ── 2. category ───────────────────────────────────────────────────
        let bonus = now.saturating_sub(self.last_bonus_ms) > cfg.bonus_cooldown_ms
            && self.rng.gen::<f64>() < cfg.bonus_probability;
        let category = if bonus {
            self.last_bonus_ms = now;
            Category::Bonus
        } else if self.rng.gen::<f64>() < cfg.hazard_probability {
            Category::Hazard
        } else {
            let kind = CommonKind::ALL[self.rng.gen_range(0..CommonKind::ALL.len())];
            Category::Common(kind)
        };

        // ── 3. kinematics ─────────────────────────────────────────────────
        let profile = cfg.profile(viewport.is_narrow());
        let size = self.size_for(category, profile);

        let usable = (viewport.width - 2.0 * cfg.spawn_edge_margin).max(0.0);
        let position = Vec2::new(
            cfg.spawn_edge_margin + self.unit() * usable,
            viewport.height + cfg.spawn_depth,
        );
        let velocity = Vec2::new(
            (self.unit() - 0.5) * profile.vx_spread,
            profile.vy_base - self.unit() * profile.vy_spread,
        );
        let spin = (self.unit() - 0.5) * cfg.rotation_spread;

        let id = ObjectId(self.next_id);
        self.next_id += 1;

        debug!(%id, kind = category.name(), x = position.x, vy = velocity.y, size, "spawn");
        Some(FallingObject::new(id, category, position, velocity, size).with_rotation_rate(spin))
    }

    fn size_for(&mut self, category: Category, profile: &LaunchProfile) -> f32 {
        match category {
            Category::Bonus     => profile.bonus_size,
            Category::Hazard    => profile.hazard_size,
            Category::Common(_) => profile.common_size_min + self.unit() * profile.common_size_span,
        }
    }

    #[inline]
    fn unit(&mut self) -> f32 { self.rng.gen::<f32>() }
}

impl Default for Spawner {
    fn default() -> Self { Self::new() }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn always_common() -> GameConfig {
        GameConfig {
            spawn_interval_min_ms: 0,
            spawn_interval_max_ms: 0,
            bonus_probability:     0.0,
            hazard_probability:    0.0,
            ..GameConfig::default()
        }
    }

    #[test]
    fn nothing_before_minimum_interval() {
        let cfg = GameConfig::default();
        let mut sp = Spawner::seeded(1);
        for t in (0..=1_000).step_by(16) {
            assert!(sp.maybe_spawn(t, Viewport::default(), &cfg).is_none(), "spawned at {t}");
        }
    }

    #[test]
    fn something_after_maximum_interval() {
        let cfg = GameConfig::default();
        let mut sp = Spawner::seeded(2);
        assert!(sp.maybe_spawn(2_501, Viewport::default(), &cfg).is_some());
        assert_eq!(sp.last_spawn_ms(), 2_501);
    }

    #[test]
    fn forced_gate_spawns_common_within_margins() {
        let cfg = always_common();
        let vp = Viewport::new(800.0, 600.0);
        let mut sp = Spawner::seeded(3);
        let mut ids = Vec::new();
        for t in 1..=200 {
            let obj = sp.maybe_spawn(t, vp, &cfg).expect("gate forced open");
            assert!(matches!(obj.category, Category::Common(_)));
            assert!(obj.position.x >= 50.0 && obj.position.x <= 750.0, "x={}", obj.position.x);
            assert_eq!(obj.position.y, 650.0);
            assert!(obj.velocity.y < 0.0);
            assert!(obj.velocity.x.abs() <= 1.0);
            assert!((70.0..100.0).contains(&obj.size));
            assert!(!obj.is_sliced());
            ids.push(obj.id);
        }
        ids.dedup();
        assert_eq!(ids.len(), 200);
    }

    #[test]
    fn partial_narrow_override_keeps_phone_tuning() {
        let json = r#"{ "spawn_interval_min_ms": 0, "spawn_interval_max_ms": 0,
                        "bonus_probability": 0.0, "hazard_probability": 0.0,
                        "narrow": { "bonus_size": 70.0 } }"#;
        let cfg = GameConfig::from_json_str(json).unwrap();
        let phone = Viewport::new(390.0, 844.0);
        let mut sp = Spawner::seeded(6);
        for t in 1..=100 {
            let obj = sp.maybe_spawn(t, phone, &cfg).unwrap();
            assert!((50.0..70.0).contains(&obj.size), "size={}", obj.size);
            assert!(obj.velocity.y <= -6.0 && obj.velocity.y > -10.0, "vy={}", obj.velocity.y);
        }
    }

    #[test]
    fn same_tick_twice_does_not_double_spawn() {
        let cfg = always_common();
        let mut sp = Spawner::seeded(4);
        assert!(sp.maybe_spawn(10, Viewport::default(), &cfg).is_some());
        assert!(sp.maybe_spawn(10, Viewport::default(), &cfg).is_none());
    }

    #[test]
    fn bonus_waits_for_cooldown() {
        let cfg = GameConfig { bonus_probability: 1.0, ..always_common() };
        let vp = Viewport::default();
        let mut sp = Spawner::seeded(5);
        assert!(matches!(sp.maybe_spawn(5_000, vp, &cfg).unwrap().category, Category::Common(_)));
        assert!(matches!(sp.maybe_spawn(10_000, vp, &cfg).unwrap().category, Category::Common(_)));
        let bonus = sp.maybe_spawn(10_001, vp, &cfg).unwrap();
        assert_eq!(bonus.category, Category::Bonus);
        assert_eq!(bonus.size, 80.0);
        assert_eq!(sp.last_bonus_ms(), 10_001);
        assert!(matches!(sp.maybe_spawn(10_002, vp, &cfg).unwrap().category, Category::Common(_)));
    }

    #[test]
    fn bonus_takes_priority_over_hazard() {
        let cfg = GameConfig { bonus_probability: 1.0, hazard_probability: 1.0, ..always_common() };
        let mut sp = Spawner::seeded(6);
        let vp = Viewport::default();
        assert_eq!(sp.maybe_spawn(10_001, vp, &cfg).unwrap().category, Category::Bonus);
        assert_eq!(sp.maybe_spawn(10_002, vp, &cfg).unwrap().category, Category::Hazard);
    }

    #[test]
    fn narrow_screens_get_smaller_slower_objects() {
        let cfg = GameConfig { hazard_probability: 1.0, ..always_common() };
        let mut sp = Spawner::seeded(7);
        let phone = Viewport::new(390.0, 844.0);
        let bomb = sp.maybe_spawn(1, phone, &cfg).unwrap();
        assert_eq!(bomb.category, Category::Hazard);
        assert_eq!(bomb.size, 45.0);
        assert!(bomb.velocity.y <= -6.0 && bomb.velocity.y > -10.0);

        let cfg = always_common();
        for t in 2..50 {
            let obj = sp.maybe_spawn(t, phone, &cfg).unwrap();
            assert!((50.0..70.0).contains(&obj.size));
            assert!(obj.velocity.x.abs() <= 0.75);
        }
    }

    #[test]
    fn seeded_spawners_agree() {
        let cfg = always_common();
        let vp = Viewport::default();
        let mut a = Spawner::seeded(42);
        let mut b = Spawner::seeded(42);
        for t in 1..20 {
            assert_eq!(a.maybe_spawn(t, vp, &cfg), b.maybe_spawn(t, vp, &cfg));
        }
    }

    #[test]
    fn rewind_restarts_gate() {
        let cfg = GameConfig::default();
        let mut sp = Spawner::seeded(8);
        sp.rewind(50_000);
        assert!(sp.maybe_spawn(50_500, Viewport::default(), &cfg).is_none());
    }
}
