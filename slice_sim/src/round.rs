//! Round/Score State Machine.
//!
//! ```text
//!   Playing ──toggle──▶ Paused ──toggle──▶ Playing
//!      │
//!      └── time_remaining == 0 ──▶ Ended   (terminal until reset)
//! ```

use crate::config::GameConfig;
use crate::object::Category;
use crate::Millis;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Playing,
    Paused,
    Ended,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RoundState {
    /// Never negative; hazard penalties clamp at zero.
    pub score:          u32,
    /// Multiplier minus one.
    pub combo:          u32,
    pub time_remaining: u32,
    pub phase:          Phase,
    combo_deadline:     Option<Millis>,
}

impl RoundState {
    pub fn new(duration_secs: u32) -> Self {
        RoundState {
            score:          0,
            combo:          0,
            time_remaining: duration_secs,
            phase:          Phase::Playing,
            combo_deadline: None,
        }
    }

    /// Score one hit and return the applied score change.
    ///
    /// Hazards subtract a flat penalty and break the combo. Everything else
    /// scores `points * (combo + 1)`, bumps the combo and restarts the
    /// decay window.
    pub fn apply_hit(&mut self, category: Category, now: Millis, cfg: &GameConfig) -> i64 {
        let before = self.score;
        let base = match category {
            Category::Hazard => {
                self.score = self.score.saturating_add_signed(cfg.hazard_penalty);
                self.break_combo();
                return i64::from(self.score) - i64::from(before);
            }
            Category::Bonus     => cfg.bonus_points,
            Category::Common(_) => cfg.common_points,
        };
        self.score = self.score.saturating_add(base.saturating_mul(self.combo + 1));
        self.combo += 1;
        self.combo_deadline = Some(now.saturating_add(cfg.combo_decay_ms));
        i64::from(self.score) - i64::from(before)
    }

    pub fn break_combo(&mut self) {
        self.combo = 0;
        self.combo_deadline = None;
    }

    /// Reset the combo if the decay window has run out. Returns `true` when
    /// a live combo was dropped.
    pub fn expire_combo(&mut self, now: Millis) -> bool {
        match self.combo_deadline {
            Some(deadline) if now >= deadline => {
                let had = self.combo > 0;
                self.break_combo();
                had
            }
            _ => false,
        }
    }

    pub fn combo_deadline(&self) -> Option<Millis> { self.combo_deadline }

    /// Store the latest countdown value. Returns `true` on the one tick that
    /// moves the round from `Playing` to `Ended`.
    pub fn update_clock(&mut self, remaining: u32) -> bool {
        self.time_remaining = self.time_remaining.min(remaining);
        self.time_remaining == 0 && self.finish()
    }

    /// Move a playing round to `Ended`. Returns `false` if it was not playing.
    pub fn finish(&mut self) -> bool {
        if self.phase != Phase::Playing {
            return false;
        }
        self.phase = Phase::Ended;
        true
    }

    /// Flip between `Playing` and `Paused`. Ignored once `Ended`.
    pub fn toggle_pause(&mut self) -> bool {
        self.phase = match self.phase {
            Phase::Playing => Phase::Paused,
            Phase::Paused  => Phase::Playing,
            Phase::Ended   => return false,
        };
        true
    }

    pub fn is_playing(&self) -> bool { self.phase == Phase::Playing }
}
