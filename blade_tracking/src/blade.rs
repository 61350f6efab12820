//! Blade Model: palm→fingertip hit geometry and per-hand trails.
//!
//! Blades are rebuilt from the latest [`Hand`] every time they are asked
//! for; there is no smoothing between samples. Continuity (previous tip,
//! trail) is keyed by [`Handedness`], which is only an approximation of a
//! track id: if the sensor swaps labels, the trails swap with them.

use std::collections::{HashMap, VecDeque};

use glam::Vec2;

use crate::hand::{Hand, Handedness};

/// Trail points older than this are dropped.
pub const TRAIL_RETENTION_MS: u64 = 800;

// ════════════════════════════════════════════════════════════════════════════
// Finger
// ════════════════════════════════════════════════════════════════════════════

/// The four blade fingers, in collision-evaluation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Finger {
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    pub const ALL: [Finger; 4] = [Finger::Index, Finger::Middle, Finger::Ring, Finger::Pinky];

    pub fn slot(self) -> usize { self as usize }
}

// ════════════════════════════════════════════════════════════════════════════
// Segment
// ════════════════════════════════════════════════════════════════════════════

/// A straight blade from `start` (palm) to `end` (fingertip).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    pub start: Vec2,
    pub end:   Vec2,
}

impl Segment {
    pub fn new(start: Vec2, end: Vec2) -> Self {
        Segment { start, end }
    }

    #[inline]
    pub fn delta(&self) -> Vec2 { self.end - self.start }

    /// Direction of the blade in radians, `atan2(dy, dx)`.
    pub fn angle(&self) -> f32 {
        let d = self.delta();
        d.y.atan2(d.x)
    }

    /// Shortest distance from `p` to any point on the segment.
    ///
    /// The projection parameter is clamped to `[0, 1]`; a degenerate
    /// (zero-length) segment measures the distance to `start`.
    pub fn distance_to(&self, p: Vec2) -> f32 {
        let d = self.delta();
        let len_sq = d.length_squared();
        if len_sq == 0.0 {
            return p.distance(self.start);
        }
        let t = ((p - self.start).dot(d) / len_sq).clamp(0.0, 1.0);
        p.distance(self.start + d * t)
    }
}

impl Hand {
    pub fn segment(&self, finger: Finger) -> Segment {
        Segment::new(self.palm, self.tips[finger.slot()])
    }

    /// The four blades of this hand, index → pinky.
    pub fn segments(&self) -> [Segment; 4] {
        Finger::ALL.map(|f| self.segment(f))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// BladeModel
// ════════════════════════════════════════════════════════════════════════════

/// A timestamped index-fingertip position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrailPoint {
    pub at:    u64,
    pub point: Vec2,
}

/// Per-handedness continuity state for rendering.
#[derive(Debug, Default)]
pub struct BladeModel {
    previous: HashMap<Handedness, Vec2>,
    swings:   HashMap<Handedness, Segment>,
    trails:   HashMap<Handedness, VecDeque<TrailPoint>>,
}

impl BladeModel {
    pub fn new() -> Self { Self::default() }

    /// Record a fresh tracking sample.
    ///
    /// Each hand's swing runs from its index tip in the previous sample with
    /// the same handedness to the current one. A hand seen for the first
    /// time gets a zero-length swing; a hand missing from the sample loses
    /// its swing but keeps its previous tip.
    pub fn observe(&mut self, hands: &[Hand]) {
        self.swings.clear();
        for h in hands {
            let tip = h.index_tip();
            let from = self.previous.insert(h.handedness, tip).unwrap_or(tip);
            self.swings.insert(h.handedness, Segment::new(from, tip));
        }
    }

    /// Index-tip motion between the last two samples of this hand.
    pub fn swing(&self, handedness: Handedness) -> Option<Segment> {
        self.swings.get(&handedness).copied()
    }

    pub fn previous_tip(&self, handedness: Handedness) -> Option<Vec2> {
        self.previous.get(&handedness).copied()
    }

    /// Append one trail point per hand and drop points older than
    /// [`TRAIL_RETENTION_MS`]. Called once per tick.
    pub fn record_trail(&mut self, hands: &[Hand], now: u64) {
        for h in hands {
            self.trails.entry(h.handedness)
                .or_default()
                .push_back(TrailPoint { at: now, point: h.index_tip() });
        }
        for trail in self.trails.values_mut() {
            while trail.front().is_some_and(|p| now.saturating_sub(p.at) >= TRAIL_RETENTION_MS) {
                trail.pop_front();
            }
        }
        self.trails.retain(|_, t| !t.is_empty());
    }

    pub fn trail(&self, handedness: Handedness) -> impl Iterator<Item = &TrailPoint> {
        self.trails.get(&handedness).into_iter().flatten()
    }

    pub fn trail_len(&self, handedness: Handedness) -> usize {
        self.trails.get(&handedness).map_or(0, VecDeque::len)
    }

    pub fn reset(&mut self) {
        self.previous.clear();
        self.swings.clear();
        self.trails.clear();
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
