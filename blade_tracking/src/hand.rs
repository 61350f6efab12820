//! Landmark Normalizer: raw sensor samples → screen-space [`Hand`] records.
//!
//! A [`Hand`] is a snapshot. Nothing links a hand in one sample to a hand in
//! the next except its handedness label, and the sensor may swap labels
//! between samples.

use glam::{Vec2, Vec3};

use crate::landmarks::{RawHandSample, BLADE_TIPS, INDEX_MCP, INDEX_TIP, MIDDLE_TIP, WRIST};
use crate::viewport::Viewport;

/// Multiplier applied to the wrist→middle-tip screen distance to get
/// [`Hand::scale`].
pub const SCALE_CALIBRATION: f32 = 1.25;

/// Pointing direction used when the index MCP and tip coincide.
pub const FALLBACK_POINTING: Vec3 = Vec3::new(0.0, -1.0, 0.0);

// ════════════════════════════════════════════════════════════════════════════
// Handedness
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Handedness {
    Left,
    Right,
}

impl Handedness {
    pub fn mirrored(self) -> Self {
        match self {
            Handedness::Left  => Handedness::Right,
            Handedness::Right => Handedness::Left,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Handedness::Left  => "left",
            Handedness::Right => "right",
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Hand
// ════════════════════════════════════════════════════════════════════════════

/// One detected hand, in screen pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct Hand {
    /// Handedness as the player sees it (sensor label, mirrored).
    pub handedness: Handedness,
    /// Palm anchor (the wrist landmark); every blade starts here.
    pub palm:       Vec2,
    /// Fingertips, index → middle → ring → pinky.
    pub tips:       [Vec2; 4],
    /// Unit vector along the index finger, MCP → tip.
    pub pointing:   Vec3,
    /// Cosmetic size scalar.
    pub scale:      f32,
}

impl Hand {
    #[inline]
    pub fn index_tip(&self) -> Vec2 { self.tips[0] }
}

// ════════════════════════════════════════════════════════════════════════════
// Normalization
// ════════════════════════════════════════════════════════════════════════════

/// Convert one sensor sample into a [`Hand`] for the given viewport.
pub fn normalize(sample: &RawHandSample, viewport: Viewport) -> Hand {
    let screen = |i: usize| viewport.to_screen(sample.point(i));

    let palm = screen(WRIST);
    let tips = BLADE_TIPS.map(|i| screen(i));

    // An unlabelled hand is treated as sensor-right.
    let handedness = sample.label.unwrap_or(Handedness::Right).mirrored();

    Hand {
        handedness,
        palm,
        tips,
        pointing: pointing_direction(sample),
        scale:    palm.distance(screen(MIDDLE_TIP)) * SCALE_CALIBRATION,
    }
}

/// Normalize every hand in one sample. Zero hands in, zero hands out.
pub fn normalize_all(samples: &[RawHandSample], viewport: Viewport) -> Vec<Hand> {
    samples.iter().map(|s| normalize(s, viewport)).collect()
}

/// Index-finger direction in mirrored sensor space, so `x` grows to the
/// player's right like screen `x` does.
fn pointing_direction(sample: &RawHandSample) -> Vec3 {
    let mcp = sample.point(INDEX_MCP);
    let tip = sample.point(INDEX_TIP);
    let d = tip - mcp;
    Vec3::new(-d.x, d.y, d.z)
        .try_normalize()
        .unwrap_or(FALLBACK_POINTING)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::{LANDMARK_COUNT, PINKY_TIP, RING_TIP};

    fn sample(label: Option<Handedness>) -> RawHandSample {
        let mut points = [Vec3::new(0.5, 0.5, 0.0); LANDMARK_COUNT];
        points[WRIST]      = Vec3::new(0.5, 0.8, 0.0);
        points[INDEX_MCP]  = Vec3::new(0.5, 0.6, 0.0);
        points[INDEX_TIP]  = Vec3::new(0.4, 0.4, 0.0);
        points[MIDDLE_TIP] = Vec3::new(0.5, 0.4, 0.0);
        points[RING_TIP]   = Vec3::new(0.6, 0.4, 0.0);
        points[PINKY_TIP]  = Vec3::new(0.7, 0.45, 0.0);
        RawHandSample::new(points, label)
    }

    #[test]
    fn sensor_left_becomes_right() {
        let v = Viewport::new(1000.0, 1000.0);
        assert_eq!(normalize(&sample(Some(Handedness::Left)), v).handedness, Handedness::Right);
        assert_eq!(normalize(&sample(Some(Handedness::Right)), v).handedness, Handedness::Left);
        assert_eq!(normalize(&sample(None), v).handedness, Handedness::Left);
    }

    #[test]
    fn anchors_are_mirrored_and_scaled() {
        let v = Viewport::new(1000.0, 500.0);
        let hand = normalize(&sample(None), v);
        assert!(hand.palm.abs_diff_eq(Vec2::new(500.0, 400.0), 1e-3));
        assert!(hand.index_tip().abs_diff_eq(Vec2::new(600.0, 200.0), 1e-3));
        assert!(hand.tips[2].abs_diff_eq(Vec2::new(400.0, 200.0), 1e-3));
    }

    #[test]
    fn pointing_is_unit_and_mirrored() {
        let hand = normalize(&sample(None), Viewport::default());
        assert!((hand.pointing.length() - 1.0).abs() < 1e-5);
        // Sensor x shrinks from MCP to tip, so screen-facing x grows.
        assert!(hand.pointing.x > 0.0);
        assert!(hand.pointing.y < 0.0);
    }

    #[test]
    fn coincident_index_landmarks_use_fallback() {
        let mut s = sample(None);
        s.points[INDEX_TIP] = s.points[INDEX_MCP];
        let hand = normalize(&s, Viewport::default());
        assert_eq!(hand.pointing, FALLBACK_POINTING);
        assert!(!hand.pointing.is_nan());
    }

    #[test]
    fn scale_tracks_wrist_to_middle_distance() {
        let v = Viewport::new(1000.0, 1000.0);
        let hand = normalize(&sample(None), v);
        // wrist (500, 800) → middle tip (500, 400)
        assert!((hand.scale - 400.0 * SCALE_CALIBRATION).abs() < 1e-3);
    }

    #[test]
    fn normalize_all_handles_zero_and_two_hands() {
        let v = Viewport::default();
        assert!(normalize_all(&[], v).is_empty());
        let two = [sample(Some(Handedness::Left)), sample(Some(Handedness::Right))];
        let hands = normalize_all(&two, v);
        assert_eq!(hands.len(), 2);
        assert_eq!(hands[0].handedness, Handedness::Right);
        assert_eq!(hands[1].handedness, Handedness::Left);
    }
}
