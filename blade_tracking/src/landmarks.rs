//! The 21-landmark hand layout reported by the tracking sensor.
//!
//! Points are in normalized sensor coordinates: `x` and `y` in `0.0..=1.0`
//! across the camera image (un-mirrored), `z` relative depth.

use glam::Vec3;

use crate::hand::Handedness;

pub const LANDMARK_COUNT: usize = 21;

pub const WRIST:      usize = 0;
pub const THUMB_CMC:  usize = 1;
pub const THUMB_MCP:  usize = 2;
pub const THUMB_IP:   usize = 3;
pub const THUMB_TIP:  usize = 4;
pub const INDEX_MCP:  usize = 5;
pub const INDEX_PIP:  usize = 6;
pub const INDEX_DIP:  usize = 7;
pub const INDEX_TIP:  usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_DIP: usize = 11;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP:   usize = 13;
pub const RING_PIP:   usize = 14;
pub const RING_DIP:   usize = 15;
pub const RING_TIP:   usize = 16;
pub const PINKY_MCP:  usize = 17;
pub const PINKY_PIP:  usize = 18;
pub const PINKY_DIP:  usize = 19;
pub const PINKY_TIP:  usize = 20;

/// Landmark indices of the four blade fingertips, index → pinky.
pub const BLADE_TIPS: [usize; 4] = [INDEX_TIP, MIDDLE_TIP, RING_TIP, PINKY_TIP];

/// Base joint of each finger, thumb first, in the same order the sensor
/// reports the chains (`base, base+1, base+2, base+3`).
pub const FINGER_CHAINS: [usize; 5] = [THUMB_CMC, INDEX_MCP, MIDDLE_MCP, RING_MCP, PINKY_MCP];

// ════════════════════════════════════════════════════════════════════════════
// RawHandSample
// ════════════════════════════════════════════════════════════════════════════

/// One hand as reported by the sensor for one inference sample.
#[derive(Clone, Debug, PartialEq)]
pub struct RawHandSample {
    pub points: [Vec3; LANDMARK_COUNT],
    /// Handedness as the sensor labelled it, *before* mirroring.
    /// `None` when the sensor gave no label.
    pub label:  Option<Handedness>,
}

impl RawHandSample {
    pub fn new(points: [Vec3; LANDMARK_COUNT], label: Option<Handedness>) -> Self {
        RawHandSample { points, label }
    }

    /// Build a sample from a slice of landmarks.
    ///
    /// A slice of the wrong length is a broken integration, not a runtime
    /// condition: debug builds assert, release builds return `None`.
    pub fn from_points(points: &[Vec3], label: Option<Handedness>) -> Option<Self> {
        debug_assert_eq!(points.len(), LANDMARK_COUNT, "hand sample must carry 21 landmarks");
        let points: [Vec3; LANDMARK_COUNT] = points.try_into().ok()?;
        Some(RawHandSample { points, label })
    }

    #[inline]
    pub fn point(&self, index: usize) -> Vec3 { self.points[index] }
}
