//! # blade_tracking
//!
//! Turns raw per-frame hand-landmark samples into the geometry the slicing
//! game collides against.
//!
//! * [`landmarks`]: the 21-point hand layout and [`RawHandSample`].
//! * [`hand`]: the Landmark Normalizer: sample → [`Hand`] in screen space.
//! * [`blade`]: four palm→fingertip [`Segment`]s per hand, plus the
//!   [`BladeModel`] that keeps previous tips and trails per handedness.
//! * [`viewport`]: screen dimensions and the narrow-screen test.
//!
//! ```rust
//! use blade_tracking::{normalize_all, RawHandSample, Viewport};
//!
//! let viewport = Viewport::new(1280.0, 720.0);
//! let hands = normalize_all(&[] as &[RawHandSample], viewport);
//! assert!(hands.is_empty());
//! ```

pub mod landmarks;
pub mod viewport;
pub mod hand;
pub mod blade;

pub use landmarks::{RawHandSample, LANDMARK_COUNT};
pub use viewport::Viewport;
pub use hand::{normalize, normalize_all, Hand, Handedness};
pub use blade::{BladeModel, Finger, Segment, TrailPoint, TRAIL_RETENTION_MS};
