//! # saber_slice
//!
//! Hand-tracked arcade slicing game. Each tracked hand becomes four
//! palm-to-fingertip blades; swipe them through falling objects before
//! they drop off screen.
//!
//! ## Threads
//!
//! | Thread | Module | Role |
//! |---|---|---|
//! | main | [`app`], [`visualizer`] | window input, simulation tick, rendering |
//! | tracker | [`tracker`] | polls a [`tracker::HandSensor`], sends landmark samples |
//! | audio | [`audio`] | plays sound cues and background music over MIDI |
//!
//! The main thread talks to the others only through `mpsc` command
//! channels.
//!
//! ## Feature flags
//!
//! * (default): **Pointer mode**: the mouse pointer drives one synthetic hand.
//! * `leap`: **Hardware mode**: polls a real LeapMotion controller via LeapC.
//!
//! ### Keys
//!
//! | Key | Action |
//! |---|---|
//! | `P` | Pause / resume |
//! | `R` | Restart the round |
//! | `Q` / `Escape` | Quit |

pub mod tracker;
pub mod audio;
pub mod leaderboard;
pub mod effects;
pub mod visualizer;
pub mod app;
