//! # slice_sim
//!
//! The real-time core of the saber slicing game: objects are launched from
//! below the screen, fall back under gravity, and are sliced when any of the
//! four palm→fingertip blades of a tracked hand passes close enough.
//!
//! [`Game`] is the explicit game-loop object. An outer driver calls
//! [`Game::tick`] once per display frame with a millisecond clock and feeds
//! it hand snapshots with [`Game::set_hands`] whenever the tracker produces
//! one. Everything else is owned by the game:
//!
//! | Stage | Module |
//! |---|---|
//! | clock, combo decay, integrate, prune | [`stepper`] |
//! | maybe launch a new object | [`spawner`] |
//! | blade vs object, scoring | [`collision`], [`round`] |
//!
//! ```rust
//! use slice_sim::{Game, GameConfig, Phase};
//! use blade_tracking::Viewport;
//!
//! let mut game = Game::with_seed(GameConfig::default(), Viewport::default(), 7);
//! game.tick(0);
//! game.tick(60_000);
//! assert_eq!(game.round().phase, Phase::Ended);
//! ```

pub mod config;
pub mod object;
pub mod spawner;
pub mod stepper;
pub mod collision;
pub mod round;
pub mod game;

pub use config::{ConfigError, GameConfig, LaunchProfile};
pub use object::{Category, CommonKind, FallingObject, ObjectId, SliceMeta};
pub use spawner::Spawner;
pub use collision::Hit;
pub use round::{Phase, RoundState};
pub use game::{Game, GameEvent};

/// Milliseconds on the round clock.
pub type Millis = u64;
