//! Simulation Stepper: per-tick integration, pruning and the round clock.

use blade_tracking::Viewport;

use crate::config::GameConfig;
use crate::object::{FallingObject, ObjectId};
use crate::Millis;

/// What [`prune`] removed.
#[derive(Debug, Default, PartialEq)]
pub struct PruneReport {
    /// Sliced objects whose display window ran out.
    pub expired: usize,
    /// Unsliced objects that fell past the bottom edge.
    pub missed:  Vec<ObjectId>,
}

/// Whole seconds left, `max(0, duration - floor(elapsed_s))`.
pub fn time_remaining(duration_secs: u32, elapsed_ms: Millis) -> u32 {
    let left = u64::from(duration_secs).saturating_sub(elapsed_ms / 1_000);
    left as u32
}

/// Advance every unsliced object by one tick: position by velocity, then
/// velocity by gravity. Sliced objects freeze in place.
pub fn integrate(objects: &mut [FallingObject], gravity: f32) {
    for obj in objects.iter_mut().filter(|o| !o.is_sliced()) {
        obj.position   += obj.velocity;
        obj.velocity.y += gravity;
        obj.rotation   += obj.rotation_rate;
    }
}

/// Drop sliced objects past their display window and unsliced objects
/// below `height + offscreen_margin`.
pub fn prune(
    objects:  &mut Vec<FallingObject>,
    now:      Millis,
    viewport: Viewport,
    cfg:      &GameConfig,
) -> PruneReport {
    let floor = viewport.height + cfg.offscreen_margin;
    let mut report = PruneReport::default();

    objects.retain(|obj| match obj.slice_meta() {
        Some(meta) => {
            let keep = now.saturating_sub(meta.at) < cfg.sliced_display_ms;
            if !keep { report.expired += 1; }
            keep
        }
        None if obj.position.y > floor => {
            report.missed.push(obj.id);
            false
        }
        None => true,
    });

    report
}
