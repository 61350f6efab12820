//! Collision Resolver: blade segments against live objects.

use tracing::debug;

use blade_tracking::{Hand, Segment};

use crate::config::GameConfig;
use crate::object::{Category, FallingObject, ObjectId};
use crate::round::RoundState;
use crate::Millis;

/// One object sliced this tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hit {
    pub id:       ObjectId,
    pub category: Category,
    /// Contact angle in radians.
    pub angle:    f32,
    /// Applied score change.
    pub delta:    i64,
    /// Combo after the hit.
    pub combo:    u32,
}

/// First blade that reaches `obj`.
///
/// Hands are tried in slice order, then fingers index → middle → ring →
/// pinky. Contact needs the blade strictly closer than `size/2 + margin`.
pub fn find_hit(obj: &FallingObject, hands: &[Hand], margin: f32) -> Option<Segment> {
    let reach = obj.size / 2.0 + margin;
    hands.iter()
        .flat_map(Hand::segments)
        .find(|seg| seg.distance_to(obj.position) < reach)
}

/// Test every unsliced object against every blade, slice the ones hit and
/// score them in object order.
pub fn resolve(
    objects: &mut [FallingObject],
    hands:   &[Hand],
    round:   &mut RoundState,
    now:     Millis,
    cfg:     &GameConfig,
) -> Vec<Hit> {
    let mut hits = Vec::new();
    if hands.is_empty() {
        return hits;
    }

    for obj in objects.iter_mut().filter(|o| !o.is_sliced()) {
        let Some(seg) = find_hit(obj, hands, cfg.hit_margin) else { continue };
        let angle = seg.angle();
        if !obj.slice(now, angle) {
            continue;
        }
        let delta = round.apply_hit(obj.category, now, cfg);
        debug!(id = %obj.id, kind = obj.category.name(), delta, combo = round.combo, "slice");
        hits.push(Hit { id: obj.id, category: obj.category, angle, delta, combo: round.combo });
    }
    hits
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
