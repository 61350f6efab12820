//! Render-side data: colours and the post-slice effect geometry.
//!
//! Nothing here feeds back into the simulation; the visualizer asks for a
//! [`SliceEffect`] per sliced object each frame and draws what it gets.

use glam::Vec2;

use blade_tracking::{Hand, Handedness, TRAIL_RETENTION_MS};
use slice_sim::{Category, CommonKind, FallingObject, Millis};

// ════════════════════════════════════════════════════════════════════════════
// Colour palette
// ════════════════════════════════════════════════════════════════════════════

pub const LEFT_BLADE:  u32 = 0xFF00FFFF;  // cyan
pub const RIGHT_BLADE: u32 = 0xFFFF00FF;  // magenta
pub const BLADE_CORE:  u32 = 0xFFFFFFFF;

pub fn blade_color(handedness: Handedness) -> u32 {
    match handedness {
        Handedness::Left  => LEFT_BLADE,
        Handedness::Right => RIGHT_BLADE,
    }
}

pub fn category_color(category: Category) -> u32 {
    match category {
        Category::Common(CommonKind::Apple)      => 0xFFFF4757,
        Category::Common(CommonKind::Orange)     => 0xFFFFA502,
        Category::Common(CommonKind::Banana)     => 0xFFFFDD59,
        Category::Common(CommonKind::Watermelon) => 0xFF2ED573,
        Category::Common(CommonKind::Grapes)     => 0xFF9B59B6,
        Category::Common(CommonKind::Pineapple)  => 0xFFFFA502,
        Category::Bonus                          => 0xFFFF6B6B,
        Category::Hazard                         => 0xFF2C2C2C,
    }
}

/// Convert HSV → packed ARGB (0xAARRGGBB, A=0xFF).
pub fn hsv_to_argb(h: f32, s: f32, v: f32) -> u32 {
    let h  = h.rem_euclid(360.0);
    let hi = (h / 60.0) as u32;
    let f  = h / 60.0 - hi as f32;
    let p  = v * (1.0 - s);
    let q  = v * (1.0 - s * f);
    let t  = v * (1.0 - s * (1.0 - f));
    let (r, g, b) = match hi {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    let ri = (r * 255.0) as u32;
    let gi = (g * 255.0) as u32;
    let bi = (b * 255.0) as u32;
    0xFF000000 | (ri << 16) | (gi << 8) | bi
}

/// Mix two ARGB colours. `t` = 0.0 → all `a`, `t` = 1.0 → all `b`.
pub fn blend(a: u32, b: u32, t: f32) -> u32 {
    let t = t.clamp(0.0, 1.0);
    let lerp = |ca: u32, cb: u32| (ca as f32 * (1.0 - t) + cb as f32 * t) as u32;
    let ar = (a >> 16) & 0xFF; let br = (b >> 16) & 0xFF;
    let ag = (a >>  8) & 0xFF; let bg = (b >>  8) & 0xFF;
    let ab =  a        & 0xFF; let bb =  b        & 0xFF;
    0xFF000000 | (lerp(ar, br) << 16) | (lerp(ag, bg) << 8) | lerp(ab, bb)
}

// ════════════════════════════════════════════════════════════════════════════
// Blade sizing
// ════════════════════════════════════════════════════════════════════════════

const GLOW_PER_SCALE: f32 = 0.06;
const GLOW_MIN:       f32 = 8.0;
const GLOW_MAX:       f32 = 24.0;
const FLARE_REACH:    f32 = 0.08;

/// Blade glow width for a hand of the given [`Hand::scale`]: hands closer
/// to the camera get wider blades.
pub fn glow_width(scale: f32) -> f32 {
    (scale * GLOW_PER_SCALE).clamp(GLOW_MIN, GLOW_MAX)
}

/// Where to draw the flare just past the index tip, along the pointing
/// direction. A pointing vector with no screen-plane component puts the
/// flare on the tip itself.
pub fn tip_flare(hand: &Hand) -> Vec2 {
    let dir = hand.pointing.truncate().normalize_or_zero();
    hand.index_tip() + dir * (hand.scale * FLARE_REACH)
}

/// Opacity of a trail point `age_ms` old: 1 when fresh, 0 at retention.
pub fn trail_alpha(age_ms: u64) -> f32 {
    1.0 - (age_ms as f32 / TRAIL_RETENTION_MS as f32).clamp(0.0, 1.0)
}

// ════════════════════════════════════════════════════════════════════════════
// SliceEffect
// ════════════════════════════════════════════════════════════════════════════

const SEPARATION_PX_S: f32 = 40.0;
const JUICE_COUNT:     usize = 8;
const JUICE_PX_S:      f32 = 80.0;
const JUICE_FADE_S:    f32 = 1.0;
const CONFETTI_COUNT:  usize = 20;
const CONFETTI_PX_S:   f32 = 150.0;
const CONFETTI_FADE_S: f32 = 0.8;
const CONFETTI_HUE:    f32 = 18.0;

/// A square speck, drawn centred on `pos`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    pub pos:   Vec2,
    pub half:  f32,
    pub color: u32,
    /// 0.0 (gone) → 1.0 (opaque).
    pub alpha: f32,
}

/// Where to draw a sliced object `elapsed` after the hit.
#[derive(Clone, Debug, PartialEq)]
pub struct SliceEffect {
    /// Centres of the two halves, pushed apart across the cut.
    pub halves:    [Vec2; 2],
    /// The cut line direction in radians.
    pub cut_angle: f32,
    pub radius:    f32,
    pub color:     u32,
    pub particles: Vec<Particle>,
}

/// Geometry for a sliced object. `None` if the object isn't sliced.
pub fn slice_effect(obj: &FallingObject, now: Millis) -> Option<SliceEffect> {
    let meta = obj.slice_meta()?;
    let secs = now.saturating_sub(meta.at) as f32 / 1_000.0;
    let color = category_color(obj.category);

    let cut = Vec2::from_angle(meta.angle);
    let across = cut.perp() * (secs * SEPARATION_PX_S);

    let ring = |count: usize, speed: f32| {
        (0..count).map(move |i| {
            let a = i as f32 / count as f32 * std::f32::consts::TAU;
            (i, obj.position + Vec2::from_angle(a) * (secs * speed))
        })
    };

    let juice_alpha = (1.0 - secs / JUICE_FADE_S).max(0.0);
    let mut particles: Vec<Particle> = ring(JUICE_COUNT, JUICE_PX_S)
        .map(|(_, pos)| Particle { pos, half: 1.5, color, alpha: juice_alpha })
        .collect();

    if obj.category == Category::Bonus {
        let confetti_alpha = (1.0 - secs * CONFETTI_FADE_S).max(0.0);
        particles.extend(ring(CONFETTI_COUNT, CONFETTI_PX_S).map(|(i, pos)| Particle {
            pos,
            half:  3.0,
            color: hsv_to_argb(i as f32 * CONFETTI_HUE, 0.7, 0.85),
            alpha: confetti_alpha,
        }));
    }

    Some(SliceEffect {
        halves:    [obj.position - across, obj.position + across],
        cut_angle: meta.angle,
        radius:    obj.size / 2.0,
        color,
        particles,
    })
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use slice_sim::ObjectId;

    fn sliced(category: Category, angle: f32) -> FallingObject {
        let mut obj = FallingObject::new(ObjectId(1), category, Vec2::new(100.0, 100.0), Vec2::ZERO, 80.0);
        obj.slice(1_000, angle);
        obj
    }

    #[test]
    fn hsv_primaries() {
        assert_eq!(hsv_to_argb(0.0,   1.0, 1.0), 0xFFFF0000);
        assert_eq!(hsv_to_argb(120.0, 1.0, 1.0), 0xFF00FF00);
        assert_eq!(hsv_to_argb(240.0, 1.0, 1.0), 0xFF0000FF);
        assert_eq!(hsv_to_argb(360.0, 1.0, 1.0), 0xFFFF0000);
    }

    #[test]
    fn blend_endpoints() {
        assert_eq!(blend(0xFF000000, 0xFFFFFFFF, 0.0), 0xFF000000);
        assert_eq!(blend(0xFF000000, 0xFFFFFFFF, 1.0), 0xFFFFFFFF);
    }

    #[test]
    fn trail_fades_over_retention() {
        assert_eq!(trail_alpha(0), 1.0);
        assert!((trail_alpha(400) - 0.5).abs() < 1e-6);
        assert_eq!(trail_alpha(800), 0.0);
        assert_eq!(trail_alpha(5_000), 0.0);
    }

    fn hand_pointing(pointing: Vec3, scale: f32) -> Hand {
        Hand {
            handedness: Handedness::Left,
            palm:       Vec2::new(100.0, 300.0),
            tips:       [Vec2::new(100.0, 100.0); 4],
            pointing,
            scale,
        }
    }

    #[test]
    fn glow_grows_with_hand_scale() {
        assert_eq!(glow_width(0.0), GLOW_MIN);
        assert!((glow_width(250.0) - 15.0).abs() < 1e-4);
        assert!(glow_width(300.0) > glow_width(200.0));
        assert_eq!(glow_width(10_000.0), GLOW_MAX);
    }

    #[test]
    fn flare_sits_past_tip_along_pointing() {
        let up = hand_pointing(Vec3::NEG_Y, 250.0);
        assert!((tip_flare(&up) - Vec2::new(100.0, 80.0)).length() < 1e-4);

        // Pointing straight at the camera leaves the flare on the tip.
        let flat = hand_pointing(Vec3::Z, 250.0);
        assert_eq!(tip_flare(&flat), Vec2::new(100.0, 100.0));
    }

    #[test]
    fn whole_object_has_no_effect() {
        let obj = FallingObject::new(ObjectId(1), Category::Hazard, Vec2::ZERO, Vec2::ZERO, 60.0);
        assert!(slice_effect(&obj, 0).is_none());
    }

    #[test]
    fn halves_separate_across_horizontal_cut() {
        let obj = sliced(Category::Common(CommonKind::Apple), 0.0);
        let fx = slice_effect(&obj, 1_500).unwrap();
        // 0.5 s at 40 px/s, perpendicular to a horizontal cut.
        assert!((fx.halves[0] - Vec2::new(100.0, 80.0)).length() < 1e-3);
        assert!((fx.halves[1] - Vec2::new(100.0, 120.0)).length() < 1e-3);
        assert_eq!(fx.particles.len(), JUICE_COUNT);
        assert!((fx.particles[0].pos - Vec2::new(140.0, 100.0)).length() < 1e-3);
        assert!((fx.particles[0].alpha - 0.5).abs() < 1e-6);
        assert_eq!(fx.color, 0xFFFF4757);
    }

    #[test]
    fn bonus_adds_confetti() {
        let obj = sliced(Category::Bonus, 0.3);
        let fx = slice_effect(&obj, 2_000).unwrap();
        assert_eq!(fx.particles.len(), JUICE_COUNT + CONFETTI_COUNT);
        let confetti = &fx.particles[JUICE_COUNT..];
        assert!(confetti.iter().all(|p| (p.alpha - 0.2).abs() < 1e-6));
        assert!((confetti[0].pos.distance(obj.position) - 150.0).abs() < 1e-3);
        // Juice is fully faded after a second.
        assert!(fx.particles[..JUICE_COUNT].iter().all(|p| p.alpha == 0.0));
    }
}
