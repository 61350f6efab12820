//! Falling objects and their categories.

use std::fmt;

use glam::Vec2;

use crate::Millis;

/// Opaque spawn-order token; unique within one [`crate::Spawner`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "obj#{}", self.0)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Category
// ════════════════════════════════════════════════════════════════════════════

/// The always-available fruit targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CommonKind {
    Apple,
    Orange,
    Banana,
    Watermelon,
    Grapes,
    Pineapple,
}

impl CommonKind {
    pub const ALL: [CommonKind; 6] = [
        CommonKind::Apple,
        CommonKind::Orange,
        CommonKind::Banana,
        CommonKind::Watermelon,
        CommonKind::Grapes,
        CommonKind::Pineapple,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CommonKind::Apple      => "apple",
            CommonKind::Orange     => "orange",
            CommonKind::Banana     => "banana",
            CommonKind::Watermelon => "watermelon",
            CommonKind::Grapes     => "grapes",
            CommonKind::Pineapple  => "pineapple",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    Common(CommonKind),
    /// Rare, high-value target (the piñata), gated by a cooldown.
    Bonus,
    /// Penalty target (the bomb).
    Hazard,
}

impl Category {
    pub fn name(self) -> &'static str {
        match self {
            Category::Common(kind) => kind.name(),
            Category::Bonus        => "pinata",
            Category::Hazard       => "bomb",
        }
    }

    pub fn is_hazard(self) -> bool { matches!(self, Category::Hazard) }
}

// ════════════════════════════════════════════════════════════════════════════
// FallingObject
// ════════════════════════════════════════════════════════════════════════════

/// Recorded at the moment of the hit; drives the post-hit display window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SliceMeta {
    pub at:    Millis,
    /// Blade direction at contact, radians.
    pub angle: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FallingObject {
    pub id:            ObjectId,
    pub category:      Category,
    pub position:      Vec2,
    /// Pixels per tick; `y` grows downward.
    pub velocity:      Vec2,
    /// Diameter in pixels; the collision radius is `size / 2`.
    pub size:          f32,
    /// Degrees, cosmetic.
    pub rotation:      f32,
    pub rotation_rate: f32,
    slice:             Option<SliceMeta>,
}

impl FallingObject {
    pub fn new(id: ObjectId, category: Category, position: Vec2, velocity: Vec2, size: f32) -> Self {
        FallingObject {
            id,
            category,
            position,
            velocity,
            size,
            rotation:      0.0,
            rotation_rate: 0.0,
            slice:         None,
        }
    }

    pub fn with_rotation_rate(mut self, rate: f32) -> Self {
        self.rotation_rate = rate;
        self
    }

    #[inline]
    pub fn is_sliced(&self) -> bool { self.slice.is_some() }

    pub fn slice_meta(&self) -> Option<SliceMeta> { self.slice }

    /// Mark the object sliced. Returns `false` (and changes nothing) if it
    /// already was.
    pub fn slice(&mut self, at: Millis, angle: f32) -> bool {
        if self.slice.is_some() {
            return false;
        }
        self.slice = Some(SliceMeta { at, angle });
        true
    }
}
