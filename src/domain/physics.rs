/// Motion and overlap: gravity, jumping, hitboxes.
///
/// ## Vertical model
///
/// Every body carries a vertical `velocity` (positive = up) and an
/// `acceleration`. One gravity step is:
///
///   y -= velocity
///   velocity -= acceleration
///
/// and only runs while the body is above its ground line or still moving
/// up. Crossing the ground line clamps `y = base_y` and zeroes velocity.
/// A body that ended up *below* its ground line with zero velocity (the
/// sinking death animations) is left where it is.
///
/// ## Hitboxes
///
/// The hitbox is the visual box shrunk by the body's offsets:
///
///   (x + left, y + up) .. (x + width - right, y + height - down)
///
/// Two bodies collide when their hitboxes overlap on both axes.

use super::entity::Body;

/// Axis-aligned rectangle in world pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn right(&self) -> f32 { self.x + self.w }
    pub fn bottom(&self) -> f32 { self.y + self.h }

    pub fn overlaps(&self, other: &Rect) -> bool {
        self.right() > other.x
            && self.bottom() > other.y
            && self.x < other.right()
            && self.y < other.bottom()
    }
}

// ══════════════════════════════════════════════════════════════
// Gravity
// ══════════════════════════════════════════════════════════════

/// True while the body is higher than its ground line.
/// Projectiles always report airborne.
#[inline]
pub fn is_above_ground(body: &Body) -> bool {
    body.always_airborne || body.y < body.base_y
}

/// On the ground line and not moving vertically.
#[inline]
pub fn is_grounded(body: &Body) -> bool {
    !is_above_ground(body) && body.velocity == 0.0
}

/// Falling = moving down through the air.
#[inline]
pub fn is_falling(body: &Body) -> bool {
    body.velocity < 0.0
}

/// One gravity step.
pub fn apply_gravity(body: &mut Body) {
    if !(is_above_ground(body) || body.velocity > 0.0) {
        return;
    }
    body.y -= body.velocity;
    body.velocity -= body.acceleration;

    if !body.always_airborne && body.y >= body.base_y {
        body.y = body.base_y;
        body.velocity = 0.0;
    }
}

/// Launch upward with `impulse`. Only legal from the ground; calls while
/// airborne (or before the first gravity step after a jump) do nothing.
/// Returns whether the jump happened.
pub fn jump(body: &mut Body, impulse: f32) -> bool {
    if !is_grounded(body) {
        return false;
    }
    body.velocity = impulse;
    true
}

// ══════════════════════════════════════════════════════════════
// Collision
// ══════════════════════════════════════════════════════════════

/// The visual box.
pub fn bounds(body: &Body) -> Rect {
    Rect { x: body.x, y: body.y, w: body.width, h: body.height }
}

/// The visual box shrunk by the offsets.
pub fn hitbox(body: &Body) -> Rect {
    let o = body.offsets;
    Rect {
        x: body.x + o.left,
        y: body.y + o.up,
        w: (body.width - o.left - o.right).max(0.0),
        h: (body.height - o.up - o.down).max(0.0),
    }
}

#[inline]
pub fn is_colliding(a: &Body, b: &Body) -> bool {
    hitbox(a).overlaps(&hitbox(b))
}
