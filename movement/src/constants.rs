use crate::math::Vec3;

/// World up axis. The controller keeps its capsule aligned with this axis.
pub const UP: Vec3 = Vec3::new(0.0, 1.0, 0.0);

/// Local forward axis of the character (`rotation * FORWARD` is the facing direction).
///
/// Convention: right-handed, +Y up, -Z forward, +X right.
pub const FORWARD: Vec3 = Vec3::new(0.0, 0.0, -1.0);

/// Local right axis of the character.
pub const RIGHT: Vec3 = Vec3::new(1.0, 0.0, 0.0);

/// Squared length below which a direction is treated as degenerate (zero).
pub const DIRECTION_EPS_SQ: f32 = 1.0e-8;

/// Dead zone applied to raw move axes when deriving held directional keys.
///
/// Analog sticks rarely rest at exactly zero; anything below this magnitude on an axis
/// does not count as "holding" that direction for wall-run and wall-hop decisions.
pub const HELD_AXIS_DEADZONE: f32 = 0.1;

/// Horizontal velocity push applied by wall hops, as a fraction of `jump_speed`.
pub const WALL_HOP_LATERAL_SCALE: f32 = 0.5;

/// Vertical boost applied by wall hops and detach jumps, as a multiple of `jump_speed`.
pub const WALL_HOP_VERTICAL_SCALE: f32 = 1.5;

/// Fraction of `wall_run_force` used to pull the character into the wall it is running on.
pub const WALL_STICK_FRACTION: f32 = 0.2;
