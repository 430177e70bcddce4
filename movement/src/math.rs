use nalgebra as na;

use crate::constants::DIRECTION_EPS_SQ;

/// Common math aliases for clarity and consistency.
pub type Vec3 = na::Vector3<f32>;
pub type Vec2 = na::Vector2<f32>;
pub type Quat = na::UnitQuaternion<f32>;

/// Remove the component of `v` along `normal`.
///
/// `normal` does not need to be unit length. A degenerate normal leaves `v` unchanged.
#[inline]
pub fn project_on_plane(v: Vec3, normal: Vec3) -> Vec3 {
    let n_len_sq = normal.norm_squared();
    if n_len_sq <= DIRECTION_EPS_SQ {
        return v;
    }
    v - normal * (v.dot(&normal) / n_len_sq)
}

/// Shorten `v` to at most `max_len`, keeping its direction.
#[inline]
pub fn clamp_magnitude(v: Vec3, max_len: f32) -> Vec3 {
    let max_len = max_len.max(0.0);
    let len_sq = v.norm_squared();
    if len_sq > max_len * max_len {
        v * (max_len / len_sq.sqrt())
    } else {
        v
    }
}

/// Normalize `v`, returning zero for degenerate input instead of NaNs.
#[inline]
pub fn normalize_or_zero(v: Vec3) -> Vec3 {
    let len_sq = v.norm_squared();
    if len_sq <= DIRECTION_EPS_SQ {
        Vec3::zeros()
    } else {
        v / len_sq.sqrt()
    }
}

/// Unit direction tangent to a surface that keeps the heading of `direction`.
///
/// The result lies in the plane of `surface_normal` and in the vertical plane spanned by
/// `direction` and `up`, so walking up or down a slope keeps the same compass heading.
/// Returns zero when `direction` is degenerate or parallel to `up`.
#[inline]
pub fn direction_tangent_to_surface(direction: Vec3, surface_normal: Vec3, up: Vec3) -> Vec3 {
    let direction_right = direction.cross(&up);
    normalize_or_zero(surface_normal.cross(&direction_right))
}

/// Interpolation factor for frame-rate independent exponential smoothing.
///
/// `lerp(a, b, damp_factor(r, dt))` applied twice with `dt / 2` lands on the same value as
/// once with `dt`.
#[inline]
pub fn damp_factor(response: f32, dt_seconds: f32) -> f32 {
    1.0 - (-response * dt_seconds).exp()
}

/// Smooth `current` toward `target` with [`damp_factor`].
#[inline]
pub fn damp_vec3(current: Vec3, target: Vec3, response: f32, dt_seconds: f32) -> Vec3 {
    current.lerp(&target, damp_factor(response, dt_seconds))
}

/// Smooth a scalar toward `target` with [`damp_factor`].
#[inline]
pub fn damp_f32(current: f32, target: f32, response: f32, dt_seconds: f32) -> f32 {
    current + (target - current) * damp_factor(response, dt_seconds)
}

/// Rotation whose forward axis (-Z) points along `forward` with the given `up`.
///
/// Returns `None` if `forward` is too small or parallel to `up`; callers keep their
/// current rotation in that case.
#[inline]
pub fn look_rotation(forward: Vec3, up: Vec3) -> Option<Quat> {
    if forward.norm_squared() <= DIRECTION_EPS_SQ {
        return None;
    }
    if forward.cross(&up).norm_squared() <= DIRECTION_EPS_SQ {
        return None;
    }

    // `face_towards` maps +Z onto its direction argument, so aim +Z backwards.
    Some(Quat::face_towards(&-forward, &up))
}
