/*!
Per-stance velocity integration.

Each function takes the velocity the motor carried into this step and returns the velocity
the controller wants the motor to sweep with. None of them touch the motor; grounding,
basis and wall contacts are passed in.
*/

use crate::{
    constants::WALL_STICK_FRACTION,
    math::{
        Vec3, clamp_magnitude, damp_vec3, direction_tangent_to_surface, normalize_or_zero,
        project_on_plane,
    },
    motor::{CharacterBasis, GroundingStatus},
    settings::MovementSettings,
    stance::{WallContacts, WallSide},
};

/// Velocity and the acceleration it reports for feedback layers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VelocityStep {
    pub velocity: Vec3,
    pub acceleration: Vec3,
}

impl VelocityStep {
    fn between(initial: Vec3, velocity: Vec3, dt: f32) -> Self {
        let acceleration = if dt > 0.0 {
            (velocity - initial) / dt
        } else {
            Vec3::zeros()
        };
        Self {
            velocity,
            acceleration,
        }
    }
}

/// Movement request laid onto the ground plane, keeping its magnitude.
pub fn grounded_movement(movement: Vec3, ground_normal: Vec3, up: Vec3) -> Vec3 {
    direction_tangent_to_surface(movement, ground_normal, up) * movement.norm()
}

/// Exponential approach toward `grounded_movement * speed`.
pub fn ground_move(
    current: Vec3,
    grounded_movement: Vec3,
    speed: f32,
    response: f32,
    dt: f32,
) -> VelocityStep {
    let target = grounded_movement * speed;
    let velocity = damp_vec3(current, target, response, dt);
    VelocityStep::between(current, velocity, dt)
}

/// Velocity a slide starts with.
///
/// Landing into a slide keeps the airborne velocity projected onto the ground; otherwise the
/// current velocity is used. The result follows the ground surface and is at least `floor`
/// fast. With no usable velocity the slide goes where the player steers.
pub fn slide_entry(
    current: Vec3,
    previous: Vec3,
    was_airborne: bool,
    grounded_movement: Vec3,
    ground_normal: Vec3,
    up: Vec3,
    floor: f32,
) -> Vec3 {
    let base = if was_airborne {
        project_on_plane(previous, ground_normal)
    } else {
        current
    };
    let mut direction = direction_tangent_to_surface(base, ground_normal, up);
    if direction.norm_squared() == 0.0 {
        direction = direction_tangent_to_surface(grounded_movement, ground_normal, up);
    }
    direction * base.norm().max(floor)
}

/// Redirect `velocity` toward the steering target without ever gaining speed.
pub fn steer(velocity: Vec3, grounded_movement: Vec3, steer_acceleration: f32, dt: f32) -> Vec3 {
    let speed = velocity.norm();
    let target = grounded_movement * speed;
    let steered = velocity + (target - velocity) * (steer_acceleration * dt);
    clamp_magnitude(steered, speed)
}

/// One slide step: friction, then gravity along the slope, then steering.
pub fn slide(
    current: Vec3,
    grounded_movement: Vec3,
    ground_normal: Vec3,
    up: Vec3,
    settings: &MovementSettings,
    dt: f32,
) -> VelocityStep {
    let mut velocity = current - current * (settings.slide_friction * dt);

    // Negative slide gravity pulls downhill: -up projected onto the slope points uphill.
    let slope_force = project_on_plane(-up, ground_normal) * settings.slide_gravity;
    velocity -= slope_force * dt;

    let velocity = steer(
        velocity,
        grounded_movement,
        settings.slide_steer_acceleration,
        dt,
    );
    VelocityStep::between(current, velocity, dt)
}

/// Planar air control.
///
/// Below `air_speed` input accelerates up to the cap. Above it, input can only turn or slow
/// the character. When the probe saw unwalkable ground, input may not push the character up
/// that slope.
pub fn air_control(
    current: Vec3,
    movement: Vec3,
    up: Vec3,
    grounding: &GroundingStatus,
    settings: &MovementSettings,
    dt: f32,
) -> Vec3 {
    if movement.norm_squared() == 0.0 {
        return current;
    }

    let planar_movement = normalize_or_zero(project_on_plane(movement, up)) * movement.norm();
    let current_planar = project_on_plane(current, up);
    let mut force = planar_movement * (settings.air_acceleration * dt);

    if current_planar.norm() < settings.air_speed {
        let target = clamp_magnitude(current_planar + force, settings.air_speed);
        force = target - current_planar;
    } else if current_planar.dot(&force) > 0.0 {
        force = project_on_plane(force, normalize_or_zero(current_planar));
    }

    if grounding.found_any_ground && force.dot(&(current + force)) > 0.0 {
        // `up × n` runs along the slope and would remove the sideways push instead; crossing
        // it with `up` again gives the horizontal slope normal, so only the uphill part goes.
        let obstruction = normalize_or_zero(up.cross(&grounding.ground_normal).cross(&up));
        force = project_on_plane(force, obstruction);
    }

    current + force
}

/// Gravity along `up`, softened while jump is held and the character still rises.
pub fn apply_gravity(
    current: Vec3,
    up: Vec3,
    settings: &MovementSettings,
    jump_sustain: bool,
    dt: f32,
) -> Vec3 {
    let rising = current.dot(&up) > 0.0;
    let gravity = if jump_sustain && rising {
        settings.gravity * settings.jump_sustain_gravity
    } else {
        settings.gravity
    };
    current + up * (gravity * dt)
}

/// Wall-run step: no vertical speed, a push along the run, and a small force into the wall.
///
/// A wall ahead of the character turns the push upwards.
pub fn wall_run(
    current: Vec3,
    basis: &CharacterBasis,
    walls: WallContacts,
    settings: &MovementSettings,
    dt: f32,
) -> Vec3 {
    let mut velocity = project_on_plane(current, basis.up);
    if velocity.norm() > settings.max_wall_speed {
        return velocity;
    }

    let push = settings.wall_run_force * dt;
    if walls.has(WallSide::Forward) {
        velocity += basis.up * push;
    } else {
        velocity += basis.forward * push;
    }

    let stick = push * WALL_STICK_FRACTION;
    if walls.has(WallSide::Right) {
        velocity += basis.right * stick;
    } else if walls.has(WallSide::Left) {
        velocity -= basis.right * stick;
    } else {
        velocity += basis.forward * stick;
    }
    velocity
}
