/*!
Boundary between the movement core and the collision motor.

The motor owns collision: ground probing, capsule sweeps, overlap queries and the final
resolved pose. The movement core owns intent: stance, velocity and jump decisions. Instead of
the two holding references to each other, the motor drives a [`CharacterController`] through a
fixed sequence of callbacks every step and hands itself to each callback as `&mut dyn Motor`:

1. [`CharacterController::before_update`]
2. ground probe (motor)
3. [`CharacterController::post_grounding_update`]
4. [`CharacterController::update_rotation`]
5. [`CharacterController::update_velocity`]
6. sweep and resolve (motor), reporting [`CharacterController::on_movement_hit`]
7. [`CharacterController::after_update`]

The order is load-bearing: velocity decisions read the wall flags computed in
`before_update`, and `after_update` commits the grounding the motor resolved.
*/

use crate::math::{Quat, Vec3};

/// Capsule geometry in the character's local frame.
///
/// `height` is the full height including both caps. `center_offset` is the distance from the
/// character's origin (its feet) to the capsule center along the up axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CapsuleDimensions {
    pub radius: f32,
    pub height: f32,
    pub center_offset: f32,
}

impl CapsuleDimensions {
    /// Capsule standing on the character origin: the center sits at half the height.
    #[inline]
    pub fn grounded(radius: f32, height: f32) -> Self {
        Self {
            radius,
            height,
            center_offset: height * 0.5,
        }
    }

    /// Half-length of the cylindrical section, as used by Y-aligned capsule shapes.
    #[inline]
    pub fn half_segment(&self) -> f32 {
        (self.height * 0.5 - self.radius).max(0.0)
    }
}

/// Result of the motor's ground probe for the current step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GroundingStatus {
    /// Ground was found and is walkable.
    pub is_stable_on_ground: bool,
    /// Any ground was found within probe distance, walkable or not.
    pub found_any_ground: bool,
    /// Surface normal of the probed ground. Equals the character up axis when nothing was hit.
    pub ground_normal: Vec3,
}

impl GroundingStatus {
    pub fn airborne(up: Vec3) -> Self {
        Self {
            is_stable_on_ground: false,
            found_any_ground: false,
            ground_normal: up,
        }
    }

    pub fn stable(normal: Vec3) -> Self {
        Self {
            is_stable_on_ground: true,
            found_any_ground: true,
            ground_normal: normal,
        }
    }
}

/// The character's orientation axes for the current step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CharacterBasis {
    pub up: Vec3,
    pub forward: Vec3,
    pub right: Vec3,
}

impl CharacterBasis {
    pub fn of(motor: &dyn Motor) -> Self {
        Self {
            up: motor.character_up(),
            forward: motor.character_forward(),
            right: motor.character_right(),
        }
    }
}

/// Capabilities the movement core consumes from the collision motor.
///
/// Everything is synchronous; the core never keeps references to motor data beyond the
/// callback it was given.
pub trait Motor {
    fn capsule(&self) -> CapsuleDimensions;
    fn set_capsule_dimensions(&mut self, dims: CapsuleDimensions);

    fn grounding(&self) -> GroundingStatus;

    fn character_up(&self) -> Vec3;
    fn character_forward(&self) -> Vec3;
    fn character_right(&self) -> Vec3;

    /// Number of colliders in `mask` overlapping the current capsule placed at `position`
    /// and `rotation`.
    fn character_overlap(&self, position: Vec3, rotation: Quat, mask: u32) -> usize;

    /// Whether a collider in `mask` lies along `direction` from `origin` within `max_distance`.
    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32, mask: u32) -> bool;

    /// Skip stable grounding on the next probe (and for `grace_time` seconds beyond it).
    fn force_unground(&mut self, grace_time: f32);

    fn transient_position(&self) -> Vec3;
    fn set_transient_position(&mut self, position: Vec3);
    fn transient_rotation(&self) -> Quat;
    fn set_transient_rotation(&mut self, rotation: Quat);

    /// Velocity the motor resolved for the current step.
    fn velocity(&self) -> Vec3;
    fn set_base_velocity(&mut self, velocity: Vec3);

    /// Layers the character collides with; used for the uncrouch overlap test.
    fn collidable_layers(&self) -> u32;
}

/// Callbacks the motor invokes, in the order listed in the module docs.
pub trait CharacterController {
    fn before_update(&mut self, motor: &mut dyn Motor, dt: f32);
    fn post_grounding_update(&mut self, motor: &mut dyn Motor, dt: f32);
    fn update_rotation(&mut self, motor: &mut dyn Motor, rotation: &mut Quat, dt: f32);
    fn update_velocity(&mut self, motor: &mut dyn Motor, velocity: &mut Vec3, dt: f32);
    fn after_update(&mut self, motor: &mut dyn Motor, dt: f32);

    /// Called for every surface the sweep collided with. `normal` points away from the surface.
    fn on_movement_hit(&mut self, _normal: Vec3) {}
}
