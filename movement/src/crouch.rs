use log::trace;

use crate::{
    motor::{CapsuleDimensions, Motor},
    settings::MovementSettings,
};

/// Outcome of an attempt to stand up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StandAttempt {
    Stood,
    /// Standing geometry would overlap something; the capsule stays crouched.
    Blocked,
}

fn with_height(motor: &dyn Motor, height: f32) -> CapsuleDimensions {
    CapsuleDimensions::grounded(motor.capsule().radius, height)
}

pub fn stand_capsule(motor: &dyn Motor, settings: &MovementSettings) -> CapsuleDimensions {
    with_height(motor, settings.stand_height)
}

pub fn crouch_capsule(motor: &dyn Motor, settings: &MovementSettings) -> CapsuleDimensions {
    with_height(motor, settings.crouch_height)
}

/// Switch the motor to crouched geometry. Always succeeds.
pub fn shrink(motor: &mut dyn Motor, settings: &MovementSettings) {
    let dims = crouch_capsule(motor, settings);
    motor.set_capsule_dimensions(dims);
}

/// The motor capsule is shorter than standing height.
pub fn is_shrunk(motor: &dyn Motor, settings: &MovementSettings) -> bool {
    motor.capsule().height < settings.stand_height
}

/// Try standing geometry at the pending pose and keep it only if nothing overlaps.
pub fn try_stand(motor: &mut dyn Motor, settings: &MovementSettings) -> StandAttempt {
    let crouched = motor.capsule();
    let standing = stand_capsule(motor, settings);
    motor.set_capsule_dimensions(standing);

    let overlaps = motor.character_overlap(
        motor.transient_position(),
        motor.transient_rotation(),
        motor.collidable_layers(),
    );
    if overlaps > 0 {
        trace!("uncrouch blocked by {overlaps} collider(s)");
        motor.set_capsule_dimensions(crouched);
        StandAttempt::Blocked
    } else {
        StandAttempt::Stood
    }
}
