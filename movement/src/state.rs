use crate::math::Vec3;

/// Discrete locomotion mode. Each stance has its own capsule geometry and velocity rules.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Stance {
    #[default]
    Stand,
    Crouch,
    Slide,
    WallRun,
}

impl Stance {
    /// Stances that use the short capsule.
    #[inline]
    pub fn is_crouched(self) -> bool {
        matches!(self, Stance::Crouch | Stance::Slide)
    }
}

/// Kinematic snapshot of the character, published once per simulation step.
///
/// Readers (camera, lean, vignette) only ever see copies of this value; the controller is
/// the single writer.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CharacterState {
    /// Whether the motor reported stable ground at the end of the step.
    pub grounded: bool,
    pub stance: Stance,
    /// Velocity after the motor resolved the step (m/s).
    pub velocity: Vec3,
    /// Effective change of velocity applied by the integrator this step (m/s²).
    ///
    /// Cosmetic observable for lean/feedback layers, not a mass-based acceleration. Its
    /// magnitude never exceeds the measured velocity change of the step divided by `dt`.
    pub acceleration: Vec3,
}
