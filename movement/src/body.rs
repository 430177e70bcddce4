use crate::{math::damp_f32, settings::MovementSettings, state::Stance};

/// Smoothed visual pose derived from the capsule: where the camera sits and how tall the
/// rendered body is relative to standing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodyPose {
    pub eye_height: f32,
    pub height_scale: f32,
}

impl BodyPose {
    pub fn standing(settings: &MovementSettings) -> Self {
        Self {
            eye_height: settings.stand_height * settings.stand_eye_ratio,
            height_scale: 1.0,
        }
    }

    /// Advance the smoothing toward the pose for `capsule_height` in `stance`.
    pub fn update(
        &mut self,
        capsule_height: f32,
        stance: Stance,
        settings: &MovementSettings,
        dt: f32,
    ) {
        let eye_ratio = if stance.is_crouched() {
            settings.crouch_eye_ratio
        } else {
            settings.stand_eye_ratio
        };
        let response = settings.crouch_height_response;

        self.eye_height = damp_f32(self.eye_height, capsule_height * eye_ratio, response, dt);
        self.height_scale = damp_f32(
            self.height_scale,
            capsule_height / settings.stand_height,
            response,
            dt,
        );
    }
}
