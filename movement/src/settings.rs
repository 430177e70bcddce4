/*!
Movement tunables.

All speeds are in meters per second, accelerations in meters per second squared, times in
seconds and heights in meters. Gravity-like values are signed along the character's up axis,
so falling uses negative numbers.

Settings are validated once when a character is created ([`MovementSettings::validated`]);
the per-step code trusts them.
*/

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::SettingsError;

/// Collision mask that matches every layer.
pub const ALL_LAYERS: u32 = u32::MAX;

/// Tunable constants for one character.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MovementSettings {
    /// Top ground speed while standing.
    pub walk_speed: f32,
    /// Top ground speed while crouched.
    pub crouch_speed: f32,
    /// Exponential response rate toward the standing target velocity (1/s).
    pub walk_response: f32,
    /// Exponential response rate toward the crouched target velocity (1/s).
    pub crouch_response: f32,

    /// Minimum vertical speed granted by a jump.
    pub jump_speed: f32,
    /// Grace window after walking off a ledge during which a jump is still honored.
    /// Also the lifetime of a buffered jump request.
    pub coyote_time: f32,
    /// Gravity multiplier while jump is held and the character still rises, in `[0, 1]`.
    pub jump_sustain_gravity: f32,
    /// Gravity along the up axis (negative pulls down).
    pub gravity: f32,

    /// Minimum speed granted when a slide starts from a crouch.
    pub slide_start_speed: f32,
    /// Slides slower than this end in a crouch.
    pub slide_end_speed: f32,
    /// Fraction of slide velocity lost per second.
    pub slide_friction: f32,
    /// How quickly input redirects a slide (1/s).
    pub slide_steer_acceleration: f32,
    /// Gravity applied along the ground plane while sliding (negative pulls downhill).
    pub slide_gravity: f32,

    /// Collision layers that count as runnable walls.
    pub wall_mask: u32,
    /// Length of the forward/right/left wall probes.
    pub wall_probe_distance: f32,
    /// Push applied along the wall while wall-running.
    pub wall_run_force: f32,
    /// Planar speed above which wall-running stops adding push.
    pub max_wall_speed: f32,
    /// Longest uninterrupted wall-run. Zero or less means unlimited.
    pub max_wall_run_time: f32,
    /// Time after a wall jump during which the character cannot attach to a wall again.
    pub wall_rejoin_delay: f32,
    /// When set, attaching to a wall also requires the wall-run input to be held.
    pub require_wall_run_button: bool,

    /// Capsule height while standing.
    pub stand_height: f32,
    /// Capsule height while crouched or sliding.
    pub crouch_height: f32,
    /// Response rate of the eye height / body scale smoothing (1/s).
    pub crouch_height_response: f32,

    /// Planar speed cap that air control may accelerate up to.
    pub air_speed: f32,
    /// Planar acceleration from movement input while airborne.
    pub air_acceleration: f32,

    /// Eye height as a fraction of capsule height while standing, in `[0, 1]`.
    pub stand_eye_ratio: f32,
    /// Eye height as a fraction of capsule height while crouched, in `[0, 1]`.
    pub crouch_eye_ratio: f32,
}

impl Default for MovementSettings {
    fn default() -> Self {
        Self {
            walk_speed: 20.0,
            crouch_speed: 7.0,
            walk_response: 25.0,
            crouch_response: 20.0,

            jump_speed: 20.0,
            coyote_time: 0.2,
            jump_sustain_gravity: 0.4,
            gravity: -90.0,

            slide_start_speed: 25.0,
            slide_end_speed: 15.0,
            slide_friction: 0.08,
            slide_steer_acceleration: 5.0,
            slide_gravity: -90.0,

            wall_mask: ALL_LAYERS,
            wall_probe_distance: 1.0,
            wall_run_force: 40.0,
            max_wall_speed: 25.0,
            max_wall_run_time: 1.5,
            wall_rejoin_delay: 0.25,
            require_wall_run_button: false,

            stand_height: 2.0,
            crouch_height: 1.0,
            crouch_height_response: 15.0,

            air_speed: 15.0,
            air_acceleration: 70.0,

            stand_eye_ratio: 0.9,
            crouch_eye_ratio: 0.2,
        }
    }
}

impl MovementSettings {
    /// Parse settings from TOML. Missing keys fall back to [`Default`]; the result is validated.
    pub fn from_toml_str(src: &str) -> Result<Self, SettingsError> {
        let settings: Self = toml::from_str(src)?;
        settings.validated()
    }

    /// Check and normalize the settings.
    ///
    /// - Every value must be finite.
    /// - Heights and the wall probe length must be positive, crouch shorter than stand.
    /// - Unit-range factors are clamped into `[0, 1]`; rates, speeds and times that cannot be
    ///   negative are clamped to zero. Each clamp is logged.
    pub fn validated(mut self) -> Result<Self, SettingsError> {
        for (name, value) in self.named_values() {
            if !value.is_finite() {
                return Err(SettingsError::NotFinite { name, value });
            }
        }

        for (name, value) in [
            ("stand_height", self.stand_height),
            ("crouch_height", self.crouch_height),
            ("wall_probe_distance", self.wall_probe_distance),
        ] {
            if value <= 0.0 {
                return Err(SettingsError::NotPositive { name, value });
            }
        }

        if self.crouch_height >= self.stand_height {
            return Err(SettingsError::CrouchNotShorter {
                crouch: self.crouch_height,
                stand: self.stand_height,
            });
        }

        clamp_setting("jump_sustain_gravity", &mut self.jump_sustain_gravity, 0.0, 1.0);
        clamp_setting("stand_eye_ratio", &mut self.stand_eye_ratio, 0.0, 1.0);
        clamp_setting("crouch_eye_ratio", &mut self.crouch_eye_ratio, 0.0, 1.0);

        for (name, value) in [
            ("walk_speed", &mut self.walk_speed),
            ("crouch_speed", &mut self.crouch_speed),
            ("walk_response", &mut self.walk_response),
            ("crouch_response", &mut self.crouch_response),
            ("jump_speed", &mut self.jump_speed),
            ("coyote_time", &mut self.coyote_time),
            ("slide_start_speed", &mut self.slide_start_speed),
            ("slide_end_speed", &mut self.slide_end_speed),
            ("slide_friction", &mut self.slide_friction),
            ("slide_steer_acceleration", &mut self.slide_steer_acceleration),
            ("wall_run_force", &mut self.wall_run_force),
            ("max_wall_speed", &mut self.max_wall_speed),
            ("wall_rejoin_delay", &mut self.wall_rejoin_delay),
            ("crouch_height_response", &mut self.crouch_height_response),
            ("air_speed", &mut self.air_speed),
            ("air_acceleration", &mut self.air_acceleration),
        ] {
            clamp_setting(name, value, 0.0, f32::INFINITY);
        }

        Ok(self)
    }

    fn named_values(&self) -> [(&'static str, f32); 25] {
        [
            ("walk_speed", self.walk_speed),
            ("crouch_speed", self.crouch_speed),
            ("walk_response", self.walk_response),
            ("crouch_response", self.crouch_response),
            ("jump_speed", self.jump_speed),
            ("coyote_time", self.coyote_time),
            ("jump_sustain_gravity", self.jump_sustain_gravity),
            ("gravity", self.gravity),
            ("slide_start_speed", self.slide_start_speed),
            ("slide_end_speed", self.slide_end_speed),
            ("slide_friction", self.slide_friction),
            ("slide_steer_acceleration", self.slide_steer_acceleration),
            ("slide_gravity", self.slide_gravity),
            ("wall_probe_distance", self.wall_probe_distance),
            ("wall_run_force", self.wall_run_force),
            ("max_wall_speed", self.max_wall_speed),
            ("max_wall_run_time", self.max_wall_run_time),
            ("wall_rejoin_delay", self.wall_rejoin_delay),
            ("stand_height", self.stand_height),
            ("crouch_height", self.crouch_height),
            ("crouch_height_response", self.crouch_height_response),
            ("air_speed", self.air_speed),
            ("air_acceleration", self.air_acceleration),
            ("stand_eye_ratio", self.stand_eye_ratio),
            ("crouch_eye_ratio", self.crouch_eye_ratio),
        ]
    }
}

fn clamp_setting(name: &str, value: &mut f32, min: f32, max: f32) {
    let clamped = value.clamp(min, max);
    if clamped != *value {
        warn!("movement setting `{name}` = {value} is out of range, clamped to {clamped}");
        *value = clamped;
    }
}
