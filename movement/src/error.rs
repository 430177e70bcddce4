use thiserror::Error;

/// Problems detected while loading or validating [`crate::MovementSettings`].
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to parse movement settings: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("setting `{name}` must be finite, got {value}")]
    NotFinite { name: &'static str, value: f32 },

    #[error("setting `{name}` must be greater than zero, got {value}")]
    NotPositive { name: &'static str, value: f32 },

    #[error("crouch height {crouch} must be smaller than stand height {stand}")]
    CrouchNotShorter { crouch: f32, stand: f32 },
}

/// Fatal conditions raised when a character is initialised.
///
/// Nothing in the per-step path returns an error; a character that was created
/// successfully can always be stepped.
#[derive(Debug, Error)]
pub enum MovementError {
    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error("motor reports a capsule radius of {0}; the character needs capsule geometry")]
    MissingGeometry(f32),

    #[error("capsule diameter {diameter} does not fit inside the crouch height {crouch_height}")]
    CapsuleTooWide { diameter: f32, crouch_height: f32 },
}
