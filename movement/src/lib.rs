pub mod bitmask_flags;
pub mod body;
pub mod character;
pub mod constants;
pub mod crouch;
pub mod error;
pub mod input;
pub mod jump;
pub mod kinematic;
pub mod math;
pub mod motor;
pub mod rapier_world;
pub mod settings;
pub mod stance;
pub mod state;
pub mod velocity;

#[cfg(test)]
mod testing;

pub use body::BodyPose;
pub use character::PlayerCharacter;
pub use error::{MovementError, SettingsError};
pub use input::{CharacterInput, CrouchInput};
pub use kinematic::KinematicMotor;
pub use math::{Quat, Vec2, Vec3};
pub use motor::{CapsuleDimensions, CharacterController, GroundingStatus, Motor};
pub use rapier_world::{ColliderShapeDef, RapierQueryWorld, WorldStaticDef};
pub use settings::{ALL_LAYERS, MovementSettings};
pub use state::{CharacterState, Stance};
