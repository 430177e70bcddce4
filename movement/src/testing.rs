//! In-memory motor for driving the controller in unit tests.

use crate::{
    character::PlayerCharacter,
    constants::{FORWARD, RIGHT, UP},
    math::{Quat, Vec3, project_on_plane},
    motor::{CapsuleDimensions, CharacterController, GroundingStatus, Motor},
    settings::MovementSettings,
    stance::{WallContacts, WallSide},
};

/// Motor whose world is a script: tests set the ground, walls and ceiling directly.
#[derive(Clone, Debug)]
pub struct ScriptedMotor {
    pub capsule: CapsuleDimensions,
    /// Walkable ground normal, or `None` when nothing walkable is below.
    pub ground: Option<Vec3>,
    /// Unwalkable ground seen by the probe while `ground` is `None`.
    pub steep_ground: Option<Vec3>,
    /// Sides with a wall within `wall_distance`.
    pub walls: WallContacts,
    pub wall_distance: f32,
    /// Colliders overlapping any capsule taller than the crouch capsule.
    pub ceiling_overlaps: usize,
    /// Surfaces reported by every sweep.
    pub hit_normals: Vec<Vec3>,
    pub position: Vec3,
    pub rotation: Quat,
    pub velocity: Vec3,
    pub grounding: GroundingStatus,
    crouch_height: f32,
    unground_pending: bool,
}

impl ScriptedMotor {
    pub fn standing(settings: &MovementSettings) -> Self {
        Self {
            capsule: CapsuleDimensions::grounded(0.5, settings.stand_height),
            ground: Some(UP),
            steep_ground: None,
            walls: WallContacts::default(),
            wall_distance: 0.5,
            ceiling_overlaps: 0,
            hit_normals: Vec::new(),
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            velocity: Vec3::zeros(),
            grounding: GroundingStatus::stable(UP),
            crouch_height: settings.crouch_height,
            unground_pending: false,
        }
    }

    pub fn airborne(settings: &MovementSettings) -> Self {
        Self {
            ground: None,
            grounding: GroundingStatus::airborne(UP),
            ..Self::standing(settings)
        }
    }

    pub fn wall(&mut self, side: WallSide) {
        self.walls.add(side);
    }

    /// Run one step in the same callback order as the kinematic motor.
    pub fn step(&mut self, controller: &mut dyn CharacterController, dt: f32) {
        controller.before_update(self, dt);
        self.probe();
        controller.post_grounding_update(self, dt);

        let mut rotation = self.rotation;
        controller.update_rotation(self, &mut rotation, dt);
        self.rotation = rotation;

        let mut velocity = self.velocity;
        controller.update_velocity(self, &mut velocity, dt);
        for normal in self.hit_normals.clone() {
            controller.on_movement_hit(normal);
            if velocity.dot(&normal) < 0.0 {
                velocity = project_on_plane(velocity, normal);
            }
        }
        self.velocity = velocity;
        self.position += velocity * dt;

        controller.after_update(self, dt);
    }

    pub fn run(&mut self, character: &mut PlayerCharacter, steps: usize, dt: f32) {
        for _ in 0..steps {
            self.step(character, dt);
        }
    }

    fn probe(&mut self) {
        if self.unground_pending {
            self.unground_pending = false;
            self.grounding = GroundingStatus::airborne(UP);
            return;
        }
        self.grounding = match (self.ground, self.steep_ground) {
            (Some(normal), _) => GroundingStatus::stable(normal),
            (None, Some(normal)) => GroundingStatus {
                is_stable_on_ground: false,
                found_any_ground: true,
                ground_normal: normal,
            },
            (None, None) => GroundingStatus::airborne(UP),
        };
        if self.grounding.is_stable_on_ground {
            self.velocity = project_on_plane(self.velocity, self.grounding.ground_normal);
        }
    }
}

impl Motor for ScriptedMotor {
    fn capsule(&self) -> CapsuleDimensions {
        self.capsule
    }

    fn set_capsule_dimensions(&mut self, dims: CapsuleDimensions) {
        self.capsule = dims;
    }

    fn grounding(&self) -> GroundingStatus {
        self.grounding
    }

    fn character_up(&self) -> Vec3 {
        self.rotation * UP
    }

    fn character_forward(&self) -> Vec3 {
        self.rotation * FORWARD
    }

    fn character_right(&self) -> Vec3 {
        self.rotation * RIGHT
    }

    fn character_overlap(&self, _position: Vec3, _rotation: Quat, _mask: u32) -> usize {
        if self.capsule.height > self.crouch_height {
            self.ceiling_overlaps
        } else {
            0
        }
    }

    fn raycast(&self, _origin: Vec3, direction: Vec3, max_distance: f32, _mask: u32) -> bool {
        if self.wall_distance > max_distance {
            return false;
        }
        let direction = direction.normalize();
        let side = if direction.dot(&self.character_forward()) > 0.9 {
            WallSide::Forward
        } else if direction.dot(&self.character_right()) > 0.9 {
            WallSide::Right
        } else if direction.dot(&self.character_right()) < -0.9 {
            WallSide::Left
        } else {
            return false;
        };
        self.walls.has(side)
    }

    fn force_unground(&mut self, _grace_time: f32) {
        self.unground_pending = true;
        self.grounding = GroundingStatus::airborne(UP);
    }

    fn transient_position(&self) -> Vec3 {
        self.position
    }

    fn set_transient_position(&mut self, position: Vec3) {
        self.position = position;
    }

    fn transient_rotation(&self) -> Quat {
        self.rotation
    }

    fn set_transient_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation;
    }

    fn velocity(&self) -> Vec3 {
        self.velocity
    }

    fn set_base_velocity(&mut self, velocity: Vec3) {
        self.velocity = velocity;
    }

    fn collidable_layers(&self) -> u32 {
        u32::MAX
    }
}
