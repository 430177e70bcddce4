/*!
Reference [`Motor`] backed by a Rapier query world.

Ground detection is a single ray from just above the feet. Sweeps go through Rapier's
`KinematicCharacterController`, which slides the capsule along whatever it hits; every hit
is reported to the controller and strips the velocity component pointing into the surface.
*/

use std::sync::Arc;

use log::trace;
use rapier3d::{
    control::{CharacterAutostep, CharacterLength, KinematicCharacterController},
    na::Translation3,
    prelude::{Capsule, Isometry, QueryFilter},
};

use crate::{
    constants::{FORWARD, RIGHT, UP},
    math::{Quat, Vec3, project_on_plane},
    motor::{CapsuleDimensions, CharacterController, GroundingStatus, Motor},
    rapier_world::RapierQueryWorld,
    settings::ALL_LAYERS,
};

/// The ground ray starts this far above the feet so it never starts inside the floor.
const GROUND_PROBE_LIFT: f32 = 0.1;
/// How far below the feet a grounded character keeps following the ground.
const GROUND_SNAP_DISTANCE: f32 = 0.25;
/// How close the ground must be for an airborne character to land.
const LANDING_DISTANCE: f32 = 0.06;
/// Gap kept between the capsule and the ground.
const SKIN: f32 = 0.02;
/// Overlap tests use a slightly thinner capsule so resting contact does not count.
const OVERLAP_SHRINK: f32 = 0.01;
/// cos(50°): steeper ground is found but not walkable.
const MIN_GROUND_NORMAL_UP: f32 = 0.642_787_6;

pub struct KinematicMotor {
    world: Arc<RapierQueryWorld>,
    kcc: KinematicCharacterController,
    capsule: CapsuleDimensions,
    position: Vec3,
    rotation: Quat,
    velocity: Vec3,
    grounding: GroundingStatus,
    layers: u32,
    /// Remaining forced-airborne time; `Some` skips stable grounding.
    unground: Option<f32>,
}

struct GroundProbe {
    status: GroundingStatus,
    gap: f32,
}

impl KinematicMotor {
    pub fn new(world: Arc<RapierQueryWorld>, position: Vec3, capsule: CapsuleDimensions) -> Self {
        let kcc = KinematicCharacterController {
            autostep: Some(CharacterAutostep {
                include_dynamic_bodies: false,
                max_height: CharacterLength::Relative(0.2),
                ..CharacterAutostep::default()
            }),
            offset: CharacterLength::Absolute(SKIN),
            snap_to_ground: None,
            ..KinematicCharacterController::default()
        };

        Self {
            world,
            kcc,
            capsule,
            position,
            rotation: Quat::identity(),
            velocity: Vec3::zeros(),
            grounding: GroundingStatus::airborne(UP),
            layers: ALL_LAYERS,
            unground: None,
        }
    }

    pub fn with_layers(mut self, layers: u32) -> Self {
        self.layers = layers;
        self
    }

    /// Advance one step, invoking `character` in callback order.
    pub fn update(&mut self, character: &mut dyn CharacterController, dt: f32) {
        if !(dt > 0.0) {
            trace!("skipping motor update with dt {dt}");
            return;
        }

        character.before_update(self, dt);

        let was_stable = self.grounding.is_stable_on_ground;
        let probe = self.probe_ground(was_stable);
        self.grounding = probe.status;
        if self.grounding.is_stable_on_ground {
            self.position -= self.character_up() * (probe.gap - SKIN);
            self.velocity = project_on_plane(self.velocity, self.grounding.ground_normal);
        }
        if let Some(remaining) = self.unground {
            let remaining = remaining - dt;
            self.unground = (remaining > 0.0).then_some(remaining);
        }

        character.post_grounding_update(self, dt);

        let mut rotation = self.rotation;
        character.update_rotation(self, &mut rotation, dt);
        self.rotation = rotation;

        let mut velocity = self.velocity;
        character.update_velocity(self, &mut velocity, dt);
        self.velocity = velocity;

        self.sweep(character, dt);

        let stable_before_move = self.grounding.is_stable_on_ground;
        self.grounding = self.probe_ground(stable_before_move).status;

        character.after_update(self, dt);
    }

    fn sweep(&mut self, character: &mut dyn CharacterController, dt: f32) {
        let world = Arc::clone(&self.world);
        let pipeline = world.query_pipeline(QueryFilter::only_fixed());

        let shape = Capsule::new_y(self.capsule.half_segment(), self.capsule.radius);
        let center = self.position + self.character_up() * self.capsule.center_offset;
        let pose = Isometry::from_parts(Translation3::from(center), self.rotation);
        let desired = self.velocity * dt;

        let mut normals = Vec::new();
        let movement = self.kcc.move_shape(dt, &pipeline, &shape, &pose, desired, |collision| {
            normals.push(-collision.hit.normal1.into_inner());
        });
        self.position += movement.translation;

        for normal in normals {
            // Normals point away from the surface, against the attempted motion.
            let normal = if normal.dot(&desired) > 0.0 { -normal } else { normal };
            character.on_movement_hit(normal);
            if self.velocity.dot(&normal) < 0.0 {
                self.velocity = project_on_plane(self.velocity, normal);
            }
        }
    }

    fn probe_ground(&self, was_stable: bool) -> GroundProbe {
        let up = self.character_up();
        let origin = self.position + up * GROUND_PROBE_LIFT;
        let reach = GROUND_PROBE_LIFT + GROUND_SNAP_DISTANCE;

        let Some(hit) = self.world.cast_ray(origin, -up, reach, self.layers) else {
            return GroundProbe {
                status: GroundingStatus::airborne(up),
                gap: f32::INFINITY,
            };
        };

        let gap = hit.distance - GROUND_PROBE_LIFT;
        let walkable = hit.normal.dot(&up) >= MIN_GROUND_NORMAL_UP;
        let in_reach = if was_stable {
            gap <= GROUND_SNAP_DISTANCE
        } else {
            gap <= LANDING_DISTANCE && self.velocity.dot(&up) <= 0.0
        };

        GroundProbe {
            status: GroundingStatus {
                is_stable_on_ground: walkable && in_reach && self.unground.is_none(),
                found_any_ground: true,
                ground_normal: hit.normal,
            },
            gap,
        }
    }
}

impl Motor for KinematicMotor {
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

    fn character_overlap(&self, position: Vec3, rotation: Quat, mask: u32) -> usize {
        let radius = (self.capsule.radius - OVERLAP_SHRINK).max(OVERLAP_SHRINK);
        let shape = Capsule::new_y(self.capsule.half_segment(), radius);
        let center = position + rotation * UP * self.capsule.center_offset;
        let pose = Isometry::from_parts(Translation3::from(center), rotation);
        self.world.count_overlaps(&pose, &shape, mask)
    }

    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32, mask: u32) -> bool {
        self.world
            .cast_ray(origin, direction, max_distance, mask)
            .is_some()
    }

    fn force_unground(&mut self, grace_time: f32) {
        self.unground = Some(grace_time.max(0.0));
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
        self.layers
    }
}
