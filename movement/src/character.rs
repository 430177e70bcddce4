/*!
The player character: input latches, stance machine, jump handling and velocity integration
wired into the motor's callback sequence.

Each step works on a private copy of the published [`CharacterState`]. When the step ends the
copy is published and the previous state becomes [`PlayerCharacter::last_state`], so readers
between steps always see two complete snapshots.
*/

use log::{debug, trace};

use crate::{
    body::BodyPose,
    constants::FORWARD,
    crouch::{self, StandAttempt},
    error::MovementError,
    input::{CharacterInput, InputLatch},
    jump::{self, AirTimers, JumpContext, JumpDecision},
    math::{Quat, Vec3, clamp_magnitude, look_rotation, project_on_plane},
    motor::{CharacterBasis, CharacterController, Motor},
    settings::MovementSettings,
    stance::{
        self, WallContacts, WallExit, WallRunContext, WallRunGate, WallRunTransition, WallSide,
    },
    state::{CharacterState, Stance},
    velocity,
};

pub struct PlayerCharacter {
    settings: MovementSettings,
    state: CharacterState,
    last_state: CharacterState,
    /// Working copy mutated during a step, published in `after_update`.
    next: CharacterState,
    input: InputLatch,
    air: AirTimers,
    wall_gate: WallRunGate,
    walls: WallContacts,
    body: BodyPose,
}

impl PlayerCharacter {
    /// Validate `settings`, check the motor's capsule and switch it to standing geometry.
    pub fn new(settings: MovementSettings, motor: &mut dyn Motor) -> Result<Self, MovementError> {
        let settings = settings.validated()?;

        let radius = motor.capsule().radius;
        if !(radius > 0.0 && radius.is_finite()) {
            return Err(MovementError::MissingGeometry(radius));
        }
        if radius * 2.0 > settings.crouch_height {
            return Err(MovementError::CapsuleTooWide {
                diameter: radius * 2.0,
                crouch_height: settings.crouch_height,
            });
        }

        let standing = crouch::stand_capsule(motor, &settings);
        motor.set_capsule_dimensions(standing);

        let state = CharacterState {
            grounded: motor.grounding().is_stable_on_ground,
            velocity: motor.velocity(),
            ..CharacterState::default()
        };
        let body = BodyPose::standing(&settings);

        Ok(Self {
            settings,
            state,
            last_state: state,
            next: state,
            input: InputLatch::default(),
            air: AirTimers::default(),
            wall_gate: WallRunGate::default(),
            walls: WallContacts::default(),
            body,
        })
    }

    /// Latch one frame of input. Applying the same numbered frame twice has no further effect.
    pub fn apply_input(&mut self, input: &CharacterInput) {
        self.input.apply(input, self.state.grounded);
    }

    /// State published by the most recent step.
    pub fn state(&self) -> CharacterState {
        self.state
    }

    /// State published by the step before the most recent one.
    pub fn last_state(&self) -> CharacterState {
        self.last_state
    }

    pub fn settings(&self) -> &MovementSettings {
        &self.settings
    }

    pub fn input(&self) -> &InputLatch {
        &self.input
    }

    pub fn wall_contacts(&self) -> WallContacts {
        self.walls
    }

    pub fn shoot_held(&self) -> bool {
        self.input.shoot
    }

    /// Advance eye height and body scale toward the current capsule.
    pub fn update_body(&mut self, motor: &dyn Motor, dt: f32) -> BodyPose {
        let height = motor.capsule().height;
        self.body.update(height, self.state.stance, &self.settings, dt);
        self.body
    }

    pub fn body(&self) -> BodyPose {
        self.body
    }

    /// Teleport the character. Stance, latches and timers are kept.
    pub fn set_position(&mut self, motor: &mut dyn Motor, position: Vec3, kill_velocity: bool) {
        debug!("teleport to {position:?} (kill velocity: {kill_velocity})");
        motor.set_transient_position(position);
        if kill_velocity {
            motor.set_base_velocity(Vec3::zeros());
            self.state.velocity = Vec3::zeros();
            self.state.acceleration = Vec3::zeros();
        }
    }

    fn probe_walls(&self, motor: &dyn Motor) -> WallContacts {
        let up = motor.character_up();
        let origin = motor.transient_position() + up * motor.capsule().center_offset;
        let distance = self.settings.wall_probe_distance;
        let mask = self.settings.wall_mask;

        let mut walls = WallContacts::default();
        for (side, direction) in [
            (WallSide::Forward, motor.character_forward()),
            (WallSide::Right, motor.character_right()),
            (WallSide::Left, -motor.character_right()),
        ] {
            walls.set_if(side, motor.raycast(origin, direction, distance, mask));
        }
        walls
    }

    fn update_walls(&mut self, motor: &dyn Motor, dt: f32) {
        self.walls = self.probe_walls(motor);

        let ctx = WallRunContext {
            stance: self.next.stance,
            walls: self.walls,
            held: self.input.held,
            stably_grounded: motor.grounding().is_stable_on_ground,
            wall_run_held: self.input.wall_run,
            require_wall_run_button: self.settings.require_wall_run_button,
            max_wall_run_time: self.settings.max_wall_run_time,
            gate: &self.wall_gate,
        };
        match stance::wall_run_transition(&ctx) {
            WallRunTransition::Enter => {
                debug!("wall-run start, walls {:#05b}", self.walls.bits);
                self.next.stance = Stance::WallRun;
            }
            WallRunTransition::Exit(WallExit::LostWall) => {
                debug!("wall-run end: no wall");
                self.next.stance = Stance::Stand;
                self.air.restart_coyote();
            }
            WallRunTransition::Exit(WallExit::TimeLimit) => {
                debug!(
                    "wall-run end: attached for {:.2}s",
                    self.wall_gate.attached_for()
                );
                self.next.stance = Stance::Stand;
                self.wall_gate.exhaust();
            }
            WallRunTransition::Exit(WallExit::Landed) => {
                debug!("wall-run end: landed");
                self.next.stance = Stance::Stand;
            }
            WallRunTransition::Keep => {}
        }
        self.wall_gate.track(self.next.stance == Stance::WallRun, dt);
    }

    fn update_grounded_velocity(
        &mut self,
        motor: &dyn Motor,
        velocity: &mut Vec3,
        basis: &CharacterBasis,
        dt: f32,
    ) {
        self.air.land();
        self.wall_gate.land();

        let ground_normal = motor.grounding().ground_normal;
        let movement = velocity::grounded_movement(self.input.movement, ground_normal, basis.up);
        let moving = movement.norm_squared() > 0.0;

        if stance::starts_slide(true, moving, self.next.stance, &self.state) {
            let was_airborne = !self.state.grounded;
            let floor = stance::slide_entry_floor(
                self.state.grounded,
                self.input.crouch_in_air,
                self.settings.slide_start_speed,
            );
            *velocity = velocity::slide_entry(
                *velocity,
                self.state.velocity,
                was_airborne,
                movement,
                ground_normal,
                basis.up,
                floor,
            );
            debug!(
                "slide start at {:.2} m/s (landing: {was_airborne})",
                velocity.norm()
            );
            self.next.stance = Stance::Slide;
        }

        let step = match self.next.stance {
            // A wall-run that touched ground this step walks until the stance catches up.
            Stance::Stand | Stance::WallRun => velocity::ground_move(
                *velocity,
                movement,
                self.settings.walk_speed,
                self.settings.walk_response,
                dt,
            ),
            Stance::Crouch => velocity::ground_move(
                *velocity,
                movement,
                self.settings.crouch_speed,
                self.settings.crouch_response,
                dt,
            ),
            Stance::Slide => {
                let step = velocity::slide(
                    *velocity,
                    movement,
                    ground_normal,
                    basis.up,
                    &self.settings,
                    dt,
                );
                let stance = stance::after_slide(step.velocity.norm(), self.settings.slide_end_speed);
                if stance != Stance::Slide {
                    debug!("slide end at {:.2} m/s", step.velocity.norm());
                    self.next.stance = stance;
                }
                step
            }
        };
        *velocity = step.velocity;
        self.next.acceleration = step.acceleration;
    }

    fn update_airborne_velocity(
        &mut self,
        motor: &dyn Motor,
        velocity: &mut Vec3,
        basis: &CharacterBasis,
        dt: f32,
    ) {
        self.air.tick_airborne(dt);

        if self.next.stance == Stance::WallRun {
            *velocity = velocity::wall_run(*velocity, basis, self.walls, &self.settings, dt);
            return;
        }

        let grounding = motor.grounding();
        *velocity = velocity::air_control(
            *velocity,
            self.input.movement,
            basis.up,
            &grounding,
            &self.settings,
            dt,
        );
        *velocity = velocity::apply_gravity(
            *velocity,
            basis.up,
            &self.settings,
            self.input.jump_sustain,
            dt,
        );
    }

    fn resolve_jump(
        &mut self,
        motor: &mut dyn Motor,
        velocity: &mut Vec3,
        basis: &CharacterBasis,
        dt: f32,
    ) {
        if !self.input.jump.is_pending() {
            return;
        }

        let decision = jump::evaluate(&JumpContext {
            stably_grounded: motor.grounding().is_stable_on_ground,
            timers: &self.air,
            coyote_time: self.settings.coyote_time,
            stance: self.next.stance,
            walls: self.walls,
            held: self.input.held,
            basis,
        });

        if !decision.is_granted() {
            self.input.jump.age_by(dt, self.settings.coyote_time);
            if !self.input.jump.is_pending() {
                trace!("buffered jump expired");
            }
            return;
        }

        debug!("jump: {decision:?}");
        *velocity = jump::launch_velocity(decision, *velocity, basis, self.settings.jump_speed);
        self.input.jump.clear();
        self.input.release_crouch();
        self.air.mark_jumped();
        motor.force_unground(0.0);

        if let JumpDecision::Wall(_) = decision {
            self.next.stance = Stance::Stand;
            self.wall_gate.after_wall_jump(self.settings.wall_rejoin_delay);
        }
    }
}

impl CharacterController for PlayerCharacter {
    fn before_update(&mut self, motor: &mut dyn Motor, dt: f32) {
        self.next = self.state;
        self.next.acceleration = Vec3::zeros();
        self.wall_gate.tick(dt);

        if stance::enters_crouch(self.next.stance, self.input.crouch_requested()) {
            trace!("crouch");
            self.next.stance = Stance::Crouch;
            crouch::shrink(motor, &self.settings);
        }

        self.update_walls(motor, dt);
    }

    fn post_grounding_update(&mut self, motor: &mut dyn Motor, _dt: f32) {
        let stably_grounded = motor.grounding().is_stable_on_ground;
        let stance = stance::demote_airborne_slide(self.next.stance, stably_grounded);
        if stance != self.next.stance {
            debug!("slide lost ground");
            self.next.stance = stance;
        }
    }

    fn update_rotation(&mut self, motor: &mut dyn Motor, rotation: &mut Quat, _dt: f32) {
        let up = motor.character_up();
        let facing = project_on_plane(self.input.rotation * FORWARD, up);
        if let Some(target) = look_rotation(facing, up) {
            *rotation = target;
        }
    }

    fn update_velocity(&mut self, motor: &mut dyn Motor, velocity: &mut Vec3, dt: f32) {
        let basis = CharacterBasis::of(motor);
        if motor.grounding().is_stable_on_ground {
            self.update_grounded_velocity(motor, velocity, &basis, dt);
        } else {
            self.update_airborne_velocity(motor, velocity, &basis, dt);
        }
        self.resolve_jump(motor, velocity, &basis, dt);
    }

    fn after_update(&mut self, motor: &mut dyn Motor, dt: f32) {
        let shrunk = crouch::is_shrunk(motor, &self.settings);
        if stance::wants_uncrouch(self.input.crouch_requested(), self.next.stance, shrunk) {
            match crouch::try_stand(motor, &self.settings) {
                StandAttempt::Stood => {
                    self.input.release_crouch();
                    if self.next.stance != Stance::WallRun {
                        self.next.stance = Stance::Stand;
                    }
                }
                StandAttempt::Blocked => self.input.defer_stand(),
            }
        }

        let resolved = motor.velocity();
        let measured = if dt > 0.0 {
            (resolved - self.state.velocity).norm() / dt
        } else {
            0.0
        };
        self.next.acceleration = clamp_magnitude(self.next.acceleration, measured);
        self.next.velocity = resolved;
        self.next.grounded = motor.grounding().is_stable_on_ground;

        if self.next.stance != self.state.stance {
            debug!("stance {:?} -> {:?}", self.state.stance, self.next.stance);
        }
        if self.next.grounded != self.state.grounded {
            trace!("grounded: {}", self.next.grounded);
        }

        self.last_state = self.state;
        self.state = self.next;
    }

    fn on_movement_hit(&mut self, normal: Vec3) {
        self.next.acceleration = project_on_plane(self.next.acceleration, normal);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        constants::{RIGHT, UP},
        input::CrouchInput,
        math::Vec2,
        testing::ScriptedMotor,
    };
    use approx::assert_relative_eq;

    const DT: f32 = 0.01;

    fn grounded() -> (PlayerCharacter, ScriptedMotor) {
        let settings = MovementSettings::default();
        let mut motor = ScriptedMotor::standing(&settings);
        let character = PlayerCharacter::new(settings, &mut motor).expect("valid character");
        (character, motor)
    }

    fn airborne() -> (PlayerCharacter, ScriptedMotor) {
        let settings = MovementSettings::default();
        let mut motor = ScriptedMotor::airborne(&settings);
        let character = PlayerCharacter::new(settings, &mut motor).expect("valid character");
        (character, motor)
    }

    fn input(frame: u64) -> CharacterInput {
        CharacterInput {
            frame: Some(frame),
            ..CharacterInput::default()
        }
    }

    fn forward(frame: u64) -> CharacterInput {
        CharacterInput {
            move_axes: Vec2::new(0.0, 1.0),
            ..input(frame)
        }
    }

    fn crouch_toggle(frame: u64) -> CharacterInput {
        CharacterInput {
            crouch: CrouchInput::Toggle,
            ..input(frame)
        }
    }

    fn jump(frame: u64) -> CharacterInput {
        CharacterInput {
            jump: true,
            ..input(frame)
        }
    }

    #[test]
    fn rejects_motor_without_capsule() {
        let settings = MovementSettings::default();
        let mut motor = ScriptedMotor::standing(&settings);
        motor.capsule.radius = 0.0;
        let err = PlayerCharacter::new(settings, &mut motor).err();
        assert!(matches!(err, Some(MovementError::MissingGeometry(_))));
    }

    #[test]
    fn rejects_capsule_wider_than_crouch_height() {
        let settings = MovementSettings::default();
        let mut motor = ScriptedMotor::standing(&settings);
        motor.capsule.radius = 0.6;
        let err = PlayerCharacter::new(settings, &mut motor).err();
        assert!(matches!(err, Some(MovementError::CapsuleTooWide { .. })));
    }

    #[test]
    fn walking_reaches_walk_speed() {
        let (mut character, mut motor) = grounded();
        character.apply_input(&forward(1));
        motor.run(&mut character, 100, DT);

        let state = character.state();
        assert!(state.grounded);
        assert_eq!(state.stance, Stance::Stand);
        assert!(state.velocity.norm() >= 0.99 * character.settings().walk_speed);
        assert!(state.velocity.norm() <= character.settings().walk_speed + 1.0e-3);
    }

    #[test]
    fn previous_state_trails_by_one_step() {
        let (mut character, mut motor) = grounded();
        character.apply_input(&forward(1));
        motor.step(&mut character, DT);
        let first = character.state();
        motor.step(&mut character, DT);
        assert_eq!(character.last_state(), first);
        assert!(character.state().velocity.norm() > first.velocity.norm());
    }

    #[test]
    fn acceleration_never_exceeds_measured_velocity_change() {
        let (mut character, mut motor) = grounded();
        character.apply_input(&forward(1));
        for _ in 0..20 {
            motor.step(&mut character, DT);
            let (before, after) = (character.last_state(), character.state());
            let measured = (after.velocity - before.velocity).norm() / DT;
            assert!(after.acceleration.norm() <= measured + 1.0e-3);
        }
    }

    #[test]
    fn hit_surfaces_strip_acceleration_into_them() {
        let (mut character, mut motor) = grounded();
        // Wall straight ahead, facing the character.
        motor.hit_normals.push(RIGHT.cross(&UP));
        character.apply_input(&forward(1));
        motor.step(&mut character, DT);
        assert_relative_eq!(character.state().acceleration.z, 0.0, epsilon = 1.0e-4);
    }

    #[test]
    fn jump_from_ground_reaches_jump_speed() {
        let (mut character, mut motor) = grounded();
        motor.step(&mut character, DT);
        character.apply_input(&jump(1));
        motor.step(&mut character, DT);

        let state = character.state();
        assert!(!state.grounded);
        assert!(state.velocity.dot(&UP) >= character.settings().jump_speed - 1.0e-4);
        assert!(!character.input().jump.is_pending());
    }

    #[test]
    fn coyote_jump_is_granted_just_inside_the_window() {
        let (mut character, mut motor) = grounded();
        motor.run(&mut character, 5, DT);
        motor.ground = None;
        motor.run(&mut character, 18, DT);

        character.apply_input(&jump(1));
        motor.step(&mut character, DT);
        assert_relative_eq!(
            character.state().velocity.y,
            character.settings().jump_speed,
            epsilon = 1.0e-4
        );
    }

    #[test]
    fn coyote_jump_is_refused_just_outside_the_window_and_expires() {
        let (mut character, mut motor) = grounded();
        motor.run(&mut character, 5, DT);
        motor.ground = None;
        motor.run(&mut character, 20, DT);

        character.apply_input(&jump(1));
        motor.step(&mut character, DT);
        assert!(character.state().velocity.y < 0.0);
        assert!(character.input().jump.is_pending(), "request is buffered");

        motor.run(&mut character, 25, DT);
        assert!(!character.input().jump.is_pending(), "request expired");
        assert!(character.state().velocity.y < 0.0);
    }

    #[test]
    fn buffered_jump_fires_on_landing() {
        let (mut character, mut motor) = airborne();
        motor.run(&mut character, 30, DT);

        character.apply_input(&jump(1));
        motor.run(&mut character, 5, DT);
        assert!(character.input().jump.is_pending());
        assert!(character.state().velocity.y < 0.0);

        motor.ground = Some(UP);
        motor.step(&mut character, DT);
        assert_relative_eq!(
            character.state().velocity.y,
            character.settings().jump_speed,
            epsilon = 1.0e-4
        );
    }

    #[test]
    fn no_coyote_after_jumping() {
        let (mut character, mut motor) = grounded();
        character.apply_input(&jump(1));
        motor.step(&mut character, DT);
        motor.ground = None;
        motor.step(&mut character, DT);

        character.apply_input(&jump(2));
        let vertical = character.state().velocity.y;
        motor.step(&mut character, DT);
        assert!(character.state().velocity.y < vertical, "second jump refused");
    }

    #[test]
    fn sustained_jump_rises_higher() {
        let mut apexes = Vec::new();
        for sustain in [false, true] {
            let (mut character, mut motor) = grounded();
            motor.step(&mut character, DT);
            character.apply_input(&CharacterInput {
                jump_sustain: sustain,
                ..jump(1)
            });
            motor.ground = None;
            let mut apex: f32 = 0.0;
            for _ in 0..100 {
                motor.step(&mut character, DT);
                apex = apex.max(motor.position.y);
            }
            apexes.push(apex);
        }
        assert!(apexes[1] > apexes[0]);
    }

    #[test]
    fn shoot_is_a_level_signal() {
        let (mut character, _motor) = grounded();
        character.apply_input(&CharacterInput {
            shoot: true,
            ..input(1)
        });
        assert!(character.shoot_held());
        character.apply_input(&input(2));
        assert!(!character.shoot_held());
    }

    #[test]
    fn duplicate_frames_apply_once() {
        let (mut character, mut motor) = grounded();
        character.apply_input(&crouch_toggle(3));
        character.apply_input(&crouch_toggle(3));
        motor.step(&mut character, DT);
        assert_eq!(character.state().stance, Stance::Crouch);
    }

    #[test]
    fn unnumbered_inputs_are_all_applied() {
        let (mut character, mut motor) = grounded();
        character.apply_input(&CharacterInput::default());
        motor.step(&mut character, DT);

        character.apply_input(&CharacterInput {
            move_axes: Vec2::new(0.0, 1.0),
            jump: true,
            ..CharacterInput::default()
        });
        motor.step(&mut character, DT);

        let state = character.state();
        assert!(state.velocity.y > 0.0, "jump granted");
        assert!(state.velocity.dot(&crate::constants::FORWARD) > 0.0, "moving forward");
    }

    #[test]
    fn crouch_round_trip_restores_geometry() {
        let (mut character, mut motor) = grounded();
        let initial = motor.capsule;

        character.apply_input(&crouch_toggle(1));
        motor.step(&mut character, DT);
        assert_eq!(character.state().stance, Stance::Crouch);
        assert_eq!(motor.capsule.height, character.settings().crouch_height);

        character.apply_input(&crouch_toggle(2));
        motor.step(&mut character, DT);
        assert_eq!(character.state().stance, Stance::Stand);
        assert_eq!(motor.capsule, initial);
    }

    #[test]
    fn blocked_uncrouch_stands_once_clear() {
        let (mut character, mut motor) = grounded();
        character.apply_input(&crouch_toggle(1));
        motor.step(&mut character, DT);

        motor.ceiling_overlaps = 1;
        character.apply_input(&crouch_toggle(2));
        motor.run(&mut character, 3, DT);
        assert_eq!(character.state().stance, Stance::Crouch);
        assert_eq!(motor.capsule.height, character.settings().crouch_height);
        assert!(character.input().crouch);

        motor.ceiling_overlaps = 0;
        motor.step(&mut character, DT);
        assert_eq!(character.state().stance, Stance::Stand);
        assert_eq!(motor.capsule.height, character.settings().stand_height);
    }

    #[test]
    fn crouching_while_moving_slides_at_start_speed() {
        let (mut character, mut motor) = grounded();
        character.apply_input(&forward(1));
        motor.run(&mut character, 10, DT);
        let speed_before = character.state().velocity.norm();
        assert!(speed_before < character.settings().slide_start_speed);

        character.apply_input(&CharacterInput {
            crouch: CrouchInput::Toggle,
            ..forward(2)
        });
        motor.step(&mut character, DT);

        let state = character.state();
        assert_eq!(state.stance, Stance::Slide);
        // One slide step of friction after entering at the start speed.
        assert!(state.velocity.norm() > 0.99 * character.settings().slide_start_speed);
    }

    #[test]
    fn slow_slide_ends_in_crouch() {
        let (mut character, mut motor) = grounded();
        character.apply_input(&forward(1));
        motor.run(&mut character, 10, DT);
        character.apply_input(&CharacterInput {
            crouch: CrouchInput::Toggle,
            ..forward(2)
        });
        motor.step(&mut character, DT);
        assert_eq!(character.state().stance, Stance::Slide);

        // Releasing the stick lets steering brake the slide on flat ground.
        character.apply_input(&input(3));
        motor.run(&mut character, 300, DT);
        assert_eq!(character.state().stance, Stance::Crouch);
    }

    #[test]
    fn slide_loses_ground_and_becomes_crouch() {
        let (mut character, mut motor) = grounded();
        character.apply_input(&forward(1));
        motor.run(&mut character, 10, DT);
        character.apply_input(&CharacterInput {
            crouch: CrouchInput::Toggle,
            ..forward(2)
        });
        motor.step(&mut character, DT);
        assert_eq!(character.state().stance, Stance::Slide);

        motor.ground = None;
        motor.step(&mut character, DT);
        assert_eq!(character.state().stance, Stance::Crouch);
    }

    fn wall_running_on_right() -> (PlayerCharacter, ScriptedMotor) {
        let (mut character, mut motor) = airborne();
        motor.run(&mut character, 30, DT);
        motor.wall(WallSide::Right);
        character.apply_input(&CharacterInput {
            move_axes: Vec2::new(1.0, 0.0),
            ..input(1)
        });
        motor.step(&mut character, DT);
        (character, motor)
    }

    #[test]
    fn wall_run_zeroes_vertical_speed() {
        let (character, _motor) = wall_running_on_right();
        let state = character.state();
        assert_eq!(state.stance, Stance::WallRun);
        assert_eq!(state.velocity.y, 0.0);
    }

    #[test]
    fn touching_geometry_while_wall_running_does_not_latch_crouch() {
        let (mut character, mut motor) = wall_running_on_right();
        motor.ceiling_overlaps = 1;
        motor.run(&mut character, 5, DT);

        assert_eq!(character.state().stance, Stance::WallRun);
        assert!(!character.input().crouch);
        assert!(!character.input().stand_pending);
        assert_eq!(motor.capsule.height, character.settings().stand_height);
    }

    #[test]
    fn wall_run_times_out_and_stays_locked_until_landing() {
        let (mut character, mut motor) = wall_running_on_right();
        let steps = (character.settings().max_wall_run_time / DT) as usize + 5;
        motor.run(&mut character, steps, DT);
        assert_ne!(character.state().stance, Stance::WallRun);

        motor.run(&mut character, 10, DT);
        assert_ne!(character.state().stance, Stance::WallRun, "locked out");

        motor.ground = Some(UP);
        motor.step(&mut character, DT);
        motor.ground = None;
        motor.run(&mut character, 2, DT);
        assert_eq!(character.state().stance, Stance::WallRun);
    }

    #[test]
    fn losing_the_wall_opens_a_coyote_window() {
        let (mut character, mut motor) = wall_running_on_right();
        motor.run(&mut character, 10, DT);
        motor.walls = WallContacts::default();
        motor.step(&mut character, DT);
        assert_eq!(character.state().stance, Stance::Stand);

        character.apply_input(&jump(2));
        motor.step(&mut character, DT);
        assert_relative_eq!(
            character.state().velocity.y,
            character.settings().jump_speed,
            epsilon = 1.0e-4
        );
    }

    #[test]
    fn jump_off_a_wall_detaches_with_boost() {
        let (mut character, mut motor) = wall_running_on_right();
        character.apply_input(&CharacterInput {
            jump: true,
            move_axes: Vec2::new(1.0, 0.0),
            ..input(2)
        });
        motor.step(&mut character, DT);

        let state = character.state();
        assert_eq!(state.stance, Stance::Stand);
        let boost = character.settings().jump_speed * 1.5;
        assert_relative_eq!(state.velocity.y, boost, epsilon = 1.0e-3);
    }

    #[test]
    fn hop_away_from_right_wall_pushes_left() {
        let (mut character, mut motor) = wall_running_on_right();
        let lateral = character.state().velocity.x;
        character.apply_input(&CharacterInput {
            jump: true,
            move_axes: Vec2::new(-1.0, 0.0),
            ..input(2)
        });
        motor.step(&mut character, DT);

        let state = character.state();
        assert!(state.velocity.x < lateral - 5.0);
        assert!(state.velocity.y > character.settings().jump_speed);

        // The rejoin delay keeps the character off the wall right after the hop.
        character.apply_input(&CharacterInput {
            move_axes: Vec2::new(1.0, 0.0),
            ..input(3)
        });
        motor.step(&mut character, DT);
        assert_ne!(character.state().stance, Stance::WallRun);
    }

    #[test]
    fn facing_follows_look_rotation_and_survives_degenerate_input() {
        let (mut character, mut motor) = grounded();
        let turned = Quat::from_axis_angle(&nalgebra::Vector3::y_axis(), 1.0);
        character.apply_input(&CharacterInput {
            rotation: turned,
            ..input(1)
        });
        motor.step(&mut character, DT);
        assert_relative_eq!(motor.rotation * FORWARD, turned * FORWARD, epsilon = 1.0e-5);

        // Looking straight up has no horizontal heading; the facing is kept.
        let straight_up =
            Quat::from_axis_angle(&nalgebra::Vector3::x_axis(), std::f32::consts::FRAC_PI_2);
        character.apply_input(&CharacterInput {
            rotation: straight_up,
            ..input(2)
        });
        motor.step(&mut character, DT);
        assert_relative_eq!(motor.rotation * FORWARD, turned * FORWARD, epsilon = 1.0e-5);
    }

    #[test]
    fn teleport_can_kill_velocity() {
        let (mut character, mut motor) = grounded();
        character.apply_input(&forward(1));
        motor.run(&mut character, 10, DT);

        let target = Vec3::new(5.0, 2.0, -3.0);
        character.set_position(&mut motor, target, true);
        assert_eq!(motor.position, target);
        assert_eq!(motor.velocity, Vec3::zeros());
        assert_eq!(character.state().velocity, Vec3::zeros());
    }

    #[test]
    fn body_pose_follows_crouch() {
        let (mut character, mut motor) = grounded();
        let standing = character.body();
        character.apply_input(&crouch_toggle(1));
        motor.step(&mut character, DT);
        let pose = character.update_body(&motor, DT);
        assert!(pose.eye_height < standing.eye_height);
        assert!(pose.height_scale < 1.0);
    }
}
