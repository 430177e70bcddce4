use crate::{
    bitmask_flags::BitmaskFlags,
    constants::{FORWARD, HELD_AXIS_DEADZONE, RIGHT},
    define_bitmask_flags,
    jump::JumpRequest,
    math::{Quat, Vec2, Vec3, clamp_magnitude},
};

/// Edge-triggered crouch signal. `Toggle` flips the crouch request; it is not a held state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CrouchInput {
    #[default]
    None,
    Toggle,
}

define_bitmask_flags!(Direction, u8, {
    Forward,
    Back,
    Right,
    Left,
});

/// Directional inputs held this frame, derived from the raw move axes.
pub type HeldDirections = BitmaskFlags<u8>;

/// One frame of player intent, produced by the input layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CharacterInput {
    /// Look rotation the movement axes are relative to (usually the camera).
    pub rotation: Quat,
    /// Raw move axes: `x` strafes right, `y` moves forward.
    pub move_axes: Vec2,
    /// Jump was pressed this frame.
    pub jump: bool,
    /// Jump is held (variable jump height).
    pub jump_sustain: bool,
    /// Wall-run input is held.
    pub wall_run: bool,
    pub crouch: CrouchInput,
    pub shoot: bool,
    /// Producer frame counter. Delivering the same frame twice has no further effect;
    /// `None` applies every call.
    pub frame: Option<u64>,
}

impl Default for CharacterInput {
    fn default() -> Self {
        Self {
            rotation: Quat::identity(),
            move_axes: Vec2::zeros(),
            jump: false,
            jump_sustain: false,
            wall_run: false,
            crouch: CrouchInput::None,
            shoot: false,
            frame: None,
        }
    }
}

/// Latched intents consumed by the simulation step.
///
/// `apply` only records what the player asked for. The stance machine and the jump
/// controller decide what happens with it and clear the latches they consume.
#[derive(Clone, Debug)]
pub struct InputLatch {
    /// World-space movement request, at most unit length.
    pub movement: Vec3,
    /// Requested facing.
    pub rotation: Quat,
    pub jump: JumpRequest,
    pub jump_sustain: bool,
    /// Crouch toggle latch.
    pub crouch: bool,
    /// The current crouch request started while airborne.
    pub crouch_in_air: bool,
    /// Standing up was blocked; the crouch is held until there is room again.
    pub stand_pending: bool,
    pub wall_run: bool,
    pub shoot: bool,
    pub held: HeldDirections,
    last_frame: Option<u64>,
}

impl Default for InputLatch {
    fn default() -> Self {
        Self {
            movement: Vec3::zeros(),
            rotation: Quat::identity(),
            jump: JumpRequest::default(),
            jump_sustain: false,
            crouch: false,
            crouch_in_air: false,
            stand_pending: false,
            wall_run: false,
            shoot: false,
            held: HeldDirections::default(),
            last_frame: None,
        }
    }
}

impl InputLatch {
    /// Record one frame of input.
    ///
    /// `grounded` is the last published grounding and decides whether a new crouch
    /// request counts as a crouch started in the air.
    pub fn apply(&mut self, input: &CharacterInput, grounded: bool) {
        if input.frame.is_some() && input.frame == self.last_frame {
            return;
        }
        self.last_frame = input.frame;

        self.rotation = input.rotation;

        // Clamp before orienting so diagonals are not faster than straight lines.
        let local = clamp_magnitude(
            RIGHT * input.move_axes.x + FORWARD * input.move_axes.y,
            1.0,
        );
        self.movement = input.rotation * local;
        self.held = held_directions(input.move_axes);

        if input.jump {
            self.jump.press();
        }
        self.jump_sustain = input.jump_sustain;

        let was_crouching = self.crouch;
        if input.crouch == CrouchInput::Toggle {
            if self.stand_pending {
                // Toggling during a blocked stand keeps the crouch instead.
                self.stand_pending = false;
            } else {
                self.crouch = !self.crouch;
            }
        }
        if self.crouch && !was_crouching {
            self.crouch_in_air = !grounded;
        } else if !self.crouch && was_crouching {
            self.crouch_in_air = false;
        }

        self.wall_run = input.wall_run;
        self.shoot = input.shoot;
    }

    /// Crouch is requested and not merely held by a blocked stand.
    #[inline]
    pub fn crouch_requested(&self) -> bool {
        self.crouch && !self.stand_pending
    }

    /// Drop the crouch request, e.g. when a jump is granted.
    pub fn release_crouch(&mut self) {
        self.crouch = false;
        self.crouch_in_air = false;
        self.stand_pending = false;
    }

    /// Standing up was blocked: hold the crouch and retry every step.
    pub fn defer_stand(&mut self) {
        self.crouch = true;
        self.stand_pending = true;
    }
}

fn held_directions(axes: Vec2) -> HeldDirections {
    let mut held = HeldDirections::default();
    held.set_if(Direction::Forward, axes.y > HELD_AXIS_DEADZONE);
    held.set_if(Direction::Back, axes.y < -HELD_AXIS_DEADZONE);
    held.set_if(Direction::Right, axes.x > HELD_AXIS_DEADZONE);
    held.set_if(Direction::Left, axes.x < -HELD_AXIS_DEADZONE);
    held
}
