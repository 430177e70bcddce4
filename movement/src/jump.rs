/*!
Jump requests, coyote time and the jump impulse.

A press is latched as a [`JumpRequest`]. Each step the controller asks [`evaluate`] what the
request turns into given grounding and stance, then applies the resulting impulse with
[`launch_velocity`]. Requests that cannot be granted are kept and aged, and expire once they
are older than the coyote window.
*/

use crate::{
    constants::{WALL_HOP_LATERAL_SCALE, WALL_HOP_VERTICAL_SCALE},
    input::{Direction, HeldDirections},
    math::Vec3,
    motor::CharacterBasis,
    stance::{WallContacts, WallSide},
    state::Stance,
};

/// Latched jump press.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct JumpRequest {
    pending: bool,
    age: f32,
}

impl JumpRequest {
    /// Latch a press. The age only restarts on a new press, not while one is pending.
    pub fn press(&mut self) {
        if !self.pending {
            self.pending = true;
            self.age = 0.0;
        }
    }

    pub fn clear(&mut self) {
        self.pending = false;
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Seconds the request has waited without being granted.
    #[inline]
    pub fn age(&self) -> f32 {
        self.age
    }

    /// Age a request that could not be granted this step; drop it once it reaches `window`.
    pub fn age_by(&mut self, dt: f32, window: f32) {
        if !self.pending {
            return;
        }
        self.age += dt;
        if self.age >= window {
            self.pending = false;
        }
    }
}

/// Time spent off the ground and why the character left it.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AirTimers {
    pub since_ungrounded: f32,
    /// The character left the ground by jumping, so coyote time does not apply.
    pub ungrounded_due_to_jump: bool,
}

impl AirTimers {
    pub fn land(&mut self) {
        self.since_ungrounded = 0.0;
        self.ungrounded_due_to_jump = false;
    }

    pub fn tick_airborne(&mut self, dt: f32) {
        self.since_ungrounded += dt;
    }

    /// Open a fresh coyote window, as when dropping off a wall without jumping.
    pub fn restart_coyote(&mut self) {
        self.land();
    }

    pub fn mark_jumped(&mut self) {
        self.ungrounded_due_to_jump = true;
    }

    #[inline]
    pub fn can_coyote_jump(&self, coyote_time: f32) -> bool {
        self.since_ungrounded < coyote_time && !self.ungrounded_due_to_jump
    }
}

/// How a jump leaves a wall.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum WallJump {
    /// Straight up off the wall with a boosted vertical impulse.
    Detach,
    /// Sideways away from a wall on the left or right. `away` points off the wall.
    SideHop { away: Vec3 },
    /// Backwards off a wall in front of the character.
    BackHop,
}

/// What a pending jump request resolves to this step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum JumpDecision {
    /// Standing on stable ground.
    Ground,
    /// Airborne, but still inside the coyote window.
    Coyote,
    Wall(WallJump),
    /// Not possible right now; keep the request and let it age.
    Buffer,
}

impl JumpDecision {
    #[inline]
    pub fn is_granted(&self) -> bool {
        !matches!(self, JumpDecision::Buffer)
    }
}

/// Everything [`evaluate`] needs to know about the current step.
#[derive(Clone, Copy, Debug)]
pub struct JumpContext<'a> {
    pub stably_grounded: bool,
    pub timers: &'a AirTimers,
    pub coyote_time: f32,
    pub stance: Stance,
    pub walls: WallContacts,
    pub held: HeldDirections,
    pub basis: &'a CharacterBasis,
}

/// Resolve a pending jump request.
pub fn evaluate(ctx: &JumpContext<'_>) -> JumpDecision {
    if ctx.stance == Stance::WallRun {
        return JumpDecision::Wall(wall_jump(ctx));
    }
    if ctx.stably_grounded {
        JumpDecision::Ground
    } else if ctx.timers.can_coyote_jump(ctx.coyote_time) {
        JumpDecision::Coyote
    } else {
        JumpDecision::Buffer
    }
}

// Holding the direction opposite a wall hops away from it; otherwise the jump detaches.
fn wall_jump(ctx: &JumpContext<'_>) -> WallJump {
    let (walls, held) = (ctx.walls, ctx.held);
    if walls.has(WallSide::Right) && held.has(Direction::Left) {
        WallJump::SideHop {
            away: -ctx.basis.right,
        }
    } else if walls.has(WallSide::Left) && held.has(Direction::Right) {
        WallJump::SideHop {
            away: ctx.basis.right,
        }
    } else if walls.has(WallSide::Forward) && held.has(Direction::Forward) {
        WallJump::BackHop
    } else {
        WallJump::Detach
    }
}

/// Velocity after a granted jump.
///
/// Ground and coyote jumps raise the vertical component to at least `jump_speed` and never
/// lower it. Wall detach boosts that same difference. Hops add a lateral push plus a fixed
/// upward impulse on top of the current velocity.
pub fn launch_velocity(
    decision: JumpDecision,
    velocity: Vec3,
    basis: &CharacterBasis,
    jump_speed: f32,
) -> Vec3 {
    let up = basis.up;
    let vertical_boost = |scale: f32| {
        let current = velocity.dot(&up);
        let target = current.max(jump_speed);
        velocity + up * ((target - current) * scale)
    };

    match decision {
        JumpDecision::Ground | JumpDecision::Coyote => vertical_boost(1.0),
        JumpDecision::Wall(WallJump::Detach) => vertical_boost(WALL_HOP_VERTICAL_SCALE),
        JumpDecision::Wall(WallJump::SideHop { away }) => {
            velocity
                + away * (jump_speed * WALL_HOP_LATERAL_SCALE)
                + up * (jump_speed * WALL_HOP_VERTICAL_SCALE)
        }
        JumpDecision::Wall(WallJump::BackHop) => {
            velocity - basis.forward * (jump_speed * WALL_HOP_LATERAL_SCALE)
                + up * (jump_speed * WALL_HOP_VERTICAL_SCALE)
        }
        JumpDecision::Buffer => velocity,
    }
}
