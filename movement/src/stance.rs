/*!
Stance transitions.

Pure predicates used by the controller to move between [`Stance`]s. The controller owns the
order in which they run: crouch entry and wall attach/detach before the ground probe, airborne
slide demotion after it, slide entry and exit inside the velocity update, uncrouch last.
*/

use crate::{
    define_bitmask_flags,
    bitmask_flags::BitmaskFlags,
    input::{Direction, HeldDirections},
    state::{CharacterState, Stance},
};

define_bitmask_flags!(WallSide, u8, {
    Forward,
    Right,
    Left,
});

/// Sides of the character where a wall probe hit this step.
pub type WallContacts = BitmaskFlags<u8>;

/// A fresh crouch request only shrinks a standing character.
#[inline]
pub fn enters_crouch(stance: Stance, crouch_requested: bool) -> bool {
    crouch_requested && stance == Stance::Stand
}

/// A slide starts when a crouched, moving character is on stable ground and either was
/// standing or airborne at the end of the previous step.
pub fn starts_slide(
    stably_grounded: bool,
    moving: bool,
    stance: Stance,
    previous: &CharacterState,
) -> bool {
    stably_grounded
        && moving
        && stance == Stance::Crouch
        && (previous.stance == Stance::Stand || !previous.grounded)
}

/// Lower bound on the entry speed of a slide.
///
/// Landing into a slide with a crouch that started on the ground gets no boost; the
/// landing velocity carries the slide on its own.
#[inline]
pub fn slide_entry_floor(previously_grounded: bool, crouch_in_air: bool, slide_start_speed: f32) -> f32 {
    if !previously_grounded && !crouch_in_air {
        0.0
    } else {
        slide_start_speed
    }
}

/// Stance after a slide step that ended with `speed`.
#[inline]
pub fn after_slide(speed: f32, slide_end_speed: f32) -> Stance {
    if speed < slide_end_speed {
        Stance::Crouch
    } else {
        Stance::Slide
    }
}

/// Sliding needs ground under it.
#[inline]
pub fn demote_airborne_slide(stance: Stance, stably_grounded: bool) -> Stance {
    if stance == Stance::Slide && !stably_grounded {
        Stance::Crouch
    } else {
        stance
    }
}

/// The character should try to stand up: crouch is no longer requested and either the
/// stance or the capsule is still crouched. A wall-run on the full capsule has nothing
/// to stand up from.
#[inline]
pub fn wants_uncrouch(crouch_requested: bool, stance: Stance, capsule_crouched: bool) -> bool {
    !crouch_requested && (stance.is_crouched() || capsule_crouched)
}

/// Limits on wall attachment: time spent on the current wall and the cooldown that
/// follows a wall jump.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WallRunGate {
    attached_for: f32,
    cooldown: f32,
    exhausted: bool,
}

impl WallRunGate {
    pub fn tick(&mut self, dt: f32) {
        self.cooldown = (self.cooldown - dt).max(0.0);
    }

    /// Accumulate attached time while wall-running, reset otherwise.
    pub fn track(&mut self, wall_running: bool, dt: f32) {
        if wall_running {
            self.attached_for += dt;
        } else {
            self.attached_for = 0.0;
        }
    }

    /// Stable ground restores a wall-run that ran out of time.
    pub fn land(&mut self) {
        self.exhausted = false;
    }

    pub fn after_wall_jump(&mut self, rejoin_delay: f32) {
        self.cooldown = rejoin_delay;
        self.attached_for = 0.0;
    }

    pub fn exhaust(&mut self) {
        self.exhausted = true;
        self.attached_for = 0.0;
    }

    #[inline]
    pub fn can_attach(&self) -> bool {
        !self.exhausted && self.cooldown <= 0.0
    }

    #[inline]
    pub fn attached_for(&self) -> f32 {
        self.attached_for
    }

    #[inline]
    pub fn timed_out(&self, max_wall_run_time: f32) -> bool {
        max_wall_run_time > 0.0 && self.attached_for >= max_wall_run_time
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WallExit {
    /// No probe hits a wall anymore.
    LostWall,
    /// Attached for longer than the configured limit.
    TimeLimit,
    /// Stable ground under the character.
    Landed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WallRunTransition {
    Enter,
    Exit(WallExit),
    Keep,
}

#[derive(Clone, Copy, Debug)]
pub struct WallRunContext<'a> {
    pub stance: Stance,
    pub walls: WallContacts,
    pub held: HeldDirections,
    pub stably_grounded: bool,
    pub wall_run_held: bool,
    pub require_wall_run_button: bool,
    pub max_wall_run_time: f32,
    pub gate: &'a WallRunGate,
}

/// Decide whether the character attaches to, stays on, or leaves a wall.
///
/// Attaching needs a wall on a side whose direction key is held while airborne.
pub fn wall_run_transition(ctx: &WallRunContext<'_>) -> WallRunTransition {
    if ctx.stance == Stance::WallRun {
        if ctx.walls.is_empty() {
            return WallRunTransition::Exit(WallExit::LostWall);
        }
        if ctx.stably_grounded {
            return WallRunTransition::Exit(WallExit::Landed);
        }
        if ctx.gate.timed_out(ctx.max_wall_run_time) {
            return WallRunTransition::Exit(WallExit::TimeLimit);
        }
        return WallRunTransition::Keep;
    }

    let pushing_into_wall = (ctx.walls.has(WallSide::Left) && ctx.held.has(Direction::Left))
        || (ctx.walls.has(WallSide::Right) && ctx.held.has(Direction::Right))
        || (ctx.walls.has(WallSide::Forward) && ctx.held.has(Direction::Forward));

    if pushing_into_wall
        && !ctx.stably_grounded
        && ctx.gate.can_attach()
        && (ctx.wall_run_held || !ctx.require_wall_run_button)
    {
        WallRunTransition::Enter
    } else {
        WallRunTransition::Keep
    }
}
