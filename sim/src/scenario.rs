//! Scripted levels and inputs for the headless driver.

use std::sync::Arc;

use anyhow::{Result, ensure};
use clap::ValueEnum;
use log::info;
use movement::{
    CapsuleDimensions, CharacterInput, CharacterState, ColliderShapeDef, CrouchInput,
    KinematicMotor, Motor, MovementSettings, PlayerCharacter, RapierQueryWorld, Stance, Vec2,
    Vec3, WorldStaticDef,
};

const CAPSULE_RADIUS: f32 = 0.4;

const TUNNEL_CROUCH_STEP: usize = 5;
const TUNNEL_WALK_STEP: usize = 10;
/// Under the ceiling at crouch speed with the default step.
const TUNNEL_RELEASE_STEP: usize = 110;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Scenario {
    /// Walk forward across a flat floor.
    Walk,
    /// Build up speed, then crouch into a slide.
    Slide,
    /// Standing jump with the button held for a higher arc.
    Jump,
    /// Drop next to a wall and run along it, then jump off.
    WallRun,
    /// Crouch in place, walk under a low ceiling and let go of crouch inside it; the
    /// character stays crouched until it is clear.
    Tunnel,
}

impl Scenario {
    fn level(self) -> Vec<WorldStaticDef> {
        let mut defs = vec![WorldStaticDef::new(
            0,
            Vec3::zeros(),
            ColliderShapeDef::Plane {
                offset_along_normal: 0.0,
            },
        )];
        match self {
            Scenario::WallRun => defs.push(WorldStaticDef::new(
                1,
                Vec3::new(1.0, 4.0, -30.0),
                ColliderShapeDef::Cuboid {
                    half_extents: Vec3::new(0.1, 4.0, 30.0),
                },
            )),
            Scenario::Tunnel => defs.push(WorldStaticDef::new(
                1,
                Vec3::new(0.0, 2.4, -12.0),
                ColliderShapeDef::Cuboid {
                    half_extents: Vec3::new(3.0, 1.0, 5.0),
                },
            )),
            Scenario::Walk | Scenario::Slide | Scenario::Jump => {}
        }
        defs
    }

    fn spawn(self) -> Vec3 {
        match self {
            Scenario::WallRun => Vec3::new(0.0, 3.0, 0.0),
            _ => Vec3::zeros(),
        }
    }

    /// Input delivered before simulation step `step`.
    fn input(self, step: usize) -> CharacterInput {
        let forward = Vec2::new(0.0, 1.0);
        let base = CharacterInput {
            frame: Some(step as u64),
            ..CharacterInput::default()
        };

        match self {
            Scenario::Walk => CharacterInput {
                move_axes: forward,
                ..base
            },
            Scenario::Slide => CharacterInput {
                move_axes: forward,
                crouch: toggle_at(step, 30),
                ..base
            },
            Scenario::Jump => CharacterInput {
                jump: step == 10,
                jump_sustain: (10..30).contains(&step),
                ..base
            },
            Scenario::WallRun => CharacterInput {
                move_axes: Vec2::new(1.0, 1.0),
                jump: step == 60,
                ..base
            },
            // Crouching before moving keeps the entry speed below a slide.
            Scenario::Tunnel => CharacterInput {
                move_axes: if step >= TUNNEL_WALK_STEP {
                    forward
                } else {
                    Vec2::zeros()
                },
                crouch: if step == TUNNEL_CROUCH_STEP || step == TUNNEL_RELEASE_STEP {
                    CrouchInput::Toggle
                } else {
                    CrouchInput::None
                },
                ..base
            },
        }
    }
}

fn toggle_at(step: usize, at: usize) -> CrouchInput {
    if step == at {
        CrouchInput::Toggle
    } else {
        CrouchInput::None
    }
}

/// What a run looked like.
#[derive(Clone, Debug)]
pub struct Report {
    pub final_state: CharacterState,
    pub position: Vec3,
    pub apex: f32,
    /// Every stance change as `(step, stance)`, starting with the initial stance at step 0.
    pub stances: Vec<(usize, Stance)>,
}

impl Report {
    pub fn stance_sequence(&self) -> Vec<Stance> {
        self.stances.iter().map(|&(_, stance)| stance).collect()
    }

    /// First step at which `stance` was entered.
    pub fn entered(&self, stance: Stance) -> Option<usize> {
        self.stances
            .iter()
            .find(|&&(_, s)| s == stance)
            .map(|&(step, _)| step)
    }
}

pub fn run(
    scenario: Scenario,
    settings: MovementSettings,
    steps: usize,
    dt: f32,
    log_every: usize,
) -> Result<Report> {
    ensure!(dt > 0.0 && dt.is_finite(), "time step must be positive, got {dt}");

    let world = Arc::new(RapierQueryWorld::build(scenario.level()));
    let capsule = CapsuleDimensions::grounded(CAPSULE_RADIUS, settings.stand_height);
    let mut motor = KinematicMotor::new(world, scenario.spawn(), capsule);
    let mut character = PlayerCharacter::new(settings, &mut motor)?;

    let mut apex = motor.transient_position().y;
    let mut stances = vec![(0, character.state().stance)];

    for step in 0..steps {
        character.apply_input(&scenario.input(step));
        motor.update(&mut character, dt);
        let pose = character.update_body(&motor, dt);

        let state = character.state();
        let position = motor.transient_position();
        apex = apex.max(position.y);
        if stances.last().map(|&(_, s)| s) != Some(state.stance) {
            stances.push((step, state.stance));
        }

        if log_every > 0 && step % log_every == 0 {
            info!(
                "step {step:>4} pos ({:>7.2} {:>6.2} {:>7.2}) speed {:>6.2} {:?}{} eye {:.2} walls {:03b}",
                position.x,
                position.y,
                position.z,
                state.velocity.norm(),
                state.stance,
                if state.grounded { "" } else { " (air)" },
                pose.eye_height,
                character.wall_contacts().bits,
            );
        }
    }

    Ok(Report {
        final_state: character.state(),
        position: motor.transient_position(),
        apex,
        stances,
    })
}
