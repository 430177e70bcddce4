use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use movement::MovementSettings;

mod logging;
mod scenario;

use scenario::Scenario;

/// Headless driver for the movement core
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Scripted level and input to run
    #[arg(short, long, value_enum, default_value_t = Scenario::Walk)]
    scenario: Scenario,

    /// Number of simulation steps
    #[arg(long, default_value_t = 300)]
    steps: usize,

    /// Seconds per step
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f32,

    /// Log the character state every this many steps (0 disables)
    #[arg(long, default_value_t = 10)]
    log_every: usize,

    /// Movement settings file (TOML); missing keys use the defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn load_settings(path: Option<&PathBuf>) -> Result<MovementSettings> {
    let Some(path) = path else {
        return Ok(MovementSettings::default());
    };
    let src = fs::read_to_string(path)
        .with_context(|| format!("reading settings from {}", path.display()))?;
    MovementSettings::from_toml_str(&src)
        .with_context(|| format!("parsing settings in {}", path.display()))
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose);

    let settings = load_settings(args.config.as_ref())?;
    info!(
        "running {:?} for {} steps at dt {:.4}",
        args.scenario, args.steps, args.dt
    );

    let report = scenario::run(args.scenario, settings, args.steps, args.dt, args.log_every)?;

    let p = report.position;
    info!("final position ({:.2} {:.2} {:.2})", p.x, p.y, p.z);
    info!(
        "final stance {:?}, grounded {}, speed {:.2}",
        report.final_state.stance,
        report.final_state.grounded,
        report.final_state.velocity.norm()
    );
    info!("apex {:.2}, stances {:?}", report.apex, report.stance_sequence());
    Ok(())
}
