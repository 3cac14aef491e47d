//! dicebox - roll dice in a rigid-body simulation and read the results
//!
//! Usage: `dicebox [notation...]`, e.g. `dicebox 2d6 d4` or `dicebox 3d6!`.
//! With no arguments, rolls `2d6`.

use std::error::Error;

use dicebox::config::AppConfig;
use dicebox::notation;
use dicebox_core::{
    DiceGroup, DieInstancePool, DieShapeCache, RigidBodySimulation, RollOrchestrator,
};
use dicebox_geom::d4_canonical_vertices;

fn main() {
    let config = AppConfig::load().unwrap_or_else(|e| {
        eprintln!("{e}; using built-in defaults");
        AppConfig::default()
    });

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.debug.log_level.as_str()),
    )
    .init();

    if let Err(e) = run(config) {
        log::error!("{e}");
        std::process::exit(1);
    }
}

fn run(config: AppConfig) -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let input = if args.is_empty() {
        "2d6".to_string()
    } else {
        args.join(" ")
    };

    let groups = notation::parse_request(&input)?;
    if groups.is_empty() {
        return Err("nothing to roll".into());
    }
    let request = groups.clone();

    let sim = RigidBodySimulation::new(config.simulation);
    let cache = DieShapeCache::new(config.shapes);
    let pool = DieInstancePool::new();
    let mut orchestrator = RollOrchestrator::new(
        sim,
        cache,
        pool,
        config.roll,
        config.spawn,
        config.play_area,
    )
    .with_d4_model(d4_canonical_vertices().to_vec());

    orchestrator.roll(groups)?;

    let dt = 1.0 / config.runner.fixed_timestep_hz;
    let max_steps = (config.runner.max_simulated_seconds / dt) as u32;
    for step in 0..max_steps {
        orchestrator.physics_step(dt);
        if let Some(result) = orchestrator.update(dt) {
            log::debug!(
                "roll resolved after {:.2}s of simulated time",
                step as f32 * dt
            );
            print_result(&request, &result);
            return Ok(());
        }
    }

    // The failsafe ladder terminates every roll well inside the step budget
    Err("roll did not resolve within the simulated time budget".into())
}

fn print_result(request: &[DiceGroup], result: &dicebox_core::DiceRollResult) {
    for group in request {
        if let Some(values) = result.group(&group.group_id) {
            match values {
                [single] => println!("{}: {}", group.group_id, single),
                many => println!(
                    "{}: {} = {}",
                    group.group_id,
                    many.iter()
                        .map(|v| v.to_string())
                        .collect::<Vec<_>>()
                        .join(" + "),
                    many.iter().sum::<i32>()
                ),
            }
        }
    }
}
