//! Particle Life - headless runner
//!
//! Loads a configuration and a scenario, runs the engine for a fixed number of
//! frames with synthetic timestamps, logs a per-group summary and optionally
//! writes the final snapshot as JSON.

use std::path::PathBuf;

use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing_subscriber::EnvFilter;

use particle_life::{Engine, EngineConfig, Result, Scenario, TickEvent};

/// Run a particle-life simulation without a renderer
#[derive(Parser, Debug)]
#[command(name = "particle_life")]
#[command(about = "Run a particle-life simulation headless and report the outcome")]
struct Args {
    /// Engine configuration (TOML); defaults apply to missing fields
    #[arg(long)]
    config: Option<PathBuf>,

    /// Scenario file (TOML); the classic three-color preset if omitted
    #[arg(long, conflicts_with = "random")]
    scenario: Option<PathBuf>,

    /// Generate a random scenario with this many groups
    #[arg(long)]
    random: Option<usize>,

    /// Particles per group for generated scenarios
    #[arg(long, default_value_t = 200)]
    per_group: usize,

    /// Seed override for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Number of frames to run
    #[arg(long, default_value_t = 600)]
    ticks: u64,

    /// Speed scalar override
    #[arg(long)]
    speed: Option<f32>,

    /// Write the final snapshot here as JSON
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("particle_life=info")),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => EngineConfig::from_toml_file(path)?,
        None => EngineConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    let scenario = match (&args.scenario, args.random) {
        (Some(path), _) => Scenario::from_toml_file(path)?,
        (None, Some(groups)) => {
            let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
            Scenario::random(groups, args.per_group, &mut rng)
        }
        (None, None) => Scenario::classic(args.per_group),
    };

    let frame_ms = config.clock.frame_duration_ms;
    let mut engine = Engine::new(config)?;
    engine.load_scenario(&scenario)?;
    if let Some(speed) = args.speed {
        engine.set_speed(speed)?;
    }

    let mut shrunk = 0usize;
    let mut merged = 0usize;
    for frame in 0..args.ticks {
        let report = engine.tick(frame as f64 * frame_ms);
        for event in &report.events {
            match event {
                TickEvent::Shrunk { .. } => shrunk += 1,
                TickEvent::Merged { .. } => merged += 1,
            }
        }
        if report.living == 0 {
            tracing::info!(tick = report.tick, "Population died out");
            break;
        }
    }

    tracing::info!(
        scenario = %scenario.name,
        ticks = engine.current_tick(),
        living = engine.living_count(),
        shrunk,
        merged,
        "Run complete"
    );

    let snapshot = engine.snapshot();
    for group in engine.groups().iter() {
        let members: Vec<_> = snapshot.by_group(group.id).collect();
        if members.is_empty() {
            tracing::info!(group = %group.name, "empty");
            continue;
        }
        let n = members.len() as f32;
        let centroid = members.iter().map(|p| p.position).sum::<particle_life::Vec2>() / n;
        let spread = members.iter().map(|p| p.position.distance(centroid)).sum::<f32>() / n;
        let mean_speed = members.iter().map(|p| p.velocity.length()).sum::<f32>() / n;
        tracing::info!(
            group = %group.name,
            count = members.len(),
            centroid_x = centroid.x,
            centroid_y = centroid.y,
            spread,
            mean_speed,
            "Group summary"
        );
    }

    if let Some(path) = &args.output {
        std::fs::write(path, snapshot.to_json()?)?;
        tracing::info!(path = %path.display(), particles = snapshot.len(), "Snapshot written");
    }

    Ok(())
}
