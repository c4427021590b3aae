//! CLI utility for running collision avoidance scenarios

mod scenario;

use anyhow::{Context, Result, anyhow};
use avoidance::{CollisionAvoidanceSystem, NavMeshVelocityClamp, SolveOutcome};
use avoidance_common::debug::DebugDraw;
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use scenario::{Scenario, ScenarioWorld};

/// A CLI utility for running collision avoidance scenarios
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Log solver activity (overridden by RUST_LOG)
    #[clap(short, long, global = true)]
    verbose: bool,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a scenario for a number of ticks
    Run {
        /// Scenario file (JSON)
        #[clap(long, value_parser)]
        scenario: PathBuf,

        /// Number of ticks to simulate
        #[clap(long, default_value = "100")]
        ticks: u32,

        /// Tick duration in seconds
        #[clap(long, default_value = "0.1")]
        dt: f32,

        /// Output CSV file; prints a table when omitted
        #[clap(long, value_parser)]
        output: Option<PathBuf>,

        /// Print debug-draw primitives of the last tick
        #[clap(long)]
        debug_draw: bool,
    },

    /// Print an example scenario
    Template,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut logger = env_logger::Builder::from_default_env();
    if args.verbose && std::env::var_os("RUST_LOG").is_none() {
        logger.filter_level(log::LevelFilter::Debug);
    }
    logger.init();

    match args.command {
        Commands::Run {
            scenario,
            ticks,
            dt,
            output,
            debug_draw,
        } => run_scenario(&scenario, ticks, dt, output.as_deref(), debug_draw),
        Commands::Template => print_template(),
    }
}

fn outcome_label(outcome: SolveOutcome) -> String {
    match outcome {
        SolveOutcome::Primary => "primary".to_string(),
        SolveOutcome::Degraded { dropped } => format!("degraded(-{dropped})"),
        SolveOutcome::Exhausted => "exhausted".to_string(),
        SolveOutcome::Disabled => "disabled".to_string(),
    }
}

/// Run a scenario and report every agent velocity
fn run_scenario(
    path: &Path,
    ticks: u32,
    dt: f32,
    output: Option<&Path>,
    debug_draw: bool,
) -> Result<()> {
    if !(dt.is_finite() && dt > 0.0) {
        return Err(anyhow!("Tick duration must be positive, got {}", dt));
    }

    let scenario = Scenario::load(path)?;
    let mut config = scenario.config.clone();
    if debug_draw {
        config.debug_draw = true;
    }

    let mut world = ScenarioWorld::new(&scenario);
    let clamp = NavMeshVelocityClamp::new(scenario.wall_segments());

    let mut system = CollisionAvoidanceSystem::new();
    for handle in world.handles() {
        system
            .register(handle)
            .with_context(|| format!("Failed to register actor {}", handle.id()))?;
    }

    println!(
        "Loaded {} agents and {} obstacles from {}",
        scenario.agents.len(),
        scenario.obstacles.len(),
        path.display()
    );

    let mut out: Box<dyn Write> = match output {
        Some(output_path) => Box::new(File::create(output_path).with_context(|| {
            format!("Failed to create output file: {}", output_path.display())
        })?),
        None => Box::new(io::stdout()),
    };

    if output.is_some() {
        writeln!(out, "tick,agent,x,y,z,vx,vz,outcome")?;
    } else {
        writeln!(
            out,
            "{:>5} {:<12} {:>9} {:>9} {:>8} {:>8} {}",
            "tick", "agent", "x", "z", "vx", "vz", "outcome"
        )?;
    }

    let mut completed = 0;
    for tick in 0..ticks {
        let stats = system
            .update(&mut world, &config, &clamp, dt)
            .map_err(|e| anyhow!("Tick {} failed: {}", tick, e))?;
        log::debug!("Tick {}: {:?}", tick, stats);

        for record in system.records() {
            let Some((name, position)) = world.describe(record.handle) else {
                continue;
            };
            let outcome = outcome_label(record.outcome);

            if output.is_some() {
                writeln!(
                    out,
                    "{},{},{},{},{},{},{},{}",
                    tick,
                    name,
                    position.x,
                    position.y,
                    position.z,
                    record.velocity.x,
                    record.velocity.y,
                    outcome
                )?;
            } else {
                writeln!(
                    out,
                    "{:>5} {:<12} {:>9.3} {:>9.3} {:>8.3} {:>8.3} {}",
                    tick, name, position.x, position.z, record.velocity.x, record.velocity.y, outcome
                )?;
            }
        }

        completed = tick + 1;
        if world.all_arrived() {
            break;
        }
    }
    out.flush()?;

    println!("Simulated {} ticks", completed);
    if world.all_arrived() {
        println!("All agents reached their goals");
    }

    if debug_draw {
        let mut draw = DebugDraw::new();
        system.debug_draw(&world, &config, &mut draw);
        print_debug_draw(&draw);
    }

    Ok(())
}

fn print_debug_draw(draw: &DebugDraw) {
    println!("Debug draw: {} primitives", draw.primitive_count());
    for circle in &draw.circles {
        println!("circle {:?} r={}", circle.center, circle.radius);
    }
    for arrow in &draw.arrows {
        println!("arrow {:?} -> {:?}", arrow.start, arrow.end);
    }
    for line in &draw.lines {
        println!("line {:?} -> {:?}", line.start, line.end);
    }
    for text in &draw.text {
        println!("text {:?} {}", text.position, text.text);
    }
}

/// Print an example scenario as JSON
fn print_template() -> Result<()> {
    let json = serde_json::to_string_pretty(&Scenario::example())
        .context("Failed to serialize example scenario")?;
    println!("{}", json);
    Ok(())
}
