//! Colony CLI - headless driver for the act engine.
//!
//! - `colony run` - simulate a dig-and-haul colony on a small grid
//! - `colony config` - print the effective scheduler configuration
//! - `colony init` - write a default `.colony/scheduler.yaml`

mod jobs;
mod world;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use colony::act::builder::wait;
use colony::core::TickContext;
use colony::task::{Creature, SchedulerConfig, TaskCategory, TaskEvent, TaskManager};
use colony::tools::take_log;

use crate::world::GridWorld;

#[derive(Parser)]
#[command(name = "colony")]
#[command(about = "Deterministic colony act engine", version)]
struct Cli {
    /// Project root directory (searched for `.colony/scheduler.yaml`)
    #[arg(short, long, global = true)]
    project: Option<PathBuf>,

    /// Scheduler config file, overrides the project lookup
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the demo colony
    Run {
        /// Stop after this many ticks
        #[arg(long, default_value_t = 1000)]
        ticks: u64,

        /// Number of creatures
        #[arg(long, default_value_t = 3)]
        creatures: u64,

        /// Number of rock cells to dig (one dig task each)
        #[arg(long, default_value_t = 12)]
        tasks: usize,

        /// Grid width
        #[arg(long, default_value_t = 16)]
        width: i32,

        /// Grid height
        #[arg(long, default_value_t = 6)]
        height: i32,

        /// Record trace events and print them per creature at the end
        #[arg(long)]
        trace: bool,
    },

    /// Print the effective scheduler configuration as YAML
    Config,

    /// Write a default scheduler configuration
    Init,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    fmt().with_env_filter(filter).with_target(false).init();

    let project_root = match cli.project {
        Some(root) => root,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    match cli.command {
        Some(Commands::Run {
            ticks,
            creatures,
            tasks,
            width,
            height,
            trace,
        }) => {
            let mut config = load_config(&project_root, cli.config.as_deref())?;
            config.trace |= trace;
            let world = GridWorld::generate(width, height, tasks);
            run_colony(world, config, ticks, creatures)
        }
        Some(Commands::Config) => {
            let config = load_config(&project_root, cli.config.as_deref())?;
            print!("{}", serde_yaml::to_string(&config)?);
            Ok(())
        }
        Some(Commands::Init) => init_project(&project_root),
        None => {
            println!("Colony - deterministic act engine");
            println!();
            println!("Usage: colony <COMMAND>");
            println!();
            println!("Commands:");
            println!("  run     Run the demo colony");
            println!("  config  Print the effective scheduler configuration");
            println!("  init    Write a default scheduler configuration");
            println!();
            println!("Run 'colony --help' for more information.");
            Ok(())
        }
    }
}

fn load_config(project_root: &Path, explicit: Option<&Path>) -> Result<SchedulerConfig> {
    match explicit {
        Some(path) => SchedulerConfig::load(path),
        None => SchedulerConfig::load_from_dir(project_root),
    }
}

fn run_colony(
    mut world: GridWorld,
    config: SchedulerConfig,
    ticks: u64,
    creatures: u64,
) -> Result<()> {
    let trace = config.trace;
    let mut manager: TaskManager<GridWorld> = TaskManager::new(config);
    for agent in 0..creatures {
        let at = world.spawn(agent);
        tracing::debug!(agent, ?at, "creature spawned");
        manager.add_creature(
            Creature::new(agent, TaskCategory::DIG | TaskCategory::HAUL).with_idle(wait(5)),
        );
    }

    let rock: Vec<_> = world.rock().collect();
    for cell in rock {
        manager.enqueue(&mut world, jobs::dig(cell));
    }
    tracing::info!(creatures, tasks = manager.len(), "Starting colony");

    let mut ctx = TickContext::new(0, 0.1);
    let mut completed = 0usize;
    let mut failed = 0usize;
    let mut finished_at = None;

    for _ in 0..ticks {
        for pile in world.undesignated_stone() {
            manager.enqueue(&mut world, jobs::haul(pile));
        }

        let report = manager.tick(&ctx, &mut world);
        for event in &report.events {
            match event {
                TaskEvent::Completed { .. } => completed += 1,
                TaskEvent::Retried { .. } | TaskEvent::Discarded { .. } => failed += 1,
                TaskEvent::Errored { task, error, .. } => {
                    failed += 1;
                    tracing::warn!(%task, %error, "Script error");
                }
                TaskEvent::Cancelled { .. } | TaskEvent::Unassigned { .. } => {}
            }
        }

        if manager.is_empty() && world.loose_stone() == 0 {
            finished_at = Some(ctx.tick);
            break;
        }
        ctx = ctx.next();
    }

    match finished_at {
        Some(tick) => tracing::info!(tick, "All work done"),
        None => tracing::info!(pending = manager.len(), "Tick limit reached"),
    }

    println!("Colony Run");
    println!("==========");
    println!();
    println!("Ticks:      {}", finished_at.map_or(ticks, |tick| tick + 1));
    println!("Completed:  {completed}");
    println!("Failed:     {failed}");
    println!("Rock left:  {}", world.rock().count());
    println!("Loose:      {}", world.loose_stone());
    println!("Stockpiled: {}", world.stored());
    println!("Open tasks: {}", manager.len());

    if trace {
        println!();
        println!("Trace:");
        for agent in 0..creatures {
            let Some(creature) = manager.creature_mut(agent) else {
                continue;
            };
            let log = take_log(creature.blackboard_mut());
            println!("  creature {agent}: {} events", log.events.len());
            for event in log.events.iter().take(10) {
                println!("    [{}] {}", event.tick, event.tag);
            }
            if log.events.len() > 10 {
                println!("    ... and {} more", log.events.len() - 10);
            }
        }
    }

    Ok(())
}

fn init_project(project_root: &Path) -> Result<()> {
    let colony_dir = project_root.join(".colony");
    std::fs::create_dir_all(&colony_dir)
        .with_context(|| format!("Failed to create {}", colony_dir.display()))?;

    let config_path = colony_dir.join("scheduler.yaml");
    if config_path.exists() {
        println!("{} already exists", config_path.display());
        return Ok(());
    }

    let body = serde_yaml::to_string(&SchedulerConfig::default())?;
    std::fs::write(&config_path, format!("# Colony scheduler configuration\n\n{body}"))
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    println!("Initialized colony project at {}", project_root.display());
    println!();
    println!("Created:");
    println!("  .colony/scheduler.yaml - scheduler configuration");
    println!();
    println!("Next steps:");
    println!("  1. Tune assign_every_ticks and max_retries");
    println!("  2. Run: colony run");

    Ok(())
}
