#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that loads a scenario and runs the movement engine.

mod path_transfer;
mod scenario;

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info, warn, LevelFilter};
use serde::Serialize;
use unit_paths_core::{Command, Event, GroundPath};
use unit_paths_system_movement::Movement;
use unit_paths_world::{self as world, query, Unit, World};

use crate::{path_transfer::PathSnapshot, scenario::Scenario};

/// Command-line arguments accepted by the binary.
#[derive(Debug, Parser)]
#[command(name = "unit-paths", about = "Runs unit movement over a TOML scenario")]
struct Cli {
    /// Scenario file describing the map and units.
    scenario: PathBuf,
    /// Number of ticks to execute.
    #[arg(long, default_value_t = 16)]
    ticks: u32,
    /// Ticks per turn; every boundary refills movement budgets.
    #[arg(long, default_value_t = 8, value_parser = clap::value_parser!(u32).range(1..))]
    ticks_per_turn: u32,
    /// Log level written to stderr.
    #[arg(long, default_value_t = LevelFilter::Info)]
    log_level: LevelFilter,
    /// Answer route requests with straight-line routes.
    #[arg(long)]
    reroute: bool,
    /// Print a JSON report instead of a summary.
    #[arg(long)]
    json: bool,
    /// Print a path snapshot after the run.
    #[arg(long)]
    export: bool,
    /// Restore paths from a snapshot before the run.
    #[arg(long, value_name = "SNAPSHOT")]
    import: Option<String>,
}

#[derive(Debug, Serialize)]
struct Report {
    ticks: u64,
    turn: u32,
    units: Vec<UnitReport>,
    events: Vec<String>,
    pending_requests: Vec<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    snapshot: Option<String>,
}

#[derive(Debug, Serialize)]
struct UnitReport {
    id: u32,
    team: u8,
    cell: [i16; 2],
    pixel: [i32; 2],
    facing: u8,
    speed: u16,
    order: String,
    state: String,
    remaining_cost: Option<u32>,
}

impl UnitReport {
    fn new(unit: &Unit, world: &World, movement: &Movement) -> Self {
        let pixel = movement.position(world, unit.id).unwrap_or(unit.pixel);
        Self {
            id: unit.id.get(),
            team: unit.team.get(),
            cell: [unit.grid.x(), unit.grid.y()],
            pixel: [pixel.x(), pixel.y()],
            facing: unit.angle.get(),
            speed: unit.speed,
            order: format!("{:?}", unit.order),
            state: format!("{:?}", unit.order_state),
            remaining_cost: movement.movement_cost(world, unit.id),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level)?;

    let text = fs::read_to_string(&cli.scenario)
        .with_context(|| format!("failed to read scenario {}", cli.scenario.display()))?;
    let scenario = Scenario::parse(&text)
        .with_context(|| format!("invalid scenario {}", cli.scenario.display()))?;

    let mut world = World::new();
    let mut events = Vec::new();
    let spawned = scenario
        .install(&mut world, &mut events)
        .context("failed to install scenario")?;
    info!("installed {} units", spawned.len());

    if let Some(encoded) = cli.import.as_deref() {
        let snapshot = PathSnapshot::decode(encoded).context("failed to decode path snapshot")?;
        for unit in snapshot.restore(&mut world, &mut events) {
            warn!("snapshot names missing unit {}", unit.get());
        }
    }

    let mut movement = Movement::default();
    for tick in 0..cli.ticks {
        if tick > 0 && tick % cli.ticks_per_turn == 0 {
            movement.begin_turn(&mut world, &mut events);
        }
        let first = events.len();
        movement.tick(&mut world, &mut events);
        for event in events.iter().skip(first) {
            info!("tick {tick}: {event:?}");
        }
        if cli.reroute {
            reroute(&mut world, &mut events);
        }
    }

    let snapshot = if cli.export {
        Some(
            PathSnapshot::capture(&world)
                .encode()
                .context("failed to encode path snapshot")?,
        )
    } else {
        None
    };

    if cli.json {
        let report = Report {
            ticks: movement.ticks(),
            turn: query::turn(&world),
            units: query::units(&world)
                .map(|unit| UnitReport::new(unit, &world, &movement))
                .collect(),
            events: events.iter().map(|event| format!("{event:?}")).collect(),
            pending_requests: query::pending_requests(&world)
                .iter()
                .map(|request| request.unit.get())
                .collect(),
            snapshot,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("failed to serialise report")?
        );
        return Ok(());
    }

    for unit in query::units(&world) {
        println!(
            "unit {} at ({}, {}) {:?}/{:?}",
            unit.id.get(),
            unit.grid.x(),
            unit.grid.y(),
            unit.order,
            unit.order_state
        );
    }
    if let Some(snapshot) = snapshot {
        println!("{snapshot}");
    }
    Ok(())
}

fn init_logging(level: LevelFilter) -> Result<()> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}][{}] {}",
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()
        .context("failed to install logger")
}

fn reroute(world: &mut World, events: &mut Vec<Event>) {
    let requests = world.parts_mut().requests.drain();
    for request in requests {
        debug!(
            "routing unit {} from {:?} to {:?}",
            request.unit.get(),
            request.from,
            request.to
        );
        let mut path = GroundPath::starting_at(request.from);
        path.append_linear_steps(request.to);
        world::apply(
            world,
            Command::AssignPath {
                unit: request.unit,
                path: path.into(),
            },
            events,
        );
    }
}
