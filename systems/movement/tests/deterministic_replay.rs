use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use unit_paths_core::{
    Command, Event, GridPoint, GroundPath, MovementRules, Octant, OrderState, TeamId, Terrain,
    UnitBlueprint, UnitFlags, UnitId, UnitValues, ORTHOGONAL_COST,
};
use unit_paths_system_movement::{create_air_path, paths, Movement};
use unit_paths_world::{self as world, query, Unit, World};

#[test]
fn deterministic_replay_produces_identical_outcomes() {
    let first = replay(scripted_commands());
    let second = replay(scripted_commands());

    assert_eq!(first, second, "replay diverged between runs");
    assert_eq!(
        first.fingerprint(),
        second.fingerprint(),
        "fingerprint mismatch between runs"
    );

    let arrived: Vec<GridPoint> = first.units.iter().map(|unit| unit.cell).collect();
    assert_eq!(
        arrived,
        vec![
            GridPoint::new(5, 0),
            GridPoint::new(4, 4),
            GridPoint::new(6, 2),
        ]
    );
    assert!(first
        .units
        .iter()
        .all(|unit| unit.state == OrderState::Completed));
}

#[test]
fn ledger_never_underflows_and_keeps_fraction_bounded() {
    let mut rng = ChaCha8Rng::seed_from_u64(0x5eed_cafe);
    let rules = MovementRules::default();

    for _ in 0..512 {
        let speed = rng.gen_range(0..=12);
        let mut unit = unit_with_speed(speed);
        unit.move_fraction = rng.gen_range(0..=paths::MAX_FRACTION);

        for _ in 0..16 {
            let cost = rng.gen_range(1..=12);
            let diagonal = rng.gen_bool(0.5);
            let before = unit.speed;
            let paid = paths::take_step(&mut unit, cost, diagonal, &rules);

            assert!(unit.speed <= before, "budget grew while stepping");
            assert!(unit.move_fraction <= paths::MAX_FRACTION);
            if !paid {
                assert_eq!(unit.speed, 0, "failed steps drain the budget");
            }
        }
    }
}

#[test]
fn diagonal_surcharge_rounds_half_up() {
    let rules = MovementRules::default();
    let unit = unit_with_speed(u16::MAX / 8);
    for cost in 1..=10_u8 {
        let expected = (u32::from(cost) * 3).div_ceil(2);
        assert_eq!(paths::effective_cost(&unit, cost, true, &rules), expected);
        assert_eq!(
            paths::effective_cost(&unit, cost, false, &rules),
            u32::from(cost)
        );
    }
}

#[test]
fn real_time_steps_never_spend_budget() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let rules = MovementRules {
        real_time_movement: true,
        ..MovementRules::default()
    };
    let mut unit = unit_with_speed(3);
    for _ in 0..64 {
        let diagonal = rng.gen_bool(0.5);
        assert!(paths::take_step(&mut unit, ORTHOGONAL_COST, diagonal, &rules));
        assert_eq!(unit.speed, 3);
    }
    assert!(unit.travel_turns > 0);
}

fn replay(commands: Vec<Command>) -> ReplayOutcome {
    let mut world = World::new();
    let mut movement = Movement::default();
    let mut log = Vec::new();

    for command in commands {
        let mut events = Vec::new();
        world::apply(&mut world, command, &mut events);
        log.extend(events.iter().map(EventRecord::from));
    }

    let plane = UnitId::new(2);
    if let Some(flight) = query::unit(&world, plane).and_then(|unit| {
        create_air_path(unit, GridPoint::new(6, 2))
    }) {
        let mut events = Vec::new();
        world::apply(
            &mut world,
            Command::AssignPath {
                unit: plane,
                path: flight.into(),
            },
            &mut events,
        );
    }

    for turn in 0..4 {
        let mut events = Vec::new();
        if turn > 0 {
            movement.begin_turn(&mut world, &mut events);
        }
        for _ in 0..6 {
            movement.tick(&mut world, &mut events);
        }
        log.extend(events.iter().map(EventRecord::from));
    }

    let units = query::units(&world).map(UnitState::from).collect();
    ReplayOutcome { units, events: log }
}

fn scripted_commands() -> Vec<Command> {
    let mut commands = vec![
        Command::ConfigureMap {
            columns: 8,
            rows: 8,
        },
        Command::SetTerrain {
            cell: GridPoint::new(2, 0),
            terrain: Terrain::Rough,
        },
        Command::SetTerrain {
            cell: GridPoint::new(3, 3),
            terrain: Terrain::Rough,
        },
    ];

    let scout = blueprint(UnitFlags::LAND, 3, GridPoint::new(0, 0), Octant::EAST);
    let tank = blueprint(UnitFlags::LAND, 2, GridPoint::new(0, 0), Octant::SOUTH);
    let plane = UnitBlueprint {
        values: UnitValues {
            speed: 8,
            max_velocity: 4,
            ..UnitValues::default()
        },
        ..blueprint(UnitFlags::AIR, 8, GridPoint::new(1, 1), Octant::NORTH)
    };
    commands.push(Command::SpawnUnit { blueprint: scout });
    commands.push(Command::SpawnUnit {
        blueprint: UnitBlueprint {
            cell: GridPoint::new(0, 4),
            ..tank
        },
    });
    commands.push(Command::SpawnUnit { blueprint: plane });

    commands.push(Command::AssignPath {
        unit: UnitId::new(0),
        path: route(GridPoint::new(0, 0), GridPoint::new(5, 0)).into(),
    });
    commands.push(Command::AssignPath {
        unit: UnitId::new(1),
        path: route(GridPoint::new(0, 4), GridPoint::new(4, 4)).into(),
    });
    commands
}

fn blueprint(flags: UnitFlags, speed: u16, cell: GridPoint, angle: Octant) -> UnitBlueprint {
    UnitBlueprint {
        team: TeamId::new(0),
        flags,
        values: UnitValues {
            speed,
            ..UnitValues::default()
        },
        cell,
        angle,
    }
}

fn route(from: GridPoint, to: GridPoint) -> GroundPath {
    let mut path = GroundPath::starting_at(from);
    path.append_linear_steps(to);
    path
}

fn unit_with_speed(speed: u16) -> Unit {
    Unit::from_blueprint(
        UnitId::new(0),
        UnitBlueprint {
            team: TeamId::new(0),
            flags: UnitFlags::LAND,
            values: UnitValues {
                speed,
                rounds: 3,
                ..UnitValues::default()
            },
            cell: GridPoint::new(0, 0),
            angle: Octant::NORTH,
        },
    )
}

#[derive(Debug, PartialEq, Eq, Hash)]
struct ReplayOutcome {
    units: Vec<UnitState>,
    events: Vec<EventRecord>,
}

impl ReplayOutcome {
    fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

#[derive(Debug, PartialEq, Eq, Hash)]
struct UnitState {
    id: u32,
    cell: GridPoint,
    pixel: (i32, i32),
    angle: Octant,
    speed: u16,
    fraction: u8,
    state: OrderState,
}

impl From<&Unit> for UnitState {
    fn from(unit: &Unit) -> Self {
        Self {
            id: unit.id.get(),
            cell: unit.grid,
            pixel: (unit.pixel.x(), unit.pixel.y()),
            angle: unit.angle,
            speed: unit.speed,
            fraction: unit.move_fraction,
            state: unit.order_state,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Hash)]
enum EventRecord {
    Moved { unit: u32, to: GridPoint },
    Turned { unit: u32, angle: Octant },
    Completed { unit: u32 },
    TurnStarted { turn: u32 },
    Other,
}

impl From<&Event> for EventRecord {
    fn from(event: &Event) -> Self {
        match event {
            Event::UnitMoved { unit, to, .. } => Self::Moved {
                unit: unit.get(),
                to: *to,
            },
            Event::UnitTurned { unit, angle } => Self::Turned {
                unit: unit.get(),
                angle: *angle,
            },
            Event::PathCompleted { unit } => Self::Completed { unit: unit.get() },
            Event::TurnStarted { turn } => Self::TurnStarted { turn: *turn },
            _ => Self::Other,
        }
    }
}
