//! TOML scenario files: a terrain map, session rules and the units to place.
//!
//! Map rows use one symbol per tile: `.` land, `,` rough ground, `~` water,
//! `_` coast and `#` impassable. Each `[[unit]]` table may carry at most one
//! of `route`, `fly_to` or `face_toward`.

use log::warn;
use serde::Deserialize;
use thiserror::Error;
use unit_paths_core::{
    Command, Event, GridPoint, GroundPath, MovementRules, Octant, Order, TeamId, Terrain,
    UnitBlueprint, UnitFlags, UnitId, UnitPath, UnitValues,
};
use unit_paths_system_movement::{create_air_path, create_builder_path};
use unit_paths_world::{self as world, query, World};

/// Longest map side accepted from a scenario.
const MAX_SIDE: usize = 1024;

/// Parsed scenario file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Scenario {
    map: MapSection,
    #[serde(default)]
    rules: MovementRules,
    #[serde(default, rename = "unit")]
    units: Vec<UnitEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MapSection {
    rows: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct UnitEntry {
    #[serde(default)]
    team: u8,
    flags: Vec<String>,
    at: [i16; 2],
    #[serde(default)]
    facing: u8,
    #[serde(default)]
    speed: u16,
    #[serde(default)]
    rounds: u16,
    #[serde(default)]
    move_and_fire: bool,
    #[serde(default)]
    storage: u16,
    #[serde(default)]
    max_velocity: u8,
    #[serde(default)]
    selected: bool,
    #[serde(default)]
    route: Vec<[i16; 2]>,
    fly_to: Option<[i16; 2]>,
    face_toward: Option<[i16; 2]>,
    /// Index of the transport to board, in file order.
    board: Option<usize>,
}

/// Errors raised while reading or installing a scenario.
#[derive(Debug, Error)]
pub(crate) enum ScenarioError {
    /// The file is not valid scenario TOML.
    #[error("could not parse scenario: {0}")]
    Parse(#[from] toml::de::Error),
    /// The map has no tiles.
    #[error("scenario map has no tiles")]
    EmptyMap,
    /// The map exceeds the supported size.
    #[error("scenario map exceeds {MAX_SIDE} tiles along a side")]
    MapTooLarge,
    /// A map row differs in width from the first row.
    #[error("map row {row} has {found} tiles, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    /// A map symbol is not a known terrain.
    #[error("unknown terrain '{symbol}' at column {column}, row {row}")]
    UnknownTerrain {
        symbol: char,
        column: usize,
        row: usize,
    },
    /// A unit names a flag that does not exist.
    #[error("unit {unit} has unknown flag '{flag}'")]
    UnknownFlag { unit: usize, flag: String },
    /// A unit starts outside the map.
    #[error("unit {unit} starts outside the map at ({x}, {y})")]
    OutsideMap { unit: usize, x: i16, y: i16 },
    /// A unit carries more than one kind of path.
    #[error("unit {unit} declares more than one path")]
    ConflictingPaths { unit: usize },
    /// A route skips over a tile.
    #[error("unit {unit} route is not a chain of neighbouring tiles")]
    BrokenRoute { unit: usize },
    /// A flight or facing target coincides with the unit.
    #[error("unit {unit} targets its own position")]
    DegenerateTarget { unit: usize },
    /// A unit boards a transport that is not in the file.
    #[error("unit {unit} boards unknown unit {target}")]
    UnknownTransport { unit: usize, target: usize },
}

impl Scenario {
    /// Parses scenario TOML.
    pub(crate) fn parse(text: &str) -> Result<Self, ScenarioError> {
        Ok(toml::from_str(text)?)
    }

    /// Builds the map, applies the rules and places every unit with its
    /// orders and path. Returns the spawned units in file order.
    pub(crate) fn install(
        &self,
        world: &mut World,
        events: &mut Vec<Event>,
    ) -> Result<Vec<UnitId>, ScenarioError> {
        let tiles = self.tiles()?;
        let rows = tiles.len();
        let columns = tiles.first().map_or(0, Vec::len);
        world::apply(
            world,
            Command::ConfigureMap {
                columns: side(columns)?,
                rows: side(rows)?,
            },
            events,
        );
        for (y, row) in tiles.iter().enumerate() {
            for (x, terrain) in row.iter().enumerate() {
                if *terrain != Terrain::Land {
                    world::apply(
                        world,
                        Command::SetTerrain {
                            cell: GridPoint::new(coordinate(x)?, coordinate(y)?),
                            terrain: *terrain,
                        },
                        events,
                    );
                }
            }
        }
        world::apply(
            world,
            Command::ConfigureRules {
                rules: self.rules.clone(),
            },
            events,
        );

        let mut ids = Vec::with_capacity(self.units.len());
        for (index, entry) in self.units.iter().enumerate() {
            let blueprint = entry.blueprint(index, columns, rows)?;
            let mut spawned = Vec::new();
            world::apply(world, Command::SpawnUnit { blueprint }, &mut spawned);
            let id = spawned.iter().find_map(|event| match event {
                Event::UnitSpawned { unit, .. } => Some(*unit),
                _ => None,
            });
            events.append(&mut spawned);
            match id {
                Some(id) => ids.push(id),
                None => warn!("unit {index} was not spawned"),
            }
        }

        for (index, (entry, id)) in self.units.iter().zip(ids.iter().copied()).enumerate() {
            if let Some(target) = entry.board {
                let transport = ids
                    .get(target)
                    .copied()
                    .ok_or(ScenarioError::UnknownTransport {
                        unit: index,
                        target,
                    })?;
                world::apply(
                    world,
                    Command::IssueOrder {
                        unit: id,
                        order: Order::Board { transport },
                    },
                    events,
                );
            }
            if entry.face_toward.is_some() {
                world::apply(
                    world,
                    Command::IssueOrder {
                        unit: id,
                        order: Order::Build,
                    },
                    events,
                );
            }
            if let Some(path) = entry.path(index, world, id)? {
                world::apply(world, Command::AssignPath { unit: id, path }, events);
            }
            if entry.selected {
                if let Some(unit) = world.parts_mut().units.get_mut(id) {
                    unit.selected = true;
                }
            }
        }
        Ok(ids)
    }

    fn tiles(&self) -> Result<Vec<Vec<Terrain>>, ScenarioError> {
        let expected = self
            .map
            .rows
            .first()
            .map_or(0, |row| row.chars().count());
        if expected == 0 {
            return Err(ScenarioError::EmptyMap);
        }
        if expected > MAX_SIDE || self.map.rows.len() > MAX_SIDE {
            return Err(ScenarioError::MapTooLarge);
        }
        self.map
            .rows
            .iter()
            .enumerate()
            .map(|(row, line)| {
                let tiles = line
                    .chars()
                    .enumerate()
                    .map(|(column, symbol)| {
                        terrain_of(symbol).ok_or(ScenarioError::UnknownTerrain {
                            symbol,
                            column,
                            row,
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                if tiles.len() != expected {
                    return Err(ScenarioError::RaggedRow {
                        row,
                        expected,
                        found: tiles.len(),
                    });
                }
                Ok(tiles)
            })
            .collect()
    }
}

impl UnitEntry {
    fn blueprint(
        &self,
        index: usize,
        columns: usize,
        rows: usize,
    ) -> Result<UnitBlueprint, ScenarioError> {
        let [x, y] = self.at;
        let inside = usize::try_from(x).is_ok_and(|x| x < columns)
            && usize::try_from(y).is_ok_and(|y| y < rows);
        if !inside {
            return Err(ScenarioError::OutsideMap { unit: index, x, y });
        }
        let flags = self
            .flags
            .iter()
            .try_fold(UnitFlags::empty(), |flags, name| {
                UnitFlags::from_name_ignore_case(name)
                    .map(|flag| flags | flag)
                    .ok_or_else(|| ScenarioError::UnknownFlag {
                        unit: index,
                        flag: name.clone(),
                    })
            })?;
        Ok(UnitBlueprint {
            team: TeamId::new(self.team),
            flags,
            values: UnitValues {
                speed: self.speed,
                rounds: self.rounds,
                move_and_fire: self.move_and_fire,
                storage: self.storage,
                max_velocity: self.max_velocity,
            },
            cell: GridPoint::new(x, y),
            angle: Octant::new(self.facing),
        })
    }

    fn path(
        &self,
        index: usize,
        world: &World,
        id: UnitId,
    ) -> Result<Option<UnitPath>, ScenarioError> {
        let declared = usize::from(!self.route.is_empty())
            + usize::from(self.fly_to.is_some())
            + usize::from(self.face_toward.is_some());
        if declared > 1 {
            return Err(ScenarioError::ConflictingPaths { unit: index });
        }
        let Some(unit) = query::unit(world, id) else {
            return Ok(None);
        };

        if !self.route.is_empty() {
            let cells: Vec<GridPoint> = self
                .route
                .iter()
                .map(|[x, y]| GridPoint::new(*x, *y))
                .collect();
            return GroundPath::from_route(unit.grid, &cells)
                .map(|path| Some(path.into()))
                .ok_or(ScenarioError::BrokenRoute { unit: index });
        }
        if let Some([x, y]) = self.fly_to {
            return create_air_path(unit, GridPoint::new(x, y))
                .map(|path| Some(path.into()))
                .ok_or(ScenarioError::DegenerateTarget { unit: index });
        }
        if let Some([x, y]) = self.face_toward {
            let target = GridPoint::new(x, y);
            if target == unit.grid {
                return Err(ScenarioError::DegenerateTarget { unit: index });
            }
            return Ok(Some(create_builder_path(unit, target).into()));
        }
        Ok(None)
    }
}

fn terrain_of(symbol: char) -> Option<Terrain> {
    match symbol {
        '.' => Some(Terrain::Land),
        ',' => Some(Terrain::Rough),
        '~' => Some(Terrain::Water),
        '_' => Some(Terrain::Coast),
        '#' => Some(Terrain::Blocked),
        _ => None,
    }
}

fn side(length: usize) -> Result<u16, ScenarioError> {
    u16::try_from(length).map_err(|_| ScenarioError::MapTooLarge)
}

fn coordinate(index: usize) -> Result<i16, ScenarioError> {
    i16::try_from(index).map_err(|_| ScenarioError::MapTooLarge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use unit_paths_core::OrderState;

    const CONVOY: &str = r#"
[map]
rows = [
    "....~",
    ".,..~",
    "....#",
]

[rules]
observer = 0

[[unit]]
flags = ["LAND"]
at = [0, 0]
facing = 2
speed = 3
route = [[1, 0], [2, 0], [3, 0]]

[[unit]]
flags = ["AIR"]
at = [0, 2]
speed = 4
max_velocity = 4
fly_to = [3, 2]

[[unit]]
flags = ["LAND", "CONSTRUCTOR"]
at = [2, 2]
face_toward = [2, 1]
"#;

    #[test]
    fn installs_map_units_and_paths() {
        let scenario = Scenario::parse(CONVOY).expect("parses");
        let mut world = World::new();
        let mut events = Vec::new();
        let ids = scenario.install(&mut world, &mut events).expect("installs");
        assert_eq!(ids.len(), 3);

        let terrain = query::terrain(&world);
        assert_eq!(terrain.dimensions(), (5, 3));
        assert_eq!(
            unit_paths_world::Accessibility::terrain(terrain, GridPoint::new(1, 1)),
            Some(Terrain::Rough)
        );

        let tank = query::unit(&world, ids[0]).expect("tank");
        assert!(matches!(tank.path, Some(UnitPath::Ground(_))));
        assert_eq!(tank.move_to, GridPoint::new(3, 0));
        assert_eq!(tank.order_state, OrderState::InProgress);

        let plane = query::unit(&world, ids[1]).expect("plane");
        assert!(matches!(plane.path, Some(UnitPath::Air(_))));

        let builder = query::unit(&world, ids[2]).expect("builder");
        assert_eq!(builder.order, Order::Build);
        assert!(matches!(builder.path, Some(UnitPath::Builder(_))));
    }

    #[test]
    fn rejects_ragged_maps_and_unknown_symbols() {
        let ragged = Scenario::parse("[map]\nrows = [\"...\", \"..\"]\n").expect("parses");
        assert!(matches!(
            ragged.install(&mut World::new(), &mut Vec::new()),
            Err(ScenarioError::RaggedRow { row: 1, .. })
        ));

        let unknown = Scenario::parse("[map]\nrows = [\"..?\"]\n").expect("parses");
        assert!(matches!(
            unknown.install(&mut World::new(), &mut Vec::new()),
            Err(ScenarioError::UnknownTerrain { symbol: '?', .. })
        ));
    }

    #[test]
    fn rejects_broken_routes_and_unknown_flags() {
        let broken = Scenario::parse(
            "[map]\nrows = [\"....\"]\n[[unit]]\nflags = [\"LAND\"]\nat = [0, 0]\nroute = [[2, 0]]\n",
        )
        .expect("parses");
        assert!(matches!(
            broken.install(&mut World::new(), &mut Vec::new()),
            Err(ScenarioError::BrokenRoute { unit: 0 })
        ));

        let flagged = Scenario::parse(
            "[map]\nrows = [\"....\"]\n[[unit]]\nflags = [\"HOVER\"]\nat = [0, 0]\n",
        )
        .expect("parses");
        assert!(matches!(
            flagged.install(&mut World::new(), &mut Vec::new()),
            Err(ScenarioError::UnknownFlag { unit: 0, .. })
        ));
    }

    #[test]
    fn unknown_keys_are_parse_errors() {
        assert!(matches!(
            Scenario::parse("[map]\nrows = [\".\"]\ncolour = 3\n"),
            Err(ScenarioError::Parse(_))
        ));
    }
}
