#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state for the unit path engine.
//!
//! The world owns every unit together with the indexes path execution reads
//! and mutates: the spatial hash, the site reservation table, the map status
//! overlay and the route request queue. Adapters mutate it only through
//! [`apply`]; the movement system borrows its parts through
//! [`World::parts_mut`].

mod requests;
mod reservations;
mod spatial;
mod store;
mod terrain;
mod unit;

use log::debug;
use unit_paths_core::{Command, Event, MovementRules, Order, OrderState};

pub use requests::{PathRequest, PathRequests, RequestQueue};
pub use reservations::SiteReservations;
pub use spatial::SpatialHash;
pub use store::{UnitStore, UnitsView};
pub use terrain::{Accessibility, MapStatus, TerrainMap};
pub use unit::{Layer, SpriteSet, Unit, DEFAULT_HITS, FULL_ENGINE_POWER};

const DEFAULT_COLUMNS: u16 = 16;
const DEFAULT_ROWS: u16 = 16;

/// Represents the authoritative world state.
#[derive(Debug)]
pub struct World {
    terrain: TerrainMap,
    status: MapStatus,
    hash: SpatialHash,
    units: UnitStore,
    reservations: SiteReservations,
    requests: RequestQueue,
    rules: MovementRules,
    turn: u32,
}

/// Mutable borrows of the world's parts, handed to the movement system.
#[derive(Debug)]
pub struct WorldParts<'a> {
    /// Every unit.
    pub units: &'a mut UnitStore,
    /// Terrain and entry costs.
    pub terrain: &'a TerrainMap,
    /// Presence overlay.
    pub status: &'a mut MapStatus,
    /// Tile buckets.
    pub hash: &'a mut SpatialHash,
    /// Claimed unload sites.
    pub reservations: &'a mut SiteReservations,
    /// Pending route requests.
    pub requests: &'a mut RequestQueue,
    /// Session rules.
    pub rules: &'a MovementRules,
}

impl World {
    /// Creates an empty world on a default-sized map of open land.
    #[must_use]
    pub fn new() -> Self {
        Self {
            terrain: TerrainMap::new(DEFAULT_COLUMNS, DEFAULT_ROWS),
            status: MapStatus::new(DEFAULT_COLUMNS, DEFAULT_ROWS),
            hash: SpatialHash::new(DEFAULT_COLUMNS, DEFAULT_ROWS),
            units: UnitStore::new(),
            reservations: SiteReservations::new(),
            requests: RequestQueue::new(),
            rules: MovementRules::default(),
            turn: 0,
        }
    }

    /// Splits the world into independently borrowable parts.
    pub fn parts_mut(&mut self) -> WorldParts<'_> {
        WorldParts {
            units: &mut self.units,
            terrain: &self.terrain,
            status: &mut self.status,
            hash: &mut self.hash,
            reservations: &mut self.reservations,
            requests: &mut self.requests,
            rules: &self.rules,
        }
    }

    fn reindex(&mut self) {
        let (columns, rows) = self.terrain.dimensions();
        self.hash = SpatialHash::new(columns, rows);
        self.status = MapStatus::new(columns, rows);
        for unit in self.units.iter() {
            self.hash.add(unit);
            self.status.occupy(unit.grid, unit.layer());
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureMap { columns, rows } => {
            world.terrain = TerrainMap::new(columns, rows);
            world.reindex();
        }
        Command::SetTerrain { cell, terrain } => {
            if !world.terrain.set(cell, terrain) {
                debug!("ignoring terrain change outside the map at {cell:?}");
            }
        }
        Command::ConfigureRules { rules } => {
            world.rules = rules;
        }
        Command::SpawnUnit { blueprint } => {
            let id = world.units.spawn(blueprint);
            if let Some(unit) = world.units.get(id) {
                world.hash.add(unit);
                world.status.occupy(unit.grid, unit.layer());
            }
            out_events.push(Event::UnitSpawned {
                unit: id,
                cell: blueprint.cell,
            });
        }
        Command::RemoveUnit { unit } => {
            let Some(removed) = world.units.remove(unit) else {
                return;
            };
            world.hash.remove(&removed);
            world.status.vacate(removed.grid, removed.layer());
            world.requests.remove_request(unit);
            if let Some(site) = removed.reserved_site {
                world.reservations.release(site);
                out_events.push(Event::SiteReleased { site });
            }
            out_events.push(Event::UnitRemoved { unit });
        }
        Command::AssignPath { unit, path } => {
            world.requests.remove_request(unit);
            if let Some(target) = world.units.get_mut(unit) {
                if let Some(end) = path.end() {
                    target.move_to = end;
                }
                if target.order == Order::Idle {
                    target.order = Order::Move;
                }
                target.order_state = OrderState::InProgress;
                target.path = Some(path);
            }
        }
        Command::IssueOrder { unit, order } => {
            if let Some(target) = world.units.get_mut(unit) {
                target.order = order;
                target.order_state = OrderState::Init;
            }
        }
        Command::BeginTurn => {
            world.turn = world.turn.saturating_add(1);
            for unit in world.units.iter_mut() {
                unit.refill();
            }
            out_events.push(Event::TurnStarted { turn: world.turn });
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use unit_paths_core::{GridPoint, MovementRules, UnitId};

    use super::{MapStatus, PathRequest, SiteReservations, TerrainMap, Unit, World};

    /// Looks up a unit.
    #[must_use]
    pub fn unit(world: &World, id: UnitId) -> Option<&Unit> {
        world.units.get(id)
    }

    /// Iterates every unit in identifier order.
    pub fn units(world: &World) -> impl Iterator<Item = &Unit> {
        world.units.iter()
    }

    /// Units standing on `cell`.
    #[must_use]
    pub fn units_at(world: &World, cell: GridPoint) -> &[UnitId] {
        world.hash.bucket(cell)
    }

    /// Terrain layout.
    #[must_use]
    pub fn terrain(world: &World) -> &TerrainMap {
        &world.terrain
    }

    /// Presence overlay.
    #[must_use]
    pub fn map_status(world: &World) -> &MapStatus {
        &world.status
    }

    /// Claimed unload sites.
    #[must_use]
    pub fn reservations(world: &World) -> &SiteReservations {
        &world.reservations
    }

    /// Route requests awaiting an answer.
    #[must_use]
    pub fn pending_requests(world: &World) -> &[PathRequest] {
        world.requests.pending()
    }

    /// Session rules.
    #[must_use]
    pub fn rules(world: &World) -> &MovementRules {
        &world.rules
    }

    /// Turns started so far.
    #[must_use]
    pub fn turn(world: &World) -> u32 {
        world.turn
    }
}
