#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic movement system that executes the paths owned by units.
//!
//! Every tick the [`Movement`] system walks the units in identifier order,
//! takes each unit's path out for the duration of the call and hands it the
//! rest of the world through a [`MovementContext`]. Ground paths advance one
//! tile per tick, air paths interpolate in fixed point and builder paths only
//! turn the unit.

mod air;
mod behavior;
mod builder;
mod construct;
mod ground;
pub mod paths;
mod unload;

use log::{debug, trace};
use unit_paths_core::{
    Command, Event, GridPoint, MovementRules, Order, OrderState, PathMarker, PixelPoint, UnitId,
};
use unit_paths_world::{
    apply, query, Accessibility, Layer, MapStatus, PathRequests, SiteReservations, SpatialHash,
    Unit, UnitStore, UnitsView, World,
};

pub use behavior::PathBehavior;
pub use construct::{create_air_path, create_builder_path};
pub use unload::{abort_unload, begin_unload, complete_unload};

/// Collaborators a path needs while it executes, borrowed from the world.
pub struct MovementContext<'a> {
    /// Terrain entry costs.
    pub access: &'a dyn Accessibility,
    /// Tile buckets of every unit.
    pub hash: &'a mut SpatialHash,
    /// Presence overlay and its deferred refresh queue.
    pub status: &'a mut MapStatus,
    /// Claimed unload sites shared by every team.
    pub reservations: &'a mut SiteReservations,
    /// Sink for replacement route requests.
    pub requests: &'a mut dyn PathRequests,
    /// Session rules.
    pub rules: &'a MovementRules,
    /// Events produced while executing.
    pub events: &'a mut Vec<Event>,
}

impl<'a> MovementContext<'a> {
    /// Splits `world` into its unit store and a context over everything else.
    pub fn split(world: &'a mut World, events: &'a mut Vec<Event>) -> (&'a mut UnitStore, Self) {
        let parts = world.parts_mut();
        let context = Self {
            access: parts.terrain,
            hash: parts.hash,
            status: parts.status,
            reservations: parts.reservations,
            requests: parts.requests,
            rules: parts.rules,
            events,
        };
        (parts.units, context)
    }
}

/// Pure system that advances every unit along its path.
#[derive(Debug, Default)]
pub struct Movement {
    ticks: u64,
}

impl Movement {
    /// Number of ticks executed so far.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Starts a new turn, refilling every unit's movement budget.
    pub fn begin_turn(&mut self, world: &mut World, events: &mut Vec<Event>) {
        apply(world, Command::BeginTurn, events);
    }

    /// Executes one tick for every unit that owns a path.
    pub fn tick(&mut self, world: &mut World, events: &mut Vec<Event>) {
        self.ticks = self.ticks.saturating_add(1);
        let (units, mut ctx) = MovementContext::split(world, events);
        for id in units.ids() {
            let Some((unit, mut others)) = units.split(id) else {
                continue;
            };
            drive(unit, &mut others, &mut ctx);
        }
        flush_map_status(units, &mut ctx);
    }

    /// Brings `unit` to the nearest stop. Returns `false` when it has no
    /// path.
    pub fn cancel(&mut self, world: &mut World, unit: UnitId, events: &mut Vec<Event>) -> bool {
        let (units, mut ctx) = MovementContext::split(world, events);
        let Some(target) = units.get_mut(unit) else {
            return false;
        };
        let Some(mut path) = target.path.take() else {
            return false;
        };
        debug!("cancelling movement of {unit:?}");
        path.cancel_movement(target, &mut ctx);
        target.path = Some(path);
        true
    }

    /// Markers along the remaining route of `unit`.
    #[must_use]
    pub fn draw(&self, world: &World, unit: UnitId) -> Vec<PathMarker> {
        query::unit(world, unit)
            .and_then(|target| {
                let path = target.path.as_ref()?;
                Some(path.draw(target, query::terrain(world), query::rules(world)))
            })
            .unwrap_or_default()
    }

    /// Whole movement points `unit` still needs to finish its path.
    #[must_use]
    pub fn movement_cost(&self, world: &World, unit: UnitId) -> Option<u32> {
        let target = query::unit(world, unit)?;
        let path = target.path.as_ref()?;
        Some(path.movement_cost(target, query::terrain(world), query::rules(world)))
    }

    /// Visual position of `unit` along its path, or its tile centre when it
    /// has none.
    #[must_use]
    pub fn position(&self, world: &World, unit: UnitId) -> Option<PixelPoint> {
        let target = query::unit(world, unit)?;
        Some(match target.path.as_ref() {
            Some(path) => path.position(target),
            None => target.pixel,
        })
    }

    /// Claims `site` for `transport` to place `cargo` on.
    pub fn begin_unload(
        &mut self,
        world: &mut World,
        transport: UnitId,
        cargo: UnitId,
        site: GridPoint,
        events: &mut Vec<Event>,
    ) -> bool {
        let (units, mut ctx) = MovementContext::split(world, events);
        let Some((carrier, others)) = units.split(transport) else {
            return false;
        };
        begin_unload(carrier, cargo, site, &others, &mut ctx)
    }

    /// Places the cargo of `transport` on its claimed site.
    pub fn complete_unload(
        &mut self,
        world: &mut World,
        transport: UnitId,
        events: &mut Vec<Event>,
    ) -> bool {
        let (units, mut ctx) = MovementContext::split(world, events);
        let Some((carrier, mut others)) = units.split(transport) else {
            return false;
        };
        complete_unload(carrier, &mut others, &mut ctx)
    }

    /// Abandons the unload of `transport`, releasing its claim.
    pub fn abort_unload(&mut self, world: &mut World, transport: UnitId, events: &mut Vec<Event>) {
        let (units, mut ctx) = MovementContext::split(world, events);
        if let Some(carrier) = units.get_mut(transport) {
            abort_unload(carrier, &mut ctx);
        }
    }
}

fn drive(unit: &mut Unit, others: &mut UnitsView<'_>, ctx: &mut MovementContext<'_>) {
    let Some(mut path) = unit.path.take() else {
        return;
    };
    if matches!(unit.order, Order::Store { .. } | Order::Unload { .. }) {
        unit.path = Some(path);
        return;
    }
    if matches!(unit.order_state, OrderState::Init | OrderState::Blocked) {
        unit.order_state = OrderState::InProgress;
    }

    if unit.order_state == OrderState::AwaitingBudget {
        path.update_unit_angle(unit, ctx.events);
    } else if unit.order_state.is_moving() {
        let in_transit = path.execute(unit, others, ctx);
        trace!(
            "unit {:?} executed, state {:?}, in transit {in_transit}",
            unit.id,
            unit.order_state
        );
    }

    match unit.order_state {
        OrderState::InProgress
        | OrderState::InTransition
        | OrderState::AwaitingBudget
        | OrderState::Blocked => unit.path = Some(path),
        OrderState::Completed => {
            if unit.order == Order::Move {
                unit.order = Order::Idle;
            }
        }
        OrderState::AwaitingPath | OrderState::Init => {}
    }
}

fn flush_map_status(units: &UnitStore, ctx: &mut MovementContext<'_>) {
    for cell in ctx.status.take_dirty() {
        let (surface, air) = ctx
            .hash
            .bucket(cell)
            .iter()
            .filter_map(|id| units.get(*id))
            .fold((0_u8, 0_u8), |(surface, air), unit| match unit.layer() {
                Layer::Surface => (surface.saturating_add(1), air),
                Layer::Air => (surface, air.saturating_add(1)),
            });
        ctx.status.refresh(cell, surface, air);
    }
}
