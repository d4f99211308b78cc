//! Step-list execution for land and sea units.

use log::{debug, trace};
use unit_paths_core::{
    Event, GridPoint, GroundPath, MarkerKind, MovementRules, Order, OrderState, PathMarker,
    PathStep, Terrain, UnitFlags, UnitId, ORTHOGONAL_COST,
};
use unit_paths_world::{Accessibility, SpriteSet, Unit, UnitsView};

use crate::{paths, MovementContext, PathBehavior};

enum Stepped {
    Moved,
    Stopped,
}

impl PathBehavior for GroundPath {
    fn is_in_path(&self, cell: GridPoint) -> bool {
        GroundPath::is_in_path(self, cell)
    }

    fn cancel_movement(&mut self, unit: &mut Unit, _ctx: &mut MovementContext<'_>) {
        self.stop_at(unit.grid);
    }

    fn movement_cost(&self, unit: &Unit, access: &dyn Accessibility, rules: &MovementRules) -> u32 {
        let quarters: u32 = moves(self, unit.grid)
            .map(|(step, cell)| {
                let cost = match access.cost(unit, cell) {
                    0 => u8::MAX,
                    cost => cost,
                };
                paths::effective_cost(unit, cost, step.is_diagonal(), rules)
            })
            .sum();
        quarters
            .saturating_sub(u32::from(unit.move_fraction))
            .div_ceil(u32::from(ORTHOGONAL_COST))
    }

    /// Takes at most one step, or several in a row while the unit is out of
    /// the observer's sight in a local game. Returns `true` when the unit
    /// moved this call and the path has not finished.
    fn execute(
        &mut self,
        unit: &mut Unit,
        units: &mut UnitsView<'_>,
        ctx: &mut MovementContext<'_>,
    ) -> bool {
        let mut moved = false;
        while let Stepped::Moved = step(self, unit, units, ctx) {
            moved = true;
            if !fast_forwards(unit, ctx.rules) {
                break;
            }
            trace!("fast-forwarding hidden unit {:?}", unit.id);
        }
        moved && unit.order_state == OrderState::InTransition
    }

    fn update_unit_angle(&self, unit: &mut Unit, events: &mut Vec<Event>) {
        if let Some(step) = self.next_moving_step() {
            let target = paths::get_angle(i32::from(step.dx()), i32::from(step.dy()));
            let _ = paths::update_angle(unit, target, events);
        }
    }

    fn draw(&self, unit: &Unit, access: &dyn Accessibility, rules: &MovementRules) -> Vec<PathMarker> {
        let mut scratch = unit.clone();
        scratch.path = None;
        let mut reachable = true;
        moves(self, unit.grid)
            .map(|(step, cell)| {
                let cost = access.cost(&scratch, cell);
                reachable = reachable
                    && cost > 0
                    && scratch.available_speed() > 0
                    && paths::calculate_step(&mut scratch, cost, step.is_diagonal(), rules);
                let kind = if reachable {
                    MarkerKind::Reachable {
                        remaining: scratch.available_speed(),
                    }
                } else {
                    MarkerKind::NextTurn
                };
                PathMarker { cell, kind }
            })
            .collect()
    }

    fn is_end_step(&self) -> bool {
        GroundPath::is_end_step(self)
    }
}

fn step(
    path: &mut GroundPath,
    unit: &mut Unit,
    units: &mut UnitsView<'_>,
    ctx: &mut MovementContext<'_>,
) -> Stepped {
    unit.move_to = path.end();

    if !path.skip_placeholders() {
        finish(path, unit, ctx);
        return Stepped::Stopped;
    }
    let Some(step) = path.current_step() else {
        return Stepped::Stopped;
    };

    let facing = paths::get_angle(i32::from(step.dx()), i32::from(step.dy()));
    if paths::update_angle(unit, facing, ctx.events) {
        return Stepped::Stopped;
    }

    if unit.available_speed() == 0 || unit.engine_power == 0 {
        unit.order_state = OrderState::AwaitingBudget;
        return Stepped::Stopped;
    }

    let destination = unit.grid.offset(step);
    if !ctx.access.contains(destination) {
        blocked(unit, ctx);
        return Stepped::Stopped;
    }

    if let Order::Board { transport } = unit.order {
        if can_board(unit, transport, destination, units) {
            debug!("unit {:?} boards transport {transport:?}", unit.id);
            unit.order = Order::Store { transport };
            unit.order_state = OrderState::Init;
            ctx.events.push(Event::StoreOrderIssued {
                unit: unit.id,
                transport,
            });
            return Stepped::Stopped;
        }
    }

    if ctx.reservations.is_reserved(destination)
        || paths::is_occupied(unit, destination, facing, units, ctx)
    {
        blocked(unit, ctx);
        return Stepped::Stopped;
    }

    let cost = ctx.access.cost(unit, destination);
    if cost == 0 {
        blocked(unit, ctx);
        return Stepped::Stopped;
    }
    if !paths::take_step(unit, cost, step.is_diagonal(), ctx.rules) {
        unit.order_state = OrderState::AwaitingBudget;
        return Stepped::Stopped;
    }

    if unit.flags.contains(UnitFlags::AMPHIBIOUS) {
        let afloat = ctx.access.terrain(destination).is_some_and(Terrain::is_water);
        unit.sprite = if afloat {
            SpriteSet::Water
        } else {
            SpriteSet::Land
        };
    }

    let from = unit.grid;
    paths::relocate(unit, destination.center(), ctx);
    path.advance();
    trace!("unit {:?} stepped {from:?} -> {destination:?}", unit.id);
    ctx.events.push(Event::UnitMoved {
        unit: unit.id,
        from,
        to: destination,
    });

    if path.skip_placeholders() {
        unit.order_state = OrderState::InTransition;
    } else {
        finish(path, unit, ctx);
    }
    Stepped::Moved
}

fn finish(path: &GroundPath, unit: &mut Unit, ctx: &mut MovementContext<'_>) {
    if unit.grid == path.end() {
        unit.order_state = OrderState::Completed;
        ctx.events.push(Event::PathCompleted { unit: unit.id });
    } else {
        blocked(unit, ctx);
    }
}

/// Asks for a replacement route, or gives up for this tick when no request
/// may be issued.
fn blocked(unit: &mut Unit, ctx: &mut MovementContext<'_>) {
    let rules = ctx.rules;
    let may_replan = !rules.is_remote(unit.team)
        && unit.order != Order::Build
        && !(rules.end_of_turn && !rules.turn_timer_active);

    if may_replan && ctx.requests.request_path(unit) {
        debug!("unit {:?} blocked, requesting a new route", unit.id);
        unit.order_state = OrderState::AwaitingPath;
        ctx.events.push(Event::PathRequested { unit: unit.id });
        return;
    }

    debug!("unit {:?} blocked", unit.id);
    unit.order_state = OrderState::Blocked;
    ctx.requests.remove_request(unit.id);
    ctx.events.push(Event::PathBlocked { unit: unit.id });
}

fn can_board(unit: &Unit, transport: UnitId, destination: GridPoint, units: &UnitsView<'_>) -> bool {
    units.get(transport).is_some_and(|carrier| {
        carrier.grid == destination && carrier.team == unit.team && carrier.free_storage() > 0
    })
}

fn fast_forwards(unit: &Unit, rules: &MovementRules) -> bool {
    unit.hits > 0
        && unit.order_state.is_moving()
        && !rules.network_game
        && !unit.is_visible_to(rules.observer)
}

fn moves(path: &GroundPath, origin: GridPoint) -> impl Iterator<Item = (PathStep, GridPoint)> + '_ {
    path.remaining()
        .iter()
        .copied()
        .filter(|step| !step.is_noop())
        .scan(origin, |cell, step| {
            *cell = cell.offset(step);
            Some((step, *cell))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use unit_paths_core::{Octant, TeamId, UnitBlueprint, UnitValues};
    use unit_paths_world::TerrainMap;

    fn unit(speed: u16) -> Unit {
        Unit::from_blueprint(
            UnitId::new(3),
            UnitBlueprint {
                team: TeamId::new(0),
                flags: UnitFlags::LAND,
                values: UnitValues {
                    speed,
                    ..UnitValues::default()
                },
                cell: GridPoint::new(0, 0),
                angle: Octant::EAST,
            },
        )
    }

    fn straight_path(to: GridPoint) -> GroundPath {
        let mut path = GroundPath::starting_at(GridPoint::new(0, 0));
        path.append_linear_steps(to);
        path
    }

    #[test]
    fn cost_sums_terrain_and_diagonals() {
        let mut map = TerrainMap::new(8, 8);
        assert!(map.set(GridPoint::new(2, 0), Terrain::Rough));
        let rules = MovementRules::default();
        let mover = unit(10);

        assert_eq!(straight_path(GridPoint::new(3, 0)).movement_cost(&mover, &map, &rules), 4);

        let mut diagonal = GroundPath::starting_at(GridPoint::new(0, 0));
        diagonal.add_step(PathStep::new(1, 1));
        diagonal.add_step(PathStep::new(1, 1));
        assert_eq!(diagonal.movement_cost(&mover, &map, &rules), 3);
    }

    #[test]
    fn markers_switch_to_next_turn_when_budget_runs_out() {
        let map = TerrainMap::new(8, 8);
        let rules = MovementRules::default();
        let markers = straight_path(GridPoint::new(3, 0)).draw(&unit(2), &map, &rules);
        let kinds: Vec<MarkerKind> = markers.iter().map(|marker| marker.kind).collect();
        assert_eq!(
            kinds,
            vec![
                MarkerKind::Reachable { remaining: 1 },
                MarkerKind::Reachable { remaining: 0 },
                MarkerKind::NextTurn,
            ]
        );
        assert_eq!(markers[2].cell, GridPoint::new(3, 0));
    }

    #[test]
    fn pre_turning_faces_the_next_real_step() {
        let mut path = GroundPath::starting_at(GridPoint::new(0, 0));
        path.add_step(PathStep::NOOP);
        path.add_step(PathStep::new(0, 1));
        let mut mover = unit(1);
        let mut events = Vec::new();
        path.update_unit_angle(&mut mover, &mut events);
        assert_eq!(mover.angle, Octant::SOUTH_EAST);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn end_step_tracks_the_cursor() {
        let mut path = straight_path(GridPoint::new(2, 0));
        assert!(!PathBehavior::is_end_step(&path));
        path.advance();
        assert!(PathBehavior::is_end_step(&path));
        assert!(PathBehavior::is_in_path(&path, GridPoint::new(2, 0)));
    }
}
