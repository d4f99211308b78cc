//! Stateless helpers shared by every path type: facing, the movement-point
//! ledger, occupancy resolution and unload site reservations.
//!
//! Ground and air paths charge movement through [`take_step`] so both motion
//! models stay numerically consistent.

use log::{debug, trace};
use unit_paths_core::{
    Event, GridPoint, MovementRules, Octant, PathStep, PixelPoint, UnitFlags, UnitId, UnitPath,
    ORTHOGONAL_COST,
};
use unit_paths_world::{Accessibility, SiteReservations, Unit, UnitsView};

use crate::MovementContext;

const QUARTERS_PER_POINT: u32 = ORTHOGONAL_COST as u32;

/// Largest carried fraction, in quarter points.
pub const MAX_FRACTION: u8 = 3;

/// Facing that points along `(dx, dy)`, using only the signs.
///
/// A zero vector has no facing; debug builds assert, release builds answer
/// north.
#[must_use]
pub fn get_angle(dx: i32, dy: i32) -> Octant {
    debug_assert!(dx != 0 || dy != 0, "zero displacement has no facing");
    match (dx.signum(), dy.signum()) {
        (1, -1) => Octant::NORTH_EAST,
        (1, 0) => Octant::EAST,
        (1, 1) => Octant::SOUTH_EAST,
        (0, 1) => Octant::SOUTH,
        (-1, 1) => Octant::SOUTH_WEST,
        (-1, 0) => Octant::WEST,
        (-1, -1) => Octant::NORTH_WEST,
        _ => Octant::NORTH,
    }
}

/// Facing closest to an arbitrary vector, or `None` for the zero vector.
///
/// A component more than twice the size of the other dominates and the
/// facing snaps to that axis; otherwise the facing is diagonal.
#[must_use]
pub fn angle_toward(dx: i32, dy: i32) -> Option<Octant> {
    if dx == 0 && dy == 0 {
        return None;
    }
    let (ax, ay) = (dx.abs(), dy.abs());
    let snapped = if ax > ay.saturating_mul(2) {
        (dx, 0)
    } else if ay > ax.saturating_mul(2) {
        (0, dy)
    } else {
        (dx, dy)
    };
    Some(get_angle(snapped.0, snapped.1))
}

/// Turns `unit` one octant toward `target` along the shorter rotation.
///
/// Returns `false` when the unit already faces `target`. Half-circle turns
/// go clockwise.
pub fn update_angle(unit: &mut Unit, target: Octant, events: &mut Vec<Event>) -> bool {
    if unit.angle == target {
        return false;
    }
    let clockwise = unit.angle.rotated(1).turns_to(target);
    let counter = unit.angle.rotated(-1).turns_to(target);
    let direction = if clockwise <= counter { 1 } else { -1 };
    unit.angle = unit.angle.rotated(direction);
    events.push(Event::UnitTurned {
        unit: unit.id,
        angle: unit.angle,
    });
    true
}

/// Most quarter points a single step may cost the unit.
#[must_use]
pub fn velocity_cap(unit: &Unit, rules: &MovementRules) -> u32 {
    let mut cap = u32::from(unit.values.speed) * QUARTERS_PER_POINT;
    if rules.fast_movement {
        cap *= 2;
        if unit.flags.contains(UnitFlags::INFANTRY) {
            cap /= 2;
        }
    }
    cap
}

/// Quarter-point cost of a step after the diagonal surcharge and the
/// velocity cap.
#[must_use]
pub fn effective_cost(unit: &Unit, cost: u8, diagonal: bool, rules: &MovementRules) -> u32 {
    let mut quarters = u32::from(cost);
    if diagonal {
        quarters = (quarters * 3).div_ceil(2);
    }
    let cap = velocity_cap(unit, rules);
    if cap > 0 {
        quarters = quarters.min(cap);
    }
    quarters
}

/// Charges the unit for a step costing `cost` quarter points.
///
/// On failure the whole remaining budget drains into the carried fraction
/// and `false` is returned. On success the consumed whole points are debited
/// (nothing in real-time mode), shots shrink in proportion for units that
/// cannot move and fire, and the unused part of the last point is carried.
pub fn calculate_step(unit: &mut Unit, cost: u8, diagonal: bool, rules: &MovementRules) -> bool {
    charge(unit, cost, diagonal, rules).is_some()
}

/// [`calculate_step`] plus travel bookkeeping: every `values.speed` whole
/// points moved count as one turn of travel, which in real-time mode also
/// reloads the unit's shots.
pub fn take_step(unit: &mut Unit, cost: u8, diagonal: bool, rules: &MovementRules) -> bool {
    let Some(points) = charge(unit, cost, diagonal, rules) else {
        return false;
    };
    let per_turn = unit.values.speed;
    if per_turn == 0 {
        return true;
    }
    unit.travel = unit.travel.saturating_add(points);
    while unit.travel >= per_turn {
        unit.travel -= per_turn;
        unit.travel_turns = unit.travel_turns.saturating_add(1);
        if rules.real_time_movement {
            unit.shots = unit.values.rounds;
        }
    }
    true
}

fn charge(unit: &mut Unit, cost: u8, diagonal: bool, rules: &MovementRules) -> Option<u16> {
    let quarters = effective_cost(unit, cost, diagonal, rules);
    let rest = quarters.saturating_sub(u32::from(unit.move_fraction));
    let whole = rest.div_ceil(QUARTERS_PER_POINT);
    let available = unit.available_speed();

    if whole > u32::from(available) {
        let carried = u32::from(unit.move_fraction) + QUARTERS_PER_POINT * u32::from(available);
        unit.move_fraction = u8::try_from(carried.min(u32::from(MAX_FRACTION))).unwrap_or(MAX_FRACTION);
        unit.speed = 0;
        trace!("unit {:?} cannot afford {quarters} quarters", unit.id);
        return None;
    }

    let points = u16::try_from(whole).unwrap_or(u16::MAX);
    let debit = if rules.real_time_movement { 0 } else { points };
    unit.speed = unit.speed.saturating_sub(debit);
    if let Some(group) = unit.group_speed.as_mut() {
        *group = group.saturating_sub(debit);
    }
    if !unit.values.move_and_fire && unit.values.speed > 0 {
        let allowed = (u32::from(unit.values.rounds) * u32::from(unit.speed))
            .div_ceil(u32::from(unit.values.speed));
        unit.shots = unit.shots.min(u16::try_from(allowed).unwrap_or(u16::MAX));
    }
    let carried = whole * QUARTERS_PER_POINT - rest;
    unit.move_fraction = u8::try_from(carried).unwrap_or(MAX_FRACTION);
    Some(points)
}

/// Reports whether another unit holds `cell` against `mover`, which is
/// approaching along `angle`.
///
/// Only units sharing the mover's layer count, and ground cover never blocks.
/// A stealthy occupant the mover's team cannot see first tries to step aside;
/// if it succeeds the tile is free. Confirmed blockers become spotted by the
/// mover's team.
pub fn is_occupied(
    mover: &Unit,
    cell: GridPoint,
    angle: Octant,
    units: &mut UnitsView<'_>,
    ctx: &mut MovementContext<'_>,
) -> bool {
    let occupants: Vec<UnitId> = ctx.hash.bucket(cell).to_vec();
    for id in occupants {
        let Some(occupant) = units.get(id) else {
            continue;
        };
        if occupant.layer() != mover.layer() || occupant.flags.contains(UnitFlags::GROUND_COVER) {
            continue;
        }
        let hidden =
            occupant.flags.contains(UnitFlags::STEALTHY) && !occupant.is_visible_to(mover.team);
        if hidden && side_step(id, mover, angle, units, ctx) {
            continue;
        }
        if let Some(occupant) = units.get_mut(id) {
            if occupant.spotted_by.insert(mover.team) {
                ctx.events.push(Event::UnitSpotted {
                    unit: id,
                    team: mover.team,
                });
            }
        }
        return true;
    }
    false
}

fn side_step(
    id: UnitId,
    mover: &Unit,
    angle: Octant,
    units: &mut UnitsView<'_>,
    ctx: &mut MovementContext<'_>,
) -> bool {
    let view: &UnitsView<'_> = units;
    let shelter: &MovementContext<'_> = ctx;
    let Some(occupant) = view.get(id) else {
        return false;
    };
    let origin = occupant.grid;
    let candidates = [2, -2, 1, -1, 0].map(|turn| {
        let (dx, dy) = angle.rotated(turn).offset();
        origin.offset(PathStep::new(dx, dy))
    });
    let Some(refuge) = candidates
        .into_iter()
        .find(|cell| can_shelter(occupant, *cell, mover, view, shelter))
    else {
        debug!("hidden unit {id:?} has nowhere to step aside");
        return false;
    };
    let Some(occupant) = units.get_mut(id) else {
        return false;
    };
    relocate(occupant, refuge.center(), ctx);
    if let Some(UnitPath::Ground(path)) = occupant.path.as_mut() {
        path.stop_at(refuge);
    }
    ctx.events.push(Event::UnitSideStepped {
        unit: id,
        from: origin,
        to: refuge,
    });
    true
}

fn can_shelter(
    occupant: &Unit,
    cell: GridPoint,
    mover: &Unit,
    units: &UnitsView<'_>,
    ctx: &MovementContext<'_>,
) -> bool {
    if cell == mover.grid || ctx.access.cost(occupant, cell) == 0 {
        return false;
    }
    if ctx.reservations.is_reserved(cell) {
        return false;
    }
    !ctx.hash.bucket(cell).iter().any(|other| {
        units.get(*other).is_some_and(|unit| {
            unit.layer() == occupant.layer() && !unit.flags.contains(UnitFlags::GROUND_COVER)
        })
    })
}

/// Moves `unit` to `pixel`, keeping the spatial hash and the map status in
/// step: the unit leaves its old bucket before it moves and joins the new
/// one afterwards.
pub(crate) fn relocate(unit: &mut Unit, pixel: PixelPoint, ctx: &mut MovementContext<'_>) {
    let layer = unit.layer();
    ctx.hash.remove(unit);
    ctx.status.vacate(unit.grid, layer);
    unit.pixel = pixel;
    unit.grid = pixel.cell();
    ctx.hash.add(unit);
    ctx.status.occupy(unit.grid, layer);
}

/// Claims `site` for an unload.
pub fn reserve_site(reservations: &mut SiteReservations, site: GridPoint) {
    reservations.reserve(site);
}

/// Releases the unload claim on `site`.
pub fn remove_site_reservation(reservations: &mut SiteReservations, site: GridPoint) {
    reservations.release(site);
}

/// Reports whether `site` is claimed for an unload.
#[must_use]
pub fn is_site_reserved(reservations: &SiteReservations, site: GridPoint) -> bool {
    reservations.is_reserved(site)
}

/// Reports whether `unit` may pay for a step onto `cell` at all.
pub(crate) fn is_enterable(access: &dyn Accessibility, unit: &Unit, cell: GridPoint) -> bool {
    access.contains(cell) && access.cost(unit, cell) > 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use unit_paths_core::{TeamId, UnitBlueprint, UnitValues};

    fn unit(speed: u16) -> Unit {
        Unit::from_blueprint(
            UnitId::new(1),
            UnitBlueprint {
                team: TeamId::new(0),
                flags: UnitFlags::LAND,
                values: UnitValues {
                    speed,
                    rounds: 4,
                    ..UnitValues::default()
                },
                cell: GridPoint::new(0, 0),
                angle: Octant::NORTH,
            },
        )
    }

    #[test]
    fn every_sign_pattern_maps_back_to_itself() {
        for dx in -1..=1 {
            for dy in -1..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let (ox, oy) = get_angle(dx, dy).offset();
                assert_eq!((i32::from(ox), i32::from(oy)), (dx, dy));
            }
        }
    }

    #[test]
    fn dominant_axis_wins_when_quantising() {
        assert_eq!(angle_toward(10, 3), Some(Octant::EAST));
        assert_eq!(angle_toward(-2, 9), Some(Octant::SOUTH));
        assert_eq!(angle_toward(5, -4), Some(Octant::NORTH_EAST));
        assert_eq!(angle_toward(0, 0), None);
    }

    #[test]
    fn turning_takes_the_short_way_round() {
        let mut events = Vec::new();
        let mut mover = unit(1);
        mover.angle = Octant::NORTH;
        assert!(update_angle(&mut mover, Octant::WEST, &mut events));
        assert_eq!(mover.angle, Octant::NORTH_WEST);

        mover.angle = Octant::NORTH;
        assert!(update_angle(&mut mover, Octant::SOUTH, &mut events));
        assert_eq!(mover.angle, Octant::NORTH_EAST);

        assert!(!update_angle(&mut mover, Octant::NORTH_EAST, &mut events));
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn turning_latency_is_the_octant_distance() {
        for start in 0..Octant::COUNT {
            for target in 0..Octant::COUNT {
                let mut mover = unit(1);
                mover.angle = Octant::new(start);
                let goal = Octant::new(target);
                let mut events = Vec::new();
                let mut calls = 0;
                while update_angle(&mut mover, goal, &mut events) {
                    calls += 1;
                    assert!(calls <= 4);
                }
                assert_eq!(calls, Octant::new(start).turns_to(goal));
            }
        }
    }

    #[test]
    fn exact_budget_pays_two_orthogonal_steps() {
        let rules = MovementRules::default();
        let mut mover = unit(2);
        assert!(take_step(&mut mover, ORTHOGONAL_COST, false, &rules));
        assert!(take_step(&mut mover, ORTHOGONAL_COST, false, &rules));
        assert_eq!(mover.speed, 0);
        assert_eq!(mover.travel_turns, 1);
        assert!(!take_step(&mut mover, ORTHOGONAL_COST, false, &rules));
        assert_eq!(mover.move_fraction, 0);
    }

    #[test]
    fn diagonal_steps_carry_the_unused_quarter() {
        let rules = MovementRules::default();
        let mut mover = unit(5);
        assert!(calculate_step(&mut mover, ORTHOGONAL_COST, true, &rules));
        assert_eq!(mover.speed, 3);
        assert_eq!(mover.move_fraction, 2);
        assert!(calculate_step(&mut mover, ORTHOGONAL_COST, false, &rules));
        assert_eq!(mover.speed, 2);
        assert_eq!(mover.move_fraction, 2);
    }

    #[test]
    fn failed_charge_drains_budget_into_fraction() {
        let rules = MovementRules::default();
        let mut mover = unit(2);
        assert!(calculate_step(&mut mover, ORTHOGONAL_COST, false, &rules));
        assert!(!calculate_step(&mut mover, 8, false, &rules));
        assert_eq!(mover.speed, 0);
        assert_eq!(mover.move_fraction, 3);
    }

    #[test]
    fn real_time_mode_never_debits() {
        let rules = MovementRules {
            real_time_movement: true,
            ..MovementRules::default()
        };
        let mut mover = unit(1);
        mover.shots = 0;
        assert!(take_step(&mut mover, ORTHOGONAL_COST, false, &rules));
        assert_eq!(mover.speed, 1);
        assert_eq!(mover.travel_turns, 1);
        assert_eq!(mover.shots, 4);
    }

    #[test]
    fn moving_spends_shots_without_move_and_fire() {
        let rules = MovementRules::default();
        let mut mover = unit(4);
        assert!(calculate_step(&mut mover, ORTHOGONAL_COST, false, &rules));
        assert_eq!(mover.shots, 3);
        mover.values.move_and_fire = true;
        assert!(calculate_step(&mut mover, ORTHOGONAL_COST, false, &rules));
        assert_eq!(mover.shots, 3);
    }

    #[test]
    fn cost_is_capped_by_fast_velocity() {
        let fast = MovementRules {
            fast_movement: true,
            ..MovementRules::default()
        };
        let mut mover = unit(1);
        assert_eq!(velocity_cap(&mover, &fast), 8);
        assert_eq!(effective_cost(&mover, 40, false, &fast), 8);
        mover.flags |= UnitFlags::INFANTRY;
        assert_eq!(velocity_cap(&mover, &fast), 4);
        assert_eq!(effective_cost(&mover, 40, true, &MovementRules::default()), 4);
    }

    #[test]
    fn group_budget_is_debited_alongside_speed() {
        let rules = MovementRules::default();
        let mut mover = unit(5);
        mover.group_speed = Some(1);
        assert!(calculate_step(&mut mover, ORTHOGONAL_COST, false, &rules));
        assert_eq!(mover.group_speed, Some(0));
        assert_eq!(mover.speed, 4);
        assert!(!calculate_step(&mut mover, ORTHOGONAL_COST, false, &rules));
    }

    #[test]
    fn reservation_helpers_wrap_the_table() {
        let mut table = SiteReservations::new();
        let site = GridPoint::new(5, 5);
        reserve_site(&mut table, site);
        assert!(is_site_reserved(&table, site));
        remove_site_reservation(&mut table, site);
        assert!(!is_site_reserved(&table, site));
    }
}
