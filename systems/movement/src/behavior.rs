//! The contract every path type fulfils, and dispatch over [`UnitPath`].

use unit_paths_core::{Event, GridPoint, MovementRules, PathMarker, PixelPoint, UnitPath};
use unit_paths_world::{Accessibility, Unit, UnitsView};

use crate::MovementContext;

/// Per-tick behaviour of a path owned by a unit.
///
/// The executing unit is passed separately from the rest of the world; the
/// path has been taken out of `unit.path` for the duration of each call.
pub trait PathBehavior {
    /// Visual position of the unit along the path.
    fn position(&self, unit: &Unit) -> PixelPoint {
        unit.grid.center()
    }

    /// Reports whether `cell` lies on the remaining route.
    fn is_in_path(&self, _cell: GridPoint) -> bool {
        false
    }

    /// Brings the unit to the nearest sensible stop. The next
    /// [`execute`](Self::execute) either finishes a short recovery move or
    /// reports completion.
    fn cancel_movement(&mut self, _unit: &mut Unit, _ctx: &mut MovementContext<'_>) {}

    /// Whole movement points needed to finish the path.
    fn movement_cost(&self, unit: &Unit, access: &dyn Accessibility, rules: &MovementRules)
        -> u32;

    /// Performs one tick of motion. Returns `true` while the unit is between
    /// tiles and `false` once the tick's motion finished, failed or ended the
    /// path.
    fn execute(
        &mut self,
        unit: &mut Unit,
        units: &mut UnitsView<'_>,
        ctx: &mut MovementContext<'_>,
    ) -> bool;

    /// Starts turning toward the next step before it is taken.
    fn update_unit_angle(&self, _unit: &mut Unit, _events: &mut Vec<Event>) {}

    /// Markers along the remaining route.
    fn draw(
        &self,
        _unit: &Unit,
        _access: &dyn Accessibility,
        _rules: &MovementRules,
    ) -> Vec<PathMarker> {
        Vec::new()
    }

    /// Reports whether the next step is the last one.
    fn is_end_step(&self) -> bool {
        false
    }
}

impl PathBehavior for UnitPath {
    fn position(&self, unit: &Unit) -> PixelPoint {
        match self {
            Self::Ground(path) => PathBehavior::position(path, unit),
            Self::Air(path) => PathBehavior::position(path, unit),
            Self::Builder(path) => PathBehavior::position(path, unit),
        }
    }

    fn is_in_path(&self, cell: GridPoint) -> bool {
        match self {
            Self::Ground(path) => PathBehavior::is_in_path(path, cell),
            Self::Air(path) => PathBehavior::is_in_path(path, cell),
            Self::Builder(path) => PathBehavior::is_in_path(path, cell),
        }
    }

    fn cancel_movement(&mut self, unit: &mut Unit, ctx: &mut MovementContext<'_>) {
        match self {
            Self::Ground(path) => path.cancel_movement(unit, ctx),
            Self::Air(path) => path.cancel_movement(unit, ctx),
            Self::Builder(path) => path.cancel_movement(unit, ctx),
        }
    }

    fn movement_cost(&self, unit: &Unit, access: &dyn Accessibility, rules: &MovementRules) -> u32 {
        match self {
            Self::Ground(path) => path.movement_cost(unit, access, rules),
            Self::Air(path) => path.movement_cost(unit, access, rules),
            Self::Builder(path) => path.movement_cost(unit, access, rules),
        }
    }

    fn execute(
        &mut self,
        unit: &mut Unit,
        units: &mut UnitsView<'_>,
        ctx: &mut MovementContext<'_>,
    ) -> bool {
        match self {
            Self::Ground(path) => path.execute(unit, units, ctx),
            Self::Air(path) => path.execute(unit, units, ctx),
            Self::Builder(path) => path.execute(unit, units, ctx),
        }
    }

    fn update_unit_angle(&self, unit: &mut Unit, events: &mut Vec<Event>) {
        match self {
            Self::Ground(path) => path.update_unit_angle(unit, events),
            Self::Air(path) => path.update_unit_angle(unit, events),
            Self::Builder(path) => path.update_unit_angle(unit, events),
        }
    }

    fn draw(&self, unit: &Unit, access: &dyn Accessibility, rules: &MovementRules) -> Vec<PathMarker> {
        match self {
            Self::Ground(path) => path.draw(unit, access, rules),
            Self::Air(path) => path.draw(unit, access, rules),
            Self::Builder(path) => path.draw(unit, access, rules),
        }
    }

    fn is_end_step(&self) -> bool {
        match self {
            Self::Ground(path) => PathBehavior::is_end_step(path),
            Self::Air(path) => PathBehavior::is_end_step(path),
            Self::Builder(path) => PathBehavior::is_end_step(path),
        }
    }
}
