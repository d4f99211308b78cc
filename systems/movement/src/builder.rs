//! Facing-only paths for stationary constructors.

use unit_paths_core::{BuilderPath, MovementRules};
use unit_paths_world::{Accessibility, Unit, UnitsView};

use crate::{paths, MovementContext, PathBehavior};

impl PathBehavior for BuilderPath {
    fn movement_cost(&self, _unit: &Unit, _access: &dyn Accessibility, _rules: &MovementRules) -> u32 {
        0
    }

    /// Turns one octant toward the build offset. Never reports motion, even
    /// while the turn is still in progress.
    fn execute(
        &mut self,
        unit: &mut Unit,
        _units: &mut UnitsView<'_>,
        ctx: &mut MovementContext<'_>,
    ) -> bool {
        let (dx, dy) = self.direction();
        if let Some(target) = paths::angle_toward(i32::from(dx), i32::from(dy)) {
            let _ = paths::update_angle(unit, target, ctx.events);
        }
        false
    }
}
