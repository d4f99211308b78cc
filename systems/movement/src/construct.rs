//! Builders for paths the movement engine creates itself.

use unit_paths_core::{euclidean, AirPath, AirPathParams, BuilderPath, GridPoint, TILE_SIZE};
use unit_paths_world::Unit;

use crate::paths;

/// Direct flight from the unit's pixel position to the centre of `target`.
///
/// The flight takes `max_velocity` sub-steps per tile of euclidean distance,
/// rounded up. Returns `None` when the unit already sits on the target
/// centre or the distance does not fit the path's fields.
#[must_use]
pub fn create_air_path(unit: &Unit, target: GridPoint) -> Option<AirPath> {
    let goal = target.center();
    let distance_x = i16::try_from(goal.x() - unit.pixel.x()).ok()?;
    let distance_y = i16::try_from(goal.y() - unit.pixel.y()).ok()?;
    let euclidean_distance = euclidean(distance_x, distance_y);
    if euclidean_distance <= 0 {
        return None;
    }
    let sub_steps = i32::from(unit.values.max_velocity.max(1));
    let length = (i32::from(euclidean_distance) * sub_steps + TILE_SIZE - 1) / TILE_SIZE;
    let angle = paths::angle_toward(i32::from(distance_x), i32::from(distance_y))?;
    AirPath::new(AirPathParams {
        start: unit.pixel,
        end: target,
        distance_x,
        distance_y,
        euclidean_distance,
        length: i16::try_from(length).ok()?,
        angle,
    })
}

/// Facing path that keeps a constructor pointed at `toward`.
#[must_use]
pub fn create_builder_path(unit: &Unit, toward: GridPoint) -> BuilderPath {
    BuilderPath::new(
        toward.x().wrapping_sub(unit.grid.x()),
        toward.y().wrapping_sub(unit.grid.y()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use unit_paths_core::{Octant, TeamId, UnitBlueprint, UnitFlags, UnitId, UnitValues};

    fn plane() -> Unit {
        Unit::from_blueprint(
            UnitId::new(1),
            UnitBlueprint {
                team: TeamId::new(0),
                flags: UnitFlags::AIR,
                values: UnitValues {
                    max_velocity: 4,
                    ..UnitValues::default()
                },
                cell: GridPoint::new(1, 1),
                angle: Octant::NORTH,
            },
        )
    }

    #[test]
    fn flight_length_scales_with_velocity() {
        let path = create_air_path(&plane(), GridPoint::new(3, 1)).expect("flight");
        assert_eq!(path.length(), 8);
        assert_eq!(path.angle(), Octant::EAST);
        assert_eq!(path.distance(), (128, 0));
        assert_eq!(path.euclidean_distance(), 128);
    }

    #[test]
    fn diagonal_flight_rounds_length_up() {
        let path = create_air_path(&plane(), GridPoint::new(2, 2)).expect("flight");
        assert_eq!(path.euclidean_distance(), 90);
        assert_eq!(path.length(), 6);
        assert_eq!(path.angle(), Octant::SOUTH_EAST);
    }

    #[test]
    fn zero_distance_yields_no_flight() {
        assert!(create_air_path(&plane(), GridPoint::new(1, 1)).is_none());
    }

    #[test]
    fn builder_path_points_at_the_offset() {
        let path = create_builder_path(&plane(), GridPoint::new(0, 3));
        assert_eq!(path.direction(), (-1, 2));
    }
}
