//! Tile-indexed buckets of the units standing on each tile.

use unit_paths_core::{GridPoint, UnitId};

use crate::Unit;

/// Maps every tile to the units occupying it.
///
/// Callers must remove a unit before changing its tile and add it back
/// afterwards so mid-tick queries always see the unit where it stands.
#[derive(Clone, Debug, Default)]
pub struct SpatialHash {
    columns: u16,
    rows: u16,
    buckets: Vec<Vec<UnitId>>,
}

impl SpatialHash {
    /// Creates empty buckets for a `columns` by `rows` map.
    #[must_use]
    pub fn new(columns: u16, rows: u16) -> Self {
        let count = usize::from(columns) * usize::from(rows);
        Self {
            columns,
            rows,
            buckets: vec![Vec::new(); count],
        }
    }

    /// Files `unit` under its current tile.
    pub fn add(&mut self, unit: &Unit) {
        if let Some(bucket) = self.bucket_mut(unit.grid) {
            if !bucket.contains(&unit.id) {
                bucket.push(unit.id);
            }
        }
    }

    /// Removes `unit` from the bucket of its current tile.
    pub fn remove(&mut self, unit: &Unit) {
        if let Some(bucket) = self.bucket_mut(unit.grid) {
            bucket.retain(|id| *id != unit.id);
        }
    }

    /// Units standing on `cell`, in insertion order.
    #[must_use]
    pub fn bucket(&self, cell: GridPoint) -> &[UnitId] {
        self.index(cell)
            .and_then(|index| self.buckets.get(index))
            .map_or(&[], Vec::as_slice)
    }

    fn bucket_mut(&mut self, cell: GridPoint) -> Option<&mut Vec<UnitId>> {
        let index = self.index(cell)?;
        self.buckets.get_mut(index)
    }

    fn index(&self, cell: GridPoint) -> Option<usize> {
        let column = usize::try_from(cell.x()).ok()?;
        let row = usize::try_from(cell.y()).ok()?;
        if column < usize::from(self.columns) && row < usize::from(self.rows) {
            Some(row * usize::from(self.columns) + column)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unit_paths_core::{Octant, TeamId, UnitBlueprint, UnitFlags, UnitValues};

    fn unit_at(id: u32, cell: GridPoint) -> Unit {
        Unit::from_blueprint(
            UnitId::new(id),
            UnitBlueprint {
                team: TeamId::new(0),
                flags: UnitFlags::LAND,
                values: UnitValues::default(),
                cell,
                angle: Octant::NORTH,
            },
        )
    }

    #[test]
    fn remove_move_add_relocates_unit() {
        let mut hash = SpatialHash::new(4, 4);
        let mut unit = unit_at(1, GridPoint::new(1, 1));
        hash.add(&unit);
        hash.add(&unit);
        assert_eq!(hash.bucket(GridPoint::new(1, 1)), &[UnitId::new(1)]);

        hash.remove(&unit);
        unit.grid = GridPoint::new(2, 1);
        hash.add(&unit);

        assert!(hash.bucket(GridPoint::new(1, 1)).is_empty());
        assert_eq!(hash.bucket(GridPoint::new(2, 1)), &[UnitId::new(1)]);
    }

    #[test]
    fn out_of_bounds_tiles_have_empty_buckets() {
        let mut hash = SpatialHash::new(2, 2);
        let unit = unit_at(1, GridPoint::new(-1, 0));
        hash.add(&unit);
        assert!(hash.bucket(GridPoint::new(-1, 0)).is_empty());
        assert!(hash.bucket(GridPoint::new(5, 5)).is_empty());
    }
}
