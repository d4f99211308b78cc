//! Terrain layout, per-unit entry costs and the map status overlay.

use unit_paths_core::{GridPoint, Terrain, UnitFlags, ORTHOGONAL_COST};

use crate::{Layer, Unit};

/// Entry cost of a tile for a particular unit.
pub trait Accessibility {
    /// Quarter-point cost for `unit` to enter `cell`; zero means the tile
    /// cannot be entered.
    fn cost(&self, unit: &Unit, cell: GridPoint) -> u8;

    /// Reports whether `cell` lies on the map.
    fn contains(&self, cell: GridPoint) -> bool;

    /// Terrain of `cell`, if it lies on the map.
    fn terrain(&self, cell: GridPoint) -> Option<Terrain>;
}

/// Dense row-major terrain grid.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TerrainMap {
    columns: u16,
    rows: u16,
    tiles: Vec<Terrain>,
}

impl TerrainMap {
    /// Creates a map of open land.
    #[must_use]
    pub fn new(columns: u16, rows: u16) -> Self {
        Self {
            columns,
            rows,
            tiles: vec![Terrain::Land; usize::from(columns) * usize::from(rows)],
        }
    }

    /// Number of columns and rows.
    #[must_use]
    pub const fn dimensions(&self) -> (u16, u16) {
        (self.columns, self.rows)
    }

    /// Changes the terrain of `cell`; returns `false` when it is off the map.
    pub fn set(&mut self, cell: GridPoint, terrain: Terrain) -> bool {
        match self.index(cell).and_then(|index| self.tiles.get_mut(index)) {
            Some(tile) => {
                *tile = terrain;
                true
            }
            None => false,
        }
    }

    fn index(&self, cell: GridPoint) -> Option<usize> {
        index_of(self.columns, self.rows, cell)
    }
}

impl Accessibility for TerrainMap {
    fn cost(&self, unit: &Unit, cell: GridPoint) -> u8 {
        let Some(terrain) = self.terrain(cell) else {
            return 0;
        };
        if unit.flags.contains(UnitFlags::AIR) {
            return ORTHOGONAL_COST;
        }
        let walks = unit.flags.intersects(UnitFlags::LAND | UnitFlags::AMPHIBIOUS);
        let swims = unit.flags.intersects(UnitFlags::SEA | UnitFlags::AMPHIBIOUS);
        match terrain {
            Terrain::Land if walks => ORTHOGONAL_COST,
            Terrain::Rough if walks => ORTHOGONAL_COST * 2,
            Terrain::Water if swims => ORTHOGONAL_COST,
            Terrain::Coast if walks || swims => ORTHOGONAL_COST,
            _ => 0,
        }
    }

    fn contains(&self, cell: GridPoint) -> bool {
        self.index(cell).is_some()
    }

    fn terrain(&self, cell: GridPoint) -> Option<Terrain> {
        self.index(cell)
            .and_then(|index| self.tiles.get(index))
            .copied()
    }
}

/// Per-tile presence counters for each layer, plus tiles awaiting a refresh.
///
/// Renderers and fog-of-war consumers read the counters; `dirty` collects the
/// tiles air units vacated so they are refreshed once at the end of a tick.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MapStatus {
    columns: u16,
    rows: u16,
    surface: Vec<u8>,
    air: Vec<u8>,
    dirty: Vec<GridPoint>,
}

impl MapStatus {
    /// Creates an empty overlay.
    #[must_use]
    pub fn new(columns: u16, rows: u16) -> Self {
        let count = usize::from(columns) * usize::from(rows);
        Self {
            columns,
            rows,
            surface: vec![0; count],
            air: vec![0; count],
            dirty: Vec::new(),
        }
    }

    /// Records `layer` presence on `cell`.
    pub fn occupy(&mut self, cell: GridPoint, layer: Layer) {
        if let Some(counter) = self.counter_mut(cell, layer) {
            *counter = counter.saturating_add(1);
        }
    }

    /// Clears one `layer` presence from `cell`.
    pub fn vacate(&mut self, cell: GridPoint, layer: Layer) {
        if let Some(counter) = self.counter_mut(cell, layer) {
            *counter = counter.saturating_sub(1);
        }
    }

    /// Number of `layer` units recorded on `cell`.
    #[must_use]
    pub fn presence(&self, cell: GridPoint, layer: Layer) -> u8 {
        let Some(index) = index_of(self.columns, self.rows, cell) else {
            return 0;
        };
        let counters = match layer {
            Layer::Surface => &self.surface,
            Layer::Air => &self.air,
        };
        counters.get(index).copied().unwrap_or(0)
    }

    /// Queues `cell` for the end-of-tick refresh.
    pub fn mark_dirty(&mut self, cell: GridPoint) {
        if !self.dirty.contains(&cell) {
            self.dirty.push(cell);
        }
    }

    /// Tiles queued for refresh.
    #[must_use]
    pub fn dirty(&self) -> &[GridPoint] {
        &self.dirty
    }

    /// Drains the refresh queue.
    pub fn take_dirty(&mut self) -> Vec<GridPoint> {
        std::mem::take(&mut self.dirty)
    }

    /// Overwrites both counters of `cell` with recounted values.
    pub fn refresh(&mut self, cell: GridPoint, surface: u8, air: u8) {
        if let Some(counter) = self.counter_mut(cell, Layer::Surface) {
            *counter = surface;
        }
        if let Some(counter) = self.counter_mut(cell, Layer::Air) {
            *counter = air;
        }
    }

    fn counter_mut(&mut self, cell: GridPoint, layer: Layer) -> Option<&mut u8> {
        let index = index_of(self.columns, self.rows, cell)?;
        match layer {
            Layer::Surface => self.surface.get_mut(index),
            Layer::Air => self.air.get_mut(index),
        }
    }
}

fn index_of(columns: u16, rows: u16, cell: GridPoint) -> Option<usize> {
    let column = u16::try_from(cell.x()).ok()?;
    let row = u16::try_from(cell.y()).ok()?;
    if column < columns && row < rows {
        Some(usize::from(row) * usize::from(columns) + usize::from(column))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unit_paths_core::{Octant, TeamId, UnitBlueprint, UnitId, UnitValues};

    fn unit(flags: UnitFlags) -> Unit {
        Unit::from_blueprint(
            UnitId::new(0),
            UnitBlueprint {
                team: TeamId::new(0),
                flags,
                values: UnitValues::default(),
                cell: GridPoint::new(0, 0),
                angle: Octant::NORTH,
            },
        )
    }

    #[test]
    fn costs_follow_unit_domain() {
        let mut map = TerrainMap::new(4, 1);
        assert!(map.set(GridPoint::new(1, 0), Terrain::Rough));
        assert!(map.set(GridPoint::new(2, 0), Terrain::Water));
        assert!(map.set(GridPoint::new(3, 0), Terrain::Blocked));

        let tank = unit(UnitFlags::LAND);
        let boat = unit(UnitFlags::SEA);
        let jeep = unit(UnitFlags::AMPHIBIOUS);
        let plane = unit(UnitFlags::AIR);

        let row = |who: &Unit| -> Vec<u8> {
            (0..4).map(|x| map.cost(who, GridPoint::new(x, 0))).collect()
        };
        assert_eq!(row(&tank), vec![4, 8, 0, 0]);
        assert_eq!(row(&boat), vec![0, 0, 4, 0]);
        assert_eq!(row(&jeep), vec![4, 8, 4, 0]);
        assert_eq!(row(&plane), vec![4, 4, 4, 4]);
    }

    #[test]
    fn off_map_tiles_cost_nothing() {
        let map = TerrainMap::new(2, 2);
        let plane = unit(UnitFlags::AIR);
        assert_eq!(map.cost(&plane, GridPoint::new(2, 0)), 0);
        assert_eq!(map.cost(&plane, GridPoint::new(0, -1)), 0);
        assert!(!map.contains(GridPoint::new(-1, 0)));
        assert!(!map.clone().set(GridPoint::new(5, 5), Terrain::Water));
    }

    #[test]
    fn status_counts_presence_per_layer() {
        let mut status = MapStatus::new(3, 3);
        let cell = GridPoint::new(1, 1);
        status.occupy(cell, Layer::Air);
        status.occupy(cell, Layer::Air);
        status.occupy(cell, Layer::Surface);
        status.vacate(cell, Layer::Air);
        assert_eq!(status.presence(cell, Layer::Air), 1);
        assert_eq!(status.presence(cell, Layer::Surface), 1);

        status.mark_dirty(cell);
        status.mark_dirty(cell);
        assert_eq!(status.take_dirty(), vec![cell]);
        assert!(status.dirty().is_empty());
    }

    #[test]
    fn refresh_overwrites_both_layers() {
        let mut status = MapStatus::new(2, 2);
        let cell = GridPoint::new(0, 1);
        status.occupy(cell, Layer::Air);
        status.refresh(cell, 2, 0);
        assert_eq!(status.presence(cell, Layer::Surface), 2);
        assert_eq!(status.presence(cell, Layer::Air), 0);
        status.refresh(GridPoint::new(4, 4), 1, 1);
    }
}
