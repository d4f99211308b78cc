//! Id-ordered unit storage with split borrows for per-unit execution.

use unit_paths_core::{UnitBlueprint, UnitId};

use crate::Unit;

/// Units kept sorted by identifier.
#[derive(Clone, Debug, Default)]
pub struct UnitStore {
    units: Vec<Unit>,
    next_id: u32,
}

impl UnitStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a unit built from `blueprint` and returns its identifier.
    pub fn spawn(&mut self, blueprint: UnitBlueprint) -> UnitId {
        let id = UnitId::new(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.units.push(Unit::from_blueprint(id, blueprint));
        id
    }

    /// Removes a unit, returning it when present.
    pub fn remove(&mut self, id: UnitId) -> Option<Unit> {
        let index = self.index(id)?;
        Some(self.units.remove(index))
    }

    /// Looks up a unit.
    #[must_use]
    pub fn get(&self, id: UnitId) -> Option<&Unit> {
        self.index(id).map(|index| &self.units[index])
    }

    /// Looks up a unit for mutation.
    pub fn get_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        let index = self.index(id)?;
        Some(&mut self.units[index])
    }

    /// Iterates units in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &Unit> {
        self.units.iter()
    }

    /// Iterates units mutably in identifier order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Unit> {
        self.units.iter_mut()
    }

    /// Identifiers of every unit in order.
    #[must_use]
    pub fn ids(&self) -> Vec<UnitId> {
        self.units.iter().map(|unit| unit.id).collect()
    }

    /// Number of stored units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Reports whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Borrows one unit mutably alongside a view of every other unit.
    pub fn split(&mut self, id: UnitId) -> Option<(&mut Unit, UnitsView<'_>)> {
        let index = self.index(id)?;
        let (before, rest) = self.units.split_at_mut(index);
        let (unit, after) = rest.split_first_mut()?;
        Some((unit, UnitsView { before, after }))
    }

    fn index(&self, id: UnitId) -> Option<usize> {
        self.units.binary_search_by_key(&id, |unit| unit.id).ok()
    }
}

/// Mutable view over every unit except the one being executed.
#[derive(Debug)]
pub struct UnitsView<'a> {
    before: &'a mut [Unit],
    after: &'a mut [Unit],
}

impl<'a> UnitsView<'a> {
    /// Looks up another unit.
    #[must_use]
    pub fn get(&self, id: UnitId) -> Option<&Unit> {
        find(&*self.before, id).or_else(|| find(&*self.after, id))
    }

    /// Looks up another unit for mutation.
    pub fn get_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        if let Ok(index) = self.before.binary_search_by_key(&id, |unit| unit.id) {
            return Some(&mut self.before[index]);
        }
        let index = self.after.binary_search_by_key(&id, |unit| unit.id).ok()?;
        Some(&mut self.after[index])
    }

    /// Iterates the other units in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &Unit> {
        self.before.iter().chain(self.after.iter())
    }
}

fn find(units: &[Unit], id: UnitId) -> Option<&Unit> {
    units
        .binary_search_by_key(&id, |unit| unit.id)
        .ok()
        .map(|index| &units[index])
}
