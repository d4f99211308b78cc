//! Outstanding route requests raised by blocked units.

use log::debug;
use unit_paths_core::{GridPoint, UnitId};

use crate::Unit;

/// Sink for replacement route requests.
pub trait PathRequests {
    /// Asks for a fresh route for `unit`; returns `true` when accepted.
    fn request_path(&mut self, unit: &Unit) -> bool;

    /// Withdraws any pending request for `unit`.
    fn remove_request(&mut self, unit: UnitId);
}

/// A pending route request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PathRequest {
    /// Unit that needs a route.
    pub unit: UnitId,
    /// Tile the unit stood on when it asked.
    pub from: GridPoint,
    /// Destination it was heading for.
    pub to: GridPoint,
}

/// First-in first-out request queue; one entry per unit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestQueue {
    pending: Vec<PathRequest>,
    capacity: Option<usize>,
}

impl RequestQueue {
    /// Creates an unbounded queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a queue that refuses requests beyond `capacity`.
    #[must_use]
    pub fn bounded(capacity: usize) -> Self {
        Self {
            pending: Vec::new(),
            capacity: Some(capacity),
        }
    }

    /// Requests in arrival order.
    #[must_use]
    pub fn pending(&self) -> &[PathRequest] {
        &self.pending
    }

    /// Reports whether `unit` is waiting for a route.
    #[must_use]
    pub fn contains(&self, unit: UnitId) -> bool {
        self.pending.iter().any(|request| request.unit == unit)
    }

    /// Removes and returns every pending request.
    pub fn drain(&mut self) -> Vec<PathRequest> {
        std::mem::take(&mut self.pending)
    }
}

impl PathRequests for RequestQueue {
    fn request_path(&mut self, unit: &Unit) -> bool {
        if self.contains(unit.id) {
            return true;
        }
        if self
            .capacity
            .is_some_and(|capacity| self.pending.len() >= capacity)
        {
            debug!("route queue full, refusing request for {:?}", unit.id);
            return false;
        }
        self.pending.push(PathRequest {
            unit: unit.id,
            from: unit.grid,
            to: unit.move_to,
        });
        true
    }

    fn remove_request(&mut self, unit: UnitId) {
        self.pending.retain(|request| request.unit != unit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unit_paths_core::{Octant, TeamId, UnitBlueprint, UnitFlags, UnitValues};

    fn unit(id: u32) -> Unit {
        Unit::from_blueprint(
            UnitId::new(id),
            UnitBlueprint {
                team: TeamId::new(0),
                flags: UnitFlags::LAND,
                values: UnitValues::default(),
                cell: GridPoint::new(1, 2),
                angle: Octant::NORTH,
            },
        )
    }

    #[test]
    fn requests_are_unique_per_unit() {
        let mut queue = RequestQueue::new();
        assert!(queue.request_path(&unit(1)));
        assert!(queue.request_path(&unit(1)));
        assert!(queue.request_path(&unit(2)));
        assert_eq!(queue.pending().len(), 2);
        queue.remove_request(UnitId::new(1));
        assert!(!queue.contains(UnitId::new(1)));
        assert_eq!(queue.drain().len(), 1);
    }

    #[test]
    fn bounded_queue_refuses_overflow() {
        let mut queue = RequestQueue::bounded(1);
        assert!(queue.request_path(&unit(1)));
        assert!(!queue.request_path(&unit(2)));
    }
}
