//! Single-tile displacements and the eight discrete facings derived from them.

use serde::{Deserialize, Serialize};

/// Single-tile displacement consumed by ground paths.
///
/// Both components lie in `-1..=1`. The all-zero step is a placeholder that
/// consumers skip without moving the unit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathStep {
    dx: i8,
    dy: i8,
}

impl PathStep {
    /// Placeholder step that carries no displacement.
    pub const NOOP: Self = Self { dx: 0, dy: 0 };

    /// Creates a step from its column and row displacement.
    #[must_use]
    pub fn new(dx: i8, dy: i8) -> Self {
        debug_assert!(
            Self::is_valid(dx, dy),
            "path step ({dx}, {dy}) leaves the unit neighbourhood"
        );
        Self { dx, dy }
    }

    /// Reports whether both components lie in `-1..=1`.
    #[must_use]
    pub const fn is_valid(dx: i8, dy: i8) -> bool {
        dx >= -1 && dx <= 1 && dy >= -1 && dy <= 1
    }

    /// Column displacement.
    #[must_use]
    pub const fn dx(&self) -> i8 {
        self.dx
    }

    /// Row displacement.
    #[must_use]
    pub const fn dy(&self) -> i8 {
        self.dy
    }

    /// Reports whether the step is the zero placeholder.
    #[must_use]
    pub const fn is_noop(&self) -> bool {
        self.dx == 0 && self.dy == 0
    }

    /// Reports whether the step changes both grid axes.
    #[must_use]
    pub const fn is_diagonal(&self) -> bool {
        self.dx != 0 && self.dy != 0
    }
}

/// One of the eight discrete facings a unit can hold.
///
/// Octants count clockwise from north with rows growing downward, so
/// `Octant::EAST` faces `(1, 0)` and `Octant::SOUTH` faces `(0, 1)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Octant(u8);

impl Octant {
    /// Number of distinct facings.
    pub const COUNT: u8 = 8;
    /// Facing `(0, -1)`.
    pub const NORTH: Self = Self(0);
    /// Facing `(1, -1)`.
    pub const NORTH_EAST: Self = Self(1);
    /// Facing `(1, 0)`.
    pub const EAST: Self = Self(2);
    /// Facing `(1, 1)`.
    pub const SOUTH_EAST: Self = Self(3);
    /// Facing `(0, 1)`.
    pub const SOUTH: Self = Self(4);
    /// Facing `(-1, 1)`.
    pub const SOUTH_WEST: Self = Self(5);
    /// Facing `(-1, 0)`.
    pub const WEST: Self = Self(6);
    /// Facing `(-1, -1)`.
    pub const NORTH_WEST: Self = Self(7);

    const OFFSETS: [(i8, i8); 8] = [
        (0, -1),
        (1, -1),
        (1, 0),
        (1, 1),
        (0, 1),
        (-1, 1),
        (-1, 0),
        (-1, -1),
    ];

    /// Creates an octant from a raw value, wrapping into `0..8`.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        Self(value % Self::COUNT)
    }

    /// Creates an octant when the value is already within `0..8`.
    #[must_use]
    pub const fn try_new(value: u8) -> Option<Self> {
        if value < Self::COUNT {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Raw facing index.
    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }

    /// Unit displacement pointing along the facing.
    #[must_use]
    pub const fn offset(&self) -> (i8, i8) {
        Self::OFFSETS[self.0 as usize]
    }

    /// Facing rotated by `amount` octants; positive values turn clockwise.
    #[must_use]
    pub const fn rotated(&self, amount: i8) -> Self {
        let turned = (self.0 as i8 + amount).rem_euclid(Self::COUNT as i8);
        Self(turned as u8)
    }

    /// Number of single-octant turns separating two facings.
    #[must_use]
    pub const fn turns_to(&self, target: Octant) -> u8 {
        let clockwise = (target.0 + Self::COUNT - self.0) % Self::COUNT;
        if clockwise <= Self::COUNT / 2 {
            clockwise
        } else {
            Self::COUNT - clockwise
        }
    }
}
