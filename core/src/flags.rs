#![allow(unreachable_pub)]

//! Capability flags describing how a unit moves and what it may carry.

bitflags::bitflags! {
    /// Movement and role classification of a unit.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct UnitFlags: u16 {
        /// Flies over terrain and other units.
        const AIR = 1;
        /// Travels over land tiles.
        const LAND = 1 << 1;
        /// Travels over water tiles.
        const SEA = 1 << 2;
        /// Travels over both land and water, swapping sprites between them.
        const AMPHIBIOUS = 1 << 3;
        /// Unguided munition following a direct flight path.
        const MISSILE = 1 << 4;
        /// Munition travelling underwater; trails bubbles instead of smoke.
        const TORPEDO = 1 << 5;
        /// Hidden from enemy teams until spotted.
        const STEALTHY = 1 << 6;
        /// Foot soldiers; slower in fast movement mode.
        const INFANTRY = 1 << 7;
        /// Bridges, roads and platforms that other units stand on.
        const GROUND_COVER = 1 << 8;
        /// Builds structures while stationary.
        const CONSTRUCTOR = 1 << 9;
        /// Carries other units in its storage.
        const TRANSPORT = 1 << 10;
    }
}

impl UnitFlags {
    /// Resolves a flag from its name, ignoring ASCII case.
    #[must_use]
    pub fn from_name_ignore_case(name: &str) -> Option<Self> {
        Self::all()
            .iter_names()
            .find(|(flag_name, _)| flag_name.eq_ignore_ascii_case(name))
            .map(|(_, flag)| flag)
    }
}
