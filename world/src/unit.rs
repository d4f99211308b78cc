//! Mutable unit state consumed by path execution.

use unit_paths_core::{
    GridPoint, Octant, Order, OrderState, PixelPoint, SoundCue, TeamId, TeamSet, UnitBlueprint,
    UnitFlags, UnitId, UnitPath, UnitValues,
};

/// Hit points granted to freshly spawned units.
pub const DEFAULT_HITS: u16 = 10;

/// Engine power of a freshly spawned unit.
pub const FULL_ENGINE_POWER: u8 = 2;

/// Occupancy layer a unit competes for space in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Layer {
    /// Land and sea units.
    Surface,
    /// Aircraft and munitions.
    Air,
}

/// Sprite family shown for amphibious units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SpriteSet {
    /// Wheels or tracks.
    #[default]
    Land,
    /// Hull afloat.
    Water,
}

/// Authoritative state of a single unit.
#[derive(Clone, Debug, PartialEq)]
pub struct Unit {
    /// Unique identifier.
    pub id: UnitId,
    /// Owning team.
    pub team: TeamId,
    /// Movement and role classification.
    pub flags: UnitFlags,
    /// Base attribute values.
    pub values: UnitValues,
    /// Tile the unit occupies.
    pub grid: GridPoint,
    /// Pixel position of the unit's centre.
    pub pixel: PixelPoint,
    /// Current facing.
    pub angle: Octant,
    /// Whole movement points left this turn.
    pub speed: u16,
    /// Shared budget when moving as part of a group.
    pub group_speed: Option<u16>,
    /// Quarter points carried toward the next step, in `0..=3`.
    pub move_fraction: u8,
    /// Shots left this turn.
    pub shots: u16,
    /// Remaining hit points.
    pub hits: u16,
    /// Engine power; zero means the unit cannot move.
    pub engine_power: u8,
    /// Standing order.
    pub order: Order,
    /// Progress of the standing order.
    pub order_state: OrderState,
    /// Final destination of the current path, published for UI and AI.
    pub move_to: GridPoint,
    /// Teams that have spotted the unit.
    pub spotted_by: TeamSet,
    /// Whether the player has the unit selected.
    pub selected: bool,
    /// Sound currently playing for the unit.
    pub sound: SoundCue,
    /// Sprite family in use.
    pub sprite: SpriteSet,
    /// Units currently held in storage.
    pub storage_used: u16,
    /// Whole points moved since the last travel turn.
    pub travel: u16,
    /// Full turns' worth of movement travelled.
    pub travel_turns: u32,
    /// Tile reserved by this unit for an unload in progress.
    pub reserved_site: Option<GridPoint>,
    /// Path the unit is following.
    pub path: Option<UnitPath>,
}

impl Unit {
    /// Creates a unit from its blueprint with a full budget.
    #[must_use]
    pub fn from_blueprint(id: UnitId, blueprint: UnitBlueprint) -> Self {
        Self {
            id,
            team: blueprint.team,
            flags: blueprint.flags,
            values: blueprint.values,
            grid: blueprint.cell,
            pixel: blueprint.cell.center(),
            angle: blueprint.angle,
            speed: blueprint.values.speed,
            group_speed: None,
            move_fraction: 0,
            shots: blueprint.values.rounds,
            hits: DEFAULT_HITS,
            engine_power: FULL_ENGINE_POWER,
            order: Order::Idle,
            order_state: OrderState::Init,
            move_to: blueprint.cell,
            spotted_by: TeamSet::EMPTY,
            selected: false,
            sound: SoundCue::Idle,
            sprite: SpriteSet::Land,
            storage_used: 0,
            travel: 0,
            travel_turns: 0,
            reserved_site: None,
            path: None,
        }
    }

    /// Movement points usable right now, honouring any group budget.
    #[must_use]
    pub fn available_speed(&self) -> u16 {
        match self.group_speed {
            Some(group) => group.min(self.speed),
            None => self.speed,
        }
    }

    /// Reports whether `team` can currently see the unit.
    #[must_use]
    pub fn is_visible_to(&self, team: TeamId) -> bool {
        self.team == team || self.spotted_by.contains(team)
    }

    /// Occupancy layer of the unit.
    #[must_use]
    pub fn layer(&self) -> Layer {
        if self.flags.contains(UnitFlags::AIR) {
            Layer::Air
        } else {
            Layer::Surface
        }
    }

    /// Storage slots still available.
    #[must_use]
    pub fn free_storage(&self) -> u16 {
        self.values.storage.saturating_sub(self.storage_used)
    }

    /// Grants a fresh turn's budget.
    pub fn refill(&mut self) {
        self.speed = self.values.speed;
        self.group_speed = None;
        self.shots = self.values.rounds;
        if self.order_state == OrderState::AwaitingBudget {
            self.order_state = OrderState::InProgress;
        }
    }
}
