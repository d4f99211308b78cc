#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the unit path engine.
//!
//! This crate defines the data that connects the authoritative world, the
//! movement system and adapters. Adapters submit [`Command`] values to the
//! world, the movement system consumes the [`UnitPath`] each unit owns one tick
//! at a time, and both broadcast [`Event`] values describing what happened so
//! rendering, sound and AI layers can react without reaching into unit state.

mod codec;
mod fixed;
mod flags;
mod path;
mod step;

use serde::{Deserialize, Serialize};

pub use codec::{CodecError, SaveFormat, MAX_ENCODED_STEPS};
pub use fixed::Fixed;
pub use flags::UnitFlags;
pub use path::{euclidean, AirPath, AirPathParams, BuilderPath, GroundPath, PathKind, UnitPath};
pub use step::{Octant, PathStep};

/// Edge length of a tile in pixels.
pub const TILE_SIZE: i32 = 64;

/// Quarter-point cost of crossing plain terrain orthogonally.
pub const ORTHOGONAL_COST: u8 = 4;

/// Location of a tile expressed as column and row.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPoint {
    x: i16,
    y: i16,
}

impl GridPoint {
    /// Creates a new tile coordinate.
    #[must_use]
    pub const fn new(x: i16, y: i16) -> Self {
        Self { x, y }
    }

    /// Column index.
    #[must_use]
    pub const fn x(&self) -> i16 {
        self.x
    }

    /// Row index.
    #[must_use]
    pub const fn y(&self) -> i16 {
        self.y
    }

    /// Tile reached by taking `step` from this tile.
    #[must_use]
    pub fn offset(self, step: PathStep) -> Self {
        Self::new(
            self.x.wrapping_add(i16::from(step.dx())),
            self.y.wrapping_add(i16::from(step.dy())),
        )
    }

    /// Tile `step` came from when it ended on this tile.
    #[must_use]
    pub fn offset_back(self, step: PathStep) -> Self {
        Self::new(
            self.x.wrapping_sub(i16::from(step.dx())),
            self.y.wrapping_sub(i16::from(step.dy())),
        )
    }

    /// Pixel at the centre of the tile.
    #[must_use]
    pub const fn center(&self) -> PixelPoint {
        PixelPoint::new(
            self.x as i32 * TILE_SIZE + TILE_SIZE / 2,
            self.y as i32 * TILE_SIZE + TILE_SIZE / 2,
        )
    }
}

/// Location in pixel space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelPoint {
    x: i32,
    y: i32,
}

impl PixelPoint {
    /// Creates a new pixel coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Horizontal pixel.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Vertical pixel.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Tile containing the pixel.
    #[must_use]
    pub fn cell(&self) -> GridPoint {
        let column = self.x.div_euclid(TILE_SIZE);
        let row = self.y.div_euclid(TILE_SIZE);
        GridPoint::new(saturate_i16(column), saturate_i16(row))
    }

    /// Point `numerator / denominator` of the way from `self` to `other`.
    #[must_use]
    pub fn lerp(&self, other: PixelPoint, numerator: i32, denominator: i32) -> Self {
        if denominator == 0 {
            return *self;
        }
        Self::new(
            self.x + (other.x - self.x) * numerator / denominator,
            self.y + (other.y - self.y) * numerator / denominator,
        )
    }
}

fn saturate_i16(value: i32) -> i16 {
    i16::try_from(value).unwrap_or(if value < 0 { i16::MIN } else { i16::MAX })
}

/// Unique identifier assigned to a unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(u32);

impl UnitId {
    /// Creates a new unit identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identifier of a player team.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TeamId(u8);

impl TeamId {
    /// Highest team count a [`TeamSet`] can hold.
    pub const MAX_TEAMS: u8 = 8;

    /// Creates a new team identifier.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        Self(value % Self::MAX_TEAMS)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }
}

/// Set of teams, used to record which teams have spotted a unit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TeamSet(u8);

impl TeamSet {
    /// Set holding no teams.
    pub const EMPTY: Self = Self(0);

    /// Set holding only `team`.
    #[must_use]
    pub const fn of(team: TeamId) -> Self {
        Self(1 << team.get())
    }

    /// Reports whether `team` is a member.
    #[must_use]
    pub const fn contains(&self, team: TeamId) -> bool {
        self.0 & (1 << team.get()) != 0
    }

    /// Adds `team`; returns `true` when it was not already a member.
    pub fn insert(&mut self, team: TeamId) -> bool {
        let added = !self.contains(team);
        self.0 |= 1 << team.get();
        added
    }
}

/// Base attribute values shared by every unit of a type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitValues {
    /// Whole movement points granted each turn.
    pub speed: u16,
    /// Shots granted each turn.
    pub rounds: u16,
    /// Whether the unit keeps its shots after moving.
    pub move_and_fire: bool,
    /// Number of units the unit can carry.
    pub storage: u16,
    /// Interpolation sub-steps an air unit covers per tick; one tile per
    /// `max_velocity` sub-steps.
    pub max_velocity: u8,
}

/// Terrain classification of a tile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Terrain {
    /// Open ground.
    #[default]
    Land,
    /// Broken ground that costs double to cross.
    Rough,
    /// Open water.
    Water,
    /// Shoreline passable by land and sea units.
    Coast,
    /// Cliffs and other impassable tiles.
    Blocked,
}

impl Terrain {
    /// Reports whether the tile counts as water for sprite selection.
    #[must_use]
    pub const fn is_water(self) -> bool {
        matches!(self, Self::Water)
    }
}

/// What a unit has been ordered to do.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Order {
    /// No standing order.
    #[default]
    Idle,
    /// Travel along the owned path.
    Move,
    /// Travel toward a transport and board it on arrival.
    Board {
        /// Transport receiving the unit.
        transport: UnitId,
    },
    /// Enter a transport's storage.
    Store {
        /// Transport receiving the unit.
        transport: UnitId,
    },
    /// Construct a structure; path requests are withheld while building.
    Build,
    /// Place carried cargo onto a neighbouring tile.
    Unload {
        /// Unit being placed.
        cargo: UnitId,
        /// Tile the cargo is placed on.
        site: GridPoint,
    },
}

/// Progress of a unit's current order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum OrderState {
    /// The order was issued and has not started.
    #[default]
    Init,
    /// The order is running.
    InProgress,
    /// The unit is between tiles.
    InTransition,
    /// The unit ran out of movement for this turn.
    AwaitingBudget,
    /// A replacement path was requested.
    AwaitingPath,
    /// The unit cannot continue and the order ended for this tick.
    Blocked,
    /// The path finished; the dispatcher decides what follows.
    Completed,
}

impl OrderState {
    /// Reports whether the path executor should run this tick.
    #[must_use]
    pub const fn is_moving(self) -> bool {
        matches!(self, Self::InProgress | Self::InTransition)
    }
}

/// Session-wide movement configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementRules {
    /// Doubles the per-step velocity cap.
    pub fast_movement: bool,
    /// Continuous play: moving costs no budget.
    pub real_time_movement: bool,
    /// Session is a networked multiplayer game.
    pub network_game: bool,
    /// The current turn is ending.
    pub end_of_turn: bool,
    /// A turn timer is running.
    pub turn_timer_active: bool,
    /// Team whose view drives visibility decisions.
    pub observer: TeamId,
    /// Teams controlled from another machine.
    pub remote_teams: Vec<TeamId>,
    /// Unit the camera follows, if any.
    pub followed_unit: Option<UnitId>,
}

impl MovementRules {
    /// Reports whether `team` is controlled remotely.
    #[must_use]
    pub fn is_remote(&self, team: TeamId) -> bool {
        self.remote_teams.contains(&team)
    }
}

/// Sound cues emitted by moving units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SoundCue {
    /// Nothing playing.
    #[default]
    Idle,
    /// Engine loop while moving.
    Moving,
}

/// Short-lived effects trailing munitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParticleKind {
    /// Trail left by airborne munitions.
    Smoke,
    /// Trail left by torpedoes.
    Bubbles,
}

/// Marker drawn along a remaining route.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PathMarker {
    /// Tile the marker sits on.
    pub cell: GridPoint,
    /// How the marker is drawn.
    pub kind: MarkerKind,
}

/// Reachability of a path marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    /// Reachable this turn with `remaining` whole points left afterwards.
    Reachable {
        /// Whole movement points left after reaching the tile.
        remaining: u16,
    },
    /// Reached on a later turn.
    NextTurn,
}

/// Description of a unit to place into the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnitBlueprint {
    /// Owning team.
    pub team: TeamId,
    /// Movement and role classification.
    pub flags: UnitFlags,
    /// Base attribute values.
    pub values: UnitValues,
    /// Tile the unit starts on.
    pub cell: GridPoint,
    /// Initial facing.
    pub angle: Octant,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Resets the map to `columns` by `rows` tiles of open land.
    ConfigureMap {
        /// Number of tile columns.
        columns: u16,
        /// Number of tile rows.
        rows: u16,
    },
    /// Changes the terrain of a tile.
    SetTerrain {
        /// Tile to change.
        cell: GridPoint,
        /// New terrain.
        terrain: Terrain,
    },
    /// Replaces the session movement rules.
    ConfigureRules {
        /// Rules to apply.
        rules: MovementRules,
    },
    /// Places a new unit on the map.
    SpawnUnit {
        /// Unit description.
        blueprint: UnitBlueprint,
    },
    /// Removes a unit, releasing anything it holds.
    RemoveUnit {
        /// Unit to remove.
        unit: UnitId,
    },
    /// Gives a unit a new path, replacing any previous one.
    AssignPath {
        /// Unit receiving the path.
        unit: UnitId,
        /// Path to follow.
        path: UnitPath,
    },
    /// Gives a unit a new order and restarts its order state.
    IssueOrder {
        /// Unit receiving the order.
        unit: UnitId,
        /// Order to carry out.
        order: Order,
    },
    /// Starts a new turn, refilling every unit's movement budget.
    BeginTurn,
}

/// Events broadcast after world commands and movement ticks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// A unit was placed on the map.
    UnitSpawned {
        /// New unit.
        unit: UnitId,
        /// Tile it occupies.
        cell: GridPoint,
    },
    /// A unit left the map.
    UnitRemoved {
        /// Removed unit.
        unit: UnitId,
    },
    /// A new turn started.
    TurnStarted {
        /// Turn counter after the increment.
        turn: u32,
    },
    /// A unit rotated by one octant.
    UnitTurned {
        /// Turning unit.
        unit: UnitId,
        /// Facing after the turn.
        angle: Octant,
    },
    /// A unit crossed into another tile.
    UnitMoved {
        /// Moving unit.
        unit: UnitId,
        /// Tile before the move.
        from: GridPoint,
        /// Tile after the move.
        to: GridPoint,
    },
    /// A unit reached the end of its path.
    PathCompleted {
        /// Arriving unit.
        unit: UnitId,
    },
    /// A replacement path was requested for a unit.
    PathRequested {
        /// Unit awaiting a path.
        unit: UnitId,
    },
    /// A unit could not continue and no replacement path could be requested.
    PathBlocked {
        /// Blocked unit.
        unit: UnitId,
    },
    /// A unit switched from boarding to storing itself in a transport.
    StoreOrderIssued {
        /// Boarding unit.
        unit: UnitId,
        /// Receiving transport.
        transport: UnitId,
    },
    /// A hidden unit stepped aside to let another pass.
    UnitSideStepped {
        /// Unit that moved aside.
        unit: UnitId,
        /// Tile before the side-step.
        from: GridPoint,
        /// Tile after the side-step.
        to: GridPoint,
    },
    /// A unit was revealed to a team.
    UnitSpotted {
        /// Revealed unit.
        unit: UnitId,
        /// Team that can now see it.
        team: TeamId,
    },
    /// A sound cue should start playing.
    SoundCue {
        /// Unit the sound belongs to.
        unit: UnitId,
        /// Cue to play.
        cue: SoundCue,
    },
    /// A trailing particle should be spawned.
    ParticleSpawned {
        /// Kind of particle.
        kind: ParticleKind,
        /// Pixel position of the particle.
        position: PixelPoint,
    },
    /// The followed unit moved and the camera should track it.
    CameraFollow {
        /// Followed unit.
        unit: UnitId,
        /// Pixel position to centre on.
        position: PixelPoint,
    },
    /// A tile was reserved for an unload.
    SiteReserved {
        /// Reserved tile.
        site: GridPoint,
    },
    /// An unload reservation was released.
    SiteReleased {
        /// Released tile.
        site: GridPoint,
    },
    /// Cargo was placed onto a tile by a transport.
    UnitUnloaded {
        /// Carrying transport.
        transport: UnitId,
        /// Placed unit.
        cargo: UnitId,
        /// Tile the cargo now occupies.
        site: GridPoint,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{de::DeserializeOwned, Serialize};

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn grid_point_round_trips_through_bincode() {
        assert_round_trip(&GridPoint::new(-3, 17));
    }

    #[test]
    fn movement_rules_round_trip_through_bincode() {
        let rules = MovementRules {
            fast_movement: true,
            observer: TeamId::new(2),
            remote_teams: vec![TeamId::new(1)],
            followed_unit: Some(UnitId::new(9)),
            ..MovementRules::default()
        };
        assert_round_trip(&rules);
        assert!(rules.is_remote(TeamId::new(1)));
        assert!(!rules.is_remote(TeamId::new(2)));
    }

    #[test]
    fn pixel_cell_floors_negative_coordinates() {
        assert_eq!(PixelPoint::new(63, 64).cell(), GridPoint::new(0, 1));
        assert_eq!(PixelPoint::new(-1, 0).cell(), GridPoint::new(-1, 0));
    }

    #[test]
    fn tile_centre_and_cell_agree() {
        let cell = GridPoint::new(5, 9);
        assert_eq!(cell.center(), PixelPoint::new(352, 608));
        assert_eq!(cell.center().cell(), cell);
    }

    #[test]
    fn team_set_tracks_membership() {
        let mut set = TeamSet::EMPTY;
        assert!(set.insert(TeamId::new(3)));
        assert!(!set.insert(TeamId::new(3)));
        assert!(set.contains(TeamId::new(3)));
        assert!(!set.contains(TeamId::new(0)));
        assert_eq!(TeamSet::of(TeamId::new(3)), set);
    }

    #[test]
    fn lerp_interpolates_between_points() {
        let from = PixelPoint::new(0, 0);
        let to = PixelPoint::new(30, -60);
        assert_eq!(from.lerp(to, 1, 3), PixelPoint::new(10, -20));
        assert_eq!(from.lerp(to, 1, 0), from);
    }
}
