//! Path data owned by units: ground step lists, air interpolation vectors and
//! builder facings.
//!
//! These types only hold state and enforce their structural invariants. The
//! per-tick execution that consumes them lives in the movement system.

use crate::{Fixed, GridPoint, Octant, PathStep, PixelPoint};

/// Discriminates the three path variants in persisted streams.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PathKind {
    /// Step list over the tile grid.
    Ground,
    /// Direct fixed-point flight vector.
    Air,
    /// Facing-only path for stationary constructors.
    Builder,
}

impl PathKind {
    /// Tag written ahead of each persisted path body.
    #[must_use]
    pub const fn tag(self) -> u8 {
        match self {
            Self::Ground => 0,
            Self::Air => 1,
            Self::Builder => 2,
        }
    }

    /// Resolves a persisted tag.
    #[must_use]
    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Ground),
            1 => Some(Self::Air),
            2 => Some(Self::Builder),
            _ => None,
        }
    }
}

/// Path owned by a single unit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UnitPath {
    /// Ground or sea unit following a step list.
    Ground(GroundPath),
    /// Air unit or munition following a direct vector.
    Air(AirPath),
    /// Constructor rotating in place.
    Builder(BuilderPath),
}

impl UnitPath {
    /// Variant discriminant.
    #[must_use]
    pub const fn kind(&self) -> PathKind {
        match self {
            Self::Ground(_) => PathKind::Ground,
            Self::Air(_) => PathKind::Air,
            Self::Builder(_) => PathKind::Builder,
        }
    }

    /// Destination tile of the path. Builder paths end where they start and
    /// report `None`.
    #[must_use]
    pub fn end(&self) -> Option<GridPoint> {
        match self {
            Self::Ground(path) => Some(path.end()),
            Self::Air(path) => Some(path.end()),
            Self::Builder(_) => None,
        }
    }
}

impl From<GroundPath> for UnitPath {
    fn from(path: GroundPath) -> Self {
        Self::Ground(path)
    }
}

impl From<AirPath> for UnitPath {
    fn from(path: AirPath) -> Self {
        Self::Air(path)
    }
}

impl From<BuilderPath> for UnitPath {
    fn from(path: BuilderPath) -> Self {
        Self::Builder(path)
    }
}

/// Ordered list of single-tile steps plus a cursor into it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GroundPath {
    end: GridPoint,
    steps: Vec<PathStep>,
    step_index: usize,
}

impl GroundPath {
    /// Creates an empty path anchored at `origin`; appended steps move the end.
    #[must_use]
    pub fn starting_at(origin: GridPoint) -> Self {
        Self {
            end: origin,
            steps: Vec::new(),
            step_index: 0,
        }
    }

    /// Reassembles a path from persisted parts.
    ///
    /// Returns `None` when the cursor lies past the end of the steps.
    #[must_use]
    pub fn from_parts(end: GridPoint, steps: Vec<PathStep>, step_index: usize) -> Option<Self> {
        if step_index > steps.len() {
            return None;
        }
        Some(Self {
            end,
            steps,
            step_index,
        })
    }

    /// Builds a path that visits `cells` in order starting from `origin`.
    ///
    /// Consecutive cells must be neighbours (or repeats, which become no-op
    /// steps); otherwise no path is produced.
    #[must_use]
    pub fn from_route(origin: GridPoint, cells: &[GridPoint]) -> Option<Self> {
        let mut path = Self::starting_at(origin);
        let mut previous = origin;
        for &cell in cells {
            let dx = i32::from(cell.x()) - i32::from(previous.x());
            let dy = i32::from(cell.y()) - i32::from(previous.y());
            if dx.abs() > 1 || dy.abs() > 1 {
                return None;
            }
            path.add_step(PathStep::new(dx as i8, dy as i8));
            previous = cell;
        }
        Some(path)
    }

    /// Appends a step and moves the end point along it.
    pub fn add_step(&mut self, step: PathStep) {
        self.steps.push(step);
        self.end = self.end.offset(step);
    }

    /// Appends the straight-line steps from the current end to `target`,
    /// moving diagonally while both axes still differ.
    pub fn append_linear_steps(&mut self, target: GridPoint) {
        while self.end != target {
            let dx = (i32::from(target.x()) - i32::from(self.end.x())).signum();
            let dy = (i32::from(target.y()) - i32::from(self.end.y())).signum();
            self.add_step(PathStep::new(dx as i8, dy as i8));
        }
    }

    /// Destination tile.
    #[must_use]
    pub const fn end(&self) -> GridPoint {
        self.end
    }

    /// Every step, including those already consumed.
    #[must_use]
    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    /// Cursor to the next step to execute.
    #[must_use]
    pub const fn step_index(&self) -> usize {
        self.step_index
    }

    /// Steps from the cursor to the end.
    #[must_use]
    pub fn remaining(&self) -> &[PathStep] {
        &self.steps[self.step_index.min(self.steps.len())..]
    }

    /// Step under the cursor, if any remain.
    #[must_use]
    pub fn current_step(&self) -> Option<PathStep> {
        self.steps.get(self.step_index).copied()
    }

    /// First non-placeholder step at or after the cursor.
    #[must_use]
    pub fn next_moving_step(&self) -> Option<PathStep> {
        self.remaining().iter().copied().find(|step| !step.is_noop())
    }

    /// Moves the cursor past leading placeholder steps.
    ///
    /// Returns `false` when the cursor ran off the end.
    pub fn skip_placeholders(&mut self) -> bool {
        while let Some(step) = self.current_step() {
            if !step.is_noop() {
                return true;
            }
            self.step_index += 1;
        }
        false
    }

    /// Marks the step under the cursor as consumed.
    pub fn advance(&mut self) {
        debug_assert!(
            self.step_index < self.steps.len(),
            "ground path cursor advanced past its last step"
        );
        self.step_index = (self.step_index + 1).min(self.steps.len());
    }

    /// Reports whether the cursor sits on the final step.
    #[must_use]
    pub fn is_end_step(&self) -> bool {
        self.step_index + 1 >= self.steps.len()
    }

    /// Drops the route in favour of a single placeholder that ends at `cell`.
    pub fn stop_at(&mut self, cell: GridPoint) {
        self.steps.clear();
        self.steps.push(PathStep::NOOP);
        self.step_index = 0;
        self.end = cell;
    }

    /// Replaces the remaining route with `steps` and rewinds the cursor.
    ///
    /// The end point is preserved.
    pub fn replace_remaining(&mut self, steps: Vec<PathStep>) {
        self.steps = steps;
        self.step_index = 0;
    }

    /// Reports whether `cell` is the destination of any remaining step.
    #[must_use]
    pub fn is_in_path(&self, cell: GridPoint) -> bool {
        self.remaining_cells().contains(&cell)
    }

    /// Destination of every remaining non-placeholder step, in traversal order.
    #[must_use]
    pub fn remaining_cells(&self) -> Vec<GridPoint> {
        let mut cells = Vec::new();
        let mut destination = self.end;
        for step in self.remaining().iter().rev() {
            if !step.is_noop() {
                cells.push(destination);
            }
            destination = destination.offset_back(*step);
        }
        cells.reverse();
        cells
    }
}

/// Direct flight path interpolated in Q16.16 pixel space.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AirPath {
    length: i16,
    angle: Octant,
    start: (i16, i16),
    end: GridPoint,
    step_x: Fixed,
    step_y: Fixed,
    delta_x: Fixed,
    delta_y: Fixed,
    distance_x: i16,
    distance_y: i16,
    euclidean_distance: i16,
}

/// Inputs for [`AirPath::new`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AirPathParams {
    /// Pixel position the flight starts from.
    pub start: PixelPoint,
    /// Tile the flight ends on.
    pub end: GridPoint,
    /// Signed pixel displacement along the columns.
    pub distance_x: i16,
    /// Signed pixel displacement along the rows.
    pub distance_y: i16,
    /// Euclidean length of the displacement in pixels.
    pub euclidean_distance: i16,
    /// Number of interpolation sub-steps the flight takes.
    pub length: i16,
    /// Facing the unit must hold before moving.
    pub angle: Octant,
}

impl AirPath {
    /// Creates a flight path, or `None` for a degenerate request.
    #[must_use]
    pub fn new(params: AirPathParams) -> Option<Self> {
        if params.euclidean_distance <= 0 || params.length <= 0 {
            return None;
        }
        let length = i32::from(params.length);
        Some(Self {
            length: params.length,
            angle: params.angle,
            start: (clamp_i16(params.start.x()), clamp_i16(params.start.y())),
            end: params.end,
            step_x: Fixed::ZERO,
            step_y: Fixed::ZERO,
            delta_x: Fixed::from_ratio(i32::from(params.distance_x), length),
            delta_y: Fixed::from_ratio(i32::from(params.distance_y), length),
            distance_x: params.distance_x,
            distance_y: params.distance_y,
            euclidean_distance: params.euclidean_distance,
        })
    }

    /// Reassembles a path from its persisted fields.
    ///
    /// The construction-time distances are re-derived from the start and end
    /// points.
    #[must_use]
    pub fn from_persisted(
        length: i16,
        angle: Octant,
        start: (i16, i16),
        end: GridPoint,
        step: (Fixed, Fixed),
        delta: (Fixed, Fixed),
    ) -> Self {
        let center = end.center();
        let distance_x = clamp_i16(center.x() - i32::from(start.0));
        let distance_y = clamp_i16(center.y() - i32::from(start.1));
        Self {
            length,
            angle,
            start,
            end,
            step_x: step.0,
            step_y: step.1,
            delta_x: delta.0,
            delta_y: delta.1,
            distance_x,
            distance_y,
            euclidean_distance: euclidean(distance_x, distance_y),
        }
    }

    /// Remaining interpolation sub-steps.
    #[must_use]
    pub const fn length(&self) -> i16 {
        self.length
    }

    /// Facing required before the flight moves.
    #[must_use]
    pub const fn angle(&self) -> Octant {
        self.angle
    }

    /// Pixel origin of the flight.
    #[must_use]
    pub const fn start(&self) -> (i16, i16) {
        self.start
    }

    /// Destination tile.
    #[must_use]
    pub const fn end(&self) -> GridPoint {
        self.end
    }

    /// Accumulated progress from the origin.
    #[must_use]
    pub const fn progress(&self) -> (Fixed, Fixed) {
        (self.step_x, self.step_y)
    }

    /// Progress added per sub-step.
    #[must_use]
    pub const fn delta(&self) -> (Fixed, Fixed) {
        (self.delta_x, self.delta_y)
    }

    /// Pixel displacement the flight was built from.
    #[must_use]
    pub const fn distance(&self) -> (i16, i16) {
        (self.distance_x, self.distance_y)
    }

    /// Euclidean pixel length the flight was built from.
    #[must_use]
    pub const fn euclidean_distance(&self) -> i16 {
        self.euclidean_distance
    }

    /// Current interpolated pixel position.
    #[must_use]
    pub fn position(&self) -> PixelPoint {
        self.position_after(0)
    }

    /// Pixel position reached after `sub_steps` more sub-steps at the current
    /// rate.
    #[must_use]
    pub fn position_after(&self, sub_steps: i32) -> PixelPoint {
        let x = self.step_x + self.delta_x.scaled(sub_steps);
        let y = self.step_y + self.delta_y.scaled(sub_steps);
        PixelPoint::new(
            i32::from(self.start.0) + x.floor(),
            i32::from(self.start.1) + y.floor(),
        )
    }

    /// Halves the per-sub-step progress.
    pub fn halve_delta(&mut self) {
        self.delta_x = self.delta_x.halve();
        self.delta_y = self.delta_y.halve();
    }

    /// Consumes one sub-step and returns the new pixel position.
    pub fn advance(&mut self) -> PixelPoint {
        debug_assert!(self.length > 0, "air path advanced past its end");
        self.step_x += self.delta_x;
        self.step_y += self.delta_y;
        self.length = self.length.saturating_sub(1).max(0);
        self.position()
    }

    /// Ends the flight without further movement.
    pub fn clear(&mut self) {
        self.length = 0;
    }

    /// Redirects the remaining flight to the centre of `end` over `length`
    /// sub-steps.
    pub fn retarget(&mut self, end: GridPoint, length: i16) {
        debug_assert!(length > 0, "air path retargeted to an empty flight");
        let length = length.max(1);
        let here = (
            Fixed::from_int(i32::from(self.start.0)) + self.step_x,
            Fixed::from_int(i32::from(self.start.1)) + self.step_y,
        );
        let center = end.center();
        let remaining_x = Fixed::from_int(center.x()) - here.0;
        let remaining_y = Fixed::from_int(center.y()) - here.1;
        self.delta_x = Fixed::from_raw(remaining_x.raw() / i32::from(length));
        self.delta_y = Fixed::from_raw(remaining_y.raw() / i32::from(length));
        self.length = length;
        self.end = end;
    }
}

/// Facing-only path that keeps a constructor oriented toward an offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BuilderPath {
    dx: i16,
    dy: i16,
}

impl BuilderPath {
    /// Creates a builder path facing along `(dx, dy)`.
    #[must_use]
    pub const fn new(dx: i16, dy: i16) -> Self {
        Self { dx, dy }
    }

    /// Relative offset the constructor faces.
    #[must_use]
    pub const fn direction(&self) -> (i16, i16) {
        (self.dx, self.dy)
    }
}

/// Integer square root of `dx² + dy²`, clamped to `i16`.
#[must_use]
pub fn euclidean(dx: i16, dy: i16) -> i16 {
    let squared = i64::from(dx) * i64::from(dx) + i64::from(dy) * i64::from(dy);
    let mut root = (squared as f64).sqrt() as i64;
    while root * root > squared {
        root -= 1;
    }
    while (root + 1) * (root + 1) <= squared {
        root += 1;
    }
    i16::try_from(root).unwrap_or(i16::MAX)
}

fn clamp_i16(value: i32) -> i16 {
    i16::try_from(value).unwrap_or(if value < 0 { i16::MIN } else { i16::MAX })
}
