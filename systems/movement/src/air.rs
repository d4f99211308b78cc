//! Fixed-point flight for aircraft and unguided munitions.

use log::{debug, trace};
use unit_paths_core::{
    AirPath, Event, GridPoint, MarkerKind, MovementRules, OrderState, ParticleKind, PathMarker,
    PixelPoint, SoundCue, UnitFlags, ORTHOGONAL_COST,
};
use unit_paths_world::{Accessibility, Unit, UnitsView};

use crate::{paths, MovementContext, PathBehavior};

impl PathBehavior for AirPath {
    fn position(&self, _unit: &Unit) -> PixelPoint {
        AirPath::position(self)
    }

    fn cancel_movement(&mut self, unit: &mut Unit, _ctx: &mut MovementContext<'_>) {
        if self.length() == 0 {
            return;
        }
        if unit.angle != self.angle() {
            self.clear();
            unit.order_state = OrderState::Blocked;
            return;
        }
        let quantum = quantum(unit);
        let residual = match self.length() % quantum {
            0 => 1,
            rest => rest,
        }
        .min(self.length());
        let stop = self.position_after(i32::from(residual)).cell();
        debug!("unit {:?} stopping short at {stop:?}", unit.id);
        self.retarget(stop, residual);
    }

    fn movement_cost(&self, unit: &Unit, _access: &dyn Accessibility, rules: &MovementRules) -> u32 {
        let length = u32::from(self.length().unsigned_abs());
        let tiles = length.div_ceil(u32::from(quantum(unit).unsigned_abs()));
        let per_tile = paths::effective_cost(unit, ORTHOGONAL_COST, false, rules);
        (tiles * per_tile)
            .saturating_sub(u32::from(unit.move_fraction))
            .div_ceil(u32::from(ORTHOGONAL_COST))
    }

    fn execute(
        &mut self,
        unit: &mut Unit,
        _units: &mut UnitsView<'_>,
        ctx: &mut MovementContext<'_>,
    ) -> bool {
        let quantum = quantum(unit);
        let missile = unit.flags.contains(UnitFlags::MISSILE);

        for _ in 0..quantum {
            if self.length() == 0 {
                complete(unit, ctx);
                return false;
            }
            if unit.available_speed() == 0 || unit.engine_power == 0 {
                unit.order_state = OrderState::AwaitingBudget;
                return false;
            }
            if paths::update_angle(unit, self.angle(), ctx.events) {
                return false;
            }

            if self.length() == 1 {
                self.halve_delta();
                if unit.selected && unit.sound != SoundCue::Moving {
                    unit.sound = SoundCue::Moving;
                    ctx.events.push(Event::SoundCue {
                        unit: unit.id,
                        cue: SoundCue::Moving,
                    });
                }
            }

            let previous = unit.pixel;
            let vacated = unit.grid;
            let pixel = self.advance();
            if pixel.cell() == vacated {
                unit.pixel = pixel;
            } else {
                if missile {
                    if unit.is_visible_to(ctx.rules.observer) {
                        let kind = if unit.flags.contains(UnitFlags::TORPEDO) {
                            ParticleKind::Bubbles
                        } else {
                            ParticleKind::Smoke
                        };
                        ctx.events.push(Event::ParticleSpawned {
                            kind,
                            position: previous.lerp(pixel, 1, 2),
                        });
                    }
                } else {
                    ctx.status.mark_dirty(vacated);
                }
                paths::relocate(unit, pixel, ctx);
                trace!("unit {:?} flew {vacated:?} -> {:?}", unit.id, unit.grid);
                ctx.events.push(Event::UnitMoved {
                    unit: unit.id,
                    from: vacated,
                    to: unit.grid,
                });
            }

            if !missile {
                if ctx.rules.followed_unit == Some(unit.id) {
                    ctx.events.push(Event::CameraFollow {
                        unit: unit.id,
                        position: unit.pixel,
                    });
                }
                if self.length() % quantum == 0
                    && !paths::take_step(unit, ORTHOGONAL_COST, false, ctx.rules)
                {
                    unit.order_state = OrderState::AwaitingBudget;
                    return false;
                }
            }

            if self.length() == 0 {
                land(self.end(), unit, missile, ctx);
                complete(unit, ctx);
                return false;
            }
            unit.order_state = OrderState::InTransition;
        }
        true
    }

    fn draw(&self, unit: &Unit, _access: &dyn Accessibility, rules: &MovementRules) -> Vec<PathMarker> {
        let quantum = i32::from(quantum(unit));
        let length = i32::from(self.length());
        let mut scratch = unit.clone();
        scratch.path = None;
        let mut reachable = true;
        let mut markers: Vec<PathMarker> = Vec::new();
        let mut ahead = 0;
        while ahead < length {
            ahead = (ahead + quantum).min(length);
            let cell = self.position_after(ahead).cell();
            if markers.last().is_some_and(|marker| marker.cell == cell) || cell == unit.grid {
                continue;
            }
            reachable = reachable
                && scratch.available_speed() > 0
                && paths::calculate_step(&mut scratch, ORTHOGONAL_COST, false, rules);
            let kind = if reachable {
                MarkerKind::Reachable {
                    remaining: scratch.available_speed(),
                }
            } else {
                MarkerKind::NextTurn
            };
            markers.push(PathMarker { cell, kind });
        }
        markers
    }
}

/// Puts the unit on the centre of `end` when the halved final sub-step left
/// it short, which happens on a tile boundary for flights heading west or
/// north.
fn land(end: GridPoint, unit: &mut Unit, missile: bool, ctx: &mut MovementContext<'_>) {
    if unit.grid == end {
        return;
    }
    let from = unit.grid;
    if !missile {
        ctx.status.mark_dirty(from);
    }
    paths::relocate(unit, end.center(), ctx);
    trace!("unit {:?} landed {from:?} -> {end:?}", unit.id);
    ctx.events.push(Event::UnitMoved {
        unit: unit.id,
        from,
        to: unit.grid,
    });
}

fn complete(unit: &mut Unit, ctx: &mut MovementContext<'_>) {
    unit.order_state = OrderState::Completed;
    unit.sound = SoundCue::Idle;
    ctx.events.push(Event::PathCompleted { unit: unit.id });
}

/// Interpolation sub-steps per tile and per tick.
fn quantum(unit: &Unit) -> i16 {
    i16::from(unit.values.max_velocity.max(1))
}
