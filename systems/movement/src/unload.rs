//! Placing carried cargo onto a neighbouring tile under a site reservation.
//!
//! A transport claims the site before the cargo moves and holds the claim
//! until the placement completes or aborts, so no second unload can target
//! the same tile in between.

use log::debug;
use unit_paths_core::{Event, GridPoint, Order, OrderState, UnitFlags, UnitId};
use unit_paths_world::{Unit, UnitsView};

use crate::{paths, MovementContext};

/// Claims `site` for unloading `cargo` from `transport`.
///
/// Fails when the site is already claimed, is not next to the transport, is
/// off the map, cannot be entered by the cargo, or already holds a unit of
/// the cargo's layer.
pub fn begin_unload(
    transport: &mut Unit,
    cargo: UnitId,
    site: GridPoint,
    units: &UnitsView<'_>,
    ctx: &mut MovementContext<'_>,
) -> bool {
    if paths::is_site_reserved(ctx.reservations, site) {
        debug!("site {site:?} already claimed, {:?} waits", transport.id);
        return false;
    }
    if transport.reserved_site.is_some() || !is_adjacent(transport.grid, site) {
        return false;
    }
    let Some(load) = units.get(cargo) else {
        return false;
    };
    if !paths::is_enterable(ctx.access, load, site) {
        return false;
    }
    let crowded = ctx.hash.bucket(site).iter().any(|id| {
        units.get(*id).is_some_and(|other| {
            other.layer() == load.layer() && !other.flags.contains(UnitFlags::GROUND_COVER)
        })
    });
    if crowded {
        return false;
    }

    paths::reserve_site(ctx.reservations, site);
    transport.reserved_site = Some(site);
    transport.order = Order::Unload { cargo, site };
    transport.order_state = OrderState::InProgress;
    ctx.events.push(Event::SiteReserved { site });
    true
}

/// Places the cargo on the claimed site and releases the claim.
///
/// Returns `false` when the transport holds no claim or the cargo is gone;
/// any claim is released either way.
pub fn complete_unload(
    transport: &mut Unit,
    units: &mut UnitsView<'_>,
    ctx: &mut MovementContext<'_>,
) -> bool {
    let Order::Unload { cargo, site } = transport.order else {
        abort_unload(transport, ctx);
        return false;
    };
    let Some(load) = units.get_mut(cargo) else {
        abort_unload(transport, ctx);
        return false;
    };

    paths::relocate(load, site.center(), ctx);
    load.order = Order::Idle;
    load.order_state = OrderState::Init;
    release(transport, ctx);
    transport.storage_used = transport.storage_used.saturating_sub(1);
    transport.order = Order::Idle;
    transport.order_state = OrderState::Completed;
    ctx.events.push(Event::UnitUnloaded {
        transport: transport.id,
        cargo,
        site,
    });
    true
}

/// Abandons an unload, releasing any claim the transport holds.
pub fn abort_unload(transport: &mut Unit, ctx: &mut MovementContext<'_>) {
    release(transport, ctx);
    if matches!(transport.order, Order::Unload { .. }) {
        transport.order = Order::Idle;
        transport.order_state = OrderState::Init;
    }
}

fn release(transport: &mut Unit, ctx: &mut MovementContext<'_>) {
    if let Some(site) = transport.reserved_site.take() {
        paths::remove_site_reservation(ctx.reservations, site);
        ctx.events.push(Event::SiteReleased { site });
    }
}

fn is_adjacent(from: GridPoint, to: GridPoint) -> bool {
    let dx = (i32::from(from.x()) - i32::from(to.x())).abs();
    let dy = (i32::from(from.y()) - i32::from(to.y())).abs();
    from != to && dx <= 1 && dy <= 1
}
