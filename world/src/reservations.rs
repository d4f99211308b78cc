//! Tiles claimed by unloads in progress.

use log::warn;
use unit_paths_core::GridPoint;

/// Set of tiles currently claimed for an unload or placement.
///
/// Shared by every team. A tile appears at most once; reserving a claimed
/// tile or releasing an unclaimed one is a programming error.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SiteReservations {
    sites: Vec<GridPoint>,
}

impl SiteReservations {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `site`.
    pub fn reserve(&mut self, site: GridPoint) {
        debug_assert!(
            !self.is_reserved(site),
            "site {site:?} reserved twice without release"
        );
        if self.is_reserved(site) {
            warn!("ignoring duplicate reservation of {site:?}");
            return;
        }
        self.sites.push(site);
    }

    /// Releases the claim on `site`.
    pub fn release(&mut self, site: GridPoint) {
        let position = self.sites.iter().position(|reserved| *reserved == site);
        debug_assert!(position.is_some(), "site {site:?} released without a reservation");
        match position {
            Some(index) => {
                let _ = self.sites.swap_remove(index);
            }
            None => warn!("ignoring release of unreserved site {site:?}"),
        }
    }

    /// Reports whether `site` is claimed.
    #[must_use]
    pub fn is_reserved(&self, site: GridPoint) -> bool {
        self.sites.contains(&site)
    }

    /// Claimed tiles in no particular order.
    #[must_use]
    pub fn sites(&self) -> &[GridPoint] {
        &self.sites
    }
}
