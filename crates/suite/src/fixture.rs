//! Fixture rasters
//!
//! A constant raster is written in the small region, then copied twice in
//! the larger reference region. Every cell of the copies outside the small
//! extent is NULL, so both copies carry a non-trivial NULL file.

use tracing::{debug, warn};

use nullcheck_core::{Engine, RegionSpec, Result, Session};

use crate::config::SuiteConfig;

/// Rasters created for one case.
#[derive(Debug, Clone)]
pub struct Fixture {
    names: Vec<String>,
}

impl Fixture {
    /// Create the fixture rasters, replacing any left over from earlier runs.
    pub fn set_up<E: Engine>(session: &Session<E>, config: &SuiteConfig) -> Result<Self> {
        let maps = &config.maps;

        session.set_region(&RegionSpec::Bounds(config.small_region))?;
        session.mapcalc(&format!("{} = 1", maps.without_nulls), true)?;
        log_null_status(session, &maps.without_nulls);

        session.set_region(&RegionSpec::Raster(config.reference_raster.clone()))?;

        for target in [&maps.map_a, &maps.map_b] {
            session.mapcalc(&format!("{} = {}", target, maps.without_nulls), true)?;
            log_null_status(session, target);
        }

        Ok(Self {
            names: maps.all().iter().map(|s| s.to_string()).collect(),
        })
    }

    /// Force-remove every fixture raster. Failures are logged, never returned.
    pub fn tear_down<E: Engine>(&self, session: &Session<E>) {
        remove_all(session, &self.names);
    }
}

/// Remove rasters by name without failing, for cleanup after a partial setup.
pub fn remove_all<E: Engine, S: AsRef<str>>(session: &Session<E>, names: &[S]) {
    for name in names {
        let name = name.as_ref();
        if let Err(e) = session.remove_raster(name) {
            warn!(map = name, error = %e, "failed to remove fixture raster");
        }
    }
}

/// Observe the NULL file state; never affects the outcome.
fn log_null_status<E: Engine>(session: &Session<E>, map: &str) {
    match session.null_file_status(map) {
        Ok(status) => debug!(map, compressed = status.compressed, "NULL file status"),
        Err(e) => debug!(map, error = %e, "NULL file status unavailable"),
    }
}
